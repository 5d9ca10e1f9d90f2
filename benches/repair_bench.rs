use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::Map;
use studygen::{build_study_prompt, parse_model_json, StudyMaterial};

const STRICT_REPLY: &str = r#"{"summary":"Newton's three laws.","notes":"- inertia\n- F = ma\n- reaction","studyPlan":"Day 1: read chapter 2"}"#;

const WRAPPED_REPLY: &str = "Sure! Here is the material you asked for:\n```json\n{\"summary\":\"Newton's three laws.\",\"notes\":[\"inertia\",\"F = ma\"],\"studyPlan\":\"Day 1: read chapter 2\"}\n```\nLet me know if you need more.";

fn bench_json_repair(c: &mut Criterion) {
    c.bench_function("parse_strict_reply", |b| {
        b.iter(|| black_box(parse_model_json(black_box(STRICT_REPLY))))
    });

    c.bench_function("parse_wrapped_reply", |b| {
        b.iter(|| black_box(parse_model_json(black_box(WRAPPED_REPLY))))
    });

    c.bench_function("parse_plain_text_reply", |b| {
        b.iter(|| black_box(parse_model_json(black_box("I cannot comply."))))
    });

    let fields = parse_model_json(WRAPPED_REPLY).unwrap_or_else(|_| Map::new());
    c.bench_function("material_from_fields", |b| {
        b.iter(|| black_box(StudyMaterial::from_fields(black_box(&fields))))
    });
}

fn bench_prompt_building(c: &mut Criterion) {
    let short = "Mitochondria produce ATP.";
    c.bench_function("prompt_short_transcript", |b| {
        b.iter(|| black_box(build_study_prompt(black_box(short))))
    });

    // Roughly an hour of speech
    let long = "The lecture continues with another worked example. ".repeat(2_000);
    c.bench_function("prompt_long_transcript", |b| {
        b.iter(|| black_box(build_study_prompt(black_box(&long))))
    });
}

criterion_group!(benches, bench_json_repair, bench_prompt_building);
criterion_main!(benches);
