use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use studygen::api::ApiServer;
use studygen::{Config, OllamaClient, StudyPipeline, WhisperTranscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let config_arg = Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .help("Path to a TOML configuration file");

    let verbose_arg = Arg::new("verbose")
        .short('v')
        .long("verbose")
        .help("Enable verbose logging")
        .action(clap::ArgAction::SetTrue);

    let matches = Command::new("studygen")
        .version(env!("CARGO_PKG_VERSION"))
        .author("TigreRoll")
        .about("Turns lecture recordings into summaries, notes and study plans")
        .subcommand_required(true)
        .subcommand(
            Command::new("serve")
                .about("Start the HTTP API")
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .help("Port to listen on (overrides config and PORT)")
                        .value_parser(clap::value_parser!(u16)),
                )
                .arg(config_arg.clone())
                .arg(verbose_arg.clone()),
        )
        .subcommand(
            Command::new("process")
                .about("Run the pipeline on a local file and print the JSON result")
                .arg(
                    Arg::new("file")
                        .value_name("FILE")
                        .help("Audio or video file to process")
                        .required(true),
                )
                .arg(
                    Arg::new("model")
                        .short('m')
                        .long("model")
                        .value_name("MODEL")
                        .help("Generation model to use instead of the configured one"),
                )
                .arg(config_arg)
                .arg(verbose_arg),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("serve", sub)) => serve(sub).await,
        Some(("process", sub)) => process(sub).await,
        _ => Ok(()),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "debug"
    } else {
        "studygen=info,tower_http=info,warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    let path = matches.get_one::<String>("config").map(PathBuf::from);
    let config = Config::load(path.as_deref())?;
    config.validate()?;
    Ok(config)
}

fn build_pipeline(config: &Config) -> Result<StudyPipeline> {
    let transcriber = WhisperTranscriber::new(config.transcription.clone());
    let generator = OllamaClient::new(config.llm.clone())?;

    info!("🎤 Whisper model: {}", transcriber.model_size());
    match generator.config().resolve_endpoint() {
        Some(endpoint) => info!("🧠 Ollama: {} (model: {})", endpoint, generator.config().model),
        None => tracing::warn!("⚠️  OLLAMA_HOST is not set, generation requests will fail"),
    }

    Ok(StudyPipeline::new(Arc::new(transcriber), Arc::new(generator)))
}

async fn serve(matches: &ArgMatches) -> Result<()> {
    init_logging(matches.get_flag("verbose"));

    let mut config = load_config(matches)?;
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    let pipeline = build_pipeline(&config)?;
    ApiServer::new(Arc::new(pipeline), Arc::new(config)).start().await
}

async fn process(matches: &ArgMatches) -> Result<()> {
    init_logging(matches.get_flag("verbose"));

    let config = load_config(matches)?;
    let pipeline = build_pipeline(&config)?;

    let file = matches
        .get_one::<String>("file")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("FILE is required"))?;
    let model = matches.get_one::<String>("model").map(String::as_str);

    info!("📁 Processing {}", file.display());
    let response = pipeline.process_file(&file, model).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
