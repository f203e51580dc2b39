use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use face_collection_core::collection::face_collection_client::FaceCollectionClient;
use face_collection_core::recognition::infrastructure::log_diagnostic_logger::LogDiagnosticLogger;
use face_collection_core::recognition::infrastructure::rekognition_http_provider::RekognitionHttpProvider;
use face_collection_core::shared::client_config::ClientConfig;
use face_collection_core::shared::constants::DEFAULT_MATCH_THRESHOLD;

/// Manage faces in a remote face-recognition collection.
#[derive(Parser)]
#[command(name = "face-collection")]
struct Cli {
    /// JSON config file (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Provider region, e.g. ap-northeast-1.
    #[arg(long)]
    region: Option<String>,

    /// Override the provider endpoint URL.
    #[arg(long)]
    endpoint: Option<String>,

    /// Request timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Log raw provider responses.
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enrol the face in an image and print its face id.
    Add {
        collection: String,
        /// Image file (raw or base64), or "-" for stdin.
        image: PathBuf,
        /// Skip the single-face check.
        #[arg(long)]
        no_validation: bool,
    },
    /// List the faces in a collection.
    List { collection: String },
    /// Find the enrolled face that best matches an image.
    Match {
        collection: String,
        /// Image file (raw or base64), or "-" for stdin.
        image: PathBuf,
        /// Minimum similarity in percent (0-100).
        #[arg(long, default_value_t = DEFAULT_MATCH_THRESHOLD)]
        threshold: f64,
    },
    /// Delete faces by id and print the ids actually deleted.
    Delete {
        collection: String,
        #[arg(required = true)]
        face_ids: Vec<String>,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    let client = build_client(&config)?;

    let output = match cli.command {
        Command::Add {
            collection,
            image,
            no_validation,
        } => {
            let bytes = read_image(&image)?;
            let face_id = if no_validation {
                client.add_without_validation(&collection, &bytes)?
            } else {
                client.add(&collection, &bytes)?
            };
            log::info!("Added face {face_id} to {collection}");
            serde_json::json!({ "faceId": face_id })
        }
        Command::List { collection } => {
            let faces = client.get_all(&collection)?;
            log::info!("{} face(s) in {collection}", faces.len());
            serde_json::to_value(faces)?
        }
        Command::Match {
            collection,
            image,
            threshold,
        } => {
            let bytes = read_image(&image)?;
            let result = client.get_by_image_with_threshold(&collection, &bytes, threshold)?;
            if result.is_none() {
                log::info!("No face in {collection} matched at {threshold}%");
            }
            serde_json::to_value(result)?
        }
        Command::Delete {
            collection,
            face_ids,
        } => {
            let deleted = client.delete(&collection, &face_ids)?;
            log::info!(
                "Deleted {}/{} face(s) from {collection}",
                deleted.len(),
                face_ids.len()
            );
            serde_json::to_value(deleted)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// File, then environment, then command-line flags; later sources win.
fn build_config(cli: &Cli) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let config = ClientConfig::load(cli.config.as_deref())?.merge_env();
    Ok(apply_flags(cli, config))
}

fn apply_flags(cli: &Cli, mut config: ClientConfig) -> ClientConfig {
    if let Some(region) = &cli.region {
        config.region = region.clone();
    }
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = Some(timeout);
    }
    if cli.debug {
        config.debug = true;
    }
    config
}

fn build_client(config: &ClientConfig) -> Result<FaceCollectionClient, Box<dyn std::error::Error>> {
    let provider = RekognitionHttpProvider::new(config)?;
    Ok(FaceCollectionClient::new(
        Box::new(provider.clone()),
        Box::new(provider),
        Box::new(LogDiagnosticLogger::default()),
        config.debug,
    ))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &cli.config {
        if !path.exists() {
            return Err(format!("Config file not found: {}", path.display()).into());
        }
    }
    if cli.timeout == Some(0) {
        return Err("Timeout must be at least 1 second".into());
    }
    match &cli.command {
        Command::Add { image, .. } | Command::Match { image, .. } => {
            if !is_stdin(image) && !image.exists() {
                return Err(format!("Image file not found: {}", image.display()).into());
            }
        }
        Command::List { .. } | Command::Delete { .. } => {}
    }
    if let Command::Match { threshold, .. } = &cli.command {
        if !(0.0..=100.0).contains(threshold) {
            return Err(format!("Threshold must be between 0 and 100, got {threshold}").into());
        }
    }
    Ok(())
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_image(path: &Path) -> io::Result<Vec<u8>> {
    if is_stdin(path) {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(path)
    }
}
