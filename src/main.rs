use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cv_backend::environment::EnvironmentConfig;
use cv_backend::pdf::{photo, render_cv};
use cv_backend::utils::Language;
use std::path::PathBuf;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "cvpress", about = "Single-tenant CV backend and PDF exporter")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the API server
    Serve,
    /// Render a flattened CV payload file to a PDF without the server
    Render {
        /// JSON file holding the flattened CV payload
        #[arg(long)]
        input: PathBuf,
        /// Language token (HR or EN)
        #[arg(long, default_value = "EN")]
        language: String,
        /// Destination PDF path
        #[arg(long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cv_backend=info,cvpress=info,rocket=warn")),
        )
        .init();

    let config = EnvironmentConfig::load()?;

    match Cli::parse().command.unwrap_or(Command::Serve) {
        Command::Serve => {
            config.ensure_directories().await?;

            info!("Starting CVpress API server");
            info!("Database: {}", config.database_path.display());
            info!("Fonts: {}", config.fonts_path.display());
            if let Ok(port) = std::env::var("ROCKET_PORT") {
                info!("Server: http://0.0.0.0:{}", port);
            }

            cv_backend::start_web_server(config).await
        }
        Command::Render {
            input,
            language,
            output,
        } => {
            let raw = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("Failed to read payload: {}", input.display()))?;
            let data: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(&raw).context("Payload must be a JSON object")?;

            let language = Language::parse(&language);
            let profile_photo = match data.get("profileImage").and_then(|v| v.as_str()) {
                Some(source) if !source.is_empty() => photo::load_profile_photo(source).await,
                _ => None,
            };

            let bytes = render_cv(&data, language, profile_photo.as_ref(), &config.fonts_path)?;
            tokio::fs::write(&output, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;

            info!("Rendered {} ({} bytes)", output.display(), bytes.len());
            Ok(())
        }
    }
}
