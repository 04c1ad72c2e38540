use anyhow::{Context, Result};
use cdn_invalidator::app::App;
use cdn_invalidator::models::{BatchEvent, Config};
use clap::Parser;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "cdn-invalidator")]
#[command(about = "Invalidate CloudFront paths for a batch of S3 change notifications")]
struct CliArgs {
    /// Queue batch event JSON file. Reads stdin when omitted or `-`.
    #[arg(value_name = "EVENT_FILE")]
    event_file: Option<PathBuf>,

    /// Log the invalidation request instead of sending it.
    #[arg(long)]
    dry_run: bool,
}

fn read_event(path: Option<&Path>) -> Result<BatchEvent> {
    let raw = match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file {}", path.display()))?,
        _ => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read event from stdin")?;
            raw
        }
    };

    serde_json::from_str(&raw).context("Event is not a valid queue batch")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cdn_invalidator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    config.dry_run |= args.dry_run;

    let event = match read_event(args.event_file.as_deref()) {
        Ok(event) => event,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    let app = App::new(&config).await;
    let response = app.handle_batch(&event).await;

    if response.is_success() {
        info!("Batch processed successfully");
    } else {
        info!(
            "{} messages returned for redelivery",
            response.batch_item_failures.len()
        );
    }

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
