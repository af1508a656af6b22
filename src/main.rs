use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drs_client::{Config, DrsClient};

#[derive(Debug, Parser)]
#[command(name = "drs-client")]
#[command(about = "GA4GH Data Repository Service client")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve an object id to its metadata
    GetObject {
        object_id: String,
        /// Expand nested bundle contents
        #[arg(long)]
        expand: bool,
    },
    /// Resolve an access method of an object to a URL
    GetAccessUrl { object_id: String, access_id: String },
    /// Register an object from a JSON file ("-" reads stdin)
    PostObject { file: PathBuf },
    /// Delete an object
    DeleteObject { object_id: String },
    /// Show the server's service-info
    ServiceInfo,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| cli.config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = DrsClient::new(&cli.config)?;
    tracing::debug!("Using DRS endpoint {}", client.base_url());

    match cli.command {
        Command::GetObject { object_id, expand } => {
            let object = if expand {
                client.get_object_expanded(&object_id)?
            } else {
                client.get_object(&object_id)?
            };
            print_json(&object)?;
        }
        Command::GetAccessUrl { object_id, access_id } => {
            print_json(&client.get_access_url(&object_id, &access_id)?)?;
        }
        Command::PostObject { file } => {
            let object = read_json(&file)?;
            let id = client.post_object(&object)?;
            tracing::info!("Registered object {}", id);
            print_json(&serde_json::json!({ "id": id }))?;
        }
        Command::DeleteObject { object_id } => {
            let id = client.delete_object(&object_id)?;
            tracing::info!("Deleted object {}", id);
            print_json(&serde_json::json!({ "id": id }))?;
        }
        Command::ServiceInfo => {
            print_json(&client.service_info()?)?;
        }
    }

    Ok(())
}

fn read_json(path: &PathBuf) -> anyhow::Result<serde_json::Value> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?
    };
    serde_json::from_str(&raw).with_context(|| format!("{:?} is not valid JSON", path))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
