use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use tinylink::config::Config;
use tinylink::models::{CreatedLink, Link};
use tinylink::{storage, LinkRegistry, RegistryError};

#[derive(Parser)]
#[command(name = "tinylink-admin")]
#[command(about = "Tinylink link management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a short link
    Create {
        /// Destination URL (http or https)
        url: String,
        /// Custom code, 6-8 letters or digits
        #[arg(long)]
        code: Option<String>,
    },
    /// List all links, newest first
    List,
    /// Show one link and its click stats
    Get {
        code: String,
    },
    /// Delete a link
    Delete {
        code: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let storage = storage::connect(&config.database).await?;
    let registry = LinkRegistry::new(Arc::clone(&storage));

    match cli.command {
        Commands::Create { url, code } => {
            let link = registry
                .create(&url, code.as_deref())
                .await
                .context("failed to create link")?;
            let created = CreatedLink::new(link, &config.base_url);
            println!("✓ Created {} -> {}", created.short_url, created.link.url);
        }
        Commands::List => {
            let links = registry.list().await?;
            if links.is_empty() {
                println!("No links found.");
            } else {
                println!(
                    "{:<10} {:>8} {:<25} {:<25} {}",
                    "Code", "Clicks", "Created", "Last clicked", "URL"
                );
                println!("{}", "-".repeat(100));
                for link in links {
                    print_row(&link);
                }
            }
        }
        Commands::Get { code } => match registry.get(&code).await {
            Ok(link) => println!("{}", serde_json::to_string_pretty(&link)?),
            Err(RegistryError::NotFound) => println!("⚠ No link with code '{}'", code),
            Err(e) => return Err(e.into()),
        },
        Commands::Delete { code } => match registry.delete(&code).await {
            Ok(link) => println!("✓ Deleted '{}' ({} clicks)", link.code, link.clicks),
            Err(RegistryError::NotFound) => println!("⚠ No link with code '{}'", code),
            Err(e) => return Err(e.into()),
        },
    }

    Ok(())
}

fn print_row(link: &Link) {
    let last_clicked = link
        .last_clicked
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    println!(
        "{:<10} {:>8} {:<25} {:<25} {}",
        link.code,
        link.clicks,
        link.created_at.to_rfc3339(),
        last_clicked,
        link.url
    );
}
