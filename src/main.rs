mod cli;
mod commands;
mod mcp;
mod page_range;
mod pdf;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Info { path } => {
            commands::info::run(&path)?;
        }
        Commands::Contents {
            path,
            ocr,
            language,
            candidate_page,
        } => {
            let options = commands::contents::ContentsOptions {
                ocr,
                language,
                candidate_page,
            };
            commands::contents::run(&path, &options).await?;
        }
        Commands::Outline { path } => {
            commands::outline::run(&path)?;
        }
        Commands::PageMap {
            path,
            ocr,
            language,
        } => {
            commands::page_map::run(&path, ocr, &language).await?;
        }
        Commands::Labels { path } => {
            commands::labels::run(&path)?;
        }
        Commands::Locate {
            path,
            printed,
            ocr,
            language,
        } => {
            commands::locate::run(&path, printed, ocr, &language).await?;
        }
        Commands::Read { path, pages } => {
            commands::read::run(&path, &pages)?;
        }
        Commands::Render {
            path,
            page,
            output,
            scale,
        } => {
            commands::render::run(&path, page, output, scale).await?;
        }
    }

    Ok(())
}
