mod config;
mod error;
mod handlers;
mod models;
mod services;
mod ui;
#[cfg(feature = "web-server")]
mod web; // Upload page + analyze endpoint

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use config::Config;
use handlers::{AnalysisOutcome, AnalysisSession};
use services::{ArkService, FoodAnalyzer, ImageIntake, SelectedFile};
use ui::{TerminalShell, UiShell};

#[derive(Parser)]
#[command(name = "food-calories", version)]
#[command(about = "拍一张食物照片，按热量高低分类并估算总热量", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug logging (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the upload page
    #[cfg(feature = "web-server")]
    Serve {
        /// Listen address, overrides BIND_ADDR
        #[arg(long)]
        bind: Option<String>,
    },
    /// Analyze image files and print the grouped result
    Analyze {
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Print each result as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = Config::from_env()?;

    let ark = ArkService::new(&config)?;
    log::info!("✅ Ark service initialized with model: {}", ark.model());
    let analyzer: Arc<dyn FoodAnalyzer> = Arc::new(ark);

    match cli.command {
        #[cfg(feature = "web-server")]
        Commands::Serve { bind } => serve(&config, analyzer, bind).await,
        Commands::Analyze { images, json } => analyze_files(&config, analyzer, &images, json).await,
    }
}

#[cfg(feature = "web-server")]
async fn serve(config: &Config, analyzer: Arc<dyn FoodAnalyzer>, bind: Option<String>) -> Result<()> {
    use anyhow::Context;

    let addr = bind.unwrap_or_else(|| config.bind_addr.clone());
    let app = web::create_router(
        analyzer,
        ImageIntake::with_limit(config.max_upload_bytes),
        &config.static_dir,
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    log::info!("🌐 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("❌ Failed to listen for Ctrl+C: {}", e);
            }
        })
        .await
        .context("server error")?;

    log::info!("🛑 Shutting down...");
    Ok(())
}

async fn analyze_files(
    config: &Config,
    analyzer: Arc<dyn FoodAnalyzer>,
    images: &[PathBuf],
    json: bool,
) -> Result<()> {
    // JSON goes to stdout, so the shell talks on stderr
    let ui: Arc<dyn UiShell> = if json {
        Arc::new(TerminalShell::new(io::stderr()))
    } else {
        Arc::new(TerminalShell::new(io::stdout()))
    };

    let session = AnalysisSession::new(
        analyzer,
        ui.clone(),
        ImageIntake::with_limit(config.max_upload_bytes),
    );

    let mut failures = 0;
    for path in images {
        let file = match SelectedFile::from_path(path) {
            Ok(file) => file,
            Err(e) => {
                log::error!("❌ {}", e);
                ui.show_error(e.user_message());
                failures += 1;
                continue;
            }
        };

        if session.select_file(&file).is_err() {
            failures += 1;
            continue;
        }

        match session.analyze().await {
            Ok(AnalysisOutcome::Rendered(result)) if json => {
                println!("{}", serde_json::to_string(&result)?);
            }
            Ok(_) => {}
            Err(_) => failures += 1,
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} images could not be analyzed", failures, images.len());
    }

    Ok(())
}
