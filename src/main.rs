use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cartoquartier::{
    animator::PhaseAnimator,
    api::{self, AppState},
    config::Config,
    db,
    models::{FilterState, LevelFilter, PhaseFilter},
    session::MapSession,
    store::{self, FeatureStore, LocalCache},
    style::resolve_style,
    sync::{HttpSync, NoopSync, RemoteSync},
};

#[derive(Parser)]
#[command(name = "cartoquartier")]
#[command(about = "Sector map viewer and editor for urban-renewal programmes")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the map server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// GeoJSON document loaded when the cache is empty
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Cache database path
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Print the resolved style of every feature in a document
    Styles {
        /// GeoJSON document
        file: PathBuf,

        /// Phase filter ("all", "phase 1", ...)
        #[arg(long, default_value = "all")]
        phase: String,

        /// Level filter ("all", "-1", "0", ...)
        #[arg(long, default_value = "all", allow_hyphen_values = true)]
        level: String,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Remove the cached collection so the next start reloads the document
    ClearCache {
        /// Cache database path
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "cartoquartier=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_database(path: Option<PathBuf>) -> anyhow::Result<db::Database> {
    match path {
        Some(path) => db::Database::open(path),
        None => db::Database::open_default(),
    }
}

async fn serve(
    mut config: Config,
    port: u16,
    data: Option<PathBuf>,
    db_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    if data.is_some() {
        config.data_path = data;
    }
    if db_path.is_some() {
        config.db_path = db_path;
    }

    let cache: Arc<dyn LocalCache> = Arc::new(open_database(config.db_path.clone())?);
    let remote: Arc<dyn RemoteSync> = match &config.remote_url {
        Some(url) => {
            tracing::info!("Saved edits will be pushed to {}", url);
            Arc::new(HttpSync::new(url.clone()))
        }
        None => Arc::new(NoopSync),
    };

    let (store, source) = FeatureStore::load(
        config.cache_key.clone(),
        config.data_path.as_deref(),
        cache,
        remote,
    );
    tracing::info!(?source, features = store.collection().len(), "Feature store ready");

    let state = AppState::new(
        MapSession::new(store),
        PhaseAnimator::new(config.animation_interval()),
    );
    let app = api::create_router_with_cors(state, config.cors_origins.as_deref());

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("CartoQuartier listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

fn print_styles(file: PathBuf, phase: &str, level: &str, json: bool) -> anyhow::Result<()> {
    let collection = store::read_document(&file)?;
    let filter = FilterState {
        phase: PhaseFilter::parse(phase),
        level: LevelFilter::parse(level)?,
    };

    if json {
        let styles: Vec<_> = collection
            .iter()
            .map(|f| {
                serde_json::json!({
                    "id": f.key(),
                    "label": f.label(),
                    "style": resolve_style(f, &filter),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&styles)?);
        return Ok(());
    }

    for feature in collection.iter() {
        let style = resolve_style(feature, &filter);
        let id = feature.key().map(|id| id.to_string()).unwrap_or_default();
        println!(
            "{:<8} {:<24} {} {:.2}",
            id,
            feature.label(),
            style.color,
            style.fill_opacity
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::load();

    match cli.command {
        Some(Commands::Serve { port, data, db }) => serve(config, port, data, db).await?,
        Some(Commands::Styles {
            file,
            phase,
            level,
            json,
        }) => print_styles(file, &phase, &level, json)?,
        Some(Commands::ClearCache { db }) => {
            let db = open_database(db.or(config.db_path))?;
            let removed = db
                .delete_collection(&config.cache_key)
                .context("Failed to clear cache")?;
            if removed {
                println!("Cleared cached collection {:?}", config.cache_key);
            } else {
                println!("Nothing cached under {:?}", config.cache_key);
            }
        }
        None => serve(config, 3000, None, None).await?,
    }

    Ok(())
}
