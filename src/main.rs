mod app;
mod config;
mod domain;
mod error;
mod repo;
mod scheduler;
mod ui;
mod usecase;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use config::Config;
use domain::state::AppState;
use domain::todo::Todo;
use repo::KeyValueStore;
use repo::http::HttpTodoBackend;
use repo::memory::MemoryKv;
use repo::sqlite::SqliteKv;
use usecase::store::{StateStore, StorageLayout, encode_state};

#[derive(Parser, Debug)]
#[command(author, version, about = "tasuku: filterable todo list in the terminal", long_about = None)]
struct Args {
    /// Tick interval of render loop in milliseconds
    #[arg(long, default_value_t = 120)]
    tick_ms: u64,

    /// Start with demo tasks (in memory)
    #[arg(long, default_value_t = false)]
    demo: bool,

    /// Use in-memory store instead of SQLite
    #[arg(long, default_value_t = false)]
    memory: bool,

    /// Path to SQLite DB file (default: OS data dir)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Store todos and filters under separate keys
    #[arg(long, default_value_t = false)]
    split_keys: bool,

    /// Todos endpoint of a REST backend (or env TASUKU_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Log file (default: OS data dir)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = build_config(&args)?;

    let log_path = match args.log_file.clone() {
        Some(path) => path,
        None => config::app_data_dir()?.join("tasuku.log"),
    };
    let _guard = init_logging(&log_path)?;

    let kv: Box<dyn KeyValueStore> = if args.demo {
        Box::new(MemoryKv::with_seed(demo_entries(config.layout)?))
    } else if args.memory {
        Box::new(MemoryKv::default())
    } else if let Some(path) = args.db_path.as_ref() {
        Box::new(SqliteKv::open(path)?)
    } else {
        Box::new(SqliteKv::open_default()?)
    };

    let mut store = StateStore::new(kv, config.layout);
    if let Some(url) = config.api_url.as_ref() {
        let backend = HttpTodoBackend::new(url.clone(), config.request_timeout)?;
        store = store.with_backend(Box::new(backend));
    }
    store.initialize();

    let mut app = App::new(store, &config);
    if let Some(url) = config.api_url.as_ref() {
        app.set_status(&format!("Todos served by {url}"));
    }
    ui::run(app, config.tick)
}

fn build_config(args: &Args) -> Result<Config> {
    let api_url = match args.api_url.as_deref() {
        Some(raw) => Some(config::non_blank("--api-url", raw)?),
        None => config::api_url_from_env()?,
    };
    Ok(Config {
        layout: if args.split_keys {
            StorageLayout::Split
        } else {
            StorageLayout::SingleBlob
        },
        api_url,
        tick: Duration::from_millis(args.tick_ms),
        ..Config::default()
    })
}

fn init_logging(path: &Path) -> Result<WorkerGuard> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("log path {} has no file name", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log dir {}", dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(guard)
}

fn demo_entries(layout: StorageLayout) -> Result<Vec<(String, serde_json::Value)>> {
    let mut done = Todo::new(3, "Draft release notes");
    done.done = true;
    let state = AppState::restore(
        vec![
            Todo::new(1, "Write documentation"),
            Todo::new(2, "Check PRs waiting for review"),
            done,
        ],
        Default::default(),
        0,
    )
    .context("failed to build demo state")?;
    let entries = encode_state(layout, &state).context("failed to encode demo state")?;
    Ok(entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect())
}
