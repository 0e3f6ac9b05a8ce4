use catalog_enrich::cache::StatusCache;
use catalog_enrich::catalog::{CatalogClient, Item};
use catalog_enrich::clock::SystemClock;
use catalog_enrich::config::Config;
use catalog_enrich::display::DisplayLabels;
use catalog_enrich::scheduler::{IdleHost, PageLoad, RuntimeIdle, Scheduler};
use catalog_enrich::surface::{SurfaceKind, SurfaceSession};
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "catalog-enrich")]
#[command(about = "Backfill and label catalog listings against a live catalog API")]
#[command(version)]
struct Args {
  /// JSON file holding the base items (an array)
  #[arg(short, long)]
  items: PathBuf,

  /// Surface the items are shown on
  #[arg(short, long, value_enum, default_value_t = SurfaceKind::Listing)]
  surface: SurfaceKind,

  /// Path to config file (default: $XDG_CONFIG_HOME/catalog-enrich/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Catalog API base URL, overrides the config file
  #[arg(long, env = "CATALOG_ENRICH_URL")]
  base_url: Option<String>,

  /// How long to wait for enrichment to settle
  #[arg(long, default_value_t = 15_000)]
  settle_ms: u64,

  /// Write logs to this file instead of stderr
  #[arg(long)]
  log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_logging(args.log_file.as_deref())?;

  // Load configuration
  let config = Config::load(args.config.as_deref(), args.base_url.clone())?;
  let items = read_items(&args.items)?;

  let client = Arc::new(CatalogClient::new(&config)?);
  let cache = StatusCache::init(Arc::new(SystemClock), config.status_cache.ttl()?);
  // Nothing else competes for the page here, so it counts as loaded
  let idle: Arc<dyn IdleHost> = Arc::new(RuntimeIdle);
  let scheduler = Scheduler::new(PageLoad::loaded(), Some(idle));

  let mut session = SurfaceSession::new(args.surface, client, cache, scheduler, &config.enrichment);
  tracing::info!(
    surface = args.surface.label(),
    items = items.len(),
    "enriching"
  );
  session.set_items(items);

  if !session
    .run_until_settled(Duration::from_millis(args.settle_ms))
    .await
  {
    tracing::warn!(settle_ms = args.settle_ms, "gave up waiting; printing what is known");
  }

  for item in session.snapshot().items {
    print_item(&item);
  }
  session.dispose();

  Ok(())
}

fn init_logging(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("catalog_enrich=info"));

  match log_file {
    Some(path) => {
      let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| eyre!("Failed to open log file {}: {}", path.display(), e))?;
      let (writer, guard) = tracing_appender::non_blocking(file);
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .init();
      Ok(Some(guard))
    }
    None => {
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
      Ok(None)
    }
  }
}

fn read_items(path: &Path) -> Result<Vec<Item>> {
  let contents = std::fs::read_to_string(path)
    .map_err(|e| eyre!("Failed to read items file {}: {}", path.display(), e))?;
  serde_json::from_str(&contents)
    .map_err(|e| eyre!("Failed to parse items file {}: {}", path.display(), e))
}

fn print_item(item: &Item) {
  let labels = DisplayLabels::derive(item);
  let field = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());

  println!(
    "{}\t{}\tyear={}\tmileage={}\ttransmission={}\tdrivetrain={}\tfuel={}\tstatus={}",
    item.handle,
    item.title,
    field(labels.year),
    field(labels.mileage),
    field(labels.transmission.map(|t| t.to_string())),
    field(labels.drivetrain.map(|d| d.to_string())),
    field(labels.fuel.map(|f| f.to_string())),
    field(labels.status),
  );
}
