use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use station_sync::config::Config;
use station_sync::infra::http_client::ReqwestHttp;
use station_sync::logging;
use station_sync::lookup;
use station_sync::pipeline::{Pipeline, PipelineResult, StationStatus};
use station_sync::storage::{InMemoryStorage, Storage};

#[derive(Parser)]
#[command(name = "station_sync")]
#[command(about = "Radio station schedule and presenter roster synchroniser")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronise programme schedules
    Schedule {
        /// Specific stations to run (comma-separated)
        #[arg(long, value_delimiter = ',')]
        stations: Option<Vec<String>>,
    },
    /// Synchronise presenter rosters
    Presenters {
        /// Specific stations to run (comma-separated)
        #[arg(long, value_delimiter = ',')]
        stations: Option<Vec<String>>,
    },
    /// Synchronise schedules, then presenter rosters
    Run {
        /// Specific stations to run (comma-separated)
        #[arg(long, value_delimiter = ',')]
        stations: Option<Vec<String>>,
    },
    /// Show what is currently on air
    Now {
        #[arg(long)]
        station: String,
    },
}

fn print_results(result: &PipelineResult) {
    println!("\n📊 Sync Results:");
    for outcome in &result.outcomes {
        match &outcome.status {
            StationStatus::Synchronised(report) => println!(
                "   ✅ {} {}: {} created, {} updated, {} deleted",
                outcome.station, outcome.target, report.created, report.updated, report.deleted
            ),
            StationStatus::Skipped { reason } => {
                println!("   ⏭️  {} {}: skipped ({})", outcome.station, outcome.target, reason)
            }
            StationStatus::Failed { error } => {
                println!("   ❌ {} {}: {}", outcome.station, outcome.target, error)
            }
        }
    }
    println!(
        "   Synchronised: {}, Skipped: {}, Failed: {}",
        result.synchronised(),
        result.skipped(),
        result.failed()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config_path = Config::resolve_path(cli.config)?;
    let config = Config::load(&config_path)?;

    let _guard = logging::init_logging(&config.logging);
    info!("Loaded config from {}", config_path.display());

    let storage = Arc::new(InMemoryStorage::load_snapshot(&config.storage.snapshot_path)?);

    let (stations, target) = match cli.command {
        Commands::Now { station } => {
            let at = Local::now().naive_local();
            match lookup::current_entry(&*storage, &station, at).await? {
                Some(entry) => println!("📻 {}", entry),
                None => println!("Nothing scheduled on {} right now", station),
            }
            return Ok(());
        }
        Commands::Schedule { stations } => {
            println!("🔄 Synchronising schedules...");
            (stations, Target::Schedule)
        }
        Commands::Presenters { stations } => {
            println!("🔄 Synchronising presenters...");
            (stations, Target::Presenters)
        }
        Commands::Run { stations } => {
            println!("🔄 Synchronising schedules and presenters...");
            (stations, Target::All)
        }
    };

    let selected = config.select_stations(stations.as_deref())?;
    if selected.is_empty() {
        warn!("No stations configured in {}", config_path.display());
    }

    let http = Arc::new(ReqwestHttp::new(&config.http)?);
    let shared: Arc<dyn Storage> = storage.clone();
    let pipeline = Pipeline::new(http, shared);

    let outcome = match target {
        Target::Schedule => pipeline.run_schedules(&selected).await,
        Target::Presenters => pipeline.run_presenters(&selected).await,
        Target::All => pipeline.run_all(&selected).await,
    };
    print_results(&outcome);

    if let Err(e) = storage.save_snapshot(&config.storage.snapshot_path) {
        error!("Failed to save store snapshot: {}", e);
        return Err(e.into());
    }
    info!("Saved store snapshot to {}", config.storage.snapshot_path.display());

    Ok(())
}

enum Target {
    Schedule,
    Presenters,
    All,
}
