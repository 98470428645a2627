//! `bynder-sync` command line interface.
//!
//! Three entry points, mirroring the scheduled jobs a deployment runs:
//! `update-stale` for the frequent incremental pass, `update-all` for the
//! occasional full reconciliation, and `resolve` for pulling a single asset
//! into the library by hand.

use anyhow::Result;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use bynder_sync_core::api::BynderClient;
use bynder_sync_core::db::Database;
use bynder_sync_core::sync::document::DocumentSync;
use bynder_sync_core::sync::image::ImageSync;
use bynder_sync_core::sync::video::VideoSync;
use bynder_sync_core::sync::{
    resolve, sync_all, sync_stale, RefreshOptions, StaleOptions, SyncContext, SyncTarget,
};
use bynder_sync_core::{AssetKind, BynderConfig};

#[derive(Parser)]
#[command(name = "bynder-sync", version, about = "Sync Bynder assets into the local library")]
struct Cli {
    /// Data directory holding the config file, database and media store
    #[arg(long, env = "BYNDER_SYNC_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Image,
    Document,
    Video,
}

impl From<KindArg> for AssetKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Image => Self::Image,
            KindArg::Document => Self::Document,
            KindArg::Video => Self::Video,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Update local rows whose asset changed in Bynder recently
    UpdateStale {
        #[arg(value_enum)]
        kind: KindArg,
        /// Look-back window in days (default when no window is given: 1 day)
        #[arg(long, conflicts_with_all = ["hours", "minutes"])]
        days: Option<i64>,
        /// Look-back window in hours
        #[arg(long, conflicts_with = "minutes")]
        hours: Option<i64>,
        /// Look-back window in minutes
        #[arg(long)]
        minutes: Option<i64>,
        /// Listing page size and update batch size
        #[arg(long, default_value_t = 200)]
        page_size: u64,
    },
    /// Re-sync every row that tracks a Bynder asset
    UpdateAll {
        #[arg(value_enum)]
        kind: KindArg,
        /// Resume from this local row id
        #[arg(long)]
        min_object_id: Option<i32>,
        /// Re-download files even when fingerprints match
        #[arg(long)]
        force_download: bool,
        /// Delete rows whose asset no longer exists in Bynder
        #[arg(long)]
        delete_unrecognized: bool,
    },
    /// Pull one asset into the library, creating its row if needed
    Resolve {
        #[arg(value_enum)]
        kind: KindArg,
        bynder_id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failures) => {
            eprintln!("{failures} asset(s) failed to sync; see the log for details");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<u64> {
    let config = match &cli.data_dir {
        Some(dir) => BynderConfig::load_from(dir)?,
        None => BynderConfig::load()?,
    };
    anyhow::ensure!(
        !config.domain.is_empty(),
        "no Bynder domain configured; set `domain` in the config file"
    );
    config.ensure_directories()?;

    let db = Database::open(&config.db_path()).await?;
    db.migrate().await?;

    let bank = Arc::new(BynderClient::new(
        reqwest::Client::new(),
        config.api_base_url(),
        config.api_token.clone(),
    ));
    let ctx = SyncContext::new(db, bank, config).await?;

    match cli.command {
        Command::UpdateStale {
            kind,
            days,
            hours,
            minutes,
            page_size,
        } => {
            let window = days
                .map(Duration::days)
                .or(hours.map(Duration::hours))
                .or(minutes.map(Duration::minutes))
                .unwrap_or_else(|| Duration::days(1));
            let opts = StaleOptions {
                since: Utc::now() - window,
                page_size,
            };
            match kind.into() {
                AssetKind::Image => run_stale::<ImageSync>(&ctx, &opts).await,
                AssetKind::Document => run_stale::<DocumentSync>(&ctx, &opts).await,
                AssetKind::Video => run_stale::<VideoSync>(&ctx, &opts).await,
            }
        }
        Command::UpdateAll {
            kind,
            min_object_id,
            force_download,
            delete_unrecognized,
        } => {
            let opts = RefreshOptions {
                min_id: min_object_id,
                force_download,
                delete_unrecognized,
            };
            match kind.into() {
                AssetKind::Image => run_refresh::<ImageSync>(&ctx, &opts).await,
                AssetKind::Document => run_refresh::<DocumentSync>(&ctx, &opts).await,
                AssetKind::Video => run_refresh::<VideoSync>(&ctx, &opts).await,
            }
        }
        Command::Resolve { kind, bynder_id } => match kind.into() {
            AssetKind::Image => run_resolve::<ImageSync>(&ctx, &bynder_id).await,
            AssetKind::Document => run_resolve::<DocumentSync>(&ctx, &bynder_id).await,
            AssetKind::Video => run_resolve::<VideoSync>(&ctx, &bynder_id).await,
        },
    }
}

async fn run_stale<T: SyncTarget>(ctx: &SyncContext, opts: &StaleOptions) -> Result<u64> {
    let summary = sync_stale::<T>(ctx, opts).await?;
    println!(
        "{}: {} listed, {} stale, {} updated, {} failed",
        T::KIND,
        summary.listed,
        summary.stale,
        summary.updated,
        summary.failed.len()
    );
    Ok(summary.failed.len() as u64)
}

async fn run_refresh<T: SyncTarget>(ctx: &SyncContext, opts: &RefreshOptions) -> Result<u64> {
    let summary = sync_all::<T>(ctx, opts).await?;
    println!(
        "{}: {} processed, {} updated, {} unrecognized, {} deleted, {} failed",
        T::KIND,
        summary.processed,
        summary.updated,
        summary.unrecognized,
        summary.deleted,
        summary.failed.len()
    );
    Ok(summary.failed.len() as u64)
}

async fn run_resolve<T: SyncTarget>(ctx: &SyncContext, bynder_id: &str) -> Result<u64> {
    let model = resolve::<T>(ctx, bynder_id).await?;
    println!("{}: resolved '{bynder_id}' to local id {}", T::KIND, T::numeric_id(&model));
    Ok(0)
}
