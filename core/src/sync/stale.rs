//! Incremental sync: update local rows whose Bynder counterpart changed
//! recently.
//!
//! The listing is walked page by page and accumulated into batches keyed by
//! asset id, so an asset that appears twice in one window is applied once
//! with its latest record. Staleness is decided by one query per batch
//! rather than one per asset.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::api::{Asset, MediaPages, MediaQuery};
use crate::error::{Result, SyncError};
use crate::sync::{ApplyOptions, SyncContext, SyncTarget};

#[derive(Debug, Clone, Copy)]
pub struct StaleOptions {
    /// Inclusive lower bound on upstream modification time
    pub since: DateTime<Utc>,
    /// Listing page size, which is also the batch size
    pub page_size: u64,
}

#[derive(Debug, Default)]
pub struct StaleSummary {
    /// Assets the listing returned
    pub listed: u64,
    /// Local rows found stale against the listing
    pub stale: u64,
    pub updated: u64,
    /// Per-asset failures; one bad asset never aborts the run
    pub failed: Vec<(String, SyncError)>,
}

/// Sync all local rows of kind `T` whose asset was modified since
/// `opts.since`. Assets with no local row are skipped: this pass refreshes
/// the library, it does not grow it.
pub async fn sync_stale<T: SyncTarget>(ctx: &SyncContext, opts: &StaleOptions) -> Result<StaleSummary> {
    let query = MediaQuery {
        modified_since: Some(opts.since),
        page_size: opts.page_size,
        asset_type: Some(T::KIND),
    };
    let mut pages = MediaPages::new(ctx.bank.as_ref(), query);
    let mut summary = StaleSummary::default();
    let mut batch: HashMap<String, Asset> = HashMap::new();

    while let Some(assets) = pages.next_page().await? {
        for asset in assets {
            summary.listed += 1;
            batch.insert(asset.id.clone(), asset);
            if batch.len() as u64 >= opts.page_size {
                flush::<T>(ctx, &mut batch, &mut summary).await?;
            }
        }
    }
    flush::<T>(ctx, &mut batch, &mut summary).await?;

    info!(
        kind = %T::KIND,
        listed = summary.listed,
        stale = summary.stale,
        updated = summary.updated,
        failed = summary.failed.len(),
        "stale sync finished"
    );
    Ok(summary)
}

async fn flush<T: SyncTarget>(
    ctx: &SyncContext,
    batch: &mut HashMap<String, Asset>,
    summary: &mut StaleSummary,
) -> Result<()> {
    if batch.is_empty() {
        return Ok(());
    }
    let stale = T::find_stale(ctx, batch).await?;
    info!(kind = %T::KIND, batch_size = batch.len(), stale = stale.len(), "processing listing batch");
    summary.stale += stale.len() as u64;

    for model in stale {
        let Some(id) = T::bynder_id(&model).map(str::to_owned) else {
            continue;
        };
        let Some(record) = batch.get(&id) else {
            continue;
        };
        let result = apply_one::<T>(ctx, model, &id, record).await;
        match result {
            Ok(()) => summary.updated += 1,
            Err(err) => {
                warn!(kind = %T::KIND, bynder_id = %id, %err, "failed to update stale row");
                summary.failed.push((id, err));
            }
        }
    }

    batch.clear();
    Ok(())
}

async fn apply_one<T: SyncTarget>(
    ctx: &SyncContext,
    model: T::Model,
    id: &str,
    listing_record: &Asset,
) -> Result<()> {
    let full_record;
    let asset = if T::NEEDS_FULL_RECORD {
        full_record = ctx.bank.media_info(id).await?;
        &full_record
    } else {
        listing_record
    };
    T::apply_and_save(ctx, Some(model), asset, &ApplyOptions::default()).await?;
    Ok(())
}
