//! Full refresh: walk every synced row and re-apply its upstream record.
//!
//! Unlike the incremental pass, this one is driven by the local table, so
//! it also notices assets Bynder no longer recognises. Those are counted,
//! and deleted only when explicitly asked.

use tracing::{info, warn};

use crate::api::ApiError;
use crate::error::{Result, SyncError};
use crate::sync::{ApplyOptions, SyncContext, SyncTarget};

#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshOptions {
    /// Resume point: skip rows with a smaller numeric id
    pub min_id: Option<i32>,
    /// Re-download files even when fingerprints match
    pub force_download: bool,
    /// Delete rows whose asset no longer exists upstream
    pub delete_unrecognized: bool,
}

#[derive(Debug, Default)]
pub struct RefreshSummary {
    pub processed: u64,
    pub updated: u64,
    /// Rows whose asset Bynder no longer knows
    pub unrecognized: u64,
    pub deleted: u64,
    pub failed: Vec<(String, SyncError)>,
}

/// Re-sync every row of kind `T` that tracks a Bynder asset.
pub async fn sync_all<T: SyncTarget>(ctx: &SyncContext, opts: &RefreshOptions) -> Result<RefreshSummary> {
    let models = T::find_synced(ctx, opts.min_id).await?;
    let mut summary = RefreshSummary::default();
    let apply = ApplyOptions {
        force_download: opts.force_download,
    };

    for model in models {
        let Some(id) = T::bynder_id(&model).map(str::to_owned) else {
            continue;
        };
        summary.processed += 1;

        match ctx.bank.media_info(&id).await {
            Ok(asset) => match T::apply_and_save(ctx, Some(model), &asset, &apply).await {
                Ok(_) => summary.updated += 1,
                Err(err) => {
                    warn!(kind = %T::KIND, bynder_id = %id, %err, "failed to refresh row");
                    summary.failed.push((id, err));
                }
            },
            Err(ApiError::NotFound(_)) => {
                summary.unrecognized += 1;
                if opts.delete_unrecognized {
                    match T::delete(ctx, model).await {
                        Ok(()) => {
                            info!(kind = %T::KIND, bynder_id = %id, "deleted unrecognized row");
                            summary.deleted += 1;
                        }
                        Err(err) => summary.failed.push((id, err)),
                    }
                } else {
                    warn!(kind = %T::KIND, bynder_id = %id, "asset no longer exists in Bynder");
                }
            }
            Err(err) => {
                warn!(kind = %T::KIND, bynder_id = %id, %err, "failed to fetch record");
                summary.failed.push((id, err.into()));
            }
        }
    }

    info!(
        kind = %T::KIND,
        processed = summary.processed,
        updated = summary.updated,
        unrecognized = summary.unrecognized,
        deleted = summary.deleted,
        failed = summary.failed.len(),
        "full refresh finished"
    );
    Ok(summary)
}
