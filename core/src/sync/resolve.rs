//! On-demand resolution: map a Bynder id to a local library row, creating
//! it on first sight.
//!
//! Creation is racy by nature: two editors can pick the same asset at the
//! same moment. The loser of that race detects the `bynder_id` uniqueness
//! conflict, throws away the file it stored, and returns the winner's row.

use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, SqlErr};
use tracing::{debug, info};

use crate::db::entities::collection;
use crate::db::Database;
use crate::error::{Result, SyncError};
use crate::sync::{is_up_to_date, ApplyOptions, SyncContext, SyncTarget};

/// Return the local row for `bynder_id`, creating it from the full API
/// record if it doesn't exist yet. When the kind's sync-on-choose policy is
/// enabled, an existing-but-stale row is refreshed before being returned.
pub async fn resolve<T: SyncTarget>(ctx: &SyncContext, bynder_id: &str) -> Result<T::Model> {
    if let Some(existing) = T::find_by_bynder_id(ctx, bynder_id).await? {
        if ctx.config.sync_on_choose(T::KIND) {
            let asset = ctx.bank.media_info(bynder_id).await?;
            if !is_up_to_date(T::last_modified(&existing), &asset) {
                debug!(kind = %T::KIND, bynder_id, "chosen asset is stale, refreshing");
                return T::apply_and_save(ctx, Some(existing), &asset, &ApplyOptions::default())
                    .await;
            }
        }
        return Ok(existing);
    }
    create_object::<T>(ctx, bynder_id).await
}

/// Create the local row for `bynder_id` from its full API record,
/// reconciling a lost concurrent-creation race by adopting the winner's row.
pub async fn create_object<T: SyncTarget>(ctx: &SyncContext, bynder_id: &str) -> Result<T::Model> {
    let asset = ctx.bank.media_info(bynder_id).await?;
    match T::apply_and_save(ctx, None, &asset, &ApplyOptions::default()).await {
        Ok(model) => {
            info!(kind = %T::KIND, bynder_id, "created library object");
            Ok(model)
        }
        Err(err) if err.is_bynder_id_conflict() => {
            let loser_file = match &err {
                SyncError::UniqueViolation { stored_file, .. } => stored_file.clone(),
                _ => None,
            };
            match T::find_by_bynder_id(ctx, bynder_id).await? {
                Some(winner) => {
                    info!(kind = %T::KIND, bynder_id, "lost creation race, adopting existing row");
                    if let Some(path) = loser_file {
                        // Paranoia: never delete the file the winner points at
                        if T::stored_file(&winner).as_deref() != Some(path.as_path()) {
                            ctx.store.discard(&path)?;
                        }
                    }
                    Ok(winner)
                }
                // Conflict but no row to adopt (e.g. the winner was deleted
                // in between): surface the original failure
                None => Err(err),
            }
        }
        Err(err) => Err(err),
    }
}

/// Id of the collection newly synced assets are filed under, creating the
/// collection on first use. Races on creation resolve to whichever row won.
pub(crate) async fn resolve_default_collection(db: &Database, name: &str) -> Result<i32> {
    let found = collection::Entity::find()
        .filter(collection::Column::Name.eq(name))
        .one(db.conn())
        .await?;
    if let Some(existing) = found {
        return Ok(existing.id);
    }

    let active = collection::ActiveModel {
        name: Set(name.to_owned()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    match active.insert(db.conn()).await {
        Ok(model) => {
            info!(name, "created default collection");
            Ok(model.id)
        }
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            collection::Entity::find()
                .filter(collection::Column::Name.eq(name))
                .one(db.conn())
                .await?
                .map(|model| model.id)
                .ok_or(SyncError::Db(err))
        }
        Err(err) => Err(err.into()),
    }
}
