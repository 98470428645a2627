//! Video entity.
//!
//! Videos are reference-only: no file is downloaded. The row stores the
//! derivative URLs Bynder serves the footage from, plus a poster image URL.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "videos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub bynder_id: Option<String>,
    pub bynder_last_modified: Option<DateTimeUtc>,
    pub title: String,
    pub description: String,
    pub copyright: String,
    pub is_archived: bool,
    pub is_limited_use: bool,
    pub is_public: bool,
    pub collection_id: Option<i32>,
    pub source_filename: Option<String>,
    pub original_filesize: Option<i64>,
    pub original_width: Option<i32>,
    pub original_height: Option<i32>,
    /// Streamable derivative URLs
    pub primary_url: String,
    pub fallback_url: Option<String>,
    pub poster_url: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::collection::Entity",
        from = "Column::CollectionId",
        to = "super::collection::Column::Id"
    )]
    Collection,
}

impl Related<super::collection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collection.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
