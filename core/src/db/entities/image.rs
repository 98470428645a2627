//! Image entity.
//!
//! Tracks the Bynder asset a library image mirrors, the converted file on
//! disk, and the focal rectangle derived from the asset's focus point.
//! `bynder_id` is nullable so locally created images can coexist, but unique
//! among the rows that have one.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "images")]
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
    /// Filename of the upstream source derivative this file was made from
    pub source_filename: Option<String>,
    /// Size and dimensions of the asset's original upload, for change
    /// detection
    pub original_filesize: Option<i64>,
    pub original_width: Option<i32>,
    pub original_height: Option<i32>,
    /// Converted file in the media store
    pub file_path: String,
    pub width: i32,
    pub height: i32,
    pub file_size: i64,
    pub mime_type: String,
    pub focal_point_x: Option<i32>,
    pub focal_point_y: Option<i32>,
    pub focal_point_width: Option<i32>,
    pub focal_point_height: Option<i32>,
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
