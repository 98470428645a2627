//! Document entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
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
    /// Stored original in the media store
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
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
