use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "discipline")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    /// e.g. "track", "field", "road".
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub kind: String,

    #[sea_orm(has_many, via = "athlete_discipline")]
    pub athletes: HasMany<super::athlete::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
