use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "athlete")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birthday: Option<Date>,
    #[sea_orm(indexed)]
    pub country: String,
    pub gender: String,

    #[sea_orm(has_many, via = "athlete_discipline")]
    pub disciplines: HasMany<super::discipline::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
