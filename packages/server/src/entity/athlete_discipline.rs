use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "athlete_discipline")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub athlete_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub discipline_id: i32,
    #[sea_orm(belongs_to, from = "athlete_id", to = "id")]
    pub athlete: HasOne<super::athlete::Entity>,
    #[sea_orm(belongs_to, from = "discipline_id", to = "id")]
    pub discipline: HasOne<super::discipline::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
