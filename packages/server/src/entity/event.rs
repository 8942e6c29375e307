use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Questions and answers of the event are frozen once this passes.
    #[sea_orm(indexed)]
    pub deadline: DateTimeUtc,

    #[sea_orm(has_many)]
    pub questions: HasMany<super::question::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn is_closed(&self, now: DateTimeUtc) -> bool {
        self.deadline < now
    }
}

impl ActiveModelBehavior for ActiveModel {}
