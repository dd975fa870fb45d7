//! Authorship of a publication by a researcher

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "publish_researcher_pubs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub res_code: i32,

    #[sea_orm(primary_key, auto_increment = false)]
    pub doi: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::researcher::Entity",
        from = "Column::ResCode",
        to = "super::researcher::Column::ResCode",
        on_delete = "Cascade"
    )]
    Researcher,

    #[sea_orm(
        belongs_to = "super::publication::Entity",
        from = "Column::Doi",
        to = "super::publication::Column::Doi",
        on_delete = "Cascade"
    )]
    Publication,
}

impl ActiveModelBehavior for ActiveModel {}
