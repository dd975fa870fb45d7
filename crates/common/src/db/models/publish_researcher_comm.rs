//! Authorship of a communication by a researcher

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "publish_researcher_comms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub res_code: i32,

    #[sea_orm(primary_key, auto_increment = false)]
    pub id_comm: i32,
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
        belongs_to = "super::communication::Entity",
        from = "Column::IdComm",
        to = "super::communication::Column::IdComm",
        on_delete = "Cascade"
    )]
    Communication,
}

impl ActiveModelBehavior for ActiveModel {}
