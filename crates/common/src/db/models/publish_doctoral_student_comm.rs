//! Authorship of a communication by a doctoral student

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "publish_doctoral_student_comms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub reg_num: i64,

    #[sea_orm(primary_key, auto_increment = false)]
    pub id_comm: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::doctoral_student::Entity",
        from = "Column::RegNum",
        to = "super::doctoral_student::Column::RegNum",
        on_delete = "Cascade"
    )]
    DoctoralStudent,

    #[sea_orm(
        belongs_to = "super::communication::Entity",
        from = "Column::IdComm",
        to = "super::communication::Column::IdComm",
        on_delete = "Cascade"
    )]
    Communication,
}

impl ActiveModelBehavior for ActiveModel {}
