//! Authorship of a publication by a doctoral student

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "publish_doctoral_student_pubs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub reg_num: i64,

    #[sea_orm(primary_key, auto_increment = false)]
    pub doi: String,
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
        belongs_to = "super::publication::Entity",
        from = "Column::Doi",
        to = "super::publication::Column::Doi",
        on_delete = "Cascade"
    )]
    Publication,
}

impl ActiveModelBehavior for ActiveModel {}
