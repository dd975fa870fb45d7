//! Supervision of a doctoral student by a researcher

use crate::db::lifecycle::{self, SupervisionStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "supervisions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub res_code: i32,

    #[sea_orm(primary_key, auto_increment = false)]
    pub reg_num: i64,

    pub start_date: Date,

    pub end_date: Option<Date>,

    #[sea_orm(column_type = "Text")]
    pub theme: String,
}

impl Model {
    /// Whether the supervision is still running
    pub fn is_active(&self) -> bool {
        self.end_date.is_none()
    }

    pub fn status(&self) -> SupervisionStatus {
        SupervisionStatus::of(self.end_date)
    }

    pub fn duration_months(&self, today: Date) -> i64 {
        lifecycle::duration_months(self.start_date, self.end_date, today)
    }
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
        belongs_to = "super::doctoral_student::Entity",
        from = "Column::RegNum",
        to = "super::doctoral_student::Column::RegNum",
        on_delete = "Cascade"
    )]
    DoctoralStudent,
}

impl Related<super::researcher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Researcher.def()
    }
}

impl Related<super::doctoral_student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DoctoralStudent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
