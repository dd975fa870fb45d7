//! Equipment loaned to a doctoral student

use crate::db::lifecycle::{self, LoanStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assign_doctoral_students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub reg_num: i64,

    #[sea_orm(primary_key, auto_increment = false)]
    pub inventory_num: String,

    pub assign_date: Date,

    pub return_date: Option<Date>,
}

impl Model {
    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }

    pub fn status(&self) -> LoanStatus {
        LoanStatus::of(self.return_date)
    }

    pub fn duration_months(&self, today: Date) -> i64 {
        lifecycle::duration_months(self.assign_date, self.return_date, today)
    }
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
        belongs_to = "super::equipment::Entity",
        from = "Column::InventoryNum",
        to = "super::equipment::Column::InventoryNum",
        on_delete = "Cascade"
    )]
    Equipment,
}

impl Related<super::doctoral_student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DoctoralStudent.def()
    }
}

impl Related<super::equipment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Equipment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
