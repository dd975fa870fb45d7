//! Equipment loaned to a researcher
//!
//! One row per (researcher, equipment) pair. A row without `return_date`
//! is an open loan.

use crate::db::lifecycle::{self, LoanStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assign_researchers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub res_code: i32,

    #[sea_orm(primary_key, auto_increment = false)]
    pub inventory_num: String,

    pub assign_date: Date,

    pub return_date: Option<Date>,
}

impl Model {
    /// Whether the equipment is still out
    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }

    pub fn status(&self) -> LoanStatus {
        LoanStatus::of(self.return_date)
    }

    /// Loan length in 30-day months, counted up to `today` while open
    pub fn duration_months(&self, today: Date) -> i64 {
        lifecycle::duration_months(self.assign_date, self.return_date, today)
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
        belongs_to = "super::equipment::Entity",
        from = "Column::InventoryNum",
        to = "super::equipment::Column::InventoryNum",
        on_delete = "Cascade"
    )]
    Equipment,
}

impl Related<super::researcher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Researcher.def()
    }
}

impl Related<super::equipment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Equipment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
