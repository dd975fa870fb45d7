//! Equipment entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Operational status of a piece of equipment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    Available,
    InUse,
    Maintenance,
    OutOfService,
}

impl EquipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentStatus::Available => "available",
            EquipmentStatus::InUse => "in_use",
            EquipmentStatus::Maintenance => "maintenance",
            EquipmentStatus::OutOfService => "out_of_service",
        }
    }

    /// Parse a stored or submitted status, `None` for unknown values
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(EquipmentStatus::Available),
            "in_use" => Some(EquipmentStatus::InUse),
            "maintenance" => Some(EquipmentStatus::Maintenance),
            "out_of_service" => Some(EquipmentStatus::OutOfService),
            _ => None,
        }
    }

    /// Whether units in this status may be lent out
    pub fn is_lendable(&self) -> bool {
        matches!(self, EquipmentStatus::Available | EquipmentStatus::InUse)
    }
}

impl From<EquipmentStatus> for String {
    fn from(status: EquipmentStatus) -> Self {
        status.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "equipment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub inventory_num: String,

    pub equip_name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub equip_desc: Option<String>,

    pub acq_date: Option<Date>,

    pub purchase_price: Option<f64>,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    /// Number of identical units under this inventory number
    pub quantity: i32,

    pub lab_code: i32,
}

impl Model {
    /// Get the status as an enum (unknown values read as available)
    pub fn equipment_status(&self) -> EquipmentStatus {
        EquipmentStatus::parse(&self.status).unwrap_or(EquipmentStatus::Available)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::laboratory::Entity",
        from = "Column::LabCode",
        to = "super::laboratory::Column::LabCode",
        on_delete = "Restrict"
    )]
    Laboratory,
}

impl Related<super::laboratory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Laboratory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
