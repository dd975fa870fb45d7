//! Communication entity (talk or poster presented at an event)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "communications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_comm: i32,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    pub event_title: String,

    pub year: i32,

    pub url: Option<String>,

    pub type_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::production_type::Entity",
        from = "Column::TypeId",
        to = "super::production_type::Column::TypeId",
        on_delete = "Restrict"
    )]
    ProductionType,
}

impl Related<super::production_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionType.def()
    }
}

impl Related<super::researcher::Entity> for Entity {
    fn to() -> RelationDef {
        super::publish_researcher_comm::Relation::Researcher.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::publish_researcher_comm::Relation::Communication.def().rev())
    }
}

impl Related<super::doctoral_student::Entity> for Entity {
    fn to() -> RelationDef {
        super::publish_doctoral_student_comm::Relation::DoctoralStudent.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::publish_doctoral_student_comm::Relation::Communication.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
