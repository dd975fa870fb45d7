//! Laboratory entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "laboratories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub lab_code: i32,

    #[sea_orm(unique)]
    pub lab_name: String,

    pub lab_abbr: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub lab_desc: Option<String>,

    pub lab_address: Option<String>,

    pub lab_phone: Option<String>,

    pub faculty_id: i32,

    pub domain_id: i32,

    pub dept_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::faculty::Entity",
        from = "Column::FacultyId",
        to = "super::faculty::Column::FacultyId",
        on_delete = "Restrict"
    )]
    Faculty,

    #[sea_orm(
        belongs_to = "super::domain::Entity",
        from = "Column::DomainId",
        to = "super::domain::Column::DomainId",
        on_delete = "Restrict"
    )]
    Domain,

    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DeptId",
        to = "super::department::Column::DeptId",
        on_delete = "Restrict"
    )]
    Department,
}

impl Related<super::faculty::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Faculty.def()
    }
}

impl Related<super::domain::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Domain.def()
    }
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
