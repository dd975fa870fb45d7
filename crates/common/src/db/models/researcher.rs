//! Researcher entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "researchers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub res_code: i32,

    pub firstname: String,

    pub lastname: String,

    pub firstname_ar: Option<String>,

    pub lastname_ar: Option<String>,

    /// `male` or `female`
    pub gender: String,

    pub grade: Option<String>,

    #[sea_orm(unique)]
    pub email: String,

    pub phone: Option<String>,

    #[sea_orm(unique, nullable)]
    pub orcid_id: Option<String>,

    pub google_scholar_url: Option<String>,

    pub research_gate_url: Option<String>,

    pub dblp_url: Option<String>,

    pub publication_count: Option<i32>,

    pub citation_count: Option<i32>,

    pub is_director: bool,

    pub func_code: i32,

    pub spec_code: i32,

    pub team_id: i32,

    pub lab_code: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::function::Entity",
        from = "Column::FuncCode",
        to = "super::function::Column::FuncCode",
        on_delete = "Restrict"
    )]
    Function,

    #[sea_orm(
        belongs_to = "super::speciality::Entity",
        from = "Column::SpecCode",
        to = "super::speciality::Column::SpecCode",
        on_delete = "Restrict"
    )]
    Speciality,

    #[sea_orm(
        belongs_to = "super::team::Entity",
        from = "Column::TeamId",
        to = "super::team::Column::TeamId",
        on_delete = "Restrict"
    )]
    Team,

    #[sea_orm(
        belongs_to = "super::laboratory::Entity",
        from = "Column::LabCode",
        to = "super::laboratory::Column::LabCode",
        on_delete = "Restrict"
    )]
    Laboratory,
}

impl Related<super::function::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Function.def()
    }
}

impl Related<super::speciality::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Speciality.def()
    }
}

impl Related<super::team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl Related<super::laboratory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Laboratory.def()
    }
}

impl Related<super::publication::Entity> for Entity {
    fn to() -> RelationDef {
        super::publish_researcher_pub::Relation::Publication.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::publish_researcher_pub::Relation::Researcher.def().rev())
    }
}

impl Related<super::communication::Entity> for Entity {
    fn to() -> RelationDef {
        super::publish_researcher_comm::Relation::Communication.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::publish_researcher_comm::Relation::Researcher.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
