//! Publication entity, identified by its DOI

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "publications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub doi: String,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    pub submission_date: Option<Date>,

    pub acceptance_date: Option<Date>,

    pub pages: Option<String>,

    pub review_num: i32,

    pub type_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::review::Entity",
        from = "Column::ReviewNum",
        to = "super::review::Column::ReviewNum",
        on_delete = "Restrict"
    )]
    Review,

    #[sea_orm(
        belongs_to = "super::production_type::Entity",
        from = "Column::TypeId",
        to = "super::production_type::Column::TypeId",
        on_delete = "Restrict"
    )]
    ProductionType,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl Related<super::production_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductionType.def()
    }
}

impl Related<super::researcher::Entity> for Entity {
    fn to() -> RelationDef {
        super::publish_researcher_pub::Relation::Researcher.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::publish_researcher_pub::Relation::Publication.def().rev())
    }
}

impl Related<super::doctoral_student::Entity> for Entity {
    fn to() -> RelationDef {
        super::publish_doctoral_student_pub::Relation::DoctoralStudent.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::publish_doctoral_student_pub::Relation::Publication.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
