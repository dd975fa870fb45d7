//! Review (journal) entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub review_num: i32,

    #[sea_orm(unique)]
    pub review_title: String,

    #[sea_orm(unique, nullable)]
    pub issn: Option<String>,

    #[sea_orm(unique, nullable)]
    pub e_issn: Option<String>,

    pub vol: Option<String>,

    pub publisher_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::publisher::Entity",
        from = "Column::PublisherId",
        to = "super::publisher::Column::PublisherId",
        on_delete = "Restrict"
    )]
    Publisher,
}

impl Related<super::publisher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Publisher.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        super::has_category::Relation::Category.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::has_category::Relation::Review.def().rev())
    }
}

impl Related<super::review_speciality::Entity> for Entity {
    fn to() -> RelationDef {
        super::has_speciality::Relation::ReviewSpeciality.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::has_speciality::Relation::Review.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
