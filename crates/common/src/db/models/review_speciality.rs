//! Scientific speciality covered by a review

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review_specialities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub spec_id: i32,

    #[sea_orm(unique)]
    pub spec_name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
