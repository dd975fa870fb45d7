//! Category assigned to a review

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "has_categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub review_num: i32,

    #[sea_orm(primary_key, auto_increment = false)]
    pub cat_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::review::Entity",
        from = "Column::ReviewNum",
        to = "super::review::Column::ReviewNum",
        on_delete = "Cascade"
    )]
    Review,

    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CatId",
        to = "super::category::Column::CatId",
        on_delete = "Restrict"
    )]
    Category,
}

impl ActiveModelBehavior for ActiveModel {}
