//! Laboratories

use super::{clean, clean_opt, count, to_detail, DetailOptions, Expand, Resource};
use crate::db::listing::{column, Listing};
use crate::db::models::{
    department, doctoral_student, domain, equipment, faculty, laboratory, researcher,
};
use crate::errors::Result;
use async_trait::async_trait;
use sea_orm::sea_query::SimpleExpr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, Order, QueryFilter, Select, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct LaboratoryPayload {
    #[validate(length(min = 1, max = 255), custom(function = "crate::validation::not_blank"))]
    pub lab_name: String,

    #[validate(length(max = 50))]
    pub lab_abbr: Option<String>,

    #[validate(length(max = 5000))]
    pub lab_desc: Option<String>,

    #[validate(length(max = 255))]
    pub lab_address: Option<String>,

    #[validate(custom(function = "crate::validation::phone"))]
    pub lab_phone: Option<String>,

    pub faculty_id: i32,

    pub domain_id: i32,

    pub dept_id: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LaboratoryFilter {
    #[serde(alias = "faculty_id")]
    pub faculty_id: Option<i32>,

    #[serde(alias = "domain_id")]
    pub domain_id: Option<i32>,

    #[serde(alias = "dept_id")]
    pub dept_id: Option<i32>,
}

/// Laboratory with its owning structures and headcount
#[derive(Debug, Serialize)]
pub struct LaboratoryDetail {
    #[serde(flatten)]
    pub laboratory: laboratory::Model,

    pub faculty: Option<faculty::Model>,

    pub domain: Option<domain::Model>,

    pub department: Option<department::Model>,

    pub director: Option<researcher::Model>,

    pub researcher_count: u64,

    pub doctoral_student_count: u64,

    pub equipment_count: u64,
}

impl Listing for laboratory::Entity {
    fn search_columns() -> Vec<SimpleExpr> {
        vec![
            column::<laboratory::Entity>(laboratory::Column::LabName),
            column::<laboratory::Entity>(laboratory::Column::LabAbbr),
        ]
    }

    fn default_sort() -> (laboratory::Column, Order) {
        (laboratory::Column::LabName, Order::Asc)
    }
}

#[async_trait]
impl Resource for laboratory::Entity {
    const LABEL: &'static str = "Laboratory";

    type Payload = LaboratoryPayload;

    type Filter = LaboratoryFilter;

    fn create_model(payload: &LaboratoryPayload) -> laboratory::ActiveModel {
        let mut active = <laboratory::ActiveModel as Default>::default();
        Self::update_model(&mut active, payload);
        active
    }

    fn update_model(active: &mut laboratory::ActiveModel, payload: &LaboratoryPayload) {
        active.lab_name = Set(clean(&payload.lab_name));
        active.lab_abbr = Set(clean_opt(&payload.lab_abbr));
        active.lab_desc = Set(clean_opt(&payload.lab_desc));
        active.lab_address = Set(clean_opt(&payload.lab_address));
        active.lab_phone = Set(clean_opt(&payload.lab_phone));
        active.faculty_id = Set(payload.faculty_id);
        active.domain_id = Set(payload.domain_id);
        active.dept_id = Set(payload.dept_id);
    }

    fn apply_filter(
        mut select: Select<laboratory::Entity>,
        filter: &LaboratoryFilter,
    ) -> Select<laboratory::Entity> {
        if let Some(faculty_id) = filter.faculty_id {
            select = select.filter(laboratory::Column::FacultyId.eq(faculty_id));
        }
        if let Some(domain_id) = filter.domain_id {
            select = select.filter(laboratory::Column::DomainId.eq(domain_id));
        }
        if let Some(dept_id) = filter.dept_id {
            select = select.filter(laboratory::Column::DeptId.eq(dept_id));
        }
        select
    }
}

#[async_trait]
impl Expand for laboratory::Entity {
    async fn expand(
        conn: &DatabaseConnection,
        model: laboratory::Model,
        options: DetailOptions,
    ) -> Result<Value> {
        if !options.include_associations {
            return to_detail(&model);
        }

        let faculty = model.find_related(faculty::Entity).one(conn).await?;
        let domain = model.find_related(domain::Entity).one(conn).await?;
        let department = model.find_related(department::Entity).one(conn).await?;

        let director = researcher::Entity::find()
            .filter(researcher::Column::LabCode.eq(model.lab_code))
            .filter(researcher::Column::IsDirector.eq(true))
            .one(conn)
            .await?;

        let researcher_count = count(
            conn,
            researcher::Entity::find().filter(researcher::Column::LabCode.eq(model.lab_code)),
        )
        .await?;
        let doctoral_student_count = count(
            conn,
            doctoral_student::Entity::find()
                .filter(doctoral_student::Column::LabCode.eq(model.lab_code)),
        )
        .await?;
        let equipment_count = count(
            conn,
            equipment::Entity::find().filter(equipment::Column::LabCode.eq(model.lab_code)),
        )
        .await?;

        to_detail(&LaboratoryDetail {
            laboratory: model,
            faculty,
            domain,
            department,
            director,
            researcher_count,
            doctoral_student_count,
            equipment_count,
        })
    }
}
