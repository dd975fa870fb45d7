//! Equipment inventory

use super::assignments::{lock_equipment, open_loans, DoctoralStudentLoan, ResearcherLoan};
use super::{clean, clean_opt, to_detail, DetailOptions, Expand, Resource};
use crate::db::listing::{column, Listing};
use crate::db::models::{
    assign_doctoral_student, assign_researcher, doctoral_student, equipment, laboratory,
    researcher, EquipmentStatus,
};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::SimpleExpr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, ModelTrait, Order,
    QueryFilter, Select, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

fn default_status() -> EquipmentStatus {
    EquipmentStatus::Available
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct EquipmentPayload {
    #[validate(custom(function = "crate::validation::inventory_num"))]
    pub inventory_num: String,

    #[validate(length(min = 1, max = 255), custom(function = "crate::validation::not_blank"))]
    pub equip_name: String,

    #[validate(length(max = 5000))]
    pub equip_desc: Option<String>,

    pub acq_date: Option<NaiveDate>,

    #[validate(range(min = 0.0))]
    pub purchase_price: Option<f64>,

    #[serde(default = "default_status")]
    pub status: EquipmentStatus,

    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 10000))]
    pub quantity: i32,

    pub lab_code: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EquipmentFilter {
    #[serde(alias = "lab_code")]
    pub lab_code: Option<i32>,

    pub status: Option<EquipmentStatus>,
}

/// Equipment with its laboratory and the loans currently open on it
#[derive(Debug, Serialize)]
pub struct EquipmentDetail {
    #[serde(flatten)]
    pub equipment: equipment::Model,

    pub laboratory: Option<laboratory::Model>,

    pub available_units: i64,

    pub researcher_loans: Vec<ResearcherLoan>,

    pub doctoral_student_loans: Vec<DoctoralStudentLoan>,
}

impl Listing for equipment::Entity {
    fn search_columns() -> Vec<SimpleExpr> {
        vec![
            column::<equipment::Entity>(equipment::Column::EquipName),
            column::<equipment::Entity>(equipment::Column::InventoryNum),
        ]
    }

    fn default_sort() -> (equipment::Column, Order) {
        (equipment::Column::EquipName, Order::Asc)
    }
}

#[async_trait]
impl Resource for equipment::Entity {
    const LABEL: &'static str = "Equipment";

    type Payload = EquipmentPayload;

    type Filter = EquipmentFilter;

    fn create_model(payload: &EquipmentPayload) -> equipment::ActiveModel {
        let mut active = equipment::ActiveModel {
            inventory_num: Set(clean(&payload.inventory_num)),
            ..Default::default()
        };
        Self::update_model(&mut active, payload);
        active
    }

    fn update_model(active: &mut equipment::ActiveModel, payload: &EquipmentPayload) {
        active.equip_name = Set(clean(&payload.equip_name));
        active.equip_desc = Set(clean_opt(&payload.equip_desc));
        active.acq_date = Set(payload.acq_date);
        active.purchase_price = Set(payload.purchase_price);
        active.status = Set(payload.status.into());
        active.quantity = Set(payload.quantity);
        active.lab_code = Set(payload.lab_code);
    }

    fn apply_filter(
        mut select: Select<equipment::Entity>,
        filter: &EquipmentFilter,
    ) -> Select<equipment::Entity> {
        if let Some(lab_code) = filter.lab_code {
            select = select.filter(equipment::Column::LabCode.eq(lab_code));
        }
        if let Some(status) = filter.status {
            select = select.filter(equipment::Column::Status.eq(status.as_str()));
        }
        select
    }

    async fn check(
        txn: &DatabaseTransaction,
        payload: &EquipmentPayload,
        existing: Option<equipment::Model>,
    ) -> Result<()> {
        // Shrinking the stock below what is currently lent out is refused
        if let Some(existing) = existing {
            lock_equipment(txn, &existing.inventory_num).await?;
            let open = open_loans(txn, &existing.inventory_num, None).await?;
            if open > payload.quantity as u64 {
                return Err(AppError::CapacityExceeded {
                    inventory_num: existing.inventory_num,
                    quantity: payload.quantity,
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Expand for equipment::Entity {
    async fn expand(
        conn: &DatabaseConnection,
        model: equipment::Model,
        options: DetailOptions,
    ) -> Result<Value> {
        if !options.include_associations {
            return to_detail(&model);
        }
        let today = Utc::now().date_naive();

        let laboratory = model.find_related(laboratory::Entity).one(conn).await?;

        let researcher_loans: Vec<ResearcherLoan> = assign_researcher::Entity::find()
            .filter(assign_researcher::Column::InventoryNum.eq(model.inventory_num.as_str()))
            .filter(assign_researcher::Column::ReturnDate.is_null())
            .find_also_related(researcher::Entity)
            .all(conn)
            .await?
            .into_iter()
            .map(|(assignment, person)| {
                let mut loan = ResearcherLoan::of(assignment, today);
                loan.person = person;
                loan
            })
            .collect();

        let doctoral_student_loans: Vec<DoctoralStudentLoan> =
            assign_doctoral_student::Entity::find()
                .filter(
                    assign_doctoral_student::Column::InventoryNum.eq(model.inventory_num.as_str()),
                )
                .filter(assign_doctoral_student::Column::ReturnDate.is_null())
                .find_also_related(doctoral_student::Entity)
                .all(conn)
                .await?
                .into_iter()
                .map(|(assignment, person)| {
                    let mut loan = DoctoralStudentLoan::of(assignment, today);
                    loan.person = person;
                    loan
                })
                .collect();

        let lent = (researcher_loans.len() + doctoral_student_loans.len()) as i64;
        let available_units = (i64::from(model.quantity) - lent).max(0);

        to_detail(&EquipmentDetail {
            equipment: model,
            laboratory,
            available_units,
            researcher_loans,
            doctoral_student_loans,
        })
    }
}
