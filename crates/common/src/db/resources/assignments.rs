//! Equipment loans and supervisions
//!
//! Both are keyed by the pair they relate, so a pair has at most one row.
//! Re-lending the same equipment to the same person rewrites the dates of
//! that row. The open loans of one piece of equipment, across researchers
//! and doctoral students, never exceed its quantity.

use super::{check_order, clean, count, ensure_exists, to_detail, DetailOptions, Expand, Resource};
use crate::db::lifecycle::{LoanStatus, SupervisionStatus};
use crate::db::listing::{column, Listing};
use crate::db::models::{
    assign_doctoral_student, assign_researcher, doctoral_student, equipment, researcher,
    supervise,
};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::SimpleExpr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, JoinType,
    ModelTrait, Order, QueryFilter, QuerySelect, RelationTrait, Select, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use validator::Validate;

/// Loan with its derived state, and optionally the person and equipment
#[derive(Debug, Serialize)]
pub struct AssignmentDetail<A, P> {
    #[serde(flatten)]
    pub assignment: A,

    pub status: LoanStatus,

    pub duration_months: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub person: Option<P>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment: Option<equipment::Model>,
}

pub type ResearcherLoan = AssignmentDetail<assign_researcher::Model, researcher::Model>;

pub type DoctoralStudentLoan = AssignmentDetail<assign_doctoral_student::Model, doctoral_student::Model>;

/// Supervision with its derived state, and optionally both parties
#[derive(Debug, Serialize)]
pub struct SupervisionDetail {
    #[serde(flatten)]
    pub supervision: supervise::Model,

    pub status: SupervisionStatus,

    pub duration_months: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub researcher: Option<researcher::Model>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctoral_student: Option<doctoral_student::Model>,
}

impl ResearcherLoan {
    pub fn of(assignment: assign_researcher::Model, today: NaiveDate) -> Self {
        Self {
            status: assignment.status(),
            duration_months: assignment.duration_months(today),
            assignment,
            person: None,
            equipment: None,
        }
    }
}

impl DoctoralStudentLoan {
    pub fn of(assignment: assign_doctoral_student::Model, today: NaiveDate) -> Self {
        Self {
            status: assignment.status(),
            duration_months: assignment.duration_months(today),
            assignment,
            person: None,
            equipment: None,
        }
    }
}

impl SupervisionDetail {
    pub fn of(supervision: supervise::Model, today: NaiveDate) -> Self {
        Self {
            status: supervision.status(),
            duration_months: supervision.duration_months(today),
            supervision,
            researcher: None,
            doctoral_student: None,
        }
    }
}

/// Who currently holds a loan slot that should not count against capacity
#[derive(Debug, Clone, Copy)]
pub(super) enum Holder {
    Researcher(i32),
    DoctoralStudent(i64),
}

/// Load an equipment row and hold its lock until the transaction ends
///
/// Writers touching the open loans of one piece of equipment take this
/// lock first, so their counts and inserts never interleave. SQLite has
/// no row locks; it serializes writers on its own.
pub(super) async fn lock_equipment<C: ConnectionTrait>(
    conn: &C,
    inventory_num: &str,
) -> Result<equipment::Model> {
    locked_equipment(inventory_num)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Equipment", inventory_num.to_string()))
}

fn locked_equipment(inventory_num: &str) -> Select<equipment::Entity> {
    equipment::Entity::find_by_id(inventory_num.to_string()).lock_exclusive()
}

/// Open loans of one piece of equipment across both assignment tables,
/// leaving out the loan of `holder`
pub(super) async fn open_loans<C: ConnectionTrait>(
    conn: &C,
    inventory_num: &str,
    holder: Option<Holder>,
) -> Result<u64> {
    let mut by_researchers = assign_researcher::Entity::find()
        .filter(assign_researcher::Column::InventoryNum.eq(inventory_num))
        .filter(assign_researcher::Column::ReturnDate.is_null());
    let mut by_students = assign_doctoral_student::Entity::find()
        .filter(assign_doctoral_student::Column::InventoryNum.eq(inventory_num))
        .filter(assign_doctoral_student::Column::ReturnDate.is_null());

    match holder {
        Some(Holder::Researcher(res_code)) => {
            by_researchers = by_researchers.filter(assign_researcher::Column::ResCode.ne(res_code));
        }
        Some(Holder::DoctoralStudent(reg_num)) => {
            by_students = by_students.filter(assign_doctoral_student::Column::RegNum.ne(reg_num));
        }
        None => {}
    }

    Ok(count(conn, by_researchers).await? + count(conn, by_students).await?)
}

/// Check that one more open loan of `inventory_num` fits
async fn check_capacity<C: ConnectionTrait>(
    conn: &C,
    inventory_num: &str,
    holder: Option<Holder>,
) -> Result<()> {
    let equipment = lock_equipment(conn, inventory_num).await?;

    if !equipment.equipment_status().is_lendable() {
        return Err(AppError::Conflict {
            message: format!(
                "Equipment {} is {} and cannot be lent",
                inventory_num,
                equipment.equipment_status().as_str()
            ),
        });
    }

    let open = open_loans(conn, inventory_num, holder).await?;
    let quantity = equipment.quantity.max(1);
    debug!(inventory_num, open, quantity, "Open loans");

    if open >= quantity as u64 {
        return Err(AppError::CapacityExceeded {
            inventory_num: inventory_num.to_string(),
            quantity,
        });
    }
    Ok(())
}

fn check_loan_dates(assign_date: NaiveDate, return_date: Option<NaiveDate>) -> Result<()> {
    check_order(
        Some(assign_date),
        return_date,
        "return_date",
        "return_date must not precede assign_date",
    )
}

// ---------------------------------------------------------------------------
// Researcher loans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AssignResearcherPayload {
    pub res_code: i32,

    #[validate(custom(function = "crate::validation::inventory_num"))]
    pub inventory_num: String,

    pub assign_date: NaiveDate,

    pub return_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssignResearcherFilter {
    /// Lab owning the equipment
    #[serde(alias = "lab_code")]
    pub lab_code: Option<i32>,

    #[serde(alias = "res_code")]
    pub res_code: Option<i32>,

    #[serde(alias = "inventory_num")]
    pub inventory_num: Option<String>,

    /// `true` for open loans only, `false` for returned ones
    pub active: Option<bool>,
}

impl Listing for assign_researcher::Entity {
    fn search_columns() -> Vec<SimpleExpr> {
        vec![
            column::<researcher::Entity>(researcher::Column::Lastname),
            column::<researcher::Entity>(researcher::Column::Firstname),
            column::<equipment::Entity>(equipment::Column::EquipName),
            column::<assign_researcher::Entity>(assign_researcher::Column::InventoryNum),
        ]
    }

    fn default_sort() -> (assign_researcher::Column, Order) {
        (assign_researcher::Column::AssignDate, Order::Desc)
    }

    fn base_select() -> Select<Self> {
        assign_researcher::Entity::find()
            .join(JoinType::InnerJoin, assign_researcher::Relation::Researcher.def())
            .join(JoinType::InnerJoin, assign_researcher::Relation::Equipment.def())
    }
}

#[async_trait]
impl Resource for assign_researcher::Entity {
    const LABEL: &'static str = "Researcher assignment";

    type Payload = AssignResearcherPayload;

    type Filter = AssignResearcherFilter;

    fn create_model(payload: &AssignResearcherPayload) -> assign_researcher::ActiveModel {
        assign_researcher::ActiveModel {
            res_code: Set(payload.res_code),
            inventory_num: Set(clean(&payload.inventory_num)),
            assign_date: Set(payload.assign_date),
            return_date: Set(payload.return_date),
        }
    }

    fn update_model(active: &mut assign_researcher::ActiveModel, payload: &AssignResearcherPayload) {
        active.assign_date = Set(payload.assign_date);
        active.return_date = Set(payload.return_date);
    }

    fn apply_filter(
        mut select: Select<assign_researcher::Entity>,
        filter: &AssignResearcherFilter,
    ) -> Select<assign_researcher::Entity> {
        if let Some(lab_code) = filter.lab_code {
            select = select.filter(equipment::Column::LabCode.eq(lab_code));
        }
        if let Some(res_code) = filter.res_code {
            select = select.filter(assign_researcher::Column::ResCode.eq(res_code));
        }
        if let Some(ref inventory_num) = filter.inventory_num {
            select = select.filter(assign_researcher::Column::InventoryNum.eq(inventory_num.as_str()));
        }
        match filter.active {
            Some(true) => select.filter(assign_researcher::Column::ReturnDate.is_null()),
            Some(false) => select.filter(assign_researcher::Column::ReturnDate.is_not_null()),
            None => select,
        }
    }

    async fn check(
        txn: &DatabaseTransaction,
        payload: &AssignResearcherPayload,
        existing: Option<assign_researcher::Model>,
    ) -> Result<()> {
        check_loan_dates(payload.assign_date, payload.return_date)?;

        let (res_code, inventory_num) = match existing {
            Some(ref row) => (row.res_code, row.inventory_num.clone()),
            None => (payload.res_code, clean(&payload.inventory_num)),
        };

        ensure_exists::<researcher::Entity, _>(txn, "Researcher", res_code).await?;

        if payload.return_date.is_none() {
            // An open loan being edited already holds its slot
            let holder = existing
                .as_ref()
                .filter(|row| row.is_active())
                .map(|row| Holder::Researcher(row.res_code));
            check_capacity(txn, &inventory_num, holder).await?;
        } else {
            ensure_exists::<equipment::Entity, _>(txn, "Equipment", inventory_num).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Expand for assign_researcher::Entity {
    async fn expand(
        conn: &DatabaseConnection,
        model: assign_researcher::Model,
        options: DetailOptions,
    ) -> Result<Value> {
        let today = Utc::now().date_naive();
        let mut detail = ResearcherLoan::of(model, today);

        if options.include_associations {
            detail.person = detail.assignment.find_related(researcher::Entity).one(conn).await?;
            detail.equipment = detail.assignment.find_related(equipment::Entity).one(conn).await?;
        }
        to_detail(&detail)
    }
}

// ---------------------------------------------------------------------------
// Doctoral student loans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AssignDoctoralStudentPayload {
    #[validate(range(
        min = doctoral_student::REG_NUM_MIN,
        max = doctoral_student::REG_NUM_MAX
    ))]
    pub reg_num: i64,

    #[validate(custom(function = "crate::validation::inventory_num"))]
    pub inventory_num: String,

    pub assign_date: NaiveDate,

    pub return_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssignDoctoralStudentFilter {
    /// Lab owning the equipment
    #[serde(alias = "lab_code")]
    pub lab_code: Option<i32>,

    #[serde(alias = "reg_num")]
    pub reg_num: Option<i64>,

    #[serde(alias = "inventory_num")]
    pub inventory_num: Option<String>,

    pub active: Option<bool>,
}

impl Listing for assign_doctoral_student::Entity {
    fn search_columns() -> Vec<SimpleExpr> {
        vec![
            column::<doctoral_student::Entity>(doctoral_student::Column::Lastname),
            column::<doctoral_student::Entity>(doctoral_student::Column::Firstname),
            column::<equipment::Entity>(equipment::Column::EquipName),
            column::<assign_doctoral_student::Entity>(assign_doctoral_student::Column::InventoryNum),
        ]
    }

    fn default_sort() -> (assign_doctoral_student::Column, Order) {
        (assign_doctoral_student::Column::AssignDate, Order::Desc)
    }

    fn base_select() -> Select<Self> {
        assign_doctoral_student::Entity::find()
            .join(JoinType::InnerJoin, assign_doctoral_student::Relation::DoctoralStudent.def())
            .join(JoinType::InnerJoin, assign_doctoral_student::Relation::Equipment.def())
    }
}

#[async_trait]
impl Resource for assign_doctoral_student::Entity {
    const LABEL: &'static str = "Doctoral student assignment";

    type Payload = AssignDoctoralStudentPayload;

    type Filter = AssignDoctoralStudentFilter;

    fn create_model(payload: &AssignDoctoralStudentPayload) -> assign_doctoral_student::ActiveModel {
        assign_doctoral_student::ActiveModel {
            reg_num: Set(payload.reg_num),
            inventory_num: Set(clean(&payload.inventory_num)),
            assign_date: Set(payload.assign_date),
            return_date: Set(payload.return_date),
        }
    }

    fn update_model(
        active: &mut assign_doctoral_student::ActiveModel,
        payload: &AssignDoctoralStudentPayload,
    ) {
        active.assign_date = Set(payload.assign_date);
        active.return_date = Set(payload.return_date);
    }

    fn apply_filter(
        mut select: Select<assign_doctoral_student::Entity>,
        filter: &AssignDoctoralStudentFilter,
    ) -> Select<assign_doctoral_student::Entity> {
        if let Some(lab_code) = filter.lab_code {
            select = select.filter(equipment::Column::LabCode.eq(lab_code));
        }
        if let Some(reg_num) = filter.reg_num {
            select = select.filter(assign_doctoral_student::Column::RegNum.eq(reg_num));
        }
        if let Some(ref inventory_num) = filter.inventory_num {
            select = select
                .filter(assign_doctoral_student::Column::InventoryNum.eq(inventory_num.as_str()));
        }
        match filter.active {
            Some(true) => select.filter(assign_doctoral_student::Column::ReturnDate.is_null()),
            Some(false) => select.filter(assign_doctoral_student::Column::ReturnDate.is_not_null()),
            None => select,
        }
    }

    async fn check(
        txn: &DatabaseTransaction,
        payload: &AssignDoctoralStudentPayload,
        existing: Option<assign_doctoral_student::Model>,
    ) -> Result<()> {
        check_loan_dates(payload.assign_date, payload.return_date)?;

        let (reg_num, inventory_num) = match existing {
            Some(ref row) => (row.reg_num, row.inventory_num.clone()),
            None => (payload.reg_num, clean(&payload.inventory_num)),
        };

        ensure_exists::<doctoral_student::Entity, _>(txn, "Doctoral student", reg_num).await?;

        if payload.return_date.is_none() {
            let holder = existing
                .as_ref()
                .filter(|row| row.is_active())
                .map(|row| Holder::DoctoralStudent(row.reg_num));
            check_capacity(txn, &inventory_num, holder).await?;
        } else {
            ensure_exists::<equipment::Entity, _>(txn, "Equipment", inventory_num).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Expand for assign_doctoral_student::Entity {
    async fn expand(
        conn: &DatabaseConnection,
        model: assign_doctoral_student::Model,
        options: DetailOptions,
    ) -> Result<Value> {
        let today = Utc::now().date_naive();
        let mut detail = DoctoralStudentLoan::of(model, today);

        if options.include_associations {
            detail.person = detail
                .assignment
                .find_related(doctoral_student::Entity)
                .one(conn)
                .await?;
            detail.equipment = detail.assignment.find_related(equipment::Entity).one(conn).await?;
        }
        to_detail(&detail)
    }
}

// ---------------------------------------------------------------------------
// Supervisions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SupervisePayload {
    pub res_code: i32,

    #[validate(range(
        min = doctoral_student::REG_NUM_MIN,
        max = doctoral_student::REG_NUM_MAX
    ))]
    pub reg_num: i64,

    pub start_date: NaiveDate,

    pub end_date: Option<NaiveDate>,

    #[validate(length(min = 1, max = 2000), custom(function = "crate::validation::not_blank"))]
    pub theme: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SuperviseFilter {
    #[serde(alias = "res_code")]
    pub res_code: Option<i32>,

    #[serde(alias = "reg_num")]
    pub reg_num: Option<i64>,

    /// Lab of the doctoral student
    #[serde(alias = "lab_code")]
    pub lab_code: Option<i32>,

    pub active: Option<bool>,
}

impl Listing for supervise::Entity {
    fn search_columns() -> Vec<SimpleExpr> {
        vec![
            column::<researcher::Entity>(researcher::Column::Lastname),
            column::<researcher::Entity>(researcher::Column::Firstname),
            column::<doctoral_student::Entity>(doctoral_student::Column::Lastname),
            column::<doctoral_student::Entity>(doctoral_student::Column::Firstname),
            column::<supervise::Entity>(supervise::Column::Theme),
        ]
    }

    fn default_sort() -> (supervise::Column, Order) {
        (supervise::Column::StartDate, Order::Desc)
    }

    fn base_select() -> Select<Self> {
        supervise::Entity::find()
            .join(JoinType::InnerJoin, supervise::Relation::Researcher.def())
            .join(JoinType::InnerJoin, supervise::Relation::DoctoralStudent.def())
    }
}

#[async_trait]
impl Resource for supervise::Entity {
    const LABEL: &'static str = "Supervision";

    type Payload = SupervisePayload;

    type Filter = SuperviseFilter;

    fn create_model(payload: &SupervisePayload) -> supervise::ActiveModel {
        supervise::ActiveModel {
            res_code: Set(payload.res_code),
            reg_num: Set(payload.reg_num),
            start_date: Set(payload.start_date),
            end_date: Set(payload.end_date),
            theme: Set(clean(&payload.theme)),
        }
    }

    fn update_model(active: &mut supervise::ActiveModel, payload: &SupervisePayload) {
        active.start_date = Set(payload.start_date);
        active.end_date = Set(payload.end_date);
        active.theme = Set(clean(&payload.theme));
    }

    fn apply_filter(
        mut select: Select<supervise::Entity>,
        filter: &SuperviseFilter,
    ) -> Select<supervise::Entity> {
        if let Some(res_code) = filter.res_code {
            select = select.filter(supervise::Column::ResCode.eq(res_code));
        }
        if let Some(reg_num) = filter.reg_num {
            select = select.filter(supervise::Column::RegNum.eq(reg_num));
        }
        if let Some(lab_code) = filter.lab_code {
            select = select.filter(doctoral_student::Column::LabCode.eq(lab_code));
        }
        match filter.active {
            Some(true) => select.filter(supervise::Column::EndDate.is_null()),
            Some(false) => select.filter(supervise::Column::EndDate.is_not_null()),
            None => select,
        }
    }

    async fn check(
        txn: &DatabaseTransaction,
        payload: &SupervisePayload,
        existing: Option<supervise::Model>,
    ) -> Result<()> {
        check_order(
            Some(payload.start_date),
            payload.end_date,
            "end_date",
            "end_date must not precede start_date",
        )?;

        let (res_code, reg_num) = match existing {
            Some(ref row) => (row.res_code, row.reg_num),
            None => (payload.res_code, payload.reg_num),
        };
        ensure_exists::<researcher::Entity, _>(txn, "Researcher", res_code).await?;
        ensure_exists::<doctoral_student::Entity, _>(txn, "Doctoral student", reg_num).await?;
        Ok(())
    }
}

#[async_trait]
impl Expand for supervise::Entity {
    async fn expand(
        conn: &DatabaseConnection,
        model: supervise::Model,
        options: DetailOptions,
    ) -> Result<Value> {
        let mut detail = SupervisionDetail::of(model, Utc::now().date_naive());

        if options.include_associations {
            detail.researcher = detail.supervision.find_related(researcher::Entity).one(conn).await?;
            detail.doctoral_student = detail
                .supervision
                .find_related(doctoral_student::Entity)
                .one(conn)
                .await?;
        }
        to_detail(&detail)
    }
}
