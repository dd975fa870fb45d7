//! Researchers and doctoral students

use super::assignments::{DoctoralStudentLoan, ResearcherLoan, SupervisionDetail};
use super::{clean, clean_opt, to_detail, AssignmentDetail, DetailOptions, Expand, Resource};
use crate::db::listing::{column, Listing};
use crate::db::models::{
    assign_doctoral_student, assign_researcher, communication, doctoral_student, equipment,
    function, laboratory, publication, researcher, speciality, supervise, team, Gender,
};
use crate::errors::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::SimpleExpr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, Order, QueryFilter, QueryOrder,
    Select, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

// ---------------------------------------------------------------------------
// Researchers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ResearcherPayload {
    #[validate(length(min = 1, max = 100), custom(function = "crate::validation::not_blank"))]
    pub firstname: String,

    #[validate(length(min = 1, max = 100), custom(function = "crate::validation::not_blank"))]
    pub lastname: String,

    #[validate(length(max = 100))]
    pub firstname_ar: Option<String>,

    #[validate(length(max = 100))]
    pub lastname_ar: Option<String>,

    pub gender: Gender,

    #[validate(length(max = 100))]
    pub grade: Option<String>,

    #[validate(email)]
    pub email: String,

    #[validate(custom(function = "crate::validation::phone"))]
    pub phone: Option<String>,

    #[validate(custom(function = "crate::validation::orcid"))]
    pub orcid_id: Option<String>,

    #[validate(url)]
    pub google_scholar_url: Option<String>,

    #[validate(url)]
    pub research_gate_url: Option<String>,

    #[validate(url)]
    pub dblp_url: Option<String>,

    #[validate(range(min = 0))]
    pub publication_count: Option<i32>,

    #[validate(range(min = 0))]
    pub citation_count: Option<i32>,

    #[serde(default)]
    pub is_director: bool,

    pub func_code: i32,

    pub spec_code: i32,

    pub team_id: i32,

    pub lab_code: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResearcherFilter {
    #[serde(alias = "team_id")]
    pub team_id: Option<i32>,

    #[serde(alias = "lab_code")]
    pub lab_code: Option<i32>,

    #[serde(alias = "func_code")]
    pub func_code: Option<i32>,

    #[serde(alias = "spec_code")]
    pub spec_code: Option<i32>,

    #[serde(alias = "is_director")]
    pub is_director: Option<bool>,
}

/// Researcher with their affiliations, students, loans and output
#[derive(Debug, Serialize)]
pub struct ResearcherDetail {
    #[serde(flatten)]
    pub researcher: researcher::Model,

    pub team: Option<team::Model>,

    pub function: Option<function::Model>,

    pub speciality: Option<speciality::Model>,

    pub laboratory: Option<laboratory::Model>,

    pub supervised_students: Vec<SupervisionDetail>,

    pub equipment: Vec<ResearcherLoan>,

    pub publications: Vec<publication::Model>,

    pub communications: Vec<communication::Model>,
}

impl Listing for researcher::Entity {
    fn search_columns() -> Vec<SimpleExpr> {
        vec![
            column::<researcher::Entity>(researcher::Column::Lastname),
            column::<researcher::Entity>(researcher::Column::Firstname),
            column::<researcher::Entity>(researcher::Column::Email),
        ]
    }

    fn default_sort() -> (researcher::Column, Order) {
        (researcher::Column::Lastname, Order::Asc)
    }
}

#[async_trait]
impl Resource for researcher::Entity {
    const LABEL: &'static str = "Researcher";

    type Payload = ResearcherPayload;

    type Filter = ResearcherFilter;

    fn create_model(payload: &ResearcherPayload) -> researcher::ActiveModel {
        let mut active = <researcher::ActiveModel as Default>::default();
        Self::update_model(&mut active, payload);
        active
    }

    fn update_model(active: &mut researcher::ActiveModel, payload: &ResearcherPayload) {
        active.firstname = Set(clean(&payload.firstname));
        active.lastname = Set(clean(&payload.lastname));
        active.firstname_ar = Set(clean_opt(&payload.firstname_ar));
        active.lastname_ar = Set(clean_opt(&payload.lastname_ar));
        active.gender = Set(payload.gender.into());
        active.grade = Set(clean_opt(&payload.grade));
        active.email = Set(clean(&payload.email).to_lowercase());
        active.phone = Set(clean_opt(&payload.phone));
        active.orcid_id = Set(clean_opt(&payload.orcid_id));
        active.google_scholar_url = Set(clean_opt(&payload.google_scholar_url));
        active.research_gate_url = Set(clean_opt(&payload.research_gate_url));
        active.dblp_url = Set(clean_opt(&payload.dblp_url));
        active.publication_count = Set(payload.publication_count);
        active.citation_count = Set(payload.citation_count);
        active.is_director = Set(payload.is_director);
        active.func_code = Set(payload.func_code);
        active.spec_code = Set(payload.spec_code);
        active.team_id = Set(payload.team_id);
        active.lab_code = Set(payload.lab_code);
    }

    fn apply_filter(
        mut select: Select<researcher::Entity>,
        filter: &ResearcherFilter,
    ) -> Select<researcher::Entity> {
        if let Some(team_id) = filter.team_id {
            select = select.filter(researcher::Column::TeamId.eq(team_id));
        }
        if let Some(lab_code) = filter.lab_code {
            select = select.filter(researcher::Column::LabCode.eq(lab_code));
        }
        if let Some(func_code) = filter.func_code {
            select = select.filter(researcher::Column::FuncCode.eq(func_code));
        }
        if let Some(spec_code) = filter.spec_code {
            select = select.filter(researcher::Column::SpecCode.eq(spec_code));
        }
        if let Some(is_director) = filter.is_director {
            select = select.filter(researcher::Column::IsDirector.eq(is_director));
        }
        select
    }
}

#[async_trait]
impl Expand for researcher::Entity {
    async fn expand(
        conn: &DatabaseConnection,
        model: researcher::Model,
        options: DetailOptions,
    ) -> Result<Value> {
        if !options.include_associations {
            return to_detail(&model);
        }
        let today = Utc::now().date_naive();

        let team = model.find_related(team::Entity).one(conn).await?;
        let function = model.find_related(function::Entity).one(conn).await?;
        let speciality = model.find_related(speciality::Entity).one(conn).await?;
        let laboratory = model.find_related(laboratory::Entity).one(conn).await?;

        let supervised_students = supervise::Entity::find()
            .filter(supervise::Column::ResCode.eq(model.res_code))
            .order_by_desc(supervise::Column::StartDate)
            .find_also_related(doctoral_student::Entity)
            .all(conn)
            .await?
            .into_iter()
            .map(|(supervision, student)| {
                let mut detail = SupervisionDetail::of(supervision, today);
                detail.doctoral_student = student;
                detail
            })
            .collect();

        let equipment = assign_researcher::Entity::find()
            .filter(assign_researcher::Column::ResCode.eq(model.res_code))
            .order_by_desc(assign_researcher::Column::AssignDate)
            .find_also_related(equipment::Entity)
            .all(conn)
            .await?
            .into_iter()
            .map(|(assignment, equipment)| {
                loan_with_equipment(ResearcherLoan::of(assignment, today), equipment)
            })
            .collect();

        let publications = model
            .find_related(publication::Entity)
            .order_by_desc(publication::Column::AcceptanceDate)
            .all(conn)
            .await?;
        let communications = model
            .find_related(communication::Entity)
            .order_by_desc(communication::Column::Year)
            .all(conn)
            .await?;

        to_detail(&ResearcherDetail {
            researcher: model,
            team,
            function,
            speciality,
            laboratory,
            supervised_students,
            equipment,
            publications,
            communications,
        })
    }
}

fn loan_with_equipment<A, P>(
    mut loan: AssignmentDetail<A, P>,
    equipment: Option<equipment::Model>,
) -> AssignmentDetail<A, P> {
    loan.equipment = equipment;
    loan
}

// ---------------------------------------------------------------------------
// Doctoral students
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct DoctoralStudentPayload {
    #[validate(range(
        min = doctoral_student::REG_NUM_MIN,
        max = doctoral_student::REG_NUM_MAX
    ))]
    pub reg_num: i64,

    #[validate(length(min = 1, max = 100), custom(function = "crate::validation::not_blank"))]
    pub firstname: String,

    #[validate(length(min = 1, max = 100), custom(function = "crate::validation::not_blank"))]
    pub lastname: String,

    #[validate(length(max = 100))]
    pub firstname_ar: Option<String>,

    #[validate(length(max = 100))]
    pub lastname_ar: Option<String>,

    pub gender: Gender,

    #[validate(email)]
    pub email: String,

    #[validate(custom(function = "crate::validation::phone"))]
    pub phone: Option<String>,

    #[validate(custom(function = "crate::validation::orcid"))]
    pub orcid_id: Option<String>,

    #[validate(url)]
    pub google_scholar_url: Option<String>,

    #[validate(url)]
    pub research_gate_url: Option<String>,

    #[validate(url)]
    pub dblp_url: Option<String>,

    #[validate(range(min = 0))]
    pub publication_count: Option<i32>,

    #[validate(range(min = 0))]
    pub citation_count: Option<i32>,

    pub registration_date: Option<NaiveDate>,

    pub func_code: Option<i32>,

    pub spec_code: i32,

    pub team_id: i32,

    pub lab_code: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DoctoralStudentFilter {
    #[serde(alias = "team_id")]
    pub team_id: Option<i32>,

    #[serde(alias = "lab_code")]
    pub lab_code: Option<i32>,

    #[serde(alias = "spec_code")]
    pub spec_code: Option<i32>,
}

/// Doctoral student with affiliations, supervisors, loans and output
#[derive(Debug, Serialize)]
pub struct DoctoralStudentDetail {
    #[serde(flatten)]
    pub doctoral_student: doctoral_student::Model,

    pub team: Option<team::Model>,

    pub function: Option<function::Model>,

    pub speciality: Option<speciality::Model>,

    pub laboratory: Option<laboratory::Model>,

    pub supervisors: Vec<SupervisionDetail>,

    pub equipment: Vec<DoctoralStudentLoan>,

    pub publications: Vec<publication::Model>,

    pub communications: Vec<communication::Model>,
}

impl Listing for doctoral_student::Entity {
    fn search_columns() -> Vec<SimpleExpr> {
        vec![
            column::<doctoral_student::Entity>(doctoral_student::Column::Lastname),
            column::<doctoral_student::Entity>(doctoral_student::Column::Firstname),
            column::<doctoral_student::Entity>(doctoral_student::Column::Email),
        ]
    }

    fn default_sort() -> (doctoral_student::Column, Order) {
        (doctoral_student::Column::Lastname, Order::Asc)
    }
}

#[async_trait]
impl Resource for doctoral_student::Entity {
    const LABEL: &'static str = "Doctoral student";

    type Payload = DoctoralStudentPayload;

    type Filter = DoctoralStudentFilter;

    fn create_model(payload: &DoctoralStudentPayload) -> doctoral_student::ActiveModel {
        let mut active = doctoral_student::ActiveModel {
            reg_num: Set(payload.reg_num),
            ..Default::default()
        };
        Self::update_model(&mut active, payload);
        active
    }

    fn update_model(active: &mut doctoral_student::ActiveModel, payload: &DoctoralStudentPayload) {
        active.firstname = Set(clean(&payload.firstname));
        active.lastname = Set(clean(&payload.lastname));
        active.firstname_ar = Set(clean_opt(&payload.firstname_ar));
        active.lastname_ar = Set(clean_opt(&payload.lastname_ar));
        active.gender = Set(payload.gender.into());
        active.email = Set(clean(&payload.email).to_lowercase());
        active.phone = Set(clean_opt(&payload.phone));
        active.orcid_id = Set(clean_opt(&payload.orcid_id));
        active.google_scholar_url = Set(clean_opt(&payload.google_scholar_url));
        active.research_gate_url = Set(clean_opt(&payload.research_gate_url));
        active.dblp_url = Set(clean_opt(&payload.dblp_url));
        active.publication_count = Set(payload.publication_count);
        active.citation_count = Set(payload.citation_count);
        active.registration_date = Set(payload.registration_date);
        active.func_code = Set(payload.func_code);
        active.spec_code = Set(payload.spec_code);
        active.team_id = Set(payload.team_id);
        active.lab_code = Set(payload.lab_code);
    }

    fn apply_filter(
        mut select: Select<doctoral_student::Entity>,
        filter: &DoctoralStudentFilter,
    ) -> Select<doctoral_student::Entity> {
        if let Some(team_id) = filter.team_id {
            select = select.filter(doctoral_student::Column::TeamId.eq(team_id));
        }
        if let Some(lab_code) = filter.lab_code {
            select = select.filter(doctoral_student::Column::LabCode.eq(lab_code));
        }
        if let Some(spec_code) = filter.spec_code {
            select = select.filter(doctoral_student::Column::SpecCode.eq(spec_code));
        }
        select
    }
}

#[async_trait]
impl Expand for doctoral_student::Entity {
    async fn expand(
        conn: &DatabaseConnection,
        model: doctoral_student::Model,
        options: DetailOptions,
    ) -> Result<Value> {
        if !options.include_associations {
            return to_detail(&model);
        }
        let today = Utc::now().date_naive();

        let team = model.find_related(team::Entity).one(conn).await?;
        let function = model.find_related(function::Entity).one(conn).await?;
        let speciality = model.find_related(speciality::Entity).one(conn).await?;
        let laboratory = model.find_related(laboratory::Entity).one(conn).await?;

        let supervisors = supervise::Entity::find()
            .filter(supervise::Column::RegNum.eq(model.reg_num))
            .order_by_desc(supervise::Column::StartDate)
            .find_also_related(researcher::Entity)
            .all(conn)
            .await?
            .into_iter()
            .map(|(supervision, supervisor)| {
                let mut detail = SupervisionDetail::of(supervision, today);
                detail.researcher = supervisor;
                detail
            })
            .collect();

        let equipment = assign_doctoral_student::Entity::find()
            .filter(assign_doctoral_student::Column::RegNum.eq(model.reg_num))
            .order_by_desc(assign_doctoral_student::Column::AssignDate)
            .find_also_related(equipment::Entity)
            .all(conn)
            .await?
            .into_iter()
            .map(|(assignment, equipment)| {
                loan_with_equipment(DoctoralStudentLoan::of(assignment, today), equipment)
            })
            .collect();

        let publications = model
            .find_related(publication::Entity)
            .order_by_desc(publication::Column::AcceptanceDate)
            .all(conn)
            .await?;
        let communications = model
            .find_related(communication::Entity)
            .order_by_desc(communication::Column::Year)
            .all(conn)
            .await?;

        to_detail(&DoctoralStudentDetail {
            doctoral_student: model,
            team,
            function,
            speciality,
            laboratory,
            supervisors,
            equipment,
            publications,
            communications,
        })
    }
}
