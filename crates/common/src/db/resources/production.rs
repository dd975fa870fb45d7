//! Reviews, publications and communications
//!
//! Payloads may carry link sets (`category_ids`, `speciality_ids`,
//! `res_codes`, `reg_nums`). A link set that is present replaces the stored
//! links in the same transaction as the row; an absent one leaves them alone.

use super::{check_order, clean, clean_opt, ensure_exists, to_detail, DetailOptions, Expand, Resource};
use crate::db::listing::{column, Listing};
use crate::db::models::{
    category, communication, doctoral_student, has_category, has_speciality, production_type,
    publication, publish_doctoral_student_comm, publish_doctoral_student_pub,
    publish_researcher_comm, publish_researcher_pub, publisher, researcher, review,
    review_speciality,
};
use crate::errors::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::sea_query::SimpleExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IntoActiveModel, ModelTrait, Order, QueryFilter, QueryOrder, Select, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use validator::Validate;

/// Sorted, de-duplicated copy of a link set
fn distinct<T: Ord + Copy>(ids: &[T]) -> Vec<T> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Delete the owner's link rows and insert `rows` in their place
async fn replace_links<L>(
    txn: &DatabaseTransaction,
    owner: Condition,
    rows: Vec<L::ActiveModel>,
) -> Result<()>
where
    L: EntityTrait,
    L::Model: IntoActiveModel<L::ActiveModel>,
    L::ActiveModel: ActiveModelTrait<Entity = L> + Send,
{
    let removed = L::delete_many().filter(owner).exec(txn).await?;
    let inserted = rows.len();
    if !rows.is_empty() {
        L::insert_many(rows).exec_without_returning(txn).await?;
    }
    debug!(
        table = L::default().table_name(),
        removed = removed.rows_affected,
        inserted,
        "Links replaced"
    );
    Ok(())
}

/// Check every researcher and doctoral student of an author list exists
async fn ensure_authors(
    txn: &DatabaseTransaction,
    res_codes: &Option<Vec<i32>>,
    reg_nums: &Option<Vec<i64>>,
) -> Result<()> {
    for res_code in res_codes.iter().flatten() {
        ensure_exists::<researcher::Entity, _>(txn, "Researcher", *res_code).await?;
    }
    for reg_num in reg_nums.iter().flatten() {
        ensure_exists::<doctoral_student::Entity, _>(txn, "Doctoral student", *reg_num).await?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ReviewPayload {
    #[validate(length(min = 1, max = 255), custom(function = "crate::validation::not_blank"))]
    pub review_title: String,

    #[validate(custom(function = "crate::validation::issn"))]
    pub issn: Option<String>,

    #[validate(custom(function = "crate::validation::issn"))]
    pub e_issn: Option<String>,

    #[validate(length(max = 50))]
    pub vol: Option<String>,

    pub publisher_id: i32,

    #[validate(length(max = 200))]
    pub category_ids: Option<Vec<i32>>,

    #[validate(length(max = 200))]
    pub speciality_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewFilter {
    #[serde(alias = "publisher_id")]
    pub publisher_id: Option<i32>,
}

/// Review with its publisher and classification
#[derive(Debug, Serialize)]
pub struct ReviewDetail {
    #[serde(flatten)]
    pub review: review::Model,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<publisher::Model>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<category::Model>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialities: Option<Vec<review_speciality::Model>>,
}

impl Listing for review::Entity {
    fn search_columns() -> Vec<SimpleExpr> {
        vec![
            column::<review::Entity>(review::Column::ReviewTitle),
            column::<review::Entity>(review::Column::Issn),
            column::<review::Entity>(review::Column::EIssn),
        ]
    }

    fn default_sort() -> (review::Column, Order) {
        (review::Column::ReviewTitle, Order::Asc)
    }
}

#[async_trait]
impl Resource for review::Entity {
    const LABEL: &'static str = "Review";

    type Payload = ReviewPayload;

    type Filter = ReviewFilter;

    fn create_model(payload: &ReviewPayload) -> review::ActiveModel {
        let mut active = <review::ActiveModel as Default>::default();
        Self::update_model(&mut active, payload);
        active
    }

    fn update_model(active: &mut review::ActiveModel, payload: &ReviewPayload) {
        active.review_title = Set(clean(&payload.review_title));
        active.issn = Set(clean_opt(&payload.issn));
        active.e_issn = Set(clean_opt(&payload.e_issn));
        active.vol = Set(clean_opt(&payload.vol));
        active.publisher_id = Set(payload.publisher_id);
    }

    fn apply_filter(mut select: Select<review::Entity>, filter: &ReviewFilter) -> Select<review::Entity> {
        if let Some(publisher_id) = filter.publisher_id {
            select = select.filter(review::Column::PublisherId.eq(publisher_id));
        }
        select
    }

    async fn check(
        txn: &DatabaseTransaction,
        payload: &ReviewPayload,
        _existing: Option<review::Model>,
    ) -> Result<()> {
        ensure_exists::<publisher::Entity, _>(txn, "Publisher", payload.publisher_id).await?;
        for cat_id in payload.category_ids.iter().flatten() {
            ensure_exists::<category::Entity, _>(txn, "Category", *cat_id).await?;
        }
        for spec_id in payload.speciality_ids.iter().flatten() {
            ensure_exists::<review_speciality::Entity, _>(txn, "Review speciality", *spec_id).await?;
        }
        Ok(())
    }

    async fn sync_links(
        txn: &DatabaseTransaction,
        model: review::Model,
        payload: &ReviewPayload,
    ) -> Result<()> {
        if let Some(ref ids) = payload.category_ids {
            let rows = distinct(ids)
                .into_iter()
                .map(|cat_id| has_category::ActiveModel {
                    review_num: Set(model.review_num),
                    cat_id: Set(cat_id),
                })
                .collect();
            replace_links::<has_category::Entity>(
                txn,
                Condition::all().add(has_category::Column::ReviewNum.eq(model.review_num)),
                rows,
            )
            .await?;
        }
        if let Some(ref ids) = payload.speciality_ids {
            let rows = distinct(ids)
                .into_iter()
                .map(|spec_id| has_speciality::ActiveModel {
                    review_num: Set(model.review_num),
                    spec_id: Set(spec_id),
                })
                .collect();
            replace_links::<has_speciality::Entity>(
                txn,
                Condition::all().add(has_speciality::Column::ReviewNum.eq(model.review_num)),
                rows,
            )
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Expand for review::Entity {
    async fn expand(
        conn: &DatabaseConnection,
        model: review::Model,
        options: DetailOptions,
    ) -> Result<Value> {
        let publisher = if options.include_publisher || options.include_associations {
            model.find_related(publisher::Entity).one(conn).await?
        } else {
            None
        };

        let (categories, specialities) = if options.include_associations {
            let categories = model
                .find_related(category::Entity)
                .order_by_asc(category::Column::CatName)
                .all(conn)
                .await?;
            let specialities = model
                .find_related(review_speciality::Entity)
                .order_by_asc(review_speciality::Column::SpecName)
                .all(conn)
                .await?;
            (Some(categories), Some(specialities))
        } else {
            (None, None)
        };

        to_detail(&ReviewDetail {
            review: model,
            publisher,
            categories,
            specialities,
        })
    }
}

// ---------------------------------------------------------------------------
// Publications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PublicationPayload {
    #[validate(custom(function = "crate::validation::doi"))]
    pub doi: String,

    #[validate(length(min = 1, max = 1000), custom(function = "crate::validation::not_blank"))]
    pub title: String,

    pub submission_date: Option<NaiveDate>,

    pub acceptance_date: Option<NaiveDate>,

    #[validate(length(max = 50))]
    pub pages: Option<String>,

    pub review_num: i32,

    pub type_id: i32,

    #[validate(length(max = 200))]
    pub res_codes: Option<Vec<i32>>,

    #[validate(length(max = 200))]
    pub reg_nums: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublicationFilter {
    #[serde(alias = "review_num")]
    pub review_num: Option<i32>,

    #[serde(alias = "type_id")]
    pub type_id: Option<i32>,
}

/// Publication with its venue, type and authors
#[derive(Debug, Serialize)]
pub struct PublicationDetail {
    #[serde(flatten)]
    pub publication: publication::Model,

    pub review: Option<review::Model>,

    pub production_type: Option<production_type::Model>,

    pub researchers: Vec<researcher::Model>,

    pub doctoral_students: Vec<doctoral_student::Model>,
}

impl Listing for publication::Entity {
    fn search_columns() -> Vec<SimpleExpr> {
        vec![
            column::<publication::Entity>(publication::Column::Title),
            column::<publication::Entity>(publication::Column::Doi),
        ]
    }

    fn default_sort() -> (publication::Column, Order) {
        (publication::Column::AcceptanceDate, Order::Desc)
    }
}

#[async_trait]
impl Resource for publication::Entity {
    const LABEL: &'static str = "Publication";

    type Payload = PublicationPayload;

    type Filter = PublicationFilter;

    fn create_model(payload: &PublicationPayload) -> publication::ActiveModel {
        let mut active = publication::ActiveModel {
            doi: Set(clean(&payload.doi)),
            ..Default::default()
        };
        Self::update_model(&mut active, payload);
        active
    }

    fn update_model(active: &mut publication::ActiveModel, payload: &PublicationPayload) {
        active.title = Set(clean(&payload.title));
        active.submission_date = Set(payload.submission_date);
        active.acceptance_date = Set(payload.acceptance_date);
        active.pages = Set(clean_opt(&payload.pages));
        active.review_num = Set(payload.review_num);
        active.type_id = Set(payload.type_id);
    }

    fn apply_filter(
        mut select: Select<publication::Entity>,
        filter: &PublicationFilter,
    ) -> Select<publication::Entity> {
        if let Some(review_num) = filter.review_num {
            select = select.filter(publication::Column::ReviewNum.eq(review_num));
        }
        if let Some(type_id) = filter.type_id {
            select = select.filter(publication::Column::TypeId.eq(type_id));
        }
        select
    }

    async fn check(
        txn: &DatabaseTransaction,
        payload: &PublicationPayload,
        _existing: Option<publication::Model>,
    ) -> Result<()> {
        check_order(
            payload.submission_date,
            payload.acceptance_date,
            "acceptance_date",
            "acceptance_date must not precede submission_date",
        )?;
        ensure_exists::<review::Entity, _>(txn, "Review", payload.review_num).await?;
        ensure_exists::<production_type::Entity, _>(txn, "Production type", payload.type_id).await?;
        ensure_authors(txn, &payload.res_codes, &payload.reg_nums).await
    }

    async fn sync_links(
        txn: &DatabaseTransaction,
        model: publication::Model,
        payload: &PublicationPayload,
    ) -> Result<()> {
        if let Some(ref ids) = payload.res_codes {
            let rows = distinct(ids)
                .into_iter()
                .map(|res_code| publish_researcher_pub::ActiveModel {
                    res_code: Set(res_code),
                    doi: Set(model.doi.clone()),
                })
                .collect();
            replace_links::<publish_researcher_pub::Entity>(
                txn,
                Condition::all().add(publish_researcher_pub::Column::Doi.eq(model.doi.as_str())),
                rows,
            )
            .await?;
        }
        if let Some(ref ids) = payload.reg_nums {
            let rows = distinct(ids)
                .into_iter()
                .map(|reg_num| publish_doctoral_student_pub::ActiveModel {
                    reg_num: Set(reg_num),
                    doi: Set(model.doi.clone()),
                })
                .collect();
            replace_links::<publish_doctoral_student_pub::Entity>(
                txn,
                Condition::all()
                    .add(publish_doctoral_student_pub::Column::Doi.eq(model.doi.as_str())),
                rows,
            )
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Expand for publication::Entity {
    async fn expand(
        conn: &DatabaseConnection,
        model: publication::Model,
        options: DetailOptions,
    ) -> Result<Value> {
        if !options.include_associations {
            return to_detail(&model);
        }

        let review = model.find_related(review::Entity).one(conn).await?;
        let production_type = model.find_related(production_type::Entity).one(conn).await?;
        let researchers = model
            .find_related(researcher::Entity)
            .order_by_asc(researcher::Column::Lastname)
            .all(conn)
            .await?;
        let doctoral_students = model
            .find_related(doctoral_student::Entity)
            .order_by_asc(doctoral_student::Column::Lastname)
            .all(conn)
            .await?;

        to_detail(&PublicationDetail {
            publication: model,
            review,
            production_type,
            researchers,
            doctoral_students,
        })
    }
}

// ---------------------------------------------------------------------------
// Communications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CommunicationPayload {
    #[validate(length(min = 1, max = 1000), custom(function = "crate::validation::not_blank"))]
    pub title: String,

    #[validate(length(min = 1, max = 500), custom(function = "crate::validation::not_blank"))]
    pub event_title: String,

    #[validate(range(min = 1900, max = 2100))]
    pub year: i32,

    #[validate(url)]
    pub url: Option<String>,

    pub type_id: i32,

    #[validate(length(max = 200))]
    pub res_codes: Option<Vec<i32>>,

    #[validate(length(max = 200))]
    pub reg_nums: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommunicationFilter {
    #[serde(alias = "type_id")]
    pub type_id: Option<i32>,

    pub year: Option<i32>,
}

/// Communication with its type and authors
#[derive(Debug, Serialize)]
pub struct CommunicationDetail {
    #[serde(flatten)]
    pub communication: communication::Model,

    pub production_type: Option<production_type::Model>,

    pub researchers: Vec<researcher::Model>,

    pub doctoral_students: Vec<doctoral_student::Model>,
}

impl Listing for communication::Entity {
    fn search_columns() -> Vec<SimpleExpr> {
        vec![
            column::<communication::Entity>(communication::Column::Title),
            column::<communication::Entity>(communication::Column::EventTitle),
        ]
    }

    fn default_sort() -> (communication::Column, Order) {
        (communication::Column::Year, Order::Desc)
    }
}

#[async_trait]
impl Resource for communication::Entity {
    const LABEL: &'static str = "Communication";

    type Payload = CommunicationPayload;

    type Filter = CommunicationFilter;

    fn create_model(payload: &CommunicationPayload) -> communication::ActiveModel {
        let mut active = <communication::ActiveModel as Default>::default();
        Self::update_model(&mut active, payload);
        active
    }

    fn update_model(active: &mut communication::ActiveModel, payload: &CommunicationPayload) {
        active.title = Set(clean(&payload.title));
        active.event_title = Set(clean(&payload.event_title));
        active.year = Set(payload.year);
        active.url = Set(clean_opt(&payload.url));
        active.type_id = Set(payload.type_id);
    }

    fn apply_filter(
        mut select: Select<communication::Entity>,
        filter: &CommunicationFilter,
    ) -> Select<communication::Entity> {
        if let Some(type_id) = filter.type_id {
            select = select.filter(communication::Column::TypeId.eq(type_id));
        }
        if let Some(year) = filter.year {
            select = select.filter(communication::Column::Year.eq(year));
        }
        select
    }

    async fn check(
        txn: &DatabaseTransaction,
        payload: &CommunicationPayload,
        _existing: Option<communication::Model>,
    ) -> Result<()> {
        ensure_exists::<production_type::Entity, _>(txn, "Production type", payload.type_id).await?;
        ensure_authors(txn, &payload.res_codes, &payload.reg_nums).await
    }

    async fn sync_links(
        txn: &DatabaseTransaction,
        model: communication::Model,
        payload: &CommunicationPayload,
    ) -> Result<()> {
        if let Some(ref ids) = payload.res_codes {
            let rows = distinct(ids)
                .into_iter()
                .map(|res_code| publish_researcher_comm::ActiveModel {
                    res_code: Set(res_code),
                    id_comm: Set(model.id_comm),
                })
                .collect();
            replace_links::<publish_researcher_comm::Entity>(
                txn,
                Condition::all().add(publish_researcher_comm::Column::IdComm.eq(model.id_comm)),
                rows,
            )
            .await?;
        }
        if let Some(ref ids) = payload.reg_nums {
            let rows = distinct(ids)
                .into_iter()
                .map(|reg_num| publish_doctoral_student_comm::ActiveModel {
                    reg_num: Set(reg_num),
                    id_comm: Set(model.id_comm),
                })
                .collect();
            replace_links::<publish_doctoral_student_comm::Entity>(
                txn,
                Condition::all()
                    .add(publish_doctoral_student_comm::Column::IdComm.eq(model.id_comm)),
                rows,
            )
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Expand for communication::Entity {
    async fn expand(
        conn: &DatabaseConnection,
        model: communication::Model,
        options: DetailOptions,
    ) -> Result<Value> {
        if !options.include_associations {
            return to_detail(&model);
        }

        let production_type = model.find_related(production_type::Entity).one(conn).await?;
        let researchers = model
            .find_related(researcher::Entity)
            .order_by_asc(researcher::Column::Lastname)
            .all(conn)
            .await?;
        let doctoral_students = model
            .find_related(doctoral_student::Entity)
            .order_by_asc(doctoral_student::Column::Lastname)
            .all(conn)
            .await?;

        to_detail(&CommunicationDetail {
            communication: model,
            production_type,
            researchers,
            doctoral_students,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::resources::parse_payload;
    use serde_json::json;

    #[test]
    fn test_distinct_link_ids() {
        assert_eq!(distinct(&[3, 1, 3, 2, 1]), vec![1, 2, 3]);
        assert!(distinct::<i32>(&[]).is_empty());
    }

    #[test]
    fn test_absent_link_set_is_none() {
        let payload: ReviewPayload =
            parse_payload(json!({"reviewTitle": "Neurocomputing", "publisherId": 1})).unwrap();
        assert!(payload.category_ids.is_none());

        let payload: ReviewPayload = parse_payload(
            json!({"reviewTitle": "Neurocomputing", "publisherId": 1, "categoryIds": []}),
        )
        .unwrap();
        assert_eq!(payload.category_ids, Some(vec![]));
    }

    #[test]
    fn test_new_rows_leave_generated_keys_unset() {
        let payload: ReviewPayload = parse_payload(
            json!({"reviewTitle": "  Neurocomputing ", "issn": "0925-2312", "publisherId": 4}),
        )
        .unwrap();
        let active = review::Entity::create_model(&payload);
        assert!(active.review_num.is_not_set());
        assert_eq!(active.review_title, Set("Neurocomputing".to_string()));
        assert_eq!(active.publisher_id, Set(4));

        let payload: CommunicationPayload = parse_payload(json!({
            "title": "Sparse attention",
            "eventTitle": "NeurIPS",
            "year": 2024,
            "typeId": 2,
        }))
        .unwrap();
        let active = communication::Entity::create_model(&payload);
        assert!(active.id_comm.is_not_set());
        assert_eq!(active.year, Set(2024));
        assert_eq!(active.url, Set(None));
    }

    #[test]
    fn test_review_issn_validation() {
        let payload: ReviewPayload = parse_payload(
            json!({"reviewTitle": "Neurocomputing", "issn": "0925-2312", "eIssn": "bad", "publisherId": 1}),
        )
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("e_issn"));
        assert!(!errors.field_errors().contains_key("issn"));
    }
}
