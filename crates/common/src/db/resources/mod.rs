//! Per-resource rules
//!
//! Every entity exposed over the API implements [`Listing`] (search and
//! default ordering) and [`Resource`] (payload, filters, write checks and
//! link syncing). Entities with associations to show on their detail view
//! also implement [`Expand`].
//!
//! Payloads use the column names of the entity. Request bodies may use
//! camelCase keys; they are normalized before deserialization.

mod assignments;
mod equipment;
mod laboratory;
mod people;
mod production;
mod reference;

pub use assignments::{
    AssignDoctoralStudentFilter, AssignDoctoralStudentPayload, AssignResearcherFilter,
    AssignResearcherPayload, AssignmentDetail, DoctoralStudentLoan, ResearcherLoan,
    SuperviseFilter, SupervisePayload, SupervisionDetail,
};
pub use equipment::{EquipmentDetail, EquipmentFilter, EquipmentPayload};
pub use laboratory::{LaboratoryDetail, LaboratoryFilter, LaboratoryPayload};
pub use people::{
    DoctoralStudentDetail, DoctoralStudentFilter, DoctoralStudentPayload, ResearcherDetail,
    ResearcherFilter, ResearcherPayload,
};
pub use production::{
    CommunicationDetail, CommunicationFilter, CommunicationPayload, PublicationDetail,
    PublicationFilter, PublicationPayload, ReviewDetail, ReviewFilter, ReviewPayload,
};
pub use reference::{
    CategoryPayload, DepartmentPayload, DomainPayload, FacultyPayload, FunctionPayload,
    ProductionTypePayload, PublisherPayload, ReviewSpecialityPayload, SpecialityPayload,
    TeamPayload,
};

use super::listing::Listing;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, PaginatorTrait,
    PrimaryKeyTrait, Select,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// Query options of a detail request
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetailOptions {
    #[serde(alias = "include_associations")]
    pub include_associations: bool,

    #[serde(alias = "include_publisher")]
    pub include_publisher: bool,
}

/// Filters for resources without foreign-key filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoFilter {}

/// Write rules of an entity exposed over the API
#[async_trait]
pub trait Resource: Listing {
    /// Human-readable name used in messages and logs
    const LABEL: &'static str;

    type Payload: DeserializeOwned + Validate + Send + Sync;

    type Filter: DeserializeOwned + Default + Send + Sync;

    /// Build a new row; key columns the database generates stay unset
    fn create_model(payload: &Self::Payload) -> Self::ActiveModel;

    /// Copy payload attributes onto an existing row; key columns are never touched
    fn update_model(active: &mut Self::ActiveModel, payload: &Self::Payload);

    fn apply_filter(select: Select<Self>, _filter: &Self::Filter) -> Select<Self> {
        select
    }

    /// Cross-row rules checked inside the write transaction
    async fn check(
        _txn: &DatabaseTransaction,
        _payload: &Self::Payload,
        _existing: Option<Self::Model>,
    ) -> Result<()> {
        Ok(())
    }

    /// Replace link rows named by the payload, inside the write transaction
    async fn sync_links(
        _txn: &DatabaseTransaction,
        _model: Self::Model,
        _payload: &Self::Payload,
    ) -> Result<()> {
        Ok(())
    }
}

/// Detail view with associations
#[async_trait]
pub trait Expand: Resource {
    async fn expand(
        conn: &DatabaseConnection,
        model: Self::Model,
        options: DetailOptions,
    ) -> Result<Value>;
}

/// Fail with 404 when no `E` row has the given key
pub(crate) async fn ensure_exists<E, C>(
    conn: &C,
    label: &str,
    key: <E::PrimaryKey as PrimaryKeyTrait>::ValueType,
) -> Result<E::Model>
where
    E: EntityTrait,
    C: ConnectionTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: Clone,
{
    E::find_by_id(key.clone())
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(label, key))
}

/// Count rows of a select
pub(crate) async fn count<E, C>(conn: &C, select: Select<E>) -> Result<u64>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    Ok(select.count(conn).await?)
}

/// Reject a closing date that precedes its opening date
pub(crate) fn check_order<T: PartialOrd>(
    start: Option<T>,
    end: Option<T>,
    end_field: &str,
    message: &str,
) -> Result<()> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(AppError::Validation {
            message: message.to_string(),
            field: Some(end_field.to_string()),
        }),
        _ => Ok(()),
    }
}

/// Trimmed copy of a required text field
pub(crate) fn clean(value: &str) -> String {
    value.trim().to_string()
}

/// Trimmed copy of an optional text field; blank becomes `None`
pub(crate) fn clean_opt(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Serialize a detail view
pub(crate) fn to_detail<T: Serialize>(detail: &T) -> Result<Value> {
    Ok(serde_json::to_value(detail)?)
}

/// Convert top-level camelCase keys to snake_case
pub fn normalize_keys(body: Value) -> Value {
    match body {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (snake_case(&key), value))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

pub(crate) fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Parse a request body into a payload; shape errors are validation errors
pub fn parse_payload<P: DeserializeOwned>(body: Value) -> Result<P> {
    serde_json::from_value(normalize_keys(body)).map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })
}
