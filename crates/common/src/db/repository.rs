//! Repository pattern for database operations
//!
//! One generic implementation of list, detail, create, update and delete
//! serves every entity that implements [`Resource`]. Writes run in a
//! transaction so the rule checks and the write see the same rows.

use super::listing::{apply_query, paginate, ListQuery, Page};
use super::resources::{normalize_keys, parse_payload, DetailOptions, Expand, Resource};
use super::DbPool;
use crate::errors::{format_key, AppError, Result};
use crate::metrics::{record_list, record_mutation, Mutation};
use sea_orm::sea_query::FromValueTuple;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DatabaseConnection, EntityTrait, IdenStatic,
    IntoActiveModel, Iterable, PrimaryKeyToColumn, PrimaryKeyTrait, TransactionTrait,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use validator::Validate;

/// Primary key value of an entity; a tuple for composite keys
pub type KeyOf<E> = <<E as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType;

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// One page of rows matching the filters, search and ordering
    pub async fn list<E>(&self, query: &ListQuery, filter: &E::Filter) -> Result<Page<E::Model>>
    where
        E: Resource,
        E::Model: Sync,
    {
        query.validate()?;
        let select = E::apply_filter(E::base_select(), filter);
        let page = paginate(self.read_conn(), select, query).await?;

        debug!(
            resource = E::LABEL,
            page = page.page,
            total_items = page.total_items,
            "Listed rows"
        );
        record_list(E::LABEL, query.search_term().is_some());

        Ok(page)
    }

    /// Every row matching the filters, in default order; used by pickers
    pub async fn all<E>(&self, filter: &E::Filter) -> Result<Vec<E::Model>>
    where
        E: Resource,
        E::Model: Sync,
    {
        let select = apply_query(E::apply_filter(E::base_select(), filter), &ListQuery::default());
        Ok(select.all(self.read_conn()).await?)
    }

    /// Find a row by primary key
    pub async fn get<E>(&self, key: KeyOf<E>) -> Result<E::Model>
    where
        E: Resource,
        KeyOf<E>: Clone,
    {
        E::find_by_id(key.clone())
            .one(self.read_conn())
            .await?
            .ok_or_else(|| AppError::not_found(E::LABEL, key))
    }

    /// Detail view of a row, with associations when requested
    pub async fn detail<E>(&self, key: KeyOf<E>, options: DetailOptions) -> Result<Value>
    where
        E: Expand,
        KeyOf<E>: Clone,
    {
        let model = self.get::<E>(key).await?;
        E::expand(self.read_conn(), model, options).await
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Insert a row from a request body
    pub async fn create<E>(&self, body: Value) -> Result<E::Model>
    where
        E: Resource,
        E::Model: Serialize + IntoActiveModel<E::ActiveModel> + Clone + Sync,
        E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        KeyOf<E>: Clone,
    {
        let payload: E::Payload = parse_payload(body)?;
        payload.validate()?;

        let active = E::create_model(&payload);
        let txn = self.write_conn().begin().await?;

        // Natural keys collide before the insert does
        if let Some(tuple) = active.get_primary_key_value() {
            let key = <KeyOf<E>>::from_value_tuple(tuple);
            if E::find_by_id(key.clone()).one(&txn).await?.is_some() {
                return Err(AppError::duplicate_key(E::LABEL, key));
            }
        }

        E::check(&txn, &payload, None).await?;
        let model = active.insert(&txn).await?;
        E::sync_links(&txn, model.clone(), &payload).await?;
        txn.commit().await?;

        info!(resource = E::LABEL, key = %key_of::<E>(&model), "Created");
        record_mutation(E::LABEL, Mutation::Create);

        Ok(model)
    }

    /// Update a row from a partial request body
    ///
    /// Attributes absent from the body keep their stored values. Key
    /// columns in the body are ignored.
    pub async fn update<E>(&self, key: KeyOf<E>, body: Value) -> Result<E::Model>
    where
        E: Resource,
        E::Model: Serialize + IntoActiveModel<E::ActiveModel> + Clone + Sync,
        E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
        KeyOf<E>: Clone,
    {
        let Value::Object(changes) = normalize_keys(body) else {
            return Err(AppError::Validation {
                message: "Request body must be a JSON object".to_string(),
                field: None,
            });
        };

        let txn = self.write_conn().begin().await?;
        let existing = E::find_by_id(key.clone())
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found(E::LABEL, key.clone()))?;

        let Value::Object(stored) = serde_json::to_value(&existing)? else {
            return Err(AppError::Internal {
                message: format!("{} row did not serialize to an object", E::LABEL),
            });
        };

        let mut merged = stored.clone();
        merged.extend(changes);
        for column in E::PrimaryKey::iter().map(|k| k.into_column()) {
            let name = column.as_str();
            if let Some(value) = stored.get(name) {
                merged.insert(name.to_string(), value.clone());
            }
        }

        let payload: E::Payload = parse_payload(Value::Object(merged))?;
        payload.validate()?;

        E::check(&txn, &payload, Some(existing.clone())).await?;
        let mut active = existing.into_active_model();
        E::update_model(&mut active, &payload);
        let model = active.update(&txn).await?;
        E::sync_links(&txn, model.clone(), &payload).await?;
        txn.commit().await?;

        info!(resource = E::LABEL, key = %key_of::<E>(&model), "Updated");
        record_mutation(E::LABEL, Mutation::Update);

        Ok(model)
    }

    /// Delete a row by primary key
    pub async fn delete<E>(&self, key: KeyOf<E>) -> Result<()>
    where
        E: Resource,
        KeyOf<E>: Clone,
    {
        let rendered = format_key(key.clone());
        let result = E::delete_by_id(key.clone())
            .exec(self.write_conn())
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::ForeignKey { .. } => AppError::ForeignKey {
                    message: format!(
                        "{} {} is still referenced by other records",
                        E::LABEL, rendered
                    ),
                },
                other => other,
            })?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found(E::LABEL, key));
        }

        info!(resource = E::LABEL, key = %rendered, "Deleted");
        record_mutation(E::LABEL, Mutation::Delete);

        Ok(())
    }
}

/// Rendered primary key of a stored row
fn key_of<E>(model: &E::Model) -> String
where
    E: EntityTrait,
    E::Model: Serialize,
{
    let Ok(Value::Object(fields)) = serde_json::to_value(model) else {
        return String::new();
    };
    E::PrimaryKey::iter()
        .map(|k| k.into_column())
        .filter_map(|column| fields.get(column.as_str()))
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{assign_researcher, team};
    use chrono::NaiveDate;

    #[test]
    fn test_key_of_single_column() {
        let model = team::Model {
            team_id: 4,
            team_name: "Vision".into(),
            team_abbr: None,
            team_desc: None,
        };
        assert_eq!(key_of::<team::Entity>(&model), "4");
    }

    #[test]
    fn test_key_of_composite() {
        let model = assign_researcher::Model {
            res_code: 12,
            inventory_num: "EQ-001".into(),
            assign_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            return_date: None,
        };
        assert_eq!(key_of::<assign_researcher::Entity>(&model), "12/EQ-001");
    }
}
