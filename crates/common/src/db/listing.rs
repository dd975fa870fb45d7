//! Listing contract shared by every resource
//!
//! `page` is 1-based, `limit` bounds the page size, `sortBy` names a column
//! of the entity and `search` is a case-insensitive substring match over the
//! entity's display columns. An unknown `sortBy` is not an error: the
//! entity's default ordering is used instead.

use super::resources::snake_case;
use crate::errors::Result;
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ConnectionTrait, Condition, EntityTrait, Iterable, Order, PaginatorTrait, PrimaryKeyToColumn,
    QueryFilter, QueryOrder, Select,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

/// Page size used when the client does not send one
pub const DEFAULT_LIMIT: u64 = 10;

/// Largest accepted page size
pub const MAX_LIMIT: u64 = 100;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[serde(alias = "ASC", alias = "Asc")]
    Asc,
    #[serde(alias = "DESC", alias = "Desc")]
    Desc,
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// Query parameters of a list request
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ListQuery {
    #[validate(range(min = 1))]
    pub page: u64,

    #[validate(range(min = 1, max = 100))]
    pub limit: u64,

    #[serde(alias = "sort_by", skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,

    #[validate(length(max = 200))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
            sort_by: None,
            order: None,
            search: None,
        }
    }
}

impl ListQuery {
    pub fn page(page: u64, limit: u64) -> Self {
        Self {
            page,
            limit,
            ..Self::default()
        }
    }

    pub fn sorted(mut self, sort_by: &str, order: SortOrder) -> Self {
        self.sort_by = Some(sort_by.to_string());
        self.order = Some(order);
        self
    }

    pub fn searching(mut self, term: &str) -> Self {
        self.search = Some(term.to_string());
        self
    }

    /// The search term, trimmed; `None` when blank
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: u64,
    pub total_items: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// How an entity takes part in the listing contract
pub trait Listing: EntityTrait {
    /// Display columns matched by `search`; may belong to joined tables
    fn search_columns() -> Vec<SimpleExpr>;

    /// Ordering used when `sortBy` is absent or unknown
    fn default_sort() -> (Self::Column, Order);

    /// Base query; entities searching joined columns add their joins here
    fn base_select() -> Select<Self> {
        Self::find()
    }
}

/// Column reference qualified with its table, for search columns
pub fn column<E: EntityTrait>(column: E::Column) -> SimpleExpr {
    Expr::col((E::default(), column)).into()
}

/// Escape character of search patterns
pub const LIKE_ESCAPE: char = '!';

/// Escape LIKE wildcards so the term matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_') || ch == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}

/// `LOWER(col) LIKE '%term%'` over every search column, any match wins
pub fn search_condition<E: Listing>(term: &str) -> Condition {
    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
    E::search_columns()
        .into_iter()
        .fold(Condition::any(), |condition, col| {
            condition.add(
                Expr::expr(Func::lower(col)).like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE)),
            )
        })
}

/// Resolve `sortBy`/`order` to a column and direction, falling back to the
/// entity's default ordering for unknown columns
pub fn resolve_sort<E: Listing>(sort_by: Option<&str>, order: Option<SortOrder>) -> (E::Column, Order) {
    let (default_column, default_order) = E::default_sort();
    match sort_by.and_then(|name| E::Column::from_str(&snake_case(name.trim())).ok()) {
        Some(column) => (column, order.map(Order::from).unwrap_or(Order::Asc)),
        None => match order {
            Some(order) if sort_by.is_none() => (default_column, order.into()),
            _ => (default_column, default_order),
        },
    }
}

/// Apply search and ordering to a select
pub fn apply_query<E: Listing>(mut select: Select<E>, query: &ListQuery) -> Select<E> {
    if let Some(term) = query.search_term() {
        select = select.filter(search_condition::<E>(term));
    }

    let (sort_column, sort_order) = resolve_sort::<E>(query.sort_by.as_deref(), query.order);
    select = select.order_by(sort_column, sort_order);

    // Primary key tie-breaker keeps pages stable
    for key in E::PrimaryKey::iter() {
        select = select.order_by(key.into_column(), Order::Asc);
    }

    select
}

/// Run a paginated query
pub async fn paginate<E, C>(conn: &C, select: Select<E>, query: &ListQuery) -> Result<Page<E::Model>>
where
    E: Listing,
    E::Model: Send + Sync,
    C: ConnectionTrait,
{
    let select = apply_query(select, query);
    let paginator = select.paginate(conn, query.limit.max(1));
    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(query.page.saturating_sub(1)).await?;

    Ok(Page {
        items,
        total_pages: totals.number_of_pages,
        total_items: totals.number_of_items,
        page: query.page,
        limit: query.limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{assign_researcher, researcher, team};
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn test_default_query() {
        let query = ListQuery::default();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_limit_bounds() {
        assert!(ListQuery::page(1, 0).validate().is_err());
        assert!(ListQuery::page(1, MAX_LIMIT + 1).validate().is_err());
        assert!(ListQuery::page(0, 10).validate().is_err());
    }

    #[test]
    fn test_blank_search_is_ignored() {
        assert_eq!(ListQuery::default().searching("   ").search_term(), None);
        assert_eq!(ListQuery::default().searching(" Lab ").search_term(), Some("Lab"));
    }

    #[test]
    fn test_query_string_shape() {
        let query: ListQuery =
            serde_json::from_str(r#"{"page":2,"limit":5,"sortBy":"team_name","order":"DESC"}"#)
                .unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.sort_by.as_deref(), Some("team_name"));
        assert_eq!(query.order, Some(SortOrder::Desc));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off!"), "50!%!_off!!");
        assert_eq!(escape_like("back\\slash"), "back\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_unknown_sort_column_falls_back() {
        let (column, order) = resolve_sort::<team::Entity>(Some("no_such_column"), Some(SortOrder::Desc));
        assert!(matches!(column, team::Column::TeamName));
        assert_eq!(order, Order::Asc);
    }

    #[test]
    fn test_known_sort_column() {
        let (column, order) = resolve_sort::<team::Entity>(Some("team_id"), Some(SortOrder::Desc));
        assert!(matches!(column, team::Column::TeamId));
        assert_eq!(order, Order::Desc);

        let (column, order) = resolve_sort::<team::Entity>(Some("teamId"), None);
        assert!(matches!(column, team::Column::TeamId));
        assert_eq!(order, Order::Asc);

        let (column, order) = resolve_sort::<team::Entity>(None, Some(SortOrder::Desc));
        assert!(matches!(column, team::Column::TeamName));
        assert_eq!(order, Order::Desc);
    }

    #[test]
    fn test_search_sql_is_case_insensitive() {
        let query = ListQuery::default().searching("SMITH");
        let sql = apply_query(researcher::Entity::base_select(), &query)
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(sql.contains("LOWER(\"researchers\".\"lastname\")"));
        assert!(sql.contains("'%smith%'"));
        assert!(sql.contains("ORDER BY \"researchers\".\"lastname\" ASC"));
    }

    #[test]
    fn test_composite_key_tie_breaker() {
        let sql = apply_query(assign_researcher::Entity::base_select(), &ListQuery::default())
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(sql.contains("\"assign_researchers\".\"res_code\" ASC"));
        assert!(sql.contains("\"assign_researchers\".\"inventory_num\" ASC"));
    }
}
