//! Reference entities: a surrogate key and a unique display name

use super::{clean, clean_opt, to_detail, DetailOptions, Expand, NoFilter, Resource};
use crate::db::listing::{column, Listing};
use crate::errors::Result;
use crate::db::models::{
    category, department, domain, faculty, function, production_type, publisher,
    review_speciality, speciality, team,
};
use async_trait::async_trait;
use sea_orm::sea_query::SimpleExpr;
use sea_orm::{DatabaseConnection, Order, Set};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Reference entity whose only attribute is its unique name
macro_rules! named_reference {
    ($module:ident, $payload:ident, $label:literal, $field:ident, $column:ident) => {
        #[derive(Debug, Clone, Deserialize, Serialize, Validate)]
        pub struct $payload {
            #[validate(
                length(min = 1, max = 255),
                custom(function = "crate::validation::not_blank")
            )]
            pub $field: String,
        }

        impl Listing for $module::Entity {
            fn search_columns() -> Vec<SimpleExpr> {
                vec![column::<$module::Entity>($module::Column::$column)]
            }

            fn default_sort() -> ($module::Column, Order) {
                ($module::Column::$column, Order::Asc)
            }
        }

        #[async_trait]
        impl Resource for $module::Entity {
            const LABEL: &'static str = $label;

            type Payload = $payload;

            type Filter = NoFilter;

            fn create_model(payload: &$payload) -> $module::ActiveModel {
                $module::ActiveModel {
                    $field: Set(clean(&payload.$field)),
                    ..Default::default()
                }
            }

            fn update_model(active: &mut $module::ActiveModel, payload: &$payload) {
                active.$field = Set(clean(&payload.$field));
            }
        }
    };
}

named_reference!(faculty, FacultyPayload, "Faculty", faculty_name, FacultyName);
named_reference!(department, DepartmentPayload, "Department", dept_name, DeptName);
named_reference!(function, FunctionPayload, "Function", func_name, FuncName);
named_reference!(speciality, SpecialityPayload, "Speciality", spec_name, SpecName);
named_reference!(production_type, ProductionTypePayload, "Production type", type_name, TypeName);
named_reference!(category, CategoryPayload, "Category", cat_name, CatName);
named_reference!(
    review_speciality,
    ReviewSpecialityPayload,
    "Review speciality",
    spec_name,
    SpecName
);

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct DomainPayload {
    #[validate(length(min = 1, max = 255), custom(function = "crate::validation::not_blank"))]
    pub domain_name: String,

    #[validate(length(max = 50))]
    pub domain_abbr: Option<String>,
}

impl Listing for domain::Entity {
    fn search_columns() -> Vec<SimpleExpr> {
        vec![
            column::<domain::Entity>(domain::Column::DomainName),
            column::<domain::Entity>(domain::Column::DomainAbbr),
        ]
    }

    fn default_sort() -> (domain::Column, Order) {
        (domain::Column::DomainName, Order::Asc)
    }
}

#[async_trait]
impl Resource for domain::Entity {
    const LABEL: &'static str = "Domain";

    type Payload = DomainPayload;

    type Filter = NoFilter;

    fn create_model(payload: &DomainPayload) -> domain::ActiveModel {
        domain::ActiveModel {
            domain_name: Set(clean(&payload.domain_name)),
            domain_abbr: Set(clean_opt(&payload.domain_abbr)),
            ..Default::default()
        }
    }

    fn update_model(active: &mut domain::ActiveModel, payload: &DomainPayload) {
        active.domain_name = Set(clean(&payload.domain_name));
        active.domain_abbr = Set(clean_opt(&payload.domain_abbr));
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct TeamPayload {
    #[validate(length(min = 1, max = 255), custom(function = "crate::validation::not_blank"))]
    pub team_name: String,

    #[validate(length(max = 50))]
    pub team_abbr: Option<String>,

    #[validate(length(max = 5000))]
    pub team_desc: Option<String>,
}

impl Listing for team::Entity {
    fn search_columns() -> Vec<SimpleExpr> {
        vec![
            column::<team::Entity>(team::Column::TeamName),
            column::<team::Entity>(team::Column::TeamAbbr),
        ]
    }

    fn default_sort() -> (team::Column, Order) {
        (team::Column::TeamName, Order::Asc)
    }
}

#[async_trait]
impl Resource for team::Entity {
    const LABEL: &'static str = "Team";

    type Payload = TeamPayload;

    type Filter = NoFilter;

    fn create_model(payload: &TeamPayload) -> team::ActiveModel {
        team::ActiveModel {
            team_name: Set(clean(&payload.team_name)),
            team_abbr: Set(clean_opt(&payload.team_abbr)),
            team_desc: Set(clean_opt(&payload.team_desc)),
            ..Default::default()
        }
    }

    fn update_model(active: &mut team::ActiveModel, payload: &TeamPayload) {
        active.team_name = Set(clean(&payload.team_name));
        active.team_abbr = Set(clean_opt(&payload.team_abbr));
        active.team_desc = Set(clean_opt(&payload.team_desc));
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PublisherPayload {
    #[validate(length(min = 1, max = 255), custom(function = "crate::validation::not_blank"))]
    pub publisher_name: String,

    #[validate(length(max = 100))]
    pub country: Option<String>,
}

impl Listing for publisher::Entity {
    fn search_columns() -> Vec<SimpleExpr> {
        vec![
            column::<publisher::Entity>(publisher::Column::PublisherName),
            column::<publisher::Entity>(publisher::Column::Country),
        ]
    }

    fn default_sort() -> (publisher::Column, Order) {
        (publisher::Column::PublisherName, Order::Asc)
    }
}

#[async_trait]
impl Resource for publisher::Entity {
    const LABEL: &'static str = "Publisher";

    type Payload = PublisherPayload;

    type Filter = NoFilter;

    fn create_model(payload: &PublisherPayload) -> publisher::ActiveModel {
        publisher::ActiveModel {
            publisher_name: Set(clean(&payload.publisher_name)),
            country: Set(clean_opt(&payload.country)),
            ..Default::default()
        }
    }

    fn update_model(active: &mut publisher::ActiveModel, payload: &PublisherPayload) {
        active.publisher_name = Set(clean(&payload.publisher_name));
        active.country = Set(clean_opt(&payload.country));
    }
}

/// Reference rows have no associations; the detail view is the row itself
macro_rules! plain_detail {
    ($($module:ident),+ $(,)?) => {
        $(
            #[async_trait]
            impl Expand for $module::Entity {
                async fn expand(
                    _conn: &DatabaseConnection,
                    model: $module::Model,
                    _options: DetailOptions,
                ) -> Result<Value> {
                    to_detail(&model)
                }
            }
        )+
    };
}

plain_detail!(
    faculty,
    department,
    function,
    speciality,
    production_type,
    category,
    review_speciality,
    domain,
    team,
    publisher,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::resources::parse_payload;
    use serde_json::json;

    #[test]
    fn test_blank_name_is_rejected() {
        let payload: FacultyPayload = parse_payload(json!({"facultyName": "   "})).unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_names_are_trimmed() {
        let payload: TeamPayload =
            parse_payload(json!({"teamName": "  Vision ", "teamAbbr": " "})).unwrap();
        let active = team::Entity::create_model(&payload);
        assert_eq!(active.team_name, Set("Vision".to_string()));
        assert_eq!(active.team_abbr, Set(None));
        assert!(active.team_id.is_not_set());
    }

    #[test]
    fn test_missing_name_is_a_validation_error() {
        let err = parse_payload::<PublisherPayload>(json!({"country": "DZ"})).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
