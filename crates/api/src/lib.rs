//! LabDesk API server
//!
//! REST surface over the lab-management entities. Handles:
//! - Listing, detail and CRUD routes for every resource
//! - Authentication and authorization
//! - Rate limiting
//! - Observability (logging, metrics, request ids)

pub mod handlers;
pub mod middleware;

use axum::{
    extract::FromRef,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use labdesk_common::{
    auth::Authenticator,
    config::AppConfig,
    db::{models::*, DbPool, Expand, KeyOf, Repository},
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, IntoActiveModel};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use handlers::{crud, health};
use middleware::rate_limit::{rate_limit_middleware, RateLimit};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repo: Repository,
    pub auth: Authenticator,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        let auth = match config.auth.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => {
                Authenticator::with_secret(secret, config.auth.jwt_expiration_secs)
            }
            _ => Authenticator::disabled(),
        };

        Self {
            config: Arc::new(config),
            repo: Repository::new(db),
            auth,
            metrics: None,
        }
    }

    /// Serve Prometheus metrics from this handle
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl FromRef<AppState> for Authenticator {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// Routes of one resource; `key` is the path of a row, e.g. `/{id}` or
/// `/{res_code}/{inventory_num}` for composite keys
fn resource_routes<E>(key: &str) -> Router<AppState>
where
    E: Expand,
    E::Model: Serialize + IntoActiveModel<E::ActiveModel> + Clone + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    KeyOf<E>: Clone + DeserializeOwned,
{
    Router::new()
        .route("/", get(crud::list::<E>).post(crud::create::<E>))
        .route("/all", get(crud::all::<E>))
        .route(
            key,
            get(crud::detail::<E>)
                .put(crud::update::<E>)
                .delete(crud::delete::<E>),
        )
}

/// Every `/api/v1` resource
fn api_routes() -> Router<AppState> {
    Router::new()
        // Reference entities
        .nest("/faculties", resource_routes::<faculty::Entity>("/{id}"))
        .nest("/departments", resource_routes::<department::Entity>("/{id}"))
        .nest("/domains", resource_routes::<domain::Entity>("/{id}"))
        .nest("/teams", resource_routes::<team::Entity>("/{id}"))
        .nest("/functions", resource_routes::<function::Entity>("/{id}"))
        .nest("/specialities", resource_routes::<speciality::Entity>("/{id}"))
        .nest("/publishers", resource_routes::<publisher::Entity>("/{id}"))
        .nest("/production-types", resource_routes::<production_type::Entity>("/{id}"))
        .nest("/categories", resource_routes::<category::Entity>("/{id}"))
        .nest(
            "/review-specialities",
            resource_routes::<review_speciality::Entity>("/{id}"),
        )
        // Core entities
        .nest("/laboratories", resource_routes::<laboratory::Entity>("/{lab_code}"))
        .nest("/researchers", resource_routes::<researcher::Entity>("/{res_code}"))
        .nest(
            "/doctoral-students",
            resource_routes::<doctoral_student::Entity>("/{reg_num}"),
        )
        .nest("/equipment", resource_routes::<equipment::Entity>("/{inventory_num}"))
        .nest("/reviews", resource_routes::<review::Entity>("/{review_num}"))
        .nest("/publications", resource_routes::<publication::Entity>("/{doi}"))
        .nest("/communications", resource_routes::<communication::Entity>("/{id_comm}"))
        // Assignment and supervision
        .nest(
            "/assign-researchers",
            resource_routes::<assign_researcher::Entity>("/{res_code}/{inventory_num}"),
        )
        .nest(
            "/assign-doctoral-students",
            resource_routes::<assign_doctoral_student::Entity>("/{reg_num}/{inventory_num}"),
        )
        .nest(
            "/supervisions",
            resource_routes::<supervise::Entity>("/{res_code}/{reg_num}"),
        )
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let mut api = api_routes();
    if state.config.rate_limit.enabled {
        let limit = RateLimit::new(
            state.config.rate_limit.requests_per_second,
            state.config.rate_limit.burst,
        );
        api = api.layer(from_fn_with_state(limit, rate_limit_middleware));
    }

    // Compose the app
    Router::new()
        // Health endpoints (no auth)
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/metrics", get(health::metrics))
        .nest("/api/v1", api)
        .route_layer(from_fn(middleware::metrics::track_metrics))
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}
