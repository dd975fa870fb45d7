//! Shared helpers for the API integration tests
//!
//! Each test gets its own router over a fresh in-memory SQLite database.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use labdesk_api::{create_router, AppState};
use labdesk_common::{config::AppConfig, db::DbPool};
use serde_json::{json, Value};
use tower::ServiceExt;

pub struct TestApp {
    router: Router,
}

/// In-memory configuration without rate limiting
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::in_memory();
    config.rate_limit.enabled = false;
    config
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let db = DbPool::new(&config.database)
            .await
            .expect("in-memory database");
        Self {
            router: create_router(AppState::new(config, db)),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(body), None).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(body), None).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, None, None).await
    }

    /// POST that must succeed; returns the created row
    pub async fn create(&self, uri: &str, body: Value) -> Value {
        let (status, response) = self.post(uri, body).await;
        assert_eq!(status, StatusCode::CREATED, "POST {} failed: {}", uri, response);
        response["data"].clone()
    }
}

/// Keys of the rows a laboratory and its people depend on
#[derive(Debug, Clone, Copy)]
pub struct LabFixture {
    pub faculty_id: i64,
    pub domain_id: i64,
    pub dept_id: i64,
    pub lab_code: i64,
    pub team_id: i64,
    pub func_code: i64,
    pub spec_code: i64,
}

/// Create a laboratory with its own faculty, domain, department, team,
/// function and speciality; `tag` keeps the unique names apart
pub async fn seed_lab(app: &TestApp, tag: &str) -> LabFixture {
    let faculty = app
        .create("/api/v1/faculties", json!({"facultyName": format!("Faculty {tag}")}))
        .await;
    let domain = app
        .create("/api/v1/domains", json!({"domainName": format!("Domain {tag}")}))
        .await;
    let dept = app
        .create("/api/v1/departments", json!({"deptName": format!("Department {tag}")}))
        .await;
    let team = app
        .create("/api/v1/teams", json!({"teamName": format!("Team {tag}")}))
        .await;
    let function = app
        .create("/api/v1/functions", json!({"funcName": format!("Function {tag}")}))
        .await;
    let speciality = app
        .create("/api/v1/specialities", json!({"specName": format!("Speciality {tag}")}))
        .await;

    let lab = app
        .create(
            "/api/v1/laboratories",
            json!({
                "labName": format!("Lab {tag}"),
                "facultyId": faculty["faculty_id"],
                "domainId": domain["domain_id"],
                "deptId": dept["dept_id"],
            }),
        )
        .await;

    LabFixture {
        faculty_id: id(&faculty["faculty_id"]),
        domain_id: id(&domain["domain_id"]),
        dept_id: id(&dept["dept_id"]),
        lab_code: id(&lab["lab_code"]),
        team_id: id(&team["team_id"]),
        func_code: id(&function["func_code"]),
        spec_code: id(&speciality["spec_code"]),
    }
}

pub fn id(value: &Value) -> i64 {
    value.as_i64().expect("integer key")
}

pub async fn create_researcher(app: &TestApp, lab: &LabFixture, lastname: &str) -> i64 {
    let row = app
        .create(
            "/api/v1/researchers",
            json!({
                "firstname": "Test",
                "lastname": lastname,
                "gender": "female",
                "email": format!("{}@lab.example.org", lastname.to_lowercase()),
                "funcCode": lab.func_code,
                "specCode": lab.spec_code,
                "teamId": lab.team_id,
                "labCode": lab.lab_code,
            }),
        )
        .await;
    id(&row["res_code"])
}

pub async fn create_student(app: &TestApp, lab: &LabFixture, reg_num: i64, lastname: &str) -> i64 {
    let row = app
        .create(
            "/api/v1/doctoral-students",
            json!({
                "regNum": reg_num,
                "firstname": "Student",
                "lastname": lastname,
                "gender": "male",
                "email": format!("{}@phd.example.org", lastname.to_lowercase()),
                "specCode": lab.spec_code,
                "teamId": lab.team_id,
                "labCode": lab.lab_code,
            }),
        )
        .await;
    id(&row["reg_num"])
}

pub async fn create_equipment(app: &TestApp, lab: &LabFixture, inventory_num: &str, quantity: i32) {
    app.create(
        "/api/v1/equipment",
        json!({
            "inventoryNum": inventory_num,
            "equipName": format!("Device {inventory_num}"),
            "quantity": quantity,
            "labCode": lab.lab_code,
        }),
    )
    .await;
}
