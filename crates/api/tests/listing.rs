//! Paginated, filtered and sorted listing

mod common;

use axum::http::StatusCode;
use common::{create_researcher, seed_lab, TestApp};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn names(page: &Value, field: &str) -> Vec<String> {
    page["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| item[field].as_str().unwrap_or_default().to_string())
        .collect()
}

async fn create_faculties(app: &TestApp, names: &[&str]) {
    for name in names {
        app.create("/api/v1/faculties", json!({"facultyName": name})).await;
    }
}

#[tokio::test]
async fn pages_are_bounded_and_counted() {
    let app = TestApp::new().await;
    let all: Vec<String> = (1..=12).map(|i| format!("Faculty {:02}", i)).collect();
    let refs: Vec<&str> = all.iter().map(String::as_str).collect();
    create_faculties(&app, &refs).await;

    let (status, page) = app.get("/api/v1/faculties?page=2&limit=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalItems"], 12);
    assert_eq!(page["totalPages"], 3);
    assert_eq!(page["page"], 2);
    assert_eq!(page["limit"], 5);
    assert_eq!(
        names(&page, "faculty_name"),
        vec!["Faculty 06", "Faculty 07", "Faculty 08", "Faculty 09", "Faculty 10"]
    );

    let (_, last) = app.get("/api/v1/faculties?page=3&limit=5").await;
    assert_eq!(names(&last, "faculty_name"), vec!["Faculty 11", "Faculty 12"]);

    let (_, beyond) = app.get("/api/v1/faculties?page=9&limit=5").await;
    assert_eq!(beyond["items"], json!([]));
    assert_eq!(beyond["totalItems"], 12);
}

#[tokio::test]
async fn default_page_size_is_ten() {
    let app = TestApp::new().await;
    let all: Vec<String> = (1..=11).map(|i| format!("Team {:02}", i)).collect();
    for name in &all {
        app.create("/api/v1/teams", json!({"teamName": name})).await;
    }

    let (_, page) = app.get("/api/v1/teams").await;
    assert_eq!(page["items"].as_array().map(Vec::len), Some(10));
    assert_eq!(page["page"], 1);
    assert_eq!(page["limit"], 10);
    assert_eq!(page["totalPages"], 2);
}

#[tokio::test]
async fn out_of_range_paging_is_rejected() {
    let app = TestApp::new().await;

    for uri in [
        "/api/v1/faculties?page=0",
        "/api/v1/faculties?limit=0",
        "/api/v1/faculties?limit=101",
        "/api/v1/faculties?limit=ten",
    ] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string(), "{}", uri);
    }
}

#[tokio::test]
async fn search_is_case_insensitive_substring() {
    let app = TestApp::new().await;
    create_faculties(&app, &["Faculty of Physics", "Faculty of Chemistry", "Medicine"]).await;

    let (_, page) = app.get("/api/v1/faculties?search=PHYS").await;
    assert_eq!(names(&page, "faculty_name"), vec!["Faculty of Physics"]);

    let (_, page) = app.get("/api/v1/faculties?search=faculty").await;
    assert_eq!(page["totalItems"], 2);

    let (_, page) = app.get("/api/v1/faculties?search=").await;
    assert_eq!(page["totalItems"], 3);

    let (_, page) = app.get("/api/v1/faculties?search=%20%20").await;
    assert_eq!(page["totalItems"], 3);
}

#[tokio::test]
async fn search_wildcards_match_literally() {
    let app = TestApp::new().await;
    create_faculties(&app, &["Rate 100% Sure", "Rate 100 Sure"]).await;

    // `%25` is an encoded `%`
    let (_, page) = app.get("/api/v1/faculties?search=100%25").await;
    assert_eq!(names(&page, "faculty_name"), vec!["Rate 100% Sure"]);

    let (_, page) = app.get("/api/v1/faculties?search=_").await;
    assert_eq!(page["totalItems"], 0);
}

#[tokio::test]
async fn unknown_sort_column_falls_back_to_default_order() {
    let app = TestApp::new().await;
    create_faculties(&app, &["Beta", "Alpha", "Gamma"]).await;

    let (status, page) = app
        .get("/api/v1/faculties?sortBy=no_such_column&order=desc")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&page, "faculty_name"), vec!["Alpha", "Beta", "Gamma"]);

    let (_, page) = app.get("/api/v1/faculties?sortBy=faculty_name&order=desc").await;
    assert_eq!(names(&page, "faculty_name"), vec!["Gamma", "Beta", "Alpha"]);

    let (_, page) = app.get("/api/v1/faculties?sortBy=facultyName&order=DESC").await;
    assert_eq!(names(&page, "faculty_name"), vec!["Gamma", "Beta", "Alpha"]);

    let (_, page) = app.get("/api/v1/faculties?sortBy=faculty_id").await;
    assert_eq!(names(&page, "faculty_name"), vec!["Beta", "Alpha", "Gamma"]);
}

#[tokio::test]
async fn foreign_key_filters_narrow_the_list() {
    let app = TestApp::new().await;
    let lab_a = seed_lab(&app, "A").await;
    let lab_b = seed_lab(&app, "B").await;

    create_researcher(&app, &lab_a, "Amrani").await;
    create_researcher(&app, &lab_a, "Benali").await;
    create_researcher(&app, &lab_b, "Cherif").await;

    let (_, page) = app
        .get(&format!("/api/v1/researchers?labCode={}", lab_a.lab_code))
        .await;
    assert_eq!(names(&page, "lastname"), vec!["Amrani", "Benali"]);
    assert_eq!(page["totalItems"], 2);

    let (_, page) = app
        .get(&format!("/api/v1/researchers?lab_code={}&search=cher", lab_b.lab_code))
        .await;
    assert_eq!(names(&page, "lastname"), vec!["Cherif"]);

    let (_, page) = app
        .get(&format!("/api/v1/laboratories?facultyId={}", lab_b.faculty_id))
        .await;
    assert_eq!(names(&page, "lab_name"), vec!["Lab B"]);
}

#[tokio::test]
async fn all_returns_every_row_in_default_order() {
    let app = TestApp::new().await;
    let all: Vec<String> = (1..=15).map(|i| format!("Category {:02}", 16 - i)).collect();
    for name in &all {
        app.create("/api/v1/categories", json!({"catName": name})).await;
    }

    let (status, rows) = app.get("/api/v1/categories/all").await;
    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().expect("array");
    assert_eq!(rows.len(), 15);
    assert_eq!(rows[0]["cat_name"], "Category 01");
    assert_eq!(rows[14]["cat_name"], "Category 15");
}
