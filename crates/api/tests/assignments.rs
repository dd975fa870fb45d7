//! Equipment loans and supervisions keyed by the pair they relate

mod common;

use axum::http::StatusCode;
use common::{create_equipment, create_researcher, create_student, seed_lab, TestApp};
use pretty_assertions::assert_eq;
use serde_json::json;

const REG_NUM: i64 = 202_400_000_001;

#[tokio::test]
async fn open_loan_round_trip() {
    let app = TestApp::new().await;
    let lab = seed_lab(&app, "O").await;
    let res_code = create_researcher(&app, &lab, "Borrower").await;
    create_equipment(&app, &lab, "EQ-001", 1).await;

    let (status, body) = app
        .post(
            "/api/v1/assign-researchers",
            json!({"resCode": res_code, "inventoryNum": "EQ-001", "assignDate": "2024-01-10"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["return_date"], json!(null));

    let uri = format!("/api/v1/assign-researchers/{}/EQ-001", res_code);
    let (status, detail) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["status"], "active");
    assert_eq!(detail["assign_date"], "2024-01-10");
    assert!(detail["duration_months"].as_i64().unwrap() > 0);
    assert_eq!(detail.get("person"), None);

    let (_, detail) = app.get(&format!("{}?includeAssociations=true", uri)).await;
    assert_eq!(detail["person"]["lastname"], "Borrower");
    assert_eq!(detail["equipment"]["inventory_num"], "EQ-001");

    // Returning the equipment closes the loan
    let (status, body) = app.put(&uri, json!({"returnDate": "2024-03-15"})).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let (_, detail) = app.get(&uri).await;
    assert_eq!(detail["status"], "returned");
    assert_eq!(detail["duration_months"], 3);
}

#[tokio::test]
async fn same_pair_twice_is_a_conflict() {
    let app = TestApp::new().await;
    let lab = seed_lab(&app, "T").await;
    let res_code = create_researcher(&app, &lab, "Twice").await;
    create_equipment(&app, &lab, "EQ-002", 5).await;

    let body = json!({
        "resCode": res_code,
        "inventoryNum": "EQ-002",
        "assignDate": "2024-01-10",
        "returnDate": "2024-01-20",
    });
    app.create("/api/v1/assign-researchers", body.clone()).await;

    let (status, response) = app.post("/api/v1/assign-researchers", body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(response["code"], "DUPLICATE_KEY");
    assert_eq!(
        response["error"],
        format!("Researcher assignment already exists: {}/EQ-002", res_code)
    );

    let (_, page) = app.get("/api/v1/assign-researchers").await;
    assert_eq!(page["totalItems"], 1);
}

#[tokio::test]
async fn open_loans_never_exceed_quantity() {
    let app = TestApp::new().await;
    let lab = seed_lab(&app, "C").await;
    let first = create_researcher(&app, &lab, "First").await;
    let second = create_researcher(&app, &lab, "Second").await;
    let student = create_student(&app, &lab, REG_NUM, "Third").await;
    create_equipment(&app, &lab, "EQ-003", 1).await;

    app.create(
        "/api/v1/assign-researchers",
        json!({"resCode": first, "inventoryNum": "EQ-003", "assignDate": "2024-02-01"}),
    )
    .await;

    let (status, body) = app
        .post(
            "/api/v1/assign-researchers",
            json!({"resCode": second, "inventoryNum": "EQ-003", "assignDate": "2024-02-02"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CAPACITY_EXCEEDED");

    // The cap spans both loan tables
    let (status, _) = app
        .post(
            "/api/v1/assign-doctoral-students",
            json!({"regNum": student, "inventoryNum": "EQ-003", "assignDate": "2024-02-02"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Editing the open loan keeps its own slot
    let first_uri = format!("/api/v1/assign-researchers/{}/EQ-003", first);
    let (status, _) = app.put(&first_uri, json!({"assignDate": "2024-01-31"})).await;
    assert_eq!(status, StatusCode::OK);

    // Once returned, the unit can go out again
    let (status, _) = app.put(&first_uri, json!({"returnDate": "2024-02-10"})).await;
    assert_eq!(status, StatusCode::OK);
    app.create(
        "/api/v1/assign-researchers",
        json!({"resCode": second, "inventoryNum": "EQ-003", "assignDate": "2024-02-11"}),
    )
    .await;

    // Reopening the returned loan would exceed the single unit
    let (status, _) = app.put(&first_uri, json!({"returnDate": null})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn quantity_allows_several_open_loans_and_cannot_shrink_below_them() {
    let app = TestApp::new().await;
    let lab = seed_lab(&app, "Q").await;
    let a = create_researcher(&app, &lab, "Alpha").await;
    let b = create_researcher(&app, &lab, "Bravo").await;
    create_equipment(&app, &lab, "EQ-004", 2).await;

    for res_code in [a, b] {
        app.create(
            "/api/v1/assign-researchers",
            json!({"resCode": res_code, "inventoryNum": "EQ-004", "assignDate": "2024-04-01"}),
        )
        .await;
    }

    let (status, body) = app.put("/api/v1/equipment/EQ-004", json!({"quantity": 1})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CAPACITY_EXCEEDED");

    let (_, detail) = app.get("/api/v1/equipment/EQ-004?includeAssociations=true").await;
    assert_eq!(detail["available_units"], 0);
    assert_eq!(detail["researcher_loans"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn equipment_out_of_service_cannot_be_lent() {
    let app = TestApp::new().await;
    let lab = seed_lab(&app, "M").await;
    let res_code = create_researcher(&app, &lab, "Waiting").await;
    app.create(
        "/api/v1/equipment",
        json!({
            "inventoryNum": "EQ-005",
            "equipName": "Centrifuge",
            "status": "maintenance",
            "labCode": lab.lab_code,
        }),
    )
    .await;

    let (status, body) = app
        .post(
            "/api/v1/assign-researchers",
            json!({"resCode": res_code, "inventoryNum": "EQ-005", "assignDate": "2024-05-01"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn return_before_assign_is_rejected() {
    let app = TestApp::new().await;
    let lab = seed_lab(&app, "V").await;
    let res_code = create_researcher(&app, &lab, "Early").await;
    create_equipment(&app, &lab, "EQ-006", 1).await;

    let (status, body) = app
        .post(
            "/api/v1/assign-researchers",
            json!({
                "resCode": res_code,
                "inventoryNum": "EQ-006",
                "assignDate": "2024-06-10",
                "returnDate": "2024-06-01",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "return_date");
}

#[tokio::test]
async fn unknown_person_or_equipment_is_not_found() {
    let app = TestApp::new().await;
    let lab = seed_lab(&app, "N").await;
    let res_code = create_researcher(&app, &lab, "Known").await;
    create_equipment(&app, &lab, "EQ-007", 1).await;

    let (status, _) = app
        .post(
            "/api/v1/assign-researchers",
            json!({"resCode": 9999, "inventoryNum": "EQ-007", "assignDate": "2024-07-01"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .post(
            "/api/v1/assign-researchers",
            json!({"resCode": res_code, "inventoryNum": "EQ-404", "assignDate": "2024-07-01"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Equipment not found: EQ-404");
}

#[tokio::test]
async fn loan_lists_filter_by_lab_and_state() {
    let app = TestApp::new().await;
    let lab_1 = seed_lab(&app, "F1").await;
    let lab_2 = seed_lab(&app, "F2").await;
    let res_code = create_researcher(&app, &lab_1, "Filter").await;
    create_equipment(&app, &lab_1, "EQ-010", 1).await;
    create_equipment(&app, &lab_2, "EQ-020", 1).await;

    app.create(
        "/api/v1/assign-researchers",
        json!({"resCode": res_code, "inventoryNum": "EQ-010", "assignDate": "2024-01-01"}),
    )
    .await;
    app.create(
        "/api/v1/assign-researchers",
        json!({
            "resCode": res_code,
            "inventoryNum": "EQ-020",
            "assignDate": "2024-02-01",
            "returnDate": "2024-02-05",
        }),
    )
    .await;

    let (_, page) = app.get("/api/v1/assign-researchers").await;
    // Most recent loan first
    assert_eq!(page["items"][0]["inventory_num"], "EQ-020");
    assert_eq!(page["totalItems"], 2);

    let (_, page) = app
        .get(&format!("/api/v1/assign-researchers?labCode={}", lab_2.lab_code))
        .await;
    assert_eq!(page["totalItems"], 1);
    assert_eq!(page["items"][0]["inventory_num"], "EQ-020");

    let (_, page) = app.get("/api/v1/assign-researchers?active=true").await;
    assert_eq!(page["totalItems"], 1);
    assert_eq!(page["items"][0]["inventory_num"], "EQ-010");

    let (_, page) = app.get("/api/v1/assign-researchers?search=filter").await;
    assert_eq!(page["totalItems"], 2);
}

#[tokio::test]
async fn delete_by_composite_key() {
    let app = TestApp::new().await;
    let lab = seed_lab(&app, "X").await;
    let student = create_student(&app, &lab, REG_NUM, "Leaver").await;
    create_equipment(&app, &lab, "EQ-030", 1).await;

    app.create(
        "/api/v1/assign-doctoral-students",
        json!({"regNum": student, "inventoryNum": "EQ-030", "assignDate": "2024-03-01"}),
    )
    .await;

    let uri = format!("/api/v1/assign-doctoral-students/{}/EQ-030", student);
    let (status, body) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Doctoral student assignment deleted successfully");

    let (status, _) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_person_removes_their_loans() {
    let app = TestApp::new().await;
    let lab = seed_lab(&app, "Y").await;
    let res_code = create_researcher(&app, &lab, "Gone").await;
    create_equipment(&app, &lab, "EQ-040", 1).await;
    app.create(
        "/api/v1/assign-researchers",
        json!({"resCode": res_code, "inventoryNum": "EQ-040", "assignDate": "2024-03-01"}),
    )
    .await;

    let (status, _) = app.delete(&format!("/api/v1/researchers/{}", res_code)).await;
    assert_eq!(status, StatusCode::OK);

    let (_, page) = app.get("/api/v1/assign-researchers").await;
    assert_eq!(page["totalItems"], 0);
}

#[tokio::test]
async fn supervision_lifecycle() {
    let app = TestApp::new().await;
    let lab = seed_lab(&app, "S").await;
    let supervisor = create_researcher(&app, &lab, "Mentor").await;
    let student = create_student(&app, &lab, REG_NUM, "Mentee").await;

    let body = json!({
        "resCode": supervisor,
        "regNum": student,
        "startDate": "2023-10-01",
        "theme": "Graph neural networks",
    });
    app.create("/api/v1/supervisions", body.clone()).await;

    let (status, _) = app.post("/api/v1/supervisions", body).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/api/v1/supervisions/{}/{}", supervisor, student);
    let (status, _) = app.put(&uri, json!({"endDate": "2023-09-01"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.put(&uri, json!({"endDate": "2024-09-30"})).await;
    assert_eq!(status, StatusCode::OK);

    let (_, detail) = app.get(&format!("{}?includeAssociations=true", uri)).await;
    assert_eq!(detail["status"], "ended");
    assert_eq!(detail["theme"], "Graph neural networks");
    assert_eq!(detail["researcher"]["lastname"], "Mentor");
    assert_eq!(detail["doctoral_student"]["lastname"], "Mentee");

    let (_, page) = app
        .get(&format!("/api/v1/supervisions?labCode={}", lab.lab_code))
        .await;
    assert_eq!(page["totalItems"], 1);

    let (_, researcher) = app
        .get(&format!("/api/v1/researchers/{}?includeAssociations=true", supervisor))
        .await;
    assert_eq!(researcher["supervised_students"][0]["reg_num"], student);
}

#[tokio::test]
async fn registration_numbers_have_twelve_digits() {
    let app = TestApp::new().await;
    let lab = seed_lab(&app, "R").await;

    let (status, body) = app
        .post(
            "/api/v1/doctoral-students",
            json!({
                "regNum": 12345,
                "firstname": "Short",
                "lastname": "Number",
                "gender": "male",
                "email": "short@phd.example.org",
                "specCode": lab.spec_code,
                "teamId": lab.team_id,
                "labCode": lab.lab_code,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "reg_num");
}
