//! Client against a live server on a loopback port

use labdesk_api::{create_router, AppState};
use labdesk_client::{ApiClient, ClientError, Flash, FlashKind, ListLoader, ResourceList};
use labdesk_common::{config::AppConfig, db::DbPool, DetailOptions, ListQuery, SortOrder};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
struct Faculty {
    faculty_id: i32,
    faculty_name: String,
}

async fn serve() -> ApiClient {
    let mut config = AppConfig::in_memory();
    config.rate_limit.enabled = false;
    let db = DbPool::new(&config.database).await.expect("database");
    let router = create_router(AppState::new(config, db));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server");
    });

    ApiClient::new(&format!("http://{}", addr)).expect("client")
}

#[tokio::test]
async fn crud_round_trip() {
    let client = serve().await;

    let created = client
        .create::<_, Faculty>("faculties", &json!({"facultyName": "Faculty of Science"}))
        .await
        .expect("create");
    assert_eq!(created.message, "Faculty created successfully");
    let faculty = created.data.expect("row");

    let key = faculty.faculty_id.to_string();
    let fetched: Faculty = client
        .get("faculties", &[&key], DetailOptions::default())
        .await
        .expect("get");
    assert_eq!(fetched.faculty_name, "Faculty of Science");

    client
        .update::<_, Faculty>("faculties", &[&key], &json!({"facultyName": "Faculty of Sciences"}))
        .await
        .expect("update");

    let deleted = client.delete("faculties", &[&key]).await.expect("delete");
    assert_eq!(deleted.message, "Faculty deleted successfully");

    let err = client
        .get::<Value>("faculties", &[&key], DetailOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), format!("Faculty not found: {}", key));
}

#[tokio::test]
async fn pages_sorting_and_server_errors() {
    let client = serve().await;
    for name in ["Medicine", "Law", "Arts"] {
        client
            .create::<_, Value>("faculties", &json!({"facultyName": name}))
            .await
            .expect("create");
    }

    let query = ListQuery::page(1, 2).sorted("faculty_name", SortOrder::Asc);
    let page = client
        .fetch_page::<Faculty>("faculties", &query, &[])
        .await
        .expect("page");
    assert_eq!(page.total_items, 3);
    assert_eq!(page.total_pages, 2);
    let names: Vec<_> = page.items.iter().map(|f| f.faculty_name.as_str()).collect();
    assert_eq!(names, vec!["Arts", "Law"]);

    let all: Vec<Faculty> = client.all("faculties", &[]).await.expect("all");
    assert_eq!(all.len(), 3);

    let err = client
        .create::<_, Value>("faculties", &json!({"facultyName": "Law"}))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let flash = Flash::new();
    let _ = flash.record(
        client
            .create::<_, Value>("faculties", &json!({"facultyName": ""}))
            .await,
    );
    assert_eq!(flash.take().map(|m| m.kind), Some(FlashKind::Error));

    let err = client
        .fetch_page::<Faculty>("faculties", &ListQuery::page(0, 10), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Api { .. }));
}

#[tokio::test]
async fn locale_selects_the_message_language() {
    let client = serve().await.with_locale("fr");
    let created = client
        .create::<_, Value>("domains", &json!({"domainName": "Optique"}))
        .await
        .expect("create");
    assert_eq!(created.message, "Domain créé avec succès");
}

#[tokio::test]
async fn loader_shows_the_latest_search() {
    let client = serve().await;
    for name in ["Physics", "Chemistry", "Biology"] {
        client
            .create::<_, Value>("faculties", &json!({"facultyName": name}))
            .await
            .expect("create");
    }

    let loader = ListLoader::new(ResourceList::<Faculty>::new(client, "faculties"))
        .with_debounce(Duration::from_millis(20));
    loader.set_search("chem");
    loader.set_search("phys");
    loader.settle().await;

    let page = loader.page().expect("page");
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].faculty_name, "Physics");
    assert_eq!(loader.last_error(), None);
}
