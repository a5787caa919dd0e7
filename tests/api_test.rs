mod common;

use axum::http::{Method, StatusCode, header};
use serde_json::{Value, json};

use common::{app, days_from_today, memory_store, send};

async fn create(app: &axum::Router, body: Value) -> i64 {
    let res = send(app, Method::POST, "/api/tasks/task", Some(body)).await;
    assert_eq!(res.status, StatusCode::OK);
    res.body["success"]
        .as_str()
        .and_then(|id| id.parse().ok())
        .expect("success carries the task id")
}

#[tokio::test]
async fn create_then_read_back_by_id() {
    let app = app(memory_store());
    let id = create(&app, json!({"task_name": "A", "description": "B", "priority": 1})).await;

    let res = send(&app, Method::GET, &format!("/api/tasks/{id}"), None).await;
    assert_eq!(res.status, StatusCode::OK);

    let tasks = res.body.as_array().expect("array body");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["task_id"], json!(id));
    assert_eq!(tasks[0]["task_name"], json!("A"));
    assert_eq!(tasks[0]["properties"]["last-modified"], json!(""));
    assert!(tasks[0]["_id"].is_string());
}

#[tokio::test]
async fn create_without_required_fields_fails() {
    let app = app(memory_store());
    let res = send(&app, Method::POST, "/api/tasks/task", Some(json!({"task_name": "A"}))).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, json!({"Result": "fail"}));
}

#[tokio::test]
async fn task_ids_are_sequential() {
    let app = app(memory_store());
    let first = create(&app, json!({"task_name": "a", "description": "", "priority": 1})).await;
    let second = create(&app, json!({"task_name": "b", "description": "", "priority": 2})).await;
    assert_eq!((first, second), (1, 2));
}

#[tokio::test]
async fn unknown_query_key_is_rejected() {
    let app = app(memory_store());
    create(&app, json!({"task_name": "a", "description": "", "priority": 1})).await;

    let res = send(&app, Method::GET, "/api/tasks?sort=priority&order=asc&bogus=1", None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, json!({"Result": "fail"}));
}

#[tokio::test]
async fn non_numeric_task_segment_is_rejected() {
    let app = app(memory_store());
    let res = send(&app, Method::GET, "/api/tasks/abc", None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn collection_marker_lists_everything() {
    let app = app(memory_store());
    for n in 0..3 {
        create(&app, json!({"task_name": format!("t{n}"), "description": "", "priority": n})).await;
    }

    for uri in ["/api/tasks", "/api/tasks/tasks"] {
        let res = send(&app, Method::GET, uri, None).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body.as_array().map(Vec::len), Some(3), "{uri}");
    }
}

#[tokio::test]
async fn pagination_follows_sort_order() {
    let app = app(memory_store());
    for priority in [7, 2, 9, 4, 1, 10, 3, 8, 5, 6] {
        create(&app, json!({"task_name": format!("p{priority}"), "description": "", "priority": priority})).await;
    }

    let res = send(&app, Method::GET, "/api/tasks?sort=priority&order=asc&limit=3&offset=5", None).await;
    assert_eq!(res.status, StatusCode::OK);

    let priorities: Vec<i64> = res
        .body
        .as_array()
        .expect("array body")
        .iter()
        .filter_map(|t| t["priority"].as_i64())
        .collect();
    assert_eq!(priorities, vec![6, 7, 8]);
}

#[tokio::test]
async fn sort_without_order_keeps_insertion_order() {
    let app = app(memory_store());
    for priority in [3, 1, 2] {
        create(&app, json!({"task_name": "t", "description": "", "priority": priority})).await;
    }

    let res = send(&app, Method::GET, "/api/tasks?sort=priority", None).await;
    let priorities: Vec<i64> = res
        .body
        .as_array()
        .expect("array body")
        .iter()
        .filter_map(|t| t["priority"].as_i64())
        .collect();
    assert_eq!(priorities, vec![3, 1, 2]);
}

#[tokio::test]
async fn projection_hides_identity_unless_listed() {
    let app = app(memory_store());
    create(&app, json!({"task_name": "a", "description": "d", "priority": 5})).await;

    let res = send(&app, Method::GET, "/api/tasks?fields=priority", None).await;
    assert_eq!(res.body, json!([{"priority": 5}]));

    let res = send(&app, Method::GET, "/api/tasks?fields=priority,_id", None).await;
    let task = &res.body[0];
    assert!(task["_id"].is_string());
    assert_eq!(task.as_object().map(|o| o.len()), Some(2));
}

#[tokio::test]
async fn status_filter_classifies_due_dates() {
    let app = app(memory_store());
    let yesterday = days_from_today(-1);
    let later = days_from_today(2);
    create(&app, json!({"task_name": "old", "description": "", "priority": 1, "due_date": yesterday})).await;
    create(&app, json!({"task_name": "soon", "description": "", "priority": 2, "due_date": later})).await;
    create(&app, json!({"task_name": "whenever", "description": "", "priority": 3, "due_date": ""})).await;

    let names = |body: &Value| -> Vec<String> {
        body.as_array()
            .expect("array body")
            .iter()
            .filter_map(|t| t["task_name"].as_str().map(str::to_string))
            .collect()
    };

    let valid = send(&app, Method::GET, "/api/tasks?status=valid", None).await;
    assert_eq!(names(&valid.body), vec!["soon", "whenever"]);

    let expired = send(&app, Method::GET, "/api/tasks?status=expired", None).await;
    assert_eq!(names(&expired.body), vec!["old"]);

    let all = send(&app, Method::GET, "/api/tasks", None).await;
    assert_eq!(names(&all.body).len(), 3);
}

#[tokio::test]
async fn status_filter_with_projection_does_not_leak_due_date() {
    let app = app(memory_store());
    create(&app, json!({"task_name": "old", "description": "", "priority": 1, "due_date": days_from_today(-3)})).await;
    create(&app, json!({"task_name": "new", "description": "", "priority": 2, "due_date": days_from_today(3)})).await;

    let res = send(&app, Method::GET, "/api/tasks?fields=task_name&status=expired", None).await;
    assert_eq!(res.body, json!([{"task_name": "old"}]));
}

#[tokio::test]
async fn patch_updates_allowed_fields_and_sets_last_modified() {
    let app = app(memory_store());
    let id = create(&app, json!({"task_name": "a", "description": "", "priority": 1})).await;

    let res = send(
        &app,
        Method::PATCH,
        &format!("/api/tasks/{id}"),
        Some(json!({"priority": 4, "due_date": "2030-01-01", "task_name": "ignored"})),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({"updates": 2}));

    let stamp = res
        .headers
        .get(header::LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .expect("Last-Modified header")
        .to_string();

    let read = send(&app, Method::GET, &format!("/api/tasks/{id}"), None).await;
    let task = &read.body[0];
    assert_eq!(task["priority"], json!(4));
    assert_eq!(task["due_date"], json!("2030-01-01"));
    assert_eq!(task["task_name"], json!("a"));
    assert_eq!(task["properties"]["last-modified"], json!(stamp));
}

#[tokio::test]
async fn patch_rejections() {
    let app = app(memory_store());
    let id = create(&app, json!({"task_name": "a", "description": "", "priority": 1})).await;

    let no_fields = send(&app, Method::PATCH, &format!("/api/tasks/{id}"), Some(json!({"task_name": "x"}))).await;
    assert_eq!(no_fields.status, StatusCode::BAD_REQUEST);

    let bad_id = send(&app, Method::PATCH, "/api/tasks/zero", Some(json!({"priority": 2}))).await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);

    let negative = send(&app, Method::PATCH, "/api/tasks/-4", Some(json!({"priority": 2}))).await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);
    assert!(negative.headers.get(header::LAST_MODIFIED).is_none());
}

#[tokio::test]
async fn patch_of_missing_task_reports_zero_updates() {
    let app = app(memory_store());
    let res = send(&app, Method::PATCH, "/api/tasks/42", Some(json!({"priority": 2}))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({"updates": 0}));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let app = app(memory_store());
    let id = create(&app, json!({"task_name": "a", "description": "", "priority": 1})).await;

    let first = send(&app, Method::DELETE, &format!("/api/tasks/{id}"), None).await;
    assert_eq!(first.body, json!({"deleted": 1}));

    for _ in 0..2 {
        let again = send(&app, Method::DELETE, &format!("/api/tasks/{id}"), None).await;
        assert_eq!(again.status, StatusCode::OK);
        assert_eq!(again.body, json!({"deleted": 0}));
    }

    let junk = send(&app, Method::DELETE, "/api/tasks/not-a-number", None).await;
    assert_eq!(junk.body, json!({"deleted": 0}));
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let app = app(memory_store());
    assert_eq!(send(&app, Method::GET, "/api/todos", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(send(&app, Method::POST, "/api/tasks/7", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(send(&app, Method::PUT, "/api/tasks", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn every_response_has_an_etag() {
    let app = app(memory_store());
    for (method, uri) in [(Method::GET, "/api/tasks"), (Method::GET, "/api/tasks?bogus=1"), (Method::GET, "/nope")] {
        let res = send(&app, method, uri, None).await;
        let etag = res.headers.get(header::ETAG).and_then(|v| v.to_str().ok());
        assert!(etag.is_some_and(|v| v.len() == "2024-01-01 00:00:00".len()), "{uri}");
    }
}

#[tokio::test]
async fn non_string_due_date_fails_status_reads_with_server_error() {
    let app = app(memory_store());
    create(&app, json!({"task_name": "a", "description": "", "priority": 1, "due_date": 5})).await;

    let unfiltered = send(&app, Method::GET, "/api/tasks", None).await;
    assert_eq!(unfiltered.status, StatusCode::OK);

    let filtered = send(&app, Method::GET, "/api/tasks?status=valid", None).await;
    assert_eq!(filtered.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(filtered.body, json!({"Result": "fail"}));
}

#[tokio::test]
async fn patched_non_string_due_date_fails_later_status_reads() {
    let app = app(memory_store());
    let id = create(&app, json!({"task_name": "a", "description": "", "priority": 1})).await;

    let patched = send(&app, Method::PATCH, &format!("/api/tasks/{id}"), Some(json!({"due_date": 5}))).await;
    assert_eq!(patched.status, StatusCode::OK);

    let expired = send(&app, Method::GET, "/api/tasks?status=expired", None).await;
    assert_eq!(expired.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn oversized_offset_is_rejected() {
    let app = app(memory_store());
    create(&app, json!({"task_name": "a", "description": "", "priority": 1})).await;

    let res = send(&app, Method::GET, "/api/tasks?offset=18446744073709551615", None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}
