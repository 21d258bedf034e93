/// Integration tests for task endpoints
///
/// - End-to-end register → login → create → delete flow
/// - Ownership scoping (another user's task is a 404)
/// - Filtering, search and pagination
/// - Partial updates and soft delete

mod common;

use axum::http::{Method, StatusCode};
use common::{error_fields, error_messages, test_config, TestContext};
use serde_json::json;

#[tokio::test]
async fn test_end_to_end_flow() {
    let ctx = TestContext::new();

    let register = ctx
        .post(
            "/api/auth/register",
            None,
            json!({ "name": "A", "email": "a@x.com", "password": "secret1" }),
        )
        .await;
    assert_eq!(register.status, StatusCode::CREATED);

    let login = ctx
        .post("/api/auth/login", None, json!({ "email": "a@x.com", "password": "secret1" }))
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let token = login.body["data"]["token"].as_str().unwrap().to_string();

    let created = ctx.post("/api/tasks", Some(&token), json!({ "title": "t1" })).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["message"], "Task created successfully");
    assert_eq!(created.body["data"]["status"], "pending");
    assert_eq!(created.body["data"]["is_deleted"], false);
    assert_eq!(created.body["data"]["user_id"], register.body["data"]["user"]["id"]);

    let id = created.body["data"]["id"].as_str().unwrap();

    let fetched = ctx.get(&format!("/api/tasks/{}", id), &token).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["data"]["title"], "t1");

    let deleted = ctx.delete(&format!("/api/tasks/{}", id), &token).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Task deleted successfully");

    let gone = ctx.get(&format!("/api/tasks/{}", id), &token).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.body["message"], "Not found Task or you do not have permission");
}

#[tokio::test]
async fn test_tasks_require_authentication() {
    let ctx = TestContext::new();

    let list = ctx.send(Method::GET, "/api/tasks", None, None).await;
    assert_eq!(list.status, StatusCode::UNAUTHORIZED);

    let create = ctx.post("/api/tasks", None, json!({ "title": "t1" })).await;
    assert_eq!(create.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_other_users_task_is_not_found() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register_user("Owner").await;
    let (_, intruder) = ctx.register_user("Intruder").await;
    let id = ctx.create_task(&owner, json!({ "title": "private" })).await;
    let uri = format!("/api/tasks/{}", id);

    let get = ctx.get(&uri, &intruder).await;
    assert_eq!(get.status, StatusCode::NOT_FOUND);

    let update = ctx.put(&uri, &intruder, json!({ "title": "mine now" })).await;
    assert_eq!(update.status, StatusCode::NOT_FOUND);
    assert_eq!(
        update.body["message"],
        "Task not found or you do not have permission to update it"
    );

    let delete = ctx.delete(&uri, &intruder).await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);
    assert_eq!(
        delete.body["message"],
        "Task not found or you do not have permission to delete it"
    );

    let list = ctx.get("/api/tasks", &intruder).await;
    assert_eq!(list.body["pagination"]["total"], 0);

    // untouched for the owner
    let owner_view = ctx.get(&uri, &owner).await;
    assert_eq!(owner_view.status, StatusCode::OK);
    assert_eq!(owner_view.body["data"]["title"], "private");
}

#[tokio::test]
async fn test_malformed_task_id_is_not_found() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register_user("Ada").await;

    let response = ctx.get("/api/tasks/12345", &token).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "Not found Task or you do not have permission");
}

#[tokio::test]
async fn test_pagination() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register_user("Ada").await;

    for i in 0..25 {
        ctx.create_task(&token, json!({ "title": format!("task {}", i) })).await;
    }

    let first = ctx.get("/api/tasks?limit=10&offset=0", &token).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["data"].as_array().unwrap().len(), 10);
    assert_eq!(first.body["count"], 10);
    assert_eq!(
        first.body["pagination"],
        json!({ "total": 25, "limit": 10, "offset": 0, "pages": 3 })
    );
    // newest first
    assert_eq!(first.body["data"][0]["title"], "task 24");

    let last = ctx.get("/api/tasks?limit=10&offset=20", &token).await;
    assert_eq!(last.body["data"].as_array().unwrap().len(), 5);
    assert_eq!(last.body["data"][4]["title"], "task 0");

    let defaults = ctx.get("/api/tasks?limit=abc&offset=xyz", &token).await;
    assert_eq!(defaults.status, StatusCode::OK);
    assert_eq!(defaults.body["pagination"]["limit"], 10);
    assert_eq!(defaults.body["pagination"]["offset"], 0);
}

#[tokio::test]
async fn test_page_limit_cap() {
    let ctx = TestContext::with_config(test_config(&[("TASKS_MAX_PAGE_LIMIT", "5")]));
    let (_, token) = ctx.register_user("Ada").await;

    for i in 0..7 {
        ctx.create_task(&token, json!({ "title": format!("task {}", i) })).await;
    }

    let response = ctx.get("/api/tasks?limit=1000", &token).await;
    assert_eq!(response.body["data"].as_array().unwrap().len(), 5);
    assert_eq!(response.body["pagination"]["limit"], 5);
    assert_eq!(response.body["pagination"]["pages"], 2);
}

#[tokio::test]
async fn test_unbounded_limit() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register_user("Ada").await;
    ctx.create_task(&token, json!({ "title": "t1" })).await;
    ctx.create_task(&token, json!({ "title": "t2" })).await;

    let response = ctx
        .get(&format!("/api/tasks?limit={}", i64::MAX), &token)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 2);
    assert_eq!(response.body["pagination"]["limit"], i64::MAX);
    assert_eq!(response.body["pagination"]["pages"], 1);
}

#[tokio::test]
async fn test_status_filter_and_search() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register_user("Ada").await;

    ctx.create_task(&token, json!({ "title": "Buy MILK" })).await;
    ctx.create_task(&token, json!({ "title": "Buy eggs", "status": "completed" })).await;
    ctx.create_task(&token, json!({ "title": "100% done", "status": "in_progress" })).await;

    let completed = ctx.get("/api/tasks?status=completed", &token).await;
    assert_eq!(completed.body["pagination"]["total"], 1);
    assert_eq!(completed.body["data"][0]["title"], "Buy eggs");

    let milk = ctx.get("/api/tasks?search=milk", &token).await;
    assert_eq!(milk.body["pagination"]["total"], 1);
    assert_eq!(milk.body["data"][0]["title"], "Buy MILK");

    let both = ctx.get("/api/tasks?search=buy&status=pending", &token).await;
    assert_eq!(both.body["pagination"]["total"], 1);

    let literal = ctx.get("/api/tasks?search=100%25", &token).await;
    assert_eq!(literal.body["pagination"]["total"], 1);

    let unknown = ctx.get("/api/tasks?status=archived", &token).await;
    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(unknown.body["pagination"]["total"], 0);

    let empty = ctx.get("/api/tasks?status=&search=", &token).await;
    assert_eq!(empty.body["pagination"]["total"], 3);
}

#[tokio::test]
async fn test_create_validation() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register_user("Ada").await;

    let empty_title = ctx.post("/api/tasks", Some(&token), json!({ "title": "" })).await;
    assert_eq!(empty_title.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&empty_title.body), vec!["title"]);

    let archived = ctx
        .post("/api/tasks", Some(&token), json!({ "title": "t1", "status": "archived" }))
        .await;
    assert_eq!(archived.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&archived.body), vec!["status"]);
    assert_eq!(
        error_messages(&archived.body),
        vec!["Status must be one of: pending, in_progress, completed"]
    );

    let bad_date = ctx
        .post("/api/tasks", Some(&token), json!({ "title": "t1", "due_date": "next week" }))
        .await;
    assert_eq!(error_messages(&bad_date.body), vec!["Due date must be a valid ISO date"]);

    let long = ctx
        .post(
            "/api/tasks",
            Some(&token),
            json!({ "title": "x".repeat(256), "description": "d".repeat(5001) }),
        )
        .await;
    assert_eq!(error_fields(&long.body), vec!["description", "title"]);

    let list = ctx.get("/api/tasks", &token).await;
    assert_eq!(list.body["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_create_with_all_fields() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register_user("Ada").await;

    let response = ctx
        .post(
            "/api/tasks",
            Some(&token),
            json!({
                "title": "Report",
                "description": "Quarterly numbers",
                "status": "in_progress",
                "due_date": "2030-03-31"
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let task = &response.body["data"];
    assert_eq!(task["description"], "Quarterly numbers");
    assert_eq!(task["status"], "in_progress");
    assert_eq!(task["due_date"], "2030-03-31");
}

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register_user("Ada").await;
    let id = ctx
        .create_task(
            &token,
            json!({ "title": "Report", "description": "Numbers", "due_date": "2030-03-31" }),
        )
        .await;
    let uri = format!("/api/tasks/{}", id);

    let response = ctx.put(&uri, &token, json!({ "status": "completed" })).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Task updated successfully");
    let task = &response.body["data"];
    assert_eq!(task["status"], "completed");
    assert_eq!(task["title"], "Report");
    assert_eq!(task["description"], "Numbers");
    assert_eq!(task["due_date"], "2030-03-31");
}

#[tokio::test]
async fn test_update_null_clears_optional_fields() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register_user("Ada").await;
    let id = ctx
        .create_task(
            &token,
            json!({ "title": "Report", "description": "Numbers", "due_date": "2030-03-31" }),
        )
        .await;
    let uri = format!("/api/tasks/{}", id);

    let response = ctx
        .put(&uri, &token, json!({ "description": null, "due_date": null }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["data"]["description"].is_null());
    assert!(response.body["data"]["due_date"].is_null());
    assert_eq!(response.body["data"]["title"], "Report");
}

#[tokio::test]
async fn test_update_validation() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register_user("Ada").await;
    let id = ctx.create_task(&token, json!({ "title": "t1" })).await;
    let uri = format!("/api/tasks/{}", id);

    let empty = ctx.put(&uri, &token, json!({})).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_messages(&empty.body),
        vec!["At least one field must be provided for update"]
    );

    let blank_title = ctx.put(&uri, &token, json!({ "title": "" })).await;
    assert_eq!(error_messages(&blank_title.body), vec!["Title cannot be empty"]);

    let bad_status = ctx.put(&uri, &token, json!({ "status": "archived" })).await;
    assert_eq!(error_fields(&bad_status.body), vec!["status"]);

    let null_title = ctx.put(&uri, &token, json!({ "title": null })).await;
    assert_eq!(null_title.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&null_title.body), vec!["title"]);
    assert_eq!(error_messages(&null_title.body), vec!["Title cannot be empty"]);

    let null_status = ctx.put(&uri, &token, json!({ "status": null })).await;
    assert_eq!(error_fields(&null_status.body), vec!["status"]);

    let task = ctx.get(&uri, &token).await;
    assert_eq!(task.body["data"]["title"], "t1");
    assert_eq!(task.body["data"]["status"], "pending");
}

#[tokio::test]
async fn test_soft_delete_boundary() {
    let ctx = TestContext::new();
    let (_, token) = ctx.register_user("Ada").await;
    let keep = ctx.create_task(&token, json!({ "title": "keep" })).await;
    let drop = ctx.create_task(&token, json!({ "title": "drop" })).await;
    let uri = format!("/api/tasks/{}", drop);

    let first = ctx.delete(&uri, &token).await;
    assert_eq!(first.status, StatusCode::OK);

    let second = ctx.delete(&uri, &token).await;
    assert_eq!(second.status, StatusCode::NOT_FOUND);

    let update = ctx.put(&uri, &token, json!({ "title": "revived" })).await;
    assert_eq!(update.status, StatusCode::NOT_FOUND);

    let list = ctx.get("/api/tasks", &token).await;
    assert_eq!(list.body["pagination"]["total"], 1);
    assert_eq!(list.body["data"][0]["id"], keep.as_str());
}
