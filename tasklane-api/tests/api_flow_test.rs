/// Integration tests for the Tasklane API
///
/// These tests drive the full router end-to-end:
/// - Registration, login and bearer authentication
/// - Project, task and subtask lifecycle
/// - Parent task completion from subtasks
/// - Status mapping for authorization, validation and conflicts
/// - Rate limiting

mod common;

use axum::http::{header, Method, StatusCode};
use common::{test_config, TestContext, TEST_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();

    let (status, body) = ctx.json(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn test_register_login_and_profile() {
    let ctx = TestContext::new();
    let ada = ctx.register("Ada", "ada@example.com").await;

    let (status, body) = ctx
        .json(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": TEST_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], ada.id.as_str());
    assert!(body["user"].get("password_hash").is_none());

    let token = body["token"].as_str().unwrap().to_string();
    let (status, me) = ctx.json(Method::GET, "/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "ada@example.com");

    let (status, updated) = ctx
        .json(Method::PUT, "/v1/users/me", Some(&token), Some(json!({ "name": "Ada L." })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Ada L.");
    assert_eq!(updated["email"], ada.email.as_str());
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let ctx = TestContext::new();
    ctx.register("Ada", "ada@example.com").await;

    let wrong_password = ctx
        .json(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "not-the-password" })),
        )
        .await;
    let unknown_email = ctx
        .json(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": TEST_PASSWORD })),
        )
        .await;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.1["message"], unknown_email.1["message"]);
}

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let ctx = TestContext::new();

    let (status, body) = ctx.json(Method::GET, "/v1/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx.json(Method::GET, "/v1/projects", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_single_subtask_completion_flow() {
    let ctx = TestContext::new();
    ctx.register("A", "a@example.com").await;

    let (status, login) = ctx
        .json(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": "a@example.com", "password": TEST_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["token"].as_str().unwrap().to_string();

    let (status, project) = ctx
        .json(Method::POST, "/v1/projects", Some(&token), Some(json!({ "name": "P1" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = project["id"].as_i64().unwrap();

    let (status, task) = ctx
        .json(
            Method::POST,
            &format!("/v1/projects/{}/tasks", project_id),
            Some(&token),
            Some(json!({ "title": "T1", "status": "todo" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["completed"], false);
    let task_id = task["id"].as_i64().unwrap();

    let (status, created) = ctx
        .json(
            Method::POST,
            &format!("/v1/tasks/{}/subtasks", task_id),
            Some(&token),
            Some(json!({ "title": "S1", "status": "todo" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let subtask_id = created["subtask"]["id"].as_i64().unwrap();

    let (status, toggled) = ctx
        .json(
            Method::PATCH,
            &format!("/v1/tasks/{}/subtasks/{}/complete", task_id, subtask_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["subtask"]["completed"], true);
    assert_eq!(toggled["parent"]["outcome"], "completed");
    assert_eq!(toggled["parent"]["task"]["id"], task_id);
    assert_eq!(toggled["parent"]["task"]["status"], "completed");
    assert_eq!(toggled["parent"]["task"]["completed"], true);

    let (status, task) = ctx
        .json(Method::GET, &format!("/v1/tasks/{}", task_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["status"], "completed");
    assert_eq!(task["completed"], true);
}

#[tokio::test]
async fn test_completing_last_subtask_completes_task() {
    let ctx = TestContext::new();
    let ada = ctx.register("Ada", "ada@example.com").await;
    let project_id = ctx.create_project(&ada, "P1").await;
    let task_id = ctx.create_task(&ada, project_id, "T1").await;

    let (status, created) = ctx
        .json(
            Method::POST,
            &format!("/v1/tasks/{}/subtasks", task_id),
            Some(&ada.token),
            Some(json!({ "title": "S1", "assigned_to": ada.id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["subtask"]["status"], "todo");
    assert_eq!(created["subtask"]["completed"], false);
    assert_eq!(created["parent"]["outcome"], "pending");
    let subtask_id = created["subtask"]["id"].as_i64().unwrap();

    let (status, toggled) = ctx
        .json(
            Method::PATCH,
            &format!("/v1/tasks/{}/subtasks/{}/complete", task_id, subtask_id),
            Some(&ada.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["subtask"]["status"], "completed");
    assert_eq!(toggled["parent"]["outcome"], "completed");
    assert_eq!(toggled["parent"]["task"]["completed"], true);

    let (status, task) = ctx
        .json(Method::GET, &format!("/v1/tasks/{}", task_id), Some(&ada.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["status"], "completed");
    assert_eq!(task["completed"], true);

    // Reopening the subtask leaves the task completed
    let (_, reopened) = ctx
        .json(
            Method::PATCH,
            &format!("/v1/tasks/{}/subtasks/{}/complete", task_id, subtask_id),
            Some(&ada.token),
            None,
        )
        .await;
    assert_eq!(reopened["subtask"]["status"], "in_progress");

    let (_, task) = ctx
        .json(Method::GET, &format!("/v1/tasks/{}", task_id), Some(&ada.token), None)
        .await;
    assert_eq!(task["status"], "completed");

    let (_, assigned) = ctx.json(Method::GET, "/v1/subtasks", Some(&ada.token), None).await;
    assert_eq!(assigned.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_task_toggle_and_filters() {
    let ctx = TestContext::new();
    let ada = ctx.register("Ada", "ada@example.com").await;
    let project_id = ctx.create_project(&ada, "P1").await;
    let first = ctx.create_task(&ada, project_id, "First").await;
    ctx.create_task(&ada, project_id, "Second").await;

    let (status, toggled) = ctx
        .json(Method::PATCH, &format!("/v1/tasks/{}/complete", first), Some(&ada.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["completed"], true);

    let (_, completed) = ctx
        .json(
            Method::GET,
            &format!("/v1/projects/{}/tasks?status=completed", project_id),
            Some(&ada.token),
            None,
        )
        .await;
    let completed = completed.as_array().unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["id"], first);

    let (status, _) = ctx
        .json(
            Method::GET,
            &format!("/v1/projects/{}/tasks?status=finished", project_id),
            Some(&ada.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, reopened) = ctx
        .json(Method::PATCH, &format!("/v1/tasks/{}/complete", first), Some(&ada.token), None)
        .await;
    assert_eq!(reopened["status"], "todo");
}

#[tokio::test]
async fn test_stranger_is_forbidden_and_missing_is_not_found() {
    let ctx = TestContext::new();
    let ada = ctx.register("Ada", "ada@example.com").await;
    let eve = ctx.register("Eve", "eve@example.com").await;
    let project_id = ctx.create_project(&ada, "P1").await;
    let task_id = ctx.create_task(&ada, project_id, "T1").await;

    let (status, body) = ctx
        .json(Method::GET, &format!("/v1/projects/{}", project_id), Some(&eve.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = ctx
        .json(Method::GET, &format!("/v1/tasks/{}", task_id), Some(&eve.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.json(Method::GET, "/v1/projects/9999", Some(&eve.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.json(Method::GET, "/v1/tasks/9999", Some(&ada.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, projects) = ctx.json(Method::GET, "/v1/projects", Some(&eve.token), None).await;
    assert!(projects.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_subtask_under_wrong_task_is_not_found() {
    let ctx = TestContext::new();
    let ada = ctx.register("Ada", "ada@example.com").await;
    let project_id = ctx.create_project(&ada, "P1").await;
    let first = ctx.create_task(&ada, project_id, "First").await;
    let second = ctx.create_task(&ada, project_id, "Second").await;

    let (_, created) = ctx
        .json(
            Method::POST,
            &format!("/v1/tasks/{}/subtasks", first),
            Some(&ada.token),
            Some(json!({ "title": "Child" })),
        )
        .await;
    let subtask_id = created["subtask"]["id"].as_i64().unwrap();

    let (status, _) = ctx
        .json(
            Method::GET,
            &format!("/v1/tasks/{}/subtasks/{}", second, subtask_id),
            Some(&ada.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .json(
            Method::DELETE,
            &format!("/v1/tasks/{}/subtasks/{}", second, subtask_id),
            Some(&ada.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_members_share_project_but_not_ownership() {
    let ctx = TestContext::new();
    let ada = ctx.register("Ada", "ada@example.com").await;
    let bob = ctx.register("Bob", "bob@example.com").await;
    let project_id = ctx.create_project(&ada, "P1").await;
    let members_uri = format!("/v1/projects/{}/members", project_id);

    let (status, _) = ctx
        .json(Method::POST, &members_uri, Some(&bob.token), Some(json!({ "user_id": bob.id })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .json(Method::POST, &members_uri, Some(&ada.token), Some(json!({ "user_id": bob.id })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "user added to project");

    let (status, _) = ctx
        .json(Method::POST, &members_uri, Some(&ada.token), Some(json!({ "user_id": bob.id })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, members) = ctx.json(Method::GET, &members_uri, Some(&bob.token), None).await;
    assert_eq!(members.as_array().unwrap().len(), 1);

    // Members create and read, owners update and delete
    let task_id = ctx.create_task(&bob, project_id, "Bob's task").await;

    let (status, _) = ctx
        .json(
            Method::PUT,
            &format!("/v1/tasks/{}", task_id),
            Some(&bob.token),
            Some(json!({ "title": "Renamed" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .json(Method::DELETE, &format!("/v1/projects/{}", project_id), Some(&bob.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .json(Method::DELETE, &format!("/v1/projects/{}", project_id), Some(&ada.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Project deleted successfully");

    let (status, _) = ctx
        .json(Method::GET, &format!("/v1/tasks/{}", task_id), Some(&ada.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let ctx = TestContext::new();
    ctx.register("Ada", "ada@example.com").await;

    let (status, body) = ctx
        .json(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({ "name": "Imposter", "email": "ADA@example.com", "password": TEST_PASSWORD })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_validation_failures_are_bad_requests() {
    let ctx = TestContext::new();
    let ada = ctx.register("Ada", "ada@example.com").await;
    let project_id = ctx.create_project(&ada, "P1").await;

    let (status, body) = ctx
        .json(
            Method::POST,
            &format!("/v1/projects/{}/tasks", project_id),
            Some(&ada.token),
            Some(json!({ "title": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = ctx
        .json(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({ "name": "Bob", "email": "not-an-email", "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = ctx
        .json(Method::GET, "/v1/projects/not-a-number", Some(&ada.token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blank_names_are_rejected() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .json(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({ "name": "   ", "email": "blank@example.com", "password": TEST_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let ada = ctx.register("Ada", "ada@example.com").await;
    let (status, _) = ctx
        .json(Method::PUT, "/v1/users/me", Some(&ada.token), Some(json!({ "name": "  " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, me) = ctx.json(Method::GET, "/v1/users/me", Some(&ada.token), None).await;
    assert_eq!(me["name"], "Ada");
}

#[tokio::test]
async fn test_auth_rate_limit() {
    let mut config = test_config();
    config.rate_limit.auth.max_requests = 3;
    let ctx = TestContext::with_config(config);

    let login = json!({ "email": "ada@example.com", "password": TEST_PASSWORD });
    for _ in 0..3 {
        let response = ctx
            .request(Method::POST, "/v1/auth/login", None, Some(login.clone()))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("x-ratelimit-remaining"));
    }

    let response = ctx
        .request(Method::POST, "/v1/auth/login", None, Some(login))
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    let body = common::read_json(response).await;
    assert_eq!(body["error"], "rate_limit_exceeded");
}
