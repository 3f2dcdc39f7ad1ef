//! Integration tests driving the full router against an in-memory database.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use quizarr::config::Config;
use quizarr::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;

const ACTIVE_START: &str = "2020-01-01 09:00:00";
const ACTIVE_DEADLINE: &str = "2099-12-31 18:00:00";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A single pooled connection so the in-memory database is shared.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;

    let state = AppState::new(config)
        .await
        .expect("Failed to create app state");
    quizarr::api::router(state)
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed_request(method: &str, uri: &str, token: &str, body: Option<&Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"));

    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register_and_login(app: &Router, username: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/register",
            &json!({"username": username, "password": "secret-pass"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/login",
            &json!({"username": username, "password": "secret-pass"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    body["data"]["access_token"].as_str().unwrap().to_string()
}

fn project_payload(issue_num: i32, start: &str, deadline: &str) -> Value {
    json!({
        "name": format!("Knowledge campaign no. {issue_num}"),
        "issue_num": issue_num,
        "start_time": start,
        "deadline": deadline,
        "questions": [
            {
                "kind": 0,
                "text": "In which year was the organization founded?",
                "option_a": "1920",
                "option_b": "1921",
                "option_c": "1922",
                "option_d": "1923",
                "answer": "B"
            },
            {
                "kind": 1,
                "text": "Which of the following are founding principles?",
                "option_a": "First",
                "option_b": "Second",
                "option_c": "Third",
                "option_d": "Fourth",
                "answer": "ABD"
            }
        ]
    })
}

async fn create_project(app: &Router, token: &str, issue_num: i32, start: &str, deadline: &str) -> String {
    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/api/admin/project",
            token,
            Some(&project_payload(issue_num, start, deadline)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    body["data"]["project_uuid"].as_str().unwrap().to_string()
}

async fn create_member(app: &Router, student_id: &str, name: &str, org_unit: &str) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/user",
            &json!({"student_id": student_id, "name": name, "org_unit": org_unit}),
        ))
        .await
        .unwrap();
    assert!(response.status().is_success());
}

async fn submit(app: &Router, student_id: &str, project_uuid: &str, correct: i32, seconds: f64) -> axum::response::Response {
    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/user/project",
            &json!({
                "student_id": student_id,
                "project_uuid": project_uuid,
                "correct_num": correct,
                "time_used_seconds": seconds,
                "answers": [
                    {"question_id": 1, "answer": "B"},
                    {"question_id": 2, "answer": "ABD"}
                ]
            }),
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_register_login_and_auth_gate() {
    let app = spawn_app().await;

    let token = register_and_login(&app, "chair").await;

    // Duplicate username is a conflict.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/register",
            &json!({"username": "chair", "password": "other"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["status"], "failure");
    assert_eq!(body["code"], 400);

    // Wrong password is rejected.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/login",
            &json!({"username": "chair", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Mutating project endpoints demand a bearer token.
    let payload = project_payload(1, ACTIVE_START, ACTIVE_DEADLINE);
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/admin/project", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/api/admin/project",
            "not-a-real-token",
            Some(&payload),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/api/admin/project",
            &token,
            Some(&payload),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_refresh_token_rotates_pair() {
    let app = spawn_app().await;

    register_and_login(&app, "chair").await;
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/login",
            &json!({"username": "chair", "password": "secret-pass"}),
        ))
        .await
        .unwrap();
    let body = read_json(response).await;
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(authed_request("GET", "/api/admin/refresh-token", &refresh, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body["data"]["access_token"].is_string());
    assert!(body["data"]["refresh_token"].is_string());

    let response = app
        .clone()
        .oneshot(authed_request("GET", "/api/admin/refresh-token", "bogus", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_project_crud_and_issue_conflicts() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "chair").await;

    let uuid = create_project(&app, &token, 1, ACTIVE_START, ACTIVE_DEADLINE).await;

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            &format!("/api/admin/project/{uuid}"),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["issue_num"], 1);
    assert_eq!(body["data"]["status"], 1);
    assert_eq!(body["data"]["participant_count"], 0);
    assert_eq!(body["data"]["questions"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["questions"][0]["answer"], "B");

    // Same issue number again is rejected.
    let response = app
        .clone()
        .oneshot(authed_request(
            "POST",
            "/api/admin/project",
            &token,
            Some(&project_payload(1, ACTIVE_START, ACTIVE_DEADLINE)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Full replace keeps the uuid but rewrites the question set.
    let mut replacement = project_payload(1, ACTIVE_START, ACTIVE_DEADLINE);
    replacement["name"] = json!("Revised campaign");
    replacement["questions"].as_array_mut().unwrap().pop();
    let response = app
        .clone()
        .oneshot(authed_request(
            "PUT",
            &format!("/api/admin/project/{uuid}"),
            &token,
            Some(&replacement),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            &format!("/api/admin/project/{uuid}"),
            &token,
            None,
        ))
        .await
        .unwrap();
    let body = read_json(response).await;
    assert_eq!(body["data"]["name"], "Revised campaign");
    assert_eq!(body["data"]["questions"].as_array().unwrap().len(), 1);

    // A replace that collides with another project's issue number rolls back.
    let second = create_project(&app, &token, 2, ACTIVE_START, ACTIVE_DEADLINE).await;
    let response = app
        .clone()
        .oneshot(authed_request(
            "PUT",
            &format!("/api/admin/project/{second}"),
            &token,
            Some(&project_payload(1, ACTIVE_START, ACTIVE_DEADLINE)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            &format!("/api/admin/project/{second}"),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["issue_num"], 2);

    // Replace of a missing project is a 404.
    let response = app
        .clone()
        .oneshot(authed_request(
            "PUT",
            "/api/admin/project/no-such-uuid",
            &token,
            Some(&project_payload(9, ACTIVE_START, ACTIVE_DEADLINE)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Delete, then everything under the uuid is gone.
    let response = app
        .clone()
        .oneshot(authed_request(
            "DELETE",
            &format!("/api/admin/project/{uuid}"),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            &format!("/api/admin/project/{uuid}"),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_derived_on_read() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "chair").await;

    let upcoming = create_project(&app, &token, 1, "2099-01-01 09:00:00", "2099-12-31 18:00:00").await;
    let finished = create_project(&app, &token, 2, "2020-01-01 09:00:00", "2020-01-31 18:00:00").await;

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            &format!("/api/admin/project/{upcoming}"),
            &token,
            None,
        ))
        .await
        .unwrap();
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], 0);

    let response = app
        .clone()
        .oneshot(authed_request(
            "GET",
            &format!("/api/admin/project/{finished}"),
            &token,
            None,
        ))
        .await
        .unwrap();
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], 2);
}

#[tokio::test]
async fn test_member_upsert_updates_label_only() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/user",
            &json!({"student_id": "202500996677", "name": "Zhang San", "org_unit": "first branch"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/user",
            &json!({"student_id": "202500996677", "name": "Zhang San", "org_unit": "second branch"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["org_unit"], "second branch");
}

#[tokio::test]
async fn test_submission_flow_and_duplicate_rejection() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "chair").await;
    let uuid = create_project(&app, &token, 6, ACTIVE_START, ACTIVE_DEADLINE).await;
    create_member(&app, "202500996677", "Zhang San", "first branch").await;

    // Unknown member cannot fetch the quiz.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/user/project/{uuid}?student_id=nobody"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // "latest" resolves to the highest issue number.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/user/project/latest?student_id=202500996677")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["project_uuid"], uuid.as_str());
    assert_eq!(body["data"]["participate_status"], 0);

    let response = submit(&app, "202500996677", &uuid, 15, 111.22).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Second attempt conflicts, first submission unchanged.
    let response = submit(&app, "202500996677", &uuid, 20, 10.0).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["status"], "failure");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/user/project/{uuid}?student_id=202500996677"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = read_json(response).await;
    assert_eq!(body["data"]["participate_status"], 1);
    assert_eq!(body["data"]["correct_num"], 15);
    assert_eq!(body["data"]["record"][0]["answer"], "B");

    // Participation history and the participant counter both reflect it.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/user/projects?student_id=202500996677")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = read_json(response).await;
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["correct_num"], 15);

    let response = app
        .clone()
        .oneshot(authed_request("GET", "/api/admin/projects", &token, None))
        .await
        .unwrap();
    let body = read_json(response).await;
    assert_eq!(body["data"][0]["participant_count"], 1);
}

#[tokio::test]
async fn test_late_submission_is_invalid_and_unranked() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "chair").await;
    let uuid = create_project(&app, &token, 6, "2026-06-01 09:00:00", "2026-06-30 18:00:00").await;
    create_member(&app, "202500996677", "Zhang San", "first branch").await;

    // The window is already over, so the submission is stored but invalid.
    let response = submit(&app, "202500996677", &uuid, 15, 111.22).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/ranking?student_id=202500996677")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body["data"]["ranking"].as_array().unwrap().is_empty());
    assert!(body["data"]["self_ranking"].is_null());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/ranking/all?student_id=202500996677")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = read_json(response).await;
    assert_eq!(body["data"]["self_ranking"]["total_correct_num"], 0);
    assert_eq!(body["data"]["self_ranking"]["average_time_used_seconds"], 0.0);
}

#[tokio::test]
async fn test_ranking_order_and_self_entry() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "chair").await;
    let uuid = create_project(&app, &token, 1, ACTIVE_START, ACTIVE_DEADLINE).await;

    create_member(&app, "1001", "Member A", "first branch").await;
    create_member(&app, "1002", "Member B", "second branch").await;
    create_member(&app, "1003", "Member C", "first branch").await;

    submit(&app, "1001", &uuid, 10, 50.0).await;
    submit(&app, "1002", &uuid, 12, 80.0).await;
    submit(&app, "1003", &uuid, 10, 40.0).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/ranking?student_id=1001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    assert_eq!(body["data"]["issue_num"], 1);
    assert_eq!(body["data"]["owner_username"], "chair");
    let ranking = body["data"]["ranking"].as_array().unwrap();
    assert_eq!(ranking.len(), 3);
    assert_eq!(ranking[0]["student_id"], "1002");
    assert_eq!(ranking[1]["student_id"], "1003");
    assert_eq!(ranking[2]["student_id"], "1001");
    assert_eq!(ranking[0]["rank"], 1);
    assert_eq!(body["data"]["self_ranking"]["rank"], 3);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/ranking/all?student_id=1002")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = read_json(response).await;
    let ranking = body["data"]["ranking"].as_array().unwrap();
    assert_eq!(ranking[0]["student_id"], "1002");
    assert_eq!(ranking[0]["total_correct_num"], 12);
    assert_eq!(ranking[0]["average_time_used_seconds"], 80.0);
    assert_eq!(body["data"]["self_ranking"]["rank"], 1);
}

#[tokio::test]
async fn test_started_projects_listing() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "chair").await;

    create_project(&app, &token, 1, ACTIVE_START, ACTIVE_DEADLINE).await;
    create_project(&app, &token, 2, "2099-01-01 09:00:00", "2099-12-31 18:00:00").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/user/projects/all")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;

    let projects = body["data"].as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["issue_num"], 1);
    assert_eq!(projects[0]["owner_username"], "chair");
}

#[tokio::test]
async fn test_project_delete_cascades_and_spares_others() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "chair").await;

    let first = create_project(&app, &token, 1, ACTIVE_START, ACTIVE_DEADLINE).await;
    let second = create_project(&app, &token, 2, ACTIVE_START, ACTIVE_DEADLINE).await;
    create_member(&app, "1001", "Member A", "first branch").await;

    submit(&app, "1001", &first, 8, 60.0).await;
    submit(&app, "1001", &second, 9, 70.0).await;

    let response = app
        .clone()
        .oneshot(authed_request(
            "DELETE",
            &format!("/api/admin/project/{second}"),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Only the surviving project remains in the member's history.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/user/projects?student_id=1001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = read_json(response).await;
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["project_uuid"], first.as_str());

    // The current-period board now falls back to the surviving round.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/ranking?student_id=1001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = read_json(response).await;
    assert_eq!(body["data"]["issue_num"], 1);
    assert_eq!(body["data"]["self_ranking"]["correct_num"], 8);
}

#[tokio::test]
async fn test_admin_delete_cascades_owned_projects() {
    let app = spawn_app().await;
    let token = register_and_login(&app, "chair").await;
    let uuid = create_project(&app, &token, 1, ACTIVE_START, ACTIVE_DEADLINE).await;
    create_member(&app, "1001", "Member A", "first branch").await;

    let response = app
        .clone()
        .oneshot(authed_request("DELETE", "/api/admin/delete", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/user/project/{uuid}?student_id=1001"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Credentials die with the account.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/admin/login",
            &json!({"username": "chair", "password": "secret-pass"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ranking_without_projects_is_not_found() {
    let app = spawn_app().await;
    create_member(&app, "1001", "Member A", "first branch").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/ranking?student_id=1001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = read_json(response).await;
    assert_eq!(body["code"], 404);
    assert_eq!(body["status"], "failure");
}
