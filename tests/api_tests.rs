// tests/api_tests.rs

use quizhub::{config::Config, routes, state::AppState};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;

/// Spawns the app on a random port against the DATABASE_URL database.
/// Returns None, skipping the calling test, when no database is configured.
async fn spawn_app() -> Option<String> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        port: 0,
        public_catalog_reads: false,
        auth_rate_limit: false,
        admin_username: None,
        admin_password: None,
    };

    let state = AppState { pool, config };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    Some(address)
}

/// Registers a fresh user, returns (id, username, token).
async fn register_user(client: &reqwest::Client, address: &str) -> (i64, String, String) {
    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "full_name": "Test User",
            "username": username,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute register request");

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    let id = body["user"]["id"].as_i64().expect("user id missing");
    let token = body["token"].as_str().expect("token missing").to_string();

    (id, username, token)
}

#[tokio::test]
async fn health_check_works() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_login_me_flow() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let (id, username, _token) = register_user(&client, &address).await;

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "username": username, "password": "password123" }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    assert_eq!(login["success"], true);
    let token = login["token"].as_str().expect("Token not found");

    let me: serde_json::Value = client
        .get(format!("{}/api/auth/me", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("me failed")
        .json()
        .await
        .unwrap();

    assert_eq!(me["user"]["id"].as_i64().unwrap(), id);
    assert_eq!(me["user"]["username"], username.as_str());
    // The hash must never be serialized.
    assert!(me["user"].get("password").is_none());
}

#[tokio::test]
async fn register_fails_validation() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    // Username too short.
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "full_name": "Test User",
            "username": "yo",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let (_, username, _) = register_user(&client, &address).await;

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "full_name": "Second User",
            "username": username,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn login_does_not_reveal_which_credential_failed() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let (_, username, _) = register_user(&client, &address).await;

    let unknown_user = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "username": "no_such_user_xyz", "password": "password123" }))
        .send()
        .await
        .unwrap();
    let wrong_password = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "username": username, "password": "not-the-password" }))
        .send()
        .await
        .unwrap();

    assert_eq!(unknown_user.status().as_u16(), 401);
    assert_eq!(wrong_password.status().as_u16(), 401);

    let a: serde_json::Value = unknown_user.json().await.unwrap();
    let b: serde_json::Value = wrong_password.json().await.unwrap();
    assert_eq!(a["message"], b["message"]);
}

#[tokio::test]
async fn catalog_reads_require_token_by_default() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/exams", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn exam_scoring_flow() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let (_, _, token) = register_user(&client, &address).await;
    let auth = format!("Bearer {}", token);

    // Exam worth 100 points, pass at 60%.
    let exam: serde_json::Value = client
        .post(format!("{}/api/exams", address))
        .header("Authorization", &auth)
        .json(&serde_json::json!({
            "title": "Geography basics",
            "subject": "Geography",
            "duration": 30,
            "total_questions": 2,
            "total_points": 100,
            "passing_score": 60
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let exam_id = exam["data"]["id"].as_i64().expect("exam id missing");

    let mut question_ids = Vec::new();
    for (prompt, answer) in [("Capital of France?", "Paris"), ("Capital of Chile?", "Santiago")] {
        let question: serde_json::Value = client
            .post(format!("{}/api/questions", address))
            .header("Authorization", &auth)
            .json(&serde_json::json!({
                "exam_id": exam_id,
                "prompt": prompt,
                "question_type": "short_answer",
                "options": [],
                "correct_answer": answer,
                "points": 50
            }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        question_ids.push(question["data"]["id"].as_i64().expect("question id missing"));
    }

    // One right, one wrong, one referencing a question outside the exam.
    let response = client
        .post(format!("{}/api/results", address))
        .header("Authorization", &auth)
        .json(&serde_json::json!({
            "exam_id": exam_id,
            "answers": [
                { "question_id": question_ids[0], "selected_answer": "Paris" },
                { "question_id": question_ids[1], "selected_answer": "Lima" },
                { "question_id": 99_999_999, "selected_answer": "Paris" }
            ],
            "time_spent": 540,
            "started_at": "2026-08-07T10:00:00Z"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 201);
    let result: serde_json::Value = response.json().await.unwrap();
    let data = &result["data"];

    assert_eq!(data["total_score"].as_i64().unwrap(), 50);
    assert_eq!(data["max_score"].as_i64().unwrap(), 100);
    assert_eq!(data["percentage"].as_i64().unwrap(), 50);
    assert_eq!(data["is_passed"], false);
    // The stray answer was skipped, not scored.
    assert_eq!(data["answers"].as_array().unwrap().len(), 2);

    // Reading the result back returns the same scored fields.
    let result_id = data["id"].as_i64().unwrap();
    let fetched: serde_json::Value = client
        .get(format!("{}/api/results/{}", address, result_id))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["data"], *data);

    let history: serde_json::Value = client
        .get(format!("{}/api/results/user/history", address))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["count"].as_i64().unwrap(), 1);
}

#[tokio::test]
async fn zero_point_exam_submission_is_rejected() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let (_, _, token) = register_user(&client, &address).await;
    let auth = format!("Bearer {}", token);

    let exam: serde_json::Value = client
        .post(format!("{}/api/exams", address))
        .header("Authorization", &auth)
        .json(&serde_json::json!({
            "title": "Misconfigured exam",
            "subject": "Nothing",
            "duration": 10,
            "total_questions": 0,
            "total_points": 0,
            "passing_score": 60
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let exam_id = exam["data"]["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/api/results", address))
        .header("Authorization", &auth)
        .json(&serde_json::json!({
            "exam_id": exam_id,
            "answers": [],
            "time_spent": 5,
            "started_at": "2026-08-07T10:00:00Z"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);

    // Nothing was persisted.
    let results: serde_json::Value = client
        .get(format!("{}/api/results/exam/{}", address, exam_id))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(results["count"].as_i64().unwrap(), 0);
}

#[tokio::test]
async fn exam_detail_withholds_answer_key() {
    let Some(address) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let (_, _, token) = register_user(&client, &address).await;
    let auth = format!("Bearer {}", token);

    let exam: serde_json::Value = client
        .post(format!("{}/api/exams", address))
        .header("Authorization", &auth)
        .json(&serde_json::json!({
            "title": "Answer key test",
            "subject": "Secrecy",
            "duration": 10,
            "total_questions": 1,
            "total_points": 10,
            "passing_score": 50
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let exam_id = exam["data"]["id"].as_i64().unwrap();

    client
        .post(format!("{}/api/questions", address))
        .header("Authorization", &auth)
        .json(&serde_json::json!({
            "exam_id": exam_id,
            "prompt": "True or false: water is wet.",
            "question_type": "true_false",
            "options": [
                { "text": "true", "is_correct": true },
                { "text": "false", "is_correct": false }
            ],
            "correct_answer": "true",
            "points": 10
        }))
        .send()
        .await
        .unwrap();

    let detail: serde_json::Value = client
        .get(format!("{}/api/exams/{}", address, exam_id))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let questions = detail["data"]["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 1);
    assert!(questions[0].get("correct_answer").is_none());
    assert_eq!(questions[0]["prompt"], "True or false: water is wet.");
}
