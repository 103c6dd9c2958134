//! End-to-end HTTP tests over the in-memory stores.

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{TimeDelta, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use api_server::{AppState, configure_routes};
use tradeboard_core::domain::Role;
use tradeboard_infra::JwtConfig;

fn state() -> AppState {
    AppState::in_memory(JwtConfig {
        secret: "integration-test-secret".to_string(),
        expiration_hours: 1,
    })
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

fn token_for(state: &AppState, role: &str) -> String {
    state
        .tokens
        .issue(Uuid::new_v4(), &Role::new(role), TimeDelta::hours(1))
        .unwrap()
        .token
}

#[actix_rt::test]
async fn health_is_public() {
    let state = state();
    let app = app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

#[actix_rt::test]
async fn register_login_and_reach_protected_route() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({"name": "Ada", "email": "Ada@Example.com", "password": "correct-horse"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let user: Value = test::read_body_json(resp).await;
    assert_eq!(user["email"], "ada@example.com");
    assert_eq!(user["role"], "free");
    assert!(user.get("password_hash").is_none());

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({"email": "ada@example.com", "password": "correct-horse"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let login: Value = test::read_body_json(resp).await;
    assert_eq!(login["token_type"], "Bearer");
    assert_eq!(login["user"]["role"], "free");
    assert!(login["expires_in"].as_i64().unwrap() > 0);

    let token = login["token"].as_str().unwrap();
    let req = test::TestRequest::get()
        .uri("/api/v1/protected")
        .insert_header(bearer(token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user_id"], user["id"]);
}

#[actix_rt::test]
async fn registration_needs_only_email_and_password() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({"email": "a@b.com", "password": "Secret1!"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let user: Value = test::read_body_json(resp).await;
    assert_eq!(user["email"], "a@b.com");
    assert_eq!(user["role"], "free");
}

#[actix_rt::test]
async fn bad_login_is_401_with_generic_detail() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({"email": "ghost@example.com", "password": "whatever1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["detail"], "Invalid credentials");
}

#[actix_rt::test]
async fn duplicate_registration_conflicts() {
    let state = state();
    let app = app!(state);

    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({"name": "Bo", "email": "bo@example.com", "password": "longenough"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), expected);
    }
}

#[actix_rt::test]
async fn admin_routes_are_role_gated() {
    let state = state();
    let app = app!(state);

    let anonymous = test::TestRequest::get().uri("/api/v1/admin/users").to_request();
    assert_eq!(test::call_service(&app, anonymous).await.status(), StatusCode::UNAUTHORIZED);

    let free = test::TestRequest::get()
        .uri("/api/v1/admin/users")
        .insert_header(bearer(&token_for(&state, "free")))
        .to_request();
    assert_eq!(test::call_service(&app, free).await.status(), StatusCode::FORBIDDEN);

    let admin = test::TestRequest::get()
        .uri("/api/v1/admin/users")
        .insert_header(bearer(&token_for(&state, "admin")))
        .to_request();
    let resp = test::call_service(&app, admin).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["pagination"]["total"], 0);
}

#[actix_rt::test]
async fn garbage_token_is_rejected() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::get()
        .uri("/api/v1/protected")
        .insert_header(bearer("not.a.jwt"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    // An invalid token on a public read is not downgraded to anonymous.
    let req = test::TestRequest::get()
        .uri("/api/v1/posts")
        .insert_header(bearer("not.a.jwt"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn malformed_json_is_a_bad_request() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Bad Request");
}

#[actix_rt::test]
async fn scheduled_posts_appear_after_publisher_runs() {
    let state = state();
    let app = app!(state);
    let author = token_for(&state, "author");

    let now = Utc::now();
    for (title, at) in [
        ("published now", Some(now - TimeDelta::minutes(1))),
        ("later", Some(now + TimeDelta::hours(1))),
        ("draft", None),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/v1/posts")
            .insert_header(bearer(&author))
            .set_json(json!({
                "title": title,
                "content": "body",
                "tags": ["BTC"],
                "visibility": "public",
                "type": "idea",
                "scheduled_at": at,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let list = |app_uri: &str| test::TestRequest::get().uri(app_uri).to_request();

    let resp = test::call_service(&app, list("/api/v1/posts")).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["posts"][0]["title"], "published now");
    assert_eq!(body["posts"][0]["status"], "published");

    let promoted = state.publisher.run_once(now + TimeDelta::hours(2)).await.unwrap();
    assert_eq!(promoted, 1);

    let resp = test::call_service(&app, list("/api/v1/posts?sort=title")).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["posts"][0]["title"], "later");

    let req = test::TestRequest::get()
        .uri("/api/v1/posts/my")
        .insert_header(bearer(&author))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["pagination"]["total"], 3);
}

#[actix_rt::test]
async fn free_users_cannot_create_posts() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(bearer(&token_for(&state, "free")))
        .set_json(json!({"title": "t", "visibility": "public", "type": "idea"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn post_creation_checks_the_role_before_the_body() {
    let state = state();
    let app = app!(state);
    let free = token_for(&state, "free");

    let bad_visibility = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(bearer(&free))
        .set_json(json!({"title": "t", "visibility": "secret", "type": "idea"}))
        .to_request();
    assert_eq!(test::call_service(&app, bad_visibility).await.status(), StatusCode::FORBIDDEN);

    let not_json = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(bearer(&free))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    assert_eq!(test::call_service(&app, not_json).await.status(), StatusCode::FORBIDDEN);

    let anonymous = test::TestRequest::post()
        .uri("/api/v1/posts")
        .set_json(json!({"title": "t", "visibility": "public", "type": "idea"}))
        .to_request();
    assert_eq!(test::call_service(&app, anonymous).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn unknown_visibility_is_a_bad_request() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(bearer(&token_for(&state, "author")))
        .set_json(json!({"title": "t", "visibility": "secret", "type": "idea"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn non_owner_sees_not_found_on_update() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(bearer(&token_for(&state, "author")))
        .set_json(json!({"title": "mine", "visibility": "public", "type": "trade"}))
        .to_request();
    let post: Value = test::read_body_json(test::call_service(&app, req).await).await;
    let uri = format!("/api/v1/posts/{}", post["id"].as_str().unwrap());

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&token_for(&state, "author")))
        .set_json(json!({"title": "hijacked"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&token_for(&state, "admin")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
}

#[actix_rt::test]
async fn invalid_post_id_is_a_bad_request() {
    let state = state();
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/v1/posts/not-a-uuid").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}
