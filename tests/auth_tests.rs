use actix_web::{http::StatusCode, test};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use stafftable::database::Location;
use stafftable::database::models::{CreateUserInput, LoginInput};

mod common;

use common::{AuthHelper, MockData, TestContext};

fn login_input(user: &CreateUserInput) -> LoginInput {
    LoginInput {
        email: user.email.clone(),
        password: user.password.clone(),
        location: user.location.clone(),
    }
}

#[tokio::test]
async fn test_register_issues_location_token() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let request = MockData::user("tempe");
    let email = request.email.to_lowercase();

    let response = ctx.auth_service.register(request).await.unwrap();

    assert!(!response.token.is_empty());
    assert_eq!(response.user.email, email);
    assert!(!response.user.is_owner);
    assert_eq!(response.location, Location::Tempe);

    let claims = ctx.auth_service.verify_token(&response.token).unwrap();
    assert_eq!(claims.sub, response.user.id);
    assert_eq!(claims.location, Location::Tempe);
    assert!(!claims.is_owner);
}

#[tokio::test]
async fn test_duplicate_registration_in_same_location() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let first = MockData::user("becker");
    let second = CreateUserInput {
        email: first.email.to_uppercase(),
        password: "different_password".to_string(),
        name: None,
        location: "becker".to_string(),
    };

    ctx.auth_service.register(first).await.unwrap();
    let error = ctx.auth_service.register(second).await.unwrap_err();

    assert!(error.is_conflict());
    assert_eq!(error.to_string(), "Conflict: User already exists");
}

#[tokio::test]
async fn test_login_is_scoped_to_location() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let request = MockData::user("downtown");
    let login = login_input(&request);
    let elsewhere = LoginInput {
        location: "tempe".to_string(),
        ..login_input(&request)
    };

    let registered = ctx.auth_service.register(request).await.unwrap();
    let logged_in = ctx.auth_service.login(login).await.unwrap();
    assert_eq!(logged_in.user, registered.user);
    assert_eq!(logged_in.location, Location::Downtown);

    let error = ctx.auth_service.login(elsewhere).await.unwrap_err();
    assert_eq!(error.to_string(), "Unauthorized: Invalid email or password");
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let request = MockData::user("tempe");
    let mut login = login_input(&request);
    login.password = "wrong-password".to_string();

    ctx.auth_service.register(request).await.unwrap();
    let error = ctx.auth_service.login(login).await.unwrap_err();

    assert_eq!(error.to_string(), "Unauthorized: Invalid email or password");
}

#[tokio::test]
async fn test_register_rejects_unknown_location() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();

    let error = ctx
        .auth_service
        .register(MockData::user("nonexistent"))
        .await
        .unwrap_err();

    assert!(error.is_configuration());
    assert!(ctx.registry.resolved_locations().is_empty());
}

#[tokio::test]
async fn test_verify_token_rejects_tampered_token() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let response = ctx
        .auth_service
        .register(MockData::user("tempe"))
        .await
        .unwrap();

    let tampered = format!("{}x", response.token);
    assert!(ctx.auth_service.verify_token(&tampered).is_err());
}

#[actix_web::test]
async fn test_register_login_and_me_over_http() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let app = test::init_service(ctx.app()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "email": "Host@Example.com",
            "password": "password123",
            "name": "Front Host",
            "location": "north-scottsdale"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["email"], "host@example.com");
    assert_eq!(body["data"]["user"]["isOwner"], false);
    assert_eq!(body["data"]["location"], "north-scottsdale");
    assert!(body["data"]["user"].get("passwordHash").is_none());

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({
            "email": "host@example.com",
            "password": "password123",
            "location": "north-scottsdale"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(AuthHelper::auth_header(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["user"]["name"], "Front Host");
    assert_eq!(body["data"]["location"], "north-scottsdale");
}

#[actix_web::test]
async fn test_http_error_statuses() {
    common::setup_test_env();
    let ctx = TestContext::new().await.unwrap();
    let app = test::init_service(ctx.app()).await;

    let register = json!({
        "email": "dup@example.com",
        "password": "password123",
        "location": "tempe"
    });
    for expected in [StatusCode::CREATED, StatusCode::BAD_REQUEST] {
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(&register)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected);
    }

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({
            "email": "dup@example.com",
            "password": "nope",
            "location": "tempe"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid email or password");

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({
            "email": "dup@example.com",
            "password": "password123",
            "location": "mesa"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/api/v1/auth/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
