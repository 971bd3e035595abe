mod common;

use common::{MockUserRepo, PASSWORD, app_state, cookie_for};
use reqwest::{StatusCode, header, redirect::Policy};
use std::sync::Arc;
use tokio::net::TcpListener;
use wms_admin_portal::{AppState, create_router, session::Role};

#[derive(Clone)]
pub struct TestApp {
    pub address: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn get(&self, path: &str, cookie: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.url(path));
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        request.send().await.expect("req fail")
    }
}

async fn spawn_app() -> TestApp {
    let state = app_state(Arc::new(MockUserRepo::seeded()));
    let router = create_router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // Redirects are the thing under test; never follow them.
    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap();

    TestApp {
        address,
        state,
        client,
    }
}

fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = app.get("/health", None).await;
    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_anonymous_admin_tier_redirects_to_login_with_return_path() {
    let app = spawn_app().await;
    let response = app.get("/users", None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirect=%2Fusers");
}

#[tokio::test]
async fn test_admin_is_kept_out_of_superadmin_area() {
    let app = spawn_app().await;
    let cookie = cookie_for(&app.state, 2, Role::Admin);
    let response = app.get("/admin/reports", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/unauthorized");
}

#[tokio::test]
async fn test_superadmin_passes_the_guard() {
    let app = spawn_app().await;
    let cookie = cookie_for(&app.state, 1, Role::Superadmin);
    // No page is served here by the API, so passing the guard means the 404 fallback.
    let response = app.get("/admin/reports", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_signed_in_user_is_sent_home_from_login() {
    let app = spawn_app().await;
    let cookie = cookie_for(&app.state, 3, Role::User);
    let response = app.get("/login", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/");

    let response = app.get("/login", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_static_files_bypass_the_guard() {
    let app = spawn_app().await;
    let response = app.get("/favicon.ico", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app.get("/api-docs/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_plain_user_is_unauthorized_for_admin_tier_but_not_siblings() {
    let app = spawn_app().await;
    let cookie = cookie_for(&app.state, 3, Role::User);

    let response = app.get("/settings/profile", Some(&cookie)).await;
    assert_eq!(location(&response), "/unauthorized");

    let response = app.get("/usersettings", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/usersettings", None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirect=%2Fusersettings");
}

#[tokio::test]
async fn test_tampered_cookie_is_no_session() {
    let app = spawn_app().await;
    let cookie = format!("{}x", cookie_for(&app.state, 1, Role::Superadmin));
    let response = app.get("/admin", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirect=%2Fadmin");
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/auth/signin"))
        .json(&serde_json::json!({ "username": "root", "password": PASSWORD }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let me: serde_json::Value = app.get("/api/auth/me", Some(&cookie)).await.json().await.unwrap();
    assert_eq!(me["user"]["role"], "superadmin");

    let response = app.get("/api/superadmin/users?role=admin", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listing: serde_json::Value = response.json().await.unwrap();
    assert_eq!(listing["success"], true);
    assert_eq!(listing["users"].as_array().unwrap().len(), 1);
    assert_eq!(listing["users"][0]["username"], "shiftlead");

    let response = app
        .client
        .patch(app.url("/api/superadmin/users/3"))
        .header(header::COOKIE, &cookie)
        .json(&serde_json::json!({ "role": "admin" }))
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .client
        .delete(app.url("/api/superadmin/users/4"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .client
        .post(app.url("/api/auth/logout"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .expect("req fail");
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.starts_with("session=;"));
}

#[tokio::test]
async fn test_who_am_i_is_pollable_without_session() {
    let app = spawn_app().await;
    let response = app.get("/api/auth/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_api_outside_bypass_is_guarded() {
    let app = spawn_app().await;
    let response = app.get("/api/superadmin/users", None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirect=%2Fapi%2Fsuperadmin%2Fusers");

    let cookie = cookie_for(&app.state, 2, Role::Admin);
    let response = app.get("/api/superadmin/users", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
