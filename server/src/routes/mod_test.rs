use super::*;
use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::state::test_helpers;

async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app(test_helpers::test_app_state()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() { serde_json::Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

fn create_company(body: &serde_json::Value) -> Request<Body> {
    Request::post("/api/functions/create-company")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn healthz_is_ok() {
    let (status, _) = send(Request::get("/healthz").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn create_company_missing_fields_is_400_with_exact_body() {
    let body = serde_json::json!({ "domain": "acme.com", "displayName": "Acme" });
    let (status, body) = send(create_company(&body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, serde_json::json!({ "error": "Missing required fields" }));
}

#[tokio::test]
async fn create_company_domain_mismatch_is_400_with_exact_body() {
    let body = serde_json::json!({
        "domain": "bar.com",
        "displayName": "Bar",
        "userEmail": "user@foo.com",
        "userId": "00000000-0000-0000-0000-000000000001",
    });
    let (status, body) = send(create_company(&body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, serde_json::json!({ "error": "Email domain must match company domain" }));
}

#[tokio::test]
async fn create_company_valid_body_still_needs_a_session() {
    let body = serde_json::json!({
        "domain": "acme.com",
        "displayName": "Acme",
        "userEmail": "ann@acme.com",
        "userId": "00000000-0000-0000-0000-000000000001",
    });
    let (status, body) = send(create_company(&body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, serde_json::json!({ "error": "Not authenticated" }));
}

#[tokio::test]
async fn create_company_accepts_json_without_content_type() {
    let body = serde_json::json!({ "domain": "acme.com", "displayName": "Acme" });
    let request = Request::post("/api/functions/create-company")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, serde_json::json!({ "error": "Missing required fields" }));
}

#[tokio::test]
async fn create_company_body_errors_are_400() {
    let wrong_type = serde_json::json!({
        "domain": "acme.com",
        "displayName": "Acme",
        "userEmail": "ann@acme.com",
        "userId": 5,
    })
    .to_string();
    for raw in [wrong_type.as_str(), "{not json", ""] {
        let request = Request::post("/api/functions/create-company")
            .header("content-type", "application/json")
            .body(Body::from(raw.to_owned()))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {raw:?}");
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"), "body {raw:?}");
    }
}

#[tokio::test]
async fn workspace_endpoints_require_a_session() {
    for (method, uri) in [
        ("GET", "/api/profile"),
        ("GET", "/api/profiles"),
        ("GET", "/api/profiles/search?q=an"),
        ("GET", "/api/whiteboards"),
        ("POST", "/api/whiteboards"),
        ("GET", "/api/groups"),
        ("PATCH", "/api/domain"),
        ("DELETE", "/api/whiteboards/00000000-0000-0000-0000-000000000001"),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert!(body["error"].is_string(), "{method} {uri}");
    }
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let (status, _) = send(Request::get("/api/nope").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// live database
// =============================================================================

#[cfg(feature = "live-db-tests")]
mod live {
    use super::*;
    use crate::db::live::integration_pool;
    use axum::http::header::AUTHORIZATION;

    struct Client {
        router: Router,
    }

    impl Client {
        async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
            let mut builder = Request::builder().method(method).uri(uri).header("content-type", "application/json");
            if let Some(token) = token {
                builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
            }
            let body = body.map_or_else(Body::empty, |b| Body::from(b.to_string()));
            let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let body = if bytes.is_empty() { serde_json::Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
            (status, body)
        }

        async fn sign_up(&self, email: &str) -> (String, String) {
            let body = serde_json::json!({ "email": email, "password": "long-enough", "creating_workspace": true });
            let response = self
                .router
                .clone()
                .oneshot(
                    Request::post("/api/auth/signup")
                        .header("content-type", "application/json")
                        .body(Body::from(body.to_string()))
                        .unwrap(),
                )
                .await
                .unwrap();
            let cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap().to_owned();
            let token = cookie.trim_start_matches("session_token=").split(';').next().unwrap().to_owned();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let info: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            (token, info["user"]["id"].as_str().unwrap().to_owned())
        }
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL/live Postgres"]
    async fn onboarding_then_whiteboard_lifecycle() {
        let mut state = test_helpers::test_app_state();
        state.pool = integration_pool().await;
        let client = Client { router: app(state) };

        let (token, user_id) = client.sign_up("ann@acme").await;
        let (status, body) = client.call("GET", "/api/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "profile_missing");

        let company = serde_json::json!({
            "domain": "acme", "displayName": "Acme Corp", "userEmail": "ann@acme", "userId": user_id,
        });
        let (status, body) = client.call("POST", "/api/functions/create-company", Some(&token), Some(company)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["isFirstUser"], true);
        assert_eq!(body["role"], "admin");

        let (status, body) = client.call("GET", "/api/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["domain"]["display_name"], "Acme Corp");

        let (status, board) = client
            .call("POST", "/api/whiteboards", Some(&token), Some(serde_json::json!({ "title": "Roadmap" })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = board["id"].as_str().unwrap().to_owned();

        let (_, list) = client.call("GET", "/api/whiteboards", Some(&token), None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["access"]["kind"], "owner");

        let (status, _) = client.call("DELETE", &format!("/api/whiteboards/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, list) = client.call("GET", "/api/whiteboards", Some(&token), None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL/live Postgres"]
    async fn invite_links_work_without_a_session() {
        let mut state = test_helpers::test_app_state();
        state.pool = integration_pool().await;
        let client = Client { router: app(state) };

        let (token, user_id) = client.sign_up("ann@acme").await;
        let company = serde_json::json!({
            "domain": "acme", "displayName": "Acme", "userEmail": "ann@acme", "userId": user_id,
        });
        client.call("POST", "/api/functions/create-company", Some(&token), Some(company)).await;
        let (_, board) = client
            .call("POST", "/api/whiteboards", Some(&token), Some(serde_json::json!({ "title": "Plan" })))
            .await;
        let id = board["id"].as_str().unwrap();

        let (status, invite) = client
            .call(
                "POST",
                &format!("/api/whiteboards/{id}/invites"),
                Some(&token),
                Some(serde_json::json!({ "permission": "editor" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let invite_token = invite["token"].as_str().unwrap();

        let (status, grant) = client.call("GET", &format!("/api/invites/{invite_token}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(grant["permission"], "editor");

        let (status, updated) = client
            .call(
                "PATCH",
                &format!("/api/invites/{invite_token}/whiteboard"),
                None,
                Some(serde_json::json!({ "data": { "shapes": [] } })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["data"], serde_json::json!({ "shapes": [] }));

        let (status, _) = client.call("GET", "/api/invites/unknown", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
