//! Tests for auth module
//!
//! These tests drive the account endpoints through the real router:
//! - Registration and validation errors
//! - Login, token use and logout
//! - Profile read/update and password change

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::common::testing::{
        body_json, body_text, create_user, form_request, get, json_request, token_for, TestApp,
        ADMIN_EMAIL, TEST_PASSWORD,
    };
    use axum::http::{header, Method, StatusCode};
    use serde_json::json;

    fn registration(email: &str) -> serde_json::Value {
        json!({ "name": "Jane Doe", "email": email, "password": "secret123" })
    }

    // ============================================================================
    // Registration
    // ============================================================================

    #[tokio::test]
    async fn test_register_creates_user_without_exposing_password() {
        let app = TestApp::new().await;

        let response = app
            .send(json_request(Method::POST, "/api/register", None, registration("jane@example.com")))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let text = body_text(response).await;
        assert!(!text.contains("secret123"));
        assert!(!text.contains("argon2"));

        let body: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["message"], json!("User registered successfully!"));
        assert_eq!(body["data"]["email"], json!("jane@example.com"));
        assert!(body["data"].get("password").is_none());
        assert_eq!(body["data"]["is_admin"], json!(false));

        let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE email = ?")
            .bind("jane@example.com")
            .fetch_one(&app.db)
            .await
            .unwrap();
        assert_ne!(stored, "secret123");
        assert!(password::verify_password("secret123", &stored));
    }

    #[tokio::test]
    async fn test_register_with_listed_email_stays_regular() {
        let app = TestApp::new().await;

        let response = app
            .send(json_request(Method::POST, "/api/register", None, registration(ADMIN_EMAIL)))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["is_admin"], json!(false));

        let user_id = body["data"]["id"].as_i64().unwrap();
        let token = token_for(&app.db, user_id).await;
        let response = app
            .send(json_request(
                Method::POST,
                "/api/products",
                Some(&token),
                json!({ "name": "Sneaky", "price": 1 }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_profile_update_to_listed_email_grants_nothing() {
        let app = TestApp::new().await;
        let token = app.user_token().await;
        let create = || {
            json_request(
                Method::POST,
                "/api/products",
                Some(&token),
                json!({ "name": "Sneaky", "price": 1 }),
            )
        };

        assert_eq!(app.send(create()).await.status(), StatusCode::FORBIDDEN);

        let response = app
            .send(json_request(
                Method::POST,
                "/api/profile-update",
                Some(&token),
                json!({
                    "name": "User",
                    "phone": "1234567890",
                    "dob": "1990-01-01",
                    "email": ADMIN_EMAIL
                }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["is_admin"], json!(false));

        assert_eq!(app.send(create()).await.status(), StatusCode::FORBIDDEN);

        let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&app.db)
            .await
            .unwrap();
        assert_eq!(products, 0);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email_and_short_password() {
        let app = TestApp::new().await;
        create_user(&app.db, "Existing", "taken@example.com", false).await;

        let response = app
            .send(json_request(
                Method::POST,
                "/api/register",
                None,
                json!({ "name": "Dup", "email": "taken@example.com", "password": "short" }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["message"], json!("Validation Error."));
        assert_eq!(
            body["data"]["email"],
            json!(["The email has already been taken."])
        );
        assert!(body["data"]["password"].is_array());
        assert!(body["data"].get("name").is_none());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = TestApp::new().await;

        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/register")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let response = app.send(request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], json!(false));
    }

    // ============================================================================
    // Login / logout
    // ============================================================================

    #[tokio::test]
    async fn test_login_issues_token_that_authenticates() {
        let app = TestApp::new().await;
        create_user(&app.db, "Jane", "jane@example.com", false).await;

        let response = app
            .send(json_request(
                Method::POST,
                "/api/login",
                None,
                json!({ "email": "jane@example.com", "password": TEST_PASSWORD }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["message"], json!("User login successfully."));
        assert_eq!(body["data"]["token_type"], json!("Bearer"));
        assert!(body["data"]["user"].get("password").is_none());
        let token = body["data"]["token"].as_str().unwrap().to_string();

        let name: String = sqlx::query_scalar("SELECT name FROM personal_access_tokens")
            .fetch_one(&app.db)
            .await
            .unwrap();
        assert_eq!(name, tokens::LOGIN_TOKEN_NAME);

        let response = app.send(get("/api/profile", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], json!("Success!"));
        assert_eq!(body["data"]["email"], json!("jane@example.com"));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let app = TestApp::new().await;
        create_user(&app.db, "Jane", "jane@example.com", false).await;

        let wrong_password = app
            .send(json_request(
                Method::POST,
                "/api/login",
                None,
                json!({ "email": "jane@example.com", "password": "wrongpass1" }),
            ))
            .await;
        let unknown_email = app
            .send(json_request(
                Method::POST,
                "/api/login",
                None,
                json!({ "email": "nobody@example.com", "password": TEST_PASSWORD }),
            ))
            .await;

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);

        let a = body_json(wrong_password).await;
        let b = body_json(unknown_email).await;
        assert_eq!(a, b);
        assert_eq!(a["message"], json!("Unauthorised."));
        assert_eq!(a["data"]["error"], json!("Invalid Login Details"));
    }

    #[tokio::test]
    async fn test_protected_endpoints_require_token() {
        let app = TestApp::new().await;

        let missing = app.send(get("/api/profile", None)).await;
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(missing).await["message"], json!("Unauthenticated."));

        let bogus = app.send(get("/api/profile", Some("1|not-a-real-secret"))).await;
        assert_eq!(bogus.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_revokes_only_presented_token() {
        let app = TestApp::new().await;
        let user = create_user(&app.db, "Jane", "jane@example.com", false).await;
        let first = token_for(&app.db, user.id).await;
        let second = token_for(&app.db, user.id).await;

        let response = app.send(get("/api/logout", Some(&first))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], json!("You have been successfully logged out!"));
        assert!(body["data"].is_null());

        let revoked = app.send(get("/api/profile", Some(&first))).await;
        assert_eq!(revoked.status(), StatusCode::UNAUTHORIZED);

        let still_valid = app.send(get("/api/profile", Some(&second))).await;
        assert_eq!(still_valid.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_cookie_authenticates_html_pages() {
        let app = TestApp::new().await;
        create_user(&app.db, "Admin", ADMIN_EMAIL, true).await;

        let response = app
            .send(form_request(
                Method::POST,
                "/api/login",
                None,
                &[("email", ADMIN_EMAIL), ("password", TEST_PASSWORD)],
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie set")
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.contains("HttpOnly"));
        let pair = set_cookie.split(';').next().unwrap().to_string();
        let token = body_json(response).await["data"]["token"]
            .as_str()
            .unwrap()
            .to_string();
        assert_eq!(pair, format!("{}={}", cookies::TOKEN_COOKIE, token));

        let with_cookie = |uri: &str| {
            axum::http::Request::builder()
                .uri(uri)
                .header(header::COOKIE, pair.as_str())
                .body(axum::body::Body::empty())
                .unwrap()
        };

        let form = app.send(with_cookie("/products/create")).await;
        assert_eq!(form.status(), StatusCode::OK);

        let logout = app.send(with_cookie("/api/logout")).await;
        assert_eq!(logout.status(), StatusCode::OK);
        let cleared = logout.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));

        let after = app.send(with_cookie("/products/create")).await;
        assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
    }

    // ============================================================================
    // Password and profile
    // ============================================================================

    #[tokio::test]
    async fn test_change_password_checks_old_password() {
        let app = TestApp::new().await;
        let user = create_user(&app.db, "Jane", "jane@example.com", false).await;
        let token = token_for(&app.db, user.id).await;

        let rejected = app
            .send(json_request(
                Method::POST,
                "/api/change-password",
                Some(&token),
                json!({ "old_password": "notmypass", "password": "newsecret1" }),
            ))
            .await;
        assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(rejected).await;
        assert_eq!(body["message"], json!("ERROR"));
        assert_eq!(body["data"]["error"], json!("Invalid Old Password"));

        let accepted = app
            .send(json_request(
                Method::POST,
                "/api/change-password",
                Some(&token),
                json!({ "old_password": TEST_PASSWORD, "password": "newsecret1" }),
            ))
            .await;
        assert_eq!(accepted.status(), StatusCode::OK);
        assert_eq!(
            body_json(accepted).await["message"],
            json!("Password Changed Successfully!")
        );

        let login = app
            .send(json_request(
                Method::POST,
                "/api/login",
                None,
                json!({ "email": "jane@example.com", "password": "newsecret1" }),
            ))
            .await;
        assert_eq!(login.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_profile_update_returns_updated_user() {
        let app = TestApp::new().await;
        let user = create_user(&app.db, "Jane", "jane@example.com", false).await;
        let token = token_for(&app.db, user.id).await;

        let response = app
            .send(json_request(
                Method::POST,
                "/api/profile-update",
                Some(&token),
                json!({
                    "name": "Jane Smith",
                    "phone": "9876543210",
                    "dob": "1992-02-02",
                    "email": "jane@example.com"
                }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["message"], json!("User Details Updated!"));
        assert_eq!(body["data"]["name"], json!("Jane Smith"));
        assert_eq!(body["data"]["phone"], json!("9876543210"));
    }

    #[tokio::test]
    async fn test_profile_update_rejects_email_of_another_user() {
        let app = TestApp::new().await;
        create_user(&app.db, "Other", "other@example.com", false).await;
        let user = create_user(&app.db, "Jane", "jane@example.com", false).await;
        let token = token_for(&app.db, user.id).await;

        let response = app
            .send(json_request(
                Method::POST,
                "/api/profile-update",
                Some(&token),
                json!({
                    "name": "Jane",
                    "phone": "12345",
                    "dob": "1992-02-02",
                    "email": "other@example.com"
                }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert!(body["data"]["phone"].is_array());
        assert!(body["data"]["email"].is_array());
    }
}
