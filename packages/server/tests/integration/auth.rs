use serde_json::json;

use server::utils::jwt;

use crate::common::{JWT_SECRET, TestApp, routes};

mod signup {
    use super::*;

    #[tokio::test]
    async fn new_account_starts_inactive() {
        let app = TestApp::spawn().await;

        let res = app.signup("alice", "alice@example.com", "securepass").await;
        assert_eq!(res.body["name"], "alice");
        assert_eq!(res.body["is_active"], false);
        assert_eq!(res.body["is_superuser"], false);
        assert!(res.body.get("password").is_none());

        let login = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "alice@example.com", "password": "securepass"}),
            )
            .await;
        assert_eq!(login.status, 403);
        assert_eq!(login.body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn cannot_sign_up_with_a_taken_email() {
        let app = TestApp::spawn().await;
        app.signup("alice", "alice@example.com", "securepass").await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"name": "other", "email": "alice@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn cannot_sign_up_with_a_taken_name() {
        let app = TestApp::spawn().await;
        app.signup("alice", "alice@example.com", "securepass").await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"name": "alice", "email": "other@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn rejects_malformed_email_and_short_password() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"name": "alice", "email": "not-an-email", "password": "securepass"}),
            )
            .await;
        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"name": "alice", "email": "alice@example.com", "password": "short"}),
            )
            .await;
        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod activation {
    use super::*;

    #[tokio::test]
    async fn emailed_token_activates_the_account() {
        let app = TestApp::spawn().await;
        app.signup("alice", "alice@example.com", "securepass").await;

        let token = jwt::sign_email_token(
            "alice@example.com",
            jwt::PURPOSE_ACTIVATION,
            JWT_SECRET,
            24,
        )
        .expect("Failed to sign activation token");

        let res = app
            .post_without_token(routes::ACTIVATE, &json!({"token": token}))
            .await;
        assert_eq!(res.status, 200, "activation failed: {}", res.text);

        // And the account can now log in.
        app.login("alice@example.com", "securepass").await;
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::ACTIVATE, &json!({"token": "garbage"}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn password_reset_token_cannot_activate() {
        let app = TestApp::spawn().await;
        app.signup("alice", "alice@example.com", "securepass").await;

        let token = jwt::sign_email_token(
            "alice@example.com",
            jwt::PURPOSE_PASSWORD_RESET,
            JWT_SECRET,
            24,
        )
        .expect("Failed to sign token");

        let res = app
            .post_without_token(routes::ACTIVATE, &json!({"token": token}))
            .await;

        assert_eq!(res.status, 400);
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn valid_credentials_yield_a_bearer_token() {
        let app = TestApp::spawn().await;
        app.create_activated_user("alice", "alice@example.com", "securepass")
            .await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "alice@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["token_type"], "bearer");
        assert!(res.body["access_token"].is_string());
    }

    #[tokio::test]
    async fn the_registered_email_casing_still_logs_in() {
        let app = TestApp::spawn().await;
        app.signup("bob", "Bob@Example.COM", "securepass").await;
        app.set_user_flags("bob@example.com", true, false).await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "Bob@Example.COM", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["access_token"].is_string());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_activated_user("alice", "alice@example.com", "securepass")
            .await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "alice@example.com", "password": "wrongpass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_email_is_rejected_with_the_same_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ghost@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }
}

mod password_reset {
    use super::*;

    #[tokio::test]
    async fn recovery_for_an_unknown_email_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::PASSWORD_RECOVERY,
                &json!({"email": "ghost@example.com"}),
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn recovery_accepts_the_registered_email_casing() {
        let app = TestApp::spawn().await;
        app.signup("bob", "Bob@Example.COM", "securepass").await;
        app.set_user_flags("bob@example.com", true, false).await;

        let res = app
            .post_without_token(
                routes::PASSWORD_RECOVERY,
                &json!({"email": "Bob@Example.COM"}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
    }

    #[tokio::test]
    async fn reset_token_changes_the_password() {
        let app = TestApp::spawn().await;
        app.create_activated_user("alice", "alice@example.com", "securepass")
            .await;

        let recovery = app
            .post_without_token(
                routes::PASSWORD_RECOVERY,
                &json!({"email": "alice@example.com"}),
            )
            .await;
        assert_eq!(recovery.status, 200);

        let token = jwt::sign_email_token(
            "alice@example.com",
            jwt::PURPOSE_PASSWORD_RESET,
            JWT_SECRET,
            24,
        )
        .expect("Failed to sign reset token");

        let res = app
            .post_without_token(
                routes::RESET_PASSWORD,
                &json!({"token": token, "new_password": "freshpass1"}),
            )
            .await;
        assert_eq!(res.status, 200, "reset failed: {}", res.text);

        let old = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "alice@example.com", "password": "securepass"}),
            )
            .await;
        assert_eq!(old.status, 401);

        app.login("alice@example.com", "freshpass1").await;
    }

    #[tokio::test]
    async fn reset_with_a_garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::RESET_PASSWORD,
                &json!({"token": "garbage", "new_password": "freshpass1"}),
            )
            .await;

        assert_eq!(res.status, 400);
    }
}

mod authenticated_access {
    use super::*;

    #[tokio::test]
    async fn profile_requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_tokens_are_invalid() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn profile_returns_the_logged_in_user() {
        let app = TestApp::spawn().await;
        let token = app
            .create_activated_user("alice", "alice@example.com", "securepass")
            .await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "alice");
        assert_eq!(res.body["email"], "alice@example.com");
    }

    #[tokio::test]
    async fn deactivated_accounts_lose_access_immediately() {
        let app = TestApp::spawn().await;
        let token = app
            .create_activated_user("alice", "alice@example.com", "securepass")
            .await;

        app.set_user_flags("alice@example.com", false, false).await;

        let res = app.get_with_token(routes::ME, &token).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "FORBIDDEN");
    }
}
