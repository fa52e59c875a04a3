use serde_json::json;

use crate::common::{BOOTSTRAP_EMAIL, TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn bootstrap_email_can_register_and_gets_super_role() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "email": BOOTSTRAP_EMAIL,
                    "password": "sup3r-secret",
                    "first_name": "Root",
                    "last_name": "Admin",
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["role"].as_str().unwrap(), "super");
    }

    #[tokio::test]
    async fn email_off_the_allow_list_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "email": "stranger@apex.test",
                    "password": "passw0rd1",
                    "first_name": "Not",
                    "last_name": "Allowed",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_conflict() {
        let app = TestApp::spawn().await;
        let _token = app.login_super().await;

        let body = json!({
            "email": BOOTSTRAP_EMAIL,
            "password": "an0ther-pass",
            "first_name": "Second",
            "last_name": "Try",
        });
        let res = app.post_without_token(routes::REGISTER, &body).await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"].as_str().unwrap(), "CONFLICT");
    }

    #[tokio::test]
    async fn weak_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "email": BOOTSTRAP_EMAIL,
                    "password": "short",
                    "first_name": "Root",
                    "last_name": "Admin",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        let _token = app.login_super().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({ "email": BOOTSTRAP_EMAIL, "password": "wrong-pass1" }),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"].as_str().unwrap(), "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn me_returns_the_member_behind_the_token() {
        let app = TestApp::spawn().await;
        let token = app.login_super().await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["email"].as_str().unwrap(), BOOTSTRAP_EMAIL);
        assert_eq!(res.body["role"].as_str().unwrap(), "super");
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"].as_str().unwrap(), "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"].as_str().unwrap(), "TOKEN_INVALID");
    }
}

mod sessions {
    use super::*;

    #[tokio::test]
    async fn logout_revokes_the_token_immediately() {
        let app = TestApp::spawn().await;
        let token = app.login_super().await;

        let res = app
            .post_with_token(routes::LOGOUT, &json!({}), &token)
            .await;
        assert_eq!(res.status, 204);

        // The JWT itself is still within its expiry, but the session is gone.
        let res = app.get_with_token(routes::ME, &token).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"].as_str().unwrap(), "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn password_change_revokes_every_outstanding_session() {
        let app = TestApp::spawn().await;
        let first = app.login_super().await;

        // A second login from another device.
        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({ "email": BOOTSTRAP_EMAIL, "password": "sup3r-secret" }),
            )
            .await;
        assert_eq!(res.status, 200);
        let second = res.body["token"].as_str().unwrap().to_string();

        let res = app
            .put_with_token(
                routes::PASSWORD,
                &json!({ "old_password": "sup3r-secret", "new_password": "n3w-secret!" }),
                &first,
            )
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        for token in [&first, &second] {
            let res = app.get_with_token(routes::ME, token).await;
            assert_eq!(res.status, 401);
        }

        // And the new password works.
        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({ "email": BOOTSTRAP_EMAIL, "password": "n3w-secret!" }),
            )
            .await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn password_change_requires_the_current_password() {
        let app = TestApp::spawn().await;
        let token = app.login_super().await;

        let res = app
            .put_with_token(
                routes::PASSWORD,
                &json!({ "old_password": "guess-wrong1", "new_password": "n3w-secret!" }),
                &token,
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"].as_str().unwrap(), "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn email_change_revokes_every_outstanding_session() {
        let app = TestApp::spawn().await;
        let first = app.login_super().await;

        // A second login from another device.
        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({ "email": BOOTSTRAP_EMAIL, "password": "sup3r-secret" }),
            )
            .await;
        assert_eq!(res.status, 200);
        let second = res.body["token"].as_str().unwrap().to_string();

        let res = app
            .put_with_token(
                routes::EMAIL,
                &json!({ "new_email": "renamed@apex.test", "password": "sup3r-secret" }),
                &first,
            )
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        for token in [&first, &second] {
            let res = app.get_with_token(routes::ME, token).await;
            assert_eq!(res.status, 401);
        }

        // The old address no longer logs in; the new one does.
        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({ "email": BOOTSTRAP_EMAIL, "password": "sup3r-secret" }),
            )
            .await;
        assert_eq!(res.status, 401);
        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({ "email": "renamed@apex.test", "password": "sup3r-secret" }),
            )
            .await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn email_change_to_a_taken_address_is_a_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.login_super().await;
        app.allow_email("other@apex.test", &admin).await;
        let token = app.register_and_login("other@apex.test", "passw0rd1").await;

        let res = app
            .put_with_token(
                routes::EMAIL,
                &json!({ "new_email": BOOTSTRAP_EMAIL, "password": "passw0rd1" }),
                &token,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"].as_str().unwrap(), "CONFLICT");

        // A rejected change revokes nothing.
        let res = app.get_with_token(routes::ME, &token).await;
        assert_eq!(res.status, 200);
    }
}

mod profile_picture {
    use super::*;
    use reqwest::Method;

    #[tokio::test]
    async fn upload_then_replace_retires_the_old_asset() {
        let app = TestApp::spawn().await;
        let token = app.login_super().await;

        let res = app
            .multipart_with_token(
                Method::PUT,
                routes::PROFILE_PICTURE,
                &[],
                &[("image", "face.png")],
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let first_id = res.body["profile_picture"]["public_id"]
            .as_str()
            .unwrap()
            .to_string();
        assert_eq!(app.store.len(), 1);

        let res = app
            .multipart_with_token(
                Method::PUT,
                routes::PROFILE_PICTURE,
                &[],
                &[("image", "face2.png")],
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let second_id = res.body["profile_picture"]["public_id"]
            .as_str()
            .unwrap()
            .to_string();

        assert_ne!(first_id, second_id);
        assert_eq!(app.store.len(), 1);
        assert!(!app.store.contains(&first_id));
        assert!(app.store.contains(&second_id));
    }

    #[tokio::test]
    async fn delete_clears_the_record_and_the_asset() {
        let app = TestApp::spawn().await;
        let token = app.login_super().await;

        let res = app
            .multipart_with_token(
                Method::PUT,
                routes::PROFILE_PICTURE,
                &[],
                &[("image", "face.png")],
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.delete_with_token(routes::PROFILE_PICTURE, &token).await;
        assert_eq!(res.status, 204);
        assert!(app.store.is_empty());

        let res = app.get_with_token(routes::ME, &token).await;
        assert!(res.body["profile_picture"].is_null());
    }

    #[tokio::test]
    async fn failed_upload_leaves_no_trace() {
        let app = TestApp::spawn().await;
        let token = app.login_super().await;
        // Spooled uploads all share the temp-file prefix.
        app.store.fail_uploads_matching("apex-upload");

        let res = app
            .multipart_with_token(
                Method::PUT,
                routes::PROFILE_PICTURE,
                &[],
                &[("image", "face.png")],
                &token,
            )
            .await;

        assert_eq!(res.status, 502);
        assert_eq!(res.body["code"].as_str().unwrap(), "UPLOAD_FAILED");
        assert!(app.store.is_empty());

        let res = app.get_with_token(routes::ME, &token).await;
        assert!(res.body["profile_picture"].is_null());
    }
}
