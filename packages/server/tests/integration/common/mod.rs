use std::net::SocketAddr;
use std::sync::Arc;

use common::storage::InMemoryObjectStore;
use reqwest::Client;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, SessionSweepConfig,
    StorageConfig,
};
use server::seed::seed_bootstrap_email;
use server::state::AppState;

/// Email seeded into the allow list for the first privileged login.
pub const BOOTSTRAP_EMAIL: &str = "root@apex.test";

pub mod routes {
    pub const REGISTER: &str = "/api/v1/auth/register";
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const LOGOUT: &str = "/api/v1/auth/logout";
    pub const ME: &str = "/api/v1/auth/me";
    pub const PASSWORD: &str = "/api/v1/auth/password";
    pub const EMAIL: &str = "/api/v1/auth/email";
    pub const PROFILE_PICTURE: &str = "/api/v1/members/me/profile-picture";
    pub const TEAMS: &str = "/api/v1/teams";
    pub const SPONSORS: &str = "/api/v1/sponsors";
    pub const GALLERY: &str = "/api/v1/gallery";
    pub const ALLOWED_MEMBERS: &str = "/api/v1/admin/allowed-members";
    pub const MEMBERS: &str = "/api/v1/admin/members";

    pub fn team(id: i64) -> String {
        format!("/api/v1/teams/{id}")
    }

    pub fn gallery_item(id: i64) -> String {
        format!("/api/v1/gallery/{id}")
    }

    pub fn member(id: i64) -> String {
        format!("/api/v1/admin/members/{id}")
    }

    pub fn member_team(id: i64) -> String {
        format!("/api/v1/admin/members/{id}/team")
    }

    pub fn member_role(id: i64) -> String {
        format!("/api/v1/admin/members/{id}/role")
    }
}

/// A running test server backed by a throwaway sqlite file and an in-memory
/// object store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub store: Arc<InMemoryObjectStore>,
    _data_dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let data_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = data_dir.path().join("test.sqlite");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let db = server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize test database");

        seed_bootstrap_email(&db, Some(BOOTSTRAP_EMAIL))
            .await
            .expect("Failed to seed bootstrap email");

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: db_url.clone(),
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                token_ttl_hours: 24,
                bootstrap_email: Some(BOOTSTRAP_EMAIL.to_string()),
            },
            storage: StorageConfig {
                backend: "memory".to_string(),
                bucket: String::new(),
                region: String::new(),
                endpoint: String::new(),
                access_key: String::new(),
                secret_key: String::new(),
                public_base_url: String::new(),
                timeout_secs: 5,
                max_upload_size: 4 * 1024 * 1024,
            },
            session_sweep: SessionSweepConfig {
                interval_secs: 3600,
            },
        };

        let store = Arc::new(InMemoryObjectStore::new());
        let state = AppState::new(db.clone(), store.clone(), config);
        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            store,
            _data_dir: data_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Send a multipart request with text fields plus `(field_name, file_name)`
    /// image parts.
    pub async fn multipart_with_token(
        &self,
        method: reqwest::Method,
        path: &str,
        fields: &[(&str, &str)],
        files: &[(&str, &str)],
        token: &str,
    ) -> TestResponse {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in fields {
            form = form.text(name.to_string(), value.to_string());
        }
        for (field, file_name) in files {
            let part = reqwest::multipart::Part::bytes(fake_png())
                .file_name(file_name.to_string())
                .mime_str("image/png")
                .expect("Failed to set MIME type");
            form = form.part(field.to_string(), part);
        }

        let res = self
            .client
            .request(method, self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    /// Put an email on the allow list using an admin token.
    pub async fn allow_email(&self, email: &str, admin_token: &str) {
        let res = self
            .post_with_token(
                routes::ALLOWED_MEMBERS,
                &serde_json::json!({ "email": email }),
                admin_token,
            )
            .await;
        assert_eq!(res.status, 201, "Allow-list add failed: {}", res.text);
    }

    /// Register an allow-listed email and log in, returning the auth token.
    pub async fn register_and_login(&self, email: &str, password: &str) -> String {
        let reg = self
            .post_without_token(
                routes::REGISTER,
                &serde_json::json!({
                    "email": email,
                    "password": password,
                    "first_name": "Test",
                    "last_name": "Member",
                }),
            )
            .await;
        assert_eq!(reg.status, 201, "Registration failed: {}", reg.text);

        let res = self
            .post_without_token(
                routes::LOGIN,
                &serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        res.body["token"]
            .as_str()
            .expect("Login response has no token")
            .to_string()
    }

    /// Register and log in the bootstrap email, which carries the `super`
    /// role. Most mutating endpoints need this token.
    pub async fn login_super(&self) -> String {
        self.register_and_login(BOOTSTRAP_EMAIL, "sup3r-secret").await
    }
}

/// Minimal bytes standing in for an image upload; the store never inspects
/// content.
fn fake_png() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    bytes.extend_from_slice(&[0u8; 64]);
    bytes
}
