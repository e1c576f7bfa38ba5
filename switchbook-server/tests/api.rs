use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use switchbook_catalog::types::Role;
use switchbook_db::{insert_manufacturer, open_memory};
use switchbook_moderation::{EmailMessage, create_account};
use switchbook_server::config::SmtpConfig;
use switchbook_server::{AppState, Mailer, ServerConfig, hash_password, router};
use tower::ServiceExt;

struct TestApp {
    app: Router,
    state: AppState,
    outbox: Arc<Mutex<Vec<EmailMessage>>>,
}

struct Reply {
    status: StatusCode,
    body: Value,
    cookie: Option<String>,
}

impl TestApp {
    fn new() -> Self {
        let (mailer, outbox) = Mailer::outbox();
        Self::with_mailer(mailer, outbox)
    }

    fn with_mailer(mailer: Mailer, outbox: Arc<Mutex<Vec<EmailMessage>>>) -> Self {
        let conn = open_memory().unwrap();
        insert_manufacturer(&conn, "Gateron", true, None).unwrap();
        let state = AppState::new(conn, ServerConfig::default(), mailer);
        Self {
            app: router(state.clone()),
            state,
            outbox,
        }
    }

    async fn call(&self, method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Reply {
            status,
            body,
            cookie,
        }
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Reply {
        self.call(Method::GET, uri, cookie, None).await
    }

    async fn post(&self, uri: &str, cookie: Option<&str>, body: Value) -> Reply {
        self.call(Method::POST, uri, cookie, Some(body)).await
    }

    /// Register through the API and return the session cookie.
    async fn register(&self, username: &str) -> String {
        let reply = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "password123",
                }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.cookie.unwrap()
    }

    /// Create an admin directly in the database and log in as them.
    async fn admin(&self) -> String {
        let hash = hash_password("adminpass1").unwrap();
        {
            let conn = self.state.db().unwrap();
            create_account(&conn, "root", "root@example.com", &hash, Role::Admin).unwrap();
        }
        let reply = self
            .post(
                "/api/auth/login",
                None,
                json!({"login": "root", "password": "adminpass1"}),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        reply.cookie.unwrap()
    }

    async fn submit(&self, cookie: &str, name: &str) -> String {
        let reply = self
            .post(
                "/api/master-switches",
                Some(cookie),
                json!({"name": name, "manufacturer": "gateron", "type": "LINEAR", "actuation_force": 45.0}),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.body["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn health_check() {
    let app = TestApp::new();
    let reply = app.get("/health", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, Value::String("ok".to_string()));
}

#[tokio::test]
async fn register_login_and_logout() {
    let app = TestApp::new();
    let cookie = app.register("alice").await;
    assert!(cookie.starts_with("switchbook_session="));

    let me = app.get("/api/auth/me", Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["username"], "alice");
    assert!(me.body.get("password_hash").is_none());

    assert_eq!(app.get("/api/auth/me", None).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.get("/api/auth/me", Some("switchbook_session=bogus")).await.status,
        StatusCode::UNAUTHORIZED
    );

    let wrong = app
        .post("/api/auth/login", None, json!({"login": "alice", "password": "nope-nope"}))
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["error"], "Invalid username or password");

    let by_email = app
        .post(
            "/api/auth/login",
            None,
            json!({"login": "ALICE@example.com", "password": "password123"}),
        )
        .await;
    assert_eq!(by_email.status, StatusCode::OK);

    let logout = app.post("/api/auth/logout", Some(&cookie), json!({})).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(app.get("/api/auth/me", Some(&cookie)).await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_errors() {
    let app = TestApp::new();
    app.register("alice").await;

    let duplicate = app
        .post(
            "/api/auth/register",
            None,
            json!({"username": "Alice", "email": "other@example.com", "password": "password123"}),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let short = app
        .post(
            "/api/auth/register",
            None,
            json!({"username": "bob", "email": "bob@example.com", "password": "short"}),
        )
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert!(short.body["error"].is_string());
}

#[tokio::test]
async fn forgot_password_always_succeeds() {
    let app = TestApp::new();
    app.register("alice").await;

    let unknown = app
        .post("/api/auth/forgot-password", None, json!({"email": "nobody@example.com"}))
        .await;
    assert_eq!(unknown.status, StatusCode::OK);
    assert!(app.outbox.lock().unwrap().is_empty());

    let known = app
        .post("/api/auth/forgot-password", None, json!({"email": "alice@example.com"}))
        .await;
    assert_eq!(known.status, StatusCode::OK);
    assert_eq!(unknown.body, known.body);

    let email = app.outbox.lock().unwrap()[0].clone();
    assert_eq!(email.to, "alice@example.com");
    let token = email
        .body
        .split("token=")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap()
        .to_string();

    let reset = app
        .post(
            "/api/auth/reset-password",
            None,
            json!({"token": token, "password": "newpassword1"}),
        )
        .await;
    assert_eq!(reset.status, StatusCode::OK);
    let reused = app
        .post(
            "/api/auth/reset-password",
            None,
            json!({"token": token, "password": "newpassword2"}),
        )
        .await;
    assert_eq!(reused.status, StatusCode::BAD_REQUEST);

    let login = app
        .post("/api/auth/login", None, json!({"login": "alice", "password": "newpassword1"}))
        .await;
    assert_eq!(login.status, StatusCode::OK);
}

#[tokio::test]
async fn approve_submission_contract() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let admin = app.admin().await;
    let id = app.submit(&alice, "Oil King").await;
    let approve = format!("/api/admin/master-switches/{id}/approve");

    let anonymous = app.post(&approve, None, json!({})).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    let not_admin = app.post(&approve, Some(&alice), json!({})).await;
    assert_eq!(not_admin.status, StatusCode::UNAUTHORIZED);

    let ok = app.post(&approve, Some(&admin), json!({})).await;
    assert_eq!(ok.status, StatusCode::OK, "{}", ok.body);
    assert_eq!(ok.body["status"], "APPROVED");
    assert_eq!(ok.body["version"], 1);
    assert_eq!(ok.body["manufacturer"], "Gateron");

    let again = app.post(&approve, Some(&admin), json!({})).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    let unknown = app
        .post("/api/admin/master-switches/no-such-id/approve", Some(&admin), json!({}))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let sent = app.outbox.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "alice@example.com");
    assert!(sent[0].body.contains(&format!("http://localhost:3000/master-switches/{id}")));

    let notes = app.get("/api/notifications/unread-count", Some(&alice)).await;
    assert_eq!(notes.body["count"], 1);
}

#[tokio::test]
async fn failed_email_does_not_fail_approval() {
    // Nothing listens on port 1, so every send fails
    let smtp = SmtpConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        username: None,
        password: None,
        from: "switchbook@example.com".to_string(),
    };
    let mailer = Mailer::from_config(Some(&smtp)).unwrap();
    let app = TestApp::with_mailer(mailer, Arc::default());
    let alice = app.register("alice").await;
    let admin = app.admin().await;
    let id = app.submit(&alice, "Oil King").await;

    let ok = app
        .post(&format!("/api/admin/master-switches/{id}/approve"), Some(&admin), json!({}))
        .await;
    assert_eq!(ok.status, StatusCode::OK, "{}", ok.body);
    assert_eq!(ok.body["status"], "APPROVED");
    assert_eq!(ok.body["version"], 1);

    let notes = app.get("/api/notifications/unread-count", Some(&alice)).await;
    assert_eq!(notes.body["count"], 1);
}

#[tokio::test]
async fn admin_queues_reject_unknown_status() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let admin = app.admin().await;
    let id = app.submit(&alice, "Oil King").await;

    for uri in ["/api/admin/master-switches?status=bogus", "/api/admin/edits?status=bogus"] {
        let reply = app.get(uri, Some(&admin)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(reply.body["error"].as_str().unwrap().contains("bogus"));
    }

    let pending = app.get("/api/admin/master-switches", Some(&admin)).await;
    assert_eq!(pending.body.as_array().unwrap().len(), 1);
    let approved = app
        .get("/api/admin/master-switches?status=approved", Some(&admin))
        .await;
    assert_eq!(approved.status, StatusCode::OK);
    assert!(approved.body.as_array().unwrap().is_empty());
    let all = app.get("/api/admin/master-switches?status=all", Some(&admin)).await;
    assert_eq!(all.body.as_array().unwrap()[0]["id"], id.as_str());

    let edits = app
        .get(&format!("/api/master-switches/{id}/edits?status=bogus"), Some(&alice))
        .await;
    assert_eq!(edits.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reject_records_reason() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let admin = app.admin().await;
    let id = app.submit(&alice, "Oil King").await;

    let queue = app.get("/api/admin/master-switches", Some(&admin)).await;
    assert_eq!(queue.body.as_array().unwrap().len(), 1);

    let reply = app
        .post(
            &format!("/api/admin/master-switches/{id}/reject"),
            Some(&admin),
            json!({"reason": "Duplicate"}),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "REJECTED");
    assert_eq!(reply.body["rejection_reason"], "Duplicate");
    assert_eq!(reply.body["version"], 0);

    let pending = app.get("/api/admin/master-switches", Some(&admin)).await;
    assert!(pending.body.as_array().unwrap().is_empty());
    let all = app.get("/api/admin/master-switches?status=all", Some(&admin)).await;
    assert_eq!(all.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn pending_records_are_hidden_from_browsing() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let admin = app.admin().await;
    let pending = app.submit(&alice, "Ink Black").await;
    let approved = app.submit(&alice, "Oil King").await;
    app.post(
        &format!("/api/admin/master-switches/{approved}/approve"),
        Some(&admin),
        json!({}),
    )
    .await;

    let page = app.get("/api/master-switches?sort=popular&limit=500", None).await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["total"], 1);
    assert_eq!(page.body["limit"], 100);
    assert_eq!(page.body["items"][0]["id"], approved.as_str());

    let bad_sort = app.get("/api/master-switches?sort=sideways", None).await;
    assert_eq!(bad_sort.status, StatusCode::BAD_REQUEST);

    let path = format!("/api/master-switches/{pending}");
    assert_eq!(app.get(&path, None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get(&path, Some(&bob)).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get(&path, Some(&alice)).await.status, StatusCode::OK);
    assert_eq!(app.get(&path, Some(&admin)).await.status, StatusCode::OK);

    let viewed = app.get(&format!("/api/master-switches/{approved}"), None).await;
    assert_eq!(viewed.body["view_count"], 1);
}

#[tokio::test]
async fn edit_suggestion_flow() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let admin = app.admin().await;
    let id = app.submit(&alice, "Oil King").await;
    app.post(&format!("/api/admin/master-switches/{id}/approve"), Some(&admin), json!({}))
        .await;

    let edits = format!("/api/master-switches/{id}/edits");
    let empty = app.post(&edits, Some(&alice), json!({"actuation_force": 45.0})).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let edit = app.post(&edits, Some(&alice), json!({"actuation_force": 50.0})).await;
    assert_eq!(edit.status, StatusCode::CREATED, "{}", edit.body);
    assert_eq!(edit.body["changed_fields"], json!(["actuation_force"]));
    let edit_id = edit.body["id"].as_str().unwrap().to_string();

    let listed = app.get(&edits, None).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);

    let approved = app
        .post(&format!("/api/admin/edits/{edit_id}/approve"), Some(&admin), json!({}))
        .await;
    assert_eq!(approved.status, StatusCode::OK, "{}", approved.body);
    assert_eq!(approved.body["master_version"], 2);

    let master = app.get(&format!("/api/master-switches/{id}"), None).await;
    assert_eq!(master.body["actuation_force"], 50.0);
    assert_eq!(master.body["version"], 2);
}

#[tokio::test]
async fn collection_is_private_and_shareable() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;

    let created = app
        .post(
            "/api/switches",
            Some(&alice),
            json!({"name": "Yellow", "manufacturer": "GATERON", "quantity": 70, "personal_notes": "secret"}),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert_eq!(created.body["manufacturer"], "Gateron");
    let path = format!("/api/switches/{}", created.body["id"]);

    assert_eq!(app.get(&path, Some(&alice)).await.status, StatusCode::OK);
    assert_eq!(app.get(&path, Some(&bob)).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/api/switches", None).await.status, StatusCode::UNAUTHORIZED);

    let filtered = app.get("/api/switches?type=tactile", Some(&alice)).await;
    assert!(filtered.body.as_array().unwrap().is_empty());
    let bad_type = app.get("/api/switches?type=sideways", Some(&alice)).await;
    assert_eq!(bad_type.status, StatusCode::BAD_REQUEST);

    let me = app.get("/api/auth/me", Some(&alice)).await;
    let shareable_id = me.body["shareable_id"].as_str().unwrap().to_string();
    let shared = app.get(&format!("/api/share/{shareable_id}"), None).await;
    assert_eq!(shared.status, StatusCode::OK);
    assert_eq!(shared.body["username"], "alice");
    assert_eq!(shared.body["total_switches"], 70);
    assert!(shared.body["switches"][0].get("personal_notes").is_none());
    assert!(shared.body.get("email").is_none());

    let regenerated = app.post("/api/user/shareable-id", Some(&alice), json!({})).await;
    let fresh = regenerated.body["shareable_id"].as_str().unwrap();
    assert_ne!(fresh, shareable_id);
    assert_eq!(
        app.get(&format!("/api/share/{shareable_id}"), None).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(app.get("/api/share/short", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn csv_import_and_export() {
    let app = TestApp::new();
    let alice = app.register("alice").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/switches/import")
        .header(header::COOKIE, &alice)
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from("name,manufacturer,quantity\nYellow,gateron,70\n,Gateron,5\n"))
        .unwrap();
    let response = app.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let report: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(report["created"], 1);
    assert_eq!(report["errors"][0]["line"], 3);

    let request = Request::builder()
        .uri("/api/switches/export")
        .header(header::COOKIE, &alice)
        .body(Body::empty())
        .unwrap();
    let response = app.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("Yellow"));
    assert!(text.contains("Gateron"));
}

#[tokio::test]
async fn admin_user_management() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let admin = app.admin().await;

    assert_eq!(app.get("/api/admin/users", Some(&alice)).await.status, StatusCode::UNAUTHORIZED);
    let users = app.get("/api/admin/users", Some(&admin)).await;
    assert_eq!(users.body.as_array().unwrap().len(), 2);
    let alice_id = users.body.as_array().unwrap()
        .iter()
        .find(|u| u["username"] == "alice")
        .map(|u| u["id"].clone())
        .unwrap();

    let promoted = app
        .call(
            Method::PUT,
            &format!("/api/admin/users/{alice_id}/role"),
            Some(&admin),
            Some(json!({"role": "ADMIN"})),
        )
        .await;
    assert_eq!(promoted.status, StatusCode::OK);
    assert_eq!(promoted.body["role"], "ADMIN");
    assert_eq!(app.get("/api/admin/stats", Some(&alice)).await.status, StatusCode::OK);
}
