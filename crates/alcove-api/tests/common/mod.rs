#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    routing::post as axum_post,
};
use serde_json::{Value, json};
use tower::ServiceExt;

use alcove_api::auth::{AppState, AppStateInner};
use alcove_api::mailer::Mailer;
use alcove_kv::KvClient;
use alcove_kv::mock::MockKvServer;

/// Captured outbound emails, newest last.
pub type Outbox = Arc<Mutex<Vec<Value>>>;

/// The real router wired to an in-memory store and a mail sink.
pub struct TestApp {
    pub kv_server: MockKvServer,
    pub router: Router,
    pub outbox: Outbox,
}

impl TestApp {
    pub async fn start() -> Self {
        let kv_server = MockKvServer::start().await;
        let (mail_url, outbox) = start_mail_sink().await;
        let mailer = Mailer::new(mail_url, "mail-key", "alcove <auth@alcove.test>");
        let state: AppState = Arc::new(AppStateInner {
            kv: kv_server.client(),
            mailer,
            site_name: "alcove".into(),
        });
        Self {
            router: alcove_api::router(state),
            kv_server,
            outbox,
        }
    }

    /// Direct store access for seeding and invariant checks.
    pub fn kv(&self) -> KvClient {
        self.kv_server.client()
    }
}

async fn start_mail_sink() -> (reqwest::Url, Outbox) {
    let outbox: Outbox = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/emails", axum_post(capture_email))
        .with_state(outbox.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{}", addr).parse().unwrap(), outbox)
}

async fn capture_email(State(outbox): State<Outbox>, Json(body): Json<Value>) -> Json<Value> {
    outbox.lock().unwrap().push(body);
    Json(json!({ "id": "mock-email" }))
}

pub struct Reply {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

impl Reply {
    pub fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

pub async fn send(
    router: &Router,
    method: &str,
    path: &str,
    ip: &str,
    sid: Option<&str>,
    body: Option<&Value>,
) -> Reply {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header("x-forwarded-for", ip);
    if let Some(sid) = sid {
        builder = builder.header(header::COOKIE, format!("sid={}", sid));
    }
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(v).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply {
        status,
        set_cookie,
        body,
    }
}

pub async fn post(router: &Router, path: &str, ip: &str, sid: Option<&str>, body: Value) -> Reply {
    send(router, "POST", path, ip, sid, Some(&body)).await
}

pub async fn get(router: &Router, path: &str, ip: &str, sid: Option<&str>) -> Reply {
    send(router, "GET", path, ip, sid, None).await
}

/// Session token from a `Set-Cookie: sid=...` reply.
pub fn sid_of(reply: &Reply) -> String {
    let cookie = reply.set_cookie.as_ref().expect("set-cookie header");
    cookie
        .strip_prefix("sid=")
        .expect("sid cookie")
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

/// One-time code from the most recent captured email.
pub fn last_emailed_code(outbox: &Outbox) -> String {
    let mails = outbox.lock().unwrap();
    let html = mails.last().expect("an email was sent")["html"]
        .as_str()
        .expect("html body")
        .to_string();
    let start = html.find("<b>").expect("code marker") + 3;
    let end = html.find("</b>").expect("code marker");
    html[start..end].to_string()
}

/// Full registration handshake; returns the session token the setup step
/// hands out.
pub async fn register(app: &TestApp, ip: &str, email: &str, username: &str, password: &str) -> String {
    let reply = post(
        &app.router,
        "/auth/send-code",
        ip,
        None,
        json!({ "email": email, "password": password }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "send-code: {}", reply.body);

    let code = last_emailed_code(&app.outbox);
    let reply = post(
        &app.router,
        "/auth/verify-code",
        ip,
        None,
        json!({ "email": email, "code": code }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "verify-code: {}", reply.body);

    let reply = post(
        &app.router,
        "/auth/setup",
        ip,
        None,
        json!({ "email": email, "name": "Test User", "username": username }),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "setup: {}", reply.body);
    sid_of(&reply)
}
