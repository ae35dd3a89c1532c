//! RPC surface integration tests
//!
//! Starts the HTTP server on an ephemeral port backed by the in-memory
//! backend and calls it over the wire.

use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use enaa::auth::TokenIssuer;
use enaa::backend::{IdentityProvider, MemoryBackend};
use enaa::rpc::{procedures, ServerState};
use enaa::schema::{GradeLevel, UserRole};

const PASSWORD: &str = "secret-42";

struct TestServer {
    addr: SocketAddr,
    backend: Arc<MemoryBackend>,
    http: reqwest::Client,
}

impl TestServer {
    async fn start() -> Self {
        let backend = Arc::new(MemoryBackend::new(
            TokenIssuer::new("integration-secret-that-is-long-enough!!", 3600).unwrap(),
        ));
        backend
            .seed_account("prof@ecole.fr", PASSWORD, UserRole::Teacher, "M. Petit", None)
            .unwrap();
        backend
            .seed_account(
                "eleve@ecole.fr",
                PASSWORD,
                UserRole::Student,
                "Léa",
                Some(GradeLevel::Cp),
            )
            .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(ServerState::new(backend.clone(), procedures::router(), true));
        tokio::spawn(enaa::serve(listener, state));

        Self {
            addr,
            backend,
            http: reqwest::Client::new(),
        }
    }

    async fn token(&self, email: &str) -> String {
        self.backend
            .sign_in_with_password(email, PASSWORD)
            .await
            .unwrap()
            .access_token
    }

    async fn call(&self, procedure: &str, token: Option<&str>) -> (u16, Value) {
        let mut request = self
            .http
            .post(format!("http://{}/rpc/{}", self.addr, procedure))
            .json(&json!(null));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;
    let body: Value = server
        .http
        .get(format!("http://{}/health", server.addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["healthy"], true);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["mode"], "development");
}

#[tokio::test]
async fn test_session_get_is_public() {
    let server = TestServer::start().await;

    let (status, body) = server.call("session.get", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["data"]["user"], Value::Null);

    let token = server.token("eleve@ecole.fr").await;
    let (status, body) = server.call("session.get", Some(&token)).await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["data"]["user"]["email"], "eleve@ecole.fr");
}

#[tokio::test]
async fn test_no_session_is_unauthorized_even_for_role_gates() {
    let server = TestServer::start().await;

    for procedure in ["profile.me", "modules.mvp", "config.grade"] {
        let (status, body) = server.call(procedure, None).await;
        assert_eq!(status, 401, "{}", procedure);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED", "{}", procedure);
    }
}

#[tokio::test]
async fn test_invalid_token_fails_open_to_unauthorized() {
    let server = TestServer::start().await;

    let (status, body) = server.call("profile.me", Some("not-a-jwt")).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_wrong_role_is_forbidden() {
    let server = TestServer::start().await;

    let student = server.token("eleve@ecole.fr").await;
    let (status, body) = server.call("modules.mvp", Some(&student)).await;
    assert_eq!(status, 403);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let teacher = server.token("prof@ecole.fr").await;
    let (status, body) = server.call("config.grade", Some(&teacher)).await;
    assert_eq!(status, 403);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, body) = server.call("modules.mvp", Some(&teacher)).await;
    assert_eq!(status, 200);
    assert!(body["result"]["data"].as_array().is_some());
}

#[tokio::test]
async fn test_student_gets_own_grade_config() {
    let server = TestServer::start().await;
    let student = server.token("eleve@ecole.fr").await;

    let (status, body) = server.call("config.grade", Some(&student)).await;
    assert_eq!(status, 200);
    assert_eq!(body["result"]["data"]["gradeLevel"], "CP");
    assert_eq!(body["result"]["data"]["config"]["sessionDuration"], 15);
}

#[tokio::test]
async fn test_unknown_procedure_and_route() {
    let server = TestServer::start().await;

    let (status, body) = server.call("does.not.exist", None).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let response = server
        .http
        .get(format!("http://{}/nowhere", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let server = TestServer::start().await;

    let response = server
        .http
        .post(format!("http://{}/rpc/session.get", server.addr))
        .header("content-type", "application/json")
        .body("{oops")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}
