//! A stand in for the REST backend. Only implements what the tests need and
//! records what it was sent so tests can inspect it

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_client_core::{storage::MemoryStore, Client, LoginOutcome};
use parking_shared::{
    req_args::LoginReqArgs,
    telemetry::{create_trace_file, get_subscriber, init_subscriber},
    time::{Seconds, Timestamp},
    token::expose_internal::make_unsigned_token,
    uac::Role,
};
use serde_json::{json, Value};
use std::{
    ops::Deref,
    sync::{Arc, LazyLock, Mutex, MutexGuard},
};

pub const TEST_LOGIN: &str = "jerzybem";
pub const TEST_PASSWORD: &str = "P@ssw0rd!";
pub const TOKEN_LIFETIME: Seconds = Seconds::new(900);
pub const PARKING_ID: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";

// Ensure that the `tracing` stack is only initialised once
static TRACING: LazyLock<String> = LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let (file, path) =
            create_trace_file(&std::env::temp_dir(), "client_core_tests").unwrap();
        let subscriber = get_subscriber(subscriber_name, default_filter_level, file);
        init_subscriber(subscriber).unwrap();
        format!("Traces for tests being written to: {path:?}")
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber).unwrap();
        "Traces set to std::io::sink".to_string()
    }
});

pub struct TestApp {
    pub address: String,
    pub core_client: Client,
    pub store: MemoryStore,
    pub stub: Stub,
}

/// State of the stub backend
#[derive(Debug, Clone)]
pub struct Stub {
    inner: Arc<Mutex<StubInner>>,
}

#[derive(Debug)]
pub struct StubInner {
    /// Answer 401 to every authenticated request
    pub reject_tokens: bool,
    pub reject_refresh: bool,
    pub levels: Vec<(Role, bool)>,
    pub etag_version: u32,
    pub first_name: String,
    /// Authorization header of the last parking list request
    pub last_authorization: Option<Option<String>>,
    pub logout_calls: u32,
    pub switched_roles: Vec<String>,
}

/// Empty function for use when a call back isn't needed
pub fn no_cb() {}

pub async fn spawn_app() -> TestApp {
    start_tracing();
    let stub = Stub::new();
    let address = start_stub_in_background(stub.clone()).await;
    let store = MemoryStore::new();
    let core_client = Client::new(address.clone(), Box::new(store.clone()));
    TestApp {
        address,
        core_client,
        store,
        stub,
    }
}

impl TestApp {
    pub fn login_args(&self) -> LoginReqArgs {
        LoginReqArgs::new(TEST_LOGIN, TEST_PASSWORD.into())
    }

    pub async fn login(&self) -> anyhow::Result<LoginOutcome> {
        self.core_client
            .login(self.login_args(), no_cb)
            .await
            .expect("failed to receive on rx")
    }

    pub async fn login_assert(&self) {
        let outcome = self.login().await.expect("failed to login");
        assert!(outcome.is_any_success());
    }

    /// A new client on the same storage as if the app was restarted
    pub fn reload(&self) -> Client {
        Client::new(self.address.clone(), Box::new(self.store.clone()))
    }
}

impl Stub {
    fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StubInner {
                reject_tokens: false,
                reject_refresh: false,
                levels: vec![(Role::Client, true), (Role::Staff, true)],
                etag_version: 1,
                first_name: "Jerzy".to_string(),
                last_authorization: None,
                logout_calls: 0,
                switched_roles: Vec::new(),
            })),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, StubInner> {
        self.inner.lock().unwrap()
    }
}

impl StubInner {
    fn etag(&self) -> String {
        format!("\"v{}\"", self.etag_version)
    }

    fn account(&self) -> Value {
        let levels: Vec<Value> = self
            .levels
            .iter()
            .map(|(level, active)| json!({"level": level, "active": active}))
            .collect();
        json!({
            "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
            "login": TEST_LOGIN,
            "email": "jerzy.bem@example.com",
            "firstName": self.first_name,
            "lastName": "Bem",
            "phoneNumber": "123456789",
            "userLevels": levels,
            "active": true,
            "blocked": false,
            "verified": true
        })
    }
}

fn start_tracing() {
    // Accessing TRACING also forces the LazyLock to initialize
    let logging_msg = TRACING.deref();
    println!("{logging_msg}");
}

async fn start_stub_in_background(stub: Stub) -> String {
    let router = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh-token", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/accounts/me", get(own_account).put(update_own_account))
        .route("/accounts/me/user-level/{role}", post(switch_role))
        .route("/accounts/register/client", post(register))
        .route("/parking", get(parkings))
        .route("/reservations/{id}", get(reservation))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://127.0.0.1:{port}")
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn issue_tokens(refresh_token: &str) -> Response {
    let token = make_unsigned_token(TEST_LOGIN, Timestamp::now() + TOKEN_LIFETIME);
    Json(json!({ "token": token, "refreshToken": refresh_token })).into_response()
}

/// `None` if the request may proceed
fn check_bearer(stub: &StubInner, headers: &HeaderMap) -> Option<Response> {
    let has_bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("Bearer "));
    (stub.reject_tokens || !has_bearer).then(|| StatusCode::UNAUTHORIZED.into_response())
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["login"] == TEST_LOGIN && body["password"] == TEST_PASSWORD {
        issue_tokens("r1")
    } else {
        error_response(StatusCode::UNAUTHORIZED, "error.invalid.credentials")
    }
}

async fn refresh(State(stub): State<Stub>, Json(body): Json<Value>) -> Response {
    let stub = stub.lock();
    if stub.reject_refresh || body["refreshToken"] != "r1" {
        error_response(StatusCode::BAD_REQUEST, "error.token.invalid")
    } else {
        issue_tokens("r2")
    }
}

async fn logout(State(stub): State<Stub>) -> StatusCode {
    stub.lock().logout_calls += 1;
    StatusCode::NO_CONTENT
}

async fn own_account(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    let stub = stub.lock();
    if let Some(rejection) = check_bearer(&stub, &headers) {
        return rejection;
    }
    ([(header::ETAG, stub.etag())], Json(stub.account())).into_response()
}

async fn update_own_account(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut stub = stub.lock();
    if let Some(rejection) = check_bearer(&stub, &headers) {
        return rejection;
    }
    let if_match = headers
        .get(header::IF_MATCH)
        .and_then(|value| value.to_str().ok());
    if if_match != Some(stub.etag().as_str()) {
        return error_response(StatusCode::PRECONDITION_FAILED, "error.optimistic.lock");
    }
    stub.first_name = body["firstName"].as_str().unwrap_or_default().to_string();
    stub.etag_version += 1;
    ([(header::ETAG, stub.etag())], Json(stub.account())).into_response()
}

async fn switch_role(
    State(stub): State<Stub>,
    Path(role): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut stub = stub.lock();
    if let Some(rejection) = check_bearer(&stub, &headers) {
        return rejection;
    }
    stub.switched_roles.push(role);
    StatusCode::NO_CONTENT.into_response()
}

async fn register() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "message": "error.validation",
            "violations": ["login.size", "phone.number.format"]
        })),
    )
        .into_response()
}

async fn parkings(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    let mut stub = stub.lock();
    stub.last_authorization = Some(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    );
    if stub.reject_tokens && headers.contains_key(header::AUTHORIZATION) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([{
        "id": PARKING_ID,
        "city": "Łódź",
        "zipCode": "90-924",
        "street": "Wólczańska 215",
        "strategy": "LEAST_OCCUPIED",
        "sectors": [{
            "id": "0f8fad5b-d9cb-469f-a165-70867728950f",
            "parkingId": PARKING_ID,
            "name": "A-01",
            "type": "COVERED",
            "maxPlaces": 20,
            "weight": 1,
            "occupiedPlaces": 5,
            "active": true
        }]
    }]))
    .into_response()
}

async fn reservation(Path(_id): Path<String>) -> Response {
    error_response(StatusCode::NOT_FOUND, "error.reservation.not.found")
}
