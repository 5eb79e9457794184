use anyhow::Context as _;
use closure_traits::{ChannelCallBack, ChannelCallBackOutput};
use futures::channel::oneshot;
use parking_shared::{
    const_config::path::PathSpec,
    errors::ApiError,
    req_args::PageRequest,
    time::Timestamp,
    uac::{Account, Session},
};
use reqwest::{header, Method};
use secrecy::{ExposeSecret as _, SecretString};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::{
    session::{LogoutReason, SessionChange, SessionState},
    storage::{KeyValueStore, PersistentState},
};

pub mod api;
pub mod auth;

/// Use when a request has no arguments
pub const NO_ARGS: Option<&()> = None;

#[derive(Debug, Clone)]
pub struct Client {
    api_client: reqwest::Client,
    inner: Arc<Mutex<ClientInner>>,
    session: SessionState,
}

#[derive(Debug)]
struct ClientInner {
    server_address: String,
    storage: PersistentState,
}

/// A request ready to be sent
#[derive(Debug)]
struct Outgoing {
    request: reqwest::RequestBuilder,
    /// The bearer token attached, if any
    sent_token: Option<SecretString>,
}

impl Outgoing {
    /// A 401 then means the session is over
    fn was_authenticated(&self) -> bool {
        self.sent_token.is_some()
    }

    fn if_match(mut self, etag: Option<String>) -> Self {
        if let Some(etag) = etag {
            self.request = self.request.header(header::IF_MATCH, etag);
        }
        self
    }
}

impl ClientInner {
    #[tracing::instrument(skip(storage))]
    fn new(server_address: String, storage: PersistentState) -> Self {
        Self {
            server_address,
            storage,
        }
    }
}

impl Client {
    /// Creates the client and restores any session saved in `store` that is
    /// still valid
    #[tracing::instrument(name = "NEW CLIENT-CORE", skip(store))]
    pub fn new(server_address: String, store: Box<dyn KeyValueStore>) -> Self {
        let api_client = reqwest::Client::builder()
            .build()
            .expect("Unable to create reqwest client");
        let storage = PersistentState::new(store);
        let session = SessionState::default();
        if let Some(stored) = storage.load_session(Timestamp::now()) {
            let expires_at = stored.session.expires_at;
            info!(login = %stored.session.login, %expires_at, "restored session");
            session.set(
                Some(stored.session),
                Some(stored.account),
                stored.etag,
                SessionChange::Restored { expires_at },
            );
        }
        Self {
            api_client,
            inner: Arc::new(Mutex::new(ClientInner::new(server_address, storage))),
            session,
        }
    }

    /// Handle to observe or read the session
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn current_session(&self) -> Option<Arc<Session>> {
        self.session.current()
    }

    pub fn account(&self) -> Option<Arc<Account>> {
        self.session.account()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    pub fn page_request(&self) -> PageRequest {
        self.with_storage(PersistentState::page_request)
    }

    pub fn save_page_request(&self, page: &PageRequest) {
        self.with_storage(|storage| storage.save_page_request(page))
    }

    fn with_storage<R>(&self, f: impl FnOnce(&PersistentState) -> R) -> R {
        f(&self.inner.lock().expect("client-core mutex poisoned").storage)
    }

    /// Removes the local credentials and tells observers why. Does nothing
    /// if there was no session
    #[tracing::instrument(skip(self))]
    fn clear_local_session(&self, reason: LogoutReason) {
        self.with_storage(PersistentState::clear_session);
        if self.session.current().is_some() || self.session.account().is_some() {
            self.session
                .set(None, None, None, SessionChange::LoggedOut(reason));
        }
    }

    /// Ends the session when the server no longer accepts the token
    ///
    /// Only applies if `sent_token` is still the current token. A rejection
    /// arriving after a refresh or a new login is ignored
    fn end_session_if_expired<T>(
        &self,
        result: &anyhow::Result<T>,
        sent_token: Option<&SecretString>,
    ) {
        let Err(err) = result else {
            return;
        };
        if !err
            .downcast_ref::<ApiError>()
            .is_some_and(ApiError::is_session_expired)
        {
            return;
        }
        let current = self.with_storage(PersistentState::token);
        let is_current = sent_token
            .zip(current.as_ref())
            .is_some_and(|(sent, current)| sent.expose_secret() == current.expose_secret());
        if is_current {
            info!("server rejected the token");
            self.clear_local_session(LogoutReason::Expired);
        } else {
            debug!("ignoring rejection of a token that was already replaced");
        }
    }

    /// Builds the request, attaching the stored access token if there is one
    ///
    /// `args` are sent as the query for GET and DELETE and as a json body
    /// otherwise
    #[tracing::instrument(skip(self, args))]
    // WARNING: Must skip args as it may contain sensitive info
    fn build_request<T>(&self, path_spec: PathSpec, params: &[&str], args: Option<&T>) -> Outgoing
    where
        T: serde::Serialize + ?Sized,
    {
        let token = self.with_storage(PersistentState::token);
        self.build_request_with_token(path_spec, params, args, token.as_ref())
    }

    /// Builds the request without credentials even if some are stored
    fn build_anonymous_request<T>(
        &self,
        path_spec: PathSpec,
        params: &[&str],
        args: Option<&T>,
    ) -> Outgoing
    where
        T: serde::Serialize + ?Sized,
    {
        self.build_request_with_token(path_spec, params, args, None)
    }

    fn build_request_with_token<T>(
        &self,
        path_spec: PathSpec,
        params: &[&str],
        args: Option<&T>,
        token: Option<&SecretString>,
    ) -> Outgoing
    where
        T: serde::Serialize + ?Sized,
    {
        let args_in_query = matches!(path_spec.method, Method::GET | Method::DELETE);
        let url = self.path_to_url(&path_spec.fill(params));
        let mut request = self.api_client.request(path_spec.method, url);
        if let Some(args) = args {
            request = if args_in_query {
                request.query(args)
            } else {
                request.json(args)
            };
        }
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        Outgoing {
            request,
            sent_token: token.cloned(),
        }
    }

    fn initiate_request<F, O>(&self, outgoing: Outgoing, on_done: F)
    where
        F: ChannelCallBack<O>,
        O: ChannelCallBackOutput,
    {
        reqwest_cross::fetch(outgoing.request, on_done)
    }

    fn send_request_expect_json<F, T, U>(
        &self,
        path_spec: PathSpec,
        params: &[&str],
        args: Option<&T>,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<U>>
    where
        T: serde::Serialize + ?Sized,
        F: UiCallBack,
        U: Send + Debug + serde::de::DeserializeOwned + 'static,
    {
        let outgoing = self.build_request(path_spec, params, args);
        self.send_expect_json(outgoing, ui_notify)
    }

    fn send_expect_json<F, U>(
        &self,
        outgoing: Outgoing,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<U>>
    where
        F: UiCallBack,
        U: Send + Debug + serde::de::DeserializeOwned + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let was_authenticated = outgoing.was_authenticated();
        let sent_token = outgoing.sent_token.clone();
        let client = self.clone();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            let msg = process_json_body(resp, was_authenticated).await;
            client.end_session_if_expired(&msg, sent_token.as_ref());
            send_to_ui(tx, msg);
            ui_notify();
        };
        self.initiate_request(outgoing, on_done);
        rx
    }

    fn send_expect_json_with_etag<F, U>(
        &self,
        outgoing: Outgoing,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<(U, Option<String>)>>
    where
        F: UiCallBack,
        U: Send + Debug + serde::de::DeserializeOwned + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let was_authenticated = outgoing.was_authenticated();
        let sent_token = outgoing.sent_token.clone();
        let client = self.clone();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            let msg = process_json_with_etag(resp, was_authenticated).await;
            client.end_session_if_expired(&msg, sent_token.as_ref());
            send_to_ui(tx, msg);
            ui_notify();
        };
        self.initiate_request(outgoing, on_done);
        rx
    }

    fn send_request_expect_empty<F, T>(
        &self,
        path_spec: PathSpec,
        params: &[&str],
        args: Option<&T>,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>>
    where
        T: serde::Serialize + ?Sized,
        F: UiCallBack,
    {
        let outgoing = self.build_request(path_spec, params, args);
        self.send_expect_empty(outgoing, ui_notify)
    }

    fn send_expect_empty<F>(
        &self,
        outgoing: Outgoing,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>>
    where
        F: UiCallBack,
    {
        let (tx, rx) = oneshot::channel();
        let was_authenticated = outgoing.was_authenticated();
        let sent_token = outgoing.sent_token.clone();
        let client = self.clone();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            let msg = process_empty(resp, was_authenticated).await;
            client.end_session_if_expired(&msg, sent_token.as_ref());
            send_to_ui(tx, msg);
            ui_notify();
        };
        self.initiate_request(outgoing, on_done);
        rx
    }

    /// Sends without waiting for the outcome, failures are only logged
    fn send_no_wait(&self, outgoing: Outgoing) {
        let was_authenticated = outgoing.was_authenticated();
        self.initiate_request(outgoing, move |resp| async move {
            parking_shared::log_err_as_warn!(process_empty(resp, was_authenticated).await);
        });
    }

    #[tracing::instrument(skip(self), ret)]
    fn path_to_url(&self, path: &str) -> String {
        format!(
            "{}{path}",
            &self
                .inner
                .lock()
                .expect("failed to unlock client mutex")
                .server_address
        )
    }
}

/// The page may have been closed while the request was in flight
fn send_to_ui<T>(tx: oneshot::Sender<anyhow::Result<T>>, msg: anyhow::Result<T>) {
    if tx.send(msg).is_err() {
        debug!("receiver dropped before the response arrived");
    }
}

#[tracing::instrument(ret, err(Debug))]
async fn process_empty(
    response: reqwest::Result<reqwest::Response>,
    was_authenticated: bool,
) -> anyhow::Result<()> {
    let response = extract_response(response)?;
    if response.status().is_success() {
        Ok(())
    } else {
        Err(handle_error(response, was_authenticated).await)
    }
}

#[tracing::instrument(ret, err(Debug))]
async fn process_json_body<T>(
    response: reqwest::Result<reqwest::Response>,
    was_authenticated: bool,
) -> anyhow::Result<T>
where
    T: Debug + serde::de::DeserializeOwned,
{
    let response = extract_response(response)?;
    if response.status().is_success() {
        Ok(response
            .json()
            .await
            .context("failed to parse result as json")?)
    } else {
        Err(handle_error(response, was_authenticated).await)
    }
}

/// Also returns the `ETag` header needed to update the entity later
#[tracing::instrument(ret, err(Debug))]
async fn process_json_with_etag<T>(
    response: reqwest::Result<reqwest::Response>,
    was_authenticated: bool,
) -> anyhow::Result<(T, Option<String>)>
where
    T: Debug + serde::de::DeserializeOwned,
{
    let response = extract_response(response)?;
    if !response.status().is_success() {
        return Err(handle_error(response, was_authenticated).await);
    }
    let etag = response
        .headers()
        .get(header::ETAG)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response
        .json()
        .await
        .context("failed to parse result as json")?;
    Ok((body, etag))
}

#[tracing::instrument(ret)]
async fn handle_error(response: reqwest::Response, was_authenticated: bool) -> anyhow::Error {
    let status = response.status();
    debug_assert!(
        !status.is_success(),
        "this is supposed to be an error, right? Status code is: {status}"
    );
    let body = response.text().await.unwrap_or_default();
    ApiError::from_response(status.as_u16(), &body, was_authenticated).into()
}

/// No response at all is reported as a network error
#[tracing::instrument(ret, err(Debug))]
fn extract_response(
    response: reqwest::Result<reqwest::Response>,
) -> anyhow::Result<reqwest::Response> {
    response.map_err(|err| {
        info!("Response is err: {err:#?}");
        ApiError::network(err.to_string()).into()
    })
}

pub trait UiCallBack: 'static + Send + FnOnce() {}
impl<T> UiCallBack for T where T: 'static + Send + FnOnce() {}

#[cfg(not(target_arch = "wasm32"))]
pub mod closure_traits {
    pub trait ChannelCallBack<O>:
        'static + Send + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    impl<T, O> ChannelCallBack<O> for T where
        T: 'static + Send + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    pub trait ChannelCallBackOutput: futures::Future<Output = ()> + Send {}
    impl<T> ChannelCallBackOutput for T where T: futures::Future<Output = ()> + Send {}
}

#[cfg(target_arch = "wasm32")]
pub mod closure_traits {
    pub trait ChannelCallBack<O>:
        'static + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    impl<T, O> ChannelCallBack<O> for T where
        T: 'static + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    pub trait ChannelCallBackOutput: futures::Future<Output = ()> {}
    impl<T> ChannelCallBackOutput for T where T: futures::Future<Output = ()> {}
}

#[cfg(test)]
mod tests {
    use parking_shared::{
        const_config::storage::{
            STORAGE_KEY_ACCOUNT, STORAGE_KEY_REFRESH_TOKEN, STORAGE_KEY_TOKEN, STORAGE_KEY_VERSION,
            STORAGE_VERSION,
        },
        time::Seconds,
        token::expose_internal::make_unsigned_token,
    };
    use rstest::{fixture, rstest};
    use secrecy::ExposeSecret as _;

    use super::*;
    use crate::storage::MemoryStore;

    const ACCOUNT_JSON: &str = r#"{
        "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
        "login": "jerzybem",
        "email": "jerzy.bem@example.com",
        "firstName": "Jerzy",
        "lastName": "Bem",
        "userLevels": [{"level": "CLIENT", "active": true}],
        "active": true,
        "blocked": false,
        "verified": true
    }"#;

    #[fixture]
    fn logged_in_client() -> Client {
        let store = MemoryStore::new();
        let token = make_unsigned_token("jerzybem", Timestamp::now() + Seconds::new(600));
        store.set(STORAGE_KEY_VERSION, STORAGE_VERSION).unwrap();
        store.set(STORAGE_KEY_TOKEN, &token).unwrap();
        store.set(STORAGE_KEY_REFRESH_TOKEN, "REFRESH-SECRET").unwrap();
        store.set(STORAGE_KEY_ACCOUNT, ACCOUNT_JSON).unwrap();
        let client = Client::new("http://localhost:1".to_string(), Box::new(store));
        assert!(client.is_logged_in());
        client
    }

    fn rejected() -> anyhow::Result<()> {
        Err(ApiError::from_response(401, "", true).into())
    }

    #[rstest]
    fn rejected_current_token_ends_session(logged_in_client: Client) {
        let sent_token = logged_in_client.with_storage(PersistentState::token);

        logged_in_client.end_session_if_expired(&rejected(), sent_token.as_ref());

        assert!(!logged_in_client.is_logged_in());
        assert!(logged_in_client
            .with_storage(PersistentState::token)
            .is_none());
    }

    #[rstest]
    fn rejected_replaced_token_keeps_session(logged_in_client: Client) {
        let stale = SecretString::from(make_unsigned_token("jerzybem", Timestamp::now()));

        logged_in_client.end_session_if_expired(&rejected(), Some(&stale));

        assert!(logged_in_client.is_logged_in());
    }

    #[rstest]
    fn other_errors_keep_session(logged_in_client: Client) {
        let sent_token = logged_in_client.with_storage(PersistentState::token);
        let failed: anyhow::Result<()> = Err(ApiError::from_response(403, "", true).into());

        logged_in_client.end_session_if_expired(&failed, sent_token.as_ref());

        assert!(logged_in_client.is_logged_in());
    }

    #[rstest]
    fn debug_output_hides_tokens(logged_in_client: Client) {
        let token = logged_in_client
            .with_storage(PersistentState::token)
            .unwrap();

        let actual = format!("{logged_in_client:?}");

        assert!(!actual.contains(token.expose_secret()), "{actual}");
        assert!(!actual.contains("REFRESH-SECRET"), "{actual}");
    }
}
