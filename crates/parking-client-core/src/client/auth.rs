//! Login, token refresh, logout and role switching

use anyhow::Context as _;
use futures::channel::oneshot;
use parking_shared::{
    const_config::path::{
        PATH_AUTH_LOGIN, PATH_AUTH_LOGOUT, PATH_AUTH_REFRESH, PATH_ME, PATH_ME_SWITCH_ROLE,
    },
    errors::{ApiError, NotLoggedInError},
    messages::{KEY_NO_ROLES, KEY_UNREADABLE_TOKEN},
    req_args::LoginReqArgs,
    time::Timestamp,
    token::{decode_claims, TokenPair},
    uac::{Account, Role, Session, SessionError},
};
use secrecy::{ExposeSecret as _, SecretString};
use tracing::{info, warn};

use crate::{
    client::{
        process_empty, process_json_body, process_json_with_etag, send_to_ui, UiCallBack, NO_ARGS,
    },
    session::{LogoutReason, SessionChange},
    Client,
};

#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    /// The role chosen in an earlier session is no longer assigned so
    /// `active` was selected instead
    PreferredRoleUnavailable { active: Role },
}

impl LoginOutcome {
    /// Returns `true` for every variant as they all leave the user logged in
    #[must_use]
    pub fn is_any_success(&self) -> bool {
        matches!(self, Self::Success | Self::PreferredRoleUnavailable { .. })
    }
}

impl Client {
    /// Authenticates then loads the account to build the session
    #[tracing::instrument(skip(self, ui_notify))]
    pub fn login<F: UiCallBack>(
        &self,
        args: LoginReqArgs,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<LoginOutcome>> {
        let (tx, rx) = oneshot::channel();
        let body = serde_json::json!({
            "login": args.login,
            "password": args.password.expose_secret(),
        });
        let outgoing = self.build_anonymous_request(PATH_AUTH_LOGIN, &[], Some(&body));
        let client = self.clone();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            let msg = process_login(resp, client).await;
            send_to_ui(tx, msg);
            ui_notify();
        };
        self.initiate_request(outgoing, on_done);
        rx
    }

    /// Exchanges the refresh token for a new pair
    ///
    /// On failure the local credentials are removed. Returns the new expiry
    #[tracing::instrument(skip(self, ui_notify))]
    pub fn refresh_session<F: UiCallBack>(
        &self,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<Timestamp>> {
        let (tx, rx) = oneshot::channel();
        let Some(refresh_token) = self.with_storage(|storage| storage.refresh_token()) else {
            send_to_ui(tx, Err(NotLoggedInError.into()));
            ui_notify();
            return rx;
        };
        let body = serde_json::json!({ "refreshToken": refresh_token.expose_secret() });
        let outgoing = self.build_request(PATH_AUTH_REFRESH, &[], Some(&body));
        let was_authenticated = outgoing.was_authenticated();
        let client = self.clone();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            let msg = process_refresh(resp, was_authenticated, &client).await;
            if let Err(err) = &msg {
                warn!(?err, "token refresh failed");
                client.clear_local_session(LogoutReason::RefreshFailed);
            }
            send_to_ui(tx, msg);
            ui_notify();
        };
        self.initiate_request(outgoing, on_done);
        rx
    }

    /// Ends the session locally straight away then tells the server
    ///
    /// The result only reports if the server was told, the local session is
    /// gone either way
    #[tracing::instrument(skip(self, ui_notify))]
    pub fn logout<F: UiCallBack>(&self, ui_notify: F) -> oneshot::Receiver<anyhow::Result<()>> {
        let outgoing = self.build_request(PATH_AUTH_LOGOUT, &[], NO_ARGS);
        self.clear_local_session(LogoutReason::UserRequested);
        let (tx, rx) = oneshot::channel();
        let was_authenticated = outgoing.was_authenticated();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            let msg = process_empty(resp, was_authenticated).await;
            if let Err(err) = &msg {
                warn!(?err, "server side logout failed");
            }
            send_to_ui(tx, msg);
            ui_notify();
        };
        self.initiate_request(outgoing, on_done);
        rx
    }

    #[tracing::instrument(skip(self))]
    pub fn logout_no_wait(&self) {
        let outgoing = self.build_request(PATH_AUTH_LOGOUT, &[], NO_ARGS);
        self.clear_local_session(LogoutReason::UserRequested);
        self.send_no_wait(outgoing);
    }

    /// Tears down a session whose token has run out. The server is not
    /// contacted as it would refuse the token anyway
    #[tracing::instrument(skip(self))]
    pub fn end_expired_session(&self) {
        self.clear_local_session(LogoutReason::Expired);
    }

    /// Changes the active role and remembers the choice for later logins
    ///
    /// Applied locally straight away, the server is informed in the
    /// background
    #[tracing::instrument(skip(self))]
    pub fn switch_role(&self, role: Role) -> anyhow::Result<()> {
        let session = self.session.current().ok_or(NotLoggedInError)?;
        if session.active_role == role {
            return Ok(());
        }
        let mut result = Ok(());
        self.session.update(|s| match s.switch_role(role) {
            Ok(()) => Some(SessionChange::RoleChanged(role)),
            Err(err) => {
                result = Err(err);
                None
            }
        });
        result?;
        self.with_storage(|storage| storage.save_chosen_role(role));
        info!(%role, "switched role");
        let outgoing = self.build_request(PATH_ME_SWITCH_ROLE, &[role.as_ref()], NO_ARGS);
        self.send_no_wait(outgoing);
        Ok(())
    }

    /// Loads the own account using `token` rather than the stored one
    async fn fetch_own_account(
        &self,
        token: &SecretString,
    ) -> anyhow::Result<(Account, Option<String>)> {
        let response = self
            .build_request_with_token(PATH_ME, &[], NO_ARGS, Some(token))
            .request
            .send()
            .await;
        process_json_with_etag(response, false).await
    }
}

#[tracing::instrument(ret, err(Debug), skip(client))]
async fn process_login(
    response: reqwest::Result<reqwest::Response>,
    client: Client,
) -> anyhow::Result<LoginOutcome> {
    let tokens: TokenPair = process_json_body(response, false).await?;
    let claims = decode_claims(tokens.token.expose_secret())
        .map_err(unreadable_token)?;
    let (account, etag) = client
        .fetch_own_account(&tokens.token)
        .await
        .context("failed to load account after login")?;
    let preferred_role = client.with_storage(|storage| storage.chosen_role());
    let session = Session::new(
        &account,
        tokens.token,
        tokens.refresh_token,
        &claims,
        preferred_role,
    )
    .map_err(session_error_to_api)?;
    let outcome = match preferred_role {
        Some(role) if role != session.active_role => LoginOutcome::PreferredRoleUnavailable {
            active: session.active_role,
        },
        _ => LoginOutcome::Success,
    };
    client.with_storage(|storage| storage.save_session(&session, &account, etag.as_deref()));
    let expires_at = session.expires_at;
    info!(login = %session.login, role = %session.active_role, "logged in");
    client.session.set(
        Some(session),
        Some(account),
        etag,
        SessionChange::LoggedIn { expires_at },
    );
    Ok(outcome)
}

#[tracing::instrument(ret, err(Debug), skip(client))]
async fn process_refresh(
    response: reqwest::Result<reqwest::Response>,
    was_authenticated: bool,
    client: &Client,
) -> anyhow::Result<Timestamp> {
    let tokens: TokenPair = process_json_body(response, was_authenticated).await?;
    let expires_at = decode_claims(tokens.token.expose_secret())
        .map_err(unreadable_token)?
        .expires_at();
    client.with_storage(|storage| storage.save_tokens(&tokens.token, &tokens.refresh_token));
    let updated = client.session.update(|session| {
        session.replace_tokens(tokens.token, tokens.refresh_token, expires_at);
        Some(SessionChange::TokenRefreshed { expires_at })
    });
    if !updated {
        return Err(NotLoggedInError.into());
    }
    Ok(expires_at)
}

/// Keeps the server facing wording for problems with the account itself
fn session_error_to_api(err: SessionError) -> anyhow::Error {
    match err {
        SessionError::NoRoles => ApiError::local(KEY_NO_ROLES).into(),
        other => unreadable_token(other),
    }
}

fn unreadable_token<E: std::fmt::Display>(detail: E) -> anyhow::Error {
    warn!(%detail, "rejected credentials sent by the server");
    ApiError::local(KEY_UNREADABLE_TOKEN).into()
}
