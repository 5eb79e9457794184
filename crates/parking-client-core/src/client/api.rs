use futures::channel::oneshot;
use parking_shared::{
    const_config::path::{
        PATH_ACCOUNT_ACTIVATE, PATH_ACCOUNT_CONFIRM_EMAIL, PATH_ACCOUNT_REGISTER,
        PATH_ACCOUNT_RESET_PASSWORD, PATH_ACCOUNT_RESET_PASSWORD_REQUEST, PATH_ME,
        PATH_ME_CHANGE_EMAIL, PATH_ME_CHANGE_PASSWORD, PATH_ME_UPDATE,
    },
    errors::{ApiError, NotLoggedInError},
    messages::KEY_NO_ROLES,
    req_args::{
        ChangeEmailReqArgs, ChangePasswordReqArgs, RegisterReqArgs, ResetPasswordReqArgs,
        ResetPasswordRequestReqArgs,
    },
    uac::{Account, AccountUpdate},
};
use secrecy::ExposeSecret as _;
use tracing::info;

use crate::{
    client::{process_json_with_etag, send_to_ui, UiCallBack, NO_ARGS},
    session::{LogoutReason, SessionChange},
    Client,
};

pub mod admin;
pub mod parking;
pub mod reservation;

impl Client {
    #[tracing::instrument(skip(self, ui_notify))]
    pub fn register<F: UiCallBack>(
        &self,
        args: &RegisterReqArgs,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        let body = args.to_json();
        self.send_request_expect_empty(PATH_ACCOUNT_REGISTER, &[], Some(&body), ui_notify)
    }

    #[tracing::instrument(skip(self, token, ui_notify))]
    pub fn activate_account<F: UiCallBack>(
        &self,
        token: &str,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_request_expect_empty(PATH_ACCOUNT_ACTIVATE, &[token], NO_ARGS, ui_notify)
    }

    #[tracing::instrument(skip(self, ui_notify))]
    pub fn request_password_reset<F: UiCallBack>(
        &self,
        args: &ResetPasswordRequestReqArgs,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_request_expect_empty(
            PATH_ACCOUNT_RESET_PASSWORD_REQUEST,
            &[],
            Some(args),
            ui_notify,
        )
    }

    #[tracing::instrument(skip(self, ui_notify))]
    pub fn reset_password<F: UiCallBack>(
        &self,
        args: &ResetPasswordReqArgs,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        let body = serde_json::json!({ "password": args.new_password.expose_secret() });
        self.send_request_expect_empty(
            PATH_ACCOUNT_RESET_PASSWORD,
            &[args.token.as_str()],
            Some(&body),
            ui_notify,
        )
    }

    #[tracing::instrument(skip(self, token, ui_notify))]
    pub fn confirm_email<F: UiCallBack>(
        &self,
        token: &str,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_request_expect_empty(PATH_ACCOUNT_CONFIRM_EMAIL, &[token], NO_ARGS, ui_notify)
    }

    #[tracing::instrument(skip(self, args, ui_notify))]
    pub fn change_password<F: UiCallBack>(
        &self,
        args: &ChangePasswordReqArgs,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        let body = serde_json::json!({
            "oldPassword": args.current_password.expose_secret(),
            "newPassword": args.new_password.expose_secret(),
        });
        self.send_request_expect_empty(PATH_ME_CHANGE_PASSWORD, &[], Some(&body), ui_notify)
    }

    /// Starts an email change. Takes effect once the link sent to the new
    /// address is followed
    #[tracing::instrument(skip(self, ui_notify))]
    pub fn change_email<F: UiCallBack>(
        &self,
        args: &ChangeEmailReqArgs,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_request_expect_empty(PATH_ME_CHANGE_EMAIL, &[], Some(args), ui_notify)
    }

    /// Reloads the own account and reconciles the session roles with it
    ///
    /// If no active role is left the session is ended
    #[tracing::instrument(skip(self, ui_notify))]
    pub fn refresh_own_account<F: UiCallBack>(
        &self,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<Account>> {
        let (tx, rx) = oneshot::channel();
        let outgoing = self.build_request(PATH_ME, &[], NO_ARGS);
        let was_authenticated = outgoing.was_authenticated();
        let sent_token = outgoing.sent_token.clone();
        let client = self.clone();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            let msg = process_json_with_etag(resp, was_authenticated).await;
            client.end_session_if_expired(&msg, sent_token.as_ref());
            let msg = msg.and_then(|(account, etag)| client.apply_own_account(account, etag));
            send_to_ui(tx, msg);
            ui_notify();
        };
        self.initiate_request(outgoing, on_done);
        rx
    }

    /// Saves the personal data. Fails with `error.optimistic.lock` if the
    /// account changed since it was loaded
    #[tracing::instrument(skip(self, ui_notify))]
    pub fn update_own_account<F: UiCallBack>(
        &self,
        update: &AccountUpdate,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<Account>> {
        let (tx, rx) = oneshot::channel();
        let etag = self.with_storage(|storage| storage.etag());
        let outgoing = self
            .build_request(PATH_ME_UPDATE, &[], Some(update))
            .if_match(etag);
        let was_authenticated = outgoing.was_authenticated();
        let sent_token = outgoing.sent_token.clone();
        let client = self.clone();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            let msg = process_json_with_etag(resp, was_authenticated).await;
            client.end_session_if_expired(&msg, sent_token.as_ref());
            let msg = msg.and_then(|(account, etag)| client.apply_own_account(account, etag));
            send_to_ui(tx, msg);
            ui_notify();
        };
        self.initiate_request(outgoing, on_done);
        rx
    }

    /// Stores a freshly loaded own account and brings the session in line
    /// with the roles it grants
    fn apply_own_account(&self, account: Account, etag: Option<String>) -> anyhow::Result<Account> {
        if !self.session.is_logged_in() {
            return Err(NotLoggedInError.into());
        }
        self.session.set_account(account.clone(), etag.clone());
        let mut revoked = false;
        self.session.update(|session| match session.reconcile_roles(account.roles()) {
            Ok(Some(role)) => Some(SessionChange::RoleChanged(role)),
            Ok(None) => Some(SessionChange::ProfileUpdated),
            Err(_) => {
                revoked = true;
                None
            }
        });
        if revoked {
            info!("no active role left");
            self.clear_local_session(LogoutReason::AccessRevoked);
            return Err(ApiError::local(KEY_NO_ROLES).into());
        }
        self.with_storage(|storage| {
            storage.save_account(&account, etag.as_deref());
            if let Some(session) = self.session.current() {
                storage.save_chosen_role(session.active_role);
            }
        });
        Ok(account)
    }
}
