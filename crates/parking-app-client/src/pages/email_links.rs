//! Pages opened from links sent by email along with the request for a
//! password reset link

use parking_client_core::router::Route;
use parking_shared::{
    req_args::{ResetPasswordReqArgs, ResetPasswordRequestReqArgs},
    uac::{validate_password, Account, Email},
};
use secrecy::SecretString;

use super::{
    data_state::{Awaiting, DataState},
    register::check_confirmation,
    DisplayablePage,
};
use crate::{
    app::wake_fn,
    ui_helpers::{empty_secret, ui_validated_edit, ui_validated_password},
    DataShared,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    ActivateAccount,
    ConfirmEmail,
}

/// Sends the token from the link as soon as the page opens
#[derive(Debug)]
pub struct UiEmailLink {
    action: LinkAction,
    token: String,
    data_state: DataState<()>,
    /// Reload of the own account once a new email is confirmed
    account_refresh: DataState<Account>,
}

#[derive(Debug, Default)]
pub struct UiForgotPassword {
    email: String,
    data_state: DataState<()>,
}

#[derive(Debug)]
pub struct UiResetPassword {
    token: String,
    password: SecretString,
    password_confirmation: SecretString,
    data_state: DataState<()>,
}

impl UiEmailLink {
    pub fn new(action: LinkAction, token: String) -> Self {
        Self {
            action,
            token,
            data_state: DataState::None,
            account_refresh: DataState::None,
        }
    }

    /// The cached account only goes stale when the email of the logged in
    /// user changed
    fn needs_account_refresh(&self, is_logged_in: bool) -> bool {
        self.action == LinkAction::ConfirmEmail
            && is_logged_in
            && self.data_state.is_present()
            && matches!(self.account_refresh, DataState::None)
    }
}

impl DisplayablePage for UiEmailLink {
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        let ctx = ui.ctx().clone();
        let client = &data_shared.client;
        let (action, token) = (self.action, &self.token);
        self.data_state.egui_get(ui, &mut data_shared.toasts, Some("Try again"), || {
            Awaiting(match action {
                LinkAction::ActivateAccount => client.activate_account(token, wake_fn(ctx)),
                LinkAction::ConfirmEmail => client.confirm_email(token, wake_fn(ctx)),
            })
        });
        if !self.data_state.is_present() {
            return;
        }
        if self.needs_account_refresh(data_shared.client.is_logged_in()) {
            self.account_refresh = data_shared
                .client
                .refresh_own_account(wake_fn(ui.ctx().clone()))
                .into();
        }
        self.account_refresh.poll(&mut data_shared.toasts);

        match self.action {
            LinkAction::ActivateAccount => {
                ui.label("Your account is active. You can now login.");
                if ui.button("Go to login").clicked() {
                    data_shared.navigate(Route::Login);
                }
            }
            LinkAction::ConfirmEmail => {
                ui.label("Your new email address is confirmed.");
                self.account_refresh.ui_status(ui);
                if ui.button("Continue").clicked() {
                    data_shared.navigate(Route::Home);
                }
            }
        }
    }
}

impl DisplayablePage for UiForgotPassword {
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        self.data_state.poll(&mut data_shared.toasts);
        if self.data_state.is_present() {
            ui.label("If the address belongs to an account a link to reset the password was sent to it.");
            if ui.button("Back to login").clicked() {
                data_shared.navigate(Route::Login);
            }
            return;
        }

        ui.label("Enter the email address of your account.");
        let mut is_valid = false;
        egui::Grid::new("forgot password grid")
            .num_columns(3)
            .show(ui, |ui| {
                is_valid = ui_validated_edit(ui, "Email", &mut self.email, |v| Email::try_from(v));
            });
        ui.horizontal(|ui| {
            if ui
                .add_enabled(
                    is_valid && self.data_state.can_send(),
                    egui::Button::new("Send reset link"),
                )
                .clicked()
            {
                if let Ok(email) = Email::try_from(self.email.trim()) {
                    let args = ResetPasswordRequestReqArgs { email };
                    self.data_state = data_shared
                        .client
                        .request_password_reset(&args, wake_fn(ui.ctx().clone()))
                        .into();
                }
            }
            self.data_state.ui_status(ui);
        });
    }
}

impl UiResetPassword {
    pub fn new(token: String) -> Self {
        Self {
            token,
            password: empty_secret(),
            password_confirmation: empty_secret(),
            data_state: DataState::None,
        }
    }
}

impl DisplayablePage for UiResetPassword {
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        if self.data_state.poll(&mut data_shared.toasts) && self.data_state.is_present() {
            data_shared.toasts.success("Password changed");
        }
        if self.data_state.is_present() {
            ui.label("Your password was changed. You can now login with the new one.");
            if ui.button("Go to login").clicked() {
                data_shared.navigate(Route::Login);
            }
            return;
        }

        let mut is_valid = true;
        egui::Grid::new("reset password grid")
            .num_columns(3)
            .show(ui, |ui| {
                is_valid &= ui_validated_password(
                    ui,
                    "New password",
                    &mut self.password,
                    validate_password,
                );
                let password = self.password.clone();
                is_valid &= ui_validated_password(
                    ui,
                    "Repeat password",
                    &mut self.password_confirmation,
                    |confirmation| check_confirmation(&password, confirmation),
                );
            });
        ui.horizontal(|ui| {
            if ui
                .add_enabled(
                    is_valid && self.data_state.can_send(),
                    egui::Button::new("Set password"),
                )
                .clicked()
            {
                let args = ResetPasswordReqArgs {
                    token: self.token.clone(),
                    new_password: self.password.clone(),
                };
                self.data_state = data_shared
                    .client
                    .reset_password(&args, wake_fn(ui.ctx().clone()))
                    .into();
            }
            self.data_state.ui_status(ui);
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::channel::oneshot;
    use parking_shared::errors::ApiError;
    use rstest::rstest;

    use super::*;
    use crate::toasts::Toasts;

    fn confirmed(action: LinkAction) -> UiEmailLink {
        let mut page = UiEmailLink::new(action, "a1b2c3".to_string());
        page.data_state = DataState::Present(());
        page
    }

    #[rstest]
    #[case::logged_in(LinkAction::ConfirmEmail, true, true)]
    #[case::logged_out(LinkAction::ConfirmEmail, false, false)]
    #[case::activation(LinkAction::ActivateAccount, true, false)]
    fn account_reloaded_after_email_confirmed(
        #[case] action: LinkAction,
        #[case] is_logged_in: bool,
        #[case] expected: bool,
    ) {
        let page = confirmed(action);

        assert_eq!(page.needs_account_refresh(is_logged_in), expected);
    }

    #[test]
    fn unconfirmed_link_does_not_reload_account() {
        let page = UiEmailLink::new(LinkAction::ConfirmEmail, "a1b2c3".to_string());

        assert!(!page.needs_account_refresh(true));
    }

    #[test]
    fn failed_account_reload_is_reported_once() {
        let mut page = confirmed(LinkAction::ConfirmEmail);
        let (tx, rx) = oneshot::channel::<anyhow::Result<Account>>();
        page.account_refresh = rx.into();
        assert!(!page.needs_account_refresh(true));
        let mut toasts = Toasts::new(Duration::from_secs(5));

        tx.send(Err(ApiError::network("connection reset").into()))
            .unwrap();
        page.account_refresh.poll(&mut toasts);

        assert!(!toasts.is_empty());
        assert!(matches!(page.account_refresh, DataState::Failed(_)));
        assert!(!page.needs_account_refresh(true));
    }
}
