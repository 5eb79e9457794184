use std::fmt::Debug;

use futures::channel::oneshot;
use parking_client_core::{router::Route, LoginOutcome};
use parking_shared::{errors::ApiError, req_args::LoginReqArgs};
use secrecy::{ExposeSecret as _, SecretString};
use tracing::{error, info};

use super::DisplayablePage;
use crate::{
    app::wake_fn,
    ui_helpers::{empty_secret, ui_password_edit},
    DataShared,
};

#[derive(Debug)]
pub struct UiLogin {
    login: String,
    password: SecretString,
    login_attempt_status: LoginAttemptStatus,
}

type AwaitingType = oneshot::Receiver<anyhow::Result<LoginOutcome>>;

#[derive(Default)]
enum LoginAttemptStatus {
    #[default]
    NotAttempted,
    AwaitingResponse(AwaitingType),
    Failed(ApiError),
}

impl Debug for LoginAttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAttempted => write!(f, "NotAttempted"),
            Self::AwaitingResponse(_) => write!(f, "AwaitingResponse"),
            Self::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
        }
    }
}

impl Default for UiLogin {
    fn default() -> Self {
        Self {
            login: String::new(),
            password: empty_secret(),
            login_attempt_status: Default::default(),
        }
    }
}

impl UiLogin {
    fn is_allowed_to_login(&self) -> bool {
        !self.login.trim().is_empty()
            && !self.password.expose_secret().is_empty()
            && !matches!(
                self.login_attempt_status,
                LoginAttemptStatus::AwaitingResponse(_)
            )
    }

    fn login_prompt(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        let mut lost_focus = ui
            .add(egui::TextEdit::singleline(&mut self.login).hint_text("Login"))
            .lost_focus();
        lost_focus =
            ui_password_edit(ui, &mut self.password, "Password").lost_focus() || lost_focus;

        if lost_focus && self.is_allowed_to_login() && ui.input(|i| i.key_pressed(egui::Key::Enter))
        {
            self.send_login_attempt(ui, data_shared);
        }
    }

    fn check_login_attempt_status(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        match &mut self.login_attempt_status {
            LoginAttemptStatus::NotAttempted => {}
            LoginAttemptStatus::AwaitingResponse(rx) => match rx.try_recv() {
                Ok(Some(Ok(outcome))) => {
                    info!(?outcome, "login outcome from client-core");
                    if let LoginOutcome::PreferredRoleUnavailable { active } = outcome {
                        data_shared.toasts.info(format!(
                            "The role you used last time is no longer assigned. \
                             Continuing as {}",
                            active.label()
                        ));
                    }
                    self.password = empty_secret();
                    self.login_attempt_status = LoginAttemptStatus::NotAttempted;
                    data_shared.navigate(Route::Home);
                }
                Ok(Some(Err(e))) => {
                    info!(?e, "login failed");
                    self.login_attempt_status = LoginAttemptStatus::Failed(ApiError::from_anyhow(&e));
                }
                Ok(None) => {
                    ui.spinner();
                }
                Err(e) => {
                    error!(?e, "error receiving on channel");
                    self.login_attempt_status =
                        LoginAttemptStatus::Failed(ApiError::network(e.to_string()));
                }
            },
            LoginAttemptStatus::Failed(e) => {
                ui.separator();
                ui.colored_label(ui.visuals().error_fg_color, e.user_text());
                if ui.button("Clear error status").clicked() {
                    self.login_attempt_status = LoginAttemptStatus::NotAttempted;
                }
                ui.separator();
            }
        }
    }

    fn login_button(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        if ui
            .add_enabled(self.is_allowed_to_login(), egui::Button::new("Login"))
            .clicked()
        {
            self.send_login_attempt(ui, data_shared);
        }
    }

    fn send_login_attempt(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        let args = LoginReqArgs::new(self.login.trim(), self.password.clone());
        let rx = data_shared.client.login(args, wake_fn(ui.ctx().clone()));
        self.login_attempt_status = LoginAttemptStatus::AwaitingResponse(rx);
    }
}

impl DisplayablePage for UiLogin {
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        ui.vertical_centered(|ui| {
            self.login_prompt(ui, data_shared);

            self.check_login_attempt_status(ui, data_shared);

            self.login_button(ui, data_shared);

            ui.add_space(10.0);
            if ui.link("Forgot your password?").clicked() {
                data_shared.navigate(Route::ForgotPassword);
            }
            if ui.link("No account yet? Register").clicked() {
                data_shared.navigate(Route::Register);
            }
        });
    }
}
