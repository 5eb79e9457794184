use parking_shared::{
    errors::ConversionError,
    req_args::{ChangeEmailReqArgs, ChangePasswordReqArgs},
    uac::{validate_password, Account, AccountUpdate, Email, PersonName, PhoneNumber},
};
use secrecy::{ExposeSecret as _, SecretString};

use super::{
    data_state::{Awaiting, DataState},
    register::check_confirmation,
    DisplayablePage,
};
use crate::{
    app::wake_fn,
    ui_helpers::{
        empty_secret, readonly_checkbox_no_text, ui_timestamp, ui_validated_edit,
        ui_validated_password,
    },
    DataShared,
};

/// The logged in user's own account
#[derive(Debug, Default)]
pub struct UiOwnAccount {
    account: DataState<Account>,
    profile: ProfileForm,
    profile_save: DataState<Account>,
    password: PasswordForm,
    email: EmailForm,
}

#[derive(Debug, Default)]
struct ProfileForm {
    first_name: String,
    last_name: String,
    phone_number: String,
}

#[derive(Debug)]
struct PasswordForm {
    current_password: SecretString,
    new_password: SecretString,
    password_confirmation: SecretString,
    save_state: DataState<()>,
}

#[derive(Debug, Default)]
struct EmailForm {
    email: String,
    save_state: DataState<()>,
}

impl ProfileForm {
    fn from_account(account: &Account) -> Self {
        Self {
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            phone_number: account.phone_number.clone().unwrap_or_default(),
        }
    }

    fn to_update(&self) -> Result<AccountUpdate, ConversionError> {
        Ok(AccountUpdate {
            first_name: self.first_name.as_str().try_into()?,
            last_name: self.last_name.as_str().try_into()?,
            phone_number: self.phone_number.as_str().try_into()?,
        })
    }

    fn is_unchanged(&self, account: &Account) -> bool {
        self.first_name == account.first_name
            && self.last_name == account.last_name
            && Some(&self.phone_number) == account.phone_number.as_ref()
    }
}

impl Default for PasswordForm {
    fn default() -> Self {
        Self {
            current_password: empty_secret(),
            new_password: empty_secret(),
            password_confirmation: empty_secret(),
            save_state: DataState::None,
        }
    }
}

impl UiOwnAccount {
    fn ui_details(ui: &mut egui::Ui, account: &Account) {
        egui::Grid::new("own account details")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                ui.label("Login");
                ui.label(&account.login);
                ui.end_row();

                ui.label("Email");
                ui.label(&account.email);
                ui.end_row();

                ui.label("Roles");
                let roles: Vec<_> = account.roles().into_iter().map(|r| r.label()).collect();
                ui.label(roles.join(", "));
                ui.end_row();

                ui.label("Email verified");
                readonly_checkbox_no_text(ui, account.verified);
                ui.end_row();

                ui.label("Last successful login");
                ui_timestamp(ui, account.last_successful_login);
                ui.end_row();

                ui.label("Last successful login IP");
                ui.label(account.last_successful_login_ip.as_deref().unwrap_or("-"));
                ui.end_row();

                ui.label("Last failed login");
                ui_timestamp(ui, account.last_unsuccessful_login);
                ui.end_row();

                ui.label("Last failed login IP");
                ui.label(account.last_unsuccessful_login_ip.as_deref().unwrap_or("-"));
                ui.end_row();
            });
    }

    fn ui_profile(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        if self.profile_save.poll(&mut data_shared.toasts) {
            if let DataState::Present(account) = std::mem::take(&mut self.profile_save) {
                data_shared.toasts.success("Personal data saved");
                self.profile = ProfileForm::from_account(&account);
                self.account = DataState::Present(account);
            }
        }
        let Some(account) = self.account.present() else {
            return;
        };

        let mut is_valid = true;
        egui::Grid::new("profile form")
            .num_columns(3)
            .show(ui, |ui| {
                is_valid &= ui_validated_edit(ui, "First name", &mut self.profile.first_name, |v| {
                    PersonName::try_from(v)
                });
                is_valid &= ui_validated_edit(ui, "Last name", &mut self.profile.last_name, |v| {
                    PersonName::try_from(v)
                });
                is_valid &= ui_validated_edit(
                    ui,
                    "Phone number",
                    &mut self.profile.phone_number,
                    |v| PhoneNumber::try_from(v),
                );
            });
        let has_changes = !self.profile.is_unchanged(account);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(
                    is_valid && has_changes && self.profile_save.can_send(),
                    egui::Button::new("Save"),
                )
                .clicked()
            {
                if let Ok(update) = self.profile.to_update() {
                    self.profile_save = data_shared
                        .client
                        .update_own_account(&update, wake_fn(ui.ctx().clone()))
                        .into();
                }
            }
            if ui
                .add_enabled(has_changes, egui::Button::new("Discard changes"))
                .clicked()
            {
                self.profile = ProfileForm::from_account(account);
            }
            self.profile_save.ui_status(ui);
        });
    }

    fn ui_password(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        let form = &mut self.password;
        if form.save_state.poll(&mut data_shared.toasts) && form.save_state.is_present() {
            data_shared.toasts.success("Password changed");
            *form = PasswordForm::default();
        }

        let mut is_valid = true;
        egui::Grid::new("change password form")
            .num_columns(3)
            .show(ui, |ui| {
                is_valid &= ui_validated_password(
                    ui,
                    "Current password",
                    &mut form.current_password,
                    |v| {
                        if v.is_empty() {
                            Err(ConversionError::Empty)
                        } else {
                            Ok(())
                        }
                    },
                );
                is_valid &=
                    ui_validated_password(ui, "New password", &mut form.new_password, validate_password);
                let new_password = form.new_password.clone();
                is_valid &= ui_validated_password(
                    ui,
                    "Repeat new password",
                    &mut form.password_confirmation,
                    |confirmation| check_confirmation(&new_password, confirmation),
                );
            });
        let is_same = form.current_password.expose_secret() == form.new_password.expose_secret();
        if is_same && is_valid {
            ui.weak("The new password must differ from the current one");
        }
        ui.horizontal(|ui| {
            if ui
                .add_enabled(
                    is_valid && !is_same && form.save_state.can_send(),
                    egui::Button::new("Change password"),
                )
                .clicked()
            {
                let args = ChangePasswordReqArgs {
                    current_password: form.current_password.clone(),
                    new_password: form.new_password.clone(),
                };
                form.save_state = data_shared
                    .client
                    .change_password(&args, wake_fn(ui.ctx().clone()))
                    .into();
            }
            form.save_state.ui_status(ui);
        });
    }

    fn ui_email(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        let form = &mut self.email;
        form.save_state.poll(&mut data_shared.toasts);
        if form.save_state.is_present() {
            ui.label(format!(
                "A confirmation link was sent to {}. The change takes effect once it is followed.",
                form.email
            ));
            if ui.button("Change again").clicked() {
                *form = EmailForm::default();
            }
            return;
        }

        let mut is_valid = false;
        egui::Grid::new("change email form")
            .num_columns(3)
            .show(ui, |ui| {
                is_valid = ui_validated_edit(ui, "New email", &mut form.email, |v| Email::try_from(v));
            });
        ui.horizontal(|ui| {
            if ui
                .add_enabled(
                    is_valid && form.save_state.can_send(),
                    egui::Button::new("Change email"),
                )
                .clicked()
            {
                if let Ok(email) = Email::try_from(form.email.trim()) {
                    form.save_state = data_shared
                        .client
                        .change_email(&ChangeEmailReqArgs { email }, wake_fn(ui.ctx().clone()))
                        .into();
                }
            }
            form.save_state.ui_status(ui);
        });
    }
}

impl DisplayablePage for UiOwnAccount {
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        let was_present = self.account.is_present();
        let ctx = ui.ctx().clone();
        let client = &data_shared.client;
        self.account.egui_get(ui, &mut data_shared.toasts, None, || {
            Awaiting(client.refresh_own_account(wake_fn(ctx)))
        });
        let Some(account) = self.account.present() else {
            return;
        };
        if !was_present {
            self.profile = ProfileForm::from_account(account);
        }

        Self::ui_details(ui, account);
        if ui.button("Reload").clicked() {
            self.account = DataState::None;
            return;
        }
        ui.separator();

        egui::CollapsingHeader::new("Personal data")
            .default_open(true)
            .show(ui, |ui| self.ui_profile(ui, data_shared));
        egui::CollapsingHeader::new("Change password").show(ui, |ui| self.ui_password(ui, data_shared));
        egui::CollapsingHeader::new("Change email").show(ui, |ui| self.ui_email(ui, data_shared));
    }
}
