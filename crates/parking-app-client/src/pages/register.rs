use parking_client_core::router::Route;
use parking_shared::{
    errors::ConversionError,
    req_args::RegisterReqArgs,
    uac::{validate_password, Email, Login, PersonName, PhoneNumber},
};
use secrecy::{ExposeSecret as _, SecretString};

use super::{data_state::DataState, DisplayablePage};
use crate::{
    app::wake_fn,
    ui_helpers::{empty_secret, ui_validated_edit, ui_validated_password},
    DataShared,
};

/// Fields of a new account, used for self registration and by administrators
#[derive(Debug)]
pub struct AccountForm {
    login: String,
    email: String,
    first_name: String,
    last_name: String,
    phone_number: String,
    password: SecretString,
    password_confirmation: SecretString,
}

#[derive(Debug, Default)]
pub struct UiRegister {
    form: AccountForm,
    save_state: DataState<()>,
}

impl Default for AccountForm {
    fn default() -> Self {
        Self {
            login: String::new(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: String::new(),
            password: empty_secret(),
            password_confirmation: empty_secret(),
        }
    }
}

impl AccountForm {
    /// Shows the form and returns the request arguments if every field is valid
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<RegisterReqArgs> {
        let mut is_valid = true;
        egui::Grid::new("account form")
            .num_columns(3)
            .show(ui, |ui| {
                is_valid &= ui_validated_edit(ui, "Login", &mut self.login, |v| Login::try_from(v));
                is_valid &= ui_validated_edit(ui, "Email", &mut self.email, |v| Email::try_from(v));
                is_valid &= ui_validated_edit(ui, "First name", &mut self.first_name, |v| {
                    PersonName::try_from(v)
                });
                is_valid &= ui_validated_edit(ui, "Last name", &mut self.last_name, |v| {
                    PersonName::try_from(v)
                });
                is_valid &= ui_validated_edit(ui, "Phone number", &mut self.phone_number, |v| {
                    PhoneNumber::try_from(v)
                });
                is_valid &= ui_validated_password(ui, "Password", &mut self.password, validate_password);
                let password = self.password.clone();
                is_valid &= ui_validated_password(
                    ui,
                    "Repeat password",
                    &mut self.password_confirmation,
                    |confirmation| check_confirmation(&password, confirmation),
                );
            });
        if is_valid {
            self.to_args().ok()
        } else {
            None
        }
    }

    fn to_args(&self) -> Result<RegisterReqArgs, ConversionError> {
        Ok(RegisterReqArgs {
            login: self.login.as_str().try_into()?,
            email: self.email.as_str().try_into()?,
            first_name: self.first_name.as_str().try_into()?,
            last_name: self.last_name.as_str().try_into()?,
            phone_number: self.phone_number.as_str().try_into()?,
            password: self.password.clone(),
        })
    }
}

/// Passes if the repeated password matches
pub fn check_confirmation(
    password: &SecretString,
    confirmation: &str,
) -> Result<(), ConversionError> {
    if confirmation.is_empty() {
        Err(ConversionError::Empty)
    } else if password.expose_secret() == confirmation {
        Ok(())
    } else {
        Err(ConversionError::InvalidFormat {
            expected: "the same password in both fields",
        })
    }
}

impl DisplayablePage for UiRegister {
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        if self.save_state.poll(&mut data_shared.toasts) && self.save_state.is_present() {
            data_shared.toasts.success("Account registered");
        }
        if self.save_state.is_present() {
            ui.label("Your account was created. Follow the link sent to your email to activate it.");
            if ui.button("Go to login").clicked() {
                data_shared.navigate(Route::Login);
            }
            return;
        }

        let args = self.form.show(ui);
        ui.add_space(10.0);
        ui.horizontal(|ui| {
            let can_send = args.is_some() && self.save_state.can_send();
            if ui
                .add_enabled(can_send, egui::Button::new("Register"))
                .clicked()
            {
                if let Some(args) = &args {
                    self.save_state = data_shared
                        .client
                        .register(args, wake_fn(ui.ctx().clone()))
                        .into();
                }
            }
            self.save_state.ui_status(ui);
        });
        if ui.link("Already registered? Login").clicked() {
            data_shared.navigate(Route::Login);
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("Secret1!", "Secret1!", true)]
    #[case("Secret1!", "Secret1", false)]
    #[case("Secret1!", "", false)]
    fn confirmation_must_match(
        #[case] password: &str,
        #[case] confirmation: &str,
        #[case] expected: bool,
    ) {
        let password = SecretString::from(password);
        assert_eq!(check_confirmation(&password, confirmation).is_ok(), expected);
    }

    #[test]
    fn complete_form_yields_args() {
        let form = AccountForm {
            login: "jbem".into(),
            email: "jbem@example.com".into(),
            first_name: "Jerzy".into(),
            last_name: "Bem".into(),
            phone_number: "123456789".into(),
            password: SecretString::from("Secret1!"),
            password_confirmation: SecretString::from("Secret1!"),
        };

        let args = form.to_args().unwrap();

        assert_eq!(args.login.as_ref(), "jbem");
        assert_eq!(args.phone_number.as_ref(), "123456789");
    }

    #[test]
    fn invalid_phone_number_rejected() {
        let form = AccountForm {
            phone_number: "12-34".into(),
            login: "jbem".into(),
            email: "jbem@example.com".into(),
            first_name: "Jerzy".into(),
            last_name: "Bem".into(),
            ..Default::default()
        };

        assert!(form.to_args().is_err());
    }
}
