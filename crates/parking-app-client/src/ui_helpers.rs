use parking_shared::{errors::ConversionError, time::Timestamp};
use secrecy::{ExposeSecret as _, SecretString};

pub fn get_text_height(ui: &mut egui::Ui) -> f32 {
    egui::TextStyle::Body
        .resolve(ui.style())
        .size
        .max(ui.spacing().interact_size.y)
}

pub fn ui_password_edit(
    ui: &mut egui::Ui,
    password: &mut SecretString,
    hint_text: &str,
) -> egui::Response {
    let mut temp = password.expose_secret().to_owned();
    let result = ui.add(
        egui::TextEdit::singleline(&mut temp)
            .password(true)
            .hint_text(hint_text),
    );
    *password = SecretString::from(temp);
    result
}

pub fn readonly_checkbox_no_text(ui: &mut egui::Ui, mut value: bool) {
    ui.add_enabled(false, egui::Checkbox::without_text(&mut value));
}

/// Text edit row of a form grid. Shows why the value is rejected next to it
///
/// Returns `true` if the value passes `validate`
pub fn ui_validated_edit<T, E: std::fmt::Display>(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut String,
    validate: impl FnOnce(&str) -> Result<T, E>,
) -> bool {
    ui.label(label);
    ui.text_edit_singleline(value);
    let is_valid = match validate(value) {
        Ok(_) => {
            ui.label("");
            true
        }
        Err(e) => {
            ui_error_label(ui, e.to_string());
            false
        }
    };
    ui.end_row();
    is_valid
}

/// Like [`ui_validated_edit`] but for secrets. Empty values are rejected
pub fn ui_validated_password(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut SecretString,
    validate: impl FnOnce(&str) -> Result<(), ConversionError>,
) -> bool {
    ui.label(label);
    ui_password_edit(ui, value, "");
    let is_valid = match validate(value.expose_secret()) {
        Ok(()) => {
            ui.label("");
            true
        }
        Err(e) => {
            ui_error_label(ui, e.to_string());
            false
        }
    };
    ui.end_row();
    is_valid
}

pub fn ui_error_label(ui: &mut egui::Ui, text: impl Into<String>) {
    ui.colored_label(ui.visuals().error_fg_color, text.into());
}

pub fn ui_timestamp(ui: &mut egui::Ui, value: Option<Timestamp>) {
    match value {
        Some(value) => ui.label(value.display_as_local_datetime()),
        None => ui.weak("-"),
    };
}

pub fn empty_secret() -> SecretString {
    SecretString::from("")
}
