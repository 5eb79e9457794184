use parking_client_core::router::{menu_links, Route};

use super::DisplayablePage;
use crate::{ui_helpers::ui_timestamp, DataShared};

#[derive(Debug)]
pub struct UiLanding;

#[derive(Debug)]
pub struct UiHome;

#[derive(Debug)]
pub struct UiNotFound;

impl DisplayablePage for UiLanding {
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        ui.vertical_centered(|ui| {
            ui.label("Reserve a parking place in a few clicks.");
            ui.add_space(10.0);
            if ui.button("Login").clicked() {
                data_shared.navigate(Route::Login);
            }
            if ui.button("Create an account").clicked() {
                data_shared.navigate(Route::Register);
            }
            if ui.link("Forgot your password?").clicked() {
                data_shared.navigate(Route::ForgotPassword);
            }
        });
    }
}

impl DisplayablePage for UiHome {
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        let Some(session) = data_shared.client.current_session() else {
            return;
        };
        ui.label(session.greeting());
        ui.label(format!("Acting as {}", session.active_role.label()));
        ui.add_space(10.0);

        if let Some(account) = data_shared.client.account() {
            egui::Grid::new("home last logins")
                .num_columns(2)
                .show(ui, |ui| {
                    ui.label("Last successful login");
                    ui_timestamp(ui, account.last_successful_login);
                    ui.end_row();

                    ui.label("Last failed login");
                    ui_timestamp(ui, account.last_unsuccessful_login);
                    ui.end_row();
                });
            ui.add_space(10.0);
        }

        ui.horizontal_wrapped(|ui| {
            for link in menu_links(session.active_role)
                .into_iter()
                .filter(|link| link.route != Route::Home)
            {
                if ui.button(link.label).clicked() {
                    data_shared.navigate(link.route);
                }
            }
        });
    }
}

impl DisplayablePage for UiNotFound {
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        ui.label("There is nothing at this address.");
        if ui.button("Go to the start page").clicked() {
            data_shared.navigate(Route::Home);
        }
    }
}
