//! Account administration

use egui_extras::{Column, TableBuilder};
use parking_client_core::router::Route;
use parking_shared::{
    id::AccountId,
    req_args::{CreateAccountReqArgs, PageRequest},
    uac::{Account, AccountSummary, Role},
};
use strum::IntoEnumIterator as _;
use tracing::info;

use super::{
    data_state::{Awaiting, DataState},
    paging::{ui_sort_header, PagedList},
    register::AccountForm,
    DisplayablePage,
};
use crate::{
    app::wake_fn,
    ui_helpers::{get_text_height, readonly_checkbox_no_text, ui_timestamp},
    DataShared,
};

#[derive(Debug)]
pub struct UiAccounts {
    list: PagedList<AccountSummary>,
}

#[derive(Debug)]
pub struct UiAccountDetails {
    id: AccountId,
    account: DataState<(Account, Option<String>)>,
    pending: Option<(AccountOp, DataState<()>)>,
}

#[derive(Debug, Clone, Copy)]
enum AccountOp {
    Block,
    Unblock,
    AddRole(Role),
    RemoveRole(Role),
}

#[derive(Debug)]
pub struct UiCreateAccount {
    form: AccountForm,
    role: Role,
    save_state: DataState<()>,
}

impl UiAccounts {
    pub fn new(page: PageRequest) -> Self {
        Self {
            list: PagedList::new(page),
        }
    }
}

impl DisplayablePage for UiAccounts {
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        let mut selected = None;
        ui.horizontal(|ui| {
            if ui.button("Create account").clicked() {
                data_shared.navigate(Route::CreateAccount);
            }
            if ui.button("Refresh").clicked() {
                self.list.reload();
            }
        });
        ui.separator();
        self.list.show(
            ui,
            data_shared,
            |client, page, ctx| client.get_accounts(page, wake_fn(ctx)),
            |ui, rows, page| ui_account_table(ui, rows, page, &mut selected),
        );
        if let Some(id) = selected {
            data_shared.navigate(Route::AccountDetails(id));
        }
    }
}

/// Returns `true` if the sorting changed
fn ui_account_table(
    ui: &mut egui::Ui,
    rows: &[AccountSummary],
    page: &mut PageRequest,
    selected: &mut Option<AccountId>,
) -> bool {
    let mut is_sort_changed = false;
    let text_height = get_text_height(ui);
    let table = TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::remainder())
        .min_scrolled_height(0.0)
        .sense(egui::Sense::click());

    table
        .header(text_height, |mut header| {
            header.col(|ui| {
                is_sort_changed |= ui_sort_header(ui, "Login", "login", page);
            });
            header.col(|ui| {
                is_sort_changed |= ui_sort_header(ui, "Email", "email", page);
            });
            header.col(|ui| {
                is_sort_changed |= ui_sort_header(ui, "Name", "lastName", page);
            });
            header.col(|ui| {
                ui.strong("Roles");
            });
            header.col(|ui| {
                ui.strong("Active");
            });
            header.col(|ui| {
                ui.strong("Blocked");
            });
            header.col(|ui| {
                ui.strong("Verified");
            });
        })
        .body(|body| {
            body.rows(text_height, rows.len(), |mut row| {
                let account = &rows[row.index()];
                row.col(|ui| {
                    ui.label(&account.login);
                });
                row.col(|ui| {
                    ui.label(&account.email);
                });
                row.col(|ui| {
                    ui.label(format!("{} {}", account.first_name, account.last_name));
                });
                row.col(|ui| {
                    let roles: Vec<_> = account.roles.iter().map(|r| r.label()).collect();
                    ui.label(roles.join(", "));
                });
                row.col(|ui| {
                    readonly_checkbox_no_text(ui, account.active);
                });
                row.col(|ui| {
                    readonly_checkbox_no_text(ui, account.blocked);
                });
                row.col(|ui| {
                    readonly_checkbox_no_text(ui, account.verified);
                });

                if row.response().clicked() {
                    *selected = Some(account.id);
                }
            });
        });
    is_sort_changed
}

impl UiAccountDetails {
    pub fn new(id: AccountId) -> Self {
        Self {
            id,
            account: DataState::None,
            pending: None,
        }
    }

    fn start(&mut self, op: AccountOp, data_shared: &DataShared, ctx: egui::Context) {
        info!(?op, id = %self.id, "account change requested");
        let client = &data_shared.client;
        let cb = wake_fn(ctx);
        let rx = match op {
            AccountOp::Block => client.block_account(self.id, cb),
            AccountOp::Unblock => client.unblock_account(self.id, cb),
            AccountOp::AddRole(role) => client.add_role(self.id, role, cb),
            AccountOp::RemoveRole(role) => client.remove_role(self.id, role, cb),
        };
        self.pending = Some((op, rx.into()));
    }

    /// Reloads the account once a change went through
    fn poll_pending(&mut self, data_shared: &mut DataShared) {
        let Some((op, state)) = &mut self.pending else {
            return;
        };
        if !state.poll(&mut data_shared.toasts) {
            return;
        }
        if state.is_present() {
            data_shared.toasts.success(match op {
                AccountOp::Block => "Account blocked".to_string(),
                AccountOp::Unblock => "Account unblocked".to_string(),
                AccountOp::AddRole(role) => format!("{} role added", role.label()),
                AccountOp::RemoveRole(role) => format!("{} role removed", role.label()),
            });
            self.pending = None;
            self.account = DataState::None;
        }
    }
}

impl DisplayablePage for UiAccountDetails {
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        self.poll_pending(data_shared);
        let ctx = ui.ctx().clone();
        let client = &data_shared.client;
        let id = self.id;
        self.account.egui_get(ui, &mut data_shared.toasts, None, || {
            Awaiting(client.get_account(id, wake_fn(ctx)))
        });
        let Some((account, _etag)) = self.account.present() else {
            return;
        };

        let mut requested = None;
        egui::Grid::new("account details")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                ui.label("Login");
                ui.label(&account.login);
                ui.end_row();

                ui.label("Name");
                ui.label(account.full_name());
                ui.end_row();

                ui.label("Email");
                ui.label(&account.email);
                ui.end_row();

                ui.label("Phone number");
                ui.label(account.phone_number.as_deref().unwrap_or("-"));
                ui.end_row();

                ui.label("Active");
                readonly_checkbox_no_text(ui, account.active);
                ui.end_row();

                ui.label("Verified");
                readonly_checkbox_no_text(ui, account.verified);
                ui.end_row();

                ui.label("Blocked");
                ui.horizontal(|ui| {
                    readonly_checkbox_no_text(ui, account.blocked);
                    let (label, op) = if account.blocked {
                        ("Unblock", AccountOp::Unblock)
                    } else {
                        ("Block", AccountOp::Block)
                    };
                    if ui.button(label).clicked() {
                        requested = Some(op);
                    }
                });
                ui.end_row();

                ui.label("Last successful login");
                ui_timestamp(ui, account.last_successful_login);
                ui.end_row();

                ui.label("Last failed login");
                ui_timestamp(ui, account.last_unsuccessful_login);
                ui.end_row();
            });

        ui.separator();
        ui.strong("Roles");
        let granted = account.roles();
        for role in Role::iter() {
            let mut is_granted = granted.contains(&role);
            if ui.checkbox(&mut is_granted, role.label()).changed() {
                requested = Some(if is_granted {
                    AccountOp::AddRole(role)
                } else {
                    AccountOp::RemoveRole(role)
                });
            }
        }

        ui.separator();
        let is_busy = self.pending.as_ref().is_some_and(|(_, s)| s.is_awaiting());
        if let Some((_, state)) = &self.pending {
            state.ui_status(ui);
        }
        if ui.button("Back to the list").clicked() {
            data_shared.navigate(Route::Accounts);
        }
        if let Some(op) = requested.filter(|_| !is_busy) {
            self.start(op, data_shared, ui.ctx().clone());
        }
    }
}

impl Default for UiCreateAccount {
    fn default() -> Self {
        Self {
            form: AccountForm::default(),
            role: Role::Client,
            save_state: DataState::None,
        }
    }
}

impl DisplayablePage for UiCreateAccount {
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        if self.save_state.poll(&mut data_shared.toasts) && self.save_state.is_present() {
            data_shared.toasts.success("Account created");
        }
        if self.save_state.is_present() {
            ui.label("The account was created. An activation link was sent to its email.");
            ui.horizontal(|ui| {
                if ui.button("Create another").clicked() {
                    *self = Self::default();
                }
                if ui.button("Go to accounts").clicked() {
                    data_shared.navigate(Route::Accounts);
                }
            });
            return;
        }

        let args = self.form.show(ui);
        ui.horizontal(|ui| {
            ui.label("Role");
            egui::ComboBox::from_id_salt("new account role")
                .selected_text(self.role.label())
                .show_ui(ui, |ui| {
                    for role in Role::iter() {
                        ui.selectable_value(&mut self.role, role, role.label());
                    }
                });
        });
        ui.add_space(10.0);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(
                    args.is_some() && self.save_state.can_send(),
                    egui::Button::new("Create account"),
                )
                .clicked()
            {
                if let Some(account) = args {
                    let args = CreateAccountReqArgs {
                        account,
                        role: self.role,
                    };
                    self.save_state = data_shared
                        .client
                        .create_account(&args, wake_fn(ui.ctx().clone()))
                        .into();
                }
            }
            self.save_state.ui_status(ui);
        });
    }
}
