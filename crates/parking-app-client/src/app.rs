use std::{sync::mpsc, time::Duration};

use parking_client_core::{
    router::{menu_links, public_links, resolve, Layout, Resolution, Route},
    session::{LogoutReason, SessionChange},
    storage::KeyValueStore,
    token_monitor::{MonitorEvent, TokenMonitor},
    Client, UiCallBack,
};
use parking_shared::{
    errors::ApiError,
    internal_error,
    id::ParkingId,
    messages::{describe, KEY_NO_ROLES, KEY_SESSION_EXPIRED},
    time::Timestamp,
    uac::Role,
};
use tracing::{debug, info, warn};

use crate::{
    pages::{
        data_state::{Awaiting, DataState},
        Page,
    },
    settings::ClientSettings,
    toasts::Toasts,
};

/// Guards against routing tables that send the user in circles
const MAX_REDIRECTS: usize = 3;

pub struct ParkingApp {
    memory: UiMemory,
    data_shared: DataShared,
    page: Option<(Route, Page)>,
    monitor: TokenMonitor,
    refresh_dialog: RefreshDialog,
    session_changes: mpsc::Receiver<SessionChange>,
}

/// What is remembered between runs by eframe
#[derive(Debug, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
struct UiMemory {
    location: String,
}

/// State the pages share
#[derive(Debug)]
pub struct DataShared {
    pub client: Client,
    pub settings: ClientSettings,
    pub toasts: Toasts,
    navigate_to: Option<Route>,
    /// Parking picked on the details page to reserve a place in
    pub reservation_parking: Option<ParkingId>,
}

#[derive(Debug, Default)]
enum RefreshDialog {
    #[default]
    Hidden,
    Offered {
        expires_at: Timestamp,
    },
    Refreshing(DataState<Timestamp>),
}

impl DataShared {
    /// Opens `route` once the current frame is done
    pub fn navigate(&mut self, route: Route) {
        self.navigate_to = Some(route);
    }

    fn take_navigation(&mut self) -> Option<Route> {
        self.navigate_to.take()
    }

    pub fn active_role(&self) -> Option<Role> {
        self.client.current_session().map(|s| s.active_role)
    }

    /// Reports a failed request
    pub fn report_error(&mut self, err: &anyhow::Error) {
        self.toasts.api_error(&ApiError::from_anyhow(err));
    }
}

impl eframe::App for ParkingApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        info!("Saving with key: {}", eframe::APP_KEY);
        eframe::set_value(storage, eframe::APP_KEY, &self.memory);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_session_changes();
        self.check_token();
        let (route, layout) = self.resolve_location();
        self.top_panel(ctx, &route, layout);
        self.bottom_panel(ctx);
        self.show_page(ctx, route);
        self.show_refresh_dialog(ctx);
        self.data_shared.toasts.show(ctx);

        if let Some(route) = self.data_shared.take_navigation() {
            self.go_to(route);
            ctx.request_repaint();
        }

        // Keeps the clock and the token countdown moving
        ctx.request_repaint_after(Duration::from_secs(1));
    }
}

impl ParkingApp {
    /// Called once before the first frame.
    ///
    /// `start_path` takes precedence over the page open when the app was last
    /// closed
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: ClientSettings,
        start_path: Option<String>,
    ) -> Self {
        let mut memory: UiMemory = match cc.storage {
            Some(storage) => eframe::get_value(storage, eframe::APP_KEY).unwrap_or_else(|| {
                warn!("Load failed");
                Default::default()
            }),
            None => {
                info!("No storage found");
                Default::default()
            }
        };
        if let Some(path) = start_path {
            memory.location = path;
        }

        let client = Client::new(settings.server_address.clone(), open_store(&settings));
        let mut monitor = TokenMonitor::new(settings.token_refresh_lead());
        monitor.attach(client.session());
        let (tx, session_changes) = mpsc::channel();
        let ctx = cc.egui_ctx.clone();
        client.session().subscribe(move |change: &SessionChange| {
            // Receiver only goes away when the app closes
            let _ = tx.send(change.clone());
            ctx.request_repaint();
        });

        Self {
            memory,
            data_shared: DataShared {
                client,
                toasts: Toasts::new(settings.toast_lifetime()),
                settings,
                navigate_to: None,
                reservation_parking: None,
            },
            page: None,
            monitor,
            refresh_dialog: RefreshDialog::Hidden,
            session_changes,
        }
    }

    fn go_to(&mut self, route: Route) {
        debug!(%route, "navigating");
        self.memory.location = route.to_path();
    }

    /// Resolves the location following any redirects
    fn resolve_location(&mut self) -> (Route, Layout) {
        let session = self.data_shared.client.current_session();
        for _ in 0..MAX_REDIRECTS {
            match resolve(&self.memory.location, session.as_deref()) {
                Resolution::Render { route, layout } => return (route, layout),
                Resolution::Redirect { to } => {
                    debug!(from = %self.memory.location, %to, "redirected");
                    self.memory.location = to.to_path();
                }
            }
        }
        let msg = internal_error!(format!("too many redirects from {}", self.memory.location));
        self.data_shared.toasts.error(msg);
        self.memory.location = Route::NotFound.to_path();
        let layout = session.map_or(Layout::Public, |s| Layout::Authenticated(s.active_role));
        (Route::NotFound, layout)
    }

    fn process_session_changes(&mut self) {
        let changes: Vec<_> = self.session_changes.try_iter().collect();
        for change in changes {
            let toasts = &mut self.data_shared.toasts;
            match change {
                SessionChange::LoggedIn { .. } => {
                    if let Some(session) = self.data_shared.client.current_session() {
                        toasts.success(session.greeting());
                    }
                }
                SessionChange::RoleChanged(role) => {
                    toasts.info(format!("You are now acting as {}", role.label()));
                }
                SessionChange::LoggedOut(reason) => {
                    match reason {
                        LogoutReason::UserRequested => toasts.info("You have been logged out"),
                        LogoutReason::Expired => toasts.error(describe(KEY_SESSION_EXPIRED)),
                        LogoutReason::RefreshFailed => {
                            toasts.error("Your session could not be extended. Please login again")
                        }
                        LogoutReason::AccessRevoked => toasts.error(describe(KEY_NO_ROLES)),
                    }
                    // Drop everything loaded for the old session
                    self.page = None;
                    self.refresh_dialog = RefreshDialog::Hidden;
                    self.data_shared.reservation_parking = None;
                }
                SessionChange::Restored { .. }
                | SessionChange::TokenRefreshed { .. }
                | SessionChange::ProfileUpdated => {}
            }
            if let Some(route) = route_after(&change) {
                self.data_shared.navigate(route);
            }
        }
    }

    fn check_token(&mut self) {
        match self.monitor.poll(Timestamp::now()) {
            Some(MonitorEvent::ShowWarning { expires_at }) => {
                self.refresh_dialog = RefreshDialog::Offered { expires_at };
            }
            Some(MonitorEvent::Expired) => {
                self.refresh_dialog = RefreshDialog::Hidden;
                self.data_shared.client.end_expired_session();
            }
            None => {}
        }
    }

    fn top_panel(&mut self, ctx: &egui::Context, route: &Route, layout: Layout) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                egui::widgets::global_theme_preference_switch(ui);
                ui.separator();
                let links = match layout {
                    Layout::Public => public_links(),
                    Layout::Authenticated(role) => menu_links(role),
                };
                for link in links {
                    let is_current = link.route.kind() == route.kind();
                    if ui.selectable_label(is_current, link.label).clicked() {
                        self.data_shared.navigate(link.route);
                    }
                }
                if let Layout::Authenticated(role) = layout {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Logout").clicked() {
                            self.data_shared.client.logout_no_wait();
                        }
                        self.ui_role_switch(ui, role);
                        if let Some(session) = self.data_shared.client.current_session() {
                            ui.label(session.greeting());
                        }
                    });
                }
            });
        });
    }

    fn ui_role_switch(&mut self, ui: &mut egui::Ui, active_role: Role) {
        let Some(session) = self.data_shared.client.current_session() else {
            return;
        };
        if session.roles.len() < 2 {
            ui.label(active_role.label());
            return;
        }
        let mut selected = active_role;
        egui::ComboBox::from_id_salt("role switch")
            .selected_text(active_role.label())
            .show_ui(ui, |ui| {
                for role in session.roles.iter().copied() {
                    ui.selectable_value(&mut selected, role, role.label());
                }
            });
        if selected != active_role {
            if let Err(e) = self.data_shared.client.switch_role(selected) {
                warn!(?e, "role switch failed");
                self.data_shared.report_error(&e);
            }
        }
    }

    fn bottom_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::BOTTOM), |ui| {
                let now = Timestamp::now();
                ui.label(now.display_as_local_datetime());
                if let Some(left) = self.monitor.seconds_left(now) {
                    ui.separator();
                    ui.label(format!("Session ends in {}", format_countdown(left.as_u64())));
                }
                ui.separator();
                ui.weak(&self.memory.location);
                egui::warn_if_debug_build(ui);
            });
        });
    }

    fn show_page(&mut self, ctx: &egui::Context, route: Route) {
        let is_stale = self
            .page
            .as_ref()
            .map_or(true, |(current, _)| *current != route);
        if is_stale {
            info!(%route, "opening page");
            let page = Page::for_route(&route, &mut self.data_shared);
            self.page = Some((route.clone(), page));
        }
        let Some((_, page)) = &mut self.page else {
            return;
        };
        let data_shared = &mut self.data_shared;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(route.title());
            ui.separator();
            egui::ScrollArea::vertical()
                .auto_shrink(false)
                .show(ui, |ui| page.show(ui, data_shared));
        });
    }

    fn show_refresh_dialog(&mut self, ctx: &egui::Context) {
        match &mut self.refresh_dialog {
            RefreshDialog::Hidden => {}
            RefreshDialog::Offered { expires_at } => {
                let left = Timestamp::now().until(*expires_at);
                let mut stay_logged_in = None;
                refresh_window(ctx).show(ctx, |ui| {
                    ui.label(format!(
                        "Your session ends in {}. Do you want to stay logged in?",
                        format_countdown(left.as_u64())
                    ));
                    ui.horizontal(|ui| {
                        if ui.button("Stay logged in").clicked() {
                            stay_logged_in = Some(true);
                        }
                        if ui.button("Logout").clicked() {
                            stay_logged_in = Some(false);
                        }
                    });
                });
                match stay_logged_in {
                    Some(true) => {
                        let rx = self
                            .data_shared
                            .client
                            .refresh_session(wake_fn(ctx.clone()));
                        self.refresh_dialog =
                            RefreshDialog::Refreshing(DataState::AwaitingResponse(Awaiting(rx)));
                    }
                    Some(false) => {
                        self.refresh_dialog = RefreshDialog::Hidden;
                        self.data_shared.client.logout_no_wait();
                    }
                    None => {}
                }
            }
            RefreshDialog::Refreshing(state) => {
                if !state.poll(&mut self.data_shared.toasts) {
                    refresh_window(ctx).show(ctx, |ui| {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Extending the session...");
                        });
                    });
                    return;
                }
                if state.is_present() {
                    self.data_shared.toasts.success("Session extended");
                } else {
                    // Local credentials were already removed by the client
                    self.monitor.refresh_failed();
                }
                self.refresh_dialog = RefreshDialog::Hidden;
            }
        }
    }
}

fn refresh_window(ctx: &egui::Context) -> egui::Window<'static> {
    egui::Window::new("Session about to expire")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .default_width(ctx.screen_rect().width().min(360.0))
}

/// Where to go once the session changed. The previous page may not be
/// allowed anymore after a role change and every logout ends on the login page
fn route_after(change: &SessionChange) -> Option<Route> {
    match change {
        SessionChange::RoleChanged(_) => Some(Route::Home),
        SessionChange::LoggedOut(_) => Some(Route::Login),
        SessionChange::LoggedIn { .. }
        | SessionChange::Restored { .. }
        | SessionChange::TokenRefreshed { .. }
        | SessionChange::ProfileUpdated => None,
    }
}

fn format_countdown(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(not(target_arch = "wasm32"))]
fn open_store(settings: &ClientSettings) -> Box<dyn KeyValueStore> {
    let path = settings.storage_path();
    match parking_client_core::storage::FileStore::open(&path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::error!(?e, ?path, "unable to open storage, the session will not be kept");
            Box::new(parking_client_core::storage::MemoryStore::new())
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn open_store(_settings: &ClientSettings) -> Box<dyn KeyValueStore> {
    Box::new(parking_client_core::storage::LocalStorage)
}

#[inline]
pub fn wake_fn(ctx: egui::Context) -> impl UiCallBack {
    move || ctx.request_repaint()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, "0:00")]
    #[case(59, "0:59")]
    #[case(180, "3:00")]
    #[case(181, "3:01")]
    fn countdown_formatting(#[case] secs: u64, #[case] expected: &str) {
        assert_eq!(format_countdown(secs), expected);
    }

    #[rstest]
    #[case::user_requested(LogoutReason::UserRequested)]
    #[case::expired(LogoutReason::Expired)]
    #[case::refresh_failed(LogoutReason::RefreshFailed)]
    #[case::access_revoked(LogoutReason::AccessRevoked)]
    fn logout_goes_to_login(#[case] reason: LogoutReason) {
        let actual = route_after(&SessionChange::LoggedOut(reason));

        assert_eq!(actual, Some(Route::Login));
    }

    #[test]
    fn role_change_goes_home() {
        let actual = route_after(&SessionChange::RoleChanged(Role::Staff));

        assert_eq!(actual, Some(Route::Home));
    }

    #[rstest]
    #[case::refreshed(SessionChange::TokenRefreshed { expires_at: Timestamp::from_unix_secs(900) })]
    #[case::profile(SessionChange::ProfileUpdated)]
    fn other_changes_stay_on_page(#[case] change: SessionChange) {
        assert_eq!(route_after(&change), None);
    }
}
