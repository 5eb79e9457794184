use egui_extras::{Column, TableBuilder};
use parking_client_core::{router::Route, ReservationList};
use parking_shared::{
    errors::ConversionError,
    id::{ParkingId, ReservationId},
    parking::Parking,
    req_args::PageRequest,
    reservation::{parse_local_datetime, Reservation, ReservationDraft, RESERVATION_INPUT_FORMAT},
    time::{Seconds, Timestamp},
};

use super::{
    data_state::{Awaiting, DataState},
    paging::{ui_sort_header, PagedList},
    DisplayablePage,
};
use crate::{
    app::wake_fn,
    ui_helpers::{get_text_height, ui_validated_edit},
    DataShared,
};

/// Number of parkings offered when the reservation page is opened directly
const PARKING_CHOICES: u32 = 50;

#[derive(Debug)]
pub struct UiReservations {
    kind: ReservationList,
    list: PagedList<Reservation>,
}

#[derive(Debug)]
pub struct UiReservationDetails {
    id: ReservationId,
    reservation: DataState<Reservation>,
    is_confirming_cancel: bool,
    cancel_state: DataState<()>,
}

#[derive(Debug)]
pub struct UiMakeReservation {
    parking_id: Option<ParkingId>,
    parkings: DataState<Vec<Parking>>,
    begin: String,
    end: String,
    save_state: DataState<()>,
}

impl UiReservations {
    pub fn new(kind: ReservationList, page: PageRequest) -> Self {
        Self {
            kind,
            list: PagedList::new(page),
        }
    }

    fn ui_kind_toggle(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        ui.horizontal(|ui| {
            let mut kind = self.kind;
            ui.selectable_value(&mut kind, ReservationList::Active, "Active");
            ui.selectable_value(&mut kind, ReservationList::Historical, "Historical");
            if kind != self.kind {
                self.kind = kind;
                self.list.reload();
            }
            ui.separator();
            if ui.button("Make reservation").clicked() {
                data_shared.navigate(Route::MakeReservation);
            }
        });
        ui.separator();
    }
}

impl DisplayablePage for UiReservations {
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        let is_staff = self.kind == ReservationList::Staff;
        if !is_staff {
            self.ui_kind_toggle(ui, data_shared);
        }
        let kind = self.kind;
        let mut selected = None;
        self.list.show(
            ui,
            data_shared,
            |client, page, ctx| client.get_reservations(kind, page, wake_fn(ctx)),
            |ui, rows, page| ui_reservation_table(ui, rows, page, is_staff, &mut selected),
        );
        if let Some(id) = selected {
            data_shared.navigate(Route::ReservationDetails(id));
        }
    }
}

/// Staff rows show who made the reservation. Only the client's own rows open
/// the details
fn ui_reservation_table(
    ui: &mut egui::Ui,
    rows: &[Reservation],
    page: &mut PageRequest,
    is_staff: bool,
    selected: &mut Option<ReservationId>,
) -> bool {
    let mut is_sort_changed = false;
    let text_height = get_text_height(ui);
    let mut table_builder = TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto());
    if is_staff {
        table_builder = table_builder.column(Column::auto());
    }
    table_builder = table_builder
        .column(Column::remainder())
        .min_scrolled_height(0.0);
    if !is_staff {
        table_builder = table_builder.sense(egui::Sense::click());
    }

    table_builder
        .header(text_height, |mut header| {
            header.col(|ui| {
                ui.strong("Sector");
            });
            header.col(|ui| {
                is_sort_changed |= ui_sort_header(ui, "Begins", "beginTime", page);
            });
            header.col(|ui| {
                is_sort_changed |= ui_sort_header(ui, "Ends", "endTime", page);
            });
            header.col(|ui| {
                ui.strong("Status");
            });
            if is_staff {
                header.col(|ui| {
                    ui.strong("Client");
                });
            }
            header.col(|ui| {
                ui.strong("Parking");
            });
        })
        .body(|body| {
            body.rows(text_height, rows.len(), |mut row| {
                let reservation = &rows[row.index()];
                row.col(|ui| {
                    ui.label(reservation.sector_name.as_deref().unwrap_or("-"));
                });
                row.col(|ui| {
                    ui.label(reservation.begin_time.display_as_local_datetime());
                });
                row.col(|ui| {
                    ui.label(reservation.end_time.display_as_local_datetime());
                });
                row.col(|ui| {
                    ui.label(reservation.status.to_string());
                });
                if is_staff {
                    row.col(|ui| {
                        match &reservation.client_login {
                            Some(login) => ui.label(login),
                            None => ui.weak("-"),
                        };
                    });
                }
                row.col(|ui| {
                    ui.weak(reservation.parking_id.to_string());
                });
                if !is_staff && row.response().clicked() {
                    *selected = Some(reservation.id);
                }
            });
        });
    is_sort_changed
}

impl UiReservationDetails {
    pub fn new(id: ReservationId) -> Self {
        Self {
            id,
            reservation: DataState::None,
            is_confirming_cancel: false,
            cancel_state: DataState::None,
        }
    }
}

impl DisplayablePage for UiReservationDetails {
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        if self.cancel_state.poll(&mut data_shared.toasts) && self.cancel_state.is_present() {
            data_shared.toasts.success("Reservation cancelled");
            self.cancel_state = DataState::None;
            self.is_confirming_cancel = false;
            self.reservation = DataState::None;
        }
        let ctx = ui.ctx().clone();
        let client = &data_shared.client;
        let id = self.id;
        self.reservation
            .egui_get(ui, &mut data_shared.toasts, None, || {
                Awaiting(client.get_reservation(id, wake_fn(ctx)))
            });
        let Some(reservation) = self.reservation.present() else {
            return;
        };

        egui::Grid::new("reservation details")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                ui.label("Status");
                ui.label(reservation.status.to_string());
                ui.end_row();

                ui.label("Sector");
                ui.label(reservation.sector_name.as_deref().unwrap_or("-"));
                ui.end_row();

                ui.label("Begins");
                ui.label(reservation.begin_time.display_as_local_datetime());
                ui.end_row();

                ui.label("Ends");
                ui.label(reservation.end_time.display_as_local_datetime());
                ui.end_row();
            });
        let parking_id = reservation.parking_id;
        if ui.link("Show the parking").clicked() {
            data_shared.navigate(Route::ParkingDetails(parking_id));
        }
        ui.separator();

        if reservation.can_be_cancelled(Timestamp::now()) {
            if self.is_confirming_cancel {
                ui.label("Cancel this reservation?");
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(self.cancel_state.can_send(), egui::Button::new("Yes, cancel"))
                        .clicked()
                    {
                        self.cancel_state = data_shared
                            .client
                            .cancel_reservation(self.id, wake_fn(ui.ctx().clone()))
                            .into();
                    }
                    if ui.button("Keep it").clicked() {
                        self.is_confirming_cancel = false;
                    }
                    self.cancel_state.ui_status(ui);
                });
            } else if ui.button("Cancel reservation").clicked() {
                self.is_confirming_cancel = true;
            }
        }
        if ui.button("Back to my reservations").clicked() {
            data_shared.navigate(Route::OwnReservations);
        }
    }
}

impl UiMakeReservation {
    /// `parking_id` is preselected if given
    pub fn new(parking_id: Option<ParkingId>) -> Self {
        let start = Timestamp::now() + Seconds::new(60 * 60);
        Self {
            parking_id,
            parkings: DataState::None,
            begin: format_input(start),
            end: format_input(start + Seconds::new(60 * 60)),
            save_state: DataState::None,
        }
    }

    fn ui_parking_choice(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        let ctx = ui.ctx().clone();
        let client = &data_shared.client;
        self.parkings.egui_get(ui, &mut data_shared.toasts, None, || {
            let mut page = PageRequest {
                page_number: 0,
                page_size: PARKING_CHOICES,
                sort: None,
            };
            page.sort_by("city");
            Awaiting(client.get_parkings(&page, wake_fn(ctx)))
        });
        let Some(parkings) = self.parkings.present() else {
            return;
        };
        ui.label("Parking");
        let selected_text = self
            .parking_id
            .and_then(|id| parkings.iter().find(|p| p.id == id))
            .map_or_else(|| "Choose a parking".to_string(), Parking::address);
        egui::ComboBox::from_id_salt("reservation parking")
            .selected_text(selected_text)
            .width(300.0)
            .show_ui(ui, |ui| {
                for parking in parkings {
                    let text = format!("{} ({} free)", parking.address(), parking.free_places());
                    ui.selectable_value(&mut self.parking_id, Some(parking.id), text);
                }
            });
        ui.end_row();
    }
}

impl DisplayablePage for UiMakeReservation {
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        if self.save_state.poll(&mut data_shared.toasts) && self.save_state.is_present() {
            data_shared.toasts.success("Reservation made");
            data_shared.navigate(Route::OwnReservations);
        }

        egui::Grid::new("reservation form")
            .num_columns(3)
            .show(ui, |ui| {
                self.ui_parking_choice(ui, data_shared);
                ui_validated_edit(ui, "Begins", &mut self.begin, parse_local_datetime);
                ui_validated_edit(ui, "Ends", &mut self.end, parse_local_datetime);
            });
        ui.weak(format!("Dates use the format {RESERVATION_INPUT_FORMAT}, in local time"));

        let draft = build_draft(self.parking_id, &self.begin, &self.end, Timestamp::now());
        if let Err(e) = &draft {
            ui.colored_label(ui.visuals().error_fg_color, e.to_string());
        }
        ui.horizontal(|ui| {
            if ui
                .add_enabled(
                    draft.is_ok() && self.save_state.can_send(),
                    egui::Button::new("Reserve"),
                )
                .clicked()
            {
                if let Ok(draft) = &draft {
                    self.save_state = data_shared
                        .client
                        .make_reservation(draft, wake_fn(ui.ctx().clone()))
                        .into();
                }
            }
            self.save_state.ui_status(ui);
        });
    }
}

fn format_input(timestamp: Timestamp) -> String {
    timestamp
        .as_local_datetime()
        .map(|dt| dt.format(RESERVATION_INPUT_FORMAT).to_string())
        .unwrap_or_default()
}

fn build_draft(
    parking_id: Option<ParkingId>,
    begin: &str,
    end: &str,
    now: Timestamp,
) -> Result<ReservationDraft, ConversionError> {
    let parking_id = parking_id.ok_or(ConversionError::InvalidFormat {
        expected: "a parking to be chosen",
    })?;
    ReservationDraft::new(
        parking_id,
        parse_local_datetime(begin)?,
        parse_local_datetime(end)?,
        now,
    )
}
