//! Parking lots. Clients browse them, staff maintain them along with their
//! sectors

use egui_extras::{Column, TableBuilder};
use parking_client_core::router::Route;
use parking_shared::{
    errors::ConversionError,
    id::{ParkingId, SectorId},
    parking::{
        City, MaxPlaces, Parking, ParkingDraft, Sector, SectorDeterminationStrategy, SectorDraft,
        SectorName, SectorType, Street, Weight, ZipCode,
    },
    req_args::PageRequest,
    uac::Role,
};
use strum::IntoEnumIterator as _;
use tracing::{info, warn};

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

#[derive(Debug)]
pub struct UiParkings {
    list: PagedList<Parking>,
    new_parking: Option<ParkingForm>,
    create_state: DataState<()>,
}

#[derive(Debug)]
pub struct UiParkingDetails {
    id: ParkingId,
    parking: DataState<(Parking, Option<String>)>,
    editor: Editor,
    pending: Option<(ChangeKind, DataState<()>)>,
}

#[derive(Debug, Default)]
enum Editor {
    #[default]
    Closed,
    Parking(ParkingForm),
    NewSector(SectorForm),
    Sector(SectorId, SectorForm),
    ConfirmDelete,
}

/// A change picked by staff this frame
#[derive(Debug)]
enum Change {
    UpdateParking(ParkingDraft),
    DeleteParking,
    CreateSector(SectorDraft),
    UpdateSector(SectorId, SectorDraft),
    SetSectorActive(SectorId, bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeKind {
    UpdateParking,
    DeleteParking,
    CreateSector,
    UpdateSector,
    SetSectorActive(bool),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct ParkingForm {
    city: String,
    zip_code: String,
    street: String,
    strategy: SectorDeterminationStrategy,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct SectorForm {
    name: String,
    sector_type: SectorType,
    max_places: String,
    weight: String,
}

impl ParkingForm {
    fn from_parking(parking: &Parking) -> Self {
        Self {
            city: parking.city.clone(),
            zip_code: parking.zip_code.clone(),
            street: parking.street.clone(),
            strategy: parking.strategy,
        }
    }

    fn to_draft(&self) -> Result<ParkingDraft, ConversionError> {
        Ok(ParkingDraft {
            city: City::try_from(self.city.trim())?,
            zip_code: ZipCode::try_from(self.zip_code.trim())?,
            street: Street::try_from(self.street.trim())?,
            strategy: self.strategy,
        })
    }

    /// Returns the draft if every field is valid
    fn show(&mut self, ui: &mut egui::Ui) -> Option<ParkingDraft> {
        let mut is_valid = true;
        egui::Grid::new("parking form")
            .num_columns(3)
            .show(ui, |ui| {
                is_valid &= ui_validated_edit(ui, "City", &mut self.city, |v| City::try_from(v.trim()));
                is_valid &= ui_validated_edit(ui, "Zip code", &mut self.zip_code, |v| {
                    ZipCode::try_from(v.trim())
                });
                is_valid &= ui_validated_edit(ui, "Street", &mut self.street, |v| {
                    Street::try_from(v.trim())
                });

                ui.label("Sector choice");
                egui::ComboBox::from_id_salt("parking strategy")
                    .selected_text(strategy_label(self.strategy))
                    .show_ui(ui, |ui| {
                        for strategy in SectorDeterminationStrategy::iter() {
                            ui.selectable_value(&mut self.strategy, strategy, strategy_label(strategy));
                        }
                    });
                ui.end_row();
            });
        if is_valid {
            self.to_draft().ok()
        } else {
            None
        }
    }
}

impl SectorForm {
    fn from_sector(sector: &Sector) -> Self {
        Self {
            name: sector.name.clone(),
            sector_type: sector.sector_type,
            max_places: sector.max_places.to_string(),
            weight: sector.weight.to_string(),
        }
    }

    fn to_draft(&self) -> Result<SectorDraft, ConversionError> {
        Ok(SectorDraft {
            name: SectorName::try_from(self.name.trim())?,
            sector_type: self.sector_type,
            max_places: self.max_places.parse()?,
            weight: self.weight.parse()?,
        })
    }

    /// Returns the draft if every field is valid
    fn show(&mut self, ui: &mut egui::Ui) -> Option<SectorDraft> {
        let mut is_valid = true;
        egui::Grid::new("sector form")
            .num_columns(3)
            .show(ui, |ui| {
                is_valid &= ui_validated_edit(ui, "Name", &mut self.name, |v| {
                    SectorName::try_from(v.trim())
                });

                ui.label("Type");
                egui::ComboBox::from_id_salt("sector type")
                    .selected_text(self.sector_type.to_string())
                    .show_ui(ui, |ui| {
                        for sector_type in SectorType::iter() {
                            ui.selectable_value(
                                &mut self.sector_type,
                                sector_type,
                                sector_type.to_string(),
                            );
                        }
                    });
                ui.end_row();

                is_valid &= ui_validated_edit(ui, "Places", &mut self.max_places, |v| {
                    v.parse::<MaxPlaces>()
                });
                is_valid &= ui_validated_edit(ui, "Weight", &mut self.weight, |v| v.parse::<Weight>());
            });
        if is_valid {
            self.to_draft().ok()
        } else {
            None
        }
    }
}

fn strategy_label(strategy: SectorDeterminationStrategy) -> &'static str {
    match strategy {
        SectorDeterminationStrategy::LeastOccupied => "Least occupied sector",
        SectorDeterminationStrategy::MostOccupied => "Most occupied sector",
        SectorDeterminationStrategy::LeastOccupiedWeighted => "Least occupied, weighted",
    }
}

impl UiParkings {
    pub fn new(page: PageRequest) -> Self {
        Self {
            list: PagedList::new(page),
            new_parking: None,
            create_state: DataState::None,
        }
    }

    fn ui_new_parking(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        if self.create_state.poll(&mut data_shared.toasts) && self.create_state.is_present() {
            data_shared.toasts.success("Parking created");
            self.new_parking = None;
            self.create_state = DataState::None;
            self.list.reload();
        }
        let Some(form) = &mut self.new_parking else {
            if ui.button("Add parking").clicked() {
                self.new_parking = Some(ParkingForm::default());
            }
            return;
        };

        let draft = form.show(ui);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(
                    draft.is_some() && self.create_state.can_send(),
                    egui::Button::new("Create"),
                )
                .clicked()
            {
                if let Some(draft) = &draft {
                    self.create_state = data_shared
                        .client
                        .create_parking(draft, wake_fn(ui.ctx().clone()))
                        .into();
                }
            }
            if ui.button("Cancel").clicked() {
                self.new_parking = None;
                self.create_state = DataState::None;
            }
            self.create_state.ui_status(ui);
        });
    }
}

impl DisplayablePage for UiParkings {
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        if data_shared.active_role() == Some(Role::Staff) {
            self.ui_new_parking(ui, data_shared);
            ui.separator();
        }
        let mut selected = None;
        self.list.show(
            ui,
            data_shared,
            |client, page, ctx| client.get_parkings(page, wake_fn(ctx)),
            |ui, rows, page| ui_parking_table(ui, rows, page, &mut selected),
        );
        if let Some(id) = selected {
            data_shared.navigate(Route::ParkingDetails(id));
        }
    }
}

/// Returns `true` if the sorting changed
fn ui_parking_table(
    ui: &mut egui::Ui,
    rows: &[Parking],
    page: &mut PageRequest,
    selected: &mut Option<ParkingId>,
) -> bool {
    let mut is_sort_changed = false;
    let text_height = get_text_height(ui);
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::remainder())
        .min_scrolled_height(0.0)
        .sense(egui::Sense::click())
        .header(text_height, |mut header| {
            header.col(|ui| {
                is_sort_changed |= ui_sort_header(ui, "City", "city", page);
            });
            header.col(|ui| {
                is_sort_changed |= ui_sort_header(ui, "Street", "street", page);
            });
            header.col(|ui| {
                ui.strong("Zip code");
            });
            header.col(|ui| {
                ui.strong("Sectors");
            });
            header.col(|ui| {
                ui.strong("Free places");
            });
        })
        .body(|body| {
            body.rows(text_height, rows.len(), |mut row| {
                let parking = &rows[row.index()];
                row.col(|ui| {
                    ui.label(&parking.city);
                });
                row.col(|ui| {
                    ui.label(&parking.street);
                });
                row.col(|ui| {
                    ui.label(&parking.zip_code);
                });
                row.col(|ui| {
                    ui.label(parking.active_sectors().count().to_string());
                });
                row.col(|ui| {
                    ui.label(parking.free_places().to_string());
                });
                if row.response().clicked() {
                    *selected = Some(parking.id);
                }
            });
        });
    is_sort_changed
}

impl Change {
    fn kind(&self) -> ChangeKind {
        match self {
            Change::UpdateParking(_) => ChangeKind::UpdateParking,
            Change::DeleteParking => ChangeKind::DeleteParking,
            Change::CreateSector(_) => ChangeKind::CreateSector,
            Change::UpdateSector(..) => ChangeKind::UpdateSector,
            Change::SetSectorActive(_, active) => ChangeKind::SetSectorActive(*active),
        }
    }
}

impl ChangeKind {
    fn success_text(self) -> &'static str {
        match self {
            ChangeKind::UpdateParking => "Parking saved",
            ChangeKind::DeleteParking => "Parking deleted",
            ChangeKind::CreateSector => "Sector added",
            ChangeKind::UpdateSector => "Sector saved",
            ChangeKind::SetSectorActive(true) => "Sector activated",
            ChangeKind::SetSectorActive(false) => "Sector deactivated",
        }
    }
}

impl UiParkingDetails {
    pub fn new(id: ParkingId) -> Self {
        Self {
            id,
            parking: DataState::None,
            editor: Editor::Closed,
            pending: None,
        }
    }

    fn is_busy(&self) -> bool {
        self.pending.as_ref().is_some_and(|(_, s)| s.is_awaiting())
    }

    /// Sends `change`. Edits carry the `ETag` the parking was loaded with
    fn start(&mut self, change: Change, data_shared: &DataShared, ctx: egui::Context) {
        info!(?change, parking = %self.id, "parking change requested");
        let etag = self.parking.present().and_then(|(_, etag)| etag.clone());
        let client = &data_shared.client;
        let cb = wake_fn(ctx);
        let kind = change.kind();
        let rx = match change {
            Change::UpdateParking(draft) => client.update_parking(self.id, &draft, etag, cb),
            Change::DeleteParking => client.delete_parking(self.id, cb),
            Change::CreateSector(draft) => client.create_sector(self.id, &draft, cb),
            Change::UpdateSector(id, draft) => client.update_sector(id, &draft, etag, cb),
            Change::SetSectorActive(id, active) => client.set_sector_active(id, active, cb),
        };
        self.pending = Some((kind, rx.into()));
    }

    fn poll_pending(&mut self, data_shared: &mut DataShared) {
        let Some((kind, state)) = &mut self.pending else {
            return;
        };
        if !state.poll(&mut data_shared.toasts) || !state.is_present() {
            return;
        }
        let kind = *kind;
        data_shared.toasts.success(kind.success_text());
        self.pending = None;
        self.editor = Editor::Closed;
        if kind == ChangeKind::DeleteParking {
            data_shared.navigate(Route::Parkings);
        } else {
            self.parking = DataState::None;
        }
    }

    fn ui_summary(ui: &mut egui::Ui, parking: &Parking) {
        egui::Grid::new("parking summary")
            .num_columns(2)
            .show(ui, |ui| {
                ui.label("Address");
                ui.label(parking.address());
                ui.end_row();

                ui.label("Sector choice");
                ui.label(strategy_label(parking.strategy));
                ui.end_row();

                ui.label("Free places");
                ui.label(parking.free_places().to_string());
                ui.end_row();
            });
    }

    /// Lists the sectors. Staff see inactive sectors too and get controls to
    /// change them
    fn ui_sectors(
        ui: &mut egui::Ui,
        parking: &Parking,
        is_staff: bool,
        editor: &mut Editor,
    ) -> Option<Change> {
        let mut change = None;
        egui::Grid::new("sectors")
            .num_columns(if is_staff { 7 } else { 4 })
            .striped(true)
            .show(ui, |ui| {
                ui.strong("Sector");
                ui.strong("Type");
                ui.strong("Places");
                ui.strong("Free");
                if is_staff {
                    ui.strong("Weight");
                    ui.strong("Active");
                    ui.label("");
                }
                ui.end_row();

                for sector in parking.sectors.iter().filter(|s| is_staff || s.active) {
                    ui.label(&sector.name);
                    ui.label(sector.sector_type.to_string());
                    ui.label(sector.max_places.to_string());
                    ui.label(sector.free_places().to_string());
                    if is_staff {
                        ui.label(sector.weight.to_string());
                        ui.label(if sector.active { "Yes" } else { "No" });
                        ui.horizontal(|ui| {
                            if ui.button("Edit").clicked() {
                                *editor = Editor::Sector(sector.id, SectorForm::from_sector(sector));
                            }
                            let toggle = if sector.active { "Deactivate" } else { "Activate" };
                            if ui.button(toggle).clicked() {
                                change = Some(Change::SetSectorActive(sector.id, !sector.active));
                            }
                        });
                    }
                    ui.end_row();
                }
            });
        change
    }

    fn ui_editor(&mut self, ui: &mut egui::Ui) -> Option<Change> {
        let mut change = None;
        let mut is_closed = false;
        match &mut self.editor {
            Editor::Closed => {}
            Editor::Parking(form) => {
                ui.strong("Edit parking");
                let draft = form.show(ui);
                ui.horizontal(|ui| {
                    if ui.add_enabled(draft.is_some(), egui::Button::new("Save")).clicked() {
                        change = draft.map(Change::UpdateParking);
                    }
                    is_closed = ui.button("Cancel").clicked();
                });
            }
            Editor::NewSector(form) => {
                ui.strong("New sector");
                let draft = form.show(ui);
                ui.horizontal(|ui| {
                    if ui.add_enabled(draft.is_some(), egui::Button::new("Add")).clicked() {
                        change = draft.map(Change::CreateSector);
                    }
                    is_closed = ui.button("Cancel").clicked();
                });
            }
            Editor::Sector(id, form) => {
                ui.strong("Edit sector");
                let draft = form.show(ui);
                let id = *id;
                ui.horizontal(|ui| {
                    if ui.add_enabled(draft.is_some(), egui::Button::new("Save")).clicked() {
                        change = draft.map(|draft| Change::UpdateSector(id, draft));
                    }
                    is_closed = ui.button("Cancel").clicked();
                });
            }
            Editor::ConfirmDelete => {
                ui.colored_label(
                    ui.visuals().warn_fg_color,
                    "Delete this parking? This cannot be undone.",
                );
                ui.horizontal(|ui| {
                    if ui.button("Delete").clicked() {
                        change = Some(Change::DeleteParking);
                    }
                    is_closed = ui.button("Cancel").clicked();
                });
            }
        }
        if is_closed {
            self.editor = Editor::Closed;
        }
        change
    }
}

impl DisplayablePage for UiParkingDetails {
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        self.poll_pending(data_shared);
        let ctx = ui.ctx().clone();
        let client = &data_shared.client;
        let id = self.id;
        self.parking.egui_get(ui, &mut data_shared.toasts, None, || {
            Awaiting(client.get_parking(id, wake_fn(ctx)))
        });
        let Some((parking, _)) = self.parking.present() else {
            return;
        };
        let role = data_shared.active_role();
        let is_staff = role == Some(Role::Staff);

        Self::ui_summary(ui, parking);
        ui.separator();
        let mut change = Self::ui_sectors(ui, parking, is_staff, &mut self.editor);
        ui.separator();

        if role == Some(Role::Client) {
            let has_room = parking.free_places() > 0;
            if ui
                .add_enabled(has_room, egui::Button::new("Reserve a place"))
                .on_disabled_hover_text("There are no free places")
                .clicked()
            {
                data_shared.reservation_parking = Some(parking.id);
                data_shared.navigate(Route::MakeReservation);
            }
        }

        if is_staff {
            if matches!(self.editor, Editor::Closed) {
                let form = ParkingForm::from_parking(parking);
                ui.horizontal(|ui| {
                    if ui.button("Edit parking").clicked() {
                        self.editor = Editor::Parking(form);
                    }
                    if ui.button("Add sector").clicked() {
                        self.editor = Editor::NewSector(SectorForm::default());
                    }
                    if ui.button("Delete parking").clicked() {
                        self.editor = Editor::ConfirmDelete;
                    }
                });
            }
            change = change.or(self.ui_editor(ui));
        }

        if let Some((_, state)) = &self.pending {
            state.ui_status(ui);
        }
        if ui.button("Back to the list").clicked() {
            data_shared.navigate(Route::Parkings);
        }

        if let Some(change) = change {
            if self.is_busy() {
                warn!(?change, "change ignored while another is in progress");
            } else {
                self.start(change, data_shared, ui.ctx().clone());
            }
        }
    }
}
