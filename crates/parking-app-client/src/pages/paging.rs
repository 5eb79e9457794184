//! Paging and sorting shared by the list pages

use futures::channel::oneshot;
use parking_client_core::Client;
use parking_shared::{
    const_config::client::CLIENT_PAGE_SIZE_OPTIONS,
    req_args::{PageRequest, SortDirection},
};

use super::data_state::{Awaiting, DataState};
use crate::DataShared;

/// One page of a server side list along with the paging used to load it
#[derive(Debug)]
pub struct PagedList<T> {
    page: PageRequest,
    rows: DataState<Vec<T>>,
}

impl<T> PagedList<T> {
    pub fn new(page: PageRequest) -> Self {
        Self {
            page,
            rows: DataState::None,
        }
    }

    /// Loads the page if needed then shows it using `show_rows` followed by
    /// the paging controls
    ///
    /// `show_rows` returns `true` if it changed the sorting
    pub fn show<Fetch, Rows>(
        &mut self,
        ui: &mut egui::Ui,
        data_shared: &mut DataShared,
        fetch: Fetch,
        show_rows: Rows,
    ) where
        Fetch: FnOnce(&Client, &PageRequest, egui::Context) -> oneshot::Receiver<anyhow::Result<Vec<T>>>,
        Rows: FnOnce(&mut egui::Ui, &[T], &mut PageRequest) -> bool,
    {
        let ctx = ui.ctx().clone();
        let client = &data_shared.client;
        let page = &self.page;
        self.rows
            .egui_get(ui, &mut data_shared.toasts, None, || Awaiting(fetch(client, page, ctx)));

        let mut is_changed = false;
        if let Some(rows) = self.rows.present() {
            if rows.is_empty() && self.page.page_number == 0 {
                ui.weak("Nothing to show");
            } else {
                is_changed |= show_rows(ui, rows, &mut self.page);
            }
            ui.separator();
            is_changed |= ui_pager(ui, &mut self.page, rows.len());
        }
        if is_changed {
            data_shared.client.save_page_request(&self.page);
            self.reload();
        }
    }

    pub fn reload(&mut self) {
        self.rows = DataState::None;
    }
}

/// Returns `true` if `page` was changed
fn ui_pager(ui: &mut egui::Ui, page: &mut PageRequest, rows_shown: usize) -> bool {
    let mut is_changed = false;
    ui.horizontal(|ui| {
        if ui
            .add_enabled(page.page_number > 0, egui::Button::new("Previous"))
            .clicked()
        {
            page.page_number -= 1;
            is_changed = true;
        }
        ui.label(format!("Page {}", page.page_number + 1));
        if ui
            .add_enabled(!is_last_page(page, rows_shown), egui::Button::new("Next"))
            .clicked()
        {
            page.page_number += 1;
            is_changed = true;
        }
        ui.separator();
        ui.label("Per page");
        let mut page_size = page.page_size;
        egui::ComboBox::from_id_salt("page size")
            .selected_text(page_size.to_string())
            .show_ui(ui, |ui| {
                for option in CLIENT_PAGE_SIZE_OPTIONS {
                    ui.selectable_value(&mut page_size, option, option.to_string());
                }
            });
        if page_size != page.page_size {
            page.page_size = page_size;
            page.page_number = 0;
            is_changed = true;
        }
    });
    is_changed
}

/// The server sends no total so a short page is taken to be the last one
fn is_last_page(page: &PageRequest, rows_shown: usize) -> bool {
    rows_shown < page.page_size as usize
}

/// Column header that sorts by `field` when clicked
///
/// Returns `true` if the sorting changed
pub fn ui_sort_header(
    ui: &mut egui::Ui,
    label: &str,
    field: &str,
    page: &mut PageRequest,
) -> bool {
    let text = format!("{label}{}", sort_marker(page, field));
    if ui.button(egui::RichText::new(text).strong()).clicked() {
        page.sort_by(field);
        true
    } else {
        false
    }
}

fn sort_marker(page: &PageRequest, field: &str) -> &'static str {
    match &page.sort {
        Some(sort) if sort.field == field => match sort.direction {
            SortDirection::Asc => " ⬆",
            SortDirection::Desc => " ⬇",
        },
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn page(page_size: u32) -> PageRequest {
        PageRequest {
            page_number: 2,
            page_size,
            sort: None,
        }
    }

    #[rstest]
    #[case(10, 10, false)]
    #[case(10, 9, true)]
    #[case(10, 0, true)]
    #[case(5, 5, false)]
    fn short_page_is_last(#[case] page_size: u32, #[case] rows: usize, #[case] expected: bool) {
        assert_eq!(is_last_page(&page(page_size), rows), expected);
    }

    #[test]
    fn marker_follows_sort_direction() {
        let mut page = page(10);
        assert_eq!(sort_marker(&page, "login"), "");

        page.sort_by("login");
        assert_eq!(sort_marker(&page, "login"), " ⬆");
        assert_eq!(sort_marker(&page, "email"), "");

        page.sort_by("login");
        assert_eq!(sort_marker(&page, "login"), " ⬇");
    }
}
