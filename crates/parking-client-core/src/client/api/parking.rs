use futures::channel::oneshot;
use parking_shared::{
    const_config::path::{
        PATH_PARKING, PATH_PARKING_CREATE, PATH_PARKING_DELETE, PATH_PARKING_LIST,
        PATH_PARKING_UPDATE, PATH_SECTOR_ACTIVATE, PATH_SECTOR_CREATE, PATH_SECTOR_DEACTIVATE,
        PATH_SECTOR_UPDATE,
    },
    id::{ParkingId, SectorId},
    parking::{Parking, ParkingDraft, SectorDraft},
    req_args::PageRequest,
};

use crate::{
    client::{UiCallBack, NO_ARGS},
    Client,
};

impl Client {
    #[tracing::instrument(skip(self, ui_notify))]
    pub fn get_parkings<F: UiCallBack>(
        &self,
        page: &PageRequest,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<Vec<Parking>>> {
        let query = page.to_query();
        self.send_request_expect_json(PATH_PARKING_LIST, &[], Some(&query), ui_notify)
    }

    /// Also returns the `ETag` needed to edit the parking or its sectors
    #[tracing::instrument(skip(self, ui_notify))]
    pub fn get_parking<F: UiCallBack>(
        &self,
        id: ParkingId,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<(Parking, Option<String>)>> {
        let outgoing = self.build_request(PATH_PARKING, &[id.to_string().as_str()], NO_ARGS);
        self.send_expect_json_with_etag(outgoing, ui_notify)
    }

    #[tracing::instrument(skip(self, ui_notify))]
    pub fn create_parking<F: UiCallBack>(
        &self,
        draft: &ParkingDraft,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_request_expect_empty(PATH_PARKING_CREATE, &[], Some(draft), ui_notify)
    }

    #[tracing::instrument(skip(self, ui_notify))]
    pub fn update_parking<F: UiCallBack>(
        &self,
        id: ParkingId,
        draft: &ParkingDraft,
        etag: Option<String>,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        let outgoing = self
            .build_request(PATH_PARKING_UPDATE, &[id.to_string().as_str()], Some(draft))
            .if_match(etag);
        self.send_expect_empty(outgoing, ui_notify)
    }

    #[tracing::instrument(skip(self, ui_notify))]
    pub fn delete_parking<F: UiCallBack>(
        &self,
        id: ParkingId,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_request_expect_empty(
            PATH_PARKING_DELETE,
            &[id.to_string().as_str()],
            NO_ARGS,
            ui_notify,
        )
    }

    #[tracing::instrument(skip(self, ui_notify))]
    pub fn create_sector<F: UiCallBack>(
        &self,
        parking_id: ParkingId,
        draft: &SectorDraft,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_request_expect_empty(
            PATH_SECTOR_CREATE,
            &[parking_id.to_string().as_str()],
            Some(draft),
            ui_notify,
        )
    }

    #[tracing::instrument(skip(self, ui_notify))]
    pub fn update_sector<F: UiCallBack>(
        &self,
        id: SectorId,
        draft: &SectorDraft,
        etag: Option<String>,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        let outgoing = self
            .build_request(PATH_SECTOR_UPDATE, &[id.to_string().as_str()], Some(draft))
            .if_match(etag);
        self.send_expect_empty(outgoing, ui_notify)
    }

    /// Activates or deactivates the sector. Inactive sectors take no new
    /// reservations
    #[tracing::instrument(skip(self, ui_notify))]
    pub fn set_sector_active<F: UiCallBack>(
        &self,
        id: SectorId,
        active: bool,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        let path_spec = if active {
            PATH_SECTOR_ACTIVATE
        } else {
            PATH_SECTOR_DEACTIVATE
        };
        self.send_request_expect_empty(path_spec, &[id.to_string().as_str()], NO_ARGS, ui_notify)
    }
}
