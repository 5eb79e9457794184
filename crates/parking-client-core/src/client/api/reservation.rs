use futures::channel::oneshot;
use parking_shared::{
    const_config::path::{
        PathSpec, PATH_RESERVATION, PATH_RESERVATIONS_ACTIVE, PATH_RESERVATIONS_HISTORICAL,
        PATH_RESERVATIONS_STAFF, PATH_RESERVATION_CANCEL, PATH_RESERVATION_MAKE,
    },
    id::ReservationId,
    req_args::PageRequest,
    reservation::{Reservation, ReservationDraft},
};

use crate::{
    client::{UiCallBack, NO_ARGS},
    Client,
};

/// The lists of reservations a user can see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReservationList {
    /// The client's reservations that have not finished
    #[default]
    Active,
    /// The client's finished reservations
    Historical,
    /// Every reservation, for staff
    Staff,
}

impl ReservationList {
    fn path_spec(self) -> PathSpec {
        match self {
            Self::Active => PATH_RESERVATIONS_ACTIVE,
            Self::Historical => PATH_RESERVATIONS_HISTORICAL,
            Self::Staff => PATH_RESERVATIONS_STAFF,
        }
    }
}

impl Client {
    #[tracing::instrument(skip(self, ui_notify))]
    pub fn get_reservations<F: UiCallBack>(
        &self,
        list: ReservationList,
        page: &PageRequest,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<Vec<Reservation>>> {
        let query = page.to_query();
        self.send_request_expect_json(list.path_spec(), &[], Some(&query), ui_notify)
    }

    #[tracing::instrument(skip(self, ui_notify))]
    pub fn get_reservation<F: UiCallBack>(
        &self,
        id: ReservationId,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<Reservation>> {
        self.send_request_expect_json(
            PATH_RESERVATION,
            &[id.to_string().as_str()],
            NO_ARGS,
            ui_notify,
        )
    }

    #[tracing::instrument(skip(self, ui_notify))]
    pub fn make_reservation<F: UiCallBack>(
        &self,
        draft: &ReservationDraft,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_request_expect_empty(PATH_RESERVATION_MAKE, &[], Some(draft), ui_notify)
    }

    #[tracing::instrument(skip(self, ui_notify))]
    pub fn cancel_reservation<F: UiCallBack>(
        &self,
        id: ReservationId,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_request_expect_empty(
            PATH_RESERVATION_CANCEL,
            &[id.to_string().as_str()],
            NO_ARGS,
            ui_notify,
        )
    }
}
