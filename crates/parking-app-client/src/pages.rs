use parking_client_core::{router::Route, ReservationList};
use tracing::instrument;

use crate::DataShared;

mod account;
mod admin;
pub mod data_state;
mod email_links;
mod home;
mod login;
mod paging;
mod parking;
mod register;
mod reservation;

use account::UiOwnAccount;
use admin::{UiAccountDetails, UiAccounts, UiCreateAccount};
use email_links::{LinkAction, UiEmailLink, UiForgotPassword, UiResetPassword};
use home::{UiHome, UiLanding, UiNotFound};
use login::UiLogin;
use parking::{UiParkingDetails, UiParkings};
use register::UiRegister;
use reservation::{UiMakeReservation, UiReservationDetails, UiReservations};

/// Trait for types that can be shown as the content of a route
pub trait DisplayablePage {
    /// Displays the page
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared);
}

/// The page for every route along with the state it keeps while open
#[derive(Debug)]
pub enum Page {
    Landing(UiLanding),
    Login(UiLogin),
    Register(UiRegister),
    EmailLink(UiEmailLink),
    ForgotPassword(UiForgotPassword),
    ResetPassword(UiResetPassword),
    Home(UiHome),
    OwnAccount(UiOwnAccount),
    Accounts(UiAccounts),
    AccountDetails(UiAccountDetails),
    CreateAccount(UiCreateAccount),
    Parkings(UiParkings),
    ParkingDetails(UiParkingDetails),
    Reservations(UiReservations),
    ReservationDetails(UiReservationDetails),
    MakeReservation(UiMakeReservation),
    NotFound(UiNotFound),
}

macro_rules! do_on_page {
    ($on:ident, $page:ident, $body:tt) => {
        match $on {
            Page::Landing($page) => $body,
            Page::Login($page) => $body,
            Page::Register($page) => $body,
            Page::EmailLink($page) => $body,
            Page::ForgotPassword($page) => $body,
            Page::ResetPassword($page) => $body,
            Page::Home($page) => $body,
            Page::OwnAccount($page) => $body,
            Page::Accounts($page) => $body,
            Page::AccountDetails($page) => $body,
            Page::CreateAccount($page) => $body,
            Page::Parkings($page) => $body,
            Page::ParkingDetails($page) => $body,
            Page::Reservations($page) => $body,
            Page::ReservationDetails($page) => $body,
            Page::MakeReservation($page) => $body,
            Page::NotFound($page) => $body,
        }
    };
}

impl Page {
    /// Fresh page state for `route`
    #[instrument(skip(data_shared))]
    pub fn for_route(route: &Route, data_shared: &mut DataShared) -> Self {
        match route {
            Route::Landing => Self::Landing(UiLanding),
            Route::Login => Self::Login(UiLogin::default()),
            Route::Register => Self::Register(UiRegister::default()),
            Route::ActivateAccount { token } => {
                Self::EmailLink(UiEmailLink::new(LinkAction::ActivateAccount, token.clone()))
            }
            Route::ConfirmEmail { token } => {
                Self::EmailLink(UiEmailLink::new(LinkAction::ConfirmEmail, token.clone()))
            }
            Route::ForgotPassword => Self::ForgotPassword(UiForgotPassword::default()),
            Route::ResetPassword { token } => {
                Self::ResetPassword(UiResetPassword::new(token.clone()))
            }
            Route::Home => Self::Home(UiHome),
            Route::OwnAccount => Self::OwnAccount(UiOwnAccount::default()),
            Route::Accounts => Self::Accounts(UiAccounts::new(data_shared.client.page_request())),
            Route::AccountDetails(id) => Self::AccountDetails(UiAccountDetails::new(*id)),
            Route::CreateAccount => Self::CreateAccount(UiCreateAccount::default()),
            Route::Parkings => Self::Parkings(UiParkings::new(data_shared.client.page_request())),
            Route::ParkingDetails(id) => Self::ParkingDetails(UiParkingDetails::new(*id)),
            Route::OwnReservations => Self::Reservations(UiReservations::new(
                ReservationList::Active,
                data_shared.client.page_request(),
            )),
            Route::StaffReservations => Self::Reservations(UiReservations::new(
                ReservationList::Staff,
                data_shared.client.page_request(),
            )),
            Route::ReservationDetails(id) => {
                Self::ReservationDetails(UiReservationDetails::new(*id))
            }
            Route::MakeReservation => Self::MakeReservation(UiMakeReservation::new(
                data_shared.reservation_parking.take(),
            )),
            Route::NotFound => Self::NotFound(UiNotFound),
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        do_on_page!(self, page, { page.show(ui, data_shared) })
    }
}
