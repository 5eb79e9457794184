//! Stores functionality shared by the parking clients: the session, routing
//! and access to the REST backend
//! NB: The assumption is made that the async runtime has already been started
//! before any functions from this library are called

#![warn(unused_crate_dependencies)]

#[cfg(target_arch = "wasm32")]
mod suppress_wasm_warnings {
    // Needed because we need to enable js feature on this crate
    use getrandom as _;
}

#[cfg(test)] // Only used by the integration tests
mod warning_suppress {
    use axum as _;
    use tokio as _;
}

mod client;
pub mod router;
pub mod session;
pub mod storage;
pub mod token_monitor;

pub use client::{
    api::reservation::ReservationList, auth::LoginOutcome, Client, UiCallBack, NO_ARGS,
};
