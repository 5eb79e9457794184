//! The parking reservation app: a thin egui layer over `parking-client-core`

#![warn(unused_crate_dependencies)]

#[cfg(target_arch = "wasm32")]
mod suppress_wasm_warnings {
    use getrandom as _; // Needed because we need to enable a feature on this crate

    // Only used in binary and triggers unused warning
    use wasm_bindgen_futures as _;
}


mod app;
#[cfg(not(target_arch = "wasm32"))]
pub mod background_worker;
#[cfg(not(target_arch = "wasm32"))]
pub mod cli;
mod pages;
pub mod settings;
mod toasts;
#[cfg(not(target_arch = "wasm32"))]
pub mod tracing;
mod ui_helpers;

pub use app::{DataShared, ParkingApp};

/// Function is here to ensure lib also uses the log create to prevent the warning that it is not used
#[cfg(target_arch = "wasm32")]
pub fn wasm_log_level() -> log::LevelFilter {
    log::LevelFilter::Debug
}

/// Path the page was opened on, so links sent by email land on the right
/// page
#[cfg(target_arch = "wasm32")]
pub fn browser_path() -> Option<String> {
    web_sys::window().and_then(|window| window.location().pathname().ok())
}
