//! Code shared between the parking clients and the contract of the REST
//! backend

#![warn(unused_crate_dependencies)]

pub mod const_config;
pub mod errors;
pub mod id;
mod macros;
pub mod messages;
pub mod parking;
pub mod req_args;
pub mod reservation;
pub mod time;
pub mod token;
pub mod uac;

#[cfg(not(target_arch = "wasm32"))]
pub mod telemetry;
