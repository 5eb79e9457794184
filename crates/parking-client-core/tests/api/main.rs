mod errors;
mod helpers;
mod login;
mod parking;
mod session;
