//! Shared items related to user accounts, roles and the client session

mod account;
mod fields;
mod role;
mod session;

pub use account::{Account, AccountRole, AccountSummary, AccountUpdate};
pub use fields::{validate_password, Email, Login, PersonName, PhoneNumber};
pub use role::Role;
pub use session::{Session, SessionError};
