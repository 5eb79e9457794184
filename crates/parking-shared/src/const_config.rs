//! Stores settings that are not expected to need to change but grouped together
//! for discoverability and reuse. Each constant should be prefixed by the module
//! name to allow importing the constant only and still be readable

use crate::time::Seconds;

pub mod client {
    use super::*;

    /// How long before the access token expires the user is offered a refresh
    pub const CLIENT_DEFAULT_TOKEN_REFRESH_LEAD: Seconds = Seconds::new(180);
    pub const CLIENT_DEFAULT_TOAST_LIFETIME: Seconds = Seconds::new(5);
    pub const CLIENT_DEFAULT_SERVER_ADDRESS: &str = "http://localhost:8080/api/v1";
    pub const CLIENT_DEFAULT_PAGE_SIZE: u32 = 10;
    pub const CLIENT_PAGE_SIZE_OPTIONS: [u32; 4] = [5, 10, 20, 50];
}

/// Keys used in persistent storage
///
/// The values are plain strings or JSON and are only trusted after being
/// validated on load
pub mod storage {
    pub const STORAGE_KEY_TOKEN: &str = "token";
    pub const STORAGE_KEY_REFRESH_TOKEN: &str = "refreshToken";
    pub const STORAGE_KEY_ACCOUNT: &str = "account";
    pub const STORAGE_KEY_ETAG: &str = "etag";
    pub const STORAGE_KEY_CHOSEN_USER_LEVEL: &str = "chosenUserLevel";
    pub const STORAGE_KEY_CURRENT_PAGE: &str = "currentPage";
    pub const STORAGE_KEY_PAGE_SIZE: &str = "pageSize";
    pub const STORAGE_KEY_SORT_CONFIG: &str = "sortConfig";
    pub const STORAGE_KEY_VERSION: &str = "storageVersion";

    /// Bump whenever the shape of a stored value changes
    pub const STORAGE_VERSION: &str = "1";

    /// Removed on logout
    pub const STORAGE_SESSION_KEYS: [&str; 4] = [
        STORAGE_KEY_TOKEN,
        STORAGE_KEY_REFRESH_TOKEN,
        STORAGE_KEY_ACCOUNT,
        STORAGE_KEY_ETAG,
    ];

    pub const STORAGE_ALL_KEYS: [&str; 8] = [
        STORAGE_KEY_TOKEN,
        STORAGE_KEY_REFRESH_TOKEN,
        STORAGE_KEY_ACCOUNT,
        STORAGE_KEY_ETAG,
        STORAGE_KEY_CHOSEN_USER_LEVEL,
        STORAGE_KEY_CURRENT_PAGE,
        STORAGE_KEY_PAGE_SIZE,
        STORAGE_KEY_SORT_CONFIG,
    ];
}

/// REST endpoints. `{}` marks a path parameter filled in order by
/// [`PathSpec::fill`]
pub mod path {
    mod path_spec;
    pub use path_spec::PathSpec;

    // Authentication
    pub const PATH_AUTH_LOGIN: PathSpec = PathSpec::post("/auth/login");
    pub const PATH_AUTH_LOGOUT: PathSpec = PathSpec::post("/auth/logout");
    pub const PATH_AUTH_REFRESH: PathSpec = PathSpec::post("/auth/refresh-token");

    // Public account operations
    pub const PATH_ACCOUNT_REGISTER: PathSpec = PathSpec::post("/accounts/register/client");
    pub const PATH_ACCOUNT_ACTIVATE: PathSpec = PathSpec::post("/accounts/activate-account/{}");
    pub const PATH_ACCOUNT_RESET_PASSWORD_REQUEST: PathSpec =
        PathSpec::post("/accounts/reset-password");
    pub const PATH_ACCOUNT_RESET_PASSWORD: PathSpec =
        PathSpec::post("/accounts/reset-password/token/{}");
    pub const PATH_ACCOUNT_CONFIRM_EMAIL: PathSpec = PathSpec::post("/accounts/confirm-email/{}");

    // Own account
    pub const PATH_ME: PathSpec = PathSpec::get("/accounts/me");
    pub const PATH_ME_UPDATE: PathSpec = PathSpec::put("/accounts/me");
    pub const PATH_ME_CHANGE_PASSWORD: PathSpec = PathSpec::patch("/accounts/me/change-password");
    pub const PATH_ME_CHANGE_EMAIL: PathSpec = PathSpec::patch("/accounts/me/change-email");
    pub const PATH_ME_SWITCH_ROLE: PathSpec = PathSpec::post("/accounts/me/user-level/{}");

    // Account administration
    pub const PATH_ADMIN_ACCOUNTS: PathSpec = PathSpec::get("/accounts");
    pub const PATH_ADMIN_ACCOUNT: PathSpec = PathSpec::get("/accounts/{}");
    pub const PATH_ADMIN_ACCOUNT_CREATE: PathSpec = PathSpec::post("/accounts");
    pub const PATH_ADMIN_ACCOUNT_BLOCK: PathSpec = PathSpec::post("/accounts/{}/block");
    pub const PATH_ADMIN_ACCOUNT_UNBLOCK: PathSpec = PathSpec::post("/accounts/{}/unblock");
    pub const PATH_ADMIN_ACCOUNT_ADD_LEVEL: PathSpec = PathSpec::post("/accounts/{}/add-level/{}");
    pub const PATH_ADMIN_ACCOUNT_REMOVE_LEVEL: PathSpec =
        PathSpec::post("/accounts/{}/remove-level/{}");

    // Parking
    pub const PATH_PARKING_LIST: PathSpec = PathSpec::get("/parking");
    pub const PATH_PARKING: PathSpec = PathSpec::get("/parking/{}");
    pub const PATH_PARKING_CREATE: PathSpec = PathSpec::post("/parking");
    pub const PATH_PARKING_UPDATE: PathSpec = PathSpec::put("/parking/{}");
    pub const PATH_PARKING_DELETE: PathSpec = PathSpec::delete("/parking/{}");
    pub const PATH_SECTOR_CREATE: PathSpec = PathSpec::post("/parking/{}/sectors");
    pub const PATH_SECTOR_UPDATE: PathSpec = PathSpec::put("/parking/sectors/{}");
    pub const PATH_SECTOR_ACTIVATE: PathSpec = PathSpec::post("/parking/sectors/{}/activate");
    pub const PATH_SECTOR_DEACTIVATE: PathSpec = PathSpec::post("/parking/sectors/{}/deactivate");

    // Reservations
    pub const PATH_RESERVATIONS_ACTIVE: PathSpec = PathSpec::get("/reservations/client/active");
    pub const PATH_RESERVATIONS_HISTORICAL: PathSpec =
        PathSpec::get("/reservations/client/historical");
    pub const PATH_RESERVATIONS_STAFF: PathSpec = PathSpec::get("/reservations/staff");
    pub const PATH_RESERVATION: PathSpec = PathSpec::get("/reservations/{}");
    pub const PATH_RESERVATION_MAKE: PathSpec = PathSpec::post("/reservations/make-reservation");
    pub const PATH_RESERVATION_CANCEL: PathSpec = PathSpec::delete("/reservations/{}");
}

#[cfg(test)]
mod tests {
    use static_assertions::const_assert;

    use super::{
        client::{CLIENT_DEFAULT_TOKEN_REFRESH_LEAD, CLIENT_DEFAULT_TOAST_LIFETIME},
        storage::{STORAGE_ALL_KEYS, STORAGE_SESSION_KEYS},
    };

    // The toast for a refresh failure must not outlive the warning window
    const_assert!(
        CLIENT_DEFAULT_TOAST_LIFETIME.as_u64() < CLIENT_DEFAULT_TOKEN_REFRESH_LEAD.as_u64()
    );
    const_assert!(STORAGE_SESSION_KEYS.len() < STORAGE_ALL_KEYS.len());

    #[test]
    fn session_keys_are_persisted_keys() {
        for key in STORAGE_SESSION_KEYS {
            assert!(STORAGE_ALL_KEYS.contains(&key), "{key} missing");
        }
    }
}
