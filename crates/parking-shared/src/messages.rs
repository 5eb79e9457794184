//! Human readable text for the message keys used by the server and the
//! generic keys raised locally. Unknown keys are shown as is.

pub const KEY_NETWORK: &str = "error.network";
pub const KEY_SESSION_EXPIRED: &str = "error.session.expired";
pub const KEY_UNKNOWN: &str = "error.unknown";
pub const KEY_NO_ROLES: &str = "error.account.no.roles";
pub const KEY_UNREADABLE_TOKEN: &str = "error.token.unreadable";

const MESSAGES: &[(&str, &str)] = &[
    (KEY_NETWORK, "Unable to reach the server. Please try again later"),
    (KEY_SESSION_EXPIRED, "Your session has expired. Please login again"),
    (KEY_UNKNOWN, "Something went wrong"),
    (KEY_NO_ROLES, "This account has no active access levels"),
    (KEY_UNREADABLE_TOKEN, "The server sent credentials this client cannot read"),
    ("error.invalid.credentials", "Invalid login or password"),
    ("error.account.blocked", "This account is blocked"),
    ("error.account.not.active", "This account has not been activated"),
    ("error.account.not.found", "Account not found"),
    ("error.login.taken", "This login is already taken"),
    ("error.email.taken", "This email is already in use"),
    ("error.optimistic.lock", "The data was changed by someone else. Refresh and try again"),
    ("error.token.invalid", "The link is invalid or has expired"),
    ("error.parking.not.found", "Parking not found"),
    ("error.sector.not.found", "Sector not found"),
    ("error.sector.has.reservations", "The sector still has active reservations"),
    ("error.reservation.not.found", "Reservation not found"),
    ("error.reservation.no.place", "There are no free places for this period"),
    ("error.reservation.cannot.cancel", "This reservation can no longer be cancelled"),
    ("error.access.denied", "You do not have access to this resource"),
];

pub fn describe(key: &str) -> &str {
    MESSAGES
        .iter()
        .find_map(|(k, text)| (*k == key).then_some(*text))
        .unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_is_returned_verbatim() {
        assert_eq!(describe("error.brand.new"), "error.brand.new");
    }

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = MESSAGES.iter().map(|(k, _)| *k).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), MESSAGES.len());
    }
}
