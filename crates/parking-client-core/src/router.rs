//! Maps paths to pages based on the session and the active role
//!
//! This only decides what the UI offers. The server enforces access on every
//! request regardless of what is shown here.

use std::fmt::Display;

use parking_shared::{
    id::{AccountId, ParkingId, ReservationId},
    uac::{Role, Session},
};
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq, strum::EnumDiscriminants)]
#[strum_discriminants(name(RouteKind), derive(Hash, strum::EnumIter, strum::Display))]
pub enum Route {
    Landing,
    Login,
    Register,
    ActivateAccount { token: String },
    ForgotPassword,
    ResetPassword { token: String },
    ConfirmEmail { token: String },
    Home,
    OwnAccount,
    Accounts,
    AccountDetails(AccountId),
    CreateAccount,
    Parkings,
    ParkingDetails(ParkingId),
    OwnReservations,
    ReservationDetails(ReservationId),
    MakeReservation,
    StaffReservations,
    NotFound,
}

/// Which frame a page is rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Public,
    Authenticated(Role),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Render { route: Route, layout: Layout },
    Redirect { to: Route },
}

/// Who may open a kind of route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone, rendered in the frame matching the session
    Any,
    /// Only without a session, logged in users are sent home
    PublicOnly,
    /// Only with a session and a role whose table lists the route
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLink {
    pub label: &'static str,
    pub route: Route,
}

impl Route {
    /// Parses a path. Unknown paths (including malformed ids) are
    /// [`Route::NotFound`]
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Self::Landing,
            ["login"] => Self::Login,
            ["register"] => Self::Register,
            ["activate-account", token] => Self::ActivateAccount {
                token: token.to_string(),
            },
            ["reset-password"] => Self::ForgotPassword,
            ["reset-password", token] => Self::ResetPassword {
                token: token.to_string(),
            },
            ["confirm-email", token] => Self::ConfirmEmail {
                token: token.to_string(),
            },
            ["home"] => Self::Home,
            ["account"] => Self::OwnAccount,
            ["accounts"] => Self::Accounts,
            ["accounts", id] => id.parse().map_or(Self::NotFound, Self::AccountDetails),
            ["create-account"] => Self::CreateAccount,
            ["parking"] => Self::Parkings,
            ["parking", id] => id.parse().map_or(Self::NotFound, Self::ParkingDetails),
            ["reservations"] => Self::OwnReservations,
            ["reservations", id] => id.parse().map_or(Self::NotFound, Self::ReservationDetails),
            ["make-reservation"] => Self::MakeReservation,
            ["staff", "reservations"] => Self::StaffReservations,
            _ => Self::NotFound,
        }
    }

    pub fn to_path(&self) -> String {
        match self {
            Self::Landing => "/".into(),
            Self::Login => "/login".into(),
            Self::Register => "/register".into(),
            Self::ActivateAccount { token } => format!("/activate-account/{token}"),
            Self::ForgotPassword => "/reset-password".into(),
            Self::ResetPassword { token } => format!("/reset-password/{token}"),
            Self::ConfirmEmail { token } => format!("/confirm-email/{token}"),
            Self::Home => "/home".into(),
            Self::OwnAccount => "/account".into(),
            Self::Accounts => "/accounts".into(),
            Self::AccountDetails(id) => format!("/accounts/{id}"),
            Self::CreateAccount => "/create-account".into(),
            Self::Parkings => "/parking".into(),
            Self::ParkingDetails(id) => format!("/parking/{id}"),
            Self::OwnReservations => "/reservations".into(),
            Self::ReservationDetails(id) => format!("/reservations/{id}"),
            Self::MakeReservation => "/make-reservation".into(),
            Self::StaffReservations => "/staff/reservations".into(),
            Self::NotFound => "/not-found".into(),
        }
    }

    pub fn kind(&self) -> RouteKind {
        self.into()
    }

    pub fn title(&self) -> &'static str {
        self.kind().title()
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

impl RouteKind {
    pub fn access(self) -> Access {
        match self {
            Self::Login | Self::Register | Self::ForgotPassword => Access::PublicOnly,
            Self::Landing
            | Self::ActivateAccount
            | Self::ResetPassword
            | Self::ConfirmEmail
            | Self::NotFound => Access::Any,
            Self::Home
            | Self::OwnAccount
            | Self::Accounts
            | Self::AccountDetails
            | Self::CreateAccount
            | Self::Parkings
            | Self::ParkingDetails
            | Self::OwnReservations
            | Self::ReservationDetails
            | Self::MakeReservation
            | Self::StaffReservations => Access::Authenticated,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Landing => "Welcome",
            Self::Login => "Login",
            Self::Register => "Register",
            Self::ActivateAccount => "Activate account",
            Self::ForgotPassword => "Forgot password",
            Self::ResetPassword => "Reset password",
            Self::ConfirmEmail => "Confirm email",
            Self::Home => "Home",
            Self::OwnAccount => "My account",
            Self::Accounts => "Accounts",
            Self::AccountDetails => "Account details",
            Self::CreateAccount => "Create account",
            Self::Parkings => "Parking",
            Self::ParkingDetails => "Parking details",
            Self::OwnReservations => "My reservations",
            Self::ReservationDetails => "Reservation details",
            Self::MakeReservation => "Make reservation",
            Self::StaffReservations => "Reservations",
            Self::NotFound => "Not found",
        }
    }
}

/// Authenticated routes available to each role
pub fn role_routes(role: Role) -> &'static [RouteKind] {
    match role {
        Role::Admin => &[
            RouteKind::Home,
            RouteKind::OwnAccount,
            RouteKind::Accounts,
            RouteKind::AccountDetails,
            RouteKind::CreateAccount,
        ],
        Role::Staff => &[
            RouteKind::Home,
            RouteKind::OwnAccount,
            RouteKind::Parkings,
            RouteKind::ParkingDetails,
            RouteKind::StaffReservations,
        ],
        Role::Client => &[
            RouteKind::Home,
            RouteKind::OwnAccount,
            RouteKind::Parkings,
            RouteKind::ParkingDetails,
            RouteKind::OwnReservations,
            RouteKind::ReservationDetails,
            RouteKind::MakeReservation,
        ],
    }
}

/// Entries of the navigation menu for `role`
pub fn menu_links(role: Role) -> Vec<MenuLink> {
    let link = |label, route| MenuLink { label, route };
    let mut result = vec![link("Home", Route::Home)];
    match role {
        Role::Admin => {
            result.push(link("Accounts", Route::Accounts));
            result.push(link("Create account", Route::CreateAccount));
        }
        Role::Staff => {
            result.push(link("Parking", Route::Parkings));
            result.push(link("Reservations", Route::StaffReservations));
        }
        Role::Client => {
            result.push(link("Parking", Route::Parkings));
            result.push(link("My reservations", Route::OwnReservations));
            result.push(link("Make reservation", Route::MakeReservation));
        }
    }
    result.push(link("My account", Route::OwnAccount));
    result
}

/// Links offered when no one is logged in
pub fn public_links() -> Vec<MenuLink> {
    vec![
        MenuLink {
            label: "Login",
            route: Route::Login,
        },
        MenuLink {
            label: "Register",
            route: Route::Register,
        },
    ]
}

/// Decides what to show for `path`
///
/// A session without an access token counts as no session at all
#[instrument(skip(session), ret)]
pub fn resolve(path: &str, session: Option<&Session>) -> Resolution {
    let route = Route::parse(path);
    let active_role = session
        .filter(|s| s.has_access_token())
        .map(|s| s.active_role);
    let kind = route.kind();
    match (kind.access(), active_role) {
        (_, Some(_)) if kind == RouteKind::Landing => Resolution::Redirect { to: Route::Home },
        (Access::PublicOnly, Some(_)) => Resolution::Redirect { to: Route::Home },
        (Access::Authenticated, None) => Resolution::Redirect { to: Route::Login },
        (Access::Authenticated, Some(role)) if !role_routes(role).contains(&kind) => {
            Resolution::Render {
                route: Route::NotFound,
                layout: Layout::Authenticated(role),
            }
        }
        (_, role) => Resolution::Render {
            route,
            layout: role.map_or(Layout::Public, Layout::Authenticated),
        },
    }
}

#[cfg(test)]
mod tests {
    use parking_shared::time::Timestamp;
    use rstest::{fixture, rstest};
    use secrecy::SecretString;
    use strum::IntoEnumIterator as _;

    use super::*;

    const PARKING_ID: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";

    fn session_with(active_role: Role, token: &str) -> Session {
        Session {
            user_id: "0f8fad5b-d9cb-469f-a165-70867728950e".parse().unwrap(),
            login: "jerzybem".try_into().unwrap(),
            roles: vec![Role::Admin, Role::Staff, Role::Client],
            active_role,
            access_token: SecretString::from(token),
            refresh_token: SecretString::from("refresh"),
            expires_at: Timestamp::from_unix_secs(500),
        }
    }

    #[fixture]
    fn client() -> Session {
        session_with(Role::Client, "token")
    }

    fn render(route: Route, layout: Layout) -> Resolution {
        Resolution::Render { route, layout }
    }

    #[rstest]
    #[case::root("/", Route::Landing)]
    #[case::trailing_slash("/login/", Route::Login)]
    #[case::query("/parking?page=2", Route::Parkings)]
    #[case::token("/activate-account/abc", Route::ActivateAccount { token: "abc".into() })]
    #[case::forgot("/reset-password", Route::ForgotPassword)]
    #[case::reset("/reset-password/xyz", Route::ResetPassword { token: "xyz".into() })]
    #[case::staff("/staff/reservations", Route::StaffReservations)]
    #[case::bad_id("/parking/42", Route::NotFound)]
    #[case::unknown("/nothing-here", Route::NotFound)]
    #[case::too_deep("/accounts/a/b", Route::NotFound)]
    fn parse(#[case] path: &str, #[case] expected: Route) {
        assert_eq!(Route::parse(path), expected);
    }

    #[test]
    fn parse_typed_id() {
        let actual = Route::parse(&format!("/parking/{PARKING_ID}"));

        assert_eq!(actual, Route::ParkingDetails(PARKING_ID.parse().unwrap()));
        assert_eq!(actual.to_path(), format!("/parking/{PARKING_ID}"));
    }

    #[rstest]
    #[case::landing("/", render(Route::Landing, Layout::Public))]
    #[case::login("/login", render(Route::Login, Layout::Public))]
    #[case::token_page("/confirm-email/t", render(Route::ConfirmEmail { token: "t".into() }, Layout::Public))]
    #[case::home("/home", Resolution::Redirect { to: Route::Login })]
    #[case::admin_only("/accounts", Resolution::Redirect { to: Route::Login })]
    #[case::unknown("/nope", render(Route::NotFound, Layout::Public))]
    fn logged_out(#[case] path: &str, #[case] expected: Resolution) {
        assert_eq!(resolve(path, None), expected);
    }

    #[rstest]
    #[case::landing("/", Resolution::Redirect { to: Route::Home })]
    #[case::login("/login", Resolution::Redirect { to: Route::Home })]
    #[case::register("/register", Resolution::Redirect { to: Route::Home })]
    #[case::home("/home", render(Route::Home, Layout::Authenticated(Role::Client)))]
    #[case::reservations("/reservations", render(Route::OwnReservations, Layout::Authenticated(Role::Client)))]
    #[case::other_role("/accounts", render(Route::NotFound, Layout::Authenticated(Role::Client)))]
    #[case::staff_only("/staff/reservations", render(Route::NotFound, Layout::Authenticated(Role::Client)))]
    #[case::public_token("/confirm-email/t", render(Route::ConfirmEmail { token: "t".into() }, Layout::Authenticated(Role::Client)))]
    fn logged_in_as_client(client: Session, #[case] path: &str, #[case] expected: Resolution) {
        assert_eq!(resolve(path, Some(&client)), expected);
    }

    #[test]
    fn active_role_decides_not_other_roles() {
        let admin = session_with(Role::Admin, "token");

        assert_eq!(
            resolve("/accounts", Some(&admin)),
            render(Route::Accounts, Layout::Authenticated(Role::Admin))
        );
        assert_eq!(
            resolve("/parking", Some(&admin)),
            render(Route::NotFound, Layout::Authenticated(Role::Admin))
        );
    }

    #[test]
    fn session_without_token_is_logged_out() {
        let stale = session_with(Role::Admin, "");

        assert_eq!(resolve("/home", Some(&stale)), resolve("/home", None));
        assert_eq!(resolve("/login", Some(&stale)), resolve("/login", None));
    }

    #[test]
    fn every_authenticated_route_reachable_by_some_role() {
        for kind in RouteKind::iter().filter(|k| k.access() == Access::Authenticated) {
            assert!(
                Role::iter().any(|role| role_routes(role).contains(&kind)),
                "{kind} not reachable"
            );
        }
    }

    #[rstest]
    fn menu_only_links_reachable_routes(#[values(Role::Admin, Role::Staff, Role::Client)] role: Role) {
        for link in menu_links(role) {
            assert!(
                role_routes(role).contains(&link.route.kind()),
                "{} offered to {role}",
                link.label
            );
        }
    }
}
