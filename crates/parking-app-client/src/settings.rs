//! Settings of the client that may differ between deployments

use std::time::Duration;

use parking_shared::{
    const_config::client::{
        CLIENT_DEFAULT_SERVER_ADDRESS, CLIENT_DEFAULT_TOAST_LIFETIME,
        CLIENT_DEFAULT_TOKEN_REFRESH_LEAD,
    },
    time::Seconds,
};

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Base address of the REST API including any path prefix
    pub server_address: String,
    /// How long before the access token expires the user is offered a refresh
    pub token_refresh_lead_secs: u64,
    pub toast_lifetime_secs: u64,
    /// Where the session is kept between runs on native. Not used on the web
    pub storage_path: Option<std::path::PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_address: CLIENT_DEFAULT_SERVER_ADDRESS.to_string(),
            token_refresh_lead_secs: CLIENT_DEFAULT_TOKEN_REFRESH_LEAD.as_u64(),
            toast_lifetime_secs: CLIENT_DEFAULT_TOAST_LIFETIME.as_u64(),
            storage_path: None,
        }
    }
}

impl ClientSettings {
    pub fn token_refresh_lead(&self) -> Seconds {
        Seconds::new(self.token_refresh_lead_secs)
    }

    pub fn toast_lifetime(&self) -> Duration {
        Seconds::new(self.toast_lifetime_secs).into()
    }

    /// The API is expected on the same origin the app was served from
    #[cfg(target_arch = "wasm32")]
    pub fn for_web() -> Self {
        let origin = web_sys::window().and_then(|window| window.location().origin().ok());
        match origin {
            Some(origin) => Self {
                server_address: format!("{origin}/api/v1"),
                ..Default::default()
            },
            None => Self::default(),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn storage_path(&self) -> std::path::PathBuf {
        self.storage_path
            .clone()
            .unwrap_or_else(|| std::path::PathBuf::from("data").join("session.json"))
    }
}

/// Layers the defaults, the optional settings file, `APP_` environment
/// variables and finally the command line
///
/// E.g. `APP_SERVER_ADDRESS=https://parking.example.com/api/v1` sets
/// [`ClientSettings::server_address`]
#[cfg(not(target_arch = "wasm32"))]
pub fn load(cli: &crate::cli::Cli) -> Result<ClientSettings, config::ConfigError> {
    let defaults = ClientSettings::default();
    let mut builder = config::Config::builder()
        .set_default("server_address", defaults.server_address)?
        .set_default("token_refresh_lead_secs", defaults.token_refresh_lead_secs)?
        .set_default("toast_lifetime_secs", defaults.toast_lifetime_secs)?
        .add_source(config::File::from(cli.config_file.clone()).required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        );
    if let Some(server_address) = &cli.server_address {
        builder = builder.set_override("server_address", server_address.clone())?;
    }
    builder.build()?.try_deserialize()
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use clap::Parser as _;

    use super::*;
    use crate::cli::Cli;

    #[test]
    fn defaults_used_without_settings_file() {
        let cli = Cli::parse_from(["parking", "--config-file", "does/not/exist.toml"]);

        let actual = load(&cli).unwrap();

        assert_eq!(actual.token_refresh_lead(), CLIENT_DEFAULT_TOKEN_REFRESH_LEAD);
        assert_eq!(actual.toast_lifetime(), Duration::from_secs(5));
        assert_eq!(actual.storage_path, None);
    }

    #[test]
    fn command_line_overrides_server_address() {
        let cli = Cli::parse_from([
            "parking",
            "--config-file",
            "does/not/exist.toml",
            "--server-address",
            "https://parking.example.com/api/v1",
        ]);

        let actual = load(&cli).unwrap();

        assert_eq!(actual.server_address, "https://parking.example.com/api/v1");
    }

    #[test]
    fn bundled_settings_file_matches_defaults() {
        let cli = Cli::parse_from(["parking"]);

        let actual = load(&cli).unwrap();

        assert_eq!(
            actual.token_refresh_lead_secs,
            ClientSettings::default().token_refresh_lead_secs
        );
        assert_eq!(
            actual.toast_lifetime_secs,
            ClientSettings::default().toast_lifetime_secs
        );
    }
}
