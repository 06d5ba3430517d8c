//! Endpoint configuration. Build-time defaults come from environment
//! variables visible to the compiler (`API_ENDPOINT`, `APP_ORIGIN`); native
//! processes can override them at runtime through the same variables.
//! Values are public; do not store secrets here.

/// Remote backend used when neither build nor runtime configuration set one.
pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:4000";
/// Origin of the local API layer for server-relative URLs on native hosts.
pub const DEFAULT_APP_ORIGIN: &str = "http://localhost:3000";

/// Where requests go and which routes carry session meaning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Default base URL for every request without a base override.
    pub api_endpoint: String,
    /// Origin that server-relative URLs resolve against outside the browser.
    pub app_origin: String,
    /// Normalized path of the local login route.
    pub login_path: String,
    /// Normalized path of the local logout route.
    pub logout_path: String,
    /// Page the browser is sent to after the session ends.
    pub login_page: String,
    /// Page that finishes a logout started on the server.
    pub logout_page: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            app_origin: DEFAULT_APP_ORIGIN.to_string(),
            login_path: "api/auth/login".to_string(),
            logout_path: "api/auth/logout".to_string(),
            login_page: "/login".to_string(),
            logout_page: "/logout".to_string(),
        }
    }
}

impl ClientConfig {
    /// Loads config from build-time environment variables and applies runtime overrides.
    pub fn load() -> Self {
        let mut config = Self::default();
        apply_overrides(
            &mut config,
            Overrides {
                api_endpoint: option_env!("API_ENDPOINT").and_then(normalize_value),
                app_origin: option_env!("APP_ORIGIN").and_then(normalize_value),
            },
        );
        apply_overrides(&mut config, runtime_overrides());
        config
    }

    /// Same config with a different default backend.
    pub fn with_api_endpoint(mut self, api_endpoint: impl Into<String>) -> Self {
        self.api_endpoint = api_endpoint.into();
        self
    }

    pub fn with_app_origin(mut self, app_origin: impl Into<String>) -> Self {
        self.app_origin = app_origin.into();
        self
    }
}

#[derive(Default)]
struct Overrides {
    api_endpoint: Option<String>,
    app_origin: Option<String>,
}

fn apply_overrides(config: &mut ClientConfig, overrides: Overrides) {
    if let Some(value) = overrides.api_endpoint {
        config.api_endpoint = value;
    }
    if let Some(value) = overrides.app_origin {
        config.app_origin = value;
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn runtime_overrides() -> Overrides {
    let read = |key: &str| std::env::var(key).ok().as_deref().and_then(normalize_value);
    Overrides {
        api_endpoint: read("API_ENDPOINT"),
        app_origin: read("APP_ORIGIN"),
    }
}

#[cfg(target_arch = "wasm32")]
fn runtime_overrides() -> Overrides {
    Overrides::default()
}

/// Trims the value and drops the trailing slash; blank values are ignored.
fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
