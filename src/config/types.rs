use serde::Deserialize;

/// Environment variable that overrides `api.access-token`
pub const ACCESS_TOKEN_ENV: &str = "VK_ACCESS_TOKEN";

/// Main configuration structure for VK Audience
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub targets: TargetsConfig,
}

/// Upstream API access configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL that method names are appended to
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// API version sent as the `v` parameter
    #[serde(default = "default_version")]
    pub version: String,

    /// Access token; may be left out and supplied through the environment
    #[serde(rename = "access-token", default)]
    pub access_token: Option<String>,

    /// Minimum time between two consecutive API calls (milliseconds)
    #[serde(rename = "request-delay", default = "default_request_delay")]
    pub request_delay: u64,

    /// Number of items requested per page for paginated methods
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory that CSV exports are written to
    #[serde(rename = "export-dir", default = "default_export_dir")]
    pub export_dir: String,

    /// Smallest audience an export is allowed to contain
    #[serde(rename = "min-export-size", default = "default_min_export_size")]
    pub min_export_size: usize,
}

/// Groups and users to harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetsConfig {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub users: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            version: default_version(),
            access_token: None,
            request_delay: default_request_delay(),
            page_size: default_page_size(),
            timeout: default_timeout(),
        }
    }
}

impl ApiConfig {
    /// Resolves the access token, preferring the environment over the file
    pub fn resolve_token(&self) -> Result<String, crate::ConfigError> {
        self.token_with_override(std::env::var(ACCESS_TOKEN_ENV).ok())
    }

    pub(crate) fn token_with_override(
        &self,
        override_token: Option<String>,
    ) -> Result<String, crate::ConfigError> {
        override_token
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.access_token.clone())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(crate::ConfigError::MissingToken(ACCESS_TOKEN_ENV))
    }
}

fn default_base_url() -> String {
    "https://api.vk.com/method".to_string()
}

fn default_version() -> String {
    "5.131".to_string()
}

fn default_request_delay() -> u64 {
    340
}

fn default_page_size() -> u32 {
    1000
}

fn default_timeout() -> u64 {
    30
}

fn default_export_dir() -> String {
    ".".to_string()
}

fn default_min_export_size() -> usize {
    100
}
