//! VK API fetcher implementation
//!
//! This module handles all HTTP requests to the VK API, including:
//! - Building HTTP clients with a proper user agent string
//! - Attaching the access token and API version to every call
//! - Enforcing the inter-request delay
//! - Classifying responses as items, API errors or transport errors

use crate::config::ApiConfig;
use crate::crawler::report::TargetError;
use crate::crawler::throttle::Throttle;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Paginated list of group members
pub const GROUP_MEMBERS: &str = "groups.getMembers";

/// Complete friend list of a user, returned in one response
pub const USER_FRIENDS: &str = "friends.get";

/// Paginated list of a user's followers
pub const USER_FOLLOWERS: &str = "users.getFollowers";

/// Profile fields requested for every listed account
pub const ACCOUNT_FIELDS: &str = "sex,deactivated";

/// One account entry as returned by the list methods
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawAccount {
    pub id: i64,

    /// 1 = female, 2 = male, 0 or absent = not declared
    #[serde(default)]
    pub sex: Option<i64>,

    /// Set whenever the entry carries a `deactivated` key, whatever its value
    #[serde(default, deserialize_with = "key_present")]
    pub deactivated: bool,
}

impl RawAccount {
    pub fn is_deactivated(&self) -> bool {
        self.deactivated
    }
}

fn key_present<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde::de::IgnoredAny::deserialize(deserializer)?;
    Ok(true)
}

/// Result of a single API call
#[derive(Debug, Clone, PartialEq)]
pub enum PageResult {
    /// The call returned a list of accounts
    Ok(Vec<RawAccount>),

    /// The API answered with a structured error
    ApiError {
        code: Option<i64>,
        message: String,
    },

    /// The call never produced a usable API answer
    TransportError {
        cause: String,
    },
}

impl PageResult {
    pub fn into_result(self) -> Result<Vec<RawAccount>, TargetError> {
        match self {
            Self::Ok(items) => Ok(items),
            Self::ApiError { code, message } => Err(TargetError::Api { code, message }),
            Self::TransportError { cause } => Err(TargetError::Transport { cause }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    response: Option<ItemsResponse>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ItemsResponse {
    #[serde(default)]
    items: Vec<RawAccount>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error_code: Option<i64>,
    #[serde(default)]
    error_msg: String,
}

/// Builds an HTTP client for the VK API
///
/// # Arguments
///
/// * `config` - The API configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ApiConfig) -> Result<Client, reqwest::Error> {
    let user_agent = format!("vk-audience/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.timeout))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Parses a raw response body into a page result
///
/// An `error` object wins over a `response` object; a body with neither is a
/// transport-level failure.
pub fn parse_page(body: &str) -> PageResult {
    let envelope: ApiEnvelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            return PageResult::TransportError {
                cause: format!("Malformed API response: {}", e),
            }
        }
    };

    if let Some(error) = envelope.error {
        return PageResult::ApiError {
            code: error.error_code,
            message: error.error_msg,
        };
    }

    match envelope.response {
        Some(response) => PageResult::Ok(response.items),
        None => PageResult::TransportError {
            cause: "API response has neither 'response' nor 'error'".to_string(),
        },
    }
}

/// Rate-limited client for the VK list methods
///
/// All calls made through one fetcher share a single throttle, so sequential
/// pagination, the friends call and the next target are all spaced out.
pub struct ApiFetcher {
    client: Client,
    base_url: String,
    version: String,
    token: String,
    throttle: Throttle,
}

impl ApiFetcher {
    /// Creates a fetcher from the API configuration and a resolved token
    pub fn new(config: &ApiConfig, token: String) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            version: config.version.clone(),
            token,
            throttle: Throttle::from_millis(config.request_delay),
        })
    }

    /// Number of API calls issued so far
    pub fn request_count(&self) -> u64 {
        self.throttle.request_count()
    }

    /// Issues one GET against an API method
    ///
    /// # Arguments
    ///
    /// * `method` - API method name, e.g. `groups.getMembers`
    /// * `params` - Method parameters; token and version are added here
    ///
    /// # Returns
    ///
    /// A PageResult; failures are reported as values, never as panics
    pub async fn fetch(&mut self, method: &str, params: &[(&str, String)]) -> PageResult {
        self.throttle.acquire().await;

        let url = format!("{}/{}", self.base_url, method);
        tracing::debug!("GET {} {:?}", method, params);

        let response = match self
            .client
            .get(&url)
            .query(params)
            .query(&[
                ("access_token", self.token.as_str()),
                ("v", self.version.as_str()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return PageResult::TransportError {
                    cause: describe_transport_error(e),
                }
            }
        };

        let status = response.status();
        if !status.is_success() {
            return PageResult::TransportError {
                cause: format!("HTTP {} from {}", status.as_u16(), method),
            };
        }

        match response.text().await {
            Ok(body) => parse_page(&body),
            Err(e) => PageResult::TransportError {
                cause: describe_transport_error(e),
            },
        }
    }
}

/// Describes a reqwest failure without leaking the token-bearing URL
fn describe_transport_error(error: reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else {
        error.without_url().to_string()
    }
}
