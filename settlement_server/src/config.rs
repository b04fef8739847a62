use std::env;

use log::*;
use marketplace_common::{parse_boolean_flag, Secret};
use transfer_tools::TransferApiConfig;

const DEFAULT_MSG_HOST: &str = "127.0.0.1";
const DEFAULT_MSG_PORT: u16 = 8480;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// Webhook signature checking. The provider is normally authenticated upstream (reverse proxy or gateway), so
    /// this is off unless explicitly enabled.
    pub webhook_auth: WebhookAuth,
    /// Buffer size for the settlement event hook channels.
    pub event_buffer_size: usize,
    /// Transfer (payout) API client configuration.
    pub transfer_config: TransferApiConfig,
}

#[derive(Clone, Debug, Default)]
pub struct WebhookAuth {
    pub hmac_checks: bool,
    pub hmac_secret: Secret<String>,
}

/// How handlers should resolve the caller's IP address when the server sits behind a reverse proxy.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProxyConfig {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl From<&ServerConfig> for ProxyConfig {
    fn from(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MSG_HOST.to_string(),
            port: DEFAULT_MSG_PORT,
            database_url: String::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            webhook_auth: WebhookAuth::default(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            transfer_config: TransferApiConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("MSG_HOST").ok().unwrap_or_else(|| DEFAULT_MSG_HOST.into());
        let port = env::var("MSG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("{s} is not a valid port for MSG_PORT. {e} Using the default, {DEFAULT_MSG_PORT}.");
                    DEFAULT_MSG_PORT
                })
            })
            .unwrap_or(DEFAULT_MSG_PORT);
        let database_url = env::var("MSG_DATABASE_URL").unwrap_or_else(|_| {
            error!("MSG_DATABASE_URL is not set. Please set it to the database URL for the settlement server.");
            String::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("MSG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("MSG_USE_FORWARDED").ok(), false);
        let webhook_auth = WebhookAuth::from_env_or_default();
        let event_buffer_size = env::var("MSG_EVENT_BUFFER_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        let transfer_config = TransferApiConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            webhook_auth,
            event_buffer_size,
            transfer_config,
        }
    }
}

impl WebhookAuth {
    pub fn from_env_or_default() -> Self {
        let hmac_checks = parse_boolean_flag(env::var("MSG_WEBHOOK_HMAC_CHECKS").ok(), false);
        let hmac_secret = Secret::new(env::var("MSG_WEBHOOK_SECRET").unwrap_or_else(|_| {
            if hmac_checks {
                warn!("MSG_WEBHOOK_SECRET is not set but MSG_WEBHOOK_HMAC_CHECKS is enabled. All webhook calls \
                     will be rejected until a secret is configured.");
            }
            String::default()
        }));
        Self { hmac_checks, hmac_secret }
    }
}
