use log::*;
use marketplace_common::Secret;

pub const DEFAULT_TRANSFER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default)]
pub struct TransferApiConfig {
    /// Base URL of the provider API, e.g. "https://api.example-payments.test".
    pub base_url: String,
    pub api_key: Secret<String>,
    /// Upper bound on each transfer call. A timed-out call is reported as unreachable; the caller treats that the
    /// same as any other dispatch failure.
    pub timeout_secs: u64,
}

impl TransferApiConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("MSG_TRANSFER_API_URL").unwrap_or_else(|_| {
            warn!("MSG_TRANSFER_API_URL not set, using (probably useless) default");
            "https://api.example-payments.test".to_string()
        });
        let api_key = Secret::new(std::env::var("MSG_TRANSFER_API_KEY").unwrap_or_else(|_| {
            warn!("MSG_TRANSFER_API_KEY not set, using (probably useless) default");
            "skey_00000000000000".to_string()
        }));
        let timeout_secs = std::env::var("MSG_TRANSFER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TRANSFER_TIMEOUT_SECS);
        Self { base_url, api_key, timeout_secs }
    }
}
