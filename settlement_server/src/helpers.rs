use std::{net::IpAddr, str::FromStr};

use actix_web::HttpRequest;
use hmac::{Hmac, Mac};
use log::{debug, trace};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies the provider's webhook signature: base64(HMAC-SHA256(secret, raw_body)) in the `X-Signature` header.
/// The comparison happens inside the MAC verification, so it is constant-time.
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature_b64: &str) -> bool {
    let signature = match base64::decode(signature_b64.trim()) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result =
            req.headers().get("X-Forwarded-For").and_then(|v| v.to_str().ok()).and_then(|s| IpAddr::from_str(s).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        result = req
            .headers()
            .get("Forwarded")
            .and_then(|v| v.to_str().ok())
            .and_then(forwarded_for)
            .and_then(|s| IpAddr::from_str(s).ok());
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.connection_info().peer_addr().map(|a| a.to_string());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr.and_then(|s| IpAddr::from_str(&s).ok())
    })
}

/// Extracts the `for=` directive from a `Forwarded` header value.
fn forwarded_for(value: &str) -> Option<&str> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|directive| directive.strip_prefix("for="))
        .map(|v| v.trim_matches('"'))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn forwarded_header_parsing() {
        assert_eq!(forwarded_for("for=192.0.2.60;proto=http;by=203.0.113.43"), Some("192.0.2.60"));
        assert_eq!(forwarded_for("proto=http; for=\"198.51.100.17\""), Some("198.51.100.17"));
        assert_eq!(forwarded_for("proto=http"), None);
    }

    #[test]
    fn signature_round_trip() {
        let secret = "whsec_test";
        let body = br#"{"key":"charge.complete"}"#;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        let signature = base64::encode(mac.finalize().into_bytes());
        assert!(verify_webhook_signature(secret, body, &signature));
        assert!(!verify_webhook_signature(secret, body, "bm90IGEgc2lnbmF0dXJl"));
        assert!(!verify_webhook_signature(secret, body, "not base64 !!"));
        assert!(!verify_webhook_signature("other_secret", body, &signature));
    }
}
