//! Gateway credentials.

use secrecy::SecretString;

/// Production REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.iamport.kr";

/// Payment gateway configuration.
#[derive(Clone)]
pub struct PaymentConfig {
    /// REST API key (`imp_key`).
    pub api_key: String,
    /// REST API secret (`imp_secret`).
    pub api_secret: SecretString,
    /// Shared secret for webhook signatures. Unsigned webhooks are accepted
    /// when unset.
    pub webhook_secret: Option<SecretString>,
    /// API base URL, overridable for tests.
    pub base_url: String,
    /// Merchant identification code handed to the browser SDK.
    pub merchant_code: String,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("base_url", &self.base_url)
            .field("merchant_code", &self.merchant_code)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let config = PaymentConfig {
            api_key: "imp_key_123".to_string(),
            api_secret: SecretString::from("super-secret-value"),
            webhook_secret: Some(SecretString::from("whsec_abc")),
            base_url: DEFAULT_BASE_URL.to_string(),
            merchant_code: "imp12345678".to_string(),
        };

        let debug = format!("{config:?}");
        assert!(debug.contains("imp_key_123"));
        assert!(!debug.contains("super-secret-value"));
        assert!(!debug.contains("whsec_abc"));
    }
}
