//! Gateway REST client.

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::config::PaymentConfig;
use crate::error::PaymentError;
use crate::types::{CancelRequest, Envelope, GatewayPayment, TokenRequest, TokenResponse};

/// Seconds before expiry at which a cached token is replaced.
const TOKEN_EXPIRY_BUFFER_SECS: i64 = 60;

/// Cached access token.
#[derive(Clone)]
struct AccessToken {
    token: SecretString,
    /// Expiry on the local clock, unix seconds.
    expires_at: i64,
}

impl AccessToken {
    fn from_response(response: TokenResponse) -> Self {
        // The gateway reports expiry on its own clock; keep only the lifetime.
        let lifetime = response.expired_at - response.now;
        Self {
            token: SecretString::from(response.access_token),
            expires_at: chrono::Utc::now().timestamp() + lifetime,
        }
    }

    fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        now >= self.expires_at - TOKEN_EXPIRY_BUFFER_SECS
    }
}

/// Payment gateway client.
///
/// Cheap to clone. Access tokens are cached in memory and fetched again
/// shortly before they expire.
#[derive(Clone)]
pub struct PaymentClient {
    inner: Arc<PaymentClientInner>,
}

struct PaymentClientInner {
    client: reqwest::Client,
    config: PaymentConfig,
    token: RwLock<Option<AccessToken>>,
}

impl PaymentClient {
    /// Create a new gateway client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: PaymentConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(PaymentClientInner {
                client,
                config,
                token: RwLock::new(None),
            }),
        })
    }

    /// Merchant code for the browser SDK.
    #[must_use]
    pub fn merchant_code(&self) -> &str {
        &self.inner.config.merchant_code
    }

    /// Webhook signing secret, when configured.
    #[must_use]
    pub fn webhook_secret(&self) -> Option<&SecretString> {
        self.inner.config.webhook_secret.as_ref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.config.base_url.trim_end_matches('/'))
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Return a valid access token, fetching a new one if needed.
    async fn access_token(&self) -> Result<SecretString, PaymentError> {
        {
            let cached = self.inner.token.read().await;
            if let Some(token) = cached.as_ref().filter(|t| !t.is_expired()) {
                return Ok(token.token.clone());
            }
        }

        let mut slot = self.inner.token.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(token) = slot.as_ref().filter(|t| !t.is_expired()) {
            return Ok(token.token.clone());
        }

        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *slot = Some(fresh);
        Ok(token)
    }

    #[instrument(skip(self))]
    async fn fetch_token(&self) -> Result<AccessToken, PaymentError> {
        let config = &self.inner.config;
        let response = self
            .inner
            .client
            .post(self.url("/users/getToken"))
            .json(&TokenRequest {
                imp_key: &config.api_key,
                imp_secret: config.api_secret.expose_secret(),
            })
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(PaymentError::Unauthorized);
        }

        let token: TokenResponse = Self::unwrap_envelope(response).await?;
        debug!("Fetched payment gateway access token");
        Ok(AccessToken::from_response(token))
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Look up a payment by its gateway id.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotFound` if the gateway has no such payment.
    #[instrument(skip(self))]
    pub async fn get_payment(&self, imp_uid: &str) -> Result<GatewayPayment, PaymentError> {
        let token = self.access_token().await?;
        let response = self
            .inner
            .client
            .get(self.url(&format!("/payments/{imp_uid}")))
            .header("Authorization", token.expose_secret())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PaymentError::NotFound(imp_uid.to_string()));
        }

        Self::unwrap_envelope(response).await
    }

    /// Cancel a payment. Returns the payment as it stands afterwards.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Gateway` if the gateway refuses the cancel, for
    /// example because the payment was already cancelled.
    #[instrument(skip(self, request), fields(imp_uid = %request.imp_uid))]
    pub async fn cancel_payment(
        &self,
        request: &CancelRequest,
    ) -> Result<GatewayPayment, PaymentError> {
        let token = self.access_token().await?;
        let response = self
            .inner
            .client
            .post(self.url("/payments/cancel"))
            .header("Authorization", token.expose_secret())
            .json(request)
            .send()
            .await?;

        let payment: GatewayPayment = Self::unwrap_envelope(response).await?;
        debug!(
            cancel_amount = %payment.cancel_amount,
            "Payment cancelled at gateway"
        );
        Ok(payment)
    }

    /// Parse the `{code, message, response}` wrapper.
    async fn unwrap_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PaymentError> {
        let status = response.status();
        let body = response.text().await?;

        let Ok(envelope) = serde_json::from_str::<Envelope<T>>(&body) else {
            if status.is_success() {
                return Err(PaymentError::Parse(format!(
                    "Unexpected gateway response: {body}"
                )));
            }
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message: body,
            });
        };

        if envelope.code != 0 {
            let message = envelope
                .message
                .unwrap_or_else(|| "Unknown gateway error".to_string());
            warn!(code = envelope.code, %message, "Payment gateway returned an error");
            return Err(PaymentError::Gateway {
                code: envelope.code,
                message,
            });
        }

        envelope
            .response
            .ok_or_else(|| PaymentError::Parse("Gateway response body was empty".to_string()))
    }
}

impl std::fmt::Debug for PaymentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentClient")
            .field("base_url", &self.inner.config.base_url)
            .field("merchant_code", &self.inner.config.merchant_code)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BASE_URL;

    fn config(base_url: &str) -> PaymentConfig {
        PaymentConfig {
            api_key: "key".to_string(),
            api_secret: SecretString::from("secret"),
            webhook_secret: None,
            base_url: base_url.to_string(),
            merchant_code: "imp00000000".to_string(),
        }
    }

    #[test]
    fn test_token_lifetime_uses_gateway_clock() {
        let token = AccessToken::from_response(TokenResponse {
            access_token: "abc".to_string(),
            now: 1_000,
            expired_at: 2_800,
        });
        let expected = chrono::Utc::now().timestamp() + 1_800;
        assert!((token.expires_at - expected).abs() <= 1);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_token_expires_within_buffer() {
        let token = AccessToken {
            token: SecretString::from("abc"),
            expires_at: chrono::Utc::now().timestamp() + 30,
        };
        assert!(token.is_expired());
    }

    #[test]
    fn test_url_joining() {
        let client = PaymentClient::new(config("https://api.example.test/")).unwrap();
        assert_eq!(
            client.url("/payments/imp_1"),
            "https://api.example.test/payments/imp_1"
        );

        let client = PaymentClient::new(config(DEFAULT_BASE_URL)).unwrap();
        assert_eq!(client.url("/users/getToken"), "https://api.iamport.kr/users/getToken");
        assert_eq!(client.merchant_code(), "imp00000000");
    }
}
