//! Gateway request and response types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Response wrapper used by every gateway endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub code: i32,
    #[serde(default)]
    pub message: Option<String>,
    pub response: Option<T>,
}

#[derive(Serialize)]
pub(crate) struct TokenRequest<'a> {
    pub imp_key: &'a str,
    pub imp_secret: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    /// Gateway clock at issue, unix seconds.
    pub now: i64,
    /// Expiry on the gateway clock, unix seconds.
    pub expired_at: i64,
}

/// Payment state as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Window opened, or virtual account issued and awaiting deposit.
    Ready,
    Paid,
    Cancelled,
    Failed,
}

/// A payment looked up by `imp_uid`.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPayment {
    pub imp_uid: String,
    /// Our order number.
    pub merchant_uid: String,
    pub status: PaymentStatus,
    pub amount: Decimal,
    #[serde(default)]
    pub cancel_amount: Decimal,
    #[serde(default)]
    pub pay_method: Option<String>,
    /// Unix seconds, 0 when unpaid.
    #[serde(default)]
    pub paid_at: i64,
    #[serde(default)]
    pub fail_reason: Option<String>,
}

impl GatewayPayment {
    #[must_use]
    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        if self.paid_at > 0 {
            DateTime::from_timestamp(self.paid_at, 0)
        } else {
            None
        }
    }

    /// Paid in full for `expected` and not partially cancelled.
    #[must_use]
    pub fn settles(&self, expected: Decimal) -> bool {
        self.status == PaymentStatus::Paid
            && self.amount == expected
            && self.cancel_amount.is_zero()
    }
}

/// Cancel (refund) a payment, fully or partially.
#[derive(Debug, Clone, Serialize)]
pub struct CancelRequest {
    pub imp_uid: String,
    /// Partial amount; omitted for a full cancel.
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub amount: Option<Decimal>,
    /// Remaining cancellable amount we expect, guarding against double refunds.
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub checksum: Option<Decimal>,
    pub reason: String,
}

impl CancelRequest {
    /// Cancel everything that is left on the payment.
    #[must_use]
    pub fn full(imp_uid: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            imp_uid: imp_uid.into(),
            amount: None,
            checksum: None,
            reason: reason.into(),
        }
    }
}

/// Body of a payment-status notification.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookNotification {
    pub imp_uid: String,
    pub merchant_uid: String,
    pub status: PaymentStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_from_gateway_json() {
        let json = r#"{
            "code": 0,
            "message": null,
            "response": {
                "imp_uid": "imp_448280090638",
                "merchant_uid": "20260114-AB12CD34",
                "status": "paid",
                "amount": 43900,
                "cancel_amount": 0,
                "pay_method": "card",
                "paid_at": 1768370400,
                "buyer_name": "Kim"
            }
        }"#;

        let envelope: Envelope<GatewayPayment> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.code, 0);
        let payment = envelope.response.unwrap();
        assert_eq!(payment.status, PaymentStatus::Paid);
        assert!(payment.settles(Decimal::from(43_900)));
        assert!(!payment.settles(Decimal::from(43_000)));
        assert!(payment.paid_at().is_some());
    }

    #[test]
    fn test_unpaid_payment_has_no_paid_at() {
        let json = r#"{
            "imp_uid": "imp_1",
            "merchant_uid": "20260114-AAAAAAAA",
            "status": "ready",
            "amount": 1000,
            "paid_at": 0
        }"#;

        let payment: GatewayPayment = serde_json::from_str(json).unwrap();
        assert!(payment.paid_at().is_none());
        assert!(!payment.settles(Decimal::from(1_000)));
    }

    #[test]
    fn test_error_envelope() {
        let json = r#"{"code": -1, "message": "존재하지 않는 결제정보입니다.", "response": null}"#;
        let envelope: Envelope<GatewayPayment> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.code, -1);
        assert!(envelope.response.is_none());
    }

    #[test]
    fn test_full_cancel_omits_amount() {
        let request = CancelRequest::full("imp_1", "customer request");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["imp_uid"], "imp_1");
        assert!(json.get("amount").is_none());
        assert!(json.get("checksum").is_none());
    }

    #[test]
    fn test_partial_cancel_sends_number() {
        let request = CancelRequest {
            imp_uid: "imp_1".to_string(),
            amount: Some(Decimal::from(5_000)),
            checksum: Some(Decimal::from(43_900)),
            reason: "partial".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["amount"].as_f64(), Some(5000.0));
        assert_eq!(json["checksum"].as_f64(), Some(43900.0));
    }
}
