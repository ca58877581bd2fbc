//! Checkout and payment endpoints.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{debug, info, instrument, warn};

use purewell_core::models::Order;
use purewell_payments::{WebhookNotification, verify_webhook_signature};

use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::services::checkout::{CheckoutService, Discounts, PaymentRequest, PlaceOrder, QuoteView};
use crate::state::AppState;

/// Payment completion body sent by the browser after the gateway window.
#[derive(Debug, Deserialize)]
pub struct CompletePayment {
    pub imp_uid: String,
    pub merchant_uid: String,
}

/// Webhook acknowledgement.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

/// Price the current cart. Nothing is written.
///
/// POST /api/checkout/quote
#[instrument(skip(state, session, member))]
pub async fn quote(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(member): OptionalAuth,
    Json(discounts): Json<Discounts>,
) -> Result<Json<QuoteView>> {
    let quote = CheckoutService::new(&state)
        .quote(&session, member.as_ref(), &discounts)
        .await?;
    Ok(Json(quote))
}

/// Create a pending order and return the gateway parameters.
///
/// POST /api/checkout
#[instrument(skip_all, fields(member_id = %member.id))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
    Json(form): Json<PlaceOrder>,
) -> Result<(StatusCode, Json<PaymentRequest>)> {
    let request = CheckoutService::new(&state)
        .place_order(&member, &form)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Confirm a payment after the gateway window closes.
///
/// POST /api/checkout/complete
#[instrument(skip(state, member), fields(member_id = %member.id))]
pub async fn complete(
    State(state): State<AppState>,
    RequireAuth(member): RequireAuth,
    Json(req): Json<CompletePayment>,
) -> Result<Json<Order>> {
    let order = CheckoutService::new(&state)
        .complete(&member, &req.imp_uid, &req.merchant_uid)
        .await?;
    Ok(Json(order))
}

/// Gateway notification.
///
/// POST /api/payments/webhook
///
/// Verified with the `webhook-id`, `webhook-timestamp` and
/// `webhook-signature` headers when a webhook secret is configured. Payments
/// that cannot be applied are refunded and acknowledged with 200 so the
/// gateway stops retrying; only server errors return a failure status.
#[instrument(skip_all)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookAck>> {
    if let Some(secret) = state.payments().webhook_secret() {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| AppError::Unauthorized(format!("Missing {name} header")))
        };
        verify_webhook_signature(
            secret,
            header("webhook-id")?,
            header("webhook-timestamp")?,
            &body,
            header("webhook-signature")?,
        )
        .map_err(|e| {
            warn!(error = %e, "Rejected webhook");
            AppError::Unauthorized("Invalid signature".to_string())
        })?;
    } else {
        debug!("No webhook secret configured; skipping signature check");
    }

    let notification: WebhookNotification = serde_json::from_str(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook body: {e}")))?;

    info!(
        imp_uid = %notification.imp_uid,
        merchant_uid = %notification.merchant_uid,
        status = ?notification.status,
        "Payment webhook received"
    );

    let outcome = CheckoutService::new(&state)
        .reconcile(&notification.imp_uid, &notification.merchant_uid)
        .await;
    acknowledge(outcome).map(Json)
}

/// Client-side outcomes are final and acknowledged; server errors are
/// returned so the gateway retries.
fn acknowledge(outcome: Result<Option<Order>>) -> Result<WebhookAck> {
    match outcome {
        Ok(Some(_)) => Ok(WebhookAck { status: "processed" }),
        Ok(None) => Ok(WebhookAck { status: "ignored" }),
        Err(AppError::Conflict(reason) | AppError::BadRequest(reason)) => {
            warn!(%reason, "Webhook payment not applied");
            Ok(WebhookAck { status: "rejected" })
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use purewell_payments::PaymentError;

    use super::*;

    #[test]
    fn test_acknowledge_final_outcomes() {
        assert_eq!(acknowledge(Ok(None)).map(|a| a.status).ok(), Some("ignored"));
        assert_eq!(
            acknowledge(Err(AppError::Conflict("Order is cancelled".to_string())))
                .map(|a| a.status)
                .ok(),
            Some("rejected")
        );
        assert_eq!(
            acknowledge(Err(AppError::BadRequest("merchant_uid mismatch".to_string())))
                .map(|a| a.status)
                .ok(),
            Some("rejected")
        );
    }

    #[test]
    fn test_acknowledge_retries_server_errors() {
        assert!(matches!(
            acknowledge(Err(AppError::Payment(PaymentError::Unauthorized))),
            Err(AppError::Payment(_))
        ));
        assert!(matches!(
            acknowledge(Err(AppError::Internal("refunded but not updated".to_string()))),
            Err(AppError::Internal(_))
        ));
    }
}
