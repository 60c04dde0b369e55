use async_trait::async_trait;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::providers::{InvoiceState, LightningError, LightningGateway};

/// LNbits-backed Lightning gateway. Payments go through the admin wallet
/// key; invoice decoding uses the read-only key. Outbound calls run behind a
/// consecutive-failures circuit breaker so a dead gateway fails fast instead
/// of tying up request handlers.
#[derive(Clone)]
pub struct LnBitsClient {
    client: Client,
    base_url: String,
    admin_key: String,
    invoice_key: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

#[derive(Debug, Deserialize)]
struct PaymentResponse {
    payment_hash: String,
}

#[derive(Debug, Deserialize)]
struct PaymentStatus {
    #[serde(default)]
    paid: bool,
    #[serde(default)]
    expired: bool,
}

impl LnBitsClient {
    pub fn new(base_url: String, admin_key: String, invoice_key: String) -> Self {
        Self::with_circuit_breaker(base_url, admin_key, invoice_key, 3, 60)
    }

    pub fn with_circuit_breaker(
        base_url: String,
        admin_key: String,
        invoice_key: String,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        Self {
            client,
            base_url,
            admin_key,
            invoice_key,
            circuit_breaker,
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl LightningGateway for LnBitsClient {
    async fn pay_invoice(&self, bolt11: &str) -> Result<String, LightningError> {
        let url = self.api("/payments");
        let client = self.client.clone();
        let admin_key = self.admin_key.clone();
        let body = json!({ "out": true, "bolt11": bolt11 });

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client
                    .post(&url)
                    .header("X-Api-Key", admin_key)
                    .json(&body)
                    .send()
                    .await?;

                if !response.status().is_success() {
                    let detail = response.text().await.unwrap_or_default();
                    return Err(LightningError::Rejected(detail));
                }

                let payment = response.json::<PaymentResponse>().await?;
                Ok(payment.payment_hash)
            })
            .await;

        match result {
            Ok(hash) => Ok(hash),
            Err(FailsafeError::Rejected) => Err(LightningError::CircuitOpen),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }

    async fn validate_invoice(&self, bolt11: &str) -> bool {
        let url = self.api(&format!("/payments/decode/{}", bolt11));
        match self
            .client
            .get(&url)
            .header("X-Api-Key", self.invoice_key.clone())
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn invoice_status(&self, payment_hash: &str) -> Result<InvoiceState, LightningError> {
        let url = self.api(&format!("/payments/{}", payment_hash));
        let status = self
            .client
            .get(&url)
            .header("X-Api-Key", self.admin_key.clone())
            .send()
            .await?
            .error_for_status()
            .map_err(LightningError::Http)?
            .json::<PaymentStatus>()
            .await?;

        if status.paid {
            Ok(InvoiceState::Paid)
        } else if status.expired {
            Ok(InvoiceState::Expired)
        } else {
            Ok(InvoiceState::Pending)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> LnBitsClient {
        LnBitsClient::new(base.to_string(), "admin".to_string(), "invoice".to_string())
    }

    #[tokio::test]
    async fn pays_invoice_and_returns_payment_hash() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/payments")
            .match_header("x-api-key", "admin")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"payment_hash":"e35526a43d04e17b8df0f3e8e8c651f06fa4c41b"}"#)
            .create_async()
            .await;

        let hash = client(&server.url()).pay_invoice("lnbc10n1p...").await.unwrap();
        assert_eq!(hash, "e35526a43d04e17b8df0f3e8e8c651f06fa4c41b");
    }

    #[tokio::test]
    async fn rejected_payment_surfaces_gateway_detail() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/payments")
            .with_status(520)
            .with_body(r#"{"detail":"Payment failed: no route"}"#)
            .create_async()
            .await;

        let result = client(&server.url()).pay_invoice("lnbc10n1p...").await;
        match result {
            Err(LightningError::Rejected(detail)) => assert!(detail.contains("no route")),
            other => panic!("expected rejection, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn validate_invoice_follows_decode_status() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", mockito::Matcher::Regex(r"/api/v1/payments/decode/good.*".into()))
            .with_status(200)
            .create_async()
            .await;
        let _bad = server
            .mock("GET", mockito::Matcher::Regex(r"/api/v1/payments/decode/bad.*".into()))
            .with_status(400)
            .create_async()
            .await;

        let c = client(&server.url());
        assert!(c.validate_invoice("good").await);
        assert!(!c.validate_invoice("bad").await);
    }

    #[tokio::test]
    async fn invoice_status_maps_gateway_flags() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/payments/abc")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"paid":true,"expired":false}"#)
            .create_async()
            .await;

        let state = client(&server.url()).invoice_status("abc").await.unwrap();
        assert_eq!(state, InvoiceState::Paid);
    }

    #[tokio::test]
    async fn circuit_opens_after_consecutive_failures() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/payments")
            .with_status(500)
            .expect_at_least(3)
            .create_async()
            .await;

        let c = LnBitsClient::with_circuit_breaker(
            server.url(),
            "admin".to_string(),
            "invoice".to_string(),
            3,
            60,
        );

        for _ in 0..3 {
            let _ = c.pay_invoice("lnbc...").await;
        }

        let result = c.pay_invoice("lnbc...").await;
        assert!(matches!(result, Err(LightningError::CircuitOpen)));
    }
}
