//! HTTP implementation of the processor API
//!
//! All requests are form-encoded; all responses are JSON with a top-level
//! `error.message` (and optional `error.code`) on failure. A 401 is
//! classified as a configuration error (bad credentials), connectivity and
//! timeout failures as transient, and everything else as a processor
//! rejection.

use crate::client::{AccountCapabilities, CreatedAccount, ProcessorApi};
use crate::config::{ExecutionMode, ProcessorConfig};
use crate::types::EngineError;
use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

/// Retry budget for read-only/idempotent calls
const MAX_ATTEMPTS: u32 = 3;

/// Initial retry backoff
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Backoff cap
const MAX_BACKOFF: Duration = Duration::from_millis(2000);

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct CreateAccountResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct AccountStatusResponse {
    #[serde(default)]
    details_submitted: bool,
    #[serde(default)]
    charges_enabled: bool,
    #[serde(default)]
    payouts_enabled: bool,
}

#[derive(Debug, Deserialize)]
struct OnboardingLinkResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct TransferResponse {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorEnvelope {
    #[serde(default)]
    error: ApiErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    code: Option<String>,
}

/// reqwest-backed processor client
pub struct ProcessorClient {
    http: reqwest::Client,
    config: ProcessorConfig,
}

impl ProcessorClient {
    /// Build a client from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the secret key is absent or the
    /// HTTP client cannot be constructed; no processor call is ever
    /// attempted with an empty key.
    pub fn new(config: ProcessorConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                EngineError::configuration(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(ProcessorClient { http, config })
    }

    /// The publishable key the consuming UI needs for its own widgets
    pub fn publishable_key(&self) -> &str {
        &self.config.publishable_key
    }

    /// Run a read-only call with bounded exponential backoff
    ///
    /// Retries only transient failures; processor rejections and
    /// configuration errors surface immediately.
    async fn with_retry<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, EngineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
    {
        let mut delay = INITIAL_BACKOFF;

        for attempt in 1..=MAX_ATTEMPTS {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt < MAX_ATTEMPTS => {
                    tracing::warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "transient processor failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_BACKOFF);
                }
                Err(EngineError::TransientNetwork {
                    operation, message, ..
                }) => {
                    return Err(EngineError::TransientNetwork {
                        operation,
                        attempts: attempt,
                        message,
                    })
                }
                Err(error) => return Err(error),
            }
        }

        // The loop always returns on the final attempt
        unreachable!("retry loop exited without a result")
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, EngineError> {
        let url = format!("{}{}", self.config.api_base, path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .form(form)
            .send()
            .await
            .map_err(|e| classify_request_error(operation, &e))?;

        decode_response(response).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
    ) -> Result<T, EngineError> {
        let url = format!("{}{}", self.config.api_base, path);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| classify_request_error(operation, &e))?;

        decode_response(response).await
    }
}

#[async_trait]
impl ProcessorApi for ProcessorClient {
    async fn create_connect_account(
        &self,
        email: &str,
        legal_name: &str,
        country: &str,
    ) -> Result<CreatedAccount, EngineError> {
        validate_account_request(email, country)?;
        let country = country.to_ascii_uppercase();

        // Non-idempotent at the processor: a single attempt, never retried
        let created: CreateAccountResponse = self
            .post_form(
                "create_connect_account",
                "/accounts",
                &[
                    ("type", "express"),
                    ("email", email),
                    ("country", &country),
                    ("business_profile[name]", legal_name),
                    ("capabilities[transfers][requested]", "true"),
                ],
            )
            .await?;

        tracing::info!(account_id = %created.id, %country, "connect account created");

        let onboarding_url = self.create_onboarding_link(&created.id).await?;

        Ok(CreatedAccount {
            account_id: created.id,
            onboarding_url,
        })
    }

    async fn fetch_account_status(
        &self,
        account_id: &str,
    ) -> Result<AccountCapabilities, EngineError> {
        let path = format!("/accounts/{}", account_id);
        let status: AccountStatusResponse = self
            .with_retry("fetch_account_status", || {
                self.get_json("fetch_account_status", &path)
            })
            .await?;

        Ok(AccountCapabilities {
            details_submitted: status.details_submitted,
            charges_enabled: status.charges_enabled,
            payouts_enabled: status.payouts_enabled,
        })
    }

    async fn create_onboarding_link(&self, account_id: &str) -> Result<String, EngineError> {
        let (refresh_url, return_url) = return_urls(&self.config.onboarding_return_url);
        let form = [
            ("account", account_id),
            ("refresh_url", refresh_url.as_str()),
            ("return_url", return_url.as_str()),
            ("type", "account_onboarding"),
        ];
        let link: OnboardingLinkResponse = self
            .with_retry("create_onboarding_link", || {
                self.post_form("create_onboarding_link", "/account_links", &form)
            })
            .await?;

        Ok(link.url)
    }

    async fn initiate_transfer(
        &self,
        account_id: &str,
        amount: Decimal,
        reference: &str,
    ) -> Result<String, EngineError> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::validation(format!(
                "transfer amount must be positive, got {}",
                amount
            )));
        }
        let minor_units = to_minor_units(amount)?;

        // Sandbox balances cannot back real transfers; short-circuit to a
        // deterministic synthetic id. Controlled by the explicit mode flag.
        if self.config.mode == ExecutionMode::Sandbox {
            let transfer_id = synthetic_transfer_id(reference);
            tracing::info!(%account_id, %transfer_id, "sandbox transfer short-circuit");
            return Ok(transfer_id);
        }

        let minor_str = minor_units.to_string();
        let transfer: TransferResponse = self
            .post_form(
                "initiate_transfer",
                "/transfers",
                &[
                    ("amount", minor_str.as_str()),
                    ("currency", &self.config.currency),
                    ("destination", account_id),
                    ("transfer_group", reference),
                ],
            )
            .await?;

        tracing::info!(%account_id, transfer_id = %transfer.id, "transfer initiated");
        Ok(transfer.id)
    }
}

/// Validate account-creation inputs before any network call
fn validate_account_request(email: &str, country: &str) -> Result<(), EngineError> {
    if email.trim().is_empty() {
        return Err(EngineError::validation("email must not be empty"));
    }
    if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(EngineError::validation(format!(
            "country must be an ISO-3166 alpha-2 code, got '{}'",
            country
        )));
    }
    Ok(())
}

/// Build the refresh/return redirect URLs for an onboarding link
///
/// The query flags signal intent to the consuming UI; completion is always
/// re-verified against the processor, never taken from these flags.
fn return_urls(base: &str) -> (String, String) {
    let separator = if base.contains('?') { '&' } else { '?' };
    (
        format!("{}{}refresh=true", base, separator),
        format!("{}{}success=true", base, separator),
    )
}

/// Fixed-format synthetic transfer identifier for sandbox mode
fn synthetic_transfer_id(reference: &str) -> String {
    format!("tr_sandbox_{}", reference)
}

/// Convert a major-unit decimal amount to integer minor units
///
/// Sub-minor-unit precision is rejected rather than rounded silently.
fn to_minor_units(amount: Decimal) -> Result<u64, EngineError> {
    let minor = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| EngineError::validation(format!("transfer amount {} overflows", amount)))?;

    if !minor.fract().is_zero() {
        return Err(EngineError::validation(format!(
            "transfer amount {} has sub-cent precision",
            amount
        )));
    }

    minor.to_u64().ok_or_else(|| {
        EngineError::validation(format!("transfer amount {} is not representable", amount))
    })
}

/// Classify a reqwest transport failure
fn classify_request_error(operation: &str, error: &reqwest::Error) -> EngineError {
    if error.is_timeout() || error.is_connect() {
        EngineError::transient_network(operation, 1, error.to_string())
    } else {
        EngineError::processor(None, error.to_string())
    }
}

/// Decode a processor response, mapping error envelopes to the taxonomy
async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, EngineError> {
    let status = response.status();

    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| EngineError::processor(None, format!("malformed response body: {}", e)));
    }

    let envelope: ApiErrorEnvelope = response.json().await.unwrap_or_default();

    if status == StatusCode::UNAUTHORIZED {
        return Err(EngineError::configuration(format!(
            "processor rejected credentials: {}",
            envelope.error.message
        )));
    }

    Err(EngineError::Processor {
        code: envelope.error.code,
        message: envelope.error.message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn sandbox_config() -> ProcessorConfig {
        ProcessorConfig::new(
            "sk_test_12345",
            "pk_test_12345",
            ExecutionMode::Sandbox,
            "https://example.com/instructor/payments",
        )
    }

    fn http_response(status: u16, body: &str) -> reqwest::Response {
        reqwest::Response::from(
            http::Response::builder()
                .status(status)
                .body(body.to_string())
                .unwrap(),
        )
    }

    #[test]
    fn test_empty_secret_key_rejected_at_construction() {
        let mut config = sandbox_config();
        config.secret_key = String::new();

        let result = ProcessorClient::new(config);
        assert!(matches!(
            result.err(),
            Some(EngineError::Configuration { .. })
        ));
    }

    #[rstest]
    #[case::empty_email("", "US")]
    #[case::whitespace_email("   ", "US")]
    #[case::short_country("a@b.com", "U")]
    #[case::long_country("a@b.com", "USA")]
    #[case::numeric_country("a@b.com", "1A")]
    fn test_account_request_validation_rejects(#[case] email: &str, #[case] country: &str) {
        let result = validate_account_request(email, country);
        assert!(matches!(
            result.unwrap_err(),
            EngineError::Validation { .. }
        ));
    }

    #[rstest]
    #[case::upper("a@b.com", "US")]
    #[case::lower("a@b.com", "gb")]
    fn test_account_request_validation_accepts(#[case] email: &str, #[case] country: &str) {
        assert!(validate_account_request(email, country).is_ok());
    }

    #[test]
    fn test_return_urls_carry_redirect_flags() {
        let (refresh, success) = return_urls("https://example.com/payments");
        assert_eq!(refresh, "https://example.com/payments?refresh=true");
        assert_eq!(success, "https://example.com/payments?success=true");
    }

    #[test]
    fn test_return_urls_append_to_existing_query() {
        let (refresh, success) = return_urls("https://example.com/payments?tab=payouts");
        assert_eq!(refresh, "https://example.com/payments?tab=payouts&refresh=true");
        assert_eq!(success, "https://example.com/payments?tab=payouts&success=true");
    }

    #[rstest]
    #[case::whole_dollars(Decimal::new(6000, 2), 6000)]
    #[case::with_cents(Decimal::new(1999, 2), 1999)]
    #[case::integral(Decimal::from(45), 4500)]
    fn test_to_minor_units(#[case] amount: Decimal, #[case] expected: u64) {
        assert_eq!(to_minor_units(amount).unwrap(), expected);
    }

    #[test]
    fn test_to_minor_units_rejects_sub_cent_precision() {
        let result = to_minor_units(Decimal::new(19995, 3)); // 19.995
        assert!(matches!(
            result.unwrap_err(),
            EngineError::Validation { .. }
        ));
    }

    #[tokio::test]
    async fn test_sandbox_transfer_short_circuits_deterministically() {
        let client = ProcessorClient::new(sandbox_config()).unwrap();

        let first = client
            .initiate_transfer("acct_123", Decimal::new(6000, 2), "pay_42")
            .await
            .unwrap();
        let second = client
            .initiate_transfer("acct_123", Decimal::new(6000, 2), "pay_42")
            .await
            .unwrap();

        assert_eq!(first, "tr_sandbox_pay_42");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_sandbox_mode_is_explicit_not_inferred_from_key() {
        // A live-looking key with the sandbox flag still short-circuits
        let mut config = sandbox_config();
        config.secret_key = "sk_live_99999".to_string();
        let client = ProcessorClient::new(config).unwrap();

        let transfer_id = client
            .initiate_transfer("acct_123", Decimal::from(10), "pay_7")
            .await
            .unwrap();
        assert_eq!(transfer_id, "tr_sandbox_pay_7");
    }

    #[tokio::test]
    async fn test_transfer_rejects_non_positive_amount() {
        let client = ProcessorClient::new(sandbox_config()).unwrap();

        let result = client
            .initiate_transfer("acct_123", Decimal::ZERO, "pay_1")
            .await;
        assert!(matches!(
            result.unwrap_err(),
            EngineError::Validation { .. }
        ));
    }

    #[test]
    fn test_publishable_key_exposed_for_ui() {
        let client = ProcessorClient::new(sandbox_config()).unwrap();
        assert_eq!(client.publishable_key(), "pk_test_12345");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_after_transient_failure() {
        let client = ProcessorClient::new(sandbox_config()).unwrap();
        let calls = AtomicU32::new(0);

        let value = client
            .with_retry("fetch_account_status", || {
                let attempt = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err(EngineError::transient_network(
                            "fetch_account_status",
                            1,
                            "connection reset",
                        ))
                    } else {
                        Ok(7u32)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_budget_and_reports_attempts() {
        let client = ProcessorClient::new(sandbox_config()).unwrap();
        let calls = AtomicU32::new(0);

        let result: Result<u32, EngineError> = client
            .with_retry("fetch_account_status", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(EngineError::transient_network(
                        "fetch_account_status",
                        1,
                        "connection reset",
                    ))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
        assert_eq!(
            result.unwrap_err(),
            EngineError::transient_network("fetch_account_status", MAX_ATTEMPTS, "connection reset")
        );
    }

    #[tokio::test]
    async fn test_processor_rejection_is_never_retried() {
        let client = ProcessorClient::new(sandbox_config()).unwrap();
        let calls = AtomicU32::new(0);

        let result: Result<u32, EngineError> = client
            .with_retry("create_onboarding_link", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(EngineError::processor(
                        Some("account_invalid"),
                        "No such account",
                    ))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            result.unwrap_err(),
            EngineError::processor(Some("account_invalid"), "No such account")
        );
    }

    #[tokio::test]
    async fn test_decode_success_body() {
        let response = http_response(200, r#"{"id":"acct_1"}"#);
        let decoded: CreateAccountResponse = decode_response(response).await.unwrap();
        assert_eq!(decoded.id, "acct_1");
    }

    #[tokio::test]
    async fn test_decode_unauthorized_is_configuration_error() {
        let response = http_response(401, r#"{"error":{"message":"Invalid API Key provided"}}"#);

        let result: Result<CreateAccountResponse, _> = decode_response(response).await;
        match result.unwrap_err() {
            EngineError::Configuration { message } => {
                assert!(message.contains("Invalid API Key provided"));
            }
            other => panic!("expected configuration error, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_decode_error_envelope_carries_code_and_message() {
        let response = http_response(
            400,
            r#"{"error":{"code":"country_unsupported","message":"Cannot create an account for the specified country"}}"#,
        );

        let result: Result<CreateAccountResponse, _> = decode_response(response).await;
        assert_eq!(
            result.unwrap_err(),
            EngineError::processor(
                Some("country_unsupported"),
                "Cannot create an account for the specified country"
            )
        );
    }

    #[tokio::test]
    async fn test_decode_malformed_success_body_is_processor_error() {
        let response = http_response(200, "not json at all");

        let result: Result<CreateAccountResponse, _> = decode_response(response).await;
        assert!(matches!(
            result.unwrap_err(),
            EngineError::Processor { .. }
        ));
    }
}
