//! Processor configuration
//!
//! Credentials and execution mode for the payment processor client.
//! The sandbox/live switch is an explicit flag set at configuration time,
//! never inferred from the contents of a credential string, so sandbox
//! behavior is deterministic and testable with fabricated keys.

use crate::types::EngineError;
use std::str::FromStr;

/// Default processor API base URL
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com/v1";

/// Default settlement currency for transfers
pub const DEFAULT_CURRENCY: &str = "usd";

/// Whether processor calls run against the live API or a sandbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Real processor; transfers move real funds
    Live,
    /// Sandbox processor; transfers short-circuit to synthetic successes
    Sandbox,
}

impl FromStr for ExecutionMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live" => Ok(ExecutionMode::Live),
            "sandbox" | "test" => Ok(ExecutionMode::Sandbox),
            other => Err(EngineError::configuration(format!(
                "invalid PROCESSOR_MODE '{}': expected 'live' or 'sandbox'",
                other
            ))),
        }
    }
}

/// Configuration for the processor client
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Secret API key used as the bearer token
    pub secret_key: String,
    /// Publishable key handed to the consuming UI
    pub publishable_key: String,
    /// Live or sandbox execution
    pub mode: ExecutionMode,
    /// API base URL (overridable for tests)
    pub api_base: String,
    /// Base URL the onboarding flow redirects back to; the engine appends
    /// `success=true` / `refresh=true` query flags
    pub onboarding_return_url: String,
    /// Settlement currency for transfers
    pub currency: String,
}

impl ProcessorConfig {
    /// Build a configuration with default API base and currency
    pub fn new(
        secret_key: impl Into<String>,
        publishable_key: impl Into<String>,
        mode: ExecutionMode,
        onboarding_return_url: impl Into<String>,
    ) -> Self {
        ProcessorConfig {
            secret_key: secret_key.into(),
            publishable_key: publishable_key.into(),
            mode,
            api_base: DEFAULT_API_BASE.to_string(),
            onboarding_return_url: onboarding_return_url.into(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    /// Load configuration from the environment
    ///
    /// Required variables: `PROCESSOR_SECRET_KEY`, `PROCESSOR_PUBLISHABLE_KEY`,
    /// `PROCESSOR_MODE` (`live` or `sandbox`), `PROCESSOR_RETURN_URL`.
    /// Optional: `PROCESSOR_API_BASE`, `PROCESSOR_CURRENCY`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first missing or invalid
    /// variable.
    pub fn from_env() -> Result<Self, EngineError> {
        let require = |name: &str| {
            std::env::var(name)
                .map_err(|_| EngineError::configuration(format!("{} is not set", name)))
        };

        let mut config = ProcessorConfig::new(
            require("PROCESSOR_SECRET_KEY")?,
            require("PROCESSOR_PUBLISHABLE_KEY")?,
            require("PROCESSOR_MODE")?.parse()?,
            require("PROCESSOR_RETURN_URL")?,
        );
        if let Ok(base) = std::env::var("PROCESSOR_API_BASE") {
            config.api_base = base;
        }
        if let Ok(currency) = std::env::var("PROCESSOR_CURRENCY") {
            config.currency = currency;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can back processor calls
    ///
    /// An absent secret key must cause every client call to fail fast
    /// rather than attempting a request.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.secret_key.trim().is_empty() {
            return Err(EngineError::configuration("processor secret key is empty"));
        }
        if self.onboarding_return_url.trim().is_empty() {
            return Err(EngineError::configuration(
                "onboarding return URL is empty",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn valid() -> ProcessorConfig {
        ProcessorConfig::new(
            "sk_12345",
            "pk_12345",
            ExecutionMode::Sandbox,
            "https://example.com/instructor/payments",
        )
    }

    #[rstest]
    #[case::live("live", ExecutionMode::Live)]
    #[case::live_upper("LIVE", ExecutionMode::Live)]
    #[case::sandbox("sandbox", ExecutionMode::Sandbox)]
    #[case::test_alias("test", ExecutionMode::Sandbox)]
    fn test_mode_parsing(#[case] input: &str, #[case] expected: ExecutionMode) {
        assert_eq!(input.parse::<ExecutionMode>().unwrap(), expected);
    }

    #[test]
    fn test_mode_parsing_rejects_unknown() {
        let err = "production".parse::<ExecutionMode>().unwrap_err();
        assert!(matches!(err, EngineError::Configuration { .. }));
    }

    #[test]
    fn test_valid_config_passes_validation() {
        assert!(valid().validate().is_ok());
    }

    #[rstest]
    #[case::empty_secret("")]
    #[case::whitespace_secret("   ")]
    fn test_empty_secret_key_fails_fast(#[case] secret: &str) {
        let mut config = valid();
        config.secret_key = secret.to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            EngineError::Configuration { .. }
        ));
    }

    #[test]
    fn test_empty_return_url_fails_validation() {
        let mut config = valid();
        config.onboarding_return_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = valid();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.currency, DEFAULT_CURRENCY);
    }
}
