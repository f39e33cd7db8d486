//! External collaborator seams and the retry executor
//!
//! The engine talks to the outside world through two narrow traits: a
//! completion provider (model-assisted mode) and a network reachability
//! probe. Both are driven through [`execute_with_retry`], which applies
//! exponential backoff with optional jitter and gives up immediately on
//! errors the caller marks non-retryable.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use flowlens_core::ProviderError;

/// Text-completion collaborator used by model-assisted stages.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, ProviderError>;
}

/// Network reachability probe run before analysis starts.
///
/// An `Err` means the analysis target's network dependencies are unreachable;
/// the pipeline treats that as fatal after retries are exhausted.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn check(&self) -> anyhow::Result<()>;
}

/// Backoff policy for retried external calls
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    /// Add up to 25% random delay to avoid thundering herds
    pub jitter: bool,
}

impl RetryConfig {
    /// Policy for completion calls: one retry on a 2s base delay
    pub fn model_assisted() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
            jitter: true,
        }
    }

    /// Policy for the reachability probe: cheaper call, more attempts
    pub fn probe() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
            jitter: true,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::model_assisted()
    }
}

/// Runs `operation` until it succeeds, the error is non-retryable, or
/// attempts are exhausted. The last error is returned unchanged.
pub async fn execute_with_retry<F, Fut, T, E>(
    mut operation: F,
    config: &RetryConfig,
    is_retryable: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = config.initial_delay;
    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < config.max_attempts && is_retryable(&error) => {
                let sleep_for = if config.jitter {
                    delay.mul_f64(1.0 + rand::thread_rng().gen_range(0.0..0.25))
                } else {
                    delay
                };
                tracing::warn!(
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = sleep_for.as_millis() as u64,
                    %error,
                    "external call failed, retrying"
                );
                tokio::time::sleep(sleep_for).await;
                delay = std::cmp::min(delay.mul_f64(config.backoff_factor), config.max_delay);
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

/// Retry wrapper for completion calls, honoring [`ProviderError::is_retryable`]
pub async fn complete_with_retry(
    provider: &dyn CompletionProvider,
    config: &RetryConfig,
    prompt: &str,
    system: Option<&str>,
) -> Result<String, ProviderError> {
    execute_with_retry(
        || provider.complete(prompt, system),
        config,
        ProviderError::is_retryable,
    )
    .await
}
