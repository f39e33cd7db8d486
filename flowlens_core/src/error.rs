//! Error types for workflow analysis

use thiserror::Error;

/// Main error type for the analysis engine
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Input rejected before the pipeline starts
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Parse failure - aborts the pipeline
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Completion provider failure (model-assisted mode)
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Network unreachable before the pipeline starts
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// A single analysis stage failed (recovered by the orchestrator)
    #[error("Stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Longer, user-facing guidance for fatal error classes.
    ///
    /// Every fatal error carries both a short error string (`Display`) and
    /// this guidance string; stage failures are recovered locally and never
    /// surface here on their own.
    pub fn guidance(&self) -> String {
        match self {
            AnalysisError::Input(e) => e.guidance(),
            AnalysisError::Parse(_) => {
                "The workflow description could not be parsed. Check that the input \
                 is valid JSON or YAML and that every dependency references a declared stage."
                    .to_string()
            }
            AnalysisError::Provider(e) => e.guidance(),
            AnalysisError::Connectivity(_) => {
                "The analysis backend is unreachable. Check your network connection \
                 and retry; rule-based analysis will resume once connectivity returns."
                    .to_string()
            }
            AnalysisError::Stage { stage, .. } => {
                format!(
                    "The '{stage}' stage failed and was replaced with a degraded default. \
                     The remaining results are still usable."
                )
            }
            AnalysisError::Serialization(_) => {
                "An internal value could not be serialized. This is a bug; please report it."
                    .to_string()
            }
        }
    }

    /// True for error classes that abort the whole request.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AnalysisError::Stage { .. })
    }
}

/// Input validation errors - surfaced immediately, never reach the pipeline
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Workflow text is empty")]
    Empty,

    #[error("Workflow text too short: {len} bytes (minimum {min})")]
    TooShort { len: usize, min: usize },

    #[error("Workflow text too large: {len} bytes (maximum {max})")]
    Oversized { len: usize, max: usize },

    #[error("Workflow text contains control characters")]
    ControlCharacters,

    #[error("Invalid optimization goal: {0}")]
    InvalidGoal(String),
}

impl InputError {
    pub fn guidance(&self) -> String {
        match self {
            InputError::Empty => {
                "Provide a workflow description in JSON or YAML before running the analysis."
                    .to_string()
            }
            InputError::TooShort { min, .. } => {
                format!("The workflow description must be at least {min} bytes of JSON or YAML.")
            }
            InputError::Oversized { max, .. } => {
                format!("The workflow description exceeds the {max}-byte limit; split it up.")
            }
            InputError::ControlCharacters => {
                "Remove non-printable control characters from the workflow description."
                    .to_string()
            }
            InputError::InvalidGoal(_) => {
                "Valid goals are 'reliability', 'cost' and 'simplicity'.".to_string()
            }
        }
    }
}

/// Structured parse failure from the parser collaborator
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    #[error("Malformed YAML: {0}")]
    MalformedYaml(String),

    #[error("Invalid workflow graph: {}", format_violations(.0))]
    InvalidGraph(Vec<GraphViolation>),
}

fn format_violations(violations: &[GraphViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A single graph-invariant violation found during validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphViolation {
    #[error("duplicate stage id '{0}'")]
    DuplicateStageId(String),

    #[error("dependency source '{0}' is not a declared stage")]
    UnknownDependencySource(String),

    #[error("dependency target '{0}' is not a declared stage")]
    UnknownDependencyTarget(String),

    #[error("workflow has no stages")]
    NoStages,
}

/// Completion-service provider errors, classified for retry decisions
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited: {0}")]
    RateLimit(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider unreachable: {0}")]
    Connectivity(String),

    #[error("Provider not configured: {0}")]
    Configuration(String),
}

impl ProviderError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Auth and configuration failures are permanent; rate limits and
    /// connectivity drops are transient. A malformed response is retried
    /// once on the theory that generation is not deterministic.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Auth(_) | ProviderError::Configuration(_) => false,
            ProviderError::RateLimit(_)
            | ProviderError::Connectivity(_)
            | ProviderError::MalformedResponse(_) => true,
        }
    }

    pub fn guidance(&self) -> String {
        match self {
            ProviderError::Auth(_) => {
                "The completion service rejected the configured credentials. \
                 Check the API key."
                    .to_string()
            }
            ProviderError::RateLimit(_) => {
                "The completion service is rate limiting requests. Wait and retry."
                    .to_string()
            }
            ProviderError::MalformedResponse(_) => {
                "The completion service returned an unusable response. Retry the analysis."
                    .to_string()
            }
            ProviderError::Connectivity(_) => {
                "The completion service is unreachable. Check network connectivity \
                 or switch to rule-based analysis."
                    .to_string()
            }
            ProviderError::Configuration(_) => {
                "The completion service is not configured. Set the API key and base URL, \
                 or switch to rule-based analysis."
                    .to_string()
            }
        }
    }
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
