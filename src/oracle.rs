//! Prediction oracle: the opaque model that turns review text into a
//! sentiment indicator and a rating.
//!
//! The oracle has two branches selected by [`ModelVariant`]. They return the
//! rating at different depths, so [`OracleOutput`] carries the branch as its
//! tag and callers unwrap by tag, never by inspecting the shape.

pub mod artifact;
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{OracleBackend, OracleConfig};

pub use artifact::ArtifactOracle;
pub use http::HttpOracle;

/// Flag value that selects the tf-idf branch. Every other value selects the
/// alternate branch.
pub const TF_IDF_FLAG: &str = "tf-idf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelVariant {
    TfIdf,
    Alternate,
}

impl ModelVariant {
    pub fn from_flag(flag: &str) -> Self {
        if flag == TF_IDF_FLAG {
            ModelVariant::TfIdf
        } else {
            ModelVariant::Alternate
        }
    }

    pub fn is_tf_idf(&self) -> bool {
        matches!(self, ModelVariant::TfIdf)
    }
}

/// Raw oracle result for a single-item batch.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleOutput {
    /// tf-idf branch: one rating per input.
    Scalar { sentiment: Vec<i64>, rating: Vec<i64> },
    /// Alternate branch: ratings come back wrapped one level deeper.
    Nested {
        sentiment: Vec<i64>,
        rating: Vec<Vec<i64>>,
    },
}

impl OracleOutput {
    pub fn variant(&self) -> ModelVariant {
        match self {
            OracleOutput::Scalar { .. } => ModelVariant::TfIdf,
            OracleOutput::Nested { .. } => ModelVariant::Alternate,
        }
    }
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("failed to load prediction artifact {path}: {message}")]
    Artifact { path: String, message: String },

    #[error("model server request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed oracle output: {0}")]
    MalformedOutput(String),

    #[error("oracle configuration error: {0}")]
    Config(String),
}

/// Strategy interface over whatever serves the model.
///
/// Implementations are built once at startup and shared read-only between
/// all request handlers.
#[async_trait]
pub trait PredictionOracle: Send + Sync {
    async fn predict(&self, text: &str, variant: ModelVariant) -> Result<OracleOutput, OracleError>;
}

/// Builds the backend named in the configuration.
pub fn from_config(config: &OracleConfig) -> Result<Arc<dyn PredictionOracle>, OracleError> {
    match config.backend {
        OracleBackend::Artifact => {
            let oracle = ArtifactOracle::load(&config.artifact_path)?;
            Ok(Arc::new(oracle))
        }
        OracleBackend::Http => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                OracleError::Config("http backend selected but no endpoint configured".into())
            })?;
            let oracle = HttpOracle::new(endpoint, config.timeout())?;
            Ok(Arc::new(oracle))
        }
    }
}
