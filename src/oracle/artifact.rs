use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::{ModelVariant, OracleError, OracleOutput, PredictionOracle};

/// One linear layer of the scorer.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearHead {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LinearHead {
    fn score(&self, features: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub sentiment: LinearHead,
    pub rating: LinearHead,
}

/// On-disk layout of the prediction artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    pub vocabulary: Vec<String>,
    pub idf: Vec<f64>,
    pub rating_bounds: (i64, i64),
    pub tf_idf: Branch,
    pub bag_of_words: Branch,
}

impl Artifact {
    fn validate(&self) -> Result<(), String> {
        let dims = self.vocabulary.len();
        if self.idf.len() != dims {
            return Err(format!("idf has {} entries, vocabulary has {}", self.idf.len(), dims));
        }
        for (name, branch) in [("tf_idf", &self.tf_idf), ("bag_of_words", &self.bag_of_words)] {
            for (head, layer) in [("sentiment", &branch.sentiment), ("rating", &branch.rating)] {
                if layer.weights.len() != dims {
                    return Err(format!(
                        "{}.{} has {} weights, vocabulary has {}",
                        name,
                        head,
                        layer.weights.len(),
                        dims
                    ));
                }
            }
        }
        let (low, high) = self.rating_bounds;
        if low > high {
            return Err(format!("rating bounds [{}, {}] are reversed", low, high));
        }
        Ok(())
    }
}

/// In-process scorer backed by a JSON artifact read once at startup.
#[derive(Debug)]
pub struct ArtifactOracle {
    artifact: Artifact,
    index: HashMap<String, usize>,
}

impl ArtifactOracle {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OracleError> {
        let path = path.as_ref();
        let artifact_error = |message: String| OracleError::Artifact {
            path: path.display().to_string(),
            message,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| artifact_error(e.to_string()))?;
        let artifact: Artifact =
            serde_json::from_str(&raw).map_err(|e| artifact_error(e.to_string()))?;
        let oracle = Self::from_artifact(artifact).map_err(artifact_error)?;

        info!(
            path = %path.display(),
            vocabulary = oracle.artifact.vocabulary.len(),
            "Prediction artifact loaded"
        );
        Ok(oracle)
    }

    pub fn from_artifact(artifact: Artifact) -> Result<Self, String> {
        artifact.validate()?;
        let index = artifact
            .vocabulary
            .iter()
            .enumerate()
            .map(|(i, token)| (token.clone(), i))
            .collect();
        Ok(Self { artifact, index })
    }

    fn term_counts(&self, text: &str) -> Vec<f64> {
        let mut counts = vec![0.0; self.artifact.vocabulary.len()];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
        {
            if let Some(&i) = self.index.get(token) {
                counts[i] += 1.0;
            }
        }
        counts
    }

    fn tf_idf_features(&self, text: &str) -> Vec<f64> {
        let mut features: Vec<f64> = self
            .term_counts(text)
            .into_iter()
            .zip(&self.artifact.idf)
            .map(|(tf, idf)| tf * idf)
            .collect();
        let norm = features.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            features.iter_mut().for_each(|x| *x /= norm);
        }
        features
    }

    fn score(&self, branch: &Branch, features: &[f64]) -> (i64, i64) {
        let sentiment = if branch.sentiment.score(features) >= 0.0 { 1 } else { 0 };
        let (low, high) = self.artifact.rating_bounds;
        let rating = (branch.rating.score(features).round() as i64).clamp(low, high);
        (sentiment, rating)
    }
}

#[async_trait]
impl PredictionOracle for ArtifactOracle {
    async fn predict(&self, text: &str, variant: ModelVariant) -> Result<OracleOutput, OracleError> {
        match variant {
            ModelVariant::TfIdf => {
                let features = self.tf_idf_features(text);
                let (sentiment, rating) = self.score(&self.artifact.tf_idf, &features);
                Ok(OracleOutput::Scalar {
                    sentiment: vec![sentiment],
                    rating: vec![rating],
                })
            }
            ModelVariant::Alternate => {
                let features = self.term_counts(text);
                let (sentiment, rating) = self.score(&self.artifact.bag_of_words, &features);
                Ok(OracleOutput::Nested {
                    sentiment: vec![sentiment],
                    rating: vec![vec![rating]],
                })
            }
        }
    }
}
