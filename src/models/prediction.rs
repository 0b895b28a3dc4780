use serde::{Deserialize, Serialize};

use crate::models::review::Sentiment;
use crate::oracle::{ModelVariant, OracleError, OracleOutput};

/// What the form page shows after a submission.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub sentiment: Sentiment,
    pub rating: i64,
}

impl Prediction {
    /// Unwraps a single-item oracle result.
    ///
    /// The rating depth depends on the variant that was requested: a scalar
    /// for tf-idf, one level deeper for the alternate branch. An output
    /// tagged with the other branch is rejected.
    pub fn from_output(variant: ModelVariant, output: OracleOutput) -> Result<Self, OracleError> {
        if output.variant() != variant {
            return Err(OracleError::MalformedOutput(format!(
                "requested {:?} but oracle answered with the {:?} shape",
                variant,
                output.variant()
            )));
        }

        let (sentiment, rating) = match output {
            OracleOutput::Scalar { sentiment, rating } => (sentiment, rating.first().copied()),
            OracleOutput::Nested { sentiment, rating } => {
                (sentiment, rating.first().and_then(|inner| inner.first()).copied())
            }
        };

        let indicator = sentiment
            .first()
            .copied()
            .ok_or_else(|| OracleError::MalformedOutput("empty sentiment array".into()))?;
        let rating =
            rating.ok_or_else(|| OracleError::MalformedOutput("empty rating array".into()))?;

        Ok(Prediction {
            sentiment: Sentiment::from_indicator(indicator),
            rating,
        })
    }
}
