use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ModelVariant, OracleError, OracleOutput, PredictionOracle};

#[derive(Serialize)]
struct PredictRequest<'a> {
    texts: [&'a str; 1],
    use_tf_idf: bool,
}

#[derive(Deserialize)]
struct ScalarResponse {
    sentiment: Vec<i64>,
    rating: Vec<i64>,
}

#[derive(Deserialize)]
struct NestedResponse {
    sentiment: Vec<i64>,
    rating: Vec<Vec<i64>>,
}

/// Oracle served by a remote model server.
pub struct HttpOracle {
    client: Client,
    endpoint: String,
}

impl HttpOracle {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, OracleError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

/// Decodes a model server body. The expected shape follows the requested
/// variant.
fn decode_body(body: &[u8], variant: ModelVariant) -> Result<OracleOutput, OracleError> {
    let malformed = |e: serde_json::Error| OracleError::MalformedOutput(e.to_string());
    match variant {
        ModelVariant::TfIdf => {
            let r: ScalarResponse = serde_json::from_slice(body).map_err(malformed)?;
            Ok(OracleOutput::Scalar {
                sentiment: r.sentiment,
                rating: r.rating,
            })
        }
        ModelVariant::Alternate => {
            let r: NestedResponse = serde_json::from_slice(body).map_err(malformed)?;
            Ok(OracleOutput::Nested {
                sentiment: r.sentiment,
                rating: r.rating,
            })
        }
    }
}

#[async_trait]
impl PredictionOracle for HttpOracle {
    async fn predict(&self, text: &str, variant: ModelVariant) -> Result<OracleOutput, OracleError> {
        let request = PredictRequest {
            texts: [text],
            use_tf_idf: variant.is_tf_idf(),
        };
        debug!(endpoint = %self.endpoint, ?variant, "Calling model server");

        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(OracleError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        decode_body(&body, variant)
    }
}
