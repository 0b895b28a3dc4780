// src/models/review.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentiment label shown to the user and stored with every review.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
}

impl Sentiment {
    /// Maps the oracle's indicator to a label: 1 is positive, anything else negative.
    pub fn from_indicator(indicator: i64) -> Self {
        if indicator == 1 {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted review together with what the oracle predicted for it.
/// Rows are written once and never changed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Review {
    pub text: String,            // Raw review body as submitted
    pub pred_sentiment: Sentiment,
    pub pred_rating: i64,
    pub model: String,           // Model flag exactly as the caller sent it
}

impl Review {
    pub fn new(text: String, pred_sentiment: Sentiment, pred_rating: i64, model: String) -> Self {
        Self {
            text,
            pred_sentiment,
            pred_rating,
            model,
        }
    }

    /// Short form of the text for log lines.
    pub fn preview(&self) -> String {
        let head: String = self.text.chars().take(20).collect();
        format!("{}...", head)
    }
}
