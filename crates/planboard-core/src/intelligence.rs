//! Typed responses of the external intelligence service.
//!
//! Bodies are parsed and validated at the boundary; anything that does not fit
//! the expected shape becomes a [`ResponseError`] instead of flowing inward as
//! untyped JSON.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Endpoints exposed by the intelligence service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntelligenceEndpoint {
    /// Business valuation calculator.
    Valuation,
    /// Exit readiness risk scoring.
    RiskAssessment,
    /// Generated insights for the dashboard.
    Insights,
    /// Semantic search over the framework library.
    SemanticSearch,
}

impl IntelligenceEndpoint {
    /// Relative request path.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Valuation => "/api/v1/valuation",
            Self::RiskAssessment => "/api/v1/risk-assessment",
            Self::Insights => "/api/v1/insights",
            Self::SemanticSearch => "/api/v1/search",
        }
    }
}

impl fmt::Display for IntelligenceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Valuation => "valuation",
            Self::RiskAssessment => "risk_assessment",
            Self::Insights => "insights",
            Self::SemanticSearch => "semantic_search",
        };
        f.write_str(name)
    }
}

/// Valuation estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    /// Point estimate.
    pub enterprise_value: f64,
    /// Lower bound of the range.
    pub low: f64,
    /// Upper bound of the range.
    pub high: f64,
    /// ISO currency code.
    pub currency: String,
    /// Multiples used (e.g. `ebitda` → 6.5).
    #[serde(default)]
    pub multiples: BTreeMap<String, f64>,
    /// Model confidence in `0..=1`.
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Coarse risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Score below 34.
    Low,
    /// Score between 34 and 66.
    Medium,
    /// Score above 66.
    High,
}

/// One scored risk factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Factor name.
    pub name: String,
    /// Score in `0..=100`.
    pub score: u8,
    /// Suggested mitigation.
    #[serde(default)]
    pub recommendation: Option<String>,
}

/// Risk assessment result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Overall score in `0..=100`.
    pub overall_score: u8,
    /// Level derived by the service.
    pub level: RiskLevel,
    /// Individual factors.
    #[serde(default)]
    pub factors: Vec<RiskFactor>,
}

/// A generated insight card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    /// Headline.
    pub title: String,
    /// Body text.
    pub summary: String,
    /// Category label.
    #[serde(default)]
    pub category: Option<String>,
}

/// Insights result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insights {
    /// Insight cards.
    pub insights: Vec<Insight>,
}

/// One semantic search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Identifier of the matched framework/document.
    pub id: String,
    /// Title of the match.
    pub title: String,
    /// Similarity in `0..=1`.
    pub score: f64,
    /// Highlighted excerpt.
    #[serde(default)]
    pub snippet: Option<String>,
}

/// Semantic search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Hits ordered by the service.
    pub results: Vec<SearchHit>,
}

/// A validated response, discriminated by endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntelligenceResponse {
    /// Valuation estimate.
    Valuation(Valuation),
    /// Risk assessment.
    RiskAssessment(RiskAssessment),
    /// Insights.
    Insights(Insights),
    /// Search hits.
    SemanticSearch(SearchResults),
}

/// Errors produced while accepting a response body.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// The service reported an error envelope.
    #[error("{endpoint} request failed: {message}")]
    Service {
        /// Endpoint that failed.
        endpoint: IntelligenceEndpoint,
        /// Message reported by the service.
        message: String,
    },
    /// The body did not match the expected shape.
    #[error("malformed {endpoint} response: {source}")]
    Malformed {
        /// Endpoint being parsed.
        endpoint: IntelligenceEndpoint,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// The body parsed but carried out-of-range values.
    #[error("invalid {endpoint} response: {reason}")]
    Invalid {
        /// Endpoint being parsed.
        endpoint: IntelligenceEndpoint,
        /// What was wrong.
        reason: String,
    },
}

/// Parse and validate a response body for `endpoint`.
///
/// # Errors
/// Returns [`ResponseError`] for error envelopes, malformed JSON and
/// out-of-range values.
pub fn parse_response(endpoint: IntelligenceEndpoint, body: &str) -> Result<IntelligenceResponse, ResponseError> {
    let value: Value =
        serde_json::from_str(body).map_err(|source| ResponseError::Malformed { endpoint, source })?;
    if let Some(message) = value.get("error") {
        let message = message
            .as_str()
            .map_or_else(|| message.to_string(), str::to_owned);
        return Err(ResponseError::Service { endpoint, message });
    }

    let response = match endpoint {
        IntelligenceEndpoint::Valuation => IntelligenceResponse::Valuation(decode(endpoint, value)?),
        IntelligenceEndpoint::RiskAssessment => {
            IntelligenceResponse::RiskAssessment(decode(endpoint, value)?)
        }
        IntelligenceEndpoint::Insights => IntelligenceResponse::Insights(decode(endpoint, value)?),
        IntelligenceEndpoint::SemanticSearch => {
            IntelligenceResponse::SemanticSearch(decode(endpoint, value)?)
        }
    };
    validate(&response).map_err(|reason| ResponseError::Invalid { endpoint, reason })?;
    Ok(response)
}

fn decode<T: DeserializeOwned>(endpoint: IntelligenceEndpoint, value: Value) -> Result<T, ResponseError> {
    serde_json::from_value(value).map_err(|source| ResponseError::Malformed { endpoint, source })
}

fn validate(response: &IntelligenceResponse) -> Result<(), String> {
    match response {
        IntelligenceResponse::Valuation(valuation) => {
            let values = [valuation.enterprise_value, valuation.low, valuation.high];
            if values.iter().any(|value| !value.is_finite() || *value < 0.0) {
                return Err("valuation figures must be finite and non-negative".into());
            }
            if valuation.low > valuation.high {
                return Err(format!("range low {} exceeds high {}", valuation.low, valuation.high));
            }
            if valuation
                .confidence
                .is_some_and(|confidence| !(0.0..=1.0).contains(&confidence))
            {
                return Err("confidence must be within 0..=1".into());
            }
            Ok(())
        }
        IntelligenceResponse::RiskAssessment(assessment) => {
            if assessment.overall_score > 100 {
                return Err(format!("overall score {} exceeds 100", assessment.overall_score));
            }
            if let Some(factor) = assessment.factors.iter().find(|factor| factor.score > 100) {
                return Err(format!("factor '{}' score {} exceeds 100", factor.name, factor.score));
            }
            Ok(())
        }
        IntelligenceResponse::Insights(_) => Ok(()),
        IntelligenceResponse::SemanticSearch(results) => results
            .results
            .iter()
            .find(|hit| !(0.0..=1.0).contains(&hit.score))
            .map_or(Ok(()), |hit| Err(format!("hit '{}' score {} outside 0..=1", hit.id, hit.score))),
    }
}
