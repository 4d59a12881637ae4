//! Collaborator interfaces at the edge of the compiler.
//!
//! Neither the expression parser nor the index engine lives in this crate. The
//! compiler only consumes [`PhraseParseResult`] and produces a [`SearchRequest`];
//! whatever executes that request implements [`SearchProvider`].

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::errors::SearchError;
use crate::filters::Filter;
use crate::search::SearchRequest;

/// Structured output of parsing a filter or facet expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseParseResult {
    /// Free text left over after all `field:value` parts were extracted.
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

/// Parses the textual filter/facet language into filters.
pub trait PhraseParser: Send + Sync {
    fn parse(&self, expression: &str) -> Result<PhraseParseResult, SearchError>;
}

impl<F> PhraseParser for F
where
    F: Fn(&str) -> Result<PhraseParseResult, SearchError> + Send + Sync,
{
    fn parse(&self, expression: &str) -> Result<PhraseParseResult, SearchError> {
        self(expression)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResponseValue {
    /// Term value or range bucket id.
    pub id: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResponse {
    /// Id of the [`crate::search::AggregationRequest`] this answers.
    pub id: String,
    #[serde(default)]
    pub values: Vec<AggregationResponseValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub documents: Vec<JsonValue>,
    pub total_count: u64,
    #[serde(default)]
    pub aggregations: Vec<AggregationResponse>,
}

/// Executes compiled requests against an index.
#[allow(async_fn_in_trait)]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError>;
}

impl<T: SearchProvider> SearchProvider for &T {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        (**self).search(request).await
    }
}
