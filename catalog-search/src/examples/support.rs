use std::collections::HashMap;
use std::sync::Mutex;

use crate::errors::SearchError;
use crate::filters::Filter;
use crate::provider::{PhraseParseResult, PhraseParser, SearchProvider, SearchResponse};
use crate::search::SearchRequest;

/// Phrase parser that answers from a fixed table of expressions.
#[derive(Debug, Default)]
pub struct ScriptedParser {
    scripts: HashMap<String, PhraseParseResult>,
}

impl ScriptedParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the result for `expression`.
    pub fn script(mut self, expression: &str, keyword: &str, filters: Vec<Filter>) -> Self {
        self.scripts.insert(
            expression.to_string(),
            PhraseParseResult {
                keyword: keyword.to_string(),
                filters,
            },
        );
        self
    }
}

impl PhraseParser for ScriptedParser {
    fn parse(&self, expression: &str) -> Result<PhraseParseResult, SearchError> {
        self.scripts
            .get(expression)
            .cloned()
            .ok_or_else(|| SearchError::parse(format!("no script for expression {expression:?}")))
    }
}

/// Provider that returns a canned response and keeps every request it received.
#[derive(Debug, Default)]
pub struct RecordingProvider {
    response: SearchResponse,
    requests: Mutex<Vec<SearchRequest>>,
}

impl RecordingProvider {
    pub fn new(response: SearchResponse) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().map(|requests| requests.clone()).unwrap_or_default()
    }
}

impl SearchProvider for RecordingProvider {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        let mut requests = self
            .requests
            .lock()
            .map_err(|_| SearchError::provider("request log poisoned"))?;
        requests.push(request.clone());
        Ok(self.response.clone())
    }
}
