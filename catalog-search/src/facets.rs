//! Facet reconciliation.
//!
//! Pairs the provider's aggregation counts with the aggregation requests that were
//! compiled for them and flags the items the user has already selected, so a UI can
//! render multi-select facets (checked values keep their counts).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::filters::{AndFilter, Filter, RangeFilterValue};
use crate::provider::AggregationResponse;
use crate::search::{AggregationRequest, RangeAggregationRequest, SearchRequest, TermAggregationRequest};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermFacetItem {
    pub term: String,
    pub count: u64,
    pub is_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermFacet {
    pub id: String,
    pub field_name: String,
    pub items: Vec<TermFacetItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeFacetItem {
    pub id: String,
    pub lower: Option<String>,
    pub upper: Option<String>,
    pub include_lower: bool,
    pub include_upper: bool,
    pub count: u64,
    pub is_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeFacet {
    pub id: String,
    pub field_name: String,
    pub items: Vec<RangeFacetItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Facet {
    Term(TermFacet),
    Range(RangeFacet),
}

impl Facet {
    pub fn id(&self) -> &str {
        match self {
            Self::Term(term) => &term.id,
            Self::Range(range) => &range.id,
        }
    }
}

/// Build facets in request order. Responses without a matching request are skipped;
/// requests without a response produce no facet.
pub fn reconcile(request: &SearchRequest, responses: &[AggregationResponse]) -> Vec<Facet> {
    let by_id: HashMap<&str, &AggregationResponse> =
        responses.iter().map(|response| (response.id.as_str(), response)).collect();

    for response in responses {
        if request.aggregation(&response.id).is_none() {
            log::debug!("ignoring aggregation response {:?} with no matching request", response.id);
        }
    }

    request
        .aggregations
        .iter()
        .filter_map(|aggregation| {
            let response = by_id.get(aggregation.id())?;
            Some(match aggregation {
                AggregationRequest::Term(term) => Facet::Term(term_facet(term, response, &request.filter)),
                AggregationRequest::Range(range) => Facet::Range(range_facet(range, response, &request.filter)),
            })
        })
        .collect()
}

/// Requested values keep their order and get a zero count when the provider omitted them.
fn term_facet(request: &TermAggregationRequest, response: &AggregationResponse, root: &AndFilter) -> TermFacet {
    let counts: Vec<(&str, u64)> = if request.values.is_empty() {
        response.values.iter().map(|value| (value.id.as_str(), value.count)).collect()
    } else {
        request
            .values
            .iter()
            .map(|term| {
                let count = response
                    .values
                    .iter()
                    .find(|value| value.id.eq_ignore_ascii_case(term))
                    .map_or(0, |value| value.count);
                (term.as_str(), count)
            })
            .collect()
    };

    let items = counts
        .into_iter()
        .map(|(term, count)| TermFacetItem {
            is_applied: term_is_applied(root, &request.field_name, term),
            term: term.to_string(),
            count,
        })
        .collect();
    TermFacet {
        id: request.id.clone(),
        field_name: request.field_name.clone(),
        items,
    }
}

fn range_facet(request: &RangeAggregationRequest, response: &AggregationResponse, root: &AndFilter) -> RangeFacet {
    let counts: HashMap<&str, u64> = response
        .values
        .iter()
        .map(|value| (value.id.as_str(), value.count))
        .collect();

    let items = request
        .values
        .iter()
        .map(|bucket| {
            let bounds = RangeFilterValue {
                lower: bucket.lower.clone(),
                upper: bucket.upper.clone(),
                include_lower: bucket.include_lower,
                include_upper: bucket.include_upper,
            };
            RangeFacetItem {
                id: bucket.id.clone(),
                lower: bucket.lower.clone(),
                upper: bucket.upper.clone(),
                include_lower: bucket.include_lower,
                include_upper: bucket.include_upper,
                count: counts.get(bucket.id.as_str()).copied().unwrap_or(0),
                is_applied: range_is_applied(root, &request.field_name, &bounds),
            }
        })
        .collect();

    RangeFacet {
        id: request.id.clone(),
        field_name: request.field_name.clone(),
        items,
    }
}

/// Conjuncts, with OR conjuncts flattened one level (wildcard expansion produces those).
fn selections(root: &AndFilter) -> impl Iterator<Item = &Filter> {
    root.children.iter().flat_map(|child| match child {
        Filter::Or(or) => or.children.iter().collect::<Vec<_>>(),
        other => vec![other],
    })
}

fn term_is_applied(root: &AndFilter, field_name: &str, value: &str) -> bool {
    selections(root).any(|filter| match filter {
        Filter::Term(term) => {
            term.field_name.eq_ignore_ascii_case(field_name)
                && term.values.iter().any(|selected| selected.eq_ignore_ascii_case(value))
        }
        _ => false,
    })
}

fn range_is_applied(root: &AndFilter, field_name: &str, bounds: &RangeFilterValue) -> bool {
    selections(root).any(|filter| match filter {
        Filter::Range(range) => {
            range.field_name.eq_ignore_ascii_case(field_name)
                && range.values.iter().any(|selected| selected.same_bounds(bounds))
        }
        _ => false,
    })
}
