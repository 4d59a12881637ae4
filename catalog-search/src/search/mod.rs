//! # Search Request Compilation
//!
//! Turns user-facing catalog query arguments into a provider-neutral [`SearchRequest`].
//!
//! ```text
//! paging / keyword / ids ──► RequestCompiler
//! filter expression ──► PhraseParser ──► FieldNameMapper ──► wildcard + currency rewrite ──► root AND
//! facet expression  ──► PhraseParser ──► FieldNameMapper ──► AggregationRequest list
//!                                             MultiSelectFacetResolver ──► per-facet filters
//! sort expression   ──► SortCompiler ──► SortField list
//!                                             build() ──► SearchRequest
//! ```
//!
//! # Example
//!
//! ```
//! use catalog_search::search::RequestCompiler;
//!
//! let request = RequestCompiler::new()
//!     .with_currency("USD")
//!     .with_paging(0, 20)
//!     .add_terms(["color:red", "size:M,L"], false)
//!     .add_sorting("price desc")
//!     .build();
//!
//! assert_eq!(request.filter.children.len(), 2);
//! assert_eq!(request.sorting[0].field_name, "price_usd");
//! ```

mod compiler;
mod multi_select;
mod sorting;

use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::filters::{AndFilter, Filter};

pub use compiler::RequestCompiler;
pub use multi_select::MultiSelectFacetResolver;
pub use sorting::SortCompiler;

/// Default full-text field every request searches.
pub const CONTENT_FIELD: &str = "__content";

/// Field name of the relevance score sort.
pub const SCORE_FIELD: &str = "score";

#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// One sorting criterion. Position in the sorting list is its precedence.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortField {
    pub field_name: String,
    pub descending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_point: Option<GeoPoint>,
}

impl SortField {
    pub fn new(field_name: impl Into<String>, descending: bool) -> Self {
        Self {
            field_name: field_name.into(),
            descending,
            geo_point: None,
        }
    }

    /// Distance sort from `point`.
    pub fn geo_distance(field_name: impl Into<String>, point: GeoPoint, descending: bool) -> Self {
        Self {
            field_name: field_name.into(),
            descending,
            geo_point: Some(point),
        }
    }

    /// Relevance score, best first.
    pub fn relevance() -> Self {
        Self::new(SCORE_FIELD, true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermAggregationRequest {
    pub id: String,
    pub field_name: String,
    /// Maximum number of buckets; `0` lets the provider decide.
    pub size: usize,
    /// Count only these values. Empty means the top terms of the field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeAggregationBucket {
    pub id: String,
    pub lower: Option<String>,
    pub upper: Option<String>,
    pub include_lower: bool,
    pub include_upper: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeAggregationRequest {
    pub id: String,
    pub field_name: String,
    pub values: Vec<RangeAggregationBucket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
}

/// A requested facet: term counts or range buckets over one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AggregationRequest {
    Term(TermAggregationRequest),
    Range(RangeAggregationRequest),
}

impl AggregationRequest {
    /// Zero-size term aggregation over `field_name`, identified by the field name.
    pub fn term(field_name: impl Into<String>) -> Self {
        let field_name = field_name.into();
        Self::Term(TermAggregationRequest {
            id: field_name.clone(),
            field_name,
            size: 0,
            values: Vec::new(),
            filter: None,
        })
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Term(term) => &term.id,
            Self::Range(range) => &range.id,
        }
    }

    pub fn field_name(&self) -> &str {
        match self {
            Self::Term(term) => &term.field_name,
            Self::Range(range) => &range.field_name,
        }
    }

    pub fn filter(&self) -> Option<&Filter> {
        match self {
            Self::Term(term) => term.filter.as_ref(),
            Self::Range(range) => range.filter.as_ref(),
        }
    }

    pub fn filter_mut(&mut self) -> &mut Option<Filter> {
        match self {
            Self::Term(term) => &mut term.filter,
            Self::Range(range) => &mut range.filter,
        }
    }
}

/// The frozen, provider-neutral search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub skip: i64,
    pub take: i64,
    /// Free-text keywords; `None` matches everything.
    pub search_keywords: Option<String>,
    pub search_fields: Vec<String>,
    /// Root conjunction of all filters.
    pub filter: AndFilter,
    pub sorting: Vec<SortField>,
    pub aggregations: Vec<AggregationRequest>,
    pub include_fields: Vec<String>,
    pub is_fuzzy: bool,
    pub fuzziness: Option<u32>,
}

impl SearchRequest {
    pub fn aggregation(&self, id: &str) -> Option<&AggregationRequest> {
        self.aggregations.iter().find(|aggregation| aggregation.id() == id)
    }
}
