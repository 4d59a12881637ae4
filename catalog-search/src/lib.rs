//! Catalog search request compiler.
//!
//! Compiles loosely structured catalog query arguments (paging, keywords, filter and
//! facet expressions, sort expressions, explicit ids) into a provider-neutral
//! [`SearchRequest`], and turns the provider's aggregation counts back into facets.

pub mod catalog;
pub mod config;
pub mod errors;
pub mod examples;
pub mod facets;
pub mod filters;
pub mod provider;
pub mod search;

pub use catalog::{CatalogSearch, ProductQuery, ProductSearchResult};
pub use config::CompilerConfig;
pub use errors::*;
pub use facets::Facet;
pub use filters::{AndFilter, FieldNameMapper, Filter, RangeFilterValue};
pub use provider::{PhraseParseResult, PhraseParser, SearchProvider, SearchResponse};
pub use search::{AggregationRequest, RequestCompiler, SearchRequest, SortField};
