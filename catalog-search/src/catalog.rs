//! End-to-end catalog search: query arguments in, documents and facets out.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::config::CompilerConfig;
use crate::errors::SearchError;
use crate::facets::{self, Facet};
use crate::filters::FieldNameMapper;
use crate::provider::{PhraseParser, SearchProvider};
use crate::search::{RequestCompiler, SearchRequest};

/// Raw catalog query arguments, as received from the API layer.
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    pub skip: Option<i64>,
    pub take: Option<i64>,
    /// Free-text keyword.
    pub keyword: Option<String>,
    /// Filter expression, e.g. `color:red price.usd:[10 TO 20)`.
    pub filter: Option<String>,
    /// Facet expression, e.g. `brand color price:[0 TO 100),[100 TO )`.
    pub facet: Option<String>,
    /// Sort expression, e.g. `price desc;name`.
    pub sort: Option<String>,
    pub culture: Option<String>,
    pub currency: Option<String>,
    #[serde(default)]
    pub object_ids: Vec<String>,
    /// Extra `field:value` terms.
    #[serde(default)]
    pub terms: Vec<String>,
    #[serde(default)]
    pub fuzzy: bool,
    pub fuzzy_level: Option<u32>,
    #[serde(default)]
    pub include_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSearchResult {
    pub total_count: u64,
    pub documents: Vec<JsonValue>,
    pub facets: Vec<Facet>,
}

/// Compiles queries with a fixed configuration and runs them against a provider.
pub struct CatalogSearch<P> {
    config: CompilerConfig,
    mapper: FieldNameMapper,
    parser: Arc<dyn PhraseParser>,
    provider: P,
}

impl<P: SearchProvider> CatalogSearch<P> {
    /// Validates `config` and compiles its field mappings once for all queries.
    pub fn new(config: CompilerConfig, parser: Arc<dyn PhraseParser>, provider: P) -> Result<Self, SearchError> {
        config.validate()?;
        let mapper = config.field_mapper()?;
        Ok(Self {
            config,
            mapper,
            parser,
            provider,
        })
    }

    #[inline]
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile `query` without executing it.
    pub fn compile(&self, query: &ProductQuery) -> Result<SearchRequest, SearchError> {
        let take = query.take.unwrap_or(self.config.search.default_take);
        let mut compiler = RequestCompiler::configured(&self.config, self.mapper.clone())
            .with_shared_phrase_parser(Arc::clone(&self.parser))
            .with_paging(query.skip.unwrap_or(0), take);

        if let Some(culture) = &query.culture {
            compiler = compiler.with_culture(culture.as_str());
        }
        if let Some(currency) = &query.currency {
            compiler = compiler.with_currency(currency.as_str());
        }
        if let Some(keyword) = &query.keyword {
            compiler = compiler.with_search_phrase(keyword.as_str());
        }

        let request = compiler
            .with_fuzzy(query.fuzzy, query.fuzzy_level)
            .with_include_fields(query.include_fields.iter().cloned())
            .add_object_ids(query.object_ids.iter().cloned())
            .add_terms(&query.terms, false)
            .parse_filters(query.filter.as_deref().unwrap_or_default())?
            .add_terms(&self.config.search.default_terms, true)
            .parse_facets(
                query.facet.as_deref().unwrap_or_default(),
                Some(self.config.predefined_aggregations()),
            )?
            .add_sorting(query.sort.as_deref().unwrap_or_default())
            .apply_multi_select_facet_search()
            .build();

        log::debug!(
            "compiled query into {} conjuncts, {} aggregations, {} sort fields",
            request.filter.children.len(),
            request.aggregations.len(),
            request.sorting.len()
        );
        Ok(request)
    }

    /// Compile, execute and reconcile facets.
    pub async fn search(&self, query: &ProductQuery) -> Result<ProductSearchResult, SearchError> {
        let request = self.compile(query)?;
        let response = self.provider.search(&request).await?;
        log::debug!(
            "provider returned {} documents of {} with {} aggregations",
            response.documents.len(),
            response.total_count,
            response.aggregations.len()
        );

        let facets = facets::reconcile(&request, &response.aggregations);
        Ok(ProductSearchResult {
            total_count: response.total_count,
            documents: response.documents,
            facets,
        })
    }
}
