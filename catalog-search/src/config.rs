//! Compiler configuration, usually loaded from a TOML file:
//!
//! ```toml
//! [search]
//! default_take = 20
//! content_field = "__content"
//! default_sort_field = "score"
//! default_sort_descending = true
//! localized_facet_fields = ["description"]
//! default_terms = ["is_active:true", "status:visible"]
//!
//! # Replaces the built-in catalog rules when present. Order is precedence.
//! [[field_mappings]]
//! pattern = '^sku$'
//! replacement = "code"
//!
//! [[field_mappings]]
//! pattern = '^price\.([a-z]{3})$'
//! replacement = "price_${1}"
//! lowercase = true
//!
//! [[facets]]
//! field = "brand"
//! size = 20
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::SearchError;
use crate::filters::{FieldMappingRule, FieldNameMapper};
use crate::search::{AggregationRequest, CONTENT_FIELD, SCORE_FIELD, SortField, TermAggregationRequest};

pub const DEFAULT_TAKE: i64 = 20;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilerConfig {
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub field_mappings: Vec<FieldMappingSettings>,
    #[serde(default)]
    pub facets: Vec<FacetSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_take")]
    pub default_take: i64,
    #[serde(default = "default_content_field")]
    pub content_field: String,
    #[serde(default = "default_sort_field")]
    pub default_sort_field: String,
    #[serde(default = "default_sort_descending")]
    pub default_sort_descending: bool,
    /// Facet keywords that get a `_<culture>` suffix when a culture is set.
    #[serde(default)]
    pub localized_facet_fields: Vec<String>,
    /// `field:value` terms added to every request unless the user already filters on the field.
    #[serde(default)]
    pub default_terms: Vec<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_take: default_take(),
            content_field: default_content_field(),
            default_sort_field: default_sort_field(),
            default_sort_descending: default_sort_descending(),
            localized_facet_fields: Vec::new(),
            default_terms: Vec::new(),
        }
    }
}

fn default_take() -> i64 {
    DEFAULT_TAKE
}

fn default_content_field() -> String {
    CONTENT_FIELD.to_string()
}

fn default_sort_field() -> String {
    SCORE_FIELD.to_string()
}

fn default_sort_descending() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMappingSettings {
    pub pattern: String,
    pub replacement: String,
    #[serde(default)]
    pub lowercase: bool,
}

/// A facet requested on every search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacetSettings {
    pub field: String,
    #[serde(default)]
    pub size: usize,
}

impl CompilerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, SearchError> {
        let config: CompilerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SearchError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        log::debug!("loading compiler config from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.search.default_take < 0 {
            return Err(SearchError::InvalidConfig {
                message: format!("default_take must not be negative, got {}", self.search.default_take),
            });
        }
        if self.search.content_field.trim().is_empty() {
            return Err(SearchError::InvalidConfig {
                message: "content_field must not be empty".to_string(),
            });
        }
        if self.search.default_sort_field.trim().is_empty() {
            return Err(SearchError::InvalidConfig {
                message: "default_sort_field must not be empty".to_string(),
            });
        }
        if let Some(facet) = self.facets.iter().find(|facet| facet.field.trim().is_empty()) {
            return Err(SearchError::InvalidConfig {
                message: format!("facet with size {} has no field", facet.size),
            });
        }
        self.field_mapper()?;
        Ok(())
    }

    /// Configured mapping rules, or the catalog rules when none are configured.
    pub fn field_mapper(&self) -> Result<FieldNameMapper, SearchError> {
        if self.field_mappings.is_empty() {
            return Ok(FieldNameMapper::catalog());
        }
        let rules = self
            .field_mappings
            .iter()
            .map(|mapping| {
                FieldMappingRule::new(&mapping.pattern, mapping.replacement.as_str())
                    .map(|rule| rule.lowercased(mapping.lowercase))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FieldNameMapper::new(rules))
    }

    pub fn default_sort(&self) -> SortField {
        SortField::new(self.search.default_sort_field.clone(), self.search.default_sort_descending)
    }

    pub fn predefined_aggregations(&self) -> Vec<AggregationRequest> {
        self.facets
            .iter()
            .map(|facet| {
                AggregationRequest::Term(TermAggregationRequest {
                    id: facet.field.clone(),
                    field_name: facet.field.clone(),
                    size: facet.size,
                    values: Vec::new(),
                    filter: None,
                })
            })
            .collect()
    }
}
