//! Field name mapping from user-facing filter syntax to index field names.
//!
//! Rules are evaluated in order and the first match wins, so more specific patterns
//! must come before broader ones.
//!
//! | User-facing               | Index field   |
//! |---------------------------|---------------|
//! | `price.USD`               | `price_usd`   |
//! | `catalog.id`              | `catalog`     |
//! | `category.path`           | `__path`      |
//! | `category.subtree`        | `__outline`   |
//! | `categories.subtree`      | `__outline`   |
//! | `sku`                     | `code`        |
//! | `properties.color`        | `color`       |

use std::borrow::Cow;

use regex::{Regex, RegexBuilder};

use super::Filter;
use crate::errors::SearchError;

/// Catalog rules as `(pattern, replacement, lowercase)`, in precedence order.
///
/// Currency fields are lower-cased so they agree with the currency rewrite
/// (`price_usd`), whatever case the user typed the code in.
pub const CATALOG_FIELD_MAPPINGS: &[(&str, &str, bool)] = &[
    (r"^price\.([A-Za-z]{3})$", "price_${1}", true),
    (r"^catalog\.id$", "catalog", false),
    (r"^category\.path$", "__path", false),
    (r"^categor(?:y|ies)\.subtree$", "__outline", false),
    (r"^sku$", "code", false),
    (r"^properties\.(.+)$", "${1}", false),
];

/// A single `pattern -> replacement` rewrite. Patterns are case-insensitive.
#[derive(Debug, Clone)]
pub struct FieldMappingRule {
    pattern: Regex,
    replacement: String,
    lowercase: bool,
}

impl FieldMappingRule {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, SearchError> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            pattern,
            replacement: replacement.into(),
            lowercase: false,
        })
    }

    /// Lower-case the rewritten name.
    pub fn lowercased(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    #[inline]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    #[inline]
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    fn apply<'a>(&self, field_name: &'a str) -> Option<Cow<'a, str>> {
        if !self.pattern.is_match(field_name) {
            return None;
        }
        let replaced = self.pattern.replace(field_name, self.replacement.as_str());
        if self.lowercase {
            return Some(Cow::Owned(replaced.to_lowercase()));
        }
        Some(replaced)
    }
}

/// Ordered, immutable list of field mapping rules.
///
/// # Examples
///
/// ```
/// use catalog_search::filters::{Filter, FieldNameMapper};
///
/// let mapper = FieldNameMapper::catalog();
/// assert_eq!(mapper.map(Filter::term("sku", ["ABC123"])), Filter::term("code", ["ABC123"]));
/// assert_eq!(mapper.map_field_name("properties.color"), "color");
/// assert_eq!(mapper.map_field_name("brand"), "brand");
/// ```
#[derive(Debug, Clone)]
pub struct FieldNameMapper {
    rules: Vec<FieldMappingRule>,
}

impl Default for FieldNameMapper {
    fn default() -> Self {
        Self::catalog()
    }
}

impl FieldNameMapper {
    pub fn new(rules: impl IntoIterator<Item = FieldMappingRule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// Compile `(pattern, replacement)` pairs, failing on the first invalid pattern.
    pub fn from_pairs<P, R>(pairs: impl IntoIterator<Item = (P, R)>) -> Result<Self, SearchError>
    where
        P: AsRef<str>,
        R: Into<String>,
    {
        let rules = pairs
            .into_iter()
            .map(|(pattern, replacement)| FieldMappingRule::new(pattern.as_ref(), replacement))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules))
    }

    /// The built-in catalog rules.
    pub fn catalog() -> Self {
        let rules = CATALOG_FIELD_MAPPINGS
            .iter()
            .filter_map(|(pattern, replacement, lowercase)| {
                FieldMappingRule::new(pattern, *replacement)
                    .ok()
                    .map(|rule| rule.lowercased(*lowercase))
            });
        Self::new(rules)
    }

    #[inline]
    pub fn rules(&self) -> &[FieldMappingRule] {
        &self.rules
    }

    /// Rewrite a bare field name with the first matching rule.
    pub fn map_field_name<'a>(&self, field_name: &'a str) -> Cow<'a, str> {
        for rule in &self.rules {
            if let Some(mapped) = rule.apply(field_name) {
                log::trace!("mapped field {field_name:?} to {mapped:?} via {}", rule.pattern());
                return mapped;
            }
        }
        Cow::Borrowed(field_name)
    }

    /// Rewrite the field name of a named filter. Composites and ids are returned unchanged.
    pub fn map(&self, filter: Filter) -> Filter {
        let mapped = filter.field_name().and_then(|name| match self.map_field_name(name) {
            Cow::Owned(mapped) => Some(mapped),
            Cow::Borrowed(_) => None,
        });
        match mapped {
            Some(field_name) => filter.with_field_name(field_name),
            None => filter,
        }
    }
}
