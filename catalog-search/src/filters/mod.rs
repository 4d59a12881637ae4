//! # Filter Tree
//!
//! Provider-neutral filter nodes produced by the request compiler.
//!
//! Leaf nodes that carry a field name (`Term`, `WildcardTerm`, `Range`) are *named*;
//! `Ids` and the composites (`And`, `Or`) are not. Composites own their children, and
//! `Clone` produces a structurally independent copy of the whole subtree.
//!
//! ## Canonical String Form
//!
//! | Variant        | Example                         |
//! |----------------|---------------------------------|
//! | `Term`         | `color:red,blue`                |
//! | `WildcardTerm` | `name:sh*rt`                    |
//! | `Range`        | `price:[10 TO 20),[20 TO )`     |
//! | `Ids`          | `__id:p1,p2`                    |
//! | `And` / `Or`   | `(color:red AND size:M)`        |
//!
//! The canonical form is used for aggregation ids, so it must stay stable.

pub mod mapping;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use mapping::{FieldMappingRule, FieldNameMapper};

/// Literal used in place of `,` inside term values.
pub const COMMA_ESCAPE: &str = "%x2C";

/// Pseudo field name used when stringifying an [`IdsFilter`].
pub const IDS_FIELD: &str = "__id";

const WILDCARD_CHARS: [char; 2] = ['*', '?'];

/// Returns `true` when the value needs pattern matching rather than exact matching.
#[inline]
pub fn is_wildcard_value(value: &str) -> bool {
    value.contains(WILDCARD_CHARS)
}

/// Exact match on any of the listed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermFilter {
    pub field_name: String,
    pub values: Vec<String>,
}

/// Pattern match on a single value containing `*` or `?`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WildcardTermFilter {
    pub field_name: String,
    pub value: String,
}

/// One interval of a [`RangeFilter`]. Missing bounds are open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeFilterValue {
    pub lower: Option<String>,
    pub upper: Option<String>,
    pub include_lower: bool,
    pub include_upper: bool,
}

impl RangeFilterValue {
    /// Half-open interval `[lower TO upper)`, the usual shape of a price bucket.
    pub fn between(lower: impl Into<String>, upper: impl Into<String>) -> Self {
        Self {
            lower: Some(lower.into()),
            upper: Some(upper.into()),
            include_lower: true,
            include_upper: false,
        }
    }

    /// Everything at or above `lower`.
    pub fn at_least(lower: impl Into<String>) -> Self {
        Self {
            lower: Some(lower.into()),
            upper: None,
            include_lower: true,
            include_upper: false,
        }
    }

    /// Everything strictly below `upper`.
    pub fn below(upper: impl Into<String>) -> Self {
        Self {
            lower: None,
            upper: Some(upper.into()),
            include_lower: false,
            include_upper: false,
        }
    }

    /// `[10 TO 20)` style representation.
    pub fn stringify(&self) -> String {
        format!(
            "{}{} TO {}{}",
            if self.include_lower { '[' } else { '(' },
            self.lower.as_deref().unwrap_or_default(),
            self.upper.as_deref().unwrap_or_default(),
            if self.include_upper { ']' } else { ')' },
        )
    }

    /// Bounds and inclusiveness are equal, ignoring surrounding whitespace.
    pub fn same_bounds(&self, other: &RangeFilterValue) -> bool {
        fn bound(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }
        bound(&self.lower) == bound(&other.lower)
            && bound(&self.upper) == bound(&other.upper)
            && self.include_lower == other.include_lower
            && self.include_upper == other.include_upper
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeFilter {
    pub field_name: String,
    pub values: Vec<RangeFilterValue>,
}

/// Restricts results to explicit document ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdsFilter {
    pub values: Vec<String>,
}

/// Conjunction. The root of every compiled request is an `AndFilter`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndFilter {
    pub children: Vec<Filter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrFilter {
    pub children: Vec<Filter>,
}

/// A node of the compiled filter tree.
///
/// # Examples
///
/// ```
/// use catalog_search::filters::Filter;
///
/// let filter = Filter::and([
///     Filter::term("color", ["red", "blue"]),
///     Filter::or([Filter::term("size", ["M"]), Filter::wildcard("size", "X*")]),
/// ]);
///
/// assert_eq!(filter.to_string(), "(color:red,blue AND (size:M OR size:X*))");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    Term(TermFilter),
    WildcardTerm(WildcardTermFilter),
    Range(RangeFilter),
    Ids(IdsFilter),
    And(AndFilter),
    Or(OrFilter),
}

impl Filter {
    // ========== Constructors ==========

    #[inline]
    pub fn term<S: Into<String>>(field_name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self::Term(TermFilter {
            field_name: field_name.into(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    #[inline]
    pub fn wildcard(field_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::WildcardTerm(WildcardTermFilter {
            field_name: field_name.into(),
            value: value.into(),
        })
    }

    #[inline]
    pub fn range(field_name: impl Into<String>, values: impl IntoIterator<Item = RangeFilterValue>) -> Self {
        Self::Range(RangeFilter {
            field_name: field_name.into(),
            values: values.into_iter().collect(),
        })
    }

    #[inline]
    pub fn ids<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::Ids(IdsFilter {
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    #[inline]
    pub fn and(children: impl IntoIterator<Item = Filter>) -> Self {
        Self::And(AndFilter {
            children: children.into_iter().collect(),
        })
    }

    #[inline]
    pub fn or(children: impl IntoIterator<Item = Filter>) -> Self {
        Self::Or(OrFilter {
            children: children.into_iter().collect(),
        })
    }

    // ========== Inspection ==========

    /// Field name of a named leaf; `None` for ids and composites.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::Term(term) => Some(&term.field_name),
            Self::WildcardTerm(wildcard) => Some(&wildcard.field_name),
            Self::Range(range) => Some(&range.field_name),
            Self::Ids(_) | Self::And(_) | Self::Or(_) => None,
        }
    }

    #[inline]
    pub fn is_named(&self) -> bool {
        self.field_name().is_some()
    }

    /// Replace the field name of a named leaf. Other variants are returned as-is.
    pub fn with_field_name(self, field_name: impl Into<String>) -> Self {
        match self {
            Self::Term(term) => Self::Term(TermFilter {
                field_name: field_name.into(),
                ..term
            }),
            Self::WildcardTerm(wildcard) => Self::WildcardTerm(WildcardTermFilter {
                field_name: field_name.into(),
                ..wildcard
            }),
            Self::Range(range) => Self::Range(RangeFilter {
                field_name: field_name.into(),
                ..range
            }),
            other => other,
        }
    }

    /// Direct children of a composite; empty for leaves.
    pub fn children(&self) -> &[Filter] {
        match self {
            Self::And(and) => &and.children,
            Self::Or(or) => &or.children,
            _ => &[],
        }
    }

    /// Canonical string form, see the module docs.
    pub fn stringify(&self) -> String {
        match self {
            Self::Term(term) => {
                let values: Vec<String> = term.values.iter().map(|v| v.replace(',', COMMA_ESCAPE)).collect();
                format!("{}:{}", term.field_name, values.join(","))
            }
            Self::WildcardTerm(wildcard) => format!("{}:{}", wildcard.field_name, wildcard.value),
            Self::Range(range) => {
                let values: Vec<String> = range.values.iter().map(RangeFilterValue::stringify).collect();
                format!("{}:{}", range.field_name, values.join(","))
            }
            Self::Ids(ids) => format!("{}:{}", IDS_FIELD, ids.values.join(",")),
            Self::And(and) => join_children(&and.children, " AND "),
            Self::Or(or) => join_children(&or.children, " OR "),
        }
    }
}

fn join_children(children: &[Filter], separator: &str) -> String {
    let parts: Vec<String> = children.iter().map(Filter::stringify).collect();
    format!("({})", parts.join(separator))
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify())
    }
}

impl AndFilter {
    pub fn new(children: impl IntoIterator<Item = Filter>) -> Self {
        Self {
            children: children.into_iter().collect(),
        }
    }

    #[inline]
    pub fn push(&mut self, filter: Filter) {
        self.children.push(filter);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether a named conjunct on `field_name` exists (case-insensitive).
    pub fn has_conjunct_on(&self, field_name: &str) -> bool {
        self.children
            .iter()
            .filter_map(Filter::field_name)
            .any(|name| name.eq_ignore_ascii_case(field_name))
    }
}

impl From<AndFilter> for Filter {
    fn from(value: AndFilter) -> Self {
        Filter::And(value)
    }
}

impl From<OrFilter> for Filter {
    fn from(value: OrFilter) -> Self {
        Filter::Or(value)
    }
}

impl From<TermFilter> for Filter {
    fn from(value: TermFilter) -> Self {
        Filter::Term(value)
    }
}

impl From<RangeFilter> for Filter {
    fn from(value: RangeFilter) -> Self {
        Filter::Range(value)
    }
}
