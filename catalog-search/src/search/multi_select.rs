//! Multi-select facet isolation.
//!
//! Selecting a value inside facet `F` must not hide the other values of `F`, while
//! selections on other facets must still narrow `F`'s counts. Each aggregation
//! therefore gets its own copy of the root conjunction with `F`'s conjuncts removed.
//!
//! A conjunct is removed when it is named and its field name is a case-insensitive
//! prefix of the aggregation field: a `size` conjunct is dropped for a `size` or a
//! `size_extended` facet, but not the other way round.

use super::AggregationRequest;
use crate::filters::{AndFilter, Filter};

#[derive(Debug, Clone, Copy, Default)]
pub struct MultiSelectFacetResolver;

impl MultiSelectFacetResolver {
    /// Set each aggregation's own filter from `root`.
    pub fn resolve(&self, aggregations: &mut [AggregationRequest], root: &AndFilter) {
        for aggregation in aggregations.iter_mut() {
            let field_name = facet_field_name(aggregation);
            let isolated = isolate(root, &field_name);
            log::trace!(
                "facet {:?} keeps {} of {} conjuncts",
                aggregation.id(),
                isolated.children.len(),
                root.children.len()
            );

            let slot = aggregation.filter_mut();
            *slot = Some(match slot.take() {
                None => Filter::And(isolated),
                Some(existing) => Filter::and([Filter::And(isolated), existing]),
            });
        }
    }
}

/// Aggregation field name, falling back to the field of its own filter.
fn facet_field_name(aggregation: &AggregationRequest) -> String {
    let field_name = aggregation.field_name();
    if !field_name.is_empty() {
        return field_name.to_string();
    }
    aggregation
        .filter()
        .and_then(Filter::field_name)
        .unwrap_or_default()
        .to_string()
}

/// Deep copy of `root` without the direct children that constrain `field_name`.
pub(crate) fn isolate(root: &AndFilter, field_name: &str) -> AndFilter {
    let mut copy = root.clone();
    copy.children.retain(|child| match child.field_name() {
        Some(conjunct) => !starts_with_ignore_case(field_name, conjunct),
        None => true,
    });
    copy
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value.len() >= prefix.len()
        && value.is_char_boundary(prefix.len())
        && value[..prefix.len()].eq_ignore_ascii_case(prefix)
}
