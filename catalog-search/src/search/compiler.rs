use std::sync::Arc;

use super::{
    AggregationRequest, CONTENT_FIELD, MultiSelectFacetResolver, RangeAggregationBucket, RangeAggregationRequest,
    SearchRequest, SortCompiler, SortField, TermAggregationRequest,
};
use crate::config::{CompilerConfig, DEFAULT_TAKE};
use crate::errors::SearchError;
use crate::filters::{
    AndFilter, COMMA_ESCAPE, FieldNameMapper, Filter, OrFilter, RangeFilter, TermFilter, is_wildcard_value,
};
use crate::provider::PhraseParser;

const PRICE_FIELD: &str = "price";
const TERM_SEPARATOR: char = ':';
const VALUE_SEPARATOR: char = ',';

/// Accumulates one catalog query and freezes it into a [`SearchRequest`].
///
/// A compiler is created per incoming query, configured through the chained
/// methods below and consumed by [`RequestCompiler::build`].
///
/// # Examples
///
/// ```
/// use catalog_search::filters::Filter;
/// use catalog_search::provider::PhraseParseResult;
/// use catalog_search::search::RequestCompiler;
///
/// let parser = |expression: &str| -> Result<PhraseParseResult, catalog_search::SearchError> {
///     assert_eq!(expression, "sku:ABC123");
///     Ok(PhraseParseResult {
///         keyword: String::new(),
///         filters: vec![Filter::term("sku", ["ABC123"])],
///     })
/// };
///
/// let request = RequestCompiler::new()
///     .with_phrase_parser(parser)
///     .parse_filters("sku:ABC123")?
///     .build();
///
/// assert_eq!(request.filter.children, vec![Filter::term("code", ["ABC123"])]);
/// # Ok::<(), catalog_search::SearchError>(())
/// ```
pub struct RequestCompiler {
    skip: i64,
    take: i64,
    search_phrase: Option<String>,
    content_field: String,
    search_fields: Vec<String>,
    filter: AndFilter,
    sorting: Vec<SortField>,
    aggregations: Vec<AggregationRequest>,
    include_fields: Vec<String>,
    is_fuzzy: bool,
    fuzziness: Option<u32>,
    currency: Option<String>,
    culture: Option<String>,
    localized_facet_fields: Vec<String>,
    mapper: FieldNameMapper,
    parser: Option<Arc<dyn PhraseParser>>,
}

impl Default for RequestCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestCompiler {
    /// Compiler with the catalog field mappings and relevance sorting.
    pub fn new() -> Self {
        Self::with_mapper(FieldNameMapper::catalog())
    }

    pub fn with_mapper(mapper: FieldNameMapper) -> Self {
        Self {
            skip: 0,
            take: DEFAULT_TAKE,
            search_phrase: None,
            content_field: CONTENT_FIELD.to_string(),
            search_fields: vec![CONTENT_FIELD.to_string()],
            filter: AndFilter::default(),
            sorting: vec![SortField::relevance()],
            aggregations: Vec::new(),
            include_fields: Vec::new(),
            is_fuzzy: false,
            fuzziness: None,
            currency: None,
            culture: None,
            localized_facet_fields: Vec::new(),
            mapper,
            parser: None,
        }
    }

    pub fn from_config(config: &CompilerConfig) -> Result<Self, SearchError> {
        Ok(Self::configured(config, config.field_mapper()?))
    }

    /// Like [`RequestCompiler::from_config`], with a mapper compiled ahead of time.
    pub fn configured(config: &CompilerConfig, mapper: FieldNameMapper) -> Self {
        let mut compiler = Self::with_mapper(mapper);
        compiler.take = config.search.default_take;
        compiler.content_field = config.search.content_field.clone();
        compiler.search_fields = vec![compiler.content_field.clone()];
        compiler.sorting = vec![config.default_sort()];
        compiler.localized_facet_fields = config.search.localized_facet_fields.clone();
        compiler
    }

    // ========== Configuration ==========

    /// Paging is passed through as-is; the provider enforces its own bounds.
    #[inline]
    pub fn with_paging(mut self, skip: i64, take: i64) -> Self {
        self.skip = skip;
        self.take = take;
        self
    }

    /// Free-text keywords. Blank text means match-all.
    pub fn with_search_phrase(mut self, phrase: impl Into<String>) -> Self {
        let phrase = phrase.into();
        let trimmed = phrase.trim();
        self.search_phrase = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Adds the culture-specific content field next to the default one.
    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        let culture = culture.into();
        let culture = culture.trim();
        self.search_fields = vec![self.content_field.clone()];
        if culture.is_empty() {
            self.culture = None;
        } else {
            let culture = culture.to_lowercase();
            self.search_fields.push(format!("{}_{}", self.content_field, culture));
            self.culture = Some(culture);
        }
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        let currency = currency.into();
        let currency = currency.trim();
        self.currency = (!currency.is_empty()).then(|| currency.to_string());
        self
    }

    #[inline]
    pub fn with_fuzzy(mut self, is_fuzzy: bool, fuzziness: Option<u32>) -> Self {
        self.is_fuzzy = is_fuzzy;
        self.fuzziness = fuzziness;
        self
    }

    pub fn with_include_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.include_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_phrase_parser(mut self, parser: impl PhraseParser + 'static) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    pub fn with_shared_phrase_parser(mut self, parser: Arc<dyn PhraseParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Facet keywords that receive a `_<culture>` suffix.
    pub fn with_localized_facet_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.localized_facet_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    // ========== Filters ==========

    /// Explicit id lookups are exhaustive: `take` becomes the number of ids.
    pub fn add_object_ids<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if !ids.is_empty() {
            self.take = ids.len() as i64;
            self.filter.push(Filter::ids(ids));
        }
        self
    }

    /// Add `name:v1,v2` terms as conjuncts.
    ///
    /// With `skip_if_exists`, a term is dropped when a conjunct on the same field is
    /// already present, so defaults never override a user selection.
    pub fn add_terms<S: AsRef<str>>(mut self, terms: impl IntoIterator<Item = S>, skip_if_exists: bool) -> Self {
        for term in terms {
            let term = term.as_ref();
            let Some(filter) = parse_term(term) else {
                log::debug!("dropping malformed term {term:?}");
                continue;
            };
            let filter = self.mapper.map(filter);
            if skip_if_exists
                && let Some(field_name) = filter.field_name()
                && self.filter.has_conjunct_on(field_name)
            {
                log::debug!("skipping term {term:?}: field {field_name:?} is already filtered");
                continue;
            }
            self.filter.push(filter);
        }
        self
    }

    /// Parse a filter expression and add every resulting filter as a conjunct.
    pub fn parse_filters(mut self, expression: &str) -> Result<Self, SearchError> {
        let parser = self.phrase_parser()?;
        if expression.trim().is_empty() {
            return Ok(self);
        }

        let parsed = parser.parse(expression)?;
        log::debug!("filter expression {expression:?} parsed into {} filters", parsed.filters.len());

        let keyword = parsed.keyword.trim();
        if self.search_phrase.is_none() && !keyword.is_empty() {
            self.search_phrase = Some(keyword.to_string());
        }

        for filter in parsed.filters {
            let compiled = self.compile_filter(filter);
            self.filter.push(compiled);
        }
        Ok(self)
    }

    /// Map names, expand wildcards and apply the currency to one parsed filter.
    fn compile_filter(&self, filter: Filter) -> Filter {
        match self.mapper.map(filter) {
            Filter::Term(term) => expand_wildcards(term),
            Filter::Range(range) => Filter::Range(self.with_price_currency(range)),
            Filter::And(and) => Filter::And(AndFilter {
                children: and.children.into_iter().map(|child| self.compile_filter(child)).collect(),
            }),
            Filter::Or(or) => Filter::Or(OrFilter {
                children: or.children.into_iter().map(|child| self.compile_filter(child)).collect(),
            }),
            other => other,
        }
    }

    fn with_price_currency(&self, mut range: RangeFilter) -> RangeFilter {
        if let Some(currency) = &self.currency
            && range.field_name.eq_ignore_ascii_case(PRICE_FIELD)
        {
            range.field_name = format!("{PRICE_FIELD}_{}", currency.to_lowercase());
        }
        range
    }

    // ========== Facets ==========

    /// Compile a facet expression into aggregation requests, after `predefined`.
    ///
    /// Aggregation ids are unique: a facet whose id is already requested is skipped.
    /// Bare keywords (`brand color`) become zero-size term aggregations; parsed term
    /// and range filters become term and range aggregations.
    pub fn parse_facets(
        mut self,
        expression: &str,
        predefined: Option<Vec<AggregationRequest>>,
    ) -> Result<Self, SearchError> {
        let parser = self.phrase_parser()?;
        let mut aggregations = Vec::new();
        for aggregation in predefined.unwrap_or_default() {
            push_unique(&mut aggregations, aggregation);
        }
        if expression.trim().is_empty() {
            self.aggregations = aggregations;
            return Ok(self);
        }

        let parsed = parser.parse(expression)?;

        for filter in parsed.filters {
            match self.mapper.map(filter) {
                Filter::Term(term) => push_unique(&mut aggregations, term_aggregation(term)),
                Filter::Range(range) => {
                    push_unique(&mut aggregations, range_aggregation(self.with_price_currency(range)))
                }
                other => log::debug!("facet expression {expression:?}: ignoring unsupported filter {other}"),
            }
        }

        for keyword in parsed.keyword.split_whitespace() {
            let field_name = self.localize_facet_field(keyword);
            let field_name = self.mapper.map_field_name(&field_name).into_owned();
            push_unique(&mut aggregations, AggregationRequest::term(field_name));
        }

        log::debug!("facet expression {expression:?} compiled into {} aggregations", aggregations.len());
        self.aggregations = aggregations;
        Ok(self)
    }

    fn localize_facet_field(&self, field_name: &str) -> String {
        match &self.culture {
            Some(culture)
                if self
                    .localized_facet_fields
                    .iter()
                    .any(|localized| localized.eq_ignore_ascii_case(field_name)) =>
            {
                format!("{field_name}_{culture}")
            }
            _ => field_name.to_string(),
        }
    }

    // ========== Sorting ==========

    /// Replace the sorting with the compiled expression; blank input keeps the current sorting.
    pub fn add_sorting(mut self, expression: &str) -> Self {
        let fields = SortCompiler::new(self.currency.as_deref()).compile(expression);
        if !fields.is_empty() {
            self.sorting = fields;
        }
        self
    }

    // ========== Finalization ==========

    pub fn apply_multi_select_facet_search(mut self) -> Self {
        MultiSelectFacetResolver.resolve(&mut self.aggregations, &self.filter);
        self
    }

    #[inline]
    pub fn filter(&self) -> &AndFilter {
        &self.filter
    }

    #[inline]
    pub fn aggregations(&self) -> &[AggregationRequest] {
        &self.aggregations
    }

    pub fn build(self) -> SearchRequest {
        SearchRequest {
            skip: self.skip,
            take: self.take,
            search_keywords: self.search_phrase,
            search_fields: self.search_fields,
            filter: self.filter,
            sorting: self.sorting,
            aggregations: self.aggregations,
            include_fields: self.include_fields,
            is_fuzzy: self.is_fuzzy,
            fuzziness: self.fuzziness,
        }
    }

    fn phrase_parser(&self) -> Result<Arc<dyn PhraseParser>, SearchError> {
        self.parser.clone().ok_or_else(|| SearchError::missing("phrase parser"))
    }
}

/// `color:red,blue` -> `TermFilter`. The field ends at the first `:`; values may contain `:`.
fn parse_term(term: &str) -> Option<Filter> {
    let (field_name, values) = term.split_once(TERM_SEPARATOR)?;
    let field_name = field_name.trim();
    if field_name.is_empty() {
        return None;
    }

    let values: Vec<String> = values
        .split(VALUE_SEPARATOR)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| value.replace(COMMA_ESCAPE, ","))
        .collect();
    if values.is_empty() {
        return None;
    }
    Some(Filter::term(field_name, values))
}

/// Split wildcard values out of a term filter into an OR of wildcard filters.
fn expand_wildcards(term: TermFilter) -> Filter {
    let TermFilter { field_name, values } = term;
    let (wildcards, literals): (Vec<String>, Vec<String>) = values.into_iter().partition(|v| is_wildcard_value(v));
    if wildcards.is_empty() {
        return Filter::Term(TermFilter {
            field_name,
            values: literals,
        });
    }

    let mut children: Vec<Filter> = wildcards
        .into_iter()
        .map(|value| Filter::wildcard(field_name.clone(), value))
        .collect();
    if !literals.is_empty() {
        children.push(Filter::Term(TermFilter {
            field_name,
            values: literals,
        }));
    }
    Filter::or(children)
}

fn push_unique(aggregations: &mut Vec<AggregationRequest>, aggregation: AggregationRequest) {
    if aggregations.iter().any(|existing| existing.id() == aggregation.id()) {
        log::debug!("skipping duplicate aggregation {:?}", aggregation.id());
        return;
    }
    aggregations.push(aggregation);
}

/// Term facet restricted to the filter's values.
fn term_aggregation(term: TermFilter) -> AggregationRequest {
    let id = Filter::Term(term.clone()).stringify();
    AggregationRequest::Term(TermAggregationRequest {
        id,
        size: term.values.len(),
        field_name: term.field_name,
        values: term.values,
        filter: None,
    })
}

fn range_aggregation(range: RangeFilter) -> AggregationRequest {
    let values = range
        .values
        .into_iter()
        .map(|value| RangeAggregationBucket {
            id: value.stringify(),
            lower: value.lower,
            upper: value.upper,
            include_lower: value.include_lower,
            include_upper: value.include_upper,
        })
        .collect();
    AggregationRequest::Range(RangeAggregationRequest {
        id: range.field_name.clone(),
        field_name: range.field_name,
        values,
        filter: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::RangeFilterValue;
    use crate::provider::PhraseParseResult;

    fn parser_returning(keyword: &'static str, filters: Vec<Filter>) -> impl PhraseParser + 'static {
        move |_: &str| -> Result<PhraseParseResult, SearchError> {
            Ok(PhraseParseResult {
                keyword: keyword.to_string(),
                filters: filters.clone(),
            })
        }
    }

    fn compile_filters(filters: Vec<Filter>) -> SearchRequest {
        RequestCompiler::new()
            .with_currency("USD")
            .with_phrase_parser(parser_returning("", filters))
            .parse_filters("expression")
            .expect("filters compile")
            .build()
    }

    #[test]
    fn defaults_search_content_and_sort_by_relevance() {
        let request = RequestCompiler::new().build();
        assert_eq!(request.skip, 0);
        assert_eq!(request.take, DEFAULT_TAKE);
        assert_eq!(request.search_keywords, None);
        assert_eq!(request.search_fields, vec!["__content"]);
        assert_eq!(request.sorting, vec![SortField::relevance()]);
        assert!(request.filter.is_empty());
        assert!(request.aggregations.is_empty());
    }

    #[test]
    fn paging_is_passed_through_unvalidated() {
        let request = RequestCompiler::new().with_paging(-5, -1).build();
        assert_eq!((request.skip, request.take), (-5, -1));
    }

    #[test]
    fn blank_search_phrase_matches_all() {
        assert_eq!(RequestCompiler::new().with_search_phrase("   ").build().search_keywords, None);
        assert_eq!(
            RequestCompiler::new().with_search_phrase(" red shoes ").build().search_keywords,
            Some("red shoes".to_string())
        );
    }

    #[test]
    fn culture_adds_localized_content_field() {
        let request = RequestCompiler::new().with_culture("en-US").build();
        assert_eq!(request.search_fields, vec!["__content", "__content_en-us"]);
    }

    #[test]
    fn object_ids_override_take() {
        let request = RequestCompiler::new()
            .with_paging(0, 20)
            .add_object_ids(["a", "b", "c"])
            .build();
        assert_eq!(request.take, 3);
        assert_eq!(request.filter.children, vec![Filter::ids(["a", "b", "c"])]);
    }

    #[test]
    fn empty_object_ids_change_nothing() {
        let request = RequestCompiler::new()
            .with_paging(0, 20)
            .add_object_ids(Vec::<String>::new())
            .build();
        assert_eq!(request.take, 20);
        assert!(request.filter.is_empty());
    }

    #[test]
    fn terms_split_values_and_restore_escaped_commas() {
        let request = RequestCompiler::new()
            .add_terms(["brand:Smith%x2C Jones,Acme"], false)
            .build();
        assert_eq!(request.filter.children, vec![Filter::term("brand", ["Smith, Jones", "Acme"])]);
    }

    #[test]
    fn malformed_terms_are_dropped() {
        let request = RequestCompiler::new()
            .add_terms(["novalue", ":red", "color:", "color: , ", "color:red"], false)
            .build();
        assert_eq!(request.filter.children, vec![Filter::term("color", ["red"])]);
    }

    #[test]
    fn term_values_may_contain_colons() {
        let request = RequestCompiler::new()
            .add_terms(["url:http://x", "time:12:30,13:00"], false)
            .build();
        assert_eq!(
            request.filter.children,
            vec![Filter::term("url", ["http://x"]), Filter::term("time", ["12:30", "13:00"])]
        );
    }

    #[test]
    fn skip_if_exists_keeps_existing_conjunct() {
        let request = RequestCompiler::new()
            .add_terms(["color:red"], false)
            .add_terms(["COLOR:blue", "status:visible"], true)
            .build();
        assert_eq!(
            request.filter.children,
            vec![Filter::term("color", ["red"]), Filter::term("status", ["visible"])]
        );
    }

    #[test]
    fn terms_without_skip_accumulate() {
        let request = RequestCompiler::new()
            .add_terms(["color:red"], false)
            .add_terms(["color:blue"], false)
            .build();
        assert_eq!(request.filter.children.len(), 2);
    }

    #[test]
    fn parse_filters_requires_parser() {
        let err = RequestCompiler::new().parse_filters("color:red").err().expect("parser is missing");
        assert!(matches!(err, SearchError::InvalidArgument { message } if message.contains("phrase parser")));
    }

    #[test]
    fn parse_facets_requires_parser() {
        let err = RequestCompiler::new().parse_facets("brand", None).err().expect("parser is missing");
        assert!(matches!(err, SearchError::InvalidArgument { .. }));
    }

    #[test]
    fn parse_facets_requires_parser_for_blank_expression() {
        let err = RequestCompiler::new()
            .parse_facets("", Some(vec![AggregationRequest::term("brand")]))
            .err()
            .expect("parser is missing");
        assert!(matches!(err, SearchError::InvalidArgument { message } if message.contains("phrase parser")));
    }

    #[test]
    fn parser_errors_propagate() {
        let err = RequestCompiler::new()
            .with_phrase_parser(|_: &str| -> Result<PhraseParseResult, SearchError> { Err(SearchError::parse("unbalanced quote")) })
            .parse_filters("\"oops")
            .err()
            .expect("parse error");
        assert!(matches!(err, SearchError::Parse { message } if message == "unbalanced quote"));
    }

    #[test]
    fn sku_filter_is_mapped_to_code() {
        let request = compile_filters(vec![Filter::term("sku", ["ABC123"])]);
        assert_eq!(request.filter.children, vec![Filter::term("code", ["ABC123"])]);
    }

    #[test]
    fn wildcard_values_become_or_of_wildcards_and_literals() {
        let request = compile_filters(vec![Filter::term("name", ["a*", "b"])]);
        assert_eq!(
            request.filter.children,
            vec![Filter::or([Filter::wildcard("name", "a*"), Filter::term("name", ["b"])])]
        );
    }

    #[test]
    fn only_wildcards_produce_no_literal_child() {
        let request = compile_filters(vec![Filter::term("name", ["a*", "b?c"])]);
        assert_eq!(
            request.filter.children,
            vec![Filter::or([Filter::wildcard("name", "a*"), Filter::wildcard("name", "b?c")])]
        );
    }

    #[test]
    fn literal_terms_pass_through_unchanged() {
        let request = compile_filters(vec![Filter::term("name", ["a", "b"])]);
        assert_eq!(request.filter.children, vec![Filter::term("name", ["a", "b"])]);
    }

    #[test]
    fn price_range_gets_currency_suffix() {
        let request = compile_filters(vec![Filter::range("Price", [RangeFilterValue::between("10", "20")])]);
        assert_eq!(request.filter.children[0].field_name(), Some("price_usd"));
    }

    #[test]
    fn price_range_without_currency_is_untouched() {
        let request = RequestCompiler::new()
            .with_phrase_parser(parser_returning("", vec![Filter::range("price", [RangeFilterValue::below("5")])]))
            .parse_filters("price:[TO 5)")
            .expect("filters compile")
            .build();
        assert_eq!(request.filter.children[0].field_name(), Some("price"));
    }

    #[test]
    fn explicit_currency_field_is_only_mapped() {
        let request = compile_filters(vec![Filter::range("price.eur", [RangeFilterValue::at_least("1")])]);
        assert_eq!(request.filter.children[0].field_name(), Some("price_eur"));
    }

    #[test]
    fn nested_composites_are_compiled_recursively() {
        let request = compile_filters(vec![Filter::or([
            Filter::term("sku", ["A*"]),
            Filter::and([Filter::term("properties.color", ["red"])]),
        ])]);
        assert_eq!(
            request.filter.children,
            vec![Filter::or([
                Filter::or([Filter::wildcard("code", "A*")]),
                Filter::and([Filter::term("color", ["red"])]),
            ])]
        );
    }

    #[test]
    fn parsed_keyword_becomes_search_phrase_when_unset() {
        let request = RequestCompiler::new()
            .with_phrase_parser(parser_returning(" red shoes ", Vec::new()))
            .parse_filters("red shoes")
            .expect("filters compile")
            .build();
        assert_eq!(request.search_keywords.as_deref(), Some("red shoes"));

        let request = RequestCompiler::new()
            .with_search_phrase("boots")
            .with_phrase_parser(parser_returning("red shoes", Vec::new()))
            .parse_filters("red shoes")
            .expect("filters compile")
            .build();
        assert_eq!(request.search_keywords.as_deref(), Some("boots"));
    }

    #[test]
    fn blank_filter_expression_skips_parser() {
        let request = RequestCompiler::new()
            .with_phrase_parser(|_: &str| -> Result<PhraseParseResult, SearchError> { panic!("parser must not run") })
            .parse_filters("  ")
            .expect("blank expression is a no-op")
            .build();
        assert!(request.filter.is_empty());
    }

    #[test]
    fn facet_keywords_become_zero_size_term_aggregations() {
        let request = RequestCompiler::new()
            .with_phrase_parser(parser_returning("brand  properties.color", Vec::new()))
            .parse_facets("brand properties.color", None)
            .expect("facets compile")
            .build();
        assert_eq!(
            request.aggregations,
            vec![AggregationRequest::term("brand"), AggregationRequest::term("color")]
        );
    }

    #[test]
    fn facet_keywords_are_localized_for_listed_fields() {
        let request = RequestCompiler::new()
            .with_culture("en-US")
            .with_localized_facet_fields(["description"])
            .with_phrase_parser(parser_returning("description brand", Vec::new()))
            .parse_facets("description brand", None)
            .expect("facets compile")
            .build();
        let fields: Vec<&str> = request.aggregations.iter().map(AggregationRequest::field_name).collect();
        assert_eq!(fields, vec!["description_en-us", "brand"]);
    }

    #[test]
    fn facet_filters_become_term_and_range_aggregations() {
        let request = RequestCompiler::new()
            .with_currency("EUR")
            .with_phrase_parser(parser_returning(
                "",
                vec![
                    Filter::term("sku", ["A", "B"]),
                    Filter::range(
                        "price",
                        [RangeFilterValue::between("0", "100"), RangeFilterValue::at_least("100")],
                    ),
                    Filter::ids(["ignored"]),
                ],
            ))
            .parse_facets("sku:A,B price:[0 TO 100),[100 TO )", None)
            .expect("facets compile")
            .build();

        assert_eq!(request.aggregations.len(), 2);
        assert_eq!(
            request.aggregations[0],
            AggregationRequest::Term(TermAggregationRequest {
                id: "code:A,B".into(),
                field_name: "code".into(),
                size: 2,
                values: vec!["A".into(), "B".into()],
                filter: None,
            })
        );
        let AggregationRequest::Range(range) = &request.aggregations[1] else {
            panic!("expected range aggregation");
        };
        assert_eq!(range.id, "price_eur");
        assert_eq!(range.field_name, "price_eur");
        let bucket_ids: Vec<&str> = range.values.iter().map(|bucket| bucket.id.as_str()).collect();
        assert_eq!(bucket_ids, vec!["[0 TO 100)", "[100 TO )"]);
    }

    #[test]
    fn predefined_aggregations_come_first() {
        let request = RequestCompiler::new()
            .with_phrase_parser(parser_returning("color", Vec::new()))
            .parse_facets("color", Some(vec![AggregationRequest::term("brand")]))
            .expect("facets compile")
            .build();
        let ids: Vec<&str> = request.aggregations.iter().map(AggregationRequest::id).collect();
        assert_eq!(ids, vec!["brand", "color"]);
    }

    #[test]
    fn blank_facet_expression_keeps_predefined_only() {
        let request = RequestCompiler::new()
            .with_phrase_parser(|_: &str| -> Result<PhraseParseResult, SearchError> { panic!("parser must not run") })
            .parse_facets("  ", Some(vec![AggregationRequest::term("brand")]))
            .expect("blank facets compile")
            .build();
        assert_eq!(request.aggregations, vec![AggregationRequest::term("brand")]);
    }

    #[test]
    fn facet_ids_are_unique() {
        let request = RequestCompiler::new()
            .with_phrase_parser(parser_returning(
                "brand color brand",
                vec![Filter::term("size", ["M"]), Filter::term("size", ["M"])],
            ))
            .parse_facets("brand color brand size:M size:M", Some(vec![AggregationRequest::term("brand")]))
            .expect("facets compile")
            .build();
        let ids: Vec<&str> = request.aggregations.iter().map(AggregationRequest::id).collect();
        assert_eq!(ids, vec!["brand", "size:M", "color"]);
    }

    #[test]
    fn sorting_replaces_default_only_when_non_empty() {
        let request = RequestCompiler::new().add_sorting("  ").build();
        assert_eq!(request.sorting, vec![SortField::relevance()]);

        let request = RequestCompiler::new().with_currency("EUR").add_sorting("price desc").build();
        assert_eq!(request.sorting, vec![SortField::new("price_eur", true)]);
    }

    #[test]
    fn multi_select_isolates_each_facet() {
        let request = RequestCompiler::new()
            .add_terms(["color:red", "size:M"], false)
            .with_phrase_parser(parser_returning("size color", Vec::new()))
            .parse_facets("size color", None)
            .expect("facets compile")
            .apply_multi_select_facet_search()
            .build();

        assert_eq!(
            request.aggregation("size").and_then(AggregationRequest::filter),
            Some(&Filter::and([Filter::term("color", ["red"])]))
        );
        assert_eq!(
            request.aggregation("color").and_then(AggregationRequest::filter),
            Some(&Filter::and([Filter::term("size", ["M"])]))
        );
    }

    #[test]
    fn from_config_applies_settings() {
        let config = CompilerConfig::from_toml_str(
            r#"
            [search]
            default_take = 7
            content_field = "__text"
            default_sort_field = "priority"
            "#,
        )
        .expect("config parses");

        let request = RequestCompiler::from_config(&config)
            .expect("compiler builds")
            .with_culture("de-DE")
            .build();
        assert_eq!(request.take, 7);
        assert_eq!(request.search_fields, vec!["__text", "__text_de-de"]);
        assert_eq!(request.sorting, vec![SortField::new("priority", true)]);
    }

    #[test]
    fn include_fields_and_fuzzy_settings_are_carried() {
        let request = RequestCompiler::new()
            .with_fuzzy(true, Some(2))
            .with_include_fields(["name", "code"])
            .build();
        assert!(request.is_fuzzy);
        assert_eq!(request.fuzziness, Some(2));
        assert_eq!(request.include_fields, vec!["name", "code"]);
    }
}
