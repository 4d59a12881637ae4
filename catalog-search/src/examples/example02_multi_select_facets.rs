use std::sync::Arc;

use anyhow::{Context, Result, ensure};
use serde_json::json;

use crate::catalog::{CatalogSearch, ProductQuery};
use crate::config::CompilerConfig;
use crate::examples::support::{RecordingProvider, ScriptedParser};
use crate::facets::Facet;
use crate::filters::{Filter, RangeFilterValue};
use crate::provider::{AggregationResponse, AggregationResponseValue, SearchResponse};

fn counts(id: &str, values: &[(&str, u64)]) -> AggregationResponse {
    AggregationResponse {
        id: id.to_string(),
        values: values
            .iter()
            .map(|(value, count)| AggregationResponseValue {
                id: value.to_string(),
                count: *count,
            })
            .collect(),
    }
}

/// Example 02 – multi-select facets: each facet ignores its own selection.
pub async fn run() -> Result<()> {
    let parser = ScriptedParser::new()
        .script(
            "color:red size:M price:[0 TO 100)",
            "",
            vec![
                Filter::term("color", ["red"]),
                Filter::term("size", ["M"]),
                Filter::range("price", [RangeFilterValue::between("0", "100")]),
            ],
        )
        .script(
            "color size price:[0 TO 100),[100 TO )",
            "color size",
            vec![Filter::range(
                "price",
                [RangeFilterValue::between("0", "100"), RangeFilterValue::at_least("100")],
            )],
        );

    let provider = RecordingProvider::new(SearchResponse {
        documents: vec![json!({ "id": "p1", "name": "Red tee" })],
        total_count: 1,
        aggregations: vec![
            counts("color", &[("red", 1), ("blue", 3)]),
            counts("size", &[("M", 1), ("L", 2)]),
            counts("price_eur", &[("[0 TO 100)", 1), ("[100 TO )", 4)]),
        ],
    });

    let search = CatalogSearch::new(CompilerConfig::default(), Arc::new(parser), &provider)?;
    let query = ProductQuery {
        currency: Some("EUR".to_string()),
        filter: Some("color:red size:M price:[0 TO 100)".to_string()),
        facet: Some("color size price:[0 TO 100),[100 TO )".to_string()),
        ..ProductQuery::default()
    };

    let result = search.search(&query).await?;
    ensure!(result.total_count == 1);
    ensure!(result.facets.len() == 3);

    let requests = provider.requests();
    let request = requests.first().context("provider should receive a request")?;
    let size_filter = request
        .aggregation("size")
        .and_then(|aggregation| aggregation.filter())
        .context("size facet filter")?;
    ensure!(
        *size_filter
            == Filter::and([
                Filter::term("color", ["red"]),
                Filter::range("price_eur", [RangeFilterValue::between("0", "100")]),
            ]),
        "size counts ignore the size selection but keep the others"
    );

    let price_filter = request
        .aggregation("price_eur")
        .and_then(|aggregation| aggregation.filter())
        .context("price facet filter")?;
    ensure!(*price_filter == Filter::and([Filter::term("color", ["red"]), Filter::term("size", ["M"])]));

    let Some(Facet::Term(color)) = result.facets.iter().find(|facet| facet.id() == "color") else {
        anyhow::bail!("color facet missing");
    };
    ensure!(color.items.iter().any(|item| item.term == "red" && item.is_applied));
    ensure!(color.items.iter().any(|item| item.term == "blue" && !item.is_applied));

    let Some(Facet::Range(price)) = result.facets.iter().find(|facet| facet.id() == "price_eur") else {
        anyhow::bail!("price facet missing");
    };
    ensure!(price.items[0].is_applied && price.items[0].count == 1);
    ensure!(!price.items[1].is_applied && price.items[1].count == 4);

    Ok(())
}
