use std::sync::Arc;

use anyhow::{Result, ensure};

use crate::catalog::{CatalogSearch, ProductQuery};
use crate::config::CompilerConfig;
use crate::examples::support::{RecordingProvider, ScriptedParser};
use crate::filters::Filter;
use crate::provider::SearchResponse;
use crate::search::{AggregationRequest, SortField};

const CONFIG: &str = r#"
[search]
default_take = 12
default_terms = ["status:visible", "catalog:main"]
localized_facet_fields = ["material"]

[[facets]]
field = "brand"
size = 25
"#;

/// Example 03 – configuration-driven defaults and explicit id lookups.
pub async fn run() -> Result<()> {
    let config = CompilerConfig::from_toml_str(CONFIG)?;
    let parser = ScriptedParser::new()
        .script("catalog.id:outlet", "", vec![Filter::term("catalog.id", ["outlet"])])
        .script("material", "material", Vec::new());
    let provider = RecordingProvider::new(SearchResponse::default());
    let search = CatalogSearch::new(config, Arc::new(parser), &provider)?;

    let request = search.compile(&ProductQuery {
        filter: Some("catalog.id:outlet".to_string()),
        facet: Some("material".to_string()),
        culture: Some("fr-FR".to_string()),
        ..ProductQuery::default()
    })?;

    ensure!(request.take == 12);
    ensure!(request.sorting == [SortField::relevance()]);
    // The user's catalog selection wins over the configured default.
    ensure!(
        request.filter.children
            == [Filter::term("catalog", ["outlet"]), Filter::term("status", ["visible"])]
    );
    let ids: Vec<&str> = request.aggregations.iter().map(AggregationRequest::id).collect();
    ensure!(ids == ["brand", "material_fr-fr"]);

    let lookup = search
        .search(&ProductQuery {
            take: Some(50),
            object_ids: vec!["p1".to_string(), "p2".to_string()],
            ..ProductQuery::default()
        })
        .await?;
    ensure!(lookup.total_count == 0);

    let requests = provider.requests();
    let executed = requests.last().ok_or_else(|| anyhow::anyhow!("no request recorded"))?;
    ensure!(executed.take == 2, "id lookups are never paginated");
    ensure!(executed.filter.children[0] == Filter::ids(["p1", "p2"]));
    Ok(())
}
