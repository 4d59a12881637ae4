use anyhow::{Result, ensure};

use crate::examples::support::ScriptedParser;
use crate::filters::{Filter, RangeFilterValue};
use crate::search::{RequestCompiler, SortField};

/// Example 01 – compiling paging, filters, terms and sorting into one request.
pub fn run() -> Result<()> {
    let parser = ScriptedParser::new().script(
        "sku:ABC* price:[10 TO 50) properties.color:red",
        "",
        vec![
            Filter::term("sku", ["ABC*", "XYZ1"]),
            Filter::range("price", [RangeFilterValue::between("10", "50")]),
            Filter::term("properties.color", ["red"]),
        ],
    );

    let request = RequestCompiler::new()
        .with_phrase_parser(parser)
        .with_currency("USD")
        .with_culture("en-US")
        .with_paging(0, 20)
        .with_search_phrase("running shoes")
        .parse_filters("sku:ABC* price:[10 TO 50) properties.color:red")?
        .add_terms(["status:visible", "color:blue"], true)
        .add_sorting("price desc;title")
        .build();

    ensure!(request.search_keywords.as_deref() == Some("running shoes"));
    ensure!(request.search_fields == ["__content", "__content_en-us"]);

    // `sku` maps to `code` and its wildcard value is split out into an OR.
    ensure!(
        request.filter.children[0]
            == Filter::or([Filter::wildcard("code", "ABC*"), Filter::term("code", ["XYZ1"])])
    );
    // A bare `price` range picks up the request currency.
    ensure!(request.filter.children[1].field_name() == Some("price_usd"));
    // `properties.color` maps to `color`, so the default `color:blue` term is skipped.
    ensure!(request.filter.children[2] == Filter::term("color", ["red"]));
    ensure!(request.filter.children[3] == Filter::term("status", ["visible"]));
    ensure!(request.filter.children.len() == 4, "default color term must not be added");

    ensure!(request.sorting == [SortField::new("price_usd", true), SortField::new("name", false)]);
    Ok(())
}
