//! Sort expression compilation.
//!
//! ```text
//! "price desc"                        -> [price_<currency> desc]
//! "name;createddate:desc"             -> [name asc, createddate desc]
//! "location(52.37,4.89) asc"          -> [location asc, geo 52.37/4.89]
//! ```

use super::{GeoPoint, SortField};

const ITEM_SEPARATOR: char = ';';

/// Compiles sort expressions into ordered [`SortField`]s.
#[derive(Debug, Clone, Default)]
pub struct SortCompiler {
    currency: Option<String>,
}

impl SortCompiler {
    pub fn new(currency: Option<&str>) -> Self {
        Self {
            currency: currency.map(str::to_string),
        }
    }

    /// Parse `expression`; blank input yields an empty list.
    pub fn compile(&self, expression: &str) -> Vec<SortField> {
        expression
            .split(ITEM_SEPARATOR)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(parse_item)
            .map(|field| self.alias(field))
            .collect()
    }

    fn alias(&self, mut field: SortField) -> SortField {
        if field.field_name.eq_ignore_ascii_case("name") || field.field_name.eq_ignore_ascii_case("title") {
            field.field_name = "name".to_string();
        } else if field.field_name.eq_ignore_ascii_case("price")
            && let Some(currency) = &self.currency
        {
            field.field_name = format!("price_{}", currency.to_lowercase());
        }
        field
    }
}

fn parse_item(item: &str) -> SortField {
    if let Some(field) = parse_geo_item(item) {
        return field;
    }

    match item.split_once(|c: char| c == ':' || c.is_whitespace()) {
        Some((column, direction)) => SortField::new(column.trim(), is_descending(direction)),
        None => SortField::new(item, false),
    }
}

/// `column(lat,lon)[ direction]`. Unparseable coordinates fall back to a plain column sort.
fn parse_geo_item(item: &str) -> Option<SortField> {
    let open = item.find('(')?;
    let close = item[open..].find(')')? + open;
    let column = item[..open].trim();
    let direction = item[close + 1..].trim_start_matches([':', ' ', '\t']);
    let descending = is_descending(direction);

    let point = item[open + 1..close].split_once(',').and_then(|(lat, lon)| {
        Some(GeoPoint {
            latitude: lat.trim().parse().ok()?,
            longitude: lon.trim().parse().ok()?,
        })
    });

    Some(match point {
        Some(point) => SortField::geo_distance(column, point, descending),
        None => {
            log::debug!("ignoring malformed geo point in sort item {item:?}");
            SortField::new(column, descending)
        }
    })
}

fn is_descending(direction: &str) -> bool {
    let direction = direction.trim();
    direction.eq_ignore_ascii_case("desc") || direction.eq_ignore_ascii_case("descending")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_uses_configured_currency() {
        let fields = SortCompiler::new(Some("EUR")).compile("price desc");
        assert_eq!(fields, vec![SortField::new("price_eur", true)]);
    }

    #[test]
    fn price_without_currency_passes_through() {
        let fields = SortCompiler::new(None).compile("price desc");
        assert_eq!(fields, vec![SortField::new("price", true)]);
    }

    #[test]
    fn name_and_title_normalize_to_name() {
        let fields = SortCompiler::default().compile("Title;NAME:desc");
        assert_eq!(fields, vec![SortField::new("name", false), SortField::new("name", true)]);
    }

    #[test]
    fn other_columns_keep_case_and_order() {
        let fields = SortCompiler::default().compile("CreatedDate:desc; priority ascending ;code");
        assert_eq!(
            fields,
            vec![
                SortField::new("CreatedDate", true),
                SortField::new("priority", false),
                SortField::new("code", false),
            ]
        );
    }

    #[test]
    fn blank_expression_yields_nothing() {
        assert!(SortCompiler::default().compile("").is_empty());
        assert!(SortCompiler::default().compile("   ;  ").is_empty());
    }

    #[test]
    fn unknown_direction_is_ascending() {
        let fields = SortCompiler::default().compile("code:sideways");
        assert_eq!(fields, vec![SortField::new("code", false)]);
    }

    #[test]
    fn geo_distance_sort_carries_point() {
        let fields = SortCompiler::default().compile("location(52.37,4.89) desc");
        assert_eq!(
            fields,
            vec![SortField::geo_distance(
                "location",
                GeoPoint {
                    latitude: 52.37,
                    longitude: 4.89,
                },
                true,
            )]
        );
    }

    #[test]
    fn geo_sort_with_colon_direction() {
        let fields = SortCompiler::default().compile("location(1.5, -2):asc");
        assert_eq!(fields.len(), 1);
        assert!(!fields[0].descending);
        assert_eq!(
            fields[0].geo_point,
            Some(GeoPoint {
                latitude: 1.5,
                longitude: -2.0,
            })
        );
    }

    #[test]
    fn malformed_geo_point_degrades_to_column() {
        let fields = SortCompiler::default().compile("location(north,east) desc");
        assert_eq!(fields, vec![SortField::new("location", true)]);
    }
}
