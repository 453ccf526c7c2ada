use crate::data::Feature;
use crate::types::AddressRow;
use serde_json::{Map, Value};

pub fn create_table(features: &[Feature]) -> Vec<AddressRow> {
    println!("Flattening {} features...", features.len());
    features.iter().map(flatten_feature).collect()
}

pub fn flatten_feature(feature: &Feature) -> AddressRow {
    let empty = Map::new();
    let properties = object_or_empty(feature.get("properties"), &empty);
    let geometry = object_or_empty(feature.get("geometry"), &empty);

    let field = |key: &str| properties.get(key).map(cell_text).unwrap_or_default();

    // Both coordinates or neither.
    let (x, y) = match geometry.get("coordinates").and_then(Value::as_array) {
        Some(coords) if coords.len() >= 2 => (cell_text(&coords[0]), cell_text(&coords[1])),
        _ => (String::new(), String::new()),
    };

    AddressRow {
        identifier: field("identifier"),
        region_name: field("nuts3_name"),
        region_id: field("nuts3_id"),
        county_name: field("lau1_name"),
        county_id: field("lau1_id"),
        municipality_name: field("lau2_name"),
        municipality_id: field("lau2_id"),
        district_name: field("district_name"),
        street: field("streetname"),
        registration_number: field("propertyregistrationnumber"),
        orientation_number: field("orientationnumber"),
        postal_code: field("postalcode"),
        x,
        y,
    }
}

fn object_or_empty<'a>(
    value: Option<&'a Value>,
    empty: &'a Map<String, Value>,
) -> &'a Map<String, Value> {
    value.and_then(Value::as_object).unwrap_or(empty)
}

/// Text written to a CSV cell for a JSON value.
///
/// Strings are written as-is and numbers keep their JSON spelling, so
/// `17.1` stays `17.1`. `null` becomes an empty cell.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}
