//! Response adapter: turns the server's property-keyed JSON into
//! molecule-keyed results.
//!
//! The server answers with one key per property display name:
//!
//! ```text
//! { "Water solubility": [ {"ID": "ID_1", "SMILES": ..., "Predicted value": ...}, ... ],
//!   "Melting point":    [ ... ] }
//! ```
//!
//! [`adapt`] regroups the rows by `ID` in a single pass. Molecules appear in
//! first-seen order (properties in received order, then rows in list order).
//! A property whose value is a single object rather than a list is one row;
//! without an `ID` it is assigned [`SINGLE_MOLECULE_ID`].

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::constants::{SINGLE_MOLECULE_ID, row};
use crate::error::ProtoPredError;
use crate::models::{ModelResult, MoleculeResult, OutputFormat, PredictionOutput, PredictionResponse};
use crate::transport::RawResponse;

/// Interprets a successful response for the requested output format.
///
/// Spreadsheet output is returned byte-for-byte unless the server sent a
/// JSON `error` object instead.
///
/// # Errors
///
/// Returns [`ProtoPredError::Api`] when the body is not valid JSON, is not
/// a JSON object, carries a top-level `error`, or is an empty spreadsheet.
#[instrument(skip(raw), fields(status = raw.status, bytes = raw.body.len()))]
pub fn adapt_response(raw: RawResponse, output: OutputFormat) -> Result<PredictionOutput, ProtoPredError> {
    if output == OutputFormat::Xlsx {
        if let Ok(Value::Object(object)) = serde_json::from_slice::<Value>(&raw.body) {
            check_error_payload(&object, raw.status)?;
        }
        if raw.body.is_empty() {
            return Err(ProtoPredError::api(Some(raw.status), "empty spreadsheet response"));
        }
        debug!(bytes = raw.body.len(), "spreadsheet response passed through");
        return Ok(PredictionOutput::Spreadsheet(raw.body));
    }

    let body: Value = serde_json::from_slice(&raw.body).map_err(|e| {
        ProtoPredError::api(Some(raw.status), format!("invalid JSON in response: {e}"))
    })?;
    let Value::Object(object) = &body else {
        return Err(ProtoPredError::api(
            Some(raw.status),
            format!("expected a JSON object keyed by property, got {}", kind(&body)),
        ));
    };
    check_error_payload(object, raw.status)?;

    let metadata = raw.extra_json.as_deref().and_then(parse_extra_json);
    Ok(PredictionOutput::Json(adapt(body, metadata)))
}

fn check_error_payload(object: &Map<String, Value>, status: u16) -> Result<(), ProtoPredError> {
    match object.get("error") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(message)) => Err(ProtoPredError::api(Some(status), message.clone())),
        Some(other) => Err(ProtoPredError::api(Some(status), other.to_string())),
    }
}

fn parse_extra_json(header: &str) -> Option<Value> {
    match serde_json::from_str(header) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "ignoring unparseable X-Extra-JSON header");
            None
        }
    }
}

/// Pivots a property-keyed body into a [`PredictionResponse`].
///
/// Non-object bodies yield an empty response; malformed rows are skipped
/// with a warning.
#[must_use]
pub fn adapt(raw: Value, metadata: Option<Value>) -> PredictionResponse {
    let molecules = {
        let mut pivot = Pivot::default();
        if let Value::Object(properties) = &raw {
            for (property, rows) in properties {
                match rows {
                    Value::Array(rows) => {
                        for (position, entry) in rows.iter().enumerate() {
                            let fallback_id = format!("molecule_{}", position + 1);
                            pivot.add_row(property, entry, &fallback_id);
                        }
                    }
                    Value::Object(_) => pivot.add_row(property, rows, SINGLE_MOLECULE_ID),
                    other => warn!(property = %property, kind = kind(other), "skipping non-row property value"),
                }
            }
        }
        pivot.molecules
    };

    debug!(molecules = molecules.len(), "response pivoted");
    PredictionResponse {
        success: true,
        message: None,
        molecules,
        metadata,
        raw,
    }
}

/// Accumulates molecules in first-seen order with an id index beside them.
#[derive(Default)]
struct Pivot<'a> {
    molecules: Vec<MoleculeResult>,
    by_id: HashMap<String, usize>,
    filled: HashSet<(usize, &'a str)>,
}

impl<'a> Pivot<'a> {
    fn add_row(&mut self, property: &'a str, entry: &Value, fallback_id: &str) {
        let Value::Object(fields) = entry else {
            warn!(property = %property, kind = kind(entry), "skipping non-object row");
            return;
        };

        let id = text(fields.get(row::ID));
        let smiles = text(fields.get(row::SMILES));
        if id.is_none() && smiles.is_none() {
            warn!(property = %property, "skipping row without ID or SMILES");
            return;
        }
        let id = id.unwrap_or_else(|| fallback_id.to_string());

        let index = if let Some(&index) = self.by_id.get(&id) {
            merge_metadata(&mut self.molecules[index], fields);
            index
        } else {
            let index = self.molecules.len();
            self.by_id.insert(id.clone(), index);
            self.molecules.push(new_molecule(id, smiles, fields));
            index
        };

        if !self.filled.insert((index, property)) {
            warn!(id = %self.molecules[index].id, property = %property, "ignoring duplicate row for property");
            return;
        }
        self.molecules[index].predictions.push(model_result(property, fields));
    }
}

fn new_molecule(id: String, smiles: Option<String>, fields: &Map<String, Value>) -> MoleculeResult {
    MoleculeResult {
        id,
        smiles: smiles.unwrap_or_default(),
        cas: text(fields.get(row::CAS)),
        chemical_name: text(fields.get(row::CHEMICAL_NAME)),
        ec_number: text(fields.get(row::EC_NUMBER)),
        structural_formula: text(fields.get(row::STRUCTURAL_FORMULA)),
        other_regulatory_id: text(fields.get(row::OTHER_REGULATORY_ID)),
        predictions: Vec::new(),
    }
}

/// Fills metadata the first row lacked. Values already set are kept even
/// when a later row disagrees.
fn merge_metadata(molecule: &mut MoleculeResult, fields: &Map<String, Value>) {
    if molecule.smiles.is_empty()
        && let Some(smiles) = text(fields.get(row::SMILES))
    {
        molecule.smiles = smiles;
    } else if let Some(smiles) = text(fields.get(row::SMILES))
        && smiles != molecule.smiles
    {
        debug!(id = %molecule.id, kept = %molecule.smiles, ignored = %smiles, "conflicting SMILES for id");
    }

    let slots = [
        (&mut molecule.cas, row::CAS),
        (&mut molecule.chemical_name, row::CHEMICAL_NAME),
        (&mut molecule.ec_number, row::EC_NUMBER),
        (&mut molecule.structural_formula, row::STRUCTURAL_FORMULA),
        (&mut molecule.other_regulatory_id, row::OTHER_REGULATORY_ID),
    ];
    for (slot, key) in slots {
        if slot.is_none() {
            *slot = text(fields.get(key));
        }
    }
}

fn model_result(property: &str, fields: &Map<String, Value>) -> ModelResult {
    let predicted_value = text(fields.get(row::PREDICTED_VALUE));
    let predicted_value_model_units = text(fields.get(row::PREDICTED_VALUE_MODEL_UNITS));
    let experimental_value = text(fields.get(row::EXPERIMENTAL_VALUE));
    let experimental_value_model_units = text(fields.get(row::EXPERIMENTAL_VALUE_MODEL_UNITS));

    let unit = predicted_value
        .as_deref()
        .and_then(unit_of)
        .or_else(|| experimental_value.as_deref().and_then(unit_of));
    let model_unit = predicted_value_model_units
        .as_deref()
        .and_then(unit_of)
        .or_else(|| experimental_value_model_units.as_deref().and_then(unit_of));

    ModelResult {
        property: property.to_string(),
        predicted_numerical: number(fields.get(row::PREDICTED_NUMERICAL)),
        predicted_numerical_model_units: number(fields.get(row::PREDICTED_NUMERICAL_MODEL_UNITS)),
        experimental_numerical: number(fields.get(row::EXPERIMENTAL_NUMERICAL)),
        experimental_numerical_model_units: number(
            fields.get(row::EXPERIMENTAL_NUMERICAL_MODEL_UNITS),
        ),
        applicability_domain: text(fields.get(row::APPLICABILITY_DOMAIN)),
        probability: text(fields.get(row::PROBABILITY)),
        predicted_value,
        predicted_value_model_units,
        experimental_value,
        experimental_value_model_units,
        unit,
        model_unit,
    }
}

fn is_missing(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || text == "-" || text.eq_ignore_ascii_case("nan")
}

/// String-ish field: strings and numbers, with missing markers as `None`.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !is_missing(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric field: JSON numbers or numeric strings; NaN and missing markers are `None`.
fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !is_missing(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Unit suffix of a display value: `g/L` in `0.066 g/L`.
fn unit_of(display: &str) -> Option<String> {
    let (value, unit) = display.trim().split_once(char::is_whitespace)?;
    value.parse::<f64>().ok()?;
    let unit = unit.trim();
    (!unit.is_empty()).then(|| unit.to_string())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn water_solubility_row(id: &str, smiles: &str, predicted: f64) -> Value {
        json!({
            "ID": id,
            "SMILES": smiles,
            "CAS": "-",
            "Chemical name": "-",
            "Predicted value": format!("{predicted} g/L"),
            "Predicted numerical": predicted,
            "Predicted value (model units)": "-3.04 log mol/L",
            "Predicted numerical (model units)": -3.0369,
            "Experimental value*": "0.038 g/L",
            "Experimental numerical": 0.038,
            "Applicability domain**": "Inside (T/L/E/R)"
        })
    }

    fn raw(body: &str, extra_json: Option<&str>) -> RawResponse {
        RawResponse {
            status: 200,
            content_type: Some("application/json".to_string()),
            extra_json: extra_json.map(str::to_string),
            body: body.as_bytes().to_vec(),
        }
    }

    // ==================== Pivot Tests ====================

    #[test]
    fn test_pivot_groups_rows_by_id() {
        let body = json!({
            "Water solubility": [
                water_solubility_row("ID_1", "C1=CC(=O)C=CC1=O", 12.5),
                water_solubility_row("ID_2", "CCCCC", 0.066)
            ],
            "Melting point": [
                {"ID": "ID_2", "SMILES": "CCCCC", "Predicted value": "-129.7 °C", "Predicted numerical": -129.7},
                {"ID": "ID_3", "SMILES": "CCO", "Predicted value": "-114.1 °C", "Predicted numerical": "-114.1"}
            ]
        });
        let response = adapt(body, None);

        let ids: Vec<&str> = response.molecules().iter().map(MoleculeResult::id).collect();
        assert_eq!(ids, ["ID_1", "ID_2", "ID_3"]);

        let pentane = response.molecule("ID_2").unwrap();
        let properties: Vec<&str> = pentane.property_names().collect();
        assert_eq!(properties, ["Water solubility", "Melting point"]);
        assert_eq!(pentane.predicted_value("Water solubility"), Some(0.066));
        assert_eq!(pentane.experimental_value("Water solubility"), Some(0.038));
        assert_eq!(
            pentane.applicability_domain("Water solubility"),
            Some("Inside (T/L/E/R)")
        );
        assert_eq!(
            response.molecule("ID_3").unwrap().predicted_value("Melting point"),
            Some(-114.1)
        );
        assert_eq!(response.property_names(), ["Water solubility", "Melting point"]);
    }

    #[test]
    fn test_single_object_shape_gets_synthetic_id() {
        let body = json!({
            "Water solubility": {
                "SMILES": "CCCCC",
                "CAS": "-",
                "Predicted value": "0.066 g/L",
                "Predicted numerical": 0.066,
                "Applicability domain**": "Inside (T/L/E/R)"
            }
        });
        let response = adapt(body, None);
        assert_eq!(response.len(), 1);
        let molecule = response.molecule("molecule_1").unwrap();
        assert_eq!(molecule.smiles(), "CCCCC");
        assert_eq!(molecule.cas(), None);
        assert_eq!(molecule.is_inside_domain("Water solubility"), Some(true));
    }

    #[test]
    fn test_missing_markers_become_none() {
        let body = json!({
            "Boiling point": [{
                "ID": "a",
                "SMILES": "C",
                "Predicted value": "NaN",
                "Predicted numerical": "NaN",
                "Experimental value*": "-",
                "Experimental numerical": null,
                "Applicability domain**": ""
            }]
        });
        let response = adapt(body, None);
        let result = response.molecule("a").unwrap().prediction("Boiling point").unwrap();
        assert_eq!(result.predicted_value(), None);
        assert_eq!(result.predicted_numerical(), None);
        assert_eq!(result.experimental_value(), None);
        assert_eq!(result.experimental_numerical(), None);
        assert_eq!(result.applicability_domain(), None);
        assert_eq!(result.is_inside_domain(), None);
    }

    #[test]
    fn test_units_extracted_from_display_values() {
        let body = json!({"Water solubility": [water_solubility_row("x", "O", 0.066)]});
        let response = adapt(body, None);
        let result = response.molecule("x").unwrap().prediction("Water solubility").unwrap();
        assert_eq!(result.unit(), Some("g/L"));
        assert_eq!(result.model_unit(), Some("log mol/L"));
        assert_eq!(unit_of("Inside"), None);
        assert_eq!(unit_of("12"), None);
    }

    #[test]
    fn test_first_seen_metadata_wins() {
        let body = json!({
            "Water solubility": [{"ID": "m", "SMILES": "CCCCC", "CAS": "109-66-0"}],
            "Melting point": [{"ID": "m", "SMILES": "CCCCCC", "CAS": "110-54-3", "Chemical name": "Pentane"}]
        });
        let response = adapt(body, None);
        let molecule = response.molecule("m").unwrap();
        assert_eq!(molecule.smiles(), "CCCCC");
        assert_eq!(molecule.cas(), Some("109-66-0"));
        assert_eq!(molecule.chemical_name(), Some("Pentane"));
        assert_eq!(molecule.predictions().len(), 2);
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let body = json!({
            "Water solubility": [
                "not a row",
                {"Predicted numerical": 1.0},
                {"SMILES": "CCO", "Predicted numerical": 2.0}
            ],
            "Version": "2.1"
        });
        let response = adapt(body, None);
        assert_eq!(response.len(), 1);
        assert_eq!(response.molecules()[0].id(), "molecule_3");
    }

    #[test]
    fn test_duplicate_row_for_same_property_keeps_first() {
        let body = json!({
            "Log Kow": [
                {"ID": "a", "SMILES": "C", "Predicted numerical": 1.0},
                {"ID": "a", "SMILES": "C", "Predicted numerical": 9.0}
            ]
        });
        let response = adapt(body, None);
        let molecule = response.molecule("a").unwrap();
        assert_eq!(molecule.predictions().len(), 1);
        assert_eq!(molecule.predicted_value("Log Kow"), Some(1.0));
    }

    #[test]
    fn test_empty_body_yields_empty_response() {
        let response = adapt(json!({}), None);
        assert!(response.is_empty());
        assert!(response.success());
    }

    #[test]
    fn test_pivot_large_response_keeps_order_and_properties() {
        let ids = 5000;
        let rows = |scale: f64| {
            (0..ids)
                .map(|i| {
                    json!({
                        "ID": format!("ID_{i}"),
                        "SMILES": "C".repeat(i % 7 + 1),
                        "Predicted numerical": (i as f64) * scale
                    })
                })
                .collect::<Vec<_>>()
        };
        let raw = json!({
            "Water solubility": rows(1.0),
            "Melting point": rows(2.0),
            "Boiling point": rows(3.0),
            "Vapour pressure": rows(4.0)
        });

        let response = adapt(raw, None);

        assert_eq!(response.len(), 5000);
        assert_eq!(response.molecules()[0].id(), "ID_0");
        assert_eq!(response.molecules()[4999].id(), "ID_4999");
        let last = response.molecule("ID_4999").unwrap();
        assert_eq!(last.predictions().len(), 4);
        assert_eq!(last.predicted_value("Vapour pressure"), Some(4999.0 * 4.0));
    }

    // ==================== adapt_response Tests ====================

    #[test]
    fn test_adapt_response_parses_metadata_header() {
        let output = adapt_response(
            raw(r#"{"Log D": []}"#, Some(r#"{"version": "2.0"}"#)),
            OutputFormat::Json,
        )
        .unwrap();
        let response = output.into_json().unwrap();
        assert_eq!(response.metadata().unwrap()["version"], "2.0");
    }

    #[test]
    fn test_adapt_response_ignores_bad_metadata_header() {
        let output = adapt_response(raw("{}", Some("{not json")), OutputFormat::Json).unwrap();
        assert!(output.into_json().unwrap().metadata().is_none());
    }

    #[test]
    fn test_adapt_response_rejects_invalid_json() {
        let err = adapt_response(raw("<html>oops</html>", None), OutputFormat::Json).unwrap_err();
        assert!(matches!(err, ProtoPredError::Api { status: Some(200), .. }));
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn test_adapt_response_rejects_non_object() {
        let err = adapt_response(raw("[1, 2]", None), OutputFormat::Json).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_adapt_response_error_payload() {
        let err = adapt_response(raw(r#"{"error": "Invalid model"}"#, None), OutputFormat::Json)
            .unwrap_err();
        assert!(matches!(err, ProtoPredError::Api { .. }));
        assert!(err.to_string().contains("Invalid model"));
    }

    #[test]
    fn test_spreadsheet_passes_through() {
        let bytes = b"PK\x03\x04workbook".to_vec();
        let response = RawResponse {
            status: 200,
            content_type: Some(crate::constants::XLSX_MIME.to_string()),
            extra_json: None,
            body: bytes.clone(),
        };
        let output = adapt_response(response, OutputFormat::Xlsx).unwrap();
        assert_eq!(output.into_spreadsheet(), Some(bytes));
    }

    #[test]
    fn test_spreadsheet_error_payload_is_api_error() {
        let err = adapt_response(raw(r#"{"error": "quota exceeded"}"#, None), OutputFormat::Xlsx)
            .unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert!(adapt_response(raw("", None), OutputFormat::Xlsx).is_err());
    }
}
