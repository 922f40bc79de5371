//! Typed, read-only results: one [`MoleculeResult`] per molecule, each
//! holding a [`ModelResult`] per predicted property.

use serde::Serialize;
use serde_json::Value;

/// Prefix the server uses for in-domain applicability results.
const INSIDE_DOMAIN_PREFIX: &str = "inside";

/// One property's prediction for one molecule.
///
/// Values the server reports as missing (`"NaN"`, `"-"`, empty, null) are
/// `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelResult {
    pub(crate) property: String,
    pub(crate) predicted_value: Option<String>,
    pub(crate) predicted_numerical: Option<f64>,
    pub(crate) predicted_value_model_units: Option<String>,
    pub(crate) predicted_numerical_model_units: Option<f64>,
    pub(crate) experimental_value: Option<String>,
    pub(crate) experimental_numerical: Option<f64>,
    pub(crate) experimental_value_model_units: Option<String>,
    pub(crate) experimental_numerical_model_units: Option<f64>,
    pub(crate) unit: Option<String>,
    pub(crate) model_unit: Option<String>,
    pub(crate) applicability_domain: Option<String>,
    pub(crate) probability: Option<String>,
}

impl ModelResult {
    /// Property display name as sent by the server, e.g. `Water solubility`.
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Predicted value as displayed, e.g. `0.066 g/L`.
    #[must_use]
    pub fn predicted_value(&self) -> Option<&str> {
        self.predicted_value.as_deref()
    }

    /// Predicted value as a number, in display units.
    #[must_use]
    pub fn predicted_numerical(&self) -> Option<f64> {
        self.predicted_numerical
    }

    #[must_use]
    pub fn predicted_value_model_units(&self) -> Option<&str> {
        self.predicted_value_model_units.as_deref()
    }

    #[must_use]
    pub fn predicted_numerical_model_units(&self) -> Option<f64> {
        self.predicted_numerical_model_units
    }

    /// Experimental value as displayed, when the server has one.
    #[must_use]
    pub fn experimental_value(&self) -> Option<&str> {
        self.experimental_value.as_deref()
    }

    /// Experimental value as a number, in display units.
    #[must_use]
    pub fn experimental_numerical(&self) -> Option<f64> {
        self.experimental_numerical
    }

    #[must_use]
    pub fn experimental_value_model_units(&self) -> Option<&str> {
        self.experimental_value_model_units.as_deref()
    }

    #[must_use]
    pub fn experimental_numerical_model_units(&self) -> Option<f64> {
        self.experimental_numerical_model_units
    }

    /// Display unit, taken from the predicted value text (`g/L` in `0.066 g/L`).
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Model unit, taken from the model-units value text.
    #[must_use]
    pub fn model_unit(&self) -> Option<&str> {
        self.model_unit.as_deref()
    }

    /// Applicability-domain text, e.g. `Inside (T/L/E/R)`.
    #[must_use]
    pub fn applicability_domain(&self) -> Option<&str> {
        self.applicability_domain.as_deref()
    }

    /// Whether the molecule lies inside the model's applicability domain.
    ///
    /// `None` when the server did not report a domain.
    #[must_use]
    pub fn is_inside_domain(&self) -> Option<bool> {
        self.applicability_domain
            .as_deref()
            .map(|domain| domain.trim().to_lowercase().starts_with(INSIDE_DOMAIN_PREFIX))
    }

    /// Class probability for classification models.
    #[must_use]
    pub fn probability(&self) -> Option<&str> {
        self.probability.as_deref()
    }
}

/// All predictions for one molecule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoleculeResult {
    pub(crate) id: String,
    pub(crate) smiles: String,
    pub(crate) cas: Option<String>,
    pub(crate) chemical_name: Option<String>,
    pub(crate) ec_number: Option<String>,
    pub(crate) structural_formula: Option<String>,
    pub(crate) other_regulatory_id: Option<String>,
    pub(crate) predictions: Vec<ModelResult>,
}

impl MoleculeResult {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn smiles(&self) -> &str {
        &self.smiles
    }

    #[must_use]
    pub fn cas(&self) -> Option<&str> {
        self.cas.as_deref()
    }

    #[must_use]
    pub fn chemical_name(&self) -> Option<&str> {
        self.chemical_name.as_deref()
    }

    #[must_use]
    pub fn ec_number(&self) -> Option<&str> {
        self.ec_number.as_deref()
    }

    #[must_use]
    pub fn structural_formula(&self) -> Option<&str> {
        self.structural_formula.as_deref()
    }

    #[must_use]
    pub fn other_regulatory_id(&self) -> Option<&str> {
        self.other_regulatory_id.as_deref()
    }

    /// Predictions in the order the properties first appeared.
    #[must_use]
    pub fn predictions(&self) -> &[ModelResult] {
        &self.predictions
    }

    /// The prediction for a property display name.
    #[must_use]
    pub fn prediction(&self, property: &str) -> Option<&ModelResult> {
        self.predictions
            .iter()
            .find(|result| result.property == property)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.predictions.iter().map(|result| result.property.as_str())
    }

    #[must_use]
    pub fn predicted_value(&self, property: &str) -> Option<f64> {
        self.prediction(property)
            .and_then(ModelResult::predicted_numerical)
    }

    #[must_use]
    pub fn experimental_value(&self, property: &str) -> Option<f64> {
        self.prediction(property)
            .and_then(ModelResult::experimental_numerical)
    }

    #[must_use]
    pub fn applicability_domain(&self, property: &str) -> Option<&str> {
        self.prediction(property)
            .and_then(ModelResult::applicability_domain)
    }

    #[must_use]
    pub fn is_inside_domain(&self, property: &str) -> Option<bool> {
        self.prediction(property)
            .and_then(ModelResult::is_inside_domain)
    }
}

/// A parsed JSON prediction response, pivoted to be keyed by molecule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    pub(crate) success: bool,
    pub(crate) message: Option<String>,
    pub(crate) molecules: Vec<MoleculeResult>,
    pub(crate) metadata: Option<Value>,
    #[serde(skip)]
    pub(crate) raw: Value,
}

impl PredictionResponse {
    #[must_use]
    pub fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Molecules in first-seen order.
    #[must_use]
    pub fn molecules(&self) -> &[MoleculeResult] {
        &self.molecules
    }

    #[must_use]
    pub fn molecule(&self, id: &str) -> Option<&MoleculeResult> {
        self.molecules.iter().find(|molecule| molecule.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.molecules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.molecules.is_empty()
    }

    /// Distinct property names across all molecules, first-seen order.
    #[must_use]
    pub fn property_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.molecules.iter().flat_map(MoleculeResult::property_names) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Decoded `X-Extra-JSON` header, when the server sent one.
    #[must_use]
    pub fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    /// The property-keyed body exactly as received.
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

/// Result of a prediction call: parsed JSON or raw spreadsheet bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutput {
    /// Pivoted JSON response.
    Json(PredictionResponse),
    /// XLSX workbook bytes, unchanged.
    Spreadsheet(Vec<u8>),
}

impl PredictionOutput {
    /// The JSON response, if this is one.
    #[must_use]
    pub fn into_json(self) -> Option<PredictionResponse> {
        match self {
            Self::Json(response) => Some(response),
            Self::Spreadsheet(_) => None,
        }
    }

    /// The spreadsheet bytes, if this is a spreadsheet.
    #[must_use]
    pub fn into_spreadsheet(self) -> Option<Vec<u8>> {
        match self {
            Self::Spreadsheet(bytes) => Some(bytes),
            Self::Json(_) => None,
        }
    }
}
