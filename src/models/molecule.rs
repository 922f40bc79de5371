//! Molecule descriptions and id-keyed batches.

use std::collections::HashMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::ProtoPredError;

/// A molecule: a SMILES string plus optional identifying metadata.
///
/// Serializes to the keys the API expects (`SMILES`, `CAS`,
/// `Chemical name`, `EC number`, `Structural formula`), omitting absent
/// fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Molecule {
    #[serde(rename = "SMILES")]
    smiles: String,
    #[serde(rename = "CAS", default, skip_serializing_if = "Option::is_none")]
    cas: Option<String>,
    #[serde(rename = "Chemical name", default, skip_serializing_if = "Option::is_none")]
    chemical_name: Option<String>,
    #[serde(rename = "EC number", default, skip_serializing_if = "Option::is_none")]
    ec_number: Option<String>,
    #[serde(
        rename = "Structural formula",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    structural_formula: Option<String>,
}

impl Molecule {
    /// Creates a molecule from a SMILES string.
    pub fn new(smiles: impl Into<String>) -> Self {
        Self {
            smiles: smiles.into(),
            cas: None,
            chemical_name: None,
            ec_number: None,
            structural_formula: None,
        }
    }

    /// Sets the CAS registry number.
    #[must_use]
    pub fn with_cas(mut self, cas: impl Into<String>) -> Self {
        self.cas = non_blank(cas.into());
        self
    }

    /// Sets the chemical name.
    #[must_use]
    pub fn with_chemical_name(mut self, name: impl Into<String>) -> Self {
        self.chemical_name = non_blank(name.into());
        self
    }

    /// Sets the EC number.
    #[must_use]
    pub fn with_ec_number(mut self, ec_number: impl Into<String>) -> Self {
        self.ec_number = non_blank(ec_number.into());
        self
    }

    /// Sets the structural formula.
    #[must_use]
    pub fn with_structural_formula(mut self, formula: impl Into<String>) -> Self {
        self.structural_formula = non_blank(formula.into());
        self
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

    /// Rejects molecules whose SMILES is empty or whitespace.
    pub(crate) fn validate(&self, id: &str) -> Result<(), ProtoPredError> {
        if self.smiles.trim().is_empty() {
            return Err(ProtoPredError::validation(format!(
                "molecule '{id}' has an empty SMILES string"
            )));
        }
        Ok(())
    }
}

impl From<&str> for Molecule {
    fn from(smiles: &str) -> Self {
        Self::new(smiles)
    }
}

impl From<String> for Molecule {
    fn from(smiles: String) -> Self {
        Self::new(smiles)
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// An insertion-ordered collection of molecules keyed by caller-assigned id.
///
/// Serializes to the inline `input_data` object `{id: {SMILES, CAS?, ...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoleculeBatch {
    entries: Vec<(String, Molecule)>,
    positions: HashMap<String, usize>,
}

impl MoleculeBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a batch from bare SMILES strings, assigning ids `ID_1`, `ID_2`, ...
    pub fn from_smiles<I, S>(smiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut batch = Self::new();
        for (index, smiles) in smiles.into_iter().enumerate() {
            batch.push(format!("ID_{}", index + 1), Molecule::new(smiles));
        }
        batch
    }

    /// Adds a molecule under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoPredError::Validation`] if `id` is blank or already present.
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        molecule: impl Into<Molecule>,
    ) -> Result<(), ProtoPredError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ProtoPredError::validation("molecule id must not be empty"));
        }
        if self.positions.contains_key(&id) {
            return Err(ProtoPredError::validation(format!(
                "duplicate molecule id '{id}' in batch"
            )));
        }
        self.push(id, molecule.into());
        Ok(())
    }

    fn push(&mut self, id: String, molecule: Molecule) {
        self.positions.insert(id.clone(), self.entries.len());
        self.entries.push((id, molecule));
    }

    /// Chained form of [`insert`](Self::insert).
    ///
    /// # Errors
    ///
    /// Same as [`insert`](Self::insert).
    pub fn with(
        mut self,
        id: impl Into<String>,
        molecule: impl Into<Molecule>,
    ) -> Result<Self, ProtoPredError> {
        self.insert(id, molecule)?;
        Ok(self)
    }

    /// Parses a `{id: molecule}` JSON object.
    ///
    /// Each value may be a bare SMILES string or an object with the API's
    /// molecule keys.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoPredError::Validation`] if the document is not an
    /// object, a value has the wrong shape, or an id repeats.
    pub fn from_json_str(raw: &str) -> Result<Self, ProtoPredError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ProtoPredError::validation(format!("invalid molecule JSON: {e}")))?;
        let Value::Object(object) = value else {
            return Err(ProtoPredError::validation(
                "molecule JSON must be an object keyed by molecule id",
            ));
        };

        let mut batch = Self::new();
        for (id, entry) in object {
            let molecule = match entry {
                Value::String(smiles) => Molecule::new(smiles),
                Value::Object(_) => serde_json::from_value::<Molecule>(entry).map_err(|e| {
                    ProtoPredError::validation(format!("invalid molecule '{id}': {e}"))
                })?,
                other => {
                    return Err(ProtoPredError::validation(format!(
                        "invalid molecule '{id}': expected SMILES string or object, got {other}"
                    )));
                }
            };
            batch.insert(id, molecule)?;
        }
        Ok(batch)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Molecule> {
        self.positions
            .get(id)
            .map(|&position| &self.entries[position].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Molecule)> {
        self.entries
            .iter()
            .map(|(id, molecule)| (id.as_str(), molecule))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks the batch is non-empty and every SMILES is present.
    pub(crate) fn validate(&self) -> Result<(), ProtoPredError> {
        if self.entries.is_empty() {
            return Err(ProtoPredError::validation(
                "molecule batch must contain at least one molecule",
            ));
        }
        for (id, molecule) in &self.entries {
            molecule.validate(id)?;
        }
        Ok(())
    }

    /// The batch as a JSON value, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoPredError::Validation`] if serialization fails.
    pub fn to_json(&self) -> Result<Value, ProtoPredError> {
        serde_json::to_value(self)
            .map_err(|e| ProtoPredError::validation(format!("failed to serialize batch: {e}")))
    }
}

impl Serialize for MoleculeBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, molecule) in &self.entries {
            map.serialize_entry(id, molecule)?;
        }
        map.end()
    }
}
