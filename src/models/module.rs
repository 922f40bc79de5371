//! Enumerations shared by requests and responses: module, input mode, output format.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtoPredError;

/// A ProtoPRED module, i.e. a named group of prediction models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Module {
    /// Physico-chemical properties (`ProtoPHYSCHEM`).
    PhysChem,
    /// Absorption, distribution, metabolism and excretion (`ProtoADME`).
    Adme,
}

impl Module {
    /// All modules, in catalog order.
    pub const ALL: [Module; 2] = [Module::PhysChem, Module::Adme];

    /// Wire name sent in the `module` field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PhysChem => "ProtoPHYSCHEM",
            Self::Adme => "ProtoADME",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = ProtoPredError;

    /// Accepts the wire name or the short form, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "protophyschem" | "physchem" => Ok(Self::PhysChem),
            "protoadme" | "adme" => Ok(Self::Adme),
            other => Err(ProtoPredError::validation(format!(
                "unsupported module '{other}'; expected ProtoPHYSCHEM or ProtoADME"
            ))),
        }
    }
}

/// Wire-level input mode (`input_type` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    /// A single SMILES string in the `input_data` form field.
    SmilesText,
    /// Molecules supplied as a file upload or embedded JSON object.
    SmilesFile,
}

impl InputType {
    /// Wire name sent in the `input_type` field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SmilesText => "SMILES_TEXT",
            Self::SmilesFile => "SMILES_FILE",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested response format (`output_type` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Property-keyed JSON; the server default.
    #[default]
    Json,
    /// Binary XLSX workbook.
    Xlsx,
}

impl OutputFormat {
    /// Wire name sent in the `output_type` field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Xlsx => "XLSX",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ProtoPredError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "JSON" => Ok(Self::Json),
            "XLSX" | "EXCEL" => Ok(Self::Xlsx),
            other => Err(ProtoPredError::validation(format!(
                "unsupported output format '{other}'; expected JSON or XLSX"
            ))),
        }
    }
}
