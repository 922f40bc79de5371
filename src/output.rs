//! Terminal rendering for prediction results and the model catalog.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use protopred::{Module, MoleculeResult, PredictionResponse, catalog};

/// Renders the catalog, optionally for one module.
#[must_use]
pub fn render_models(module: Option<Module>) -> String {
    let modules: Vec<Module> = module.map_or_else(|| Module::ALL.to_vec(), |m| vec![m]);
    let mut out = String::new();
    for module in modules {
        let _ = writeln!(out, "{module}");
        for (family, names) in catalog::models_for(module) {
            for name in *names {
                let _ = writeln!(out, "  {family}:{name}");
            }
        }
    }
    out
}

/// Renders one block per molecule with a line per property.
#[must_use]
pub fn render_table(response: &PredictionResponse) -> String {
    if response.is_empty() {
        return "No predictions returned.\n".to_string();
    }

    let width = response
        .property_names()
        .iter()
        .map(|name| name.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for molecule in response.molecules() {
        let _ = writeln!(out, "{}", molecule_heading(molecule));
        for result in molecule.predictions() {
            let predicted = result.predicted_value().unwrap_or("-");
            let _ = write!(out, "  {:<width$}  {predicted}", result.property());
            if let Some(experimental) = result.experimental_value() {
                let _ = write!(out, "  (exp. {experimental})");
            }
            if let Some(domain) = result.applicability_domain() {
                let _ = write!(out, "  [{domain}]");
            }
            out.push('\n');
        }
    }
    out
}

fn molecule_heading(molecule: &MoleculeResult) -> String {
    let mut heading = format!("{}  {}", molecule.id(), molecule.smiles());
    if let Some(name) = molecule.chemical_name() {
        let _ = write!(heading, "  {name}");
    }
    if let Some(cas) = molecule.cas() {
        let _ = write!(heading, "  CAS {cas}");
    }
    heading
}

/// Pretty-printed JSON of the pivoted response.
pub fn render_json(response: &PredictionResponse) -> Result<String> {
    serde_json::to_string_pretty(response).context("Failed to serialize prediction results")
}
