//! Built-in catalog of the models each module offers.
//!
//! Used to reject unknown models before a request is sent. Names are
//! matched case-insensitively with `-` and `_` treated as equal, since the
//! server accepts both spellings.

use crate::error::ProtoPredError;
use crate::models::{ModelList, Module};

/// Model families and names for one module.
pub type FamilyTable = &'static [(&'static str, &'static [&'static str])];

const PHYSCHEM_MODELS: FamilyTable = &[(
    "model_phys",
    &[
        "melting_point",
        "boiling_point",
        "vapour_pressure",
        "water_solubility",
        "log_kow",
        "log_d",
        "surface_tension",
    ],
)];

const ADME_MODELS: FamilyTable = &[
    (
        "model_abs",
        &[
            "bioavailability20",
            "bioavailability30",
            "caco-2_permeability",
            "p-gp_inhibitor",
            "p-gp_substrate",
            "skin_permeability",
            "human_intestinal_absorption",
        ],
    ),
    (
        "model_met",
        &[
            "CYP450_1A2_inhibitor",
            "CYP450_1A2_substrate",
            "CYP450_2C19_inhibitor",
            "CYP450_2C19_substrate",
            "CYP450_2C9_inhibitor",
            "CYP450_2D6_inhibitor",
            "CYP450_2D6_substrate",
            "CYP450_3A4_inhibitor",
            "CYP450_3A4_substrate",
            "human_liver_microsomal",
        ],
    ),
    (
        "model_dist",
        &[
            "blood-brain_barrier",
            "plasma-protein_binding",
            "volume_of_distribution",
        ],
    ),
    ("model_exc", &["half-life", "OATP1B1", "OATP1B3", "BSEP"]),
];

/// Families and model names available in `module`.
#[must_use]
pub fn models_for(module: Module) -> FamilyTable {
    match module {
        Module::PhysChem => PHYSCHEM_MODELS,
        Module::Adme => ADME_MODELS,
    }
}

fn canonical(name: &str) -> String {
    name.to_lowercase().replace('-', "_")
}

/// Checks every model in `models` exists in `module`.
///
/// # Errors
///
/// Returns [`ProtoPredError::Validation`] naming the available choices
/// when a family or model name is unknown.
pub fn validate_models(module: Module, models: &ModelList) -> Result<(), ProtoPredError> {
    let table = models_for(module);
    for model in models.iter() {
        let Some((_, names)) = table.iter().find(|(family, _)| *family == model.family()) else {
            let available: Vec<&str> = table.iter().map(|(family, _)| *family).collect();
            return Err(ProtoPredError::validation(format!(
                "unknown model type '{}' for {module}; available: {}",
                model.family(),
                available.join(", ")
            )));
        };
        let wanted = canonical(model.name());
        if !names.iter().any(|name| canonical(name) == wanted) {
            return Err(ProtoPredError::validation(format!(
                "unknown model '{}' for {module}/{}; available: {}",
                model.name(),
                model.family(),
                names.join(", ")
            )));
        }
    }
    Ok(())
}
