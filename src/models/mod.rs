//! Data model: modules, molecules, model lists and prediction results.

mod model_list;
mod module;
mod molecule;
mod response;

pub use model_list::{IntoModelList, ModelId, ModelList};
pub use module::{InputType, Module, OutputFormat};
pub use molecule::{Molecule, MoleculeBatch};
pub use response::{ModelResult, MoleculeResult, PredictionOutput, PredictionResponse};
