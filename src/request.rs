//! Request building: turns a [`PredictionRequest`] into the exact field set
//! the API expects.
//!
//! # Input modes
//!
//! | Input | `input_type` | `input_data` |
//! |-------|--------------|--------------|
//! | single SMILES | `SMILES_TEXT` | form field holding the string |
//! | batch | `SMILES_FILE` | inline JSON object in a JSON body |
//! | batch, uploaded | `SMILES_FILE` | `input.json` multipart part |
//! | `.json`/`.xlsx` file | `SMILES_FILE` | multipart part with the file contents |
//!
//! All validation here happens before anything touches the network.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::catalog;
use crate::config::Credentials;
use crate::constants::{BATCH_UPLOAD_FILENAME, INPUT_DATA_FIELD, XLSX_MIME};
use crate::error::ProtoPredError;
use crate::models::{InputType, IntoModelList, ModelList, Module, MoleculeBatch, OutputFormat};

/// How a batch travels to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchEncoding {
    /// Embedded in a JSON request body.
    #[default]
    JsonBody,
    /// Serialized to an in-memory `input.json` file part.
    Upload,
}

/// The molecules a request predicts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoleculeInput {
    /// One SMILES string.
    Smiles(String),
    /// Id-keyed molecules.
    Batch(MoleculeBatch, BatchEncoding),
    /// A `.json` or `.xlsx` input file on disk.
    File(PathBuf),
}

impl MoleculeInput {
    /// Number of molecules, when known without reading a file.
    #[must_use]
    pub fn molecule_count(&self) -> Option<usize> {
        match self {
            Self::Smiles(_) => Some(1),
            Self::Batch(batch, _) => Some(batch.len()),
            Self::File(_) => None,
        }
    }
}

/// A logical prediction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRequest {
    module: Module,
    models: ModelList,
    input: MoleculeInput,
    output: OutputFormat,
}

impl PredictionRequest {
    /// Creates a request, validating the model list and the molecule input.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoPredError::Validation`] for an empty or malformed
    /// model list, an empty SMILES, or an empty batch.
    pub fn new(
        module: Module,
        models: impl IntoModelList,
        input: MoleculeInput,
        output: OutputFormat,
    ) -> Result<Self, ProtoPredError> {
        let models = models.into_model_list()?;
        match &input {
            MoleculeInput::Smiles(smiles) => {
                if smiles.trim().is_empty() {
                    return Err(ProtoPredError::validation("SMILES string must not be empty"));
                }
            }
            MoleculeInput::Batch(batch, _) => batch.validate()?,
            MoleculeInput::File(path) => {
                upload_mime(path)?;
            }
        }
        Ok(Self {
            module,
            models,
            input,
            output,
        })
    }

    /// Single-SMILES request.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn single(
        smiles: impl Into<String>,
        module: Module,
        models: impl IntoModelList,
        output: OutputFormat,
    ) -> Result<Self, ProtoPredError> {
        Self::new(module, models, MoleculeInput::Smiles(smiles.into()), output)
    }

    /// Batch request sent as a JSON body.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn batch(
        batch: MoleculeBatch,
        module: Module,
        models: impl IntoModelList,
        output: OutputFormat,
    ) -> Result<Self, ProtoPredError> {
        Self::new(
            module,
            models,
            MoleculeInput::Batch(batch, BatchEncoding::JsonBody),
            output,
        )
    }

    /// File-upload request.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new); the extension must be `.json` or `.xlsx`.
    pub fn file(
        path: impl Into<PathBuf>,
        module: Module,
        models: impl IntoModelList,
        output: OutputFormat,
    ) -> Result<Self, ProtoPredError> {
        Self::new(module, models, MoleculeInput::File(path.into()), output)
    }

    #[must_use]
    pub fn module(&self) -> Module {
        self.module
    }

    #[must_use]
    pub fn models(&self) -> &ModelList {
        &self.models
    }

    #[must_use]
    pub fn input(&self) -> &MoleculeInput {
        &self.input
    }

    #[must_use]
    pub fn output(&self) -> OutputFormat {
        self.output
    }
}

/// A file part for multipart uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// File name reported to the server.
    pub file_name: String,
    /// MIME type of the part.
    pub mime: &'static str,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Shape of the `input_data` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputData {
    /// Form-encoded string field.
    Text(String),
    /// Inline JSON object in a JSON body.
    Json(Value),
    /// Multipart file part.
    File(Upload),
}

/// A fully built request: required string fields plus `input_data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WirePayload {
    fields: Vec<(&'static str, String)>,
    input_data: InputData,
    output: OutputFormat,
}

impl WirePayload {
    /// String fields in wire order, credentials included.
    #[must_use]
    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    /// Value of a string field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn input_data(&self) -> &InputData {
        &self.input_data
    }

    /// Requested output format.
    #[must_use]
    pub fn output(&self) -> OutputFormat {
        self.output
    }

    /// Fields with the token and secret key removed, for logging.
    #[must_use]
    pub fn loggable_fields(&self) -> Vec<(&'static str, &str)> {
        self.fields
            .iter()
            .filter(|(key, _)| !matches!(*key, "account_token" | "account_secret_key"))
            .map(|(key, value)| (*key, value.as_str()))
            .collect()
    }

    /// Form pairs for a `SMILES_TEXT` request, `input_data` last.
    #[must_use]
    pub fn form_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self
            .fields
            .iter()
            .map(|(key, value)| (*key, value.as_str()))
            .collect();
        if let InputData::Text(text) = &self.input_data {
            pairs.push((INPUT_DATA_FIELD, text.as_str()));
        }
        pairs
    }

    /// JSON body for an embedded-batch request.
    #[must_use]
    pub fn json_body(&self) -> Value {
        let mut body: Map<String, Value> = self
            .fields
            .iter()
            .map(|(key, value)| ((*key).to_string(), Value::String(value.clone())))
            .collect();
        let input = match &self.input_data {
            InputData::Text(text) => Value::String(text.clone()),
            InputData::Json(value) => value.clone(),
            InputData::File(_) => Value::Null,
        };
        body.insert(INPUT_DATA_FIELD.to_string(), input);
        Value::Object(body)
    }
}

/// Builds [`WirePayload`]s for one set of credentials.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    credentials: Credentials,
    validate_models: bool,
}

impl RequestBuilder {
    #[must_use]
    pub fn new(credentials: Credentials, validate_models: bool) -> Self {
        Self {
            credentials,
            validate_models,
        }
    }

    /// Builds the wire payload, reading the input file when there is one.
    ///
    /// # Errors
    ///
    /// - [`ProtoPredError::Validation`] for models outside the catalog
    ///   (when catalog checks are on) or unserializable batches
    /// - [`ProtoPredError::File`] when the input file cannot be read
    #[instrument(skip(self, request), fields(module = %request.module, models = %request.models))]
    pub async fn build(&self, request: &PredictionRequest) -> Result<WirePayload, ProtoPredError> {
        if self.validate_models {
            catalog::validate_models(request.module, &request.models)?;
        }

        let (input_type, input_data) = match &request.input {
            MoleculeInput::Smiles(smiles) => {
                (InputType::SmilesText, InputData::Text(smiles.clone()))
            }
            MoleculeInput::Batch(batch, BatchEncoding::JsonBody) => {
                (InputType::SmilesFile, InputData::Json(batch.to_json()?))
            }
            MoleculeInput::Batch(batch, BatchEncoding::Upload) => {
                let bytes = serde_json::to_vec(batch).map_err(|e| {
                    ProtoPredError::validation(format!("failed to serialize batch: {e}"))
                })?;
                let upload = Upload {
                    file_name: BATCH_UPLOAD_FILENAME.to_string(),
                    mime: "application/json",
                    bytes,
                };
                (InputType::SmilesFile, InputData::File(upload))
            }
            MoleculeInput::File(path) => {
                (InputType::SmilesFile, InputData::File(read_upload(path).await?))
            }
        };

        let mut fields = vec![
            ("account_token", self.credentials.token().to_string()),
            ("account_secret_key", self.credentials.secret_key().to_string()),
            ("account_user", self.credentials.user().to_string()),
            ("module", request.module.as_str().to_string()),
            ("models_list", request.models.to_wire()),
            ("input_type", input_type.as_str().to_string()),
        ];
        if request.output == OutputFormat::Xlsx {
            fields.push(("output_type", request.output.as_str().to_string()));
        }

        debug!(input_type = %input_type, output = %request.output, "request payload built");
        Ok(WirePayload {
            fields,
            input_data,
            output: request.output,
        })
    }
}

/// MIME type for an upload path, by extension.
fn upload_mime(path: &Path) -> Result<&'static str, ProtoPredError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => Ok("application/json"),
        Some("xlsx") => Ok(XLSX_MIME),
        _ => Err(ProtoPredError::validation(format!(
            "unsupported input file '{}'; expected a .json or .xlsx file",
            path.display()
        ))),
    }
}

async fn read_upload(path: &Path) -> Result<Upload, ProtoPredError> {
    let mime = upload_mime(path)?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ProtoPredError::io(path, e))?;
    if bytes.is_empty() {
        return Err(ProtoPredError::file(path, "input file is empty"));
    }
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(BATCH_UPLOAD_FILENAME)
        .to_string();
    debug!(path = %path.display(), bytes = bytes.len(), "input file loaded");
    Ok(Upload {
        file_name,
        mime,
        bytes,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::Molecule;
    use tempfile::TempDir;

    fn builder() -> RequestBuilder {
        RequestBuilder::new(Credentials::new("tok", "sec", "user").unwrap(), true)
    }

    #[tokio::test]
    async fn test_single_smiles_payload() {
        let request = PredictionRequest::single(
            "CCCCC",
            Module::PhysChem,
            "model_phys:water_solubility",
            OutputFormat::Json,
        )
        .unwrap();
        let payload = builder().build(&request).await.unwrap();

        assert_eq!(payload.field("input_type"), Some("SMILES_TEXT"));
        assert_eq!(payload.input_data(), &InputData::Text("CCCCC".to_string()));
        assert_eq!(payload.field("module"), Some("ProtoPHYSCHEM"));
        assert_eq!(payload.field("models_list"), Some("model_phys:water_solubility"));
        assert_eq!(payload.field("output_type"), None);
        let pairs = payload.form_pairs();
        assert_eq!(pairs.last(), Some(&("input_data", "CCCCC")));
    }

    #[tokio::test]
    async fn test_single_smiles_is_sent_verbatim() {
        let smiles = "O=[N+]([O-])c1ccc2nc[nH]c2c1";
        let request =
            PredictionRequest::single(smiles, Module::PhysChem, "model_phys:log_kow", OutputFormat::Json)
                .unwrap();
        let payload = builder().build(&request).await.unwrap();
        assert_eq!(payload.input_data(), &InputData::Text(smiles.to_string()));
    }

    #[test]
    fn test_empty_smiles_rejected() {
        let err = PredictionRequest::single(
            "  ",
            Module::PhysChem,
            "model_phys:water_solubility",
            OutputFormat::Json,
        )
        .unwrap_err();
        assert!(matches!(err, ProtoPredError::Validation { status: None, .. }));
    }

    #[tokio::test]
    async fn test_batch_payload_json_body() {
        let batch = MoleculeBatch::new()
            .with("ID_1", "C1=CC(=O)C=CC1=O")
            .unwrap()
            .with(
                "ID_2",
                Molecule::new("CCCCC").with_cas("109-66-0").with_chemical_name("Pentane"),
            )
            .unwrap();
        let request = PredictionRequest::batch(
            batch,
            Module::PhysChem,
            vec!["model_phys:water_solubility", "model_phys: melting_point"],
            OutputFormat::Xlsx,
        )
        .unwrap();
        let payload = builder().build(&request).await.unwrap();

        assert_eq!(payload.field("input_type"), Some("SMILES_FILE"));
        assert_eq!(payload.field("output_type"), Some("XLSX"));
        let body = payload.json_body();
        assert_eq!(
            body["models_list"],
            "model_phys:water_solubility, model_phys:melting_point"
        );
        assert_eq!(body["input_data"]["ID_2"]["CAS"], "109-66-0");
        assert_eq!(body["input_data"]["ID_1"]["SMILES"], "C1=CC(=O)C=CC1=O");
    }

    #[tokio::test]
    async fn test_batch_upload_encoding() {
        let batch = MoleculeBatch::from_smiles(["CCO"]);
        let request = PredictionRequest::new(
            Module::PhysChem,
            "model_phys:boiling_point",
            MoleculeInput::Batch(batch, BatchEncoding::Upload),
            OutputFormat::Json,
        )
        .unwrap();
        let payload = builder().build(&request).await.unwrap();
        let InputData::File(upload) = payload.input_data() else {
            panic!("expected file upload, got {:?}", payload.input_data());
        };
        assert_eq!(upload.file_name, "input.json");
        let parsed: Value = serde_json::from_slice(&upload.bytes).unwrap();
        assert_eq!(parsed["ID_1"]["SMILES"], "CCO");
    }

    #[tokio::test]
    async fn test_file_upload_reads_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Molecules.JSON");
        std::fs::write(&path, br#"{"ID_1": {"SMILES": "CCCCC"}}"#).unwrap();
        let request = PredictionRequest::file(
            &path,
            Module::PhysChem,
            "model_phys:water_solubility",
            OutputFormat::Json,
        )
        .unwrap();
        let payload = builder().build(&request).await.unwrap();
        let InputData::File(upload) = payload.input_data() else {
            panic!("expected file upload");
        };
        assert_eq!(upload.file_name, "Molecules.JSON");
        assert_eq!(upload.mime, "application/json");
        assert!(upload.bytes.starts_with(b"{\"ID_1\""));
    }

    #[tokio::test]
    async fn test_missing_file_is_file_error() {
        let request = PredictionRequest::file(
            "/nonexistent/input.xlsx",
            Module::PhysChem,
            "model_phys:water_solubility",
            OutputFormat::Json,
        )
        .unwrap();
        let err = builder().build(&request).await.unwrap_err();
        assert!(matches!(err, ProtoPredError::File { .. }), "got {err:?}");
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let err = PredictionRequest::file(
            "molecules.csv",
            Module::PhysChem,
            "model_phys:water_solubility",
            OutputFormat::Json,
        )
        .unwrap_err();
        assert!(err.to_string().contains(".json or .xlsx"));
    }

    #[tokio::test]
    async fn test_catalog_check_can_be_disabled() {
        let request = PredictionRequest::single(
            "CCO",
            Module::PhysChem,
            "model_phys:new_model",
            OutputFormat::Json,
        )
        .unwrap();
        assert!(builder().build(&request).await.is_err());
        let lenient = RequestBuilder::new(Credentials::new("t", "s", "u").unwrap(), false);
        assert!(lenient.build(&request).await.is_ok());
    }

    #[tokio::test]
    async fn test_loggable_fields_exclude_credentials() {
        let request = PredictionRequest::single(
            "CCO",
            Module::PhysChem,
            "model_phys:log_d",
            OutputFormat::Json,
        )
        .unwrap();
        let payload = builder().build(&request).await.unwrap();
        let keys: Vec<&str> = payload.loggable_fields().iter().map(|(k, _)| *k).collect();
        assert!(!keys.contains(&"account_token"));
        assert!(!keys.contains(&"account_secret_key"));
        assert!(keys.contains(&"account_user"));
    }
}
