//! The ProtoPRED client: validates input, builds the request, sends it and
//! adapts the response.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::adapter::adapt_response;
use crate::config::{ClientConfig, Credentials};
use crate::error::ProtoPredError;
use crate::models::{IntoModelList, Module, MoleculeBatch, OutputFormat, PredictionOutput};
use crate::request::{BatchEncoding, MoleculeInput, PredictionRequest, RequestBuilder};
use crate::transport::HttpTransport;

/// Client for the ProtoPRED prediction API.
///
/// Holds one pooled HTTP client; create it once and reuse it for sequential
/// calls. Calls are independent, so sharing one client between tasks works,
/// but each call still runs its retries in order.
///
/// # Example
///
/// ```no_run
/// use protopred::{ClientConfig, Credentials, Module, OutputFormat, ProtoPredClient};
///
/// # async fn example() -> Result<(), protopred::ProtoPredError> {
/// let credentials = Credentials::new("token", "secret", "user")?;
/// let client = ProtoPredClient::new(credentials, ClientConfig::default())?;
/// let output = client
///     .predict_single("CCCCC", Module::PhysChem, "model_phys:water_solubility", OutputFormat::Json)
///     .await?;
/// if let Some(response) = output.into_json() {
///     for molecule in response.molecules() {
///         println!("{}: {:?}", molecule.id(), molecule.predicted_value("Water solubility"));
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ProtoPredClient {
    config: ClientConfig,
    builder: RequestBuilder,
    transport: HttpTransport,
}

impl ProtoPredClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoPredError::Validation`] if the configuration is
    /// invalid or the HTTP client cannot be built.
    #[instrument(skip_all, fields(user = %credentials.user(), base_url = %config.base_url()))]
    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self, ProtoPredError> {
        let transport = HttpTransport::new(&config)?;
        let builder = RequestBuilder::new(credentials, config.validate_models());
        debug!("client initialized");
        Ok(Self {
            config,
            builder,
            transport,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Runs a prepared request.
    ///
    /// # Errors
    ///
    /// - [`ProtoPredError::Validation`] for rejected input (local or HTTP 4xx)
    /// - [`ProtoPredError::Authentication`] for HTTP 401/403
    /// - [`ProtoPredError::Network`] / [`ProtoPredError::Timeout`] once retries run out
    /// - [`ProtoPredError::Api`] for 5xx after retries or a malformed response
    /// - [`ProtoPredError::File`] when an input file cannot be read
    #[instrument(skip(self, request), fields(module = %request.module(), models = %request.models(), output = %request.output()))]
    pub async fn predict(&self, request: &PredictionRequest) -> Result<PredictionOutput, ProtoPredError> {
        let payload = self.builder.build(request).await?;
        let raw = self.transport.send(&payload).await?;
        let output = adapt_response(raw, request.output())?;
        match &output {
            PredictionOutput::Json(response) => {
                info!(molecules = response.len(), "prediction completed");
            }
            PredictionOutput::Spreadsheet(bytes) => {
                info!(bytes = bytes.len(), "spreadsheet prediction completed");
            }
        }
        Ok(output)
    }

    /// Predicts properties for one SMILES string.
    ///
    /// # Errors
    ///
    /// See [`predict`](Self::predict); an empty SMILES fails before any
    /// network call.
    pub async fn predict_single(
        &self,
        smiles: &str,
        module: Module,
        models: impl IntoModelList,
        output: OutputFormat,
    ) -> Result<PredictionOutput, ProtoPredError> {
        let request = PredictionRequest::single(smiles, module, models, output)?;
        self.predict(&request).await
    }

    /// Predicts properties for an id-keyed batch sent as a JSON body.
    ///
    /// # Errors
    ///
    /// See [`predict`](Self::predict).
    pub async fn predict_batch(
        &self,
        batch: MoleculeBatch,
        module: Module,
        models: impl IntoModelList,
        output: OutputFormat,
    ) -> Result<PredictionOutput, ProtoPredError> {
        self.predict_batch_with(batch, BatchEncoding::JsonBody, module, models, output)
            .await
    }

    /// Predicts properties for a batch with an explicit encoding.
    ///
    /// # Errors
    ///
    /// See [`predict`](Self::predict).
    pub async fn predict_batch_with(
        &self,
        batch: MoleculeBatch,
        encoding: BatchEncoding,
        module: Module,
        models: impl IntoModelList,
        output: OutputFormat,
    ) -> Result<PredictionOutput, ProtoPredError> {
        let request =
            PredictionRequest::new(module, models, MoleculeInput::Batch(batch, encoding), output)?;
        self.predict(&request).await
    }

    /// Uploads a `.json` or `.xlsx` input file.
    ///
    /// # Errors
    ///
    /// See [`predict`](Self::predict).
    pub async fn predict_from_file(
        &self,
        path: impl AsRef<Path>,
        module: Module,
        models: impl IntoModelList,
        output: OutputFormat,
    ) -> Result<PredictionOutput, ProtoPredError> {
        let request = PredictionRequest::file(path.as_ref(), module, models, output)?;
        self.predict(&request).await
    }

    /// Writes spreadsheet bytes to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoPredError::File`] if a directory or the file cannot
    /// be written.
    #[instrument(skip(self, bytes, path), fields(bytes = bytes.len(), path = %path.as_ref().display()))]
    pub async fn save_binary_response(
        &self,
        bytes: &[u8],
        path: impl AsRef<Path>,
    ) -> Result<PathBuf, ProtoPredError> {
        save_binary(bytes, path.as_ref()).await
    }

    /// Releases the connection pool. Dropping the client does the same.
    pub fn close(self) {
        debug!("client closed");
    }
}

pub(crate) async fn save_binary(bytes: &[u8], path: &Path) -> Result<PathBuf, ProtoPredError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ProtoPredError::io(parent, e))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| ProtoPredError::io(path, e))?;
    info!(path = %path.display(), "spreadsheet saved");
    Ok(path.to_path_buf())
}
