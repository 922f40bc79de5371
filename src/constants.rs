//! Wire-level constants for the ProtoPRED API and client defaults.

use std::time::Duration;

/// ProtoPRED v2 endpoint.
///
/// The trailing slash is required: the server answers 404 without it.
/// The client sends requests to the configured URL verbatim.
pub const BASE_URL: &str = "https://protopred.protoqsar.com/API/v2/";

/// Default per-attempt request timeout (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff (1 second).
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Response header carrying additional JSON metadata.
pub const EXTRA_JSON_HEADER: &str = "X-Extra-JSON";

/// Multipart part name and form field holding the molecule input.
pub const INPUT_DATA_FIELD: &str = "input_data";

/// File name used when a batch is uploaded from memory.
pub const BATCH_UPLOAD_FILENAME: &str = "input.json";

/// Synthetic molecule id for single-object responses that carry no `ID`.
pub const SINGLE_MOLECULE_ID: &str = "molecule_1";

/// Default file name for spreadsheet output written by the CLI.
pub const DEFAULT_XLSX_OUTPUT: &str = "protopred_predictions.xlsx";

/// MIME type of XLSX uploads.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Row keys of the server's per-molecule result objects.
pub(crate) mod row {
    pub const ID: &str = "ID";
    pub const SMILES: &str = "SMILES";
    pub const CAS: &str = "CAS";
    pub const CHEMICAL_NAME: &str = "Chemical name";
    pub const EC_NUMBER: &str = "EC number";
    pub const STRUCTURAL_FORMULA: &str = "Structural formula";
    pub const OTHER_REGULATORY_ID: &str = "Other Regulatory ID";
    pub const PREDICTED_VALUE: &str = "Predicted value";
    pub const PREDICTED_NUMERICAL: &str = "Predicted numerical";
    pub const PREDICTED_VALUE_MODEL_UNITS: &str = "Predicted value (model units)";
    pub const PREDICTED_NUMERICAL_MODEL_UNITS: &str = "Predicted numerical (model units)";
    pub const EXPERIMENTAL_VALUE: &str = "Experimental value*";
    pub const EXPERIMENTAL_NUMERICAL: &str = "Experimental numerical";
    pub const EXPERIMENTAL_VALUE_MODEL_UNITS: &str = "Experimental value (model units)*";
    pub const EXPERIMENTAL_NUMERICAL_MODEL_UNITS: &str = "Experimental numerical (model units)";
    pub const APPLICABILITY_DOMAIN: &str = "Applicability domain**";
    pub const PROBABILITY: &str = "Probability";
}
