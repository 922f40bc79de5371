//! ProtoPRED Client Library
//!
//! A typed client for the ProtoPRED molecular property prediction API.
//! Molecules go in as SMILES strings, id-keyed batches or input files;
//! predictions come back pivoted per molecule, or as an XLSX workbook.
//!
//! # Architecture
//!
//! A call flows through:
//! - [`request`] - validates input and builds the wire payload
//! - [`transport`] - POSTs it, retrying transient failures with backoff
//! - [`adapter`] - pivots the property-keyed response by molecule id
//! - [`models`] - the typed request and result model
//!
//! [`ProtoPredClient`] ties these together.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod catalog;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod request;
pub mod transport;
mod user_agent;

// Re-export commonly used types
pub use adapter::{adapt, adapt_response};
pub use client::ProtoPredClient;
pub use config::{ClientConfig, Credentials};
pub use constants::{BASE_URL, DEFAULT_XLSX_OUTPUT};
pub use error::ProtoPredError;
pub use models::{
    InputType, IntoModelList, ModelId, ModelList, ModelResult, Module, Molecule, MoleculeBatch,
    MoleculeResult, OutputFormat, PredictionOutput, PredictionResponse,
};
pub use request::{BatchEncoding, MoleculeInput, PredictionRequest, RequestBuilder, WirePayload};
pub use transport::{FailureType, HttpTransport, RetryDecision, RetryPolicy, classify_error};
