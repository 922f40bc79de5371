//! CLI entry point for the ProtoPRED client.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use protopred::{
    BatchEncoding, Module, MoleculeBatch, OutputFormat, PredictionOutput, PredictionRequest,
    ProtoPredClient,
};
use tracing::{debug, info};

mod app_config;
mod cli;
mod logging;
mod output;

use cli::{Cli, Command, PredictArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .clone()
        .or_else(|| std::env::var_os(logging::ENV_LOG_FILE).map(PathBuf::from));
    logging::init(cli.verbose, cli.quiet, log_file.as_deref())?;
    debug!(command = ?cli.command, "CLI arguments parsed");

    let file_config = app_config::load_file_config(cli.config.as_deref())?;

    if let Command::Models { module } = &cli.command {
        print!("{}", output::render_models(module.map(Module::from)));
        return Ok(());
    }

    let credentials =
        app_config::resolve_credentials(&cli, &file_config, |name| std::env::var(name).ok())?;
    let config = app_config::resolve_client_config(&cli, &file_config);
    let client = ProtoPredClient::new(credentials, config)?;

    let (request, predict) = match &cli.command {
        Command::Single { smiles, predict } => (
            PredictionRequest::single(
                smiles.as_str(),
                predict.module.into(),
                predict.models.as_slice(),
                output_format(predict),
            )?,
            predict,
        ),
        Command::Batch {
            file,
            upload,
            predict,
        } => {
            let raw = tokio::fs::read_to_string(file)
                .await
                .with_context(|| format!("Failed to read batch file '{}'", file.display()))?;
            let batch = MoleculeBatch::from_json_str(&raw)?;
            info!(molecules = batch.len(), "batch loaded");
            let encoding = if *upload {
                BatchEncoding::Upload
            } else {
                BatchEncoding::JsonBody
            };
            (
                PredictionRequest::new(
                    predict.module.into(),
                    predict.models.as_slice(),
                    protopred::MoleculeInput::Batch(batch, encoding),
                    output_format(predict),
                )?,
                predict,
            )
        }
        Command::File { path, predict } => (
            PredictionRequest::file(
                path,
                predict.module.into(),
                predict.models.as_slice(),
                output_format(predict),
            )?,
            predict,
        ),
        Command::Models { .. } => return Ok(()),
    };

    match client.predict(&request).await? {
        PredictionOutput::Spreadsheet(bytes) => {
            let path = predict
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(protopred::DEFAULT_XLSX_OUTPUT));
            let saved = client.save_binary_response(&bytes, &path).await?;
            println!("Saved {} bytes to {}", bytes.len(), saved.display());
        }
        PredictionOutput::Json(response) => {
            if predict.json {
                println!("{}", output::render_json(&response)?);
            } else {
                print!("{}", output::render_table(&response));
            }
        }
    }

    client.close();
    Ok(())
}

fn output_format(predict: &PredictArgs) -> OutputFormat {
    if predict.xlsx {
        OutputFormat::Xlsx
    } else {
        OutputFormat::Json
    }
}
