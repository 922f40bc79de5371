//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use protopred::Module;

/// Predict molecular properties with the ProtoPRED API.
///
/// Credentials come from flags, the PROTOPRED_ACCOUNT_TOKEN,
/// PROTOPRED_SECRET_KEY and PROTOPRED_ACCOUNT_USER environment variables,
/// or the config file.
#[derive(Parser, Debug)]
#[command(name = "protopred")]
#[command(author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also write logs to this file (appended, no colors)
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Config file (default: $XDG_CONFIG_HOME/protopred/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Account token
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Account secret key
    #[arg(long, global = true, value_name = "KEY")]
    pub secret_key: Option<String>,

    /// Account user name
    #[arg(long, global = true, value_name = "USER")]
    pub user: Option<String>,

    /// API endpoint, used exactly as given
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Per-attempt request timeout in seconds (1-3600)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout_secs: Option<u64>,

    /// Retries for transient failures (0-10)
    #[arg(short = 'r', long, global = true, value_parser = clap::value_parser!(u32).range(0..=10))]
    pub max_retries: Option<u32>,

    /// Backoff base delay in milliseconds (max 60000)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub retry_delay_ms: Option<u64>,

    /// Skip the built-in model catalog check
    #[arg(long, global = true)]
    pub no_model_check: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Predict properties for one SMILES string
    Single {
        /// SMILES string, sent verbatim
        smiles: String,

        #[command(flatten)]
        predict: PredictArgs,
    },

    /// Predict properties for a JSON file of {id: molecule} entries
    Batch {
        /// JSON file mapping ids to SMILES strings or molecule objects
        file: PathBuf,

        /// Send the batch as an uploaded input.json instead of a JSON body
        #[arg(long)]
        upload: bool,

        #[command(flatten)]
        predict: PredictArgs,
    },

    /// Upload a .json or .xlsx input file
    File {
        /// Input file
        path: PathBuf,

        #[command(flatten)]
        predict: PredictArgs,
    },

    /// List the models each module offers (no network access)
    Models {
        /// Only list this module
        #[arg(short, long, value_enum)]
        module: Option<ModuleArg>,
    },
}

/// Options shared by the prediction commands.
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Module to query
    #[arg(short, long, value_enum)]
    pub module: ModuleArg,

    /// Models as family:name; repeat or comma-separate
    #[arg(long, required = true, value_name = "MODELS")]
    pub models: Vec<String>,

    /// Request an XLSX workbook instead of JSON
    #[arg(long, conflicts_with = "json")]
    pub xlsx: bool,

    /// Where to save the workbook (default: protopred_predictions.xlsx)
    #[arg(short, long, value_name = "PATH", requires = "xlsx")]
    pub output: Option<PathBuf>,

    /// Print the pivoted results as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Module names accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleArg {
    /// ProtoPHYSCHEM
    #[value(alias = "protophyschem")]
    Physchem,
    /// ProtoADME
    #[value(alias = "protoadme")]
    Adme,
}

impl From<ModuleArg> for Module {
    fn from(value: ModuleArg) -> Self {
        match value {
            ModuleArg::Physchem => Module::PhysChem,
            ModuleArg::Adme => Module::Adme,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_single_command_parses() {
        let cli = Cli::try_parse_from([
            "protopred",
            "single",
            "CCCCC",
            "-m",
            "physchem",
            "--models",
            "model_phys:water_solubility",
        ])
        .unwrap();
        let Command::Single { smiles, predict } = cli.command else {
            panic!("expected single command");
        };
        assert_eq!(smiles, "CCCCC");
        assert_eq!(Module::from(predict.module), Module::PhysChem);
        assert_eq!(predict.models, ["model_phys:water_solubility"]);
        assert!(!predict.xlsx);
    }

    #[test]
    fn test_cli_models_flag_repeats() {
        let cli = Cli::try_parse_from([
            "protopred",
            "batch",
            "molecules.json",
            "-m",
            "adme",
            "--models",
            "model_abs:bioavailability20",
            "--models",
            "model_dist:blood-brain_barrier",
            "--upload",
        ])
        .unwrap();
        let Command::Batch {
            upload, predict, ..
        } = cli.command
        else {
            panic!("expected batch command");
        };
        assert!(upload);
        assert_eq!(predict.models.len(), 2);
        assert_eq!(Module::from(predict.module), Module::Adme);
    }

    #[test]
    fn test_cli_module_alias() {
        let cli = Cli::try_parse_from([
            "protopred",
            "file",
            "in.xlsx",
            "-m",
            "protophyschem",
            "--models",
            "model_phys:log_kow",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::File { .. }));
    }

    #[test]
    fn test_cli_models_required_for_predictions() {
        let result = Cli::try_parse_from(["protopred", "single", "CCO", "-m", "physchem"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_output_requires_xlsx() {
        let result = Cli::try_parse_from([
            "protopred",
            "single",
            "CCO",
            "-m",
            "physchem",
            "--models",
            "model_phys:log_d",
            "-o",
            "out.xlsx",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["protopred", "models", "-vv", "--max-retries", "5"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.max_retries, Some(5));
    }

    #[test]
    fn test_cli_max_retries_over_max_rejected() {
        let result = Cli::try_parse_from(["protopred", "models", "-r", "11"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["protopred", "models", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_cli_unknown_module_rejected() {
        let result = Cli::try_parse_from(["protopred", "models", "-m", "tox"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Cli::try_parse_from(["protopred", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
