use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nbr", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// Configuration file (defaults to ~/.nbr5410/config.toml)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Read reference tables from this directory instead of the built-in ones
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Size the breaker and wire of every circuit in a project
    Size {
        /// Project file (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        project: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
    /// Select a conduit for every conduit run in a project
    Conduits {
        /// Project file (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        project: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
    /// Report structural problems in a project
    Validate {
        /// Project file (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        project: PathBuf,
    },
    /// Print reference tables
    Tables {
        #[command(subcommand)]
        command: TablesCommands,
    },
    /// Write a sample project
    New {
        /// Output file
        #[arg(value_hint = ValueHint::FilePath)]
        out: PathBuf,
        /// Project name
        #[arg(long, default_value = "Sample house")]
        name: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TablesCommands {
    /// Ambient temperature correction factors
    Temperature {
        /// Insulation (pvc, epr, xlpe)
        #[arg(default_value = "pvc")]
        insulation: String,
    },
    /// Grouping correction factors
    Grouping,
    /// Breaker ratings per curve
    Breakers {
        /// Curve (B, C, D); all curves when omitted
        curve: Option<String>,
    },
    /// Conduit catalogue
    Conduits {
        /// Conduit family (rigid, flexible); all families when omitted
        conduit_type: Option<String>,
    },
    /// Wire sections and ampacities
    Wires {
        /// Conductor material
        #[arg(long, default_value = "copper")]
        material: String,
        /// Insulation
        #[arg(long, default_value = "pvc")]
        insulation: String,
        /// Reference method
        #[arg(long, default_value = "B1")]
        method: String,
        /// Loaded conductors (2 or 3)
        #[arg(long, default_value_t = 2)]
        loaded: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table
    Plain,
    /// Pretty-printed JSON
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "nbr",
            "size",
            "house.json",
            "--format",
            "json",
            "--data-dir",
            "/tmp/tables",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/tables")));
        match cli.command {
            Commands::Size { project, format } => {
                assert_eq!(project, PathBuf::from("house.json"));
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
