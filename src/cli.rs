use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "sphinx-autoindex")]
#[command(about = "Generate the Sphinx autodoc index for a Python project by scanning its sources")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    Apply {
        #[arg(value_name = "DIR")]
        project_root: PathBuf,

        #[arg(value_name = "FILE")]
        index_file: PathBuf,

        #[arg(value_name = "PREFIX")]
        prefixes: Vec<String>,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    Render {
        #[arg(value_name = "DIR")]
        project_root: PathBuf,

        #[arg(value_name = "PREFIX")]
        prefixes: Vec<String>,

        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    Check {
        #[arg(value_name = "DIR")]
        project_root: PathBuf,

        #[arg(value_name = "FILE")]
        index_file: PathBuf,

        #[arg(value_name = "PREFIX")]
        prefixes: Vec<String>,
    },
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
