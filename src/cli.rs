//! Command-line interface definitions

use clap::Parser;
use std::path::PathBuf;

use crate::checkpoint::ResumeMode;

#[derive(Parser, Debug)]
#[command(
    name = "civicfinder",
    about = "Contact discovery for county governments and local civic organizations",
    version
)]
pub struct Cli {
    /// Create the default configuration file and exit
    #[arg(long, global = true)]
    pub init: bool,

    /// Seed file of entities to process (.csv or .json)
    #[arg(short, long)]
    pub input_file: Option<String>,

    /// Output directory for reports (defaults to the Desktop)
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Report format: csv or json
    #[arg(short = 'f', long, default_value = "csv")]
    pub output_format: String,

    /// Process at most this many entities from the seed file
    #[arg(long)]
    pub max_entities: Option<usize>,

    /// Seconds to pause between entities (overrides config)
    #[arg(long)]
    pub delay: Option<u64>,

    /// Per-request timeout in seconds (overrides config)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Increase verbosity (-v detailed, -vv debug)
    #[arg(short, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Resume from an existing checkpoint without prompting
    #[arg(long, conflicts_with = "no_resume")]
    pub resume: bool,

    /// Ignore any existing checkpoint and start fresh
    #[arg(long)]
    pub no_resume: bool,
}

impl Cli {
    /// Validate argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if !self.init && self.input_file.is_none() {
            return Err("an input file is required (use --input-file)".to_string());
        }

        match self.output_format.as_str() {
            "csv" | "json" => {}
            other => {
                return Err(format!(
                    "unsupported output format '{}' (expected csv or json)",
                    other
                ))
            }
        }

        if self.max_entities == Some(0) {
            return Err("--max-entities must be at least 1".to_string());
        }

        Ok(())
    }

    /// Resolve the output directory: explicit flag, else Desktop, else cwd
    pub fn get_output_dir(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::desktop_dir().unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    pub fn get_resume_mode(&self) -> ResumeMode {
        if self.resume {
            ResumeMode::AutoResume
        } else if self.no_resume {
            ResumeMode::Fresh
        } else {
            ResumeMode::Prompt
        }
    }
}
