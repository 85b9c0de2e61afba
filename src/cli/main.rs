//! obs2ebird command line
//!
//! Import observation.org CSV exports into the configured database, then
//! export a date range as an eBird record-format CSV.

mod error;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use error::CliError;
use obs2ebird::{AppConfig, Obs2Ebird};

/// Convert observation.org exports to eBird checklists
#[derive(Parser, Debug)]
#[command(name = "obs2ebird", version, about)]
#[command(group = clap::ArgGroup::new("action").required(true).multiple(true))]
struct Cli {
    /// CSV files or glob patterns to import, comma separated
    #[arg(short = 'i', long = "import-obs", group = "action")]
    import_obs: Option<String>,

    /// Folder holding the CSV files named by --import-obs
    #[arg(short = 'd', long, default_value = ".")]
    folder: PathBuf,

    /// eBird CSV file to write
    #[arg(
        short = 'o',
        long = "ebird-output-file",
        group = "action",
        requires = "from_date"
    )]
    ebird_output_file: Option<PathBuf>,

    /// First date to export (yyyy-mm-dd)
    #[arg(short = 'f', long = "from-date")]
    from_date: Option<String>,

    /// Last date to export (yyyy-mm-dd), inclusive; open ended when omitted
    #[arg(short = 't', long = "to-date", requires = "ebird_output_file")]
    to_date: Option<String>,

    /// Configuration file [default: ~/.config/o2eb.yml]
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Log debug details
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::default_path()?,
    };
    let config = AppConfig::load_or_create(&config_path)?;
    tracing::debug!("Using configuration {}", config_path.display());
    let app = Obs2Ebird::from_config(config);

    if let Some(patterns) = &cli.import_obs {
        if !cli.folder.is_dir() {
            return Err(CliError::FolderNotFound(cli.folder.clone()));
        }
        let stats = app.import_obs(patterns, &cli.folder)?;
        println!(
            "Imported {} observations from {} files in {:.2?}",
            stats.records_imported, stats.files_processed, stats.duration
        );
    }

    if let (Some(output), Some(from)) = (&cli.ebird_output_file, &cli.from_date) {
        let stats = app.export_to_ebird(output, from, cli.to_date.as_deref())?;
        println!(
            "Exported {} visits ({} species, {} observations) to {}",
            stats.visits,
            stats.species,
            stats.observations,
            output.display()
        );
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    run(&cli).map_err(|e| anyhow::anyhow!(e.user_message()))
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
    fn test_export_requires_from_date() {
        let result = Cli::try_parse_from(["obs2ebird", "-o", "out.csv"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_requires_an_action() {
        assert!(Cli::try_parse_from(["obs2ebird", "-v"]).is_err());
    }

    #[test]
    fn test_import_and_export_flags() {
        let cli = Cli::try_parse_from([
            "obs2ebird",
            "-i",
            "may.csv,june.csv",
            "-d",
            "/data",
            "-o",
            "ebird.csv",
            "-f",
            "2024-05-01",
            "-t",
            "2024-05-31",
        ])
        .unwrap();

        assert_eq!(cli.import_obs.as_deref(), Some("may.csv,june.csv"));
        assert_eq!(cli.folder, PathBuf::from("/data"));
        assert_eq!(cli.ebird_output_file, Some(PathBuf::from("ebird.csv")));
        assert_eq!(cli.from_date.as_deref(), Some("2024-05-01"));
        assert_eq!(cli.to_date.as_deref(), Some("2024-05-31"));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_folder_defaults_to_current_directory() {
        let cli = Cli::try_parse_from(["obs2ebird", "-i", "*.csv"]).unwrap();
        assert_eq!(cli.folder, PathBuf::from("."));
        assert!(!cli.verbose);
    }
}
