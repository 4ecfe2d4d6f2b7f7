//! Command-line front end to the ocean data catalog.
//!
//! Lists catalogued sources, loads and summarises them, exports cleaned data
//! to NetCDF, compares a variable of two sources and computes zone masks.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use data_access::{Catalog, ProjectPaths};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "ocean-data")]
#[command(about = "Load, clean and compare ocean model and observation data")]
struct Args {
    /// Data-source catalog directory (default: <project>/conf/data_sources)
    #[arg(long, env = "OCEAN_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs and results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the configured data sources
    Sources,

    /// Load a data source and print its contents
    Show {
        name: String,

        /// Regex selecting files of multi-file sources
        #[arg(long, default_value = "")]
        pattern: String,
    },

    /// Load a data source and write the cleaned data to NetCDF
    Export {
        name: String,
        output: PathBuf,

        #[arg(long, default_value = "")]
        pattern: String,
    },

    /// Compare a variable of a data source against a reference source
    Compare {
        name: String,
        reference: String,

        /// Variable present in both sources
        #[arg(long)]
        variable: String,

        /// rmse, mae, mare, bias or diff_std
        #[arg(long, default_value = "rmse")]
        metric: String,

        /// Dimensions to reduce (default: all)
        #[arg(long, value_delimiter = ',')]
        dims: Vec<String>,

        #[arg(long, default_value = "")]
        pattern: String,
    },

    /// Compute the mask of a zone on the grid of a data source
    Mask {
        zone: String,
        grid_source: String,

        /// Name of the grid in the cache file (default: the source name)
        #[arg(long)]
        grid_name: Option<String>,

        /// Grid placement of the coordinates
        #[arg(long, default_value = "t")]
        placement: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    if args.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    netcdf_parser::silence_hdf5_errors();

    let paths = ProjectPaths::from_env()?;
    let dir = args.config_dir.clone().unwrap_or_else(|| paths.catalog_dir());
    info!(
        project = %paths.project_root().display(),
        catalog = %dir.display(),
        "Loading data-source catalog"
    );
    let catalog = Catalog::load(&dir, paths)?;

    let output = match args.command {
        Command::Sources => commands::sources(&catalog)?,
        Command::Show { name, pattern } => commands::show(&catalog, &name, &pattern)?,
        Command::Export {
            name,
            output,
            pattern,
        } => commands::export(&catalog, &name, &output, &pattern)?,
        Command::Compare {
            name,
            reference,
            variable,
            metric,
            dims,
            pattern,
        } => commands::compare(
            &catalog,
            &commands::CompareRequest {
                name: &name,
                reference: &reference,
                variable: &variable,
                metric: &metric,
                dims: &dims,
                pattern: &pattern,
            },
        )?,
        Command::Mask {
            zone,
            grid_source,
            grid_name,
            placement,
        } => commands::mask(&catalog, &zone, &grid_source, grid_name.as_deref(), &placement)?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", commands::render_text(&output));
    }
    Ok(())
}
