use std::path::PathBuf;
use std::process::ExitCode;

use castep_h5md::convert::{md_to_h5md, ConvertOptions};
use castep_h5md::h5md::Author;
use castep_h5md::units::UnitSystem;
use clap::Parser;

fn unit_system_parser(name: &str) -> Result<UnitSystem, String> {
    name.parse().map_err(|err: castep_h5md::CError| err.to_string())
}

/// Convert a CASTEP .md file to .h5md format.
///
/// See https://www.nongnu.org/h5md/ for more info on h5md.
#[derive(Parser)]
#[command(name = "md_to_h5md", version)]
struct Args {
    /// .md file to parse.
    source: PathBuf,

    /// File to write output.
    #[arg(short, long)]
    output: PathBuf,

    /// Author for metadata.
    #[arg(short, long, default_value = "Unknown")]
    author: String,

    /// Email for metadata.
    #[arg(short, long, default_value = "Unknown")]
    email: String,

    /// Unit system for output values (MDANALYSIS, CASTEP or ELECTRONIC).
    #[arg(short, long, default_value = "MDANALYSIS", value_parser = unit_system_parser)]
    units: UnitSystem,
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let options = ConvertOptions {
        author: Author {
            name: args.author,
            email: args.email,
        },
        units: args.units,
    };

    match md_to_h5md(&args.source, &args.output, &options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("md_to_h5md: {err}");
            ExitCode::FAILURE
        }
    }
}
