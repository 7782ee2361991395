//! dump-carve CLI
//!
//! Command-line front end for carving game assets out of an Xbox 360 or
//! Windows minidump capture.

use clap::Parser;
use dump_carver::{carve_dump, CarveOptions};
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;

/// Recovers embedded game assets from a minidump capture.
///
/// Scans the dump for known asset signatures, validates and sizes each
/// candidate, and writes recovered files plus a `manifest.json` under the
/// output directory.
#[derive(Parser, Debug)]
#[command(name = "dump-carve")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Minidump file to carve.
    input: PathBuf,

    /// Output directory for recovered assets and the manifest.
    #[arg(short, long, default_value = "carved")]
    output: PathBuf,

    /// Restrict carving to these file-type ids (comma-separated, e.g. `dds,png`).
    #[arg(long, value_delimiter = ',')]
    types: Vec<String>,

    /// Convert recovered Xbox DDX textures to DDS.
    #[arg(long, default_value = "true")]
    convert_ddx: bool,

    /// Maximum files to recover per file type.
    #[arg(long, default_value_t = dump_carver::config::DEFAULT_MAX_FILES_PER_TYPE)]
    max_files: usize,

    /// Verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("dump_carver=debug")
            .init();
    }

    let mut options = CarveOptions::new(args.output.clone())
        .with_convert_ddx(args.convert_ddx)
        .with_max_files_per_type(args.max_files)
        .with_verbose(args.verbose);

    if !args.types.is_empty() {
        let types: HashSet<String> = args.types.into_iter().collect();
        options = options.with_type_filter(types);
    }

    match carve_dump(&args.input, &options) {
        Ok(entries) => {
            println!(
                "carved {} asset(s) from {} into {}",
                entries.len(),
                args.input.display(),
                args.output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error carving {}: {}", args.input.display(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing_defaults() {
        let args = Args::try_parse_from(["dump-carve", "crash.dmp"]).unwrap();
        assert_eq!(args.input, PathBuf::from("crash.dmp"));
        assert_eq!(args.output, PathBuf::from("carved"));
        assert!(args.types.is_empty());
        assert!(args.convert_ddx);
    }

    #[test]
    fn test_args_parsing_type_filter() {
        let args = Args::try_parse_from(["dump-carve", "-o", "out", "--types", "dds,png", "crash.dmp"]).unwrap();
        assert_eq!(args.types, vec!["dds".to_string(), "png".to_string()]);
        assert_eq!(args.output, PathBuf::from("out"));
    }
}
