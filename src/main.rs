use std::path::{Path, PathBuf};

use clap::{Arg, ArgAction, Command as ClapCommand};

use pyflow::error::ConvertError;
use pyflow::{ConvertOptions, ConversionReport, Converter, EmitFormat};

fn main() {
    let matches = ClapCommand::new("pyflow")
        .version("0.1.0")
        .about("Convert simple Python programs into Flowgorithm flowcharts")
        .arg(
            Arg::new("input")
                .help("Input .py file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .help("Output file name, placed inside the output directory")
                .index(2),
        )
        .arg(
            Arg::new("output-dir")
                .short('d')
                .long("output-dir")
                .help("Directory the converted file is written to")
                .default_value("output"),
        )
        .arg(
            Arg::new("emit")
                .long("emit")
                .help("Output format")
                .value_parser(["fprg", "json"])
                .default_value("fprg"),
        )
        .arg(
            Arg::new("authors")
                .long("authors")
                .help("Value of the flowchart's authors attribute"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log translation details")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let default_filter = if matches.get_flag("verbose") { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut options = ConvertOptions::default();
    if let Some(dir) = matches.get_one::<String>("output-dir") {
        options.output_dir = PathBuf::from(dir);
    }
    if matches.get_one::<String>("emit").map(String::as_str) == Some("json") {
        options.emit = EmitFormat::Json;
    }
    if let Some(authors) = matches.get_one::<String>("authors") {
        options.authors = authors.clone();
    }

    // `input` is required, clap exits before reaching here without it
    let input = matches
        .get_one::<String>("input")
        .map(PathBuf::from)
        .unwrap_or_default();
    let output = matches.get_one::<String>("output").map(PathBuf::from);

    match run(options, &input, output.as_deref()) {
        Ok(report) => {
            println!(
                "Successfully converted '{}' to '{}'",
                report.input.display(),
                report.output.display()
            );
            // Each diagnostic has already been logged as it was recorded
            if !report.diagnostics.is_empty() {
                println!("{} diagnostic(s) during conversion", report.diagnostics.len());
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(options: ConvertOptions, input: &Path, output: Option<&Path>) -> Result<ConversionReport, ConvertError> {
    Converter::new(options).convert_file(input, output)
}
