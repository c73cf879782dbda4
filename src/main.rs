use clap::Parser;
use orgafold::cli::{Cli, read_inputs, run};
use orgafold::output::OutputFormatter;
use std::io::{self, IsTerminal};
use std::process;

fn main() {
    let mut cli = Cli::parse();
    init_logging(cli.verbose);

    // Read input paths from e.g. `find` output when none are given.
    if cli.inputs.is_empty() {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            eprintln!("No input. See --help");
            process::exit(2);
        }
        match read_inputs(stdin.lock()) {
            Ok(inputs) => cli.inputs = inputs,
            Err(e) => {
                OutputFormatter::error(&format!("Cannot read input paths: {}", e));
                process::exit(2);
            }
        }
        if cli.inputs.is_empty() {
            eprintln!("No input. See --help");
            process::exit(2);
        }
    }

    let options = match cli.load_options() {
        Ok(options) => options,
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            process::exit(2);
        }
    };

    match run(&options) {
        Ok(summary) => process::exit(summary.exit_code()),
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            process::exit(2);
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
