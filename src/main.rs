//! CLI tool for stripping scripts, automatic actions, launch actions and
//! embedded files from PDF documents.
//!
//! The output file is only written if something was removed.

use clap::{ArgAction, Parser};
use pdfscrub::{BatchReport, CleanerConfig, RemovalRecord};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(
    name = "pdfscrub",
    version,
    about = "Remove embedded JavaScript and embedded/attached files from PDF documents",
    long_about = "Reads a PDF file and removes embedded JavaScript, automatic and launch \
                  actions, and embedded/attached files. The output file is only written \
                  if something is removed.\n\n\
                  If INPUT is a folder, every *.pdf file in it is cleaned into the OUTPUT \
                  folder."
)]
struct Cli {
    /// PDF file, or folder of PDF files, to clean
    input: PathBuf,

    /// Output file, or folder when INPUT is a folder. Never overwritten.
    output: PathBuf,

    /// Remove every /A action, not only /Launch actions
    #[arg(long)]
    strip_all_actions: bool,

    /// Append-only log of every processed file
    #[arg(long, env = "PDFSCRUB_LOG_FILE", default_value = "pdfscrub.log")]
    log_file: PathBuf,

    /// Do not write the audit log
    #[arg(long)]
    no_log_file: bool,

    /// Increase diagnostic output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = CleanerConfig {
        strip_all_actions: cli.strip_all_actions,
        audit_log: (!cli.no_log_file).then(|| cli.log_file.clone()),
    };

    let mut print_record = |record: &RemovalRecord| println!("{record}");

    match pdfscrub::run(&cli.input, &cli.output, &config, &mut print_record) {
        Ok(report) => {
            print_summary(&report);
            process::exit(report.exit_code());
        }
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn print_summary(report: &BatchReport) {
    for outcome in &report.processed {
        if outcome.written {
            println!(
                "✅ {} -> {} ({} item(s) removed)",
                outcome.input.display(),
                outcome.output.display(),
                outcome.result.len()
            );
        } else {
            println!("ℹ️  {}: nothing to clean", outcome.input.display());
        }
    }

    for failure in &report.failed {
        eprintln!("❌ {}: {}", failure.input.display(), failure.error);
    }
}
