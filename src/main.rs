use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use roster_splitter::logging::init_logging;
use roster_splitter::{split, Config, FilterSpec, SplitReport, SplitRequest};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn cli() -> Command {
    Command::new("roster-splitter")
        .version("0.1.0")
        .about("Splits a roster CSV into one file per class, applying filters if any")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("roster.toml")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v debug, -vv trace)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("split")
                .about("Create one roster file per class")
                .arg(
                    Arg::new("source")
                        .value_name("SOURCE")
                        .help("Roster CSV export")
                        .required(true),
                )
                .arg(
                    Arg::new("destination")
                        .value_name("DEST")
                        .help("Directory that receives the Classes_<timestamp> folder"),
                )
                .arg(
                    Arg::new("filter")
                        .short('f')
                        .long("filter")
                        .value_name("LABEL")
                        .help("Tuition group to keep, or BOSP for cross-program students")
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(Command::new("filters").about("List the selectable filter labels"))
        .subcommand(Command::new("init").about("Write the default configuration file"))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let matches = cli().get_matches();
    init_logging(matches.get_count("verbose"));

    let config_file = PathBuf::from(
        matches
            .get_one::<String>("config")
            .map(String::as_str)
            .unwrap_or("roster.toml"),
    );

    match matches.subcommand() {
        Some(("init", _)) => {
            Config::default()
                .save_to_file(&config_file)
                .with_context(|| format!("Failed to write config: {}", config_file.display()))?;
            println!("📝 Default configuration written to {}", config_file.display());
            Ok(ExitCode::SUCCESS)
        }
        Some(("filters", _)) => {
            let config = Config::load_or_default(&config_file)?;
            for option in &config.filter_options {
                println!("{}", option);
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(("split", args)) => run_split(args, &config_file).await,
        _ => unreachable!("subcommand is required"),
    }
}

async fn run_split(args: &ArgMatches, config_file: &Path) -> Result<ExitCode> {
    let config = Config::load_or_default(config_file)?;

    let source = PathBuf::from(
        args.get_one::<String>("source")
            .context("SOURCE is required")?,
    );
    let destination = args
        .get_one::<String>("destination")
        .cloned()
        .or_else(|| config.output_directory.clone())
        .map(PathBuf::from)
        .context("No destination given and no output_directory configured")?;

    let selected: Vec<String> = args
        .get_many::<String>("filter")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let filter =
        FilterSpec::from_selection(&selected, &config.filter_options, config.strict_filters)?;

    println!("📂 Operating on file {}", source.display());
    if filter.is_empty() {
        println!("🎯 Filtering by: nothing (all students)");
    } else {
        println!("🎯 Filtering by: {}", selected.join(", "));
    }

    let report = split(SplitRequest {
        source,
        destination,
        filter,
        workers: config.workers,
    })
    .await?;

    print_summary(&report);
    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_summary(report: &SplitReport) {
    println!("\n📁 Classes folder: {}", report.directory.display());
    println!(
        "📊 {} classes processed, {} files written",
        report.class_count,
        report.files_written()
    );

    for outcome in &report.outcomes {
        let mut line = format!("   ✅ {}: {} students", outcome.class_id, outcome.rows_written);
        if outcome.duplicates_dropped > 0 {
            line.push_str(&format!(", {} duplicate rows removed", outcome.duplicates_dropped));
        }
        println!("{}", line);
    }

    for failure in &report.failures {
        println!("   ❌ {}: {}", failure.class_id, failure.error);
    }

    if !report.malformed_rows.is_empty() {
        println!("\n⚠️  {} rows skipped:", report.malformed_rows.len());
        for issue in &report.malformed_rows {
            match &issue.class_id {
                Some(class_id) => {
                    println!("   line {} ({}): {}", issue.line, class_id, issue.reason)
                }
                None => println!("   line {}: {}", issue.line, issue.reason),
            }
        }
    }

    if report.is_clean() {
        println!("\n✅ Complete!");
    } else {
        println!("\n❌ Completed with {} failed classes", report.failures.len());
    }
}
