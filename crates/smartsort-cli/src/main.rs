mod commands;
mod logging;
mod progress;

use std::path::Path;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, DuplicateArgs, SortArgs};
use dotenv::dotenv;
use progress::CliReporter;
use smartsort_core::{
    load_configuration, AppConfig, Capabilities, CancellationToken, DuplicateGroup,
    ExifCaptureDateReader, FaceAlbum, Operation, OperationOutput, PlaceMode, ProgressReporter,
    SortSummary, TaskOutcome, TaskRunner,
};
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let result = match args.command {
        Some(Commands::Sort(sort_args)) => run_sort(&config, sort_args),
        Some(Commands::Duplicates(dupe_args)) => run_duplicates(&config, dupe_args),
        Some(Commands::Faces { dir }) => run_faces(&config, &dir),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn runner(config: &AppConfig) -> TaskRunner {
    // No face vector extractor ships with the CLI
    let capabilities =
        Capabilities::default().with_capture_dates(Arc::new(ExifCaptureDateReader));
    TaskRunner::new(capabilities).with_ignore_patterns(config.ignore_patterns.clone())
}

fn execute(config: &AppConfig, dir: &Path, operation: Operation) -> Result<OperationOutput> {
    let label = operation.name();
    let handle = runner(config)
        .start(dir, operation, CancellationToken::new())
        .with_context(|| format!("Could not start {} on {}", label, dir.display()))?;

    let reporter = CliReporter::new(label);
    let outcome = handle.drive(
        |fraction| reporter.on_progress(fraction),
        |line| reporter.on_log(line),
    );
    drop(reporter);

    match outcome {
        TaskOutcome::Completed(output) => Ok(output),
        TaskOutcome::Cancelled(output) => {
            println!("{}", "Cancelled; results are partial.".yellow());
            Ok(output)
        }
        TaskOutcome::Failed(err) => {
            Err(err).with_context(|| format!("{} failed on {}", label, dir.display()))
        }
    }
}

fn run_sort(config: &AppConfig, args: SortArgs) -> Result<()> {
    let mut options = config.sort.clone();
    options.recursive |= args.recursive;
    if args.move_files {
        options.mode = PlaceMode::Move;
    }
    if args.no_date_folders {
        options.group_photos_by_date = false;
    }
    if !args.categories.is_empty() {
        options.enabled_categories = args.categories;
    }

    if let OperationOutput::Sorted(summary) =
        execute(config, &args.dir, Operation::Sort(options))?
    {
        print_sort_summary(&summary);
    }
    Ok(())
}

fn run_duplicates(config: &AppConfig, args: DuplicateArgs) -> Result<()> {
    let mut options = config.duplicates.clone();
    if args.all_files {
        options.images_only = false;
    }
    if args.no_recursive {
        options.recursive = false;
    }

    if let OperationOutput::Duplicates(groups) =
        execute(config, &args.dir, Operation::FindDuplicates(options))?
    {
        print_duplicate_groups(&groups);
    }
    Ok(())
}

fn run_faces(config: &AppConfig, dir: &Path) -> Result<()> {
    let options = config.faces.clone();
    if let OperationOutput::FaceAlbums(albums) =
        execute(config, dir, Operation::BuildFaceAlbums(options))?
    {
        print_face_albums(&albums);
    }
    Ok(())
}

fn print_sort_summary(summary: &SortSummary) {
    println!();
    info!(
        "{} files placed, {} failed",
        format!("{}", summary.placed.len()).green(),
        format!("{}", summary.failed).red(),
    );
}

fn print_duplicate_groups(groups: &[DuplicateGroup]) {
    println!();
    for group in groups {
        println!(
            "{} {} ({} bytes each)",
            "keep".green(),
            group.keep.path.display(),
            group.size
        );
        for file in &group.delete {
            println!("  {} {}", "dup ".red(), file.path.display());
        }
    }
    let wasted: u64 = groups.iter().map(DuplicateGroup::wasted_bytes).sum();
    info!(
        "{} duplicate groups, {} bytes wasted",
        format!("{}", groups.len()).red(),
        format!("{}", wasted).red(),
    );
}

fn print_face_albums(albums: &[FaceAlbum]) {
    println!();
    for album in albums {
        println!("{}: {} photos", album.name.cyan(), album.sources.len());
    }
    info!("{} face albums", format!("{}", albums.len()).cyan());
}
