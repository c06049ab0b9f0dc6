use anyhow::Result;
use clap::Parser;
use log::debug;
use std::path::PathBuf;

use training_mix::client::SubsonicClient;
use training_mix::config::load_config;
use training_mix::training::{
    SelectionSummary, TrainingExport, TrainingRunner, TrainingSettings, human_readable_time,
    training_listing,
};

#[derive(Parser)]
#[command(name = "training-mix")]
#[command(about = "Picks songs from an OpenSubsonic library for a training session")]
#[command(version)]
struct Args {
    /// Name of the training to run
    training: Option<String>,

    /// Extra query elements (`bpm:150..170`, `genre:rock`, ...)
    query: Vec<String>,

    /// Path to the training configuration JSON file
    #[arg(short = 'c', long = "config", default_value = "trainings.json")]
    config_file: PathBuf,

    /// List the configured trainings
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// Only print the number of songs matching the training
    #[arg(long = "count")]
    count: bool,

    /// Show what would be exported without touching the target or the server
    #[arg(short = 'd', long = "dry-run")]
    dry_run: bool,

    /// Quiet mode - do not print the selected songs
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Number of random songs fetched from the library as candidates
    #[arg(long = "pool-size", default_value_t = 2000)]
    pool_size: u32,
}

fn print_summary(summary: &SelectionSummary) {
    println!("Available songs: {}", summary.available_songs);
    println!("Selected songs: {}", summary.selected_songs);
    println!(
        "Planned training duration: {}",
        human_readable_time(summary.planned_duration)
    );
    println!(
        "Total song duration: {}",
        human_readable_time(summary.total_duration)
    );

    let difference = summary.difference();
    let sign = if difference < 0.0 { "-" } else { "+" };
    println!(
        "Difference: {sign}{} (target {})",
        human_readable_time(difference.abs()),
        if summary.reached_target() {
            "reached"
        } else {
            "not reached"
        }
    );
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if !args.config_file.exists() {
        eprintln!(
            "Error: Training configuration file '{}' not found.",
            args.config_file.display()
        );
        eprintln!("Please ensure the file exists or specify a different file with --config.");
        return Err(anyhow::anyhow!(
            "Configuration file '{}' not found",
            args.config_file.display()
        ));
    }

    let settings = TrainingSettings::load_from_file(&args.config_file)?;

    let training_name = match (&args.training, args.list) {
        (Some(name), false) => name.clone(),
        _ => {
            for line in training_listing(&settings) {
                println!("{line}");
            }
            return Ok(());
        }
    };

    let training = settings.resolve_training(&training_name)?;
    let runner = TrainingRunner::new(training);

    let config = load_config()?;
    let client = SubsonicClient::new(config);

    println!("Testing API connection...");
    match client.ping() {
        Ok(_) => println!("✓ API connection successful"),
        Err(e) => {
            eprintln!("✗ API connection failed: {e}");
            return Err(e);
        }
    }

    println!("\nFetching songs for training '{training_name}'...");
    let songs = client.fetch_songs(Some(args.pool_size))?;
    println!("Fetched {} songs total.", songs.len());

    let query = runner.query(&args.query);
    debug!("Query keys: {:?}", query.keys());
    let pool = query.filter(songs);

    if args.count {
        println!("Number of songs available: {}", pool.len());
        return Ok(());
    }

    if pool.is_empty() {
        println!("There are no songs in your library that match this training!");
        return Ok(());
    }

    let target = settings.resolve_target(runner.training())?;
    let destination = target.destination_path()?;
    debug!("Export destination: {}", destination.display());

    let selection = match runner.select(pool, &mut rand::thread_rng()) {
        Ok(selection) => selection,
        Err(e) => {
            eprintln!("✗ Cannot build a selection for '{training_name}': {e}");
            return Ok(());
        }
    };

    println!("\n=== TRAINING: {training_name} ===");
    print_summary(&selection.summary);

    if !args.quiet {
        println!("\nSelected songs:");
        for (i, ranked) in selection.songs.iter().enumerate() {
            let song = &ranked.song;
            println!(
                "  {}. \"{}\" by {} [{}] ({}) score: {:.3}",
                i + 1,
                song.title,
                song.artist,
                song.album,
                human_readable_time(song.length().unwrap_or(0.0)),
                ranked.ordering_score
            );
        }
    }

    if args.dry_run {
        println!("\nDRY RUN: nothing is copied, deleted or scrobbled.");
    }

    let report = TrainingExport::new(&training_name, &target, &client)
        .increment_play_count(runner.training().increment_play_count)
        .dry_run(args.dry_run)
        .export(&selection.songs)?;

    if !report.failed.is_empty() {
        eprintln!("✗ {} songs could not be copied.", report.failed.len());
    }
    if let Some(playlist) = &report.playlist {
        println!("Playlist written: {}", playlist.display());
    }

    println!("Run!");
    Ok(())
}
