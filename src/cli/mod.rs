//! # CLI Module
//!
//! Command-line interface for the glitch race.
//!
//! ## Usage
//! ```bash
//! # Race every CPU for the smallest hash (Ctrl-C to finish)
//! glitch-race -f ~/Pictures/cat.jpg
//!
//! # Smaller batches, signed
//! glitch-race -f cat.jpg -i 100 -n alice
//!
//! # One batch, written as cat-glitch.jpg
//! glitch-race -f cat.jpg --check
//! ```

use clap::Parser;
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use jpeg_glitch_race::core::race::{default_workers, Race};
use jpeg_glitch_race::error::{GlitchError, Result};
use jpeg_glitch_race::events::{event_channel, Event, RaceSummary};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

/// Glitch a JPEG while racing for the smallest hash
#[derive(Parser, Debug)]
#[command(name = "glitch-race")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Image path
    #[arg(short, long)]
    file: PathBuf,

    /// Maximum glitch iterations until reset
    #[arg(short, long, default_value_t = 500)]
    iterations: usize,

    /// Name to associate with the work
    #[arg(short, long)]
    name: Option<String>,

    /// Run one round of maximum iterations
    #[arg(short, long)]
    check: bool,

    /// Number of workers (defaults to one per CPU)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    jpeg_glitch_race::init_tracing(cli.verbose);

    let mut builder = Race::builder()
        .source(cli.file)
        .iterations(cli.iterations)
        .workers(cli.workers.unwrap_or_else(default_workers))
        .check(cli.check);
    if let Some(name) = cli.name {
        builder = builder.label(name);
    }
    if let Some(seed) = cli.seed {
        builder = builder.seed(seed);
    }
    let race = builder.build()?;

    let stop = race.stop_handle();
    ctrlc::set_handler(move || stop.request_stop())
        .map_err(|e| GlitchError::Config(format!("cannot install Ctrl-C handler: {e}")))?;

    let term = Term::stderr();
    let spinner = if cli.check || !term.is_term() {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {elapsed} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("racing");
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    };

    let (sender, receiver) = event_channel();
    let spinner_clone = spinner.clone();
    let verbose = cli.verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Started { workers, from, to } => {
                    let line = format!(
                        "{} workers racing over {} scan bytes",
                        style(workers).cyan(),
                        to - from
                    );
                    emit(&spinner_clone, &line);
                }
                Event::NewBest { worker, hash } => {
                    let line = if verbose {
                        format!("{} {}", hash, style(format!("(worker {worker})")).dim())
                    } else {
                        hash.to_string()
                    };
                    emit(&spinner_clone, &line);
                }
                Event::WorkerClosed { worker, count } if verbose => {
                    emit(
                        &spinner_clone,
                        &format!("{}", style(format!("worker {worker} closed after {count}")).dim()),
                    );
                }
                Event::Stopping => {
                    if let Some(ref pb) = spinner_clone {
                        pb.set_message("stopping");
                    }
                    emit(&spinner_clone, "Stopping...");
                }
                Event::WorkerFailed { worker, message } => {
                    emit(
                        &spinner_clone,
                        &format!("{} worker {worker}: {message}", style("✗").red().bold()),
                    );
                }
                Event::Completed { .. } => {
                    if let Some(ref pb) = spinner_clone {
                        pb.finish_and_clear();
                    }
                }
                _ => {}
            }
        }
    });

    let result = race.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let summary = result?;
    print_summary(&summary);
    Ok(())
}

/// Print above the spinner when there is one
fn emit(spinner: &Option<ProgressBar>, line: &str) {
    match spinner {
        Some(pb) => pb.println(line),
        None => println!("{line}"),
    }
}

fn print_summary(summary: &RaceSummary) {
    if let Some(ref output) = summary.output {
        println!("saved: {}", output.display());
        println!("hash: {}", summary.best);
        return;
    }

    println!("duration: {}s", summary.duration_secs());
    println!("iterations: {}", summary.mutations);
    println!("hash: {}", summary.best);
    println!("{}", style("Done!").green().bold());
}
