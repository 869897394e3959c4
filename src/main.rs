use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use clap::Parser;

use civicfinder::checkpoint::{generate_settings_hash, Checkpoint, ResumeMode};
use civicfinder::cli::Cli;
use civicfinder::config::{AppConfig, ConfigError};
use civicfinder::entity::{parse_seed_file, ResolutionStatus};
use civicfinder::export;
use civicfinder::logger::{RunLogger, VerbosityLevel};
use civicfinder::pipeline::Pipeline;

/// Set by the Ctrl-C handler; the main loop checks it between entities
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Err(message) = cli.validate() {
        anyhow::bail!(message);
    }

    if cli.init {
        let path = AppConfig::create_default_config()?;
        println!("Created default configuration at {}", path.display());
        println!("Review it, then run: civicfinder --input-file <seeds.csv>");
        return Ok(());
    }

    let mut config = load_or_create_config()?;

    if let Some(delay) = cli.delay {
        config.crawl.request_delay_secs = delay;
    }
    if let Some(timeout) = cli.timeout {
        config.http.request_timeout_secs = timeout;
    }
    config.validate()?;

    let logger = RunLogger::new(VerbosityLevel::from_verbose_count(cli.verbose));

    if config.crawl.request_delay_secs < 2 {
        logger.warn(&format!(
            "request delay of {}s is below the recommended 2s; government sites may block the run",
            config.crawl.request_delay_secs
        ));
    }

    let input_file = cli
        .input_file
        .as_deref()
        .context("an input file is required")?;

    let mut entities = parse_seed_file(Path::new(input_file))?;
    if let Some(max) = cli.max_entities {
        entities.truncate(max);
    }
    if entities.is_empty() {
        logger.warn("seed file contains no entities; reports will be empty");
    }

    let output_dir = cli.get_output_dir();
    fs::create_dir_all(&output_dir).context(format!(
        "Failed to create output directory {}",
        output_dir.display()
    ))?;

    let settings_hash = generate_settings_hash(
        config.crawl.request_delay_secs,
        config.http.request_timeout_secs,
        config.crawl.max_links_per_site,
        input_file,
    );

    let mut checkpoint =
        resolve_checkpoint(cli.get_resume_mode(), settings_hash, &output_dir, &logger)?;

    ctrlc::set_handler(|| INTERRUPTED.store(true, Ordering::SeqCst))
        .context("Failed to install Ctrl-C handler")?;

    let pipeline = Pipeline::new(&config, &logger)?;
    logger.start_progress(entities.len() as u64);

    let mut since_save = 0usize;
    let mut interrupted = false;

    for entity in &entities {
        if INTERRUPTED.load(Ordering::SeqCst) {
            interrupted = true;
            break;
        }
        if checkpoint.is_completed(&entity.id()) {
            logger.advance_progress();
            continue;
        }

        logger.set_progress_message(entity.name.clone());
        let outcome = pipeline.process_entity(entity).await;

        match outcome.result.status {
            ResolutionStatus::Found => logger.record_found(),
            ResolutionStatus::Partial => logger.record_partial(),
            ResolutionStatus::Unresolved => logger.record_unresolved(),
        }
        logger.record_extraction(
            outcome.result.department_pages.len(),
            outcome.result.emails.len(),
            outcome.result.contacts.len(),
        );

        checkpoint.record_entity(outcome.result, outcome.manual);
        logger.advance_progress();

        since_save += 1;
        if since_save >= config.crawl.checkpoint_interval {
            // Checkpoint failures are fatal: continuing would silently
            // forfeit resumability
            checkpoint.save().context("Failed to save checkpoint")?;
            logger.log_checkpoint_saved(checkpoint.completed_count());
            since_save = 0;
        }
    }

    logger.finish_progress();

    if interrupted {
        checkpoint.save().context("Failed to save checkpoint")?;
        logger.info(&format!(
            "Interrupted after {} entities; progress saved. Re-run with --resume to continue.",
            checkpoint.completed_count()
        ));
        return Ok(());
    }

    let results = checkpoint.results_in_order();
    if cli.output_format == "json" {
        let path = export::export_json(&results, &checkpoint.manual_items, &output_dir)?;
        logger.info(&format!("Report written to {}", path.display()));
    } else {
        let (results_path, manual_path) =
            export::export_csv(&results, &checkpoint.manual_items, &output_dir)?;
        logger.info(&format!("Results written to {}", results_path.display()));
        logger.info(&format!(
            "Manual-research list written to {}",
            manual_path.display()
        ));
    }

    Checkpoint::delete(&output_dir)?;
    logger.print_final_summary();
    Ok(())
}

fn load_or_create_config() -> anyhow::Result<AppConfig> {
    match AppConfig::load() {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(path)) => {
            eprintln!("Configuration file not found at {}", path.display());
            match AppConfig::prompt_create_config()? {
                Some(created) => {
                    println!("Created default configuration at {}", created.display());
                    Ok(AppConfig::load()?)
                }
                None => anyhow::bail!(
                    "a configuration file is required; run with --init to create one"
                ),
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// Decide whether to resume an existing checkpoint, start fresh, or ask
fn resolve_checkpoint(
    mode: ResumeMode,
    settings_hash: u64,
    output_dir: &Path,
    logger: &RunLogger,
) -> anyhow::Result<Checkpoint> {
    if !Checkpoint::exists(output_dir) {
        return Ok(Checkpoint::new(settings_hash, output_dir));
    }

    match mode {
        ResumeMode::Fresh => Ok(Checkpoint::new(settings_hash, output_dir)),
        ResumeMode::AutoResume => {
            let checkpoint = Checkpoint::load(output_dir)?;
            if !checkpoint.is_compatible(settings_hash) {
                anyhow::bail!(
                    "existing checkpoint was created with different settings; \
                     use --no-resume to discard it"
                );
            }
            logger.info(&format!("Resuming previous run: {}", checkpoint));
            Ok(checkpoint)
        }
        ResumeMode::Prompt => {
            if !AppConfig::is_interactive() {
                return Ok(Checkpoint::new(settings_hash, output_dir));
            }

            let checkpoint = match Checkpoint::load(output_dir) {
                Ok(cp) => cp,
                Err(e) => {
                    logger.warn(&format!("ignoring unreadable checkpoint: {}", e));
                    return Ok(Checkpoint::new(settings_hash, output_dir));
                }
            };
            if !checkpoint.is_compatible(settings_hash) {
                logger.warn("existing checkpoint has different settings; starting fresh");
                return Ok(Checkpoint::new(settings_hash, output_dir));
            }

            print!("Found previous run ({}). Resume? [Y/n] ", checkpoint);
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            let input = input.trim().to_lowercase();

            if input.is_empty() || input == "y" || input == "yes" {
                logger.info("Resuming previous run");
                Ok(checkpoint)
            } else {
                Ok(Checkpoint::new(settings_hash, output_dir))
            }
        }
    }
}
