//! Command execution.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use transcoda_core::batch::expand_inputs;
use transcoda_core::{
    BatchOrchestrator, BatchReport, Bitrate, Config, Encoder, FfmpegEncoder, Preferences,
    SettingsStore,
};

use crate::cli::{ConvertArgs, SetArgs};
use crate::console::ConsoleSink;

/// Exit status when every file converted.
const EXIT_SUCCESS: u8 = 0;

/// Exit status when some files failed.
const EXIT_PARTIAL_FAILURE: u8 = 2;

/// Exit status after Ctrl-C (128 + SIGINT).
const EXIT_CANCELLED: u8 = 130;

/// Runs a batch and prints its report.
pub async fn execute_convert(config: &Config, args: ConvertArgs) -> Result<ExitCode> {
    let store = SettingsStore::new(&config.settings.path);
    let preferences = store.load();

    let output_dir: PathBuf = match (&args.output_dir, preferences.output_directory()) {
        (Some(dir), _) => dir.clone(),
        (None, Some(dir)) => dir.to_path_buf(),
        (None, None) => bail!(
            "Output directory not selected: pass --output-dir or set one with `transcoda settings set --output-dir`"
        ),
    };

    let bitrate = match args.bitrate {
        Some(bitrate) => bitrate,
        None => Bitrate::parse(&preferences.bitrate).unwrap_or_else(|e| {
            warn!(stored = %preferences.bitrate, error = %e, "Stored bitrate is invalid, using default");
            Bitrate::default()
        }),
    };

    let mut batch_config = config.batch.clone();
    if let Some(workers) = args.workers {
        batch_config = batch_config.with_max_workers(workers.get());
    }
    if let Some(format) = args.format {
        batch_config = batch_config.with_target_format(format);
    }
    if let Some(timeout) = args.timeout {
        batch_config = batch_config.with_task_timeout(timeout);
    }

    let inputs = expand_inputs(&args.inputs, &batch_config.input_extensions)
        .await
        .context("Failed to read input directory")?;

    if args.remember {
        store.save(&Preferences {
            output_directory: output_dir.display().to_string(),
            bitrate: bitrate.as_str().to_string(),
        });
    }

    let encoder = FfmpegEncoder::new(config.encoder.clone());
    if !inputs.is_empty() {
        tokio::fs::create_dir_all(&output_dir)
            .await
            .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

        // Every file would fail with the encoder's own diagnostic, so only warn.
        if let Err(e) = encoder.validate().await {
            warn!(error = %e, "Encoder is not usable");
        }
    }

    if !bitrate.is_preset() {
        info!(bitrate = %bitrate, presets = ?Bitrate::PRESETS, "Using a custom bitrate");
    }

    let orchestrator = BatchOrchestrator::new(batch_config, encoder);
    info!(
        files = inputs.len(),
        output_dir = %output_dir.display(),
        bitrate = %bitrate,
        format = %orchestrator.config().target_format,
        workers = orchestrator.config().worker_count(),
        "Converting"
    );

    let cancel = orchestrator.cancellation_token();
    let interrupt = tokio::spawn(watch_interrupts(cancel.clone()));

    let mut sink = ConsoleSink::stderr();
    let report = orchestrator
        .run_batch(&inputs, &output_dir, &bitrate, &mut sink)
        .await;
    interrupt.abort();
    let report = report.context("Batch could not run")?;

    print_report(&report, args.json)?;
    Ok(ExitCode::from(exit_status(&report, cancel.is_cancelled())))
}

/// First Ctrl-C cancels the batch; a second one exits at once.
async fn watch_interrupts(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    warn!("Interrupted, finishing running conversions and skipping the rest (Ctrl-C again to quit)");
    cancel.cancel();

    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("Interrupted again, exiting without waiting for running conversions");
        std::process::exit(i32::from(EXIT_CANCELLED));
    }
}

fn print_report(report: &BatchReport, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        println!("{}", text);
    } else {
        println!("{}", report);
    }
    Ok(())
}

/// `interrupted` covers a Ctrl-C that came after every file had started.
fn exit_status(report: &BatchReport, interrupted: bool) -> u8 {
    if interrupted || report.cancelled {
        EXIT_CANCELLED
    } else if report.all_succeeded() {
        EXIT_SUCCESS
    } else {
        EXIT_PARTIAL_FAILURE
    }
}

/// Prints the remembered preferences.
pub fn execute_settings_show(config: &Config, json: bool) -> Result<ExitCode> {
    let store = SettingsStore::new(&config.settings.path);
    let preferences = store.load();

    if json {
        let text =
            serde_json::to_string_pretty(&preferences).context("Failed to serialize settings")?;
        println!("{}", text);
    } else {
        println!("Settings file: {}", store.path().display());
        println!(
            "Output directory: {}",
            preferences
                .output_directory()
                .map(|dir| dir.display().to_string())
                .unwrap_or_else(|| "(not set)".to_string())
        );
        println!("Bitrate: {}", preferences.bitrate);
        println!("Bitrate presets: {}", Bitrate::PRESETS.join(", "));
    }
    Ok(ExitCode::SUCCESS)
}

/// Updates the remembered preferences.
pub fn execute_settings_set(config: &Config, args: SetArgs) -> Result<ExitCode> {
    if args.output_dir.is_none() && args.bitrate.is_none() {
        bail!("Nothing to set: pass --output-dir and/or --bitrate");
    }

    let store = SettingsStore::new(&config.settings.path);
    let mut preferences = store.load();

    if let Some(dir) = args.output_dir {
        preferences.output_directory = dir.display().to_string();
    }
    if let Some(bitrate) = args.bitrate {
        preferences.bitrate = bitrate.as_str().to_string();
    }

    store
        .try_save(&preferences)
        .context("Failed to save settings")?;
    println!("Settings saved to {}", store.path().display());
    Ok(ExitCode::SUCCESS)
}
