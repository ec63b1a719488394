mod cli;

use avmerge::{
    config::{self, Config},
    matcher::{self, MatchPair, MatchResult},
    merge::{BatchReport, BatchRun, MergeSettings},
    scanner::{self, ScanResult},
    state::{progress_text, BatchEvent},
};

use anyhow::{Context, Result};
use avmerge_common::{JobState, MatchKind};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::error::RecvError;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "avmerge=debug,avmerge_av=debug,avmerge_common=debug".to_string()
        } else {
            "avmerge=info,avmerge_av=info".to_string()
        }
    });

    // Logs go to stderr so `match --json` output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Scan { dir, recursive } => {
            let config = config::load_config_or_default(config_path)?;
            scan_dir(&config, dir, recursive)
        }
        Commands::Match {
            dir,
            recursive,
            threshold,
            json,
        } => {
            let mut config = config::load_config_or_default(config_path)?;
            if let Some(threshold) = threshold {
                config.matching.threshold = threshold;
            }
            config::validate_config(&config)?;
            match_dir(&config, dir, recursive, json)
        }
        Commands::Merge {
            dir,
            recursive,
            output,
            suffix,
            threshold,
            workers,
            overwrite,
            tool,
            dry_run,
            save,
        } => {
            let mut config = if save {
                config::load_config_or_default_for_save(config_path)?
            } else {
                config::load_config_or_default(config_path)?
            };

            // Command line wins over the config file
            if dir.is_some() {
                config.scan.source_dir = dir;
            }
            if recursive {
                config.scan.recursive = true;
            }
            if output.is_some() {
                config.merge.output_dir = output;
            }
            if let Some(suffix) = suffix {
                config.merge.suffix = suffix;
            }
            if let Some(threshold) = threshold {
                config.matching.threshold = threshold;
            }
            if let Some(workers) = workers {
                config.merge.max_workers = workers;
            }
            if overwrite {
                config.merge.overwrite = true;
            }
            if tool.is_some() {
                config.tools.ffmpeg = tool;
            }
            config::validate_config(&config)?;

            if save {
                let path = config_path
                    .map(Path::to_path_buf)
                    .or_else(config::find_default_config)
                    .unwrap_or_else(config::default_save_path);
                config::persist::save_config(&path, &config)?;
                println!("Saved settings to {}", path.display());
            }

            merge_dir(&config, dry_run)
        }
        Commands::CheckTool { path } => {
            let config = config::load_config_or_default(config_path)?;
            check_tool(path, &config)
        }
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("avmerge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Directory given on the command line, else the configured one, else the
/// most promising of the usual download folders.
fn resolve_source_dir(dir: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    if let Some(dir) = dir.or_else(|| config.scan.source_dir.clone()) {
        return Ok(dir);
    }

    let suggested = scanner::suggest_source_dir(&scanner::default_candidate_dirs())
        .context("No directory given and no folder with media files found")?;
    println!("Using {}", suggested.display());
    Ok(suggested)
}

fn scan_source(config: &Config, dir: Option<PathBuf>, recursive: bool) -> Result<ScanResult> {
    let dir = resolve_source_dir(dir, config)?;
    tracing::info!("Scanning {:?}", dir);
    let result = scanner::scan(&dir, recursive || config.scan.recursive)?;
    Ok(result)
}

fn match_source(config: &Config, dir: Option<PathBuf>, recursive: bool) -> Result<MatchResult> {
    let scan = scan_source(config, dir, recursive)?;
    let normalizer = config.normalizer()?;
    Ok(matcher::match_files(
        &scan.videos,
        &scan.audios,
        config.matching.threshold,
        &normalizer,
    ))
}

fn scan_dir(config: &Config, dir: Option<PathBuf>, recursive: bool) -> Result<()> {
    let result = scan_source(config, dir, recursive)?;

    println!("Videos: {}", result.videos.len());
    for video in &result.videos {
        println!("  {} ({})", video.file_name(), format_size(video.size));
    }

    println!("\nAudio: {}", result.audios.len());
    for audio in &result.audios {
        println!("  {} ({})", audio.file_name(), format_size(audio.size));
    }

    Ok(())
}

fn match_dir(config: &Config, dir: Option<PathBuf>, recursive: bool, json: bool) -> Result<()> {
    let result = match_source(config, dir, recursive)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_matches(&result);
    }

    Ok(())
}

fn print_matches(result: &MatchResult) {
    for pair in &result.pairs {
        match pair.kind {
            MatchKind::Exact => println!(
                "✓ {} + {}",
                pair.video.file_name(),
                pair.audio.file_name()
            ),
            MatchKind::Fuzzy => println!(
                "✓ {} + {} ({:.0}% similar)",
                pair.video.file_name(),
                pair.audio.file_name(),
                pair.score * 100.0
            ),
        }
    }
    for video in &result.unmatched_videos {
        println!("✗ {} (no matching audio)", video.file_name());
    }
    for audio in &result.unmatched_audios {
        println!("  unused audio: {}", audio.file_name());
    }

    println!(
        "\nMatched {} of {} videos ({} exact, {} fuzzy)",
        result.pairs.len(),
        result.pairs.len() + result.unmatched_videos.len(),
        result.exact_count(),
        result.fuzzy_count()
    );
}

fn resolve_tool(config: &Config) -> Result<PathBuf> {
    // An explicitly configured path is used as-is; the runner reports it if unusable
    if let Some(path) = &config.tools.ffmpeg {
        return Ok(path.clone());
    }
    avmerge_av::locate_tool("ffmpeg", None)
        .context("ffmpeg not found; install it or pass --tool <PATH>")
}

fn merge_dir(config: &Config, dry_run: bool) -> Result<()> {
    let result = match_source(config, None, false)?;
    print_matches(&result);

    if result.pairs.is_empty() {
        println!("\nNothing to merge.");
        return Ok(());
    }

    if dry_run {
        let tool = resolve_tool(config).unwrap_or_else(|_| PathBuf::from("ffmpeg"));
        let settings = config.merge_settings(tool);
        println!("\n[DRY RUN] Would merge {} pairs:", result.pairs.len());
        for pair in &result.pairs {
            let output = settings.output_path_for(&pair.video);
            let note = if output.exists() && !settings.overwrite {
                " (exists, would skip)"
            } else {
                ""
            };
            println!("  {}{}", output.display(), note);
        }
        return Ok(());
    }

    let settings = config.merge_settings(resolve_tool(config)?);
    println!();

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(run_merge(result.pairs, settings))?;

    print_report(&report);
    if !report.is_success() {
        anyhow::bail!("Merge finished with problems: {}", report.counts);
    }
    Ok(())
}

async fn run_merge(pairs: Vec<MatchPair>, settings: MergeSettings) -> Result<BatchReport> {
    let mut run = BatchRun::new(pairs, settings)?;
    let names: Vec<String> = run.progress().snapshot().iter().map(|j| j.name()).collect();
    let mut events = run.subscribe();

    let printer = tokio::spawn(async move {
        // Last tenth of each job printed, so long merges report every 10%
        let mut shown: Vec<Option<u32>> = vec![None; names.len()];
        loop {
            match events.recv().await {
                Ok(BatchEvent::BatchFinished { .. }) | Err(RecvError::Closed) => break,
                Ok(event) => print_event(&event, &names, &mut shown),
                Err(RecvError::Lagged(n)) => tracing::debug!("Skipped {} progress events", n),
            }
        }
    });

    let cancel = run.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, cancelling merges...");
            cancel.cancel();
        }
    });

    run.start();
    let report = run.wait().await;

    interrupt.abort();
    let _ = printer.await;
    Ok(report)
}

fn print_event(event: &BatchEvent, names: &[String], shown: &mut [Option<u32>]) {
    let name = |index: usize| names.get(index).map(String::as_str).unwrap_or("?");

    match event {
        BatchEvent::JobStarted { index, .. } => {
            println!("[{}/{}] Merging {}", index + 1, names.len(), name(*index));
        }
        BatchEvent::JobProgress {
            index,
            progress,
            elapsed,
            total,
            ..
        } => {
            let tenth = (progress * 10.0).floor() as u32;
            let Some(last) = shown.get_mut(*index) else {
                return;
            };
            if Some(tenth) > *last {
                *last = Some(tenth);
                println!("  {}: {}", name(*index), progress_text(*progress, *elapsed, *total));
            }
        }
        BatchEvent::JobFinished {
            index,
            state,
            error,
            overall,
            ..
        } => {
            let symbol = match state {
                JobState::Succeeded => "✓",
                JobState::Skipped => "-",
                _ => "✗",
            };
            println!(
                "{} {} {} ({:.0}% of batch done)",
                symbol,
                name(*index),
                state,
                overall * 100.0
            );
            if let Some(error) = error {
                println!("    {}", error.lines().next().unwrap_or(""));
            }
        }
        BatchEvent::BatchFinished { .. } => {}
    }
}

fn print_report(report: &BatchReport) {
    println!("\nDone: {}", report.counts);

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!("\nFailed:");
        for job in failures {
            println!("  {}:", job.name());
            for line in job.error.as_deref().unwrap_or("unknown error").lines() {
                println!("    {}", line);
            }
        }
    }
}

fn check_tool(path: Option<PathBuf>, config: &Config) -> Result<()> {
    println!("Checking merge tool...\n");

    let path = match path.or_else(|| config.tools.ffmpeg.clone()) {
        Some(path) => path,
        None => match avmerge_av::locate_tool("ffmpeg", None) {
            Ok(path) => path,
            Err(e) => {
                println!("✗ ffmpeg: {}", e);
                anyhow::bail!("No usable merge tool found");
            }
        },
    };

    if let Err(e) = avmerge_av::validate_executable(&path) {
        println!("✗ {}: {}", path.display(), e);
        anyhow::bail!("Merge tool is not usable");
    }

    let info = avmerge_av::check_tool(&path.to_string_lossy());
    if !info.available {
        println!("✗ {} did not respond to -version", path.display());
        anyhow::bail!("Merge tool is not usable");
    }

    print!("✓ {}", path.display());
    if let Some(ref version) = info.version {
        print!(" ({})", version);
    }
    println!();

    match avmerge_av::locate_tool("ffprobe", config.tools.ffprobe.as_deref()) {
        Ok(probe) => println!("✓ {} (used for durations)", probe.display()),
        Err(_) => println!("- ffprobe not found; durations come from the merge tool"),
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    let describe = |p: &Option<PathBuf>, unset: &str| {
        p.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| unset.to_string())
    };

    println!("  Tool: {}", describe(&config.tools.ffmpeg, "(discovered)"));
    println!("  Source: {}", describe(&config.scan.source_dir, "(not set)"));
    println!(
        "  Output: {}",
        describe(&config.merge.output_dir, "(next to each video)")
    );
    println!("  Suffix: {}", config.merge.suffix);
    println!("  Threshold: {}", config.matching.threshold);
    println!("  Workers: {}", config.merge.max_workers);
    println!("  Overwrite: {}", config.merge.overwrite);

    Ok(())
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
