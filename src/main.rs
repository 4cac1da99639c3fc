mod app;
mod cli;
mod ui;

use conform::config;
use conform::form;
use conform::source;
use conform::utils;

use anyhow::{bail, Result};
use chrono::Local;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use form::{ConfigForm, FormState};
use std::fs;
use std::io::Write;
use std::panic;
use std::path::{Path, PathBuf};
use ui::theme::Theme;
use utils::paths::{get_crash_log_path, get_logs_dir};

/// Install a panic hook that writes crash information to a log file
fn install_crash_handler() {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        if let Ok(crash_log_path) = get_crash_log_path() {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
            let mut crash_report = format!("=== CRASH at {} ===\n", timestamp);

            if let Some(message) = panic_info.payload().downcast_ref::<&str>() {
                crash_report.push_str(&format!("Message: {}\n", message));
            } else if let Some(message) = panic_info.payload().downcast_ref::<String>() {
                crash_report.push_str(&format!("Message: {}\n", message));
            }

            if let Some(location) = panic_info.location() {
                crash_report.push_str(&format!(
                    "Location: {}:{}:{}\n",
                    location.file(),
                    location.line(),
                    location.column()
                ));
            }

            crash_report.push_str(&format!("\nBacktrace:\n{}\n", std::backtrace::Backtrace::force_capture()));
            crash_report.push('\n');

            if let Some(parent) = crash_log_path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            if let Ok(mut file) = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log_path)
            {
                let _ = file.write_all(crash_report.as_bytes());
                eprintln!("\nCrash logged to: {}", crash_log_path.display());
            }
        }

        default_hook(panic_info);
    }));
}

/// Initialize file-based logging for the editor.
///
/// Logs are written to ~/.conform/logs/conform.log.<date>.
/// Log level can be controlled with RUST_LOG env var (default: info).
fn init_file_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let logs_dir = match get_logs_dir() {
        Ok(dir) => dir,
        Err(_) => return None,
    };

    if let Err(e) = fs::create_dir_all(&logs_dir) {
        eprintln!("Warning: Could not create logs directory: {}", e);
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&logs_dir, "conform.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false) // No ANSI colors in log files
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    Some(guard)
}

/// One-shot commands only report problems, on stderr.
fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    install_crash_handler();

    let cli = Cli::parse();
    let config = Config::load()?;
    let root = cli.root.clone().unwrap_or_else(|| config.root.clone());

    match cli.command {
        Commands::Fields { spec } => {
            init_stderr_logging();
            handle_fields(&spec, &root)?;
        }
        Commands::Render { spec, values } => {
            init_stderr_logging();
            handle_render(&spec, values.as_deref(), &root)?;
        }
        Commands::Check { spec, values } => {
            init_stderr_logging();
            handle_check(&spec, &values, &root)?;
        }
        Commands::Defaults { spec } => {
            init_stderr_logging();
            handle_defaults(&spec, &root)?;
        }
        Commands::Theme { name } => {
            init_stderr_logging();
            handle_theme(config, &name)?;
        }
        Commands::Edit {
            spec,
            values,
            output,
        } => {
            // Guard must be kept alive for the duration of the app
            let _log_guard = init_file_logging();
            handle_edit(&config, &spec, values, output, &root)?;
        }
    }

    Ok(())
}

fn build_form(spec: &Path, values: Option<&Path>, root: &str) -> Result<ConfigForm> {
    let specs = source::load_specs(spec, root)?;
    let mut form = ConfigForm::new(FormState::new(), specs, root);
    if let Some(values) = values {
        form.load_values(&source::read_json(values)?);
    }
    form.take_events();
    Ok(form)
}

fn handle_fields(spec: &Path, root: &str) -> Result<()> {
    let specs = source::load_specs(spec, root)?;
    println!("{}", serde_json::to_string_pretty(&specs)?);
    Ok(())
}

fn handle_render(spec: &Path, values: Option<&Path>, root: &str) -> Result<()> {
    let form = build_form(spec, values, root)?;
    println!("{}", serde_json::to_string_pretty(&form.render())?);
    Ok(())
}

fn handle_check(spec: &Path, values: &Path, root: &str) -> Result<()> {
    let mut form = build_form(spec, Some(values), root)?;
    let report = form.validate();

    if report.is_valid() {
        println!("✓ {} is valid", values.display());
        return Ok(());
    }

    for error in &report.errors {
        println!("  ✗ {} ({})", error, error.path);
    }
    bail!("{} field(s) failed validation", report.errors.len());
}

fn handle_defaults(spec: &Path, root: &str) -> Result<()> {
    let form = build_form(spec, None, root)?;
    println!("{}", serde_json::to_string_pretty(&form.to_json())?);
    Ok(())
}

fn handle_theme(mut config: Config, name: &str) -> Result<()> {
    if !Theme::NAMES.contains(&name) {
        bail!(
            "Unknown theme '{}'. Available: {}",
            name,
            Theme::NAMES.join(", ")
        );
    }
    config.theme = name.to_string();
    config.save()?;
    println!("Theme set to '{}'", name);
    Ok(())
}

fn handle_edit(
    config: &Config,
    spec: &Path,
    values: Option<PathBuf>,
    output: Option<PathBuf>,
    root: &str,
) -> Result<()> {
    tracing::info!("conform starting on {}", spec.display());

    // A values path that does not exist yet is where the new config goes
    let existing = values.as_deref().filter(|path| path.exists());
    let form = build_form(spec, existing, root)?;
    let output_path = output.or(values);

    let state = app::AppState::new(form, Theme::from_config(config), config.mask_char, output_path);
    let state = ui::run_tui(state)?;

    tracing::info!("conform exiting gracefully");

    if let Some(json) = state.pending_output {
        println!("{}", json);
    }

    Ok(())
}
