//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the interrupt handler,
//! runs the reorganization and maps the result to an exit code.

use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

use reshard::cli::Args;
use reshard::output as out;
use reshard::platform::write_report_atomic;
use reshard::{
    CONFIG_ENV, CancelFlag, Config, PreflightReport, ReshardError, RunController, RunOutcome, RunReport,
    build_layout, default_config_path, load_optional,
};

use crate::logging::init_tracing;

pub const EXIT_OK: u8 = 0;
pub const EXIT_FATAL: u8 = 1;
pub const EXIT_ABORTED: u8 = 2;
pub const EXIT_FAILURES: u8 = 3;
pub const EXIT_CANCELLED: u8 = 130;

/// Document written by `--report`.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ReportDocument<'a> {
    Completed { report: &'a RunReport },
    Aborted { preflight: &'a PreflightReport },
}

fn print_config_location(explicit: Option<&Path>) {
    if let Some(p) = explicit {
        out::print_info(&format!("Using --config (explicit):\n  {}", p.display()));
        return;
    }
    if let Ok(env) = std::env::var(CONFIG_ENV) {
        out::print_info(&format!("Using {CONFIG_ENV} (explicit):\n  {env}"));
        out::print_info(&format!("To override, unset {CONFIG_ENV} or pass --config."));
        return;
    }
    match default_config_path() {
        Ok(p) => {
            out::print_info(&format!("Default reshard config path:\n  {}", p.display()));
            if p.exists() {
                out::print_info("A config file exists at that location.");
            } else {
                out::print_info("No config file exists there; built-in defaults and CLI flags apply.");
            }
        }
        Err(e) => out::print_error(&format!("Could not determine a default config path: {e}")),
    }
}

/// Defaults < XML file < CLI flags.
fn build_config(args: &Args) -> Result<Config> {
    let mut cfg = Config::default();
    if let Some(file) = load_optional(args.config.as_deref())? {
        file.apply_to(&mut cfg)?;
    }
    args.apply_overrides(&mut cfg).map_err(|e| anyhow!(e))?;
    if cfg.source_root.as_os_str().is_empty() {
        bail!("no source root: pass --source or set <source_root> in the config file");
    }
    if cfg.destination_root.as_os_str().is_empty() {
        bail!("no destination root: pass --dest or set <destination_root> in the config file");
    }
    Ok(cfg)
}

fn write_report(path: &Path, doc: &ReportDocument<'_>) -> Result<()> {
    let json = serde_json::to_vec_pretty(doc).context("serialize run report")?;
    write_report_atomic(path, &json)?;
    debug!(path = %path.display(), "report written");
    Ok(())
}

fn completed_exit_code(report: &RunReport, fail_on_errors: bool) -> u8 {
    if report.cancelled {
        EXIT_CANCELLED
    } else if fail_on_errors && report.has_failures() {
        EXIT_FAILURES
    } else {
        EXIT_OK
    }
}

/// Run the CLI application.
pub fn run(args: Args) -> Result<ExitCode> {
    // Handle --print-config before logging init
    if args.print_config {
        print_config_location(args.config.as_deref());
        return Ok(ExitCode::from(EXIT_OK));
    }

    let cfg = build_config(&args)?;

    let guard_opt = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
        e
    })?;

    // Guard is dropped on a second interrupt so buffered log lines are flushed.
    let cancel = CancelFlag::new();
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    {
        let cancel = cancel.clone();
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            if cancel.is_requested() {
                if let Ok(mut g) = guard_slot.lock() {
                    let _ = g.take();
                }
                std::process::exit(i32::from(EXIT_CANCELLED));
            }
            cancel.request();
            out::print_warn("Received interrupt; finishing in-flight transfers (press again to exit now)...");
        })
        .context("install interrupt handler")?;
    }

    debug!(?cfg, "starting reshard");
    let layout = build_layout(&cfg.layout);
    let result = RunController::new(&cfg, layout.as_ref(), cancel).run();

    let code = match result {
        Ok(RunOutcome::Aborted(preflight)) => {
            out::print_preflight_abort(&preflight);
            if let Some(p) = &args.report {
                write_report(p, &ReportDocument::Aborted { preflight: &preflight })?;
            }
            EXIT_ABORTED
        }
        Ok(RunOutcome::Completed(report)) => {
            out::print_run_report(&report);
            if let Some(p) = &args.report {
                write_report(p, &ReportDocument::Completed { report: &report })?;
            }
            completed_exit_code(&report, args.fail_on_errors)
        }
        Err(e) => {
            error!(code = e.code(), kind = e.kind(), error = %e, "run failed");
            out::print_error(&e.to_string());
            match e {
                ReshardError::Interrupted => EXIT_CANCELLED,
                _ => EXIT_FATAL,
            }
        }
    };

    // Ensure logs are flushed before exit
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }

    Ok(ExitCode::from(code))
}
