//! User-facing terminal output, separate from tracing logs.
//! Colors are enabled only when the stream is a TTY.

use owo_colors::OwoColorize;

use crate::preflight::PreflightReport;
use crate::report::RunReport;

fn stdout_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

fn stderr_tty() -> bool {
    atty::is(atty::Stream::Stderr)
}

pub fn print_info(msg: &str) {
    if stdout_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {}", msg);
    }
}

pub fn print_warn(msg: &str) {
    if stderr_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if stderr_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

pub fn print_success(msg: &str) {
    if stdout_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {}", msg);
    }
}

/// Print a plain line (no prefix) that scripts may parse.
pub fn print_user(msg: &str) {
    println!("{}", msg);
}

/// Preflight abort: bucket counts plus the sampled unmatched paths.
pub fn print_preflight_abort(report: &PreflightReport) {
    print_error(&format!(
        "aborted: unmatched entries found ({} unmatched, {} matched); nothing was modified",
        report.unmatched, report.matched
    ));
    for (bucket, n) in &report.counts {
        print_user(&format!("  {n:>8}  {bucket}"));
    }
    if !report.samples.is_empty() {
        print_user("Unmatched samples:");
        for (path, reason) in &report.samples {
            print_user(&format!("  {}  ({reason})", path.display()));
        }
        if report.unmatched > report.samples.len() as u64 {
            print_user(&format!("  ... and {} more", report.unmatched - report.samples.len() as u64));
        }
    }
    print_info("Review the entries above, then re-run with --override-unmatched to skip them.");
}

/// Final summary: counters, then every entry not safely transferred.
pub fn print_run_report(report: &RunReport) {
    print_user(&report.to_string());
    if report.cancelled {
        print_warn("run was cancelled; re-run to finish the remaining entries");
    } else if report.has_failures() {
        print_warn(&format!("{} entries failed; see the list above", report.counters.failed));
    } else if report.dry_run {
        print_success("dry run complete; nothing was modified");
    } else {
        print_success("run complete");
    }
}
