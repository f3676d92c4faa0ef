use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use lanefix_repair::{run, Mode, RunReport};
use lanefix_savefile::{backup_path, export_json, read_archive, write_archive};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lanefix")]
#[command(about = "Repair drone junction socket metadata in world-state archives", long_about = None)]
#[command(version)]
struct Cli {
    /// Archive file to process
    save_file: PathBuf,

    /// Persist changes (default is a dry run: report counts, write nothing)
    #[arg(long)]
    apply: bool,

    /// Revert a previous repair: remove invisible poles, restore endpoints
    #[arg(long)]
    revert: bool,

    /// Also write a pretty-printed JSON sibling of the decoded document
    #[arg(long)]
    json: bool,

    /// Per-junction / per-lane diagnostic lines
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mode = if cli.revert { Mode::Revert } else { Mode::Repair };
    log::debug!("mode: {mode:?}, apply: {}", cli.apply);
    let mut document = read_archive(&cli.save_file)
        .with_context(|| format!("failed to read {}", cli.save_file.display()))?;

    let report = run(&mut document, mode)?;
    print_summary(&report, cli.apply);

    if should_persist(&report, mode, cli.apply) {
        let backup = backup_path(&cli.save_file);
        fs::copy(&cli.save_file, &backup)
            .with_context(|| format!("failed to back up to {}", backup.display()))?;
        println!("backup: {}", backup.display());
        write_archive(&cli.save_file, &document)
            .with_context(|| format!("failed to write {}", cli.save_file.display()))?;
    }

    if cli.json {
        let json_path = sibling(&cli.save_file, ".json");
        export_json(&json_path, &document)?;
        println!("json export: {}", json_path.display());
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .init();
}

fn should_persist(report: &RunReport, mode: Mode, apply: bool) -> bool {
    if !apply {
        return false;
    }
    match mode {
        Mode::Repair => true,
        // Reverting an archive without poles would just churn the file.
        Mode::Revert => report.revert.is_some_and(|r| r.poles_removed > 0),
    }
}

fn print_summary(report: &RunReport, apply: bool) {
    if let Some(sweep) = report.sweep {
        println!("dangling splines removed: {}", sweep.removed);
        if sweep.intersections_cleaned + sweep.connectors_cleaned > 0 {
            println!(
                "  cascaded: {} intersection fragments, {} connector entries",
                sweep.intersections_cleaned, sweep.connectors_cleaned
            );
        }
    }
    if let Some(synth) = report.synth {
        println!("junctions fixed: {}", synth.junctions_fixed);
        if synth.pole_paired_fixed + synth.clustered_fixed > 0 {
            println!(
                "  pole-paired: {}, clustered: {}",
                synth.pole_paired_fixed, synth.clustered_fixed
            );
        }
        println!("invisible poles created: {}", synth.poles_created);
        println!("junctions skipped: {}", synth.junctions_skipped);
        if synth.already_has_sockets > 0 {
            println!("already have socket data: {}", synth.already_has_sockets);
        }
        if synth.endpoint_rewrites + synth.rewrite_failures > 0 {
            println!(
                "endpoint rewrites: {} ({} failed)",
                synth.endpoint_rewrites, synth.rewrite_failures
            );
        }
        if synth.stale_poles_detected > 0 {
            println!(
                "warning: {} stale invisible poles present, run --revert first",
                synth.stale_poles_detected
            );
        }
    }
    if let Some(revert) = report.revert {
        println!("poles removed: {}", revert.poles_removed);
        println!(
            "spline rewrites: {} ({} failed)",
            revert.rewrites, revert.rewrite_failures
        );
        if revert.warnings > 0 {
            println!("warnings: {}", revert.warnings);
        }
        if revert.socket_refs_cleaned + revert.connectors_cleaned > 0 {
            println!(
                "  cascaded: {} socket pairing refs, {} connector entries",
                revert.socket_refs_cleaned, revert.connectors_cleaned
            );
        }
    }
    if !apply {
        println!("dry run, nothing written (use --apply)");
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
