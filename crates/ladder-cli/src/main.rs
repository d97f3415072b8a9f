//! Demo/inspection binary (SPEC_FULL.md §0): loads a small built-in ladder program, drives
//! it through `ladder-runner` for a fixed number of scans, and prints the resulting tag
//! state and history diff. There is no on-disk program format in scope (spec.md has none),
//! so this is a worked example for embedders rather than a general-purpose loader --
//! matching the role `aero-machine-cli` plays for `aero-machine`.

use anyhow::Result;
use clap::Parser;
use ladder_cond::Condition;
use ladder_instr::{OnDelayTimer, TimeUnit};
use ladder_program::{ExecutionItem, OnDelay, Program, Rung};
use ladder_runner::{Runner, TimeMode};
use ladder_types::{bool_tag, int_tag, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Runs the built-in on-delay timer demo (spec.md §8 scenario 2: `Pump` drives an on-delay
/// timer towards `Done`) and prints the resulting tag state after each scan.
#[derive(Parser, Debug)]
#[command(name = "ladder-cli", about = "scanrt demo/inspection runner")]
struct Args {
    /// Fixed scan period in seconds (FixedStep time mode).
    #[arg(long, default_value_t = 0.5)]
    dt: f64,

    /// Number of scans to run after the initial Stop->Run transition.
    #[arg(long, default_value_t = 10)]
    cycles: u64,

    /// Bounds how many snapshots the history ring buffer retains; unbounded if omitted.
    #[arg(long)]
    history_limit: Option<usize>,

    /// Whether the controller has battery backup (affects retentive-tag handling on
    /// reboot; spec.md §7).
    #[arg(long, default_value_t = true)]
    battery: bool,
}

fn wall_clock_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn build_demo_program() -> Program {
    let timer_preset = 5;
    let rung = Rung::new(
        0,
        vec![Condition::direct("Pump")],
        vec![ExecutionItem::instruction(OnDelay::new(
            OnDelayTimer::new("Done", "Acc", timer_preset, TimeUnit::S),
            None,
        ))],
        "demo.r0",
    );
    Program::build(vec![rung], vec![], true).expect("demo program is well-formed")
}

fn print_state(label: &str, runner: &Runner) {
    let state = runner.current_state();
    println!(
        "{label}: scan={} t={:.2}s Pump={:?} Acc={:?} Done={:?}",
        state.scan_id(),
        state.timestamp(),
        state.tag("Pump"),
        state.tag("Acc"),
        state.tag("Done"),
    );
}

fn main() -> Result<()> {
    let args = Args::parse();

    let tags = vec![bool_tag("Pump"), int_tag("Acc"), bool_tag("Done")];
    let mut runner = Runner::new(
        build_demo_program(),
        tags,
        TimeMode::FixedStep { dt: args.dt },
        wall_clock_seconds,
        args.history_limit,
    );
    runner.set_battery_present(args.battery);

    print_state("boot ", &runner);

    let mut writes = std::collections::BTreeMap::new();
    writes.insert("Pump".to_string(), Value::Bool(true));
    runner.patch(writes)?;

    let start_scan = runner.current_state().scan_id();
    runner.run(args.cycles)?;
    print_state("final", &runner);

    let start = runner.history().at(start_scan)?;
    let end = runner.current_state();
    let diff = Runner::diff(start, end);
    println!("changed tags since scan {start_scan}:");
    for (tag, (before, after)) in diff {
        println!("  {tag}: {before:?} -> {after:?}");
    }

    Ok(())
}
