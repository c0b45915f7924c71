//! When steps for job runner BDD scenarios.

use super::world::{JobRunnerWorld, run_async};
use chrono::TimeDelta;
use eyre::WrapErr;
use rstest_bdd_macros::when;

fn run_passes(world: &mut JobRunnerWorld, count: usize) -> Result<(), eyre::Report> {
    let runner = world.runner()?;
    for _ in 0..count {
        let summary = run_async(runner.run_once()).wrap_err("run runner pass")?;
        world.last_summary = Some(summary);
    }
    Ok(())
}

#[when("the runner passes once")]
fn runner_passes_once(world: &mut JobRunnerWorld) -> Result<(), eyre::Report> {
    run_passes(world, 1)
}

#[when("the runner passes {count:usize} times")]
fn runner_passes(world: &mut JobRunnerWorld, count: usize) -> Result<(), eyre::Report> {
    run_passes(world, count)
}

#[when("the clock advances {minutes:i64} minutes")]
fn clock_advances(world: &mut JobRunnerWorld, minutes: i64) {
    world.clock.advance(TimeDelta::minutes(minutes));
}
