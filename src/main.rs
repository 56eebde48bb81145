/*!
 * Region Runtime Simulator
 *
 * Drives a region manager through the scope events a backtracking engine
 * would produce:
 * - a disjunction protecting a region past its removal
 * - a nondet if-then-else clearing its protection entry
 * - a commit scope sweeping saved and new regions
 *
 * The profile is printed as JSON on stdout when the run completes.
 */

use anyhow::Context;
use rbmm::monitoring::init_tracing;
use rbmm::{
    FrameKind, FrameStack, LayoutFrameStack, RegionConfig, RegionError, RegionManager,
    RegionResult, Removal,
};
use tracing::{info, info_span, warn};

fn main() -> anyhow::Result<()> {
    // Initialize structured tracing
    init_tracing();

    let config = RegionConfig::from_env().with_profiling(true);
    info!(
        page_words = config.page_words,
        batch_pages = config.batch_pages,
        "Region simulator starting"
    );

    let mut manager = RegionManager::with_config(config).map_err(report)?;
    let mut frames = LayoutFrameStack::from_config(manager.config());

    disjunction_scope(&mut manager, &mut frames).map_err(report)?;
    nondet_ite_scope(&mut manager, &mut frames).map_err(report)?;
    commit_scope(&mut manager, &mut frames).map_err(report)?;

    info!(
        live_regions = manager.live_count(),
        free_pages = manager.free_pages(),
        "Workload finished"
    );
    if manager.live_count() != 0 {
        warn!(live_regions = manager.live_count(), "Regions left alive");
    }

    if let Some(profile) = manager.profile() {
        info!("\n{}", profile);
        let json = serde_json::to_string_pretty(&profile).context("Failed to encode profile")?;
        println!("{}", json);
    }
    Ok(())
}

/// A region removed inside a disjunction survives until the disjunction
/// releases it
fn disjunction_scope(
    manager: &mut RegionManager,
    frames: &mut LayoutFrameStack,
) -> RegionResult<()> {
    let _span = info_span!("disjunction").entered();

    let region = manager.create_region();
    let cell = manager.alloc(region, 16)?;
    if let Some(words) = manager.cells_mut(cell, 16) {
        for (i, word) in words.iter_mut().enumerate() {
            *word = i as u64;
        }
    }

    let disj = frames.push_frame(FrameKind::Disj, &[Some(region)]);
    manager.attach_frame(region, FrameKind::Disj, disj)?;

    let removal = manager.remove_region(region, frames)?;
    info!(?removal, "Removal inside disjunction");

    frames.pop_frame(FrameKind::Disj);
    let removal = manager.release_protection(region, FrameKind::Disj, frames)?;
    info!(?removal, "Disjunction exhausted");
    Ok(())
}

/// The then-branch of a nondet condition destroys the region and clears
/// the ite frame entry protecting it
fn nondet_ite_scope(
    manager: &mut RegionManager,
    frames: &mut LayoutFrameStack,
) -> RegionResult<()> {
    let _span = info_span!("nondet_ite").entered();

    let region = manager.create_region();
    manager.alloc(region, 64)?;

    let ite = frames.push_frame(FrameKind::Ite, &[Some(region)]);
    manager.attach_frame(region, FrameKind::Ite, ite)?;

    let removal = manager.remove_ite_then_nondet(region, frames)?;
    info!(
        ?removal,
        cleared = frames.entry(ite, 0).is_none(),
        "Then-branch entered"
    );
    frames.pop_frame(FrameKind::Ite);
    Ok(())
}

/// Regions saved by and created inside a commit scope are swept on commit
fn commit_scope(manager: &mut RegionManager, frames: &mut LayoutFrameStack) -> RegionResult<()> {
    let _span = info_span!("commit").entered();

    let saved = manager.create_region();
    let kept = manager.create_region();
    manager.alloc(kept, 8)?;

    let commit = frames.push_commit_frame(manager.sequence_boundary(), &[Some(saved)]);
    manager.attach_frame(saved, FrameKind::Commit, commit)?;
    let ite = frames.push_frame(FrameKind::Ite, &[Some(saved)]);
    manager.attach_frame(saved, FrameKind::Ite, ite)?;

    // Scope body: one saved region removed, one new region removed
    let inner = manager.create_region();
    let half_page = manager.config().page_words / 2;
    for _ in 0..4 {
        manager.alloc(inner, half_page)?;
    }
    manager.attach_frame(inner, FrameKind::Ite, ite)?;
    manager.attach_frame(inner, FrameKind::Commit, commit)?;

    for region in [saved, inner] {
        if let Removal::LogicallyRemoved { destroy_at_commit } =
            manager.remove_region(region, frames)?
        {
            info!(destroy_at_commit, "Removal deferred to commit");
        }
    }

    let outcome = manager.commit(commit, frames)?;
    info!(
        old_destroyed = outcome.old_destroyed,
        new_destroyed = outcome.new_destroyed,
        "Commit resolved"
    );
    frames.pop_frame(FrameKind::Ite);
    frames.pop_frame(FrameKind::Commit);

    manager.remove_region(kept, frames)?;
    Ok(())
}

/// Render the error as a diagnostic on stderr and hand it back to main
fn report(err: RegionError) -> anyhow::Error {
    let tier = if err.is_fatal() { "fatal" } else { "recoverable" };
    eprintln!("{:?}", miette::Report::new(err.clone()));
    anyhow::Error::new(err).context(format!("Region runtime stopped on a {} error", tier))
}
