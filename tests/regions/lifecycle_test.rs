/*!
 * Region Lifecycle Tests
 * Creation order, registry links, destruction and handle retirement
 */

use pretty_assertions::assert_eq;
use rbmm::{
    CellPtr, FrameKind, FrameLayouts, FrameStack, LayoutFrameStack, RegionConfig, RegionError,
    RegionInfo, RegionManager, RegionObserver,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn small_manager() -> RegionManager {
    RegionManager::with_config(
        RegionConfig::default()
            .with_page_words(1000)
            .with_control_block_words(10)
            .with_batch_pages(4),
    )
    .expect("Small config should be valid")
}

fn sequences(manager: &RegionManager) -> Vec<u64> {
    manager
        .live_regions()
        .map(|h| manager.sequence_number(h).unwrap())
        .collect()
}

#[test]
fn test_sequence_numbers_increase_from_one() {
    let mut manager = small_manager();
    assert_eq!(manager.sequence_boundary(), 0);

    let r1 = manager.create_region();
    let r2 = manager.create_region();
    let r3 = manager.create_region();

    assert_eq!(manager.sequence_number(r1).unwrap(), 1);
    assert_eq!(manager.sequence_number(r2).unwrap(), 2);
    assert_eq!(manager.sequence_number(r3).unwrap(), 3);
    assert_eq!(manager.sequence_boundary(), 3);
}

#[test]
fn test_registry_is_newest_first() {
    let mut manager = small_manager();
    let handles: Vec<_> = (0..4).map(|_| manager.create_region()).collect();

    let live: Vec<_> = manager.live_regions().collect();
    let mut expected = handles.clone();
    expected.reverse();
    assert_eq!(live, expected);
    assert_eq!(manager.live_count(), 4);
}

#[test]
fn test_destroy_middle_region_relinks_registry() {
    let mut manager = small_manager();
    let mut frames = LayoutFrameStack::new(FrameLayouts::default());
    let _r1 = manager.create_region();
    let r2 = manager.create_region();
    let _r3 = manager.create_region();

    manager
        .destroy_region(r2, &mut frames)
        .expect("Destroying a live region should succeed");

    assert_eq!(sequences(&manager), vec![3, 1]);
    assert_eq!(manager.live_count(), 2);
    assert!(!manager.is_live(r2));
}

#[test]
fn test_destroy_head_and_tail() {
    let mut manager = small_manager();
    let mut frames = LayoutFrameStack::new(FrameLayouts::default());
    let r1 = manager.create_region();
    let _r2 = manager.create_region();
    let r3 = manager.create_region();

    manager.destroy_region(r3, &mut frames).unwrap();
    assert_eq!(sequences(&manager), vec![2, 1]);

    manager.destroy_region(r1, &mut frames).unwrap();
    assert_eq!(sequences(&manager), vec![2]);

    // New regions still go to the front
    manager.create_region();
    assert_eq!(sequences(&manager), vec![4, 2]);
}

#[test]
fn test_destroyed_handle_is_stale() {
    let mut manager = small_manager();
    let mut frames = LayoutFrameStack::new(FrameLayouts::default());
    let region = manager.create_region();
    manager.destroy_region(region, &mut frames).unwrap();

    let err = manager.alloc(region, 1).unwrap_err();
    assert!(matches!(err, RegionError::StaleHandle { .. }));
    assert!(!err.is_fatal());
    assert!(manager.destroy_region(region, &mut frames).is_err());
    assert_eq!(manager.live_count(), 0);
}

#[test]
fn test_slot_reuse_does_not_revive_old_handle() {
    let mut manager = small_manager();
    let mut frames = LayoutFrameStack::new(FrameLayouts::default());
    let old = manager.create_region();
    manager.destroy_region(old, &mut frames).unwrap();

    let new = manager.create_region();
    assert_eq!(new.index(), old.index());
    assert_ne!(new, old);
    assert!(manager.is_live(new));
    assert!(!manager.is_live(old));
}

#[test]
fn test_pages_return_to_pool() {
    let mut manager = small_manager();
    let mut frames = LayoutFrameStack::new(FrameLayouts::default());

    let region = manager.create_region();
    assert_eq!(manager.free_pages(), 3);

    manager.alloc(region, 990).unwrap();
    manager.alloc(region, 1000).unwrap();
    manager.alloc(region, 1).unwrap();
    assert_eq!(manager.region_info(region).unwrap().pages, 3);
    assert_eq!(manager.free_pages(), 1);

    manager.destroy_region(region, &mut frames).unwrap();
    assert_eq!(manager.free_pages(), 4);
}

#[test]
fn test_batch_request_when_pool_runs_dry() {
    let mut manager = small_manager();
    let handles: Vec<_> = (0..5).map(|_| manager.create_region()).collect();

    // Second batch of four, one page taken from it
    assert_eq!(manager.free_pages(), 3);
    assert_eq!(handles.len(), manager.live_count());
}

#[test]
fn test_control_block_header() {
    let mut manager = small_manager();
    manager.create_region();
    let region = manager.create_region();
    let cell = manager.alloc(region, 1).unwrap();
    assert_eq!(cell.offset, 10);

    let header = manager
        .cells(
            CellPtr {
                page: cell.page,
                offset: 0,
            },
            2,
        )
        .expect("Header words should be readable");
    assert_eq!(header, &[region.to_word(), 2]);
}

#[test]
fn test_destroy_clears_every_commit_frame() {
    let mut manager = small_manager();
    let mut frames = LayoutFrameStack::new(FrameLayouts::default());
    let other = manager.create_region();
    let region = manager.create_region();

    let outer = frames.push_commit_frame(0, &[Some(region), Some(other)]);
    let inner = frames.push_commit_frame(2, &[None, Some(region)]);
    manager
        .attach_frame(region, FrameKind::Commit, inner)
        .unwrap();

    manager.destroy_region(region, &mut frames).unwrap();

    assert_eq!(frames.entries(inner), vec![None, None]);
    assert_eq!(frames.entries(outer), vec![None, Some(other)]);
}

#[test]
fn test_destroy_leaves_protection_frames_alone() {
    let mut manager = small_manager();
    let mut frames = LayoutFrameStack::new(FrameLayouts::default());
    let region = manager.create_region();

    let ite = frames.push_frame(FrameKind::Ite, &[Some(region)]);
    manager.attach_frame(region, FrameKind::Ite, ite).unwrap();
    manager.destroy_region(region, &mut frames).unwrap();

    assert_eq!(frames.entry(ite, 0), Some(region));
}

struct DestroyCounter(Arc<AtomicUsize>);

impl RegionObserver for DestroyCounter {
    fn on_destroy(&mut self, _info: &RegionInfo) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_failed_destroy_leaves_region_and_frames_intact() {
    let destroyed = Arc::new(AtomicUsize::new(0));
    let mut manager =
        RegionManager::with_config(RegionConfig::default().with_frame_entry_limit(Some(1)))
            .unwrap()
            .with_observer(Box::new(DestroyCounter(destroyed.clone())));
    let mut frames = LayoutFrameStack::new(FrameLayouts::default());
    let other = manager.create_region();
    let region = manager.create_region();

    // Only the older frame breaks the limit
    let outer = frames.push_commit_frame(0, &[Some(region), Some(other)]);
    let inner = frames.push_commit_frame(2, &[Some(region)]);
    manager
        .attach_frame(region, FrameKind::Commit, inner)
        .unwrap();

    let err = manager.destroy_region(region, &mut frames).unwrap_err();
    assert_eq!(
        err,
        RegionError::FrameSanityLimit {
            frame: outer.0,
            count: 2,
            limit: 1
        }
    );

    assert!(manager.is_live(region));
    assert_eq!(destroyed.load(Ordering::SeqCst), 0);
    assert_eq!(frames.entries(inner), vec![Some(region)]);
    assert_eq!(frames.entries(outer), vec![Some(region), Some(other)]);
    assert_eq!(
        manager.region_info(region).unwrap().commit_frame,
        Some(inner)
    );
}

#[test]
fn test_failed_nondet_removal_keeps_ite_entry() {
    let mut manager =
        RegionManager::with_config(RegionConfig::default().with_frame_entry_limit(Some(1)))
            .unwrap();
    let mut frames = LayoutFrameStack::new(FrameLayouts::default());
    let other = manager.create_region();
    let region = manager.create_region();

    let commit = frames.push_commit_frame(0, &[Some(region), Some(other)]);
    let ite = frames.push_frame(FrameKind::Ite, &[Some(region)]);
    manager
        .attach_frame(region, FrameKind::Commit, commit)
        .unwrap();
    manager.attach_frame(region, FrameKind::Ite, ite).unwrap();

    assert!(manager
        .remove_ite_then_nondet(region, &mut frames)
        .is_err());
    assert!(manager.is_live(region));
    assert_eq!(frames.entry(ite, 0), Some(region));
}
