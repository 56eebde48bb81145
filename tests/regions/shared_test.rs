/*!
 * Shared Manager Tests
 * One manager serialized across threads, independent managers side by side
 */

use pretty_assertions::assert_eq;
use rbmm::{FrameLayouts, LayoutFrameStack, RegionManager, SharedRegionManager};
use std::thread;

#[test]
fn test_threads_share_one_manager() {
    let shared = SharedRegionManager::new(RegionManager::new());

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                let mut frames = LayoutFrameStack::new(FrameLayouts::default());
                for _ in 0..50 {
                    let region = shared.with(|m| m.create_region());
                    shared.with(|m| m.alloc(region, 10)).unwrap();
                    shared
                        .with(|m| m.remove_region(region, &mut frames))
                        .unwrap();
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("Worker thread panicked");
    }

    let manager = shared.lock();
    assert_eq!(manager.live_count(), 0);
    assert_eq!(manager.sequence_boundary(), 200);
}

#[test]
fn test_independent_managers_do_not_interfere() {
    let mut first = RegionManager::new();
    let mut second = RegionManager::new();

    first.create_region();
    first.create_region();
    let region = second.create_region();

    assert_eq!(first.live_count(), 2);
    assert_eq!(second.live_count(), 1);
    assert_eq!(second.sequence_number(region).unwrap(), 1);
}

#[test]
fn test_from_manager() {
    let shared: SharedRegionManager = RegionManager::new().into();
    let region = shared.lock().create_region();
    assert!(shared.lock().is_live(region));
}
