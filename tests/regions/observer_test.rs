/*!
 * Observer Tests
 * Lifecycle hook ordering
 */

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use rbmm::{FrameKind, FrameLayouts, LayoutFrameStack, RegionInfo, RegionManager, RegionObserver};
use std::sync::Arc;

#[derive(Clone, Default)]
struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn push(&self, event: &str, info: &RegionInfo) {
        self.events
            .lock()
            .push(format!("{} #{}", event, info.sequence_number));
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl RegionObserver for Recorder {
    fn on_create(&mut self, info: &RegionInfo) {
        self.push("create", info);
    }

    fn on_try_remove(&mut self, info: &RegionInfo) {
        self.push("try_remove", info);
    }

    fn on_logical_removal(&mut self, info: &RegionInfo) {
        assert!(info.logically_removed);
        self.push("logical_removal", info);
    }

    fn on_destroy(&mut self, info: &RegionInfo) {
        self.push("destroy", info);
    }
}

#[test]
fn test_hooks_fire_in_lifecycle_order() {
    let recorder = Recorder::default();
    let mut manager = RegionManager::new().with_observer(Box::new(recorder.clone()));
    let mut frames = LayoutFrameStack::new(FrameLayouts::default());

    let a = manager.create_region();
    let b = manager.create_region();
    let ite = frames.push_frame(FrameKind::Ite, &[Some(b)]);
    manager.attach_frame(b, FrameKind::Ite, ite).unwrap();

    manager.remove_region(a, &mut frames).unwrap();
    manager.remove_region(b, &mut frames).unwrap();
    manager
        .release_protection(b, FrameKind::Ite, &mut frames)
        .unwrap();

    assert_eq!(
        recorder.take(),
        vec![
            "create #1",
            "create #2",
            "try_remove #1",
            "destroy #1",
            "try_remove #2",
            "logical_removal #2",
            "destroy #2",
        ]
    );
}

#[test]
fn test_manager_without_observer() {
    let mut manager = RegionManager::new();
    let mut frames = LayoutFrameStack::new(FrameLayouts::default());
    let region = manager.create_region();
    manager.remove_region(region, &mut frames).unwrap();
    assert_eq!(manager.live_count(), 0);
}
