/*!
 * Bump Allocation Tests
 * Page capacity, extension and cell access
 */

use pretty_assertions::assert_eq;
use rbmm::{RegionConfig, RegionError, RegionManager};

fn manager() -> RegionManager {
    RegionManager::with_config(
        RegionConfig::default()
            .with_page_words(1000)
            .with_control_block_words(10),
    )
    .expect("Config should be valid")
}

#[test]
fn test_first_page_reserves_control_block() {
    let mut manager = manager();
    let region = manager.create_region();
    assert_eq!(manager.available_words(region).unwrap(), 990);
}

#[test]
fn test_bump_then_extend() {
    let mut manager = manager();
    let region = manager.create_region();

    let first = manager.alloc(region, 500).unwrap();
    assert_eq!(first.offset, 10);
    assert_eq!(manager.available_words(region).unwrap(), 490);

    let second = manager.alloc(region, 600).unwrap();
    assert_ne!(second.page, first.page);
    assert_eq!(second.offset, 0);
    assert_eq!(manager.available_words(region).unwrap(), 400);

    let info = manager.region_info(region).unwrap();
    assert_eq!(info.pages, 2);
    assert_eq!(info.allocated_words, 1100);
}

#[test]
fn test_consecutive_cells_are_adjacent() {
    let mut manager = manager();
    let region = manager.create_region();

    let a = manager.alloc(region, 3).unwrap();
    let b = manager.alloc(region, 5).unwrap();
    assert_eq!(b.page, a.page);
    assert_eq!(b.offset, a.offset + 3);
}

#[test]
fn test_exact_fit_does_not_extend() {
    let mut manager = manager();
    let region = manager.create_region();

    manager.alloc(region, 990).unwrap();
    assert_eq!(manager.available_words(region).unwrap(), 0);
    assert_eq!(manager.region_info(region).unwrap().pages, 1);
}

#[test]
fn test_whole_page_object() {
    let mut manager = manager();
    let region = manager.create_region();

    let cell = manager.alloc(region, 1000).unwrap();
    assert_eq!(cell.offset, 0);
    assert_eq!(manager.available_words(region).unwrap(), 0);
}

#[test]
fn test_oversized_object_is_rejected() {
    let mut manager = manager();
    let region = manager.create_region();

    let err = manager.alloc(region, 1001).unwrap_err();
    assert_eq!(
        err,
        RegionError::ObjectTooLarge {
            requested: 1001,
            capacity: 1000
        }
    );
    assert!(err.is_fatal());
    assert_eq!(manager.available_words(region).unwrap(), 990);
}

#[test]
fn test_cells_hold_written_words() {
    let mut manager = manager();
    let region = manager.create_region();
    let cell = manager.alloc(region, 4).unwrap();

    manager
        .cells_mut(cell, 4)
        .expect("Cell should be in bounds")
        .copy_from_slice(&[7, 8, 9, 10]);

    // A later allocation does not disturb earlier cells
    let other = manager.alloc(region, 2).unwrap();
    manager.cells_mut(other, 2).unwrap().fill(0xff);

    assert_eq!(manager.cells(cell, 4).unwrap(), &[7, 8, 9, 10]);
}

#[test]
fn test_cells_out_of_bounds() {
    let mut manager = manager();
    let region = manager.create_region();
    let cell = manager.alloc(region, 4).unwrap();

    assert!(manager.cells(cell, 2000).is_none());
    assert!(manager
        .cells(
            rbmm::CellPtr {
                page: 10_000,
                offset: 0
            },
            1
        )
        .is_none());
}
