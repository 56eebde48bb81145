/*!
 * Configuration Tests
 * Environment overlay and validation at construction
 */

use pretty_assertions::assert_eq;
use rbmm::{RegionConfig, RegionError, RegionManager};
use serial_test::serial;

fn clear_env() {
    for name in ["RBMM_PAGE_WORDS", "RBMM_BATCH_PAGES", "RBMM_PROFILING"] {
        std::env::remove_var(name);
    }
}

#[test]
#[serial]
fn test_from_env_overrides_defaults() {
    clear_env();
    std::env::set_var("RBMM_PAGE_WORDS", "2048");
    std::env::set_var("RBMM_BATCH_PAGES", "16");
    std::env::set_var("RBMM_PROFILING", "true");

    let config = RegionConfig::from_env();
    clear_env();

    assert_eq!(config.page_words, 2048);
    assert_eq!(config.batch_pages, 16);
    assert!(config.profiling);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_from_env_ignores_garbage() {
    clear_env();
    std::env::set_var("RBMM_PAGE_WORDS", "lots");

    let config = RegionConfig::from_env();
    clear_env();

    assert_eq!(config.page_words, RegionConfig::default().page_words);
    assert!(!config.profiling);
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = RegionManager::with_config(RegionConfig::default().with_batch_pages(0)).unwrap_err();
    assert!(matches!(err, RegionError::InvalidConfig(_)));
    assert!(!err.is_fatal());
}

#[test]
#[serial]
fn test_oversized_batch_from_env_is_rejected() {
    clear_env();
    std::env::set_var("RBMM_PAGE_WORDS", (usize::MAX / 2).to_string());
    std::env::set_var("RBMM_BATCH_PAGES", "4");

    let config = RegionConfig::from_env();
    clear_env();

    let err = RegionManager::with_config(config).unwrap_err();
    assert!(matches!(err, RegionError::InvalidConfig(_)));
}

#[test]
fn test_control_block_must_hold_header() {
    let config = RegionConfig::default().with_control_block_words(1);
    assert!(RegionManager::with_config(config).is_err());
}

#[test]
fn test_debug_config_builds_profiled_manager() {
    let manager = RegionManager::with_config(RegionConfig::debug()).unwrap();
    assert!(manager.profile().is_some());
    assert!(RegionManager::new().profile().is_none());
}

#[test]
fn test_error_serialization() {
    let err = RegionError::ObjectTooLarge {
        requested: 10,
        capacity: 4,
    };
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["error_type"], "object_too_large");
    assert_eq!(json["details"]["requested"], 10);
}
