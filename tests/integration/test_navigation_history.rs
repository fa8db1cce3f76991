//! History and breadcrumb behaviour of the navigation manager

use crate::fixtures::{folder_ids, open, ACCOUNT, PROVIDER};
use rust_lib_drive_picker::navigation::NavigationManager;

fn deep_history() -> NavigationManager {
    let mut manager = NavigationManager::new();
    manager.go_home(PROVIDER, ACCOUNT);
    open(&mut manager, "a", "A");
    open(&mut manager, "b", "B");
    open(&mut manager, "c", "C");
    open(&mut manager, "d", "D");
    manager
}

#[test]
fn test_divergent_navigation_truncates_forward_history() {
    for k in 0..4 {
        let mut manager = deep_history();
        manager.navigate_to_index(k).expect("valid index");
        open(&mut manager, "x", "X");

        assert_eq!(manager.history().len(), k + 2, "k = {k}");
        assert_eq!(manager.history().current_index(), Some(k + 1));
        assert!(!manager.can_go_forward());
    }
}

#[test]
fn test_go_home_is_absolute_reset() {
    let mut manager = deep_history();
    manager.go_back();
    manager.go_home(PROVIDER, ACCOUNT);

    assert_eq!(manager.history().len(), 1);
    assert_eq!(manager.history().current_index(), Some(0));
    assert!(manager.history().entries()[0].is_root());

    let mut empty = NavigationManager::new();
    empty.go_home(PROVIDER, ACCOUNT);
    assert_eq!(empty.history().len(), 1);
}

#[test]
fn test_back_then_forward_returns_same_entry() {
    let mut manager = deep_history();
    for _ in 0..4 {
        let before = manager.current().cloned();
        manager.go_back().expect("back");
        let after = manager.go_forward().expect("forward");
        assert_eq!(Some(after), before);
        manager.go_back();
    }
}

#[test]
fn test_navigate_to_index_keeps_entries() {
    let mut manager = deep_history();
    let len = manager.history().len();
    for index in 0..len {
        manager.navigate_to_index(index).expect("valid index");
        assert_eq!(manager.history().len(), len);
        assert_eq!(manager.history().current_index(), Some(index));
    }
    assert!(manager.navigate_to_index(len).is_none());
    assert_eq!(manager.history().current_index(), Some(len - 1));
}

#[test]
fn test_photos_docs_scenario() {
    let mut manager = NavigationManager::new();
    manager.go_home(PROVIDER, ACCOUNT);
    open(&mut manager, "p1", "Photos");
    open(&mut manager, "p2", "2024");
    manager.go_back();
    open(&mut manager, "d1", "Docs");

    assert_eq!(
        folder_ids(&manager),
        vec![None, Some("p1".to_string()), Some("d1".to_string())]
    );
    assert_eq!(manager.history().current_index(), Some(2));
    assert!(manager.go_forward().is_none());

    let labels: Vec<String> = manager
        .breadcrumbs("Home")
        .into_iter()
        .map(|item| item.label)
        .collect();
    assert_eq!(labels, vec!["Home", "Photos", "Docs"]);
}

#[test]
fn test_breadcrumbs_resolve_folders_sharing_a_name() {
    let mut manager = NavigationManager::new();
    manager.go_home(PROVIDER, ACCOUNT);
    open(&mut manager, "outer", "Backup");
    open(&mut manager, "inner", "Backup");
    open(&mut manager, "leaf", "Leaf");

    let crumbs = manager.breadcrumbs("Home");
    let inner = crumbs
        .iter()
        .find(|item| item.folder_id.as_deref() == Some("inner"))
        .cloned()
        .expect("inner crumb");

    let entry = manager.navigate_to_breadcrumb(&inner).expect("jump");
    assert_eq!(entry.folder_id.as_deref(), Some("inner"));
    assert_eq!(manager.history().current_index(), Some(2));
    assert!(manager.can_go_forward());
}

#[test]
fn test_path_segments_point_at_matching_history_entries() {
    let mut manager = deep_history();
    manager.navigate_to_index(2);
    open(&mut manager, "y", "Y");
    open(&mut manager, "z", "Z");

    let history = manager.history();
    for (index, entry) in history.entries().iter().enumerate() {
        for segment in &entry.path_components {
            assert!(segment.history_index <= index);
            let target = history.get(segment.history_index).expect("segment target");
            assert_eq!(target.folder_id, segment.folder_id);
        }
    }
}

#[test]
fn test_clear_history_on_account_switch() {
    let mut manager = deep_history();
    manager.clear_history();
    assert!(manager.history().is_empty());
    assert!(manager.breadcrumbs("Home").is_empty());

    manager.go_home(PROVIDER, "bob@example.com");
    assert_eq!(manager.scope(), Some((PROVIDER, "bob@example.com")));
}
