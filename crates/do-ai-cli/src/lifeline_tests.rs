// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn write_then_exists_then_removed() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path()).unwrap();
    assert!(exists(&path));
    std::fs::remove_file(&path).unwrap();
    assert!(!exists(&path));
}

#[test]
fn substitute_replaces_placeholder() {
    let path = std::path::PathBuf::from("/tmp/.do-ai.lock");
    let msg = substitute("remove {LOCK_FILE} to stop", &path);
    assert_eq!(msg, "remove /tmp/.do-ai.lock to stop");
}

#[test]
fn substitute_is_noop_without_placeholder() {
    let path = std::path::PathBuf::from("/tmp/.do-ai.lock");
    assert_eq!(substitute("hello", &path), "hello");
}
