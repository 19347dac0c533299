use super::*;

#[test]
fn allocated_paths_are_unique_and_inside_the_workspace() {
    let mut ws = TempWorkspace::new().unwrap();
    let a = ws.alloc(".png");
    let b = ws.alloc(".png");
    assert_ne!(a, b);
    assert!(a.starts_with(ws.path()));
    assert_eq!(a.extension().unwrap(), "png");
}

#[test]
fn concurrent_workspaces_use_distinct_directories() {
    let root = tempfile::tempdir().unwrap();
    let a = TempWorkspace::new_in(root.path()).unwrap();
    let b = TempWorkspace::new_in(root.path()).unwrap();
    assert_ne!(a.path(), b.path());
}

#[test]
fn write_read_release_roundtrip() {
    let mut ws = TempWorkspace::new().unwrap();
    let path = ws.write(b"abc", ".bin").unwrap();
    assert_eq!(ws.read(&path).unwrap(), b"abc");

    ws.release(&[path.as_path()]).unwrap();
    assert!(!path.exists());
    assert!(matches!(ws.read(&path), Err(StowError::FileSystem(_))));
}

#[test]
fn dropping_the_workspace_removes_leftover_files() {
    let root = tempfile::tempdir().unwrap();
    let (dir, leftover) = {
        let mut ws = TempWorkspace::new_in(root.path()).unwrap();
        let leftover = ws.write(b"orphan", ".webp").unwrap();
        (ws.path().to_path_buf(), leftover)
    };
    assert!(!leftover.exists());
    assert!(!dir.exists());
}
