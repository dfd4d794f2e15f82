use std::path::Path;
use std::sync::Arc;
use std::thread;

use plutonium_snapshot::SnapshotContext;

#[test]
fn index_increments_regardless_of_extension() {
    let ctx = SnapshotContext::new();
    let file = Path::new("tests/render.rs");
    let a = ctx.resolve_path(file, "quads", "ext1");
    let b = ctx.resolve_path(file, "quads", "ext2");
    let c = ctx.resolve_path(file, "quads", "ext3");
    assert!(a.to_string_lossy().ends_with(".0.ext1"));
    assert!(b.to_string_lossy().ends_with(".1.ext2"));
    assert!(c.to_string_lossy().ends_with(".2.ext3"));
}

#[test]
fn sequential_assertions_get_distinct_files() {
    let ctx = SnapshotContext::new();
    let first = ctx.resolve_path(Path::new("a.test"), "clear", "png");
    let second = ctx.resolve_path(Path::new("a.test"), "clear", "png");
    assert_eq!(first, Path::new("__snapshots__/a.test.clear.0.png"));
    assert_eq!(second, Path::new("__snapshots__/a.test.clear.1.png"));
}

#[test]
fn fresh_context_reproduces_paths() {
    let file = Path::new("/work/tests/scenes.rs");
    let run = || {
        let ctx = SnapshotContext::new();
        (0..3)
            .map(|_| ctx.resolve_path(file, "Texture Storage", "snap"))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
    assert_eq!(
        run()[2],
        Path::new("/work/tests/__snapshots__/scenes.rs.texture-storage.2.snap")
    );
}

#[test]
fn same_name_in_different_files_is_independent() {
    let ctx = SnapshotContext::new();
    ctx.resolve(Path::new("tests/a.rs"), "clear");
    let key = ctx.resolve(Path::new("tests/b.rs"), "clear");
    assert_eq!(key.sequence_index, 0);
    assert_eq!(key.test_name, "clear");
    assert_eq!(key.source_file, Path::new("tests/b.rs"));
}

#[test]
fn concurrent_resolution_hands_out_each_index_once() {
    let ctx = Arc::new(SnapshotContext::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || {
                (0..25)
                    .map(|_| ctx.resolve(Path::new("tests/par.rs"), "shared").sequence_index)
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen: Vec<usize> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..200).collect::<Vec<_>>());
    assert_eq!(ctx.count(Path::new("tests/par.rs"), "shared"), 200);
}
