//! Behavioral checks run against both backends.
//!
//! Every `check_*` function is generic over [`FsFull`] and runs once with a
//! [`TreeNodeStore`] and once with a temporary [`FlatRecordStore`]. The two
//! backends must agree on everything except directory size.

use vfstore::*;

fn tree() -> TreeNodeStore {
    TreeNodeStore::new()
}

fn flat() -> FlatRecordStore {
    let fs = FlatRecordStore::new(StoreConfig::temporary());
    fs.load("integration").unwrap();
    fs
}

macro_rules! both_backends {
    ($($check:ident),* $(,)?) => {
        mod tree_backend {
            use super::*;
            $(#[test] fn $check() { super::$check(&tree()); })*
        }
        mod flat_backend {
            use super::*;
            $(#[test] fn $check() { super::$check(&flat()); })*
        }
    };
}

/// Like `both_backends!`, for checks that need two independent stores.
macro_rules! both_backends_paired {
    ($($check:ident),* $(,)?) => {
        mod tree_pair {
            use super::*;
            $(#[test] fn $check() { super::$check(&tree(), &tree()); })*
        }
        mod flat_pair {
            use super::*;
            $(#[test] fn $check() { super::$check(&flat(), &flat()); })*
        }
    };
}

both_backends!(
    check_write_read_round_trip,
    check_wrong_kind,
    check_missing_parent,
    check_recursive_delete,
    check_root_is_protected,
    check_move_rules,
    check_rename_overwrite,
    check_copy_is_deep_and_fresh,
    check_chmod_depth,
    check_listing,
    check_touch_and_append,
    check_normalized_paths,
    check_clear,
    check_export_import_into_fresh_store,
    check_implicit_directories_touch_parent,
);

both_backends_paired!(check_empty_export_into_fresh_store);

// =============================================================================
// Checks
// =============================================================================

fn check_write_read_round_trip<B: FsFull>(fs: &B) {
    fs.create_dir("/d").unwrap();
    fs.write("/d/f.txt", "first").unwrap();
    assert_eq!(fs.read_to_string("/d/f.txt").unwrap(), "first");

    fs.write("/d/f.txt", "second").unwrap();
    assert_eq!(fs.read_to_string("/d/f.txt").unwrap(), "second");

    let meta = fs.metadata("/d/f.txt").unwrap();
    assert!(meta.is_file());
    assert_eq!(meta.size, 6);
    assert_eq!(meta.permissions, Permissions::default_file());
    assert!(meta.modified >= meta.created);
}

fn check_wrong_kind<B: FsFull>(fs: &B) {
    fs.create_dir("/d").unwrap();
    fs.write("/f", "x").unwrap();

    let err = fs.read_to_string("/d").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WrongKind);

    let err = fs.read_dir("/f").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WrongKind);

    let err = fs.write("/d", "over a directory").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WrongKind);
    assert!(fs.metadata("/d").unwrap().is_dir());

    let err = fs.create_dir("/f").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WrongKind);
    fs.create_dir("/d").unwrap();
}

fn check_missing_parent<B: FsFull>(fs: &B) {
    let err = fs.write("/nope/f.txt", "x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!fs.exists("/nope").unwrap());

    fs.create_dir_all("/a/b/c").unwrap();
    fs.write("/a/b/c/f.txt", "deep").unwrap();
    assert_eq!(fs.read_to_string("/a/b/c/f.txt").unwrap(), "deep");
}

fn check_recursive_delete<B: FsFull>(fs: &B) {
    fs.create_dir_all("/a/b/c").unwrap();
    fs.write("/a/x.txt", "1").unwrap();
    fs.write("/a/b/y.txt", "2").unwrap();
    fs.write("/a/b/c/z.txt", "3").unwrap();
    fs.create_dir("/ab").unwrap();

    fs.remove("/a").unwrap();
    for gone in ["/a", "/a/x.txt", "/a/b", "/a/b/y.txt", "/a/b/c", "/a/b/c/z.txt"] {
        assert!(!fs.exists(gone).unwrap(), "{gone} should be gone");
    }
    assert!(fs.exists("/ab").unwrap());
    assert_eq!(fs.walk("/").unwrap(), vec!["/", "/ab"]);

    let err = fs.remove("/a").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

fn check_root_is_protected<B: FsFull>(fs: &B) {
    for spelled in ["/", "", "//", "/a/.."] {
        assert_eq!(fs.remove(spelled).unwrap_err().kind(), ErrorKind::InvalidPath);
    }
    fs.create_dir("/d").unwrap();
    assert_eq!(fs.rename("/", "/x", false).unwrap_err().kind(), ErrorKind::InvalidPath);
    assert_eq!(fs.move_to("/d", "/").unwrap_err().kind(), ErrorKind::InvalidPath);
    assert_eq!(fs.copy("/", "/d/root").unwrap_err().kind(), ErrorKind::InvalidPath);
    assert_eq!(fs.write("/", "x").unwrap_err().kind(), ErrorKind::InvalidPath);
    assert!(fs.metadata("/").unwrap().is_dir());
}

fn check_move_rules<B: FsFull>(fs: &B) {
    fs.create_dir_all("/a/b").unwrap();
    fs.write("/a/b/f.txt", "payload").unwrap();
    fs.create_dir("/c").unwrap();

    let err = fs.move_to("/a", "/a/b/inside").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SelfContainment);

    let err = fs.move_to("/a", "/c").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    let err = fs.move_to("/missing", "/z").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    fs.move_to("/a", "/c/moved").unwrap();
    assert!(!fs.exists("/a").unwrap());
    assert!(!fs.exists("/a/b/f.txt").unwrap());
    assert_eq!(fs.read_to_string("/c/moved/b/f.txt").unwrap(), "payload");
    assert_eq!(
        fs.walk("/c").unwrap(),
        vec!["/c", "/c/moved", "/c/moved/b", "/c/moved/b/f.txt"]
    );
}

fn check_rename_overwrite<B: FsFull>(fs: &B) {
    fs.create_dir("/src").unwrap();
    fs.write("/src/keep.txt", "new").unwrap();
    fs.create_dir("/dst").unwrap();
    fs.write("/dst/old.txt", "old").unwrap();

    let err = fs.rename("/src", "/dst", false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert!(fs.exists("/src/keep.txt").unwrap());

    fs.rename("/src", "/dst", true).unwrap();
    assert!(!fs.exists("/src").unwrap());
    assert!(!fs.exists("/dst/old.txt").unwrap());
    assert_eq!(fs.read_to_string("/dst/keep.txt").unwrap(), "new");

    // Replacing an ancestor of the source would delete the source itself.
    fs.create_dir("/dst/inner").unwrap();
    let err = fs.rename("/dst/inner", "/dst", true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SelfContainment);

    // Renaming onto itself is a no-op.
    fs.rename("/dst", "/dst/", false).unwrap();
    assert!(fs.exists("/dst/inner").unwrap());
}

fn check_copy_is_deep_and_fresh<B: FsFull>(fs: &B) {
    fs.create_dir_all("/orig/sub").unwrap();
    fs.write("/orig/sub/f.txt", "data").unwrap();
    let before = fs.metadata("/orig/sub/f.txt").unwrap();

    fs.copy("/orig", "/dup").unwrap();
    assert_eq!(fs.read_to_string("/dup/sub/f.txt").unwrap(), "data");
    let copied = fs.metadata("/dup/sub/f.txt").unwrap();
    assert!(copied.created >= before.modified);

    fs.write("/dup/sub/f.txt", "changed").unwrap();
    assert_eq!(fs.read_to_string("/orig/sub/f.txt").unwrap(), "data");

    assert_eq!(fs.copy("/orig", "/dup").unwrap_err().kind(), ErrorKind::AlreadyExists);
    assert_eq!(
        fs.copy("/orig", "/orig/sub/again").unwrap_err().kind(),
        ErrorKind::SelfContainment
    );
}

fn check_chmod_depth<B: FsFull>(fs: &B) {
    fs.create_dir_all("/p/q/r").unwrap();
    fs.write("/p/q/r/f", "").unwrap();
    let mode = Permissions::from_mode(0o700);

    fs.set_permissions("/p", mode, ChmodDepth::Limited(0)).unwrap();
    assert_eq!(fs.metadata("/p").unwrap().permissions, mode);
    assert_eq!(fs.metadata("/p/q").unwrap().permissions, Permissions::default_dir());

    fs.set_permissions("/p", mode, ChmodDepth::Limited(1)).unwrap();
    assert_eq!(fs.metadata("/p/q").unwrap().permissions, mode);
    assert_eq!(fs.metadata("/p/q/r").unwrap().permissions, Permissions::default_dir());

    fs.set_permissions("/p", mode, ChmodDepth::Unlimited).unwrap();
    for path in ["/p", "/p/q", "/p/q/r", "/p/q/r/f"] {
        assert_eq!(fs.metadata(path).unwrap().permissions, mode, "{path}");
    }

    let err = fs
        .set_permissions("/none", mode, ChmodDepth::Unlimited)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

fn check_listing<B: FsFull>(fs: &B) {
    fs.create_dir("/l").unwrap();
    fs.write("/l/b.txt", "bb").unwrap();
    fs.write("/l/a.txt", "a").unwrap();
    fs.create_dir("/l/sub").unwrap();
    fs.write("/l/sub/deep.txt", "").unwrap();

    let entries = fs.read_dir("/l").unwrap().collect_all();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);
    assert_eq!(entries[1].path, "/l/b.txt");
    assert_eq!(entries[1].size, 2);

    assert_eq!(fs.list("/l", ListFilter::Directories).unwrap(), vec!["sub"]);
    assert_eq!(fs.list("/l", ListFilter::Files).unwrap(), vec!["a.txt", "b.txt"]);
    assert_eq!(fs.path_type("/l/sub").unwrap(), "directory");
    assert_eq!(fs.path_type("/l/none").unwrap(), "none");
}

fn check_touch_and_append<B: FsFull>(fs: &B) {
    fs.create_dir("/t").unwrap();
    fs.touch("/t/new").unwrap();
    assert_eq!(fs.read_to_string("/t/new").unwrap(), "");

    fs.append("/t/new", "ab").unwrap();
    fs.append("/t/new", "cd").unwrap();
    assert_eq!(fs.read_to_string("/t/new").unwrap(), "abcd");

    let before = fs.metadata("/t/new").unwrap();
    fs.touch("/t/new").unwrap();
    let after = fs.metadata("/t/new").unwrap();
    assert_eq!(after.created, before.created);
    assert!(after.modified >= before.modified);
    assert_eq!(fs.read_to_string("/t/new").unwrap(), "abcd");

    assert_eq!(fs.append("/t/missing", "x").unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(fs.append("/t", "x").unwrap_err().kind(), ErrorKind::WrongKind);
}

fn check_normalized_paths<B: FsFull>(fs: &B) {
    fs.create_dir("a").unwrap();
    fs.write("//a/./b.txt/", "x").unwrap();
    assert_eq!(fs.read_to_string("/a/b.txt").unwrap(), "x");
    assert_eq!(fs.read_to_string("/a/../a/b.txt").unwrap(), "x");
    assert_eq!(fs.read_to_string("/../../a/b.txt").unwrap(), "x");
}

fn check_clear<B: FsFull>(fs: &B) {
    fs.create_dir_all("/x/y").unwrap();
    fs.clear().unwrap();
    assert_eq!(fs.walk("/").unwrap(), vec!["/"]);
    assert!(fs.metadata("/").unwrap().is_dir());
}

fn check_export_import_into_fresh_store<B: FsFull>(fs: &B) {
    fs.create_dir_all("/docs/old").unwrap();
    fs.write("/docs/readme.md", "# hi").unwrap();
    fs.set_permissions("/docs/readme.md", Permissions::from_mode(0o600), ChmodDepth::Limited(0))
        .unwrap();
    let meta = fs.metadata("/docs/readme.md").unwrap();
    let document = fs.export_document().unwrap();
    let paths = fs.walk("/").unwrap();

    fs.clear().unwrap();
    fs.write("/stray.txt", "gone after import").unwrap();

    fs.import_document(&document).unwrap();
    assert_eq!(fs.walk("/").unwrap(), paths);
    assert_eq!(fs.read_to_string("/docs/readme.md").unwrap(), "# hi");
    assert_eq!(fs.metadata("/docs/readme.md").unwrap(), meta);

    let packed = codec::compact(&document).unwrap();
    fs.clear().unwrap();
    fs.import_document(&codec::expand(&packed).unwrap()).unwrap();
    assert_eq!(fs.walk("/").unwrap(), paths);

    let err = fs.import_document("not json at all").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ImportValidationFailure);
    assert_eq!(fs.walk("/").unwrap(), paths);
}

fn check_implicit_directories_touch_parent<B: FsFull>(fs: &B) {
    let before = fs.metadata("/").unwrap().modified;
    std::thread::sleep(std::time::Duration::from_millis(5));
    fs.create_dir_all("/x/y").unwrap();

    assert!(fs.metadata("/").unwrap().modified > before);
    assert!(fs.metadata("/x").unwrap().is_dir());
    assert!(fs.metadata("/x/y").unwrap().is_dir());
}

fn check_empty_export_into_fresh_store<B: FsFull>(source: &B, target: &B) {
    let document = source.export_document().unwrap();
    target.import_document(&document).unwrap();

    assert!(target.list("/", ListFilter::All).unwrap().is_empty());
    assert_eq!(target.walk("/").unwrap(), vec!["/"]);
    assert!(target.metadata("/").unwrap().is_dir());
}

// =============================================================================
// Backend-specific behavior
// =============================================================================

#[test]
fn directory_size_differs_by_backend() {
    fn populate<B: Fs>(fs: &B) {
        fs.create_dir_all("/d/sub").unwrap();
        fs.write("/d/a.txt", "12345").unwrap();
        fs.write("/d/sub/b.txt", "123").unwrap();
    }

    let t = tree();
    populate(&t);
    assert_eq!(t.dir_size("/d").unwrap(), 2);

    let f = flat();
    populate(&f);
    assert_eq!(f.dir_size("/d").unwrap(), 8);
}

#[test]
fn durable_namespace_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        data_dir: dir.path().to_path_buf(),
        flush_on_commit: true,
        ..StoreConfig::default()
    };

    {
        let fs = FlatRecordStore::new(config.clone());
        fs.load("notes").unwrap();
        fs.create_dir("/inbox").unwrap();
        fs.write("/inbox/todo.txt", "ship it").unwrap();
    }
    assert!(config.namespace_dir("notes").exists());

    let fs = FlatRecordStore::new(config);
    fs.load("notes").unwrap();
    assert_eq!(fs.read_to_string("/inbox/todo.txt").unwrap(), "ship it");

    fs.load("other").unwrap();
    assert_eq!(fs.namespace().as_deref(), Some("other"));
    assert!(!fs.exists("/inbox").unwrap());
}

#[test]
fn create_parents_applies_to_both_backends() {
    let config = StoreConfig {
        create_parents: true,
        ..StoreConfig::temporary()
    };

    let t = TreeNodeStore::with_config(&config);
    t.write("/x/y/z.txt", "auto").unwrap();
    assert!(t.metadata("/x/y").unwrap().is_dir());

    let f = FlatRecordStore::new(config);
    f.load("parents").unwrap();
    f.write("/x/y/z.txt", "auto").unwrap();
    assert!(f.metadata("/x/y").unwrap().is_dir());
    assert_eq!(f.walk("/").unwrap(), t.walk("/").unwrap());
}

#[test]
fn generic_code_accepts_trait_objects() {
    fn touch_all(fs: &dyn Fs, paths: &[&str]) -> Result<(), FsError> {
        for path in paths {
            fs.touch(path)?;
        }
        Ok(())
    }

    let t = tree();
    touch_all(&t, &["/a", "/b"]).unwrap();
    assert_eq!(t.walk("/").unwrap(), vec!["/", "/a", "/b"]);
}
