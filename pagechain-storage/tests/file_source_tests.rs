use pagechain_result::Error;
use pagechain_storage::{DatasetImage, FileSource, PageSource, ReadOptions};
use std::ops::Range;

fn u64s(values: Range<u64>) -> Vec<u8> {
    values.flat_map(u64::to_le_bytes).collect()
}

fn runs_image() -> DatasetImage {
    let mut b = DatasetImage::builder("runs");
    b.column("lumi", "u64", 8);
    b.cluster(4, vec![u64s(0..4)]).unwrap();
    b.cluster(4, vec![u64s(4..8)]).unwrap();
    b.finish()
}

#[test]
fn attach_reads_and_verifies_the_stored_dataset() {
    pagechain_test_utils::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs.pcd");
    runs_image().write_to(&path).unwrap();

    let mut source = FileSource::new("runs", &path, ReadOptions::default());
    assert!(!source.is_attached());
    assert!(matches!(
        source.populate_page_at(0, 0),
        Err(Error::NotAttached)
    ));

    source.attach().unwrap();
    assert_eq!(source.entry_count().unwrap(), 8);

    let page = source.populate_page_at(0, 5).unwrap();
    assert_eq!(page.global_range_first(), 4);
    assert_eq!(page.cluster().id, 1);
    assert_eq!(page.as_slice(), u64s(4..8));
    source.release_page(page).unwrap();
}

#[test]
fn attach_rejects_the_wrong_dataset_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs.pcd");
    runs_image().write_to(&path).unwrap();

    let mut source = FileSource::new("muons", &path, ReadOptions::default());
    assert!(matches!(source.attach(), Err(Error::Corrupt(_))));
    assert!(!source.is_attached());
}

#[test]
fn attach_surfaces_io_and_decode_failures() {
    let dir = tempfile::tempdir().unwrap();

    let mut missing = FileSource::new("runs", dir.path().join("nope.pcd"), ReadOptions::default());
    assert!(matches!(missing.attach(), Err(Error::Io(_))));

    let garbled = dir.path().join("garbled.pcd");
    std::fs::write(&garbled, b"not a dataset image").unwrap();
    let mut source = FileSource::new("runs", &garbled, ReadOptions::default());
    assert!(matches!(source.attach(), Err(Error::Corrupt(_))));
}

#[test]
fn clones_reopen_the_same_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs.pcd");
    runs_image().write_to(&path).unwrap();

    let mut source = FileSource::new("runs", &path, ReadOptions::default());
    source.attach().unwrap();

    let mut twin = source.clone_source().unwrap();
    assert!(!twin.is_attached());
    twin.attach().unwrap();
    assert_eq!(twin.entry_count().unwrap(), 8);
    assert_eq!(twin.descriptor().unwrap(), source.descriptor().unwrap());
}

#[test]
fn validation_can_be_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs.pcd");
    runs_image().write_to(&path).unwrap();

    let options = ReadOptions {
        validate_on_attach: false,
    };
    let mut source = FileSource::new("runs", &path, options);
    source.attach().unwrap();
    assert_eq!(source.entry_count().unwrap(), 8);
}
