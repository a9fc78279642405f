//! Store-level guarantees exercised end to end against a real directory.

use std::collections::BTreeSet;
use std::fs;

use proptest::prelude::*;
use quire_store::{
    ImageUpload, OpenStatus, PublicationStore, PublishRequest, StoreConfig, StoreError,
    INDEX_FILE, PUBLICATIONS_DIR,
};
use tempfile::tempdir;

fn png(name: &str) -> ImageUpload {
    ImageUpload::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
}

fn open(dir: &std::path::Path) -> PublicationStore {
    PublicationStore::open(dir, StoreConfig::default()).unwrap()
}

#[test]
fn filenames_stay_unique_across_republishes() {
    let dir = tempdir().unwrap();
    let store = open(dir.path());

    let a = store.publish(PublishRequest::new("a.md", "1")).unwrap();
    let b = store.publish(PublishRequest::new("a.md", "2")).unwrap();
    let c = store.publish(PublishRequest::new("c.md", "3")).unwrap();

    assert_eq!(a.id, b.id);
    assert_ne!(a.id, c.id);
    assert_eq!(store.list().unwrap().len(), 2);
}

#[test]
fn every_listed_image_is_readable() {
    let dir = tempdir().unwrap();
    let store = open(dir.path());
    let out = store
        .publish(
            PublishRequest::new("doc.md", "x")
                .with_image(png("a.png"))
                .with_image(png("../b.png"))
                .with_image(png("c d.png")),
        )
        .unwrap();

    let record = store.lookup_by_id(&out.id).unwrap().unwrap();
    assert_eq!(record.images, vec!["a.png", "__b.png", "c_d.png"]);
    for name in &record.images {
        assert!(store.read_image(&out.id, name).unwrap().is_some(), "{name}");
    }
    assert!(store.check_integrity().unwrap().is_clean());
}

#[test]
fn delete_is_idempotent() {
    let dir = tempdir().unwrap();
    let store = open(dir.path());
    let out = store.publish(PublishRequest::new("doc.md", "x")).unwrap();

    assert!(store.delete(&out.id).unwrap());
    let index_before = fs::read(dir.path().join(INDEX_FILE)).unwrap();
    assert!(!store.delete(&out.id).unwrap());
    assert_eq!(fs::read(dir.path().join(INDEX_FILE)).unwrap(), index_before);
}

#[test]
fn replacing_removes_unreferenced_images() {
    let dir = tempdir().unwrap();
    let store = open(dir.path());
    let first = store
        .publish(
            PublishRequest::new("doc.md", "x")
                .with_image(png("keep.png"))
                .with_image(png("drop.png")),
        )
        .unwrap();

    let second = store
        .publish(PublishRequest::new("doc.md", "y").with_image(png("keep.png")))
        .unwrap();

    assert_eq!(second.save.removed, vec!["drop.png"]);
    let images = dir
        .path()
        .join(PUBLICATIONS_DIR)
        .join(first.id.to_hex())
        .join("images");
    assert!(images.join("keep.png").exists());
    assert!(!images.join("drop.png").exists());
    assert!(store.read_image(&first.id, "drop.png").unwrap().is_none());
}

#[test]
fn committed_saves_survive_reopen() {
    let dir = tempdir().unwrap();
    let id = {
        let store = open(dir.path());
        store
            .publish(
                PublishRequest::new("doc.md", "# Hello")
                    .with_title("Hello")
                    .with_password_hash("$argon2id$stub"),
            )
            .unwrap()
            .id
    };

    let store = open(dir.path());
    let record = store.lookup_by_filename("doc.md").unwrap().unwrap();
    assert_eq!(record.id, id);
    assert_eq!(record.title.as_deref(), Some("Hello"));
    assert!(record.is_protected());
    assert_eq!(store.read_content(&id).unwrap().as_deref(), Some("# Hello"));
}

#[test]
fn corrupt_index_is_quarantined_and_rebuilt() {
    let dir = tempdir().unwrap();
    let ids: BTreeSet<_> = {
        let store = open(dir.path());
        (0..4)
            .map(|n| {
                store
                    .publish(
                        PublishRequest::new(format!("doc-{n}.md"), format!("body {n}"))
                            .with_title("lost")
                            .with_image(png("a.png")),
                    )
                    .unwrap()
                    .id
            })
            .collect()
    };
    fs::write(dir.path().join(INDEX_FILE), b"{ not json").unwrap();

    let store = open(dir.path());
    let OpenStatus::Recovered(report) = store.open_status() else {
        panic!("expected recovery, got {:?}", store.open_status());
    };
    assert_eq!(report.recovered, 4);
    let quarantined = report.quarantined.as_ref().unwrap();
    assert_eq!(fs::read(quarantined).unwrap(), b"{ not json");

    let records = store.list().unwrap();
    let recovered: BTreeSet<_> = records.iter().map(|r| r.id).collect();
    assert_eq!(recovered, ids);
    for record in &records {
        assert_eq!(record.filename, record.id.to_hex());
        assert!(record.title.is_none());
        assert!(record.images.is_empty());
        assert!(store.read_content(&record.id).unwrap().is_some());
    }

    // The rebuilt index is durable.
    drop(store);
    let store = open(dir.path());
    assert_eq!(store.open_status(), &OpenStatus::Loaded { publications: 4 });
}

#[test]
fn recovery_skips_directories_without_content() {
    let dir = tempdir().unwrap();
    let kept = {
        let store = open(dir.path());
        store.publish(PublishRequest::new("a.md", "a")).unwrap().id
    };
    let empty = quire_store::PublicationId::generate();
    fs::create_dir_all(dir.path().join(PUBLICATIONS_DIR).join(empty.to_hex())).unwrap();
    fs::write(dir.path().join(INDEX_FILE), b"").unwrap();

    let store = open(dir.path());
    assert!(matches!(store.open_status(), OpenStatus::Recovered(_)));
    assert!(store.lookup_by_id(&kept).unwrap().is_some());
    assert!(store.lookup_by_id(&empty).unwrap().is_none());
}

#[test]
fn second_claim_on_filename_is_refused() {
    let dir = tempdir().unwrap();
    let store = open(dir.path());
    let owner = store.publish(PublishRequest::new("a.md", "a")).unwrap().id;
    let other = store.publish(PublishRequest::new("b.md", "b")).unwrap().id;

    let mut record = store.lookup_by_id(&other).unwrap().unwrap();
    record.filename = "a.md".into();
    let err = store
        .create_or_replace(&other, "b", record, Vec::new())
        .unwrap_err();
    assert!(matches!(err, StoreError::FilenameTaken { owner: o, .. } if o == owner));
    assert_eq!(store.lookup_by_filename("b.md").unwrap().unwrap().id, other);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // After any sequence of publishes and deletes, the filename mapping and
    // the record set agree and every retained image exists on disk.
    #[test]
    fn index_and_disk_agree(ops in prop::collection::vec((0u8..4, any::<bool>(), 0usize..3), 1..12)) {
        let dir = tempdir().unwrap();
        let store = open(dir.path());
        let mut live = BTreeSet::new();

        for (slot, delete, images) in ops {
            let filename = format!("doc-{slot}.md");
            if delete {
                if let Some(rec) = store.lookup_by_filename(&filename).unwrap() {
                    prop_assert!(store.delete(&rec.id).unwrap());
                    live.remove(&filename);
                }
            } else {
                let mut req = PublishRequest::new(filename.clone(), "body");
                for i in 0..images {
                    req = req.with_image(png(&format!("img-{i}.png")));
                }
                let out = store.publish(req).unwrap();
                prop_assert_eq!(out.save.accepted, images);
                live.insert(filename);
            }
        }

        let records = store.list().unwrap();
        let names: BTreeSet<_> = records.iter().map(|r| r.filename.clone()).collect();
        prop_assert_eq!(names, live);
        prop_assert!(store.check_integrity().unwrap().is_clean());
    }
}
