use crate::support::*;
use std::fs;
use vk_audience::audience::{CrawlTarget, Segment};
use vk_audience::output::{load_statistics, AudienceExporter, ExportError};
use vk_audience::storage::lock_store;
use wiremock::MockServer;

/// Crawls one group whose members are given as (id, sex) pairs
async fn crawl_group(members: Vec<(i64, i64)>) -> (tempfile::TempDir, vk_audience::storage::SharedStore) {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "groups.getMembers",
        ("group_id", "g"),
        0,
        items_body(members.into_iter().map(|(id, sex)| account(id, sex)).collect()),
        1,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    coordinator(&server, store.clone())
        .run(&[CrawlTarget::Group("g".to_string())])
        .await
        .expect("Crawl failed");

    (dir, store)
}

#[tokio::test]
async fn test_export_refuses_99_and_writes_nothing() {
    let (dir, store) = crawl_group((1..=99).map(|id| (id, 2)).collect()).await;
    let out_dir = dir.path().join("exports");
    let exporter = AudienceExporter::new(&out_dir);

    let result = {
        let guard = lock_store(&store).unwrap();
        exporter.export(&*guard, Segment::Male)
    };

    match result {
        Err(ExportError::MinimumSize {
            segment,
            count,
            min_size,
        }) => {
            assert_eq!(segment, Segment::Male);
            assert_eq!(count, 99);
            assert_eq!(min_size, 100);
        }
        other => panic!("expected MinimumSize, got {:?}", other),
    }
    assert!(!exporter.path_for(Segment::Male).exists());
    assert!(!out_dir.exists());
}

#[tokio::test]
async fn test_export_100_rows_in_upload_format() {
    let (dir, store) = crawl_group((1..=100).map(|id| (id * 10, 1)).collect()).await;
    let exporter = AudienceExporter::new(dir.path().join("exports"));

    let path = {
        let guard = lock_store(&store).unwrap();
        exporter.export(&*guard, Segment::NewFemale).unwrap()
    };

    assert!(path.ends_with("vk_audience_new_female.csv"));
    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();

    assert_eq!(lines.len(), 101);
    assert_eq!(lines[0], "phone,email,ok,vk,vid,gaid,idfa");
    assert_eq!(lines[1], ",,,10,,,");
    assert_eq!(lines[100], ",,,1000,,,");
    assert!(content.ends_with('\n'));
    assert!(!content.contains('\r'));
    assert!(lines[1..].iter().all(|line| line.split(',').count() == 7));
}

#[tokio::test]
async fn test_unknown_sex_counts_toward_all_and_new_only() {
    let members: Vec<(i64, i64)> = (1..=120).map(|id| (id, 0)).collect();
    let (dir, store) = crawl_group(members).await;
    let exporter = AudienceExporter::new(dir.path());

    let guard = lock_store(&store).unwrap();
    let stats = load_statistics(&*guard).unwrap();
    assert_eq!(stats.total, 120);
    assert_eq!(stats.new, 120);
    assert_eq!(stats.male + stats.female, 0);

    assert!(exporter.export(&*guard, Segment::All).is_ok());
    assert!(exporter.export(&*guard, Segment::New).is_ok());
    assert!(matches!(
        exporter.export(&*guard, Segment::Female),
        Err(ExportError::MinimumSize { count: 0, .. })
    ));
}
