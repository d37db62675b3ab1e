use crate::support::*;
use tokio::sync::mpsc;
use vk_audience::audience::{AccountId, CrawlTarget, Segment, Sex, Status};
use vk_audience::crawler::{CrawlEvent, TargetError};
use vk_audience::storage::{lock_store, AudienceStore, RunStatus};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_group_two_pages_split_by_sex() {
    let server = MockServer::start().await;

    // 1400 members: odd ids female, even ids male
    let members: Vec<_> = (1..=1400)
        .map(|id| account(id, if id % 2 == 0 { 2 } else { 1 }))
        .collect();
    let (first, second) = members.split_at(1000);

    mount_page(
        &server,
        "groups.getMembers",
        ("group_id", "172840335"),
        0,
        items_body(first.to_vec()),
        1,
    )
    .await;
    mount_page(
        &server,
        "groups.getMembers",
        ("group_id", "172840335"),
        1000,
        items_body(second.to_vec()),
        1,
    )
    .await;
    // The short page at offset 1000 ends pagination
    mount_page(
        &server,
        "groups.getMembers",
        ("group_id", "172840335"),
        2000,
        items_body(vec![]),
        0,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    let mut coordinator = coordinator(&server, store.clone());

    let report = coordinator
        .run(&[CrawlTarget::Group("172840335".to_string())])
        .await
        .expect("Crawl failed");

    assert_eq!(report.targets.len(), 1);
    assert!(report.targets[0].is_clean());
    assert_eq!(report.targets[0].fetched, 1400);
    assert_eq!(report.total_inserted(), 1400);

    let guard = lock_store(&store).unwrap();
    assert_eq!(guard.count(Segment::All).unwrap(), 1400);
    assert_eq!(guard.count(Segment::Male).unwrap(), 700);
    assert_eq!(guard.count(Segment::Female).unwrap(), 700);
    assert_eq!(guard.count(Segment::New).unwrap(), 1400);
}

#[tokio::test]
async fn test_friends_error_still_fetches_followers() {
    let server = MockServer::start().await;

    mount_friends(
        &server,
        "374049794",
        error_body(30, "This profile is private"),
    )
    .await;
    mount_page(
        &server,
        "users.getFollowers",
        ("user_id", "374049794"),
        0,
        items_body(vec![account(11, 2), account(12, 1), account(13, 0)]),
        1,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut coordinator = coordinator(&server, store.clone()).with_events(tx);

    let report = coordinator
        .run(&[CrawlTarget::User("374049794".to_string())])
        .await
        .expect("Crawl failed");

    let target = &report.targets[0];
    assert_eq!(
        target.errors,
        vec![TargetError::Api {
            code: Some(30),
            message: "This profile is private".to_string(),
        }]
    );
    assert_eq!(target.inserted, 3);

    let events = drain(&mut rx);
    let progress: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, CrawlEvent::Progress { .. }))
        .collect();
    assert_eq!(
        progress,
        vec![&CrawlEvent::Progress {
            completed: 1,
            total: 1
        }]
    );
    assert!(events
        .iter()
        .any(|e| matches!(e, CrawlEvent::TargetFailed { .. })));
    assert!(matches!(events.last(), Some(CrawlEvent::Done(_))));

    assert_eq!(lock_store(&store).unwrap().count(Segment::All).unwrap(), 3);
}

#[tokio::test]
async fn test_failed_target_does_not_stop_siblings() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/groups.getMembers"))
        .and(query_param("group_id", "broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "groups.getMembers",
        ("group_id", "healthy"),
        0,
        items_body(vec![account(1, 2), account(2, 1)]),
        1,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut coordinator = coordinator(&server, store.clone()).with_events(tx);

    let report = coordinator
        .run(&[
            CrawlTarget::Group("broken".to_string()),
            CrawlTarget::Group("healthy".to_string()),
        ])
        .await
        .expect("Crawl failed");

    assert!(matches!(
        report.targets[0].errors.as_slice(),
        [TargetError::Transport { .. }]
    ));
    assert!(report.targets[1].is_clean());
    assert_eq!(report.total_inserted(), 2);

    let fractions: Vec<f64> = drain(&mut rx).iter().filter_map(|e| e.fraction()).collect();
    assert_eq!(fractions, vec![0.5, 1.0]);

    let run = lock_store(&store).unwrap().get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.accounts_inserted, 2);
}

#[tokio::test]
async fn test_deactivated_accounts_never_stored() {
    let server = MockServer::start().await;

    mount_friends(
        &server,
        "1",
        items_body(vec![account(100, 2), deactivated(101, "deleted")]),
    )
    .await;
    mount_page(
        &server,
        "users.getFollowers",
        ("user_id", "1"),
        0,
        items_body(vec![deactivated(102, "banned"), account(103, 1)]),
        1,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());
    let mut coordinator = coordinator(&server, store.clone());

    let report = coordinator
        .run(&[CrawlTarget::User("1".to_string())])
        .await
        .expect("Crawl failed");

    assert_eq!(report.targets[0].fetched, 4);
    assert_eq!(report.targets[0].accepted, 2);

    let guard = lock_store(&store).unwrap();
    assert!(guard.get_account(AccountId(101)).unwrap().is_none());
    assert!(guard.get_account(AccountId(102)).unwrap().is_none());
    assert_eq!(guard.count(Segment::All).unwrap(), 2);
}

#[tokio::test]
async fn test_second_run_marks_previous_accounts_old() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    {
        let server = MockServer::start().await;
        mount_page(
            &server,
            "groups.getMembers",
            ("group_id", "g"),
            0,
            items_body(vec![account(1, 2), account(2, 1)]),
            1,
        )
        .await;
        coordinator(&server, store.clone())
            .run(&[CrawlTarget::Group("g".to_string())])
            .await
            .expect("First crawl failed");
    }

    let server = MockServer::start().await;
    // Account 2 is seen again with a different sex; the first sighting wins
    mount_page(
        &server,
        "groups.getMembers",
        ("group_id", "g"),
        0,
        items_body(vec![account(2, 2), account(3, 2), account(4, 0)]),
        1,
    )
    .await;

    let report = coordinator(&server, store.clone())
        .run(&[CrawlTarget::Group("g".to_string())])
        .await
        .expect("Second crawl failed");

    assert_eq!(report.aged_out, 2);
    assert_eq!(report.total_inserted(), 2);

    let guard = lock_store(&store).unwrap();
    assert_eq!(guard.count(Segment::All).unwrap(), 4);
    assert_eq!(
        guard.export_segment(Segment::New).unwrap(),
        vec![AccountId(3), AccountId(4)]
    );
    assert_eq!(guard.count(Segment::NewMale).unwrap(), 1);

    let repeat = guard.get_account(AccountId(2)).unwrap().unwrap();
    assert_eq!(repeat.sex, Sex::Female);
    assert_eq!(repeat.status, Status::Old);
}

#[tokio::test]
async fn test_followers_error_midway_keeps_earlier_pages() {
    let server = MockServer::start().await;

    mount_friends(&server, "7", items_body(vec![account(1, 1)])).await;

    let full_page: Vec<_> = (1000..2000).map(|id| account(id, 2)).collect();
    mount_page(
        &server,
        "users.getFollowers",
        ("user_id", "7"),
        0,
        items_body(full_page),
        1,
    )
    .await;
    mount_page(
        &server,
        "users.getFollowers",
        ("user_id", "7"),
        1000,
        error_body(6, "Too many requests per second"),
        1,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    let report = coordinator(&server, store.clone())
        .run(&[CrawlTarget::User("7".to_string())])
        .await
        .expect("Crawl failed");

    assert_eq!(report.targets[0].inserted, 1001);
    assert!(matches!(
        report.targets[0].errors.as_slice(),
        [TargetError::Api { code: Some(6), .. }]
    ));
    assert_eq!(lock_store(&store).unwrap().count(Segment::Male).unwrap(), 1000);
}

#[tokio::test]
async fn test_storage_failure_fails_run_and_notifies() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "groups.getMembers",
        ("group_id", "a"),
        0,
        items_body(vec![account(1, 2), account(2, 1)]),
        1,
    )
    .await;
    mount_page(
        &server,
        "groups.getMembers",
        ("group_id", "b"),
        0,
        items_body(vec![account(3, 2)]),
        0,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    // Every insert into accounts now aborts
    let side = rusqlite::Connection::open(dir.path().join("vk_data.db")).unwrap();
    side.execute_batch(
        "CREATE TRIGGER reject_accounts BEFORE INSERT ON accounts
         BEGIN SELECT RAISE(ABORT, 'disk rejected'); END;",
    )
    .unwrap();
    drop(side);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut coordinator = coordinator(&server, store.clone()).with_events(tx);

    let result = coordinator
        .run(&[
            CrawlTarget::Group("a".to_string()),
            CrawlTarget::Group("b".to_string()),
        ])
        .await;
    assert!(result.is_err());

    let run = lock_store(&store).unwrap().get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);

    let events = drain(&mut rx);
    assert!(!events.iter().any(|e| matches!(e, CrawlEvent::Done(_))));
    match events.last() {
        Some(CrawlEvent::Failed { run_id, error }) => {
            assert_eq!(*run_id, run.id);
            assert!(error.contains("disk rejected"));
        }
        other => panic!("expected a Failed event last, got {:?}", other),
    }
}
