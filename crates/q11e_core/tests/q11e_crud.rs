use q11e_core::db::migrations::latest_version;
use q11e_core::db::open_db_in_memory;
use q11e_core::{
    CancellationToken, MbtiType, Page, Q11e, Q11eListQuery, Q11eRepository, Q11eValidationError,
    RepoError, RepositoryBase, RequestContext, SqliteQ11eRepository, UpsertOutcome,
};
use rusqlite::Connection;
use std::time::Instant;

fn sample(address: &str) -> Q11e {
    Q11e {
        address: address.to_string(),
        goals: vec!["learn".to_string()],
        interests: vec!["art".to_string()],
        pref1: "a".to_string(),
        pref2: "b".to_string(),
        pref3: "c".to_string(),
        mbti: 2,
    }
}

#[test]
fn missing_address_yields_absent_result() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQ11eRepository::try_new(&conn).unwrap();
    let ctx = RequestContext::background();

    assert_eq!(repo.get_by_address(&ctx, "0xABC").unwrap(), None);
    assert_eq!(
        repo.check_and_get_exists_by_addr(&ctx, "0xABC").unwrap(),
        (false, None)
    );
}

#[test]
fn stored_record_is_returned_by_address() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQ11eRepository::try_new(&conn).unwrap();
    let ctx = RequestContext::background();

    let record = sample("0xABC");
    repo.insert(&ctx, &record).unwrap();

    let loaded = repo.get_by_address(&ctx, "0xABC").unwrap().unwrap();
    assert_eq!(loaded, record);
    assert_eq!(loaded.mbti_type(), Some(MbtiType::Infj));

    let (exists, found) = repo.check_and_get_exists_by_addr(&ctx, "0xABC").unwrap();
    assert!(exists);
    assert_eq!(found, Some(record));
}

#[test]
fn existence_flag_matches_record_presence() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQ11eRepository::try_new(&conn).unwrap();
    let ctx = RequestContext::background();

    repo.insert(&ctx, &sample("0x1")).unwrap();
    repo.insert(&ctx, &sample("0x2")).unwrap();

    for address in ["0x1", "0x2", "0x3", "", "0X1"] {
        let (exists, found) = repo.check_and_get_exists_by_addr(&ctx, address).unwrap();
        assert_eq!(exists, found.is_some(), "inconsistent result for `{address}`");
    }
}

#[test]
fn address_lookup_is_exact_match() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQ11eRepository::try_new(&conn).unwrap();
    let ctx = RequestContext::background();

    repo.insert(&ctx, &sample("0xABC")).unwrap();

    assert!(repo.get_by_address(&ctx, "0xabc").unwrap().is_none());
    assert!(repo.get_by_address(&ctx, "   ").unwrap().is_none());
}

#[test]
fn goal_and_interest_order_is_preserved() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQ11eRepository::try_new(&conn).unwrap();
    let ctx = RequestContext::background();

    let mut record = sample("0xORDER");
    record.goals = vec!["ship".into(), "learn".into(), "ship".into()];
    record.interests = vec![];
    repo.insert(&ctx, &record).unwrap();

    let loaded = repo.get_by_address(&ctx, "0xORDER").unwrap().unwrap();
    assert_eq!(loaded.goals, vec!["ship", "learn", "ship"]);
    assert!(loaded.interests.is_empty());
}

#[test]
fn duplicate_address_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQ11eRepository::try_new(&conn).unwrap();
    let ctx = RequestContext::background();

    repo.insert(&ctx, &sample("0xABC")).unwrap();
    let err = repo.insert(&ctx, &sample("0xABC")).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateAddress(address) if address == "0xABC"));
    assert_eq!(repo.count(&ctx).unwrap(), 1);
}

#[test]
fn upsert_by_address_creates_then_replaces_in_place() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQ11eRepository::try_new(&conn).unwrap();
    let ctx = RequestContext::background();

    let created = repo.upsert_by_address(&ctx, &sample("0xABC")).unwrap();
    let UpsertOutcome::Created(id) = created else {
        panic!("expected a new record, got {created:?}");
    };

    let mut revised = sample("0xABC");
    revised.goals = vec!["ship".to_string(), "learn".to_string()];
    revised.mbti = MbtiType::Intj.code();
    assert_eq!(
        repo.upsert_by_address(&ctx, &revised).unwrap(),
        UpsertOutcome::Updated(id)
    );

    assert_eq!(repo.count(&ctx).unwrap(), 1);
    assert_eq!(repo.get(&ctx, id).unwrap(), Some(revised));
    assert!(conn.is_autocommit());
}

#[test]
fn upsert_by_address_leaves_store_untouched_on_rejection() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQ11eRepository::try_new(&conn).unwrap();

    let cancelled = RequestContext::background();
    cancelled.cancel();
    assert!(matches!(
        repo.upsert_by_address(&cancelled, &sample("0xABC")),
        Err(RepoError::Cancelled)
    ));

    let ctx = RequestContext::background();
    let mut invalid = sample("0xABC");
    invalid.mbti = 42;
    assert!(matches!(
        repo.upsert_by_address(&ctx, &invalid),
        Err(RepoError::Validation(Q11eValidationError::InvalidMbtiCode(42)))
    ));

    assert_eq!(repo.count(&ctx).unwrap(), 0);
    assert!(conn.is_autocommit());
}

#[test]
fn update_replaces_fields_and_reports_missing_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQ11eRepository::try_new(&conn).unwrap();
    let ctx = RequestContext::background();

    let mut record = sample("0xABC");
    let id = repo.insert(&ctx, &record).unwrap();

    record.pref1 = "z".to_string();
    record.mbti = MbtiType::Estj.code();
    repo.update(&ctx, id, &record).unwrap();
    assert_eq!(repo.get(&ctx, id).unwrap(), Some(record.clone()));

    let missing = uuid::Uuid::new_v4();
    let err = repo.update(&ctx, missing, &record).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == missing));
}

#[test]
fn update_onto_taken_address_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQ11eRepository::try_new(&conn).unwrap();
    let ctx = RequestContext::background();

    repo.insert(&ctx, &sample("0xA")).unwrap();
    let id_b = repo.insert(&ctx, &sample("0xB")).unwrap();

    let err = repo.update(&ctx, id_b, &sample("0xA")).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateAddress(_)));
}

#[test]
fn delete_removes_record_and_reports_missing_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQ11eRepository::try_new(&conn).unwrap();
    let ctx = RequestContext::background();

    let id = repo.insert(&ctx, &sample("0xABC")).unwrap();
    assert_eq!(repo.id_by_address(&ctx, "0xABC").unwrap(), Some(id));

    repo.delete(&ctx, id).unwrap();
    assert!(repo.get(&ctx, id).unwrap().is_none());
    assert!(repo.id_by_address(&ctx, "0xABC").unwrap().is_none());
    assert!(matches!(
        repo.delete(&ctx, id).unwrap_err(),
        RepoError::NotFound(_)
    ));
}

#[test]
fn validation_failure_blocks_insert_and_update() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQ11eRepository::try_new(&conn).unwrap();
    let ctx = RequestContext::background();

    let err = repo.insert(&ctx, &sample("")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(Q11eValidationError::EmptyAddress)
    ));

    let mut record = sample("0xABC");
    let id = repo.insert(&ctx, &record).unwrap();
    record.mbti = 99;
    let err = repo.update(&ctx, id, &record).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(Q11eValidationError::InvalidMbtiCode(99))
    ));
}

#[test]
fn list_filters_by_mbti_and_paginates() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQ11eRepository::try_new(&conn).unwrap();
    let ctx = RequestContext::background();

    for address in ["0xC", "0xA", "0xB"] {
        repo.insert(&ctx, &sample(address)).unwrap();
    }
    repo.insert(&ctx, &sample("0xD").with_mbti(MbtiType::Entp))
        .unwrap();
    conn.execute("UPDATE q11e SET updated_at = 1234567890000;", [])
        .unwrap();

    let infj = repo
        .list(
            &ctx,
            &Q11eListQuery {
                mbti: Some(MbtiType::Infj),
                ..Q11eListQuery::default()
            },
        )
        .unwrap();
    let addresses: Vec<_> = infj.iter().map(|record| record.address.as_str()).collect();
    assert_eq!(addresses, vec!["0xA", "0xB", "0xC"]);

    let page = repo
        .list(
            &ctx,
            &Q11eListQuery {
                mbti: None,
                page: Page {
                    limit: Some(2),
                    offset: 1,
                },
            },
        )
        .unwrap();
    let addresses: Vec<_> = page.iter().map(|record| record.address.as_str()).collect();
    assert_eq!(addresses, vec!["0xB", "0xC"]);

    let tail = repo
        .list(
            &ctx,
            &Q11eListQuery {
                mbti: None,
                page: Page {
                    limit: None,
                    offset: 3,
                },
            },
        )
        .unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].address, "0xD");
}

#[test]
fn cancelled_context_blocks_store_calls() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQ11eRepository::try_new(&conn).unwrap();
    let token = CancellationToken::new();
    let ctx = RequestContext::background().with_token(token.clone());

    repo.insert(&ctx, &sample("0xABC")).unwrap();
    token.cancel();

    assert!(matches!(
        repo.get_by_address(&ctx, "0xABC"),
        Err(RepoError::Cancelled)
    ));
    assert!(matches!(
        repo.check_and_get_exists_by_addr(&ctx, "0xABC"),
        Err(RepoError::Cancelled)
    ));
    assert!(matches!(
        repo.insert(&ctx, &sample("0xDEF")),
        Err(RepoError::Cancelled)
    ));

    let live = RequestContext::background();
    assert_eq!(repo.count(&live).unwrap(), 1);
}

#[test]
fn expired_deadline_blocks_store_calls() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQ11eRepository::try_new(&conn).unwrap();
    let ctx = RequestContext::background().with_deadline(Instant::now());

    assert!(matches!(
        repo.get_by_address(&ctx, "0xABC"),
        Err(RepoError::DeadlineExceeded)
    ));
    assert!(matches!(repo.count(&ctx), Err(RepoError::DeadlineExceeded)));
}

#[test]
fn invalid_persisted_mbti_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteQ11eRepository::try_new(&conn).unwrap();
    let ctx = RequestContext::background();

    repo.insert(&ctx, &sample("0xABC")).unwrap();
    conn.execute("UPDATE q11e SET mbti = 42;", []).unwrap();

    let err = repo.get_by_address(&ctx, "0xABC").unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("42")));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteQ11eRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_q11e_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteQ11eRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("q11e"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE q11e (
            id TEXT PRIMARY KEY NOT NULL,
            address TEXT NOT NULL,
            goals TEXT NOT NULL,
            interests TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteQ11eRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "q11e",
            column: "pref1"
        })
    ));
}
