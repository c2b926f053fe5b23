use std::collections::BTreeMap;

use wordfreq_db::{ConnectionState, Location, OpenOptions, StoreError, WordStore};
use wordfreq_types::{Category, WordRecord};

fn rain() -> Vec<WordRecord> {
    vec![
        WordRecord::new("дощ", "дощ", Category::Noun, 2),
        WordRecord::new("йде", "йти", Category::Verb, 1),
        WordRecord::new("вітер", "вітер", Category::Noun, 1),
        WordRecord::new("дує", "дути", Category::Verb, 1),
    ]
}

fn memory_store() -> WordStore {
    WordStore::open(Location::Memory).expect("open in-memory store")
}

#[test]
fn rain_scenario() {
    let mut store = memory_store();
    assert_eq!(store.bulk_load(&rain()).unwrap(), 4);

    let hits = store.lookup_by_form("дощ").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].frequency, 2);
    assert_eq!(hits[0].lemma, "дощ");
    assert_eq!(hits[0].category, Category::Noun);

    assert_eq!(store.update_frequency("дощ", 100).unwrap(), 1);
    assert_eq!(store.lookup_by_form("дощ").unwrap()[0].frequency, 100);
}

#[test]
fn lookup_round_trips_every_record() {
    let mut store = memory_store();
    let records = rain();
    store.bulk_load(&records).unwrap();

    for (i, rec) in records.iter().enumerate() {
        let hits = store.lookup_by_form(&rec.form).unwrap();
        assert_eq!(hits, vec![rec.clone().with_id(i as i64 + 1)]);
    }
}

#[test]
fn bulk_load_replaces_previous_generation() {
    let mut store = memory_store();
    store.bulk_load(&rain()).unwrap();

    let second = vec![
        WordRecord::new("небо", "небо", Category::Noun, 3),
        WordRecord::new("гарна", "гарний", Category::Adj, 1),
    ];
    assert_eq!(store.bulk_load(&second).unwrap(), 2);

    let all = store.select_all().unwrap();
    let ids: Vec<_> = all.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![Some(1), Some(2)]);
    assert_eq!(all[0].form, "небо");
    assert_eq!(all[1].form, "гарна");
    assert!(store.lookup_by_form("дощ").unwrap().is_empty());
    assert_eq!(store.len().unwrap(), 2);
}

#[test]
fn incoming_ids_are_ignored() {
    let mut store = memory_store();
    let records = vec![
        WordRecord::new("дощ", "дощ", Category::Noun, 2).with_id(42),
        WordRecord::new("вітер", "вітер", Category::Noun, 1).with_id(7),
    ];
    store.bulk_load(&records).unwrap();
    let ids: Vec<_> = store.select_all().unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![Some(1), Some(2)]);
}

#[test]
fn lookup_is_exact_and_case_sensitive() {
    let mut store = memory_store();
    store.bulk_load(&rain()).unwrap();
    assert!(store.lookup_by_form("Дощ").unwrap().is_empty());
    assert!(store.lookup_by_form("дощ ").unwrap().is_empty());
    assert!(store.lookup_by_form("до").unwrap().is_empty());
}

#[test]
fn updating_missing_form_is_a_no_op() {
    let mut store = memory_store();
    store.bulk_load(&rain()).unwrap();
    let before = store.select_all().unwrap();

    assert_eq!(store.update_frequency("сніг", 5).unwrap(), 0);
    assert_eq!(store.select_all().unwrap(), before);
}

#[test]
fn duplicate_forms_are_stored_and_updated_together() {
    let mut store = memory_store();
    let records = vec![
        WordRecord::new("дощ", "дощ", Category::Noun, 2),
        WordRecord::new("дощ", "дощ", Category::Noun, 3),
    ];
    assert_eq!(store.bulk_load(&records).unwrap(), 2);
    assert_eq!(store.lookup_by_form("дощ").unwrap().len(), 2);
    assert_eq!(store.update_frequency("дощ", 9).unwrap(), 2);
    assert!(
        store
            .lookup_by_form("дощ")
            .unwrap()
            .iter()
            .all(|r| r.frequency == 9)
    );
}

#[test]
fn aggregates_by_category_without_zero_fill() {
    let mut store = memory_store();
    let mut records = rain();
    records.push(WordRecord::new("погода", "погода", Category::Unknown, 1));
    store.bulk_load(&records).unwrap();

    let counts = store.aggregate_by_category().unwrap();
    assert_eq!(
        counts,
        BTreeMap::from([
            (Category::Noun, 2),
            (Category::Verb, 2),
            (Category::Unknown, 1)
        ])
    );
    assert!(!counts.contains_key(&Category::Adj));
    assert_eq!(counts.values().sum::<usize>(), store.len().unwrap());
}

#[test]
fn fresh_store_answers_with_empty_results() {
    let store = memory_store();
    assert!(store.is_empty().unwrap());
    assert!(store.select_all().unwrap().is_empty());
    assert!(store.lookup_by_form("дощ").unwrap().is_empty());
    assert!(store.aggregate_by_category().unwrap().is_empty());
}

#[test]
fn failed_bulk_load_keeps_previous_generation() {
    let mut store = memory_store();
    store.bulk_load(&rain()).unwrap();
    let before = store.select_all().unwrap();

    let broken = vec![
        WordRecord::new("небо", "небо", Category::Noun, 1),
        WordRecord::new("", "", Category::Unknown, 1),
    ];
    let err = store.bulk_load(&broken).unwrap_err();
    assert!(matches!(err, StoreError::Insert { index: Some(1), .. }));

    assert_eq!(store.select_all().unwrap(), before);
    assert!(store.lookup_by_form("небо").unwrap().is_empty());
}

#[test]
fn state_machine_guards_operations() {
    let mut store = WordStore::new(Location::Memory);
    assert_eq!(store.state(), ConnectionState::Unopened);
    assert!(matches!(
        store.lookup_by_form("дощ"),
        Err(StoreError::NotConnected {
            state: ConnectionState::Unopened
        })
    ));

    store.connect().unwrap();
    assert_eq!(store.state(), ConnectionState::Open);
    store.connect().unwrap();
    store.bulk_load(&rain()).unwrap();

    store.close().unwrap();
    store.close().unwrap();
    assert_eq!(store.state(), ConnectionState::Closed);

    assert!(matches!(
        store.bulk_load(&rain()),
        Err(StoreError::NotConnected {
            state: ConnectionState::Closed
        })
    ));
    assert!(matches!(
        store.update_frequency("дощ", 1),
        Err(StoreError::NotConnected { .. })
    ));
    assert!(matches!(
        store.aggregate_by_category(),
        Err(StoreError::NotConnected { .. })
    ));
    assert!(matches!(
        store.select_all(),
        Err(StoreError::NotConnected { .. })
    ));
    assert!(matches!(
        store.connect(),
        Err(StoreError::NotConnected {
            state: ConnectionState::Closed
        })
    ));
}

#[test]
fn closing_an_unopened_handle_is_terminal() {
    let mut store = WordStore::new(Location::Memory);
    store.close().unwrap();
    assert_eq!(store.state(), ConnectionState::Closed);
    assert!(store.connect().is_err());
}

#[test]
fn records_persist_across_handles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("words.db");

    {
        let mut store = WordStore::open(path.as_path()).unwrap();
        store.bulk_load(&rain()).unwrap();
        store.update_frequency("вітер", 4).unwrap();
        // Dropped without close.
    }

    let store = WordStore::open(path.as_path()).unwrap();
    let all = store.select_all().unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(store.lookup_by_form("вітер").unwrap()[0].frequency, 4);
}

#[test]
fn unreachable_location_is_a_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("words.db");
    let err = WordStore::open(path.as_path()).unwrap_err();
    assert!(matches!(err, StoreError::Connection { .. }));
    assert!(err.to_string().contains("words.db"));

    let garbage = dir.path().join("garbage.db");
    std::fs::write(&garbage, vec![b'x'; 4096]).unwrap();
    assert!(matches!(
        WordStore::open(garbage.as_path()),
        Err(StoreError::Connection { .. })
    ));
}

#[test]
fn read_only_store_rejects_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("words.db");
    let mut writer = WordStore::open(path.as_path()).unwrap();
    writer.bulk_load(&rain()).unwrap();
    writer.close().unwrap();

    let mut reader =
        WordStore::open_with(path.as_path(), OpenOptions { read_only: true }).unwrap();
    assert_eq!(reader.lookup_by_form("дощ").unwrap()[0].frequency, 2);
    assert!(matches!(
        reader.update_frequency("дощ", 100),
        Err(StoreError::Update { .. })
    ));
    assert!(matches!(
        reader.bulk_load(&rain()),
        Err(StoreError::Insert { .. })
    ));
    assert_eq!(reader.lookup_by_form("дощ").unwrap()[0].frequency, 2);
}

#[test]
fn read_only_memory_store_is_refused() {
    let opened = WordStore::open_with(Location::Memory, OpenOptions { read_only: true });
    assert!(matches!(opened, Err(StoreError::Connection { .. })));
}

#[cfg(unix)]
#[test]
fn write_protected_store_is_a_connection_error() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("words.db");
    let mut writer = WordStore::open(path.as_path()).unwrap();
    writer.bulk_load(&rain()).unwrap();
    writer.close().unwrap();

    let mode = |p: &std::path::Path, m| {
        std::fs::set_permissions(p, std::fs::Permissions::from_mode(m)).unwrap()
    };
    mode(&path, 0o444);
    mode(dir.path(), 0o555);

    // Permission bits do not bind root.
    let privileged = std::fs::OpenOptions::new().write(true).open(&path).is_ok();
    let opened = WordStore::open(path.as_path());

    mode(dir.path(), 0o755);
    mode(&path, 0o644);
    if privileged {
        return;
    }
    assert!(matches!(opened, Err(StoreError::Connection { .. })));

    let mut reader =
        WordStore::open_with(path.as_path(), OpenOptions { read_only: true }).unwrap();
    assert_eq!(reader.len().unwrap(), rain().len());
    reader.close().unwrap();
}
