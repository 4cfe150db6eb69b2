//! 駅データCSVとインデックスファイルを使ったセッションのテスト

use std::fs;

use tempfile::tempdir;

use crate::corpus::CsvRecordSource;
use crate::errors::EkitateError;
use crate::index::{FileIndexStore, IndexStore};
use crate::normalizer::ScriptMode;
use crate::region::RegionSelection;
use crate::session::CrosswordSession;

const STATIONS_CSV: &str = include_str!("./resources/stations.csv");

#[test]
fn test_open_from_files() {
    let dir = tempdir().unwrap();
    let csv_path = dir.path().join("stations.csv");
    fs::write(&csv_path, STATIONS_CSV).unwrap();
    let source = CsvRecordSource::new(&csv_path);
    let store = FileIndexStore::new(dir.path().join("index")).with_compression_level(1);

    let built = CrosswordSession::open(&source, Some(&store)).unwrap();
    let loaded = CrosswordSession::open(&source, Some(&store)).unwrap();

    let selection = RegionSelection::parse(["東京都"]);
    for q in ["新大", "しお", "大"] {
        assert_eq!(
            built.search(q, ScriptMode::Folded, &selection),
            loaded.search(q, ScriptMode::Folded, &selection)
        );
    }
}

#[test]
fn test_changed_corpus_rebuilds() {
    let dir = tempdir().unwrap();
    let csv_path = dir.path().join("stations.csv");
    fs::write(&csv_path, STATIONS_CSV).unwrap();
    let source = CsvRecordSource::new(&csv_path);
    let store = FileIndexStore::new(dir.path());

    let session = CrosswordSession::open(&source, Some(&store)).unwrap();
    let old_fingerprint = session.snapshot().corpus().fingerprint();
    assert!(session
        .search("う", ScriptMode::Folded, &RegionSelection::default())
        .is_empty());

    let mut updated = STATIONS_CSV.to_string();
    updated.push_str("1160215,うめだ,11602,27,,\n");
    fs::write(&csv_path, updated).unwrap();
    session.reload(&source, Some(&store)).unwrap();

    let new_fingerprint = session.snapshot().corpus().fingerprint();
    assert_ne!(old_fingerprint, new_fingerprint);
    assert_eq!(
        session
            .search("う", ScriptMode::Folded, &RegionSelection::default())
            .len(),
        1
    );
    assert!(store
        .load_index(ScriptMode::Preserved, &old_fingerprint)
        .unwrap()
        .is_none());
    assert!(store
        .load_index(ScriptMode::Preserved, &new_fingerprint)
        .unwrap()
        .is_some());
}

#[test]
fn test_missing_csv() {
    let dir = tempdir().unwrap();
    let source = CsvRecordSource::new(dir.path().join("missing.csv"));

    let result = CrosswordSession::open(&source, None);

    assert!(matches!(result, Err(EkitateError::CorpusUnavailable(_))));
}

#[test]
fn test_csv_without_required_column() {
    let dir = tempdir().unwrap();
    let csv_path = dir.path().join("stations.csv");
    fs::write(&csv_path, "station_cd,station_name\n1,新宿\n").unwrap();

    let result = CrosswordSession::open(&CsvRecordSource::new(&csv_path), None);

    assert!(matches!(result, Err(EkitateError::CorpusUnavailable(_))));
}
