//! Offline end-to-end runs of the sync pipeline against a gzipped fixture feed.

use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

use matrix_sync::error::AppError;
use matrix_sync::models::{Config, DisplayType, MergeDirection, StorageBackend};
use matrix_sync::pipeline::run_sync;
use matrix_sync::services::FeedFetcher;
use matrix_sync::storage::{self, SnapshotStore};

const EVENTS: &str = r#"
<event>
  <ts_event>2024-03-01T10:15:00Z</ts_event>
  <ts_state>2024-03-01T10:15:00Z</ts_state>
  <sign_id><uuid>A</uuid></sign_id>
  <lanelocation><road>A1</road><carriageway>main</carriageway><lane>2</lane><km>10.5</km></lanelocation>
</event>
<event>
  <ts_event>2024-03-01T10:15:00Z</ts_event>
  <ts_state>2024-03-01T10:15:00Z</ts_state>
  <sign_id><uuid>A</uuid></sign_id>
  <display><speedlimit red_ring="false" flashing="true">100</speedlimit></display>
</event>
<event>
  <sign_id><uuid>B</uuid></sign_id>
  <display><lane_closed_ahead flashing="false"><merge_left/></lane_closed_ahead></display>
</event>
<event>
  <sign_id><uuid>B</uuid></sign_id>
  <lanelocation><road>A2</road><carriageway>side</carriageway><lane>1</lane><km>3.4</km></lanelocation>
</event>
<event>
  <sign_id><uuid>C</uuid></sign_id>
  <lanelocation><road>A4</road><carriageway>main</carriageway><lane>3</lane><km>22.0</km></lanelocation>
</event>
<event>
  <sign_id><uuid>D</uuid></sign_id>
  <display><blank flashing="false"/></display>
</event>
"#;

fn feed(events: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP:Envelope xmlns:SOAP="http://schemas.xmlsoap.org/soap/envelope/">
  <SOAP:Body>
    <ndw:NdwVms xmlns:ndw="http://www.ndw.nu/vms">
      <variable_message_sign_events>
        <meta><msg_id><uuid>msg-1</uuid></msg_id></meta>
        {events}
      </variable_message_sign_events>
    </ndw:NdwVms>
  </SOAP:Body>
</SOAP:Envelope>"#
    )
}

fn write_gz(path: &Path, text: &str) {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    std::fs::write(path, encoder.finish().unwrap()).unwrap();
}

fn config(tmp: &TempDir, backend: StorageBackend) -> Config {
    let mut config = Config::default();
    config.paths.work_dir = tmp.path().join("work");
    config.storage.backend = backend;
    config.storage.database = tmp.path().join("signs.db");
    config.storage.snapshot_dir = tmp.path().join("snapshot");
    config
}

async fn sync_into(backend: StorageBackend) {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("feed.xml.gz");
    write_gz(&input, &feed(EVENTS));

    let config = config(&tmp, backend);
    let fetcher = FeedFetcher::from_file(&input);
    let mut store = storage::open(&config.storage).unwrap();

    let report = run_sync(&config, &fetcher, Some(store.as_mut()))
        .await
        .unwrap();
    assert_eq!(report.event_count, 6);
    assert_eq!(report.sign_count, 4);
    assert_eq!(report.loaded, Some(4));
    assert_eq!(report.by_type[&DisplayType::SpeedLimit], 1);
    assert_eq!(report.by_type[&DisplayType::LaneClosedAhead], 1);
    assert_eq!(report.by_type[&DisplayType::Blank], 2);

    let signs = store.load_current().await.unwrap();
    assert_eq!(signs.len(), 4);

    let a = &signs[0];
    assert_eq!(a.uuid.as_str(), "A");
    assert_eq!(a.road.as_deref(), Some("A1"));
    assert_eq!(a.lane, Some(2));
    assert_eq!(a.km, Some(10.5));
    assert_eq!(a.display_type, DisplayType::SpeedLimit);
    assert_eq!(a.speed_limit, Some(100));
    assert_eq!(a.has_red_ring, Some(false));
    assert_eq!(a.is_flashing, Some(true));

    let b = &signs[1];
    assert_eq!(b.display_type, DisplayType::LaneClosedAhead);
    assert_eq!(b.arrow_direction, Some(MergeDirection::Left));
    assert_eq!(b.carriageway.as_deref(), Some("side"));

    let c = &signs[2];
    assert_eq!(c.display_type, DisplayType::Blank);
    assert!(c.has_location());

    let d = &signs[3];
    assert_eq!(d.display_type, DisplayType::Blank);
    assert!(!d.has_location());

    // Artifacts are cleaned up by default
    assert!(!config.paths.archive_path().exists());
    assert!(!config.paths.markup_path().exists());
}

#[tokio::test]
async fn test_sync_into_sqlite() {
    sync_into(StorageBackend::Sqlite).await;
}

#[tokio::test]
async fn test_sync_into_json() {
    sync_into(StorageBackend::Json).await;
}

#[tokio::test]
async fn test_dry_run_keeps_store_untouched() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("feed.xml.gz");
    write_gz(&input, &feed(EVENTS));

    let mut config = config(&tmp, StorageBackend::Sqlite);
    config.paths.keep_artifacts = true;

    let report = run_sync(&config, &FeedFetcher::from_file(&input), None)
        .await
        .unwrap();
    assert_eq!(report.sign_count, 4);
    assert!(report.loaded.is_none());
    assert!(config.paths.markup_path().exists());
    assert!(!config.storage.database.exists());
}

#[tokio::test]
async fn test_failed_batch_keeps_previous_snapshot() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp, StorageBackend::Sqlite);
    let mut store = storage::open(&config.storage).unwrap();

    let good = tmp.path().join("good.xml.gz");
    write_gz(&good, &feed(EVENTS));
    run_sync(&config, &FeedFetcher::from_file(&good), Some(store.as_mut()))
        .await
        .unwrap();

    let bad = tmp.path().join("bad.xml.gz");
    write_gz(
        &bad,
        &feed(
            r#"<event><sign_id><uuid>X</uuid></sign_id>
               <lanelocation><road>A1</road><carriageway>main</carriageway><lane>two</lane><km>1</km></lanelocation>
               </event>"#,
        ),
    );
    let err = run_sync(&config, &FeedFetcher::from_file(&bad), Some(store.as_mut()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Parse { field: "lane", .. }));

    assert_eq!(store.load_current().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_schema_change_is_structure_error() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("feed.xml.gz");
    write_gz(&input, "<SOAP:Envelope><SOAP:Body><other/></SOAP:Body></SOAP:Envelope>");

    let config = config(&tmp, StorageBackend::Json);
    let err = run_sync(&config, &FeedFetcher::from_file(&input), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Structure(_)));
}
