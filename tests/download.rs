use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use camino::Utf8PathBuf;

use xeno_harvester::domain::{Query, SpeciesKey};
use xeno_harvester::download::Downloader;
use xeno_harvester::error::HarvestError;
use xeno_harvester::output::JsonOutput;
use xeno_harvester::store::Store;
use xeno_harvester::xeno::{Recording, RecordingPage, XenoCantoClient};

/// Media-only mock: writes a fixed payload for every URL except those
/// containing "fail", which error without touching the destination.
#[derive(Default)]
struct MockMedia {
    requests: Mutex<usize>,
}

impl MockMedia {
    fn requests(&self) -> usize {
        *self.requests.lock().unwrap()
    }
}

impl XenoCantoClient for MockMedia {
    fn fetch_page(&self, _query: &Query, _page: u64) -> Result<RecordingPage, HarvestError> {
        Err(HarvestError::XenoHttp("not a metadata client".to_string()))
    }

    fn download_file(&self, url: &str, destination: &Path) -> Result<(), HarvestError> {
        *self.requests.lock().unwrap() += 1;
        if url.contains("fail") {
            return Err(HarvestError::XenoHttp("connection reset".to_string()));
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|err| HarvestError::Filesystem(err.to_string()))?;
        }
        fs::write(destination, b"audio").map_err(|err| HarvestError::Filesystem(err.to_string()))
    }
}

fn recording(id: &str, file: Option<&str>, file_name: Option<&str>) -> Recording {
    Recording {
        id: Some(id.to_string()),
        file: file.map(str::to_string),
        file_name: file_name.map(str::to_string),
        ..Recording::default()
    }
}

fn store(temp: &tempfile::TempDir) -> Store {
    Store::new(Utf8PathBuf::from_path_buf(temp.path().join("dataset")).unwrap())
}

fn key() -> SpeciesKey {
    "turdus rufiventris".parse().unwrap()
}

#[test]
fn second_run_issues_no_requests_and_keeps_files() {
    let temp = tempfile::tempdir().unwrap();
    let store = store(&temp);
    let client = MockMedia::default();
    let downloader = Downloader::new(&client, &store, Duration::ZERO);
    let selection = vec![
        recording("1", Some("https://host/a.mp3"), Some("a.mp3")),
        recording("2", Some("https://host/b.mp3"), Some("b.mp3")),
    ];

    let first = downloader
        .download_species(&key(), &selection, &JsonOutput)
        .unwrap();
    assert_eq!(first.downloaded, 2);
    assert_eq!(client.requests(), 2);

    let second = downloader
        .download_species(&key(), &selection, &JsonOutput)
        .unwrap();
    assert_eq!(second.downloaded, 0);
    assert_eq!(second.skipped_existing, 2);
    assert_eq!(client.requests(), 2, "second run must not touch the network");

    let audio_dir = store.species_dir(&key());
    assert!(audio_dir.join("a.mp3").as_std_path().exists());
    assert!(audio_dir.join("b.mp3").as_std_path().exists());
}

#[test]
fn incomplete_metadata_is_skipped_without_a_request() {
    let temp = tempfile::tempdir().unwrap();
    let store = store(&temp);
    let client = MockMedia::default();
    let downloader = Downloader::new(&client, &store, Duration::ZERO);
    let selection = vec![
        recording("1", None, Some("a.mp3")),
        recording("2", Some("https://host/b.mp3"), None),
        recording("3", Some("https://host/c.mp3"), Some("c.mp3")),
    ];

    let stats = downloader
        .download_species(&key(), &selection, &JsonOutput)
        .unwrap();
    assert_eq!(stats.skipped_incomplete, 2);
    assert_eq!(stats.downloaded, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(client.requests(), 1);
}

#[test]
fn one_failure_does_not_abort_the_batch() {
    let temp = tempfile::tempdir().unwrap();
    let store = store(&temp);
    let client = MockMedia::default();
    let downloader = Downloader::new(&client, &store, Duration::ZERO);
    let selection = vec![
        recording("1", Some("https://host/a.mp3"), Some("a.mp3")),
        recording("2", Some("https://host/fail.mp3"), Some("broken.mp3")),
        recording("3", Some("https://host/c.mp3"), Some("c.mp3")),
    ];

    let stats = downloader
        .download_species(&key(), &selection, &JsonOutput)
        .unwrap();
    assert_eq!(stats.downloaded, 2);
    assert_eq!(stats.failed, 1);

    // A failed attempt must leave nothing a later run would mistake for a
    // completed download.
    let failed_path = store.recording_path(&key(), "broken.mp3");
    assert!(!failed_path.as_std_path().exists());

    let retry = downloader
        .download_species(&key(), &selection, &JsonOutput)
        .unwrap();
    assert_eq!(retry.skipped_existing, 2);
    assert_eq!(retry.failed, 1, "failed file is attempted again");
}

#[test]
fn preexisting_files_are_never_refetched() {
    let temp = tempfile::tempdir().unwrap();
    let store = store(&temp);
    store.ensure_species_dir(&key()).unwrap();
    fs::write(
        store.recording_path(&key(), "a.mp3").as_std_path(),
        b"from an earlier run",
    )
    .unwrap();

    let client = MockMedia::default();
    let downloader = Downloader::new(&client, &store, Duration::ZERO);
    let selection = vec![recording("1", Some("https://host/a.mp3"), Some("a.mp3"))];

    let stats = downloader
        .download_species(&key(), &selection, &JsonOutput)
        .unwrap();
    assert_eq!(stats.skipped_existing, 1);
    assert_eq!(client.requests(), 0);
    assert_eq!(
        fs::read(store.recording_path(&key(), "a.mp3").as_std_path()).unwrap(),
        b"from an earlier run"
    );
}

#[test]
fn empty_selection_is_a_no_op() {
    let temp = tempfile::tempdir().unwrap();
    let store = store(&temp);
    let client = MockMedia::default();
    let downloader = Downloader::new(&client, &store, Duration::ZERO);

    let stats = downloader
        .download_species(&key(), &[], &JsonOutput)
        .unwrap();
    assert_eq!(stats.downloaded, 0);
    assert_eq!(client.requests(), 0);
    assert!(!store.species_dir(&key()).as_std_path().exists());
}
