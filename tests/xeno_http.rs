use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use assert_matches::assert_matches;

use xeno_harvester::domain::{Query, SpeciesKey};
use xeno_harvester::error::HarvestError;
use xeno_harvester::xeno::{XenoCantoClient, XenoCantoHttpClient};

/// Serves exactly one connection with a canned HTTP response, then closes
/// the socket. Closing early is how a truncated transfer is simulated.
fn serve_once(response: String) -> (String, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = [0u8; 2048];
            let _ = stream.read(&mut request);
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });
    (format!("http://{addr}"), handle)
}

fn client() -> XenoCantoHttpClient {
    XenoCantoHttpClient::new("test-key", Duration::from_secs(5), Duration::from_secs(5)).unwrap()
}

#[test]
fn fetch_page_decodes_catalog_payload() {
    let body = r#"{"numRecordings":"2","numPages":1,"recordings":[{"id":903421,"gen":"Guira","sp":"guira","q":"A"}]}"#;
    let (url, server) = serve_once(format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    ));

    let key: SpeciesKey = "guira guira".parse().unwrap();
    let page = client()
        .with_base_url(&url)
        .fetch_page(&Query::for_species(&key, None), 1)
        .unwrap();
    server.join().unwrap();

    assert_eq!(page.num_recordings, 2);
    assert_eq!(page.num_pages, 1);
    assert_eq!(page.recordings[0].id.as_deref(), Some("903421"));
    assert_eq!(page.recordings[0].genus.as_deref(), Some("Guira"));
}

#[test]
fn download_persists_complete_bodies() {
    let body = "complete audio body";
    let (url, server) = serve_once(format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    ));

    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("audios").join("XC1.mp3");
    client().download_file(&url, &destination).unwrap();
    server.join().unwrap();

    assert_eq!(fs::read_to_string(&destination).unwrap(), body);
}

#[test]
fn truncated_body_leaves_no_file_behind() {
    // Content-Length promises far more than the socket delivers before
    // closing, so the streamed copy fails mid-body.
    let (url, server) = serve_once(
        "HTTP/1.1 200 OK\r\nContent-Length: 4096\r\nConnection: close\r\n\r\npartial".to_string(),
    );

    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("audios").join("XC2.mp3");
    let err = client().download_file(&url, &destination).unwrap_err();
    server.join().unwrap();

    assert_matches!(err, HarvestError::XenoHttp(_));
    assert!(!destination.exists());
    // The temp file used for staging must be cleaned up as well: nothing in
    // the directory for a later run to mistake for a completed download.
    let leftovers: Vec<_> = fs::read_dir(destination.parent().unwrap())
        .unwrap()
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn error_status_leaves_no_file_behind() {
    let (url, server) = serve_once(
        "HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found"
            .to_string(),
    );

    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("audios").join("XC3.mp3");
    let err = client().download_file(&url, &destination).unwrap_err();
    server.join().unwrap();

    assert_matches!(err, HarvestError::XenoStatus { status: 404, .. });
    assert!(!destination.exists());
}
