//! Probe behavior against local HTTP fixtures.
//!
//! Each test binds a throwaway localhost server so the validators see
//! real sockets: reachable endpoints, broken manifests, undersized
//! payloads and closed ports.

use chrono::Utc;
use omnicast_ingest::models::{StreamRecord, StreamStatus, StreamType};
use omnicast_ingest::validators::{
    GenericValidator, HlsValidator, IcyValidator, StreamValidator, VodValidator,
};
use reqwest::Client;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn http_response(status: &str, extra_headers: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\n{extra_headers}Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

async fn routed_server(routes: Vec<(&'static str, String)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                let response = routes
                    .iter()
                    .find(|(route, _)| *route == path)
                    .map(|(_, response)| response.clone())
                    .unwrap_or_else(|| http_response("404 Not Found", "", ""));
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

fn stream(url: &str, stream_type: StreamType) -> StreamRecord {
    StreamRecord {
        id: "probe-1".to_string(),
        name: "Probe Fixture".to_string(),
        stream_type,
        url: url.to_string(),
        canonical_url: url.to_string(),
        country: None,
        language: None,
        category: "unknown".to_string(),
        media: serde_json::json!({}),
        subtitles: Vec::new(),
        status: StreamStatus::Unknown,
        score: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn generic_probe_scores_reachable_endpoint() {
    let base = routed_server(vec![("/cam", http_response("200 OK", "", "ok"))]).await;
    let validator = GenericValidator::new(Client::new());

    let result = validator
        .validate(&stream(&format!("{base}/cam"), StreamType::Webcam))
        .await;
    assert!(result.ok);
    assert_eq!(result.status, StreamStatus::Online);
    assert_eq!(result.score, 80);
}

#[tokio::test]
async fn generic_probe_reports_http_status_on_failure() {
    let base = routed_server(vec![(
        "/cam",
        http_response("500 Internal Server Error", "", "boom"),
    )])
    .await;
    let validator = GenericValidator::new(Client::new());

    let result = validator
        .validate(&stream(&format!("{base}/cam"), StreamType::Webcam))
        .await;
    assert!(!result.ok);
    assert_eq!(result.score, 0);
    assert_eq!(result.reason.as_deref(), Some("HTTP 500"));
}

#[tokio::test]
async fn hls_probe_follows_manifest_to_a_segment() {
    let manifest =
        "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:4\n#EXTINF:4.0,\nseg1.ts\n";
    let segment = "S".repeat(64);
    let base = routed_server(vec![
        ("/live.m3u8", http_response("200 OK", "", manifest)),
        ("/seg1.ts", http_response("200 OK", "", &segment)),
    ])
    .await;
    let validator = HlsValidator::new(Client::new(), 16);

    let result = validator
        .validate(&stream(&format!("{base}/live.m3u8"), StreamType::Iptv))
        .await;
    assert!(result.ok);
    assert_eq!(result.score, 100);
}

#[tokio::test]
async fn hls_probe_flags_manifest_without_media_markers() {
    let manifest = "#EXTM3U\n#EXT-X-VERSION:3\n";
    let base = routed_server(vec![("/live.m3u8", http_response("200 OK", "", manifest))]).await;
    let validator = HlsValidator::new(Client::new(), 16);

    let result = validator
        .validate(&stream(&format!("{base}/live.m3u8"), StreamType::Iptv))
        .await;
    assert!(!result.ok);
    assert_eq!(result.status, StreamStatus::Offline);
    assert_eq!(result.score, 0);
    assert_eq!(result.reason.as_deref(), Some("invalid HLS format"));
}

#[tokio::test]
async fn hls_probe_flags_undersized_segments() {
    let manifest = "#EXTM3U\n#EXTINF:4.0,\nseg1.ts\n";
    let base = routed_server(vec![
        ("/live.m3u8", http_response("200 OK", "", manifest)),
        ("/seg1.ts", http_response("200 OK", "", "tiny")),
    ])
    .await;
    let validator = HlsValidator::new(Client::new(), 1024);

    let result = validator
        .validate(&stream(&format!("{base}/live.m3u8"), StreamType::Iptv))
        .await;
    assert!(!result.ok);
    assert_eq!(result.score, 50);
    assert_eq!(result.reason.as_deref(), Some("segment too small (4 bytes)"));
}

#[tokio::test]
async fn icy_probe_scores_fast_responses_highest() {
    let base = routed_server(vec![(
        "/radio",
        http_response("200 OK", "icy-name: Radio Fixture\r\n", "audio"),
    )])
    .await;
    let validator = IcyValidator::new(Client::new(), 2000, 4000);

    let result = validator
        .validate(&stream(&format!("{base}/radio"), StreamType::Radio))
        .await;
    assert!(result.ok);
    assert_eq!(result.score, 100);
}

#[tokio::test]
async fn vod_probe_rejects_undersized_files() {
    let response = "HTTP/1.1 200 OK\r\nContent-Length: 10\r\nConnection: close\r\n\r\n";
    let base = routed_server(vec![("/movie.mp4", response.to_string())]).await;
    let validator = VodValidator::new(Client::new(), 1024);

    let result = validator
        .validate(&stream(&format!("{base}/movie.mp4"), StreamType::Vod))
        .await;
    assert!(!result.ok);
    assert_eq!(result.score, 50);
    assert_eq!(result.reason.as_deref(), Some("file too small (10 bytes)"));
}

#[tokio::test]
async fn vod_probe_accepts_sufficiently_large_files() {
    let response = "HTTP/1.1 200 OK\r\nContent-Length: 10485760\r\nConnection: close\r\n\r\n";
    let base = routed_server(vec![("/movie.mp4", response.to_string())]).await;
    let validator = VodValidator::new(Client::new(), 1024);

    let result = validator
        .validate(&stream(&format!("{base}/movie.mp4"), StreamType::Vod))
        .await;
    assert!(result.ok);
    assert_eq!(result.score, 100);
}

#[tokio::test]
async fn every_probe_is_total_on_unreachable_hosts() {
    let dead = "http://127.0.0.1:1/x";
    let client = Client::new();
    let probes: Vec<Box<dyn StreamValidator>> = vec![
        Box::new(GenericValidator::new(client.clone())),
        Box::new(HlsValidator::new(client.clone(), 16)),
        Box::new(IcyValidator::new(client.clone(), 2000, 4000)),
        Box::new(VodValidator::new(client, 1024)),
    ];

    for probe in probes {
        let result = probe.validate(&stream(dead, StreamType::Iptv)).await;
        assert!(!result.ok, "{} should report offline", probe.name());
        assert_eq!(result.status, StreamStatus::Offline);
        assert!(result.reason.is_some());
    }
}

#[tokio::test]
async fn malformed_urls_become_offline_results() {
    let validator = GenericValidator::new(Client::new());
    let result = validator.validate(&stream("not a url", StreamType::Webcam)).await;
    assert!(!result.ok);
    assert_eq!(result.status, StreamStatus::Offline);
}
