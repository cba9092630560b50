use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use ics_calendar_page::config::{Config, FeedMode, Profile};
use ics_calendar_page::{FeedErrorKind, FeedSource, load_calendar, process_relay_body, render};

const EXAMPLE_ICS: &str = include_str!("fixtures/example.ics");

fn now() -> DateTime<Utc> {
    // Noon in New York.
    Utc.with_ymd_and_hms(2026, 10, 19, 16, 0, 0).unwrap()
}

fn client() -> Client {
    Client::builder().no_proxy().build().unwrap()
}

fn json_string(value: &str) -> String {
    serde_json::to_string(value).unwrap()
}

/// Answers exactly one HTTP request and hands back its request line.
async fn serve_once(status: &str, content_type: &str, body: String) -> (Url, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let status = status.to_string();
    let content_type = content_type.to_string();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            content_type,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        String::from_utf8_lossy(&request)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string()
    });

    (Url::parse(&format!("http://{}/", addr)).unwrap(), handle)
}

fn remote_source(base: &Url) -> FeedSource {
    FeedSource::Remote {
        relay: base.join("get").unwrap(),
        target: "https://example.com/basic.ics".to_string(),
    }
}

fn config(mode: FeedMode) -> Config {
    Config {
        calendar_http_url: "https://example.com/basic.ics".to_string(),
        calendar_webcal_url: "webcal://example.com/basic.ics".to_string(),
        calendar_name: "Events".to_string(),
        calendar_description: "Upcoming".to_string(),
        timezone: None,
        mode,
        local_feed_url: Url::parse("http://localhost:8000/example.ics").unwrap(),
        relay_url: Url::parse("https://api.allorigins.win/get").unwrap(),
        profile: Profile::default(),
    }
}

#[test]
fn test_relay_body_with_single_event() {
    let ics = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:one\r\nSUMMARY:Launch Party\r\nDTSTART:20261101T200000Z\r\nDTEND:20261101T230000Z\r\nLOCATION:Rooftop\r\nDESCRIPTION:Drinks and demos\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
    let body = format!(r#"{{"contents": {}, "status": {{"http_code": 200}}}}"#, json_string(ics));

    let loaded = process_relay_body(&body, now(), None).unwrap();

    assert_eq!(loaded.events.len(), 1);
    let event = &loaded.events[0];
    assert_eq!(event.id, 1);
    assert_eq!(event.title, "Launch Party");
    assert_eq!(event.location.as_deref(), Some("Rooftop"));
    assert_eq!(event.description.as_deref(), Some("Drinks and demos"));
    assert_eq!(event.organizer, "Event Organizer");
    assert_eq!(
        event.start_date,
        Utc.with_ymd_and_hms(2026, 11, 1, 20, 0, 0).unwrap()
    );
    assert_eq!(
        event.end_date,
        Utc.with_ymd_and_hms(2026, 11, 1, 23, 0, 0).unwrap()
    );
}

#[test]
fn test_relay_body_with_empty_contents() {
    let err = process_relay_body(r#"{"contents": ""}"#, now(), None).unwrap_err();
    assert_eq!(err.kind(), FeedErrorKind::Fetch);
    assert!(err.to_string().contains("empty payload"));

    let html =
        render::render_calendar_page(&config(FeedMode::Remote), &Err(err), String::new()).unwrap();
    assert!(html.contains("class=\"error-message\""));
    assert!(html.contains("Unable to load calendar events"));
    assert!(!html.contains("No upcoming events found."));
}

#[test]
fn test_relay_body_without_calendar_marker() {
    let body = format!(r#"{{"contents": {}}}"#, json_string("<html>Access denied</html>"));
    let err = process_relay_body(&body, now(), None).unwrap_err();
    assert_eq!(err.kind(), FeedErrorKind::Format);
}

#[test]
fn test_relay_body_with_base64_data_url() {
    let ics = EXAMPLE_ICS.replace("Hack Night", "Noche de Programación – Zoë");
    let contents = format!("data:text/calendar;base64,{}", STANDARD.encode(&ics));
    let body = format!(r#"{{"contents": {}}}"#, json_string(&contents));

    let loaded = process_relay_body(&body, now(), None).unwrap();

    assert!(
        loaded
            .events
            .iter()
            .any(|e| e.title == "Noche de Programación – Zoë")
    );
}

#[test]
fn test_example_feed_is_filtered_and_sorted() {
    let body = format!(r#"{{"contents": {}}}"#, json_string(EXAMPLE_ICS));
    let loaded = process_relay_body(&body, now(), None).unwrap();

    assert_eq!(loaded.metadata.title, "Pablo's Events Calendar");
    assert_eq!(loaded.timezone, chrono_tz::America::New_York);

    let ids: Vec<usize> = loaded.events.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![4, 3, 2]);

    let hack_night = &loaded.events[2];
    assert_eq!(hack_night.organizer, "Pablo Rodriguez");
    assert_eq!(hack_night.description.as_deref(), Some("Bring a project, or join one."));
    assert_eq!(hack_night.url.as_deref(), Some("https://example.com/hack-night"));
}

#[tokio::test]
async fn test_remote_load_through_relay() {
    let body = format!(
        r#"{{"contents": {}, "status": {{"http_code": 200}}}}"#,
        json_string(EXAMPLE_ICS)
    );
    let (base, server) = serve_once("200 OK", "application/json", body).await;

    let loaded = load_calendar(&client(), &remote_source(&base), now(), None)
        .await
        .unwrap();
    let request_line = server.await.unwrap();

    assert_eq!(loaded.events.len(), 3);
    assert!(request_line.starts_with("GET /get?url=https%3A%2F%2Fexample.com%2Fbasic.ics "));
}

#[tokio::test]
async fn test_remote_relay_error_status() {
    let (base, server) =
        serve_once("503 Service Unavailable", "text/plain", "down".to_string()).await;

    let err = load_calendar(&client(), &remote_source(&base), now(), None)
        .await
        .unwrap_err();
    server.await.unwrap();

    assert_eq!(err.kind(), FeedErrorKind::Fetch);
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_remote_relay_without_contents() {
    let body = r#"{"contents": null, "status": {"http_code": 404}}"#.to_string();
    let (base, server) = serve_once("200 OK", "application/json", body).await;

    let err = load_calendar(&client(), &remote_source(&base), now(), None)
        .await
        .unwrap_err();
    server.await.unwrap();

    assert_eq!(err.kind(), FeedErrorKind::Fetch);
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_local_fixture_load() {
    let (base, server) = serve_once("200 OK", "text/calendar", EXAMPLE_ICS.to_string()).await;
    let source = FeedSource::Local {
        url: base.join("example.ics").unwrap(),
    };

    let loaded = load_calendar(&client(), &source, now(), Some(chrono_tz::Tz::UTC))
        .await
        .unwrap();
    let request_line = server.await.unwrap();

    assert!(request_line.starts_with("GET /example.ics "));
    assert_eq!(loaded.timezone, chrono_tz::Tz::UTC);
    assert_eq!(loaded.events.first().map(|e| e.id), Some(4));
}

#[tokio::test]
async fn test_local_fixture_missing() {
    let (base, server) = serve_once("404 Not Found", "text/plain", "missing".to_string()).await;
    let source = FeedSource::Local {
        url: base.join("example.ics").unwrap(),
    };

    let err = load_calendar(&client(), &source, now(), None).await.unwrap_err();
    server.await.unwrap();

    assert_eq!(err, ics_calendar_page::FeedError::fetch("not found"));
}

#[tokio::test]
async fn test_local_fixture_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = FeedSource::Local {
        url: Url::parse(&format!("http://{}/example.ics", addr)).unwrap(),
    };
    let err = load_calendar(&client(), &source, now(), None).await.unwrap_err();

    assert_eq!(err.kind(), FeedErrorKind::Fetch);
}

#[tokio::test]
async fn test_local_fixture_not_a_calendar() {
    let (base, server) =
        serve_once("200 OK", "text/html", "<!DOCTYPE html><p>hi</p>".to_string()).await;
    let source = FeedSource::Local {
        url: base.join("example.ics").unwrap(),
    };

    let err = load_calendar(&client(), &source, now(), None).await.unwrap_err();
    server.await.unwrap();

    assert_eq!(err.kind(), FeedErrorKind::Format);
}
