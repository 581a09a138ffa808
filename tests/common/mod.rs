//! Shared test fixtures for the crypto-extractor integration tests.
//!
//! Provides a tiny HTTP server on `127.0.0.1` that answers every request with
//! one canned response and records the request targets, plus CSV/mtime
//! helpers for cache files.

#![allow(dead_code)]

use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime};

/// Canned-response HTTP server. Each accepted connection gets the same reply.
pub struct FixtureServer {
    addr: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FixtureServer {
    pub fn json(body: &str) -> Self {
        Self::start(200, "OK", body)
    }

    pub fn start(status: u16, reason: &str, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reason,
            body.len(),
            body
        );
        let seen = requests.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                if let Some(target) = read_request_target(&mut stream) {
                    seen.lock().unwrap().push(target);
                }
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });

        Self { addr, requests }
    }

    /// Base URL, e.g. `http://127.0.0.1:40123`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request targets (path + query) seen so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

fn read_request_target(stream: &mut TcpStream) -> Option<String> {
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .ok()?;
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let head = String::from_utf8_lossy(&buf);
    let request_line = head.lines().next()?;
    request_line.split_whitespace().nth(1).map(|s| s.to_string())
}

/// URL nothing listens on; any request to it fails.
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/markets", addr)
}

pub const MARKETS_JSON: &str = r#"[
    {"id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "current_price": 67000.5, "market_cap_rank": 1},
    {"id": "ethereum", "symbol": "eth", "name": "Ethereum", "current_price": 3500.25, "market_cap_rank": 2},
    {"id": "solana", "symbol": "sol", "name": "Solana", "current_price": 150.75, "market_cap_rank": 5}
]"#;

/// Markets payload with the awkward upstream shapes: ISO timestamps, a
/// nested `roi` object that is null in some rows, and an all-null column.
pub const MARKETS_FULL_JSON: &str = r#"[
    {"id": "bitcoin", "symbol": "btc", "current_price": 67000.5, "market_cap": 1319000000000,
     "max_supply": null, "ath": 73738.0, "ath_date": "2024-03-14T07:10:36.635Z",
     "roi": null, "last_updated": "2024-03-20T10:15:02.118Z"},
    {"id": "ethereum", "symbol": "eth", "current_price": 3500.25, "market_cap": 420000000000,
     "max_supply": null, "ath": 4878.26, "ath_date": "2021-11-10T14:24:19.604Z",
     "roi": {"times": 60.51, "currency": "btc", "percentage": 6051.3},
     "last_updated": "2024-03-20T10:15:11.452Z"},
    {"id": "tether", "symbol": "usdt", "current_price": 1.0, "market_cap": 104000000000,
     "max_supply": null, "ath": 1.32, "ath_date": "2018-07-24T00:00:00.000Z",
     "roi": null, "last_updated": "2024-03-20T10:15:00.947Z"}
]"#;

pub const STALE_CSV: &str = "id,symbol,name,current_price,market_cap_rank\n\
dogecoin,doge,Dogecoin,0.125,9\n";

pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Set a file's mtime to `age` in the past.
pub fn age_file(path: &Path, age: Duration) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
}

pub fn days(n: u64) -> Duration {
    Duration::from_secs(n * 24 * 60 * 60)
}
