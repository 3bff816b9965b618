//! Minimal HTTP/1.1 hub server for integration tests.
//!
//! Serves fixed routes (listing JSON, files) keyed by path without query.
//! Supports Range GET with 206 responses (or routes that ignore ranges), can
//! fail a route with 500 for its first N requests, and records every request
//! for assertions.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// What a path serves.
#[derive(Debug)]
pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
    /// Answer 500 to this many requests before serving normally.
    pub fail_first: u32,
    /// Answer every GET with 200 and the whole body, even when a range is asked for.
    pub ignore_range: bool,
    served_failures: AtomicU32,
}

impl Route {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            fail_first: 0,
            ignore_range: false,
            served_failures: AtomicU32::new(0),
        }
    }

    pub fn flaky(body: impl Into<Vec<u8>>, fail_first: u32) -> Self {
        Self {
            fail_first,
            ..Self::ok(body)
        }
    }

    pub fn ignoring_range(body: impl Into<Vec<u8>>) -> Self {
        Self {
            ignore_range: true,
            ..Self::ok(body)
        }
    }
}

/// A request as seen by the server.
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: String,
    pub path: String,
    pub range: Option<(u64, u64)>,
}

pub struct HubServer {
    /// Base URL without trailing slash, e.g. `http://127.0.0.1:12345`.
    pub url: String,
    hits: Arc<Mutex<Vec<Hit>>>,
}

impl HubServer {
    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().unwrap().clone()
    }

    pub fn hits_for(&self, path: &str) -> Vec<Hit> {
        self.hits().into_iter().filter(|h| h.path == path).collect()
    }
}

/// Starts the server in a background thread. It runs until the process exits.
pub fn start(routes: Vec<(&str, Route)>) -> HubServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes: Arc<HashMap<String, Route>> = Arc::new(
        routes
            .into_iter()
            .map(|(p, r)| (p.to_string(), r))
            .collect(),
    );
    let hits = Arc::new(Mutex::new(Vec::new()));
    let hits_srv = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let hits = Arc::clone(&hits_srv);
            thread::spawn(move || handle(stream, &routes, &hits));
        }
    });
    HubServer {
        url: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

fn handle(mut stream: std::net::TcpStream, routes: &HashMap<String, Route>, hits: &Mutex<Vec<Hit>>) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let hit = parse_request(request);
    hits.lock().unwrap().push(hit.clone());

    let route = match routes.get(&hit.path) {
        Some(r) => r,
        None => {
            respond(&mut stream, "404 Not Found", b"{\"error\":\"not found\"}", None);
            return;
        }
    };
    if route.served_failures.load(Ordering::SeqCst) < route.fail_first {
        route.served_failures.fetch_add(1, Ordering::SeqCst);
        respond(&mut stream, "500 Internal Server Error", b"boom", None);
        return;
    }
    if route.status != 200 {
        let line = format!("{} Error", route.status);
        respond(&mut stream, &line, &route.body, None);
        return;
    }

    let body = &route.body;
    let total = body.len() as u64;
    match hit.range {
        Some((start, end_incl)) if !route.ignore_range && hit.method.eq_ignore_ascii_case("GET") => {
            let end_incl = end_incl.min(total.saturating_sub(1));
            if start >= total || start > end_incl {
                let range = format!("bytes */{}", total);
                respond(&mut stream, "416 Range Not Satisfiable", b"", Some(&range));
            } else {
                let slice = &body[start as usize..=end_incl as usize];
                let range = format!("bytes {}-{}/{}", start, end_incl, total);
                respond(&mut stream, "206 Partial Content", slice, Some(&range));
            }
        }
        _ => respond(&mut stream, "200 OK", body, None),
    }
}

fn respond(stream: &mut std::net::TcpStream, status: &str, body: &[u8], content_range: Option<&str>) {
    let range = content_range
        .map(|r| format!("Content-Range: {}\r\n", r))
        .unwrap_or_default();
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nAccept-Ranges: bytes\r\nETag: \"test-etag\"\r\n{}Connection: close\r\n\r\n",
        status,
        body.len(),
        range
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

/// Method, path without query, and optional (start, end_inclusive) for `Range: bytes=X-Y`.
fn parse_request(request: &str) -> Hit {
    let mut method = String::new();
    let mut path = String::new();
    let mut range = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            let mut parts = line.split_whitespace();
            method = parts.next().unwrap_or("").to_string();
            let target = parts.next().unwrap_or("");
            path = target.split('?').next().unwrap_or("").to_string();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if value.to_lowercase().starts_with("bytes=") {
                    if let Some((a, b)) = value[6..].trim().split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end = b.trim();
                        let end_incl = if end.is_empty() {
                            u64::MAX
                        } else {
                            end.parse::<u64>().unwrap_or(0)
                        };
                        range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    Hit {
        method,
        path,
        range,
    }
}
