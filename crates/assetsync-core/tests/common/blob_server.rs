//! Minimal HTTP/1.1 blob server for integration tests.
//!
//! `POST /records/<record>/fields/<field>` stores the request body and answers
//! `{"receipt": "r-<n>", "remoteLocator": "blobs/<n>"}`.
//! `GET /blobs/<n>` serves the stored body with a Content-Length.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct BlobServerOptions {
    /// Answer every POST with 413 Payload Too Large.
    pub reject_uploads: bool,
    /// Declare the full Content-Length on GET but send only half the body.
    pub truncate_downloads: bool,
}

#[derive(Default)]
struct Store {
    next_id: u64,
    blobs: HashMap<u64, Vec<u8>>,
}

#[derive(Clone)]
pub struct BlobServer {
    base_url: String,
    store: Arc<Mutex<Store>>,
}

impl BlobServer {
    /// Base URL ending in `/`, e.g. "http://127.0.0.1:12345/".
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Stored ciphertext for blob `id`.
    pub fn blob(&self, id: u64) -> Option<Vec<u8>> {
        self.store.lock().unwrap().blobs.get(&id).cloned()
    }

    /// Overwrite blob `id` (e.g. to simulate tampering at rest).
    pub fn replace_blob(&self, id: u64, data: Vec<u8>) {
        self.store.lock().unwrap().blobs.insert(id, data);
    }

    pub fn blob_count(&self) -> usize {
        self.store.lock().unwrap().blobs.len()
    }
}

/// Starts a server in a background thread. Runs until the process exits.
pub fn start() -> BlobServer {
    start_with_options(BlobServerOptions::default())
}

pub fn start_with_options(opts: BlobServerOptions) -> BlobServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let store = Arc::new(Mutex::new(Store::default()));
    let shared = Arc::clone(&store);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let store = Arc::clone(&shared);
            thread::spawn(move || handle(stream, &store, opts));
        }
    });
    BlobServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        store,
    }
}

struct Request {
    method: String,
    path: String,
    body: Vec<u8>,
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 8192];
    let header_end = loop {
        let n = stream.read(&mut tmp).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&tmp[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = std::str::from_utf8(&buf[..header_end]).ok()?.to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut tmp).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&tmp[..n]);
    }
    body.truncate(content_length);
    Some(Request { method, path, body })
}

fn respond(stream: &mut TcpStream, status: &str, content_type: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

fn handle(mut stream: TcpStream, store: &Mutex<Store>, opts: BlobServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };
    let segments: Vec<&str> = req.path.trim_matches('/').split('/').collect();

    match (req.method.as_str(), segments.as_slice()) {
        ("POST", ["records", _record, "fields", _field]) => {
            if opts.reject_uploads {
                respond(&mut stream, "413 Payload Too Large", "text/plain", b"quota exceeded");
                return;
            }
            let id = {
                let mut store = store.lock().unwrap();
                store.next_id += 1;
                let id = store.next_id;
                store.blobs.insert(id, req.body);
                id
            };
            let reply = format!(r#"{{"receipt":"r-{id}","remoteLocator":"blobs/{id}"}}"#);
            respond(&mut stream, "201 Created", "application/json", reply.as_bytes());
        }
        ("GET", ["blobs", id]) => {
            let blob = id
                .parse::<u64>()
                .ok()
                .and_then(|id| store.lock().unwrap().blobs.get(&id).cloned());
            let Some(blob) = blob else {
                respond(&mut stream, "404 Not Found", "text/plain", b"no such blob");
                return;
            };
            if opts.truncate_downloads {
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    blob.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(&blob[..blob.len() / 2]);
                return;
            }
            respond(&mut stream, "200 OK", "application/octet-stream", &blob);
        }
        _ => respond(&mut stream, "405 Method Not Allowed", "text/plain", b""),
    }
}
