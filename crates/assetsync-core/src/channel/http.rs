//! HTTP channel over libcurl.
//!
//! Download: `GET <locator>`; the locator is an absolute URL or a path
//! relative to the endpoint. Curl pushes body data from a worker thread into a
//! bounded queue, which the returned [`ChunkStream`] drains on the caller's
//! thread, so memory stays bounded by the queue depth.
//!
//! Upload: `POST <endpoint>/records/<record>/fields/<field>` with the raw
//! ciphertext; the server answers `{"receipt": "...", "remoteLocator": "..."}`.

use std::cell::Cell;
use std::collections::HashMap;
use std::str;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use url::Url;

use super::{validate_path_component, ChannelError, ChunkStream, TransferChannel, UploadAck};
use crate::asset::{Receipt, RemoteLocator};
use crate::config::AssetSyncConfig;
use crate::record::Record;

/// Curl tuning for the HTTP channel.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    /// Hard cap on one transfer; a stuck transfer eventually fails.
    pub transfer_timeout: Duration,
    /// Chunks buffered between the curl worker and the consumer.
    pub queue_depth: usize,
    pub headers: HashMap<String, String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            transfer_timeout: Duration::from_secs(3600),
            queue_depth: 16,
            headers: HashMap::new(),
        }
    }
}

impl HttpOptions {
    pub fn from_config(cfg: &AssetSyncConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            transfer_timeout: Duration::from_secs(cfg.transfer_timeout_secs),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpChannel {
    endpoint: Url,
    options: HttpOptions,
}

/// Error bodies are kept only for the message; cap what we hold.
const MAX_ERROR_BODY: usize = 4096;

/// Upload reply body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadReply {
    receipt: String,
    #[serde(default, alias = "downloadURL")]
    remote_locator: Option<String>,
}

/// Messages from the curl worker to the consuming iterator.
enum Event {
    /// First 2xx body bytes are about to follow.
    Start { content_length: Option<u64> },
    Chunk(Vec<u8>),
    Done(Result<(), ChannelError>),
}

impl HttpChannel {
    pub fn new(endpoint: &str, options: HttpOptions) -> anyhow::Result<Self> {
        let endpoint = Url::parse(endpoint).with_context(|| format!("invalid endpoint URL: {endpoint}"))?;
        if endpoint.cannot_be_a_base() {
            anyhow::bail!("endpoint URL cannot be a base: {endpoint}");
        }
        if !matches!(endpoint.scheme(), "http" | "https") {
            anyhow::bail!("endpoint URL must be http or https: {endpoint}");
        }
        Ok(Self { endpoint, options })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Locators come from remote metadata; only http(s) URLs reach curl.
    fn resolve(&self, locator: &RemoteLocator) -> Result<Url, ChannelError> {
        let url = match Url::parse(locator.as_str()) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .endpoint
                .join(locator.as_str())
                .map_err(|e| ChannelError::Protocol(format!("bad locator {locator}: {e}")))?,
            Err(e) => return Err(ChannelError::Protocol(format!("bad locator {locator}: {e}"))),
        };
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ChannelError::Protocol(format!(
                "unsupported locator scheme {other}: {locator}"
            ))),
        }
    }

    fn upload_url(&self, record: &Record, field_name: &str) -> Result<Url, ChannelError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ChannelError::Protocol("endpoint cannot be a base".into()))?
            .pop_if_empty()
            .extend(["records", record.record_name(), "fields", field_name]);
        Ok(url)
    }

    fn easy(&self, url: &Url) -> Result<curl::easy::Easy, ChannelError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str())?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.options.connect_timeout)?;
        // Abort if throughput drops below 1 KiB/s for 60s.
        easy.low_speed_limit(1024)?;
        easy.low_speed_time(Duration::from_secs(60))?;
        easy.timeout(self.options.transfer_timeout)?;
        Ok(easy)
    }

    fn header_list(&self, extra: &[&str]) -> Result<curl::easy::List, ChannelError> {
        let mut list = curl::easy::List::new();
        for (k, v) in &self.options.headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        for h in extra {
            list.append(h)?;
        }
        Ok(list)
    }
}

fn status_error(code: u32, body: &[u8]) -> ChannelError {
    let detail = str::from_utf8(body).unwrap_or("").trim();
    let detail = if detail.is_empty() {
        format!("HTTP {code}")
    } else {
        format!("HTTP {code}: {detail}")
    };
    match code {
        404 => ChannelError::NotFound(detail),
        401 | 403 | 409 | 413 | 422 | 507 => ChannelError::Rejected(detail),
        _ => ChannelError::Http(code),
    }
}

/// Parse a status line (`HTTP/1.1 200 OK`) into its code.
fn parse_status_line(line: &str) -> Option<u32> {
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}

fn parse_content_length(line: &str) -> Option<u64> {
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return None;
    }
    value.trim().parse().ok()
}

/// Run one GET on the worker thread, pushing events to `tx`.
fn run_get(mut easy: curl::easy::Easy, tx: mpsc::SyncSender<Event>) {
    let status = Cell::new(0u32);
    let content_length: Cell<Option<u64>> = Cell::new(None);
    let started = Cell::new(false);
    let consumer_gone = Cell::new(false);
    let mut error_body: Vec<u8> = Vec::new();

    let result = (|| -> Result<(), curl::Error> {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(line) = str::from_utf8(data) {
                let line = line.trim_end();
                if let Some(code) = parse_status_line(line) {
                    // New response (redirect hop): forget the previous one's headers.
                    status.set(code);
                    content_length.set(None);
                } else if let Some(len) = parse_content_length(line) {
                    content_length.set(Some(len));
                }
            }
            true
        })?;
        transfer.write_function(|data| {
            if !(200..300).contains(&status.get()) {
                let room = MAX_ERROR_BODY.saturating_sub(error_body.len());
                error_body.extend_from_slice(&data[..data.len().min(room)]);
                return Ok(data.len());
            }
            if !started.get() {
                started.set(true);
                let start = Event::Start {
                    content_length: content_length.get(),
                };
                if tx.send(start).is_err() {
                    consumer_gone.set(true);
                    return Ok(0);
                }
            }
            if tx.send(Event::Chunk(data.to_vec())).is_err() {
                consumer_gone.set(true);
                return Ok(0);
            }
            Ok(data.len())
        })?;
        transfer.perform()
    })();

    if consumer_gone.get() {
        tracing::debug!("download consumer dropped; transfer aborted");
        return;
    }

    let outcome = match result {
        Err(e) => Err(ChannelError::Curl(e)),
        Ok(()) => {
            let code = easy.response_code().map(|c| c as u32).unwrap_or(status.get());
            if (200..300).contains(&code) {
                if !started.get() {
                    let _ = tx.send(Event::Start {
                        content_length: content_length.get().or(Some(0)),
                    });
                }
                Ok(())
            } else {
                Err(status_error(code, &error_body))
            }
        }
    };
    let _ = tx.send(Event::Done(outcome));
}

/// Consumer side of the worker queue.
struct HttpChunks {
    rx: mpsc::Receiver<Event>,
    done: bool,
}

impl Iterator for HttpChunks {
    type Item = super::ChunkResult;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.rx.recv() {
                Ok(Event::Chunk(c)) => return Some(Ok(c)),
                Ok(Event::Start { .. }) => continue,
                Ok(Event::Done(Ok(()))) => self.done = true,
                Ok(Event::Done(Err(e))) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Err(_) => {
                    self.done = true;
                    return Some(Err(ChannelError::Protocol(
                        "download worker exited without finishing".into(),
                    )));
                }
            }
        }
        None
    }
}

impl TransferChannel for HttpChannel {
    fn download(&self, locator: &RemoteLocator) -> Result<ChunkStream<'_>, ChannelError> {
        let url = self.resolve(locator)?;
        let mut easy = self.easy(&url)?;
        if !self.options.headers.is_empty() {
            easy.http_headers(self.header_list(&[])?)?;
        }

        let (tx, rx) = mpsc::sync_channel(self.options.queue_depth.max(1));
        std::thread::spawn(move || run_get(easy, tx));
        tracing::debug!("GET {}", url);

        match rx.recv() {
            Ok(Event::Start { content_length }) => Ok(ChunkStream::new(
                content_length,
                HttpChunks { rx, done: false },
            )),
            Ok(Event::Done(Err(e))) => Err(e),
            Ok(Event::Done(Ok(()))) | Ok(Event::Chunk(_)) => Err(ChannelError::Protocol(
                "download worker sent data before start".into(),
            )),
            Err(_) => Err(ChannelError::Protocol(
                "download worker exited without a response".into(),
            )),
        }
    }

    fn upload(
        &self,
        record: &Record,
        field_name: &str,
        ciphertext: &[u8],
    ) -> Result<UploadAck, ChannelError> {
        validate_path_component("record", record.record_name())?;
        validate_path_component("field", field_name)?;
        let url = self.upload_url(record, field_name)?;

        let mut easy = self.easy(&url)?;
        let record_type = format!("X-Record-Type: {}", record.record_type());
        // Empty `Expect:` disables the 100-continue round trip.
        easy.http_headers(self.header_list(&[
            "Content-Type: application/octet-stream",
            "Expect:",
            &record_type,
        ])?)?;
        easy.post(true)?;
        easy.post_field_size(ciphertext.len() as u64)?;
        easy.post_fields_copy(ciphertext)?;

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()? as u32;
        tracing::debug!("POST {} returned HTTP {}", url, code);
        if !(200..300).contains(&code) {
            return Err(status_error(code, &body));
        }

        let reply: UploadReply = serde_json::from_slice(&body)
            .map_err(|e| ChannelError::Protocol(format!("bad upload reply: {e}")))?;
        if reply.receipt.is_empty() {
            return Err(ChannelError::Protocol("upload reply has empty receipt".into()));
        }
        Ok(UploadAck {
            receipt: Receipt::new(reply.receipt),
            remote_locator: reply.remote_locator.map(RemoteLocator::new),
        })
    }
}
