// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Remote job fetch and report-back over HTTP.
//
// One bounded timeout, no retry: a print command has spooler side effects
// and must not be silently repeated.

use std::time::Duration;

use reqwest::header::HeaderMap;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use druckbote_core::config::ClientConfig;
use druckbote_core::error::{DruckboteError, Result};
use druckbote_core::types::{PAPER_SIZE_HEADER, PaperSize};
use druckbote_document::JobSpool;

/// HTTP client for the job-fetch and report-back protocol.
pub struct RemoteJobFetcher {
    client: reqwest::Client,
}

impl RemoteJobFetcher {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| DruckboteError::RemoteFetch(format!("client setup: {e}")))?;
        Ok(Self { client })
    }

    /// POST the passthrough parameters to `target_url` and spool the PDF
    /// payload from the response body.
    ///
    /// The optional paper-size hint is read from the `PaperSize` response
    /// header; a missing or unparseable header is non-fatal and yields
    /// `None`.  The body is copied chunk by chunk into the returned
    /// [`JobSpool`] so memory stays flat regardless of document size.
    ///
    /// Connection failure, timeout, or a non-success status fails with
    /// [`DruckboteError::RemoteFetch`] before any page is printed.
    pub async fn fetch(
        &self,
        target_url: &str,
        parameters: &Map<String, Value>,
    ) -> Result<(JobSpool, Option<PaperSize>)> {
        info!(url = target_url, "requesting print job");

        let mut response = self
            .client
            .post(target_url)
            .json(parameters)
            .send()
            .await
            .map_err(|e| DruckboteError::RemoteFetch(format!("POST {target_url}: {e}")))?;

        if !response.status().is_success() {
            return Err(DruckboteError::RemoteFetch(format!(
                "{target_url} answered {}",
                response.status()
            )));
        }

        let hint = paper_size_hint(response.headers());

        let mut spool = JobSpool::new()?;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| DruckboteError::RemoteFetch(format!("reading body: {e}")))?
        {
            spool.write_chunk(&chunk)?;
        }
        spool.finish()?;

        info!(bytes = spool.len(), hint = ?hint, "print job received");
        Ok((spool, hint))
    }

    /// POST a report-back JSON object (original parameters plus one result
    /// key) to `target_url`.
    pub async fn post_report(
        &self,
        target_url: &str,
        body: &Map<String, Value>,
    ) -> Result<()> {
        debug!(url = target_url, "posting report");
        let response = self
            .client
            .post(target_url)
            .json(body)
            .send()
            .await
            .map_err(|e| DruckboteError::RemoteFetch(format!("POST {target_url}: {e}")))?;

        if !response.status().is_success() {
            return Err(DruckboteError::RemoteFetch(format!(
                "{target_url} answered {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Parse the `PaperSize` response header, if any.  Parse failures and
/// degenerate sizes are logged and treated as absent -- the dispatcher then
/// falls back to the printer default.
fn paper_size_hint(headers: &HeaderMap) -> Option<PaperSize> {
    let raw = headers.get(PAPER_SIZE_HEADER)?;
    let text = match raw.to_str() {
        Ok(text) => text,
        Err(_) => {
            warn!("PaperSize header is not valid text, ignoring");
            return None;
        }
    };
    match serde_json::from_str::<PaperSize>(text) {
        Ok(size) if size.is_degenerate() => {
            warn!(size = %size, "degenerate PaperSize hint, ignoring");
            None
        }
        Ok(size) => Some(size),
        Err(e) => {
            warn!(header = text, error = %e, "unparseable PaperSize header, ignoring");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use crate::command::CommandParser;

    use super::*;

    fn config() -> ClientConfig {
        ClientConfig {
            request_timeout_secs: 5,
            ..ClientConfig::default()
        }
    }

    /// Serve exactly one canned HTTP response on an ephemeral port and
    /// capture the request bytes.
    async fn serve_once(response: String) -> (String, JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/job", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            // Read until the headers and the Content-Length body are in.
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if let Some(body_start) = find(&request, b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&request[..body_start]);
                    let content_length = head
                        .lines()
                        .find(|l| l.to_ascii_lowercase().starts_with("content-length:"))
                        .and_then(|l| l.split(':').nth(1))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= body_start + 4 + content_length {
                        break;
                    }
                }
            }
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            request
        });

        (url, handle)
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    fn pdf_response(headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\n{headers}Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[tokio::test]
    async fn fetch_spools_body_and_reads_hint() {
        let header = r#"PaperSize: {"Name":"A4","Width":210,"Height":297}"#;
        let (url, server) =
            serve_once(pdf_response(&format!("{header}\r\n"), "%PDF-1.5 fake")).await;

        let fetcher = RemoteJobFetcher::new(&config()).unwrap();
        let mut params = Map::new();
        params.insert("JobId".into(), Value::String("7".into()));

        let (spool, hint) = fetcher.fetch(&url, &params).await.unwrap();

        assert_eq!(hint, Some(PaperSize::a4()));
        assert_eq!(std::fs::read(spool.path()).unwrap(), b"%PDF-1.5 fake");

        let request = String::from_utf8(server.await.unwrap()).unwrap();
        assert!(request.starts_with("POST /job HTTP/1.1\r\n"));
        assert!(request.ends_with(r#"{"JobId":"7"}"#));
    }

    #[tokio::test]
    async fn printer_name_extracted_at_parse_never_reaches_the_wire() {
        let (url, server) = serve_once(pdf_response("", "%PDF-1.5")).await;

        let command = CommandParser::parse(&format!(
            "DoPrint {url}?PrinterName=HP1&JobId=7"
        ))
        .unwrap();

        let fetcher = RemoteJobFetcher::new(&config()).unwrap();
        fetcher
            .fetch(&command.target_url, &command.parameters.passthrough)
            .await
            .unwrap();

        let request = String::from_utf8(server.await.unwrap()).unwrap();
        assert!(!request.contains("PrinterName"));
        assert!(request.ends_with(r#"{"JobId":"7"}"#));
    }

    #[tokio::test]
    async fn unparseable_hint_is_soft() {
        let (url, _server) =
            serve_once(pdf_response("PaperSize: not json at all\r\n", "%PDF-1.5")).await;

        let fetcher = RemoteJobFetcher::new(&config()).unwrap();
        let (_spool, hint) = fetcher.fetch(&url, &Map::new()).await.unwrap();
        assert_eq!(hint, None);
    }

    #[tokio::test]
    async fn non_success_status_is_a_remote_fetch_error() {
        let (url, _server) = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                .into(),
        )
        .await;

        let fetcher = RemoteJobFetcher::new(&config()).unwrap();
        let err = fetcher.fetch(&url, &Map::new()).await.unwrap_err();
        assert!(matches!(err, DruckboteError::RemoteFetch(_)));
    }

    #[tokio::test]
    async fn connection_refused_is_a_remote_fetch_error() {
        // Bind-then-drop guarantees a dead port.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/job", listener.local_addr().unwrap());
        drop(listener);

        let fetcher = RemoteJobFetcher::new(&config()).unwrap();
        let err = fetcher.fetch(&url, &Map::new()).await.unwrap_err();
        assert!(matches!(err, DruckboteError::RemoteFetch(_)));
    }

    #[test]
    fn degenerate_hint_is_discarded() {
        let mut headers = HeaderMap::new();
        headers.insert(
            PAPER_SIZE_HEADER,
            HeaderValue::from_static(r#"{"Name":"bad","Width":0,"Height":0}"#),
        );
        assert_eq!(paper_size_hint(&headers), None);
    }
}
