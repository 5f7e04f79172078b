// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The listener service -- peer half of the print-bridge protocol.
//
// A dedicated accept path blocks only on "wait for the next connection"
// (and on a worker permit when the pool is saturated); every accepted
// request runs in its own task, so a slow client streaming a large file
// never stalls acceptance of new connections.  Handler failures are logged
// and never take down the accept loop.
//
// # Routes
//
//   path contains /UploadPrinterLists   -> log the JSON body, acknowledge
//   path contains /UploadDefaultPrinter -> log the JSON body, acknowledge
//   path contains /GetReport            -> stream the configured PDF with
//                                          the PaperSize header
//   anything else                       -> short plaintext acknowledgment

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use druckbote_core::config::ServiceConfig;
use druckbote_core::error::{DruckboteError, Result};
use druckbote_core::types::PAPER_SIZE_HEADER;

use crate::http::{self, Request};

/// Chunk size for streaming the PDF body.
const STREAM_CHUNK_BYTES: usize = 1024;

/// Body answered on acknowledgment-only paths.
const ACK_BODY: &str = "druckbote print service is running\n";

/// State shared across all connection-handling tasks.
struct SharedState {
    config: ServiceConfig,
    /// Bounds the number of concurrently running handlers.
    workers: Arc<Semaphore>,
    /// Counter of active connections (for diagnostics).
    active_connections: Arc<AtomicU32>,
}

/// The HTTP endpoint that accepts report-back uploads and streams PDF job
/// payloads with the paper-size hint header.
pub struct ListenerService {
    config: ServiceConfig,
    /// Notification handle used to signal a graceful shutdown.
    shutdown_signal: Arc<Notify>,
    /// Handle to the task running the accept loop.
    task_handle: Option<JoinHandle<()>>,
    active_connections: Arc<AtomicU32>,
}

impl ListenerService {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            shutdown_signal: Arc::new(Notify::new()),
            task_handle: None,
            active_connections: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Number of currently active client connections.
    pub fn active_connections(&self) -> u32 {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Bind the listener and spawn the accept loop.  Returns the bound
    /// address (useful when the configured port is 0).
    pub async fn start(&mut self) -> Result<SocketAddr> {
        self.config.validate()?;

        let bind_addr = format!("{}:{}", self.config.bind, self.config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| DruckboteError::Listener(format!("bind {bind_addr}: {e}")))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| DruckboteError::Listener(format!("local addr: {e}")))?;

        info!(
            addr = %local_addr,
            document = %self.config.document.display(),
            workers = self.config.max_workers,
            "listener service ready"
        );

        let shutdown = Arc::clone(&self.shutdown_signal);
        let shared = Arc::new(SharedState {
            workers: Arc::new(Semaphore::new(self.config.max_workers)),
            active_connections: Arc::clone(&self.active_connections),
            config: self.config.clone(),
        });

        let handle = tokio::spawn(async move {
            Self::accept_loop(listener, shutdown, shared).await;
        });
        self.task_handle = Some(handle);
        Ok(local_addr)
    }

    /// Gracefully stop the service.  Connections already mid-transfer are
    /// allowed to finish.
    pub async fn stop(&mut self) -> Result<()> {
        info!("stopping listener service");
        self.shutdown_signal.notify_one();
        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| DruckboteError::Listener(format!("task join: {e}")))?;
        }
        info!("listener service stopped");
        Ok(())
    }

    /// The accept loop.  Runs until the shutdown signal; each accepted
    /// connection runs in its own task holding one worker permit.
    async fn accept_loop(listener: TcpListener, shutdown: Arc<Notify>, shared: Arc<SharedState>) {
        loop {
            let permit = tokio::select! {
                _ = shutdown.notified() => break,
                permit = Arc::clone(&shared.workers).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            tokio::select! {
                _ = shutdown.notified() => break,

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            debug!(peer = %peer_addr, "incoming connection");
                            let state = Arc::clone(&shared);
                            tokio::spawn(async move {
                                state.active_connections.fetch_add(1, Ordering::Relaxed);
                                if let Err(e) = handle_connection(stream, peer_addr, &state).await {
                                    warn!(peer = %peer_addr, error = %e, "connection handler error");
                                }
                                state.active_connections.fetch_sub(1, Ordering::Relaxed);
                                drop(permit);
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }
            }
        }
        debug!("accept loop exited");
    }
}

/// Handle one inbound request on its own task.
async fn handle_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    state: &SharedState,
) -> Result<()> {
    let request = http::read_request(&mut stream).await?;
    info!(
        peer = %peer_addr,
        method = %request.method,
        path = %request.path,
        bytes = request.body.len(),
        "request received"
    );

    if request.path.contains("/UploadPrinterLists") {
        log_report("UploadPrinterLists", &request);
        http::write_text(&mut stream, 200, "OK", ACK_BODY).await?;
    } else if request.path.contains("/UploadDefaultPrinter") {
        log_report("UploadDefaultPrinter", &request);
        http::write_text(&mut stream, 200, "OK", ACK_BODY).await?;
    } else if request.path.contains("/GetReport") {
        stream_document(&mut stream, &request, state).await?;
    } else {
        http::write_text(&mut stream, 200, "OK", ACK_BODY).await?;
    }

    debug!(peer = %peer_addr, path = %request.path, "response sent");
    Ok(())
}

/// Log a report-back body.  The minimal contract only requires accepting
/// it; the content is diagnostic.
fn log_report(kind: &str, request: &Request) {
    match serde_json::from_slice::<serde_json::Value>(&request.body) {
        Ok(body) => info!(report = kind, body = %body, "report received"),
        Err(_) => warn!(
            report = kind,
            bytes = request.body.len(),
            "report body is not JSON"
        ),
    }
}

/// Stream the configured PDF back in bounded chunks, with the `PaperSize`
/// header set before the first body byte.
async fn stream_document(
    stream: &mut TcpStream,
    request: &Request,
    state: &SharedState,
) -> Result<()> {
    if !request.body.is_empty() {
        log_report("GetReport", request);
    }

    let mut file = match tokio::fs::File::open(&state.config.document).await {
        Ok(file) => file,
        Err(e) => {
            error!(
                document = %state.config.document.display(),
                error = %e,
                "configured document is unavailable"
            );
            http::write_text(stream, 500, "Internal Server Error", "document unavailable\n")
                .await?;
            return Ok(());
        }
    };
    let total = file.metadata().await?.len();
    let paper_size = serde_json::to_string(&state.config.paper_size)?;

    http::write_head(
        stream,
        200,
        "OK",
        &[
            ("Content-Type", "application/pdf".to_string()),
            (PAPER_SIZE_HEADER, paper_size),
            ("Content-Length", total.to_string()),
        ],
    )
    .await?;

    let mut buf = [0u8; STREAM_CHUNK_BYTES];
    let mut sent = 0u64;
    loop {
        let n = tokio::io::AsyncReadExt::read(&mut file, &mut buf).await?;
        if n == 0 {
            break;
        }
        stream.write_all(&buf[..n]).await?;
        sent += n as u64;
    }
    stream.flush().await?;

    info!(bytes = sent, total, "document streamed");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write as _;
    use std::path::PathBuf;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    use druckbote_core::types::PaperSize;

    use super::*;

    fn test_config(document: PathBuf) -> ServiceConfig {
        ServiceConfig {
            bind: "127.0.0.1".into(),
            port: 0,
            document,
            paper_size: PaperSize::a4(),
            max_workers: 4,
        }
    }

    async fn roundtrip(addr: SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }

    fn fake_pdf() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.5 fake document body").unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn get_report_streams_document_with_paper_size_header() {
        let document = fake_pdf();
        let mut service = ListenerService::new(test_config(document.path().to_path_buf()));
        let addr = service.start().await.unwrap();

        let response = roundtrip(
            addr,
            "POST /api/GetReport HTTP/1.1\r\nContent-Length: 2\r\n\r\n{}",
        )
        .await;

        let (head, body) = response.split_once("\r\n\r\n").unwrap();
        assert!(head.starts_with("HTTP/1.1 200 OK"));
        assert!(head.contains(r#"PaperSize: {"Name":"A4","Width":210,"Height":297}"#));
        assert_eq!(body, "%PDF-1.5 fake document body");

        service.stop().await.unwrap();
    }

    #[tokio::test]
    async fn upload_paths_acknowledge_json_bodies() {
        let document = fake_pdf();
        let mut service = ListenerService::new(test_config(document.path().to_path_buf()));
        let addr = service.start().await.unwrap();

        let body = r#"{"LocalPrinters":["HP1","Canon2"]}"#;
        let response = roundtrip(
            addr,
            &format!(
                "POST /api/UploadPrinterLists HTTP/1.1\r\nContent-Length: {}\r\n\r\n{body}",
                body.len()
            ),
        )
        .await;

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains(ACK_BODY.trim_end()));

        service.stop().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_paths_get_a_plain_acknowledgment() {
        let document = fake_pdf();
        let mut service = ListenerService::new(test_config(document.path().to_path_buf()));
        let addr = service.start().await.unwrap();

        let response = roundtrip(addr, "GET /whatever HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("text/plain"));

        service.stop().await.unwrap();
    }

    #[tokio::test]
    async fn missing_document_answers_500_without_crashing_the_loop() {
        let mut service =
            ListenerService::new(test_config(PathBuf::from("/nonexistent/nowhere.pdf")));
        let addr = service.start().await.unwrap();

        let response = roundtrip(addr, "POST /GetReport HTTP/1.1\r\nContent-Length: 0\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 500"));

        // The loop is still alive for the next client.
        let response = roundtrip(addr, "GET /ping HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));

        service.stop().await.unwrap();
    }

    #[tokio::test]
    async fn accepts_new_connections_while_another_is_still_open() {
        let document = fake_pdf();
        let mut service = ListenerService::new(test_config(document.path().to_path_buf()));
        let addr = service.start().await.unwrap();

        // First client connects but sends nothing yet; its handler parks in
        // read_request.
        let mut parked = TcpStream::connect(addr).await.unwrap();
        parked.write_all(b"POST /GetReport HTT").await.unwrap();

        // A second client must still get served.
        let response = roundtrip(addr, "GET /ping HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));

        drop(parked);
        service.stop().await.unwrap();
    }
}
