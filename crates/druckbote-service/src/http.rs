// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Minimal HTTP/1.1 framing over raw TCP.
//
// The service speaks just enough HTTP for the bridge protocol: a request
// line, headers, a Content-Length body, and `Connection: close` responses.
// A full HTTP server would be unnecessary overhead for four routes.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use druckbote_core::error::{DruckboteError, Result};

/// Cap on the request head (request line + headers).
const MAX_HEAD_BYTES: usize = 16 * 1024;

/// Cap on the request body.  Report-back bodies are small JSON objects;
/// anything larger is a misbehaving client.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// A parsed inbound request.
#[derive(Debug)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    /// First header with the given name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_length(&self) -> usize {
        self.header("content-length")
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// Read one request from the stream: head until the blank line, then the
/// declared Content-Length body.
pub async fn read_request(stream: &mut (impl AsyncRead + Unpin)) -> Result<Request> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
            break pos;
        }
        if buf.len() > MAX_HEAD_BYTES {
            return Err(DruckboteError::Listener("request head too large".into()));
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(DruckboteError::Listener(
                "connection closed mid-request".into(),
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let (method, path, headers) = parse_head(&buf[..header_end])?;

    let mut request = Request {
        method,
        path,
        headers,
        body: buf[header_end + 4..].to_vec(),
    };

    let content_length = request.content_length();
    if content_length > MAX_BODY_BYTES {
        return Err(DruckboteError::Listener(format!(
            "request body of {content_length} bytes exceeds the cap"
        )));
    }
    while request.body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(DruckboteError::Listener(
                "connection closed mid-body".into(),
            ));
        }
        request.body.extend_from_slice(&chunk[..n]);
    }
    request.body.truncate(content_length);

    Ok(request)
}

/// Parse the request line and header lines.
fn parse_head(head: &[u8]) -> Result<(String, String, Vec<(String, String)>)> {
    let text = std::str::from_utf8(head)
        .map_err(|_| DruckboteError::Listener("request head is not UTF-8".into()))?;

    let mut lines = text.split("\r\n");
    let request_line = lines
        .next()
        .ok_or_else(|| DruckboteError::Listener("empty request".into()))?;

    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| DruckboteError::Listener("missing method".into()))?
        .to_string();
    let path = parts
        .next()
        .ok_or_else(|| {
            DruckboteError::Listener(format!("no path in request line {request_line:?}"))
        })?
        .to_string();

    let headers = lines
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            line.split_once(':')
                .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        })
        .collect();

    Ok((method, path, headers))
}

/// First occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Write a response head.  Every response closes the connection.
pub async fn write_head(
    stream: &mut (impl AsyncWrite + Unpin),
    status: u16,
    reason: &str,
    headers: &[(&str, String)],
) -> Result<()> {
    let mut head = format!("HTTP/1.1 {status} {reason}\r\n");
    for (name, value) in headers {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    head.push_str("Connection: close\r\n\r\n");
    stream.write_all(head.as_bytes()).await?;
    Ok(())
}

/// Write a complete plaintext response.
pub async fn write_text(
    stream: &mut (impl AsyncWrite + Unpin),
    status: u16,
    reason: &str,
    body: &str,
) -> Result<()> {
    write_head(
        stream,
        status,
        reason,
        &[
            ("Content-Type", "text/plain; charset=utf-8".to_string()),
            ("Content-Length", body.len().to_string()),
        ],
    )
    .await?;
    stream.write_all(body.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_request_with_body() {
        let raw = b"POST /GetReport?x=1 HTTP/1.1\r\nHost: svc\r\nContent-Length: 9\r\n\r\n{\"a\":\"b\"}";
        let mut cursor = std::io::Cursor::new(raw.to_vec());

        let request = read_request(&mut cursor).await.unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/GetReport?x=1");
        assert_eq!(request.header("host"), Some("svc"));
        assert_eq!(request.body, b"{\"a\":\"b\"}");
    }

    #[tokio::test]
    async fn body_is_truncated_to_content_length() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: 2\r\n\r\nabXXX";
        let mut cursor = std::io::Cursor::new(raw.to_vec());
        let request = read_request(&mut cursor).await.unwrap();
        assert_eq!(request.body, b"ab");
    }

    #[tokio::test]
    async fn missing_body_bytes_fail() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: 50\r\n\r\nshort";
        let mut cursor = std::io::Cursor::new(raw.to_vec());
        assert!(matches!(
            read_request(&mut cursor).await,
            Err(DruckboteError::Listener(_))
        ));
    }

    #[tokio::test]
    async fn garbage_request_line_fails() {
        let raw = b"NONSENSE\r\n\r\n";
        let mut cursor = std::io::Cursor::new(raw.to_vec());
        assert!(read_request(&mut cursor).await.is_err());
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let request = Request {
            method: "GET".into(),
            path: "/".into(),
            headers: vec![("Content-Length".into(), "5".into())],
            body: Vec::new(),
        };
        assert_eq!(request.header("content-length"), Some("5"));
        assert_eq!(request.content_length(), 5);
    }

    #[tokio::test]
    async fn write_text_frames_a_full_response() {
        let mut out = Vec::new();
        write_text(&mut out, 200, "OK", "hello").await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("\r\n\r\nhello"));
    }
}
