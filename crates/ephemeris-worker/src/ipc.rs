//! Newline-delimited JSON framing for the worker subprocess protocol.
//!
//! Each line on the worker's stdin is one [`WireRequest`]; each line on its
//! stdout is one [`WireResponse`]. Keeping the wire format line-oriented
//! means a worker can be driven interactively over a debugger without
//! extra framing logic.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// One job sent to a worker subprocess.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRequest {
    pub job_id: String,
    pub payload: Value,
}

/// One job result read back from a worker subprocess.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireResponse {
    pub job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Write one request as a single newline-terminated JSON line.
pub async fn write_request<W: tokio::io::AsyncWrite + Unpin>(
    writer: &mut W,
    req: &WireRequest,
) -> std::io::Result<()> {
    let mut line = serde_json::to_vec(req).expect("WireRequest always serializes");
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await
}

/// Read one response line and parse it. Returns `Ok(None)` on EOF (the
/// worker process exited).
pub async fn read_response<R: tokio::io::AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> std::io::Result<Option<WireResponse>> {
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Ok(None);
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let parsed: WireResponse = serde_json::from_str(trimmed)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(Some(parsed))
}

/// Child-side mirror of [`read_response`]: read one request line from the
/// worker's stdin. Returns `Ok(None)` on EOF (the parent closed the pipe).
pub async fn read_request<R: tokio::io::AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> std::io::Result<Option<WireRequest>> {
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Ok(None);
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let parsed: WireRequest = serde_json::from_str(trimmed)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(Some(parsed))
}

/// Child-side mirror of [`write_request`]: write one response line.
pub async fn write_response<W: tokio::io::AsyncWrite + Unpin>(
    writer: &mut W,
    resp: &WireResponse,
) -> std::io::Result<()> {
    let mut line = serde_json::to_vec(resp).expect("WireResponse always serializes");
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await
}

/// Write the `"ready"` sentinel line a worker emits once its kernel bundle
/// has finished loading, per [`crate::slot::WorkerSlot::spawn`]'s contract.
pub async fn write_ready<W: tokio::io::AsyncWrite + Unpin>(writer: &mut W) -> std::io::Result<()> {
    writer.write_all(b"ready\n").await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn roundtrip_request_through_buffer() {
        let req = WireRequest { job_id: "abc".to_string(), payload: serde_json::json!({"x": 1}) };
        let mut buf = Vec::new();
        write_request(&mut buf, &req).await.unwrap();
        assert!(buf.ends_with(b"\n"));
        let parsed: WireRequest = serde_json::from_slice(&buf[..buf.len() - 1]).unwrap();
        assert_eq!(parsed.job_id, "abc");
    }

    #[tokio::test]
    async fn read_response_returns_none_on_eof() {
        let data: &[u8] = b"";
        let mut reader = BufReader::new(data);
        let resp = read_response(&mut reader).await.unwrap();
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn read_response_parses_success_line() {
        let line = br#"{"job_id":"j1","result":{"ok":true}}"#;
        let mut with_newline = line.to_vec();
        with_newline.push(b'\n');
        let mut reader = BufReader::new(&with_newline[..]);
        let resp = read_response(&mut reader).await.unwrap().unwrap();
        assert_eq!(resp.job_id, "j1");
        assert!(resp.error.is_none());
    }

    #[tokio::test]
    async fn child_side_round_trip() {
        let mut buf = Vec::new();
        write_ready(&mut buf).await.unwrap();
        assert_eq!(buf, b"ready\n");

        let req = WireRequest { job_id: "j2".to_string(), payload: serde_json::json!({"y": 2}) };
        let mut req_buf = Vec::new();
        write_request(&mut req_buf, &req).await.unwrap();
        let mut reader = BufReader::new(&req_buf[..]);
        let parsed = read_request(&mut reader).await.unwrap().unwrap();
        assert_eq!(parsed.job_id, "j2");

        let resp = WireResponse { job_id: "j2".to_string(), result: Some(serde_json::json!(42)), error: None };
        let mut resp_buf = Vec::new();
        write_response(&mut resp_buf, &resp).await.unwrap();
        let mut reader = BufReader::new(&resp_buf[..]);
        let parsed = read_response(&mut reader).await.unwrap().unwrap();
        assert_eq!(parsed.result, Some(serde_json::json!(42)));
    }
}
