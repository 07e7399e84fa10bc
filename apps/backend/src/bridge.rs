//! # Command Bridge
//!
//! JSON lines in, JSON lines out.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reader (stdin)                                                         │
//! │     │  one request per line                                             │
//! │     ▼                                                                   │
//! │  parse ──error──► {"success":false,"code":"INVALID_REQUEST",...}        │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  dispatch ──Err──► {"success":false,"code":"...","message":"..."}       │
//! │     │                                                                   │
//! │     └──Ok──────► {"success":true,"data":...}                            │
//! │                                                     writer (stdout)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Requests are handled one at a time, in arrival order, and every request
//! line gets exactly one response line. Blank lines are ignored. The loop
//! ends when the reader reaches end of input.

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::commands::{dispatch, Command};
use crate::error::{ApiError, ErrorCode};
use crate::state::AppState;

/// One response line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn ok(data: Value) -> Self {
        Response {
            success: true,
            data: Some(data),
            code: None,
            message: None,
        }
    }

    pub fn error(err: ApiError) -> Self {
        Response {
            success: false,
            data: None,
            code: Some(err.code),
            message: Some(err.message),
        }
    }
}

impl From<Result<Value, ApiError>> for Response {
    fn from(result: Result<Value, ApiError>) -> Self {
        match result {
            Ok(data) => Response::ok(data),
            Err(err) => Response::error(err),
        }
    }
}

/// Handles a single request line.
pub async fn handle_line(state: &AppState, line: &str) -> Response {
    let command: Command = match serde_json::from_str(line) {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, "Rejected request");
            return Response::error(ApiError::invalid_request(format!("Invalid request: {}", e)));
        }
    };

    let name = command.name();
    debug!(command = name, "Handling command");

    let result = dispatch(state, command).await;
    if let Err(ref e) = result {
        debug!(command = name, code = ?e.code, message = %e.message, "Command failed");
    }
    Response::from(result)
}

/// Serves requests from `reader` until end of input.
pub async fn serve<R, W>(state: &AppState, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = handle_line(state, line).await;
        let encoded = serde_json::to_string(&response)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        writer.write_all(encoded.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        handled += 1;
    }

    info!(handled = handled, "Input closed, bridge stopping");
    Ok(())
}
