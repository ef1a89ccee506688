//! Unix socket client for the timer host

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::Mutex;

use super::protocol::*;
use super::{HostApi, HostError, HostMethod};
use crate::i18n::TranslationTable;
use crate::model::{LanguageCode, Timer};

/// Default path of the host socket
pub fn default_socket_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".timerdeck")
        .join("host.sock")
}

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Connection {
    async fn open(path: &Path) -> io::Result<Self> {
        let stream = UnixStream::connect(path).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        })
    }

    /// Write one request line and read until the response with `id` arrives
    async fn exchange(
        &mut self,
        id: u64,
        method: HostMethod,
        request_line: &str,
    ) -> Result<serde_json::Value, HostError> {
        self.writer.write_all(request_line.as_bytes()).await?;
        self.writer.flush().await?;

        // Read lines, skipping notifications and foreign responses
        loop {
            let mut line = String::new();
            let read = self.reader.read_line(&mut line).await?;
            if read == 0 {
                return Err(HostError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "host closed the connection",
                )));
            }

            if line.trim().is_empty() {
                continue;
            }

            let json_value: serde_json::Value = serde_json::from_str(&line)?;

            // Notifications have no id
            if json_value.get("id").map_or(true, |id| id.is_null()) {
                tracing::trace!(line = line.trim(), "skipping host notification");
                continue;
            }

            let response: JsonRpcResponse = serde_json::from_value(json_value)?;
            if response.id != id {
                tracing::debug!(expected = id, got = response.id, "skipping foreign response");
                continue;
            }

            if let Some(error) = response.error {
                return Err(HostError::rejected(method, error.code, error.message));
            }

            return Ok(response.result.unwrap_or(serde_json::Value::Null));
        }
    }
}

/// JSON-RPC client for the host process.
///
/// One request is in flight per connection; concurrent callers wait on the
/// connection lock, so the host sees calls in the order they were issued.
/// A connection that fails with an I/O error is dropped, and the next call
/// dials `path` again. Failed calls are not retried.
pub struct HostClient {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
    request_id: AtomicU64,
}

impl HostClient {
    pub async fn connect(path: &Path) -> Result<Self, HostError> {
        let conn = Connection::open(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(Some(conn)),
            request_id: AtomicU64::new(1),
        })
    }

    /// Send a request and wait for its response
    async fn send_request(
        &self,
        method: HostMethod,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, HostError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(id, method.as_str(), params);
        let mut request_json = serde_json::to_string(&request)?;
        request_json.push('\n');

        let mut slot = self.conn.lock().await;
        let mut conn = match slot.take() {
            Some(conn) => conn,
            None => {
                tracing::info!(path = %self.path.display(), "reconnecting to host");
                Connection::open(&self.path).await?
            }
        };

        let result = conn.exchange(id, method, &request_json).await;
        match &result {
            Err(HostError::Io(e)) => {
                tracing::warn!(method = method.as_str(), error = %e, "host connection lost");
            }
            _ => *slot = Some(conn),
        }
        result
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: HostMethod,
        params: Option<serde_json::Value>,
    ) -> Result<T, HostError> {
        let result = self.send_request(method, params).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Call where only success matters; any result payload is ignored
    async fn call_unit(
        &self,
        method: HostMethod,
        params: Option<serde_json::Value>,
    ) -> Result<(), HostError> {
        self.send_request(method, params).await.map(|_| ())
    }
}

#[async_trait]
impl HostApi for HostClient {
    async fn ping(&self) -> Result<(), HostError> {
        self.call_unit(HostMethod::Ping, None).await
    }

    async fn get_translations(&self) -> Result<TranslationTable, HostError> {
        self.call(HostMethod::GetTranslations, None).await
    }

    async fn get_available_languages(&self) -> Result<Vec<LanguageCode>, HostError> {
        self.call(HostMethod::GetAvailableLanguages, None).await
    }

    async fn get_language(&self) -> Result<LanguageCode, HostError> {
        self.call(HostMethod::GetLanguage, None).await
    }

    async fn set_language(&self, code: &str) -> Result<(), HostError> {
        let params = serde_json::to_value(SetLanguageParams { code })?;
        self.call_unit(HostMethod::SetLanguage, Some(params)).await
    }

    async fn get_timers(&self) -> Result<Vec<Timer>, HostError> {
        self.call(HostMethod::GetTimers, None).await
    }

    async fn add_timer(&self, key: &str, interval: &str) -> Result<(), HostError> {
        let params = serde_json::to_value(AddTimerParams { key, interval })?;
        self.call_unit(HostMethod::AddTimer, Some(params)).await
    }

    async fn remove_timer(&self, key: &str) -> Result<(), HostError> {
        let params = serde_json::to_value(TimerKeyParams { key })?;
        self.call_unit(HostMethod::RemoveTimer, Some(params)).await
    }

    async fn toggle_timer(&self, key: &str) -> Result<(), HostError> {
        let params = serde_json::to_value(TimerKeyParams { key })?;
        self.call_unit(HostMethod::ToggleTimer, Some(params)).await
    }

    async fn start_timers(&self) -> Result<(), HostError> {
        self.call_unit(HostMethod::StartTimers, None).await
    }

    async fn stop_timers(&self) -> Result<(), HostError> {
        self.call_unit(HostMethod::StopTimers, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::UnixListener;

    /// Accept one connection and answer each request line with the next
    /// canned reply batch. Returns the request lines that were received.
    fn spawn_host(
        listener: UnixListener,
        replies: Vec<Vec<String>>,
    ) -> tokio::task::JoinHandle<Vec<serde_json::Value>> {
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut reader = BufReader::new(read_half);
            let mut seen = Vec::new();
            for batch in replies {
                let mut line = String::new();
                reader.read_line(&mut line).await.unwrap();
                seen.push(serde_json::from_str(&line).unwrap());
                for reply in batch {
                    write_half.write_all(reply.as_bytes()).await.unwrap();
                    write_half.write_all(b"\n").await.unwrap();
                }
            }
            seen
        })
    }

    #[tokio::test]
    async fn test_get_timers_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let host = spawn_host(
            listener,
            vec![vec![
                concat!(
                    r#"{"jsonrpc":"2.0","id":1,"#,
                    r#""result":[{"key":"backup","interval":3600,"is_active":true}]}"#
                )
                .to_string(),
            ]],
        );

        let client = HostClient::connect(&path).await.unwrap();
        let timers = client.get_timers().await.unwrap();
        assert_eq!(timers, vec![Timer::new("backup", 3600u64, true)]);

        let seen = host.await.unwrap();
        assert_eq!(seen[0]["method"], "get_timers");
        assert_eq!(seen[0]["jsonrpc"], "2.0");
    }

    #[tokio::test]
    async fn test_notifications_and_foreign_ids_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let host = spawn_host(
            listener,
            vec![vec![
                r#"{"jsonrpc":"2.0","method":"timer_fired","params":{"key":"a"}}"#.to_string(),
                r#"{"jsonrpc":"2.0","id":99,"result":null}"#.to_string(),
                String::new(),
                r#"{"jsonrpc":"2.0","id":1,"result":["en","fr"]}"#.to_string(),
            ]],
        );

        let client = HostClient::connect(&path).await.unwrap();
        let languages = client.get_available_languages().await.unwrap();
        assert_eq!(languages, vec!["en".to_string(), "fr".to_string()]);
        host.await.unwrap();
    }

    #[tokio::test]
    async fn test_error_response_becomes_rejection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let host = spawn_host(
            listener,
            vec![vec![
                r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32001,"message":"no such timer"}}"#
                    .to_string(),
            ]],
        );

        let client = HostClient::connect(&path).await.unwrap();
        let err = client.remove_timer("ghost").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("remove_timer"));

        let seen = host.await.unwrap();
        assert_eq!(seen[0]["params"]["key"], "ghost");
    }

    #[tokio::test]
    async fn test_request_ids_increase() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let host = spawn_host(
            listener,
            vec![
                vec![r#"{"jsonrpc":"2.0","id":1,"result":true}"#.to_string()],
                vec![r#"{"jsonrpc":"2.0","id":2,"result":true}"#.to_string()],
            ],
        );

        let client = HostClient::connect(&path).await.unwrap();
        client.add_timer("a", "100").await.unwrap();
        client.toggle_timer("a").await.unwrap();

        let seen = host.await.unwrap();
        assert_eq!(seen[0]["id"], 1);
        assert_eq!(seen[0]["params"]["interval"], "100");
        assert_eq!(seen[1]["id"], 2);
        assert_eq!(seen[1]["method"], "toggle_timer");
    }

    #[tokio::test]
    async fn test_closed_connection_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let host = spawn_host(listener, vec![]);

        let client = HostClient::connect(&path).await.unwrap();
        host.await.unwrap();
        let err = client.start_timers().await.unwrap_err();
        assert!(matches!(err, HostError::Io(_)));
    }

    #[tokio::test]
    async fn test_reconnects_after_host_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let first = spawn_host(
            listener,
            vec![vec![r#"{"jsonrpc":"2.0","id":1,"result":true}"#.to_string()]],
        );

        let client = HostClient::connect(&path).await.unwrap();
        client.ping().await.unwrap();
        first.await.unwrap();

        // Host comes back on the same path
        std::fs::remove_file(&path).unwrap();
        let listener = UnixListener::bind(&path).unwrap();
        let second = spawn_host(
            listener,
            vec![vec![r#"{"jsonrpc":"2.0","id":3,"result":[]}"#.to_string()]],
        );

        let err = client.get_timers().await.unwrap_err();
        assert!(matches!(err, HostError::Io(_)));

        let timers = client.get_timers().await.unwrap();
        assert!(timers.is_empty());
        let seen = second.await.unwrap();
        assert_eq!(seen[0]["method"], "get_timers");
    }

    #[tokio::test]
    async fn test_rejection_keeps_the_connection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let host = spawn_host(
            listener,
            vec![
                vec![r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32002,"message":"dup"}}"#
                    .to_string()],
                vec![r#"{"jsonrpc":"2.0","id":2,"result":true}"#.to_string()],
            ],
        );

        let client = HostClient::connect(&path).await.unwrap();
        assert!(client.add_timer("a", "100").await.is_err());
        client.add_timer("b", "100").await.unwrap();
        assert_eq!(host.await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_connect_to_missing_socket_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = HostClient::connect(&dir.path().join("absent.sock")).await;
        assert!(matches!(result, Err(HostError::Io(_))));
    }
}
