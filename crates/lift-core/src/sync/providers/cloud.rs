//! Cloud folder transport
//!
//! Keeps a single well-known snapshot object in a private, app-scoped folder
//! on a WebDAV-style HTTP store, authenticated with a bearer token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::sync::provider::SyncProvider;
use crate::sync::snapshot::{encode_snapshot, parse_snapshot, Snapshot};
use crate::util::{compact_text, is_http_url, normalize_text_option};

/// Name of the snapshot object inside the app folder
pub const SNAPSHOT_OBJECT_NAME: &str = "strength-journal-snapshot.json";

pub struct CloudFolderProvider {
    client: reqwest::Client,
    folder_url: String,
    access_token: Option<String>,
    connected: AtomicBool,
}

impl std::fmt::Debug for CloudFolderProvider {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CloudFolderProvider")
            .field("folder_url", &self.folder_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("connected", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl CloudFolderProvider {
    pub fn new(
        base_url: impl Into<String>,
        app_scope: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = normalize_endpoint(base_url.into())?;
        let app_scope = app_scope.trim().trim_matches('/');
        if app_scope.is_empty() {
            return Err(Error::Config("app scope must not be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ProviderIo(e.to_string()))?;

        Ok(Self {
            client,
            folder_url: format!("{base_url}/{app_scope}/"),
            access_token: normalize_text_option(access_token),
            connected: AtomicBool::new(false),
        })
    }

    pub fn object_url(&self) -> String {
        format!("{}{SNAPSHOT_OBJECT_NAME}", self.folder_url)
    }

    fn token(&self) -> Result<&str> {
        self.access_token
            .as_deref()
            .ok_or_else(|| Error::ProviderAuth("no access token configured".to_string()))
    }

    async fn send(&self, method: Method, url: &str, body: Option<Vec<u8>>) -> Result<reqwest::Response> {
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(self.token()?)
            .header("Accept", "application/json");
        if let Some(body) = body {
            request = request.header("Content-Type", "application/json").body(body);
        }

        request
            .send()
            .await
            .map_err(|e| Error::ProviderIo(e.to_string()))
    }

    /// Map a non-success response to an error, dropping the session on auth failures
    async fn reject(&self, response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = parse_api_error(status, &body);

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            self.connected.store(false, Ordering::SeqCst);
            Error::ProviderAuth(message)
        } else {
            Error::ProviderIo(message)
        }
    }
}

impl SyncProvider for CloudFolderProvider {
    fn name(&self) -> &str {
        "cloud"
    }

    async fn connect(&self) -> Result<()> {
        if self.is_authenticated() {
            return Ok(());
        }

        let response = self.send(Method::HEAD, &self.folder_url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            let mkcol = Method::from_bytes(b"MKCOL").map_err(|e| Error::ProviderIo(e.to_string()))?;
            let created = self.send(mkcol, &self.folder_url, None).await?;
            if !created.status().is_success() {
                return Err(self.reject(created).await);
            }
            tracing::info!("Created app folder {}", self.folder_url);
        } else if !response.status().is_success() {
            return Err(self.reject(response).await);
        }

        self.connected.store(true, Ordering::SeqCst);
        tracing::debug!("Connected to {}", self.folder_url);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_authenticated(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn pull(&self) -> Result<Option<Snapshot>> {
        let response = self.send(Method::GET, &self.object_url(), None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::info!("No remote snapshot yet");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(self.reject(response).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::ProviderIo(e.to_string()))?;
        parse_snapshot(&bytes).map(Some)
    }

    async fn push(&self, snapshot: &Snapshot) -> Result<()> {
        let body = encode_snapshot(snapshot)?;
        let response = self
            .send(Method::PUT, &self.object_url(), Some(body))
            .await?;
        if !response.status().is_success() {
            return Err(self.reject(response).await);
        }

        tracing::info!(
            "Uploaded {} records to {}",
            snapshot.record_count(),
            self.object_url()
        );
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_endpoint(raw: String) -> Result<String> {
    let endpoint = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::Config("cloud base URL must not be empty".to_string()))?;
    if is_http_url(&endpoint) {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err(Error::Config(
            "cloud base URL must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;
    use crate::models::{Exercise, MuscleGroup};
    use crate::sync::snapshot::{SnapshotData, SCHEMA_VERSION};

    fn provider(token: Option<&str>) -> CloudFolderProvider {
        CloudFolderProvider::new(
            "https://dav.example.com/files/me/",
            "/lift/",
            token.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn normalize_endpoint_rejects_invalid_values() {
        assert!(normalize_endpoint(String::new()).is_err());
        assert!(normalize_endpoint("dav.example.com".to_string()).is_err());
        assert_eq!(
            normalize_endpoint(" https://dav.example.com/ ".to_string()).unwrap(),
            "https://dav.example.com"
        );
    }

    #[test]
    fn object_url_is_scoped_to_app_folder() {
        assert_eq!(
            provider(Some("t")).object_url(),
            "https://dav.example.com/files/me/lift/strength-journal-snapshot.json"
        );
    }

    #[test]
    fn empty_app_scope_is_rejected() {
        assert!(matches!(
            CloudFolderProvider::new("https://dav.example.com", " / ", None, Duration::from_secs(1)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn debug_redacts_token() {
        let debug = format!("{:?}", provider(Some("secret")));
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn parse_api_error_prefers_message() {
        assert_eq!(
            parse_api_error(StatusCode::FORBIDDEN, r#"{"message":" token expired "}"#),
            "token expired (403)"
        );
        assert_eq!(
            parse_api_error(StatusCode::BAD_GATEWAY, "  "),
            "HTTP 502"
        );
        assert_eq!(
            parse_api_error(StatusCode::CONFLICT, "locked"),
            "locked (409)"
        );
    }

    #[tokio::test]
    async fn connect_without_token_fails_auth() {
        let provider = provider(Some("  "));
        assert!(!provider.is_authenticated());
        assert!(matches!(
            provider.connect().await,
            Err(Error::ProviderAuth(_))
        ));
        assert!(!provider.is_authenticated());
    }

    type Requests = Arc<Mutex<Vec<String>>>;

    struct Request {
        method: String,
        path: String,
        head: String,
        body: Vec<u8>,
    }

    async fn read_request(socket: &mut TcpStream) -> Option<Request> {
        let mut buffer = Vec::new();
        let mut chunk = [0_u8; 4096];
        let header_end = loop {
            let read = socket.read(&mut chunk).await.ok()?;
            if read == 0 {
                return None;
            }
            buffer.extend_from_slice(&chunk[..read]);
            if let Some(pos) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buffer[..header_end]).to_ascii_lowercase();
        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = buffer[header_end..].to_vec();
        while body.len() < content_length {
            let read = socket.read(&mut chunk).await.ok()?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
        }

        let request_line = String::from_utf8_lossy(&buffer[..header_end])
            .lines()
            .next()?
            .to_string();
        let mut parts = request_line.split_whitespace();
        Some(Request {
            method: parts.next()?.to_string(),
            path: parts.next()?.to_string(),
            head,
            body,
        })
    }

    /// Loopback HTTP server answering every request through `respond`.
    ///
    /// Returns the base URL and a log of `"<METHOD> <path>"` lines.
    async fn spawn_server<F>(respond: F) -> (String, Requests)
    where
        F: Fn(&Request) -> (&'static str, Vec<u8>) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let requests = Requests::default();
        let log = Arc::clone(&requests);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let Some(request) = read_request(&mut socket).await else {
                    continue;
                };
                log.lock()
                    .unwrap()
                    .push(format!("{} {}", request.method, request.path));

                let (status, body) = respond(&request);
                let head = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{address}"), requests)
    }

    fn local_provider(base_url: &str) -> CloudFolderProvider {
        CloudFolderProvider::new(
            base_url,
            "lift",
            Some("secret".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn logged(requests: &Requests) -> Vec<String> {
        requests.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn connect_creates_missing_folder() {
        let (base_url, requests) = spawn_server(|request| match request.method.as_str() {
            "HEAD" => ("404 Not Found", Vec::new()),
            "MKCOL" => ("201 Created", Vec::new()),
            _ => ("500 Internal Server Error", Vec::new()),
        })
        .await;
        let provider = local_provider(&base_url);

        provider.connect().await.unwrap();

        assert!(provider.is_authenticated());
        assert_eq!(logged(&requests), vec!["HEAD /lift/", "MKCOL /lift/"]);
    }

    #[tokio::test]
    async fn pull_without_remote_snapshot_returns_none() {
        let (base_url, requests) =
            spawn_server(|_| ("404 Not Found", b"not found".to_vec())).await;

        let pulled = local_provider(&base_url).pull().await.unwrap();

        assert_eq!(pulled, None);
        assert_eq!(
            logged(&requests),
            vec![format!("GET /lift/{SNAPSHOT_OBJECT_NAME}")]
        );
    }

    #[tokio::test]
    async fn unauthorized_response_drops_session() {
        let (base_url, _) = spawn_server(|request| match request.method.as_str() {
            "HEAD" => ("200 OK", Vec::new()),
            _ => (
                "401 Unauthorized",
                br#"{"message":"token expired"}"#.to_vec(),
            ),
        })
        .await;
        let provider = local_provider(&base_url);
        provider.connect().await.unwrap();
        assert!(provider.is_authenticated());

        let error = provider.pull().await.unwrap_err();

        assert!(matches!(&error, Error::ProviderAuth(message) if message == "token expired (401)"));
        assert!(!provider.is_authenticated());
    }

    #[tokio::test]
    async fn server_error_maps_to_provider_io() {
        let (base_url, _) =
            spawn_server(|_| ("500 Internal Server Error", b"boom".to_vec())).await;
        let provider = local_provider(&base_url);

        assert!(matches!(
            provider.pull().await,
            Err(Error::ProviderIo(message)) if message == "boom (500)"
        ));
        assert!(matches!(
            provider.push(&sample_snapshot()).await,
            Err(Error::ProviderIo(_))
        ));
    }

    fn sample_snapshot() -> Snapshot {
        let mut data = SnapshotData::default();
        let mut exercise = Exercise::new("Front Squat", MuscleGroup::Legs);
        exercise.updated_at = 1_700_000_000_000;
        data.exercises.push(exercise);
        Snapshot {
            schema_version: SCHEMA_VERSION,
            exported_at: 1_700_000_000_500,
            device_id: "device-a".to_string(),
            data,
        }
    }

    #[tokio::test]
    async fn push_then_pull_returns_same_snapshot() {
        let stored = Arc::new(Mutex::new(None::<Vec<u8>>));
        let object = Arc::clone(&stored);
        let (base_url, requests) = spawn_server(move |request| {
            let mut object = object.lock().unwrap();
            match request.method.as_str() {
                "PUT" if request.head.contains("authorization: bearer secret") => {
                    *object = Some(request.body.clone());
                    ("201 Created", Vec::new())
                }
                "GET" => object
                    .clone()
                    .map_or(("404 Not Found", Vec::new()), |body| ("200 OK", body)),
                _ => ("400 Bad Request", Vec::new()),
            }
        })
        .await;
        let provider = local_provider(&base_url);
        let snapshot = sample_snapshot();

        provider.push(&snapshot).await.unwrap();
        let pulled = provider.pull().await.unwrap();

        assert_eq!(pulled, Some(snapshot));
        assert_eq!(
            logged(&requests),
            vec![
                format!("PUT /lift/{SNAPSHOT_OBJECT_NAME}"),
                format!("GET /lift/{SNAPSHOT_OBJECT_NAME}"),
            ]
        );
    }
}
