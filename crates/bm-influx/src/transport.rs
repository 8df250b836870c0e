//! HTTP transport for line-protocol writes.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use thiserror::Error;

/// Request timeout for a single write.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const LINE_PROTOCOL_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Transport construction errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// A single write to the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub url: String,
    /// `Authorization` header value, if the backend needs one.
    pub authorization: Option<String>,
    /// Line-protocol payload.
    pub body: String,
}

impl fmt::Debug for WriteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteRequest")
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// Outcome of a write, reported once the request completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// True when the backend answered with a 2xx status.
    pub success: bool,
    /// HTTP status, absent when no response was received.
    pub status: Option<u16>,
    /// Response body, or the transport error text.
    pub body: String,
}

/// Sends write requests to the backend.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: WriteRequest) -> impl Future<Output = Delivery> + Send;
}

/// [`Transport`] backed by `reqwest`.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(TransportError::ClientBuild)?;
        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: WriteRequest) -> Delivery {
        let mut builder = self
            .http
            .post(request.url.as_str())
            .header(CONTENT_TYPE, LINE_PROTOCOL_CONTENT_TYPE)
            .body(request.body);
        if let Some(token) = request.authorization {
            builder = builder.header(AUTHORIZATION, token);
        }

        match builder.send().await {
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                Delivery {
                    success: status.is_success(),
                    status: Some(status.as_u16()),
                    body,
                }
            }
            Err(err) => Delivery {
                success: false,
                status: err.status().map(|status| status.as_u16()),
                body: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    /// Transport that records requests and answers with a fixed delivery.
    pub(crate) struct MockTransport {
        requests: Mutex<Vec<WriteRequest>>,
        response: Delivery,
    }

    impl MockTransport {
        pub(crate) fn ok() -> Self {
            Self::answering(Delivery {
                success: true,
                status: Some(204),
                body: String::new(),
            })
        }

        pub(crate) const fn answering(response: Delivery) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                response,
            }
        }

        pub(crate) fn requests(&self) -> Vec<WriteRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for MockTransport {
        async fn send(&self, request: WriteRequest) -> Delivery {
            self.requests.lock().unwrap().push(request);
            self.response.clone()
        }
    }

    #[test]
    fn http_transport_builds() {
        assert!(HttpTransport::new().is_ok());
    }

    #[test]
    fn write_request_debug_hides_credentials() {
        let request = WriteRequest {
            url: "http://influx/write?db=m&u=u&p=hunter2&precision=s".to_string(),
            authorization: Some("Token secret".to_string()),
            body: "cook_event success=True".to_string(),
        };
        let debug = format!("{request:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("secret"));
        assert!(debug.contains("cook_event"));
    }

    #[tokio::test]
    async fn unreachable_backend_reports_failure() {
        let transport = HttpTransport::new().unwrap();
        let delivery = transport
            .send(WriteRequest {
                url: "http://127.0.0.1:1/write".to_string(),
                authorization: None,
                body: "cook_event success=True".to_string(),
            })
            .await;
        assert!(!delivery.success);
        assert_eq!(delivery.status, None);
        assert!(!delivery.body.is_empty());
    }

    /// Accepts one connection, captures the raw request and answers with `response`.
    async fn serve_once(response: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut chunk = [0_u8; 1024];
            loop {
                let read = socket.read(&mut chunk).await.unwrap();
                if read == 0 {
                    break;
                }
                raw.extend_from_slice(&chunk[..read]);
                if request_complete(&raw) {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8(raw).unwrap()
        });

        (base, server)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = header(head, "content-length").map_or(0, |value| value.parse().unwrap());
        body.len() >= length
    }

    fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
        head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }

    #[tokio::test]
    async fn posts_line_protocol_with_token() {
        let (base, server) = serve_once("HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n").await;
        let transport = HttpTransport::new().unwrap();

        let delivery = transport
            .send(WriteRequest {
                url: format!("{base}/api/v2/write?bucket=editor&org=studio&precision=s"),
                authorization: Some("Token secret".to_string()),
                body: "cook_event,project_name=Game success=True 100".to_string(),
            })
            .await;

        assert_eq!(
            delivery,
            Delivery {
                success: true,
                status: Some(204),
                body: String::new(),
            }
        );

        let request = server.await.unwrap();
        let (head, body) = request.split_once("\r\n\r\n").unwrap();
        assert_eq!(
            head.lines().next(),
            Some("POST /api/v2/write?bucket=editor&org=studio&precision=s HTTP/1.1")
        );
        assert_eq!(
            header(head, "content-type"),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(header(head, "authorization"), Some("Token secret"));
        assert_eq!(body, "cook_event,project_name=Game success=True 100");
    }

    #[tokio::test]
    async fn posts_without_authorization_and_reports_rejection() {
        let (base, server) = serve_once(
            "HTTP/1.1 400 Bad Request\r\nContent-Length: 11\r\nConnection: close\r\n\r\nbad request",
        )
        .await;
        let transport = HttpTransport::new().unwrap();

        let delivery = transport
            .send(WriteRequest {
                url: format!("{base}/write?db=metrics&u=editor&p=hunter2&precision=s"),
                authorization: None,
                body: "build_event success=False 470".to_string(),
            })
            .await;

        assert!(!delivery.success);
        assert_eq!(delivery.status, Some(400));
        assert_eq!(delivery.body, "bad request");

        let request = server.await.unwrap();
        let (head, _) = request.split_once("\r\n\r\n").unwrap();
        assert!(head.starts_with("POST /write?db=metrics&u=editor&p=hunter2&precision=s HTTP/1.1"));
        assert_eq!(
            header(head, "content-type"),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(header(head, "authorization"), None);
    }
}
