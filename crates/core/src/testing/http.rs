//! Minimal HTTP/1.1 server for exercising the reqwest-backed clients.
//!
//! Replies are served in order; once they run out the last one repeats.
//! Every request line and its headers are recorded.

use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// A canned response.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn html(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn bytes(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: "application/octet-stream",
            body,
        }
    }
}

/// Request line target plus headers, as received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Origin-form path, or absolute-form URL when the client used us as a proxy.
    pub target: String,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

struct FixtureState {
    replies: Vec<Reply>,
    served: usize,
    recorded: Vec<RecordedRequest>,
}

pub struct HttpFixture {
    port: u16,
    state: Arc<Mutex<FixtureState>>,
    task: JoinHandle<()>,
}

impl HttpFixture {
    pub async fn start(replies: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fixture listener");
        let port = listener.local_addr().expect("fixture address").port();
        let state = Arc::new(Mutex::new(FixtureState {
            replies,
            served: 0,
            recorded: Vec::new(),
        }));

        let task_state = state.clone();
        let task = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let state = task_state.clone();
                tokio::spawn(async move {
                    let _ = serve(socket, state).await;
                });
            }
        });

        Self { port, state, task }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL without a trailing slash.
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub async fn recorded(&self) -> Vec<RecordedRequest> {
        self.state.lock().await.recorded.clone()
    }

    /// Targets of every request received so far.
    pub async fn requests(&self) -> Vec<String> {
        self.recorded().await.into_iter().map(|r| r.target).collect()
    }
}

impl Drop for HttpFixture {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(mut socket: TcpStream, state: Arc<Mutex<FixtureState>>) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let reply = {
        let mut state = state.lock().await;
        state.recorded.push(RecordedRequest {
            method,
            target,
            headers,
        });
        let index = state.served.min(state.replies.len().saturating_sub(1));
        state.served += 1;
        state.replies.get(index).cloned()
    };
    let reply = reply.unwrap_or_else(|| Reply::html(404, "no reply configured"));

    let head = format!(
        "HTTP/1.1 {} Fixture\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        reply.status,
        reply.content_type,
        reply.body.len()
    );
    socket.write_all(head.as_bytes()).await?;
    socket.write_all(&reply.body).await?;
    socket.shutdown().await
}
