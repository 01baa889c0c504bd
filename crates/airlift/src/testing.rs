use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A single canned HTTP response served by [`mock_server`].
pub(crate) struct MockResponse {
    /// HTTP status code.
    status: u16,

    /// Extra response headers.
    headers: Vec<(&'static str, String)>,

    /// Response body.
    body: String,
}

impl MockResponse {
    /// A JSON response with the given status code and body.
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("Content-Type", String::from("application/json"))],
            body: body.to_owned(),
        }
    }

    /// Attaches an extra response header.
    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_owned()));
        self
    }
}

/// Starts a mock HTTP server that answers the scripted responses in order,
/// one connection per request.
///
/// Returns the server URL, the raw requests it received (lossy UTF-8), and
/// the task handle to abort when done.
pub(crate) async fn mock_server(
    responses: Vec<MockResponse>,
) -> (String, Arc<Mutex<Vec<String>>>, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let url = format!("http://127.0.0.1:{port}");

    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);

    let handle = tokio::spawn(async move {
        for response in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };

            let request = read_request(&mut stream).await;
            seen.lock()
                .unwrap()
                .push(String::from_utf8_lossy(&request).into_owned());

            let mut head = format!(
                "HTTP/1.1 {} Mock\r\nContent-Length: {}\r\nConnection: close\r\n",
                response.status,
                response.body.len()
            );
            for (name, value) in &response.headers {
                head.push_str(&format!("{name}: {value}\r\n"));
            }

            let _ = stream
                .write_all(format!("{head}\r\n{}", response.body).as_bytes())
                .await;
            let _ = stream.shutdown().await;
        }
    });

    (url, requests, handle)
}

/// Reads a full HTTP request (headers plus Content-Length-delimited body).
async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut data = Vec::new();
    let mut buf = [0u8; 8192];

    loop {
        let read = match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(read) => read,
        };
        data.extend_from_slice(&buf[..read]);

        if let Some(header_end) = find_header_end(&data) {
            let headers = String::from_utf8_lossy(&data[..header_end]);
            let content_length = headers
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())?
                })
                .unwrap_or(0);

            if data.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    data
}

/// Finds the start of the `\r\n\r\n` separator between headers and body.
fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|window| window == b"\r\n\r\n")
}
