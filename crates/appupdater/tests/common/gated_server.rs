//! Single-connection HTTP server that withholds part of the body
//!
//! Sends the response head and the first part of the body at once, then
//! waits for the gate before sending the rest. Tests use it to pin a
//! download at a known byte offset.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Handle to a running gated server
pub struct GatedServer {
    /// URL that serves the gated body
    pub url: String,

    gate: Option<oneshot::Sender<()>>,
}

impl GatedServer {
    /// Let the server send the withheld part of the body
    pub fn release(&mut self) {
        if let Some(gate) = self.gate.take() {
            let _ = gate.send(());
        }
    }
}

/// Start a server that sends `first`, waits for the gate, then sends `rest`
///
/// A `Content-Length` header covering both parts is sent when
/// `announce_length` is set; otherwise the body is delimited by closing the
/// connection.
pub async fn start_gated_server(
    first: Vec<u8>,
    rest: Vec<u8>,
    announce_length: bool,
) -> GatedServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (gate, released) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };

        // Read until the end of the request head
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }

        let mut head = String::from("HTTP/1.1 200 OK\r\nContent-Type: application/zip\r\n");
        if announce_length {
            head.push_str(&format!("Content-Length: {}\r\n", first.len() + rest.len()));
        }
        head.push_str("Connection: close\r\n\r\n");

        if socket.write_all(head.as_bytes()).await.is_err()
            || socket.write_all(&first).await.is_err()
            || socket.flush().await.is_err()
        {
            return;
        }

        // A dropped sender releases the gate as well
        let _ = released.await;

        let _ = socket.write_all(&rest).await;
        let _ = socket.shutdown().await;
    });

    GatedServer {
        url: format!("http://{}/game.zip", addr),
        gate: Some(gate),
    }
}
