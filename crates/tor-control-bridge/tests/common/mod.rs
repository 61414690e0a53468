//! Scripted stand-in for Tor's control port.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use tor_control_bridge::BridgeConfig;

/// What the fake does after receiving a line.
pub enum Reaction {
    /// Write each chunk, pausing briefly between chunks.
    Reply(Vec<String>),
    /// Close our write side without replying; keep recording client lines.
    HangUp,
    /// Write the chunks, then hang up.
    ReplyThenHangUp(Vec<String>),
    /// Say nothing and keep the connection open.
    Silent,
}

impl Reaction {
    pub fn reply<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Reply(chunks.into_iter().map(Into::into).collect())
    }
}

/// Behaves like a Tor control port with null authentication.
pub fn tor_like(line: &str) -> Reaction {
    if line.starts_with("AUTHENTICATE") {
        return Reaction::reply(["250 OK\r\n"]);
    }
    match line {
        "GETINFO version" => Reaction::reply(["250-version=0.4.8.10\r\n250 OK\r\n"]),
        "GETINFO status/circuit-established" => {
            Reaction::reply(["250-status/circuit-established=1\r\n250 OK\r\n"])
        }
        "SIGNAL NEWNYM" => Reaction::reply(["250 OK\r\n"]),
        _ => Reaction::reply(["510 Unrecognized command\r\n"]),
    }
}

pub struct FakeControlPort {
    pub port: u16,
    accepted: Arc<AtomicUsize>,
    transcripts: mpsc::UnboundedReceiver<Vec<String>>,
}

impl FakeControlPort {
    pub async fn spawn<F>(handler: F) -> Self
    where
        F: Fn(&str) -> Reaction + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, transcripts) = mpsc::unbounded_channel();
        let handler = Arc::new(handler);
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let handler = Arc::clone(&handler);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let transcript = serve(stream, handler.as_ref()).await;
                    let _ = tx.send(transcript);
                });
            }
        });

        Self {
            port,
            accepted,
            transcripts,
        }
    }

    /// Connections accepted so far.
    pub fn connections(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> BridgeConfig {
        BridgeConfig {
            port: self.port,
            timeout: Duration::from_secs(2),
            ..BridgeConfig::default()
        }
    }

    /// Lines received on the next connection to finish.
    pub async fn next_transcript(&mut self) -> Vec<String> {
        tokio::time::timeout(Duration::from_secs(5), self.transcripts.recv())
            .await
            .expect("no connection finished in time")
            .expect("fake control port stopped")
    }
}

async fn serve<F>(stream: TcpStream, handler: &F) -> Vec<String>
where
    F: Fn(&str) -> Reaction + ?Sized,
{
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    let mut transcript = Vec::new();
    let mut open = true;

    while let Ok(Some(line)) = lines.next_line().await {
        let reaction = handler(&line);
        transcript.push(line);
        if !open {
            continue;
        }
        match reaction {
            Reaction::Reply(chunks) => open = write_chunks(&mut write_half, &chunks).await,
            Reaction::HangUp => {
                let _ = write_half.shutdown().await;
                open = false;
            }
            Reaction::ReplyThenHangUp(chunks) => {
                write_chunks(&mut write_half, &chunks).await;
                let _ = write_half.shutdown().await;
                open = false;
            }
            Reaction::Silent => {}
        }
    }
    transcript
}

/// Returns false if the client went away.
async fn write_chunks(writer: &mut OwnedWriteHalf, chunks: &[String]) -> bool {
    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        if writer.write_all(chunk.as_bytes()).await.is_err() {
            return false;
        }
    }
    true
}
