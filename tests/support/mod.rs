//! Shared test support: scripted mock RESP servers.
//!
//! Each mock server listens on an ephemeral port, accepts connections
//! sequentially, parses incoming multibulk commands with its own
//! standalone reader (independent of the crate under test), logs every
//! command it receives, and answers from a canned reply script.
//!
//! Script entries are raw reply bytes; an empty entry is a marker that
//! makes the server drop the connection instead of answering, which is
//! how tests simulate a server going away mid-conversation.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// One received command: its arguments including the command name.
pub type ReceivedCommand = Vec<Vec<u8>>;

pub struct MockServer {
    pub addr: SocketAddr,
    log: Arc<Mutex<Vec<ReceivedCommand>>>,
}

impl MockServer {
    /// Spawns a mock server that answers commands from `script` in order.
    ///
    /// The server keeps accepting connections (one at a time), so a test
    /// can drive disconnect/reconnect cycles against a single script.
    pub async fn spawn(script: Vec<Vec<u8>>) -> MockServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let log = Arc::new(Mutex::new(Vec::new()));
        let task_log = Arc::clone(&log);

        tokio::spawn(async move {
            let mut replies = script.into_iter();
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let mut reader = BufReader::new(stream);
                loop {
                    match read_command(&mut reader).await {
                        Ok(Some(args)) => {
                            task_log.lock().expect("log lock").push(args);
                            match replies.next() {
                                Some(reply) if reply.is_empty() => break, // scripted drop
                                Some(reply) => {
                                    if reader.get_mut().write_all(&reply).await.is_err() {
                                        break;
                                    }
                                }
                                None => break, // script exhausted
                            }
                        }
                        Ok(None) => break, // client closed
                        Err(_) => break,
                    }
                }
            }
        });

        MockServer { addr, log }
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Snapshot of every command received so far.
    pub fn received(&self) -> Vec<ReceivedCommand> {
        self.log.lock().expect("log lock").clone()
    }

    /// Number of commands received so far.
    pub fn command_count(&self) -> usize {
        self.log.lock().expect("log lock").len()
    }
}

/// Reads one multibulk command; `Ok(None)` on a clean EOF.
async fn read_command(
    reader: &mut BufReader<TcpStream>,
) -> std::io::Result<Option<ReceivedCommand>> {
    let Some(line) = read_line(reader).await? else {
        return Ok(None);
    };
    if line.first() != Some(&b'*') {
        return Err(invalid("expected array header"));
    }
    let count = parse_usize(&line[1..])?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let line = read_line(reader)
            .await?
            .ok_or_else(|| invalid("eof inside command"))?;
        if line.first() != Some(&b'$') {
            return Err(invalid("expected bulk header"));
        }
        let len = parse_usize(&line[1..])?;
        let mut data = vec![0u8; len];
        reader.read_exact(&mut data).await?;
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf).await?;
        if crlf != [b'\r', b'\n'] {
            return Err(invalid("missing argument crlf"));
        }
        args.push(data);
    }
    Ok(Some(args))
}

async fn read_line(reader: &mut BufReader<TcpStream>) -> std::io::Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    let n = reader.read_until(b'\n', &mut line).await?;
    if n == 0 {
        return Ok(None);
    }
    if line.len() < 2 || line[line.len() - 2] != b'\r' {
        return Err(invalid("malformed line"));
    }
    line.truncate(line.len() - 2);
    Ok(Some(line))
}

fn parse_usize(data: &[u8]) -> std::io::Result<usize> {
    std::str::from_utf8(data)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid("bad length"))
}

fn invalid(message: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, message.to_string())
}

// ── canned reply builders ──────────────────────────────────────────────

pub fn status(s: &str) -> Vec<u8> {
    format!("+{}\r\n", s).into_bytes()
}

pub fn error(s: &str) -> Vec<u8> {
    format!("-{}\r\n", s).into_bytes()
}

pub fn integer(n: i64) -> Vec<u8> {
    format!(":{}\r\n", n).into_bytes()
}

pub fn bulk(data: &[u8]) -> Vec<u8> {
    let mut out = format!("${}\r\n", data.len()).into_bytes();
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
    out
}

pub fn null_bulk() -> Vec<u8> {
    b"$-1\r\n".to_vec()
}

/// Array of pre-encoded elements.
pub fn array(elements: &[Vec<u8>]) -> Vec<u8> {
    let mut out = format!("*{}\r\n", elements.len()).into_bytes();
    for element in elements {
        out.extend_from_slice(element);
    }
    out
}

/// Marker entry: drop the connection instead of replying.
pub fn drop_connection() -> Vec<u8> {
    Vec::new()
}

/// Installs a quiet tracing subscriber so failing tests show client logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Asserts that a received command matches the expected argument list.
pub fn assert_command(received: &ReceivedCommand, expected: &[&[u8]]) {
    let got: Vec<&[u8]> = received.iter().map(|arg| arg.as_slice()).collect();
    assert_eq!(got, expected);
}
