//! STOMP 1.2 frame encoding and decoding.
//!
//! ```text
//! COMMAND\n
//! header:value\n
//! \n
//! body\0
//! ```
//!
//! Header names and values are escaped (`\\`, `\n`, `\r`, `\c`) in every
//! frame except `CONNECT` and `CONNECTED`. Bare EOLs between frames are
//! heart-beats and are skipped.

use bytes::{BufMut, Bytes, BytesMut};

use crate::StompError;

/// Largest frame we are willing to buffer.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// STOMP commands understood by this client and the test broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Connect,
    Stomp,
    Connected,
    Send,
    Message,
    Receipt,
    Error,
    Disconnect,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Stomp => "STOMP",
            Command::Connected => "CONNECTED",
            Command::Send => "SEND",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
            Command::Disconnect => "DISCONNECT",
        }
    }

    fn parse(s: &str) -> Result<Self, StompError> {
        match s {
            "CONNECT" => Ok(Command::Connect),
            "STOMP" => Ok(Command::Stomp),
            "CONNECTED" => Ok(Command::Connected),
            "SEND" => Ok(Command::Send),
            "MESSAGE" => Ok(Command::Message),
            "RECEIPT" => Ok(Command::Receipt),
            "ERROR" => Ok(Command::Error),
            "DISCONNECT" => Ok(Command::Disconnect),
            other => Err(StompError::Protocol(format!("unknown command: {other:?}"))),
        }
    }

    /// The handshake frames predate header escaping.
    fn escapes_headers(&self) -> bool {
        !matches!(self, Command::Connect | Command::Connected)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single STOMP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    /// Headers in wire order. Repeated names are allowed; the first wins.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the body and its `content-length`.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.headers
            .push(("content-length".to_string(), body.len().to_string()));
        self.body = body;
        self
    }

    /// Returns the first value of a header.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(64 + self.body.len());
        buf.put_slice(self.command.as_str().as_bytes());
        buf.put_u8(b'\n');
        for (name, value) in &self.headers {
            if self.command.escapes_headers() {
                buf.put_slice(escape(name).as_bytes());
                buf.put_u8(b':');
                buf.put_slice(escape(value).as_bytes());
            } else {
                buf.put_slice(name.as_bytes());
                buf.put_u8(b':');
                buf.put_slice(value.as_bytes());
            }
            buf.put_u8(b'\n');
        }
        buf.put_u8(b'\n');
        buf.put_slice(&self.body);
        buf.put_u8(0);
        buf.freeze()
    }

    /// Decodes one frame from the front of `buf`.
    ///
    /// Returns `Ok(None)` when more bytes are needed; consumed bytes are
    /// removed from `buf` only when a whole frame is returned.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Frame>, StompError> {
        skip_heartbeats(buf);
        if buf.is_empty() {
            return Ok(None);
        }

        let mut lines = Vec::new();
        let mut pos = 0;
        loop {
            let Some(newline) = buf[pos..].iter().position(|b| *b == b'\n') else {
                return incomplete(buf);
            };
            let mut line = &buf[pos..pos + newline];
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
            pos += newline + 1;
            if line.is_empty() {
                break;
            }
            let line = std::str::from_utf8(line)
                .map_err(|_| StompError::Protocol("frame header is not UTF-8".to_string()))?;
            lines.push(line.to_string());
        }

        let mut lines = lines.into_iter();
        let command = Command::parse(&lines.next().unwrap_or_default())?;

        let mut headers = Vec::new();
        for line in lines {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| StompError::Protocol(format!("malformed header: {line:?}")))?;
            if command.escapes_headers() {
                headers.push((unescape(name)?, unescape(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let content_length = headers
            .iter()
            .find(|(name, _)| name == "content-length")
            .map(|(_, value)| {
                value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| StompError::Protocol(format!("bad content-length: {value}")))
            })
            .transpose()?;

        let body_end = match content_length {
            Some(length) => {
                if length > MAX_FRAME_BYTES {
                    return Err(StompError::Protocol(format!(
                        "frame body of {length} bytes exceeds limit"
                    )));
                }
                if buf.len() < pos + length + 1 {
                    return incomplete(buf);
                }
                if buf[pos + length] != 0 {
                    return Err(StompError::Protocol(
                        "frame body not terminated by NUL".to_string(),
                    ));
                }
                pos + length
            }
            None => match buf[pos..].iter().position(|b| *b == 0) {
                Some(nul) => pos + nul,
                None => return incomplete(buf),
            },
        };

        let mut frame = buf.split_to(body_end + 1);
        let body = frame.split_off(pos);
        let mut body = body.freeze();
        body.truncate(body_end - pos);

        Ok(Some(Frame {
            command,
            headers,
            body,
        }))
    }
}

fn skip_heartbeats(buf: &mut BytesMut) {
    let leading = buf
        .iter()
        .take_while(|b| **b == b'\n' || **b == b'\r')
        .count();
    let _ = buf.split_to(leading);
}

fn incomplete(buf: &BytesMut) -> Result<Option<Frame>, StompError> {
    if buf.len() > MAX_FRAME_BYTES {
        return Err(StompError::Protocol(format!(
            "frame exceeds {MAX_FRAME_BYTES} bytes"
        )));
    }
    Ok(None)
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(s: &str) -> Result<String, StompError> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            other => {
                return Err(StompError::Protocol(format!(
                    "invalid header escape: \\{}",
                    other.map(String::from).unwrap_or_default()
                )))
            }
        }
    }
    Ok(out)
}
