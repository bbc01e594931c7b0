//! # isle-testing
//!
//! Test doubles shared by the isle crates.
//!
//! [`FakeBroker`] is a scripted STOMP broker bound to a loopback port. It
//! records every frame clients send and answers according to a
//! [`BrokerBehavior`], so publish paths can be exercised end to end without
//! a real message broker.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::BytesMut;
use isle_messaging::{Command, Frame};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tracing::debug;

/// How the broker answers clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerBehavior {
    /// Acknowledge every receipt.
    Acknowledge,
    /// Answer CONNECT with an ERROR frame carrying this message.
    RejectConnect(String),
    /// Accept the session, answer SEND with an ERROR frame.
    RejectSend(String),
    /// Accept SEND and never acknowledge it.
    Silent,
    /// Acknowledge a receipt id nobody asked for, then go quiet.
    MismatchedReceipt,
    /// Drop the socket as soon as a SEND arrives.
    HangUp,
    /// Answer CONNECTED, then hold the socket open without reading again.
    Stall,
}

#[derive(Debug, Default)]
struct Recorded {
    frames: Mutex<Vec<Frame>>,
    connections: AtomicU64,
}

impl Recorded {
    fn push(&self, frame: Frame) {
        self.frames
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(frame);
    }

    fn snapshot(&self) -> Vec<Frame> {
        self.frames
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// A scripted STOMP broker on `127.0.0.1`.
pub struct FakeBroker {
    pub addr: SocketAddr,
    recorded: Arc<Recorded>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl FakeBroker {
    pub async fn spawn(behavior: BrokerBehavior) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let recorded = Arc::new(Recorded::default());
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let accept_recorded = Arc::clone(&recorded);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    accept_result = listener.accept() => {
                        match accept_result {
                            Ok((stream, _)) => {
                                accept_recorded.connections.fetch_add(1, Ordering::Relaxed);
                                let recorded = Arc::clone(&accept_recorded);
                                let behavior = behavior.clone();
                                tokio::spawn(async move {
                                    if let Err(e) = serve(stream, behavior, recorded).await {
                                        debug!(error = %e, "Fake broker session ended with error");
                                    }
                                });
                            }
                            Err(_) => break,
                        }
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
        });

        Ok(Self {
            addr,
            recorded,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Broker URL for publishers.
    pub fn url(&self) -> String {
        format!("tcp://{}", self.addr)
    }

    /// Every frame received so far, across all connections.
    pub fn frames(&self) -> Vec<Frame> {
        self.recorded.snapshot()
    }

    /// SEND frames received so far.
    pub fn sent(&self) -> Vec<Frame> {
        self.frames_of(Command::Send)
    }

    pub fn frames_of(&self, command: Command) -> Vec<Frame> {
        self.frames()
            .into_iter()
            .filter(|frame| frame.command == command)
            .collect()
    }

    pub fn connection_count(&self) -> u64 {
        self.recorded.connections.load(Ordering::Relaxed)
    }

    /// Waits until `count` frames of `command` have arrived, or two seconds
    /// pass. Returns whether the count was reached.
    pub async fn wait_for(&self, command: Command, count: usize) -> bool {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while tokio::time::Instant::now() < deadline {
            if self.frames_of(command).len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.frames_of(command).len() >= count
    }
}

impl Drop for FakeBroker {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn serve(
    mut stream: TcpStream,
    behavior: BrokerBehavior,
    recorded: Arc<Recorded>,
) -> io::Result<()> {
    let mut buffer = BytesMut::with_capacity(4096);
    let mut session = 0u64;

    loop {
        let frame = loop {
            match Frame::decode(&mut buffer) {
                Ok(Some(frame)) => break frame,
                Ok(None) => {}
                Err(e) => return Err(io::Error::new(io::ErrorKind::InvalidData, e.to_string())),
            }
            if stream.read_buf(&mut buffer).await? == 0 {
                return Ok(());
            }
        };

        let command = frame.command;
        let receipt = frame.get("receipt").map(str::to_string);
        recorded.push(frame);

        match (command, &behavior) {
            (Command::Connect | Command::Stomp, BrokerBehavior::RejectConnect(message)) => {
                let error = Frame::new(Command::Error)
                    .header("message", message.clone())
                    .body(message.clone().into_bytes());
                stream.write_all(&error.encode()).await?;
                return Ok(());
            }
            (Command::Connect | Command::Stomp, _) => {
                session += 1;
                let connected = Frame::new(Command::Connected)
                    .header("version", "1.2")
                    .header("session", format!("fake-{session}"))
                    .header("heart-beat", "0,0");
                stream.write_all(&connected.encode()).await?;
                if behavior == BrokerBehavior::Stall {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    return Ok(());
                }
            }
            (Command::Send, BrokerBehavior::Acknowledge) => {
                if let Some(receipt) = receipt {
                    let ack = Frame::new(Command::Receipt).header("receipt-id", receipt);
                    stream.write_all(&ack.encode()).await?;
                }
            }
            (Command::Send, BrokerBehavior::RejectSend(message)) => {
                let mut error = Frame::new(Command::Error).header("message", message.clone());
                if let Some(receipt) = receipt {
                    error = error.header("receipt-id", receipt);
                }
                stream.write_all(&error.encode()).await?;
                return Ok(());
            }
            (Command::Send, BrokerBehavior::MismatchedReceipt) => {
                let ack = Frame::new(Command::Receipt).header("receipt-id", "somebody-else");
                stream.write_all(&ack.encode()).await?;
            }
            (Command::Send, BrokerBehavior::HangUp) => return Ok(()),
            (Command::Disconnect, _) => {
                if let Some(receipt) = receipt {
                    let ack = Frame::new(Command::Receipt).header("receipt-id", receipt);
                    stream.write_all(&ack.encode()).await?;
                }
                return Ok(());
            }
            _ => {}
        }
    }
}
