//! A single STOMP session: connect, one acknowledged send, disconnect.

use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

use crate::{BrokerUrl, Command, Frame, StompError};

/// Upper bound on the DISCONNECT and socket shutdown in [`StompConnection::close`].
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Byte stream a session runs over (plain TCP or TLS).
trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

/// An open, handshaken STOMP connection.
pub struct StompConnection {
    stream: Box<dyn Transport>,
    buffer: BytesMut,
    session: Option<String>,
}

impl std::fmt::Debug for StompConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StompConnection")
            .field("session", &self.session)
            .field("buffered", &self.buffer.len())
            .finish()
    }
}

impl StompConnection {
    /// Connects and completes the CONNECT/CONNECTED handshake within
    /// `connect_timeout`.
    pub async fn open(broker: &BrokerUrl, connect_timeout: Duration) -> Result<Self, StompError> {
        let handshake = async {
            let tcp = TcpStream::connect((broker.host.as_str(), broker.port)).await?;
            tcp.set_nodelay(true)?;

            let stream: Box<dyn Transport> = if broker.tls {
                Box::new(tls_connect(&broker.host, tcp).await?)
            } else {
                Box::new(tcp)
            };

            let mut connection = Self {
                stream,
                buffer: BytesMut::with_capacity(4096),
                session: None,
            };

            let mut connect = Frame::new(Command::Connect)
                .header("accept-version", "1.2")
                .header("host", broker.host.clone())
                .header("heart-beat", "0,0");
            if let Some(login) = &broker.login {
                connect = connect.header("login", login.clone());
            }
            if let Some(passcode) = &broker.passcode {
                connect = connect.header("passcode", passcode.clone());
            }
            connection.write_frame(&connect).await?;

            let reply = connection.read_frame().await?;
            match reply.command {
                Command::Connected => {
                    connection.session = reply.get("session").map(str::to_string);
                    debug!(
                        broker = %broker,
                        session = ?connection.session,
                        version = ?reply.get("version"),
                        "Connected to broker"
                    );
                    Ok(connection)
                }
                Command::Error => Err(broker_error(&reply)),
                other => Err(StompError::Protocol(format!(
                    "expected CONNECTED, got {other}"
                ))),
            }
        };

        timeout(connect_timeout, handshake)
            .await
            .map_err(|_| StompError::Timeout {
                after: connect_timeout,
                waiting_for: "CONNECTED",
            })?
    }

    /// Broker-assigned session id, if the broker sent one.
    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    /// Sends one message and waits for the RECEIPT matching `receipt`, all
    /// within `receipt_timeout`.
    ///
    /// `headers` must already contain the receipt header; `destination` and
    /// `content-length` are owned by this call and skipped if present.
    pub async fn send(
        &mut self,
        destination: &str,
        body: &[u8],
        headers: &[(String, String)],
        receipt: &str,
        receipt_timeout: Duration,
    ) -> Result<(), StompError> {
        let mut frame = Frame::new(Command::Send).header("destination", destination);
        for (name, value) in headers {
            if name == "destination" || name == "content-length" {
                continue;
            }
            frame = frame.header(name.clone(), value.clone());
        }
        let frame = frame.body(bytes::Bytes::copy_from_slice(body));

        // The deadline covers writing the frame as well as the receipt.
        let exchange = async {
            self.write_frame(&frame).await?;
            debug!(destination, receipt, bytes = body.len(), "Sent message, awaiting receipt");
            self.await_receipt(receipt).await
        };

        timeout(receipt_timeout, exchange)
            .await
            .map_err(|_| StompError::Timeout {
                after: receipt_timeout,
                waiting_for: "RECEIPT",
            })?
    }

    async fn await_receipt(&mut self, receipt: &str) -> Result<(), StompError> {
        loop {
            let frame = self.read_frame().await?;
            match frame.command {
                Command::Receipt if frame.get("receipt-id") == Some(receipt) => {
                    debug!(receipt, "Broker acknowledged receipt");
                    return Ok(());
                }
                Command::Receipt => {
                    warn!(
                        expected = receipt,
                        received = ?frame.get("receipt-id"),
                        "Ignoring receipt for another request"
                    );
                }
                Command::Error => return Err(broker_error(&frame)),
                other => {
                    debug!(command = %other, "Ignoring unsolicited frame");
                }
            }
        }
    }

    /// Sends DISCONNECT and shuts the socket down. Errors are logged, not
    /// returned: the exchange this connection existed for is already over.
    /// Bounded by [`CLOSE_TIMEOUT`].
    pub async fn close(mut self) {
        let goodbye = async {
            let disconnect = Frame::new(Command::Disconnect);
            if let Err(e) = self.write_frame(&disconnect).await {
                debug!(error = %e, "Failed to send DISCONNECT");
            }
            if let Err(e) = self.stream.shutdown().await {
                debug!(error = %e, "Failed to shut down broker connection");
            }
        };
        if timeout(CLOSE_TIMEOUT, goodbye).await.is_err() {
            debug!(after = ?CLOSE_TIMEOUT, "Gave up closing broker connection");
        }
    }

    async fn write_frame(&mut self, frame: &Frame) -> Result<(), StompError> {
        self.stream.write_all(&frame.encode()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Frame, StompError> {
        loop {
            if let Some(frame) = Frame::decode(&mut self.buffer)? {
                return Ok(frame);
            }
            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                return Err(StompError::ConnectionClosed);
            }
        }
    }
}

fn broker_error(frame: &Frame) -> StompError {
    StompError::Broker {
        message: frame.get("message").unwrap_or("unspecified").to_string(),
        details: String::from_utf8_lossy(&frame.body).into_owned(),
    }
}

async fn tls_connect(
    host: &str,
    tcp: TcpStream,
) -> Result<tokio_rustls::client::TlsStream<TcpStream>, StompError> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| StompError::Tls(e.to_string()))?
    .with_root_certificates(roots)
    .with_no_client_auth();

    let server_name =
        ServerName::try_from(host.to_string()).map_err(|e| StompError::Tls(e.to_string()))?;

    let stream = TlsConnector::from(Arc::new(config))
        .connect(server_name, tcp)
        .await?;
    Ok(stream)
}
