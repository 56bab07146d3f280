//! A single authenticated RCON session over TCP.

use std::io::ErrorKind;
use std::time::Duration;

use idlewatch_protocol::{Packet, PacketKind, RconCodec};
use rand::Rng;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time;

use crate::{RconConfig, RconError};

/// An open, authenticated RCON connection.
///
/// Connections are short-lived: [`RconClient`](crate::RconClient) opens
/// one per command and closes it right after the reply.
pub struct RconConnection {
    stream: TcpStream,
    codec: RconCodec,
    next_id: i32,
    timeout: Duration,
}

impl RconConnection {
    /// Connects and logs in. Both steps share `config.timeout`.
    pub async fn connect(config: &RconConfig) -> Result<Self, RconError> {
        let addr = config.addr();
        let stream = time::timeout(config.timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| RconError::Timeout {
                stage: "connect",
                after: config.timeout,
            })?
            .map_err(|source| RconError::Connect {
                addr: addr.clone(),
                source,
            })?;

        let mut conn = Self {
            stream,
            codec: RconCodec,
            // Positive and far from overflow; -1 is reserved for auth failure.
            next_id: rand::rng().random_range(1..i32::MAX / 2),
            timeout: config.timeout,
        };

        time::timeout(config.timeout, conn.authenticate(&config.password))
            .await
            .map_err(|_| RconError::Timeout {
                stage: "authentication",
                after: config.timeout,
            })??;

        tracing::trace!(%addr, "RCON session authenticated");
        Ok(conn)
    }

    /// Runs one command and returns the server's reply text.
    pub async fn exec(&mut self, command: &str) -> Result<String, RconError> {
        let timeout = self.timeout;
        time::timeout(timeout, self.exec_inner(command))
            .await
            .map_err(|_| RconError::Timeout {
                stage: "command",
                after: timeout,
            })?
    }

    /// Shuts down the write half of the socket.
    pub async fn close(mut self) -> Result<(), RconError> {
        self.stream.shutdown().await.map_err(RconError::Io)
    }

    async fn authenticate(&mut self, password: &str) -> Result<(), RconError> {
        let id = self.request_id();
        self.write_packet(&Packet::auth(id, password)).await?;

        loop {
            let reply = self.read_packet().await?;
            match reply.kind {
                PacketKind::ExecCommand if reply.id == -1 => {
                    return Err(RconError::AuthFailed);
                }
                PacketKind::ExecCommand if reply.id == id => return Ok(()),
                // Some servers send an empty value packet before the auth reply.
                _ => continue,
            }
        }
    }

    async fn exec_inner(&mut self, command: &str) -> Result<String, RconError> {
        let id = self.request_id();
        self.write_packet(&Packet::command(id, command)).await?;

        loop {
            let reply = self.read_packet().await?;
            if reply.id == id && reply.kind == PacketKind::ResponseValue {
                return Ok(reply.body);
            }
            tracing::trace!(
                expected = id,
                got = reply.id,
                "skipping unrelated RCON packet"
            );
        }
    }

    fn request_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    async fn write_packet(&mut self, packet: &Packet) -> Result<(), RconError> {
        let bytes = self.codec.encode(packet)?;
        self.stream.write_all(&bytes).await.map_err(map_io)
    }

    async fn read_packet(&mut self) -> Result<Packet, RconError> {
        let mut prefix = [0u8; 4];
        self.stream.read_exact(&mut prefix).await.map_err(map_io)?;
        let len = self.codec.frame_len(prefix)?;

        let mut frame = vec![0u8; len];
        self.stream.read_exact(&mut frame).await.map_err(map_io)?;
        Ok(self.codec.decode(&frame)?)
    }
}

fn map_io(e: std::io::Error) -> RconError {
    match e.kind() {
        ErrorKind::UnexpectedEof
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe => RconError::ConnectionClosed,
        _ => RconError::Io(e),
    }
}
