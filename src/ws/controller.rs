//! Stateful per-connection WebSocket controller.
//!
//! A [`WebSocketController`] takes over the transport once the upgrade
//! handshake is done. A spawned driver task owns the reader and writer and
//! multiplexes four concerns: inbound frames (with CONTINUATION reassembly),
//! outbound writes, a recurring keep-alive ping, and the close handshake.

use std::io;
use std::pin::Pin;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, sleep, Instant, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::protocol::WsError;
use crate::ws::frame::{self, Opcode};
use crate::ws::handshake;

/// One transport read per loop iteration; a single frame larger than this is
/// a protocol error, messages that big must be fragmented.
const READ_BUF_SIZE: usize = 65_000;

/// A ping goes out this often; a ping still unanswered at the next tick
/// fails the connection.
const PING_INTERVAL: Duration = Duration::from_secs(15);

/// How long a locally initiated close waits for the peer's CLOSE reply.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(4);

/// CLOSE payload: status 1000, normal closure.
const CLOSE_NORMAL: [u8; 2] = [0x03, 0xe8];

const PING_PAYLOAD: &[u8] = b"ping";

const MESSAGE_CHANNEL_SIZE: usize = 8;

enum Command {
    Write(Opcode, Vec<u8>, oneshot::Sender<Result<(), WsError>>),
    Close,
}

/// Handle to one WebSocket connection.
///
/// Reads resolve with whole messages: fragmented frames are reassembled by
/// the driver and delivered only once the final fragment arrives. Writes go
/// out as single unmasked frames. Dropping the controller tears the
/// connection down.
pub struct WebSocketController {
    cmd_tx: mpsc::UnboundedSender<Command>,
    msg_rx: mpsc::Receiver<Vec<u8>>,
    close_rx: Option<oneshot::Receiver<Result<(), WsError>>>,
}

impl WebSocketController {
    /// Renders the `101 Switching Protocols` reply for a client key; see
    /// [`handshake::make_handshake`].
    pub fn make_handshake(client_key: &str) -> Vec<u8> {
        handshake::make_handshake(client_key)
    }

    /// Takes over `reader` and `writer` after a completed handshake.
    ///
    /// The driver task starts reading immediately and sends the first ping
    /// 15 seconds from now. Cancelling `ctx` stops the loop and the timers
    /// and fails [`wait_for_close`](Self::wait_for_close).
    pub fn new<R, W>(ctx: &CancellationToken, reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (msg_tx, msg_rx) = mpsc::channel(MESSAGE_CHANNEL_SIZE);
        let (close_tx, close_rx) = oneshot::channel();

        let driver = Driver {
            reader,
            writer,
            cmd_rx,
            msg_tx,
            ctx: ctx.child_token(),
            reassembly: Vec::new(),
            pong_pending: false,
            closed: false,
        };
        tokio::spawn(driver.run(close_tx));

        Self { cmd_tx, msg_rx, close_rx: Some(close_rx) }
    }

    /// Resolves with the next complete (reassembled) message.
    ///
    /// Fails with [`WsError::Closed`] once the connection is down.
    pub async fn read_frame(&mut self) -> Result<Vec<u8>, WsError> {
        self.msg_rx.recv().await.ok_or(WsError::Closed)
    }

    /// Sends one TEXT frame.
    pub async fn write_frame_text(&self, payload: impl Into<String>) -> Result<(), WsError> {
        self.write(Opcode::Text, payload.into().into_bytes()).await
    }

    /// Sends one BINARY frame.
    pub async fn write_frame(&self, payload: impl Into<Vec<u8>>) -> Result<(), WsError> {
        self.write(Opcode::Binary, payload.into()).await
    }

    async fn write(&self, opcode: Opcode, payload: Vec<u8>) -> Result<(), WsError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.cmd_tx.send(Command::Write(opcode, payload, ack_tx)).map_err(|_| WsError::Closed)?;
        ack_rx.await.map_err(|_| WsError::Closed)?
    }

    /// Starts an orderly close. Idempotent.
    ///
    /// Emits a CLOSE frame with status 1000 and arms a 4-second timeout;
    /// [`wait_for_close`](Self::wait_for_close) resolves when the peer
    /// acknowledges or the timeout elapses, whichever comes first.
    pub fn close(&self) {
        let _ = self.cmd_tx.send(Command::Close);
    }

    /// Resolves when the connection has shut down: remote CLOSE, local close
    /// timeout, or a fatal error (which fails the future).
    pub async fn wait_for_close(&mut self) -> Result<(), WsError> {
        match self.close_rx.take() {
            Some(close_rx) => close_rx.await.unwrap_or(Err(WsError::Closed)),
            None => Ok(()),
        }
    }
}

struct Driver<R, W> {
    reader: R,
    writer: W,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    msg_tx: mpsc::Sender<Vec<u8>>,
    ctx: CancellationToken,
    reassembly: Vec<u8>,
    pong_pending: bool,
    closed: bool,
}

impl<R, W> Driver<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    async fn run(mut self, close_tx: oneshot::Sender<Result<(), WsError>>) {
        let result = self.drive().await;
        if let Err(e) = &result {
            debug!(error = %e, "websocket connection finished with error");
        }
        let _ = close_tx.send(result);
    }

    async fn drive(&mut self) -> Result<(), WsError> {
        let mut buf = vec![0u8; READ_BUF_SIZE];
        let mut ping = interval_at(Instant::now() + PING_INTERVAL, PING_INTERVAL);
        let mut close_deadline: Option<Pin<Box<Sleep>>> = None;

        loop {
            tokio::select! {
                biased;

                _ = self.ctx.cancelled() => {
                    return Err(WsError::Cancelled);
                }

                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Write(opcode, payload, ack)) => {
                        if self.closed {
                            let _ = ack.send(Err(WsError::Closed));
                        } else {
                            match self.write_frame(opcode, &payload).await {
                                Ok(()) => {
                                    let _ = ack.send(Ok(()));
                                }
                                Err(e) => {
                                    let _ = ack.send(Err(WsError::Closed));
                                    return Err(e);
                                }
                            }
                        }
                    }
                    Some(Command::Close) => {
                        if !self.closed {
                            self.closed = true;
                            self.write_frame(Opcode::Close, &CLOSE_NORMAL).await?;
                            close_deadline = Some(Box::pin(sleep(CLOSE_TIMEOUT)));
                        }
                    }
                    None => {
                        // controller handle dropped
                        return Err(WsError::Cancelled);
                    }
                },

                _ = ping.tick() => {
                    if !self.closed {
                        if self.pong_pending {
                            return Err(WsError::PingTimeout);
                        }
                        self.pong_pending = true;
                        trace!("sending keep-alive ping");
                        self.write_frame(Opcode::Ping, PING_PAYLOAD).await?;
                    }
                }

                _ = async { close_deadline.as_mut().unwrap().await }, if close_deadline.is_some() => {
                    // the peer never acknowledged our CLOSE
                    debug!("close handshake timed out");
                    return Ok(());
                }

                read = self.reader.read(&mut buf) => {
                    let n = read?;
                    if n == 0 {
                        if self.closed {
                            return Ok(());
                        }
                        return Err(WsError::Io {
                            source: io::Error::new(io::ErrorKind::UnexpectedEof, "transport closed mid-connection"),
                        });
                    }
                    if self.handle_input(&buf[..n]).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Processes every complete frame in one transport read.
    ///
    /// Returns `true` when a CLOSE frame ends the connection. A trailing
    /// partial frame is a protocol error: frames do not span reads.
    async fn handle_input(&mut self, mut input: &[u8]) -> Result<bool, WsError> {
        while !input.is_empty() {
            let (frame, consumed) = frame::parse(input)?;
            input = &input[consumed..];

            trace!(opcode = ?frame.opcode(), fin = frame.fin(), len = frame.payload().len(), "frame received");

            match frame.opcode() {
                Opcode::Close => {
                    self.closed = true;
                    return Ok(true);
                }
                Opcode::Ping => {
                    let payload = frame.into_payload();
                    self.write_frame(Opcode::Pong, &payload).await?;
                }
                Opcode::Pong => {
                    self.pong_pending = false;
                }
                Opcode::Text | Opcode::Binary => {
                    let fin = frame.fin();
                    self.reassembly = frame.into_payload();
                    if fin {
                        self.deliver().await;
                    }
                }
                Opcode::Continuation => {
                    self.reassembly.extend_from_slice(frame.payload());
                    if frame.fin() {
                        self.deliver().await;
                    }
                }
            }
        }

        Ok(false)
    }

    async fn deliver(&mut self) {
        let message = std::mem::take(&mut self.reassembly);
        if self.msg_tx.send(message).await.is_err() {
            trace!("message receiver dropped, discarding payload");
        }
    }

    async fn write_frame(&mut self, opcode: Opcode, payload: &[u8]) -> Result<(), WsError> {
        let data = frame::encode(true, opcode, None, payload);
        self.writer.write_all(&data).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::DuplexStream;

    struct Peer {
        read: tokio::io::ReadHalf<DuplexStream>,
        write: tokio::io::WriteHalf<DuplexStream>,
        buf: Vec<u8>,
    }

    /// A fake client on the other end of an in-memory transport.
    impl Peer {
        fn start(ctx: &CancellationToken) -> (WebSocketController, Peer) {
            let (local, remote) = tokio::io::duplex(READ_BUF_SIZE);
            let (local_read, local_write) = tokio::io::split(local);
            let (remote_read, remote_write) = tokio::io::split(remote);

            let controller = WebSocketController::new(ctx, local_read, local_write);
            (controller, Peer { read: remote_read, write: remote_write, buf: vec![0u8; READ_BUF_SIZE] })
        }

        async fn send(&mut self, fin: bool, opcode: Opcode, payload: &[u8]) {
            let data = frame::encode(fin, opcode, None, payload);
            self.write.write_all(&data).await.unwrap();
        }

        async fn recv(&mut self) -> frame::Frame {
            let n = self.read.read(&mut self.buf).await.unwrap();
            let (frame, consumed) = frame::parse(&self.buf[..n]).unwrap();
            assert_eq!(consumed, n);
            frame
        }
    }

    #[tokio::test]
    async fn delivers_single_frame_messages() {
        let ctx = CancellationToken::new();
        let (mut controller, mut peer) = Peer::start(&ctx);

        peer.send(true, Opcode::Text, b"hello").await;
        assert_eq!(controller.read_frame().await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn reassembles_fragmented_messages() {
        let ctx = CancellationToken::new();
        let (mut controller, mut peer) = Peer::start(&ctx);

        peer.send(false, Opcode::Text, b"hel").await;
        peer.send(false, Opcode::Continuation, b"lo ").await;
        peer.send(true, Opcode::Continuation, b"world").await;

        assert_eq!(controller.read_frame().await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn handles_multiple_frames_in_one_read() {
        let ctx = CancellationToken::new();
        let (mut controller, mut peer) = Peer::start(&ctx);

        let mut batch = frame::encode(true, Opcode::Text, None, b"one");
        batch.extend_from_slice(&frame::encode(true, Opcode::Text, None, b"two"));
        peer.write.write_all(&batch).await.unwrap();

        assert_eq!(controller.read_frame().await.unwrap(), b"one");
        assert_eq!(controller.read_frame().await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn writes_unmasked_frames() {
        let ctx = CancellationToken::new();
        let (controller, mut peer) = Peer::start(&ctx);

        controller.write_frame_text("hi there").await.unwrap();
        let frame = peer.recv().await;
        assert_eq!(frame.opcode(), Opcode::Text);
        assert_eq!(frame.mask(), None);
        assert_eq!(frame.payload(), b"hi there");

        controller.write_frame(vec![1, 2, 3]).await.unwrap();
        let frame = peer.recv().await;
        assert_eq!(frame.opcode(), Opcode::Binary);
        assert_eq!(frame.payload(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn answers_ping_with_pong() {
        let ctx = CancellationToken::new();
        let (_controller, mut peer) = Peer::start(&ctx);

        peer.send(true, Opcode::Ping, b"are you there").await;

        let frame = peer.recv().await;
        assert_eq!(frame.opcode(), Opcode::Pong);
        assert_eq!(frame.payload(), b"are you there");
    }

    #[tokio::test]
    async fn remote_close_resolves_wait_for_close() {
        let ctx = CancellationToken::new();
        let (mut controller, mut peer) = Peer::start(&ctx);

        peer.send(true, Opcode::Close, &CLOSE_NORMAL).await;

        controller.wait_for_close().await.unwrap();
        assert!(matches!(controller.read_frame().await, Err(WsError::Closed)));
        assert!(matches!(controller.write_frame_text("late").await, Err(WsError::Closed)));
    }

    #[tokio::test]
    async fn local_close_emits_close_frame_and_waits_for_ack() {
        let ctx = CancellationToken::new();
        let (mut controller, mut peer) = Peer::start(&ctx);

        controller.close();

        let frame = peer.recv().await;
        assert_eq!(frame.opcode(), Opcode::Close);
        assert_eq!(frame.payload(), &CLOSE_NORMAL);

        peer.send(true, Opcode::Close, &CLOSE_NORMAL).await;
        controller.wait_for_close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn local_close_times_out_without_ack() {
        let ctx = CancellationToken::new();
        let (mut controller, mut peer) = Peer::start(&ctx);

        controller.close();

        let frame = peer.recv().await;
        assert_eq!(frame.opcode(), Opcode::Close);

        // the peer never replies; the 4 second timeout resolves the close
        controller.wait_for_close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_ping_fails_the_connection() {
        let ctx = CancellationToken::new();
        let (mut controller, mut peer) = Peer::start(&ctx);

        let frame = peer.recv().await;
        assert_eq!(frame.opcode(), Opcode::Ping);

        // no pong: the next tick reports the timeout
        assert!(matches!(controller.wait_for_close().await, Err(WsError::PingTimeout)));
    }

    #[tokio::test(start_paused = true)]
    async fn answered_ping_keeps_the_connection_alive() {
        let ctx = CancellationToken::new();
        let (mut controller, mut peer) = Peer::start(&ctx);

        for _ in 0..3 {
            let frame = peer.recv().await;
            assert_eq!(frame.opcode(), Opcode::Ping);
            peer.send(true, Opcode::Pong, frame.payload()).await;
        }

        peer.send(true, Opcode::Text, b"still here").await;
        assert_eq!(controller.read_frame().await.unwrap(), b"still here");
    }

    #[tokio::test]
    async fn garbage_frame_fails_the_connection() {
        let ctx = CancellationToken::new();
        let (mut controller, mut peer) = Peer::start(&ctx);

        // a lone frame header with a payload that never arrives
        peer.write.write_all(&[0x81, 0x05, b'h', b'i']).await.unwrap();

        assert!(matches!(controller.wait_for_close().await, Err(WsError::FrameTooShort)));
    }

    #[tokio::test]
    async fn cancellation_stops_the_driver() {
        let ctx = CancellationToken::new();
        let (mut controller, _peer) = Peer::start(&ctx);

        ctx.cancel();

        assert!(matches!(controller.wait_for_close().await, Err(WsError::Cancelled)));
    }
}
