//! Servo Link Host Runner
//!
//! Runs the device control loop on a host against a serial port or stdin,
//! and sends command frames to a device.

use anyhow::{Context, Result};
use byte_ring::ByteSource;
use servo_control::{ControlLoop, LinkConfig, TracingServo};
use servo_protocol::{Command, CommandFrame};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Bytes requested per read from the transport
const READ_CHUNK: usize = 64;

/// Chunks buffered between the reader task and the control loop
const CHANNEL_DEPTH: usize = 256;

/// Initialize logging
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Non-blocking byte source fed by a background reader task
pub struct ChannelSource {
    rx: mpsc::Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
    closed: bool,
}

impl ChannelSource {
    /// Wrap a channel of received chunks
    pub fn new(rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            rx,
            pending: VecDeque::new(),
            closed: false,
        }
    }

    /// True once the reader has finished and every byte has been taken
    pub fn is_exhausted(&self) -> bool {
        self.closed && self.pending.is_empty()
    }
}

impl ByteSource for ChannelSource {
    fn read_byte(&mut self) -> Option<u8> {
        while self.pending.is_empty() {
            match self.rx.try_recv() {
                Ok(chunk) => self.pending.extend(chunk),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    return None;
                }
            }
        }
        self.pending.pop_front()
    }
}

/// Spawn a task that forwards everything read from `reader`
pub fn spawn_reader<R>(mut reader: R) -> ChannelSource
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);

    tokio::spawn(async move {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => {
                    debug!("Reader reached end of stream");
                    break;
                }
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).await.is_err() {
                        debug!("Control loop dropped, stopping reader");
                        break;
                    }
                }
                Err(e) => {
                    warn!("Read error: {}", e);
                    break;
                }
            }
        }
    });

    ChannelSource::new(rx)
}

/// Open a serial port at the configured baud rate
pub fn open_port(path: &str, baud_rate: u32) -> Result<SerialStream> {
    info!("Opening {} at {} baud", path, baud_rate);
    tokio_serial::new(path, baud_rate)
        .open_native_async()
        .with_context(|| format!("Failed to open serial port {}", path))
}

/// Counters reported when `listen` finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenSummary {
    /// Poll cycles run
    pub cycles: u64,
    /// Frames pulled from the ring
    pub frames_decoded: usize,
    /// Frames that set new targets
    pub applied: usize,
    /// Frames with an unknown command
    pub rejected: usize,
    /// Frames dropped for a bad checksum
    pub checksum_failures: usize,
    /// Bytes that arrived at a full ring
    pub overflows: usize,
    /// Bytes left over that never formed a frame
    pub unframed: usize,
}

/// Run the device control loop until the input stream ends
pub async fn listen(
    config: &LinkConfig,
    source: ChannelSource,
    poll_interval: Duration,
) -> Result<ListenSummary> {
    let mut control = ControlLoop::new(
        config,
        source,
        TracingServo::new("leg1", config.leg1_pin),
        TracingServo::new("leg2", config.leg2_pin),
    )?;

    loop {
        control.cycle();
        if control.source_mut().is_exhausted() {
            break;
        }
        tokio::time::sleep(poll_interval).await;
    }

    let stats = control.decoder().stats();
    let totals = control.dispatcher().totals();
    let summary = ListenSummary {
        cycles: control.cycles(),
        frames_decoded: stats.frames_decoded,
        applied: totals.applied,
        rejected: totals.rejected,
        checksum_failures: stats.checksum_failures,
        overflows: control.decoder().ring().overflow_count(),
        unframed: control.decoder().ring().available(),
    };
    info!("Input closed: {:?}", summary);
    Ok(summary)
}

/// Encode one command and write it to `writer`
pub async fn send<W>(writer: &mut W, command: Command) -> Result<CommandFrame>
where
    W: AsyncWrite + Unpin,
{
    let frame = command.to_frame();
    info!("Writing {:02X?}", frame.to_bytes());
    writer.write_all(&frame.to_bytes()).await?;
    writer.flush().await?;
    Ok(frame)
}
