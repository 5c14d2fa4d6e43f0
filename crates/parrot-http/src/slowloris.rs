//! Slow-drip responder.
//!
//! Streams a body of single `.` bytes, one every `interval`, until `duration`
//! has elapsed. Each byte is handed to hyper as its own frame so the client
//! sees it as soon as it is written. Every stream runs in its own task and
//! only suspends itself between bytes.

use crate::config::Config;
use crate::decision::query_param;
use crate::metrics;
use bytes::Bytes;
use hyper::body::{Body, Frame, SizeHint};
use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

pub const DURATION_PARAM: &str = "duration";
pub const INTERVAL_PARAM: &str = "interval";

const DRIP: Bytes = Bytes::from_static(b".");

/// Timing of one slow-drip response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DripParams {
    pub duration: Duration,
    pub interval: Duration,
}

impl DripParams {
    /// Resolve timing from query overrides, falling back to the configured
    /// defaults for missing, unparsable or non-positive values.
    pub fn resolve(query: Option<&str>, config: &Config) -> Self {
        let duration = query_param(query, DURATION_PARAM)
            .and_then(|raw| parse_seconds(&raw))
            .unwrap_or_else(|| config.slowloris_default_duration());
        let interval = query_param(query, INTERVAL_PARAM)
            .and_then(|raw| parse_seconds(&raw))
            .unwrap_or_else(|| config.slowloris_default_interval());

        Self { duration, interval }
    }
}

/// Parse a positive, finite number of seconds, e.g. `3` or `0.5`
fn parse_seconds(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.trim().parse().ok()?;
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
}

/// How a drip loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DripOutcome {
    /// The full duration elapsed
    Completed { bytes_written: usize },
    /// The receiving side went away before the duration elapsed
    Disconnected { bytes_written: usize },
}

/// Run the drip loop, sending each byte through `tx`.
///
/// Ends once the elapsed time reaches `duration`. A failed send means the
/// client is gone; the loop stops at once and does not retry.
pub async fn drip(tx: mpsc::Sender<Bytes>, params: DripParams) -> DripOutcome {
    let start = Instant::now();
    let mut bytes_written = 0;

    loop {
        if start.elapsed() >= params.duration {
            return DripOutcome::Completed { bytes_written };
        }

        if tx.send(DRIP).await.is_err() {
            return DripOutcome::Disconnected { bytes_written };
        }
        bytes_written += 1;

        tokio::time::sleep(params.interval).await;
    }
}

/// Response body fed by a drip task
#[derive(Debug)]
pub struct DripBody {
    rx: mpsc::Receiver<Bytes>,
}

impl Body for DripBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, Infallible>>> {
        self.rx
            .poll_recv(cx)
            .map(|chunk| chunk.map(|bytes| Ok(Frame::data(bytes))))
    }

    fn size_hint(&self) -> SizeHint {
        // Length unknown up front, forces chunked transfer encoding
        SizeHint::default()
    }
}

/// Spawn a drip task and return the body it feeds.
///
/// Dropping the body (hyper does so when the connection closes) makes the
/// task's next send fail, which ends the task.
pub fn spawn_drip(params: DripParams) -> DripBody {
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        metrics::SLOWLORIS_ACTIVE.inc();
        let outcome = drip(tx, params).await;
        metrics::SLOWLORIS_ACTIVE.dec();

        match outcome {
            DripOutcome::Completed { bytes_written } => {
                debug!("Slow-drip finished after {} bytes", bytes_written);
            }
            DripOutcome::Disconnected { bytes_written } => {
                metrics::SLOWLORIS_ABORTED_TOTAL.inc();
                info!(
                    "Slow-drip client disconnected after {} bytes, aborting stream",
                    bytes_written
                );
            }
        }
    });

    DripBody { rx }
}
