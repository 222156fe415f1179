//! Refresh tick sources for the directory task.
//!
//! The directory re-derives its view on every tick. Ticks come through the
//! [`TickSource`] trait so tests can drive them by hand instead of waiting
//! on a real clock.

use std::time::Duration;

use futures::future::BoxFuture;
use tokio::{
    sync::mpsc,
    time::{self, Instant, Interval, MissedTickBehavior},
};

/// Produces refresh ticks.
pub trait TickSource: Send + 'static {
    /// Resolves at the next tick, or with `None` once no further ticks will
    /// ever arrive. Must be cancel safe.
    fn next_tick(&mut self) -> BoxFuture<'_, Option<()>>;
}

/// Fixed-period ticks backed by a tokio interval.
///
/// The first tick fires one full period after the first poll. Ticks missed
/// because the owner was busy are delayed, not bunched up.
#[derive(Debug)]
pub struct IntervalTicks {
    period: Duration,
    interval: Option<Interval>,
}

impl IntervalTicks {
    /// Returns `None` for a zero period.
    pub fn try_new(period: Duration) -> Option<Self> {
        (!period.is_zero()).then_some(Self {
            period,
            interval: None,
        })
    }

    /// # Panics
    /// Panics if `period` is zero; see [`IntervalTicks::try_new`].
    pub fn new(period: Duration) -> Self {
        match Self::try_new(period) {
            Some(ticks) => ticks,
            None => panic!("tick period must be non-zero"),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl TickSource for IntervalTicks {
    fn next_tick(&mut self) -> BoxFuture<'_, Option<()>> {
        Box::pin(async move {
            let period = self.period;
            // Created lazily so construction works outside a runtime.
            let interval = self.interval.get_or_insert_with(|| {
                let mut interval = time::interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                interval
            });
            interval.tick().await;
            Some(())
        })
    }
}

/// Tick source that never ticks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTicks;

impl TickSource for NoTicks {
    fn next_tick(&mut self) -> BoxFuture<'_, Option<()>> {
        Box::pin(async { None })
    }
}

/// Hand-driven ticks, see [`manual_ticks`].
#[derive(Debug)]
pub struct ManualTicks {
    rx: mpsc::UnboundedReceiver<()>,
}

/// Sender side of [`ManualTicks`].
#[derive(Debug, Clone)]
pub struct ManualTickHandle {
    tx: mpsc::UnboundedSender<()>,
}

/// Creates a tick source that ticks once per [`ManualTickHandle::tick`].
/// The source ends once every handle is dropped.
pub fn manual_ticks() -> (ManualTicks, ManualTickHandle) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ManualTicks { rx }, ManualTickHandle { tx })
}

impl ManualTickHandle {
    /// Queues one tick. Returns `false` if the consumer is gone, i.e. the
    /// owning task has been torn down.
    pub fn tick(&self) -> bool {
        self.tx.send(()).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Completes once the consuming source has been dropped.
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}

impl TickSource for ManualTicks {
    fn next_tick(&mut self) -> BoxFuture<'_, Option<()>> {
        Box::pin(self.rx.recv())
    }
}
