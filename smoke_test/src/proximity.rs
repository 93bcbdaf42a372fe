//! # Proximity Monitor
//!
//! Listens to the poses reported by the hands and latches a one-shot "hit" as soon as one of them
//! comes close enough to the ball.
//!
//! Each pose source is read on its own thread, concurrently with the main test sequence. The only
//! state shared with the main sequence is the armed target and the [`HitLatch`], which can only be
//! set once: the first reading below the threshold wins and every later one is ignored.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};
use nalgebra::Vector3;
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        mpsc::{Receiver, RecvTimeoutError},
        Arc, RwLock,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use comms_if::rpc::BottleReader;

use crate::harness::HarnessError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Bit pattern of an unset latch, a NaN which is never a valid distance.
const UNSET: u64 = u64::MAX;

/// Maximum time spent reading the poses still queued once the monitor is stopped.
const DRAIN_WINDOW: Duration = Duration::from_secs(1);

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A stream of end-effector positions, in the robot root frame.
pub trait PoseSource: Send {
    /// Name of the source, used in logs.
    fn name(&self) -> &str;

    /// Wait a short time for the next position, returning `Ok(None)` if none arrived.
    fn next_pose(&mut self) -> Result<Option<Vector3<f64>>, HarnessError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Write-once record of the first distance measured below the threshold.
#[derive(Debug)]
pub struct HitLatch(AtomicU64);

/// Pose source fed through a channel.
pub struct ChannelPoseSource {
    name: String,
    receiver: Receiver<Vector3<f64>>,
    timeout: Duration,
}

/// Watches a set of pose sources for a hand approaching the target.
pub struct ProximityMonitor {
    target: Arc<RwLock<Option<Vector3<f64>>>>,
    latch: Arc<HitLatch>,
    stop: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl HitLatch {
    pub fn new() -> Self {
        Self(AtomicU64::new(UNSET))
    }

    /// Record `distance_m` if nothing was recorded yet. Returns `true` if this call set the latch.
    pub fn try_set(&self, distance_m: f64) -> bool {
        if distance_m.is_nan() {
            return false;
        }

        self.0
            .compare_exchange(UNSET, distance_m.to_bits(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire) != UNSET
    }

    /// The latched distance.
    pub fn distance_m(&self) -> Option<f64> {
        match self.0.load(Ordering::Acquire) {
            UNSET => None,
            bits => Some(f64::from_bits(bits)),
        }
    }
}

impl Default for HitLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelPoseSource {
    pub fn new(name: &str, receiver: Receiver<Vector3<f64>>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            receiver,
            timeout,
        }
    }
}

impl PoseSource for ChannelPoseSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_pose(&mut self) -> Result<Option<Vector3<f64>>, HarnessError> {
        match self.receiver.recv_timeout(self.timeout) {
            Ok(x) => Ok(Some(x)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(self.timeout);
                Ok(None)
            }
        }
    }
}

impl PoseSource for BottleReader {
    fn name(&self) -> &str {
        self.local_name()
    }

    /// Reads the first three values of the received bottle, further values (such as the
    /// orientation) are ignored.
    fn next_pose(&mut self) -> Result<Option<Vector3<f64>>, HarnessError> {
        let b = match self
            .read()
            .map_err(|e| HarnessError::Communication(self.local_name().into(), e))?
        {
            Some(b) => b,
            None => return Ok(None),
        };

        match (b.float64(0), b.float64(1), b.float64(2)) {
            (Some(x), Some(y), Some(z)) => Ok(Some(Vector3::new(x, y, z))),
            _ => Err(HarnessError::InvalidReply(self.local_name().into(), b)),
        }
    }
}

impl ProximityMonitor {
    /// Start listening to `sources`.
    ///
    /// Readings are ignored until the monitor is armed with [`ProximityMonitor::arm`].
    pub fn start(sources: Vec<Box<dyn PoseSource>>, threshold_m: f64) -> Self {
        let target = Arc::new(RwLock::new(None));
        let latch = Arc::new(HitLatch::new());
        let stop = Arc::new(AtomicBool::new(false));

        let handles = sources
            .into_iter()
            .map(|source| {
                let target = target.clone();
                let latch = latch.clone();
                let stop = stop.clone();
                thread::spawn(move || listen(source, threshold_m, target, latch, stop))
            })
            .collect();

        Self {
            target,
            latch,
            stop,
            handles,
        }
    }

    /// Start checking the distance between the hands and `target`.
    pub fn arm(&self, target: Vector3<f64>) {
        match self.target.write() {
            Ok(mut t) => *t = Some(target),
            Err(e) => *e.into_inner() = Some(target),
        }
    }

    pub fn latch(&self) -> &HitLatch {
        &self.latch
    }

    /// Stop the listeners, once they have processed the poses already received.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);

        for h in self.handles.drain(..) {
            if h.join().is_err() {
                warn!("A proximity listener panicked");
            }
        }
    }
}

impl Drop for ProximityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Distance from `x` to `target` if it is below `threshold_m`.
pub fn proximity_hit(target: &Vector3<f64>, x: &Vector3<f64>, threshold_m: f64) -> Option<f64> {
    let d = (target - x).norm();

    if d < threshold_m {
        Some(d)
    } else {
        None
    }
}

fn listen(
    mut source: Box<dyn PoseSource>,
    threshold_m: f64,
    target: Arc<RwLock<Option<Vector3<f64>>>>,
    latch: Arc<HitLatch>,
    stop: Arc<AtomicBool>,
) {
    let mut stopped_at: Option<Instant> = None;

    loop {
        if stopped_at.is_none() && stop.load(Ordering::Acquire) {
            stopped_at = Some(Instant::now());
        }

        if let Some(t) = stopped_at {
            if t.elapsed() > DRAIN_WINDOW {
                break;
            }
        }

        let x = match source.next_pose() {
            Ok(Some(x)) => x,
            Ok(None) => {
                if stopped_at.is_some() {
                    break;
                }
                continue;
            }
            Err(e) => {
                warn!("Ignoring reading from {}: {}", source.name(), e);
                if stopped_at.is_some() {
                    break;
                }
                continue;
            }
        };

        if latch.is_set() {
            continue;
        }

        let armed_target = match target.read() {
            Ok(t) => *t,
            Err(e) => *e.into_inner(),
        };

        if let Some(t) = armed_target {
            if let Some(d) = proximity_hit(&t, &x, threshold_m) {
                if latch.try_set(d) {
                    info!("Great! We're at {:.3} [m] from the ball", d);
                }
            }
        }
    }

    debug!("Proximity listener on {} stopped", source.name());
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
