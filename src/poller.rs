//! Fixed-rate polling thread
//!
//! A single worker thread owns the driver: it acquires and initializes the
//! device, then reads it every [`POLL_INTERVAL`] and posts [`SensorEvent`]s to
//! an mpsc channel. Only this thread ever touches the bus handle, so
//! transactions cannot interleave.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{SendError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::bus::{I2cBus, I2cPlatform};
use crate::error::{Mma8452qError, Result};
use crate::frame::Acceleration;
use crate::mma8452q::{DriverState, Mma8452q};

/// Time between successive reads. The first read fires immediately.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Status text shown once the device is running
pub const DEVICE_LABEL: &str = "I2C Address of the 3-Axis Digital Accelerometer MMA8452Q: 0x1C";

/// Event delivered to the presentation side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorEvent {
    /// Startup progress
    Status(String),
    /// Startup failed; no polling follows
    Halted(String),
    /// Decoded sample from a successful tick
    Reading(Acceleration),
    /// Diagnostic text from a failed tick
    Error(String),
}

/// Per-tick status tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    Running,
    Failed,
}

impl SensorEvent {
    /// Tick status carried by this event, `None` for startup messages
    pub fn status(&self) -> Option<PollStatus> {
        match self {
            SensorEvent::Status(_) | SensorEvent::Halted(_) => None,
            SensorEvent::Reading(_) => Some(PollStatus::Running),
            SensorEvent::Error(_) => Some(PollStatus::Failed),
        }
    }
}

/// Handle to the polling thread
///
/// Dropping the handle shuts the thread down the same way [`PollingLoop::shutdown`] does.
pub struct PollingLoop {
    stop_signal: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl PollingLoop {
    /// Find a controller, open and initialize the device, then poll it
    ///
    /// Acquisition runs on the worker thread. Startup failures are posted as a
    /// single `SensorEvent::Halted` and no polling is started.
    pub fn start<P>(platform: P, events: Sender<SensorEvent>) -> Self
    where
        P: I2cPlatform + Send + 'static,
    {
        Self::start_with_interval(platform, events, POLL_INTERVAL)
    }

    pub(crate) fn start_with_interval<P>(
        platform: P,
        events: Sender<SensorEvent>,
        interval: Duration,
    ) -> Self
    where
        P: I2cPlatform + Send + 'static,
    {
        Self::spawn_worker(move |stop| {
            let sensor = match Mma8452q::connect(&platform) {
                Ok(sensor) => sensor,
                Err(e) => {
                    error!("Startup failed: {}", e);
                    let _ = events.send(SensorEvent::Halted(e.to_string()));
                    return;
                }
            };

            if events.send(SensorEvent::Status(DEVICE_LABEL.to_string())).is_err() {
                return;
            }
            PollWorker::new(sensor, events).run(&stop, interval);
        })
    }

    /// Poll an already initialized driver
    ///
    /// # Errors
    ///
    /// Returns `Mma8452qError::NotReady` unless the driver is `Ready`; no
    /// thread is started in that case.
    pub fn spawn<B>(sensor: Mma8452q<B>, events: Sender<SensorEvent>) -> Result<Self>
    where
        B: I2cBus + Send + 'static,
    {
        Self::spawn_with_interval(sensor, events, POLL_INTERVAL)
    }

    pub(crate) fn spawn_with_interval<B>(
        sensor: Mma8452q<B>,
        events: Sender<SensorEvent>,
        interval: Duration,
    ) -> Result<Self>
    where
        B: I2cBus + Send + 'static,
    {
        if *sensor.state() != DriverState::Ready {
            return Err(Mma8452qError::NotReady(sensor.state().clone()));
        }
        Ok(Self::spawn_worker(move |stop| {
            PollWorker::new(sensor, events).run(&stop, interval)
        }))
    }

    fn spawn_worker<F>(body: F) -> Self
    where
        F: FnOnce(Arc<AtomicBool>) + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_clone = stop_signal.clone();
        let thread = thread::spawn(move || body(stop_clone));

        Self {
            stop_signal,
            thread: Some(thread),
        }
    }

    /// Check if the worker thread is still running
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    /// Stop ticking, wait for an in-flight read, and release the device
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            thread.thread().unpark();
            if thread.join().is_err() {
                error!("Polling thread panicked");
            }
        }
    }
}

impl Drop for PollingLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Worker-side state: the driver and the event producer
struct PollWorker<B: I2cBus> {
    sensor: Mma8452q<B>,
    events: Sender<SensorEvent>,
}

impl<B: I2cBus> PollWorker<B> {
    fn new(sensor: Mma8452q<B>, events: Sender<SensorEvent>) -> Self {
        Self { sensor, events }
    }

    /// One read-decode-emit cycle. A failed read is reported, never propagated.
    fn tick(&mut self) -> std::result::Result<(), SendError<SensorEvent>> {
        let event = match self.sensor.read() {
            Ok(accel) => SensorEvent::Reading(accel),
            Err(e) => {
                warn!("Tick failed: {}", e);
                SensorEvent::Error(format!(
                    "Failed to read from 3-Axis Digital Accelerometer: {}",
                    e
                ))
            }
        };
        self.events.send(event)
    }

    /// Tick until stopped or the receiver goes away, then close the driver
    fn run(mut self, stop: &AtomicBool, interval: Duration) {
        let mut next_tick = Instant::now();

        'poll: while !stop.load(Ordering::SeqCst) {
            if self.tick().is_err() {
                info!("Event receiver dropped, stopping polling");
                break;
            }

            next_tick += interval;
            let now = Instant::now();
            // Running behind: fire the next tick right away, don't burst
            if next_tick < now {
                next_tick = now;
            }

            // Sleep until the next tick; shutdown unparks us early
            loop {
                if stop.load(Ordering::SeqCst) {
                    break 'poll;
                }
                let now = Instant::now();
                if now >= next_tick {
                    break;
                }
                thread::park_timeout(next_tick - now);
            }
        }

        self.sensor.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::{I2cTransaction, MockPlatform};
    use crate::bus::ControllerId;
    use std::sync::mpsc::{self, Receiver};

    const TEST_INTERVAL: Duration = Duration::from_millis(10);
    const RECV_TIMEOUT: Duration = Duration::from_secs(2);

    const REFERENCE_FRAME: [u8; 7] = [0x00, 0x01, 0x00, 0x02, 0x10, 0xFF, 0xF0];
    const REFERENCE_ACCEL: Acceleration = Acceleration { x: 16, y: 33, z: -1 };

    fn ready_sensor(platform: &MockPlatform) -> Mma8452q<crate::bus::mock::MockBus> {
        let mut sensor = Mma8452q::from_bus(platform.bus(0x1C), ControllerId::new(1, "/dev/i2c-1"));
        sensor.initialize().unwrap();
        sensor
    }

    fn recv(rx: &Receiver<SensorEvent>) -> SensorEvent {
        rx.recv_timeout(RECV_TIMEOUT).unwrap()
    }

    #[test]
    fn test_event_status_tags() {
        assert_eq!(SensorEvent::Reading(REFERENCE_ACCEL).status(), Some(PollStatus::Running));
        assert_eq!(SensorEvent::Error("x".into()).status(), Some(PollStatus::Failed));
        assert_eq!(SensorEvent::Status("x".into()).status(), None);
        assert_eq!(SensorEvent::Halted("x".into()).status(), None);
    }

    #[test]
    fn test_tick_emits_reading() {
        let platform = MockPlatform::new();
        platform.push_frame(&REFERENCE_FRAME);
        let (tx, rx) = mpsc::channel();

        let mut worker = PollWorker::new(ready_sensor(&platform), tx);
        worker.tick().unwrap();

        assert_eq!(rx.try_recv().unwrap(), SensorEvent::Reading(REFERENCE_ACCEL));
    }

    #[test]
    fn test_failed_tick_does_not_stop_next_tick() {
        let platform = MockPlatform::new();
        platform.push_read_error("Remote I/O error");
        platform.push_frame(&REFERENCE_FRAME);
        let (tx, rx) = mpsc::channel();

        let mut worker = PollWorker::new(ready_sensor(&platform), tx);
        worker.tick().unwrap();
        worker.tick().unwrap();
        drop(worker);

        let events: Vec<SensorEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            SensorEvent::Error(text) => {
                assert!(text.starts_with("Failed to read from 3-Axis Digital Accelerometer"));
                assert!(text.contains("Remote I/O error"));
            }
            other => panic!("expected error event, got {:?}", other),
        }
        assert_eq!(events[1], SensorEvent::Reading(REFERENCE_ACCEL));
    }

    #[test]
    fn test_run_with_stop_already_set_issues_no_transaction() {
        let platform = MockPlatform::new();
        let (tx, rx) = mpsc::channel();
        let stop = AtomicBool::new(true);

        PollWorker::new(ready_sensor(&platform), tx).run(&stop, TEST_INTERVAL);

        assert!(rx.try_recv().is_err());
        assert_eq!(platform.read_count(), 0);
        assert_eq!(platform.close_count(), 1);
    }

    #[test]
    fn test_start_end_to_end() {
        let platform = MockPlatform::new();
        platform.push_frame(&REFERENCE_FRAME);
        platform.push_read_error("arbitration lost");
        platform.push_frame(&REFERENCE_FRAME);
        let (tx, rx) = mpsc::channel();

        let poller = PollingLoop::start_with_interval(platform.clone(), tx, TEST_INTERVAL);

        assert_eq!(recv(&rx), SensorEvent::Status(DEVICE_LABEL.to_string()));
        assert_eq!(recv(&rx), SensorEvent::Reading(REFERENCE_ACCEL));
        assert!(matches!(recv(&rx), SensorEvent::Error(_)));
        assert_eq!(recv(&rx), SensorEvent::Reading(REFERENCE_ACCEL));

        poller.shutdown();

        let log = platform.transactions();
        assert_eq!(
            &log[1..4],
            &[
                I2cTransaction::Write { addr: 0x1C, data: vec![0x2A, 0x00] },
                I2cTransaction::Write { addr: 0x1C, data: vec![0x0E, 0x00] },
                I2cTransaction::Write { addr: 0x1C, data: vec![0x2A, 0x01] },
            ]
        );
        assert_eq!(log.last(), Some(&I2cTransaction::Close { addr: 0x1C }));
        assert_eq!(platform.close_count(), 1);
    }

    #[test]
    fn test_first_read_immediate_then_fixed_interval() {
        let platform = MockPlatform::new();
        platform.push_frame(&REFERENCE_FRAME);
        platform.push_frame(&REFERENCE_FRAME);
        let (tx, rx) = mpsc::channel();

        let started = Instant::now();
        let poller = PollingLoop::spawn(ready_sensor(&platform), tx).unwrap();

        assert_eq!(recv(&rx), SensorEvent::Reading(REFERENCE_ACCEL));
        let first = started.elapsed();
        assert_eq!(recv(&rx), SensorEvent::Reading(REFERENCE_ACCEL));
        let gap = started.elapsed() - first;
        poller.shutdown();

        assert!(first < Duration::from_millis(200), "first read after {:?}", first);
        assert!(gap >= POLL_INTERVAL.mul_f32(0.9), "second read after {:?}", gap);
        assert_eq!(platform.read_count(), 2);
        assert_eq!(platform.close_count(), 1);
    }

    #[test]
    fn test_spawn_rejects_uninitialized_driver() {
        let platform = MockPlatform::new();
        platform.push_frame(&REFERENCE_FRAME);
        let (tx, rx) = mpsc::channel();
        let sensor = Mma8452q::from_bus(platform.bus(0x1C), ControllerId::new(1, "/dev/i2c-1"));

        match PollingLoop::spawn(sensor, tx) {
            Err(Mma8452qError::NotReady(state)) => assert_eq!(state, DriverState::Uninitialized),
            Err(e) => panic!("expected NotReady, got {}", e),
            Ok(_) => panic!("uninitialized driver was polled"),
        }

        assert!(rx.try_recv().is_err());
        assert_eq!(platform.read_count(), 0);
        assert_eq!(platform.close_count(), 1);
    }

    #[test]
    fn test_shutdown_right_after_spawn() {
        let platform = MockPlatform::new();
        let (tx, _rx) = mpsc::channel();

        let poller = PollingLoop::spawn_with_interval(ready_sensor(&platform), tx, POLL_INTERVAL)
                .unwrap();
        poller.shutdown();

        let log = platform.transactions();
        assert_eq!(platform.close_count(), 1);
        assert_eq!(log.last(), Some(&I2cTransaction::Close { addr: 0x1C }));
        assert!(platform.read_count() <= 1);
    }

    #[test]
    fn test_no_controller_reports_halted_and_never_polls() {
        let platform = MockPlatform::with_controllers(Vec::new());
        let (tx, rx) = mpsc::channel();

        let poller = PollingLoop::start_with_interval(platform.clone(), tx, TEST_INTERVAL);
        assert_eq!(
            recv(&rx),
            SensorEvent::Halted("No I2C controllers were found on the system".to_string())
        );
        poller.shutdown();

        assert!(rx.try_recv().is_err());
        assert!(platform.transactions().is_empty());
    }

    #[test]
    fn test_address_in_use_reports_halted() {
        let platform = MockPlatform::new().address_in_use();
        let (tx, rx) = mpsc::channel();

        let poller = PollingLoop::start_with_interval(platform.clone(), tx, TEST_INTERVAL);
        match recv(&rx) {
            SensorEvent::Halted(text) => assert!(text.contains("currently in use")),
            other => panic!("expected halted event, got {:?}", other),
        }
        poller.shutdown();
        assert_eq!(platform.read_count(), 0);
    }

    #[test]
    fn test_init_failure_releases_handle_and_never_polls() {
        let platform = MockPlatform::new().fail_write(0, "NACK");
        let (tx, rx) = mpsc::channel();

        let poller = PollingLoop::start_with_interval(platform.clone(), tx, TEST_INTERVAL);
        match recv(&rx) {
            SensorEvent::Halted(text) => {
                assert!(text.starts_with("Failed to communicate with device"));
                assert!(text.contains("NACK"));
            }
            other => panic!("expected halted event, got {:?}", other),
        }
        poller.shutdown();

        assert_eq!(platform.writes().len(), 1);
        assert_eq!(platform.read_count(), 0);
        assert_eq!(platform.close_count(), 1);
    }

    #[test]
    fn test_dropped_receiver_stops_worker() {
        let platform = MockPlatform::new();
        platform.push_frame(&REFERENCE_FRAME);
        let (tx, rx) = mpsc::channel();
        drop(rx);

        let poller = PollingLoop::spawn_with_interval(ready_sensor(&platform), tx, TEST_INTERVAL)
                .unwrap();
        let deadline = Instant::now() + RECV_TIMEOUT;
        while poller.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!poller.is_running());
        poller.shutdown();

        assert_eq!(platform.read_count(), 1);
        assert_eq!(platform.close_count(), 1);
    }
}
