//! Hardware driver seam.
//!
//! The vendor transport (Bluetooth LE in the field) sits behind [`DashDriver`],
//! an async contract covering every primitive the choreography layer uses:
//! drivetrain, head servos, the 12-LED eye ring, color LEDs, and the speaker.
//! Each call is fire-and-forget from the caller's point of view: it either
//! completes or fails synchronously, and nothing reads back physical state.
//!
//! [`MockDriver`] is the in-tree implementation: it logs and records every
//! call, which is what the tests assert against and what the bridge daemon
//! runs on when no vendor transport is linked.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

/// Errors surfaced by a hardware driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The transport could not reach the robot.
    #[error("could not connect to the robot: {0}")]
    ConnectFailed(String),

    /// A command was sent but the transport reported a failure.
    #[error("hardware command failed: {0}")]
    CommandFailed(String),

    /// A command was issued before any connection was established.
    #[error("robot is not connected")]
    NotConnected,
}

/// The contract a hardware transport must implement.
///
/// Methods take `&mut self`: the physical robot is a single exclusive device
/// and drivers are expected to be held behind one session lock, never shared.
#[async_trait]
pub trait DashDriver: Send + Sync {
    /// Establishes the transport link. One attempt; retries live in the
    /// action layer.
    async fn connect(&mut self) -> Result<(), DriverError>;

    /// Resets pose and lights to the power-on state.
    async fn reset(&mut self) -> Result<(), DriverError>;

    /// Halts all drivetrain movement.
    async fn stop(&mut self) -> Result<(), DriverError>;

    /// Drives `distance_mm` millimeters (negative = backward) at
    /// `speed_mmps`. `no_turn` suppresses the heading correction the firmware
    /// otherwise applies when reversing.
    async fn move_mm(
        &mut self,
        distance_mm: i32,
        speed_mmps: u32,
        no_turn: bool,
    ) -> Result<(), DriverError>;

    /// Turns in place by `degrees` (positive = counterclockwise) at
    /// `speed_dps` degrees per second.
    async fn turn(&mut self, degrees: i32, speed_dps: u32) -> Result<(), DriverError>;

    /// Pans the head. Usable range is roughly -53..=53 degrees.
    async fn head_yaw(&mut self, degrees: i32) -> Result<(), DriverError>;

    /// Tilts the head. Usable range is roughly -53..=53 degrees.
    async fn head_pitch(&mut self, degrees: i32) -> Result<(), DriverError>;

    /// Lights the eye ring; one bit per LED, 12 LEDs total.
    async fn eye(&mut self, led_mask: u16) -> Result<(), DriverError>;

    /// Sets eye ring brightness (0..=255).
    async fn eye_brightness(&mut self, level: u8) -> Result<(), DriverError>;

    /// Sets the neck LED to a CSS color name or hex code.
    async fn neck_color(&mut self, color: &str) -> Result<(), DriverError>;

    async fn left_ear_color(&mut self, color: &str) -> Result<(), DriverError>;

    async fn right_ear_color(&mut self, color: &str) -> Result<(), DriverError>;

    /// Plays a built-in sound clip at `volume` in 0.0..=1.0.
    async fn say(&mut self, sound: &str, volume: f32) -> Result<(), DriverError>;
}

/// One recorded driver invocation, as captured by [`MockDriver`].
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Connect,
    Reset,
    Stop,
    Move {
        distance_mm: i32,
        speed_mmps: u32,
        no_turn: bool,
    },
    Turn {
        degrees: i32,
        speed_dps: u32,
    },
    HeadYaw(i32),
    HeadPitch(i32),
    Eye(u16),
    EyeBrightness(u8),
    NeckColor(String),
    LeftEarColor(String),
    RightEarColor(String),
    Say {
        sound: String,
        volume: f32,
    },
}

/// A call-recording driver.
///
/// The call log lives behind an `Arc`, so a clone taken before boxing the
/// driver into a session keeps observing everything the session does with it.
#[derive(Clone, Default)]
pub struct MockDriver {
    address: String,
    calls: Arc<Mutex<Vec<DriverCall>>>,
    /// Number of upcoming `connect` calls that should fail.
    failing_connects: Arc<AtomicU32>,
}

impl MockDriver {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// A mock whose next `count` connect attempts fail with
    /// [`DriverError::ConnectFailed`].
    pub fn failing_connects(address: impl Into<String>, count: u32) -> Self {
        let driver = Self::new(address);
        driver.failing_connects.store(count, Ordering::SeqCst);
        driver
    }

    /// Snapshot of every call recorded so far, in issue order.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls.lock().expect("mock driver call log poisoned").clone()
    }

    /// Drains the call log.
    pub fn take_calls(&self) -> Vec<DriverCall> {
        std::mem::take(&mut *self.calls.lock().expect("mock driver call log poisoned"))
    }

    fn record(&self, call: DriverCall) -> Result<(), DriverError> {
        debug!(address = %self.address, ?call, "mock driver");
        self.calls
            .lock()
            .expect("mock driver call log poisoned")
            .push(call);
        Ok(())
    }
}

#[async_trait]
impl DashDriver for MockDriver {
    async fn connect(&mut self) -> Result<(), DriverError> {
        let remaining = self.failing_connects.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_connects.store(remaining - 1, Ordering::SeqCst);
            return Err(DriverError::ConnectFailed(format!(
                "simulated link failure to {}",
                self.address
            )));
        }
        self.record(DriverCall::Connect)
    }

    async fn reset(&mut self) -> Result<(), DriverError> {
        self.record(DriverCall::Reset)
    }

    async fn stop(&mut self) -> Result<(), DriverError> {
        self.record(DriverCall::Stop)
    }

    async fn move_mm(
        &mut self,
        distance_mm: i32,
        speed_mmps: u32,
        no_turn: bool,
    ) -> Result<(), DriverError> {
        self.record(DriverCall::Move {
            distance_mm,
            speed_mmps,
            no_turn,
        })
    }

    async fn turn(&mut self, degrees: i32, speed_dps: u32) -> Result<(), DriverError> {
        self.record(DriverCall::Turn { degrees, speed_dps })
    }

    async fn head_yaw(&mut self, degrees: i32) -> Result<(), DriverError> {
        self.record(DriverCall::HeadYaw(degrees))
    }

    async fn head_pitch(&mut self, degrees: i32) -> Result<(), DriverError> {
        self.record(DriverCall::HeadPitch(degrees))
    }

    async fn eye(&mut self, led_mask: u16) -> Result<(), DriverError> {
        self.record(DriverCall::Eye(led_mask))
    }

    async fn eye_brightness(&mut self, level: u8) -> Result<(), DriverError> {
        self.record(DriverCall::EyeBrightness(level))
    }

    async fn neck_color(&mut self, color: &str) -> Result<(), DriverError> {
        self.record(DriverCall::NeckColor(color.to_string()))
    }

    async fn left_ear_color(&mut self, color: &str) -> Result<(), DriverError> {
        self.record(DriverCall::LeftEarColor(color.to_string()))
    }

    async fn right_ear_color(&mut self, color: &str) -> Result<(), DriverError> {
        self.record(DriverCall::RightEarColor(color.to_string()))
    }

    async fn say(&mut self, sound: &str, volume: f32) -> Result<(), DriverError> {
        self.record(DriverCall::Say {
            sound: sound.to_string(),
            volume,
        })
    }
}

impl std::fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDriver")
            .field("address", &self.address)
            .field("recorded_calls", &self.calls().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_records_calls_in_issue_order() {
        let mut driver = MockDriver::new("AA:BB");
        driver.turn(90, 200).await.expect("turn");
        driver.move_mm(-50, 1000, true).await.expect("move");

        assert_eq!(
            driver.calls(),
            vec![
                DriverCall::Turn {
                    degrees: 90,
                    speed_dps: 200
                },
                DriverCall::Move {
                    distance_mm: -50,
                    speed_mmps: 1000,
                    no_turn: true
                },
            ]
        );
    }

    #[tokio::test]
    async fn injected_connect_failures_are_consumed_in_order() {
        let mut driver = MockDriver::failing_connects("AA:BB", 2);

        assert!(driver.connect().await.is_err());
        assert!(driver.connect().await.is_err());
        driver.connect().await.expect("third attempt succeeds");
        assert_eq!(driver.calls(), vec![DriverCall::Connect]);
    }

    #[tokio::test]
    async fn clones_share_one_call_log() {
        let observer = MockDriver::new("AA:BB");
        let mut held = observer.clone();
        held.stop().await.expect("stop");

        assert_eq!(observer.calls(), vec![DriverCall::Stop]);
    }
}
