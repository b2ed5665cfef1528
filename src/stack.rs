//! The movement journal: an undo stack of tracked drivetrain commands.
//!
//! Every tracked move or turn pushes one [`Movement`] record; [`MovementStack::rollback`]
//! drains the journal in reverse, issuing one compensating hardware call per
//! record. The journal is purely logical: nothing ties it back to where the
//! robot physically ended up, and compensation is best-effort.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::driver::{DashDriver, DriverError};

/// Rotation speed used for compensating turns, in degrees per second.
pub const ROLLBACK_TURN_SPEED_DPS: u32 = 50;
/// Drive speed used for compensating moves, in millimeters per second.
pub const ROLLBACK_MOVE_SPEED_MMPS: u32 = 200;
/// Pause after each compensating call, letting the robot settle before the
/// next one is issued.
pub const ROLLBACK_SETTLE: Duration = Duration::from_millis(500);

/// One journaled, compensable robot action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Movement {
    /// Signed drive distance in millimeters (positive = forward).
    Move(i32),
    /// Signed turn angle in degrees (positive = counterclockwise).
    Turn(i32),
}

/// Popping from a journal with no entries. Non-fatal; callers either check
/// [`MovementStack::is_empty`] first or handle this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("movement stack is empty")]
pub struct EmptyStack;

/// Ordered journal of tracked movements, oldest first.
///
/// No internal locking: the stack expects a single caller serializing all
/// access, in practice the session mutex held for the duration of an action.
/// A push interleaved between the steps of an in-progress rollback (possible
/// only if the caller drops and retakes that exclusive access mid-rollback)
/// may or may not be consumed by it; the ordering is undefined and left that
/// way on purpose.
#[derive(Debug, Default)]
pub struct MovementStack {
    movements: Vec<Movement>,
}

impl MovementStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a movement. Always succeeds.
    pub fn push(&mut self, movement: Movement) {
        debug!(?movement, "journal push");
        self.movements.push(movement);
    }

    /// Removes and returns the most recently pushed movement.
    pub fn pop(&mut self) -> Result<Movement, EmptyStack> {
        self.movements.pop().ok_or(EmptyStack)
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.movements.len()
    }

    /// The journal in chronological push order.
    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    /// Undoes every journaled movement, last pushed first.
    ///
    /// Each record costs exactly one driver call: a turn is compensated by
    /// turning the negated angle at [`ROLLBACK_TURN_SPEED_DPS`], a move by
    /// driving the negated distance at [`ROLLBACK_MOVE_SPEED_MMPS`] with
    /// heading correction suppressed. After each call the stack waits
    /// [`ROLLBACK_SETTLE`] before the next. Driver failures propagate
    /// immediately, leaving the not-yet-compensated remainder journaled.
    pub async fn rollback(&mut self, driver: &mut dyn DashDriver) -> Result<(), DriverError> {
        while let Ok(movement) = self.pop() {
            debug!(?movement, "compensating");
            match movement {
                Movement::Turn(angle) => {
                    driver.turn(-angle, ROLLBACK_TURN_SPEED_DPS).await?;
                }
                Movement::Move(distance) => {
                    driver
                        .move_mm(-distance, ROLLBACK_MOVE_SPEED_MMPS, true)
                        .await?;
                }
            }
            tokio::time::sleep(ROLLBACK_SETTLE).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DriverCall, MockDriver};

    #[test]
    fn pop_on_empty_signals_and_does_not_mutate() {
        let mut stack = MovementStack::new();
        assert_eq!(stack.pop(), Err(EmptyStack));
        assert!(stack.is_empty());
        assert_eq!(stack.len(), 0);
    }

    #[test]
    fn push_preserves_chronological_order() {
        let mut stack = MovementStack::new();
        stack.push(Movement::Move(100));
        stack.push(Movement::Turn(90));

        assert_eq!(stack.movements(), &[Movement::Move(100), Movement::Turn(90)]);
        assert_eq!(stack.pop(), Ok(Movement::Turn(90)));
        assert_eq!(stack.pop(), Ok(Movement::Move(100)));
    }

    #[tokio::test(start_paused = true)]
    async fn rollback_compensates_in_reverse_with_fixed_policy() {
        let observer = MockDriver::new("test");
        let mut driver = observer.clone();

        let mut stack = MovementStack::new();
        stack.push(Movement::Move(100));
        stack.push(Movement::Turn(90));
        stack.push(Movement::Move(-50));

        stack.rollback(&mut driver).await.expect("rollback");

        assert!(stack.is_empty());
        assert_eq!(
            observer.calls(),
            vec![
                DriverCall::Move {
                    distance_mm: 50,
                    speed_mmps: ROLLBACK_MOVE_SPEED_MMPS,
                    no_turn: true
                },
                DriverCall::Turn {
                    degrees: -90,
                    speed_dps: ROLLBACK_TURN_SPEED_DPS
                },
                DriverCall::Move {
                    distance_mm: -100,
                    speed_mmps: ROLLBACK_MOVE_SPEED_MMPS,
                    no_turn: true
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rollback_issues_one_call_per_push() {
        let observer = MockDriver::new("test");
        let mut driver = observer.clone();

        let mut stack = MovementStack::new();
        for i in 1..=7 {
            stack.push(Movement::Turn(i * 10));
        }
        stack.rollback(&mut driver).await.expect("rollback");

        let calls = observer.calls();
        assert_eq!(calls.len(), 7);
        for (i, call) in calls.iter().enumerate() {
            // Reverse order: the seventh push (70 degrees) is undone first.
            assert_eq!(
                call,
                &DriverCall::Turn {
                    degrees: -(7 - i as i32) * 10,
                    speed_dps: ROLLBACK_TURN_SPEED_DPS
                }
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rollback_on_empty_issues_no_calls() {
        let observer = MockDriver::new("test");
        let mut driver = observer.clone();

        let mut stack = MovementStack::new();
        stack.rollback(&mut driver).await.expect("rollback");

        assert!(observer.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn journal_is_empty_after_complete_rollback() {
        let mut driver = MockDriver::new("test");
        let mut stack = MovementStack::new();
        stack.push(Movement::Turn(45));
        stack.push(Movement::Move(10));

        stack.rollback(&mut driver).await.expect("rollback");
        assert!(stack.is_empty());
    }
}
