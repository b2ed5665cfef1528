//! The robot session: one driver, one movement journal.
//!
//! [`RobotSession`] is the unit of ownership for everything stateful. It is
//! created once by the top-level process, handed to the HTTP facade behind a
//! mutex, and holds its journal for the whole session lifetime. It decides
//! which drivetrain calls are tracked; the choreography scripts themselves
//! never touch the journal.

use crate::actions;
use crate::driver::{DashDriver, DriverError};
use crate::stack::{Movement, MovementStack};

pub struct RobotSession {
    driver: Box<dyn DashDriver>,
    stack: MovementStack,
    connected: bool,
}

impl RobotSession {
    /// Wraps a driver in a fresh session with an empty journal.
    pub fn new(driver: Box<dyn DashDriver>) -> Self {
        Self {
            driver,
            stack: MovementStack::new(),
            connected: false,
        }
    }

    /// Connects with retries (see [`actions::connect`]).
    pub async fn connect(&mut self) -> Result<(), DriverError> {
        actions::connect(self.driver.as_mut()).await?;
        self.connected = true;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Runs the thinking choreography.
    pub async fn think(&mut self) -> Result<(), DriverError> {
        actions::think(self.driver.as_mut()).await
    }

    /// Reacts to a found answer in the given color.
    pub async fn find_answer(&mut self, color: &str) -> Result<(), DriverError> {
        actions::found_answer(self.driver.as_mut(), color).await
    }

    pub async fn celebrate(&mut self) -> Result<(), DriverError> {
        actions::celebrate(self.driver.as_mut()).await
    }

    pub async fn feel_sad(&mut self) -> Result<(), DriverError> {
        actions::feel_sad(self.driver.as_mut()).await
    }

    /// Drives the robot; with `track` the movement is journaled for rollback.
    pub async fn move_mm(
        &mut self,
        distance_mm: i32,
        speed_mmps: u32,
        no_turn: bool,
        track: bool,
    ) -> Result<(), DriverError> {
        let stack = track.then_some(&mut self.stack);
        actions::move_robot(self.driver.as_mut(), distance_mm, speed_mmps, no_turn, stack).await
    }

    /// Turns the robot; with `track` the turn is journaled for rollback.
    pub async fn turn(
        &mut self,
        angle_degrees: i32,
        speed_dps: u32,
        track: bool,
    ) -> Result<(), DriverError> {
        let stack = track.then_some(&mut self.stack);
        actions::turn(self.driver.as_mut(), angle_degrees, speed_dps, stack).await
    }

    pub async fn stop(&mut self) -> Result<(), DriverError> {
        self.driver.stop().await
    }

    pub async fn turn_all_lights(&mut self, color: &str) -> Result<(), DriverError> {
        actions::turn_all_lights(self.driver.as_mut(), color).await
    }

    /// Undoes every journaled movement in reverse order.
    pub async fn rollback(&mut self) -> Result<(), DriverError> {
        self.stack.rollback(self.driver.as_mut()).await
    }

    /// The journal in chronological push order.
    pub fn movement_history(&self) -> &[Movement] {
        self.stack.movements()
    }
}

impl std::fmt::Debug for RobotSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotSession")
            .field("connected", &self.connected)
            .field("journaled_movements", &self.stack.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DriverCall, MockDriver};
    use crate::stack::{ROLLBACK_MOVE_SPEED_MMPS, ROLLBACK_TURN_SPEED_DPS};

    #[tokio::test(start_paused = true)]
    async fn session_tracks_only_what_it_is_told_to() {
        let mut session = RobotSession::new(Box::new(MockDriver::new("test")));

        session.move_mm(100, 1000, true, true).await.expect("move");
        session.turn(90, 200, false).await.expect("turn");

        assert_eq!(session.movement_history(), &[Movement::Move(100)]);
    }

    #[tokio::test(start_paused = true)]
    async fn rollback_drains_the_journal_through_the_driver() {
        let observer = MockDriver::new("test");
        let mut session = RobotSession::new(Box::new(observer.clone()));

        session.move_mm(100, 1000, true, true).await.expect("move");
        session.turn(90, 200, true).await.expect("turn");
        observer.take_calls();

        session.rollback().await.expect("rollback");

        assert!(session.movement_history().is_empty());
        assert_eq!(
            observer.calls(),
            vec![
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
    async fn connect_flips_the_connected_flag() {
        let mut session = RobotSession::new(Box::new(MockDriver::new("test")));
        assert!(!session.is_connected());

        session.connect().await.expect("connect");
        assert!(session.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_connect_leaves_session_disconnected() {
        let mut session = RobotSession::new(Box::new(MockDriver::failing_connects("test", 10)));

        assert!(session.connect().await.is_err());
        assert!(!session.is_connected());
    }
}
