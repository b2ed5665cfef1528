//! Choreography scripts.
//!
//! Each script is a fixed, linear, timed sequence of driver calls: no
//! conditionals beyond fixed loops, no feedback from the robot. Timing is
//! best-effort (`tokio::time::sleep`), which is all the toy hardware
//! warrants. The tracked variants of [`move_robot`] and [`turn`] are the only
//! entry points that feed the movement journal.

use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::driver::{DashDriver, DriverError};
use crate::stack::{Movement, MovementStack};

/// Colors the answer-suggestion flow is allowed to pick from.
pub const AVAILABLE_COLORS: &[&str] = &[
    "red",
    "green",
    "blue",
    "white",
    "fuchsia",
    "darkorange",
];

/// Default drive speed in millimeters per second.
pub const DEFAULT_MOVE_SPEED_MMPS: u32 = 1000;
/// Default turn speed in degrees per second.
pub const DEFAULT_TURN_SPEED_DPS: u32 = 200;

// Head sweep limits while thinking.
const HEAD_YAW_LEFT: i32 = -15;
const HEAD_YAW_RIGHT: i32 = 15;

const ALL_EYE_LEDS: u16 = 0b1111_1111_1111;

const THINKING_SOUNDS: &[&str] = &["confused2", "confused3", "confused5", "confused8"];
const EXCITED_SOUNDS: &[&str] = &[
    "systexcited_01",
    "systexcited_02",
    "systexcited_06",
    "systfantastic",
];
const SAD_SOUNDS: &[&str] = &[
    "systawww_04",
    "systoh_no_unh",
    "systnot_good",
    "systnotthatone",
    "systoops_03",
];

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

fn random_sound(sounds: &'static [&'static str]) -> &'static str {
    sounds
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("confused2")
}

async fn millis(ms: u64) {
    sleep(Duration::from_millis(ms)).await;
}

/// Connects to the robot, retrying up to five times two seconds apart.
///
/// On success the robot is reset and given its bring-up look (blue neck,
/// dim eyes). On exhaustion the drivetrain is stopped and the last failure
/// is reported as [`DriverError::ConnectFailed`].
pub async fn connect(driver: &mut dyn DashDriver) -> Result<(), DriverError> {
    for attempt in 1..=CONNECT_ATTEMPTS {
        match try_connect(driver).await {
            Ok(()) => {
                info!("connected to the robot");
                return Ok(());
            }
            Err(err) => {
                warn!(attempt, %err, "connect attempt failed");
                sleep(CONNECT_RETRY_DELAY).await;
            }
        }
    }
    driver.stop().await?;
    Err(DriverError::ConnectFailed(
        "gave up after multiple attempts".to_string(),
    ))
}

async fn try_connect(driver: &mut dyn DashDriver) -> Result<(), DriverError> {
    driver.connect().await?;
    driver.reset().await?;
    // TODO drop the bring-up look once classroom field testing wraps up.
    driver.neck_color("blue").await?;
    driver.eye_brightness(5).await?;
    Ok(())
}

/// Drives the robot, journaling the movement if a stack is supplied.
pub async fn move_robot(
    driver: &mut dyn DashDriver,
    distance_mm: i32,
    speed_mmps: u32,
    no_turn: bool,
    stack: Option<&mut MovementStack>,
) -> Result<(), DriverError> {
    driver.move_mm(distance_mm, speed_mmps, no_turn).await?;
    if let Some(stack) = stack {
        stack.push(Movement::Move(distance_mm));
    }
    Ok(())
}

/// Turns the robot, journaling the turn if a stack is supplied.
pub async fn turn(
    driver: &mut dyn DashDriver,
    angle_degrees: i32,
    speed_dps: u32,
    stack: Option<&mut MovementStack>,
) -> Result<(), DriverError> {
    driver.turn(angle_degrees, speed_dps).await?;
    if let Some(stack) = stack {
        stack.push(Movement::Turn(angle_degrees));
    }
    Ok(())
}

/// Thinking animation: a head sweep from left to right while the eye ring
/// fills in one LED at a time, with small forward/backward shuffles and the
/// occasional confused noise. Ends with lights off and the head centered.
pub async fn think(driver: &mut dyn DashDriver) -> Result<(), DriverError> {
    turn_off_lights(driver).await?;
    driver.say(random_sound(THINKING_SOUNDS), 1.0).await?;
    millis(100).await;

    driver.head_yaw(HEAD_YAW_LEFT).await?;
    millis(100).await;

    let mut led_mask: u16 = 0;
    for i in 0..12 {
        led_mask |= 1 << i;
        driver.eye(led_mask).await?;
        millis(200).await;

        if i % 6 == 0 {
            // Sweep position 0..=3 mapped across the yaw range.
            let head_position_index = i / 3;
            let yaw = HEAD_YAW_LEFT
                + head_position_index * (HEAD_YAW_RIGHT - HEAD_YAW_LEFT) / 3;
            driver.head_yaw(yaw).await?;
            driver.say(random_sound(THINKING_SOUNDS), 1.0).await?;
            millis(100).await;
        }

        if i % 2 == 0 {
            driver.move_mm(25, 200, true).await?;
            millis(800).await;
            driver.head_pitch(5).await?;
            millis(100).await;
            driver.head_pitch(-2).await?;
            millis(100).await;
            driver.head_pitch(0).await?;
            millis(100).await;
        } else {
            driver.move_mm(-25, 200, true).await?;
            millis(800).await;
        }
    }

    driver.eye(0).await?;
    driver.head_yaw(0).await?;
    driver.head_pitch(0).await?;
    Ok(())
}

/// Happy reaction to a found answer: everything lights up in the answer
/// color, a full spin, a look around, a nodding burst, then lights off.
pub async fn found_answer(driver: &mut dyn DashDriver, color: &str) -> Result<(), DriverError> {
    driver.eye(ALL_EYE_LEDS).await?;
    driver.head_yaw(0).await?;
    driver.head_pitch(0).await?;
    turn_all_lights(driver, color).await?;
    driver.say("bragging", 1.0).await?;
    driver.turn(180, 100).await?;
    millis(200).await;

    driver.turn(90, 50).await?;
    driver.head_yaw(-16).await?;
    millis(300).await;
    driver.head_yaw(16).await?;
    driver.turn(-90, 50).await?;

    millis(500).await;
    driver.move_mm(25, 200, true).await?;
    millis(500).await;

    // Happy nodding.
    driver.turn(45, 50).await?;
    millis(100).await;
    driver.head_pitch(-53).await?;
    millis(100).await;
    driver.head_pitch(53).await?;
    millis(100).await;
    driver.head_pitch(-53).await?;
    millis(100).await;
    driver.head_pitch(53).await?;
    millis(100).await;
    driver.turn(-45, 50).await?;

    millis(300).await;
    driver.move_mm(-25, 200, true).await?;
    millis(300).await;

    // Hold the answer color a moment longer before going dark.
    millis(1000).await;
    turn_off_lights(driver).await?;
    Ok(())
}

/// Two alternating full spins with head flourishes and excited noises.
pub async fn celebrate(driver: &mut dyn DashDriver) -> Result<(), DriverError> {
    const LEFT: i32 = -53;
    const RIGHT: i32 = -20;
    const UP: i32 = 5;
    const DOWN: i32 = -3;
    const SPIN: i32 = 180;
    const SPIN_SPEED: u32 = 200;
    const BEAT_MS: u64 = 200;

    driver.head_yaw(0).await?;
    driver.head_pitch(0).await?;
    millis(100).await;

    for i in 0..2 {
        if i % 2 == 0 {
            driver.say(random_sound(EXCITED_SOUNDS), 0.5).await?;
            driver.turn(SPIN, SPIN_SPEED).await?;
        } else {
            driver.turn(-SPIN, SPIN_SPEED).await?;
        }

        driver.head_yaw(LEFT).await?;
        driver.head_pitch(DOWN).await?;
        millis(BEAT_MS).await;

        driver.head_yaw(RIGHT).await?;
        driver.head_pitch(UP).await?;
        millis(BEAT_MS).await;

        driver.head_yaw(0).await?;
        driver.head_pitch(0).await?;
        millis(BEAT_MS).await;

        driver.head_yaw(RIGHT).await?;
        driver.head_pitch(DOWN).await?;
        millis(BEAT_MS).await;

        driver.head_yaw(LEFT).await?;
        driver.head_pitch(UP).await?;
        millis(BEAT_MS).await;
    }

    driver.head_yaw(0).await?;
    driver.head_pitch(0).await?;

    millis(200).await;
    driver.turn(-170, 50).await?;
    Ok(())
}

/// Sad reaction: red lights, a head-shake "no", a downcast look, two sad
/// noises, then back to neutral.
pub async fn feel_sad(driver: &mut dyn DashDriver) -> Result<(), DriverError> {
    turn_all_lights(driver, "red").await?;
    driver.head_pitch(5).await?;
    driver.head_yaw(0).await?;
    driver.say(random_sound(SAD_SOUNDS), 0.5).await?;
    turn_off_lights(driver).await?;
    millis(1000).await;

    // Shake head "no".
    turn_all_lights(driver, "red").await?;
    driver.head_yaw(-15).await?;
    millis(500).await;
    driver.head_yaw(15).await?;
    millis(500).await;
    turn_off_lights(driver).await?;
    driver.head_yaw(0).await?;

    // Look down.
    turn_all_lights(driver, "red").await?;
    driver.head_pitch(-5).await?;
    millis(2500).await;
    driver.say(random_sound(SAD_SOUNDS), 0.5).await?;
    turn_off_lights(driver).await?;

    driver.head_yaw(0).await?;
    millis(200).await;
    driver.turn(-170, 50).await?;
    Ok(())
}

/// Full eye ring plus neck and right ear in `color`. The left ear LED is
/// deliberately left alone.
pub async fn turn_all_lights(driver: &mut dyn DashDriver, color: &str) -> Result<(), DriverError> {
    driver.eye(ALL_EYE_LEDS).await?;
    driver.neck_color(color).await?;
    driver.right_ear_color(color).await?;
    Ok(())
}

/// All lights off.
pub async fn turn_off_lights(driver: &mut dyn DashDriver) -> Result<(), DriverError> {
    driver.eye(0).await?;
    driver.neck_color("black").await?;
    driver.left_ear_color("black").await?;
    driver.right_ear_color("black").await?;
    Ok(())
}
