//! Spoken movement commands
//!
//! The only command is `move <N> seconds`; everything else is freeform text
//! for the completion service.

use std::time::Duration;

use crate::{Error, Result};
use crate::robot::Robot;

/// A parsed transcript
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Drive forward for `duration` seconds (finite, strictly positive)
    Move {
        /// Seconds to drive
        duration: f64,
    },
    /// Anything that is not a well-formed move
    Freeform(String),
}

impl Command {
    /// Classify a transcript
    ///
    /// Matches when the first three whitespace-separated tokens are `move`,
    /// a number, and `seconds`; trailing tokens are ignored. A malformed,
    /// non-finite or non-positive number makes the whole transcript freeform.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let tokens: Vec<&str> = text.split_whitespace().collect();

        if let [first, amount, unit, ..] = tokens.as_slice()
            && *first == "move"
            && *unit == "seconds"
        {
            match amount.parse::<f64>() {
                Ok(duration) => match Self::moving(duration) {
                    Some(command) => return command,
                    None => tracing::warn!(duration, "move duration must be a positive number"),
                },
                Err(_) => tracing::warn!(amount = %amount, "invalid duration format"),
            }
        }

        Self::Freeform(text.to_string())
    }

    /// A move of `duration` seconds, if the duration is usable
    ///
    /// Rejects zero, negative, NaN and durations too large to sleep for.
    #[must_use]
    pub fn moving(duration: f64) -> Option<Self> {
        (duration > 0.0 && Duration::try_from_secs_f64(duration).is_ok())
            .then_some(Self::Move { duration })
    }
}

/// Drive forward at `linear_velocity` for `duration` seconds, then stop
///
/// Issues exactly two drive commands. Nothing else runs during the wait and
/// nothing confirms the robot actually moved.
///
/// # Errors
///
/// Returns `Error::Config` before anything is sent if `duration` is not a
/// positive number of seconds that fits a sleep, and propagates drive
/// delivery failures
pub async fn drive_for(robot: &dyn Robot, linear_velocity: f64, duration: f64) -> Result<()> {
    let wait = Duration::try_from_secs_f64(duration)
        .ok()
        .filter(|_| duration > 0.0)
        .ok_or_else(|| Error::Config(format!("invalid move duration: {duration}")))?;

    robot.drive(linear_velocity, 0.0).await?;
    tracing::info!(duration, "moving Misty forward");

    tokio::time::sleep(wait).await;

    robot.drive(0.0, 0.0).await?;
    tracing::info!("stopping Misty");
    Ok(())
}
