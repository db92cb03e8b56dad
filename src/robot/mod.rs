//! Robot control surface
//!
//! The loop only needs three things from the robot: a reachability check,
//! velocity commands and speech. [`MistyClient`] speaks Misty's REST API.

mod misty;

use async_trait::async_trait;

use crate::Result;

pub use misty::{MistyClient, PROBE_TIMEOUT};

/// Operations the conversation loop issues against a robot
#[async_trait(?Send)]
pub trait Robot {
    /// Check that the robot answers its device-info endpoint
    ///
    /// Every failure, including transport errors, reads as unreachable.
    async fn probe(&self) -> bool;

    /// Set a continuous velocity; zero/zero stops the robot
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be delivered
    async fn drive(&self, linear_velocity: f64, angular_velocity: f64) -> Result<()>;

    /// Speak `text`; `flush` interrupts any speech already playing
    ///
    /// Returns true only if the robot accepted the request.
    async fn speak(&self, text: &str, flush: bool) -> bool;
}
