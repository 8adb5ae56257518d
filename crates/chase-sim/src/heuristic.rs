//! Manual control fallback
//!
//! Lets a human or scripted driver stand in for the policy: raw axis input
//! (keyboard, gamepad, or a test script) becomes an ordinary `Action`.

use serde::{Deserialize, Serialize};

use crate::types::Action;

/// Raw axis state, each in [-1, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualInput {
    /// Left/right, +1 is +X
    pub horizontal: f32,
    /// Down/up, +1 is +Z
    pub vertical: f32,
}

impl ManualInput {
    pub fn new(horizontal: f32, vertical: f32) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Build from digital keys (arrows or WASD)
    pub fn from_keys(left: bool, right: bool, down: bool, up: bool) -> Self {
        let axis = |neg: bool, pos: bool| (pos as i8 - neg as i8) as f32;
        Self::new(axis(left, right), axis(down, up))
    }

    pub fn to_action(self) -> Action {
        Action::new(
            self.horizontal.clamp(-1.0, 1.0),
            self.vertical.clamp(-1.0, 1.0),
        )
    }
}

impl From<ManualInput> for Action {
    fn from(input: ManualInput) -> Self {
        input.to_action()
    }
}
