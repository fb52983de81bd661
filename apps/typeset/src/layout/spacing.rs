//! Horizontal offset accumulator for spacing commands.
//!
//! The sheet is typeset with the spacing commands in place, but the renderer draws each
//! glyph at its measured position and packs the line tighter than the sheet does. The
//! tracker shifts every glyph left by the spacing that has accumulated before it on the
//! current line. It must be driven in glyph index order.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpacingConfig {
    pub enabled: bool,
    /// Points added per spacing command.
    pub unit_pt: f32,
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            unit_pt: 3.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpacingTracker {
    config: SpacingConfig,
    running_offset: f32,
    threshold: f32,
}

impl SpacingTracker {
    pub fn new(config: SpacingConfig) -> Self {
        Self {
            config,
            running_offset: 0.0,
            threshold: f32::MIN,
        }
    }

    /// Returns the offset for the glyph at `anchor_x`, then updates state for the next.
    ///
    /// An `anchor_x` left of the previous glyph starts a new line and clears the
    /// accumulated offset.
    pub fn offset(&mut self, anchor_x: f32, spacer_after: bool) -> f32 {
        if !self.config.enabled {
            return 0.0;
        }

        let applied = -self.running_offset;
        if anchor_x < self.threshold {
            self.running_offset = 0.0;
        }
        self.threshold = anchor_x;
        if spacer_after {
            self.running_offset += self.config.unit_pt;
        }
        applied
    }

    /// Spacing accumulated so far on the current line.
    pub fn running_offset(&self) -> f32 {
        self.running_offset
    }
}
