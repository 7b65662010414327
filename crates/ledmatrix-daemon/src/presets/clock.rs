//! Clock preset.
//!
//! Shows the local time as `HH:MM`. Five glyphs fit the matrix, which is
//! exactly four digits and the colon.

use chrono::{Local, NaiveTime};
use ledmatrix_hw::{LedMatrix, Preset};

/// Draws the current local time on every tick.
#[derive(Debug, Default)]
pub struct Clock;

/// Text drawn for a given time of day.
pub fn clock_text(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

impl Preset for Clock {
    fn id(&self) -> &str {
        "clock"
    }

    fn name(&self) -> &str {
        "Clock"
    }

    fn render(&mut self, matrix: &mut LedMatrix) {
        matrix.draw_text(&clock_text(Local::now().time()));
    }
}
