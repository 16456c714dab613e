//! Buzzer do terminal: registra o tom e toca o sino do console.

use safety_core::ports::Feedback;
use std::io::{IsTerminal, Write};
use std::time::Duration;
use tracing::info;

pub struct TerminalBuzzer {
    bell: bool,
}

impl Default for TerminalBuzzer {
    /// Só toca o sino quando stderr é um terminal.
    fn default() -> Self {
        Self {
            bell: std::io::stderr().is_terminal(),
        }
    }
}

impl Feedback for TerminalBuzzer {
    fn emit_tone(&mut self, frequency_hz: u32, duration: Duration) {
        info!("Beep {frequency_hz} Hz por {} ms", duration.as_millis());
        if self.bell {
            let mut err = std::io::stderr();
            let _ = err.write_all(b"\x07").and_then(|()| err.flush());
        }
    }
}
