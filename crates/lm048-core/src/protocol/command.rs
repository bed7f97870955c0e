//! Protocol commands
//!
//! An LM048 command is plain ASCII text terminated by a carriage return,
//! paired with the number of payload lines its reply carries. The echo
//! and trailing prompt lines around the payload are framing, not payload,
//! and are counted by the session rather than the command.

use serde::{Deserialize, Serialize};

/// One request to the module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Command text without the terminating carriage return
    text: String,
    /// Number of payload lines in the reply
    reply_lines: usize,
}

impl Command {
    /// Create a command with an explicit reply-line count
    pub fn new(text: impl Into<String>, reply_lines: usize) -> Self {
        Self {
            text: text.into(),
            reply_lines,
        }
    }

    /// Liveness ping; the module answers `OK`
    pub fn ping() -> Self {
        Self::new("AT", 1)
    }

    /// Query the device's human-readable name
    pub fn device_name() -> Self {
        Self::new("AT+NAME?", 1)
    }

    /// Query command for a setting family, e.g. `AT+BAUD?`
    pub fn query(text: &str) -> Self {
        Self::new(text, 1)
    }

    /// Set command built from a codec token, e.g. `AT+BAUD13`
    pub fn set(token: &str) -> Self {
        Self::new(format!("AT+{token}"), 1)
    }

    /// Leave command mode and resume transparent data transfer
    pub fn return_to_data_mode() -> Self {
        Self::new("AT+AUTO", 1)
    }

    /// Command text as sent, without the terminator
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of payload lines expected in the reply
    pub fn reply_lines(&self) -> usize {
        self.reply_lines
    }

    /// Convert to bytes, appending the carriage return that terminates
    /// the module's line parser
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.text.as_bytes().to_vec();
        bytes.push(b'\r');
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_terminator() {
        assert_eq!(Command::ping().to_bytes(), b"AT\r".to_vec());
        assert_eq!(Command::device_name().to_bytes(), b"AT+NAME?\r".to_vec());
    }

    #[test]
    fn test_set_command_from_token() {
        let cmd = Command::set("BAUD13");
        assert_eq!(cmd.text(), "AT+BAUD13");
        assert_eq!(cmd.to_bytes(), b"AT+BAUD13\r".to_vec());
    }

    #[test]
    fn test_reply_line_counts() {
        assert_eq!(Command::ping().reply_lines(), 1);
        assert_eq!(Command::query("AT+BAUD?").reply_lines(), 1);
        assert_eq!(Command::new("AT+VER?", 2).reply_lines(), 2);
    }
}
