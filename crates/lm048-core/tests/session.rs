use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;

use lm048_core::protocol::{
    BaudRate, Command, FlowControl, Parity, ProtocolError, Session, SessionConfig, StopBits,
    Transport,
};

#[derive(Default)]
struct MockState {
    /// Bytes served to `read_exact` (the wake acknowledgement)
    raw: VecDeque<u8>,
    /// Whole lines served to `read_line`, stored with their newline
    lines: VecDeque<String>,
    /// One entry per `write_all` call
    written: Vec<Vec<u8>>,
    clear_calls: usize,
    close_calls: usize,
    closed: bool,
}

/// Simulated transport for driving the session without hardware.
///
/// Cloned handles share state, so tests keep one clone to queue replies
/// and inspect writes after the session has taken ownership of the other.
#[derive(Clone, Default)]
struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    fn new() -> Self {
        Self::default()
    }

    fn push_raw(&self, bytes: &[u8]) {
        self.state.lock().unwrap().raw.extend(bytes.iter().copied());
    }

    fn push_lines(&self, lines: &[&str]) {
        let mut state = self.state.lock().unwrap();
        for line in lines {
            state.lines.push_back(format!("{line}\r\n"));
        }
    }

    fn written(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().written.clone()
    }

    fn clear_calls(&self) -> usize {
        self.state.lock().unwrap().clear_calls
    }

    fn close_calls(&self) -> usize {
        self.state.lock().unwrap().close_calls
    }
}

impl Transport for MockTransport {
    fn write_all(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(ProtocolError::NotConnected);
        }
        state.written.push(data.to_vec());
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ProtocolError> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(ProtocolError::NotConnected);
        }
        if state.raw.len() < buf.len() {
            // Short read: whatever arrived before the timeout is lost
            return Err(ProtocolError::Timeout);
        }
        for slot in buf.iter_mut() {
            *slot = state.raw.pop_front().unwrap();
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, ProtocolError> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(ProtocolError::NotConnected);
        }
        state.lines.pop_front().ok_or(ProtocolError::Timeout)
    }

    fn clear_input(&mut self) -> Result<(), ProtocolError> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(ProtocolError::NotConnected);
        }
        state.clear_calls += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), ProtocolError> {
        let mut state = self.state.lock().unwrap();
        state.close_calls += 1;
        state.closed = true;
        Ok(())
    }
}

fn test_config() -> SessionConfig {
    SessionConfig {
        settle_delay: Duration::ZERO,
        read_timeout: Duration::from_millis(50),
        ..SessionConfig::default()
    }
}

/// Mock pre-loaded with a correct wake acknowledgement and ping reply
fn handshake_mock() -> MockTransport {
    let mock = MockTransport::new();
    mock.push_raw(&[0xBB, 0xAA]);
    mock.push_lines(&["AT", "OK", ""]);
    mock
}

#[test]
fn test_handshake_succeeds() {
    let mock = handshake_mock();
    let session = Session::establish(mock.clone(), test_config());
    assert!(session.is_ok());

    let written = mock.written();
    assert_eq!(
        written[0],
        vec![0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0x0D]
    );
    assert_eq!(written[1], b"AT\r".to_vec());
}

#[test]
fn test_handshake_rejects_wrong_ack() {
    let mock = MockTransport::new();
    mock.push_raw(&[0xAA, 0xBB]); // bytes swapped

    let result = Session::establish(mock.clone(), test_config());
    assert!(matches!(result, Err(ProtocolError::HandshakeFailed(_))));
    assert_eq!(mock.close_calls(), 1);
}

#[test]
fn test_handshake_rejects_short_ack() {
    let mock = MockTransport::new();
    mock.push_raw(&[0xBB]); // second byte never arrives

    let result = Session::establish(mock.clone(), test_config());
    assert!(matches!(result, Err(ProtocolError::HandshakeFailed(_))));
    assert_eq!(mock.close_calls(), 1);
}

#[test]
fn test_handshake_rejects_silent_module() {
    let mock = MockTransport::new();

    let result = Session::establish(mock.clone(), test_config());
    assert!(matches!(result, Err(ProtocolError::HandshakeFailed(_))));
    // Transport opened but handshake failed: the port must still be released
    assert_eq!(mock.close_calls(), 1);
}

#[test]
fn test_handshake_rejects_failed_ping() {
    let mock = MockTransport::new();
    mock.push_raw(&[0xBB, 0xAA]);
    mock.push_lines(&["AT", "ERROR", ""]);

    let result = Session::establish(mock.clone(), test_config());
    assert!(matches!(result, Err(ProtocolError::HandshakeFailed(_))));
    assert_eq!(mock.close_calls(), 1);
}

#[test]
fn test_name_query_framing() {
    let mock = handshake_mock();
    let mut session = Session::establish(mock.clone(), test_config()).unwrap();

    mock.push_lines(&["AT+NAME?", "LM048-DEVICE", ""]);
    let name = session.device_name().unwrap();
    assert_eq!(name, "LM048-DEVICE");
    assert_eq!(mock.written().last().unwrap(), &b"AT+NAME?\r".to_vec());
}

#[test]
fn test_multi_line_reply_keeps_inner_newlines() {
    let mock = handshake_mock();
    let mut session = Session::establish(mock.clone(), test_config()).unwrap();

    mock.push_lines(&["AT+VER?", "LM048 v2.0", "build 104", ""]);
    let reply = session.send(&Command::new("AT+VER?", 2)).unwrap();
    assert_eq!(reply, "LM048 v2.0\r\nbuild 104");
}

#[test]
fn test_end_to_end_configuration() {
    let mock = handshake_mock();
    let mut session = Session::establish(mock.clone(), test_config()).unwrap();

    mock.push_lines(&["AT+BAUD?", "BAUD17", ""]);
    let baud: BaudRate = session.read_setting().unwrap();
    assert_eq!(baud.bps(), 115_200);

    mock.push_lines(&["AT+BAUD13", "OK", ""]);
    let ack = session
        .write_setting(BaudRate::from_bps(9_600).unwrap())
        .unwrap();
    assert_eq!(ack, "OK");
    assert_eq!(mock.written().last().unwrap(), &b"AT+BAUD13\r".to_vec());
}

#[test]
fn test_read_all_families() {
    let mock = handshake_mock();
    let mut session = Session::establish(mock.clone(), test_config()).unwrap();

    mock.push_lines(&["AT+PAR?", "PAR1", ""]);
    assert_eq!(session.read_setting::<Parity>().unwrap(), Parity::Odd);

    mock.push_lines(&["AT+STOP?", "STOP2", ""]);
    assert_eq!(session.read_setting::<StopBits>().unwrap(), StopBits::Two);

    mock.push_lines(&["AT+FLOW?", "FLOW-", ""]);
    assert_eq!(
        session.read_setting::<FlowControl>().unwrap(),
        FlowControl::Disabled
    );
}

#[test]
fn test_repeated_read_is_idempotent() {
    let mock = handshake_mock();
    let mut session = Session::establish(mock.clone(), test_config()).unwrap();

    mock.push_lines(&["AT+FLOW?", "FLOW+", ""]);
    let first: FlowControl = session.read_setting().unwrap();
    mock.push_lines(&["AT+FLOW?", "FLOW+", ""]);
    let second: FlowControl = session.read_setting().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_drifted_reply_token_is_rejected() {
    let mock = handshake_mock();
    let mut session = Session::establish(mock.clone(), test_config()).unwrap();

    mock.push_lines(&["AT+BAUD?", "BAUD99", ""]);
    let result = session.read_setting::<BaudRate>();
    assert!(matches!(
        result,
        Err(ProtocolError::UnknownToken { family: "baud rate", .. })
    ));
}

#[test]
fn test_missing_payload_line_times_out() {
    let mock = handshake_mock();
    let mut session = Session::establish(mock.clone(), test_config()).unwrap();

    mock.push_lines(&["AT+BAUD?"]); // echo only, no payload
    let result = session.read_setting::<BaudRate>();
    assert!(matches!(result, Err(ProtocolError::Timeout)));
}

#[test]
fn test_missing_trailer_line_times_out() {
    let mock = handshake_mock();
    let mut session = Session::establish(mock.clone(), test_config()).unwrap();

    mock.push_lines(&["AT+BAUD?", "BAUD17"]); // trailer never arrives
    let result = session.read_setting::<BaudRate>();
    assert!(matches!(result, Err(ProtocolError::Timeout)));
}

#[test]
fn test_input_flushed_before_every_command() {
    let mock = handshake_mock();
    let mut session = Session::establish(mock.clone(), test_config()).unwrap();
    let after_handshake = mock.clear_calls();

    mock.push_lines(&["AT+PAR?", "PAR0", ""]);
    session.read_setting::<Parity>().unwrap();
    mock.push_lines(&["AT+PAR?", "PAR0", ""]);
    session.read_setting::<Parity>().unwrap();

    assert_eq!(mock.clear_calls(), after_handshake + 2);
}

#[test]
fn test_shutdown_sends_auto_and_closes() {
    let mock = handshake_mock();
    let session = Session::establish(mock.clone(), test_config()).unwrap();

    mock.push_lines(&["AT+AUTO", "OK", ""]);
    session.shutdown().unwrap();

    assert!(mock.written().contains(&b"AT+AUTO\r".to_vec()));
    assert_eq!(mock.close_calls(), 1);
}

#[test]
fn test_shutdown_closes_even_without_auto_reply() {
    let mock = handshake_mock();
    let session = Session::establish(mock.clone(), test_config()).unwrap();

    // No reply queued: AT+AUTO times out, the port is released anyway
    session.shutdown().unwrap();
    assert_eq!(mock.close_calls(), 1);
}

#[test]
fn test_close_releases_transport() {
    let mock = handshake_mock();
    let session = Session::establish(mock.clone(), test_config()).unwrap();

    session.close().unwrap();
    assert_eq!(mock.close_calls(), 1);
    assert!(mock.written().iter().all(|w| w != &b"AT+AUTO\r".to_vec()));
}
