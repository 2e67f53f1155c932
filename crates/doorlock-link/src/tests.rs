/// Link behaviour over an in-memory transport standing in for the serial
/// port.
#[cfg(test)]
mod unit {
    use std::collections::VecDeque;
    use std::io::{self, ErrorKind, Read, Write};

    use doorlock_core::clock::ManualClock;
    use doorlock_core::config::Config;
    use doorlock_core::feedback::TracingFeedback;
    use doorlock_core::host::DoorHost;
    use doorlock_core::protocol::ActuatorCommand;
    use doorlock_core::types::GestureSymbol;

    use crate::{ActuatorLink, Connector, LinkError, ReconnectingLink, Result};

    #[derive(Debug, Default)]
    struct MemoryTransport {
        inbound: VecDeque<u8>,
        written: Vec<u8>,
        fail_writes: bool,
        closed: bool,
    }

    impl MemoryTransport {
        fn with_input(bytes: &[u8]) -> Self {
            Self {
                inbound: bytes.iter().copied().collect(),
                ..Self::default()
            }
        }

        fn written(&self) -> String {
            String::from_utf8_lossy(&self.written).into_owned()
        }
    }

    impl Read for MemoryTransport {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.inbound.is_empty() {
                if self.closed {
                    return Ok(0);
                }
                return Err(io::Error::new(ErrorKind::TimedOut, "no data"));
            }
            let n = buf.len().min(self.inbound.len());
            for (slot, byte) in buf.iter_mut().zip(self.inbound.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        }
    }

    impl Write for MemoryTransport {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::new(ErrorKind::BrokenPipe, "device unplugged"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Hands out scripted transports; `None` entries fail to connect.
    #[derive(Default)]
    struct ScriptedConnector {
        script: VecDeque<Option<MemoryTransport>>,
        connects: u32,
    }

    impl Connector for ScriptedConnector {
        type Transport = MemoryTransport;

        fn connect(&mut self) -> Result<ActuatorLink<MemoryTransport>> {
            self.connects += 1;
            match self.script.pop_front().flatten() {
                Some(transport) => Ok(ActuatorLink::new(transport)),
                None => Err(LinkError::Io(io::Error::new(
                    ErrorKind::NotFound,
                    "no such port",
                ))),
            }
        }
    }

    #[test]
    fn send_writes_wire_lines() {
        let mut link = ActuatorLink::new(MemoryTransport::default());
        link.send(&ActuatorCommand::On).unwrap();
        link.send(&ActuatorCommand::Off).unwrap();
        assert_eq!(link.transport().written(), "#on\n#off\n");
        assert_eq!(link.sent(), 2);
    }

    #[test]
    fn read_status_splits_lines_and_keeps_partial() {
        let mut link = ActuatorLink::new(MemoryTransport::with_input(
            b"Motor ON - advancing 50 steps\r\n50 steps comp",
        ));
        assert_eq!(
            link.read_status().unwrap(),
            vec!["Motor ON - advancing 50 steps".to_string()]
        );
        assert!(link.read_status().unwrap().is_empty());
    }

    #[test]
    fn read_status_keeps_long_status_lines() {
        let line = "Send '#on' to advance 50 steps, hold 5000 ms, then auto-disable (status)";
        let mut link = ActuatorLink::new(MemoryTransport::with_input(format!("{line}\n").as_bytes()));
        assert_eq!(link.read_status().unwrap(), vec![line.to_string()]);
    }

    #[test]
    fn read_status_reports_hangup() {
        let mut transport = MemoryTransport::default();
        transport.closed = true;
        let mut link = ActuatorLink::new(transport);
        assert!(matches!(link.read_status(), Err(LinkError::Closed)));
    }

    #[test]
    fn reconnecting_link_retries_failed_connects() {
        let connector = ScriptedConnector {
            script: VecDeque::from([None, None, Some(MemoryTransport::default())]),
            connects: 0,
        };
        let mut link = ReconnectingLink::new(connector, 3);
        link.send(&ActuatorCommand::On).unwrap();
        assert!(link.is_connected());
        assert_eq!(link.connector().connects, 3);
        assert_eq!(link.reconnects(), 0);
    }

    #[test]
    fn reconnecting_link_gives_up_after_attempts() {
        let mut link = ReconnectingLink::new(ScriptedConnector::default(), 3);
        let err = link.send(&ActuatorCommand::On).unwrap_err();
        match err {
            LinkError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(last.contains("no such port"));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
        assert!(!link.is_connected());
    }

    #[test]
    fn reconnecting_link_replaces_broken_connection() {
        let broken = MemoryTransport {
            fail_writes: true,
            ..MemoryTransport::default()
        };
        let connector = ScriptedConnector {
            script: VecDeque::from([Some(broken), Some(MemoryTransport::default())]),
            connects: 0,
        };
        let mut link = ReconnectingLink::new(connector, 2);
        link.send(&ActuatorCommand::Off).unwrap();
        assert_eq!(link.reconnects(), 1);
        assert!(link.read_status().unwrap().is_empty());
    }

    #[test]
    fn door_host_drives_link() {
        let clock = ManualClock::new();
        let mut host = DoorHost::new(
            &Config::default(),
            ActuatorLink::new(MemoryTransport::default()),
            TracingFeedback::new(),
            clock,
        );
        for count in [0, 1, 0, 5] {
            host.observe(GestureSymbol::Fingers(count)).unwrap();
        }
        assert_eq!(host.link().transport().written(), "#on\n");
    }
}
