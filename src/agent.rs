// SPDX-License-Identifier: GPL-3.0-only
//! Event loop tying the hotplug source to the orchestrator

use std::rc::Rc;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::hotplug::{DeviceEventSource, Dispatch, Subscription};
use crate::logging::LogSink;
use crate::monitor::DisplayTransport;
use crate::orchestrator::SwitchOrchestrator;
use crate::wake::WakeCapability;

/// Pause after a failed dispatch so a broken socket does not spin the CPU
const DISPATCH_RETRY_DELAY: Duration = Duration::from_millis(100);

pub struct Agent<S, T, W> {
    source: S,
    orchestrator: SwitchOrchestrator<T, W>,
    log: Rc<dyn LogSink>,
}

impl<S, T, W> Agent<S, T, W>
where
    S: DeviceEventSource,
    T: DisplayTransport,
    W: WakeCapability,
{
    pub fn new(config: Config, source: S, transport: T, wake: W, log: Rc<dyn LogSink>) -> Self {
        let orchestrator = SwitchOrchestrator::new(config, transport, wake, log.clone());
        Self {
            source,
            orchestrator,
            log,
        }
    }

    /// Run until the event source closes
    ///
    /// Only the initial subscription can fail this; errors while waiting for
    /// events are logged and retried.
    pub fn run(mut self) -> Result<()> {
        self.orchestrator.log_current_inputs();

        // Devices already attached are reported during subscribe, while the
        // orchestrator still ignores them
        let mut subscription = self.source.subscribe(&mut self.orchestrator)?;
        self.orchestrator.mark_ready();

        loop {
            match subscription.dispatch(&mut self.orchestrator) {
                Ok(Dispatch::Continue) => {}
                Ok(Dispatch::Closed) => {
                    self.log.info("Hotplug event source closed, stopping");
                    return Ok(());
                }
                Err(err) => {
                    self.log.error(&err.to_string());
                    std::thread::sleep(DISPATCH_RETRY_DELAY);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::input_source::InputSource;
    use crate::logging::LogLevel;
    use crate::orchestrator::WAKE_PULSE;
    use crate::test_utils::{
        Batch, FakeDevice, FakeDisplay, FakeEvent, FakeEventSource, FakeTransport, FakeWake,
        Journal, Op, RecordingSink, journal,
    };

    fn config() -> Config {
        Config {
            target_device: "Elgato".to_string(),
            target_input: InputSource::DisplayPort2,
            on_connect_execute: None,
        }
    }

    fn agent(
        source: FakeEventSource,
        journal: &Journal,
        log: &Rc<RecordingSink>,
    ) -> Agent<FakeEventSource, FakeTransport, FakeWake> {
        let displays = vec![
            FakeDisplay::working("left", 0x0f),
            FakeDisplay::working("right", 0x11),
        ];
        Agent::new(
            config(),
            source,
            FakeTransport::new(displays, journal.clone()),
            FakeWake::new(journal.clone()),
            log.clone(),
        )
    }

    fn writes(journal: &Journal) -> Vec<Op> {
        journal
            .borrow()
            .iter()
            .filter(|op| matches!(op, Op::Write(..)))
            .cloned()
            .collect()
    }

    #[test]
    fn test_device_attached_at_startup_does_not_switch() {
        let journal = journal();
        let log = RecordingSink::shared();
        let source = FakeEventSource::new(vec![FakeDevice::named("Elgato Camera Link")], vec![]);

        agent(source, &journal, &log).run().unwrap();

        assert!(writes(&journal).is_empty());
        assert!(!journal.borrow().iter().any(|op| matches!(op, Op::Wake(_))));
        // Startup only reads what the displays are showing
        assert!(log.contains(LogLevel::Info, "Display 'left' is currently set to DisplayPort1 (0x0f)"));
        assert!(log.contains(LogLevel::Info, "event source closed"));
    }

    #[test]
    fn test_device_plugged_in_later_switches() {
        let journal = journal();
        let log = RecordingSink::shared();
        let source = FakeEventSource::new(
            vec![FakeDevice::named("Elgato Camera Link")],
            vec![Batch::Events(vec![
                FakeEvent::Removed(FakeDevice::named("Elgato Camera Link")),
                FakeEvent::Added(FakeDevice::named("Elgato Camera Link")),
            ])],
        );

        agent(source, &journal, &log).run().unwrap();

        assert_eq!(
            writes(&journal),
            vec![
                Op::Write("left".to_string(), 0x10),
                Op::Write("right".to_string(), 0x10),
            ]
        );
        let first_write = journal
            .borrow()
            .iter()
            .position(|op| matches!(op, Op::Write(..)));
        let wake = journal
            .borrow()
            .iter()
            .position(|op| *op == Op::Wake(WAKE_PULSE));
        assert!(wake.is_some());
        assert!(wake < first_write);
    }

    #[test]
    fn test_unrelated_devices_and_removals_do_nothing() {
        let journal = journal();
        let log = RecordingSink::shared();
        let source = FakeEventSource::new(
            vec![],
            vec![
                Batch::Events(vec![FakeEvent::Added(FakeDevice::new("USB Keyboard", "046d:c31c"))]),
                Batch::Events(vec![FakeEvent::Removed(FakeDevice::named("Elgato Camera Link"))]),
            ],
        );

        agent(source, &journal, &log).run().unwrap();

        assert!(writes(&journal).is_empty());
        assert!(log.at(LogLevel::Error).is_empty());
    }

    #[test]
    fn test_dispatch_error_is_logged_and_loop_continues() {
        let journal = journal();
        let log = RecordingSink::shared();
        let source = FakeEventSource::new(
            vec![],
            vec![
                Batch::Fail,
                Batch::Events(vec![FakeEvent::Added(FakeDevice::new("Hub", "Elgato"))]),
            ],
        );

        agent(source, &journal, &log).run().unwrap();

        assert!(log.contains(LogLevel::Error, "poll failed"));
        assert_eq!(writes(&journal).len(), 2);
    }

    #[test]
    fn test_subscribe_failure_is_fatal() {
        let journal = journal();
        let log = RecordingSink::shared();

        let result = agent(FakeEventSource::unavailable(), &journal, &log).run();

        assert!(matches!(result, Err(AppError::Hotplug(_))));
        assert!(writes(&journal).is_empty());
    }
}
