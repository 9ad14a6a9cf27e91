// SPDX-License-Identifier: GPL-3.0-only
//! Decides when a hotplug event switches the displays, and performs the switch
//!
//! The orchestrator starts out `NotReady` so the burst of `added` events the
//! event source fires for devices that were already plugged in at startup
//! never switches anything. The agent marks it `Ready` once that burst has
//! been delivered.

use std::process::Command;
use std::rc::Rc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::hotplug::{DeviceHandle, DeviceListener};
use crate::input_source::describe_code;
use crate::logging::LogSink;
use crate::monitor::DisplayTransport;
use crate::wake::WakeCapability;

/// How long displays get to leave standby before the input-select write
pub const WAKE_PULSE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    NotReady,
    Ready,
}

pub struct SwitchOrchestrator<T, W> {
    config: Config,
    transport: T,
    wake: W,
    log: Rc<dyn LogSink>,
    state: OrchestratorState,
}

impl<T, W> SwitchOrchestrator<T, W>
where
    T: DisplayTransport,
    W: WakeCapability,
{
    pub fn new(config: Config, transport: T, wake: W, log: Rc<dyn LogSink>) -> Self {
        Self {
            config,
            transport,
            wake,
            log,
            state: OrchestratorState::NotReady,
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    /// Start acting on events; there is no way back to `NotReady`
    pub fn mark_ready(&mut self) {
        if self.state == OrchestratorState::Ready {
            return;
        }
        self.state = OrchestratorState::Ready;
        self.log.info(&format!(
            "Watching for USB device '{}' to switch displays to {}",
            self.config.target_device, self.config.target_input
        ));
    }

    /// Either the name contains the target or the stable id equals it
    ///
    /// Ids are hex, so `046D:0825` and `046d:0825` name the same device.
    fn matches(&self, name: Option<&str>, stable_id: Option<&str>) -> bool {
        let target = self.config.target_device.as_str();
        name.is_some_and(|name| name.contains(target))
            || stable_id.is_some_and(|id| id.eq_ignore_ascii_case(target))
    }

    /// Switch every attached display to the configured input
    ///
    /// Each display is handled on its own: a failed read or write is logged
    /// and the loop moves on to the next one.
    pub fn switch_displays(&self) {
        let target = self.config.target_input;
        let code = target.ddc_code();
        self.log.info(&format!("Switching displays to {}", target));

        let mut displays = self.transport.enumerate_displays();
        if displays.is_empty() {
            self.log.error("Did not detect any DDC-compatible displays!");
            return;
        }

        for display in displays.iter_mut() {
            let name = self.transport.display_name(display);
            let current = self
                .transport
                .read_input(display)
                .map_or_else(|| "unknown input".to_string(), describe_code);

            if self.transport.write_input(display, code) {
                self.log
                    .info(&format!("Switched display {} from {} to {}", name, current, target));
            } else {
                self.log.error(&format!(
                    "Couldn't switch display {} from {} to {}",
                    name, current, target
                ));
            }
        }
    }

    /// Log what every display is showing, once at startup
    pub fn log_current_inputs(&self) {
        let mut displays = self.transport.enumerate_displays();
        if displays.is_empty() {
            self.log.error("Did not detect any DDC-compatible displays!");
            return;
        }

        for display in displays.iter_mut() {
            let name = self.transport.display_name(display);
            match self.transport.read_input(display) {
                Some(code) => self.log.info(&format!(
                    "Display {} is currently set to {}",
                    name,
                    describe_code(code)
                )),
                None => self
                    .log
                    .error(&format!("Failed to get current input for display {}", name)),
            }
        }
    }

    fn run_hook(&self, command: &str) -> Result<()> {
        self.log.info(&format!("Executing command: {}", command));
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .status()
            .map_err(|err| AppError::Hook {
                command: command.to_string(),
                reason: err.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(AppError::Hook {
                command: command.to_string(),
                reason: status.to_string(),
            })
        }
    }

    fn on_target_connected(&self) {
        if let Err(err) = self.wake.wake(WAKE_PULSE) {
            self.log.error(&format!("Couldn't wake displays: {}", err));
        }

        self.switch_displays();

        if let Some(command) = &self.config.on_connect_execute
            && let Err(err) = self.run_hook(command)
        {
            self.log.error(&err.to_string());
        }
    }
}

impl<T, W> DeviceListener for SwitchOrchestrator<T, W>
where
    T: DisplayTransport,
    W: WakeCapability,
{
    fn device_added(&mut self, device: &dyn DeviceHandle) {
        let name = device.name();
        let stable_id = device.stable_id();
        let label = describe_device(name.as_deref(), stable_id.as_deref());

        if self.state() == OrchestratorState::NotReady {
            self.log
                .debug(&format!("Device {} already attached at startup", label));
            return;
        }

        if name.is_none() && stable_id.is_none() {
            self.log
                .debug("Ignoring added device: neither name nor id could be read");
            return;
        }

        self.log.debug(&format!("Device {} has been added", label));

        if self.matches(name.as_deref(), stable_id.as_deref()) {
            self.log.info(&format!(
                "Detected device we're looking for: {} matches '{}'",
                label, self.config.target_device
            ));
            self.on_target_connected();
        }
    }

    fn device_removed(&mut self, device: &dyn DeviceHandle) {
        if self.state == OrchestratorState::NotReady {
            return;
        }
        let label = describe_device(device.name().as_deref(), device.stable_id().as_deref());
        self.log.debug(&format!("Device {} has been removed", label));
    }
}

fn describe_device(name: Option<&str>, stable_id: Option<&str>) -> String {
    match (name, stable_id) {
        (Some(name), Some(id)) => format!("'{}' ({})", name, id),
        (Some(name), None) => format!("'{}'", name),
        (None, Some(id)) => format!("({})", id),
        (None, None) => "<unknown>".to_string(),
    }
}
