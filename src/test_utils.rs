//! Test doubles shared by the unit tests
//!
//! The fakes record what they were asked to do into a shared [`Journal`] so
//! tests can assert on ordering across components (wake before write).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::hotplug::{DeviceEventSource, DeviceHandle, DeviceListener, Dispatch, Subscription};
use crate::logging::{LogLevel, LogSink};
use crate::monitor::DisplayTransport;
use crate::wake::WakeCapability;

/// Sink that keeps every line it receives
#[derive(Default)]
pub struct RecordingSink {
    entries: RefCell<Vec<(LogLevel, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.borrow().clone()
    }

    pub fn at(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.at(level).iter().any(|m| m.contains(needle))
    }
}

impl LogSink for RecordingSink {
    fn log(&self, level: LogLevel, message: &str) {
        self.entries.borrow_mut().push((level, message.to_string()));
    }
}

/// Something a fake did, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Wake(Duration),
    Enumerate,
    Read(String),
    Write(String, u16),
}

pub type Journal = Rc<RefCell<Vec<Op>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

#[derive(Debug, Clone, Default)]
pub struct FakeDevice {
    pub name: Option<String>,
    pub stable_id: Option<String>,
}

impl FakeDevice {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            stable_id: None,
        }
    }

    pub fn new(name: &str, stable_id: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            stable_id: Some(stable_id.to_string()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl DeviceHandle for FakeDevice {
    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn stable_id(&self) -> Option<String> {
        self.stable_id.clone()
    }
}

#[derive(Debug, Clone)]
pub struct FakeDisplay {
    pub name: String,
    pub current: Option<u16>,
    pub accepts_writes: bool,
}

impl FakeDisplay {
    pub fn working(name: &str, current: u16) -> Self {
        Self {
            name: name.to_string(),
            current: Some(current),
            accepts_writes: true,
        }
    }

    /// Answers nothing, like a monitor in deep standby
    pub fn asleep(name: &str) -> Self {
        Self {
            name: name.to_string(),
            current: None,
            accepts_writes: false,
        }
    }
}

pub struct FakeTransport {
    displays: Vec<FakeDisplay>,
    journal: Journal,
}

impl FakeTransport {
    pub fn new(displays: Vec<FakeDisplay>, journal: Journal) -> Self {
        Self { displays, journal }
    }
}

impl DisplayTransport for FakeTransport {
    type Display = FakeDisplay;

    fn enumerate_displays(&self) -> Vec<FakeDisplay> {
        self.journal.borrow_mut().push(Op::Enumerate);
        self.displays.clone()
    }

    fn display_name(&self, display: &FakeDisplay) -> String {
        format!("'{}'", display.name)
    }

    fn read_input(&self, display: &mut FakeDisplay) -> Option<u16> {
        self.journal.borrow_mut().push(Op::Read(display.name.clone()));
        display.current
    }

    fn write_input(&self, display: &mut FakeDisplay, code: u16) -> bool {
        self.journal
            .borrow_mut()
            .push(Op::Write(display.name.clone(), code));
        if display.accepts_writes {
            display.current = Some(code);
        }
        display.accepts_writes
    }
}

pub struct FakeWake {
    journal: Journal,
    fail: bool,
}

impl FakeWake {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            fail: false,
        }
    }

    pub fn failing(journal: Journal) -> Self {
        Self {
            journal,
            fail: true,
        }
    }
}

impl WakeCapability for FakeWake {
    fn wake(&self, duration: Duration) -> Result<()> {
        self.journal.borrow_mut().push(Op::Wake(duration));
        if self.fail {
            return Err(AppError::Io(std::io::Error::other("no session bus")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum FakeEvent {
    Added(FakeDevice),
    Removed(FakeDevice),
}

#[derive(Debug, Clone)]
pub enum Batch {
    Events(Vec<FakeEvent>),
    Fail,
}

/// Replays scripted batches, one per `dispatch`, then reports `Closed`
#[derive(Default)]
pub struct FakeEventSource {
    attached: Vec<FakeDevice>,
    batches: RefCell<VecDeque<Batch>>,
    fail_subscribe: bool,
}

impl FakeEventSource {
    pub fn new(attached: Vec<FakeDevice>, batches: Vec<Batch>) -> Self {
        Self {
            attached,
            batches: RefCell::new(batches.into()),
            fail_subscribe: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            fail_subscribe: true,
            ..Self::default()
        }
    }
}

impl DeviceEventSource for FakeEventSource {
    type Subscription = FakeSubscription;

    fn subscribe(&self, listener: &mut dyn DeviceListener) -> Result<FakeSubscription> {
        if self.fail_subscribe {
            return Err(AppError::Hotplug(std::io::Error::other("udev unavailable")));
        }
        for device in &self.attached {
            listener.device_added(device);
        }
        Ok(FakeSubscription {
            batches: self.batches.take(),
        })
    }
}

pub struct FakeSubscription {
    batches: VecDeque<Batch>,
}

impl Subscription for FakeSubscription {
    fn dispatch(&mut self, listener: &mut dyn DeviceListener) -> Result<Dispatch> {
        match self.batches.pop_front() {
            None => Ok(Dispatch::Closed),
            Some(Batch::Fail) => Err(AppError::Hotplug(std::io::Error::other("poll failed"))),
            Some(Batch::Events(events)) => {
                for event in &events {
                    match event {
                        FakeEvent::Added(device) => listener.device_added(device),
                        FakeEvent::Removed(device) => listener.device_removed(device),
                    }
                }
                Ok(Dispatch::Continue)
            }
        }
    }
}
