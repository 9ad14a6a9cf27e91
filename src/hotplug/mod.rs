// SPDX-License-Identifier: GPL-3.0-only
//! USB hotplug detection
//!
//! A [`DeviceEventSource`] turns OS device notifications into calls on a
//! [`DeviceListener`]. The listener is lent to the source for each delivery,
//! so neither side owns the other. The udev backend lives in
//! `udev_monitor`; `lock` keeps a second agent from watching the same bus.

mod lock;
mod udev_monitor;

pub use lock::InstanceLock;
pub use udev_monitor::UdevEventSource;

use crate::error::Result;

/// One device for the duration of a single callback
///
/// Handles are only ever lent out (`&dyn DeviceHandle`), so they cannot be
/// kept once the callback returns.
pub trait DeviceHandle {
    /// Human-readable product name
    fn name(&self) -> Option<String>;

    /// Identifier that survives reconnection (`vvvv:pppp` for USB)
    fn stable_id(&self) -> Option<String>;
}

/// Receives add/remove notifications, always on the thread driving the source
pub trait DeviceListener {
    fn device_added(&mut self, device: &dyn DeviceHandle);
    fn device_removed(&mut self, device: &dyn DeviceHandle);
}

/// Outcome of one [`Subscription::dispatch`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// More events may follow
    Continue,
    /// The source is exhausted and will never deliver again
    Closed,
}

pub trait DeviceEventSource {
    type Subscription: Subscription;

    /// Start watching
    ///
    /// Every device already attached is reported through
    /// [`DeviceListener::device_added`] before this returns, so `added` does
    /// not imply a fresh physical connection.
    fn subscribe(&self, listener: &mut dyn DeviceListener) -> Result<Self::Subscription>;
}

/// Live registration; dropping it stops delivery and releases OS resources
pub trait Subscription {
    /// Block until at least one notification is available and deliver all
    /// pending ones in arrival order
    fn dispatch(&mut self, listener: &mut dyn DeviceListener) -> Result<Dispatch>;
}
