// SPDX-License-Identifier: GPL-3.0-only
//! Screen wake-up before switching inputs
//!
//! Some monitors ignore input-select writes while in standby, others accept
//! them and revert to the previous input when they wake up because the new
//! one has no signal yet. Poking the session's idle timer first avoids both.

use std::rc::Rc;
use std::time::Duration;

use zbus::proxy;

use crate::error::Result;
use crate::logging::LogSink;

/// Best-effort "wake the displays" pulse
pub trait WakeCapability {
    /// Wake the displays and give them `duration` to come out of standby
    fn wake(&self, duration: Duration) -> Result<()>;
}

/// freedesktop screensaver D-Bus interface (KDE, GNOME, xfce4-screensaver, ...)
#[proxy(
    interface = "org.freedesktop.ScreenSaver",
    default_service = "org.freedesktop.ScreenSaver",
    default_path = "/org/freedesktop/ScreenSaver"
)]
trait ScreenSaver {
    /// Counts as user input: resets the idle timer and powers screens on
    fn simulate_user_activity(&self) -> zbus::Result<()>;
}

/// Wakes displays through the session bus screensaver service
pub struct ScreenSaverWake {
    log: Rc<dyn LogSink>,
}

impl ScreenSaverWake {
    pub fn new(log: Rc<dyn LogSink>) -> Self {
        Self { log }
    }
}

impl WakeCapability for ScreenSaverWake {
    fn wake(&self, duration: Duration) -> Result<()> {
        // Connect per pulse: the session bus may come and go while the agent runs
        let connection = zbus::blocking::Connection::session()?;
        let proxy = ScreenSaverProxyBlocking::new(&connection)?;
        proxy.simulate_user_activity()?;

        self.log
            .debug(&format!("Simulated user activity, waiting {:?} for displays to wake", duration));
        std::thread::sleep(duration);
        Ok(())
    }
}
