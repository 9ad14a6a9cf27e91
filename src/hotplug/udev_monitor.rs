use std::ffi::OsStr;
use std::os::fd::AsRawFd;
use std::rc::Rc;

use super::{DeviceEventSource, DeviceHandle, DeviceListener, Dispatch, Subscription};
use crate::error::{AppError, Result};
use crate::logging::LogSink;

const SUBSYSTEM: &str = "usb";
const DEVTYPE: &str = "usb_device";

/// Watches udev for USB device add/remove events
///
/// Matches every `usb_device`; interfaces and hubs' ports are filtered out by
/// devtype, vendor/product filtering is left to the listener.
pub struct UdevEventSource {
    log: Rc<dyn LogSink>,
}

impl UdevEventSource {
    pub fn new(log: Rc<dyn LogSink>) -> Self {
        Self { log }
    }
}

impl DeviceEventSource for UdevEventSource {
    type Subscription = UdevSubscription;

    fn subscribe(&self, listener: &mut dyn DeviceListener) -> Result<UdevSubscription> {
        // Listen before enumerating so nothing plugged in between is missed
        let socket = udev::MonitorBuilder::new()
            .and_then(|builder| builder.match_subsystem_devtype(SUBSYSTEM, DEVTYPE))
            .and_then(|builder| builder.listen())
            .map_err(AppError::Hotplug)?;

        let mut enumerator = udev::Enumerator::new().map_err(AppError::Hotplug)?;
        enumerator.match_subsystem(SUBSYSTEM).map_err(AppError::Hotplug)?;
        enumerator
            .match_property("DEVTYPE", DEVTYPE)
            .map_err(AppError::Hotplug)?;

        let mut count = 0;
        for device in enumerator.scan_devices().map_err(AppError::Hotplug)? {
            listener.device_added(&UsbDevice::new(device));
            count += 1;
        }

        self.log.info(&format!(
            "USB hotplug monitoring started ({} device(s) already attached)",
            count
        ));

        Ok(UdevSubscription {
            socket,
            log: Rc::clone(&self.log),
        })
    }
}

/// Owns the udev monitor socket; dropping it closes the socket
pub struct UdevSubscription {
    socket: udev::MonitorSocket,
    log: Rc<dyn LogSink>,
}

impl Subscription for UdevSubscription {
    fn dispatch(&mut self, listener: &mut dyn DeviceListener) -> Result<Dispatch> {
        let mut poll_fd = libc::pollfd {
            fd: self.socket.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };

        // Block until the socket has data (negative timeout = wait forever)
        let poll_result = unsafe { libc::poll(&mut poll_fd, 1, -1) };
        let errno = (poll_result < 0).then(std::io::Error::last_os_error);

        self.log
            .debug(&describe_poll(poll_result, poll_fd.fd, poll_fd.revents));

        if interpret_poll(poll_result, errno)? == PollOutcome::Interrupted {
            return Ok(Dispatch::Continue);
        }

        let events = self
            .socket
            .iter()
            .map(|event| (event.event_type(), UsbDevice::new(event.device())));
        let delivered = deliver(events, listener, self.log.as_ref());

        settle(delivered, poll_fd.revents, self.log.as_ref())
    }
}

/// What a udev action means to the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Added,
    Removed,
    Ignored,
}

fn route(event_type: udev::EventType) -> Route {
    match event_type {
        udev::EventType::Add => Route::Added,
        udev::EventType::Remove => Route::Removed,
        _ => Route::Ignored,
    }
}

/// Hand events to the listener in arrival order, returning how many got through
fn deliver<H, I>(events: I, listener: &mut dyn DeviceListener, log: &dyn LogSink) -> usize
where
    H: DeviceHandle,
    I: IntoIterator<Item = (udev::EventType, H)>,
{
    let mut delivered = 0;
    for (event_type, device) in events {
        match route(event_type) {
            Route::Added => listener.device_added(&device),
            Route::Removed => listener.device_removed(&device),
            Route::Ignored => {
                log.debug(&format!(
                    "Ignoring udev {:?} event for {}",
                    event_type,
                    device.stable_id().unwrap_or_else(|| "unknown device".to_string())
                ));
                continue;
            }
        }
        delivered += 1;
    }
    delivered
}

fn describe_poll(result: libc::c_int, fd: libc::c_int, revents: libc::c_short) -> String {
    format!("Poll returned {} on fd {}, revents: {:#x}", result, fd, revents)
}

#[derive(Debug, PartialEq, Eq)]
enum PollOutcome {
    Readable,
    Interrupted,
}

/// `errno` is only meaningful when `result` is negative
fn interpret_poll(result: libc::c_int, errno: Option<std::io::Error>) -> Result<PollOutcome> {
    if result >= 0 {
        return Ok(PollOutcome::Readable);
    }
    let err = errno.unwrap_or_else(|| std::io::Error::other("poll failed without errno"));
    if err.kind() == std::io::ErrorKind::Interrupted {
        Ok(PollOutcome::Interrupted)
    } else {
        Err(AppError::Hotplug(err))
    }
}

const POLL_FAILURE: libc::c_short = libc::POLLERR | libc::POLLHUP | libc::POLLNVAL;

/// An empty wake-up is fine unless the socket itself reported a failure,
/// which would otherwise make the next poll return immediately again
fn settle(delivered: usize, revents: libc::c_short, log: &dyn LogSink) -> Result<Dispatch> {
    if delivered > 0 {
        return Ok(Dispatch::Continue);
    }
    if revents & POLL_FAILURE != 0 {
        return Err(AppError::Hotplug(std::io::Error::other(format!(
            "udev monitor socket failed (revents {:#x})",
            revents
        ))));
    }
    log.debug("Poll indicated ready but no USB event available");
    Ok(Dispatch::Continue)
}

/// udev device handed to the listener for one callback
struct UsbDevice {
    device: udev::Device,
}

impl UsbDevice {
    fn new(device: udev::Device) -> Self {
        Self { device }
    }

    fn property(&self, key: &str) -> Option<&str> {
        self.device.property_value(key).and_then(OsStr::to_str)
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.device.attribute_value(key).and_then(OsStr::to_str)
    }
}

impl DeviceHandle for UsbDevice {
    fn name(&self) -> Option<String> {
        resolve_name(
            self.attribute("product"),
            self.property("ID_MODEL_FROM_DATABASE"),
            self.property("ID_MODEL"),
        )
    }

    fn stable_id(&self) -> Option<String> {
        resolve_stable_id(
            self.property("ID_VENDOR_ID"),
            self.property("ID_MODEL_ID"),
            self.property("PRODUCT"),
        )
    }
}

/// Pick the best available product name
///
/// Sysfs attributes are gone by the time a `remove` event arrives, so the
/// udev properties recorded with the event are the fallback.
fn resolve_name(
    product: Option<&str>,
    model_from_database: Option<&str>,
    model: Option<&str>,
) -> Option<String> {
    non_blank(product)
        .or_else(|| non_blank(model_from_database))
        .map(str::to_string)
        .or_else(|| non_blank(model).map(|m| m.replace('_', " ")))
}

/// `vvvv:pppp` in lowercase hex
///
/// `PRODUCT` is the kernel's `vid/pid/bcdDevice` triple without zero padding
/// (e.g. `46d/825/10`).
fn resolve_stable_id(
    vendor_id: Option<&str>,
    model_id: Option<&str>,
    product: Option<&str>,
) -> Option<String> {
    let parse = |hex: &str| u16::from_str_radix(hex.trim(), 16).ok();

    if let (Some(vid), Some(pid)) = (vendor_id.and_then(parse), model_id.and_then(parse)) {
        return Some(format!("{:04x}:{:04x}", vid, pid));
    }

    let mut parts = product?.split('/');
    let vid = parse(parts.next()?)?;
    let pid = parse(parts.next()?)?;
    Some(format!("{:04x}:{:04x}", vid, pid))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
