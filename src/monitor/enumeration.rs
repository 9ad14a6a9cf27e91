use std::rc::Rc;

use crate::error::AppError;
use crate::logging::LogSink;
use crate::protocols::{DisplayProtocol, ddc_ci::DdcCiDisplay};

use super::backend::DisplayTransport;

/// [`DisplayTransport`] over ddc-hi
pub struct DdcTransport {
    log: Rc<dyn LogSink>,
}

impl DdcTransport {
    pub fn new(log: Rc<dyn LogSink>) -> Self {
        Self { log }
    }

    fn log_failure(&self, display: &DdcCiDisplay, source: anyhow::Error) {
        let err = AppError::DdcCi {
            id: display.id(),
            source,
        };
        self.log.debug(&err.to_string());
    }
}

impl DisplayTransport for DdcTransport {
    type Display = DdcCiDisplay;

    fn enumerate_displays(&self) -> Vec<DdcCiDisplay> {
        let displays = DdcCiDisplay::enumerate();
        self.log.debug(&format!("Found {} DDC/CI display(s)", displays.len()));
        displays
    }

    fn display_name(&self, display: &DdcCiDisplay) -> String {
        let name = display.name();
        if name.is_empty() {
            format!("'{}'", display.id())
        } else {
            format!("'{}' ({})", name, display.id())
        }
    }

    fn read_input(&self, display: &mut DdcCiDisplay) -> Option<u16> {
        match display.get_input_source() {
            Ok(value) => Some(value),
            Err(err) => {
                self.log_failure(display, err);
                None
            }
        }
    }

    fn write_input(&self, display: &mut DdcCiDisplay, code: u16) -> bool {
        match display.set_input_source(code) {
            Ok(()) => true,
            Err(err) => {
                self.log_failure(display, err);
                false
            }
        }
    }
}
