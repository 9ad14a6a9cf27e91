// SPDX-License-Identifier: GPL-3.0-only
//! DDC/CI (Display Data Channel Command Interface) protocol implementation
//!
//! DDC/CI is a standard protocol for controlling monitors over I2C bus.
//! It's supported by most modern external monitors via the video cable.

use anyhow::Result;
use ddc_hi::{Ddc, Display};

use super::DisplayProtocol;

/// VCP (Virtual Control Panel) code for input select
pub const INPUT_SELECT_CODE: u8 = 0x60;

/// DDC/CI display implementation
pub struct DdcCiDisplay {
    display: Display,
}

impl DdcCiDisplay {
    pub fn new(display: Display) -> Self {
        Self { display }
    }

    /// Enumerate all displays reachable over DDC/CI
    ///
    /// ddc-hi only reports buses that answered with an EDID on the DDC
    /// channel, so internal panels and monitors without DDC never show up.
    pub fn enumerate() -> Vec<Self> {
        Display::enumerate().into_iter().map(Self::new).collect()
    }
}

impl DisplayProtocol for DdcCiDisplay {
    fn id(&self) -> String {
        // The EDID serial is stable across reboots and port changes, the
        // I2C-based id is not
        match self.display.info.serial_number.as_deref() {
            Some(serial) if !serial.trim().is_empty() => format!("ddc-{}", serial.trim()),
            _ => self.display.info.id.clone(),
        }
    }

    fn name(&self) -> String {
        self.display
            .info
            .model_name
            .clone()
            .unwrap_or_default()
    }

    fn get_input_source(&mut self) -> Result<u16> {
        let value = self.display.handle.get_vcp_feature(INPUT_SELECT_CODE)?;
        Ok(value.value())
    }

    fn set_input_source(&mut self, value: u16) -> Result<()> {
        self.display
            .handle
            .set_vcp_feature(INPUT_SELECT_CODE, value)?;
        Ok(())
    }
}

impl std::fmt::Debug for DdcCiDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DdcCiDisplay(id: {}, name: {})", self.id(), self.name())
    }
}
