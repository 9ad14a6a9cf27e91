// SPDX-License-Identifier: GPL-3.0-only
//! Monitor input sources and their DDC/CI input-select codes

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Video input a monitor can be switched to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum InputSource {
    DisplayPort1,
    DisplayPort2,
    Hdmi1,
    Hdmi2,
}

impl InputSource {
    pub const ALL: [InputSource; 4] = [
        InputSource::DisplayPort1,
        InputSource::DisplayPort2,
        InputSource::Hdmi1,
        InputSource::Hdmi2,
    ];

    /// Value written to VCP feature 0x60 (input select)
    pub const fn ddc_code(self) -> u16 {
        match self {
            InputSource::DisplayPort1 => 0x0f,
            InputSource::DisplayPort2 => 0x10,
            InputSource::Hdmi1 => 0x11,
            InputSource::Hdmi2 => 0x12,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|source| source.ddc_code() == code)
    }

    pub const fn name(self) -> &'static str {
        match self {
            InputSource::DisplayPort1 => "DisplayPort1",
            InputSource::DisplayPort2 => "DisplayPort2",
            InputSource::Hdmi1 => "Hdmi1",
            InputSource::Hdmi2 => "Hdmi2",
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x})", self.name(), self.ddc_code())
    }
}

impl FromStr for InputSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|source| source.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!(
                    "unknown input source '{}', expected one of: {}",
                    wanted,
                    Self::ALL.map(InputSource::name).join(", ")
                )
            })
    }
}

impl TryFrom<String> for InputSource {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Human-readable rendering of a raw input-select value read from a display
pub fn describe_code(code: u16) -> String {
    match InputSource::from_code(code) {
        Some(source) => source.to_string(),
        None => format!("0x{:02x}", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ddc_codes() {
        assert_eq!(InputSource::DisplayPort1.ddc_code(), 0x0f);
        assert_eq!(InputSource::DisplayPort2.ddc_code(), 0x10);
        assert_eq!(InputSource::Hdmi1.ddc_code(), 0x11);
        assert_eq!(InputSource::Hdmi2.ddc_code(), 0x12);
    }

    #[test]
    fn test_codes_are_unique_and_reversible() {
        for source in InputSource::ALL {
            assert_eq!(InputSource::from_code(source.ddc_code()), Some(source));
        }
        assert_eq!(InputSource::from_code(0x1b), None);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("hdmi1".parse::<InputSource>(), Ok(InputSource::Hdmi1));
        assert_eq!(" DisplayPort2 ".parse::<InputSource>(), Ok(InputSource::DisplayPort2));
        assert_eq!("HDMI2".parse::<InputSource>(), Ok(InputSource::Hdmi2));
    }

    #[test]
    fn test_parse_unknown_lists_choices() {
        let err = "Usb-C".parse::<InputSource>().unwrap_err();
        assert!(err.contains("Usb-C"));
        assert!(err.contains("DisplayPort1, DisplayPort2, Hdmi1, Hdmi2"));
    }

    #[test]
    fn test_display_formatting() {
        assert_eq!(InputSource::Hdmi1.to_string(), "Hdmi1 (0x11)");
        assert_eq!(describe_code(0x0f), "DisplayPort1 (0x0f)");
        assert_eq!(describe_code(0x1b), "0x1b");
    }
}
