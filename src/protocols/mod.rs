// SPDX-License-Identifier: GPL-3.0-only
//! Display control protocols
//!
//! Only DDC/CI is implemented: it is the protocol external monitors speak for
//! the input-select VCP feature.

pub mod ddc_ci;

use anyhow::Result;

/// Common trait for display control protocols
pub trait DisplayProtocol: std::fmt::Debug {
    /// Get the unique identifier for this display
    fn id(&self) -> String;

    /// Get the human-readable name of this display
    fn name(&self) -> String;

    /// Read the current input-select value
    fn get_input_source(&mut self) -> Result<u16>;

    /// Write a new input-select value
    fn set_input_source(&mut self, value: u16) -> Result<()>;
}
