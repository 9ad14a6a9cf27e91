// SPDX-License-Identifier: GPL-3.0-only
use std::process::ExitCode;

use crate::agent::Agent;
use crate::config::Config;
use crate::error::Result;
use crate::hotplug::{InstanceLock, UdevEventSource};
use crate::logging::TracingSink;
use crate::monitor::DdcTransport;
use crate::wake::ScreenSaverWake;

#[macro_use]
extern crate tracing;

mod agent;
mod config;
mod error;
mod hotplug;
mod input_source;
mod logging;
mod monitor;
mod orchestrator;
mod permissions;
mod protocols;
#[cfg(test)]
mod test_utils;
mod wake;

fn main() -> ExitCode {
    logging::setup_logs();

    let config = match Config::load(None) {
        Ok(config) => config,
        Err(err) => {
            error!("Could not load configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> Result<()> {
    let lock = InstanceLock::acquire_default()?;
    debug!("Holding instance lock {:?}", lock.path());

    permissions::log_diagnostics(&TracingSink::new("permissions"));

    let agent = Agent::new(
        config,
        UdevEventSource::new(TracingSink::shared("hotplug")),
        DdcTransport::new(TracingSink::shared("ddc")),
        ScreenSaverWake::new(TracingSink::shared("wake")),
        TracingSink::shared("orchestrator"),
    );
    agent.run()
}
