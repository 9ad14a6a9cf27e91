// SPDX-License-Identifier: GPL-3.0-only
//! Startup check of what DDC/CI needs from the system
//!
//! Nothing here is fatal: a missing requirement only explains in the log why
//! switching is about to fail.

use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::LogSink;

#[derive(Debug, Clone)]
pub struct PermissionCheckResult {
    pub requirements: Vec<PermissionRequirement>,
}

#[derive(Debug, Clone)]
pub struct PermissionRequirement {
    pub name: String,
    pub description: String,
    pub status: RequirementStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequirementStatus {
    Met,
    NotMet,
    NotApplicable,
    Partial, // informational, not blocking
}

impl RequirementStatus {
    fn marker(&self) -> &'static str {
        match self {
            RequirementStatus::Met => "✓",
            RequirementStatus::NotMet => "✗",
            RequirementStatus::NotApplicable => "-",
            RequirementStatus::Partial => "~",
        }
    }
}

impl PermissionCheckResult {
    pub fn has_issues(&self) -> bool {
        self.requirements
            .iter()
            .any(|r| r.status == RequirementStatus::NotMet)
    }

    pub fn summary(&self) -> String {
        let not_met = self
            .requirements
            .iter()
            .filter(|r| r.status == RequirementStatus::NotMet)
            .count();

        if not_met == 0 {
            let met_count = self
                .requirements
                .iter()
                .filter(|r| r.status == RequirementStatus::Met)
                .count();
            format!("All {} requirements met", met_count)
        } else {
            format!("{} requirement(s) not met", not_met)
        }
    }

    /// Summary at info, unmet requirements at error, the rest at debug
    pub fn log_to(&self, log: &dyn LogSink) {
        log.info(&format!("Permission check: {}", self.summary()));

        for req in &self.requirements {
            let line = format!("  {} {}: {}", req.status.marker(), req.name, req.description);
            if req.status == RequirementStatus::NotMet {
                log.error(&line);
            } else {
                log.debug(&line);
            }
        }

        if self.has_issues() {
            log.error("DDC/CI input switching will fail until the requirements above are met");
        }
    }
}

/// Check if the current user has the necessary permissions to access I2C devices
pub fn check_i2c_permissions() -> PermissionCheckResult {
    let i2c_devices = find_i2c_devices();
    let accessible_count = i2c_devices.iter().filter(|d| can_write(d)).count();
    let in_i2c_group = is_in_i2c_group();
    let i2c_rules_exist = Path::new("/etc/udev/rules.d/45-i2c-permissions.rules").exists()
        || Path::new("/usr/lib/udev/rules.d/45-i2c-permissions.rules").exists();

    build_report(i2c_devices.len(), accessible_count, in_i2c_group, i2c_rules_exist)
}

/// Check and log in one go, as done at startup
pub fn log_diagnostics(log: &dyn LogSink) {
    check_i2c_permissions().log_to(log);
}

fn build_report(
    device_count: usize,
    accessible_count: usize,
    in_i2c_group: bool,
    i2c_rules_exist: bool,
) -> PermissionCheckResult {
    let mut requirements = Vec::new();

    // 1. I2C buses (one per DDC-capable connector)
    requirements.push(PermissionRequirement {
        name: "I2C devices".to_string(),
        description: if device_count == 0 {
            "No /dev/i2c-* devices found (is the i2c-dev module loaded?)".to_string()
        } else {
            format!("Found {} I2C device(s)", device_count)
        },
        status: if device_count == 0 {
            RequirementStatus::NotMet
        } else {
            RequirementStatus::Met
        },
    });

    // 2. Read/write access (DDC/CI needs both)
    requirements.push(PermissionRequirement {
        name: "I2C read/write access".to_string(),
        description: if device_count == 0 {
            "N/A".to_string()
        } else if accessible_count == device_count {
            format!("Can access all {} device(s)", accessible_count)
        } else if accessible_count > 0 {
            format!("Can access {}/{} device(s)", accessible_count, device_count)
        } else {
            "Cannot access any I2C devices".to_string()
        },
        status: if device_count == 0 {
            RequirementStatus::NotApplicable
        } else if accessible_count == device_count {
            RequirementStatus::Met
        } else if accessible_count > 0 {
            // Non-display buses are often root-only; partial access still works
            RequirementStatus::Partial
        } else {
            RequirementStatus::NotMet
        },
    });

    // 3. i2c group membership only matters when access is missing
    requirements.push(PermissionRequirement {
        name: "i2c group".to_string(),
        description: if in_i2c_group {
            "User is in i2c group".to_string()
        } else {
            "User not in i2c group".to_string()
        },
        status: if in_i2c_group {
            RequirementStatus::Met
        } else if accessible_count > 0 {
            RequirementStatus::NotApplicable
        } else {
            RequirementStatus::NotMet
        },
    });

    // 4. udev rules
    requirements.push(PermissionRequirement {
        name: "udev rules (I2C)".to_string(),
        description: if i2c_rules_exist {
            "I2C udev rules installed".to_string()
        } else {
            "I2C udev rules not found".to_string()
        },
        status: if i2c_rules_exist {
            RequirementStatus::Met
        } else {
            RequirementStatus::NotApplicable
        },
    });

    PermissionCheckResult { requirements }
}

/// Find all I2C device files
fn find_i2c_devices() -> Vec<PathBuf> {
    (0..256)
        .map(|i| PathBuf::from(format!("/dev/i2c-{}", i)))
        .filter(|path| path.exists())
        .collect()
}

/// Check if we can write to a device
fn can_write(path: &Path) -> bool {
    fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .is_ok()
}

/// Check if current user is in the i2c group
fn is_in_i2c_group() -> bool {
    use std::process::Command;

    match Command::new("groups").output() {
        Ok(output) => match String::from_utf8(output.stdout) {
            Ok(groups_str) => groups_str.split_whitespace().any(|g| g == "i2c"),
            Err(e) => {
                debug!("Failed to parse groups output: {}", e);
                false
            }
        },
        Err(e) => {
            debug!("Failed to run groups command: {}", e);
            false
        }
    }
}
