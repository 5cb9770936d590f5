//! Emergency halt flag, kept as its own object so the core and the bridge
//! collaborator can share the activation fan-out explicitly.

use tracing::*;

use crate::errors::EmergencyError;

/// Process-wide halt switch.  While active, sequencing and verification
/// reject every call; only the admin can clear it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EmergencyState {
    active: bool,
}

impl EmergencyState {
    pub fn new() -> Self {
        Self { active: false }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self) -> Result<(), EmergencyError> {
        if self.active {
            return Err(EmergencyError::AlreadyActive);
        }
        warn!("emergency state activated");
        self.active = true;
        Ok(())
    }

    pub fn deactivate(&mut self) -> Result<(), EmergencyError> {
        if !self.active {
            return Err(EmergencyError::NotActive);
        }
        info!("emergency state deactivated");
        self.active = false;
        Ok(())
    }
}
