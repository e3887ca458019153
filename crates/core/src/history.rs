//! Registration history stamped on every save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub registered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

impl History {
    /// First save stamps `registered_at`; later saves stamp `modified_at`.
    pub fn audit(&mut self, now: DateTime<Utc>) {
        if self.registered_at.is_none() {
            self.registered_at = Some(now);
        } else {
            self.modified_at = Some(now);
        }
    }

    /// Keeps the registration stamp of a previously stored copy.
    pub fn carry_over(&mut self, stored: &History) {
        self.registered_at = stored.registered_at.or(self.registered_at);
    }
}
