//! Adapter-neutral description of one invocation

use crate::config::DEFAULT_REGION;
use crate::error::LifecycleError;
use std::fmt;
use std::str::FromStr;

/// What an invocation asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    Create,
    Destroy,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Destroy => "destroy",
        }
    }

    /// Parse an optional action string. Absent or empty means create.
    pub fn parse_optional(raw: Option<&str>) -> Result<Self, LifecycleError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Action::Create),
            Some(s) => s.parse(),
        }
    }
}

impl FromStr for Action {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Action::Create),
            "destroy" => Ok(Action::Destroy),
            _ => Err(LifecycleError::UnknownAction),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A create or destroy request, built fresh per invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRequest {
    pub action: Action,
    /// Explicit bucket name; create generates one when absent
    pub name: Option<String>,
    pub region: String,
    /// Middle segment of a generated name (the requesting user, usually)
    pub naming_hint: Option<String>,
    pub notify: bool,
    pub notify_channel_override: Option<String>,
}

impl BucketRequest {
    pub fn new(action: Action, region: impl Into<String>) -> Self {
        Self {
            action,
            name: None,
            region: region.into(),
            naming_hint: None,
            notify: false,
            notify_channel_override: None,
        }
    }

    pub fn create(region: impl Into<String>) -> Self {
        Self::new(Action::Create, region)
    }

    pub fn destroy(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(Action::Destroy, region)
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.naming_hint = Some(hint.into());
        self
    }

    /// Ask for a notification, optionally to a specific channel
    pub fn with_notify(mut self, channel: Option<String>) -> Self {
        self.notify = true;
        self.notify_channel_override = channel;
        self
    }
}

impl Default for BucketRequest {
    fn default() -> Self {
        Self::create(DEFAULT_REGION)
    }
}
