//! Seams to the host process: attribute modifiers, the resource registry and
//! each user's holdings. The host implements these; tests plug in fakes.

use std::fmt;

use bevy_ecs::prelude::*;

use crate::core::ident::{NamespacedId, UserId};

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeError {
    UnknownAttribute(NamespacedId),
    RejectedValue { attribute: NamespacedId, value: f64 },
    NotManaged(NamespacedId),
}

impl fmt::Display for AttributeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeError::UnknownAttribute(id) => write!(f, "unknown attribute {}", id),
            AttributeError::RejectedValue { attribute, value } => {
                write!(f, "value {} rejected for attribute {}", value, attribute)
            }
            AttributeError::NotManaged(id) => write!(f, "attribute {} is not managed", id),
        }
    }
}

impl std::error::Error for AttributeError {}

/// Third-party attribute service holding per-user "extra" modifiers.
pub trait AttributeModifiers: Send + Sync {
    fn set_extra(
        &mut self,
        user: UserId,
        attribute: &NamespacedId,
        value: f64,
    ) -> Result<(), AttributeError>;
    fn reset_extra(&mut self, user: UserId, attribute: &NamespacedId) -> Result<(), AttributeError>;
}

/// Registry of grantable resources known to the host.
pub trait ResourceRegistry: Send + Sync {
    fn contains(&self, resource: &NamespacedId) -> bool;
}

/// A user's primary holding area plus the environment around them.
pub trait ResourceHolder: Send + Sync {
    /// Store up to `count` units; returns how many did not fit.
    fn insert(&mut self, user: UserId, resource: &NamespacedId, count: u32) -> u32;
    /// Place units next to the user instead of holding them.
    fn drop_near(&mut self, user: UserId, resource: &NamespacedId, count: u32);
}

/// Host collaborators shared by the career systems.
///
/// `attributes` is `None` when the attribute service is not installed.
#[derive(Resource)]
pub struct CareerHost {
    pub attributes: Option<Box<dyn AttributeModifiers>>,
    pub registry: Box<dyn ResourceRegistry>,
    pub holdings: Box<dyn ResourceHolder>,
}

impl CareerHost {
    pub fn new(registry: Box<dyn ResourceRegistry>, holdings: Box<dyn ResourceHolder>) -> Self {
        Self {
            attributes: None,
            registry,
            holdings,
        }
    }

    pub fn with_attributes(mut self, attributes: Box<dyn AttributeModifiers>) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

/// Local-only message shown to a single user, optionally with a clickable command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub shortcut: Option<String>,
}

impl Notice {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            shortcut: None,
        }
    }

    pub fn with_shortcut(text: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            shortcut: Some(command.into()),
        }
    }
}
