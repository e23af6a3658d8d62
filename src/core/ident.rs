use std::fmt;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Stable identity of a user across reconnects; clones receive a fresh one.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user#{}", self.0)
    }
}

/// `namespace:path` identifier used for icons, attributes and resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespacedId {
    namespace: String,
    path: String,
}

impl NamespacedId {
    /// Parse `namespace:path` or a bare `path` (default namespace).
    /// Returns `None` for anything the host would refuse.
    pub fn try_parse(raw: &str) -> Option<Self> {
        let (namespace, path) = match raw.split_once(':') {
            Some((ns, path)) if ns.is_empty() => (DEFAULT_NAMESPACE, path),
            Some((ns, path)) => (ns, path),
            None => (DEFAULT_NAMESPACE, raw),
        };
        if path.is_empty() {
            return None;
        }
        if !namespace.chars().all(is_namespace_char) || !path.chars().all(is_path_char) {
            return None;
        }
        Some(Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        })
    }

    /// Build an id in the default namespace from a path known to be valid.
    pub(crate) fn in_default_namespace(path: &str) -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            path: path.to_string(),
        }
    }

    /// Parse an optional raw value, as read from hand-edited JSON.
    pub fn try_parse_opt(raw: Option<&str>) -> Option<Self> {
        raw.and_then(Self::try_parse)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_default_namespace(&self) -> bool {
        self.namespace == DEFAULT_NAMESPACE
    }
}

impl fmt::Display for NamespacedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.')
}

fn is_path_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.' | '/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_path_uses_default_namespace() {
        let id = NamespacedId::try_parse("iron_sword").unwrap();
        assert_eq!(id.namespace(), "minecraft");
        assert_eq!(id.to_string(), "minecraft:iron_sword");
    }

    #[test]
    fn keeps_explicit_namespace() {
        let id = NamespacedId::try_parse("forge:entity_reach").unwrap();
        assert_eq!(id.namespace(), "forge");
        assert_eq!(id.path(), "entity_reach");
        assert!(!id.is_default_namespace());
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(NamespacedId::try_parse("Minecraft:Book").is_none());
        assert!(NamespacedId::try_parse("minecraft:").is_none());
        assert!(NamespacedId::try_parse("a:b:c").is_none());
        assert!(NamespacedId::try_parse("has space").is_none());
        assert!(NamespacedId::try_parse_opt(None).is_none());
    }

    #[test]
    fn path_may_contain_slashes() {
        let id = NamespacedId::try_parse("mymod:items/rune").unwrap();
        assert_eq!(id.path(), "items/rune");
    }
}
