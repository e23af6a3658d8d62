use std::fs;
use std::path::Path;

use bevy_utils::tracing::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::career::catalog::{AttributeBonus, CareerCatalog, CareerDefinition, StartingResource};
use crate::career::host::ResourceRegistry;
use crate::core::ident::NamespacedId;
use crate::sync::wire::MAX_ID_LEN;

/// Icon path, in the default namespace, for careers whose icon is missing or invalid.
pub const FALLBACK_ICON_PATH: &str = "book";

/// Catalog file as operators write it. Every field is optional; validation fills the gaps.
///
/// Fields of the wrong JSON type read as absent instead of failing the whole file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCareerCatalog {
    #[serde(
        default,
        deserialize_with = "lenient::entries",
        skip_serializing_if = "Option::is_none"
    )]
    pub careers: Option<Vec<Option<RawCareer>>>,
    #[serde(
        rename = "lockAfterChoice",
        default,
        deserialize_with = "lenient::flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub lock_after_choice: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCareer {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "lenient::entries", skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<Option<RawAttribute>>>,
    #[serde(default, deserialize_with = "lenient::entries", skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Option<RawItem>>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAttribute {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Absent or unreadable values count as 0.
    #[serde(default, deserialize_with = "lenient::float", skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawItem {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Absent, unreadable or non-positive counts become 1.
    #[serde(default, deserialize_with = "lenient::integer", skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
}

/// Field readers that map a mistyped JSON value to `None`.
mod lenient {
    use bevy_utils::tracing::warn;
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Strings as-is; numbers and booleans in their JSON spelling.
    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn float<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => Some(b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// A list whose malformed elements read as `None`. Anything but an array reads as absent.
    pub fn entries<'de, D, T>(d: D) -> Result<Option<Vec<Option<T>>>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let Value::Array(items) = Value::deserialize(d)? else {
            return Ok(None);
        };
        let entries = items
            .into_iter()
            .map(|item| match serde_json::from_value::<Option<T>>(item) {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("ignoring malformed catalog entry: {}", err);
                    None
                }
            })
            .collect();
        Ok(Some(entries))
    }
}

#[derive(Debug)]
pub enum CatalogError {
    Io { path: String, source: std::io::Error },
    Json { path: String, source: serde_json::Error },
    Write { path: String, source: std::io::Error },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path, source)
            }
            CatalogError::Json { path, source } => {
                write!(f, "failed to parse {}: {}", path, source)
            }
            CatalogError::Write { path, source } => {
                write!(f, "failed to write {}: {}", path, source)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// Load the career catalog, writing the built-in defaults first if the file is missing.
///
/// Never fails: unreadable or unparsable files fall back to the built-in defaults.
pub fn load_career_catalog(path: impl AsRef<Path>, registry: &dyn ResourceRegistry) -> CareerCatalog {
    let path = path.as_ref();
    match ensure_default_file(path) {
        Ok(true) => info!("no career catalog found, wrote defaults to {}", path.display()),
        Ok(false) => {}
        Err(err) => error!("could not write default career catalog: {}", err),
    }

    let catalog = match read_raw_catalog(path) {
        Ok(raw) => validate_catalog(&raw, registry),
        Err(err) => {
            error!("{}; using built-in career defaults", err);
            validate_catalog(&default_raw_catalog(), registry)
        }
    };
    info!("loaded {} career definitions", catalog.len());
    catalog
}

pub fn read_raw_catalog(path: &Path) -> Result<RawCareerCatalog, CatalogError> {
    let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CatalogError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Returns `Ok(true)` when the defaults were written.
fn ensure_default_file(path: &Path) -> Result<bool, CatalogError> {
    if path.exists() {
        return Ok(false);
    }
    let write_err = |source: std::io::Error| CatalogError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let body = serde_json::to_string_pretty(&default_raw_catalog())
        .map_err(|err| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))?;
    fs::write(path, body).map_err(write_err)?;
    Ok(true)
}

/// Turn raw entries into definitions, dropping what cannot be used and keeping the rest.
pub fn validate_catalog(raw: &RawCareerCatalog, registry: &dyn ResourceRegistry) -> CareerCatalog {
    let mut catalog = CareerCatalog::new(raw.lock_after_choice.unwrap_or(true));
    let Some(entries) = raw.careers.as_ref() else {
        return catalog;
    };

    for entry in entries.iter().flatten() {
        let Some(def) = validate_career(entry, registry) else {
            continue;
        };
        let id = def.id.clone();
        if catalog.insert(def).is_some() {
            warn!("duplicate career id {}, later entry replaces earlier one", id);
        }
    }
    catalog
}

fn validate_career(raw: &RawCareer, registry: &dyn ResourceRegistry) -> Option<CareerDefinition> {
    let id = raw.id.as_deref().unwrap_or("").trim().to_lowercase();
    if id.is_empty() {
        warn!("skipping career entry without id");
        return None;
    }
    if id.chars().count() > MAX_ID_LEN {
        warn!("skipping career {}: id longer than {} characters", id, MAX_ID_LEN);
        return None;
    }

    let name = raw.name.clone().unwrap_or_else(|| id.clone());
    let description = raw.description.clone().unwrap_or_default();
    let icon = NamespacedId::try_parse_opt(raw.icon.as_deref()).unwrap_or_else(fallback_icon);

    let mut attributes = Vec::new();
    for attr in raw.attributes.iter().flatten().flatten() {
        match NamespacedId::try_parse_opt(attr.id.as_deref()) {
            Some(attribute_id) => attributes.push(AttributeBonus {
                attribute_id,
                value: attr.value.unwrap_or(0.0),
            }),
            None => warn!("career {}: ignoring invalid attribute id {:?}", id, attr.id),
        }
    }

    let mut starting_resources = Vec::new();
    for item in raw.items.iter().flatten().flatten() {
        match NamespacedId::try_parse_opt(item.id.as_deref()) {
            Some(resource_id) if registry.contains(&resource_id) => {
                starting_resources.push(StartingResource {
                    resource_id,
                    count: item.count.unwrap_or(1).clamp(1, i32::MAX as i64) as u32,
                })
            }
            _ => warn!("career {}: ignoring invalid starting item {:?}", id, item.id),
        }
    }

    Some(CareerDefinition {
        id,
        name,
        description,
        icon,
        attributes,
        starting_resources,
    })
}

fn fallback_icon() -> NamespacedId {
    NamespacedId::in_default_namespace(FALLBACK_ICON_PATH)
}

pub fn default_raw_catalog() -> RawCareerCatalog {
    let career = |id: &str,
                  name: &str,
                  description: &str,
                  icon: &str,
                  attributes: &[(&str, f64)],
                  items: &[(&str, i64)]| RawCareer {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        description: Some(description.to_string()),
        icon: Some(icon.to_string()),
        attributes: Some(
            attributes
                .iter()
                .map(|(id, value)| {
                    Some(RawAttribute {
                        id: Some(id.to_string()),
                        value: Some(*value),
                    })
                })
                .collect(),
        ),
        items: Some(
            items
                .iter()
                .map(|(id, count)| {
                    Some(RawItem {
                        id: Some(id.to_string()),
                        count: Some(*count),
                    })
                })
                .collect(),
        ),
    };

    RawCareerCatalog {
        careers: Some(vec![
            Some(career(
                "warrior",
                "Warrior",
                "Heavy armor and close combat. Gets in close and soaks up damage.",
                "minecraft:iron_sword",
                &[
                    ("minecraft:generic.armor", 1.0),
                    ("minecraft:generic.attack_damage", 1.0),
                ],
                &[("minecraft:iron_sword", 1), ("minecraft:bread", 8)],
            )),
            Some(career(
                "mage",
                "Mage",
                "More health and luck, leaning on skills for damage.",
                "minecraft:blaze_powder",
                &[
                    ("minecraft:generic.max_health", 4.0),
                    ("minecraft:generic.luck", 1.0),
                ],
                &[("minecraft:book", 3), ("minecraft:stick", 1)],
            )),
            Some(career(
                "scout",
                "Scout",
                "Moves faster and reaches further.",
                "minecraft:feather",
                &[
                    ("minecraft:generic.movement_speed", 0.05),
                    ("forge:entity_reach", 0.5),
                ],
                &[("minecraft:bow", 1), ("minecraft:arrow", 24)],
            )),
        ]),
        lock_after_choice: Some(true),
    }
}
