use std::collections::HashMap;

use bevy_ecs::prelude::*;

use crate::core::ident::NamespacedId;

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeBonus {
    pub attribute_id: NamespacedId,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartingResource {
    pub resource_id: NamespacedId,
    pub count: u32,
}

/// Validated, immutable career profile.
#[derive(Debug, Clone, PartialEq)]
pub struct CareerDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: NamespacedId,
    pub attributes: Vec<AttributeBonus>,
    pub starting_resources: Vec<StartingResource>,
}

impl CareerDefinition {
    pub fn bonus_ids(&self) -> impl Iterator<Item = &NamespacedId> {
        self.attributes.iter().map(|bonus| &bonus.attribute_id)
    }
}

/// Read-only registry of careers, replaced wholesale on load.
///
/// Iteration follows load order so pickers show careers the way the catalog lists them.
#[derive(Resource, Debug, Clone)]
pub struct CareerCatalog {
    careers: Vec<CareerDefinition>,
    index: HashMap<String, usize>,
    lock_after_choice: bool,
}

impl Default for CareerCatalog {
    fn default() -> Self {
        Self {
            careers: Vec::new(),
            index: HashMap::new(),
            lock_after_choice: true,
        }
    }
}

impl CareerCatalog {
    pub fn new(lock_after_choice: bool) -> Self {
        Self {
            lock_after_choice,
            ..Self::default()
        }
    }

    /// Insert a career. Returns the definition it replaced, if the id was taken.
    pub fn insert(&mut self, def: CareerDefinition) -> Option<CareerDefinition> {
        match self.index.get(&def.id) {
            Some(&slot) => Some(std::mem::replace(&mut self.careers[slot], def)),
            None => {
                self.index.insert(def.id.clone(), self.careers.len());
                self.careers.push(def);
                None
            }
        }
    }

    pub fn find(&self, id: &str) -> Option<&CareerDefinition> {
        self.index.get(id).map(|&slot| &self.careers[slot])
    }

    pub fn careers(&self) -> &[CareerDefinition] {
        &self.careers
    }

    pub fn len(&self) -> usize {
        self.careers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.careers.is_empty()
    }

    pub fn lock_after_choice(&self) -> bool {
        self.lock_after_choice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn career(id: &str, name: &str) -> CareerDefinition {
        CareerDefinition {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            icon: NamespacedId::try_parse("book").unwrap(),
            attributes: Vec::new(),
            starting_resources: Vec::new(),
        }
    }

    #[test]
    fn replacing_an_id_keeps_first_position() {
        let mut catalog = CareerCatalog::new(true);
        assert!(catalog.insert(career("warrior", "First")).is_none());
        catalog.insert(career("mage", "Mage"));
        let replaced = catalog.insert(career("warrior", "Second"));

        assert_eq!(replaced.map(|def| def.name), Some("First".to_string()));
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.careers()[0].name, "Second");
        assert_eq!(catalog.find("warrior").unwrap().name, "Second");
    }

    #[test]
    fn unknown_id_finds_nothing() {
        let catalog = CareerCatalog::default();
        assert!(catalog.find("ghost").is_none());
        assert!(catalog.lock_after_choice());
    }
}
