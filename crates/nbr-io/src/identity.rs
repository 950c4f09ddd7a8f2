//! Identity resolution while loading a document.
//!
//! A supply used by three circuits appears four times in a saved document:
//! once in the catalogue and once inside each circuit. Loading must produce
//! a single catalogue entry, and must refuse a document in which two copies
//! with the same ID disagree.
//!
//! A [`LoadContext`] is created for every load call and dropped with it, so
//! nothing registered while reading one document is visible to the next.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::trace;
use uuid::Uuid;

use nbr_core::{LoadType, LoadTypeId, NbrError, NbrResult, Supply, SupplyId, WireType, WireTypeId};

/// An entity persisted with a stable identifier.
pub trait Identified: Clone + PartialEq {
    type Id: Copy + Eq + Hash;

    /// Entity kind used in conflict messages
    const KIND: &'static str;

    fn id(&self) -> Self::Id;
    fn uuid(&self) -> Uuid;
}

impl Identified for Supply {
    type Id = SupplyId;
    const KIND: &'static str = SupplyId::KIND;

    fn id(&self) -> SupplyId {
        self.id
    }

    fn uuid(&self) -> Uuid {
        self.id.uuid()
    }
}

impl Identified for LoadType {
    type Id = LoadTypeId;
    const KIND: &'static str = LoadTypeId::KIND;

    fn id(&self) -> LoadTypeId {
        self.id
    }

    fn uuid(&self) -> Uuid {
        self.id.uuid()
    }
}

impl Identified for WireType {
    type Id = WireTypeId;
    const KIND: &'static str = WireTypeId::KIND;

    fn id(&self) -> WireTypeId {
        self.id
    }

    fn uuid(&self) -> Uuid {
        self.id.uuid()
    }
}

/// Arena of resolved entities, indexed by ID, in first-seen order.
#[derive(Debug, Clone)]
pub struct Registry<T: Identified> {
    items: Vec<T>,
    index: HashMap<T::Id, usize>,
}

impl<T: Identified> Default for Registry<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Identified> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payload, reusing the live instance when its ID is known.
    ///
    /// Returns the ID the payload resolves to. A payload whose ID is known
    /// but whose content differs is an [`NbrError::IdentityConflict`].
    pub fn resolve(&mut self, item: T) -> NbrResult<T::Id> {
        let id = item.id();
        match self.index.get(&id) {
            Some(&slot) if self.items[slot] == item => Ok(id),
            Some(_) => Err(NbrError::IdentityConflict {
                kind: T::KIND,
                id: item.uuid(),
            }),
            None => {
                trace!(kind = T::KIND, id = %item.uuid(), "registered");
                self.index.insert(id, self.items.len());
                self.items.push(item);
                Ok(id)
            }
        }
    }

    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.index.get(&id).map(|&slot| &self.items[slot])
    }

    pub fn contains(&self, id: T::Id) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// Registries for every shared entity kind, scoped to one load operation.
#[derive(Debug, Clone, Default)]
pub struct LoadContext {
    pub supplies: Registry<Supply>,
    pub load_types: Registry<LoadType>,
    pub wire_types: Registry<WireType>,
}

impl LoadContext {
    pub fn new() -> Self {
        Self::default()
    }
}
