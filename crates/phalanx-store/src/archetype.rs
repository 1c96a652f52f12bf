//! Archetypes: named bundles of column values spawned as a unit.
//!
//! An [`Archetype`] lists the column types an object kind carries together
//! with the initial value each one starts from. It is assembled once at
//! match configuration time and reused for every spawn of that kind.

use crate::column::ColumnData;
use crate::entity::EntityId;
use crate::registry::ColumnRegistry;
use crate::store::EntityStore;

// ---------------------------------------------------------------------------
// Archetype
// ---------------------------------------------------------------------------

trait AttachPart: Send + Sync {
    fn attach(&self, store: &mut EntityStore, id: EntityId);
    fn column_name(&self) -> &'static str;
}

struct Part<T: ColumnData> {
    name: &'static str,
    initial: T,
}

impl<T: ColumnData> AttachPart for Part<T> {
    fn attach(&self, store: &mut EntityStore, id: EntityId) {
        store.attach(id, self.initial.clone());
    }

    fn column_name(&self) -> &'static str {
        self.name
    }
}

/// A named set of `(column type, initial value)` pairs.
pub struct Archetype {
    name: &'static str,
    parts: Vec<Box<dyn AttachPart>>,
}

impl Archetype {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            parts: Vec::new(),
        }
    }

    /// Add a column with its initial value.
    ///
    /// # Panics
    ///
    /// Panics when `T` is not registered; archetypes are built after
    /// registration closes, so this is a configuration error.
    pub fn with<T: ColumnData>(mut self, registry: &ColumnRegistry, initial: T) -> Self {
        let info = registry
            .lookup::<T>()
            .and_then(|id| registry.info(id))
            .unwrap_or_else(|| {
                panic!(
                    "archetype '{}' references unregistered column type {}",
                    self.name,
                    std::any::type_name::<T>()
                )
            });
        self.parts.push(Box::new(Part {
            name: info.name,
            initial,
        }));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Names of the columns this archetype attaches, in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.parts.iter().map(|p| p.column_name())
    }

    pub(crate) fn attach_all(&self, store: &mut EntityStore, id: EntityId) {
        for part in &self.parts {
            part.attach(store, id);
        }
    }
}

impl std::fmt::Debug for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archetype")
            .field("name", &self.name)
            .field("columns", &self.column_names().collect::<Vec<_>>())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
