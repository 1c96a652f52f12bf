//! Column type registration.
//!
//! Every column type used by a match must be registered in a
//! [`ColumnRegistry`] before the entity table is built. Registration assigns
//! the lowest unused [`ColumnTypeId`]; because the id doubles as the wire
//! identifier for data-change events, the registration *order* is a
//! compatibility contract between the authoritative server and its mirrors.
//! There is no runtime registration: the set is closed once a table is built.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use crate::column::{AnyColumn, Column, ColumnData};

// ---------------------------------------------------------------------------
// ColumnTypeId
// ---------------------------------------------------------------------------

/// Small stable identifier for a registered column type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ColumnTypeId(pub u8);

impl fmt::Debug for ColumnTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColumnTypeId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ColumnInfo
// ---------------------------------------------------------------------------

type ColumnCtor = fn(&'static str, u32) -> Box<dyn AnyColumn>;

fn make_column<T: ColumnData>(name: &'static str, capacity: u32) -> Box<dyn AnyColumn> {
    Box::new(Column::<T>::new(name, capacity))
}

/// Metadata about a registered column type, including the constructor the
/// entity table uses to build its container.
pub struct ColumnInfo {
    pub id: ColumnTypeId,
    pub name: &'static str,
    pub type_id: TypeId,
    pub(crate) ctor: ColumnCtor,
}

impl fmt::Debug for ColumnInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ColumnRegistry
// ---------------------------------------------------------------------------

/// Registry mapping Rust types to [`ColumnTypeId`]s.
///
/// A type can only be registered once; re-registering returns the existing
/// id. Ids are assigned densely, first registered lowest.
#[derive(Debug, Default)]
pub struct ColumnRegistry {
    by_type: HashMap<TypeId, ColumnTypeId>,
    by_name: HashMap<&'static str, ColumnTypeId>,
    infos: Vec<ColumnInfo>,
}

impl ColumnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a column type under `name`, returning its id.
    ///
    /// # Panics
    ///
    /// Panics when `name` is already taken by a different type, or when the
    /// id space (`u8`) is exhausted; both are startup configuration errors.
    pub fn register<T: ColumnData>(&mut self, name: &'static str) -> ColumnTypeId {
        let rust_type = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&rust_type) {
            return existing;
        }
        assert!(
            !self.by_name.contains_key(name),
            "column name '{name}' is already registered for a different type"
        );
        // u8::MAX is the column map's "no type" sentinel and can never be a
        // real id.
        assert!(
            self.infos.len() < u8::MAX as usize,
            "column type id space exhausted"
        );

        let id = ColumnTypeId(self.infos.len() as u8);
        self.infos.push(ColumnInfo {
            id,
            name,
            type_id: rust_type,
            ctor: make_column::<T>,
        });
        self.by_type.insert(rust_type, id);
        self.by_name.insert(name, id);
        id
    }

    /// Look up a column type by its Rust type.
    pub fn lookup<T: ColumnData>(&self) -> Option<ColumnTypeId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Look up a column type by its registered name.
    pub fn lookup_by_name(&self, name: &str) -> Option<ColumnTypeId> {
        self.by_name.get(name).copied()
    }

    pub fn info(&self, id: ColumnTypeId) -> Option<&ColumnInfo> {
        self.infos.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Build one container per registered type, indexed by id.
    pub(crate) fn build_containers(&self, capacity: u32) -> Vec<Box<dyn AnyColumn>> {
        self.infos
            .iter()
            .map(|info| (info.ctor)(info.name, capacity))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
    struct Hp(i32);

    #[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
    struct Speed(f32);

    #[test]
    fn ids_assigned_in_registration_order() {
        let mut reg = ColumnRegistry::new();
        let hp = reg.register::<Hp>("health");
        let speed = reg.register::<Speed>("speed");
        assert_eq!(hp, ColumnTypeId(0));
        assert_eq!(speed, ColumnTypeId(1));
    }

    #[test]
    fn reregistering_same_type_returns_same_id() {
        let mut reg = ColumnRegistry::new();
        let a = reg.register::<Hp>("health");
        let b = reg.register::<Hp>("health_again");
        assert_eq!(a, b);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn lookup_by_type_and_name() {
        let mut reg = ColumnRegistry::new();
        let id = reg.register::<Hp>("health");
        assert_eq!(reg.lookup::<Hp>(), Some(id));
        assert_eq!(reg.lookup_by_name("health"), Some(id));
        assert_eq!(reg.lookup::<Speed>(), None);
        assert_eq!(reg.info(id).unwrap().name, "health");
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_name_different_type_panics() {
        let mut reg = ColumnRegistry::new();
        reg.register::<Hp>("health");
        reg.register::<Speed>("health");
    }
}
