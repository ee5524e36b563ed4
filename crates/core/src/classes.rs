//! Class name to class id mapping

use crate::error::{Error, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Integer class identifier stored in masks, sample tables and class maps.
pub type ClassId = u16;

/// Reserved id for pixels not covered by any polygon, or not classified.
pub const UNCLASSIFIED: ClassId = 0;

/// Bijection between class names and positive class ids.
///
/// Ids are assigned `1, 2, 3, ...` in first-occurrence order. The order is
/// part of the contract (it fixes the row order of sample tables), so the
/// names are kept in an insertion-ordered set: the id of a name is its
/// position plus one.
#[derive(Debug, Clone, Default)]
pub struct ClassMapping {
    names: IndexSet<String>,
}

// IndexSet equality ignores order; two mappings are equal only when every
// name carries the same id.
impl PartialEq for ClassMapping {
    fn eq(&self, other: &Self) -> bool {
        self.names.len() == other.names.len() && self.names.iter().eq(other.names.iter())
    }
}

impl Eq for ClassMapping {}

/// One serialized mapping entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub name: String,
    pub id: ClassId,
}

impl ClassMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping from names in occurrence order; repeats keep their first id
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut mapping = Self::new();
        for name in names {
            mapping.insert(name)?;
        }
        Ok(mapping)
    }

    /// Return the id of `name`, assigning the next free id on first sight
    pub fn insert(&mut self, name: impl Into<String>) -> Result<ClassId> {
        let name = name.into();
        if let Some(index) = self.names.get_index_of(&name) {
            return Self::index_to_id(index);
        }
        let id = Self::index_to_id(self.names.len())?;
        self.names.insert(name);
        Ok(id)
    }

    /// Id assigned to `name`
    pub fn id(&self, name: &str) -> Option<ClassId> {
        self.names
            .get_index_of(name)
            .and_then(|index| Self::index_to_id(index).ok())
    }

    /// Name behind `id`; `None` for [`UNCLASSIFIED`] and unknown ids
    pub fn name(&self, id: ClassId) -> Option<&str> {
        if id == UNCLASSIFIED {
            return None;
        }
        self.names.get_index(id as usize - 1).map(String::as_str)
    }

    /// Whether `id` belongs to a real class of this mapping
    pub fn contains_id(&self, id: ClassId) -> bool {
        id != UNCLASSIFIED && (id as usize) <= self.names.len()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Highest assigned id, [`UNCLASSIFIED`] when empty
    pub fn max_id(&self) -> ClassId {
        self.names.len() as ClassId
    }

    /// Assigned ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = ClassId> {
        1..=self.max_id()
    }

    /// `(name, id)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, ClassId)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| (name.as_str(), (index + 1) as ClassId))
    }

    /// Entries in id order, the persisted form
    pub fn entries(&self) -> Vec<ClassEntry> {
        self.iter()
            .map(|(name, id)| ClassEntry {
                name: name.to_string(),
                id,
            })
            .collect()
    }

    /// Rebuild a mapping from persisted entries.
    ///
    /// Entries must carry the ids `1..=K` in order with unique names.
    pub fn from_entries(entries: &[ClassEntry]) -> Result<Self> {
        let mut mapping = Self::new();
        for (index, entry) in entries.iter().enumerate() {
            let id = mapping.insert(entry.name.clone())?;
            if id as usize != index + 1 || id != entry.id {
                return Err(Error::Schema(format!(
                    "class mapping entry {} ('{}', id {}) breaks the 1..K id sequence",
                    index, entry.name, entry.id
                )));
            }
        }
        Ok(mapping)
    }

    fn index_to_id(index: usize) -> Result<ClassId> {
        ClassId::try_from(index + 1).map_err(|_| Error::InvalidParameter {
            name: "class count",
            value: (index + 1).to_string(),
            reason: format!("at most {} classes can be encoded", ClassId::MAX),
        })
    }
}

impl Serialize for ClassMapping {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.entries().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ClassMapping {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let entries = Vec::<ClassEntry>::deserialize(deserializer)?;
        ClassMapping::from_entries(&entries).map_err(serde::de::Error::custom)
    }
}
