use crate::entity::{EntityError, Property, PropertyValue, is_reserved_name};

///
/// PropertyMap
///
/// Named properties in insertion order. Replacing a property keeps its
/// original position. Equality ignores order.
///

#[derive(Clone, Debug, Default)]
pub struct PropertyMap {
    entries: Vec<(String, Property)>,
}

impl PropertyMap {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or replace a property, rejecting empty and reserved names,
    /// mixed-type collections and values the backend cannot store.
    pub fn set(&mut self, name: impl Into<String>, property: Property) -> Result<(), EntityError> {
        let name = name.into();
        if name.is_empty() {
            return Err(EntityError::EmptyName);
        }
        if is_reserved_name(&name) {
            return Err(EntityError::ReservedName { name });
        }
        for value in property.value.values() {
            value.check_supported()?;
        }
        if let PropertyValue::Multiple(values) = &property.value
            && let Some((head, rest)) = values.split_first()
        {
            let first = head.value_type();
            if let Some(other) = rest.iter().find(|v| v.value_type() != first) {
                return Err(EntityError::MixedCollection {
                    name,
                    first,
                    found: other.value_type(),
                });
            }
        }

        self.insert_unchecked(name, property);

        Ok(())
    }

    // Wire readers trust stored names; reserved names may legitimately
    // appear in index-only results.
    pub(crate) fn insert_unchecked(&mut self, name: String, property: Property) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = property,
            None => self.entries.push((name, property)),
        }
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    pub fn remove(&mut self, name: &str) -> Option<Property> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for PropertyMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(name, property)| other.get(name) == Some(property))
    }
}
