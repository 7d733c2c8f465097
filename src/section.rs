use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    entries: HashMap<String, Entry>,
    next_position: usize,
}

/// A raw option value plus the position it was last written at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    position: usize,
    value: String,
}

impl Section {
    #[must_use]
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            entries: HashMap::with_capacity(16),
            next_position: 0,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn get(&self, option: &str) -> Option<&str> {
        self.entries.get(option).map(|entry| entry.value.as_str())
    }

    #[must_use]
    pub fn contains(&self, option: &str) -> bool {
        self.entries.contains_key(option)
    }

    /// Option names in the order they were last written.
    pub fn options(&self) -> impl Iterator<Item = &str> {
        let mut entries = self.entries.iter().collect::<Vec<_>>();
        entries.sort_unstable_by_key(|(_, entry)| entry.position);
        entries.into_iter().map(|(name, _)| name.as_str())
    }

    /// Returns `true` if `option` was not present before.
    pub(crate) fn insert(&mut self, option: &str, value: String) -> bool {
        let entry = Entry {
            position: self.next_position,
            value,
        };
        self.next_position += 1;

        self.entries.insert(option.to_owned(), entry).is_none()
    }
}
