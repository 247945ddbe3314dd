//! The staged batch: ordered entries keyed by file name.

use serde::Serialize;

use super::normalize::NormalizedImage;

/// One staged image and its inline preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub image: NormalizedImage,
    pub preview: String,
}

impl BatchEntry {
    pub fn name(&self) -> &str {
        self.image.name()
    }
}

/// Why the last intake pass did not stage everything it was given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Truncation {
    /// An image candidate arrived after the batch was full
    pub by_capacity: bool,
    /// A non-empty candidate set staged nothing
    pub nothing_added: bool,
}

impl Truncation {
    /// Combined flag: either condition holds.
    pub fn any(&self) -> bool {
        self.by_capacity || self.nothing_added
    }
}

/// Ordered entries in selection order.
///
/// Only the intake controller appends; [`Batch::reset`] empties it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    entries: Vec<BatchEntry>,
    truncation: Truncation,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BatchEntry> {
        self.entries.iter()
    }

    /// Looks up an entry by exact name.
    pub fn get(&self, name: &str) -> Option<&BatchEntry> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(BatchEntry::name)
    }

    /// Sum of staged payload sizes.
    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|entry| entry.image.image.len()).sum()
    }

    pub fn truncation(&self) -> Truncation {
        self.truncation
    }

    /// Legacy combined flag from the last intake pass.
    pub fn truncated(&self) -> bool {
        self.truncation.any()
    }

    /// Empties the batch and clears truncation signals.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.truncation = Truncation::default();
    }

    pub(crate) fn push(&mut self, entry: BatchEntry) {
        self.entries.push(entry);
    }

    /// Swaps the entry sharing `entry`'s name, keeping its position.
    /// Returns false when no entry has that name.
    pub(crate) fn replace(&mut self, entry: BatchEntry) -> bool {
        match self.entries.iter_mut().find(|e| e.name() == entry.name()) {
            Some(slot) => {
                *slot = entry;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_truncation(&mut self, truncation: Truncation) {
        self.truncation = truncation;
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a BatchEntry;
    type IntoIter = std::slice::Iter<'a, BatchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
pub(crate) fn entry(name: &str, preview: &str) -> BatchEntry {
    use super::normalize::NormalizeOutcome;
    use crate::images::RawImage;

    BatchEntry {
        image: NormalizedImage {
            image: RawImage::new(name, "image/jpeg", name.as_bytes().to_vec()),
            width: 1,
            height: 1,
            outcome: NormalizeOutcome::Unchanged,
        },
        preview: preview.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_insertion_order() {
        let mut batch = Batch::new();
        batch.push(entry("b.jpg", "pb"));
        batch.push(entry("a.jpg", "pa"));

        assert_eq!(batch.names().collect::<Vec<_>>(), ["b.jpg", "a.jpg"]);
        assert_eq!(batch.get("a.jpg").unwrap().preview, "pa");
        assert!(batch.get("c.jpg").is_none());
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut batch = Batch::new();
        batch.push(entry("a.jpg", "old"));
        batch.push(entry("b.jpg", "pb"));

        assert!(batch.replace(entry("a.jpg", "new")));
        assert!(!batch.replace(entry("z.jpg", "pz")));

        assert_eq!(batch.names().collect::<Vec<_>>(), ["a.jpg", "b.jpg"]);
        assert_eq!(batch.get("a.jpg").unwrap().preview, "new");
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut batch = Batch::new();
        batch.push(entry("a.jpg", "pa"));
        batch.set_truncation(Truncation {
            by_capacity: true,
            nothing_added: false,
        });

        batch.reset();
        let once = batch.clone();
        batch.reset();

        assert_eq!(batch, once);
        assert!(batch.is_empty());
        assert!(!batch.truncated());
    }

    #[test]
    fn test_total_bytes() {
        let mut batch = Batch::new();
        batch.push(entry("ab", "p"));
        batch.push(entry("cde", "p"));
        assert_eq!(batch.total_bytes(), 5);
    }
}
