//! IPTC metadata: the dataset container and the binary codec.
//!
//! An [`IptcData`] holds an ordered list of datasets, each identified by a
//! `(record, dataset)` pair. Insertion order is preserved across decode and
//! mutation; only [`codec::encode`] sorts, and then only by record id.

pub mod codec;
pub mod datasets;

use thiserror::Error;

use crate::value::{TypeTag, Value};

pub use codec::{decode, encode, DecodeError, DecodeReport, FieldError, MARKER};

/// Identity of one IPTC dataset: record id and dataset number.
///
/// Human-readable names are a derived lookup; equality is the pair only.
/// Both ids occupy a single byte in the encoded stream, so keys handed to
/// [`codec::encode`] must stay within `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatasetKey {
    pub record: u16,
    pub dataset: u16,
}

impl DatasetKey {
    pub fn new(record: u16, dataset: u16) -> Self {
        DatasetKey { record, dataset }
    }

    /// Parse a display key like `"Iptc.Application2.Keywords"`.
    pub fn from_name(name: &str) -> Option<Self> {
        datasets::resolve_key(name).map(|(record, dataset)| DatasetKey { record, dataset })
    }
}

impl std::fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (
            datasets::record_name(self.record),
            datasets::dataset_name(self.dataset, self.record),
        ) {
            (Some(r), Some(d)) => write!(f, "Iptc.{r}.{d}"),
            (Some(r), None) => write!(f, "Iptc.{r}.0x{:04x}", self.dataset),
            _ => write!(f, "Iptc.{}.{}", self.record, self.dataset),
        }
    }
}

/// One dataset: a key and its value. Plain value type; cloning deep-copies.
#[derive(Debug, Clone, PartialEq)]
pub struct IptcEntry {
    pub key: DatasetKey,
    pub value: Value,
}

impl IptcEntry {
    pub fn new(key: DatasetKey, value: Value) -> Self {
        IptcEntry { key, value }
    }

    /// Encoded size of the value in bytes.
    pub fn size(&self) -> usize {
        self.value.size()
    }

    pub fn to_text(&self) -> String {
        self.value.to_text()
    }
}

/// Error from [`IptcData::add`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddError {
    #[error("dataset {0} is not repeatable and already present")]
    DuplicateNonRepeatable(DatasetKey),
}

/// Ordered collection of IPTC datasets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IptcData {
    entries: Vec<IptcEntry>,
}

impl IptcData {
    pub fn new() -> Self {
        IptcData::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IptcEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[IptcEntry] {
        &self.entries
    }

    /// Total encoded size of all datasets: each costs a 5-byte header plus
    /// its payload, plus 4 more bytes when the payload needs the
    /// extended-length escape.
    pub fn size(&self) -> usize {
        self.entries
            .iter()
            .map(|e| {
                let data = e.size();
                5 + data + if data > 32767 { 4 } else { 0 }
            })
            .sum()
    }

    /// Append an entry, enforcing the non-repeatable duplicate policy.
    pub fn add(&mut self, entry: IptcEntry) -> Result<(), AddError> {
        let key = entry.key;
        if !datasets::is_repeatable(key.dataset, key.record) && self.find_id(key).is_some() {
            return Err(AddError::DuplicateNonRepeatable(key));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// First entry with the given key.
    pub fn find_id(&self, key: DatasetKey) -> Option<&IptcEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// First entry with the given display key.
    pub fn find_key(&self, name: &str) -> Option<&IptcEntry> {
        DatasetKey::from_name(name).and_then(|key| self.find_id(key))
    }

    /// Index of the first entry with the given key.
    pub fn position(&self, key: DatasetKey) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }

    /// All entries with the given key, in insertion order.
    pub fn entries_with_id(&self, key: DatasetKey) -> impl Iterator<Item = &IptcEntry> {
        self.entries.iter().filter(move |e| e.key == key)
    }

    pub fn remove_at(&mut self, index: usize) -> IptcEntry {
        self.entries.remove(index)
    }

    /// Remove every entry with the given key; returns how many were removed.
    pub fn remove_all(&mut self, key: DatasetKey) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.key != key);
        before - self.entries.len()
    }

    /// Create-or-replace assignment by display key: parses `text` with the
    /// dataset's declared type and replaces the first existing entry, or
    /// appends a new one.
    pub fn assign(&mut self, name: &str, text: &str) -> bool {
        let Some(key) = DatasetKey::from_name(name) else {
            return false;
        };
        self.assign_id(key, text)
    }

    /// Create-or-replace assignment by numeric key.
    pub fn assign_id(&mut self, key: DatasetKey, text: &str) -> bool {
        let tag = datasets::expected_type(key.dataset, key.record);
        let value = match Value::from_text(tag, text) {
            Ok(v) => v,
            // Fall back to raw text when the declared type rejects it.
            Err(_) => match Value::from_text(TypeTag::Str, text) {
                Ok(v) => v,
                Err(_) => return false,
            },
        };
        match self.position(key) {
            Some(i) => self.entries[i].value = value,
            None => self.entries.push(IptcEntry::new(key, value)),
        }
        true
    }
}

impl<'a> IntoIterator for &'a IptcData {
    type Item = &'a IptcEntry;
    type IntoIter = std::slice::Iter<'a, IptcEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(record: u16, dataset: u16, text: &str) -> IptcEntry {
        IptcEntry::new(
            DatasetKey::new(record, dataset),
            Value::Str(text.as_bytes().to_vec()),
        )
    }

    // ── duplicate policy ─────────────────────────────────────────────

    #[test]
    fn repeatable_duplicates_allowed() {
        let mut data = IptcData::new();
        data.add(entry(2, 25, "alpha")).unwrap();
        data.add(entry(2, 25, "beta")).unwrap();
        assert_eq!(data.entries_with_id(DatasetKey::new(2, 25)).count(), 2);
    }

    #[test]
    fn non_repeatable_duplicate_rejected() {
        let mut data = IptcData::new();
        data.add(entry(2, 120, "caption one")).unwrap();
        let err = data.add(entry(2, 120, "caption two")).unwrap_err();
        assert_eq!(
            err,
            AddError::DuplicateNonRepeatable(DatasetKey::new(2, 120))
        );
        assert_eq!(data.len(), 1);
    }

    // ── size invariant ───────────────────────────────────────────────

    #[test]
    fn size_counts_header_and_payload() {
        let mut data = IptcData::new();
        data.add(entry(2, 5, "DSC")).unwrap(); // 5 + 3
        data.add(entry(2, 25, "k")).unwrap(); // 5 + 1
        assert_eq!(data.size(), 14);
    }

    #[test]
    fn size_adds_extended_length_overhead() {
        let mut data = IptcData::new();
        let big = vec![b'x'; 40_000];
        data.add(IptcEntry::new(DatasetKey::new(2, 120), Value::Str(big)))
            .unwrap();
        assert_eq!(data.size(), 5 + 40_000 + 4);
    }

    // ── assignment and lookup ────────────────────────────────────────

    #[test]
    fn assign_replaces_first_entry() {
        let mut data = IptcData::new();
        assert!(data.assign("Iptc.Application2.City", "Geneva"));
        assert!(data.assign("Iptc.Application2.City", "Zurich"));
        assert_eq!(data.len(), 1);
        assert_eq!(
            data.find_key("Iptc.Application2.City").map(|e| e.to_text()),
            Some("Zurich".into())
        );
    }

    #[test]
    fn assign_uses_declared_type() {
        let mut data = IptcData::new();
        assert!(data.assign("Iptc.Application2.RecordVersion", "4"));
        let e = data.find_key("Iptc.Application2.RecordVersion").unwrap();
        assert_eq!(e.value, Value::Short(vec![4]));
    }

    #[test]
    fn assign_unknown_key_fails() {
        let mut data = IptcData::new();
        assert!(!data.assign("Iptc.Application2.NotAThing", "x"));
        assert!(data.is_empty());
    }

    #[test]
    fn display_key_formatting() {
        assert_eq!(
            DatasetKey::new(2, 25).to_string(),
            "Iptc.Application2.Keywords"
        );
        assert_eq!(DatasetKey::new(2, 211).to_string(), "Iptc.Application2.0x00d3");
        assert_eq!(DatasetKey::new(9, 7).to_string(), "Iptc.9.7");
    }

    #[test]
    fn remove_all_drops_every_occurrence() {
        let mut data = IptcData::new();
        data.add(entry(2, 25, "a")).unwrap();
        data.add(entry(2, 5, "title")).unwrap();
        data.add(entry(2, 25, "b")).unwrap();
        assert_eq!(data.remove_all(DatasetKey::new(2, 25)), 2);
        assert_eq!(data.len(), 1);
    }
}
