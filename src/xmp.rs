//! XMP property container.
//!
//! Properties are namespaced keys (`Xmp.dc.subject`) holding plain text, an
//! ordered array, or a language-alternative set. Structure members are
//! addressed with path keys (`Xmp.exif.Flash/exif:Fired`) and stored as
//! plain text properties. A small registry records which well-known keys
//! are arrays or lang-alt so that repeated assignment appends where the
//! schema expects an array.

/// Shape of an XMP array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    /// Unordered bag.
    Bag,
    /// Ordered sequence.
    Seq,
}

/// Declared shape of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Text,
    Array(ArrayKind),
    LangAlt,
}

/// One property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmpValue {
    Text(String),
    Array(ArrayKind, Vec<String>),
    /// (language qualifier, text) pairs; the default entry uses
    /// `"x-default"`.
    LangAlt(Vec<(String, String)>),
}

const X_DEFAULT: &str = "x-default";

static LANG_ALT_KEYS: &[&str] = &[
    "Xmp.dc.title",
    "Xmp.dc.description",
    "Xmp.dc.rights",
    "Xmp.exif.UserComment",
];

static SEQ_KEYS: &[&str] = &[
    "Xmp.dc.creator",
    "Xmp.exif.ComponentsConfiguration",
    "Xmp.exif.ISOSpeedRatings",
];

static BAG_KEYS: &[&str] = &["Xmp.dc.subject", "Xmp.photoshop.SupplementalCategories"];

/// Declared shape of `key`; unknown keys (including structure member paths)
/// are plain text.
pub fn property_kind(key: &str) -> PropertyKind {
    if LANG_ALT_KEYS.contains(&key) {
        PropertyKind::LangAlt
    } else if SEQ_KEYS.contains(&key) {
        PropertyKind::Array(ArrayKind::Seq)
    } else if BAG_KEYS.contains(&key) {
        PropertyKind::Array(ArrayKind::Bag)
    } else {
        PropertyKind::Text
    }
}

/// One property: key and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmpEntry {
    pub key: String,
    pub value: XmpValue,
}

/// Ordered collection of XMP properties. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmpData {
    entries: Vec<XmpEntry>,
}

impl XmpData {
    pub fn new() -> Self {
        XmpData::default()
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

    pub fn iter(&self) -> std::slice::Iter<'_, XmpEntry> {
        self.entries.iter()
    }

    pub fn find(&self, key: &str) -> Option<&XmpValue> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Replace-or-create with an explicit value.
    pub fn set(&mut self, key: &str, value: XmpValue) {
        match self.entries.iter().position(|e| e.key == key) {
            Some(i) => self.entries[i].value = value,
            None => self.entries.push(XmpEntry {
                key: key.to_string(),
                value,
            }),
        }
    }

    /// Remove the property with `key`; true when one was present.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.entries.iter().position(|e| e.key == key) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    /// Registry-aware text assignment: arrays append one element per call,
    /// lang-alt sets the default-language entry, everything else replaces.
    pub fn assign_text(&mut self, key: &str, text: &str) {
        match property_kind(key) {
            PropertyKind::Text => self.set(key, XmpValue::Text(text.to_string())),
            PropertyKind::Array(kind) => {
                match self.entries.iter_mut().find(|e| e.key == key) {
                    Some(XmpEntry {
                        value: XmpValue::Array(_, items),
                        ..
                    }) => items.push(text.to_string()),
                    Some(entry) => {
                        entry.value = XmpValue::Array(kind, vec![text.to_string()]);
                    }
                    None => self.set(key, XmpValue::Array(kind, vec![text.to_string()])),
                }
            }
            PropertyKind::LangAlt => {
                match self.entries.iter_mut().find(|e| e.key == key) {
                    Some(XmpEntry {
                        value: XmpValue::LangAlt(items),
                        ..
                    }) => match items.iter_mut().find(|(lang, _)| lang == X_DEFAULT) {
                        Some((_, t)) => *t = text.to_string(),
                        None => items.insert(0, (X_DEFAULT.to_string(), text.to_string())),
                    },
                    _ => self.set(
                        key,
                        XmpValue::LangAlt(vec![(X_DEFAULT.to_string(), text.to_string())]),
                    ),
                }
            }
        }
    }

    /// Plain text behind a property.
    ///
    /// Lang-alt values yield the default-language entry, or the sole entry
    /// when no default exists; arrays are comma-joined.
    pub fn text_value(&self, key: &str) -> Option<String> {
        match self.find(key)? {
            XmpValue::Text(t) => Some(t.clone()),
            XmpValue::Array(_, items) => Some(items.join(", ")),
            XmpValue::LangAlt(items) => items
                .iter()
                .find(|(lang, _)| lang == X_DEFAULT)
                .map(|(_, t)| t.clone())
                .or_else(|| {
                    (items.len() == 1).then(|| items[0].1.clone())
                }),
        }
    }

    /// Array elements behind a property, when it is an array.
    pub fn array_items(&self, key: &str) -> Option<&[String]> {
        match self.find(key)? {
            XmpValue::Array(_, items) => Some(items),
            _ => None,
        }
    }
}

impl<'a> IntoIterator for &'a XmpData {
    type Item = &'a XmpEntry;
    type IntoIter = std::slice::Iter<'a, XmpEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
