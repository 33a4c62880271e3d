//! IPTC dataset definitions: the schema table the codec and the conversion
//! engine consult for expected types, repeatability and name lookup.

use crate::value::TypeTag;

/// Envelope record id.
pub const ENVELOPE: u16 = 1;
/// Application record id.
pub const APPLICATION2: u16 = 2;

/// Envelope.CharacterSet dataset number.
pub const CHARACTER_SET: u16 = 90;

struct DatasetDef {
    record: u16,
    dataset: u16,
    name: &'static str,
    type_tag: TypeTag,
    repeatable: bool,
}

const fn def(
    record: u16,
    dataset: u16,
    name: &'static str,
    type_tag: TypeTag,
    repeatable: bool,
) -> DatasetDef {
    DatasetDef {
        record,
        dataset,
        name,
        type_tag,
        repeatable,
    }
}

static DATASETS: &[DatasetDef] = &[
    def(ENVELOPE, 0, "ModelVersion", TypeTag::Short, false),
    def(ENVELOPE, 5, "Destination", TypeTag::Str, true),
    def(ENVELOPE, 20, "FileFormat", TypeTag::Short, false),
    def(ENVELOPE, 22, "FileVersion", TypeTag::Short, false),
    def(ENVELOPE, 30, "ServiceId", TypeTag::Str, false),
    def(ENVELOPE, 40, "EnvelopeNumber", TypeTag::Str, false),
    def(ENVELOPE, 70, "DateSent", TypeTag::Date, false),
    def(ENVELOPE, 80, "TimeSent", TypeTag::Time, false),
    def(ENVELOPE, CHARACTER_SET, "CharacterSet", TypeTag::Str, false),
    def(APPLICATION2, 0, "RecordVersion", TypeTag::Short, false),
    def(APPLICATION2, 5, "ObjectName", TypeTag::Str, false),
    def(APPLICATION2, 10, "Urgency", TypeTag::Str, false),
    def(APPLICATION2, 15, "Category", TypeTag::Str, false),
    def(APPLICATION2, 20, "SuppCategory", TypeTag::Str, true),
    def(APPLICATION2, 25, "Keywords", TypeTag::Str, true),
    def(APPLICATION2, 40, "SpecialInstructions", TypeTag::Str, false),
    def(APPLICATION2, 55, "DateCreated", TypeTag::Date, false),
    def(APPLICATION2, 60, "TimeCreated", TypeTag::Time, false),
    def(APPLICATION2, 62, "DigitizationDate", TypeTag::Date, false),
    def(APPLICATION2, 63, "DigitizationTime", TypeTag::Time, false),
    def(APPLICATION2, 80, "Byline", TypeTag::Str, true),
    def(APPLICATION2, 85, "BylineTitle", TypeTag::Str, true),
    def(APPLICATION2, 90, "City", TypeTag::Str, false),
    def(APPLICATION2, 92, "SubLocation", TypeTag::Str, false),
    def(APPLICATION2, 95, "ProvinceState", TypeTag::Str, false),
    def(APPLICATION2, 100, "CountryCode", TypeTag::Str, false),
    def(APPLICATION2, 101, "CountryName", TypeTag::Str, false),
    def(APPLICATION2, 103, "TransmissionReference", TypeTag::Str, false),
    def(APPLICATION2, 105, "Headline", TypeTag::Str, false),
    def(APPLICATION2, 110, "Credit", TypeTag::Str, false),
    def(APPLICATION2, 115, "Source", TypeTag::Str, false),
    def(APPLICATION2, 116, "Copyright", TypeTag::Str, false),
    def(APPLICATION2, 120, "Caption", TypeTag::Str, false),
    def(APPLICATION2, 122, "Writer", TypeTag::Str, true),
];

fn lookup(dataset: u16, record: u16) -> Option<&'static DatasetDef> {
    DATASETS
        .iter()
        .find(|d| d.dataset == dataset && d.record == record)
}

/// Declared type of a dataset; unknown datasets default to raw text.
pub fn expected_type(dataset: u16, record: u16) -> TypeTag {
    lookup(dataset, record).map_or(TypeTag::Str, |d| d.type_tag)
}

/// Whether a dataset may occur more than once in a record.
///
/// Datasets that are not in the table are treated as repeatable so that
/// unknown vendor fields survive a decode intact.
pub fn is_repeatable(dataset: u16, record: u16) -> bool {
    lookup(dataset, record).is_none_or(|d| d.repeatable)
}

/// Record name for display keys.
pub fn record_name(record: u16) -> Option<&'static str> {
    match record {
        ENVELOPE => Some("Envelope"),
        APPLICATION2 => Some("Application2"),
        _ => None,
    }
}

/// Dataset name within its record, if known.
pub fn dataset_name(dataset: u16, record: u16) -> Option<&'static str> {
    lookup(dataset, record).map(|d| d.name)
}

/// Resolve a display key like `"Iptc.Application2.Keywords"` to its numeric
/// (record, dataset) pair.
pub fn resolve_key(key: &str) -> Option<(u16, u16)> {
    let mut parts = key.split('.');
    if parts.next() != Some("Iptc") {
        return None;
    }
    let record = match parts.next()? {
        "Envelope" => ENVELOPE,
        "Application2" => APPLICATION2,
        _ => return None,
    };
    let name = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    DATASETS
        .iter()
        .find(|d| d.record == record && d.name == name)
        .map(|d| (d.record, d.dataset))
}
