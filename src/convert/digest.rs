//! MD5 digests over the convertible Exif tags, and the reconciliation
//! protocol built on them.
//!
//! Two digests are kept in XMP: `Xmp.tiff.NativeDigest` covers the tags of
//! the `Image` group, `Xmp.exif.NativeDigest` covers the rest. Comparing the
//! stored digests against freshly computed ones tells which side was edited
//! since the last conversion.

use md5::{Digest, Md5};

use super::{Converter, Schema, CONVERSIONS};
use crate::exif::{self, ExifData};
use crate::value::ByteOrder;
use crate::xmp::XmpValue;

pub const TIFF_DIGEST_KEY: &str = "Xmp.tiff.NativeDigest";
pub const EXIF_DIGEST_KEY: &str = "Xmp.exif.NativeDigest";

/// Digest one partition of the convertible Exif tags.
///
/// The result is the comma separated tag id list of the partition, a
/// semicolon, and the uppercase MD5 hex of the little-endian value encodings
/// of those tags that are present. Absent tags still contribute their id,
/// so the id list is a function of the rule table alone.
pub fn compute_exif_digest(exif: &ExifData, tiff: bool) -> String {
    let mut ids = String::new();
    let mut hasher = Md5::new();
    for c in CONVERSIONS {
        if c.schema != Schema::Exif {
            continue;
        }
        let image = exif::group_of(c.key1) == Some("Image");
        if tiff != image {
            continue;
        }
        let Some(id) = exif::tag_id(c.key1) else {
            continue;
        };
        if !ids.is_empty() {
            ids.push(',');
        }
        ids.push_str(&id.to_string());
        if let Some(entry) = exif.find(c.key1) {
            hasher.update(entry.value.write_binary(ByteOrder::Little));
        }
    }
    format!("{ids};{}", hex::encode_upper(hasher.finalize()))
}

impl Converter<'_> {
    /// Store both digests in the XMP container.
    pub fn write_exif_digest(&mut self) {
        let Some(exif) = self.exif.as_deref() else {
            return;
        };
        let tiff = compute_exif_digest(exif, true);
        let other = compute_exif_digest(exif, false);
        self.xmp.set(TIFF_DIGEST_KEY, XmpValue::Text(tiff));
        self.xmp.set(EXIF_DIGEST_KEY, XmpValue::Text(other));
    }

    /// Reconcile the Exif and XMP containers.
    ///
    /// Stored digests that match the current Exif data mean XMP carries the
    /// freshest edits, so Exif is refreshed from XMP. A mismatch means Exif
    /// changed after the digests were written and Exif wins. Missing digests
    /// are treated as a first conversion: Exif is copied over without
    /// clobbering anything already in XMP. The digests are rewritten
    /// afterwards in every case.
    pub fn sync(&mut self) {
        let current = match self.exif.as_deref() {
            Some(exif) => (
                compute_exif_digest(exif, true),
                compute_exif_digest(exif, false),
            ),
            None => return,
        };
        let stored = (
            self.xmp.text_value(TIFF_DIGEST_KEY),
            self.xmp.text_value(EXIF_DIGEST_KEY),
        );
        match stored {
            (Some(tiff), Some(other)) if tiff == current.0 && other == current.1 => {
                self.set_overwrite(true);
                self.set_erase(false);
                self.from_xmp();
            }
            (Some(_), Some(_)) => {
                self.set_overwrite(true);
                self.set_erase(false);
                self.to_xmp();
            }
            _ => {
                self.set_overwrite(false);
                self.set_erase(false);
                self.to_xmp();
            }
        }
        self.write_exif_digest();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::sync_exif_with_xmp;
    use crate::value::Value;
    use crate::xmp::XmpData;

    fn hex_part(digest: &str) -> &str {
        digest.split_once(';').map(|(_, h)| h).unwrap()
    }

    #[test]
    fn digest_format() {
        let exif = ExifData::new();
        let tiff = compute_exif_digest(&exif, true);
        let (ids, hash) = tiff.split_once(';').unwrap();
        assert!(ids.starts_with("256,257"));
        assert_eq!(hash.len(), 32);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn partitions_are_independent() {
        let mut exif = ExifData::new();
        let tiff_before = compute_exif_digest(&exif, true);
        let other_before = compute_exif_digest(&exif, false);
        // A Photo group tag only moves the non-tiff digest.
        exif.set("Exif.Photo.ColorSpace", Value::Short(vec![1]));
        assert_eq!(compute_exif_digest(&exif, true), tiff_before);
        assert_ne!(compute_exif_digest(&exif, false), other_before);
        // Id lists never change with the data.
        assert_eq!(
            hex_part(&other_before).len(),
            hex_part(&compute_exif_digest(&exif, false)).len()
        );
    }

    #[test]
    fn first_sync_preserves_existing_xmp() {
        let mut exif = ExifData::new();
        exif.set("Exif.Image.Make", Value::Ascii("Canon".into()));
        exif.set("Exif.Image.Model", Value::Ascii("R5".into()));
        let mut xmp = XmpData::new();
        xmp.set("Xmp.tiff.Make", XmpValue::Text("HandEdited".into()));
        sync_exif_with_xmp(&mut exif, &mut xmp);
        // No digests yet, so existing XMP wins and new tags are copied in.
        assert_eq!(xmp.text_value("Xmp.tiff.Make"), Some("HandEdited".into()));
        assert_eq!(xmp.text_value("Xmp.tiff.Model"), Some("R5".into()));
        assert!(xmp.contains(TIFF_DIGEST_KEY));
        assert!(xmp.contains(EXIF_DIGEST_KEY));
    }

    #[test]
    fn sync_lets_xmp_win_when_digests_match() {
        let mut exif = ExifData::new();
        exif.set("Exif.Image.Make", Value::Ascii("Canon".into()));
        let mut xmp = XmpData::new();
        sync_exif_with_xmp(&mut exif, &mut xmp);

        // Edit only XMP; the stored digests still describe the Exif side.
        xmp.set("Xmp.tiff.Make", XmpValue::Text("Nikon".into()));
        sync_exif_with_xmp(&mut exif, &mut xmp);
        assert_eq!(exif.text("Exif.Image.Make"), Some("Nikon".into()));
    }

    #[test]
    fn sync_lets_exif_win_when_digests_differ() {
        let mut exif = ExifData::new();
        exif.set("Exif.Image.Make", Value::Ascii("Canon".into()));
        let mut xmp = XmpData::new();
        sync_exif_with_xmp(&mut exif, &mut xmp);

        // Edit Exif after the digests were written.
        exif.set("Exif.Image.Model", Value::Ascii("R5".into()));
        exif.set("Exif.Image.Make", Value::Ascii("Leica".into()));
        sync_exif_with_xmp(&mut exif, &mut xmp);
        assert_eq!(xmp.text_value("Xmp.tiff.Model"), Some("R5".into()));
        assert_eq!(xmp.text_value("Xmp.tiff.Make"), Some("Leica".into()));
        // Digests were refreshed to the new Exif state.
        let current = compute_exif_digest(&exif, true);
        assert_eq!(xmp.text_value(TIFF_DIGEST_KEY), Some(current));
    }
}
