//! # imgmeta
//!
//! Image metadata interchange: a binary codec for IPTC IIM datasets and a
//! table-driven conversion engine between the native schemas (Exif, IPTC)
//! and XMP, including the digest-based synchronization protocol that decides
//! which side carries the freshest edits.
//!
//! ## Quick Start
//!
//! Decode an IPTC block, lift it into XMP, and push an Exif container
//! through the sync protocol:
//!
//! ```rust
//! use imgmeta::convert::{copy_iptc_to_xmp, sync_exif_with_xmp};
//! use imgmeta::exif::ExifData;
//! use imgmeta::iptc::{self, IptcData};
//! use imgmeta::value::Value;
//! use imgmeta::xmp::XmpData;
//!
//! # fn main() {
//! // 5-byte headers: marker, record, dataset, big-endian length.
//! let raw = [0x1c, 0x02, 0x69, 0x00, 0x05, b'H', b'e', b'l', b'l', b'o'];
//! let mut iptc = IptcData::new();
//! let report = iptc::decode(&raw, &mut iptc).unwrap();
//! assert!(report.is_clean());
//!
//! let mut xmp = XmpData::new();
//! copy_iptc_to_xmp(&iptc, &mut xmp, None);
//! assert_eq!(xmp.text_value("Xmp.photoshop.Headline"), Some("Hello".into()));
//!
//! let mut exif = ExifData::new();
//! exif.set("Exif.Image.Make", Value::Ascii("Canon".into()));
//! sync_exif_with_xmp(&mut exif, &mut xmp);
//! assert_eq!(xmp.text_value("Xmp.tiff.Make"), Some("Canon".into()));
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`value`]: typed tag values and their wire encodings
//! - [`iptc`]: IPTC dataset container, record tables, and the IIM codec
//! - [`charset`]: IPTC character set detection and recoding
//! - [`exif`]: Exif tag container and tag directory
//! - [`xmp`]: XMP property container and the property-kind registry
//! - [`convert`]: the conversion rule table, transforms, and digest sync

pub mod charset;
pub mod convert;
pub mod exif;
pub mod iptc;
pub mod value;
pub mod xmp;
