//! Exif metadata container: an ordered list of (key, value) entries plus the
//! tag directory that maps display keys like `Exif.Image.DateTime` to their
//! numeric TIFF tag ids and declared types.
//!
//! The tag table covers the keys the conversion engine and digest protocol
//! touch; it is not a full Exif registry.

use crate::value::{TypeTag, Value};

/// One Exif tag: display key and typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct ExifEntry {
    pub key: String,
    pub value: Value,
}

impl ExifEntry {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        ExifEntry {
            key: key.into(),
            value,
        }
    }

    pub fn to_text(&self) -> String {
        self.value.to_text()
    }
}

/// Ordered collection of Exif tags. Keys are unique; assignment replaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifData {
    entries: Vec<ExifEntry>,
}

impl ExifData {
    pub fn new() -> Self {
        ExifData::default()
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

    pub fn iter(&self) -> std::slice::Iter<'_, ExifEntry> {
        self.entries.iter()
    }

    pub fn find(&self, key: &str) -> Option<&ExifEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }

    /// Create-or-replace assignment.
    pub fn set(&mut self, key: &str, value: Value) {
        match self.position(key) {
            Some(i) => self.entries[i].value = value,
            None => self.entries.push(ExifEntry::new(key, value)),
        }
    }

    /// Parse `text` according to the key's declared type and assign it.
    ///
    /// Unknown keys are stored as ASCII. Returns false (and stores nothing)
    /// when the text does not parse as the declared type.
    pub fn assign(&mut self, key: &str, text: &str) -> bool {
        let tag = tag_type(key).unwrap_or(TypeTag::Ascii);
        match Value::from_text(tag, text) {
            Ok(value) => {
                self.set(key, value);
                true
            }
            Err(_) => false,
        }
    }

    /// Remove the entry with `key`; true when one was present.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.position(key) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    /// Textual form of the value behind `key`.
    pub fn text(&self, key: &str) -> Option<String> {
        self.find(key).map(ExifEntry::to_text)
    }
}

impl<'a> IntoIterator for &'a ExifData {
    type Item = &'a ExifEntry;
    type IntoIter = std::slice::Iter<'a, ExifEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Group component of a display key: `"Image"` in `Exif.Image.DateTime`.
pub fn group_of(key: &str) -> Option<&str> {
    let mut parts = key.split('.');
    if parts.next() != Some("Exif") {
        return None;
    }
    parts.next()
}

/// Numeric TIFF tag id for a display key.
pub fn tag_id(key: &str) -> Option<u16> {
    TAGS.iter().find(|(k, _, _)| *k == key).map(|(_, id, _)| *id)
}

/// Declared type for a display key.
pub fn tag_type(key: &str) -> Option<TypeTag> {
    TAGS.iter().find(|(k, _, _)| *k == key).map(|(_, _, t)| *t)
}

// Tag directory for the keys the conversion table references. GPS tag ids
// live in their own IFD and restart at 0. UserComment carries its charset
// prefix in text form, so it is kept as ASCII here.
static TAGS: &[(&str, u16, TypeTag)] = &[
    ("Exif.Image.ImageWidth", 0x0100, TypeTag::Long),
    ("Exif.Image.ImageLength", 0x0101, TypeTag::Long),
    ("Exif.Image.BitsPerSample", 0x0102, TypeTag::Short),
    ("Exif.Image.Compression", 0x0103, TypeTag::Short),
    ("Exif.Image.PhotometricInterpretation", 0x0106, TypeTag::Short),
    ("Exif.Image.ImageDescription", 0x010E, TypeTag::Ascii),
    ("Exif.Image.Make", 0x010F, TypeTag::Ascii),
    ("Exif.Image.Model", 0x0110, TypeTag::Ascii),
    ("Exif.Image.Orientation", 0x0112, TypeTag::Short),
    ("Exif.Image.SamplesPerPixel", 0x0115, TypeTag::Short),
    ("Exif.Image.XResolution", 0x011A, TypeTag::Rational),
    ("Exif.Image.YResolution", 0x011B, TypeTag::Rational),
    ("Exif.Image.PlanarConfiguration", 0x011C, TypeTag::Short),
    ("Exif.Image.ResolutionUnit", 0x0128, TypeTag::Short),
    ("Exif.Image.TransferFunction", 0x012D, TypeTag::Short),
    ("Exif.Image.Software", 0x0131, TypeTag::Ascii),
    ("Exif.Image.DateTime", 0x0132, TypeTag::Ascii),
    ("Exif.Image.Artist", 0x013B, TypeTag::Ascii),
    ("Exif.Image.WhitePoint", 0x013E, TypeTag::Rational),
    ("Exif.Image.PrimaryChromaticities", 0x013F, TypeTag::Rational),
    ("Exif.Image.YCbCrCoefficients", 0x0211, TypeTag::Rational),
    ("Exif.Image.YCbCrSubSampling", 0x0212, TypeTag::Short),
    ("Exif.Image.YCbCrPositioning", 0x0213, TypeTag::Short),
    ("Exif.Image.ReferenceBlackWhite", 0x0214, TypeTag::Rational),
    ("Exif.Image.Rating", 0x4746, TypeTag::Short),
    ("Exif.Image.Copyright", 0x8298, TypeTag::Ascii),
    ("Exif.Photo.ExposureTime", 0x829A, TypeTag::Rational),
    ("Exif.Photo.FNumber", 0x829D, TypeTag::Rational),
    ("Exif.Photo.ExposureProgram", 0x8822, TypeTag::Short),
    ("Exif.Photo.SpectralSensitivity", 0x8824, TypeTag::Ascii),
    ("Exif.Photo.ISOSpeedRatings", 0x8827, TypeTag::Short),
    ("Exif.Photo.OECF", 0x8828, TypeTag::Undefined),
    ("Exif.Photo.ExifVersion", 0x9000, TypeTag::Undefined),
    ("Exif.Photo.DateTimeOriginal", 0x9003, TypeTag::Ascii),
    ("Exif.Photo.DateTimeDigitized", 0x9004, TypeTag::Ascii),
    ("Exif.Photo.ComponentsConfiguration", 0x9101, TypeTag::Undefined),
    ("Exif.Photo.CompressedBitsPerPixel", 0x9102, TypeTag::Rational),
    ("Exif.Photo.ShutterSpeedValue", 0x9201, TypeTag::SRational),
    ("Exif.Photo.ApertureValue", 0x9202, TypeTag::Rational),
    ("Exif.Photo.BrightnessValue", 0x9203, TypeTag::SRational),
    ("Exif.Photo.ExposureBiasValue", 0x9204, TypeTag::SRational),
    ("Exif.Photo.MaxApertureValue", 0x9205, TypeTag::Rational),
    ("Exif.Photo.SubjectDistance", 0x9206, TypeTag::Rational),
    ("Exif.Photo.MeteringMode", 0x9207, TypeTag::Short),
    ("Exif.Photo.LightSource", 0x9208, TypeTag::Short),
    ("Exif.Photo.Flash", 0x9209, TypeTag::Short),
    ("Exif.Photo.FocalLength", 0x920A, TypeTag::Rational),
    ("Exif.Photo.SubjectArea", 0x9214, TypeTag::Short),
    ("Exif.Photo.UserComment", 0x9286, TypeTag::Ascii),
    ("Exif.Photo.SubSecTime", 0x9290, TypeTag::Ascii),
    ("Exif.Photo.SubSecTimeOriginal", 0x9291, TypeTag::Ascii),
    ("Exif.Photo.SubSecTimeDigitized", 0x9292, TypeTag::Ascii),
    ("Exif.Photo.FlashpixVersion", 0xA000, TypeTag::Undefined),
    ("Exif.Photo.ColorSpace", 0xA001, TypeTag::Short),
    ("Exif.Photo.PixelXDimension", 0xA002, TypeTag::Long),
    ("Exif.Photo.PixelYDimension", 0xA003, TypeTag::Long),
    ("Exif.Photo.RelatedSoundFile", 0xA004, TypeTag::Ascii),
    ("Exif.Photo.FlashEnergy", 0xA20B, TypeTag::Rational),
    ("Exif.Photo.SpatialFrequencyResponse", 0xA20C, TypeTag::Undefined),
    ("Exif.Photo.FocalPlaneXResolution", 0xA20E, TypeTag::Rational),
    ("Exif.Photo.FocalPlaneYResolution", 0xA20F, TypeTag::Rational),
    ("Exif.Photo.FocalPlaneResolutionUnit", 0xA210, TypeTag::Short),
    ("Exif.Photo.SubjectLocation", 0xA214, TypeTag::Short),
    ("Exif.Photo.ExposureIndex", 0xA215, TypeTag::Rational),
    ("Exif.Photo.SensingMethod", 0xA217, TypeTag::Short),
    ("Exif.Photo.FileSource", 0xA300, TypeTag::Undefined),
    ("Exif.Photo.SceneType", 0xA301, TypeTag::Undefined),
    ("Exif.Photo.CFAPattern", 0xA302, TypeTag::Undefined),
    ("Exif.Photo.CustomRendered", 0xA401, TypeTag::Short),
    ("Exif.Photo.ExposureMode", 0xA402, TypeTag::Short),
    ("Exif.Photo.WhiteBalance", 0xA403, TypeTag::Short),
    ("Exif.Photo.DigitalZoomRatio", 0xA404, TypeTag::Rational),
    ("Exif.Photo.FocalLengthIn35mmFilm", 0xA405, TypeTag::Short),
    ("Exif.Photo.SceneCaptureType", 0xA406, TypeTag::Short),
    ("Exif.Photo.GainControl", 0xA407, TypeTag::Short),
    ("Exif.Photo.Contrast", 0xA408, TypeTag::Short),
    ("Exif.Photo.Saturation", 0xA409, TypeTag::Short),
    ("Exif.Photo.Sharpness", 0xA40A, TypeTag::Short),
    ("Exif.Photo.DeviceSettingDescription", 0xA40B, TypeTag::Undefined),
    ("Exif.Photo.SubjectDistanceRange", 0xA40C, TypeTag::Short),
    ("Exif.Photo.ImageUniqueID", 0xA420, TypeTag::Ascii),
    ("Exif.GPSInfo.GPSVersionID", 0x0000, TypeTag::Byte),
    ("Exif.GPSInfo.GPSLatitudeRef", 0x0001, TypeTag::Ascii),
    ("Exif.GPSInfo.GPSLatitude", 0x0002, TypeTag::Rational),
    ("Exif.GPSInfo.GPSLongitudeRef", 0x0003, TypeTag::Ascii),
    ("Exif.GPSInfo.GPSLongitude", 0x0004, TypeTag::Rational),
    ("Exif.GPSInfo.GPSAltitudeRef", 0x0005, TypeTag::Byte),
    ("Exif.GPSInfo.GPSAltitude", 0x0006, TypeTag::Rational),
    ("Exif.GPSInfo.GPSTimeStamp", 0x0007, TypeTag::Rational),
    ("Exif.GPSInfo.GPSSatellites", 0x0008, TypeTag::Ascii),
    ("Exif.GPSInfo.GPSStatus", 0x0009, TypeTag::Ascii),
    ("Exif.GPSInfo.GPSMeasureMode", 0x000A, TypeTag::Ascii),
    ("Exif.GPSInfo.GPSDOP", 0x000B, TypeTag::Rational),
    ("Exif.GPSInfo.GPSSpeedRef", 0x000C, TypeTag::Ascii),
    ("Exif.GPSInfo.GPSSpeed", 0x000D, TypeTag::Rational),
    ("Exif.GPSInfo.GPSTrackRef", 0x000E, TypeTag::Ascii),
    ("Exif.GPSInfo.GPSTrack", 0x000F, TypeTag::Rational),
    ("Exif.GPSInfo.GPSImgDirectionRef", 0x0010, TypeTag::Ascii),
    ("Exif.GPSInfo.GPSImgDirection", 0x0011, TypeTag::Rational),
    ("Exif.GPSInfo.GPSMapDatum", 0x0012, TypeTag::Ascii),
    ("Exif.GPSInfo.GPSDestLatitudeRef", 0x0013, TypeTag::Ascii),
    ("Exif.GPSInfo.GPSDestLatitude", 0x0014, TypeTag::Rational),
    ("Exif.GPSInfo.GPSDestLongitudeRef", 0x0015, TypeTag::Ascii),
    ("Exif.GPSInfo.GPSDestLongitude", 0x0016, TypeTag::Rational),
    ("Exif.GPSInfo.GPSDestBearingRef", 0x0017, TypeTag::Ascii),
    ("Exif.GPSInfo.GPSDestBearing", 0x0018, TypeTag::Rational),
    ("Exif.GPSInfo.GPSDestDistanceRef", 0x0019, TypeTag::Ascii),
    ("Exif.GPSInfo.GPSDestDistance", 0x001A, TypeTag::Rational),
    ("Exif.GPSInfo.GPSProcessingMethod", 0x001B, TypeTag::Undefined),
    ("Exif.GPSInfo.GPSAreaInformation", 0x001C, TypeTag::Undefined),
    ("Exif.GPSInfo.GPSDateStamp", 0x001D, TypeTag::Ascii),
    ("Exif.GPSInfo.GPSDifferential", 0x001E, TypeTag::Short),
];
