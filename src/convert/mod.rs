//! Per-rule conversion between native metadata (Exif, IPTC) and XMP.
//!
//! A static, ordered rule table maps each native key to its XMP property and
//! names the transform used in each direction. The table order is a versioned
//! contract: the digest protocol in [`digest`] derives tag id lists from it,
//! so new rules are appended, never inserted.

pub mod digest;

use log::warn;

use crate::charset::{self, Charset};
use crate::exif::ExifData;
use crate::iptc::{datasets, DatasetKey, IptcData, IptcEntry};
use crate::value::Value;
use crate::xmp::{XmpData, XmpValue};

// *****************************************************************************
// rule table

/// Which native schema a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Exif,
    Iptc,
}

/// Transform applied when a rule fires. `Exif*` and `Iptc*` variants read the
/// native side and write XMP; `Xmp*` variants go the other way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transform {
    None,
    ExifValue,
    ExifComment,
    ExifArray,
    ExifDate,
    ExifVersion,
    ExifGpsVersion,
    ExifFlash,
    ExifGpsCoord,
    IptcValue,
    XmpValue,
    XmpComment,
    XmpArray,
    XmpDate,
    XmpVersion,
    XmpGpsVersion,
    XmpFlash,
    XmpGpsCoord,
    XmpToIptc,
}

struct Conversion {
    schema: Schema,
    key1: &'static str,
    key2: &'static str,
    forward: Transform,
    backward: Transform,
}

const fn exif(key1: &'static str, key2: &'static str) -> Conversion {
    Conversion {
        schema: Schema::Exif,
        key1,
        key2,
        forward: Transform::ExifValue,
        backward: Transform::XmpValue,
    }
}

const fn exif_as(
    key1: &'static str,
    key2: &'static str,
    forward: Transform,
    backward: Transform,
) -> Conversion {
    Conversion {
        schema: Schema::Exif,
        key1,
        key2,
        forward,
        backward,
    }
}

const fn iptc(key1: &'static str, key2: &'static str) -> Conversion {
    Conversion {
        schema: Schema::Iptc,
        key1,
        key2,
        forward: Transform::IptcValue,
        backward: Transform::XmpToIptc,
    }
}

const fn iptc_one_way(key1: &'static str, key2: &'static str) -> Conversion {
    Conversion {
        schema: Schema::Iptc,
        key1,
        key2,
        forward: Transform::None,
        backward: Transform::XmpToIptc,
    }
}

use self::Transform::{ExifDate as D, ExifFlash as F, ExifGpsCoord as GC, ExifGpsVersion as GV};
use self::Transform::{ExifArray as A, ExifComment as C, ExifVersion as V};
use self::Transform::{XmpArray as XA, XmpComment as XC, XmpVersion as XV};
use self::Transform::{XmpDate as XD, XmpFlash as XF, XmpGpsCoord as XGC, XmpGpsVersion as XGV};

static CONVERSIONS: &[Conversion] = &[
    exif("Exif.Image.ImageWidth", "Xmp.tiff.ImageWidth"),
    exif("Exif.Image.ImageLength", "Xmp.tiff.ImageLength"),
    exif("Exif.Image.BitsPerSample", "Xmp.tiff.BitsPerSample"),
    exif("Exif.Image.Compression", "Xmp.tiff.Compression"),
    exif("Exif.Image.PhotometricInterpretation", "Xmp.tiff.PhotometricInterpretation"),
    exif("Exif.Image.Orientation", "Xmp.tiff.Orientation"),
    exif("Exif.Image.SamplesPerPixel", "Xmp.tiff.SamplesPerPixel"),
    exif("Exif.Image.PlanarConfiguration", "Xmp.tiff.PlanarConfiguration"),
    exif("Exif.Image.YCbCrSubSampling", "Xmp.tiff.YCbCrSubSampling"),
    exif("Exif.Image.YCbCrPositioning", "Xmp.tiff.YCbCrPositioning"),
    exif("Exif.Image.XResolution", "Xmp.tiff.XResolution"),
    exif("Exif.Image.YResolution", "Xmp.tiff.YResolution"),
    exif("Exif.Image.ResolutionUnit", "Xmp.tiff.ResolutionUnit"),
    exif("Exif.Image.TransferFunction", "Xmp.tiff.TransferFunction"),
    exif("Exif.Image.WhitePoint", "Xmp.tiff.WhitePoint"),
    exif("Exif.Image.PrimaryChromaticities", "Xmp.tiff.PrimaryChromaticities"),
    exif("Exif.Image.YCbCrCoefficients", "Xmp.tiff.YCbCrCoefficients"),
    exif("Exif.Image.ReferenceBlackWhite", "Xmp.tiff.ReferenceBlackWhite"),
    exif_as("Exif.Image.DateTime", "Xmp.xmp.ModifyDate", D, XD),
    exif("Exif.Image.ImageDescription", "Xmp.dc.description"),
    exif("Exif.Image.Make", "Xmp.tiff.Make"),
    exif("Exif.Image.Model", "Xmp.tiff.Model"),
    exif("Exif.Image.Software", "Xmp.tiff.Software"),
    exif("Exif.Image.Artist", "Xmp.dc.creator"),
    exif("Exif.Image.Rating", "Xmp.xmp.Rating"),
    exif("Exif.Image.Copyright", "Xmp.dc.rights"),
    exif_as("Exif.Photo.ExifVersion", "Xmp.exif.ExifVersion", V, XV),
    exif_as("Exif.Photo.FlashpixVersion", "Xmp.exif.FlashpixVersion", V, XV),
    exif("Exif.Photo.ColorSpace", "Xmp.exif.ColorSpace"),
    exif_as("Exif.Photo.ComponentsConfiguration", "Xmp.exif.ComponentsConfiguration", A, XA),
    exif("Exif.Photo.CompressedBitsPerPixel", "Xmp.exif.CompressedBitsPerPixel"),
    exif("Exif.Photo.PixelXDimension", "Xmp.exif.PixelXDimension"),
    exif("Exif.Photo.PixelYDimension", "Xmp.exif.PixelYDimension"),
    exif_as("Exif.Photo.UserComment", "Xmp.exif.UserComment", C, XC),
    exif("Exif.Photo.RelatedSoundFile", "Xmp.exif.RelatedSoundFile"),
    exif_as("Exif.Photo.DateTimeOriginal", "Xmp.photoshop.DateCreated", D, XD),
    exif_as("Exif.Photo.DateTimeDigitized", "Xmp.xmp.CreateDate", D, XD),
    exif("Exif.Photo.ExposureTime", "Xmp.exif.ExposureTime"),
    exif("Exif.Photo.FNumber", "Xmp.exif.FNumber"),
    exif("Exif.Photo.ExposureProgram", "Xmp.exif.ExposureProgram"),
    exif("Exif.Photo.SpectralSensitivity", "Xmp.exif.SpectralSensitivity"),
    exif("Exif.Photo.ISOSpeedRatings", "Xmp.exif.ISOSpeedRatings"),
    exif("Exif.Photo.OECF", "Xmp.exif.OECF"),
    exif("Exif.Photo.ShutterSpeedValue", "Xmp.exif.ShutterSpeedValue"),
    exif("Exif.Photo.ApertureValue", "Xmp.exif.ApertureValue"),
    exif("Exif.Photo.BrightnessValue", "Xmp.exif.BrightnessValue"),
    exif("Exif.Photo.ExposureBiasValue", "Xmp.exif.ExposureBiasValue"),
    exif("Exif.Photo.MaxApertureValue", "Xmp.exif.MaxApertureValue"),
    exif("Exif.Photo.SubjectDistance", "Xmp.exif.SubjectDistance"),
    exif("Exif.Photo.MeteringMode", "Xmp.exif.MeteringMode"),
    exif("Exif.Photo.LightSource", "Xmp.exif.LightSource"),
    exif_as("Exif.Photo.Flash", "Xmp.exif.Flash", F, XF),
    exif("Exif.Photo.FocalLength", "Xmp.exif.FocalLength"),
    exif("Exif.Photo.SubjectArea", "Xmp.exif.SubjectArea"),
    exif("Exif.Photo.FlashEnergy", "Xmp.exif.FlashEnergy"),
    exif("Exif.Photo.SpatialFrequencyResponse", "Xmp.exif.SpatialFrequencyResponse"),
    exif("Exif.Photo.FocalPlaneXResolution", "Xmp.exif.FocalPlaneXResolution"),
    exif("Exif.Photo.FocalPlaneYResolution", "Xmp.exif.FocalPlaneYResolution"),
    exif("Exif.Photo.FocalPlaneResolutionUnit", "Xmp.exif.FocalPlaneResolutionUnit"),
    exif("Exif.Photo.SubjectLocation", "Xmp.exif.SubjectLocation"),
    exif("Exif.Photo.ExposureIndex", "Xmp.exif.ExposureIndex"),
    exif("Exif.Photo.SensingMethod", "Xmp.exif.SensingMethod"),
    exif("Exif.Photo.FileSource", "Xmp.exif.FileSource"),
    exif("Exif.Photo.SceneType", "Xmp.exif.SceneType"),
    exif("Exif.Photo.CFAPattern", "Xmp.exif.CFAPattern"),
    exif("Exif.Photo.CustomRendered", "Xmp.exif.CustomRendered"),
    exif("Exif.Photo.ExposureMode", "Xmp.exif.ExposureMode"),
    exif("Exif.Photo.WhiteBalance", "Xmp.exif.WhiteBalance"),
    exif("Exif.Photo.DigitalZoomRatio", "Xmp.exif.DigitalZoomRatio"),
    exif("Exif.Photo.FocalLengthIn35mmFilm", "Xmp.exif.FocalLengthIn35mmFilm"),
    exif("Exif.Photo.SceneCaptureType", "Xmp.exif.SceneCaptureType"),
    exif("Exif.Photo.GainControl", "Xmp.exif.GainControl"),
    exif("Exif.Photo.Contrast", "Xmp.exif.Contrast"),
    exif("Exif.Photo.Saturation", "Xmp.exif.Saturation"),
    exif("Exif.Photo.Sharpness", "Xmp.exif.Sharpness"),
    exif("Exif.Photo.DeviceSettingDescription", "Xmp.exif.DeviceSettingDescription"),
    exif("Exif.Photo.SubjectDistanceRange", "Xmp.exif.SubjectDistanceRange"),
    exif("Exif.Photo.ImageUniqueID", "Xmp.exif.ImageUniqueID"),
    exif_as("Exif.GPSInfo.GPSVersionID", "Xmp.exif.GPSVersionID", GV, XGV),
    exif_as("Exif.GPSInfo.GPSLatitude", "Xmp.exif.GPSLatitude", GC, XGC),
    exif_as("Exif.GPSInfo.GPSLongitude", "Xmp.exif.GPSLongitude", GC, XGC),
    exif("Exif.GPSInfo.GPSAltitudeRef", "Xmp.exif.GPSAltitudeRef"),
    exif("Exif.GPSInfo.GPSAltitude", "Xmp.exif.GPSAltitude"),
    exif_as("Exif.GPSInfo.GPSTimeStamp", "Xmp.exif.GPSTimeStamp", D, XD),
    exif("Exif.GPSInfo.GPSSatellites", "Xmp.exif.GPSSatellites"),
    exif("Exif.GPSInfo.GPSStatus", "Xmp.exif.GPSStatus"),
    exif("Exif.GPSInfo.GPSMeasureMode", "Xmp.exif.GPSMeasureMode"),
    exif("Exif.GPSInfo.GPSDOP", "Xmp.exif.GPSDOP"),
    exif("Exif.GPSInfo.GPSSpeedRef", "Xmp.exif.GPSSpeedRef"),
    exif("Exif.GPSInfo.GPSSpeed", "Xmp.exif.GPSSpeed"),
    exif("Exif.GPSInfo.GPSTrackRef", "Xmp.exif.GPSTrackRef"),
    exif("Exif.GPSInfo.GPSTrack", "Xmp.exif.GPSTrack"),
    exif("Exif.GPSInfo.GPSImgDirectionRef", "Xmp.exif.GPSImgDirectionRef"),
    exif("Exif.GPSInfo.GPSImgDirection", "Xmp.exif.GPSImgDirection"),
    exif("Exif.GPSInfo.GPSMapDatum", "Xmp.exif.GPSMapDatum"),
    exif_as("Exif.GPSInfo.GPSDestLatitude", "Xmp.exif.GPSDestLatitude", GC, XGC),
    exif_as("Exif.GPSInfo.GPSDestLongitude", "Xmp.exif.GPSDestLongitude", GC, XGC),
    exif("Exif.GPSInfo.GPSDestBearingRef", "Xmp.exif.GPSDestBearingRef"),
    exif("Exif.GPSInfo.GPSDestBearing", "Xmp.exif.GPSDestBearing"),
    exif("Exif.GPSInfo.GPSDestDistanceRef", "Xmp.exif.GPSDestDistanceRef"),
    exif("Exif.GPSInfo.GPSDestDistance", "Xmp.exif.GPSDestDistance"),
    exif("Exif.GPSInfo.GPSProcessingMethod", "Xmp.exif.GPSProcessingMethod"),
    exif("Exif.GPSInfo.GPSAreaInformation", "Xmp.exif.GPSAreaInformation"),
    exif("Exif.GPSInfo.GPSDifferential", "Xmp.exif.GPSDifferential"),
    iptc("Iptc.Application2.ObjectName", "Xmp.dc.title"),
    iptc("Iptc.Application2.Urgency", "Xmp.photoshop.Urgency"),
    iptc("Iptc.Application2.Category", "Xmp.photoshop.Category"),
    iptc("Iptc.Application2.SuppCategory", "Xmp.photoshop.SupplementalCategories"),
    iptc("Iptc.Application2.Keywords", "Xmp.dc.subject"),
    iptc("Iptc.Application2.SubLocation", "Xmp.iptc.Location"),
    iptc("Iptc.Application2.SpecialInstructions", "Xmp.photoshop.Instructions"),
    iptc_one_way("Iptc.Application2.DateCreated", "Xmp.photoshop.DateCreated"),
    iptc_one_way("Iptc.Application2.DigitizationDate", "Xmp.xmp.CreateDate"),
    iptc("Iptc.Application2.Byline", "Xmp.dc.creator"),
    iptc("Iptc.Application2.BylineTitle", "Xmp.photoshop.AuthorsPosition"),
    iptc("Iptc.Application2.City", "Xmp.photoshop.City"),
    iptc("Iptc.Application2.ProvinceState", "Xmp.photoshop.State"),
    iptc("Iptc.Application2.CountryCode", "Xmp.iptc.CountryCode"),
    iptc("Iptc.Application2.CountryName", "Xmp.photoshop.Country"),
    iptc("Iptc.Application2.TransmissionReference", "Xmp.photoshop.TransmissionReference"),
    iptc("Iptc.Application2.Headline", "Xmp.photoshop.Headline"),
    iptc("Iptc.Application2.Credit", "Xmp.photoshop.Credit"),
    iptc("Iptc.Application2.Source", "Xmp.photoshop.Source"),
    iptc("Iptc.Application2.Copyright", "Xmp.dc.rights"),
    iptc("Iptc.Application2.Caption", "Xmp.dc.description"),
    iptc("Iptc.Application2.Writer", "Xmp.photoshop.CaptionWriter"),
];

// *****************************************************************************
// converter

/// Drives the rule table over one native container and one XMP container.
///
/// `overwrite` (default true) lets a rule replace an existing destination
/// value; `erase` (default false) removes the source after a successful
/// conversion, turning a copy into a move.
pub struct Converter<'a> {
    exif: Option<&'a mut ExifData>,
    iptc: Option<&'a mut IptcData>,
    xmp: &'a mut XmpData,
    iptc_charset: Charset,
    overwrite: bool,
    erase: bool,
}

impl<'a> Converter<'a> {
    pub fn for_exif(exif: &'a mut ExifData, xmp: &'a mut XmpData) -> Self {
        Converter {
            exif: Some(exif),
            iptc: None,
            xmp,
            iptc_charset: Charset::Iso88591,
            overwrite: true,
            erase: false,
        }
    }

    pub fn for_iptc(iptc: &'a mut IptcData, xmp: &'a mut XmpData, charset: Charset) -> Self {
        Converter {
            exif: None,
            iptc: Some(iptc),
            xmp,
            iptc_charset: charset,
            overwrite: true,
            erase: false,
        }
    }

    pub fn set_overwrite(&mut self, overwrite: bool) {
        self.overwrite = overwrite;
    }

    pub fn set_erase(&mut self, erase: bool) {
        self.erase = erase;
    }

    /// Run every applicable rule native-to-XMP.
    pub fn to_xmp(&mut self) {
        for c in CONVERSIONS {
            if self.active(c.schema) {
                self.apply(c.forward, c.key1, c.key2);
            }
        }
    }

    /// Run every applicable rule XMP-to-native.
    pub fn from_xmp(&mut self) {
        for c in CONVERSIONS {
            if self.active(c.schema) {
                self.apply(c.backward, c.key2, c.key1);
            }
        }
    }

    fn active(&self, schema: Schema) -> bool {
        match schema {
            Schema::Exif => self.exif.is_some(),
            Schema::Iptc => self.iptc.is_some(),
        }
    }

    fn apply(&mut self, transform: Transform, from: &str, to: &str) {
        match transform {
            Transform::None => {}
            Transform::ExifValue => self.cnv_exif_value(from, to),
            Transform::ExifComment => self.cnv_exif_comment(from, to),
            Transform::ExifArray => self.cnv_exif_array(from, to),
            Transform::ExifDate => self.cnv_exif_date(from, to),
            Transform::ExifVersion => self.cnv_exif_version(from, to),
            Transform::ExifGpsVersion => self.cnv_exif_gps_version(from, to),
            Transform::ExifFlash => self.cnv_exif_flash(from, to),
            Transform::ExifGpsCoord => self.cnv_exif_gps_coord(from, to),
            Transform::IptcValue => self.cnv_iptc_value(from, to),
            Transform::XmpValue => self.cnv_xmp_value(from, to),
            Transform::XmpComment => self.cnv_xmp_comment(from, to),
            Transform::XmpArray => self.cnv_xmp_array(from, to),
            Transform::XmpDate => self.cnv_xmp_date(from, to),
            Transform::XmpVersion => self.cnv_xmp_version(from, to),
            Transform::XmpGpsVersion => self.cnv_xmp_gps_version(from, to),
            Transform::XmpFlash => self.cnv_xmp_flash(from, to),
            Transform::XmpGpsCoord => self.cnv_xmp_gps_coord(from, to),
            Transform::XmpToIptc => self.cnv_xmp_to_iptc(from, to),
        }
    }

    // ---- native to XMP ----

    fn cnv_exif_value(&mut self, from: &str, to: &str) {
        let Some(exif) = self.exif.as_deref_mut() else {
            return;
        };
        let Some(value) = exif.text(from) else {
            return;
        };
        if !prepare_xmp_target(self.xmp, to, false, self.overwrite) {
            return;
        }
        self.xmp.assign_text(to, &value);
        if self.erase {
            exif.remove(from);
        }
    }

    fn cnv_exif_comment(&mut self, from: &str, to: &str) {
        let Some(exif) = self.exif.as_deref_mut() else {
            return;
        };
        let Some(text) = exif.text(from) else {
            return;
        };
        if !prepare_xmp_target(self.xmp, to, false, self.overwrite) {
            return;
        }
        self.xmp.assign_text(to, strip_comment_charset(&text));
        if self.erase {
            exif.remove(from);
        }
    }

    fn cnv_exif_array(&mut self, from: &str, to: &str) {
        let Some(exif) = self.exif.as_deref_mut() else {
            return;
        };
        let Some(entry) = exif.find(from) else {
            return;
        };
        let items: Vec<String> = (0..entry.value.count())
            .filter_map(|i| entry.value.to_text_at(i))
            .collect();
        if !prepare_xmp_target(self.xmp, to, false, self.overwrite) {
            return;
        }
        for item in &items {
            self.xmp.assign_text(to, item);
        }
        if self.erase {
            exif.remove(from);
        }
    }

    fn cnv_exif_date(&mut self, from: &str, to: &str) {
        let Some(exif) = self.exif.as_deref_mut() else {
            return;
        };
        if exif.find(from).is_none() {
            return;
        }
        if !prepare_xmp_target(self.xmp, to, false, self.overwrite) {
            return;
        }

        let (year, month, day, hour, minute, second, mut subsec) =
            if from != "Exif.GPSInfo.GPSTimeStamp" {
                let Some(text) = exif.text(from) else {
                    return;
                };
                let Some(dt) = parse_exif_datetime(&text) else {
                    warn!("failed to convert {from} to {to}, unable to parse '{text}'");
                    return;
                };
                (dt.0, dt.1, dt.2, dt.3, dt.4, dt.5, String::new())
            } else {
                // Time of day as three rationals; the date comes from a
                // companion tag.
                let Some(entry) = exif.find(from) else {
                    return;
                };
                if entry.value.count() != 3
                    || (0..3).any(|i| entry.value.to_rational_at(i).is_none_or(|(_, d)| d == 0))
                {
                    warn!("failed to convert {from} to {to}");
                    return;
                }
                let dhour = entry.value.to_f64_at(0).unwrap_or(0.0);
                let dmin = entry.value.to_f64_at(1).unwrap_or(0.0);
                let dsec = entry
                    .value
                    .to_rational_at(2)
                    .map(|(n, d)| n as f64 / d as f64)
                    .unwrap_or(0.0);

                let mut total = dhour * 3600.0 + dmin * 60.0 + dsec;
                let hour = (total / 3600.0) as u32;
                total -= f64::from(hour) * 3600.0;
                let minute = (total / 60.0) as u32;
                total -= f64::from(minute) * 60.0;
                let second = total as u32;
                total -= f64::from(second);
                let subsec = format!(".{:09}", (total * 1_000_000_000.0).round() as u64);

                let date_text = [
                    "Exif.GPSInfo.GPSDateStamp",
                    "Exif.Photo.DateTimeOriginal",
                    "Exif.Photo.DateTimeDigitized",
                ]
                .iter()
                .find_map(|k| exif.text(k));
                let Some(date_text) = date_text else {
                    warn!("failed to convert {from} to {to}");
                    return;
                };
                let Some((year, month, day)) = parse_exif_date(&date_text) else {
                    warn!("failed to convert {from} to {to}, unable to parse '{date_text}'");
                    return;
                };
                (year, month, day, hour, minute, second, subsec)
            };

        if let Some(subsec_key) = subsec_companion(from) {
            if let Some(ss) = exif.text(subsec_key) {
                if !ss.is_empty() && ss.trim().parse::<i64>().is_ok() {
                    subsec = format!(".{ss}");
                }
                if self.erase {
                    exif.remove(subsec_key);
                }
            }
        }
        subsec.truncate(10);

        self.xmp.set(
            to,
            XmpValue::Text(format!(
                "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}{subsec}"
            )),
        );
        if self.erase {
            exif.remove(from);
        }
    }

    fn cnv_exif_version(&mut self, from: &str, to: &str) {
        let Some(exif) = self.exif.as_deref_mut() else {
            return;
        };
        let Some(entry) = exif.find(from) else {
            return;
        };
        let value: String = (0..entry.value.count())
            .filter_map(|i| entry.value.to_i64_at(i))
            .map(|b| b as u8 as char)
            .collect();
        if !prepare_xmp_target(self.xmp, to, false, self.overwrite) {
            return;
        }
        self.xmp.set(to, XmpValue::Text(value));
        if self.erase {
            exif.remove(from);
        }
    }

    fn cnv_exif_gps_version(&mut self, from: &str, to: &str) {
        let Some(exif) = self.exif.as_deref_mut() else {
            return;
        };
        let Some(entry) = exif.find(from) else {
            return;
        };
        let value = (0..entry.value.count())
            .filter_map(|i| entry.value.to_i64_at(i))
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(".");
        if !prepare_xmp_target(self.xmp, to, false, self.overwrite) {
            return;
        }
        self.xmp.set(to, XmpValue::Text(value));
        if self.erase {
            exif.remove(from);
        }
    }

    fn cnv_exif_flash(&mut self, from: &str, to: &str) {
        let Some(exif) = self.exif.as_deref_mut() else {
            return;
        };
        let Some(entry) = exif.find(from) else {
            return;
        };
        if entry.value.count() == 0 {
            return;
        }
        let Some(bits) = entry.value.to_i64_at(0) else {
            warn!("failed to convert {from} to {to}");
            return;
        };
        if !prepare_xmp_target(self.xmp, to, false, self.overwrite) {
            return;
        }
        let bits = bits as u32;
        let set = |v: u32| XmpValue::Text(v.to_string());
        let set_bool = |v: u32| XmpValue::Text(if v != 0 { "True" } else { "False" }.to_string());
        self.xmp.set("Xmp.exif.Flash/exif:Fired", set_bool(bits & 1));
        self.xmp.set("Xmp.exif.Flash/exif:Return", set((bits >> 1) & 3));
        self.xmp.set("Xmp.exif.Flash/exif:Mode", set((bits >> 3) & 3));
        self.xmp.set("Xmp.exif.Flash/exif:Function", set_bool((bits >> 5) & 1));
        self.xmp.set("Xmp.exif.Flash/exif:RedEyeMode", set_bool((bits >> 6) & 1));
        if self.erase {
            exif.remove(from);
        }
    }

    fn cnv_exif_gps_coord(&mut self, from: &str, to: &str) {
        let Some(exif) = self.exif.as_deref_mut() else {
            return;
        };
        let Some(entry) = exif.find(from) else {
            return;
        };
        if !prepare_xmp_target(self.xmp, to, false, self.overwrite) {
            return;
        }
        if entry.value.count() != 3 {
            warn!("failed to convert {from} to {to}");
            return;
        }
        let ref_key = format!("{from}Ref");
        let Some(ref_text) = exif.text(&ref_key) else {
            warn!("failed to convert {from} to {to}");
            return;
        };
        let mut deg = [0.0f64; 3];
        for (i, d) in deg.iter_mut().enumerate() {
            match entry.value.to_rational_at(i) {
                Some((n, den)) if den != 0 => *d = n as f64 / den as f64,
                _ => {
                    warn!("failed to convert {from} to {to}");
                    return;
                }
            }
        }
        let Some(ref_char) = ref_text.chars().next() else {
            warn!("failed to convert {from} to {to}");
            return;
        };
        let mut minutes = deg[0] * 60.0 + deg[1] + deg[2] / 60.0;
        let ideg = (minutes / 60.0) as i32;
        minutes -= f64::from(ideg) * 60.0;
        self.xmp
            .set(to, XmpValue::Text(format!("{ideg},{minutes:.7}{ref_char}")));
        if self.erase {
            exif.remove(from);
            exif.remove(&ref_key);
        }
    }

    fn cnv_iptc_value(&mut self, from: &str, to: &str) {
        let Some(iptc) = self.iptc.as_deref_mut() else {
            return;
        };
        let Some(key) = DatasetKey::from_name(from) else {
            return;
        };
        if iptc.find_id(key).is_none() {
            return;
        }
        if !prepare_xmp_target(self.xmp, to, false, self.overwrite) {
            return;
        }
        let charset = self.iptc_charset;
        let texts: Vec<String> = iptc
            .entries_with_id(key)
            .map(|e| match e.value.text_bytes() {
                Some(bytes) => match charset::convert(bytes, charset, Charset::Utf8) {
                    Some(utf8) => String::from_utf8_lossy(&utf8).into_owned(),
                    // Failed recoding leaves the stored bytes untouched.
                    None => e.to_text(),
                },
                None => e.to_text(),
            })
            .collect();
        for text in &texts {
            self.xmp.assign_text(to, text);
        }
        if self.erase {
            iptc.remove_all(key);
        }
    }

    // ---- XMP to native ----

    fn cnv_xmp_value(&mut self, from: &str, to: &str) {
        let Some(exif) = self.exif.as_deref_mut() else {
            return;
        };
        if !self.xmp.contains(from) {
            return;
        }
        if !prepare_exif_target(exif, to, false, self.overwrite) {
            return;
        }
        let Some(value) = self.xmp.text_value(from) else {
            warn!("failed to convert {from} to {to}");
            return;
        };
        // A value that does not parse as the tag's declared type is dropped.
        exif.assign(to, &value);
        if self.erase {
            self.xmp.remove(from);
        }
    }

    fn cnv_xmp_comment(&mut self, from: &str, to: &str) {
        let Some(exif) = self.exif.as_deref_mut() else {
            return;
        };
        if !prepare_exif_target(exif, to, false, self.overwrite) {
            return;
        }
        if !self.xmp.contains(from) {
            return;
        }
        let Some(value) = self.xmp.text_value(from) else {
            warn!("failed to convert {from} to {to}");
            return;
        };
        // XMP text is UTF-8, flag the comment accordingly.
        exif.assign(to, &format!("charset=Unicode {value}"));
        if self.erase {
            self.xmp.remove(from);
        }
    }

    fn cnv_xmp_array(&mut self, from: &str, to: &str) {
        let Some(exif) = self.exif.as_deref_mut() else {
            return;
        };
        if !prepare_exif_target(exif, to, false, self.overwrite) {
            return;
        }
        let joined = match self.xmp.find(from) {
            None => return,
            Some(XmpValue::Array(_, items)) => items.join(" "),
            Some(_) => match self.xmp.text_value(from) {
                Some(text) => text,
                None => {
                    warn!("failed to convert {from} to {to}");
                    return;
                }
            },
        };
        exif.assign(to, &joined);
        if self.erase {
            self.xmp.remove(from);
        }
    }

    fn cnv_xmp_date(&mut self, from: &str, to: &str) {
        let Some(exif) = self.exif.as_deref_mut() else {
            return;
        };
        if !self.xmp.contains(from) {
            return;
        }
        if !prepare_exif_target(exif, to, false, self.overwrite) {
            return;
        }
        let Some(text) = self.xmp.text_value(from) else {
            warn!("failed to convert {from} to {to}");
            return;
        };
        let Some(dt) = parse_xmp_date(&text) else {
            warn!("failed to convert {from} to {to}, unable to parse '{text}'");
            return;
        };

        if to != "Exif.GPSInfo.GPSTimeStamp" {
            exif.assign(
                to,
                &format!(
                    "{:04}:{:02}:{:02} {:02}:{:02}:{:02}",
                    dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
                ),
            );
            if dt.nanosecond != 0 {
                if let Some(subsec_key) = subsec_companion(to) {
                    prepare_exif_target(exif, subsec_key, true, self.overwrite);
                    exif.assign(subsec_key, &dt.nanosecond.to_string());
                }
            }
        } else {
            // The time is taken as UTC; fold sub-second precision into the
            // seconds rational.
            let mut rmin = (dt.minute, 1u32);
            let mut rsec = (dt.second, 1u32);
            if dt.nanosecond != 0 {
                if dt.second != 0 {
                    rmin = (dt.minute * 60 + dt.second, 60);
                }
                rsec = (dt.nanosecond, 1_000_000_000);
            }
            exif.assign(
                to,
                &format!("{}/{} {}/{} {}/{}", dt.hour, 1, rmin.0, rmin.1, rsec.0, rsec.1),
            );
            prepare_exif_target(exif, "Exif.GPSInfo.GPSDateStamp", true, self.overwrite);
            exif.assign(
                "Exif.GPSInfo.GPSDateStamp",
                &format!("{:04}:{:02}:{:02}", dt.year, dt.month, dt.day),
            );
        }
        if self.erase {
            self.xmp.remove(from);
        }
    }

    fn cnv_xmp_version(&mut self, from: &str, to: &str) {
        let Some(exif) = self.exif.as_deref_mut() else {
            return;
        };
        if !self.xmp.contains(from) {
            return;
        }
        if !prepare_exif_target(exif, to, false, self.overwrite) {
            return;
        }
        let Some(value) = self.xmp.text_value(from) else {
            warn!("failed to convert {from} to {to}");
            return;
        };
        let bytes = value.as_bytes();
        if bytes.len() < 4 {
            warn!("failed to convert {from} to {to}");
            return;
        }
        exif.assign(
            to,
            &format!("{} {} {} {}", bytes[0], bytes[1], bytes[2], bytes[3]),
        );
        if self.erase {
            self.xmp.remove(from);
        }
    }

    fn cnv_xmp_gps_version(&mut self, from: &str, to: &str) {
        let Some(exif) = self.exif.as_deref_mut() else {
            return;
        };
        if !self.xmp.contains(from) {
            return;
        }
        if !prepare_exif_target(exif, to, false, self.overwrite) {
            return;
        }
        let Some(value) = self.xmp.text_value(from) else {
            warn!("failed to convert {from} to {to}");
            return;
        };
        exif.assign(to, &value.replace('.', " "));
        if self.erase {
            self.xmp.remove(from);
        }
    }

    fn cnv_xmp_flash(&mut self, from: &str, to: &str) {
        let Some(exif) = self.exif.as_deref_mut() else {
            return;
        };
        let fired_key = format!("{from}/exif:Fired");
        if !self.xmp.contains(&fired_key) {
            return;
        }
        if !prepare_exif_target(exif, to, false, self.overwrite) {
            return;
        }
        let mut bits = 0u16;
        let members: [(&str, u16, u16); 5] = [
            ("Fired", 1, 0),
            ("Return", 3, 1),
            ("Mode", 3, 3),
            ("Function", 1, 5),
            ("RedEyeMode", 1, 6),
        ];
        for (member, mask, shift) in members {
            let key = format!("{from}/exif:{member}");
            if let Some(text) = self.xmp.text_value(&key) {
                match parse_xmp_uint(&text) {
                    Some(v) => bits |= (v as u16 & mask) << shift,
                    None => warn!("failed to convert {key} to {to}"),
                }
                if self.erase {
                    self.xmp.remove(&key);
                }
            }
        }
        exif.assign(to, &bits.to_string());
    }

    fn cnv_xmp_gps_coord(&mut self, from: &str, to: &str) {
        let Some(exif) = self.exif.as_deref_mut() else {
            return;
        };
        if !self.xmp.contains(from) {
            return;
        }
        if !prepare_exif_target(exif, to, false, self.overwrite) {
            return;
        }
        let Some(value) = self.xmp.text_value(from) else {
            warn!("failed to convert {from} to {to}");
            return;
        };
        if value.is_empty() {
            warn!("{from} is empty");
            return;
        }
        let Some((deg, minutes, seconds, ref_char)) = parse_gps_coord(&value) else {
            warn!("failed to convert {from} to {to}");
            return;
        };
        let (dn, dd) = float_to_rational(deg as f32);
        let (mn, md) = float_to_rational(minutes as f32);
        let (sn, sd) = float_to_rational(seconds as f32);
        exif.assign(to, &format!("{dn}/{dd} {mn}/{md} {sn}/{sd}"));
        let ref_key = format!("{to}Ref");
        prepare_exif_target(exif, &ref_key, true, self.overwrite);
        exif.assign(&ref_key, &ref_char.to_string());
        if self.erase {
            self.xmp.remove(from);
        }
    }

    fn cnv_xmp_to_iptc(&mut self, from: &str, to: &str) {
        let Some(iptc) = self.iptc.as_deref_mut() else {
            return;
        };
        let Some(value) = self.xmp.find(from).cloned() else {
            return;
        };
        let Some(key) = DatasetKey::from_name(to) else {
            return;
        };
        if !prepare_iptc_target(iptc, key, false, self.overwrite) {
            return;
        }
        match value {
            XmpValue::Text(_) | XmpValue::LangAlt(_) => {
                let Some(text) = self.xmp.text_value(from) else {
                    warn!("failed to convert {from} to {to}");
                    return;
                };
                iptc.assign_id(key, &text);
                stamp_utf8(iptc);
                if self.erase {
                    self.xmp.remove(from);
                }
            }
            XmpValue::Array(_, items) => {
                let mut added = false;
                for item in &items {
                    let parsed = parse_iptc_text(key, item);
                    if let Err(e) = iptc.add(IptcEntry::new(key, parsed)) {
                        warn!("failed to convert {from} to {to}: {e}");
                        continue;
                    }
                    added = true;
                }
                if added {
                    stamp_utf8(iptc);
                }
                if self.erase {
                    self.xmp.remove(from);
                }
            }
        }
    }
}

// *****************************************************************************
// free functions

pub fn copy_exif_to_xmp(exif: &ExifData, xmp: &mut XmpData) {
    let mut scratch = exif.clone();
    Converter::for_exif(&mut scratch, xmp).to_xmp();
}

pub fn move_exif_to_xmp(exif: &mut ExifData, xmp: &mut XmpData) {
    let mut converter = Converter::for_exif(exif, xmp);
    converter.set_erase(true);
    converter.to_xmp();
}

pub fn copy_xmp_to_exif(xmp: &XmpData, exif: &mut ExifData) {
    let mut scratch = xmp.clone();
    Converter::for_exif(exif, &mut scratch).from_xmp();
}

pub fn move_xmp_to_exif(xmp: &mut XmpData, exif: &mut ExifData) {
    let mut converter = Converter::for_exif(exif, xmp);
    converter.set_erase(true);
    converter.from_xmp();
}

pub fn copy_iptc_to_xmp(iptc: &IptcData, xmp: &mut XmpData, charset: Option<Charset>) {
    let charset = charset
        .or_else(|| charset::detect_charset(iptc))
        .unwrap_or(Charset::Iso88591);
    let mut scratch = iptc.clone();
    Converter::for_iptc(&mut scratch, xmp, charset).to_xmp();
}

pub fn move_iptc_to_xmp(iptc: &mut IptcData, xmp: &mut XmpData, charset: Option<Charset>) {
    let charset = charset
        .or_else(|| charset::detect_charset(iptc))
        .unwrap_or(Charset::Iso88591);
    let mut converter = Converter::for_iptc(iptc, xmp, charset);
    converter.set_erase(true);
    converter.to_xmp();
}

pub fn copy_xmp_to_iptc(xmp: &XmpData, iptc: &mut IptcData) {
    let mut scratch = xmp.clone();
    Converter::for_iptc(iptc, &mut scratch, Charset::Utf8).from_xmp();
}

pub fn move_xmp_to_iptc(xmp: &mut XmpData, iptc: &mut IptcData) {
    let mut converter = Converter::for_iptc(iptc, xmp, Charset::Utf8);
    converter.set_erase(true);
    converter.from_xmp();
}

/// Reconcile Exif and XMP using the stored digests; see [`digest`].
pub fn sync_exif_with_xmp(exif: &mut ExifData, xmp: &mut XmpData) {
    Converter::for_exif(exif, xmp).sync();
}

// *****************************************************************************
// helpers

fn prepare_xmp_target(xmp: &mut XmpData, to: &str, force: bool, overwrite: bool) -> bool {
    if !xmp.contains(to) {
        return true;
    }
    if !overwrite && !force {
        return false;
    }
    xmp.remove(to);
    true
}

fn prepare_exif_target(exif: &mut ExifData, to: &str, force: bool, overwrite: bool) -> bool {
    if exif.find(to).is_none() {
        return true;
    }
    if !overwrite && !force {
        return false;
    }
    exif.remove(to);
    true
}

fn prepare_iptc_target(iptc: &mut IptcData, to: DatasetKey, force: bool, overwrite: bool) -> bool {
    if iptc.find_id(to).is_none() {
        return true;
    }
    if !overwrite && !force {
        return false;
    }
    iptc.remove_all(to);
    true
}

fn parse_iptc_text(key: DatasetKey, text: &str) -> Value {
    let tag = datasets::expected_type(key.dataset, key.record);
    match Value::from_text(tag, text) {
        Ok(v) => v,
        Err(_) => Value::Str(text.as_bytes().to_vec()),
    }
}

/// Record the envelope charset marker so readers treat the payloads as UTF-8.
fn stamp_utf8(iptc: &mut IptcData) {
    let key = DatasetKey::new(datasets::ENVELOPE, datasets::CHARACTER_SET);
    iptc.assign_id(key, "\u{1b}%G");
}

fn subsec_companion(key: &str) -> Option<&'static str> {
    match key {
        "Exif.Image.DateTime" => Some("Exif.Photo.SubSecTime"),
        "Exif.Photo.DateTimeOriginal" => Some("Exif.Photo.SubSecTimeOriginal"),
        "Exif.Photo.DateTimeDigitized" => Some("Exif.Photo.SubSecTimeDigitized"),
        _ => None,
    }
}

/// Drop the `charset=... ` prefix a comment may carry in text form.
fn strip_comment_charset(text: &str) -> &str {
    if let Some(rest) = text.strip_prefix("charset=") {
        if let Some((_, comment)) = rest.split_once(' ') {
            return comment;
        }
        return "";
    }
    text
}

/// Parse `"YYYY:MM:DD HH:MM:SS"`.
fn parse_exif_datetime(text: &str) -> Option<(i32, u32, u32, u32, u32, u32)> {
    let (date, time) = text.trim().split_once(' ')?;
    let (year, month, day) = parse_exif_date(date)?;
    let mut it = time.split(':');
    let hour = it.next()?.parse().ok()?;
    let minute = it.next()?.parse().ok()?;
    let second = it.next()?.parse().ok()?;
    if it.next().is_some() {
        return None;
    }
    Some((year, month, day, hour, minute, second))
}

/// Parse `"YYYY:MM:DD"`, tolerating a trailing time part.
fn parse_exif_date(text: &str) -> Option<(i32, u32, u32)> {
    let date = text.trim().split(' ').next()?;
    let mut it = date.split(':');
    let year = it.next()?.parse().ok()?;
    let month = it.next()?.parse().ok()?;
    let day = it.next()?.parse().ok()?;
    Some((year, month, day))
}

struct XmpDateTime {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    nanosecond: u32,
}

/// Parse an XMP date (`YYYY-MM-DDThh:mm:ss.fffffffff+hh:mm` with every part
/// after the year optional). The time zone designator is accepted and
/// dropped; values are treated as wall-clock time.
fn parse_xmp_date(text: &str) -> Option<XmpDateTime> {
    let text = text.trim();
    let (date, time) = match text.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (text, None),
    };

    let mut dt = XmpDateTime {
        year: 0,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
        nanosecond: 0,
    };

    let mut parts = date.split('-');
    dt.year = parts.next()?.parse().ok()?;
    if let Some(m) = parts.next() {
        dt.month = m.parse().ok()?;
    }
    if let Some(d) = parts.next() {
        dt.day = d.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }

    let Some(time) = time else {
        return Some(dt);
    };
    // Strip the zone designator.
    let time = time
        .strip_suffix('Z')
        .or_else(|| time.rsplit_once(['+', '-']).map(|(t, _)| t))
        .unwrap_or(time);

    let mut parts = time.split(':');
    dt.hour = parts.next()?.parse().ok()?;
    if let Some(m) = parts.next() {
        dt.minute = m.parse().ok()?;
    }
    if let Some(s) = parts.next() {
        match s.split_once('.') {
            Some((sec, frac)) => {
                dt.second = sec.parse().ok()?;
                let digits: String = frac.chars().take(9).collect();
                let scale = 10u32.pow(9 - digits.len() as u32);
                dt.nanosecond = digits.parse::<u32>().ok()? * scale;
            }
            None => dt.second = s.parse().ok()?,
        }
    }
    if parts.next().is_some() {
        return None;
    }
    Some(dt)
}

fn parse_xmp_uint(text: &str) -> Option<u32> {
    match text {
        "True" | "true" => Some(1),
        "False" | "false" => Some(0),
        _ => text.trim().parse().ok(),
    }
}

/// Parse `"D,M.mmmmmmmR"` or `"D,M,SR"` where R is one of NSEW. Returns
/// degrees, minutes, seconds and the reference character.
fn parse_gps_coord(text: &str) -> Option<(f64, f64, f64, char)> {
    let ref_char = text.chars().last()?;
    if !matches!(ref_char, 'N' | 'S' | 'E' | 'W') {
        return None;
    }
    let body = &text[..text.len() - 1];
    let mut parts = body.split(',');
    let deg: f64 = parts.next()?.trim().parse().ok()?;
    let second = parts.next()?.trim();
    let (minutes, seconds) = match parts.next() {
        Some(sec) => {
            let minutes: f64 = second.parse().ok()?;
            let seconds: f64 = sec.trim().parse().ok()?;
            (minutes, seconds)
        }
        None => {
            let raw: f64 = second.parse().ok()?;
            (raw.trunc(), (raw - raw.trunc()) * 60.0)
        }
    };
    if parts.next().is_some() {
        return None;
    }
    Some((deg, minutes, seconds, ref_char))
}

/// Cast a float to a reduced rational with a denominator chosen by
/// magnitude.
fn float_to_rational(f: f32) -> (i32, i32) {
    if !f.is_finite() {
        return (if f > 0.0 { 1 } else { -1 }, 0);
    }
    let mut den: i32 = 1_000_000;
    if f.abs() > 2147.0 {
        den = 10_000;
    }
    if f.abs() > 214_748.0 {
        den = 1;
    }
    let nom = (f64::from(f) * f64::from(den)).round() as i32;
    let g = gcd(nom.unsigned_abs(), den.unsigned_abs()).max(1) as i32;
    (nom / g, den / g)
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use crate::xmp::ArrayKind;

    #[test]
    fn exif_value_to_xmp_and_back() {
        let mut exif = ExifData::new();
        exif.set("Exif.Image.Orientation", Value::Short(vec![6]));
        let mut xmp = XmpData::new();
        copy_exif_to_xmp(&exif, &mut xmp);
        assert_eq!(xmp.text_value("Xmp.tiff.Orientation"), Some("6".into()));

        let mut back = ExifData::new();
        copy_xmp_to_exif(&xmp, &mut back);
        assert_eq!(
            back.find("Exif.Image.Orientation").map(|e| &e.value),
            Some(&Value::Short(vec![6]))
        );
    }

    #[test]
    fn overwrite_off_preserves_destination() {
        let mut exif = ExifData::new();
        exif.set("Exif.Image.Make", Value::Ascii("Canon".into()));
        let mut xmp = XmpData::new();
        xmp.set("Xmp.tiff.Make", XmpValue::Text("Nikon".into()));
        let mut converter = Converter::for_exif(&mut exif, &mut xmp);
        converter.set_overwrite(false);
        converter.to_xmp();
        assert_eq!(xmp.text_value("Xmp.tiff.Make"), Some("Nikon".into()));
    }

    #[test]
    fn erase_moves_the_source() {
        let mut exif = ExifData::new();
        exif.set("Exif.Image.Model", Value::Ascii("R5".into()));
        let mut xmp = XmpData::new();
        move_exif_to_xmp(&mut exif, &mut xmp);
        assert!(exif.find("Exif.Image.Model").is_none());
        assert_eq!(xmp.text_value("Xmp.tiff.Model"), Some("R5".into()));
    }

    #[test]
    fn datetime_with_subsec_round_trip() {
        let mut exif = ExifData::new();
        exif.set(
            "Exif.Photo.DateTimeOriginal",
            Value::Ascii("2003:12:14 12:01:44".into()),
        );
        exif.set("Exif.Photo.SubSecTimeOriginal", Value::Ascii("999".into()));
        let mut xmp = XmpData::new();
        copy_exif_to_xmp(&exif, &mut xmp);
        assert_eq!(
            xmp.text_value("Xmp.photoshop.DateCreated"),
            Some("2003-12-14T12:01:44.999".into())
        );

        let mut back = ExifData::new();
        copy_xmp_to_exif(&xmp, &mut back);
        assert_eq!(
            back.text("Exif.Photo.DateTimeOriginal"),
            Some("2003:12:14 12:01:44".into())
        );
        assert_eq!(back.text("Exif.Photo.SubSecTimeOriginal"), Some("999000000".into()));
    }

    #[test]
    fn version_round_trip() {
        let mut exif = ExifData::new();
        exif.set("Exif.Photo.ExifVersion", Value::Undefined(b"0230".to_vec()));
        let mut xmp = XmpData::new();
        copy_exif_to_xmp(&exif, &mut xmp);
        assert_eq!(xmp.text_value("Xmp.exif.ExifVersion"), Some("0230".into()));

        let mut back = ExifData::new();
        copy_xmp_to_exif(&xmp, &mut back);
        assert_eq!(
            back.find("Exif.Photo.ExifVersion").map(|e| &e.value),
            Some(&Value::Undefined(b"0230".to_vec()))
        );
    }

    #[test]
    fn flash_bits_round_trip() {
        let mut exif = ExifData::new();
        // Fired, auto mode.
        exif.set("Exif.Photo.Flash", Value::Short(vec![0x19]));
        let mut xmp = XmpData::new();
        copy_exif_to_xmp(&exif, &mut xmp);
        assert_eq!(
            xmp.text_value("Xmp.exif.Flash/exif:Fired"),
            Some("True".into())
        );
        assert_eq!(
            xmp.text_value("Xmp.exif.Flash/exif:Mode"),
            Some("3".into())
        );

        let mut back = ExifData::new();
        copy_xmp_to_exif(&xmp, &mut back);
        assert_eq!(
            back.find("Exif.Photo.Flash").map(|e| &e.value),
            Some(&Value::Short(vec![0x19]))
        );
    }

    #[test]
    fn gps_coordinate_round_trip() {
        let mut exif = ExifData::new();
        exif.set(
            "Exif.GPSInfo.GPSLatitude",
            Value::Rational(vec![(52, 1), (30, 1), (0, 1)]),
        );
        exif.set("Exif.GPSInfo.GPSLatitudeRef", Value::Ascii("N".into()));
        let mut xmp = XmpData::new();
        copy_exif_to_xmp(&exif, &mut xmp);
        assert_eq!(
            xmp.text_value("Xmp.exif.GPSLatitude"),
            Some("52,30.0000000N".into())
        );

        let mut back = ExifData::new();
        copy_xmp_to_exif(&xmp, &mut back);
        assert_eq!(
            back.find("Exif.GPSInfo.GPSLatitude").map(|e| &e.value),
            Some(&Value::Rational(vec![(52, 1), (30, 1), (0, 1)]))
        );
        assert_eq!(back.text("Exif.GPSInfo.GPSLatitudeRef"), Some("N".into()));
    }

    #[test]
    fn gps_version_round_trip() {
        let mut exif = ExifData::new();
        exif.set("Exif.GPSInfo.GPSVersionID", Value::Byte(vec![2, 3, 0, 0]));
        let mut xmp = XmpData::new();
        copy_exif_to_xmp(&exif, &mut xmp);
        assert_eq!(
            xmp.text_value("Xmp.exif.GPSVersionID"),
            Some("2.3.0.0".into())
        );
        let mut back = ExifData::new();
        copy_xmp_to_exif(&xmp, &mut back);
        assert_eq!(
            back.find("Exif.GPSInfo.GPSVersionID").map(|e| &e.value),
            Some(&Value::Byte(vec![2, 3, 0, 0]))
        );
    }

    #[test]
    fn comment_gains_and_loses_charset_prefix() {
        let mut xmp = XmpData::new();
        xmp.assign_text("Xmp.exif.UserComment", "a comment");
        let mut exif = ExifData::new();
        copy_xmp_to_exif(&xmp, &mut exif);
        assert_eq!(
            exif.text("Exif.Photo.UserComment"),
            Some("charset=Unicode a comment".into())
        );

        let mut round = XmpData::new();
        copy_exif_to_xmp(&exif, &mut round);
        assert_eq!(
            round.text_value("Xmp.exif.UserComment"),
            Some("a comment".into())
        );
    }

    #[test]
    fn repeated_iptc_entries_build_one_array() {
        let mut iptc = IptcData::new();
        assert!(iptc.assign("Iptc.Application2.Keywords", "alpha"));
        let key = DatasetKey::from_name("Iptc.Application2.Keywords").unwrap();
        iptc.add(IptcEntry::new(key, Value::Str(b"beta".to_vec()))).unwrap();
        let mut xmp = XmpData::new();
        copy_iptc_to_xmp(&iptc, &mut xmp, None);
        assert_eq!(
            xmp.find("Xmp.dc.subject"),
            Some(&XmpValue::Array(
                ArrayKind::Bag,
                vec!["alpha".into(), "beta".into()]
            ))
        );
    }

    #[test]
    fn xmp_array_to_iptc_stamps_charset() {
        let mut xmp = XmpData::new();
        xmp.assign_text("Xmp.dc.subject", "alpha");
        xmp.assign_text("Xmp.dc.subject", "beta");
        let mut iptc = IptcData::new();
        copy_xmp_to_iptc(&xmp, &mut iptc);
        let key = DatasetKey::from_name("Iptc.Application2.Keywords").unwrap();
        let keywords: Vec<String> = iptc.entries_with_id(key).map(|e| e.to_text()).collect();
        assert_eq!(keywords, vec!["alpha", "beta"]);
        let cs = DatasetKey::new(datasets::ENVELOPE, datasets::CHARACTER_SET);
        assert_eq!(
            iptc.find_id(cs).and_then(|e| e.value.text_bytes()),
            Some(charset::UTF8_INDICATOR)
        );
    }

    #[test]
    fn latin1_iptc_is_recoded_to_utf8() {
        let mut iptc = IptcData::new();
        let key = DatasetKey::from_name("Iptc.Application2.City").unwrap();
        // "Zürich" in ISO-8859-1.
        iptc.add(IptcEntry::new(key, Value::Str(b"Z\xfcrich".to_vec())))
            .unwrap();
        let mut xmp = XmpData::new();
        copy_iptc_to_xmp(&iptc, &mut xmp, None);
        assert_eq!(
            xmp.text_value("Xmp.photoshop.City"),
            Some("Zürich".into())
        );
    }

    #[test]
    fn iptc_date_rules_are_one_way() {
        let mut iptc = IptcData::new();
        assert!(iptc.assign("Iptc.Application2.DateCreated", "2004-08-13"));
        let mut xmp = XmpData::new();
        copy_iptc_to_xmp(&iptc, &mut xmp, None);
        assert!(xmp.find("Xmp.photoshop.DateCreated").is_none());
    }

    #[test]
    fn gps_coord_rejects_bad_reference() {
        assert!(parse_gps_coord("52,30.5X").is_none());
        assert!(parse_gps_coord("52;30.5N").is_none());
        assert_eq!(
            parse_gps_coord("52,30,10N"),
            Some((52.0, 30.0, 10.0, 'N'))
        );
        let (deg, minutes, seconds, r) = parse_gps_coord("9,33.5E").unwrap();
        assert_eq!((deg, minutes, r), (9.0, 33.0, 'E'));
        assert!((seconds - 30.0).abs() < 1e-9);
    }

    #[test]
    fn xmp_date_zone_is_dropped() {
        let dt = parse_xmp_date("2005-03-01T12:30:45.123+02:00").unwrap();
        assert_eq!(
            (dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second),
            (2005, 3, 1, 12, 30, 45)
        );
        assert_eq!(dt.nanosecond, 123_000_000);
        let short = parse_xmp_date("2005").unwrap();
        assert_eq!((short.year, short.month, short.day), (2005, 1, 1));
    }
}
