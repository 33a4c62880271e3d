use imgmeta::charset::Charset;
use imgmeta::convert::digest::{EXIF_DIGEST_KEY, TIFF_DIGEST_KEY};
use imgmeta::convert::{
    copy_iptc_to_xmp, copy_xmp_to_iptc, move_exif_to_xmp, sync_exif_with_xmp, Converter,
};
use imgmeta::exif::ExifData;
use imgmeta::iptc::{self, DatasetKey, IptcData};
use imgmeta::value::Value;
use imgmeta::xmp::{ArrayKind, XmpData, XmpValue};

fn dataset(record: u16, number: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0x1c, record as u8, number as u8];
    out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

#[test]
fn decode_convert_encode_round_trip() {
    let mut raw = Vec::new();
    raw.extend(dataset(2, 105, b"Fire in the valley"));
    raw.extend(dataset(2, 25, b"fire"));
    raw.extend(dataset(2, 25, b"valley"));
    raw.extend(dataset(2, 90, b"Z\xfcrich"));

    let mut iptc = IptcData::new();
    let report = iptc::decode(&raw, &mut iptc).unwrap();
    assert!(report.is_clean());
    assert_eq!(iptc.len(), 4);

    // Charset detection fails on the Latin-1 byte, so conversion falls back
    // to ISO-8859-1 and recodes the city name on the way out.
    let mut xmp = XmpData::new();
    copy_iptc_to_xmp(&iptc, &mut xmp, None);
    assert_eq!(
        xmp.text_value("Xmp.photoshop.Headline"),
        Some("Fire in the valley".into())
    );
    assert_eq!(xmp.text_value("Xmp.photoshop.City"), Some("Zürich".into()));
    assert_eq!(
        xmp.find("Xmp.dc.subject"),
        Some(&XmpValue::Array(
            ArrayKind::Bag,
            vec!["fire".into(), "valley".into()]
        ))
    );

    // The source container is untouched and still encodes to the same bytes.
    let encoded = iptc::encode(&iptc);
    let mut decoded = IptcData::new();
    iptc::decode(&encoded, &mut decoded).unwrap();
    assert_eq!(decoded.entries(), iptc.entries());
}

#[test]
fn xmp_to_iptc_sets_utf8_envelope() {
    let mut xmp = XmpData::new();
    xmp.set(
        "Xmp.dc.title",
        XmpValue::LangAlt(vec![("x-default".into(), "Überschrift".into())]),
    );
    xmp.assign_text("Xmp.dc.subject", "alpha");
    xmp.assign_text("Xmp.dc.subject", "beta");

    let mut iptc = IptcData::new();
    copy_xmp_to_iptc(&xmp, &mut iptc);

    let title = iptc.find_key("Iptc.Application2.ObjectName").unwrap();
    assert_eq!(title.to_text(), "Überschrift");
    let keywords: Vec<String> = iptc
        .entries_with_id(DatasetKey::from_name("Iptc.Application2.Keywords").unwrap())
        .map(|e| e.to_text())
        .collect();
    assert_eq!(keywords, vec!["alpha", "beta"]);
    assert_eq!(
        imgmeta::charset::detect_charset(&iptc),
        Some(Charset::Utf8)
    );

    // With the envelope marker present the bytes survive a full round trip.
    let encoded = iptc::encode(&iptc);
    let mut decoded = IptcData::new();
    iptc::decode(&encoded, &mut decoded).unwrap();
    let mut back = XmpData::new();
    copy_iptc_to_xmp(&decoded, &mut back, None);
    assert_eq!(back.text_value("Xmp.dc.title"), Some("Überschrift".into()));
}

#[test]
fn corrupt_stream_keeps_good_fields() {
    let mut raw = Vec::new();
    raw.extend(dataset(2, 105, b"kept"));
    // Extended-length escape announcing a 5-byte size of size.
    raw.extend([0x1c, 0x02, 0x19, 0x80, 0x05]);
    raw.extend([0u8; 5]);
    raw.extend(dataset(2, 90, b"also kept"));

    let mut iptc = IptcData::new();
    let report = iptc::decode(&raw, &mut iptc).unwrap();
    assert!(!report.is_clean());
    assert_eq!(iptc.len(), 2);
}

#[test]
fn move_erases_converted_exif_tags() {
    let mut exif = ExifData::new();
    exif.set("Exif.Image.Make", Value::Ascii("Canon".into()));
    exif.set("Exif.Photo.Flash", Value::Short(vec![0x19]));
    exif.set("Exif.Photo.MakerNote", Value::Undefined(vec![1, 2, 3]));

    let mut xmp = XmpData::new();
    move_exif_to_xmp(&mut exif, &mut xmp);

    assert_eq!(xmp.text_value("Xmp.tiff.Make"), Some("Canon".into()));
    assert_eq!(
        xmp.text_value("Xmp.exif.Flash/exif:Fired"),
        Some("True".into())
    );
    // Tags without a rule stay behind.
    assert!(exif.find("Exif.Image.Make").is_none());
    assert!(exif.find("Exif.Photo.Flash").is_none());
    assert!(exif.find("Exif.Photo.MakerNote").is_some());
}

#[test]
fn sync_cycle_converges() {
    let mut exif = ExifData::new();
    exif.set("Exif.Image.Make", Value::Ascii("Canon".into()));
    exif.set(
        "Exif.Photo.DateTimeOriginal",
        Value::Ascii("2003:12:14 12:01:44".into()),
    );

    let mut xmp = XmpData::new();
    sync_exif_with_xmp(&mut exif, &mut xmp);
    assert!(xmp.contains(TIFF_DIGEST_KEY));
    assert!(xmp.contains(EXIF_DIGEST_KEY));
    let first = xmp.clone();

    // Nothing changed on either side, so another sync is a fixed point:
    // digests match, XMP is copied back over Exif, and both containers
    // come out as they went in.
    sync_exif_with_xmp(&mut exif, &mut xmp);
    assert_eq!(xmp, first);
    assert_eq!(exif.text("Exif.Image.Make"), Some("Canon".into()));
    assert_eq!(
        exif.text("Exif.Photo.DateTimeOriginal"),
        Some("2003:12:14 12:01:44".into())
    );

    // An Exif edit flips the decision the other way.
    exif.set("Exif.Image.Software", Value::Ascii("darktable".into()));
    sync_exif_with_xmp(&mut exif, &mut xmp);
    assert_eq!(xmp.text_value("Xmp.tiff.Software"), Some("darktable".into()));
}

#[test]
fn second_conversion_pass_changes_nothing() {
    // Repeated datasets feed the array-append path, where a second pass
    // would double the elements if the occupied destination were not
    // skipped.
    let mut raw = Vec::new();
    raw.extend(dataset(2, 25, b"fire"));
    raw.extend(dataset(2, 25, b"valley"));
    let mut iptc = IptcData::new();
    iptc::decode(&raw, &mut iptc).unwrap();

    let mut xmp = XmpData::new();
    let mut converter = Converter::for_iptc(&mut iptc, &mut xmp, Charset::Utf8);
    converter.set_overwrite(false);
    converter.to_xmp();
    let once = xmp.clone();
    assert_eq!(
        xmp.find("Xmp.dc.subject"),
        Some(&XmpValue::Array(
            ArrayKind::Bag,
            vec!["fire".into(), "valley".into()]
        ))
    );

    let mut converter = Converter::for_iptc(&mut iptc, &mut xmp, Charset::Utf8);
    converter.set_overwrite(false);
    converter.to_xmp();
    assert_eq!(xmp, once);

    // Same property for Exif sources, including an array-valued tag and
    // the flash structure members.
    let mut exif = ExifData::new();
    exif.set(
        "Exif.Photo.ComponentsConfiguration",
        Value::Undefined(vec![1, 2, 3, 0]),
    );
    exif.set("Exif.Photo.Flash", Value::Short(vec![0x19]));
    let mut converter = Converter::for_exif(&mut exif, &mut xmp);
    converter.set_overwrite(false);
    converter.to_xmp();
    let once = xmp.clone();

    let mut converter = Converter::for_exif(&mut exif, &mut xmp);
    converter.set_overwrite(false);
    converter.to_xmp();
    assert_eq!(xmp, once);
}

#[test]
fn oversized_dataset_aborts_with_partial_data() {
    let mut raw = Vec::new();
    raw.extend(dataset(2, 105, b"first"));
    // Extended length of 70000 but a short body.
    raw.extend([0x1c, 0x02, 0x19, 0x80, 0x04, 0x00, 0x01, 0x11, 0x70]);
    raw.extend([0u8; 16]);

    let mut iptc = IptcData::new();
    let err = iptc::decode(&raw, &mut iptc).unwrap_err();
    assert!(matches!(err, iptc::DecodeError::OversizedDataset { .. }));
    assert_eq!(iptc.len(), 1);
}
