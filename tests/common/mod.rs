#![allow(dead_code)]

use dicom::{
    core::{DataElement, PrimitiveValue, VR},
    object::{FileMetaTableBuilder, InMemDicomObject},
};
use dicom_dictionary_std::tags;
use flate2::write::GzEncoder;
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
const SECONDARY_CAPTURE_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.7";

/// Encode a 16-bit monochrome slice as a DICOM file in memory.
pub fn dicom_slice(rows: u16, columns: u16, pixels: &[u16], instance: i32) -> Vec<u8> {
    dicom_file(rows, columns, &[pixels], instance, |_| {})
}

/// Encode one 16-bit monochrome object holding every frame of `frames`,
/// with `attributes` adding extra elements before it is written.
pub fn dicom_file(
    rows: u16,
    columns: u16,
    frames: &[&[u16]],
    instance: i32,
    attributes: impl FnOnce(&mut InMemDicomObject),
) -> Vec<u8> {
    let frame_len = rows as usize * columns as usize;
    assert!(frames.iter().all(|frame| frame.len() == frame_len));
    let pixels: Vec<u16> = frames.concat();
    let sop_instance_uid = format!("1.2.826.0.1.3680043.2.1125.1.{instance}");

    let mut object = InMemDicomObject::from_element_iter([
        DataElement::new(
            tags::SOP_CLASS_UID,
            VR::UI,
            PrimitiveValue::from(SECONDARY_CAPTURE_IMAGE_STORAGE),
        ),
        DataElement::new(
            tags::SOP_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from(sop_instance_uid.as_str()),
        ),
        DataElement::new(
            tags::INSTANCE_NUMBER,
            VR::IS,
            PrimitiveValue::from(instance.to_string()),
        ),
        DataElement::new(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16)),
        DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from("MONOCHROME2"),
        ),
        DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(rows)),
        DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(columns)),
        DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(16_u16)),
        DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(16_u16)),
        DataElement::new(tags::HIGH_BIT, VR::US, PrimitiveValue::from(15_u16)),
        DataElement::new(tags::PIXEL_REPRESENTATION, VR::US, PrimitiveValue::from(0_u16)),
        DataElement::new(tags::PIXEL_DATA, VR::OW, PrimitiveValue::U16(pixels.into())),
    ]);
    if frames.len() > 1 {
        object.put(DataElement::new(
            tags::NUMBER_OF_FRAMES,
            VR::IS,
            PrimitiveValue::from(frames.len().to_string()),
        ));
    }
    attributes(&mut object);

    let file_object = object
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(SECONDARY_CAPTURE_IMAGE_STORAGE)
                .media_storage_sop_instance_uid(sop_instance_uid.as_str()),
        )
        .unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("slice.dcm");
    file_object.write_to_file(&path).unwrap();
    fs::read(&path).unwrap()
}

/// A 2x2 slice of `value` carrying ImagePositionPatient `(0, 0, z)`.
pub fn positioned_slice(value: u16, z: f64) -> Vec<u8> {
    dicom_file(2, 2, &[&[value; 4][..]], 1, |object| {
        let position: Vec<String> = [0.0, 0.0, z].iter().map(f64::to_string).collect();
        object.put(DataElement::new(
            tags::IMAGE_POSITION_PATIENT,
            VR::DS,
            PrimitiveValue::Strs(position.into_iter().collect()),
        ));
    })
}

/// A 2x2 slice of `value` carrying TablePosition `position`.
pub fn table_slice(value: u16, position: f64) -> Vec<u8> {
    dicom_file(2, 2, &[&[value; 4][..]], 1, |object| {
        object.put(DataElement::new(
            tags::TABLE_POSITION,
            VR::FD,
            PrimitiveValue::from(position),
        ));
    })
}

/// A 2x2 slice whose pixels are all `value`.
pub fn flat_slice(value: u16, instance: i32) -> Vec<u8> {
    dicom_slice(2, 2, &[value; 4], instance)
}

pub fn write_file(path: &Path, data: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, data).unwrap();
}

fn append_entries<W: Write>(builder: &mut tar::Builder<W>, entries: &[(String, Vec<u8>)]) {
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, data.as_slice())
            .unwrap();
    }
}

pub fn write_tar_gz(path: &Path, entries: &[(String, Vec<u8>)]) -> PathBuf {
    let encoder = GzEncoder::new(File::create(path).unwrap(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    append_entries(&mut builder, entries);
    builder.into_inner().unwrap().finish().unwrap();
    path.to_path_buf()
}

pub fn write_tar_bz2(path: &Path, entries: &[(String, Vec<u8>)]) -> PathBuf {
    let encoder =
        bzip2::write::BzEncoder::new(File::create(path).unwrap(), bzip2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    append_entries(&mut builder, entries);
    builder.into_inner().unwrap().finish().unwrap();
    path.to_path_buf()
}

/// Two series of two slices each, named as a scanner export names them.
pub fn two_series_entries() -> Vec<(String, Vec<u8>)> {
    vec![
        ("Scan1__E1/img01.dcm".to_string(), flat_slice(100, 1)),
        ("Scan1__E1/img02.dcm".to_string(), flat_slice(200, 2)),
        ("Scan2__E2/img01.dcm".to_string(), flat_slice(300, 1)),
        ("Scan2__E2/img02.dcm".to_string(), flat_slice(600, 2)),
    ]
}

pub fn sorted_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}
