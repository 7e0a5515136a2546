use crate::{
    error::{Error, ErrorCategory, ErrorKind},
    mem::{Instance, PlyData},
    schema::{ElementDef, Schema},
    types::{Encoding, ScalarType},
};
use super::{Config, MissingValues};


fn mesh() -> Result<PlyData, Error> {
    let mut schema = Schema::new();
    schema.add_comment("hand made")?;
    schema.add_element(
        ElementDef::new("vertex")?
            .with_property("x", ScalarType::Float)?
            .with_property("y", ScalarType::Float)?
            .with_property("red", ScalarType::UChar)?
    )?;
    schema.add_element(
        ElementDef::new("face")?
            .with_list_property("vertex_index", ScalarType::UChar, ScalarType::Int)?
    )?;

    let mut data = PlyData::new(schema);
    data.add_instances("vertex", vec![
        Instance::new().with("x", 0.5f32).with("y", -2.0f32).with("red", 255u8),
        Instance::new().with("red", 0u8).with("y", 0.25f32).with("x", 1.0f32),
    ])?;
    data.add_instance("face", Instance::new().with("vertex_index", vec![0i32, 1, 1]))?;

    Ok(data)
}

fn small(encoding: Encoding) -> Result<Vec<u8>, Error> {
    let v = ElementDef::new("v")?
        .with_property("a", ScalarType::Short)?
        .with_list_property("l", ScalarType::UChar, ScalarType::UInt)?;
    let mut data = PlyData::new(Schema::new().with_element(v)?);
    data.add_instance("v", Instance::new().with("a", -2i16).with("l", vec![1i32]))?;

    Config::new(encoding).write_to_memory(&data)
}

#[test]
fn ascii() -> Result<(), Error> {
    let res = Config::ascii().write_to_memory(&mesh()?)?;

    assert_eq!(res, b"\
        ply\n\
        format ascii 1.0\n\
        comment hand made\n\
        element vertex 2\n\
        property float x\n\
        property float y\n\
        property uchar red\n\
        element face 1\n\
        property list uchar int vertex_index\n\
        end_header\n\
        0.5 -2 255\n\
        1 0.25 0\n\
        3 0 1 1\n\
        " as &[u8]
    );

    Ok(())
}

#[test]
fn binary_little_endian() -> Result<(), Error> {
    let mut expected = b"\
        ply\n\
        format binary_little_endian 1.0\n\
        element v 1\n\
        property short a\n\
        property list uchar uint l\n\
        end_header\n\
    ".to_vec();
    expected.extend_from_slice(&[0xFE, 0xFF, 1, 1, 0, 0, 0]);

    assert_eq!(small(Encoding::BinaryLittleEndian)?, expected);
    Ok(())
}

#[test]
fn binary_big_endian() -> Result<(), Error> {
    let mut expected = b"\
        ply\n\
        format binary_big_endian 1.0\n\
        element v 1\n\
        property short a\n\
        property list uchar uint l\n\
        end_header\n\
    ".to_vec();
    expected.extend_from_slice(&[0xFF, 0xFE, 1, 0, 0, 0, 1]);

    assert_eq!(small(Encoding::BinaryBigEndian)?, expected);
    Ok(())
}

#[test]
fn config_comments_follow_schema_comments() -> Result<(), Error> {
    let res = Config::ascii().add_comment("by plyx").write_to_memory(&mesh()?)?;
    let res = String::from_utf8(res).unwrap();

    assert!(res.starts_with("ply\nformat ascii 1.0\ncomment hand made\ncomment by plyx\nelement"));
    Ok(())
}

#[test]
#[should_panic]
fn config_comment_with_newline() {
    let _ = Config::ascii().add_comment("a\nb");
}

#[test]
fn aliases_are_written_with_traditional_names() -> Result<(), Error> {
    let input = "ply\nformat ascii 1.0\nelement v 1\nproperty int8 a\nproperty uint16 b\n\
        property list uint32 float64 c\nend_header\n-1 65535 1 0.5\n";
    let data = crate::read::read(input.as_bytes())?;
    let res = String::from_utf8(Config::ascii().write_to_memory(&data)?).unwrap();

    assert_eq!(res, "ply\nformat ascii 1.0\nelement v 1\nproperty char a\nproperty ushort b\n\
        property list uint double c\nend_header\n-1 65535 1 0.5\n");
    Ok(())
}

#[test]
fn missing_value_is_rejected_in_all_encodings() -> Result<(), Error> {
    for &encoding in &[Encoding::Ascii, Encoding::BinaryLittleEndian, Encoding::BinaryBigEndian] {
        let mut data = mesh()?;
        data.instances_mut("vertex").unwrap()[1].remove("y");

        let err = Config::new(encoding).write_to_memory(&data).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::TypeMismatch);
        match err.into_kind() {
            ErrorKind::DataIncomplete { element, instance, property } => {
                assert_eq!(element, "vertex");
                assert_eq!(instance, 1);
                assert_eq!(property, "y");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    Ok(())
}

#[test]
fn wrong_kind_counts_as_missing() -> Result<(), Error> {
    let mut data = mesh()?;
    data.instances_mut("vertex").unwrap()[0].set("x", 0.5f64);

    let err = Config::ascii().write_to_memory(&data).unwrap_err();
    match err.kind() {
        ErrorKind::DataIncomplete { property, .. } => assert_eq!(property, "x"),
        other => panic!("unexpected error {:?}", other),
    }

    Ok(())
}

#[test]
fn missing_values_written_as_zero() -> Result<(), Error> {
    let mut data = mesh()?;
    data.instances_mut("vertex").unwrap()[0].remove("red");
    data.instances_mut("face").unwrap()[0].remove("vertex_index");

    let res = Config::ascii()
        .missing_values(MissingValues::Zero)
        .write_to_memory(&data)?;
    let res = String::from_utf8(res).unwrap();

    assert!(res.ends_with("end_header\n0.5 -2 0\n1 0.25 0\n0\n"));
    Ok(())
}

#[test]
fn list_too_long_for_len_type() -> Result<(), Error> {
    let mut data = mesh()?;
    data.instances_mut("face").unwrap()[0].set("vertex_index", vec![0i32; 256]);

    let err = Config::binary().write_to_memory(&data).unwrap_err();
    match err.kind() {
        ErrorKind::ListTooLong { property, len, len_type } => {
            assert_eq!(property, "vertex_index");
            assert_eq!(*len, 256);
            assert_eq!(*len_type, ScalarType::UChar);
        }
        other => panic!("unexpected error {:?}", other),
    }

    // 255 still fits
    data.instances_mut("face").unwrap()[0].set("vertex_index", vec![0i32; 255]);
    Config::binary().write_to_memory(&data)?;

    Ok(())
}

#[test]
fn counts_come_from_source() -> Result<(), Error> {
    let mut data = mesh()?;
    data.instances_mut("vertex").unwrap().clear();
    data.instances_mut("face").unwrap().clear();

    let res = String::from_utf8(Config::ascii().write_to_memory(&data)?).unwrap();
    assert!(res.contains("element vertex 0\n"));
    assert!(res.contains("element face 0\n"));
    assert!(res.ends_with("end_header\n"));

    Ok(())
}

#[test]
fn element_without_properties() -> Result<(), Error> {
    let schema = Schema::new()
        .with_element(ElementDef::new("marker")?)?
        .with_element(ElementDef::new("v")?.with_property("x", ScalarType::Int)?)?;
    let mut data = PlyData::new(schema);
    data.add_instance("marker", Instance::new())?;
    data.add_instance("v", Instance::new().with("x", 5i32))?;

    let ascii = Config::ascii().write_to_memory(&data)?;
    assert!(ascii.ends_with(b"end_header\n5\n"));

    for &encoding in &[Encoding::Ascii, Encoding::BinaryLittleEndian, Encoding::BinaryBigEndian] {
        let file = Config::new(encoding).write_to_memory(&data)?;
        assert_eq!(crate::read::read(&file[..])?, data);
    }

    Ok(())
}
