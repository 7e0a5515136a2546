//! Reading and writing whole files through the public API, in all three
//! encodings.

use failure::Error;

use plyx::{
    ElementDef, Encoding, Instance, PlyData, Property, PropertyPos, ScalarType, Schema, Target,
    bind::{ObjectSource, ObjectTarget, ReadBinding, WriteBinding},
    read::Reader,
    write::Config,
};


const CUBE: &[u8] = include_bytes!("files/cube_ascii.ply");

#[test]
fn cube_values() -> Result<(), Error> {
    let data = plyx::read::read(CUBE)?;

    assert_eq!(data.schema().comments(), &["a colored unit cube".to_string()]);

    let vertices = data.instances("vertex").unwrap();
    assert_eq!(vertices.len(), 8);
    assert_eq!(vertices[6].get("x"), Some(&Property::Float(1.0)));
    assert_eq!(vertices[6].get("blue"), Some(&Property::from(255u8)));
    assert_eq!(vertices[0].get("red"), Some(&Property::Char(-1)));

    let faces = data.instances("face").unwrap();
    assert_eq!(faces.len(), 6);
    assert_eq!(faces[1].get("vertex_indices"), Some(&Property::from(vec![7i32, 6, 5, 4])));

    Ok(())
}

macro_rules! gen_cube_roundtrip {
    ($name:ident, $encoding:expr) => {
        paste::item! {
            #[test]
            fn [<cube_roundtrip_ $name>]() -> Result<(), Error> {
                let original = plyx::read::read(CUBE)?;
                let file = Config::new($encoding).write_to_memory(&original)?;

                let reader = Reader::new(&file[..])?;
                assert_eq!(reader.encoding(), $encoding);
                assert_eq!(reader.counts(), &[8, 6]);
                assert_eq!(reader.schema(), original.schema());

                assert_eq!(reader.read()?, original);
                Ok(())
            }

            #[test]
            fn [<all_types_roundtrip_ $name>]() -> Result<(), Error> {
                let original = all_types()?;
                let file = Config::new($encoding).write_to_memory(&original)?;
                assert_eq!(plyx::read::read(&file[..])?, original);
                Ok(())
            }
        }
    }
}

gen_cube_roundtrip!(ascii, Encoding::Ascii);
gen_cube_roundtrip!(ble, Encoding::BinaryLittleEndian);
gen_cube_roundtrip!(bbe, Encoding::BinaryBigEndian);

/// Every scalar type as scalar and as list, with extreme values.
fn all_types() -> Result<PlyData, plyx::Error> {
    let mut def = ElementDef::new("thing")?;
    for &ty in &ScalarType::ALL {
        def.add_property(format!("s_{}", ty), ty)?;
    }
    def.add_list_property("l_char", ScalarType::Char, ScalarType::Char)?;
    def.add_list_property("l_ushort", ScalarType::UShort, ScalarType::UShort)?;
    def.add_list_property("l_uint", ScalarType::Short, ScalarType::UInt)?;
    def.add_list_property("l_float", ScalarType::UInt, ScalarType::Float)?;
    def.add_list_property("l_double", ScalarType::Int, ScalarType::Double)?;

    let mut data = PlyData::new(Schema::new().with_element(def)?);
    data.add_instance("thing", Instance::new()
        .with("s_char", i8::min_value())
        .with("s_uchar", u8::max_value())
        .with("s_short", i16::min_value())
        .with("s_ushort", u16::max_value())
        .with("s_int", i32::min_value())
        .with("s_uint", u32::max_value())
        .with("s_float", std::f32::MIN_POSITIVE)
        .with("s_double", -1.0e300f64)
        // 255 elements: the `char` length is read as unsigned
        .with("l_char", vec![-3i8; 255])
        .with("l_ushort", vec![u16::max_value() as i16, 0])
        .with("l_uint", vec![u32::max_value() as i32])
        .with("l_float", vec![0.1f32, -0.0, 1.0e-7])
        .with("l_double", Vec::<f64>::new())
    )?;
    data.add_instance("thing", Instance::new()
        .with("s_char", i8::max_value())
        .with("s_uchar", 0u8)
        .with("s_short", i16::max_value())
        .with("s_ushort", 0u16)
        .with("s_int", i32::max_value())
        .with("s_uint", 0u32)
        .with("s_float", -3.5f32)
        .with("s_double", std::f64::consts::PI)
        .with("l_char", Vec::<i8>::new())
        .with("l_ushort", Vec::<i16>::new())
        .with("l_uint", vec![1i32, 2, 3])
        .with("l_float", Vec::<f32>::new())
        .with("l_double", vec![0.1f64; 20])
    )?;

    Ok(data)
}

#[test]
fn converting_between_encodings() -> Result<(), Error> {
    let ascii = plyx::read::read(CUBE)?;
    let ble = Config::new(Encoding::BinaryLittleEndian).write_to_memory(&ascii)?;
    let bbe = Config::new(Encoding::BinaryBigEndian)
        .write_to_memory(&plyx::read::read(&ble[..])?)?;
    let back = Config::ascii().write_to_memory(&plyx::read::read(&bbe[..])?)?;

    assert_eq!(plyx::read::read(&back[..])?, ascii);

    // The output uses the traditional type names, so it's not byte equal to
    // the input. But it's stable from here on.
    let again = Config::ascii().write_to_memory(&plyx::read::read(&back[..])?)?;
    assert_eq!(again, back);

    Ok(())
}

#[test]
fn file_roundtrip() -> Result<(), Error> {
    let data = plyx::read::read(CUBE)?;
    let path = std::env::temp_dir().join(format!("plyx-roundtrip-{}.ply", std::process::id()));

    Config::binary().write_to_file(&path, &data)?;
    let copy = Reader::open(&path)?.read();
    std::fs::remove_file(&path)?;

    assert_eq!(copy?, data);
    Ok(())
}


// ===========================================================================
// ===== Streaming and binding
// ===========================================================================

/// Sums up all vertex coordinates without storing anything.
#[derive(Default)]
struct CoordSum {
    sum: f64,
    values: usize,
}

impl Target for CoordSum {
    fn handle_float(&mut self, pos: PropertyPos<'_>, value: f32) -> Result<(), plyx::Error> {
        if pos.instance.element.name() == "vertex" {
            self.sum += value as f64;
            self.values += 1;
        }
        Ok(())
    }
}

#[test]
fn streaming_target() -> Result<(), Error> {
    for &encoding in &[Encoding::Ascii, Encoding::BinaryLittleEndian, Encoding::BinaryBigEndian] {
        let file = Config::new(encoding).write_to_memory(&plyx::read::read(CUBE)?)?;

        let mut target = CoordSum::default();
        Reader::new(&file[..])?.read_content(&mut target)?;
        assert_eq!(target.values, 24);
        assert_eq!(target.sum, 12.0);
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
struct Vertex {
    pos: [f32; 3],
    color: [u8; 3],
}

#[test]
fn bound_objects_roundtrip() -> Result<(), Error> {
    let mut vertices = Vec::new();
    let mut faces: Vec<Vec<i32>> = Vec::new();
    let schema = {
        let reader = Reader::new(CUBE)?;
        let schema = reader.schema().clone();

        let vertex_binding = ReadBinding::new(|| Vertex { pos: [0.0; 3], color: [0; 3] })
            .with_float("x", |v, x| v.pos[0] = x)
            .with_float("y", |v, y| v.pos[1] = y)
            .with_float("z", |v, z| v.pos[2] = z)
            .with_uchar("red", |v, r| v.color[0] = r)
            .with_uchar("green", |v, g| v.color[1] = g)
            .with_uchar("blue", |v, b| v.color[2] = b);
        let face_binding = ReadBinding::new(Vec::new)
            .with_int_list("vertex_indices", |f: &mut Vec<i32>, l| f.extend_from_slice(l));

        let mut target = ObjectTarget::new();
        target.register("vertex", vertex_binding, |v| vertices.push(v))?;
        target.register("face", face_binding, |f| faces.push(f))?;
        reader.read_content(&mut target)?;

        schema
    };

    assert_eq!(vertices[4], Vertex { pos: [1.0, 0.0, 0.0], color: [0, 0, 255] });
    assert_eq!(faces[5], vec![3, 7, 4, 0]);

    let mut source = ObjectSource::new(schema);
    source.register("vertex", &vertices, WriteBinding::new()
        .with_float("x", |v: &Vertex| v.pos[0])
        .with_float("y", |v: &Vertex| v.pos[1])
        .with_float("z", |v: &Vertex| v.pos[2])
        .with_uchar("red", |v: &Vertex| v.color[0])
        .with_uchar("green", |v: &Vertex| v.color[1])
        .with_uchar("blue", |v: &Vertex| v.color[2])
    )?;
    source.register("face", &faces, WriteBinding::new()
        .with_int_list("vertex_indices", |f: &Vec<i32>| f.as_slice())
    )?;

    let file = Config::new(Encoding::BinaryBigEndian).write_to_memory(&source)?;
    assert_eq!(plyx::read::read(&file[..])?, plyx::read::read(CUBE)?);

    Ok(())
}
