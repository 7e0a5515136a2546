//! Measures PLY read (parse) and write speeds.

use criterion::{
    criterion_group, criterion_main, black_box, Criterion,
};

use plyx::{
    ElementDef, Error, Instance, PlyData, PropertyPos, ScalarType, Schema, Target,
    Encoding,
    read::Reader,
    write::Config,
};


// ===============================================================================================
// ===== Helper utilities
// ===============================================================================================

/// A target that just puts all data into the `black_box`.
struct BlackBoxTarget;

impl Target for BlackBoxTarget {
    fn handle_float(&mut self, _: PropertyPos<'_>, value: f32) -> Result<(), Error> {
        black_box(value);
        Ok(())
    }
    fn handle_char(&mut self, _: PropertyPos<'_>, value: i8) -> Result<(), Error> {
        black_box(value);
        Ok(())
    }
    fn handle_int_list(&mut self, _: PropertyPos<'_>, values: &[i32]) -> Result<(), Error> {
        black_box(values);
        Ok(())
    }
}

/// A triangulated `n` x `n` grid with positions, colors and faces.
fn grid(n: u32) -> PlyData {
    let schema = || -> Result<Schema, Error> {
        Schema::new()
            .with_element(
                ElementDef::new("vertex")?
                    .with_property("x", ScalarType::Float)?
                    .with_property("y", ScalarType::Float)?
                    .with_property("z", ScalarType::Float)?
                    .with_property("red", ScalarType::UChar)?
                    .with_property("green", ScalarType::UChar)?
                    .with_property("blue", ScalarType::UChar)?
            )?
            .with_element(
                ElementDef::new("face")?
                    .with_list_property("vertex_indices", ScalarType::UChar, ScalarType::UInt)?
            )
    };

    let mut data = PlyData::new(schema().unwrap());
    for y in 0..n {
        for x in 0..n {
            let v = Instance::new()
                .with("x", x as f32)
                .with("y", y as f32)
                .with("z", ((x * y) as f32).sin())
                .with("red", (x % 256) as u8)
                .with("green", (y % 256) as u8)
                .with("blue", 128u8);
            data.add_instance("vertex", v).unwrap();
        }
    }

    let idx = |x: u32, y: u32| (y * n + x) as i32;
    for y in 0..n - 1 {
        for x in 0..n - 1 {
            let a = vec![idx(x, y), idx(x + 1, y), idx(x, y + 1)];
            let b = vec![idx(x + 1, y), idx(x + 1, y + 1), idx(x, y + 1)];
            data.add_instance("face", Instance::new().with("vertex_indices", a)).unwrap();
            data.add_instance("face", Instance::new().with("vertex_indices", b)).unwrap();
        }
    }

    data
}

fn encoding_from_name(name: &str) -> Encoding {
    // We do this string -> encoding stuff here so that the resulting
    // benchmark names are more useful (`/"ascii"` than `/2`).
    match name {
        "ble" => Encoding::BinaryLittleEndian,
        "bbe" => Encoding::BinaryBigEndian,
        "ascii" => Encoding::Ascii,
        _ => unreachable!(),
    }
}


// ===============================================================================================
// ===== Benchmarks
// ===============================================================================================

/// Measures body reading of a grid mesh into a target that ignores all
/// values.
fn grid_read(c: &mut Criterion) {
    let data = grid(100);

    c.bench_function_over_inputs(
        "ply_grid_read",
        move |b, encoding| {
            let file = Config::new(encoding_from_name(encoding)).write_to_memory(&data).unwrap();

            b.iter(|| {
                let reader = Reader::new(&file[..]).unwrap();
                reader.read_content(&mut BlackBoxTarget).unwrap();
            })
        },
        vec!["ble", "bbe", "ascii"],
    );
}

/// Measures reading a grid mesh into `PlyData`.
fn grid_read_mem(c: &mut Criterion) {
    let data = grid(100);

    c.bench_function_over_inputs(
        "ply_grid_read_mem",
        move |b, encoding| {
            let file = Config::new(encoding_from_name(encoding)).write_to_memory(&data).unwrap();
            b.iter(|| black_box(plyx::read::read(&file[..]).unwrap()))
        },
        vec!["ble", "bbe", "ascii"],
    );
}

/// Measures writing a grid mesh from `PlyData`.
fn grid_write(c: &mut Criterion) {
    let data = grid(100);

    c.bench_function_over_inputs(
        "ply_grid_write",
        move |b, encoding| {
            let config = Config::new(encoding_from_name(encoding));
            b.iter(|| black_box(config.clone().write_to_memory(&data).unwrap()))
        },
        vec!["ble", "bbe", "ascii"],
    );
}


criterion_group!(benches, grid_read, grid_read_mem, grid_write);
criterion_main!(benches);
