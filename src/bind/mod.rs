//! Binding PLY properties directly to fields of application types.
//!
//! Instead of going through the generic [`PlyData`][crate::PlyData]
//! representation, you can register typed accessors per property name:
//!
//! - Reading: an [`ObjectTarget`] creates one object per instance with a
//!   factory, calls the [`Setter`]s for all bound properties and hands the
//!   finished object to a consumer.
//! - Writing: an [`ObjectSource`] takes a slice of objects per element and
//!   reads all values with [`Getter`]s.
//!
//! Bindings are checked against the schema once: element names and
//! property names must exist and each accessor must have the kind of its
//! property (e.g. a `uchar` property needs a `Char` accessor). Properties
//! without accessor are read and discarded (reading) or have no value
//! (writing, see [`MissingValues`][crate::write::MissingValues]).
//!
//! ```
//! use plyx::{Error, bind::{ObjectTarget, ReadBinding}, read::Reader};
//!
//! #[derive(Default)]
//! struct Vertex {
//!     pos: [f32; 3],
//! }
//!
//! fn read_vertices(file: &[u8]) -> Result<Vec<Vertex>, Error> {
//!     let mut vertices = Vec::new();
//!     {
//!         let binding = ReadBinding::new(Vertex::default)
//!             .with_float("x", |v, x| v.pos[0] = x)
//!             .with_float("y", |v, y| v.pos[1] = y)
//!             .with_float("z", |v, z| v.pos[2] = z);
//!
//!         let mut target = ObjectTarget::new();
//!         target.register("vertex", binding, |v| vertices.push(v))?;
//!         Reader::new(file)?.read_content(&mut target)?;
//!     }
//!
//!     Ok(vertices)
//! }
//! ```

use crate::{
    error::{Error, ErrorKind},
    schema::{ElementDef, PropertyDef, Schema},
    source::{Record, Source},
    target::{InstancePos, PropertyPos, Target},
    types::ValueKind,
};



/// Human readable description of an accessor or property kind.
fn describe(kind: ValueKind, list: bool) -> String {
    if list {
        format!("list of {}", kind)
    } else {
        kind.to_string()
    }
}

/// Finds `name` in `element` and checks that its kind matches.
fn resolve_property<'e>(
    element: &'e ElementDef,
    name: &str,
    kind: ValueKind,
    list: bool,
) -> Result<usize, Error> {
    let pos = element.prop_pos(name).ok_or_else(|| Error::new(|| ErrorKind::UnknownProperty {
        element: element.name().to_string(),
        property: name.to_string(),
    }))?;

    let def: &'e PropertyDef = &element.property_defs()[pos];
    let ty = def.ty();
    if ty.kind() != kind || ty.is_list() != list {
        return Err(Error::new(|| ErrorKind::BindingMismatch {
            element: element.name().to_string(),
            property: name.to_string(),
            msg: format!(
                "property has type '{}' ({}), but the accessor is for {}",
                ty,
                describe(ty.kind(), ty.is_list()),
                describe(kind, list),
            ),
        }));
    }

    Ok(pos)
}


// ===========================================================================
// ===== Accessors
// ===========================================================================

/// Stores a value of one property into an object of type `T`.
///
/// Values of unsigned types are passed in the signed type of the same width.
pub enum Setter<'a, T> {
    Char(Box<dyn FnMut(&mut T, i8) + 'a>),
    Short(Box<dyn FnMut(&mut T, i16) + 'a>),
    Int(Box<dyn FnMut(&mut T, i32) + 'a>),
    Float(Box<dyn FnMut(&mut T, f32) + 'a>),
    Double(Box<dyn FnMut(&mut T, f64) + 'a>),
    CharList(Box<dyn FnMut(&mut T, &[i8]) + 'a>),
    ShortList(Box<dyn FnMut(&mut T, &[i16]) + 'a>),
    IntList(Box<dyn FnMut(&mut T, &[i32]) + 'a>),
    FloatList(Box<dyn FnMut(&mut T, &[f32]) + 'a>),
    DoubleList(Box<dyn FnMut(&mut T, &[f64]) + 'a>),
}

impl<T> Setter<'_, T> {
    /// The kind of values this setter accepts and whether it's for lists.
    pub fn kind(&self) -> (ValueKind, bool) {
        match self {
            Setter::Char(_) => (ValueKind::Char, false),
            Setter::Short(_) => (ValueKind::Short, false),
            Setter::Int(_) => (ValueKind::Int, false),
            Setter::Float(_) => (ValueKind::Float, false),
            Setter::Double(_) => (ValueKind::Double, false),
            Setter::CharList(_) => (ValueKind::Char, true),
            Setter::ShortList(_) => (ValueKind::Short, true),
            Setter::IntList(_) => (ValueKind::Int, true),
            Setter::FloatList(_) => (ValueKind::Float, true),
            Setter::DoubleList(_) => (ValueKind::Double, true),
        }
    }
}

/// Reads the value of one property from an object of type `T`.
pub enum Getter<'a, T> {
    Char(Box<dyn Fn(&T) -> i8 + 'a>),
    Short(Box<dyn Fn(&T) -> i16 + 'a>),
    Int(Box<dyn Fn(&T) -> i32 + 'a>),
    Float(Box<dyn Fn(&T) -> f32 + 'a>),
    Double(Box<dyn Fn(&T) -> f64 + 'a>),
    CharList(Box<dyn Fn(&T) -> &[i8] + 'a>),
    ShortList(Box<dyn Fn(&T) -> &[i16] + 'a>),
    IntList(Box<dyn Fn(&T) -> &[i32] + 'a>),
    FloatList(Box<dyn Fn(&T) -> &[f32] + 'a>),
    DoubleList(Box<dyn Fn(&T) -> &[f64] + 'a>),
}

impl<T> Getter<'_, T> {
    /// The kind of values this getter returns and whether it's for lists.
    pub fn kind(&self) -> (ValueKind, bool) {
        match self {
            Getter::Char(_) => (ValueKind::Char, false),
            Getter::Short(_) => (ValueKind::Short, false),
            Getter::Int(_) => (ValueKind::Int, false),
            Getter::Float(_) => (ValueKind::Float, false),
            Getter::Double(_) => (ValueKind::Double, false),
            Getter::CharList(_) => (ValueKind::Char, true),
            Getter::ShortList(_) => (ValueKind::Short, true),
            Getter::IntList(_) => (ValueKind::Int, true),
            Getter::FloatList(_) => (ValueKind::Float, true),
            Getter::DoubleList(_) => (ValueKind::Double, true),
        }
    }
}


// ===========================================================================
// ===== Reading
// ===========================================================================

/// How to build objects of type `T` from the instances of one element.
pub struct ReadBinding<'a, T> {
    factory: Box<dyn FnMut() -> T + 'a>,
    setters: Vec<(String, Setter<'a, T>)>,
}

macro_rules! setter_methods {
    ($( $(#[$attr:meta])* $name:ident, $variant:ident, $arg:ty; )*) => {
        $(
            $(#[$attr])*
            pub fn $name(self, name: impl Into<String>, f: impl FnMut(&mut T, $arg) + 'a) -> Self {
                self.with(name, Setter::$variant(Box::new(f)))
            }
        )*
    }
}

impl<'a, T> ReadBinding<'a, T> {
    /// Creates a binding that creates new objects with `factory`.
    pub fn new(factory: impl FnMut() -> T + 'a) -> Self {
        Self {
            factory: Box::new(factory),
            setters: Vec::new(),
        }
    }

    /// Adds a setter for the given property. A previous setter for the same
    /// property is replaced.
    pub fn with(mut self, name: impl Into<String>, setter: Setter<'a, T>) -> Self {
        let name = name.into();
        match self.setters.iter_mut().find(|(n, _)| *n == name) {
            Some((_, old)) => *old = setter,
            None => self.setters.push((name, setter)),
        }
        self
    }

    setter_methods! {
        /// For `char` and `uchar` properties.
        with_char, Char, i8;
        /// For `short` and `ushort` properties.
        with_short, Short, i16;
        /// For `int` and `uint` properties.
        with_int, Int, i32;
        with_float, Float, f32;
        with_double, Double, f64;
        with_char_list, CharList, &[i8];
        with_short_list, ShortList, &[i16];
        with_int_list, IntList, &[i32];
        with_float_list, FloatList, &[f32];
        with_double_list, DoubleList, &[f64];
    }

    /// Like [`ReadBinding::with_char`], but the value is passed as `u8`.
    pub fn with_uchar(self, name: impl Into<String>, mut f: impl FnMut(&mut T, u8) + 'a) -> Self {
        self.with_char(name, move |t, v| f(t, v as u8))
    }

    /// Like [`ReadBinding::with_short`], but the value is passed as `u16`.
    pub fn with_ushort(self, name: impl Into<String>, mut f: impl FnMut(&mut T, u16) + 'a) -> Self {
        self.with_short(name, move |t, v| f(t, v as u16))
    }

    /// Like [`ReadBinding::with_int`], but the value is passed as `u32`.
    pub fn with_uint(self, name: impl Into<String>, mut f: impl FnMut(&mut T, u32) + 'a) -> Self {
        self.with_int(name, move |t, v| f(t, v as u32))
    }
}

/// A borrowed value, as passed to `Target` methods.
enum ValueRef<'v> {
    Char(i8),
    Short(i16),
    Int(i32),
    Float(f32),
    Double(f64),
    CharList(&'v [i8]),
    ShortList(&'v [i16]),
    IntList(&'v [i32]),
    FloatList(&'v [f32]),
    DoubleList(&'v [f64]),
}

/// Type erased interface of `BoundReader` so that `ObjectTarget` can hold
/// bindings for different types.
trait ElementReader {
    fn resolve(&mut self, element: &ElementDef) -> Result<(), Error>;
    fn start(&mut self);
    fn set(&mut self, property_index: usize, value: ValueRef<'_>);
    fn finish(&mut self);
}

struct BoundReader<'a, T> {
    binding: ReadBinding<'a, T>,
    consumer: Box<dyn FnMut(T) + 'a>,

    /// For each property of the element: index into `binding.setters`.
    by_prop: Vec<Option<usize>>,
    current: Option<T>,
}

impl<T> ElementReader for BoundReader<'_, T> {
    fn resolve(&mut self, element: &ElementDef) -> Result<(), Error> {
        self.by_prop = vec![None; element.property_defs().len()];
        for (i, (name, setter)) in self.binding.setters.iter().enumerate() {
            let (kind, list) = setter.kind();
            let pos = resolve_property(element, name, kind, list)?;
            self.by_prop[pos] = Some(i);
        }

        Ok(())
    }

    fn start(&mut self) {
        self.current = Some((self.binding.factory)());
    }

    fn set(&mut self, property_index: usize, value: ValueRef<'_>) {
        let setter_idx = match self.by_prop.get(property_index) {
            Some(&Some(idx)) => idx,
            _ => return,
        };
        let obj = match &mut self.current {
            Some(obj) => obj,
            None => return,
        };

        // Kinds were checked in `resolve`, so mismatches can't happen.
        match (&mut self.binding.setters[setter_idx].1, value) {
            (Setter::Char(f), ValueRef::Char(v)) => f(obj, v),
            (Setter::Short(f), ValueRef::Short(v)) => f(obj, v),
            (Setter::Int(f), ValueRef::Int(v)) => f(obj, v),
            (Setter::Float(f), ValueRef::Float(v)) => f(obj, v),
            (Setter::Double(f), ValueRef::Double(v)) => f(obj, v),
            (Setter::CharList(f), ValueRef::CharList(v)) => f(obj, v),
            (Setter::ShortList(f), ValueRef::ShortList(v)) => f(obj, v),
            (Setter::IntList(f), ValueRef::IntList(v)) => f(obj, v),
            (Setter::FloatList(f), ValueRef::FloatList(v)) => f(obj, v),
            (Setter::DoubleList(f), ValueRef::DoubleList(v)) => f(obj, v),
            _ => {}
        }
    }

    fn finish(&mut self) {
        if let Some(obj) = self.current.take() {
            (self.consumer)(obj);
        }
    }
}

/// A [`Target`] that creates application objects via [`ReadBinding`]s.
///
/// Elements without a registered binding are read and ignored.
#[derive(Default)]
pub struct ObjectTarget<'a> {
    readers: Vec<(String, Box<dyn ElementReader + 'a>)>,

    /// For each element of the schema: index into `readers`.
    active: Vec<Option<usize>>,
}

impl<'a> ObjectTarget<'a> {
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
            active: Vec::new(),
        }
    }

    /// Registers a binding for the element with the given name. Every
    /// finished object is passed to `consumer`.
    ///
    /// Fails if there already is a binding for that element. Whether the
    /// element and properties exist is checked when reading starts.
    pub fn register<T: 'a>(
        &mut self,
        element: impl Into<String>,
        binding: ReadBinding<'a, T>,
        consumer: impl FnMut(T) + 'a,
    ) -> Result<(), Error> {
        let element = element.into();
        if self.readers.iter().any(|(n, _)| *n == element) {
            return Err(Error::new(|| ErrorKind::DuplicateBinding(element)));
        }

        let reader = BoundReader {
            binding,
            consumer: Box::new(consumer),
            by_prop: Vec::new(),
            current: None,
        };
        self.readers.push((element, Box::new(reader)));
        Ok(())
    }

    fn reader(&mut self, element_index: usize) -> Option<&mut (dyn ElementReader + 'a)> {
        let idx = (*self.active.get(element_index)?)?;
        Some(&mut *self.readers[idx].1)
    }

    fn set(&mut self, pos: PropertyPos<'_>, value: ValueRef<'_>) -> Result<(), Error> {
        if let Some(reader) = self.reader(pos.element_index()) {
            reader.set(pos.property_index, value);
        }
        Ok(())
    }
}

impl Target for ObjectTarget<'_> {
    fn set_schema(&mut self, schema: &Schema) -> Result<(), Error> {
        self.active = vec![None; schema.elements().len()];

        for (i, (name, reader)) in self.readers.iter_mut().enumerate() {
            let idx = schema.element_index(name).ok_or_else(|| {
                Error::new(|| ErrorKind::UnknownElement(name.clone()))
            })?;
            reader.resolve(&schema.elements()[idx])?;
            self.active[idx] = Some(i);
        }

        Ok(())
    }

    fn start_instance(&mut self, pos: InstancePos<'_>) -> Result<(), Error> {
        if let Some(reader) = self.reader(pos.element_index) {
            reader.start();
        }
        Ok(())
    }

    fn handle_char(&mut self, pos: PropertyPos<'_>, value: i8) -> Result<(), Error> {
        self.set(pos, ValueRef::Char(value))
    }
    fn handle_short(&mut self, pos: PropertyPos<'_>, value: i16) -> Result<(), Error> {
        self.set(pos, ValueRef::Short(value))
    }
    fn handle_int(&mut self, pos: PropertyPos<'_>, value: i32) -> Result<(), Error> {
        self.set(pos, ValueRef::Int(value))
    }
    fn handle_float(&mut self, pos: PropertyPos<'_>, value: f32) -> Result<(), Error> {
        self.set(pos, ValueRef::Float(value))
    }
    fn handle_double(&mut self, pos: PropertyPos<'_>, value: f64) -> Result<(), Error> {
        self.set(pos, ValueRef::Double(value))
    }
    fn handle_char_list(&mut self, pos: PropertyPos<'_>, values: &[i8]) -> Result<(), Error> {
        self.set(pos, ValueRef::CharList(values))
    }
    fn handle_short_list(&mut self, pos: PropertyPos<'_>, values: &[i16]) -> Result<(), Error> {
        self.set(pos, ValueRef::ShortList(values))
    }
    fn handle_int_list(&mut self, pos: PropertyPos<'_>, values: &[i32]) -> Result<(), Error> {
        self.set(pos, ValueRef::IntList(values))
    }
    fn handle_float_list(&mut self, pos: PropertyPos<'_>, values: &[f32]) -> Result<(), Error> {
        self.set(pos, ValueRef::FloatList(values))
    }
    fn handle_double_list(&mut self, pos: PropertyPos<'_>, values: &[f64]) -> Result<(), Error> {
        self.set(pos, ValueRef::DoubleList(values))
    }

    fn end_instance(&mut self, pos: InstancePos<'_>) -> Result<(), Error> {
        if let Some(reader) = self.reader(pos.element_index) {
            reader.finish();
        }
        Ok(())
    }
}


// ===========================================================================
// ===== Writing
// ===========================================================================

/// How to get property values out of objects of type `T`.
pub struct WriteBinding<'a, T> {
    getters: Vec<(String, Getter<'a, T>)>,
}

macro_rules! getter_methods {
    ($( $name:ident, $variant:ident, $ret:ty; )*) => {
        $(
            pub fn $name(self, name: impl Into<String>, f: impl Fn(&T) -> $ret + 'a) -> Self {
                self.with(name, Getter::$variant(Box::new(f)))
            }
        )*
    }
}

impl<'a, T> WriteBinding<'a, T> {
    pub fn new() -> Self {
        Self {
            getters: Vec::new(),
        }
    }

    /// Adds a getter for the given property. A previous getter for the same
    /// property is replaced.
    pub fn with(mut self, name: impl Into<String>, getter: Getter<'a, T>) -> Self {
        let name = name.into();
        match self.getters.iter_mut().find(|(n, _)| *n == name) {
            Some((_, old)) => *old = getter,
            None => self.getters.push((name, getter)),
        }
        self
    }

    getter_methods! {
        with_char, Char, i8;
        with_short, Short, i16;
        with_int, Int, i32;
        with_float, Float, f32;
        with_double, Double, f64;
    }

    pub fn with_char_list(self, name: impl Into<String>, f: impl Fn(&T) -> &[i8] + 'a) -> Self {
        self.with(name, Getter::CharList(Box::new(f)))
    }
    pub fn with_short_list(self, name: impl Into<String>, f: impl Fn(&T) -> &[i16] + 'a) -> Self {
        self.with(name, Getter::ShortList(Box::new(f)))
    }
    pub fn with_int_list(self, name: impl Into<String>, f: impl Fn(&T) -> &[i32] + 'a) -> Self {
        self.with(name, Getter::IntList(Box::new(f)))
    }
    pub fn with_float_list(self, name: impl Into<String>, f: impl Fn(&T) -> &[f32] + 'a) -> Self {
        self.with(name, Getter::FloatList(Box::new(f)))
    }
    pub fn with_double_list(self, name: impl Into<String>, f: impl Fn(&T) -> &[f64] + 'a) -> Self {
        self.with(name, Getter::DoubleList(Box::new(f)))
    }

    /// Like [`WriteBinding::with_char`], but for getters returning `u8`.
    pub fn with_uchar(self, name: impl Into<String>, f: impl Fn(&T) -> u8 + 'a) -> Self {
        self.with_char(name, move |t| f(t) as i8)
    }

    /// Like [`WriteBinding::with_short`], but for getters returning `u16`.
    pub fn with_ushort(self, name: impl Into<String>, f: impl Fn(&T) -> u16 + 'a) -> Self {
        self.with_short(name, move |t| f(t) as i16)
    }

    /// Like [`WriteBinding::with_int`], but for getters returning `u32`.
    pub fn with_uint(self, name: impl Into<String>, f: impl Fn(&T) -> u32 + 'a) -> Self {
        self.with_int(name, move |t| f(t) as i32)
    }
}

impl<'a, T> Default for WriteBinding<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type erased interface of `BoundWriter`.
trait ElementWriter {
    fn len(&self) -> u64;
    fn visit(&self, visitor: &mut dyn FnMut(&dyn Record) -> Result<(), Error>) -> Result<(), Error>;
}

struct BoundWriter<'a, T> {
    objects: &'a [T],
    binding: WriteBinding<'a, T>,
}

impl<T> ElementWriter for BoundWriter<'_, T> {
    fn len(&self) -> u64 {
        self.objects.len() as u64
    }

    fn visit(&self, visitor: &mut dyn FnMut(&dyn Record) -> Result<(), Error>) -> Result<(), Error> {
        for obj in self.objects {
            visitor(&ObjectRecord { obj, getters: &self.binding.getters })?;
        }
        Ok(())
    }
}

/// A `Record` view of one object.
struct ObjectRecord<'r, 'a, T> {
    obj: &'r T,
    getters: &'r [(String, Getter<'a, T>)],
}

impl<'r, 'a, T> ObjectRecord<'r, 'a, T> {
    fn getter(&self, name: &str) -> Option<&'r Getter<'a, T>> {
        self.getters.iter().find(|(n, _)| n == name).map(|(_, g)| g)
    }
}

macro_rules! object_record_getters {
    ($( $scalar_fn:ident, $list_fn:ident, $scalar:ident, $list:ident, $ty:ty; )*) => {
        $(
            fn $scalar_fn(&self, name: &str) -> Option<$ty> {
                match self.getter(name)? {
                    Getter::$scalar(f) => Some(f(self.obj)),
                    _ => None,
                }
            }

            fn $list_fn(&self, name: &str) -> Option<&[$ty]> {
                match self.getter(name)? {
                    Getter::$list(f) => Some(f(self.obj)),
                    _ => None,
                }
            }
        )*
    }
}

impl<T> Record for ObjectRecord<'_, '_, T> {
    object_record_getters! {
        get_char, get_char_list, Char, CharList, i8;
        get_short, get_short_list, Short, ShortList, i16;
        get_int, get_int_list, Int, IntList, i32;
        get_float, get_float_list, Float, FloatList, f32;
        get_double, get_double_list, Double, DoubleList, f64;
    }
}

/// A [`Source`] that reads values from slices of application objects via
/// [`WriteBinding`]s.
///
/// Elements without a registered binding have no instances.
pub struct ObjectSource<'a> {
    schema: Schema,

    /// Parallel to `schema.elements()`.
    elements: Vec<Option<Box<dyn ElementWriter + 'a>>>,
}

impl<'a> ObjectSource<'a> {
    /// Creates a source for the given schema without any bindings.
    pub fn new(schema: Schema) -> Self {
        let elements = schema.elements().iter().map(|_| None).collect();
        Self { schema, elements }
    }

    /// Registers the objects and binding for the element with the given
    /// name.
    ///
    /// Fails if the element does not exist, if it was already registered, or
    /// if a getter refers to an unknown property or has the wrong kind.
    pub fn register<T: 'a>(
        &mut self,
        element: &str,
        objects: &'a [T],
        binding: WriteBinding<'a, T>,
    ) -> Result<(), Error> {
        let idx = self.schema.element_index(element).ok_or_else(|| {
            Error::new(|| ErrorKind::UnknownElement(element.to_string()))
        })?;
        if self.elements[idx].is_some() {
            return Err(Error::new(|| ErrorKind::DuplicateBinding(element.to_string())));
        }

        let def = &self.schema.elements()[idx];
        for (name, getter) in &binding.getters {
            let (kind, list) = getter.kind();
            resolve_property(def, name, kind, list)?;
        }

        self.elements[idx] = Some(Box::new(BoundWriter { objects, binding }));
        Ok(())
    }
}

impl Source for ObjectSource<'_> {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn num_instances(&self, element_index: usize) -> u64 {
        match self.elements.get(element_index) {
            Some(Some(writer)) => writer.len(),
            _ => 0,
        }
    }

    fn visit_instances(
        &self,
        element_index: usize,
        visitor: &mut dyn FnMut(&dyn Record) -> Result<(), Error>,
    ) -> Result<(), Error> {
        match self.elements.get(element_index) {
            Some(Some(writer)) => writer.visit(visitor),
            _ => Ok(()),
        }
    }
}
