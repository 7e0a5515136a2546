//! Generic in-memory representation of PLY data.
//!
//! [`MemTarget`] is the default [`Target`]: it stores every decoded instance
//! as an [`Instance`] (an ordered map from property name to [`Property`]).
//! The result is a [`PlyData`], which is also a [`Source`] and can thus be
//! written again. `PlyData` can also be built by hand to write new files.

use std::{
    cmp::min,
    sync::Arc,
};

use derive_more::From;
use smallvec::SmallVec;

use crate::{
    error::{Error, ErrorKind},
    schema::{ElementDef, Schema},
    source::{Record, Source},
    target::{InstancePos, PropertyPos, Target},
    types::ValueKind,
};


// ===========================================================================
// ===== Property values
// ===========================================================================

/// One property value.
///
/// Unsigned types are stored in the signed variant of the same width.
///
/// List variants keep up to 16 bytes inline, so `Property` is no bigger than
/// with a plain `Vec` (on 64 bit targets). Triangle and quad index lists fit
/// inline.
#[derive(Debug, Clone, PartialEq, From)]
pub enum Property {
    Char(i8),
    Short(i16),
    Int(i32),
    Float(f32),
    Double(f64),
    CharList(SmallVec<[i8; 16]>),
    ShortList(SmallVec<[i16; 8]>),
    IntList(SmallVec<[i32; 4]>),
    FloatList(SmallVec<[f32; 4]>),
    DoubleList(SmallVec<[f64; 2]>),
}

impl Property {
    /// Returns the kind of the value (or of the list elements).
    pub fn kind(&self) -> ValueKind {
        match self {
            Property::Char(_) | Property::CharList(_) => ValueKind::Char,
            Property::Short(_) | Property::ShortList(_) => ValueKind::Short,
            Property::Int(_) | Property::IntList(_) => ValueKind::Int,
            Property::Float(_) | Property::FloatList(_) => ValueKind::Float,
            Property::Double(_) | Property::DoubleList(_) => ValueKind::Double,
        }
    }

    pub fn is_list(&self) -> bool {
        match self {
            Property::CharList(_)
            | Property::ShortList(_)
            | Property::IntList(_)
            | Property::FloatList(_)
            | Property::DoubleList(_) => true,
            _ => false,
        }
    }

    /// Returns the value as integer, or `None` if the property is not an
    /// integer scalar. Unsigned types come out as their signed
    /// reinterpretation.
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Property::Char(v) => Some(v.into()),
            Property::Short(v) => Some(v.into()),
            Property::Int(v) => Some(v.into()),
            _ => None,
        }
    }

    /// Returns the value as float, or `None` if the property is not a
    /// floating point scalar.
    pub fn as_floating_point(&self) -> Option<f64> {
        match *self {
            Property::Float(v) => Some(v.into()),
            Property::Double(v) => Some(v),
            _ => None,
        }
    }
}

impl From<u8> for Property {
    fn from(v: u8) -> Self {
        Property::Char(v as i8)
    }
}

impl From<u16> for Property {
    fn from(v: u16) -> Self {
        Property::Short(v as i16)
    }
}

impl From<u32> for Property {
    fn from(v: u32) -> Self {
        Property::Int(v as i32)
    }
}

macro_rules! impl_from_vec {
    ($ty:ty, $variant:ident) => {
        impl From<Vec<$ty>> for Property {
            fn from(v: Vec<$ty>) -> Self {
                Property::$variant(SmallVec::from_vec(v))
            }
        }

        impl From<&[$ty]> for Property {
            fn from(v: &[$ty]) -> Self {
                Property::$variant(SmallVec::from_slice(v))
            }
        }
    }
}

impl_from_vec!(i8, CharList);
impl_from_vec!(i16, ShortList);
impl_from_vec!(i32, IntList);
impl_from_vec!(f32, FloatList);
impl_from_vec!(f64, DoubleList);


// ===========================================================================
// ===== Instance
// ===========================================================================

/// One element instance: an ordered map from property names to values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instance {
    // Instances rarely have more than a handful of properties, so a linear
    // search beats hashing here.
    values: Vec<(Arc<str>, Property)>,
}

impl Instance {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_capacity(cap: usize) -> Self {
        Self {
            values: Vec::with_capacity(cap),
        }
    }

    /// Returns the value of the property with the given name.
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.values.iter().find(|(n, _)| &**n == name).map(|(_, v)| v)
    }

    /// Sets the value of the given property, replacing the old value (and
    /// keeping its position) if there was one.
    pub fn set(&mut self, name: impl Into<Arc<str>>, value: impl Into<Property>) {
        let name = name.into();
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some((_, old)) => *old = value,
            None => self.values.push((name, value)),
        }
    }

    /// Builder-style variant of [`Instance::set`].
    pub fn with(mut self, name: impl Into<Arc<str>>, value: impl Into<Property>) -> Self {
        self.set(name, value);
        self
    }

    /// Removes the value of the given property and returns it.
    pub fn remove(&mut self, name: &str) -> Option<Property> {
        let pos = self.values.iter().position(|(n, _)| &**n == name)?;
        Some(self.values.remove(pos).1)
    }

    /// Iterates over all name/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.values.iter().map(|(n, v)| (&**n, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

macro_rules! record_getters {
    ($( $scalar_fn:ident, $list_fn:ident, $scalar:ident, $list:ident, $ty:ty; )*) => {
        $(
            fn $scalar_fn(&self, name: &str) -> Option<$ty> {
                match self.get(name) {
                    Some(Property::$scalar(v)) => Some(*v),
                    _ => None,
                }
            }

            fn $list_fn(&self, name: &str) -> Option<&[$ty]> {
                match self.get(name) {
                    Some(Property::$list(v)) => Some(&v[..]),
                    _ => None,
                }
            }
        )*
    }
}

impl Record for Instance {
    record_getters! {
        get_char, get_char_list, Char, CharList, i8;
        get_short, get_short_list, Short, ShortList, i16;
        get_int, get_int_list, Int, IntList, i32;
        get_float, get_float_list, Float, FloatList, f32;
        get_double, get_double_list, Double, DoubleList, f64;
    }
}


// ===========================================================================
// ===== PlyData
// ===========================================================================

/// A schema together with all instances of all its elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlyData {
    schema: Schema,

    /// Parallel to `schema.elements()`.
    elements: Vec<Vec<Instance>>,
}

impl PlyData {
    /// Creates a data set for the given schema without any instances.
    pub fn new(schema: Schema) -> Self {
        let elements = vec![Vec::new(); schema.elements().len()];
        Self { schema, elements }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns all instances of the element with the given name.
    pub fn instances(&self, element: &str) -> Option<&[Instance]> {
        self.schema.element_index(element).map(|i| &self.elements[i][..])
    }

    /// Returns all instances of the element at the given schema index.
    pub fn instances_at(&self, element_index: usize) -> Option<&[Instance]> {
        self.elements.get(element_index).map(|v| &v[..])
    }

    /// Mutable access to the instances of the element with the given name.
    pub fn instances_mut(&mut self, element: &str) -> Option<&mut Vec<Instance>> {
        let idx = self.schema.element_index(element)?;
        Some(&mut self.elements[idx])
    }

    /// Appends an instance to the element with the given name.
    pub fn add_instance(&mut self, element: &str, instance: Instance) -> Result<(), Error> {
        self.add_instances(element, Some(instance))
    }

    /// Appends all given instances to the element with the given name.
    pub fn add_instances(
        &mut self,
        element: &str,
        instances: impl IntoIterator<Item = Instance>,
    ) -> Result<(), Error> {
        let list = self.instances_mut(element).ok_or_else(|| {
            Error::new(|| ErrorKind::UnknownElement(element.to_string()))
        })?;
        list.extend(instances);
        Ok(())
    }

    /// Splits this into the schema and the per-element instance lists.
    pub fn into_parts(self) -> (Schema, Vec<Vec<Instance>>) {
        (self.schema, self.elements)
    }
}

impl Source for PlyData {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn num_instances(&self, element_index: usize) -> u64 {
        self.elements.get(element_index).map(|v| v.len() as u64).unwrap_or(0)
    }

    fn visit_instances(
        &self,
        element_index: usize,
        visitor: &mut dyn FnMut(&dyn Record) -> Result<(), Error>,
    ) -> Result<(), Error> {
        if let Some(instances) = self.elements.get(element_index) {
            for instance in instances {
                visitor(instance)?;
            }
        }

        Ok(())
    }
}


// ===========================================================================
// ===== MemTarget
// ===========================================================================

/// A [`Target`] that collects everything into a [`PlyData`].
#[derive(Debug, Default)]
pub struct MemTarget {
    data: PlyData,

    /// Property names per element, shared by all instances.
    names: Vec<Vec<Arc<str>>>,
    current: Instance,
}

impl MemTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected data.
    pub fn into_data(self) -> PlyData {
        self.data
    }

    fn push(&mut self, pos: PropertyPos<'_>, value: Property) -> Result<(), Error> {
        let name = self.names[pos.element_index()][pos.property_index].clone();
        self.current.values.push((name, value));
        Ok(())
    }
}

impl Target for MemTarget {
    fn set_schema(&mut self, schema: &Schema) -> Result<(), Error> {
        self.names = schema.elements()
            .iter()
            .map(|e| e.property_defs().iter().map(|p| Arc::from(p.name())).collect())
            .collect();
        self.data = PlyData::new(schema.clone());
        Ok(())
    }

    fn start_list(
        &mut self,
        element_index: usize,
        _: &ElementDef,
        count: u64,
    ) -> Result<(), Error> {
        // The count comes straight from the header, so we don't trust it too
        // much when reserving memory.
        let reserve = min(count, 1 << 16) as usize;
        self.data.elements[element_index].reserve(reserve);
        Ok(())
    }

    fn start_instance(&mut self, pos: InstancePos<'_>) -> Result<(), Error> {
        self.current = Instance::with_capacity(pos.element.property_defs().len());
        Ok(())
    }

    fn handle_char(&mut self, pos: PropertyPos<'_>, value: i8) -> Result<(), Error> {
        self.push(pos, Property::Char(value))
    }
    fn handle_short(&mut self, pos: PropertyPos<'_>, value: i16) -> Result<(), Error> {
        self.push(pos, Property::Short(value))
    }
    fn handle_int(&mut self, pos: PropertyPos<'_>, value: i32) -> Result<(), Error> {
        self.push(pos, Property::Int(value))
    }
    fn handle_float(&mut self, pos: PropertyPos<'_>, value: f32) -> Result<(), Error> {
        self.push(pos, Property::Float(value))
    }
    fn handle_double(&mut self, pos: PropertyPos<'_>, value: f64) -> Result<(), Error> {
        self.push(pos, Property::Double(value))
    }
    fn handle_char_list(&mut self, pos: PropertyPos<'_>, values: &[i8]) -> Result<(), Error> {
        self.push(pos, values.into())
    }
    fn handle_short_list(&mut self, pos: PropertyPos<'_>, values: &[i16]) -> Result<(), Error> {
        self.push(pos, values.into())
    }
    fn handle_int_list(&mut self, pos: PropertyPos<'_>, values: &[i32]) -> Result<(), Error> {
        self.push(pos, values.into())
    }
    fn handle_float_list(&mut self, pos: PropertyPos<'_>, values: &[f32]) -> Result<(), Error> {
        self.push(pos, values.into())
    }
    fn handle_double_list(&mut self, pos: PropertyPos<'_>, values: &[f64]) -> Result<(), Error> {
        self.push(pos, values.into())
    }

    fn end_instance(&mut self, pos: InstancePos<'_>) -> Result<(), Error> {
        let instance = std::mem::replace(&mut self.current, Instance::new());
        self.data.elements[pos.element_index].push(instance);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    use crate::types::ScalarType;
    use super::*;

    assert_impl_all!(PlyData: Send, Sync, Clone);
    assert_impl_all!(Instance: Send, Sync);

    #[test]
    fn instance_set_replaces_in_place() {
        let mut inst = Instance::new().with("x", 1.0f32).with("y", 2.0f32);
        inst.set("x", 5.0f32);

        let names: Vec<_> = inst.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["x", "y"]);
        assert_eq!(inst.get_float("x"), Some(5.0));
        assert_eq!(inst.len(), 2);
    }

    #[test]
    fn record_getters_check_kind() {
        let inst = Instance::new()
            .with("red", 200u8)
            .with("vertex_index", vec![0i32, 1, 2]);

        assert_eq!(inst.get_char("red"), Some(200u8 as i8));
        assert_eq!(inst.get_uchar("red"), Some(200));
        assert_eq!(inst.get_int("red"), None);
        assert_eq!(inst.get_int_list("vertex_index"), Some(&[0, 1, 2][..]));
        assert_eq!(inst.get_int("vertex_index"), None);
        assert_eq!(inst.get_float("nope"), None);
    }

    #[test]
    fn add_instances_by_name() -> Result<(), Error> {
        let vertex = ElementDef::new("vertex")?.with_property("x", ScalarType::Float)?;
        let mut data = PlyData::new(Schema::new().with_element(vertex)?);

        data.add_instance("vertex", Instance::new().with("x", 1.0f32))?;
        data.add_instances("vertex", vec![Instance::new().with("x", 2.0f32); 2])?;

        assert_eq!(data.instances("vertex").map(|i| i.len()), Some(3));
        assert_eq!(data.counts(), vec![3]);
        assert!(data.add_instance("face", Instance::new()).is_err());

        Ok(())
    }

    #[test]
    fn visit_instances_by_name() -> Result<(), Error> {
        let vertex = ElementDef::new("vertex")?.with_property("x", ScalarType::Float)?;
        let mut data = PlyData::new(Schema::new().with_element(vertex)?);
        data.add_instances("vertex", vec![
            Instance::new().with("x", 1.0f32),
            Instance::new().with("x", 3.0f32),
        ])?;

        let mut xs = Vec::new();
        data.visit_instances_by_name("vertex", &mut |r| {
            xs.push(r.get_float("x"));
            Ok(())
        })?;
        assert_eq!(xs, [Some(1.0), Some(3.0)]);

        let err = data.visit_instances_by_name("face", &mut |_| Ok(())).unwrap_err();
        match err.kind() {
            ErrorKind::UnknownElement(name) => assert_eq!(name, "face"),
            other => panic!("unexpected error {:?}", other),
        }

        Ok(())
    }
}
