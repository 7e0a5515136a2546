//! Pull-based access to PLY data, used by the writer.

use crate::{
    error::{Error, ErrorKind},
    schema::Schema,
};


/// A view of one element instance that allows typed access to its values by
/// property name.
///
/// All getters return `None` if there is no value for the given name. If a
/// value exists but has a different kind than requested, the result is
/// implementation defined; all implementations in this crate return `None`.
/// Values of unsigned types are returned in the signed type of the same
/// width; use the `get_u*` methods to get the unsigned value.
pub trait Record {
    fn get_char(&self, name: &str) -> Option<i8>;
    fn get_short(&self, name: &str) -> Option<i16>;
    fn get_int(&self, name: &str) -> Option<i32>;
    fn get_float(&self, name: &str) -> Option<f32>;
    fn get_double(&self, name: &str) -> Option<f64>;

    fn get_char_list(&self, name: &str) -> Option<&[i8]>;
    fn get_short_list(&self, name: &str) -> Option<&[i16]>;
    fn get_int_list(&self, name: &str) -> Option<&[i32]>;
    fn get_float_list(&self, name: &str) -> Option<&[f32]>;
    fn get_double_list(&self, name: &str) -> Option<&[f64]>;

    /// Returns a `char`/`uchar` value reinterpreted as `u8`.
    fn get_uchar(&self, name: &str) -> Option<u8> {
        self.get_char(name).map(|v| v as u8)
    }

    /// Returns a `short`/`ushort` value reinterpreted as `u16`.
    fn get_ushort(&self, name: &str) -> Option<u16> {
        self.get_short(name).map(|v| v as u16)
    }

    /// Returns an `int`/`uint` value reinterpreted as `u32`.
    fn get_uint(&self, name: &str) -> Option<u32> {
        self.get_int(name).map(|v| v as u32)
    }
}

/// A source of PLY data: a schema and, for each of its elements, an ordered
/// sequence of instances.
pub trait Source {
    fn schema(&self) -> &Schema;

    /// Returns the number of instances of the element with the given index
    /// (index into `Schema::elements`).
    fn num_instances(&self, element_index: usize) -> u64;

    /// Calls `visitor` once for each instance of the given element, in order.
    /// Errors returned by `visitor` are passed through.
    fn visit_instances(
        &self,
        element_index: usize,
        visitor: &mut dyn FnMut(&dyn Record) -> Result<(), Error>,
    ) -> Result<(), Error>;

    /// Returns the instance counts of all elements, in schema order.
    fn counts(&self) -> Vec<u64> {
        (0..self.schema().elements().len()).map(|i| self.num_instances(i)).collect()
    }

    /// Like [`Source::visit_instances`], but the element is given by name.
    /// Fails with `UnknownElement` if the schema has no such element.
    fn visit_instances_by_name(
        &self,
        element: &str,
        visitor: &mut dyn FnMut(&dyn Record) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let idx = self.schema()
            .element_index(element)
            .ok_or_else(|| Error::new(|| ErrorKind::UnknownElement(element.to_string())))?;
        self.visit_instances(idx, visitor)
    }
}

impl<S: Source + ?Sized> Source for &S {
    fn schema(&self) -> &Schema {
        (**self).schema()
    }
    fn num_instances(&self, element_index: usize) -> u64 {
        (**self).num_instances(element_index)
    }
    fn visit_instances(
        &self,
        element_index: usize,
        visitor: &mut dyn FnMut(&dyn Record) -> Result<(), Error>,
    ) -> Result<(), Error> {
        (**self).visit_instances(element_index, visitor)
    }
}
