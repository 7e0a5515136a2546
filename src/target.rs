//! Push-based consumption of decoded PLY data.
//!
//! The reader calls the methods of a [`Target`] in a fixed order:
//!
//! ```text
//! set_schema
//! for each element (in schema order):
//!     start_list(count)
//!     for each instance:
//!         start_instance
//!         handle_*  (exactly once per property, in schema order)
//!         end_instance
//!     end_list
//! ```
//!
//! The sequence is the same for all three encodings. Every method returns a
//! `Result`; returning an error aborts the read and the error is passed to
//! the caller unchanged (see [`Error::aborted`]).

use crate::{
    error::Error,
    schema::{ElementDef, PropertyDef, Schema},
};


/// Identifies the element instance the reader is currently at.
///
/// This is owned by the reader and passed to each callback, so targets don't
/// need to track the position themselves.
#[derive(Debug, Clone, Copy)]
pub struct InstancePos<'s> {
    /// Index of the element in `Schema::elements`.
    pub element_index: usize,
    pub element: &'s ElementDef,

    /// Index of the instance within its element list.
    pub instance_index: u64,
}

/// Identifies the property the reader is currently at.
#[derive(Debug, Clone, Copy)]
pub struct PropertyPos<'s> {
    pub instance: InstancePos<'s>,

    /// Index of the property in `ElementDef::property_defs`.
    pub property_index: usize,
    pub property: &'s PropertyDef,
}

impl PropertyPos<'_> {
    pub fn element_index(&self) -> usize {
        self.instance.element_index
    }

    pub fn instance_index(&self) -> u64 {
        self.instance.instance_index
    }
}

/// Something that receives decoded PLY data. All methods have no-op default
/// implementations.
///
/// Values of unsigned types are passed in the signed type of the same width
/// (e.g. a `uchar` 255 arrives as `handle_char(.., -1)`). Use
/// `PropertyPos::property` to find out the declared type.
#[allow(unused_variables)]
pub trait Target {
    /// Called once before any other method.
    fn set_schema(&mut self, schema: &Schema) -> Result<(), Error> {
        Ok(())
    }

    /// Called when the instances of the given element start.
    fn start_list(
        &mut self,
        element_index: usize,
        element: &ElementDef,
        count: u64,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn start_instance(&mut self, pos: InstancePos<'_>) -> Result<(), Error> {
        Ok(())
    }

    fn handle_char(&mut self, pos: PropertyPos<'_>, value: i8) -> Result<(), Error> {
        Ok(())
    }
    fn handle_short(&mut self, pos: PropertyPos<'_>, value: i16) -> Result<(), Error> {
        Ok(())
    }
    fn handle_int(&mut self, pos: PropertyPos<'_>, value: i32) -> Result<(), Error> {
        Ok(())
    }
    fn handle_float(&mut self, pos: PropertyPos<'_>, value: f32) -> Result<(), Error> {
        Ok(())
    }
    fn handle_double(&mut self, pos: PropertyPos<'_>, value: f64) -> Result<(), Error> {
        Ok(())
    }

    fn handle_char_list(&mut self, pos: PropertyPos<'_>, values: &[i8]) -> Result<(), Error> {
        Ok(())
    }
    fn handle_short_list(&mut self, pos: PropertyPos<'_>, values: &[i16]) -> Result<(), Error> {
        Ok(())
    }
    fn handle_int_list(&mut self, pos: PropertyPos<'_>, values: &[i32]) -> Result<(), Error> {
        Ok(())
    }
    fn handle_float_list(&mut self, pos: PropertyPos<'_>, values: &[f32]) -> Result<(), Error> {
        Ok(())
    }
    fn handle_double_list(&mut self, pos: PropertyPos<'_>, values: &[f64]) -> Result<(), Error> {
        Ok(())
    }

    fn end_instance(&mut self, pos: InstancePos<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Called after the last instance of the given element.
    fn end_list(&mut self, element_index: usize, element: &ElementDef) -> Result<(), Error> {
        Ok(())
    }
}

/// A target that ignores everything. Useful to validate a file.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTarget;

impl Target for NullTarget {}

impl<T: Target + ?Sized> Target for &mut T {
    fn set_schema(&mut self, schema: &Schema) -> Result<(), Error> {
        (**self).set_schema(schema)
    }
    fn start_list(
        &mut self,
        element_index: usize,
        element: &ElementDef,
        count: u64,
    ) -> Result<(), Error> {
        (**self).start_list(element_index, element, count)
    }
    fn start_instance(&mut self, pos: InstancePos<'_>) -> Result<(), Error> {
        (**self).start_instance(pos)
    }
    fn handle_char(&mut self, pos: PropertyPos<'_>, value: i8) -> Result<(), Error> {
        (**self).handle_char(pos, value)
    }
    fn handle_short(&mut self, pos: PropertyPos<'_>, value: i16) -> Result<(), Error> {
        (**self).handle_short(pos, value)
    }
    fn handle_int(&mut self, pos: PropertyPos<'_>, value: i32) -> Result<(), Error> {
        (**self).handle_int(pos, value)
    }
    fn handle_float(&mut self, pos: PropertyPos<'_>, value: f32) -> Result<(), Error> {
        (**self).handle_float(pos, value)
    }
    fn handle_double(&mut self, pos: PropertyPos<'_>, value: f64) -> Result<(), Error> {
        (**self).handle_double(pos, value)
    }
    fn handle_char_list(&mut self, pos: PropertyPos<'_>, values: &[i8]) -> Result<(), Error> {
        (**self).handle_char_list(pos, values)
    }
    fn handle_short_list(&mut self, pos: PropertyPos<'_>, values: &[i16]) -> Result<(), Error> {
        (**self).handle_short_list(pos, values)
    }
    fn handle_int_list(&mut self, pos: PropertyPos<'_>, values: &[i32]) -> Result<(), Error> {
        (**self).handle_int_list(pos, values)
    }
    fn handle_float_list(&mut self, pos: PropertyPos<'_>, values: &[f32]) -> Result<(), Error> {
        (**self).handle_float_list(pos, values)
    }
    fn handle_double_list(&mut self, pos: PropertyPos<'_>, values: &[f64]) -> Result<(), Error> {
        (**self).handle_double_list(pos, values)
    }
    fn end_instance(&mut self, pos: InstancePos<'_>) -> Result<(), Error> {
        (**self).end_instance(pos)
    }
    fn end_list(&mut self, element_index: usize, element: &ElementDef) -> Result<(), Error> {
        (**self).end_list(element_index, element)
    }
}
