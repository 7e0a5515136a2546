//! The structure of a PLY dataset: elements and their properties.
//!
//! A [`Schema`] is assembled once (either by the header parser or by hand)
//! and is only handed out by shared reference afterwards. The instance counts
//! of the elements are deliberately *not* part of the schema: they are
//! produced by the header parser when reading and derived from the data
//! source when writing.

use std::fmt;

use crate::{
    error::{Error, ErrorKind},
    types::{ScalarType, ValueKind},
};


// ===========================================================================
// ===== Property types and definitions
// ===========================================================================

/// The type of a property: either a single scalar or a list of scalars with
/// a length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Scalar(ScalarType),
    List {
        len_type: ScalarType,
        scalar_type: ScalarType,
    },
}

impl PropertyType {
    /// Returns the type of the values (the element type for lists).
    pub fn scalar_type(&self) -> ScalarType {
        match *self {
            PropertyType::Scalar(ty) => ty,
            PropertyType::List { scalar_type, .. } => scalar_type,
        }
    }

    /// Returns the length type if this is a list type.
    pub fn len_type(&self) -> Option<ScalarType> {
        match *self {
            PropertyType::Scalar(_) => None,
            PropertyType::List { len_type, .. } => Some(len_type),
        }
    }

    pub fn is_list(&self) -> bool {
        self.len_type().is_some()
    }

    /// The kind the values of this property are carried in.
    pub fn kind(&self) -> ValueKind {
        self.scalar_type().kind()
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PropertyType::Scalar(ty) => write!(f, "{}", ty),
            PropertyType::List { len_type, scalar_type } => {
                write!(f, "list {} {}", len_type, scalar_type)
            }
        }
    }
}

/// The header definition of one property of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    name: String,
    ty: PropertyType,
}

impl PropertyDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> PropertyType {
        self.ty
    }
}


// ===========================================================================
// ===== Element definitions
// ===========================================================================

/// The header definition of one element: its name and its ordered list of
/// properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDef {
    name: String,
    property_defs: Vec<PropertyDef>,
}

impl ElementDef {
    /// Creates an element definition without any properties.
    ///
    /// Fails if the name is empty or contains whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        check_name(&name, "element")?;

        Ok(Self {
            name,
            property_defs: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All property definitions in the order they appear in the file.
    pub fn property_defs(&self) -> &[PropertyDef] {
        &self.property_defs
    }

    /// Returns the position of the property with the given name.
    pub fn prop_pos(&self, name: &str) -> Option<usize> {
        self.property_defs.iter().position(|p| p.name == name)
    }

    /// Returns the property with the given name.
    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.property_defs.iter().find(|p| p.name == name)
    }

    /// Appends a scalar property.
    pub fn add_property(&mut self, name: impl Into<String>, ty: ScalarType) -> Result<(), Error> {
        self.add_property_def(name, PropertyType::Scalar(ty))
    }

    /// Appends a list property whose length is stored as `len_type`.
    pub fn add_list_property(
        &mut self,
        name: impl Into<String>,
        len_type: ScalarType,
        scalar_type: ScalarType,
    ) -> Result<(), Error> {
        self.add_property_def(name, PropertyType::List { len_type, scalar_type })
    }

    /// Appends a property of the given type.
    ///
    /// Fails if the name is invalid or already used by another property of
    /// this element, or if a list length type is not an integer type.
    pub fn add_property_def(
        &mut self,
        name: impl Into<String>,
        ty: PropertyType,
    ) -> Result<(), Error> {
        let name = name.into();
        check_name(&name, "property")?;

        if let Some(len_type) = ty.len_type() {
            if !len_type.is_valid_len_type() {
                return Err(Error::new(|| ErrorKind::UnsupportedType {
                    ty: len_type,
                    msg: format!("length type of list property '{}' must be an integer type", name),
                }));
            }
        }

        if self.prop_pos(&name).is_some() {
            return Err(Error::new(|| ErrorKind::InvalidSchema(format!(
                "element '{}' already has a property named '{}'",
                self.name,
                name,
            ))));
        }

        self.property_defs.push(PropertyDef { name, ty });
        Ok(())
    }

    /// Builder-style variant of [`ElementDef::add_property`].
    pub fn with_property(mut self, name: impl Into<String>, ty: ScalarType) -> Result<Self, Error> {
        self.add_property(name, ty)?;
        Ok(self)
    }

    /// Builder-style variant of [`ElementDef::add_list_property`].
    pub fn with_list_property(
        mut self,
        name: impl Into<String>,
        len_type: ScalarType,
        scalar_type: ScalarType,
    ) -> Result<Self, Error> {
        self.add_list_property(name, len_type, scalar_type)?;
        Ok(self)
    }
}


// ===========================================================================
// ===== Schema
// ===========================================================================

/// Describes the complete structure of a PLY dataset: all header comments
/// and all element definitions in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    comments: Vec<String>,
    elements: Vec<ElementDef>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// All `comment` lines of the header (without the `comment` keyword).
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// All element definitions in the order in which they appear in the file.
    pub fn elements(&self) -> &[ElementDef] {
        &self.elements
    }

    /// Returns the element with the given name.
    pub fn element(&self, name: &str) -> Option<&ElementDef> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// Returns the index of the element with the given name.
    pub fn element_index(&self, name: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.name == name)
    }

    /// Adds a comment.
    ///
    /// Fails if the comment contains a line break.
    pub fn add_comment(&mut self, comment: impl Into<String>) -> Result<(), Error> {
        let comment = comment.into();
        if comment.contains(|c: char| c == '\n' || c == '\r') {
            return Err(Error::new(|| ErrorKind::InvalidSchema(
                format!("comment {:?} contains a line break", comment),
            )));
        }

        self.comments.push(comment);
        Ok(())
    }

    /// Appends an element definition. Fails if an element with the same name
    /// already exists.
    pub fn add_element(&mut self, element: ElementDef) -> Result<(), Error> {
        if self.element_index(&element.name).is_some() {
            return Err(Error::new(|| ErrorKind::InvalidSchema(
                format!("duplicate element name '{}'", element.name),
            )));
        }

        self.elements.push(element);
        Ok(())
    }

    /// Builder-style variant of [`Schema::add_element`].
    pub fn with_element(mut self, element: ElementDef) -> Result<Self, Error> {
        self.add_element(element)?;
        Ok(self)
    }
}

/// Names are header tokens, so they must be non-empty and must not contain
/// whitespace.
fn check_name(name: &str, what: &str) -> Result<(), Error> {
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(Error::new(|| ErrorKind::InvalidSchema(
            format!("invalid {} name {:?}", what, name),
        )));
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use crate::error::ErrorCategory;
    use super::*;

    #[test]
    fn build_schema() -> Result<(), Error> {
        let vertex = ElementDef::new("vertex")?
            .with_property("x", ScalarType::Float)?
            .with_property("red", ScalarType::UChar)?;
        let face = ElementDef::new("face")?
            .with_list_property("vertex_index", ScalarType::UChar, ScalarType::Int)?;

        let schema = Schema::new().with_element(vertex)?.with_element(face)?;

        assert_eq!(schema.elements().len(), 2);
        assert_eq!(schema.element_index("face"), Some(1));
        assert!(schema.element("edge").is_none());

        let face = schema.element("face").unwrap();
        let prop = &face.property_defs()[0];
        assert_eq!(prop.name(), "vertex_index");
        assert!(prop.ty().is_list());
        assert_eq!(prop.ty().len_type(), Some(ScalarType::UChar));
        assert_eq!(prop.ty().scalar_type(), ScalarType::Int);
        assert_eq!(schema.element("vertex").unwrap().prop_pos("red"), Some(1));

        Ok(())
    }

    #[test]
    fn duplicate_names_are_rejected() -> Result<(), Error> {
        let mut vertex = ElementDef::new("vertex")?;
        vertex.add_property("x", ScalarType::Float)?;
        let err = vertex.add_property("x", ScalarType::Double).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::MalformedSchema);
        assert_eq!(vertex.property_defs().len(), 1);

        let mut schema = Schema::new();
        schema.add_element(vertex.clone())?;
        let err = schema.add_element(vertex).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::MalformedSchema);

        Ok(())
    }

    #[test]
    fn float_len_type_is_unsupported() -> Result<(), Error> {
        let mut face = ElementDef::new("face")?;
        let err = face
            .add_list_property("vertex_index", ScalarType::Float, ScalarType::Int)
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::UnsupportedType);
        match err.kind() {
            ErrorKind::UnsupportedType { ty, .. } => assert_eq!(*ty, ScalarType::Float),
            other => panic!("unexpected error kind {:?}", other),
        }

        // All integer types are fine, signed ones included.
        face.add_list_property("a", ScalarType::Char, ScalarType::Int)?;
        face.add_list_property("b", ScalarType::UInt, ScalarType::Double)?;

        Ok(())
    }

    #[test]
    fn invalid_names_and_comments() {
        assert!(ElementDef::new("").is_err());
        assert!(ElementDef::new("two words").is_err());
        assert!(ElementDef::new("vertex").unwrap().add_property("a\tb", ScalarType::Int).is_err());
        assert!(Schema::new().add_comment("line\nbreak").is_err());
        assert!(Schema::new().add_comment("made by hand").is_ok());
    }
}
