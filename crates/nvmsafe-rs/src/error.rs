// crates/nvmsafe-rs/src/error.rs

use crate::types::{ElementLocator, ListLocator};
use crate::value::ElementType;
use alloc::string::String;
use thiserror::Error;

/// Errors raised while converting between raw list bytes, typed values and
/// the pool schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// The list is not declared by the schema.
    #[error("list {0} is not defined in the device schema")]
    UnknownList(ListLocator),

    /// The element is not declared by the schema.
    #[error("element {0} is not defined in the device schema")]
    UnknownElement(ElementLocator),

    /// The raw byte count does not match the schema-declared size.
    #[error("size mismatch for {list}: expected {expected} bytes but got {actual} bytes")]
    SizeMismatch {
        list: ListLocator,
        expected: usize,
        actual: usize,
    },

    /// A value's type does not match the element declaration.
    #[error("type mismatch for {element}: declared {expected}, found {actual}")]
    TypeMismatch {
        element: ElementLocator,
        expected: ElementType,
        actual: ElementType,
    },

    /// An array value has the wrong number of entries, or a scalar was given
    /// for an array element (and vice versa).
    #[error("element {element} expects {expected} value(s) but got {actual}")]
    ElementCount {
        element: ElementLocator,
        expected: usize,
        actual: usize,
    },

    /// The interpreted list does not hold one entry per declared element.
    #[error("list {list} declares {expected} elements but {actual} were supplied")]
    ListShape {
        list: ListLocator,
        expected: usize,
        actual: usize,
    },

    /// A byte slice had the wrong length for the scalar type being decoded.
    #[error("{ty} needs {expected} bytes but got {actual}")]
    BufferLength {
        ty: ElementType,
        expected: usize,
        actual: usize,
    },

    /// Text could not be parsed as a value of the given type.
    #[error("cannot parse {text:?} as {ty}")]
    InvalidValueText { ty: ElementType, text: String },

    /// A type name was not recognised.
    #[error("unknown element type name {0:?}")]
    UnknownTypeName(String),
}
