//! The generic tree model and the external parser/printer.
//!
//! Tree nodes are [`serde_json::Value`]s built with `preserve_order`, so
//! objects keep their key insertion order.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::{ErrorKind, Operation, SerialError};

/// A generic tree node: null, boolean, number, string, array or object.
pub type Node = serde_json::Value;

/// An ordered string-keyed mapping of nodes.
pub type Object = serde_json::Map<String, Node>;

/// Parses JSON text into a tree node.
///
/// Fails with [`ErrorKind::MalformedInput`] when the text is not valid JSON.
pub fn parse(text: &str) -> Result<Node, SerialError> {
    log::trace!("parsing {} bytes of serialized text", text.len());
    serde_json::from_str(text).map_err(|e| {
        SerialError::new(Operation::Deserialize, ErrorKind::MalformedInput(e.to_string()))
            .with_subject(text)
            .with_cause(e)
    })
}

/// Parses JSON text that must hold an array.
pub fn parse_array(text: &str) -> Result<Vec<Node>, SerialError> {
    match parse(text)? {
        Node::Array(array) => Ok(array),
        other => Err(not_a(text, "an array", &other)),
    }
}

/// Parses JSON text that must hold an object.
pub fn parse_object(text: &str) -> Result<Object, SerialError> {
    match parse(text)? {
        Node::Object(object) => Ok(object),
        other => Err(not_a(text, "an object", &other)),
    }
}

/// Prints a tree node as compact canonical JSON text.
#[inline]
pub fn print(node: &Node) -> String {
    log::trace!("printing {} node", kind_of(node));
    node.to_string()
}

/// Prints array elements as compact JSON array text.
pub fn print_array(elements: &[Node]) -> Result<String, SerialError> {
    log::trace!("printing array of {} elements", elements.len());
    serde_json::to_string(elements).map_err(print_failure)
}

/// Prints object entries as compact JSON object text.
pub fn print_object(object: &Object) -> Result<String, SerialError> {
    log::trace!("printing object of {} entries", object.len());
    serde_json::to_string(object).map_err(print_failure)
}

/// Returns a short description of the node kind, used in error messages.
pub fn kind_of(node: &Node) -> &'static str {
    match node {
        Node::Null => "null",
        Node::Bool(_) => "a boolean",
        Node::Number(_) => "a number",
        Node::String(_) => "a string",
        Node::Array(_) => "an array",
        Node::Object(_) => "an object",
    }
}

fn print_failure(e: serde_json::Error) -> SerialError {
    SerialError::new(Operation::Serialize, ErrorKind::MalformedInput(e.to_string())).with_cause(e)
}

fn not_a(text: &str, expected: &str, found: &Node) -> SerialError {
    SerialError::deserialize(ErrorKind::MalformedInput(alloc::format!(
        "expected {expected}, found {}",
        kind_of(found)
    )))
    .with_subject(text)
}

// -----------------------------------------------------------------------------
// Tests
