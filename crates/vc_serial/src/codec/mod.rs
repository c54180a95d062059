//! Codecs: the serialize/deserialize capability bound to a native type.
//!
//! - [`Codec`]: the capability itself.
//! - [`BasicCodec`]: every built-in type, and every enum kind.
//! - [`SerdeCodec`]: host types with a `serde` implementation.
//! - [`bits`]: the bit-pattern encoding of floating-point numbers.

// -----------------------------------------------------------------------------
// Modules

mod basic;
mod serde_codec;

pub mod bits;

// -----------------------------------------------------------------------------
// Exports

pub use basic::BasicCodec;
pub use serde_codec::SerdeCodec;

use crate::error::Result;
use crate::info::Type;
use crate::registry::TypeRegistry;
use crate::tree::Node;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Codec

/// Converts the values of one native type to and from tree nodes.
///
/// Codecs are invoked by the dispatch facade, which has already filtered out
/// absent values and `null` nodes, and which attaches the offending
/// value/node and type to any error the codec returns. The registry is
/// passed along so codecs can recurse through the facade.
///
/// # Examples
///
/// ```
/// use vc_serial::codec::Codec;
/// use vc_serial::error::{ErrorKind, SerialError};
/// use vc_serial::{Node, Type, TypeRegistry, Value, TypePath, Typed};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Celsius(f64);
///
/// impl TypePath for Celsius {
///     fn type_path() -> &'static str { "weather::Celsius" }
///     fn type_name() -> &'static str { "Celsius" }
/// }
///
/// impl Typed for Celsius {
///     fn ty() -> Type { Type::plain::<Self>() }
/// }
///
/// struct CelsiusCodec;
///
/// impl Codec for CelsiusCodec {
///     fn serialize(&self, value: &Value, _: &TypeRegistry) -> vc_serial::Result<Node> {
///         match value.downcast_ref::<Celsius>() {
///             Some(c) => Ok(Node::from(c.0)),
///             None => Err(SerialError::serialize(ErrorKind::UnsupportedType(value.ty().path()))),
///         }
///     }
///
///     fn deserialize(&self, node: &Node, ty: Type, _: &TypeRegistry) -> vc_serial::Result<Option<Value>> {
///         match node.as_f64() {
///             Some(c) => Ok(Some(Value::opaque(Celsius(c)))),
///             None => Err(SerialError::deserialize(ErrorKind::UnsupportedType(ty.path()))),
///         }
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register_type::<Celsius>(CelsiusCodec);
///
/// let node = vc_serial::serialize(Some(&Value::opaque(Celsius(21.5))), &registry).unwrap();
/// assert_eq!(node.to_string(), "21.5");
/// ```
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value whose runtime type is bound to this codec.
    fn serialize(&self, value: &Value, registry: &TypeRegistry) -> Result<Node>;

    /// Deserializes a non-null node as `ty`.
    ///
    /// Returns `Ok(None)` when the node legitimately decodes to nothing,
    /// e.g. a type reference that names no registered type.
    fn deserialize(&self, node: &Node, ty: Type, registry: &TypeRegistry)
    -> Result<Option<Value>>;
}
