use alloc::boxed::Box;
use core::any::Any;
use core::fmt;

use serde_core::{Deserialize, Serialize};

use super::Codec;
use crate::error::{ErrorKind, Result, SerialError};
use crate::info::{Type, Typed};
use crate::registry::TypeRegistry;
use crate::tree::{self, Node};
use crate::value::{Opaque, Value};

/// A codec for host types implementing `serde`'s traits.
///
/// The type is erased into two function pointers, so a single registry can
/// hold codecs for arbitrarily many host types. The tree representation is
/// whatever `serde_json` produces for the type.
///
/// # Examples
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use vc_serial::{Type, TypePath, Typed, TypeRegistry, Value};
///
/// #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// struct Pos { x: i32, y: i32 }
///
/// impl TypePath for Pos {
///     fn type_path() -> &'static str { "geo::Pos" }
///     fn type_name() -> &'static str { "Pos" }
/// }
///
/// impl Typed for Pos {
///     fn ty() -> Type { Type::plain::<Self>() }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register_serde::<Pos>();
///
/// let value = Value::opaque(Pos { x: 1, y: 2 });
/// let node = vc_serial::serialize(Some(&value), &registry).unwrap();
/// assert_eq!(node.to_string(), r#"{"x":1,"y":2}"#);
///
/// let back = vc_serial::deserialize(&node, Type::of::<Pos>(), &registry).unwrap().unwrap();
/// assert_eq!(back.downcast_ref::<Pos>(), Some(&Pos { x: 1, y: 2 }));
/// ```
#[derive(Clone, Copy)]
pub struct SerdeCodec {
    ty: Type,
    serialize: fn(&dyn Opaque) -> Option<&dyn erased_serde::Serialize>,
    deserialize:
        fn(&mut dyn erased_serde::Deserializer) -> Result<Box<dyn Opaque>, erased_serde::Error>,
}

impl SerdeCodec {
    /// Creates the codec of `T`.
    pub fn of<T>() -> Self
    where
        T: Typed + Opaque + Serialize + for<'de> Deserialize<'de>,
    {
        Self {
            ty: T::ty(),
            serialize: |value| {
                let any: &dyn Any = value;
                any.downcast_ref::<T>()
                    .map(|value| value as &dyn erased_serde::Serialize)
            },
            deserialize: |deserializer| Ok(Box::new(T::deserialize(deserializer)?)),
        }
    }

    /// The host type this codec converts.
    #[inline(always)]
    pub const fn ty(&self) -> Type {
        self.ty
    }
}

impl fmt::Debug for SerdeCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SerdeCodec").field(&self.ty).finish()
    }
}

impl Codec for SerdeCodec {
    fn serialize(&self, value: &Value, _registry: &TypeRegistry) -> Result<Node> {
        let erased = match value {
            Value::Opaque(v) => (self.serialize)(&**v),
            _ => None,
        };
        let Some(erased) = erased else {
            return Err(SerialError::serialize(ErrorKind::TypeMismatch {
                expected: self.ty.path(),
                found: alloc::format!("`{}`", value.ty().path()),
            }));
        };
        serde_json::to_value(erased).map_err(|e| {
            SerialError::serialize(ErrorKind::UnsupportedType(self.ty.path())).with_cause(e)
        })
    }

    fn deserialize(
        &self,
        node: &Node,
        _ty: Type,
        _registry: &TypeRegistry,
    ) -> Result<Option<Value>> {
        let mut erased = <dyn erased_serde::Deserializer>::erase(node);
        match (self.deserialize)(&mut erased) {
            Ok(value) => Ok(Some(Value::Opaque(value))),
            Err(e) => Err(SerialError::deserialize(ErrorKind::TypeMismatch {
                expected: self.ty.path(),
                found: alloc::format!("{} ({e})", tree::kind_of(node)),
            })),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
