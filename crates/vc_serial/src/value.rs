//! Decoded native values.
//!
//! [`Value`] is a closed set of variants, one per built-in kind, plus
//! [`Value::Opaque`] for host types whose codec is registered at runtime.
//! An absent value is `Option<Value>::None` throughout the crate.

use alloc::boxed::Box;
use alloc::string::String;
use core::any::Any;
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::info::{Enumeration, Type, Typed};
use crate::list::SerializedList;
use crate::map::SerializedMap;
use crate::tree::Node;
use crate::wrapper::TypeWrapper;

// -----------------------------------------------------------------------------
// Value

/// A decoded native value.
///
/// Equality is exact: floats compare by bit pattern, so `0.0` and `-0.0`
/// differ while two NaNs with the same bits are equal. This also makes
/// `Value` usable as the key of a decoded map.
#[derive(Clone, Debug)]
pub enum Value {
    String(String),
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Enum(EnumValue),
    Type(Type),
    List(SerializedList),
    Map(SerializedMap),
    Wrapper(Box<TypeWrapper>),
    /// A pre-serialized tree fragment, passed through unchanged.
    Node(Node),
    /// A host type whose codec lives in the registry.
    Opaque(Box<dyn Opaque>),
}

impl Value {
    /// Wraps a host value.
    #[inline]
    pub fn opaque<T: Opaque>(value: T) -> Self {
        Value::Opaque(Box::new(value))
    }

    /// Returns the runtime type of the value.
    pub fn ty(&self) -> Type {
        match self {
            Value::String(_) => Type::of::<String>(),
            Value::Bool(_) => Type::of::<bool>(),
            Value::I32(_) => Type::of::<i32>(),
            Value::I64(_) => Type::of::<i64>(),
            Value::F32(_) => Type::of::<f32>(),
            Value::F64(_) => Type::of::<f64>(),
            Value::Enum(e) => e.ty(),
            Value::Type(_) => Type::of::<Type>(),
            Value::List(_) => Type::of::<SerializedList>(),
            Value::Map(_) => Type::of::<SerializedMap>(),
            Value::Wrapper(_) => Type::of::<TypeWrapper>(),
            Value::Node(_) => Type::of::<Node>(),
            Value::Opaque(v) => v.opaque_type(),
        }
    }

    /// Converts into a statically known type.
    #[inline]
    pub fn into_native<T: Native>(self) -> Result<T, Value> {
        T::from_value(self)
    }

    /// Returns a reference to the host value if it is a `T`.
    pub fn downcast_ref<T: Opaque>(&self) -> Option<&T> {
        match self {
            Value::Opaque(v) => {
                let any: &dyn Any = &**v;
                any.downcast_ref::<T>()
            }
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&SerializedList> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    #[inline]
    pub fn as_map(&self) -> Option<&SerializedMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Wrapper(a), Value::Wrapper(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => a.opaque_eq(&**b),
            _ => false,
        }
    }
}

impl Eq for Value {}

// Decoded values may leave the thread that produced them.
const _: fn() = || {
    fn assert_send<T: Send>() {}
    assert_send::<Value>();
    assert_send::<Box<dyn Opaque>>();
};

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Bool(b) => b.hash(state),
            Value::I32(i) => i.hash(state),
            Value::I64(i) => i.hash(state),
            Value::F32(f) => f.to_bits().hash(state),
            Value::F64(f) => f.to_bits().hash(state),
            Value::Enum(e) => e.hash(state),
            Value::Type(t) => t.hash(state),
            Value::Opaque(v) => v.opaque_type().hash(state),
            // Containers and fragments only hash their kind.
            Value::List(_) | Value::Map(_) | Value::Wrapper(_) | Value::Node(_) => {}
        }
    }
}

// -----------------------------------------------------------------------------
// EnumValue

/// A member of an enum kind, identified by its name.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumValue {
    ty: Type,
    name: &'static str,
}

impl EnumValue {
    /// Captures a member of a declared [`Enumeration`].
    #[inline]
    pub fn of<E: Enumeration>(member: &E) -> Self {
        Self {
            ty: E::ty(),
            name: member.member_name(),
        }
    }

    /// Finds the member of `ty` with exactly this name.
    ///
    /// Returns `None` if `ty` is not an enum kind or has no such member.
    pub fn from_name(ty: Type, name: &str) -> Option<Self> {
        let member = ty.members()?.iter().find(|m| **m == name)?;
        Some(Self { ty, name: member })
    }

    #[inline(always)]
    pub const fn ty(&self) -> Type {
        self.ty
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Converts back into the declared enum.
    pub fn to_native<E: Enumeration>(&self) -> Option<E> {
        if self.ty.is::<E>() {
            E::from_member_name(self.name)
        } else {
            None
        }
    }
}

impl fmt::Debug for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.ty.name(), self.name)
    }
}

// -----------------------------------------------------------------------------
// Opaque

/// A host value carried by [`Value::Opaque`].
///
/// Implemented for every `Typed + Clone + PartialEq + Debug + Send + Sync`
/// type; its codec is looked up in the registry by [`Opaque::opaque_type`].
pub trait Opaque: Any + Send + Sync + fmt::Debug {
    fn opaque_type(&self) -> Type;

    fn clone_opaque(&self) -> Box<dyn Opaque>;

    fn opaque_eq(&self, other: &dyn Opaque) -> bool;
}

impl<T: Typed + Clone + PartialEq + fmt::Debug + Send + Sync> Opaque for T {
    #[inline]
    fn opaque_type(&self) -> Type {
        T::ty()
    }

    fn clone_opaque(&self) -> Box<dyn Opaque> {
        Box::new(self.clone())
    }

    fn opaque_eq(&self, other: &dyn Opaque) -> bool {
        let other: &dyn Any = other;
        other.downcast_ref::<T>().is_some_and(|other| self == other)
    }
}

impl Clone for Box<dyn Opaque> {
    #[inline]
    fn clone(&self) -> Self {
        (**self).clone_opaque()
    }
}

// -----------------------------------------------------------------------------
// Native

/// Statically typed conversion between a Rust type and [`Value`].
///
/// Implemented for the built-in kinds and, through
/// [`impl_enumeration!`](crate::impl_enumeration), for enums.
pub trait Native: Typed + Sized {
    fn into_value(self) -> Value;

    /// Returns the value back when it does not hold a `Self`.
    fn from_value(value: Value) -> Result<Self, Value>;
}

macro_rules! impl_native {
    ($ty:ty, $variant:ident) => {
        impl Native for $ty {
            #[inline]
            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            #[inline]
            fn from_value(value: Value) -> Result<Self, Value> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(other),
                }
            }
        }

        impl From<$ty> for Value {
            #[inline]
            fn from(value: $ty) -> Self {
                Value::$variant(value)
            }
        }
    };
}

impl_native!(String, String);
impl_native!(bool, Bool);
impl_native!(i32, I32);
impl_native!(i64, I64);
impl_native!(f32, F32);
impl_native!(f64, F64);
impl_native!(Type, Type);
impl_native!(SerializedList, List);
impl_native!(SerializedMap, Map);
impl_native!(Node, Node);

impl Native for TypeWrapper {
    #[inline]
    fn into_value(self) -> Value {
        Value::Wrapper(Box::new(self))
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Wrapper(w) => Ok(*w),
            other => Err(other),
        }
    }
}

impl From<TypeWrapper> for Value {
    #[inline]
    fn from(value: TypeWrapper) -> Self {
        Value::Wrapper(Box::new(value))
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

impl From<EnumValue> for Value {
    #[inline]
    fn from(value: EnumValue) -> Self {
        Value::Enum(value)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use core::hash::BuildHasher;

    use super::{EnumValue, Native, Value};
    use crate::hash::FixedHashState;
    use crate::info::{Type, TypePath, Typed};

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Mode {
        Fast,
        Slow,
    }

    crate::impl_enumeration!(Mode { Fast, Slow });

    #[derive(Clone, Debug, PartialEq)]
    struct Point(i32, i32);

    impl TypePath for Point {
        fn type_path() -> &'static str {
            "geo::Point"
        }
        fn type_name() -> &'static str {
            "Point"
        }
    }

    impl Typed for Point {
        fn ty() -> Type {
            Type::plain::<Self>()
        }
    }

    #[test]
    fn floats_compare_by_bits() {
        assert_ne!(Value::F64(0.0), Value::F64(-0.0));
        assert_eq!(Value::F64(f64::NAN), Value::F64(f64::NAN));
        assert_ne!(Value::F32(0.0), Value::F32(-0.0));
        assert_ne!(Value::F64(1.0), Value::F32(1.0));
    }

    #[test]
    fn equal_values_hash_equal() {
        let a = Value::from("key");
        let b = Value::String("key".into());
        assert_eq!(FixedHashState.hash_one(&a), FixedHashState.hash_one(&b));
    }

    #[test]
    fn runtime_types() {
        assert_eq!(Value::I32(1).ty(), Type::of::<i32>());
        assert_eq!(Mode::Fast.into_value().ty(), Type::of::<Mode>());
        assert_eq!(Value::opaque(Point(1, 2)).ty().path(), "geo::Point");
    }

    #[test]
    fn enum_members() {
        let value = EnumValue::of(&Mode::Slow);
        assert_eq!(value.name(), "Slow");
        assert_eq!(value.to_native::<Mode>(), Some(Mode::Slow));
        assert_eq!(EnumValue::from_name(Type::of::<Mode>(), "Fast"), Some(EnumValue::of(&Mode::Fast)));
        assert_eq!(EnumValue::from_name(Type::of::<Mode>(), "fast"), None);
        assert_eq!(EnumValue::from_name(Type::of::<i32>(), "Fast"), None);
    }

    #[test]
    fn native_conversions() {
        assert_eq!(Value::I64(9).into_native::<i64>(), Ok(9));
        assert_eq!(Value::I64(9).into_native::<i32>(), Err(Value::I64(9)));
        assert_eq!(Mode::from_value(Mode::Fast.into_value()), Ok(Mode::Fast));
    }

    #[test]
    fn opaque_values() {
        let value = Value::opaque(Point(3, 4));
        assert_eq!(value.downcast_ref::<Point>(), Some(&Point(3, 4)));
        assert_eq!(value.clone(), Value::opaque(Point(3, 4)));
        assert_ne!(value, Value::opaque(Point(4, 3)));
    }
}
