//! Type descriptors.
//!
//! - [`TypePath`]: static access to the full path and short name of a type.
//! - [`Typed`]: static access to the [`Type`] descriptor of a type.
//! - [`Type`]: runtime descriptor used as the key of the codec table and as
//!   the target of every deserialization request.
//! - [`Enumeration`]: enum kinds whose members are recovered by name,
//!   declared through [`impl_enumeration!`](crate::impl_enumeration).

use alloc::string::String;
use core::any::TypeId;
use core::fmt;
use core::hash::{Hash, Hasher};

// -----------------------------------------------------------------------------
// TypePath

/// A static accessor to type paths and names.
///
/// - [`type_path`](TypePath::type_path): the unique identifier of the type,
///   must not be shared by two registered types.
/// - [`type_name`](TypePath::type_name): the short name without module path,
///   may collide across modules.
///
/// Neither name carries a leading `::`.
///
/// # Examples
///
/// ```
/// use vc_serial::info::TypePath;
///
/// struct Foo;
///
/// impl TypePath for Foo {
///     fn type_path() -> &'static str { "my_crate::foo::Foo" }
///     fn type_name() -> &'static str { "Foo" }
/// }
/// ```
pub trait TypePath: 'static {
    /// Returns the fully qualified path of the type.
    fn type_path() -> &'static str;

    /// Returns the short name of the type.
    fn type_name() -> &'static str;
}

// -----------------------------------------------------------------------------
// Typed

/// A static accessor to the [`Type`] descriptor of a type.
pub trait Typed: TypePath {
    /// Returns the descriptor of this type.
    fn ty() -> Type;
}

// -----------------------------------------------------------------------------
// TypeKind

/// How a [`Type`] is handled by the dispatch facade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKind {
    /// The universal type: any tree node is accepted as-is.
    Any,
    /// A type resolved through the codec table.
    Plain,
    /// An enum kind with its members in declaration order.
    Enum(&'static [&'static str]),
}

// -----------------------------------------------------------------------------
// Type

/// The runtime descriptor of a native type.
///
/// Two descriptors are equal when their [`TypeId`]s are equal.
///
/// # Examples
///
/// ```
/// use vc_serial::info::Type;
///
/// let ty = Type::of::<i32>();
/// assert!(ty.is::<i32>());
/// assert_eq!(ty.path(), "i32");
/// ```
#[derive(Clone, Copy)]
pub struct Type {
    type_id: TypeId,
    path: &'static str,
    name: &'static str,
    kind: TypeKind,
}

/// Marker behind [`Type::any`].
pub struct Any;

impl Type {
    /// Returns the descriptor of `T`.
    #[inline]
    pub fn of<T: Typed>() -> Self {
        T::ty()
    }

    /// Creates a descriptor resolved through the codec table.
    #[inline]
    pub fn plain<T: TypePath>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            path: T::type_path(),
            name: T::type_name(),
            kind: TypeKind::Plain,
        }
    }

    /// Creates a descriptor for an enum kind with the given members.
    #[inline]
    pub fn enumeration<T: TypePath>(members: &'static [&'static str]) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            path: T::type_path(),
            name: T::type_name(),
            kind: TypeKind::Enum(members),
        }
    }

    /// The universal type: deserializing against it returns the node itself.
    #[inline]
    pub fn any() -> Self {
        Self {
            type_id: TypeId::of::<Any>(),
            path: "vc_serial::info::Any",
            name: "Any",
            kind: TypeKind::Any,
        }
    }

    #[inline(always)]
    pub const fn id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the fully qualified path.
    #[inline(always)]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// Returns the short name.
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline(always)]
    pub const fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Check if the given type matches this one.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        TypeId::of::<T>() == self.type_id
    }

    #[inline]
    pub const fn is_any(&self) -> bool {
        matches!(self.kind, TypeKind::Any)
    }

    /// Returns the members if this is an enum kind.
    #[inline]
    pub const fn members(&self) -> Option<&'static [&'static str]> {
        match self.kind {
            TypeKind::Enum(members) => Some(members),
            _ => None,
        }
    }

    /// Returns the short form of a full path: the last `::` segment.
    ///
    /// ```
    /// # use vc_serial::info::Type;
    /// assert_eq!(Type::short_name_of("a::b::Foo"), "Foo");
    /// assert_eq!(Type::short_name_of("Foo"), "Foo");
    /// ```
    pub fn short_name_of(path: &str) -> &str {
        match path.rfind("::") {
            Some(index) => &path[index + 2..],
            None => path,
        }
    }
}

impl PartialEq for Type {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

// -----------------------------------------------------------------------------
// Enumeration

/// An enum kind that is converted through its member names.
///
/// Implement it with [`impl_enumeration!`](crate::impl_enumeration), which
/// also provides [`TypePath`], [`Typed`] and [`Native`](crate::Native).
pub trait Enumeration: Typed + Sized {
    /// Member names in declaration order.
    const MEMBERS: &'static [&'static str];

    /// Returns the name of this member.
    fn member_name(&self) -> &'static str;

    /// Returns the member with exactly this name (case-sensitive).
    fn from_member_name(name: &str) -> Option<Self>;
}

/// Implements [`Enumeration`] and its companion traits for a fieldless enum.
///
/// # Examples
///
/// ```
/// use vc_serial::{impl_enumeration, Enumeration, Type, Typed};
///
/// #[derive(Clone, Copy, Debug, PartialEq)]
/// enum Color { Red, Green }
///
/// impl_enumeration!(Color { Red, Green });
///
/// assert_eq!(Color::MEMBERS, &["Red", "Green"]);
/// assert_eq!(Type::of::<Color>().members(), Some(&["Red", "Green"][..]));
/// assert_eq!(Color::from_member_name("Green"), Some(Color::Green));
/// ```
#[macro_export]
macro_rules! impl_enumeration {
    ($ty:ident { $($member:ident),+ $(,)? }) => {
        impl $crate::info::TypePath for $ty {
            fn type_path() -> &'static str {
                ::core::concat!(::core::module_path!(), "::", ::core::stringify!($ty))
            }

            fn type_name() -> &'static str {
                ::core::stringify!($ty)
            }
        }

        impl $crate::info::Typed for $ty {
            fn ty() -> $crate::info::Type {
                $crate::info::Type::enumeration::<Self>(
                    <Self as $crate::info::Enumeration>::MEMBERS,
                )
            }
        }

        impl $crate::info::Enumeration for $ty {
            const MEMBERS: &'static [&'static str] = &[$(::core::stringify!($member)),+];

            fn member_name(&self) -> &'static str {
                match self {
                    $(Self::$member => ::core::stringify!($member),)+
                }
            }

            fn from_member_name(name: &str) -> ::core::option::Option<Self> {
                match name {
                    $(::core::stringify!($member) => ::core::option::Option::Some(Self::$member),)+
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl $crate::value::Native for $ty {
            fn into_value(self) -> $crate::value::Value {
                $crate::value::Value::Enum($crate::value::EnumValue::of(&self))
            }

            fn from_value(
                value: $crate::value::Value,
            ) -> ::core::result::Result<Self, $crate::value::Value> {
                let member = match &value {
                    $crate::value::Value::Enum(e) if e.ty().is::<Self>() => {
                        <Self as $crate::info::Enumeration>::from_member_name(e.name())
                    }
                    _ => ::core::option::Option::None,
                };
                member.ok_or(value)
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Built-in paths

macro_rules! impl_plain_typed {
    ($ty:ty, $path:literal, $name:literal) => {
        impl TypePath for $ty {
            #[inline(always)]
            fn type_path() -> &'static str {
                $path
            }

            #[inline(always)]
            fn type_name() -> &'static str {
                $name
            }
        }

        impl Typed for $ty {
            #[inline]
            fn ty() -> Type {
                Type::plain::<Self>()
            }
        }
    };
}

impl_plain_typed!(String, "alloc::string::String", "String");
impl_plain_typed!(bool, "bool", "bool");
impl_plain_typed!(i32, "i32", "i32");
impl_plain_typed!(i64, "i64", "i64");
impl_plain_typed!(f32, "f32", "f32");
impl_plain_typed!(f64, "f64", "f64");
impl_plain_typed!(Type, "vc_serial::info::Type", "Type");
impl_plain_typed!(serde_json::Value, "serde_json::value::Value", "Value");

impl TypePath for Any {
    fn type_path() -> &'static str {
        "vc_serial::info::Any"
    }

    fn type_name() -> &'static str {
        "Any"
    }
}

impl Typed for Any {
    fn ty() -> Type {
        Type::any()
    }
}

// -----------------------------------------------------------------------------
// Tests
