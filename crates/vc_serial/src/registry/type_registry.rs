use alloc::string::String;
use alloc::sync::Arc;
use core::any::TypeId;
use core::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_core::{Deserialize, Serialize};

use crate::codec::{BasicCodec, Codec, SerdeCodec};
use crate::error::{ErrorKind, Operation, SerialError};
use crate::hash::{FixedHashState, HashMap, HashSet, TypeIdMap};
use crate::info::{Enumeration, Type, Typed};
use crate::list::SerializedList;
use crate::map::SerializedMap;
use crate::value::Opaque;
use crate::wrapper::TypeWrapper;

// -----------------------------------------------------------------------------
// TypeRegistry

/// The codec table: native types and the codecs bound to them.
///
/// Lookups go by [`TypeId`], by full [type path], or by short [type name].
/// Short names may collide across modules; the most recent registration
/// wins and the name is reported by [`is_ambiguous`](Self::is_ambiguous).
///
/// Enum kinds need no registration to be converted. Register them with
/// [`register_enum`](Self::register_enum) only when their short name must
/// resolve, e.g. as the tag of a [`TypeWrapper`].
///
/// # Examples
///
/// ```
/// use vc_serial::{Type, TypeRegistry};
///
/// let registry = TypeRegistry::new();
///
/// assert_eq!(registry.get_with_name("i64"), Some(Type::of::<i64>()));
/// assert_eq!(registry.get_with_name("alloc::string::String"), Some(Type::of::<String>()));
/// assert_eq!(registry.get_with_name("u8"), None);
/// ```
///
/// [type path]: crate::info::TypePath::type_path
/// [type name]: crate::info::TypePath::type_name
pub struct TypeRegistry {
    codec_table: TypeIdMap<CodecEntry>,
    type_path_to_id: HashMap<&'static str, TypeId>,
    type_name_to_id: HashMap<&'static str, TypeId>,
    ambiguous_names: HashSet<&'static str>,
    #[cfg(feature = "auto_register")]
    auto_registered: bool,
}

struct CodecEntry {
    ty: Type,
    codec: Arc<dyn Codec>,
}

impl Default for TypeRegistry {
    /// See [`TypeRegistry::new`] .
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates a registry without any binding.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            codec_table: TypeIdMap::with_hasher(FixedHashState),
            type_path_to_id: HashMap::with_hasher(FixedHashState),
            type_name_to_id: HashMap::with_hasher(FixedHashState),
            ambiguous_names: HashSet::with_hasher(FixedHashState),
            #[cfg(feature = "auto_register")]
            auto_registered: false,
        }
    }

    /// Creates a registry with the built-in bindings.
    ///
    /// - `String` `bool` `i32` `i64` `f32` `f64`
    /// - [`Type`] [`SerializedList`] [`SerializedMap`] [`TypeWrapper`]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        let basic: Arc<dyn Codec> = Arc::new(BasicCodec);
        for ty in [
            Type::of::<String>(),
            Type::of::<bool>(),
            Type::of::<i32>(),
            Type::of::<i64>(),
            Type::of::<f32>(),
            Type::of::<f64>(),
            Type::of::<Type>(),
            Type::of::<SerializedList>(),
            Type::of::<SerializedMap>(),
            Type::of::<TypeWrapper>(),
        ] {
            registry.register_shared(ty, basic.clone());
        }
        registry
    }

    // The previous binding of `ty`, if any, must already be replaced.
    fn add_type_indices(&mut self, ty: Type) {
        let type_name = ty.name();
        if let Some(previous) = self.type_name_to_id.insert(type_name, ty.id())
            && previous != ty.id()
        {
            self.ambiguous_names.insert(type_name);
            log::warn!(
                "type name `{type_name}` is shared by several registered types, \
                 it now resolves to `{}`",
                ty.path()
            );
        }
        self.type_path_to_id.insert(ty.path(), ty.id());
    }

    /// Binds a codec to a type, replacing any previous binding.
    ///
    /// A short name already bound to another type is rebound to `ty`.
    /// Use [`try_register`](Self::try_register) to reject that instead.
    pub fn register_shared(&mut self, ty: Type, codec: Arc<dyn Codec>) {
        log::debug!("registering codec for `{}`", ty.path());
        self.codec_table.insert(ty.id(), CodecEntry { ty, codec });
        self.add_type_indices(ty);
    }

    /// Binds a codec to a type, replacing any previous binding.
    ///
    /// See [`register_shared`](Self::register_shared).
    #[inline]
    pub fn register(&mut self, ty: Type, codec: impl Codec) {
        self.register_shared(ty, Arc::new(codec));
    }

    /// Binds a codec to `T`.
    #[inline]
    pub fn register_type<T: Typed>(&mut self, codec: impl Codec) {
        self.register(T::ty(), codec);
    }

    /// Binds a [`SerdeCodec`] to `T`.
    pub fn register_serde<T>(&mut self)
    where
        T: Typed + Opaque + Serialize + for<'de> Deserialize<'de>,
    {
        self.register(T::ty(), SerdeCodec::of::<T>());
    }

    /// Makes an enum kind resolvable by name.
    #[inline]
    pub fn register_enum<E: Enumeration>(&mut self) {
        self.register(E::ty(), BasicCodec);
    }

    /// Binds a codec to a type unless one of its names is taken by another type.
    ///
    /// # Examples
    ///
    /// ```
    /// use vc_serial::codec::BasicCodec;
    /// use vc_serial::{ErrorKind, TypeRegistry};
    ///
    /// mod a { vc_serial::impl_enumeration!(Mode { On }); pub enum Mode { On } }
    /// mod b { vc_serial::impl_enumeration!(Mode { Off }); pub enum Mode { Off } }
    ///
    /// let mut registry = TypeRegistry::new();
    /// registry.register_enum::<a::Mode>();
    ///
    /// let err = registry.try_register(vc_serial::Type::of::<b::Mode>(), BasicCodec).unwrap_err();
    /// assert!(matches!(err.kind(), ErrorKind::DuplicateName { name: "Mode", .. }));
    /// ```
    pub fn try_register(&mut self, ty: Type, codec: impl Codec) -> Result<(), SerialError> {
        for (name, table) in [
            (ty.path(), &self.type_path_to_id),
            (ty.name(), &self.type_name_to_id),
        ] {
            if let Some(id) = table.get(name)
                && *id != ty.id()
            {
                let bound = self.codec_table.get(id).map_or(name, |entry| entry.ty.path());
                return Err(SerialError::new(
                    Operation::Register,
                    ErrorKind::DuplicateName { name, bound },
                )
                .with_type(ty.path()));
            }
        }
        self.register(ty, codec);
        Ok(())
    }

    /// Registers every binding submitted with
    /// [`submit_codec!`](crate::submit_codec).
    ///
    /// Returns `true` if static registration works on the current
    /// platform. Repeated calls are cheap.
    ///
    /// ## Feature Dependency
    ///
    /// Requires the `auto_register` feature. When disabled, it does nothing
    /// and returns `false`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vc_serial::{Type, TypeRegistry};
    ///
    /// #[derive(Clone, Copy, Debug, PartialEq)]
    /// enum Level { Low, High }
    ///
    /// vc_serial::impl_enumeration!(Level { Low, High });
    /// vc_serial::submit_codec!(|registry| registry.register_enum::<Level>());
    ///
    /// fn main() {
    ///     let mut registry = TypeRegistry::new();
    ///     assert!(registry.auto_register());
    ///     assert_eq!(registry.get_with_name("Level"), Some(Type::of::<Level>()));
    /// }
    /// ```
    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            if self.auto_registered {
                return true;
            }
            super::auto_register::register_submitted(self);
            self.auto_registered
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }

    #[cfg(feature = "auto_register")]
    #[inline]
    pub(super) fn mark_auto_registered(&mut self) {
        self.auto_registered = true;
    }

    /// Whether a codec is bound to the type with the given [`TypeId`].
    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.codec_table.contains_key(&type_id)
    }

    /// Whether values of `ty` can be converted: `ty` is an enum kind or has
    /// a bound codec.
    #[inline]
    pub fn is_supported(&self, ty: Type) -> bool {
        ty.members().is_some() || self.contains(ty.id())
    }

    /// Returns the codec bound to the type with the given [`TypeId`].
    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&dyn Codec> {
        self.codec_table.get(&type_id).map(|entry| &*entry.codec)
    }

    /// Returns the codec shared by all enum kinds.
    #[inline(always)]
    pub fn enum_codec(&self) -> &dyn Codec {
        &BasicCodec
    }

    /// Returns the registered type with the given full path.
    pub fn get_with_type_path(&self, type_path: &str) -> Option<Type> {
        let id = self.type_path_to_id.get(type_path)?;
        self.codec_table.get(id).map(|entry| entry.ty)
    }

    /// Returns the registered type with the given short name.
    ///
    /// An ambiguous name resolves to the most recently registered type.
    pub fn get_with_type_name(&self, type_name: &str) -> Option<Type> {
        let id = self.type_name_to_id.get(type_name)?;
        self.codec_table.get(id).map(|entry| entry.ty)
    }

    /// Resolves a name: a full path if it contains `::`, else a short name.
    ///
    /// This is how type references are resolved during deserialization.
    #[inline]
    pub fn get_with_name(&self, name: &str) -> Option<Type> {
        if name.contains("::") {
            self.get_with_type_path(name)
        } else {
            self.get_with_type_name(name)
        }
    }

    /// Returns `true` if the given short name was registered for more than
    /// one type.
    #[inline]
    pub fn is_ambiguous(&self, type_name: &str) -> bool {
        self.ambiguous_names.contains(type_name)
    }

    /// Returns an iterator over the registered types.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Type> + '_ {
        self.codec_table.values().map(|entry| entry.ty)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.codec_table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codec_table.is_empty()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.type_path_to_id.keys()).finish()
    }
}

// -----------------------------------------------------------------------------
// TypeRegistryArc

/// A [`TypeRegistry`] shared between threads.
///
/// Conversions only need a read lock, so any number of threads can convert
/// concurrently while registration takes the write lock.
#[derive(Clone, Default)]
pub struct TypeRegistryArc {
    /// The wrapped [`TypeRegistry`].
    pub internal: Arc<RwLock<TypeRegistry>>,
}

impl TypeRegistryArc {
    #[inline]
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            internal: Arc::new(RwLock::new(registry)),
        }
    }

    /// Takes a read lock on the underlying [`TypeRegistry`].
    pub fn read(&self) -> RwLockReadGuard<'_, TypeRegistry> {
        self.internal.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a write lock on the underlying [`TypeRegistry`].
    pub fn write(&self) -> RwLockWriteGuard<'_, TypeRegistry> {
        self.internal
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for TypeRegistryArc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read().fmt(f)
    }
}

// -----------------------------------------------------------------------------
// Tests
