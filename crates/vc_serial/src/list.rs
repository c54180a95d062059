//! The lazy sequence container.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::TypeId;
use core::cell::OnceCell;
use core::fmt;

use crate::driver;
use crate::error::{ErrorKind, Result, SerialError};
use crate::info::{Type, TypePath, Typed};
use crate::registry::TypeRegistry;
use crate::tree::{self, Node};
use crate::value::Value;

// -----------------------------------------------------------------------------
// Decode requests

/// The target types a sequence was decoded against.
#[derive(Clone, Debug, PartialEq, Eq)]
enum ListRequest {
    Slots(Vec<TypeId>),
    Uniform(TypeId),
}

impl ListRequest {
    /// Whether values decoded for `self` answer `wanted`.
    fn covers(&self, wanted: &ListRequest, len: usize) -> bool {
        match (self, wanted) {
            (Self::Slots(have), Self::Slots(want)) => have == want,
            (Self::Uniform(have), Self::Uniform(want)) => have == want,
            (Self::Slots(have), Self::Uniform(want)) => have.iter().all(|id| id == want),
            (Self::Uniform(have), Self::Slots(want)) => {
                want.len() == len && want.iter().all(|id| id == have)
            }
        }
    }

    fn runtime_types_of(values: &[Option<Value>]) -> Self {
        let any = TypeId::of::<crate::info::Any>();
        Self::Slots(
            values
                .iter()
                .map(|v| v.as_ref().map_or(any, |v| v.ty().id()))
                .collect(),
        )
    }
}

#[derive(Clone)]
struct DecodedList {
    values: Vec<Option<Value>>,
    request: ListRequest,
}

/// The form equality is judged on, fixed by how the sequence was built.
#[derive(PartialEq)]
enum Shape<'a> {
    Values(&'a [Option<Value>]),
    Tree(Cow<'a, [Node]>),
    Malformed(&'a str),
    Nothing,
}

// -----------------------------------------------------------------------------
// SerializedList

/// A sequence with up to three cached forms: text, tree and decoded values.
///
/// Exactly one form is populated at construction; the others are computed
/// on first request and then kept. Decoding is repeated only when the
/// target types change.
///
/// Equality does not depend on which forms are cached. Sequences built from
/// native values compare their values; sequences built from text or a tree
/// compare their trees. The two kinds are never equal to each other, since
/// relating them would need a registry.
///
/// # Examples
///
/// ```
/// use vc_serial::{SerializedList, Type, TypeRegistry, Value};
///
/// let registry = TypeRegistry::new();
///
/// let mut list = SerializedList::from_text(r#"[42,"hi",true]"#);
/// let values = list
///     .decode(&[Type::of::<i32>(), Type::of::<String>(), Type::of::<bool>()], &registry)
///     .unwrap()
///     .unwrap();
/// assert_eq!(values[0], Some(Value::I32(42)));
/// assert_eq!(values[1], Some(Value::from("hi")));
///
/// let native = SerializedList::from_values(vec![Some(Value::I32(1)), None]);
/// assert_eq!(native.text(&registry).unwrap(), Some("[1,null]"));
/// ```
#[derive(Clone, Default)]
pub struct SerializedList {
    text: OnceCell<String>,
    tree: OnceCell<Vec<Node>>,
    decoded: Option<DecodedList>,
    native: bool,
}

impl SerializedList {
    /// The canonical empty sequence.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            text: OnceCell::new(),
            tree: OnceCell::new(),
            decoded: Some(DecodedList {
                values: Vec::new(),
                request: ListRequest::Slots(Vec::new()),
            }),
            native: true,
        }
    }

    /// Creates a sequence from serialized array text.
    ///
    /// The text is not parsed until another form is requested.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: OnceCell::from(text.into()),
            ..Self::default()
        }
    }

    /// Creates a sequence from parsed array elements.
    pub fn from_tree(tree: Vec<Node>) -> Self {
        Self {
            tree: OnceCell::from(tree),
            ..Self::default()
        }
    }

    /// Creates a sequence from native values.
    pub fn from_values(values: Vec<Option<Value>>) -> Self {
        let request = ListRequest::runtime_types_of(&values);
        Self {
            decoded: Some(DecodedList { values, request }),
            native: true,
            ..Self::default()
        }
    }

    /// Decodes element `i` as `types[i]`.
    ///
    /// Fails with [`ErrorKind::ArityMismatch`] when the number of types
    /// differs from the number of elements. Returns `None` for a sequence
    /// holding no data at all.
    pub fn decode(
        &mut self,
        types: &[Type],
        registry: &TypeRegistry,
    ) -> Result<Option<&[Option<Value>]>> {
        let request = ListRequest::Slots(types.iter().map(Type::id).collect());
        self.decode_with(request, registry, |i| types[i], Some(types.len()))
    }

    /// Decodes every element as `ty`.
    ///
    /// Returns `None` for a sequence holding no data at all.
    pub fn decode_uniform(
        &mut self,
        ty: Type,
        registry: &TypeRegistry,
    ) -> Result<Option<&[Option<Value>]>> {
        self.decode_with(ListRequest::Uniform(ty.id()), registry, |_| ty, None)
    }

    fn decode_with(
        &mut self,
        request: ListRequest,
        registry: &TypeRegistry,
        type_of: impl Fn(usize) -> Type,
        arity: Option<usize>,
    ) -> Result<Option<&[Option<Value>]>> {
        let cached = self
            .decoded
            .as_ref()
            .is_some_and(|d| d.request.covers(&request, d.values.len()));

        if !cached {
            let Some(elements) = self.materialize_tree(registry)? else {
                return Ok(None);
            };
            if let Some(types) = arity
                && types != elements.len()
            {
                return Err(SerialError::deserialize(ErrorKind::ArityMismatch {
                    types,
                    elements: elements.len(),
                })
                .with_type(Self::type_path()));
            }
            let mut values = Vec::with_capacity(elements.len());
            for (i, node) in elements.iter().enumerate() {
                values.push(driver::deserialize(node, type_of(i), registry)?);
            }
            log::trace!("decoded {} list elements", values.len());
            self.decoded = Some(DecodedList { values, request });
        }

        Ok(self.values())
    }

    // Tree from text, else from the decoded values.
    fn materialize_tree(&self, registry: &TypeRegistry) -> Result<Option<&Vec<Node>>> {
        if let Some(tree) = self.tree.get() {
            return Ok(Some(tree));
        }
        let tree = if let Some(text) = self.text.get() {
            tree::parse_array(text)?
        } else if let Some(decoded) = &self.decoded {
            log::trace!("serializing {} list elements", decoded.values.len());
            decoded
                .values
                .iter()
                .map(|value| driver::serialize(value.as_ref(), registry))
                .collect::<Result<Vec<_>>>()?
        } else {
            return Ok(None);
        };
        Ok(Some(self.tree.get_or_init(|| tree)))
    }

    /// Returns the serialized text, computing it if needed.
    ///
    /// Returns `None` for a sequence holding no data at all, which is
    /// distinct from the empty array `[]`.
    pub fn text(&self, registry: &TypeRegistry) -> Result<Option<&str>> {
        if let Some(text) = self.text.get() {
            return Ok(Some(text));
        }
        let Some(elements) = self.materialize_tree(registry)? else {
            return Ok(None);
        };
        let text = tree::print_array(elements)?;
        Ok(Some(self.text.get_or_init(|| text)))
    }

    /// Returns the parsed elements, computing them if needed.
    pub fn tree(&self, registry: &TypeRegistry) -> Result<Option<&[Node]>> {
        Ok(self.materialize_tree(registry)?.map(Vec::as_slice))
    }

    /// Embeds the sequence into a tree: an array, or `null` without data.
    pub fn to_node(&self, registry: &TypeRegistry) -> Result<Node> {
        Ok(match self.materialize_tree(registry)? {
            Some(elements) => Node::Array(elements.clone()),
            None => Node::Null,
        })
    }

    /// The decoded values, if any.
    #[inline]
    pub fn values(&self) -> Option<&[Option<Value>]> {
        self.decoded.as_ref().map(|d| d.values.as_slice())
    }

    #[inline]
    pub fn into_values(self) -> Option<Vec<Option<Value>>> {
        self.decoded.map(|d| d.values)
    }

    #[inline]
    pub fn is_decoded(&self) -> bool {
        self.decoded.is_some()
    }

    /// Whether the sequence has no elements, judged on the most decoded
    /// form available. A sequence without any data is empty.
    pub fn is_empty(&self) -> bool {
        if let Some(decoded) = &self.decoded {
            decoded.values.is_empty()
        } else if let Some(tree) = self.tree.get() {
            tree.is_empty()
        } else if let Some(text) = self.text.get() {
            text == "[]"
        } else {
            true
        }
    }

    fn shape(&self) -> Shape<'_> {
        if self.native {
            return Shape::Values(self.values().unwrap_or_default());
        }
        if let Some(tree) = self.tree.get() {
            return Shape::Tree(Cow::Borrowed(tree));
        }
        match self.text.get() {
            Some(text) => match tree::parse_array(text) {
                Ok(tree) => Shape::Tree(Cow::Owned(tree)),
                Err(_) => Shape::Malformed(text),
            },
            None => Shape::Nothing,
        }
    }
}

impl FromIterator<Option<Value>> for SerializedList {
    fn from_iter<I: IntoIterator<Item = Option<Value>>>(iter: I) -> Self {
        Self::from_values(iter.into_iter().collect())
    }
}

impl FromIterator<Value> for SerializedList {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_values(iter.into_iter().map(Some).collect())
    }
}

impl PartialEq for SerializedList {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }
}

impl Eq for SerializedList {}

impl fmt::Debug for SerializedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializedList")
            .field("text", &self.text.get())
            .field("tree", &self.tree.get())
            .field("decoded", &self.values())
            .finish()
    }
}

impl TypePath for SerializedList {
    #[inline(always)]
    fn type_path() -> &'static str {
        "vc_serial::list::SerializedList"
    }

    #[inline(always)]
    fn type_name() -> &'static str {
        "SerializedList"
    }
}

impl Typed for SerializedList {
    #[inline]
    fn ty() -> Type {
        Type::plain::<Self>()
    }
}

// -----------------------------------------------------------------------------
// Tests
