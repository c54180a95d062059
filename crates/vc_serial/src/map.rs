//! The lazy map container.

use alloc::borrow::Cow;
use alloc::string::{String, ToString};
use core::any::TypeId;
use core::cell::OnceCell;
use core::fmt;

use indexmap::IndexMap;

use crate::driver;
use crate::error::{ErrorKind, Result, SerialError};
use crate::info::{Any, Type, TypePath, Typed};
use crate::registry::TypeRegistry;
use crate::tree::{self, Node, Object};
use crate::value::Value;

/// Decoded map entries, in insertion order.
pub type Entries = IndexMap<Value, Option<Value>>;

// -----------------------------------------------------------------------------
// SerializedMap

#[derive(Clone)]
struct DecodedMap {
    entries: Entries,
    /// Key and value types, `None` when the contents are mixed.
    request: Option<(TypeId, TypeId)>,
}

impl DecodedMap {
    fn from_native(entries: Entries) -> Self {
        let any = TypeId::of::<Any>();
        let keys = uniform(entries.keys().map(|k| k.ty().id()));
        let values = uniform(entries.values().flatten().map(|v| v.ty().id()));
        let request = match (keys, values) {
            (Some(k), Some(v)) => Some((k.unwrap_or(any), v.unwrap_or(any))),
            _ => None,
        };
        Self { entries, request }
    }
}

/// The form equality is judged on, fixed by how the mapping was built.
#[derive(PartialEq)]
enum Shape<'a> {
    Entries(Option<&'a Entries>),
    Tree(Cow<'a, Object>),
    Malformed(&'a str),
    Nothing,
}

// `Some(None)` for no ids, `Some(Some(id))` for a single id, `None` for mixed.
fn uniform(mut ids: impl Iterator<Item = TypeId>) -> Option<Option<TypeId>> {
    let Some(first) = ids.next() else {
        return Some(None);
    };
    ids.all(|id| id == first).then_some(Some(first))
}

/// A string-keyed mapping with up to three cached forms: text, tree and
/// decoded entries.
///
/// Works like [`SerializedList`](crate::SerializedList), equality included.
/// Keys of the tree
/// form are strings; decoded keys are recovered by deserializing them as
/// string nodes, so an `i32` key round-trips through its decimal text.
///
/// # Examples
///
/// ```
/// use vc_serial::map::Entries;
/// use vc_serial::{SerializedMap, Type, TypeRegistry, Value};
///
/// let registry = TypeRegistry::new();
///
/// let mut entries = Entries::default();
/// entries.insert(Value::I32(2), Some(Value::Bool(true)));
/// entries.insert(Value::I32(1), None);
///
/// let map = SerializedMap::from_entries(entries.clone());
/// let text = map.text(&registry).unwrap().unwrap();
/// assert_eq!(text, r#"{"2":true,"1":null}"#);
///
/// let mut parsed = SerializedMap::from_text(text);
/// let decoded = parsed.decode(Type::of::<i32>(), Type::of::<bool>(), &registry).unwrap();
/// assert_eq!(decoded, Some(&entries));
/// ```
#[derive(Clone, Default)]
pub struct SerializedMap {
    text: OnceCell<String>,
    tree: OnceCell<Object>,
    decoded: Option<DecodedMap>,
    native: bool,
}

impl SerializedMap {
    /// The canonical empty mapping.
    #[inline]
    pub fn empty() -> Self {
        Self::from_entries(Entries::default())
    }

    /// Creates a mapping from serialized object text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: OnceCell::from(text.into()),
            ..Self::default()
        }
    }

    /// Creates a mapping from a parsed object.
    pub fn from_tree(tree: Object) -> Self {
        Self {
            tree: OnceCell::from(tree),
            ..Self::default()
        }
    }

    /// Creates a mapping from native entries.
    pub fn from_entries(entries: Entries) -> Self {
        Self {
            decoded: Some(DecodedMap::from_native(entries)),
            native: true,
            ..Self::default()
        }
    }

    /// Decodes every key as `key_ty` and every value as `value_ty`,
    /// keeping the order of the tree.
    ///
    /// A key that decodes to nothing fails with [`ErrorKind::TypeMismatch`].
    /// Returns `None` for a mapping holding no data at all.
    pub fn decode(
        &mut self,
        key_ty: Type,
        value_ty: Type,
        registry: &TypeRegistry,
    ) -> Result<Option<&Entries>> {
        let request = Some((key_ty.id(), value_ty.id()));
        let cached = self.decoded.as_ref().is_some_and(|d| d.request == request);

        if !cached {
            let Some(object) = self.materialize_tree(registry)? else {
                return Ok(None);
            };
            let mut entries = Entries::with_capacity(object.len());
            for (key, node) in object {
                let key_node = Node::String(key.clone());
                let Some(key) = driver::deserialize(&key_node, key_ty, registry)? else {
                    return Err(SerialError::deserialize(ErrorKind::TypeMismatch {
                        expected: key_ty.path(),
                        found: String::from("an absent key"),
                    })
                    .with_subject(tree::print(&key_node))
                    .with_type(key_ty.path()));
                };
                let value = driver::deserialize(node, value_ty, registry)?;
                entries.insert(key, value);
            }
            log::trace!("decoded {} map entries", entries.len());
            self.decoded = Some(DecodedMap { entries, request });
        }

        Ok(self.entries())
    }

    // Tree from text, else from the decoded entries.
    fn materialize_tree(&self, registry: &TypeRegistry) -> Result<Option<&Object>> {
        if let Some(tree) = self.tree.get() {
            return Ok(Some(tree));
        }
        let tree = if let Some(text) = self.text.get() {
            tree::parse_object(text)?
        } else if let Some(decoded) = &self.decoded {
            log::trace!("serializing {} map entries", decoded.entries.len());
            let mut object = Object::new();
            for (key, value) in &decoded.entries {
                let key = stringify(driver::serialize(Some(key), registry)?);
                object.insert(key, driver::serialize(value.as_ref(), registry)?);
            }
            object
        } else {
            return Ok(None);
        };
        Ok(Some(self.tree.get_or_init(|| tree)))
    }

    /// Returns the serialized text, computing it if needed.
    ///
    /// Returns `None` for a mapping holding no data at all, which is
    /// distinct from the empty object `{}`.
    pub fn text(&self, registry: &TypeRegistry) -> Result<Option<&str>> {
        if let Some(text) = self.text.get() {
            return Ok(Some(text));
        }
        let Some(object) = self.materialize_tree(registry)? else {
            return Ok(None);
        };
        let text = tree::print_object(object)?;
        Ok(Some(self.text.get_or_init(|| text)))
    }

    /// Returns the parsed object, computing it if needed.
    #[inline]
    pub fn tree(&self, registry: &TypeRegistry) -> Result<Option<&Object>> {
        self.materialize_tree(registry)
    }

    /// Embeds the mapping into a tree: an object, or `null` without data.
    pub fn to_node(&self, registry: &TypeRegistry) -> Result<Node> {
        Ok(match self.materialize_tree(registry)? {
            Some(object) => Node::Object(object.clone()),
            None => Node::Null,
        })
    }

    /// The decoded entries, if any.
    #[inline]
    pub fn entries(&self) -> Option<&Entries> {
        self.decoded.as_ref().map(|d| &d.entries)
    }

    #[inline]
    pub fn into_entries(self) -> Option<Entries> {
        self.decoded.map(|d| d.entries)
    }

    #[inline]
    pub fn is_decoded(&self) -> bool {
        self.decoded.is_some()
    }

    /// Whether the mapping has no entries, judged on the most decoded form
    /// available. A mapping without any data is empty.
    pub fn is_empty(&self) -> bool {
        if let Some(decoded) = &self.decoded {
            decoded.entries.is_empty()
        } else if let Some(tree) = self.tree.get() {
            tree.is_empty()
        } else if let Some(text) = self.text.get() {
            text == "{}"
        } else {
            true
        }
    }

    fn shape(&self) -> Shape<'_> {
        if self.native {
            return Shape::Entries(self.entries());
        }
        if let Some(tree) = self.tree.get() {
            return Shape::Tree(Cow::Borrowed(tree));
        }
        match self.text.get() {
            Some(text) => match tree::parse_object(text) {
                Ok(tree) => Shape::Tree(Cow::Owned(tree)),
                Err(_) => Shape::Malformed(text),
            },
            None => Shape::Nothing,
        }
    }
}

/// Object keys are strings: string nodes give their content, other nodes
/// their JSON text.
fn stringify(key: Node) -> String {
    match key {
        Node::String(s) => s,
        other => other.to_string(),
    }
}

impl FromIterator<(Value, Option<Value>)> for SerializedMap {
    fn from_iter<I: IntoIterator<Item = (Value, Option<Value>)>>(iter: I) -> Self {
        Self::from_entries(iter.into_iter().collect())
    }
}

impl PartialEq for SerializedMap {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape()
    }
}

impl Eq for SerializedMap {}

impl fmt::Debug for SerializedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializedMap")
            .field("text", &self.text.get())
            .field("tree", &self.tree.get())
            .field("decoded", &self.entries())
            .finish()
    }
}

impl TypePath for SerializedMap {
    #[inline(always)]
    fn type_path() -> &'static str {
        "vc_serial::map::SerializedMap"
    }

    #[inline(always)]
    fn type_name() -> &'static str {
        "SerializedMap"
    }
}

impl Typed for SerializedMap {
    #[inline]
    fn ty() -> Type {
        Type::plain::<Self>()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Entries, SerializedMap};
    use crate::error::ErrorKind;
    use crate::info::{Type, TypePath};
    use crate::registry::TypeRegistry;
    use crate::value::{Native, Value};

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Color {
        Red,
        Blue,
    }

    crate::impl_enumeration!(Color { Red, Blue });

    fn object(node: serde_json::Value) -> super::Object {
        match node {
            serde_json::Value::Object(object) => object,
            _ => unreachable!(),
        }
    }

    #[test]
    fn type_path() {
        assert_eq!(SerializedMap::type_path(), "vc_serial::map::SerializedMap");
        assert_eq!(SerializedMap::type_name(), "SerializedMap");
    }

    #[test]
    fn round_trip_keeps_key_order() {
        let registry = TypeRegistry::new();
        let entries: Entries = [
            (Value::from("zeta"), Some(Color::Blue.into_value())),
            (Value::from("alpha"), Some(Color::Red.into_value())),
            (Value::from("mid"), None),
        ]
        .into_iter()
        .collect();

        let text = SerializedMap::from_entries(entries.clone())
            .text(&registry)
            .unwrap()
            .unwrap()
            .to_string();
        assert_eq!(text, r#"{"zeta":"Blue","alpha":"Red","mid":null}"#);

        let mut parsed = SerializedMap::from_text(text);
        let decoded = parsed
            .decode(Type::of::<String>(), Type::of::<Color>(), &registry)
            .unwrap()
            .unwrap();
        assert_eq!(decoded, &entries);
        assert!(decoded.keys().eq(entries.keys()));
    }

    #[test]
    fn keys_are_stringified() {
        let registry = TypeRegistry::new();
        let map: SerializedMap = [
            (Value::I64(-3), Some(Value::F64(0.5))),
            (Value::Bool(true), Some(Value::I32(1))),
            (Value::F64(1.5), None),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            map.text(&registry).unwrap(),
            Some(r#"{"-3":"D3vo0000000000","true":1,"D3vu0000000000":null}"#)
        );
    }

    #[test]
    fn float_keys_round_trip() {
        let registry = TypeRegistry::new();
        let mut map = SerializedMap::from_text(r#"{"D3vu0000000000":1,"2.5":2}"#);
        let decoded = map
            .decode(Type::of::<f64>(), Type::of::<i32>(), &registry)
            .unwrap()
            .unwrap();
        assert_eq!(decoded.get(&Value::F64(1.5)), Some(&Some(Value::I32(1))));
        assert_eq!(decoded.get(&Value::F64(2.5)), Some(&Some(Value::I32(2))));
    }

    #[test]
    fn bad_keys() {
        let registry = TypeRegistry::new();
        let mut map = SerializedMap::from_text(r#"{"one":1}"#);
        let err = map
            .decode(Type::of::<i32>(), Type::of::<i32>(), &registry)
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ParseFailure { .. }));

        let mut map = SerializedMap::from_text(r#"{"Nowhere":1}"#);
        let err = map
            .decode(Type::of::<Type>(), Type::of::<i32>(), &registry)
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn decoding_is_memoized_per_request() {
        let registry = TypeRegistry::new();
        let mut map = SerializedMap::from_tree(object(json!({ "a": 1 })));

        let ints = map.decode(Type::of::<String>(), Type::of::<i32>(), &registry).unwrap().unwrap();
        assert_eq!(ints.get(&Value::from("a")), Some(&Some(Value::I32(1))));

        let longs = map.decode(Type::of::<String>(), Type::of::<i64>(), &registry).unwrap().unwrap();
        assert_eq!(longs.get(&Value::from("a")), Some(&Some(Value::I64(1))));

        let native: SerializedMap = [(Value::from("k"), Some(Value::I32(7)))].into_iter().collect();
        let mut native = native;
        let same = native.decode(Type::of::<String>(), Type::of::<i32>(), &registry).unwrap();
        assert_eq!(same.map(Entries::len), Some(1));
        assert!(native.tree(&registry).unwrap().is_some());
    }

    #[test]
    fn text_falls_back_through_the_forms() {
        let registry = TypeRegistry::new();
        assert_eq!(SerializedMap::default().text(&registry).unwrap(), None);
        assert_eq!(SerializedMap::empty().text(&registry).unwrap(), Some("{}"));
        assert_eq!(
            SerializedMap::from_tree(object(json!({ "b": [1], "a": {} }))).text(&registry).unwrap(),
            Some(r#"{"b":[1],"a":{}}"#)
        );
    }

    #[test]
    fn emptiness() {
        let registry = TypeRegistry::new();
        assert!(SerializedMap::from_text("{}").is_empty());
        assert!(SerializedMap::from_tree(super::Object::new()).is_empty());
        assert!(SerializedMap::empty().is_empty());
        assert!(SerializedMap::default().is_empty());
        assert!(!SerializedMap::from_text(r#"{"a":null}"#).is_empty());

        let mut decoded = SerializedMap::from_text("{ }");
        decoded.decode(Type::of::<String>(), Type::any(), &registry).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn equality_ignores_cached_forms() {
        let registry = TypeRegistry::new();

        let mut a = SerializedMap::from_text(r#"{"k":1}"#);
        let mut b = SerializedMap::from_tree(object(json!({ "k": 1 })));
        let c = SerializedMap::from_text(r#"{ "k": 1 }"#);
        a.decode(Type::of::<String>(), Type::of::<i32>(), &registry).unwrap();
        b.decode(Type::of::<String>(), Type::of::<i64>(), &registry).unwrap();
        assert_eq!(a, c);
        assert_eq!(c, b);
        assert_eq!(a, b);
        assert_ne!(a, SerializedMap::from_text(r#"{"k":2}"#));

        let native: SerializedMap = [(Value::from("k"), Some(Value::I32(1)))].into_iter().collect();
        assert_ne!(native, c);
        assert_eq!(native.text(&registry).unwrap(), Some(r#"{"k":1}"#));
        assert_ne!(native, c);
        assert_eq!(native, native.clone());
        assert_eq!(SerializedMap::empty(), SerializedMap::empty());
        assert_eq!(SerializedMap::default(), SerializedMap::default());
    }

    #[test]
    fn embedded_as_a_node() {
        let registry = TypeRegistry::new();
        let inner: SerializedMap = [(Value::I32(1), Some(Value::from("x")))].into_iter().collect();
        let node = crate::serialize(Some(&Value::Map(inner)), &registry).unwrap();
        assert_eq!(node, json!({ "1": "x" }));

        let back = crate::deserialize(&node, Type::of::<SerializedMap>(), &registry)
            .unwrap()
            .unwrap();
        let mut back = SerializedMap::from_value(back).unwrap();
        let entries = back.decode(Type::of::<i32>(), Type::of::<String>(), &registry).unwrap();
        assert_eq!(
            entries.and_then(|e| e.get(&Value::I32(1))),
            Some(&Some(Value::from("x")))
        );
    }
}
