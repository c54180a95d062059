//! The dispatch facade.
//!
//! [`serialize`] and [`deserialize`] route a value or node to the codec
//! bound to its type, and attach the offending value/node and type to any
//! error. The remaining functions are one-shot helpers over
//! [`SerializedList`] and [`SerializedMap`].

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::{ErrorKind, Result, SerialError};
use crate::info::Type;
use crate::list::SerializedList;
use crate::map::{Entries, SerializedMap};
use crate::registry::TypeRegistry;
use crate::trace;
use crate::tree::{self, Node};
use crate::value::{Native, Value};

// -----------------------------------------------------------------------------
// Dispatch

/// Serializes a value into a tree node.
///
/// - An absent value becomes [`Node::Null`].
/// - An enum member is handled by the registry's enum codec.
/// - A [`Value::Node`] is returned unchanged.
/// - Any other value goes to the codec bound to its runtime type.
///
/// # Examples
///
/// ```
/// use vc_serial::{TypeRegistry, Value};
///
/// let registry = TypeRegistry::new();
///
/// let node = vc_serial::serialize(Some(&Value::F64(1.5)), &registry).unwrap();
/// assert_eq!(node.to_string(), r#""D3vu0000000000""#);
///
/// let node = vc_serial::serialize(None, &registry).unwrap();
/// assert!(node.is_null());
/// ```
pub fn serialize(value: Option<&Value>, registry: &TypeRegistry) -> Result<Node> {
    let Some(value) = value else {
        return Ok(Node::Null);
    };
    if let Value::Node(node) = value {
        return Ok(node.clone());
    }

    let ty = value.ty();
    let _guard = trace::enter(ty.path());
    let result = match value {
        Value::Enum(_) => registry.enum_codec().serialize(value, registry),
        _ => match registry.get(ty.id()) {
            Some(codec) => codec.serialize(value, registry),
            None => Err(SerialError::serialize(ErrorKind::NoCodec(ty.path()))),
        },
    };
    result.map_err(|e| {
        e.or_context(|| alloc::format!("{value:?}"), ty.path())
            .or_trace(trace::snapshot)
    })
}

/// Deserializes a tree node as `ty`.
///
/// - A `null` node becomes `None`.
/// - Against [`Type::any`] or the node type itself, the node is returned
///   unchanged as [`Value::Node`].
/// - An enum kind is handled by the registry's enum codec.
/// - Any other type goes to the codec bound to it.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use vc_serial::{Type, TypeRegistry, Value};
///
/// let registry = TypeRegistry::new();
///
/// let value = vc_serial::deserialize(&json!("42"), Type::of::<i32>(), &registry).unwrap();
/// assert_eq!(value, Some(Value::I32(42)));
///
/// let value = vc_serial::deserialize(&json!([1]), Type::any(), &registry).unwrap();
/// assert_eq!(value, Some(Value::Node(json!([1]))));
/// ```
pub fn deserialize(node: &Node, ty: Type, registry: &TypeRegistry) -> Result<Option<Value>> {
    if node.is_null() {
        return Ok(None);
    }
    if ty.is_any() || ty.is::<Node>() {
        return Ok(Some(Value::Node(node.clone())));
    }

    let _guard = trace::enter(ty.path());
    let result = if ty.members().is_some() {
        registry.enum_codec().deserialize(node, ty, registry)
    } else {
        match registry.get(ty.id()) {
            Some(codec) => codec.deserialize(node, ty, registry),
            None => Err(SerialError::deserialize(ErrorKind::NoCodec(ty.path()))),
        }
    };
    result.map_err(|e| {
        e.or_context(|| tree::print(node), ty.path())
            .or_trace(trace::snapshot)
    })
}

/// Deserializes a tree node as the statically known `T`.
///
/// ```
/// use serde_json::json;
/// use vc_serial::TypeRegistry;
///
/// let registry = TypeRegistry::new();
/// let value = vc_serial::deserialize_as::<i64>(&json!(7), &registry).unwrap();
/// assert_eq!(value, Some(7));
/// ```
pub fn deserialize_as<T: Native>(node: &Node, registry: &TypeRegistry) -> Result<Option<T>> {
    match deserialize(node, T::ty(), registry)? {
        Some(value) => T::from_value(value).map(Some).map_err(|value| {
            SerialError::deserialize(ErrorKind::TypeMismatch {
                expected: T::type_path(),
                found: alloc::format!("`{}`", value.ty().path()),
            })
            .with_subject(tree::print(node))
            .with_type(T::type_path())
        }),
        None => Ok(None),
    }
}

// -----------------------------------------------------------------------------
// One-shot helpers

/// Serializes native values into array text.
///
/// ```
/// use vc_serial::{TypeRegistry, Value};
///
/// let registry = TypeRegistry::new();
/// let values = [Some(Value::I32(42)), Some(Value::from("hi")), Some(Value::Bool(true))];
///
/// let text = vc_serial::driver::encode_list(values, &registry).unwrap();
/// assert_eq!(text, r#"[42,"hi",true]"#);
/// ```
pub fn encode_list(
    values: impl IntoIterator<Item = Option<Value>>,
    registry: &TypeRegistry,
) -> Result<String> {
    let list: SerializedList = values.into_iter().collect();
    Ok(list.text(registry)?.map(String::from).unwrap_or_default())
}

/// Decodes array text with one target type per element.
pub fn decode_list(
    text: &str,
    types: &[Type],
    registry: &TypeRegistry,
) -> Result<Vec<Option<Value>>> {
    let mut list = SerializedList::from_text(text);
    list.decode(types, registry)?;
    Ok(list.into_values().unwrap_or_default())
}

/// Decodes array text with a single target type for every element.
pub fn decode_uniform_list(
    text: &str,
    ty: Type,
    registry: &TypeRegistry,
) -> Result<Vec<Option<Value>>> {
    let mut list = SerializedList::from_text(text);
    list.decode_uniform(ty, registry)?;
    Ok(list.into_values().unwrap_or_default())
}

/// Serializes a native mapping into object text.
pub fn encode_map(entries: Entries, registry: &TypeRegistry) -> Result<String> {
    let map = SerializedMap::from_entries(entries);
    Ok(map.text(registry)?.map(String::from).unwrap_or_default())
}

/// Decodes object text with one key type and one value type.
pub fn decode_map(
    text: &str,
    key_ty: Type,
    value_ty: Type,
    registry: &TypeRegistry,
) -> Result<Entries> {
    let mut map = SerializedMap::from_text(text);
    map.decode(key_ty, value_ty, registry)?;
    Ok(map.into_entries().unwrap_or_default())
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::vec;

    use serde_json::json;

    use super::{
        decode_list, decode_map, decode_uniform_list, deserialize, deserialize_as, encode_list,
        encode_map, serialize,
    };
    use crate::error::{ErrorKind, Operation};
    use crate::info::{Type, TypePath, Typed};
    use crate::map::Entries;
    use crate::registry::TypeRegistry;
    use crate::value::{Native, Value};
    use crate::wrapper::TypeWrapper;

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Signal {
        Red,
        Amber,
        Green,
    }

    crate::impl_enumeration!(Signal { Red, Amber, Green });

    #[derive(Clone, Debug, PartialEq)]
    struct Unbound;

    impl TypePath for Unbound {
        fn type_path() -> &'static str {
            "tests::Unbound"
        }
        fn type_name() -> &'static str {
            "Unbound"
        }
    }

    impl Typed for Unbound {
        fn ty() -> Type {
            Type::plain::<Self>()
        }
    }

    fn round_trip(value: Value, registry: &TypeRegistry) -> Option<Value> {
        let node = serialize(Some(&value), registry).unwrap();
        deserialize(&node, value.ty(), registry).unwrap()
    }

    #[test]
    fn primitives_round_trip_exactly() {
        let registry = TypeRegistry::new();
        let cases = [
            Value::from("text"),
            Value::Bool(false),
            Value::I32(i32::MIN),
            Value::I64(i64::MAX),
            Value::F64(0.0),
            Value::F64(-0.0),
            Value::F64(f64::NAN),
            Value::F64(f64::MAX),
            Value::F64(f64::MIN_POSITIVE),
            Value::F64(5e-324),
            Value::F32(-0.0),
            Value::F32(f32::NAN),
            Value::F32(f32::MIN),
            Value::Type(Type::of::<bool>()),
        ];
        for value in cases {
            assert_eq!(round_trip(value.clone(), &registry), Some(value));
        }
    }

    #[test]
    fn double_bit_pattern() {
        let registry = TypeRegistry::new();
        let node = serialize(Some(&Value::F64(1.5)), &registry).unwrap();
        assert_eq!(node, json!("D3vu0000000000"));
        assert_eq!(
            deserialize_as::<f64>(&node, &registry).unwrap().map(f64::to_bits),
            Some(1.5f64.to_bits())
        );
    }

    #[test]
    fn enums_round_trip_without_registration() {
        let registry = TypeRegistry::empty();
        for signal in [Signal::Red, Signal::Amber, Signal::Green] {
            let node = serialize(Some(&signal.into_value()), &registry).unwrap();
            assert_eq!(deserialize_as::<Signal>(&node, &registry).unwrap(), Some(signal));
        }

        let err = deserialize(&json!("Blue"), Type::of::<Signal>(), &registry).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnknownEnumMember { .. }));
        assert_eq!(err.subject(), Some(r#""Blue""#));
    }

    #[test]
    fn absent_and_null() {
        let registry = TypeRegistry::new();
        assert_eq!(serialize(None, &registry).unwrap(), json!(null));
        assert_eq!(deserialize(&json!(null), Type::of::<i32>(), &registry).unwrap(), None);
    }

    #[test]
    fn nodes_pass_through() {
        let registry = TypeRegistry::empty();
        let fragment = json!({ "raw": [1, 2] });
        assert_eq!(serialize(Some(&Value::Node(fragment.clone())), &registry).unwrap(), fragment);
        assert_eq!(
            deserialize(&fragment, Type::any(), &registry).unwrap(),
            Some(Value::Node(fragment.clone()))
        );
        assert_eq!(
            deserialize_as::<serde_json::Value>(&fragment, &registry).unwrap(),
            Some(fragment)
        );
    }

    #[test]
    fn missing_codecs() {
        let registry = TypeRegistry::new();

        let err = serialize(Some(&Value::opaque(Unbound)), &registry).unwrap_err();
        assert_eq!(err.operation(), Operation::Serialize);
        assert_eq!(err.kind(), &ErrorKind::NoCodec("tests::Unbound"));
        assert_eq!(err.type_path(), Some("tests::Unbound"));

        let err = deserialize(&json!(1), Type::of::<Unbound>(), &registry).unwrap_err();
        assert_eq!(err.operation(), Operation::Deserialize);
        assert_eq!(err.kind(), &ErrorKind::NoCodec("tests::Unbound"));
        assert_eq!(err.subject(), Some("1"));
    }

    #[test]
    fn errors_carry_node_and_type() {
        let registry = TypeRegistry::new();
        let err = deserialize(&json!("x1"), Type::of::<i32>(), &registry).unwrap_err();
        assert_eq!(err.subject(), Some(r#""x1""#));
        assert_eq!(err.type_path(), Some("i32"));
        assert!(err.to_string().starts_with(r#"failed to deserialize "x1" (`i32`)"#));
    }

    #[cfg(all(debug_assertions, feature = "debug"))]
    #[test]
    fn errors_carry_the_type_stack() {
        let registry = TypeRegistry::new();
        let err = deserialize(
            &json!(["x1", "i32"]),
            Type::of::<TypeWrapper>(),
            &registry,
        )
        .unwrap_err();
        assert_eq!(
            err.trace(),
            Some("`vc_serial::wrapper::TypeWrapper` -> `i32`")
        );
    }

    #[test]
    fn static_type_mismatch() {
        let registry = TypeRegistry::new();
        let err = deserialize_as::<Signal>(&json!("Red"), &registry);
        assert_eq!(err.unwrap(), Some(Signal::Red));

        let err = deserialize_as::<i32>(&json!([]), &registry).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn wrappers_keep_their_type_inside_any_lists() {
        let registry = TypeRegistry::new();
        let values = vec![
            Some(Value::from(TypeWrapper::new(Value::I64(7)))),
            Some(Value::from(TypeWrapper::new(Value::F32(0.5)))),
            Some(Value::from(TypeWrapper::absent())),
        ];

        let text = encode_list(values.clone(), &registry).unwrap();
        assert_eq!(text, r#"[[7,"i64"],["Fvg0000","f32"],[null,null]]"#);

        let any = decode_uniform_list(&text, Type::any(), &registry).unwrap();
        assert!(matches!(any[0], Some(Value::Node(_))));

        let decoded = decode_uniform_list(&text, Type::of::<TypeWrapper>(), &registry).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn registered_enums_survive_wrapping() {
        let mut registry = TypeRegistry::new();
        registry.register_enum::<Signal>();

        let wrapped = Value::from(TypeWrapper::new(Signal::Amber.into_value()));
        let node = serialize(Some(&wrapped), &registry).unwrap();
        assert_eq!(node, json!(["Amber", "Signal"]));
        assert_eq!(
            deserialize(&node, Type::of::<TypeWrapper>(), &registry).unwrap(),
            Some(wrapped)
        );
    }

    #[test]
    fn list_helpers() {
        let registry = TypeRegistry::new();
        let values = vec![
            Some(Value::I32(42)),
            Some(Value::from("hi")),
            Some(Value::Bool(true)),
        ];
        let text = encode_list(values.clone(), &registry).unwrap();
        assert_eq!(text, r#"[42,"hi",true]"#);

        let types = [Type::of::<i32>(), Type::of::<String>(), Type::of::<bool>()];
        assert_eq!(decode_list(&text, &types, &registry).unwrap(), values);

        let err = decode_list(&text, &types[..2], &registry).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ArityMismatch { types: 2, elements: 3 });
    }

    #[test]
    fn map_helpers() {
        let registry = TypeRegistry::new();
        let mut entries = Entries::default();
        entries.insert(Value::I32(3), Some(Value::from("three")));
        entries.insert(Value::I32(1), Some(Value::from("one")));
        entries.insert(Value::I32(2), None);

        let text = encode_map(entries.clone(), &registry).unwrap();
        assert_eq!(text, r#"{"3":"three","1":"one","2":null}"#);

        let decoded = decode_map(&text, Type::of::<i32>(), Type::of::<String>(), &registry).unwrap();
        assert_eq!(decoded, entries);
        assert!(decoded.keys().eq(entries.keys()));
    }
}
