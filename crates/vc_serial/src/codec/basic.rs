use alloc::boxed::Box;
use alloc::string::{String, ToString};
use core::str::FromStr;

use serde_json::Number;

use super::{Codec, bits};
use crate::error::{ErrorKind, Result, SerialError};
use crate::info::Type;
use crate::list::SerializedList;
use crate::map::SerializedMap;
use crate::registry::TypeRegistry;
use crate::tree::{self, Node};
use crate::value::{EnumValue, Value};
use crate::wrapper::TypeWrapper;

/// The codec of every built-in type and of every enum kind.
///
/// | type             | node                                        |
/// |------------------|---------------------------------------------|
/// | `String`         | string                                      |
/// | `bool`           | boolean (`"true"`/`"false"` also accepted)  |
/// | `i32`, `i64`     | number (decimal string also accepted)       |
/// | `f64`            | `D` + base-32 bit pattern                   |
/// | `f32`            | `F` + base-32 bit pattern                   |
/// | enum kinds       | member name                                 |
/// | [`Type`]         | short type name                             |
/// | [`SerializedList`] | embedded array                            |
/// | [`SerializedMap`]  | embedded object                           |
/// | [`TypeWrapper`]  | `[payload, short type name]`                |
///
/// Numbers narrow the way a cast does: integral sources wrap, fractional
/// sources saturate.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicCodec;

impl Codec for BasicCodec {
    fn serialize(&self, value: &Value, registry: &TypeRegistry) -> Result<Node> {
        Ok(match value {
            Value::String(s) => Node::String(s.clone()),
            Value::Bool(b) => Node::Bool(*b),
            Value::I32(i) => Node::from(*i),
            Value::I64(i) => Node::from(*i),
            Value::F32(f) => Node::String(bits::encode_f32(*f)),
            Value::F64(f) => Node::String(bits::encode_f64(*f)),
            Value::Enum(e) => Node::String(e.name().to_string()),
            Value::Type(ty) => Node::String(ty.name().to_string()),
            Value::List(list) => list.to_node(registry)?,
            Value::Map(map) => map.to_node(registry)?,
            Value::Wrapper(wrapper) => serialize_wrapper(wrapper, registry)?,
            Value::Node(node) => node.clone(),
            Value::Opaque(v) => {
                return Err(SerialError::serialize(ErrorKind::UnsupportedType(
                    v.opaque_type().path(),
                )));
            }
        })
    }

    fn deserialize(
        &self,
        node: &Node,
        ty: Type,
        registry: &TypeRegistry,
    ) -> Result<Option<Value>> {
        if node.is_null() {
            return Ok(None);
        }
        if ty.members().is_some() {
            return deserialize_enum(node, ty).map(Some);
        }

        let value = if ty.is::<String>() {
            match node {
                Node::String(s) => Value::String(s.clone()),
                other => return Err(mismatch(ty, other)),
            }
        } else if ty.is::<bool>() {
            Value::Bool(deserialize_bool(node, ty)?)
        } else if ty.is::<i32>() {
            Value::I32(deserialize_integer(node, ty, |n| n as i32, |f| f as i32)?)
        } else if ty.is::<i64>() {
            Value::I64(deserialize_integer(node, ty, |n| n, |f| f as i64)?)
        } else if ty.is::<f64>() {
            Value::F64(deserialize_f64(node, ty)?)
        } else if ty.is::<f32>() {
            Value::F32(deserialize_f32(node, ty)?)
        } else if ty.is::<Type>() {
            return match node {
                Node::String(name) => Ok(registry.get_with_name(name).map(Value::Type)),
                other => Err(mismatch(ty, other)),
            };
        } else if ty.is::<SerializedList>() {
            match node {
                Node::String(text) => Value::List(SerializedList::from_text(text.clone())),
                Node::Array(array) => Value::List(SerializedList::from_tree(array.clone())),
                other => return Err(mismatch(ty, other)),
            }
        } else if ty.is::<SerializedMap>() {
            match node {
                Node::String(text) => Value::Map(SerializedMap::from_text(text.clone())),
                Node::Object(object) => Value::Map(SerializedMap::from_tree(object.clone())),
                other => return Err(mismatch(ty, other)),
            }
        } else if ty.is::<TypeWrapper>() {
            Value::Wrapper(Box::new(deserialize_wrapper(node, ty, registry)?))
        } else {
            return Err(SerialError::deserialize(ErrorKind::UnsupportedType(ty.path())));
        };
        Ok(Some(value))
    }
}

// -----------------------------------------------------------------------------
// Scalars

fn mismatch(ty: Type, found: &Node) -> SerialError {
    SerialError::deserialize(ErrorKind::TypeMismatch {
        expected: ty.path(),
        found: tree::kind_of(found).to_string(),
    })
}

fn parse_failure<E>(ty: Type, literal: &str, cause: E) -> SerialError
where
    E: core::error::Error + Send + Sync + 'static,
{
    SerialError::deserialize(ErrorKind::ParseFailure {
        expected: ty.path(),
        literal: literal.to_string(),
    })
    .with_cause(cause)
}

/// Integers parse exactly, surrounding whitespace included.
fn parse_integer<T>(ty: Type, literal: &str) -> Result<T>
where
    T: FromStr,
    T::Err: core::error::Error + Send + Sync + 'static,
{
    literal.parse().map_err(|e| parse_failure(ty, literal, e))
}

/// Decimal floats ignore surrounding whitespace. The special values are
/// spelled exactly `NaN` and `Infinity`, optionally signed.
fn parse_float<T>(ty: Type, literal: &str) -> Result<T>
where
    T: FromStr,
    T::Err: core::error::Error + Send + Sync + 'static,
{
    let trimmed = literal.trim();
    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    let special = ["inf", "infinity", "nan"]
        .iter()
        .any(|name| unsigned.eq_ignore_ascii_case(name));
    if special && unsigned != "Infinity" && unsigned != "NaN" {
        return Err(SerialError::deserialize(ErrorKind::ParseFailure {
            expected: ty.path(),
            literal: literal.to_string(),
        }));
    }
    trimmed.parse().map_err(|e| parse_failure(ty, literal, e))
}

fn deserialize_bool(node: &Node, ty: Type) -> Result<bool> {
    match node {
        Node::Bool(b) => Ok(*b),
        Node::String(s) if s == "true" => Ok(true),
        Node::String(s) if s == "false" => Ok(false),
        Node::String(s) => Err(SerialError::deserialize(ErrorKind::ParseFailure {
            expected: ty.path(),
            literal: s.clone(),
        })),
        other => Err(mismatch(ty, other)),
    }
}

fn deserialize_integer<T>(
    node: &Node,
    ty: Type,
    from_integral: fn(i64) -> T,
    from_fractional: fn(f64) -> T,
) -> Result<T>
where
    T: FromStr,
    T::Err: core::error::Error + Send + Sync + 'static,
{
    match node {
        Node::Number(n) => Ok(narrow(n, from_integral, from_fractional)),
        Node::String(s) => parse_integer(ty, s),
        other => Err(mismatch(ty, other)),
    }
}

fn narrow<T>(n: &Number, from_integral: fn(i64) -> T, from_fractional: fn(f64) -> T) -> T {
    if let Some(i) = n.as_i64() {
        from_integral(i)
    } else if let Some(u) = n.as_u64() {
        from_integral(u as i64)
    } else {
        from_fractional(n.as_f64().unwrap_or_default())
    }
}

fn deserialize_f64(node: &Node, ty: Type) -> Result<f64> {
    match node {
        Node::Number(n) => Ok(n.as_f64().unwrap_or_default()),
        Node::String(s) => match s.strip_prefix(bits::F64_PREFIX) {
            Some(digits) => bits::decode_f64(digits).map_err(|e| parse_failure(ty, s, e)),
            None => parse_float(ty, s),
        },
        other => Err(mismatch(ty, other)),
    }
}

fn deserialize_f32(node: &Node, ty: Type) -> Result<f32> {
    match node {
        Node::Number(n) => Ok(n.as_f64().unwrap_or_default() as f32),
        Node::String(s) => {
            if let Some(digits) = s.strip_prefix(bits::F32_PREFIX) {
                bits::decode_f32(digits).map_err(|e| parse_failure(ty, s, e))
            } else if let Some(digits) = s.strip_prefix(bits::F64_PREFIX) {
                bits::decode_f64(digits)
                    .map(|d| d as f32)
                    .map_err(|e| parse_failure(ty, s, e))
            } else {
                parse_float(ty, s)
            }
        }
        other => Err(mismatch(ty, other)),
    }
}

// -----------------------------------------------------------------------------
// Enums

fn deserialize_enum(node: &Node, ty: Type) -> Result<Value> {
    let printed;
    let name = match node {
        Node::String(s) => s.as_str(),
        other => {
            printed = tree::print(other);
            printed.as_str()
        }
    };
    EnumValue::from_name(ty, name)
        .map(Value::Enum)
        .ok_or_else(|| unknown_member(ty, name))
}

fn unknown_member(ty: Type, name: &str) -> SerialError {
    SerialError::deserialize(ErrorKind::UnknownEnumMember {
        enum_path: ty.path(),
        name: String::from(name),
    })
}

// -----------------------------------------------------------------------------
// Wrappers

fn serialize_wrapper(wrapper: &TypeWrapper, registry: &TypeRegistry) -> Result<Node> {
    let payload = crate::driver::serialize(wrapper.value(), registry)?;
    let tag = match wrapper.value_type() {
        Some(ty) => Node::String(ty.name().to_string()),
        None => Node::Null,
    };
    Ok(Node::Array(alloc::vec![payload, tag]))
}

fn deserialize_wrapper(node: &Node, ty: Type, registry: &TypeRegistry) -> Result<TypeWrapper> {
    let parsed;
    let array = match node {
        Node::Array(array) => array,
        Node::String(text) => {
            parsed = tree::parse_array(text)?;
            &parsed
        }
        other => return Err(mismatch(ty, other)),
    };
    let [payload, tag, ..] = array.as_slice() else {
        return Err(SerialError::deserialize(ErrorKind::TypeMismatch {
            expected: ty.path(),
            found: alloc::format!("an array of {} elements", array.len()),
        }));
    };

    let value = match crate::driver::deserialize(tag, Type::of::<Type>(), registry)? {
        Some(Value::Type(payload_type)) => {
            crate::driver::deserialize(payload, payload_type, registry)?
        }
        _ => None,
    };
    Ok(TypeWrapper::from_option(value))
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::BasicCodec;
    use crate::codec::Codec;
    use crate::error::ErrorKind;
    use crate::info::{Type, Typed};
    use crate::registry::TypeRegistry;
    use crate::tree::Node;
    use crate::value::{Native, Value};

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Phase {
        Solid,
        Liquid,
    }

    crate::impl_enumeration!(Phase { Solid, Liquid });

    fn decode<T: Typed>(node: Node) -> crate::Result<Option<Value>> {
        BasicCodec.deserialize(&node, T::ty(), &TypeRegistry::new())
    }

    fn encode(value: Value) -> Node {
        BasicCodec.serialize(&value, &TypeRegistry::new()).unwrap()
    }

    #[test]
    fn scalars() {
        assert_eq!(encode(Value::from("hi")), json!("hi"));
        assert_eq!(encode(Value::Bool(true)), json!(true));
        assert_eq!(encode(Value::I32(-4)), json!(-4));
        assert_eq!(encode(Value::I64(1 << 40)), json!(1i64 << 40));
        assert_eq!(encode(Value::F64(1.5)), json!("D3vu0000000000"));
        assert_eq!(encode(Value::F32(1.5)), json!("Fvs0000"));
    }

    #[test]
    fn bool_literals() {
        assert_eq!(decode::<bool>(json!("true")).unwrap(), Some(Value::Bool(true)));
        assert_eq!(decode::<bool>(json!(false)).unwrap(), Some(Value::Bool(false)));

        let err = decode::<bool>(json!("yes")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ParseFailure { .. }));
        let err = decode::<bool>(json!("TRUE")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ParseFailure { .. }));
    }

    #[test]
    fn integers() {
        assert_eq!(decode::<i32>(json!("42")).unwrap(), Some(Value::I32(42)));
        assert_eq!(decode::<i64>(json!(7)).unwrap(), Some(Value::I64(7)));

        // Integral sources wrap, fractional sources saturate.
        assert_eq!(decode::<i32>(json!(1i64 << 32)).unwrap(), Some(Value::I32(0)));
        assert_eq!(decode::<i32>(json!(1e10)).unwrap(), Some(Value::I32(i32::MAX)));
        assert_eq!(decode::<i32>(json!(2.9)).unwrap(), Some(Value::I32(2)));

        for literal in ["x1", " 42 ", "\t7\n", ""] {
            let err = decode::<i32>(json!(literal)).unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::ParseFailure { .. }));
            let err = decode::<i64>(json!(literal)).unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::ParseFailure { .. }));
        }
        let err = decode::<i64>(json!([1])).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn floats() {
        assert_eq!(decode::<f64>(json!("D3vu0000000000")).unwrap(), Some(Value::F64(1.5)));
        assert_eq!(decode::<f64>(json!("2.25")).unwrap(), Some(Value::F64(2.25)));
        assert_eq!(decode::<f64>(json!(0.5)).unwrap(), Some(Value::F64(0.5)));
        assert_eq!(decode::<f64>(json!("D-8000000000000")).unwrap(), Some(Value::F64(-0.0)));

        assert_eq!(decode::<f32>(json!("Fvs0000")).unwrap(), Some(Value::F32(1.5)));
        assert_eq!(decode::<f32>(json!("D3vu0000000000")).unwrap(), Some(Value::F32(1.5)));
        assert_eq!(decode::<f32>(json!("0.25")).unwrap(), Some(Value::F32(0.25)));

        let err = decode::<f64>(json!("Dzz")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ParseFailure { .. }));
    }

    #[test]
    fn decimal_float_literals() {
        assert_eq!(decode::<f64>(json!(" 2.5\n")).unwrap(), Some(Value::F64(2.5)));
        assert_eq!(decode::<f64>(json!("-Infinity")).unwrap(), Some(Value::F64(f64::NEG_INFINITY)));
        assert_eq!(decode::<f32>(json!("Infinity")).unwrap(), Some(Value::F32(f32::INFINITY)));
        assert!(matches!(
            decode::<f64>(json!("NaN")).unwrap(),
            Some(Value::F64(d)) if d.is_nan()
        ));

        for literal in ["nan", "NAN", "inf", "-inf", "infinity", "INFINITY", "+INF"] {
            let err = decode::<f64>(json!(literal)).unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::ParseFailure { .. }));
            let err = decode::<f32>(json!(literal)).unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::ParseFailure { .. }));
        }
    }

    #[test]
    fn strings_are_strict() {
        let err = decode::<String>(json!(5)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn enums() {
        assert_eq!(encode(Phase::Liquid.into_value()), json!("Liquid"));
        assert_eq!(decode::<Phase>(json!("Solid")).unwrap(), Some(Phase::Solid.into_value()));

        let err = decode::<Phase>(json!("Gas")).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::UnknownEnumMember {
                enum_path: "vc_serial::codec::basic::tests::Phase",
                name: "Gas".into(),
            }
        );
    }

    #[test]
    fn type_references() {
        assert_eq!(encode(Value::Type(Type::of::<i64>())), json!("i64"));
        assert_eq!(
            decode::<Type>(json!("i64")).unwrap(),
            Some(Value::Type(Type::of::<i64>()))
        );
        assert_eq!(decode::<Type>(json!("Nothing")).unwrap(), None);
    }

    #[test]
    fn short_wrapper_array() {
        let err = decode::<crate::TypeWrapper>(json!([1])).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn wrapper_with_unknown_tag_is_absent() {
        let value = decode::<crate::TypeWrapper>(json!([1, "Nothing"])).unwrap().unwrap();
        assert_eq!(value, Value::from(crate::TypeWrapper::absent()));
    }
}
