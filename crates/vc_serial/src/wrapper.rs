use crate::info::{Type, TypePath, Typed};
use crate::value::Value;

/// A value paired with a tag for its runtime type.
///
/// Serialized as the two-element array `[payload, short_type_name]`, so the
/// exact type survives the text boundary even where the static type is
/// [`Type::any`], e.g. the elements of a heterogeneous list.
///
/// # Examples
///
/// ```
/// use vc_serial::{TypeRegistry, TypeWrapper, Value, Type};
///
/// let registry = TypeRegistry::new();
/// let wrapped = Value::from(TypeWrapper::new(Value::I64(7)));
///
/// let node = vc_serial::serialize(Some(&wrapped), &registry).unwrap();
/// assert_eq!(node.to_string(), r#"[7,"i64"]"#);
///
/// let back = vc_serial::deserialize(&node, Type::of::<TypeWrapper>(), &registry).unwrap();
/// assert_eq!(back, Some(wrapped));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeWrapper {
    value: Option<Value>,
}

impl TypeWrapper {
    #[inline]
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }

    /// A wrapper holding an absent value.
    #[inline]
    pub const fn absent() -> Self {
        Self { value: None }
    }

    #[inline]
    pub const fn from_option(value: Option<Value>) -> Self {
        Self { value }
    }

    #[inline]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    #[inline]
    pub fn into_inner(self) -> Option<Value> {
        self.value
    }

    /// The runtime type of the wrapped value.
    #[inline]
    pub fn value_type(&self) -> Option<Type> {
        self.value.as_ref().map(Value::ty)
    }
}

impl TypePath for TypeWrapper {
    fn type_path() -> &'static str {
        "vc_serial::wrapper::TypeWrapper"
    }

    fn type_name() -> &'static str {
        "TypeWrapper"
    }
}

impl Typed for TypeWrapper {
    fn ty() -> Type {
        Type::plain::<Self>()
    }
}
