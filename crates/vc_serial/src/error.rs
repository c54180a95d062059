use alloc::boxed::Box;
use alloc::string::String;
use core::error::Error;
use core::fmt;

use thiserror::Error;

// -----------------------------------------------------------------------------
// Operation

/// The operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Serialize,
    Deserialize,
    /// Binding a codec in a [`TypeRegistry`](crate::TypeRegistry).
    Register,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Serialize => f.write_str("serialize"),
            Operation::Deserialize => f.write_str("deserialize"),
            Operation::Register => f.write_str("register"),
        }
    }
}

// -----------------------------------------------------------------------------
// ErrorKind

/// The specific condition behind a [`SerialError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    #[error("no codec is registered for `{0}`")]
    NoCodec(&'static str),

    #[error("{types} target types given for {elements} elements")]
    ArityMismatch { types: usize, elements: usize },

    #[error("cannot convert {found} to `{expected}`")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("cannot parse {literal:?} as `{expected}`")]
    ParseFailure {
        expected: &'static str,
        literal: String,
    },

    #[error("`{name}` is not a member of `{enum_path}`")]
    UnknownEnumMember {
        enum_path: &'static str,
        name: String,
    },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("unsupported type `{0}`")]
    UnsupportedType(&'static str),

    #[error("type name `{name}` is already bound to `{bound}`")]
    DuplicateName {
        name: &'static str,
        bound: &'static str,
    },
}

// -----------------------------------------------------------------------------
// SerialError

/// The single error type of the serialization engine.
///
/// Carries the [`Operation`], the [`ErrorKind`], a rendering of the offending
/// value or node, the involved type and an optional underlying cause.
#[derive(Debug, Error)]
#[error("failed to {op}{}: {kind}{}", Context(.subject, .ty), Trace(.trace))]
pub struct SerialError {
    op: Operation,
    kind: ErrorKind,
    subject: Option<String>,
    ty: Option<&'static str>,
    trace: Option<String>,
    #[source]
    cause: Option<Box<dyn Error + Send + Sync + 'static>>,
}

/// Result alias used throughout the crate.
pub type Result<T, E = SerialError> = core::result::Result<T, E>;

impl SerialError {
    #[inline]
    pub fn new(op: Operation, kind: ErrorKind) -> Self {
        Self {
            op,
            kind,
            subject: None,
            ty: None,
            trace: None,
            cause: None,
        }
    }

    #[inline]
    pub fn serialize(kind: ErrorKind) -> Self {
        Self::new(Operation::Serialize, kind)
    }

    #[inline]
    pub fn deserialize(kind: ErrorKind) -> Self {
        Self::new(Operation::Deserialize, kind)
    }

    /// Attaches a rendering of the offending value or node.
    pub fn with_subject(mut self, subject: impl fmt::Display) -> Self {
        self.subject = Some(alloc::format!("{subject}"));
        self
    }

    /// Attaches the path of the involved type.
    pub fn with_type(mut self, ty: &'static str) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Attaches the underlying cause.
    pub fn with_cause(mut self, cause: impl Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Fills the subject and the type if the error does not carry them yet.
    pub(crate) fn or_context(
        mut self,
        subject: impl FnOnce() -> String,
        ty: &'static str,
    ) -> Self {
        if self.subject.is_none() {
            self.subject = Some(subject());
        }
        if self.ty.is_none() {
            self.ty = Some(ty);
        }
        self
    }

    pub(crate) fn or_trace(mut self, trace: impl FnOnce() -> Option<String>) -> Self {
        if self.trace.is_none() {
            self.trace = trace();
        }
        self
    }

    #[inline]
    pub fn operation(&self) -> Operation {
        self.op
    }

    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    #[inline]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    #[inline]
    pub fn type_path(&self) -> Option<&'static str> {
        self.ty
    }

    /// The stack of type paths being converted when the error was raised.
    ///
    /// Only recorded with the `debug` feature in debug builds.
    #[inline]
    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }
}

struct Context<'a>(&'a Option<String>, &'a Option<&'static str>);

impl fmt::Display for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(subject) = self.0 {
            write!(f, " {subject}")?;
        }
        if let Some(ty) = self.1 {
            write!(f, " (`{ty}`)")?;
        }
        Ok(())
    }
}

struct Trace<'a>(&'a Option<String>);

impl fmt::Display for Trace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(trace) => write!(f, " (stack: {trace})"),
            None => Ok(()),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
