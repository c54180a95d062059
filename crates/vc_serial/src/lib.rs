#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod hash;
mod trace;

pub mod codec;
pub mod driver;
pub mod error;
pub mod info;
pub mod list;
pub mod map;
pub mod registry;
pub mod tree;
pub mod value;
pub mod wrapper;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use driver::{deserialize, deserialize_as, serialize};
pub use error::{ErrorKind, Operation, Result, SerialError};
pub use info::{Enumeration, Type, TypeKind, TypePath, Typed};
pub use list::SerializedList;
pub use map::SerializedMap;
pub use registry::{TypeRegistry, TypeRegistryArc};
pub use tree::Node;
pub use value::{EnumValue, Native, Opaque, Value};
pub use wrapper::TypeWrapper;
