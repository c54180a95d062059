//! The codec table.
//!
//! - [`TypeRegistry`]: binds [`Codec`](crate::codec::Codec)s to native types
//!   and resolves type names.
//! - [`TypeRegistryArc`]: a registry shared between threads.
//!
//! ## auto_register
//!
//! See [`TypeRegistry::auto_register`] .
//!
//! We use the [`inventory`] crate for static registration. Not every
//! platform supports it; where it is unsupported, `auto_register` returns
//! `false` without registering anything.

// -----------------------------------------------------------------------------
// Modules

mod type_registry;

#[cfg(feature = "auto_register")]
mod auto_register;

// -----------------------------------------------------------------------------
// Exports

pub use type_registry::{TypeRegistry, TypeRegistryArc};

#[cfg(feature = "auto_register")]
pub use auto_register::CodecRegistration;

/// Does nothing without the `auto_register` feature.
#[cfg(not(feature = "auto_register"))]
#[macro_export]
macro_rules! submit_codec {
    ($register:expr $(,)?) => {};
}
