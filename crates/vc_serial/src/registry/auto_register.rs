//! Static registration through [`inventory`].

use super::TypeRegistry;

/// A registration function collected by [`submit_codec!`](crate::submit_codec).
pub struct CodecRegistration(pub fn(&mut TypeRegistry));

inventory::collect!(CodecRegistration);

// Only runs if static registration works on this platform.
inventory::submit! {
    CodecRegistration(TypeRegistry::mark_auto_registered)
}

pub(super) fn register_submitted(registry: &mut TypeRegistry) {
    let mut count = 0usize;
    for registration in inventory::iter::<CodecRegistration> {
        (registration.0)(registry);
        count += 1;
    }
    log::debug!("applied {count} static codec registrations");
}

/// Submits a registration function run by
/// [`TypeRegistry::auto_register`].
///
/// The argument is a `fn(&mut TypeRegistry)`, usually a closure.
///
/// ```no_run
/// # use vc_serial::TypeRegistry;
/// #[derive(Clone, Copy, Debug, PartialEq)]
/// enum Tone { Major, Minor }
///
/// vc_serial::impl_enumeration!(Tone { Major, Minor });
/// vc_serial::submit_codec!(|registry| registry.register_enum::<Tone>());
/// # fn main() {}
/// ```
#[macro_export]
macro_rules! submit_codec {
    ($register:expr $(,)?) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::registry::CodecRegistration($register)
        }
    };
}
