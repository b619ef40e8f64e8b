//! Host container lookup keys.

use std::any::TypeId;
use std::hash::{Hash, Hasher};

/// Key for host service storage and lookup.
///
/// Concrete types are keyed by `TypeId`; trait objects, which are resolved
/// through `Arc<dyn Trait>`, are keyed by their type name. Keyed services do
/// not get a host key per string key: every keyed registration of `T` lives
/// behind the single `Key::Type` of its `KeyedServices<T>` registry.
///
/// # Examples
///
/// ```rust
/// use keyed_di::{Key, key_of_type};
/// use std::any::TypeId;
///
/// let key = key_of_type::<u32>();
/// assert_eq!(key, Key::Type(TypeId::of::<u32>(), "u32"));
/// assert_eq!(key.display_name(), "u32");
///
/// let trait_key = Key::Trait("dyn core::fmt::Debug");
/// assert_eq!(trait_key.display_name(), "dyn core::fmt::Debug");
/// ```
#[derive(Debug, Clone)]
pub enum Key {
    /// Concrete type key with TypeId and name for diagnostics
    Type(TypeId, &'static str),
    /// Trait object key, identified by the trait object's type name
    Trait(&'static str),
}

impl Key {
    /// Returns the type or trait name used in error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name) => name,
            Key::Trait(name) => name,
        }
    }
}

// TypeId alone identifies a concrete type; the name is for diagnostics only.
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::Trait(a), Key::Trait(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    #[inline(always)]
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::Trait(name) => {
                1u8.hash(state);
                name.hash(state);
            }
        }
    }
}

/// Builds the host key of a concrete type.
#[inline(always)]
pub fn key_of_type<T: 'static>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}

/// Builds the host key of a trait object type such as `dyn Logger`.
#[inline(always)]
pub fn key_of_trait<T: ?Sized + 'static>() -> Key {
    Key::Trait(std::any::type_name::<T>())
}
