//! Cache key derivation.
//!
//! Two layers live here:
//!
//! - [`KeyStrategy`] turns a dynamic [`CallArgs`] list into a [`CacheKey`] for
//!   [`Memoized`](crate::Memoized).
//! - [`CacheableKey`] turns a typed value into a key string for code generated
//!   by the `#[memoize]` attribute.

use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::args::{Arg, CallArgs};
use crate::error::{ArgPosition, KeyDerivationError};

/// Trait for types that can produce a cache key string.
///
/// Blanket-implemented through `Debug`, which makes the generated keys a
/// value conversion: two values with the same `Debug` output share a key.
pub trait CacheableKey {
    fn to_cache_key(&self) -> String;
}

impl<T> CacheableKey for T
where
    T: Debug + ?Sized,
{
    fn to_cache_key(&self) -> String {
        format!("{:?}", self)
    }
}

/// Conversion function used by [`KeyStrategy::Convert`].
pub type ConvertFn = dyn Fn(&dyn Debug) -> Result<String, KeyDerivationError> + Send + Sync;

/// How call arguments become a cache key.
///
/// # Variants
///
/// * `Identity` (default) - every argument is keyed by the address of its
///   shared allocation. Fast and never fails, but two equal values built
///   separately are different keys. Callers that construct fresh arguments for
///   every call therefore never hit.
/// * `Convert` - a conversion function is applied to the positional arguments
///   as one group, then to the name and the value of every named argument.
///   Arguments with equal conversions collide, even when they are not equal.
///
/// Named arguments are always visited sorted by name, so their insertion order
/// never changes the key.
///
/// # Examples
///
/// ```
/// use memoria_core::{CallArgs, KeyStrategy};
///
/// let strategy = KeyStrategy::debug();
/// let a = strategy.derive(&CallArgs::new().arg(vec![1, 2])).unwrap();
/// let b = strategy.derive(&CallArgs::new().arg(vec![1, 2])).unwrap();
/// assert_eq!(a, b);
///
/// let identity = KeyStrategy::Identity;
/// let a = identity.derive(&CallArgs::new().arg(vec![1, 2])).unwrap();
/// let b = identity.derive(&CallArgs::new().arg(vec![1, 2])).unwrap();
/// assert_ne!(a, b);
/// ```
#[derive(Clone, Default)]
pub enum KeyStrategy {
    #[default]
    Identity,
    Convert(Arc<ConvertFn>),
}

impl KeyStrategy {
    /// Value conversion through each argument's `Debug` representation.
    pub fn debug() -> Self {
        Self::convert(|value| Ok(format!("{:?}", value)))
    }

    /// Value conversion through a custom, possibly failing, function.
    pub fn convert<F>(convert: F) -> Self
    where
        F: Fn(&dyn Debug) -> Result<String, KeyDerivationError> + Send + Sync + 'static,
    {
        KeyStrategy::Convert(Arc::new(convert))
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, KeyStrategy::Identity)
    }

    /// Derives the cache key for one call. Arguments are only read.
    pub fn derive(&self, args: &CallArgs) -> Result<CacheKey, KeyDerivationError> {
        let mut named: Vec<&(String, Arg)> = args.named_args().iter().collect();
        named.sort_by(|a, b| a.0.cmp(&b.0));

        let mut parts = Vec::with_capacity(args.positional().len() + named.len() * 2);
        match self {
            KeyStrategy::Identity => {
                parts.extend(args.positional().iter().cloned().map(KeyPart::Identity));
                for (name, value) in named {
                    parts.push(KeyPart::Name(name.clone()));
                    parts.push(KeyPart::Identity(Arc::clone(value)));
                }
            }
            KeyStrategy::Convert(convert) => {
                let positional = convert(&args.positional())
                    .map_err(|e| e.at(ArgPosition::Positional))?;
                parts.push(KeyPart::Text(positional));
                for (name, value) in named {
                    let converted_name =
                        convert(name).map_err(|e| e.at(ArgPosition::Name(name.clone())))?;
                    let converted_value =
                        convert(value).map_err(|e| e.at(ArgPosition::Named(name.clone())))?;
                    parts.push(KeyPart::Text(converted_name));
                    parts.push(KeyPart::Text(converted_value));
                }
            }
        }

        Ok(CacheKey(parts))
    }
}

impl Debug for KeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyStrategy::Identity => f.write_str("Identity"),
            KeyStrategy::Convert(_) => f.write_str("Convert(..)"),
        }
    }
}

/// Derived key of one call.
///
/// Identity parts keep their argument alive, so the address they compare by
/// cannot be handed to another object while the key is cached.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(Vec<KeyPart>);

impl CacheKey {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone)]
enum KeyPart {
    Identity(Arg),
    Name(String),
    Text(String),
}

impl KeyPart {
    fn address(arg: &Arg) -> usize {
        Arc::as_ptr(arg).cast::<()>() as usize
    }
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (KeyPart::Identity(a), KeyPart::Identity(b)) => Self::address(a) == Self::address(b),
            (KeyPart::Name(a), KeyPart::Name(b)) => a == b,
            (KeyPart::Text(a), KeyPart::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for KeyPart {}

impl Hash for KeyPart {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            KeyPart::Identity(arg) => {
                state.write_u8(0);
                Self::address(arg).hash(state);
            }
            KeyPart::Name(name) => {
                state.write_u8(1);
                name.hash(state);
            }
            KeyPart::Text(text) => {
                state.write_u8(2);
                text.hash(state);
            }
        }
    }
}

impl Debug for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Identity(arg) => write!(f, "@{:#x}", Self::address(arg)),
            KeyPart::Name(name) => write!(f, "{}=", name),
            KeyPart::Text(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_same_object_same_key() {
        let list: Arg = Arc::new(vec![1, 2, 3]);
        let args = CallArgs::new().arg_shared(Arc::clone(&list));

        let k1 = KeyStrategy::Identity.derive(&args).unwrap();
        let k2 = KeyStrategy::Identity.derive(&args.clone()).unwrap();
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_identity_equal_values_distinct_keys() {
        let k1 = KeyStrategy::Identity
            .derive(&CallArgs::new().arg(vec![1, 2, 3]))
            .unwrap();
        let k2 = KeyStrategy::Identity
            .derive(&CallArgs::new().arg(vec![1, 2, 3]))
            .unwrap();
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_identity_named_order_independent() {
        let one: Arg = Arc::new(1_i32);
        let two: Arg = Arc::new(2_i32);

        let ab = CallArgs::new()
            .named_shared("a", Arc::clone(&one))
            .named_shared("b", Arc::clone(&two));
        let ba = CallArgs::new()
            .named_shared("b", Arc::clone(&two))
            .named_shared("a", Arc::clone(&one));

        assert_eq!(
            KeyStrategy::Identity.derive(&ab).unwrap(),
            KeyStrategy::Identity.derive(&ba).unwrap()
        );
    }

    #[test]
    fn test_identity_named_names_matter() {
        let one: Arg = Arc::new(1_i32);
        let a = CallArgs::new().named_shared("a", Arc::clone(&one));
        let b = CallArgs::new().named_shared("b", Arc::clone(&one));
        assert_ne!(
            KeyStrategy::Identity.derive(&a).unwrap(),
            KeyStrategy::Identity.derive(&b).unwrap()
        );
    }

    #[test]
    fn test_identity_key_keeps_argument_alive() {
        let list: Arg = Arc::new(vec![1]);
        let key = KeyStrategy::Identity
            .derive(&CallArgs::new().arg_shared(Arc::clone(&list)))
            .unwrap();
        assert_eq!(Arc::strong_count(&list), 2);
        drop(key);
        assert_eq!(Arc::strong_count(&list), 1);
    }

    #[test]
    fn test_debug_strategy_named_order_independent() {
        let strategy = KeyStrategy::debug();
        let ab = CallArgs::new().arg("x").named("a", 1).named("b", 2);
        let ba = CallArgs::new().arg("x").named("b", 2).named("a", 1);
        assert_eq!(strategy.derive(&ab).unwrap(), strategy.derive(&ba).unwrap());
    }

    #[test]
    fn test_debug_strategy_is_lossy() {
        // i32 and i64 print the same, so they share a key
        let strategy = KeyStrategy::debug();
        let small = strategy.derive(&CallArgs::new().arg(5_i32)).unwrap();
        let wide = strategy.derive(&CallArgs::new().arg(5_i64)).unwrap();
        assert_eq!(small, wide);
    }

    #[test]
    fn test_debug_strategy_distinguishes_positional_from_named() {
        let strategy = KeyStrategy::debug();
        let positional = strategy.derive(&CallArgs::new().arg(1)).unwrap();
        let named = strategy.derive(&CallArgs::new().named("a", 1)).unwrap();
        assert_ne!(positional, named);
    }

    #[test]
    fn test_convert_failure_reports_position() {
        let strategy = KeyStrategy::convert(|value| {
            let text = format!("{:?}", value);
            if text.len() > 8 {
                Err(KeyDerivationError::new("representation too long"))
            } else {
                Ok(text)
            }
        });

        assert!(strategy.derive(&CallArgs::new().arg(1)).is_ok());

        let err = strategy
            .derive(&CallArgs::new().named("p", "a rather long string"))
            .unwrap_err();
        assert_eq!(err.position, ArgPosition::Named("p".to_string()));

        let err = strategy
            .derive(&CallArgs::new().arg(1).arg(2).arg(3))
            .unwrap_err();
        assert_eq!(err.position, ArgPosition::Positional);
    }

    #[test]
    fn test_empty_args_share_key() {
        let k1 = KeyStrategy::Identity.derive(&CallArgs::new()).unwrap();
        let k2 = KeyStrategy::Identity.derive(&CallArgs::new()).unwrap();
        assert_eq!(k1, k2);
        assert!(k1.is_empty());
    }

    #[test]
    fn test_cacheable_key_uses_debug() {
        assert_eq!(42.to_cache_key(), "42");
        assert_eq!("hi".to_cache_key(), "\"hi\"");
        assert_eq!(vec![1, 2].to_cache_key(), "[1, 2]");
    }
}
