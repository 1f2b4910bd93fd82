//! Cache Policy Module
//!
//! Declarative policy shared by the memoization wrappers: which
//! namespace results live in, how long they live, and how cache keys
//! are derived from call arguments.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::cache::DEFAULT_NAMESPACE;
use crate::keys::generate_key;

// == Cache Policy ==
/// Where and for how long a wrapper stores results.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    /// Namespace the wrapper reads and writes
    pub namespace: String,
    /// Time to live for stored results; `None` means never expires
    pub ttl: Option<Duration>,
}

impl CachePolicy {
    /// Creates a policy for the given namespace with no TTL.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ttl: None,
        }
    }

    /// Sets the time to live for stored results.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

// == Key Derivation ==
/// How a wrapper turns call arguments into a cache key.
pub enum KeySpec<A> {
    /// Every call uses the same fixed key
    Fixed(String),
    /// Caller-supplied derivation over the arguments
    Generator(Box<dyn Fn(&A) -> String + Send + Sync>),
    /// Hash of a method identity plus the serialized arguments
    Method(String),
}

impl<A> KeySpec<A> {
    /// Uses one fixed key for every call.
    pub fn fixed(key: impl Into<String>) -> Self {
        KeySpec::Fixed(key.into())
    }

    /// Derives the key with a caller-supplied function.
    pub fn generator(generator: impl Fn(&A) -> String + Send + Sync + 'static) -> Self {
        KeySpec::Generator(Box::new(generator))
    }

    /// Derives the key by hashing a method identity with the arguments.
    pub fn method(name: impl Into<String>) -> Self {
        KeySpec::Method(name.into())
    }
}

impl<A: Serialize> KeySpec<A> {
    /// Derives the cache key for one call.
    pub fn derive(&self, args: &A) -> String {
        match self {
            KeySpec::Fixed(key) => key.clone(),
            KeySpec::Generator(generator) => generator(args),
            KeySpec::Method(name) => method_key(name, args),
        }
    }
}

/// Default key derivation: hash of the method identity followed by the
/// individual arguments. Tuple or vector arguments contribute one part
/// each, so `("a", 1)` and `("a1",)` hash differently.
fn method_key<A: Serialize>(name: &str, args: &A) -> String {
    let mut parts = vec![Value::from(name)];
    match serde_json::to_value(args) {
        Ok(Value::Array(list)) => parts.extend(list),
        Ok(value) => parts.push(value),
        // Arguments that cannot serialize collapse to one null part
        Err(_) => parts.push(Value::Null),
    }
    generate_key(&parts)
}
