//! Port Values
//!
//! Values travelling between nodes are type-erased. A [`Value`] is a cheap,
//! clonable handle around any `Send + Sync` payload; receivers downcast to
//! the concrete type they expect.
//!
//! Cloning a value clones the handle, not the payload, so fanning one result
//! out to many connections costs one reference count bump per connection.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// A type-erased value held by an input port or emitted by an output.
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    /// Wrap a payload.
    pub fn new<T>(payload: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            inner: Arc::new(payload),
            type_name: type_name::<T>(),
        }
    }

    /// Borrow the payload as `T`, if that is its concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Check whether the payload is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Name of the payload's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether two handles share the same payload allocation.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

macro_rules! impl_from_payload {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(payload: $ty) -> Self {
                    Value::new(payload)
                }
            }
        )*
    };
}

impl_from_payload!(f64, f32, i64, i32, u64, u32, bool, String);

impl From<&str> for Value {
    fn from(payload: &str) -> Self {
        Value::new(payload.to_string())
    }
}
