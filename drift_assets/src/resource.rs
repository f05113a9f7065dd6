use crate::ResourcePath;
use derivative::Derivative;
use std::sync::{Arc, OnceLock};

#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
struct ResourceInner<T> {
    path: ResourcePath,
    #[derivative(Debug = "ignore")]
    value: OnceLock<Arc<T>>,
}

/// Named, typed handle to a decoded asset
///
/// Clones share the same slot. The value is written at most once, so validity never reverts;
/// unloading drops the provider's copy instead of clearing it.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub struct Resource<T> {
    inner: Arc<ResourceInner<T>>,
}

impl<T> Resource<T> {
    pub fn new(path: ResourcePath) -> Self {
        Self {
            inner: Arc::new(ResourceInner {
                path,
                value: OnceLock::new(),
            }),
        }
    }

    /// A resource that is valid from the start
    pub fn with_value(path: ResourcePath, value: T) -> Self {
        let resource = Self::new(path);
        resource.resolve(value);
        resource
    }

    pub fn path(&self) -> &ResourcePath {
        &self.inner.path
    }

    pub fn value(&self) -> Option<Arc<T>> {
        self.inner.value.get().cloned()
    }

    pub fn is_valid(&self) -> bool {
        self.inner.value.get().is_some()
    }

    /// Stores the decoded value. Returns `false` if the resource was already resolved.
    pub fn resolve(&self, value: T) -> bool {
        let resolved = self.inner.value.set(Arc::new(value)).is_ok();
        if !resolved {
            tracing::warn!("Resource {} already holds a value", self.inner.path);
        }
        resolved
    }

    /// True if both handles refer to the same slot
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
