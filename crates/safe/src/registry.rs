//! Version registry: maps envelope version numbers to transforms.

use std::{collections::BTreeMap, fmt, sync::LazyLock};

use crate::{
    chacha20::ChaCha20Poly1305Transform,
    error::{Result, SafeError},
    traits::SafeTransform,
};

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::builtin);

/// Immutable mapping from version number to [`SafeTransform`].
///
/// There is no way to add entries after construction. New versions are added
/// by shipping a new transform in [`Registry::builtin`].
pub struct Registry {
    transforms: BTreeMap<u32, Box<dyn SafeTransform>>,
}

impl Registry {
    /// Process-wide registry with every built-in version.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Every built-in version.
    #[must_use]
    pub fn builtin() -> Self {
        let transforms: BTreeMap<u32, Box<dyn SafeTransform>> =
            BTreeMap::from([(ChaCha20Poly1305Transform.version(), boxed(ChaCha20Poly1305Transform))]);
        Self { transforms }
    }

    /// Registry without any transform.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            transforms: BTreeMap::new(),
        }
    }

    /// Build a registry from explicit transforms, keyed by their own version.
    pub fn from_transforms(
        transforms: impl IntoIterator<Item = Box<dyn SafeTransform>>,
    ) -> Result<Self> {
        let mut map = BTreeMap::new();
        for transform in transforms {
            let version = transform.version();
            if map.insert(version, transform).is_some() {
                return Err(SafeError::DuplicateVersion(version));
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(versions = ?map.keys().collect::<Vec<_>>(), "safe registry built");

        Ok(Self { transforms: map })
    }

    /// Highest registered version and its transform.
    pub fn latest(&self) -> Result<(u32, &dyn SafeTransform)> {
        self.transforms
            .last_key_value()
            .map(|(version, transform)| (*version, transform.as_ref()))
            .ok_or(SafeError::NoRegisteredVersion)
    }

    /// Transform for `version`.
    pub fn lookup(&self, version: u32) -> Result<&dyn SafeTransform> {
        self.transforms
            .get(&version)
            .map(|transform| transform.as_ref())
            .ok_or_else(|| SafeError::unknown_version(version))
    }

    /// Registered versions in ascending order.
    pub fn versions(&self) -> impl Iterator<Item = u32> + '_ {
        self.transforms.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.transforms.iter().map(|(v, t)| (v, t.name())))
            .finish()
    }
}

fn boxed(transform: impl SafeTransform + 'static) -> Box<dyn SafeTransform> {
    Box::new(transform)
}
