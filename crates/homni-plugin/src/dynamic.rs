//! Dynamic module resolver using `libloading` (feature-gated).
//!
//! Shared libraries must export
//! `extern "C" fn homni_plugin_create() -> *mut Box<dyn PluginModule>`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;

use crate::error::PluginError;
use crate::module::PluginModule;
use crate::resolver::ModuleResolver;

/// Name of the constructor symbol looked up in each library.
pub const CREATE_SYMBOL: &[u8] = b"homni_plugin_create";

/// Type of the constructor exported by dynamic plugins.
pub type CreateModuleFn = unsafe extern "C" fn() -> *mut Box<dyn PluginModule>;

/// Resolves entry points to shared libraries under a base directory.
pub struct DynamicModuleResolver {
    /// Relative locators are resolved against this directory.
    base_dir: PathBuf,
    /// Loaded libraries (kept alive for the lifetime of the resolver).
    libraries: Mutex<Vec<libloading::Library>>,
}

impl DynamicModuleResolver {
    /// Creates a resolver rooted at `base_dir`.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            libraries: Mutex::new(Vec::new()),
        }
    }

    fn library_path(&self, locator: &str) -> PathBuf {
        let path = Path::new(locator);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Loads a module from the given shared library path.
    ///
    /// # Safety
    /// This function loads arbitrary code from a shared library.
    /// Only load trusted plugins.
    unsafe fn load_from_path(&self, path: &Path) -> Result<Arc<dyn PluginModule>, PluginError> {
        let locator = path.display().to_string();
        let load_error = |reason: String| PluginError::ModuleLoad {
            locator: locator.clone(),
            reason,
        };

        let lib = unsafe { libloading::Library::new(path) }
            .map_err(|e| load_error(format!("cannot open library: {e}")))?;

        let module = {
            let create_fn: libloading::Symbol<CreateModuleFn> = unsafe { lib.get(CREATE_SYMBOL) }
                .map_err(|e| load_error(format!("missing 'homni_plugin_create' symbol: {e}")))?;

            let raw = unsafe { create_fn() };
            if raw.is_null() {
                return Err(load_error("constructor returned null".to_string()));
            }
            let boxed: Box<dyn PluginModule> = *unsafe { Box::from_raw(raw) };
            Arc::<dyn PluginModule>::from(boxed)
        };

        info!(path = %path.display(), "Dynamic plugin module loaded");

        let mut libraries = match self.libraries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        libraries.push(lib);

        Ok(module)
    }

    /// Number of libraries kept open.
    pub fn loaded_count(&self) -> usize {
        match self.libraries.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

impl std::fmt::Debug for DynamicModuleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicModuleResolver")
            .field("base_dir", &self.base_dir)
            .field("loaded_count", &self.loaded_count())
            .finish()
    }
}

#[async_trait]
impl ModuleResolver for DynamicModuleResolver {
    async fn load_module(&self, locator: &str) -> Result<Arc<dyn PluginModule>, PluginError> {
        let path = self.library_path(locator);
        if !path.exists() {
            return Err(PluginError::ModuleNotFound {
                locator: locator.to_string(),
            });
        }
        // SAFETY: only manifests from the trusted store reach this point.
        unsafe { self.load_from_path(&path) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("homni-dyn-{tag}-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_missing_library_is_not_found() {
        let resolver = DynamicModuleResolver::new(scratch_dir("missing"));
        let err = resolver.load_module("libcrm.so").await.unwrap_err();
        assert!(matches!(err, PluginError::ModuleNotFound { ref locator } if locator == "libcrm.so"));
        assert_eq!(resolver.loaded_count(), 0);
    }

    #[tokio::test]
    async fn test_non_library_file_fails_to_load() {
        let dir = scratch_dir("garbage");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("libbroken.so"), b"not a shared object")
            .await
            .unwrap();

        let resolver = DynamicModuleResolver::new(&dir);
        let err = resolver.load_module("libbroken.so").await.unwrap_err();
        assert!(matches!(err, PluginError::ModuleLoad { .. }));
        assert_eq!(resolver.loaded_count(), 0);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[test]
    fn test_library_path_resolution() {
        let resolver = DynamicModuleResolver::new("/opt/homni/plugins");
        assert_eq!(
            resolver.library_path("libcrm.so"),
            PathBuf::from("/opt/homni/plugins/libcrm.so")
        );
        assert_eq!(
            resolver.library_path("/usr/lib/libcrm.so"),
            PathBuf::from("/usr/lib/libcrm.so")
        );
    }
}
