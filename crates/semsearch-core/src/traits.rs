//! Core traits for semsearch configuration.
//!
//! [`ConfigProvider`] abstracts where an application keeps its data: the
//! embedding store file and the content export the CLI reads. The engine
//! itself is configured through plain structs; this trait only resolves
//! locations.

use std::path::PathBuf;

use crate::Result;

/// Trait for application-level configuration.
///
/// # Bounds
///
/// - `Send + Sync`: Configuration must be shareable across threads
/// - `Clone`: Configuration can be duplicated for passing to subsystems
/// - `'static`: Configuration lifetime is not borrowed
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use semsearch_core::traits::ConfigProvider;
/// use semsearch_core::Result;
///
/// #[derive(Clone)]
/// struct BlogConfig {
///     data_dir: PathBuf,
/// }
///
/// impl ConfigProvider for BlogConfig {
///     fn project_name(&self) -> &str {
///         "blog"
///     }
///
///     fn base_path(&self) -> Result<PathBuf> {
///         Ok(self.data_dir.clone())
///     }
///
///     fn content_path(&self) -> Result<PathBuf> {
///         Ok(self.data_dir.join("content.json"))
///     }
/// }
///
/// let config = BlogConfig { data_dir: PathBuf::from("/srv/blog") };
/// assert_eq!(
///     config.store_path().unwrap(),
///     PathBuf::from("/srv/blog/embeddings.redb")
/// );
/// ```
pub trait ConfigProvider: Send + Sync + Clone + 'static {
    /// The project name, used for env var prefixes and default paths.
    fn project_name(&self) -> &str;

    /// Base path for all project data.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be determined.
    fn base_path(&self) -> Result<PathBuf>;

    /// Path of the persisted embedding store.
    ///
    /// Defaults to `embeddings.redb` under [`base_path`](Self::base_path).
    fn store_path(&self) -> Result<PathBuf> {
        Ok(self.base_path()?.join("embeddings.redb"))
    }

    /// Path of the content export consumed as the source of records.
    fn content_path(&self) -> Result<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct TestConfig {
        name: String,
        base: PathBuf,
        store: Option<PathBuf>,
    }

    impl ConfigProvider for TestConfig {
        fn project_name(&self) -> &str {
            &self.name
        }

        fn base_path(&self) -> Result<PathBuf> {
            Ok(self.base.clone())
        }

        fn store_path(&self) -> Result<PathBuf> {
            match &self.store {
                Some(p) => Ok(p.clone()),
                None => Ok(self.base_path()?.join("embeddings.redb")),
            }
        }

        fn content_path(&self) -> Result<PathBuf> {
            Ok(self.base.join("content.json"))
        }
    }

    fn test_config() -> TestConfig {
        TestConfig {
            name: "test-project".into(),
            base: PathBuf::from("/data"),
            store: None,
        }
    }

    #[test]
    fn test_config_provider_project_name() {
        assert_eq!(test_config().project_name(), "test-project");
    }

    #[test]
    fn test_config_provider_default_store_path() {
        let path = test_config().store_path().unwrap();
        assert_eq!(path, PathBuf::from("/data/embeddings.redb"));
    }

    #[test]
    fn test_config_provider_store_path_override() {
        let config = TestConfig {
            store: Some(PathBuf::from("/var/lib/vectors.redb")),
            ..test_config()
        };
        assert_eq!(
            config.store_path().unwrap(),
            PathBuf::from("/var/lib/vectors.redb")
        );
    }

    #[test]
    fn test_config_provider_content_path() {
        let path = test_config().content_path().unwrap();
        assert_eq!(path, PathBuf::from("/data/content.json"));
    }

    #[test]
    fn test_config_provider_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TestConfig>();
    }
}
