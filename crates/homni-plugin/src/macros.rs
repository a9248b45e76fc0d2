//! Convenience macros for plugin development.

/// Macro for building a `PluginManifest`.
///
/// # Example
/// ```rust,ignore
/// let manifest = plugin_manifest!(
///     id: "notifications",
///     name: "Notifications",
///     version: "1.0.0",
///     entry_point: "builtin://notifications",
///     description: "In-app notification delivery",
///     dependencies: ["auth"]
/// );
/// ```
#[macro_export]
macro_rules! plugin_manifest {
    (
        id: $id:expr,
        name: $name:expr,
        version: $version:expr,
        entry_point: $entry:expr
        $(, description: $desc:expr)?
        $(, dependencies: [$($dep:expr),* $(,)?])?
        $(,)?
    ) => {{
        #[allow(unused_mut)]
        let mut manifest = $crate::prelude::PluginManifest::new($id, $name, $version, $entry);
        $(
            manifest = manifest.with_description($desc);
        )?
        $(
            manifest = manifest.with_dependencies([$($dep),*]);
        )?
        manifest
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_plugin_manifest_macro() {
        let plain = plugin_manifest!(
            id: "a",
            name: "A",
            version: "1.0.0",
            entry_point: "./a"
        );
        assert!(plain.dependencies.is_empty());

        let full = plugin_manifest!(
            id: "b",
            name: "B",
            version: "2.1.0",
            entry_point: "./b",
            description: "needs a",
            dependencies: ["a"],
        );
        assert_eq!(full.description, "needs a");
        assert_eq!(full.dependencies, vec!["a"]);
        assert!(full.enabled);
    }
}
