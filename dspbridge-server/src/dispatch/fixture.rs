//! Fixture resolver
//!
//! Answers queries from recorded plugin responses stored as
//! `{method}.json` or `{method}_{id}.json` under a root directory.

use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;

use dspbridge_protocol::{DispatchError, DispatchResult, MethodName, QueryParams};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};

/// Reads recorded responses from a fixture directory
#[derive(Debug, Clone)]
pub struct FixtureResolver {
    root: PathBuf,
}

impl FixtureResolver {
    /// Create a resolver rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a query against the fixture directory
    ///
    /// A scoped file wins over the unscoped one. With no file at all, listing
    /// queries answer `[]` and everything else answers "Mock data not found".
    pub async fn resolve(&self, method: &MethodName, params: &QueryParams) -> DispatchResult {
        let Some(path) = self.locate(method, params).await else {
            return Self::missing(method);
        };

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Self::missing(method),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read fixture");
                return Err(DispatchError::fixture_unreadable(e));
            }
        };

        serde_json::from_str::<Value>(&content).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Malformed fixture");
            DispatchError::fixture_unreadable(e)
        })
    }

    /// Pick the file to read, scoped first
    ///
    /// Returns `None` for names containing a path separator. Without one the
    /// file name is a single component, so dots alone cannot leave the root.
    async fn locate(&self, method: &MethodName, params: &QueryParams) -> Option<PathBuf> {
        let name = method.as_str();
        if name.contains(['/', '\\']) {
            warn!(method = %method, "Rejected fixture lookup outside the fixture root");
            return None;
        }

        if let Some(id) = params.scope_id() {
            let scoped = self.root.join(format!("{}_{}.json", name, id));
            if fs::metadata(&scoped).await.is_ok() {
                debug!(path = %scoped.display(), "Using scoped fixture");
                return Some(scoped);
            }
        }

        Some(self.root.join(format!("{}.json", name)))
    }

    fn missing(method: &MethodName) -> DispatchResult {
        if method.is_listing() {
            debug!(method = %method, "No fixture for listing query, answering []");
            Ok(Value::Array(Vec::new()))
        } else {
            warn!(method = %method, "No fixture for query");
            Err(DispatchError::fixture_missing())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dspbridge_protocol::ErrorKind;
    use serde_json::json;
    use tempfile::{tempdir, TempDir};

    fn method(name: &str) -> MethodName {
        MethodName::new(name).unwrap()
    }

    fn write(dir: &TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    #[tokio::test]
    async fn test_missing_listing_fixture_is_empty_array() {
        let dir = tempdir().unwrap();
        let resolver = FixtureResolver::new(dir.path());

        let result = resolver
            .resolve(&method("list_planets"), &QueryParams::None)
            .await;
        assert_eq!(result, Ok(json!([])));

        let result = resolver
            .resolve(&method("list_ils_per_planet"), &QueryParams::planet(3))
            .await;
        assert_eq!(result, Ok(json!([])));
    }

    #[tokio::test]
    async fn test_missing_fixture_is_not_found_error() {
        let dir = tempdir().unwrap();
        let resolver = FixtureResolver::new(dir.path());

        let err = resolver
            .resolve(&method("get_game_info"), &QueryParams::None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FixtureMissing);
        assert_eq!(err.to_value(), json!({"error": "Mock data not found"}));
    }

    #[tokio::test]
    async fn test_listing_heuristic_is_case_sensitive() {
        let dir = tempdir().unwrap();
        let resolver = FixtureResolver::new(dir.path());

        let result = resolver
            .resolve(&method("LIST_PLANETS"), &QueryParams::None)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_scoped_fixture_preferred() {
        let dir = tempdir().unwrap();
        write(&dir, "get_planet_resources.json", r#"{"scope":"all"}"#);
        write(&dir, "get_planet_resources_42.json", r#"{"scope":42}"#);
        let resolver = FixtureResolver::new(dir.path());

        let result = resolver
            .resolve(&method("get_planet_resources"), &QueryParams::planet(42))
            .await;
        assert_eq!(result, Ok(json!({"scope": 42})));
    }

    #[tokio::test]
    async fn test_scoped_fixture_falls_back_to_unscoped() {
        let dir = tempdir().unwrap();
        write(&dir, "get_planet_resources.json", r#"{"scope":"all"}"#);
        let resolver = FixtureResolver::new(dir.path());

        let result = resolver
            .resolve(&method("get_planet_resources"), &QueryParams::planet(7))
            .await;
        assert_eq!(result, Ok(json!({"scope": "all"})));
    }

    #[tokio::test]
    async fn test_item_scoped_fixture() {
        let dir = tempdir().unwrap();
        write(&dir, "get_item_flow_1120.json", "[1,2,3]");
        let resolver = FixtureResolver::new(dir.path());

        let result = resolver
            .resolve(&method("get_item_flow"), &QueryParams::item(1120))
            .await;
        assert_eq!(result, Ok(json!([1, 2, 3])));
    }

    #[tokio::test]
    async fn test_unscoped_params_ignore_scoped_files() {
        let dir = tempdir().unwrap();
        write(&dir, "get_stars.json", r#"{"stars":64}"#);
        write(&dir, "get_stars_1.json", r#"{"stars":1}"#);
        let resolver = FixtureResolver::new(dir.path());

        let result = resolver
            .resolve(&method("get_stars"), &QueryParams::None)
            .await;
        assert_eq!(result, Ok(json!({"stars": 64})));
    }

    #[tokio::test]
    async fn test_fixture_content_verbatim_and_repeatable() {
        let dir = tempdir().unwrap();
        let content = json!({
            "planets": [{"id": 103, "name": "Aldebaran II"}],
            "count": 1,
            "seed": null
        });
        write(&dir, "get_galaxy_details.json", &content.to_string());
        let resolver = FixtureResolver::new(dir.path());

        for _ in 0..3 {
            let result = resolver
                .resolve(&method("get_galaxy_details"), &QueryParams::None)
                .await;
            assert_eq!(result, Ok(content.clone()));
        }
    }

    #[tokio::test]
    async fn test_null_and_scalar_fixtures() {
        let dir = tempdir().unwrap();
        write(&dir, "ping.json", "\"pong\"");
        write(&dir, "get_ships.json", "null");
        let resolver = FixtureResolver::new(dir.path());

        assert_eq!(
            resolver.resolve(&method("ping"), &QueryParams::None).await,
            Ok(json!("pong"))
        );
        assert_eq!(
            resolver.resolve(&method("get_ships"), &QueryParams::None).await,
            Ok(Value::Null)
        );
    }

    #[tokio::test]
    async fn test_malformed_fixture_is_unreadable_error() {
        let dir = tempdir().unwrap();
        write(&dir, "list_planets.json", "{ not json");
        let resolver = FixtureResolver::new(dir.path());

        let err = resolver
            .resolve(&method("list_planets"), &QueryParams::None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FixtureUnreadable);
        assert!(err.detail().is_string());
        assert_ne!(err.detail(), &json!("Mock data not found"));
    }

    #[tokio::test]
    async fn test_directory_in_place_of_fixture_is_unreadable() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("get_game_info.json")).unwrap();
        let resolver = FixtureResolver::new(dir.path());

        let err = resolver
            .resolve(&method("get_game_info"), &QueryParams::None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FixtureUnreadable);
    }

    #[tokio::test]
    async fn test_missing_root_directory() {
        let dir = tempdir().unwrap();
        let resolver = FixtureResolver::new(dir.path().join("absent"));

        assert_eq!(
            resolver.resolve(&method("list_planets"), &QueryParams::None).await,
            Ok(json!([]))
        );
        assert!(resolver
            .resolve(&method("get_game_info"), &QueryParams::None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_path_like_method_names_never_leave_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("fixtures");
        std::fs::create_dir(&root).unwrap();
        write(&dir, "secret.json", r#"{"leaked":true}"#);
        let resolver = FixtureResolver::new(&root);

        let err = resolver
            .resolve(&method("../secret"), &QueryParams::None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FixtureMissing);

        let err = resolver
            .resolve(&method("..\\secret"), &QueryParams::None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FixtureMissing);
    }

    #[tokio::test]
    async fn test_dotted_method_names_are_opaque() {
        let dir = tempdir().unwrap();
        write(&dir, "list..x.json", r#"[{"id":1}]"#);
        write(&dir, "...json", r#"{"dots":true}"#);
        let resolver = FixtureResolver::new(dir.path());

        assert_eq!(
            resolver.resolve(&method("list..x"), &QueryParams::None).await,
            Ok(json!([{"id": 1}]))
        );
        assert_eq!(
            resolver.resolve(&method(".."), &QueryParams::None).await,
            Ok(json!({"dots": true}))
        );
    }
}
