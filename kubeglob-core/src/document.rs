//! Generic resource document: one decoded YAML manifest.
//!
//! The tree is kept as a loosely-typed [`serde_yaml::Value`] so any structurally
//! valid manifest decodes, whatever its kind. Only a handful of well-known paths
//! (`apiVersion`, `kind`, `metadata.name`, `metadata.namespace`) get typed
//! accessors.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::error::DocumentError;

/// Namespace assigned to documents that do not name one.
pub const DEFAULT_NAMESPACE: &str = "default";

const METADATA: &str = "metadata";
const NAMESPACE: &str = "namespace";

/// A manifest whose root is guaranteed to be a mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResourceDocument {
    root: Mapping,
}

impl ResourceDocument {
    /// Decode raw file contents.
    ///
    /// The content must be a single YAML document whose root is a mapping, and
    /// `metadata`, when present and not null, must itself be a mapping.
    pub fn decode(bytes: &[u8]) -> Result<Self, DocumentError> {
        let value: Value = serde_yaml::from_slice(bytes)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let root = match value {
            Value::Mapping(root) => root,
            other => return Err(DocumentError::NotAMapping(type_name(&other))),
        };
        match root.get(METADATA) {
            None | Some(Value::Null) | Some(Value::Mapping(_)) => Ok(Self { root }),
            Some(other) => Err(DocumentError::MetadataNotAMapping(type_name(other))),
        }
    }

    pub fn api_version(&self) -> Option<&str> {
        self.root.get("apiVersion").and_then(Value::as_str)
    }

    pub fn kind(&self) -> Option<&str> {
        self.root.get("kind").and_then(Value::as_str)
    }

    /// `metadata.name`, falling back to `metadata.generateName`.
    pub fn name(&self) -> Option<&str> {
        let metadata = self.metadata()?;
        metadata
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .or_else(|| metadata.get("generateName").and_then(Value::as_str))
    }

    /// `metadata.namespace` when it is a non-empty string.
    pub fn namespace(&self) -> Option<&str> {
        self.metadata()?
            .get(NAMESPACE)
            .and_then(Value::as_str)
            .filter(|ns| !ns.is_empty())
    }

    /// Set `metadata.namespace`, creating `metadata` when it is missing or null.
    pub fn set_namespace(&mut self, namespace: &str) {
        let slot = self
            .root
            .entry(Value::from(METADATA))
            .or_insert(Value::Null);
        match slot {
            Value::Mapping(metadata) => {
                metadata.insert(Value::from(NAMESPACE), Value::from(namespace));
            }
            other => {
                let mut metadata = Mapping::new();
                metadata.insert(Value::from(NAMESPACE), Value::from(namespace));
                *other = Value::Mapping(metadata);
            }
        }
    }

    /// Drop `metadata.namespace`, leaving the rest of the metadata untouched.
    pub fn clear_namespace(&mut self) {
        if let Some(Value::Mapping(metadata)) = self.root.get_mut(METADATA) {
            metadata.remove(NAMESPACE);
        }
    }

    /// Set the namespace to `fallback` unless a non-empty one is already present.
    ///
    /// Returns `true` when the document was changed. Applying it twice is a no-op
    /// the second time.
    pub fn default_namespace(&mut self, fallback: &str) -> bool {
        if self.namespace().is_some() {
            return false;
        }
        self.set_namespace(fallback);
        true
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.root
    }

    pub fn into_value(self) -> Value {
        Value::Mapping(self.root)
    }

    fn metadata(&self) -> Option<&Mapping> {
        self.root.get(METADATA).and_then(Value::as_mapping)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(src: &str) -> ResourceDocument {
        ResourceDocument::decode(src.as_bytes()).expect("document should decode")
    }

    #[test]
    fn reads_well_known_fields() {
        let doc = decode(
            "apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: team1\nspec:\n  replicas: 2\n",
        );
        assert_eq!(doc.api_version(), Some("apps/v1"));
        assert_eq!(doc.kind(), Some("Deployment"));
        assert_eq!(doc.name(), Some("web"));
        assert_eq!(doc.namespace(), Some("team1"));
    }

    #[test]
    fn name_falls_back_to_generate_name() {
        let doc = decode("kind: Job\nmetadata:\n  generateName: migrate-\n");
        assert_eq!(doc.name(), Some("migrate-"));
    }

    #[test]
    fn defaults_missing_namespace() {
        let mut doc = decode("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cfg\n");
        assert_eq!(doc.namespace(), None);
        assert!(doc.default_namespace(DEFAULT_NAMESPACE));
        assert_eq!(doc.namespace(), Some("default"));
        assert_eq!(doc.name(), Some("cfg"));
    }

    #[test]
    fn defaults_empty_namespace_and_missing_metadata() {
        let mut empty = decode("kind: ConfigMap\nmetadata:\n  namespace: \"\"\n");
        assert!(empty.default_namespace(DEFAULT_NAMESPACE));
        assert_eq!(empty.namespace(), Some("default"));

        let mut bare = decode("kind: ConfigMap\n");
        assert!(bare.default_namespace(DEFAULT_NAMESPACE));
        assert_eq!(bare.namespace(), Some("default"));

        let mut null_meta = decode("kind: ConfigMap\nmetadata:\n");
        assert!(null_meta.default_namespace(DEFAULT_NAMESPACE));
        assert_eq!(null_meta.namespace(), Some("default"));
    }

    #[test]
    fn defaulting_keeps_existing_namespace_and_is_idempotent() {
        let mut doc = decode("kind: ConfigMap\nmetadata:\n  namespace: team1\n");
        let before = doc.clone();
        assert!(!doc.default_namespace(DEFAULT_NAMESPACE));
        assert_eq!(doc, before);

        let mut fresh = decode("kind: ConfigMap\n");
        fresh.default_namespace(DEFAULT_NAMESPACE);
        let once = fresh.clone();
        assert!(!fresh.default_namespace(DEFAULT_NAMESPACE));
        assert_eq!(fresh, once);
    }

    #[test]
    fn set_namespace_creates_metadata_and_keeps_siblings() {
        let mut bare = decode("kind: ConfigMap\n");
        bare.set_namespace("team1");
        assert_eq!(bare.namespace(), Some("team1"));

        let mut null_meta = decode("kind: ConfigMap\nmetadata: ~\n");
        null_meta.set_namespace("team1");
        assert_eq!(null_meta.namespace(), Some("team1"));

        let mut named = decode("kind: ConfigMap\nmetadata:\n  name: cfg\n  namespace: old\n");
        named.set_namespace("team2");
        assert_eq!(named.namespace(), Some("team2"));
        assert_eq!(named.name(), Some("cfg"));
    }

    #[test]
    fn clear_namespace_only_touches_namespace() {
        let mut doc = decode("kind: Namespace\nmetadata:\n  name: team1\n  namespace: default\n");
        doc.clear_namespace();
        assert_eq!(doc.namespace(), None);
        assert_eq!(doc.name(), Some("team1"));
    }

    #[test]
    fn rejects_malformed_yaml() {
        let err = ResourceDocument::decode(b"kind: [unclosed\n").unwrap_err();
        assert!(matches!(err, DocumentError::Yaml(_)), "got {err:?}");
    }

    #[test]
    fn rejects_non_mapping_roots() {
        for (src, found) in [
            ("- a\n- b\n", "a sequence"),
            ("just a string\n", "a string"),
            ("", "null"),
        ] {
            match ResourceDocument::decode(src.as_bytes()) {
                Err(DocumentError::NotAMapping(kind)) => assert_eq!(kind, found),
                other => panic!("expected NotAMapping for {src:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_scalar_metadata() {
        let err = ResourceDocument::decode(b"kind: ConfigMap\nmetadata: oops\n").unwrap_err();
        assert!(matches!(err, DocumentError::MetadataNotAMapping("a string")));
    }

    #[test]
    fn serializes_as_plain_mapping() {
        let mut doc = decode("apiVersion: v1\nkind: ConfigMap\ndata:\n  k: v\n");
        doc.default_namespace(DEFAULT_NAMESPACE);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["metadata"]["namespace"], "default");
        assert_eq!(json["data"]["k"], "v");
    }
}
