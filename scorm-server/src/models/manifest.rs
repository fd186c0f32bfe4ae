//! Decoded `imsmanifest.xml`
//!
//! Pure data. The tree is serialized to JSON when a course is stored and
//! deserialized again when the course is replayed, so every field tolerates
//! being absent in older documents.

use serde::{Deserialize, Serialize};

/// File name the manifest must have inside a package
pub const MANIFEST_FILE_NAME: &str = "imsmanifest.xml";

/// Package manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub identifier: String,
    pub version: String,
    pub metadata: Metadata,
    /// `default` attribute of `<organizations>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_organization: Option<String>,
    pub organizations: Vec<Organization>,
    pub resources: Vec<Resource>,
}

/// Course-level metadata (LOM general title and description)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub schema: String,
    pub schema_version: String,
    pub title: String,
    pub description: String,
}

/// Top-level grouping of items; becomes one course module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Organization {
    pub identifier: String,
    pub title: String,
    pub items: Vec<Item>,
}

/// Navigable unit, nested to arbitrary depth
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub identifier: String,
    /// Links to [`Resource::identifier`] by equality
    pub identifier_ref: String,
    pub title: String,
    pub items: Vec<Item>,
}

impl Item {
    pub fn has_children(&self) -> bool {
        !self.items.is_empty()
    }
}

/// Content asset referenced by items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resource {
    pub identifier: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub href: String,
    pub files: Vec<ResourceFile>,
}

/// `<file href="...">` entry of a resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceFile {
    pub href: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_json_with_missing_fields_loads() {
        let manifest: Manifest =
            serde_json::from_str(r#"{"identifier":"COURSE-1","organizations":[{"title":"Org"}]}"#)
                .unwrap();

        assert_eq!(manifest.identifier, "COURSE-1");
        assert_eq!(manifest.version, "");
        assert_eq!(manifest.organizations[0].title, "Org");
        assert!(manifest.organizations[0].items.is_empty());
        assert!(manifest.resources.is_empty());
    }

    #[test]
    fn test_resource_type_serialized_as_type() {
        let json = serde_json::to_value(Resource {
            identifier: "R".into(),
            resource_type: "webcontent".into(),
            href: "index.html".into(),
            files: vec![ResourceFile { href: "index.html".into() }],
        })
        .unwrap();

        assert_eq!(json["type"], "webcontent");
        assert_eq!(json["files"][0]["href"], "index.html");
    }
}
