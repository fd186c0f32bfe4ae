//! `imsmanifest.xml` decoder
//!
//! Streams the document with quick-xml and builds a [`Manifest`]. Elements
//! are matched on their local name, so `imsmd:title` and `title` are the same
//! element. Unknown elements and attributes are skipped. Any structural error
//! (mismatched or missing end tags, a missing or wrong root, non-UTF-8 text)
//! fails the whole decode; no partial manifest is returned.
//!
//! Item nesting is capped at [`MAX_ITEM_DEPTH`]. Deeper trees are rejected
//! so that mapping and the stored JSON form stay within bounded recursion.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::{Item, Manifest, Organization, Resource, ResourceFile};

/// Deepest accepted `<item>` nesting (top-level items are depth 1)
pub const MAX_ITEM_DEPTH: usize = 32;

/// Manifest location and decoding errors
#[derive(Debug, Error)]
pub enum ManifestError {
    /// No `imsmanifest.xml` anywhere under the package root
    #[error("imsmanifest.xml not found in {0}")]
    NotFound(PathBuf),

    /// Document is not well-formed or not a manifest
    #[error("Invalid imsmanifest.xml: {0}")]
    Decode(String),

    /// Manifest exists but could not be read
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
}

/// Decode manifest bytes into a [`Manifest`]
pub fn decode_manifest(bytes: &[u8]) -> Result<Manifest, ManifestError> {
    let mut reader = Reader::from_reader(bytes);

    let mut builder = ManifestBuilder::default();
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| decode_error(reader.buffer_position(), e))?;

        let step = match event {
            Event::Start(element) => builder.open(&element),
            Event::Empty(element) => builder.open(&element).and_then(|_| builder.close()),
            Event::End(_) => builder.close(),
            Event::Text(text) => match text.unescape() {
                Ok(text) => {
                    builder.text(&text);
                    Ok(())
                }
                Err(e) => Err(format!("invalid text content: {}", e)),
            },
            Event::CData(data) => match std::str::from_utf8(&data) {
                Ok(text) => {
                    builder.text(text);
                    Ok(())
                }
                Err(e) => Err(format!("invalid CDATA content: {}", e)),
            },
            Event::Eof => break,
            _ => Ok(()),
        };
        step.map_err(|message| decode_error(reader.buffer_position(), message))?;

        buf.clear();
    }

    builder.finish().map_err(ManifestError::Decode)
}

fn decode_error(position: impl std::fmt::Display, cause: impl std::fmt::Display) -> ManifestError {
    ManifestError::Decode(format!("{} (at byte {})", cause, position))
}

/// What an open element contributes to the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Manifest,
    Organizations,
    Organization,
    Item,
    Resources,
    Resource,
    Other,
}

#[derive(Debug)]
struct OpenElement {
    name: String,
    role: Role,
    /// Character data of this element, trimmed once when it closes
    text: String,
}

/// Event sink assembling the manifest while the document is streamed
#[derive(Debug, Default)]
struct ManifestBuilder {
    manifest: Option<Manifest>,
    path: Vec<OpenElement>,
    organization: Option<Organization>,
    /// Open `<item>` elements, innermost last
    items: Vec<Item>,
    resource: Option<Resource>,
}

impl ManifestBuilder {
    fn open(&mut self, element: &BytesStart) -> Result<(), String> {
        let name = local_name(element)?;
        let parent = self.path.last().map(|open| open.role);

        let role = match (parent, name.as_str()) {
            (None, _) if self.manifest.is_some() => {
                return Err(format!("unexpected element <{}> after the root element", name));
            }
            (None, "manifest") => {
                self.manifest = Some(Manifest {
                    identifier: attribute(element, "identifier")?.unwrap_or_default(),
                    version: attribute(element, "version")?.unwrap_or_default(),
                    ..Default::default()
                });
                Role::Manifest
            }
            (None, _) => {
                return Err(format!("root element must be <manifest>, found <{}>", name));
            }
            (Some(Role::Manifest), "organizations") => {
                let default = attribute(element, "default")?;
                if let Some(manifest) = self.manifest.as_mut() {
                    manifest.default_organization = default.filter(|d| !d.is_empty());
                }
                Role::Organizations
            }
            (Some(Role::Organizations), "organization") => {
                self.organization = Some(Organization {
                    identifier: attribute(element, "identifier")?.unwrap_or_default(),
                    ..Default::default()
                });
                Role::Organization
            }
            (Some(Role::Organization | Role::Item), "item") => {
                if self.items.len() >= MAX_ITEM_DEPTH {
                    return Err(format!(
                        "<item> elements nested deeper than {} levels",
                        MAX_ITEM_DEPTH
                    ));
                }
                self.items.push(Item {
                    identifier: attribute(element, "identifier")?.unwrap_or_default(),
                    identifier_ref: attribute(element, "identifierref")?.unwrap_or_default(),
                    ..Default::default()
                });
                Role::Item
            }
            (Some(Role::Manifest), "resources") => Role::Resources,
            (Some(Role::Resources), "resource") => {
                self.resource = Some(Resource {
                    identifier: attribute(element, "identifier")?.unwrap_or_default(),
                    resource_type: attribute(element, "type")?.unwrap_or_default(),
                    href: attribute(element, "href")?.unwrap_or_default(),
                    files: Vec::new(),
                });
                Role::Resource
            }
            (Some(Role::Resource), "file") => {
                let href = attribute(element, "href")?.unwrap_or_default();
                if let Some(resource) = self.resource.as_mut() {
                    resource.files.push(ResourceFile { href });
                }
                Role::Other
            }
            _ => Role::Other,
        };

        self.path.push(OpenElement {
            name,
            role,
            text: String::new(),
        });
        Ok(())
    }

    fn close(&mut self) -> Result<(), String> {
        let closed = self
            .path
            .pop()
            .ok_or_else(|| "closing tag without a matching opening tag".to_string())?;

        let text = closed.text.trim();
        if !text.is_empty() {
            self.apply_text(&closed.name, text);
        }

        match closed.role {
            Role::Item => {
                let item = self
                    .items
                    .pop()
                    .ok_or_else(|| "unbalanced <item> elements".to_string())?;
                if let Some(parent) = self.items.last_mut() {
                    parent.items.push(item);
                } else if let Some(organization) = self.organization.as_mut() {
                    organization.items.push(item);
                }
            }
            Role::Organization => {
                if let (Some(organization), Some(manifest)) =
                    (self.organization.take(), self.manifest.as_mut())
                {
                    manifest.organizations.push(organization);
                }
            }
            Role::Resource => {
                if let (Some(resource), Some(manifest)) =
                    (self.resource.take(), self.manifest.as_mut())
                {
                    manifest.resources.push(resource);
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some(open) = self.path.last_mut() {
            open.text.push_str(text);
        }
    }

    /// Store the text of the element `name` that just closed; `self.path`
    /// still holds its ancestors
    fn apply_text(&mut self, name: &str, text: &str) {
        let Some(parent) = self.path.last() else {
            return;
        };

        if name == "title" {
            match parent.role {
                Role::Item => {
                    if let Some(item) = self.items.last_mut() {
                        item.title.push_str(text);
                    }
                    return;
                }
                Role::Organization => {
                    if let Some(organization) = self.organization.as_mut() {
                        organization.title.push_str(text);
                    }
                    return;
                }
                _ => {}
            }
        }

        let names: Vec<&str> = self
            .path
            .iter()
            .map(|open| open.name.as_str())
            .chain(std::iter::once(name))
            .collect();
        let Some(manifest) = self.manifest.as_mut() else {
            return;
        };
        let metadata = &mut manifest.metadata;

        match names.as_slice() {
            ["manifest", "metadata", "schema"] => metadata.schema.push_str(text),
            ["manifest", "metadata", "schemaversion"] => metadata.schema_version.push_str(text),
            ["manifest", "metadata", "lom", "general", "title", "langstring" | "string"] => {
                if metadata.title.is_empty() {
                    metadata.title = text.to_string();
                }
            }
            ["manifest", "metadata", "lom", "general", "description", "langstring" | "string"] => {
                if metadata.description.is_empty() {
                    metadata.description = text.to_string();
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> Result<Manifest, String> {
        if let Some(open) = self.path.last() {
            return Err(format!("document ended inside <{}>", open.name));
        }
        self.manifest
            .ok_or_else(|| "missing root element <manifest>".to_string())
    }
}

fn local_name(element: &BytesStart) -> Result<String, String> {
    let name = element.local_name();
    std::str::from_utf8(name.as_ref())
        .map(str::to_string)
        .map_err(|e| format!("element name is not UTF-8: {}", e))
}

/// Value of the attribute with the given local name, unescaped and trimmed
fn attribute(element: &BytesStart, key: &str) -> Result<Option<String>, String> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| format!("malformed attribute: {}", e))?;
        if attr.key.local_name().as_ref() == key.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|e| format!("invalid value for attribute '{}': {}", key, e))?;
            return Ok(Some(value.trim().to_string()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCORM12: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest identifier="COURSE-12" version="1.2"
          xmlns="http://www.imsproject.org/xsd/imscp_rootv1p1p2"
          xmlns:imsmd="http://www.imsglobal.org/xsd/imsmd_rootv1p2p1"
          xmlns:adlcp="http://www.adlnet.org/xsd/adlcp_rootv1p2">
  <metadata>
    <schema>ADL SCORM</schema>
    <schemaversion>1.2</schemaversion>
    <imsmd:lom>
      <imsmd:general>
        <imsmd:title><imsmd:langstring xml:lang="en">Safety &amp; Health</imsmd:langstring></imsmd:title>
        <imsmd:description><imsmd:langstring>Basic training</imsmd:langstring></imsmd:description>
      </imsmd:general>
    </imsmd:lom>
  </metadata>
  <organizations default="ORG-1">
    <organization identifier="ORG-1">
      <title>Main</title>
      <item identifier="ITEM-1" identifierref="RES-1">
        <title>Introduction</title>
      </item>
      <item identifier="ITEM-2">
        <title>Chapter</title>
        <item identifier="ITEM-2-1" identifierref="RES-2">
          <title>Part A</title>
          <item identifier="ITEM-2-1-1" identifierref="RES-2"><title>Detail</title></item>
        </item>
      </item>
    </organization>
  </organizations>
  <resources>
    <resource identifier="RES-1" type="webcontent" adlcp:scormtype="sco" href="intro/index.html">
      <file href="intro/index.html"/>
      <file href="intro/style.css"/>
    </resource>
    <resource identifier="RES-2" type="webcontent" href="quiz/quiz.html"/>
  </resources>
</manifest>"#;

    #[test]
    fn test_decode_scorm12_namespaced_manifest() {
        let manifest = decode_manifest(SCORM12.as_bytes()).unwrap();

        assert_eq!(manifest.identifier, "COURSE-12");
        assert_eq!(manifest.version, "1.2");
        assert_eq!(manifest.metadata.schema, "ADL SCORM");
        assert_eq!(manifest.metadata.schema_version, "1.2");
        assert_eq!(manifest.metadata.title, "Safety & Health");
        assert_eq!(manifest.metadata.description, "Basic training");
        assert_eq!(manifest.default_organization.as_deref(), Some("ORG-1"));

        assert_eq!(manifest.organizations.len(), 1);
        let org = &manifest.organizations[0];
        assert_eq!(org.identifier, "ORG-1");
        assert_eq!(org.title, "Main");
        assert_eq!(org.items.len(), 2);
        assert_eq!(org.items[0].identifier_ref, "RES-1");
        assert_eq!(org.items[0].title, "Introduction");
        assert!(org.items[0].items.is_empty());

        let chapter = &org.items[1];
        assert_eq!(chapter.title, "Chapter");
        assert_eq!(chapter.identifier_ref, "");
        assert_eq!(chapter.items.len(), 1);
        assert_eq!(chapter.items[0].title, "Part A");
        assert_eq!(chapter.items[0].items[0].identifier, "ITEM-2-1-1");

        assert_eq!(manifest.resources.len(), 2);
        assert_eq!(manifest.resources[0].resource_type, "webcontent");
        assert_eq!(manifest.resources[0].files.len(), 2);
        assert_eq!(manifest.resources[1].href, "quiz/quiz.html");
        assert!(manifest.resources[1].files.is_empty());
    }

    #[test]
    fn test_decode_scorm2004_string_title() {
        let xml = r#"<manifest identifier="C2004" version="1">
  <metadata><lom><general>
    <title><string language="en"></string><string language="pt">Curso</string></title>
  </general></lom></metadata>
  <organizations/>
  <resources/>
</manifest>"#;

        let manifest = decode_manifest(xml.as_bytes()).unwrap();
        assert_eq!(manifest.metadata.title, "Curso");
        assert!(manifest.organizations.is_empty());
        assert!(manifest.default_organization.is_none());
    }

    #[test]
    fn test_item_metadata_title_does_not_leak() {
        let xml = r#"<manifest identifier="M">
  <organizations><organization identifier="O"><title>Org</title>
    <item identifier="I"><title>Item</title>
      <metadata><lom><general><title><langstring>Item meta</langstring></title></general></lom></metadata>
    </item>
  </organization></organizations>
</manifest>"#;

        let manifest = decode_manifest(xml.as_bytes()).unwrap();
        assert_eq!(manifest.metadata.title, "");
        assert_eq!(manifest.organizations[0].items[0].title, "Item");
    }

    fn nested_items(depth: usize) -> String {
        let mut xml = String::from(r#"<manifest identifier="DEEP"><organizations><organization identifier="O"><title>Org</title>"#);
        for level in 0..depth {
            xml.push_str(&format!(r#"<item identifier="I{level}"><title>Level {level}</title>"#));
        }
        xml.push_str(&"</item>".repeat(depth));
        xml.push_str("</organization></organizations></manifest>");
        xml
    }

    #[test]
    fn test_item_nesting_up_to_limit_is_accepted() {
        let manifest = decode_manifest(nested_items(MAX_ITEM_DEPTH).as_bytes()).unwrap();

        let mut depth = 0;
        let mut items = &manifest.organizations[0].items;
        while let Some(item) = items.first() {
            depth += 1;
            items = &item.items;
        }
        assert_eq!(depth, MAX_ITEM_DEPTH);
    }

    #[test]
    fn test_item_nesting_beyond_limit_is_decode_error() {
        let err = decode_manifest(nested_items(MAX_ITEM_DEPTH + 1).as_bytes()).unwrap_err();
        assert!(matches!(err, ManifestError::Decode(_)));
        assert!(err.to_string().contains("nested deeper than"));

        // A pathological tree fails fast instead of being built
        assert!(decode_manifest(nested_items(100_000).as_bytes()).is_err());
    }

    #[test]
    fn test_text_split_by_comment_keeps_inner_spacing() {
        let xml = r#"<manifest identifier="M"><organizations><organization identifier="O">
  <title>A <!-- c --> B</title>
  <item identifier="I"><title>
      Intro <![CDATA[& Setup]]>
  </title></item>
</organization></organizations></manifest>"#;

        let manifest = decode_manifest(xml.as_bytes()).unwrap();
        assert_eq!(manifest.organizations[0].title, "A  B");
        assert_eq!(manifest.organizations[0].items[0].title, "Intro & Setup");
    }

    #[test]
    fn test_mismatched_end_tag_is_decode_error() {
        let xml = r#"<manifest identifier="M"><organizations></resources></manifest>"#;
        let err = decode_manifest(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, ManifestError::Decode(_)));
    }

    #[test]
    fn test_unterminated_document_is_decode_error() {
        let xml = r#"<manifest identifier="M"><organizations><organization identifier="O">"#;
        let err = decode_manifest(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, ManifestError::Decode(_)));
    }

    #[test]
    fn test_wrong_root_is_decode_error() {
        let err = decode_manifest(b"<package identifier=\"P\"/>").unwrap_err();
        assert!(err.to_string().contains("<manifest>"));
    }

    #[test]
    fn test_empty_document_is_decode_error() {
        let err = decode_manifest(b"").unwrap_err();
        assert!(err.to_string().contains("missing root element"));
    }

    #[test]
    fn test_non_utf8_text_is_decode_error() {
        let mut xml = b"<manifest identifier=\"M\"><organizations><organization><title>".to_vec();
        xml.extend_from_slice(&[0xC3, 0x28]);
        xml.extend_from_slice(b"</title></organization></organizations></manifest>");

        assert!(matches!(
            decode_manifest(&xml),
            Err(ManifestError::Decode(_))
        ));
    }
}
