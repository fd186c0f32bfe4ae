//! Manifest → digital course mapping
//!
//! Pure and total: every manifest maps to a course. Identifiers are freshly
//! generated, so two mappings of the same manifest differ only in uuids.
//!
//! Layout rules:
//! - one module per organization, always with `order = 0`
//! - a top-level item without children becomes one topic whose order is its
//!   position among the organization's items and whose type is inferred from
//!   the resource it references
//! - a top-level item with children produces no topic itself; its children
//!   are expanded as `LECTURE` sub-topics (see [`expand_items`])

use uuid::Uuid;

use crate::models::{
    DigitalCourse, Item, Manifest, Module, Organization, Resource, Topic, TopicType,
    COURSE_TYPE_SCORM,
};
use scorm_common::uuid_utils;

/// Resource `href` fragments that mark assessment content
const ASSESSMENT_MARKERS: &[&str] = &["assessment", "quiz", "test"];

/// Map a decoded manifest to a digital course
pub fn map_manifest(manifest: &Manifest) -> DigitalCourse {
    let course_uuid = uuid_utils::generate();

    let name = if manifest.metadata.title.is_empty() {
        manifest.identifier.clone()
    } else {
        manifest.metadata.title.clone()
    };

    let modules = manifest
        .organizations
        .iter()
        .map(|organization| map_organization(organization, course_uuid, &manifest.resources))
        .collect();

    DigitalCourse {
        uuid: course_uuid,
        name,
        description: manifest.metadata.description.clone(),
        course_type: COURSE_TYPE_SCORM.to_string(),
        modules,
        logo: None,
        thumbnail_url: None,
    }
}

/// Owning course and module of the topics being emitted
#[derive(Debug, Clone, Copy)]
struct TopicOwner {
    course: Uuid,
    module: Uuid,
}

impl TopicOwner {
    fn topic(&self, name: &str, topic_type: TopicType, order: u32, description: String) -> Topic {
        Topic {
            uuid: uuid_utils::generate(),
            name: name.to_string(),
            topic_type,
            order,
            description,
            digital_course_id: self.course,
            digital_course_module_id: self.module,
            scrimba_url: None,
            video_length: None,
            observations: None,
            mux_playback_id: None,
            external_video_url: None,
            assessment: None,
        }
    }
}

fn map_organization(organization: &Organization, course: Uuid, resources: &[Resource]) -> Module {
    let owner = TopicOwner {
        course,
        module: uuid_utils::generate(),
    };

    let mut topics = Vec::new();
    for (position, item) in organization.items.iter().enumerate() {
        if item.has_children() {
            let start_order = topics.len() as u32;
            expand_items(&item.items, start_order, owner, &mut topics);
        } else {
            topics.push(owner.topic(
                &item.title,
                infer_topic_type(item, resources),
                position as u32,
                format!("Topic extracted from SCORM: {}", item.title),
            ));
        }
    }

    Module {
        uuid: owner.module,
        name: organization.title.clone(),
        order: 0,
        topics,
    }
}

/// Emit sub-topics for a sibling list, depth first in document order
///
/// The item at `position` gets `order = start_order + position`. An item with
/// children recurses with `start_order` advanced by the number of topics this
/// expansion has emitted so far. Orders may therefore repeat across levels;
/// they are reproduced as computed, not renumbered.
fn expand_items(items: &[Item], start_order: u32, owner: TopicOwner, out: &mut Vec<Topic>) {
    let emitted_before = out.len();

    for (position, item) in items.iter().enumerate() {
        out.push(owner.topic(
            &item.title,
            TopicType::Lecture,
            start_order + position as u32,
            format!("Subtopic extracted from SCORM: {}", item.title),
        ));

        if item.has_children() {
            let emitted = (out.len() - emitted_before) as u32;
            expand_items(&item.items, start_order + emitted, owner, out);
        }
    }
}

/// Topic type of a top-level item
///
/// `ASSESSMENT` when any resource with the item's `identifierref` has an
/// `href` containing one of the assessment markers (case-insensitive);
/// `LECTURE` otherwise, including dangling references.
pub fn infer_topic_type(item: &Item, resources: &[Resource]) -> TopicType {
    let is_assessment = resources
        .iter()
        .filter(|resource| resource.identifier == item.identifier_ref)
        .any(|resource| {
            let href = resource.href.to_lowercase();
            ASSESSMENT_MARKERS.iter().any(|marker| href.contains(marker))
        });

    if is_assessment {
        TopicType::Assessment
    } else {
        TopicType::Lecture
    }
}
