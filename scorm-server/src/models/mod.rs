//! Data models for the SCORM server
//!
//! - `manifest`: the decoded package manifest
//! - `course`: the digital course tree built from it

pub mod course;
pub mod manifest;

pub use course::{
    Alternative, Assessment, AssessmentQuestion, DigitalCourse, Module, QuestionType, Topic,
    TopicType, COURSE_TYPE_SCORM,
};
pub use manifest::{
    Item, Manifest, Metadata, Organization, Resource, ResourceFile, MANIFEST_FILE_NAME,
};
