//! Digital course tree (course → modules → topics)
//!
//! Serialized with camelCase field names. This JSON form is both the API
//! response body and the document the course validator checks.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// `courseType` of every course built from a package
pub const COURSE_TYPE_SCORM: &str = "SCORM";

/// Course built from one package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalCourse {
    pub uuid: Uuid,
    pub name: String,
    pub description: String,
    pub course_type: String,
    pub modules: Vec<Module>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl DigitalCourse {
    /// Total number of topics across all modules
    pub fn topic_count(&self) -> usize {
        self.modules.iter().map(|m| m.topics.len()).sum()
    }
}

/// One module per manifest organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub uuid: Uuid,
    pub name: String,
    pub order: u32,
    pub topics: Vec<Topic>,
}

/// Kind of content a topic presents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopicType {
    Lecture,
    Assessment,
}

impl TopicType {
    /// Wire names accepted for `type`
    pub const NAMES: &'static [&'static str] = &["LECTURE", "ASSESSMENT"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TopicType::Lecture => "LECTURE",
            TopicType::Assessment => "ASSESSMENT",
        }
    }
}

impl fmt::Display for TopicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leaf of the course tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub uuid: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub topic_type: TopicType,
    pub order: u32,
    pub description: String,
    /// Back-reference to the owning course
    pub digital_course_id: Uuid,
    /// Back-reference to the owning module
    pub digital_course_module_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrimba_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mux_playback_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<Assessment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub uuid: Uuid,
    #[serde(default)]
    pub questions: Vec<AssessmentQuestion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    Multi,
    Single,
}

impl QuestionType {
    pub const NAMES: &'static [&'static str] = &["MULTI", "SINGLE"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentQuestion {
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub uuid: Uuid,
    pub points: u32,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alternative {
    pub text: String,
    pub uuid: Uuid,
    pub correct: bool,
    #[serde(default)]
    pub feedback: String,
}
