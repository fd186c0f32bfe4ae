//! Structural validation of digital courses
//!
//! Rules are checked against the course's JSON document form, so the same
//! rule set covers mapper output and course documents posted by clients
//! (where a `type` of `"QUIZ"` or a negative `order` can actually occur).
//! Every rule dives into every element of every nested list and all
//! violations are reported in one pass, in document order.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::models::{DigitalCourse, QuestionType, TopicType};

/// One failed rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Field path, e.g. `modules[0].topics[2].type`
    pub field: String,
    /// Rule tag, e.g. `required`, `oneof=LECTURE ASSESSMENT`, `gte=0`, `url`
    pub rule: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Non-empty list of violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} violation(s): {}", .0.len(), summary(.0))]
pub struct ValidationErrors(pub Vec<Violation>);

impl ValidationErrors {
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }
}

fn summary(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// `Ok(())` when valid, otherwise every violation found
pub type ValidationResult = Result<(), ValidationErrors>;

/// Validate a typed course
pub fn validate(course: &DigitalCourse) -> ValidationResult {
    match serde_json::to_value(course) {
        Ok(document) => validate_document(&document),
        Err(e) => Err(ValidationErrors(vec![Violation {
            field: String::new(),
            rule: "serializable".to_string(),
            message: format!("course cannot be represented as JSON: {}", e),
        }])),
    }
}

/// Validate a course JSON document
pub fn validate_document(document: &Value) -> ValidationResult {
    let mut checker = Checker::default();
    checker.course(document);

    if checker.violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(checker.violations))
    }
}

#[derive(Default)]
struct Checker {
    violations: Vec<Violation>,
}

impl Checker {
    fn course(&mut self, document: &Value) {
        let Some(course) = self.object(document, "") else {
            return;
        };

        self.required(course, "", "name");
        self.required(course, "", "uuid");
        self.required(course, "", "courseType");
        self.optional_url(course, "", "thumbnailUrl");

        self.each(course, "", "modules", |checker, module, path| {
            checker.module(module, path)
        });
    }

    fn module(&mut self, module: &Map<String, Value>, path: &str) {
        self.required(module, path, "name");
        self.required(module, path, "uuid");
        self.non_negative(module, path, "order");

        self.each(module, path, "topics", |checker, topic, path| {
            checker.topic(topic, path)
        });
    }

    fn topic(&mut self, topic: &Map<String, Value>, path: &str) {
        self.required(topic, path, "name");
        self.one_of(topic, path, "type", TopicType::NAMES);
        self.required(topic, path, "uuid");
        self.non_negative(topic, path, "order");
        self.optional_url(topic, path, "scrimbaUrl");
        self.non_negative(topic, path, "videoLength");
        self.required(topic, path, "digitalCourseId");
        self.required(topic, path, "digitalCourseModuleId");

        match topic.get("assessment") {
            None | Some(Value::Null) => {}
            Some(value) => {
                let path = join(path, "assessment");
                if let Some(assessment) = self.object(value, &path) {
                    self.assessment(assessment, &path);
                }
            }
        }
    }

    fn assessment(&mut self, assessment: &Map<String, Value>, path: &str) {
        self.required(assessment, path, "uuid");

        self.each(assessment, path, "questions", |checker, question, path| {
            checker.required(question, path, "text");
            checker.one_of(question, path, "type", QuestionType::NAMES);
            checker.required(question, path, "uuid");
            checker.non_negative(question, path, "points");

            checker.each(question, path, "alternatives", |checker, alternative, path| {
                checker.required(alternative, path, "text");
                checker.required(alternative, path, "uuid");
            });
        });
    }

    /// Dive into every element of an optional list
    fn each<F>(&mut self, parent: &Map<String, Value>, path: &str, key: &str, mut check: F)
    where
        F: FnMut(&mut Self, &Map<String, Value>, &str),
    {
        let list_path = join(path, key);
        match parent.get(key) {
            None | Some(Value::Null) => {}
            Some(Value::Array(elements)) => {
                for (index, element) in elements.iter().enumerate() {
                    let element_path = format!("{}[{}]", list_path, index);
                    if let Some(object) = self.object(element, &element_path) {
                        check(self, object, &element_path);
                    }
                }
            }
            Some(_) => self.push(&list_path, "array", "must be a list"),
        }
    }

    fn object<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v Map<String, Value>> {
        match value {
            Value::Object(object) => Some(object),
            _ => {
                self.push(path, "object", "must be an object");
                None
            }
        }
    }

    /// Present, a string, and not empty
    fn required(&mut self, object: &Map<String, Value>, path: &str, key: &str) {
        match object.get(key) {
            Some(Value::String(s)) if !s.is_empty() => {}
            Some(Value::String(_)) | None | Some(Value::Null) => {
                self.push(&join(path, key), "required", "is required")
            }
            Some(_) => self.push(&join(path, key), "string", "must be a string"),
        }
    }

    fn one_of(&mut self, object: &Map<String, Value>, path: &str, key: &str, allowed: &[&str]) {
        match object.get(key) {
            Some(Value::String(s)) if allowed.contains(&s.as_str()) => {}
            Some(Value::String(s)) if !s.is_empty() => self.push(
                &join(path, key),
                &format!("oneof={}", allowed.join(" ")),
                &format!("must be one of [{}], got '{}'", allowed.join(", "), s),
            ),
            _ => self.required(object, path, key),
        }
    }

    /// Optional integer that must be `>= 0` when present
    fn non_negative(&mut self, object: &Map<String, Value>, path: &str, key: &str) {
        match object.get(key) {
            None | Some(Value::Null) => {}
            Some(Value::Number(n)) if n.is_u64() => {}
            Some(Value::Number(n)) if n.is_i64() => {
                self.push(&join(path, key), "gte=0", "must be greater than or equal to 0")
            }
            Some(_) => self.push(&join(path, key), "integer", "must be an integer"),
        }
    }

    /// Optional string that must parse as an absolute URL when non-empty
    fn optional_url(&mut self, object: &Map<String, Value>, path: &str, key: &str) {
        match object.get(key) {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if s.is_empty() => {}
            Some(Value::String(s)) => {
                if url::Url::parse(s).is_err() {
                    self.push(&join(path, key), "url", "must be a valid URL");
                }
            }
            Some(_) => self.push(&join(path, key), "string", "must be a string"),
        }
    }

    fn push(&mut self, field: &str, rule: &str, message: &str) {
        self.violations.push(Violation {
            field: field.to_string(),
            rule: rule.to_string(),
            message: message.to_string(),
        });
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}
