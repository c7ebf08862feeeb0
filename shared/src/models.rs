//! Shared data models.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationErrors};

use crate::{Error, Result};

/// A stored open house event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenHouse {
    pub uuid: String,
    pub name: String,
    pub date: i64,
    pub info: String,
    pub visible: bool,
}

/// Attendee counter for an open house, keyed by the same uuid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    pub uuid: String,
    pub attendees: u64,
}

impl Attendance {
    /// Fresh counter for a newly created open house.
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            attendees: 0,
        }
    }
}

/// Candidate open house fields as submitted in a POST or PUT body.
///
/// Fields are optional so that every missing field is reported at once. Values of the
/// wrong JSON type and unknown keys are recorded while reading the body and reported
/// alongside the schema violations.
#[derive(Debug, Default, Validate)]
pub struct OpenHouseForm {
    #[validate(
        required(message = "\"name\" is required"),
        length(min = 1, message = "\"name\" is not allowed to be empty")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "\"date\" is required"),
        range(min = 1, message = "\"date\" must be a positive number")
    )]
    pub date: Option<i64>,

    #[validate(
        required(message = "\"info\" is required"),
        length(min = 1, message = "\"info\" is not allowed to be empty")
    )]
    pub info: Option<String>,

    #[validate(required(message = "\"visible\" is required"))]
    pub visible: Option<bool>,

    mistyped: Vec<(&'static str, String)>,
    unknown: Vec<String>,
}

/// Schema order, used to report violations deterministically.
const FORM_FIELDS: [&str; 4] = ["name", "date", "info", "visible"];

impl OpenHouseForm {
    /// Read a form out of an already-parsed JSON body.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::Validation(
                "\"value\" must be of type object".to_string(),
            ));
        };

        let mut form = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "name" => form.name = form.read_string("name", value),
                "date" => form.date = form.read_integer("date", value),
                "info" => form.info = form.read_string("info", value),
                "visible" => match value {
                    Value::Bool(visible) => form.visible = Some(visible),
                    _ => form.reject("visible", "must be a boolean"),
                },
                _ => form.unknown.push(format!("\"{}\" is not allowed", key)),
            }
        }

        Ok(form)
    }

    fn read_string(&mut self, field: &'static str, value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            _ => {
                self.reject(field, "must be a string");
                None
            }
        }
    }

    /// Whole-valued floats such as `1700000000.0` are accepted.
    fn read_integer(&mut self, field: &'static str, value: Value) -> Option<i64> {
        let Value::Number(n) = value else {
            self.reject(field, "must be a number");
            return None;
        };
        if let Some(i) = n.as_i64() {
            return Some(i);
        }

        match n.as_f64() {
            Some(f) if f.fract() != 0.0 => self.reject(field, "must be an integer"),
            Some(f) if f >= i64::MIN as f64 && f < i64::MAX as f64 => return Some(f as i64),
            _ => self.reject(field, "must be a safe number"),
        }
        None
    }

    fn reject(&mut self, field: &'static str, reason: &str) {
        self.mistyped.push((field, format!("\"{}\" {}", field, reason)));
    }

    /// Validate the form and build the record stored under `uuid`.
    ///
    /// Violations are joined with `"; "`: schema fields in order, then unknown keys.
    pub fn into_open_house(self, uuid: impl Into<String>) -> Result<OpenHouse> {
        let errors = self.validate().err();

        let mut violations = Vec::new();
        for field in FORM_FIELDS {
            match self.mistyped.iter().find(|(f, _)| *f == field) {
                Some((_, message)) => violations.push(message.clone()),
                None => {
                    if let Some(errors) = &errors {
                        violations.extend(field_messages(errors, field));
                    }
                }
            }
        }
        violations.extend(self.unknown.iter().cloned());

        if !violations.is_empty() {
            return Err(Error::Validation(violations.join("; ")));
        }

        match (self.name, self.date, self.info, self.visible) {
            (Some(name), Some(date), Some(info), Some(visible)) => Ok(OpenHouse {
                uuid: uuid.into(),
                name,
                date,
                info,
                visible,
            }),
            _ => Err(Error::Validation("Open House is incomplete".to_string())),
        }
    }
}

fn field_messages(errors: &ValidationErrors, field: &str) -> Vec<String> {
    errors
        .field_errors()
        .get(field)
        .map(|errs| {
            errs.iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect()
        })
        .unwrap_or_default()
}
