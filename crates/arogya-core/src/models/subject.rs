use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreError;

/// Oldest age accepted before a subject is treated as misconfigured.
pub const MAX_SUBJECT_AGE: u32 = 130;

/// The person a dialogue is about: the user themself or a dependent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    pub age: u32,
    pub sex: Sex,
    pub relation: Relation,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Relation {
    /// The signed-in user is the subject.
    #[serde(rename = "self")]
    SelfCare,
    /// A family member or patient the user is answering for.
    Dependent,
}

impl Subject {
    pub fn new(name: impl Into<String>, age: u32, sex: Sex) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            age,
            sex,
            relation: Relation::SelfCare,
            location: None,
            phone: None,
        }
    }

    pub fn dependent(mut self) -> Self {
        self.relation = Relation::Dependent;
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Check that the subject can anchor a dialogue.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidSubject("name is empty".to_string()));
        }
        if self.age > MAX_SUBJECT_AGE {
            return Err(CoreError::InvalidSubject(format!(
                "age {} exceeds {MAX_SUBJECT_AGE}",
                self.age
            )));
        }
        Ok(())
    }
}
