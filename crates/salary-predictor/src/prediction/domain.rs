use std::fmt;

use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};

/// Vocabulary of a categorical input attribute.
///
/// Every category keeps an `Unrecognized` variant holding the raw wire value so
/// that out-of-vocabulary payloads still deserialize; [`SalaryInput::validate`]
/// rejects them at the boundary and the encoder maps them to its defaults.
pub trait Category: Sized {
    const FIELD: &'static str;

    fn ordered() -> Vec<Self>;
    fn label(&self) -> &str;
    fn unrecognized(raw: String) -> Self;

    fn is_recognized(&self) -> bool;

    fn parse(raw: String) -> Self {
        Self::ordered()
            .into_iter()
            .find(|known| known.label() == raw)
            .unwrap_or_else(|| Self::unrecognized(raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Education {
    HighSchool,
    Bachelor,
    Master,
    PhD,
    Unrecognized(String),
}

impl Category for Education {
    const FIELD: &'static str = "education";

    fn ordered() -> Vec<Self> {
        vec![Self::HighSchool, Self::Bachelor, Self::Master, Self::PhD]
    }

    fn label(&self) -> &str {
        match self {
            Self::HighSchool => "High School",
            Self::Bachelor => "Bachelor",
            Self::Master => "Master",
            Self::PhD => "PhD",
            Self::Unrecognized(raw) => raw,
        }
    }

    fn unrecognized(raw: String) -> Self {
        Self::Unrecognized(raw)
    }

    fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Location {
    Urban,
    Suburban,
    Rural,
    Unrecognized(String),
}

impl Category for Location {
    const FIELD: &'static str = "location";

    fn ordered() -> Vec<Self> {
        vec![Self::Urban, Self::Suburban, Self::Rural]
    }

    fn label(&self) -> &str {
        match self {
            Self::Urban => "Urban",
            Self::Suburban => "Suburban",
            Self::Rural => "Rural",
            Self::Unrecognized(raw) => raw,
        }
    }

    fn unrecognized(raw: String) -> Self {
        Self::Unrecognized(raw)
    }

    fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobTitle {
    Manager,
    Director,
    Analyst,
    Engineer,
    Consultant,
    Specialist,
    Developer,
    Designer,
    Unrecognized(String),
}

impl Category for JobTitle {
    const FIELD: &'static str = "job_title";

    fn ordered() -> Vec<Self> {
        vec![
            Self::Manager,
            Self::Director,
            Self::Analyst,
            Self::Engineer,
            Self::Consultant,
            Self::Specialist,
            Self::Developer,
            Self::Designer,
        ]
    }

    fn label(&self) -> &str {
        match self {
            Self::Manager => "Manager",
            Self::Director => "Director",
            Self::Analyst => "Analyst",
            Self::Engineer => "Engineer",
            Self::Consultant => "Consultant",
            Self::Specialist => "Specialist",
            Self::Developer => "Developer",
            Self::Designer => "Designer",
            Self::Unrecognized(raw) => raw,
        }
    }

    fn unrecognized(raw: String) -> Self {
        Self::Unrecognized(raw)
    }

    fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Gender {
    Male,
    Female,
    Other,
    Unrecognized(String),
}

impl Category for Gender {
    const FIELD: &'static str = "gender";

    fn ordered() -> Vec<Self> {
        vec![Self::Male, Self::Female, Self::Other]
    }

    fn label(&self) -> &str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
            Self::Unrecognized(raw) => raw,
        }
    }

    fn unrecognized(raw: String) -> Self {
        Self::Unrecognized(raw)
    }

    fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

macro_rules! wire_string {
    ($($category:ty),+) => {
        $(
            impl From<String> for $category {
                fn from(raw: String) -> Self {
                    <$category as Category>::parse(raw)
                }
            }

            impl From<$category> for String {
                fn from(value: $category) -> Self {
                    value.label().to_string()
                }
            }

            impl fmt::Display for $category {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }
        )+
    };
}

wire_string!(Education, Location, JobTitle, Gender);

pub const NAME_LENGTH: std::ops::RangeInclusive<usize> = 2..=50;
pub const EXPERIENCE_YEARS: std::ops::RangeInclusive<f64> = 0.0..=50.0;
pub const AGE_YEARS: std::ops::RangeInclusive<u32> = 18..=100;

/// A person's attributes as submitted for a salary prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryInput {
    pub name: String,
    pub education: Education,
    pub years_of_experience: f64,
    pub location: Location,
    pub job_title: JobTitle,
    #[serde(deserialize_with = "whole_years")]
    pub age: u32,
    pub gender: Gender,
}

/// Ages arrive as JSON numbers; `30` and `30.0` are both accepted, `30.5` and
/// negatives are not.
fn whole_years<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let years = f64::deserialize(deserializer)?;
    if years.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&years) {
        Ok(years as u32)
    } else {
        Err(de::Error::invalid_value(
            Unexpected::Float(years),
            &"a non-negative whole number of years",
        ))
    }
}

impl SalaryInput {
    /// Fixed payload used by the self-test endpoint and CLI smoke checks.
    pub fn sample() -> Self {
        Self {
            name: "Test User".to_string(),
            education: Education::Bachelor,
            years_of_experience: 5.0,
            location: Location::Urban,
            job_title: JobTitle::Engineer,
            age: 30,
            gender: Gender::Male,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let name_length = self.name.chars().count();
        if !NAME_LENGTH.contains(&name_length) {
            return Err(ValidationError::NameLength {
                length: name_length,
            });
        }

        if !self.years_of_experience.is_finite()
            || !EXPERIENCE_YEARS.contains(&self.years_of_experience)
        {
            return Err(ValidationError::Experience(self.years_of_experience));
        }

        if !AGE_YEARS.contains(&self.age) {
            return Err(ValidationError::Age(self.age));
        }

        recognized(&self.education)?;
        recognized(&self.location)?;
        recognized(&self.job_title)?;
        recognized(&self.gender)?;
        Ok(())
    }
}

fn recognized<C: Category>(value: &C) -> Result<(), ValidationError> {
    if value.is_recognized() {
        Ok(())
    } else {
        Err(ValidationError::UnknownCategory {
            field: C::FIELD,
            value: value.label().to_string(),
            allowed: C::ordered()
                .iter()
                .map(|known| known.label().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

/// Reasons an input record is rejected before it reaches the engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must be between 2 and 50 characters (got {length})")]
    NameLength { length: usize },
    #[error("years_of_experience must be between 0 and 50 (got {0})")]
    Experience(f64),
    #[error("age must be between 18 and 100 (got {0})")]
    Age(u32),
    #[error("unknown {field} '{value}', expected one of: {allowed}")]
    UnknownCategory {
        field: &'static str,
        value: String,
        allowed: String,
    },
    #[error("malformed request: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_wire_labels() {
        let input: SalaryInput = serde_json::from_value(json!({
            "name": "John Doe",
            "education": "High School",
            "years_of_experience": 5.0,
            "location": "Urban",
            "job_title": "Manager",
            "age": 30,
            "gender": "Male"
        }))
        .expect("payload deserializes");

        assert_eq!(input.education, Education::HighSchool);
        assert_eq!(input.job_title, JobTitle::Manager);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn unknown_category_survives_deserialization_but_fails_validation() {
        let input: SalaryInput = serde_json::from_value(json!({
            "name": "Jane Roe",
            "education": "Bootcamp",
            "years_of_experience": 2,
            "location": "Rural",
            "job_title": "Analyst",
            "age": 25,
            "gender": "Female"
        }))
        .expect("payload deserializes");

        assert_eq!(
            input.education,
            Education::Unrecognized("Bootcamp".to_string())
        );
        match input.validate() {
            Err(ValidationError::UnknownCategory { field, value, .. }) => {
                assert_eq!(field, "education");
                assert_eq!(value, "Bootcamp");
            }
            other => panic!("expected unknown category, got {other:?}"),
        }
    }

    #[test]
    fn serializes_back_to_labels() {
        let value = serde_json::to_value(SalaryInput::sample()).expect("serializes");
        assert_eq!(value["education"], "Bachelor");
        assert_eq!(value["job_title"], "Engineer");
        assert_eq!(value["gender"], "Male");
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        let mut input = SalaryInput::sample();
        input.age = 17;
        assert_eq!(input.validate(), Err(ValidationError::Age(17)));

        let mut input = SalaryInput::sample();
        input.years_of_experience = 50.5;
        assert_eq!(input.validate(), Err(ValidationError::Experience(50.5)));

        let mut input = SalaryInput::sample();
        input.years_of_experience = f64::NAN;
        assert!(matches!(
            input.validate(),
            Err(ValidationError::Experience(_))
        ));
    }

    #[test]
    fn name_length_counts_every_character() {
        let mut input = SalaryInput::sample();
        input.name = "J".to_string();
        assert_eq!(
            input.validate(),
            Err(ValidationError::NameLength { length: 1 })
        );

        input.name = " J ".to_string();
        assert_eq!(input.validate(), Ok(()));
    }

    #[test]
    fn category_labels_match_exactly() {
        let education: Education = serde_json::from_value(json!(" Bachelor"))
            .expect("label deserializes");
        assert_eq!(education, Education::Unrecognized(" Bachelor".to_string()));
        assert!(!education.is_recognized());
    }

    #[test]
    fn age_accepts_integral_floats_only() {
        let payload = |age: serde_json::Value| {
            let mut value = serde_json::to_value(SalaryInput::sample()).expect("serializes");
            value["age"] = age;
            serde_json::from_value::<SalaryInput>(value)
        };

        assert_eq!(payload(json!(30.0)).expect("30.0 accepted").age, 30);
        assert_eq!(payload(json!(41)).expect("41 accepted").age, 41);
        assert!(payload(json!(30.5)).is_err());
        assert!(payload(json!(-3)).is_err());
        assert!(payload(json!("thirty")).is_err());
    }
}
