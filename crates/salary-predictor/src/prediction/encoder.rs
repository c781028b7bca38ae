//! Category-to-number encoding for the trained artifacts.
//!
//! The column order and the integer codes are fixed by the data the model and
//! scaler were fitted on. Changing either silently breaks every prediction.

use serde::Serialize;

use super::domain::{Education, Gender, JobTitle, Location, SalaryInput};

pub const FEATURE_COUNT: usize = 6;

pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "Education",
    "Experience",
    "Location",
    "Job_Title",
    "Age",
    "Gender",
];

/// `[education, years_of_experience, location, job_title, age, gender]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

pub fn encode(input: &SalaryInput) -> FeatureVector {
    FeatureVector([
        education_code(&input.education),
        input.years_of_experience,
        location_code(&input.location),
        job_title_code(&input.job_title),
        f64::from(input.age),
        gender_code(&input.gender),
    ])
}

fn education_code(education: &Education) -> f64 {
    match education {
        Education::HighSchool => 0.0,
        Education::Bachelor => 1.0,
        Education::Master => 2.0,
        Education::PhD => 3.0,
        Education::Unrecognized(_) => 1.0,
    }
}

fn location_code(location: &Location) -> f64 {
    match location {
        Location::Rural => 0.0,
        Location::Suburban => 1.0,
        Location::Urban => 2.0,
        Location::Unrecognized(_) => 1.0,
    }
}

// Developer and Designer were not in the training data; they borrow the codes
// of Engineer and Specialist.
fn job_title_code(job_title: &JobTitle) -> f64 {
    match job_title {
        JobTitle::Analyst => 0.0,
        JobTitle::Consultant => 1.0,
        JobTitle::Director => 2.0,
        JobTitle::Engineer | JobTitle::Developer => 3.0,
        JobTitle::Manager => 4.0,
        JobTitle::Specialist | JobTitle::Designer => 5.0,
        JobTitle::Unrecognized(_) => 4.0,
    }
}

fn gender_code(gender: &Gender) -> f64 {
    match gender {
        Gender::Male => 1.0,
        Gender::Female | Gender::Other => 0.0,
        Gender::Unrecognized(_) => 0.0,
    }
}
