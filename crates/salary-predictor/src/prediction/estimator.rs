//! Heuristic salary estimate used while no trained model is loaded.

use rand::Rng;

use super::domain::{Education, Gender, JobTitle, Location, SalaryInput};

pub const BASE_SALARY: f64 = 50_000.0;
pub const EXPERIENCE_RATE: f64 = 0.05;
pub const JITTER_SPREAD: f64 = 0.1;
pub const JITTER_FLOOR: f64 = 1.0 - JITTER_SPREAD / 2.0;

/// Salary before the random jitter is applied.
pub fn base_estimate(input: &SalaryInput) -> f64 {
    BASE_SALARY
        * education_multiplier(&input.education)
        * job_multiplier(&input.job_title)
        * location_multiplier(&input.location)
        * gender_multiplier(&input.gender)
        * (1.0 + input.years_of_experience * EXPERIENCE_RATE)
        * age_factor(input.age)
}

/// Base estimate scaled by a uniform jitter in `[0.95, 1.05]`, rounded to cents.
pub fn estimate<R: Rng + ?Sized>(input: &SalaryInput, rng: &mut R) -> f64 {
    let jitter = JITTER_FLOOR + rng.gen::<f64>() * JITTER_SPREAD;
    round_to(base_estimate(input) * jitter, 2)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn education_multiplier(education: &Education) -> f64 {
    match education {
        Education::HighSchool => 1.0,
        Education::Bachelor => 1.3,
        Education::Master => 1.6,
        Education::PhD => 2.0,
        Education::Unrecognized(_) => 1.0,
    }
}

fn job_multiplier(job_title: &JobTitle) -> f64 {
    match job_title {
        JobTitle::Manager => 1.5,
        JobTitle::Developer => 1.4,
        JobTitle::Analyst => 1.2,
        JobTitle::Designer => 1.1,
        JobTitle::Engineer => 1.4,
        JobTitle::Director => 1.8,
        JobTitle::Consultant => 1.3,
        JobTitle::Specialist => 1.2,
        JobTitle::Unrecognized(_) => 1.0,
    }
}

fn location_multiplier(location: &Location) -> f64 {
    match location {
        Location::Urban => 1.3,
        Location::Suburban => 1.1,
        Location::Rural => 0.9,
        Location::Unrecognized(_) => 1.0,
    }
}

fn gender_multiplier(gender: &Gender) -> f64 {
    match gender {
        Gender::Female => 0.95,
        Gender::Male | Gender::Other | Gender::Unrecognized(_) => 1.0,
    }
}

fn age_factor(age: u32) -> f64 {
    match age {
        35..=50 => 1.1,
        0..=24 => 0.9,
        _ => 1.0,
    }
}
