//! Insurance premium input schema and model features.
//!
//! The prediction model is an external collaborator. This module validates
//! the applicant input, derives the feature row the model was trained on and
//! defines the [`PremiumModel`] seam a trained model plugs into.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validation::{
    FieldError, FieldReader, ValidationErrors, check_open_range, check_positive,
};

pub const TIER_1_CITIES: &[&str] = &[
    "Mumbai",
    "Delhi",
    "Bangalore",
    "Chennai",
    "Kolkata",
    "Hyderabad",
    "Pune",
];

pub const TIER_2_CITIES: &[&str] = &[
    "Jaipur",
    "Chandigarh",
    "Indore",
    "Lucknow",
    "Patna",
    "Ranchi",
    "Visakhapatnam",
    "Coimbatore",
    "Bhopal",
    "Nagpur",
    "Vadodara",
    "Surat",
    "Rajkot",
    "Jodhpur",
    "Raipur",
    "Amritsar",
    "Varanasi",
    "Agra",
    "Dehradun",
    "Mysore",
    "Jabalpur",
    "Guwahati",
    "Thiruvananthapuram",
    "Ludhiana",
    "Nashik",
    "Allahabad",
    "Udaipur",
    "Aurangabad",
    "Hubli",
    "Belgaum",
    "Salem",
    "Vijayawada",
    "Tiruchirappalli",
    "Bhavnagar",
    "Gwalior",
    "Dhanbad",
    "Bareilly",
    "Aligarh",
    "Gaya",
    "Kozhikode",
    "Warangal",
    "Kolhapur",
    "Bilaspur",
    "Jalandhar",
    "Noida",
    "Guntur",
    "Asansol",
    "Siliguri",
];

/// Maximum accepted height in meters (exclusive).
pub const MAX_HEIGHT_M: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupation {
    Retired,
    Freelancer,
    Student,
    GovernmentJob,
    BusinessOwner,
    Unemployed,
    PrivateJob,
}

impl Occupation {
    pub const ALL: [Occupation; 7] = [
        Occupation::Retired,
        Occupation::Freelancer,
        Occupation::Student,
        Occupation::GovernmentJob,
        Occupation::BusinessOwner,
        Occupation::Unemployed,
        Occupation::PrivateJob,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Occupation::Retired => "retired",
            Occupation::Freelancer => "freelancer",
            Occupation::Student => "student",
            Occupation::GovernmentJob => "government_job",
            Occupation::BusinessOwner => "business_owner",
            Occupation::Unemployed => "unemployed",
            Occupation::PrivateJob => "private_job",
        }
    }
}

impl FromStr for Occupation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Occupation::ALL.into_iter().find(|o| o.as_str() == s).ok_or(())
    }
}

/// Feature values use the spellings the model was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "young")]
    Young,
    #[serde(rename = "adult")]
    Adult,
    #[serde(rename = "middle-aged")]
    MiddleAged,
    #[serde(rename = "senior")]
    Senior,
}

impl AgeGroup {
    pub fn from_age(age: u32) -> Self {
        match age {
            0..25 => AgeGroup::Young,
            25..45 => AgeGroup::Adult,
            45..60 => AgeGroup::MiddleAged,
            _ => AgeGroup::Senior,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifestyleRisk {
    Low,
    Medium,
    High,
}

impl LifestyleRisk {
    pub fn assess(smoker: bool, bmi: f64) -> Self {
        if smoker && bmi > 30.0 {
            LifestyleRisk::High
        } else if smoker || bmi > 27.0 {
            LifestyleRisk::Medium
        } else {
            LifestyleRisk::Low
        }
    }
}

/// 1 for metros, 2 for the listed tier-2 cities, 3 for everything else.
pub fn city_tier(city: &str) -> u8 {
    if TIER_1_CITIES.contains(&city) {
        1
    } else if TIER_2_CITIES.contains(&city) {
        2
    } else {
        3
    }
}

/// Validated applicant data for a premium prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct PremiumInput {
    pub age: u32,
    pub weight: f64,
    pub height: f64,
    pub income_lpa: f64,
    pub smoker: bool,
    pub city: String,
    pub occupation: Occupation,
}

impl PremiumInput {
    pub fn from_json(value: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(value)?;
        let age = reader.integer("age", true);
        let weight = reader.number("weight", true);
        let height = reader.number("height", true);
        let income_lpa = reader.number("income_lpa", true);
        let smoker = reader.boolean("smoker", true);
        let city = reader.string("city", true);
        let occupation = reader.string("occupation", true);
        let mut errors = reader.errors;

        if let Some(age) = age {
            errors.record(check_open_range("age", age, 0, 100));
        }
        if let Some(weight) = weight {
            errors.record(check_positive("weight", weight));
        }
        if let Some(height) = height {
            errors.record(check_positive("height", height));
            if height >= MAX_HEIGHT_M {
                errors.push(FieldError::constraint(
                    "height",
                    format!("must be less than {MAX_HEIGHT_M}"),
                ));
            }
        }
        if let Some(income) = income_lpa {
            errors.record(check_positive("income_lpa", income));
        }
        let occupation = occupation.and_then(|o| match o.parse::<Occupation>() {
            Ok(o) => Some(o),
            Err(()) => {
                let allowed: Vec<_> = Occupation::ALL.iter().map(Occupation::as_str).collect();
                errors.push(FieldError::constraint(
                    "occupation",
                    format!("must be one of {}", allowed.join(", ")),
                ));
                None
            }
        });

        match (age, weight, height, income_lpa, smoker, city, occupation) {
            (
                Some(age),
                Some(weight),
                Some(height),
                Some(income_lpa),
                Some(smoker),
                Some(city),
                Some(occupation),
            ) if errors.is_empty() => Ok(Self {
                age: age as u32,
                weight,
                height,
                income_lpa,
                smoker,
                city,
                occupation,
            }),
            _ => Err(errors),
        }
    }

    /// Unrounded `weight / height^2`; the model was trained on raw values.
    pub fn bmi(&self) -> f64 {
        self.weight / (self.height * self.height)
    }

    pub fn age_group(&self) -> AgeGroup {
        AgeGroup::from_age(self.age)
    }

    pub fn lifestyle_risk(&self) -> LifestyleRisk {
        LifestyleRisk::assess(self.smoker, self.bmi())
    }

    pub fn city_tier(&self) -> u8 {
        city_tier(&self.city)
    }

    pub fn features(&self) -> PremiumFeatures {
        PremiumFeatures {
            bmi: self.bmi(),
            age_group: self.age_group(),
            lifestyle_risk: self.lifestyle_risk(),
            city_tier: self.city_tier(),
            income_lpa: self.income_lpa,
            occupation: self.occupation,
        }
    }
}

/// One model input row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PremiumFeatures {
    pub bmi: f64,
    pub age_group: AgeGroup,
    pub lifestyle_risk: LifestyleRisk,
    pub city_tier: u8,
    pub income_lpa: f64,
    pub occupation: Occupation,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("prediction failed: {0}")]
    Prediction(String),
}

/// A trained premium classifier.
pub trait PremiumModel: Send + Sync {
    /// Returns the predicted premium category for one feature row.
    fn predict(&self, features: &PremiumFeatures) -> Result<String, ModelError>;
}
