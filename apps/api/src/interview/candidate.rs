//! Candidate profile: collected field by field, frozen once complete.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").expect("valid email regex")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("valid phone regex"));

/// The information fields, in the order they are asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoField {
    Name,
    Email,
    Phone,
    Position,
    Experience,
    Location,
    TechStack,
}

impl InfoField {
    /// The question the assistant asks for this field.
    pub fn prompt(&self) -> &'static str {
        match self {
            InfoField::Name => "May I have your full name?",
            InfoField::Email => "What's your professional email address?",
            InfoField::Phone => {
                "Please share your phone number (international format: +[country code][number])"
            }
            InfoField::Position => "What specific position are you applying for?",
            InfoField::Experience => {
                "How many years of relevant experience do you have in this field?"
            }
            InfoField::Location => "Where are you currently located (city, country)?",
            InfoField::TechStack => "Please list your technical skills (comma-separated):",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("{0:?} cannot be blank")]
    Blank(InfoField),

    #[error("invalid email address")]
    InvalidEmail,

    #[error("invalid phone number")]
    InvalidPhone,

    #[error("invalid years of experience")]
    InvalidExperience,

    #[error("no technologies listed")]
    EmptyTechStack,
}

impl FieldError {
    /// The re-prompt shown to the candidate.
    pub fn hint(&self) -> String {
        match self {
            FieldError::Blank(field) => format!("⚠️ This field is required. {}", field.prompt()),
            FieldError::InvalidEmail => {
                "⚠️ Please enter a valid email address (e.g., name@company.com)".to_string()
            }
            FieldError::InvalidPhone => {
                "⚠️ Please enter a valid phone number (e.g., +1234567890)".to_string()
            }
            FieldError::InvalidExperience => {
                "⚠️ Please enter valid years of experience (e.g., 3)".to_string()
            }
            FieldError::EmptyTechStack => {
                "⚠️ Please list at least one technology (e.g., Python, SQL)".to_string()
            }
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Concatenates every digit in the answer: "5 years" → 5. `None` when there are no digits.
/// Values too large for `u32` saturate, since every large count maps to the senior level.
pub fn parse_years(experience: &str) -> Option<u32> {
    let digits: String = experience.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    Some(digits.parse().unwrap_or(u32::MAX))
}

/// Splits a comma-separated list, dropping blanks and case-insensitive duplicates.
pub fn parse_tech_stack(raw: &str) -> Vec<String> {
    let mut stack: Vec<String> = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !stack.iter().any(|t| t.eq_ignore_ascii_case(item)) {
            stack.push(item.to_string());
        }
    }
    stack
}

/// A complete candidate profile. There are no mutators: build it with [`CandidateDraft`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    name: String,
    email: String,
    phone: String,
    position: String,
    experience: String,
    years_experience: u32,
    location: String,
    tech_stack: Vec<String>,
}

impl Candidate {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    /// The answer as typed, e.g. "5 years".
    pub fn experience(&self) -> &str {
        &self.experience
    }

    pub fn years_experience(&self) -> u32 {
        self.years_experience
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn tech_stack(&self) -> &[String] {
        &self.tech_stack
    }
}

/// Partially collected candidate fields.
#[derive(Debug, Clone, Default)]
pub struct CandidateDraft {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    position: Option<String>,
    experience: Option<(String, u32)>,
    location: Option<String>,
    tech_stack: Option<Vec<String>>,
}

impl CandidateDraft {
    /// The first field that has not been accepted yet.
    pub fn next_missing(&self) -> Option<InfoField> {
        if self.name.is_none() {
            Some(InfoField::Name)
        } else if self.email.is_none() {
            Some(InfoField::Email)
        } else if self.phone.is_none() {
            Some(InfoField::Phone)
        } else if self.position.is_none() {
            Some(InfoField::Position)
        } else if self.experience.is_none() {
            Some(InfoField::Experience)
        } else if self.location.is_none() {
            Some(InfoField::Location)
        } else if self.tech_stack.is_none() {
            Some(InfoField::TechStack)
        } else {
            None
        }
    }

    /// Validates and stores one field. On error the draft is unchanged.
    pub fn accept(&mut self, field: InfoField, raw: &str) -> Result<(), FieldError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(FieldError::Blank(field));
        }

        match field {
            InfoField::Name => self.name = Some(value.to_string()),
            InfoField::Email => {
                if !is_valid_email(value) {
                    return Err(FieldError::InvalidEmail);
                }
                self.email = Some(value.to_string());
            }
            InfoField::Phone => {
                if !is_valid_phone(value) {
                    return Err(FieldError::InvalidPhone);
                }
                self.phone = Some(value.to_string());
            }
            InfoField::Position => self.position = Some(value.to_string()),
            InfoField::Experience => {
                let years = parse_years(value).ok_or(FieldError::InvalidExperience)?;
                self.experience = Some((value.to_string(), years));
            }
            InfoField::Location => self.location = Some(value.to_string()),
            InfoField::TechStack => {
                let stack = parse_tech_stack(value);
                if stack.is_empty() {
                    return Err(FieldError::EmptyTechStack);
                }
                self.tech_stack = Some(stack);
            }
        }
        Ok(())
    }

    /// Builds the frozen profile once every field is present.
    pub fn finish(&self) -> Option<Candidate> {
        let (experience, years_experience) = self.experience.clone()?;
        Some(Candidate {
            name: self.name.clone()?,
            email: self.email.clone()?,
            phone: self.phone.clone()?,
            position: self.position.clone()?,
            experience,
            years_experience,
            location: self.location.clone()?,
            tech_stack: self.tech_stack.clone()?,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn position(&self) -> Option<&str> {
        self.position.as_deref()
    }

    pub fn experience(&self) -> Option<&str> {
        self.experience.as_ref().map(|(raw, _)| raw.as_str())
    }

    pub fn tech_stack(&self) -> &[String] {
        self.tech_stack.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) fn sample_candidate(stack: &str) -> Candidate {
    sample_candidate_named("Ada Lovelace", stack)
}

#[cfg(test)]
pub(crate) fn sample_candidate_named(name: &str, stack: &str) -> Candidate {
    let mut draft = CandidateDraft::default();
    draft.accept(InfoField::Name, name).unwrap();
    draft.accept(InfoField::Email, "ada@example.com").unwrap();
    draft.accept(InfoField::Phone, "+441234567890").unwrap();
    draft.accept(InfoField::Position, "Backend Engineer").unwrap();
    draft.accept(InfoField::Experience, "5 years").unwrap();
    draft.accept(InfoField::Location, "London, UK").unwrap();
    draft.accept(InfoField::TechStack, stack).unwrap();
    draft.finish().unwrap()
}
