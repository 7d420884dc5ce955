//! Profile helpers
//!
//! BMI derivation and the edit form's conversion into a `PUT /profile`
//! body.

use serde::{Deserialize, Serialize};

use crate::api::{HealthMetadata, ProfileUpdate, UserProfile};

pub const PROFILE_UPDATED_MESSAGE: &str = "Profile updated successfully!";
pub const PROFILE_UPDATE_FAILED_MESSAGE: &str = "Failed to update profile";
pub const PREFERENCES_UPDATED_MESSAGE: &str = "Privacy settings updated";
pub const PROFILE_LOAD_FAILED_MESSAGE: &str = "Failed to load profile data";
pub const BMI_PROMPT: &str = "Enter height and weight";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Underweight => "Underweight",
            Self::Normal => "Normal weight",
            Self::Overweight => "Overweight",
            Self::Obese => "Obese",
        }
    }

    /// CSS class suffix
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Underweight => "underweight",
            Self::Normal => "normal",
            Self::Overweight => "overweight",
            Self::Obese => "obese",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bmi {
    /// Rounded to one decimal
    pub value: f64,
    pub category: BmiCategory,
}

impl Bmi {
    /// From height in centimetres and weight in kilograms
    pub fn calculate(height_cm: f64, weight_kg: f64) -> Option<Self> {
        if !(height_cm.is_finite() && weight_kg.is_finite()) || height_cm <= 0.0 || weight_kg <= 0.0 {
            return None;
        }
        let metres = height_cm / 100.0;
        let bmi = weight_kg / (metres * metres);
        Some(Self {
            value: (bmi * 10.0).round() / 10.0,
            category: BmiCategory::from_bmi(bmi),
        })
    }

    pub fn from_metadata(metadata: &HealthMetadata) -> Option<Self> {
        Self::calculate(metadata.height?, metadata.weight?)
    }

    pub fn for_profile(profile: &UserProfile) -> Option<Self> {
        profile.metadata.as_ref().and_then(Self::from_metadata)
    }
}

/// Values typed into the edit form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub phone: String,
    pub date_of_birth: String,
    pub gender: String,
    pub metadata: HealthMetadata,
}

impl ProfileForm {
    /// Prefill from the stored profile
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            name: profile.name.clone().unwrap_or_default(),
            phone: profile.phone.clone().unwrap_or_default(),
            date_of_birth: profile.date_of_birth.clone().unwrap_or_default(),
            gender: profile.gender.clone().unwrap_or_default(),
            metadata: profile.metadata.clone().unwrap_or_default(),
        }
    }

    /// Request body; blank optional fields are sent as absent
    pub fn into_update(self) -> ProfileUpdate {
        let mut metadata = self.metadata;
        metadata.blood_type = non_blank(metadata.blood_type);
        metadata.allergies = non_blank(metadata.allergies);
        metadata.medications = non_blank(metadata.medications);
        metadata.medical_conditions = non_blank(metadata.medical_conditions);
        metadata.height = metadata.height.filter(|h| h.is_finite() && *h > 0.0);
        metadata.weight = metadata.weight.filter(|w| w.is_finite() && *w > 0.0);
        if let Some(contact) = metadata.emergency_contact.as_mut() {
            contact.name = non_blank(contact.name.take());
            contact.relationship = non_blank(contact.relationship.take());
            contact.phone = non_blank(contact.phone.take());
        }

        ProfileUpdate {
            name: Some(self.name.trim().to_string()),
            phone: non_blank(Some(self.phone)),
            date_of_birth: non_blank(Some(self.date_of_birth)),
            gender: non_blank(Some(self.gender)),
            metadata: Some(metadata),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Format a US phone number as the user types: `(555) 123-4567`
pub fn format_phone_number(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();

    if digits.len() >= 6 {
        let end = digits.len().min(10);
        format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..end])
    } else if digits.len() >= 3 {
        format!("({}) {}", &digits[..3], &digits[3..])
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::EmergencyContact;

    #[test]
    fn test_bmi_categories() {
        let bmi = Bmi::calculate(180.0, 75.0).unwrap();
        assert_eq!(bmi.value, 23.1);
        assert_eq!(bmi.category, BmiCategory::Normal);
        assert_eq!(bmi.category.label(), "Normal weight");

        assert_eq!(Bmi::calculate(180.0, 55.0).unwrap().category, BmiCategory::Underweight);
        assert_eq!(Bmi::calculate(170.0, 80.0).unwrap().category, BmiCategory::Overweight);
        assert_eq!(Bmi::calculate(160.0, 90.0).unwrap().category, BmiCategory::Obese);
    }

    #[test]
    fn test_bmi_requires_inputs() {
        assert!(Bmi::calculate(0.0, 70.0).is_none());
        assert!(Bmi::calculate(170.0, f64::NAN).is_none());
        assert!(Bmi::from_metadata(&HealthMetadata {
            height: Some(170.0),
            ..Default::default()
        })
        .is_none());
    }

    #[test]
    fn test_form_into_update() {
        let form = ProfileForm {
            name: "  Ada Lovelace ".into(),
            phone: "".into(),
            date_of_birth: "1990-01-01".into(),
            gender: " ".into(),
            metadata: HealthMetadata {
                height: Some(0.0),
                allergies: Some("  ".into()),
                emergency_contact: Some(EmergencyContact {
                    name: Some("Bob".into()),
                    relationship: Some("".into()),
                    phone: None,
                }),
                ..Default::default()
            },
        };

        let update = form.into_update();
        assert_eq!(update.name.as_deref(), Some("Ada Lovelace"));
        assert!(update.phone.is_none());
        assert!(update.gender.is_none());
        assert_eq!(update.date_of_birth.as_deref(), Some("1990-01-01"));

        let metadata = update.metadata.unwrap();
        assert!(metadata.height.is_none());
        assert!(metadata.allergies.is_none());
        let contact = metadata.emergency_contact.unwrap();
        assert_eq!(contact.name.as_deref(), Some("Bob"));
        assert!(contact.relationship.is_none());
    }

    #[test]
    fn test_format_phone_number() {
        assert_eq!(format_phone_number("5551234567"), "(555) 123-4567");
        assert_eq!(format_phone_number("555-1"), "(555) 1");
        assert_eq!(format_phone_number("55"), "55");
        assert_eq!(format_phone_number("555123456789"), "(555) 123-4567");
    }
}
