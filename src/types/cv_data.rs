// src/types/cv_data.rs
//! CV record schema shared by the persistence layer and the HTTP surface.
//!
//! Wire names match the stored document exactly (camelCase where the web
//! client uses it), so a saved record round-trips byte-for-byte through
//! `/api/cv-data`. Every field defaults to empty and unknown fields are
//! ignored on input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminator value that singles out the one CV document.
pub const CV_DOCUMENT_KIND: &str = "main_cv";

fn generated_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceItem {
    pub dates: String,
    pub location: String,
    pub position: String,
    pub company: String,
    pub description: String,
    pub sector: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationItem {
    pub dates: String,
    pub location: String,
    pub degree: String,
    pub institution: String,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageSkill {
    pub name: String,
    pub level: String,
    pub listening: String,
    pub speaking: String,
    pub reading: String,
    pub writing: String,
}

/// User-defined titled content block with an explicit position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomSection {
    #[serde(default = "generated_id")]
    pub id: String,
    pub title_hr: String,
    pub title_en: String,
    pub content_hr: String,
    pub content_en: String,
    pub order: i32,
}

impl Default for CustomSection {
    fn default() -> Self {
        Self {
            id: generated_id(),
            title_hr: String::new(),
            title_en: String::new(),
            content_hr: String::new(),
            content_en: String::new(),
            order: 0,
        }
    }
}

/// The singleton CV document. Mutated wholesale on each save.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CvRecord {
    pub name: String,
    pub title_hr: String,
    pub title_en: String,
    #[serde(rename = "dateOfBirth")]
    pub date_of_birth: String,
    pub citizenship_hr: String,
    pub citizenship_en: String,
    pub gender_hr: String,
    pub gender_en: String,
    pub address_hr: String,
    pub address_en: String,
    #[serde(rename = "maritalStatus_hr")]
    pub marital_status_hr: String,
    #[serde(rename = "maritalStatus_en")]
    pub marital_status_en: String,
    pub children_hr: String,
    pub children_en: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub linkedin: String,
    pub whatsapp: String,
    #[serde(rename = "drivingLicense")]
    pub driving_license: String,
    #[serde(rename = "profileImage")]
    pub profile_image: Option<String>,
    pub about_hr: String,
    pub about_en: String,
    pub experience_hr: Vec<ExperienceItem>,
    pub experience_en: Vec<ExperienceItem>,
    pub education_hr: Vec<EducationItem>,
    pub education_en: Vec<EducationItem>,
    #[serde(rename = "motherTongues_hr")]
    pub mother_tongues_hr: Vec<String>,
    #[serde(rename = "motherTongues_en")]
    pub mother_tongues_en: Vec<String>,
    #[serde(rename = "otherLanguages")]
    pub other_languages: Vec<LanguageSkill>,
    pub skills_hr: Vec<String>,
    pub skills_en: Vec<String>,
    #[serde(rename = "customSections")]
    pub custom_sections: Vec<CustomSection>,
    #[serde(rename = "enableQRCode")]
    pub enable_qr_code: bool,
    #[serde(rename = "qrCodeUrl")]
    pub qr_code_url: Option<String>,
}

/// Health-check ping. Append-only, no update or delete.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatusCheck {
    pub id: String,
    pub client_name: String,
    pub timestamp: DateTime<Utc>,
}

impl StatusCheck {
    pub fn new(client_name: String) -> Self {
        Self {
            id: generated_id(),
            client_name,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusCheckCreate {
    pub client_name: String,
}

/// Body of `POST /api/export-pdf`: a language tag plus the flattened CV
/// payload (the caller has already picked the bilingual variant).
#[derive(Debug, Deserialize)]
pub struct PdfExportRequest {
    pub language: String,
    #[serde(rename = "cvData")]
    pub cv_data: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_deserializes_to_defaults() {
        let record: CvRecord = serde_json::from_str("{}").unwrap();
        assert!(record.name.is_empty());
        assert!(record.experience_hr.is_empty());
        assert!(record.custom_sections.is_empty());
        assert!(!record.enable_qr_code);
        assert!(record.profile_image.is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let record: CvRecord =
            serde_json::from_str(r#"{"name": "Ana", "not_a_field": 42}"#).unwrap();
        assert_eq!(record.name, "Ana");
    }

    #[test]
    fn wire_names_round_trip() {
        let mut record = CvRecord::default();
        record.date_of_birth = "01.01.1990".to_string();
        record.marital_status_hr = "udana".to_string();
        record.mother_tongues_hr = vec!["Hrvatski".to_string()];

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["dateOfBirth"], "01.01.1990");
        assert_eq!(value["maritalStatus_hr"], "udana");
        assert_eq!(value["motherTongues_hr"][0], "Hrvatski");
        assert!(value.get("date_of_birth").is_none());

        let back: CvRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back.date_of_birth, record.date_of_birth);
        assert_eq!(back.marital_status_hr, record.marital_status_hr);
    }

    #[test]
    fn custom_section_gets_generated_id() {
        let section: CustomSection =
            serde_json::from_str(r#"{"title_hr": "Projekti", "order": 2}"#).unwrap();
        assert!(!section.id.is_empty());
        assert_eq!(section.order, 2);

        let explicit: CustomSection =
            serde_json::from_str(r#"{"id": "abc", "order": 0}"#).unwrap();
        assert_eq!(explicit.id, "abc");
    }

    #[test]
    fn status_check_has_id_and_timestamp() {
        let check = StatusCheck::new("monitor".to_string());
        assert_eq!(check.client_name, "monitor");
        assert_eq!(check.id.len(), 36);
    }

    #[test]
    fn export_request_requires_cv_data() {
        let ok: Result<PdfExportRequest, _> =
            serde_json::from_str(r#"{"language": "EN", "cvData": {}}"#);
        assert!(ok.is_ok());

        let missing: Result<PdfExportRequest, _> =
            serde_json::from_str(r#"{"language": "EN"}"#);
        assert!(missing.is_err());
    }
}
