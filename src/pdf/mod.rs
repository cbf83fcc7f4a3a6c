// src/pdf/mod.rs
//! CV document renderer.
//!
//! Takes the flattened export payload (the caller has already picked the
//! bilingual variant of every field) plus a `labels` translation map and
//! produces a paginated A4 PDF mirroring the web presentation.

pub mod layout;
pub mod photo;

use anyhow::{Context, Result};
use chrono::Datelike;
use image::RgbImage;
use printpdf::{Mm, PdfDocument};
use serde_json::Value;
use std::path::Path;

use crate::utils::{list_field, sanitize_file_stem, text_field, Language};
use layout::{
    line_height_mm, palette, paragraph_height_mm, styles, wrap_text, Composer, FontSet,
    PanelLine, MARGIN_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM,
};

type JsonMap = serde_json::Map<String, Value>;

/// Rendered diameter of the circular profile photo.
const PHOTO_SIZE_MM: f64 = 35.0;

fn label<'a>(data: &'a JsonMap, key: &str, fallback: &'a str) -> &'a str {
    data.get("labels")
        .and_then(Value::as_object)
        .and_then(|labels| labels.get(key))
        .and_then(Value::as_str)
        .unwrap_or(fallback)
}

/// Content-Disposition filename for an export, derived from the CV name.
pub fn export_filename(data: &JsonMap, language: Language) -> String {
    let stem = sanitize_file_stem(text_field(data, "name"));
    if stem.is_empty() {
        format!("CV_Europass_{}.pdf", language.code())
    } else {
        format!("{}_CV_Europass_{}.pdf", stem, language.code())
    }
}

/// Render the flattened CV payload into PDF bytes. The photo, when
/// present, has already been composited by [`photo`].
pub fn render_cv(
    data: &JsonMap,
    language: Language,
    profile_photo: Option<&RgbImage>,
    fonts_dir: &Path,
) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        "Europass CV",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "content",
    );
    let fonts = FontSet::load(&doc, fonts_dir)?;
    let mut composer = Composer::new(&doc, &fonts, doc.get_page(page).get_layer(layer));

    render_header(&mut composer, data, profile_photo)?;

    composer.spacer(6.0);
    composer.rule(1.0, palette::SLATE_200);
    composer.spacer(4.0);

    render_info_panel(&mut composer, data);
    render_about(&mut composer, data);
    render_experience(&mut composer, data);
    render_education(&mut composer, data);
    render_skills_and_languages(&mut composer, data, language);
    render_custom_sections(&mut composer, data);
    render_footer(&mut composer, data);

    doc.save_to_bytes().context("Failed to serialize PDF document")
}

fn contact_line(data: &JsonMap) -> String {
    format!(
        "Email: {}   |   Tel: {}",
        text_field(data, "email"),
        text_field(data, "phone")
    )
}

fn render_header(
    composer: &mut Composer<'_>,
    data: &JsonMap,
    profile_photo: Option<&RgbImage>,
) -> Result<()> {
    let name = text_field(data, "name");
    let title = text_field(data, "title");

    let Some(canvas) = profile_photo else {
        composer.paragraph(name, &styles::NAME);
        composer.paragraph(title, &styles::TITLE);
        composer.paragraph(&contact_line(data), &styles::SMALL);
        return Ok(());
    };

    composer.ensure_space(PHOTO_SIZE_MM + 4.0);
    let top = composer.cursor();
    composer.place_photo(canvas, MARGIN_MM, top, PHOTO_SIZE_MM)?;

    let text_x = MARGIN_MM + PHOTO_SIZE_MM + 5.0;
    let text_width = composer.content_width() - PHOTO_SIZE_MM - 5.0;

    let mut y = top + 4.0;
    if !name.is_empty() {
        composer.place_line(text_x, y, name, &styles::NAME);
        y += line_height_mm(&styles::NAME) + styles::NAME.space_after;
    }
    for line in wrap_text(title, &styles::TITLE, text_width) {
        composer.place_line(text_x, y, &line, &styles::TITLE);
        y += line_height_mm(&styles::TITLE);
    }
    y += styles::TITLE.space_after;
    composer.place_line(text_x, y, &contact_line(data), &styles::SMALL);
    y += line_height_mm(&styles::SMALL);

    composer.advance(PHOTO_SIZE_MM.max(y - top));
    Ok(())
}

fn render_info_panel(composer: &mut Composer<'_>, data: &JsonMap) {
    let contact_column = vec![
        PanelLine::Heading(label(data, "contact", "Kontakt").to_string()),
        PanelLine::Field {
            label: "Adresa".to_string(),
            value: text_field(data, "address").to_string(),
        },
        PanelLine::Field {
            label: "Email".to_string(),
            value: text_field(data, "email").to_string(),
        },
        PanelLine::Field {
            label: "Tel".to_string(),
            value: text_field(data, "phone").to_string(),
        },
        PanelLine::Field {
            label: "Web".to_string(),
            value: text_field(data, "website").to_string(),
        },
        PanelLine::Field {
            label: "LinkedIn".to_string(),
            value: text_field(data, "linkedin").to_string(),
        },
    ];

    let personal_column = vec![
        PanelLine::Heading(label(data, "personalInfo", "Osobni podaci").to_string()),
        PanelLine::Field {
            label: label(data, "dateOfBirth", "Datum rođenja").to_string(),
            value: text_field(data, "dateOfBirth").to_string(),
        },
        PanelLine::Field {
            label: label(data, "citizenship", "Državljanstvo").to_string(),
            value: text_field(data, "citizenship").to_string(),
        },
        PanelLine::Field {
            label: label(data, "gender", "Spol").to_string(),
            value: text_field(data, "gender").to_string(),
        },
        PanelLine::Field {
            label: label(data, "maritalStatus", "Bračni status").to_string(),
            value: text_field(data, "maritalStatus").to_string(),
        },
        PanelLine::Field {
            label: label(data, "drivingLicense", "Vozačka dozvola").to_string(),
            value: text_field(data, "drivingLicense").to_string(),
        },
    ];

    composer.panel(&[contact_column, personal_column]);
}

fn section_title(composer: &mut Composer<'_>, title: &str) {
    composer.spacer(6.0);
    composer.paragraph(title, &styles::SECTION);
}

fn render_about(composer: &mut Composer<'_>, data: &JsonMap) {
    section_title(composer, label(data, "about", "O meni"));
    composer.paragraph(text_field(data, "about"), &styles::BODY);
}

fn render_experience(composer: &mut Composer<'_>, data: &JsonMap) {
    section_title(composer, label(data, "experience", "Radno iskustvo"));

    for entry in list_field(data, "experience") {
        let Some(item) = entry.as_object() else { continue };
        let dates = text_field(item, "dates");
        let location = text_field(item, "location");
        let position = text_field(item, "position");
        let company = text_field(item, "company");
        let description = text_field(item, "description");
        let website = text_field(item, "website");

        let date_line = if dates.is_empty() && location.is_empty() {
            String::new()
        } else {
            format!("{} • {}", dates, location)
        };
        let website_line = if website.is_empty() {
            String::new()
        } else {
            format!("Web: {}", website)
        };

        // Measure the block up front so it never splits across a page.
        let width = composer.content_width();
        let block_height = paragraph_height_mm(&date_line, &styles::DATE, width)
            + paragraph_height_mm(position, &styles::JOB, width)
            + paragraph_height_mm(company, &styles::COMPANY, width)
            + paragraph_height_mm(description, &styles::BODY, width)
            + paragraph_height_mm(&website_line, &styles::SMALL, width)
            + 2.0;
        composer.ensure_space(block_height);

        composer.paragraph(&date_line, &styles::DATE);
        composer.paragraph(position, &styles::JOB);
        composer.paragraph(company, &styles::COMPANY);
        composer.paragraph(description, &styles::BODY);
        composer.paragraph(&website_line, &styles::SMALL);
        composer.spacer(2.0);
    }
}

fn render_education(composer: &mut Composer<'_>, data: &JsonMap) {
    section_title(composer, label(data, "education", "Obrazovanje"));

    for entry in list_field(data, "education") {
        let Some(item) = entry.as_object() else { continue };
        let dates = text_field(item, "dates");
        let location = text_field(item, "location");
        let degree = text_field(item, "degree");
        let institution = text_field(item, "institution");
        let website = text_field(item, "website");

        let date_line = if dates.is_empty() && location.is_empty() {
            String::new()
        } else {
            format!("{} • {}", dates, location)
        };
        let website_line = if website.is_empty() {
            String::new()
        } else {
            format!("Web: {}", website)
        };

        let width = composer.content_width();
        let block_height = paragraph_height_mm(&date_line, &styles::DATE, width)
            + paragraph_height_mm(degree, &styles::JOB, width)
            + paragraph_height_mm(institution, &styles::COMPANY, width)
            + paragraph_height_mm(&website_line, &styles::SMALL, width)
            + 2.0;
        composer.ensure_space(block_height);

        composer.paragraph(&date_line, &styles::DATE);
        composer.paragraph(degree, &styles::JOB);
        composer.paragraph(institution, &styles::COMPANY);
        composer.paragraph(&website_line, &styles::SMALL);
        composer.spacer(2.0);
    }
}

fn render_skills_and_languages(composer: &mut Composer<'_>, data: &JsonMap, language: Language) {
    let skills: Vec<&str> = list_field(data, "skills")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    let mother_tongues: Vec<&str> = list_field(data, "motherTongues")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    let other_languages = list_field(data, "otherLanguages");

    let mut skills_column = Vec::new();
    if !skills.is_empty() {
        skills_column.push(PanelLine::Heading(
            label(data, "skills", "Vještine").to_string(),
        ));
        skills_column.push(PanelLine::Text(skills.join(" • ")));
    }

    let mut language_column = Vec::new();
    if !mother_tongues.is_empty() || !other_languages.is_empty() {
        language_column.push(PanelLine::Heading(
            label(data, "languages", "Jezici").to_string(),
        ));
    }
    if !mother_tongues.is_empty() {
        language_column.push(PanelLine::Field {
            label: label(data, "motherTongue", "Materinski").to_string(),
            value: mother_tongues.join(", "),
        });
    }
    if !other_languages.is_empty() {
        language_column.push(PanelLine::Heading(format!(
            "{}:",
            label(data, "otherLanguages", "Ostali")
        )));
        for entry in other_languages {
            let Some(item) = entry.as_object() else { continue };
            let name = language.pick_variant(text_field(item, "name"));
            language_column.push(PanelLine::Text(format!(
                "{}: {}",
                name,
                text_field(item, "level")
            )));
        }
    }

    if skills_column.is_empty() && language_column.is_empty() {
        return;
    }

    composer.spacer(4.0);
    composer.panel(&[skills_column, language_column]);
}

fn render_custom_sections(composer: &mut Composer<'_>, data: &JsonMap) {
    for entry in list_field(data, "customSections") {
        let Some(section) = entry.as_object() else { continue };
        let title = text_field(section, "title");
        let content = text_field(section, "content");
        if title.is_empty() || content.is_empty() {
            continue;
        }
        section_title(composer, title);
        composer.paragraph(content, &styles::BODY);
    }
}

fn render_footer(composer: &mut Composer<'_>, data: &JsonMap) {
    composer.spacer(8.0);
    composer.rule(0.5, palette::SLATE_200);
    composer.spacer(3.0);
    composer.paragraph_centered(
        &format!(
            "© {} {} • Europass CV",
            chrono::Utc::now().year(),
            text_field(data, "name")
        ),
        &styles::FOOTER,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;
    use std::path::PathBuf;

    fn no_fonts_dir() -> PathBuf {
        PathBuf::from("/nonexistent-font-dir")
    }

    fn payload(json: &str) -> JsonMap {
        serde_json::from_str(json).expect("test payload")
    }

    #[test]
    fn minimal_payload_renders_pdf() {
        let data = payload(r#"{"name": "Ana Horvat"}"#);
        let bytes = render_cv(&data, Language::En, None, &no_fonts_dir()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_payload_renders_pdf() {
        let data = payload("{}");
        let bytes = render_cv(&data, Language::Hr, None, &no_fonts_dir()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn full_payload_renders_all_sections() {
        let data = payload(
            r#"{
                "name": "Ana Horvat",
                "title": "Profesorica engleskog jezika",
                "email": "ana@example.com",
                "phone": "+385 91 000 0000",
                "address": "Zagreb, Hrvatska",
                "website": "ana.example.com",
                "linkedin": "linkedin.com/in/ana",
                "dateOfBirth": "01.01.1985",
                "citizenship": "hrvatsko",
                "gender": "žensko",
                "maritalStatus": "udana",
                "drivingLicense": "B",
                "about": "Dugogodišnje iskustvo u poučavanju engleskog jezika.",
                "experience": [
                    {
                        "dates": "2015 - danas",
                        "location": "Zagreb",
                        "position": "Profesorica",
                        "company": "SOS English",
                        "description": "Individualna i grupna nastava.",
                        "website": "sos-english.hr"
                    }
                ],
                "education": [
                    {
                        "dates": "2003 - 2008",
                        "location": "Zagreb",
                        "degree": "Magistra edukacije engleskog jezika",
                        "institution": "Filozofski fakultet"
                    }
                ],
                "skills": ["Prevođenje", "Lektura"],
                "motherTongues": ["Hrvatski"],
                "otherLanguages": [{"name": "Engleski / English", "level": "C2"}],
                "customSections": [
                    {"title": "Projekti", "content": "Europass radionice."}
                ],
                "labels": {"about": "O meni", "experience": "Radno iskustvo"}
            }"#,
        );

        let minimal = render_cv(&payload("{}"), Language::Hr, None, &no_fonts_dir()).unwrap();
        let bytes = render_cv(&data, Language::Hr, None, &no_fonts_dir()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > minimal.len());
    }

    #[test]
    fn long_experience_list_paginates() {
        let mut data = payload(r#"{"name": "Ana"}"#);
        let item = serde_json::json!({
            "dates": "2010 - 2020",
            "location": "Zagreb",
            "position": "Teacher",
            "company": "School",
            "description": "Planning and delivering lessons to adult learners, preparing exam candidates, and coordinating the yearly curriculum across levels."
        });
        let entries: Vec<serde_json::Value> = (0..40).map(|_| item.clone()).collect();
        data.insert("experience".to_string(), serde_json::Value::Array(entries));

        let bytes = render_cv(&data, Language::En, None, &no_fonts_dir()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn renders_with_composited_photo() {
        let sample = RgbaImage::from_pixel(120, 90, Rgba([200, 60, 40, 255]));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(sample)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let canvas = photo::compose_circular_photo(&png).unwrap();

        let data = payload(r#"{"name": "Ana Horvat", "title": "Profesorica"}"#);
        let without = render_cv(&data, Language::Hr, None, &no_fonts_dir()).unwrap();
        let with = render_cv(&data, Language::Hr, Some(&canvas), &no_fonts_dir()).unwrap();
        assert!(with.starts_with(b"%PDF"));
        assert!(with.len() > without.len());
    }

    #[test]
    fn export_filename_uses_sanitized_name() {
        let data = payload(r#"{"name": "Ana Horvat"}"#);
        assert_eq!(
            export_filename(&data, Language::Hr),
            "Ana_Horvat_CV_Europass_HR.pdf"
        );

        let unnamed = payload("{}");
        assert_eq!(export_filename(&unnamed, Language::En), "CV_Europass_EN.pdf");
    }
}
