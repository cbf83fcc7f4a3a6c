// src/pdf/layout.rs
//! Cursor-based flow layout over printpdf pages.
//!
//! The composer mirrors the web CV's flowing presentation: wrapped
//! paragraphs, rules, boxed two-column panels and embedded photos, with
//! automatic page breaks on A4. Text metrics use an approximate per-glyph
//! width model, which keeps wrapping independent of the font files in use.

use anyhow::{Context, Result};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm,
    PdfDocumentReference, PdfLayerReference, Point, Rect, Rgb,
};
use std::fs::File;
use std::path::Path;
use tracing::warn;

pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;
pub const MARGIN_MM: f64 = 15.0;

const PT_TO_MM: f64 = 0.352_778;
const PANEL_PAD_MM: f64 = 3.0;

/// Slate scale matching the web layout.
pub mod palette {
    pub const SLATE_900: u32 = 0x0f172a;
    pub const SLATE_700: u32 = 0x334155;
    pub const SLATE_600: u32 = 0x475569;
    pub const SLATE_500: u32 = 0x64748b;
    pub const SLATE_200: u32 = 0xe2e8f0;
    pub const SLATE_50: u32 = 0xf8fafc;
}

fn color(hex: u32) -> Color {
    let r = ((hex >> 16) & 0xff) as f64 / 255.0;
    let g = ((hex >> 8) & 0xff) as f64 / 255.0;
    let b = (hex & 0xff) as f64 / 255.0;
    Color::Rgb(Rgb::new(r, g, b, None))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    Sans,
    SansBold,
    SerifBold,
}

/// Embedded DejaVu faces with built-in PDF fallbacks.
pub struct FontSet {
    sans: IndirectFontRef,
    sans_bold: IndirectFontRef,
    serif_bold: IndirectFontRef,
}

impl FontSet {
    /// The faces the web layout uses, loaded from the configured directory.
    /// Missing or unreadable files degrade to the PDF base-14 fonts so
    /// rendering works on machines without the DejaVu package.
    pub fn load(doc: &PdfDocumentReference, fonts_dir: &Path) -> Result<Self> {
        Ok(Self {
            sans: Self::external_or_builtin(
                doc,
                &fonts_dir.join("DejaVuSans.ttf"),
                BuiltinFont::Helvetica,
            )?,
            sans_bold: Self::external_or_builtin(
                doc,
                &fonts_dir.join("DejaVuSans-Bold.ttf"),
                BuiltinFont::HelveticaBold,
            )?,
            serif_bold: Self::external_or_builtin(
                doc,
                &fonts_dir.join("DejaVuSerif-Bold.ttf"),
                BuiltinFont::TimesBold,
            )?,
        })
    }

    fn external_or_builtin(
        doc: &PdfDocumentReference,
        path: &Path,
        fallback: BuiltinFont,
    ) -> Result<IndirectFontRef> {
        if path.exists() {
            match File::open(path) {
                Ok(file) => match doc.add_external_font(file) {
                    Ok(font) => return Ok(font),
                    Err(e) => warn!("Failed to embed {}: {}", path.display(), e),
                },
                Err(e) => warn!("Failed to open {}: {}", path.display(), e),
            }
        }

        doc.add_builtin_font(fallback)
            .context("Failed to register builtin PDF font")
    }

    fn font(&self, kind: FontKind) -> &IndirectFontRef {
        match kind {
            FontKind::Sans => &self.sans,
            FontKind::SansBold => &self.sans_bold,
            FontKind::SerifBold => &self.serif_bold,
        }
    }
}

/// Paragraph style: font, size/leading in points, color, spacing in mm.
#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    pub font: FontKind,
    pub size: f64,
    pub leading: f64,
    pub color: u32,
    pub space_after: f64,
}

pub mod styles {
    use super::{palette, FontKind, TextStyle};

    pub const NAME: TextStyle = TextStyle {
        font: FontKind::SerifBold,
        size: 24.0,
        leading: 28.0,
        color: palette::SLATE_900,
        space_after: 2.0,
    };
    pub const TITLE: TextStyle = TextStyle {
        font: FontKind::Sans,
        size: 12.0,
        leading: 15.0,
        color: palette::SLATE_600,
        space_after: 3.0,
    };
    pub const SECTION: TextStyle = TextStyle {
        font: FontKind::SerifBold,
        size: 14.0,
        leading: 17.0,
        color: palette::SLATE_900,
        space_after: 3.0,
    };
    pub const BODY: TextStyle = TextStyle {
        font: FontKind::Sans,
        size: 9.0,
        leading: 12.0,
        color: palette::SLATE_600,
        space_after: 2.0,
    };
    pub const SMALL: TextStyle = TextStyle {
        font: FontKind::Sans,
        size: 8.0,
        leading: 11.0,
        color: palette::SLATE_500,
        space_after: 1.0,
    };
    pub const VALUE: TextStyle = TextStyle {
        font: FontKind::Sans,
        size: 9.0,
        leading: 12.0,
        color: palette::SLATE_700,
        space_after: 1.0,
    };
    pub const VALUE_BOLD: TextStyle = TextStyle {
        font: FontKind::SansBold,
        size: 9.0,
        leading: 12.0,
        color: palette::SLATE_700,
        space_after: 1.0,
    };
    pub const JOB: TextStyle = TextStyle {
        font: FontKind::SansBold,
        size: 10.0,
        leading: 13.0,
        color: palette::SLATE_900,
        space_after: 1.0,
    };
    pub const COMPANY: TextStyle = TextStyle {
        font: FontKind::Sans,
        size: 9.0,
        leading: 12.0,
        color: palette::SLATE_700,
        space_after: 1.0,
    };
    pub const DATE: TextStyle = TextStyle {
        font: FontKind::Sans,
        size: 8.0,
        leading: 10.0,
        color: palette::SLATE_500,
        space_after: 1.0,
    };
    pub const FOOTER: TextStyle = TextStyle {
        font: FontKind::Sans,
        size: 8.0,
        leading: 10.0,
        color: palette::SLATE_500,
        space_after: 0.0,
    };
}

/// Approximate advance width of a line, in mm.
pub fn text_width_mm(text: &str, style: &TextStyle) -> f64 {
    let units: f64 = text.chars().map(glyph_factor).sum();
    let weight = match style.font {
        FontKind::Sans => 1.0,
        FontKind::SansBold | FontKind::SerifBold => 1.05,
    };
    units * weight * style.size * PT_TO_MM
}

fn glyph_factor(c: char) -> f64 {
    match c {
        'i' | 'j' | 'l' | 't' | 'f' | 'r' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' | '('
        | ')' => 0.32,
        'm' | 'w' | 'M' | 'W' | '@' => 0.89,
        ' ' => 0.33,
        c if c.is_ascii_digit() => 0.56,
        c if c.is_uppercase() => 0.72,
        _ => 0.52,
    }
}

/// Greedy word wrap; words longer than the line are hard-split.
pub fn wrap_text(text: &str, style: &TextStyle, max_width_mm: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if text_width_mm(&candidate, style) <= max_width_mm {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if text_width_mm(word, style) <= max_width_mm {
            current = word.to_string();
        } else {
            let mut piece = String::new();
            for c in word.chars() {
                piece.push(c);
                if text_width_mm(&piece, style) > max_width_mm && piece.chars().count() > 1 {
                    piece.pop();
                    lines.push(std::mem::take(&mut piece));
                    piece.push(c);
                }
            }
            current = piece;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wrapped height of a paragraph, spacing included, in mm. Empty text
/// measures zero, matching what `paragraph` draws.
pub fn paragraph_height_mm(text: &str, style: &TextStyle, width_mm: f64) -> f64 {
    if text.trim().is_empty() {
        return 0.0;
    }
    let lines = wrap_text(text, style, width_mm).len();
    lines as f64 * style.leading * PT_TO_MM + style.space_after
}

/// Line advance of a style, in mm.
pub fn line_height_mm(style: &TextStyle) -> f64 {
    style.leading * PT_TO_MM
}

/// One logical line inside a boxed panel column.
pub enum PanelLine {
    Heading(String),
    Field { label: String, value: String },
    Text(String),
}

struct PanelRun {
    text: String,
    bold: bool,
    x_offset: f64,
}

/// A drawn row is one or more runs sharing a baseline.
struct PanelRow {
    runs: Vec<PanelRun>,
}

fn layout_panel_line(line: &PanelLine, width_mm: f64) -> Vec<PanelRow> {
    match line {
        PanelLine::Heading(text) => wrap_text(text, &styles::VALUE_BOLD, width_mm)
            .into_iter()
            .map(|t| PanelRow {
                runs: vec![PanelRun {
                    text: t,
                    bold: true,
                    x_offset: 0.0,
                }],
            })
            .collect(),
        PanelLine::Text(text) => wrap_text(text, &styles::VALUE, width_mm)
            .into_iter()
            .map(|t| PanelRow {
                runs: vec![PanelRun {
                    text: t,
                    bold: false,
                    x_offset: 0.0,
                }],
            })
            .collect(),
        PanelLine::Field { label, value } => {
            let label_text = format!("{}: ", label);
            let label_width = text_width_mm(&label_text, &styles::VALUE_BOLD);

            // A label eating most of the column gets no hanging layout.
            if label_width > width_mm * 0.6 {
                return layout_panel_line(
                    &PanelLine::Text(format!("{}: {}", label, value)),
                    width_mm,
                );
            }

            let value_lines = wrap_text(value, &styles::VALUE, width_mm - label_width);
            let mut rows = vec![PanelRow {
                runs: vec![
                    PanelRun {
                        text: label_text,
                        bold: true,
                        x_offset: 0.0,
                    },
                    PanelRun {
                        text: value_lines.first().cloned().unwrap_or_default(),
                        bold: false,
                        x_offset: label_width,
                    },
                ],
            }];
            for continuation in value_lines.into_iter().skip(1) {
                rows.push(PanelRow {
                    runs: vec![PanelRun {
                        text: continuation,
                        bold: false,
                        x_offset: label_width,
                    }],
                });
            }
            rows
        }
    }
}

/// Sequential page composer. The cursor runs top-down in mm.
pub struct Composer<'a> {
    doc: &'a PdfDocumentReference,
    fonts: &'a FontSet,
    layer: PdfLayerReference,
    cursor_mm: f64,
}

impl<'a> Composer<'a> {
    pub fn new(
        doc: &'a PdfDocumentReference,
        fonts: &'a FontSet,
        layer: PdfLayerReference,
    ) -> Self {
        Self {
            doc,
            fonts,
            layer,
            cursor_mm: MARGIN_MM,
        }
    }

    pub fn content_width(&self) -> f64 {
        PAGE_WIDTH_MM - 2.0 * MARGIN_MM
    }

    pub fn cursor(&self) -> f64 {
        self.cursor_mm
    }

    pub fn advance(&mut self, mm: f64) {
        self.cursor_mm += mm;
    }

    /// Break the page unless `needed_mm` still fits. Blocks taller than a
    /// full page flow instead of breaking forever.
    pub fn ensure_space(&mut self, needed_mm: f64) {
        let needed = needed_mm.min(PAGE_HEIGHT_MM - 2.0 * MARGIN_MM);
        if self.cursor_mm + needed > PAGE_HEIGHT_MM - MARGIN_MM {
            self.break_page();
        }
    }

    pub fn break_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor_mm = MARGIN_MM;
    }

    pub fn spacer(&mut self, mm: f64) {
        self.cursor_mm += mm;
    }

    /// Full-width horizontal rule.
    pub fn rule(&mut self, thickness_pt: f64, color_hex: u32) {
        self.ensure_space(2.0);
        let y = Mm(PAGE_HEIGHT_MM - self.cursor_mm);
        self.layer.set_outline_color(color(color_hex));
        self.layer.set_outline_thickness(thickness_pt);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN_MM), y), false),
                (Point::new(Mm(PAGE_WIDTH_MM - MARGIN_MM), y), false),
            ],
            is_closed: false,
        });
        self.cursor_mm += 1.0;
    }

    pub fn paragraph(&mut self, text: &str, style: &TextStyle) {
        self.paragraph_at(MARGIN_MM, self.content_width(), text, style);
    }

    pub fn paragraph_at(&mut self, x: f64, width: f64, text: &str, style: &TextStyle) {
        if text.trim().is_empty() {
            return;
        }
        for line in wrap_text(text, style, width) {
            self.ensure_space(style.leading * PT_TO_MM);
            self.place_line(x, self.cursor_mm, &line, style);
            self.cursor_mm += style.leading * PT_TO_MM;
        }
        self.cursor_mm += style.space_after;
    }

    pub fn paragraph_centered(&mut self, text: &str, style: &TextStyle) {
        if text.trim().is_empty() {
            return;
        }
        for line in wrap_text(text, style, self.content_width()) {
            self.ensure_space(style.leading * PT_TO_MM);
            let x = (PAGE_WIDTH_MM - text_width_mm(&line, style)) / 2.0;
            self.place_line(x.max(MARGIN_MM), self.cursor_mm, &line, style);
            self.cursor_mm += style.leading * PT_TO_MM;
        }
        self.cursor_mm += style.space_after;
    }

    /// Draw one line at an absolute vertical position without moving the
    /// cursor. Used by the header and panel internals.
    pub fn place_line(&self, x: f64, y_top_mm: f64, text: &str, style: &TextStyle) {
        let baseline = PAGE_HEIGHT_MM - y_top_mm - style.size * PT_TO_MM;
        self.layer.set_fill_color(color(style.color));
        self.layer.use_text(
            text,
            style.size,
            Mm(x),
            Mm(baseline),
            self.fonts.font(style.font),
        );
    }

    /// Boxed multi-column panel on a slate background. The whole panel is
    /// kept together on one page.
    pub fn panel(&mut self, columns: &[Vec<PanelLine>]) {
        if columns.is_empty() {
            return;
        }

        let count = columns.len() as f64;
        let col_width = (self.content_width() - 2.0 * PANEL_PAD_MM * count) / count;
        let line_height = styles::VALUE.leading * PT_TO_MM;

        let rows_per_column: Vec<Vec<PanelRow>> = columns
            .iter()
            .map(|col| {
                col.iter()
                    .flat_map(|l| layout_panel_line(l, col_width))
                    .collect()
            })
            .collect();

        let max_rows = rows_per_column.iter().map(Vec::len).max().unwrap_or(0);
        if max_rows == 0 {
            return;
        }
        let height = max_rows as f64 * line_height + 2.0 * PANEL_PAD_MM;

        self.ensure_space(height + 1.0);

        let top = PAGE_HEIGHT_MM - self.cursor_mm;
        let bottom = top - height;
        self.layer.set_fill_color(color(palette::SLATE_50));
        self.layer.set_outline_color(color(palette::SLATE_200));
        self.layer.set_outline_thickness(0.5);
        self.layer.add_rect(
            Rect::new(
                Mm(MARGIN_MM),
                Mm(bottom),
                Mm(PAGE_WIDTH_MM - MARGIN_MM),
                Mm(top),
            )
            .with_mode(PaintMode::FillStroke),
        );

        for (i, rows) in rows_per_column.iter().enumerate() {
            let x = MARGIN_MM + PANEL_PAD_MM + i as f64 * (col_width + 2.0 * PANEL_PAD_MM);
            let mut y = self.cursor_mm + PANEL_PAD_MM;
            for row in rows {
                for run in &row.runs {
                    let style = if run.bold {
                        styles::VALUE_BOLD
                    } else {
                        styles::VALUE
                    };
                    if !run.text.is_empty() {
                        self.place_line(x + run.x_offset, y, &run.text, &style);
                    }
                }
                y += line_height;
            }
        }

        self.cursor_mm += height;
    }

    /// Embed a composited photo with its top-left corner at (x, y_top).
    pub fn place_photo(
        &self,
        photo: &image::RgbImage,
        x: f64,
        y_top_mm: f64,
        size_mm: f64,
    ) -> Result<()> {
        let (w, h) = photo.dimensions();
        let buffer = printpdf::image_crate::RgbImage::from_raw(w, h, photo.as_raw().clone())
            .ok_or_else(|| anyhow::anyhow!("Photo buffer size mismatch"))?;
        let embedded =
            Image::from_dynamic_image(&printpdf::image_crate::DynamicImage::ImageRgb8(buffer));

        // dpi such that `w` pixels span exactly `size_mm` millimetres.
        let dpi = w as f64 / size_mm * 25.4;
        embedded.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(x)),
                translate_y: Some(Mm(PAGE_HEIGHT_MM - y_top_mm - size_mm)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        Ok(())
    }
}
