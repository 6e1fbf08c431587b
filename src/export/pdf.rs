//! Tabular PDF rendering via `printpdf`.
//!
//! Landscape A4, built-in Helvetica. Title and generation timestamp on the
//! first page; the column header repeats on every page. Cell text is
//! clipped to its column width.
//!
//! Built-in fonts are Latin-1 only: non-Latin-1 cell values (Arabic names,
//! for instance) are not rendered. The XLSX export keeps them intact.

use std::io::BufWriter;

use chrono::NaiveDateTime;
use printpdf::*;

use super::{cell_text, columns_for, Column, ExportError};
use crate::i18n::{self, Language};
use crate::models::{ReportRow, ReportType};

const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 15.0;
const ROW_HEIGHT: f32 = 6.5;
const BODY_SIZE: f32 = 9.0;
const HEADER_SIZE: f32 = 10.0;
/// Rough Helvetica advance at 9pt, in mm per character.
const CHAR_WIDTH_MM: f32 = 1.75;

/// Render cleaned rows as a paginated table. Returns PDF bytes.
pub fn render_pdf(
    rows: &[ReportRow],
    report_type: ReportType,
    language: Language,
    generated_at: NaiveDateTime,
) -> Result<Vec<u8>, ExportError> {
    // Built-in fonts cover Latin-1 only, so document chrome stays English.
    let title = i18n::translate(Language::En, report_type.title_key());
    let columns = columns_for(report_type);

    let (doc, page1, layer1) =
        PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(format!("PDF font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(format!("PDF font error: {e}")))?;

    let col_width = (PAGE_WIDTH - 2.0 * MARGIN) / columns.len().max(1) as f32;
    let max_chars = ((col_width - 2.0) / CHAR_WIDTH_MM).max(4.0) as usize;

    let mut layer = doc.get_page(page1).get_layer(layer1);
    let mut page_no = 1;
    let mut y = PAGE_HEIGHT - MARGIN;

    layer.use_text(&title, 16.0, Mm(MARGIN), Mm(y), &bold);
    y -= 7.0;
    layer.use_text(
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M")),
        9.0,
        Mm(MARGIN),
        Mm(y),
        &font,
    );
    y -= 10.0;

    draw_header(&layer, columns, col_width, y, &bold);
    y -= ROW_HEIGHT + 1.0;

    if rows.is_empty() {
        layer.use_text("No records.", BODY_SIZE, Mm(MARGIN), Mm(y), &font);
    }

    for row in rows {
        if y < MARGIN + ROW_HEIGHT {
            draw_page_number(&layer, page_no, &font);
            let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            layer = doc.get_page(page).get_layer(page_layer);
            page_no += 1;
            y = PAGE_HEIGHT - MARGIN;
            draw_header(&layer, columns, col_width, y, &bold);
            y -= ROW_HEIGHT + 1.0;
        }

        for (i, column) in columns.iter().enumerate() {
            let text = clip(&cell_text(row, column, language), max_chars);
            if text.is_empty() {
                continue;
            }
            let x = MARGIN + i as f32 * col_width;
            layer.use_text(text, BODY_SIZE, Mm(x), Mm(y), &font);
        }
        y -= ROW_HEIGHT;
    }
    draw_page_number(&layer, page_no, &font);

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ExportError::Pdf(format!("PDF save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ExportError::Pdf(format!("PDF buffer error: {e}")))
}

fn draw_header(
    layer: &PdfLayerReference,
    columns: &[Column],
    col_width: f32,
    y: f32,
    bold: &IndirectFontRef,
) {
    layer.set_fill_color(Color::Rgb(Rgb::new(0.16, 0.31, 0.52, None)));
    for (i, column) in columns.iter().enumerate() {
        let label = i18n::translate(Language::En, column.label_key);
        let x = MARGIN + i as f32 * col_width;
        layer.use_text(label, HEADER_SIZE, Mm(x), Mm(y), bold);
    }
    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
}

fn draw_page_number(layer: &PdfLayerReference, page_no: usize, font: &IndirectFontRef) {
    layer.use_text(
        format!("Page {page_no}"),
        8.0,
        Mm(PAGE_WIDTH - MARGIN - 15.0),
        Mm(MARGIN / 2.0),
        font,
    );
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}
