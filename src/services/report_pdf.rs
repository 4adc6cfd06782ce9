use std::io;
use std::path::Path;

use chrono::{DateTime, Datelike, Timelike, Utc};
use pdf_writer::{Content, Date, Name, Pdf, Rect, Ref, Str, TextStr};
use thiserror::Error;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;
const TITLE_FONT_SIZE: f32 = 16.0;
const BODY_FONT_SIZE: f32 = 12.0;
const LINE_HEIGHT: f32 = 16.0;
const LINES_PER_PAGE: usize = 40;
// Rough Helvetica advance width as a fraction of the font size.
const AVERAGE_GLYPH_WIDTH: f32 = 0.5;
const FONT_NAME: Name<'static> = Name(b"F1");

#[derive(Error, Debug)]
pub enum PdfReportError {
    #[error("failed to write report {path}: {source}")]
    Write { path: String, source: io::Error },
}

/// Attachment name for a downloaded report. Characters that are unsafe in a
/// header or file name are replaced with `_`.
pub fn report_file_name(scenario_name: &str) -> String {
    let name: String = scenario_name
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if name.is_empty() {
        "ROI_Report_report.pdf".to_string()
    } else {
        format!("ROI_Report_{name}.pdf")
    }
}

/// Renders `lines` as a PDF document in Helvetica.
///
/// The first line is set as a centered title on the first page; the remaining
/// lines follow left aligned and continue onto further pages as needed.
pub fn render_report_pdf(lines: &[String], generated_at: DateTime<Utc>) -> Vec<u8> {
    let title = lines.first().map(String::as_str).unwrap_or_default();
    let body = lines.get(1..).unwrap_or_default();
    let chunks: Vec<&[String]> = if body.is_empty() {
        vec![body]
    } else {
        body.chunks(LINES_PER_PAGE).collect()
    };

    let catalog_id = Ref::new(1);
    let page_tree_id = Ref::new(2);
    let font_id = Ref::new(3);
    let info_id = Ref::new(4);
    let page_ids: Vec<Ref> = (0..chunks.len())
        .map(|index| Ref::new(5 + 2 * index as i32))
        .collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);
    pdf.type1_font(font_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    for (index, (page_id, chunk)) in page_ids.iter().zip(&chunks).enumerate() {
        let content_id = Ref::new(page_id.get() + 1);
        {
            let mut page = pdf.page(*page_id);
            page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
            page.parent(page_tree_id);
            page.contents(content_id);
            page.resources().fonts().pair(FONT_NAME, font_id);
        }

        let page_title = (index == 0).then_some(title);
        pdf.stream(content_id, &page_content(page_title, chunk));
    }

    pdf.document_info(info_id)
        .title(TextStr(title))
        .producer(TextStr("roi-simulator"))
        .creation_date(pdf_date(generated_at));
    pdf.finish()
}

pub fn write_report_pdf<P: AsRef<Path>>(path: P, pdf: &[u8]) -> Result<(), PdfReportError> {
    std::fs::write(path.as_ref(), pdf).map_err(|source| PdfReportError::Write {
        path: path.as_ref().display().to_string(),
        source,
    })
}

fn page_content(title: Option<&str>, body: &[String]) -> Vec<u8> {
    let mut content = Content::new();
    let top = PAGE_HEIGHT - MARGIN;

    if let Some(title) = title {
        let title_width = title.chars().count() as f32 * TITLE_FONT_SIZE * AVERAGE_GLYPH_WIDTH;
        let title_x = ((PAGE_WIDTH - title_width) / 2.0).max(MARGIN);
        show_line(&mut content, TITLE_FONT_SIZE, title_x, top, title);
    }

    for (offset, line) in body.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let y = top - LINE_HEIGHT * (offset + 1) as f32;
        show_line(&mut content, BODY_FONT_SIZE, MARGIN, y, line);
    }
    content.finish()
}

fn show_line(content: &mut Content, size: f32, x: f32, y: f32, text: &str) {
    content.begin_text();
    content.set_font(FONT_NAME, size);
    content.next_line(x, y);
    content.show(Str(&win_ansi_bytes(text)));
    content.end_text();
}

fn pdf_date(at: DateTime<Utc>) -> Date {
    Date::new(u16::try_from(at.year()).unwrap_or_default())
        .month(at.month() as u8)
        .day(at.day() as u8)
        .hour(at.hour() as u8)
        .minute(at.minute() as u8)
        .second(at.second() as u8)
        .utc_offset_hour(0)
}

// Encodes text for the WinAnsiEncoding font. Unmappable characters become '?'.
fn win_ansi_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            ' '..='~' | '\u{a0}'..='\u{ff}' => ch as u8,
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8a,
            '‹' => 0x8b,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9a,
            '›' => 0x9b,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            _ => b'?',
        })
        .collect()
}
