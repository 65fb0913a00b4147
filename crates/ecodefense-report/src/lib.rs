//! EcoDefense Report
//!
//! Renders an approved [`Report`] and its [`SignatureBlock`] as a PDF.
//!
//! The layout is A4 with the standard Helvetica faces, so no font is
//! embedded. Text is encoded as WinAnsi; characters outside Latin-1 print
//! as `?`.
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use ecodefense_domain::{Report, ReportItem, SignatureBlock};
//! use ecodefense_report::ReportRenderer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut report = Report::new();
//! report.approve(ReportItem::new("Item 1", "Apresentar PGRS", "O PGRS foi apresentado."));
//!
//! let date = NaiveDate::from_ymd_opt(2025, 3, 5).ok_or("bad date")?;
//! let bytes = ReportRenderer::new().render(&report, &SignatureBlock::default(), date)?;
//! std::fs::write("resposta.pdf", bytes)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod text;

pub use error::ReportError;
pub use text::{encode_win_ansi, text_width, wrap, Face};

use chrono::NaiveDate;
use ecodefense_domain::{Report, SignatureBlock};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};
use std::path::Path;
use tracing::{debug, info};

/// Heading printed under the company name
pub const DEFAULT_REPORT_TITLE: &str = "RESPOSTA ÀS CONDICIONANTES DA LICENÇA AMBIENTAL";

/// Prefix of the requirement line under each item title
pub const REQUIREMENT_PREFIX: &str = "Exigência:";

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 56.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const BODY_SIZE: f32 = 11.0;
const BODY_LEADING: f32 = 15.0;
const NOTE_SIZE: f32 = 10.0;
const NOTE_LEADING: f32 = 13.0;
const TITLE_SIZE: f32 = 12.0;
const TITLE_LEADING: f32 = 15.0;
// A one-line title bar is 20pt tall
const BAR_PADDING: f32 = 5.0;
const BAR_GREY: f32 = 0.88;
const NOTE_GREY: f32 = 0.4;
const SIGNATURE_RULE: f32 = 220.0;

/// Renders reports to PDF bytes
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    title: String,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer {
    /// Renderer with the default heading
    pub fn new() -> Self {
        Self {
            title: DEFAULT_REPORT_TITLE.to_string(),
        }
    }

    /// Override the heading printed under the company name
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Render `report` signed by `signature` on `date`
    ///
    /// Fails with `EmptyReport` when nothing was approved.
    pub fn render(
        &self,
        report: &Report,
        signature: &SignatureBlock,
        date: NaiveDate,
    ) -> Result<Vec<u8>, ReportError> {
        if report.is_empty() {
            return Err(ReportError::EmptyReport);
        }

        let mut canvas = Canvas::new();
        self.draw_header(&mut canvas, signature);
        for item in report.items() {
            draw_item(&mut canvas, &item.title, &item.requirement, &item.response);
        }
        draw_signature(&mut canvas, signature, date);

        let pages = canvas.finish();
        let page_count = pages.len();
        let bytes = assemble(pages, &self.title)?;

        info!(
            items = report.len(),
            pages = page_count,
            bytes = bytes.len(),
            "Rendered report"
        );
        Ok(bytes)
    }

    /// Render straight to a file
    pub fn render_to_file(
        &self,
        report: &Report,
        signature: &SignatureBlock,
        date: NaiveDate,
        path: &Path,
    ) -> Result<(), ReportError> {
        let bytes = self.render(report, signature, date)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn draw_header(&self, canvas: &mut Canvas, signature: &SignatureBlock) {
        if !signature.company.trim().is_empty() {
            canvas.centered(&signature.company, Face::Bold, 16.0, 0.0);
            canvas.advance(22.0);
        }
        canvas.centered(&self.title, Face::Bold, 13.0, 0.0);
        canvas.advance(34.0);
    }
}

fn draw_item(canvas: &mut Canvas, title: &str, requirement: &str, response: &str) {
    let title_lines = wrap(title, Face::Bold, TITLE_SIZE, CONTENT_WIDTH - 12.0);
    let bar_height = TITLE_LEADING * title_lines.len().max(1) as f32 + BAR_PADDING;
    canvas.ensure(bar_height + 2.0 * BODY_LEADING);

    canvas.fill_rect(MARGIN, canvas.y - bar_height, CONTENT_WIDTH, bar_height, BAR_GREY);
    for (n, line) in title_lines.iter().enumerate() {
        let baseline = canvas.y - TITLE_LEADING - n as f32 * TITLE_LEADING + 1.0;
        canvas.text_at(MARGIN + 6.0, baseline, Face::Bold, TITLE_SIZE, 0.0, line);
    }
    canvas.advance(bar_height + 8.0);

    if !requirement.trim().is_empty() {
        let note = format!("{} {}", REQUIREMENT_PREFIX, requirement.trim());
        for line in wrap(&note, Face::Italic, NOTE_SIZE, CONTENT_WIDTH) {
            canvas.line(&line, Face::Italic, NOTE_SIZE, NOTE_LEADING, NOTE_GREY);
        }
        canvas.advance(6.0);
    }

    for line in wrap(response.trim(), Face::Regular, BODY_SIZE, CONTENT_WIDTH) {
        canvas.line(&line, Face::Regular, BODY_SIZE, BODY_LEADING, 0.0);
    }
    canvas.advance(14.0);
}

fn draw_signature(canvas: &mut Canvas, signature: &SignatureBlock, date: NaiveDate) {
    canvas.ensure(130.0);
    canvas.advance(20.0);

    let date = date.format("%d/%m/%Y").to_string();
    let place = if signature.city.trim().is_empty() {
        date
    } else {
        format!("{}, {}", signature.city.trim(), date)
    };
    canvas.line(&place, Face::Regular, BODY_SIZE, BODY_LEADING, 0.0);
    canvas.advance(50.0);

    let left = (PAGE_WIDTH - SIGNATURE_RULE) / 2.0;
    canvas.rule(left, left + SIGNATURE_RULE, canvas.y);
    canvas.advance(16.0);

    canvas.centered(&signature.signer_name, Face::Bold, BODY_SIZE, 0.0);
    canvas.advance(BODY_LEADING);
    canvas.centered(&signature.signer_title, Face::Regular, BODY_SIZE, 0.0);
}

/// Page content under construction; `y` is the top of the free area
struct Canvas {
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    y: f32,
}

impl Canvas {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            ops: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn advance(&mut self, height: f32) {
        self.y -= height;
    }

    /// Start a new page unless `height` still fits on this one
    fn ensure(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.new_page();
        }
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.ops));
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// One left-aligned line in the flow, breaking the page if needed
    fn line(&mut self, text: &str, face: Face, size: f32, leading: f32, grey: f32) {
        self.ensure(leading);
        self.text_at(MARGIN, self.y - size, face, size, grey, text);
        self.advance(leading);
    }

    /// Centred text with its top at the current position
    fn centered(&mut self, text: &str, face: Face, size: f32, grey: f32) {
        let width = text_width(text, face, size).min(CONTENT_WIDTH);
        let x = (PAGE_WIDTH - width) / 2.0;
        self.text_at(x, self.y - size, face, size, grey, text);
    }

    fn text_at(&mut self, x: f32, y: f32, face: Face, size: f32, grey: f32, text: &str) {
        if text.is_empty() {
            return;
        }
        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(face.resource().to_vec()), Object::Real(size)],
            ),
            Operation::new(
                "rg",
                vec![Object::Real(grey), Object::Real(grey), Object::Real(grey)],
            ),
            Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, grey: f32) {
        self.ops.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "rg",
                vec![Object::Real(grey), Object::Real(grey), Object::Real(grey)],
            ),
            Operation::new(
                "re",
                vec![
                    Object::Real(x),
                    Object::Real(y),
                    Object::Real(width),
                    Object::Real(height),
                ],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    fn rule(&mut self, x1: f32, x2: f32, y: f32) {
        self.ops.extend([
            Operation::new("q", vec![]),
            Operation::new("w", vec![Object::Real(0.7)]),
            Operation::new("m", vec![Object::Real(x1), Object::Real(y)]),
            Operation::new("l", vec![Object::Real(x2), Object::Real(y)]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.ops.is_empty() {
            self.pages.push(self.ops);
        }
        self.pages
    }
}

/// Build the PDF document around the page contents
fn assemble(pages: Vec<Vec<Operation>>, title: &str) -> Result<Vec<u8>, ReportError> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for face in Face::ALL {
        let font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(face.base_font().to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));
        fonts.set(face.resource(), Object::Reference(font_id));
    }
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(fonts),
    )]));

    let mut kids = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations }
            .encode()
            .map_err(|e| ReportError::Pdf(format!("Content encoding failed: {}", e)))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(PAGE_WIDTH),
                    Object::Real(PAGE_HEIGHT),
                ]),
            ),
            ("Resources", Object::Reference(resources_id)),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(count)),
            ("Kids", Object::Array(kids)),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    let info_id = doc.add_object(Dictionary::from_iter(vec![
        ("Title", Object::String(encode_win_ansi(title), StringFormat::Literal)),
        ("Producer", Object::string_literal("ecodefense")),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.trailer.set("Info", Object::Reference(info_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ReportError::Pdf(format!("Save failed: {}", e)))?;

    debug!(pages = count, "Assembled PDF");
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecodefense_domain::ReportItem;

    fn signature() -> SignatureBlock {
        SignatureBlock {
            company: "Acme Industria Ltda".to_string(),
            city: "Curitiba".to_string(),
            signer_name: "Maria Souza".to_string(),
            signer_title: "Diretora Tecnica".to_string(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()
    }

    fn page_text(bytes: &[u8]) -> (usize, String) {
        let doc = Document::load_mem(bytes).unwrap();
        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        let text = doc.extract_text(&pages).unwrap();
        (pages.len(), text)
    }

    #[test]
    fn test_render_single_page_report() {
        let mut report = Report::new();
        report.approve(ReportItem::new(
            "Item 1",
            "Apresentar o PGRS atualizado",
            "O PGRS foi revisado e protocolado.",
        ));
        report.approve(ReportItem::new("Item 2", "", "Resposta sem exigencia associada."));

        let bytes = ReportRenderer::new().render(&report, &signature(), date()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));

        let (pages, text) = page_text(&bytes);
        assert_eq!(pages, 1);
        assert!(text.contains("Acme Industria Ltda"));
        assert!(text.contains("Item 1"));
        assert!(text.contains("Apresentar o PGRS atualizado"));
        assert!(text.contains("O PGRS foi revisado e protocolado."));
        assert!(text.contains("Curitiba, 05/03/2025"));
        assert!(text.contains("Maria Souza"));
        assert!(text.contains("Diretora Tecnica"));
    }

    #[test]
    fn test_empty_requirement_has_no_prefix_line() {
        let mut report = Report::new();
        report.approve(ReportItem::new("Item 1", "", "Texto livre."));

        let bytes = ReportRenderer::new().render(&report, &signature(), date()).unwrap();
        let (_, text) = page_text(&bytes);
        assert!(!text.contains("Exig"));
    }

    #[test]
    fn test_long_report_breaks_pages() {
        let mut report = Report::new();
        let response = "O monitoramento é realizado conforme o plano aprovado. ".repeat(30);
        for n in 1..=12 {
            report.approve(ReportItem::new(format!("Item {n}"), "Exigencia de teste", response.clone()));
        }

        let bytes = ReportRenderer::new().render(&report, &signature(), date()).unwrap();
        let (pages, text) = page_text(&bytes);
        assert!(pages > 1);
        assert!(text.contains("Item 12"));
        assert!(text.contains("Maria Souza"));
    }

    #[test]
    fn test_long_title_wraps_inside_bar() {
        let mut report = Report::new();
        let title = format!("{} FINALWORD", "Programa de monitoramento da qualidade do ar ".repeat(4));
        report.approve(ReportItem::new(title, "", "Texto."));

        let bytes = ReportRenderer::new().render(&report, &signature(), date()).unwrap();
        let (_, text) = page_text(&bytes);
        assert!(text.contains("Programa de monitoramento"));
        assert!(text.contains("FINALWORD"));
    }

    #[test]
    fn test_empty_report_rejected() {
        let result = ReportRenderer::new().render(&Report::new(), &signature(), date());
        assert!(matches!(result, Err(ReportError::EmptyReport)));
    }

    #[test]
    fn test_missing_city_prints_date_only() {
        let mut report = Report::new();
        report.approve(ReportItem::new("Item 1", "", "Texto."));
        let signature = SignatureBlock {
            city: String::new(),
            ..signature()
        };

        let bytes = ReportRenderer::new().render(&report, &signature, date()).unwrap();
        let (_, text) = page_text(&bytes);
        assert!(text.contains("05/03/2025"));
        assert!(!text.contains(", 05/03/2025"));
    }

    #[test]
    fn test_render_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("resposta.pdf");
        let mut report = Report::new();
        report.approve(ReportItem::new("Item 1", "", "Texto."));

        ReportRenderer::new()
            .with_title("Relatorio de teste")
            .render_to_file(&report, &signature(), date(), &path)
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let (pages, text) = page_text(&bytes);
        assert_eq!(pages, 1);
        assert!(text.contains("Relatorio de teste"));
    }
}
