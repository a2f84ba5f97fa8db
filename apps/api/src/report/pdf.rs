//! PDF layout for the screening report: A4, Helvetica, greedy word-wrap, page-numbered footer.

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use crate::interview::transcript::QuestionKind;
use crate::report::font_metrics::{get_metrics, ReportFont};
use crate::report::{Report, ReportError};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const FOOTER_Y_MM: f32 = 10.0;
const PT_TO_MM: f32 = 0.352_778;
const LINE_SPACING: f32 = 1.35;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 13.0;
const BODY_SIZE: f32 = 10.0;
const SMALL_SIZE: f32 = 8.0;

/// Printable form of `text` for the base-14 fonts, which printpdf writes with WinAnsiEncoding.
/// Characters outside that code page would be dropped by the encoder, so they print as `?`.
pub fn to_pdf_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            c if c.is_whitespace() => ' ',
            c if c.is_control() => '?',
            c if is_win_ansi(c) => c,
            _ => '?',
        })
        .collect()
}

/// Windows-1252 repertoire: ASCII, Latin-1 and the typographic extras in 0x80..=0x9F.
fn is_win_ansi(c: char) -> bool {
    matches!(c, ' '..='~' | '\u{A0}'..='\u{FF}')
        || matches!(
            c,
            '\u{20AC}' | '\u{201A}' | '\u{0192}' | '\u{201E}' | '\u{2026}' | '\u{2020}'
                | '\u{2021}' | '\u{02C6}' | '\u{2030}' | '\u{0160}' | '\u{2039}' | '\u{0152}'
                | '\u{017D}' | '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}' | '\u{2022}'
                | '\u{2013}' | '\u{2014}' | '\u{02DC}' | '\u{2122}' | '\u{0161}' | '\u{203A}'
                | '\u{0153}' | '\u{017E}' | '\u{0178}'
        )
}

fn pdf_error(err: impl std::fmt::Debug) -> ReportError {
    ReportError::Pdf(format!("{err:?}"))
}

struct PageWriter {
    doc: PdfDocumentReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    layers: Vec<PdfLayerReference>,
    y: f32,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, ReportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;
        let first = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            regular,
            bold,
            layers: vec![first],
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        self.layers.push(self.doc.get_page(page).get_layer(layer));
        self.y = PAGE_HEIGHT_MM - MARGIN_MM;
    }

    fn line_height(size: f32) -> f32 {
        size * PT_TO_MM * LINE_SPACING
    }

    /// Writes `text` word-wrapped at `indent_mm` from the left margin, paginating as needed.
    fn paragraph(&mut self, text: &str, font: ReportFont, size: f32, indent_mm: f32) {
        let text = to_pdf_text(text);
        let max_width_em = (PAGE_WIDTH_MM - 2.0 * MARGIN_MM - indent_mm) / (size * PT_TO_MM);
        let height = Self::line_height(size);

        for line in get_metrics(font).wrap_lines(&text, max_width_em) {
            if self.y - height < MARGIN_MM {
                self.new_page();
            }
            self.y -= height;
            let font_ref = match font {
                ReportFont::Helvetica => &self.regular,
                ReportFont::HelveticaBold => &self.bold,
            };
            if let Some(layer) = self.layers.last() {
                layer.use_text(line, size, Mm(MARGIN_MM + indent_mm), Mm(self.y), font_ref);
            }
        }
    }

    fn heading(&mut self, text: &str) {
        self.gap(4.0);
        self.paragraph(text, ReportFont::HelveticaBold, HEADING_SIZE, 0.0);
        self.gap(1.5);
    }

    fn field(&mut self, label: &str, value: &str) {
        self.paragraph(&format!("{label}: {value}"), ReportFont::Helvetica, BODY_SIZE, 0.0);
    }

    fn bullets(&mut self, label: &str, items: &[String]) {
        if items.is_empty() {
            return;
        }
        self.paragraph(label, ReportFont::HelveticaBold, BODY_SIZE, 0.0);
        for item in items {
            self.paragraph(&format!("- {item}"), ReportFont::Helvetica, BODY_SIZE, 4.0);
        }
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn finish(self) -> Result<Vec<u8>, ReportError> {
        let PageWriter {
            doc,
            regular,
            layers,
            ..
        } = self;
        let total = layers.len();
        for (index, layer) in layers.iter().enumerate() {
            layer.use_text(
                format!("Page {} of {}", index + 1, total),
                SMALL_SIZE,
                Mm(MARGIN_MM),
                Mm(FOOTER_Y_MM),
                &regular,
            );
        }
        drop(layers);
        doc.save_to_bytes().map_err(pdf_error)
    }
}

/// Renders the report. CPU-bound: call it from the blocking pool.
pub fn render_pdf(report: &Report) -> Result<Vec<u8>, ReportError> {
    let summary = report.summary();
    let candidate = &report.candidate;
    let mut page = PageWriter::new(&format!("Screening Report - {}", to_pdf_text(summary.name)))?;

    page.paragraph(
        "TalentScout Screening Report",
        ReportFont::HelveticaBold,
        TITLE_SIZE,
        0.0,
    );
    page.paragraph(
        &format!(
            "Generated {} | Status: {}",
            report.generated_at.format("%Y-%m-%d %H:%M UTC"),
            report.status.label()
        ),
        ReportFont::Helvetica,
        SMALL_SIZE,
        0.0,
    );

    page.heading("Candidate Information");
    page.field("Name", summary.name);
    page.field("Email", candidate.email());
    page.field("Phone", candidate.phone());
    page.field("Position", candidate.position());
    page.field("Experience", candidate.experience());
    page.field("Location", candidate.location());
    page.field("Tech Stack", &candidate.tech_stack().join(", "));

    page.heading("Interview Responses");
    if report.responses.is_empty() {
        page.paragraph("No questions were answered.", ReportFont::Helvetica, BODY_SIZE, 0.0);
    }
    for (index, response) in report.responses.iter().enumerate() {
        let tag = match &response.kind {
            QuestionKind::Hr => "HR".to_string(),
            QuestionKind::Technical { technology } => technology.clone(),
        };
        page.paragraph(
            &format!("Q{} [{}]: {}", index + 1, tag, response.question),
            ReportFont::HelveticaBold,
            BODY_SIZE,
            0.0,
        );
        page.paragraph(
            &format!("A: {}", response.answer),
            ReportFont::Helvetica,
            BODY_SIZE,
            4.0,
        );
        page.gap(2.0);
    }

    page.heading("Evaluation");
    if let Some(score) = &report.score {
        page.field("Technical Competence (70%)", &format!("{:.1}/10", score.technical));
        page.field("Communication (20%)", &format!("{:.1}/10", score.communication));
        page.field("Cultural Fit (10%)", &format!("{:.1}/10", score.cultural_fit));
    }
    page.field("Final Score", &summary.score_text());
    page.field("Questions answered", &summary.question_count.to_string());
    if let Some(detail) = &report.evaluation {
        page.gap(2.0);
        page.bullets("Strengths", &detail.strengths);
        page.bullets("Weaknesses", &detail.weaknesses);
        if !detail.justification.is_empty() {
            page.field("Justification", &detail.justification);
        }
        page.bullets("Next Steps", &detail.next_steps);
    }

    page.heading("Screening Result");
    match &report.decision {
        Some(decision) => {
            page.field("Recommendation", decision.recommendation.label());
            page.field("Confidence", decision.confidence.label());
            page.field("Summary", &decision.summary);
        }
        None => page.paragraph(
            "Not evaluated: the session ended before the assessment was complete.",
            ReportFont::Helvetica,
            BODY_SIZE,
            0.0,
        ),
    }

    page.finish()
}
