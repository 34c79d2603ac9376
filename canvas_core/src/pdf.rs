//! # PDF Report Generation
//!
//! Design reports compiled with Typst into A4 landscape PDFs.
//!
//! ## Architecture
//!
//! - The report template is an embedded string constant with `{{NAME}}`
//!   placeholders
//! - Tables are generated as Typst markup and substituted in
//! - The drawing is rendered to SVG and served to the compiler as the
//!   virtual file `drawing.svg`, so the report embeds vector geometry
//! - Output is raw PDF bytes (`Vec<u8>`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use canvas_core::registry::ModuleKind;
//! use canvas_core::settings::ReportSettings;
//!
//! let mut session = ModuleKind::Lintel.mount();
//! session.load_defaults();
//! let pdf = session.export_pdf(&ReportSettings::default()).unwrap();
//! std::fs::write("lintel.pdf", pdf).unwrap();
//! ```

use std::path::Path;

use chrono::Utc;
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;
use tracing::debug;

use crate::designs::Design;
use crate::errors::{CanvasError, CanvasResult};
use crate::params::ResolvedParameter;
use crate::settings::ReportSettings;
use crate::svg::render_svg;

/// Virtual path of the embedded drawing
const DRAWING_FILE: &str = "drawing.svg";

// ============================================================================
// Typst World Implementation
// ============================================================================

/// A minimal Typst world: one source document plus the drawing SVG.
struct PdfWorld {
    main: Source,
    drawing: Bytes,
    book: LazyHash<FontBook>,
    fonts: Vec<Font>,
    library: LazyHash<Library>,
}

impl PdfWorld {
    fn new(source: String, drawing_svg: String) -> Self {
        let fonts = Self::load_fonts();
        let book = FontBook::from_fonts(&fonts);

        PdfWorld {
            main: Source::detached(source),
            drawing: Bytes::new(drawing_svg.into_bytes()),
            book: LazyHash::new(book),
            fonts,
            library: LazyHash::new(Library::default()),
        }
    }

    fn load_fonts() -> Vec<Font> {
        typst_assets::fonts()
            .flat_map(|font_bytes| Font::iter(Bytes::new(font_bytes.to_vec())))
            .collect()
    }
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        if id.vpath().as_rootless_path() == Path::new(DRAWING_FILE) {
            Ok(self.drawing.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(
            now.format("%Y").to_string().parse().ok()?,
            now.format("%m").to_string().parse().ok()?,
            now.format("%d").to_string().parse().ok()?,
        )
    }
}

// ============================================================================
// Report Template
// ============================================================================

const REPORT_TEMPLATE: &str = r##"
#set page(
  paper: "a4",
  flipped: true,
  margin: (top: 18mm, bottom: 18mm, left: 15mm, right: 15mm),
  header: grid(
    columns: (1fr, 1fr),
    align(left)[#text(size: 9pt, fill: gray)[{{ORGANISATION}}]],
    align(right)[#text(size: 9pt, fill: gray)[LispCanvas design report]],
  ),
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr, 1fr),
      align(left)[#text(size: 9pt)[Job: {{JOB_ID}}]],
      align(center)[#text(size: 9pt)[Page #counter(page).display()]],
      align(right)[#text(size: 9pt)[{{DATE}}]],
    )
  ]
)

#set text(font: "Libertinus Serif", size: 10pt)

#block(width: 100%, fill: rgb("#f0f0f0"), inset: 10pt, radius: 4pt)[
  #grid(
    columns: (2fr, 1fr),
    [
      #text(size: 18pt, weight: "bold")[{{MODULE}}]
      #v(2pt)
      #text(size: 12pt)[{{TITLE}}]
    ],
    align(right)[
      Engineer: {{ENGINEER}} \
      Status: *{{STATUS}}*
    ],
  )
]

#v(8pt)

#grid(
  columns: (1fr, 1fr),
  gutter: 16pt,
  [
    == Input parameters
    #table(
      columns: (2fr, 1fr, auto),
      stroke: 0.5pt + gray,
      [*Parameter*], [*Value*], [*Unit*],
{{PARAMETER_ROWS}}
    )
  ],
  [
    == Results
    #table(
      columns: (2fr, 1fr, auto),
      stroke: 0.5pt + gray,
      [*Quantity*], [*Value*], [*Unit*],
{{SUMMARY_ROWS}}
    )

    == Design checks
    #table(
      columns: (2fr, 1fr, 1fr, auto),
      stroke: 0.5pt + gray,
      [*Check*], [*Actual*], [*Limit*], [*Status*],
{{CHECK_ROWS}}
    )
  ],
)

#pagebreak()

== Drawing
#align(center)[#image("drawing.svg", width: 100%)]
"##;

/// Everything a report needs, borrowed from a drawn module session.
pub struct Report<'a> {
    /// Module display name
    pub module: &'a str,
    pub parameters: &'a [ResolvedParameter],
    pub design: &'a Design,
    pub settings: &'a ReportSettings,
}

/// Compile a design report to PDF bytes.
///
/// # Errors
///
/// `ExportFailed` when Typst compilation or PDF rendering fails.
pub fn render_report(report: &Report<'_>) -> CanvasResult<Vec<u8>> {
    let design = report.design;
    let status = if design.passes() { "ALL CHECKS OK" } else { "CHECKS NOT SATISFIED" };
    let or_dash = |s: &str| if s.trim().is_empty() { "-".to_string() } else { escape_typst(s) };

    let source = REPORT_TEMPLATE
        .replace("{{ORGANISATION}}", &or_dash(&report.settings.organisation))
        .replace("{{JOB_ID}}", &or_dash(&report.settings.job_id))
        .replace("{{ENGINEER}}", &or_dash(&report.settings.engineer))
        .replace("{{DATE}}", &Utc::now().format("%Y-%m-%d").to_string())
        .replace("{{MODULE}}", &escape_typst(report.module))
        .replace("{{TITLE}}", &escape_typst(&design.drawing.title))
        .replace("{{STATUS}}", status)
        .replace("{{PARAMETER_ROWS}}", &parameter_rows(report.parameters))
        .replace("{{SUMMARY_ROWS}}", &summary_rows(design))
        .replace("{{CHECK_ROWS}}", &check_rows(design));

    let svg = render_svg(&design.drawing, 1100.0, 680.0, 20.0);
    let world = PdfWorld::new(source, svg);

    let warned = typst::compile(&world);

    let document = warned.output.map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CanvasError::export_failed("PDF", format!("Typst compilation failed: {}", error_msgs.join("; ")))
    })?;

    let pdf_bytes = typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CanvasError::export_failed("PDF", format!("PDF rendering failed: {}", error_msgs.join("; ")))
    })?;

    debug!(module = report.module, bytes = pdf_bytes.len(), "compiled report");
    Ok(pdf_bytes)
}

/// Escape text for use inside Typst content blocks
fn escape_typst(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '*' => "\\*".to_string(),
            '_' => "\\_".to_string(),
            '#' => "\\#".to_string(),
            '$' => "\\$".to_string(),
            '@' => "\\@".to_string(),
            '<' => "\\<".to_string(),
            '>' => "\\>".to_string(),
            '[' => "\\[".to_string(),
            ']' => "\\]".to_string(),
            '\\' => "\\\\".to_string(),
            '`' => "\\`".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

fn parameter_rows(parameters: &[ResolvedParameter]) -> String {
    parameters
        .iter()
        .map(|p| {
            format!(
                "      [{}], [{}], [{}],",
                escape_typst(p.spec.label),
                escape_typst(&p.value.to_string()),
                escape_typst(p.spec.unit)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn summary_rows(design: &Design) -> String {
    design
        .summary
        .iter()
        .map(|item| {
            format!(
                "      [{}], [{:.*}], [{}],",
                escape_typst(&item.label),
                item.decimals,
                item.value,
                escape_typst(&item.unit)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn check_rows(design: &Design) -> String {
    design
        .checks
        .iter()
        .map(|check| {
            let fill = if check.passes { "#1a7f37" } else { "#cf222e" };
            let status = format!("#text(fill: rgb(\"{}\"))[*{}*]", fill, check.status());
            format!(
                "      [{}], [{}], [{}], [{}],",
                escape_typst(&check.name),
                escape_typst(&check.actual),
                escape_typst(&check.limit),
                status
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::{Drawing, DrawingUnits};
    use crate::params::{ModuleParameterState, ParameterSet};
    use crate::registry::ModuleKind;

    #[test]
    fn test_escape_typst() {
        assert_eq!(escape_typst("a_b [c] #d"), "a\\_b \\[c\\] \\#d");
    }

    #[test]
    fn test_check_rows_mark_verdicts() {
        let design = Design::new(Drawing::new("t", DrawingUnits::Millimetres))
            .check_max("Span/depth", 18.0, 20.0, 1)
            .check_min("Bearing", 100.0, 150.0, 0);
        let rows = check_rows(&design);
        assert!(rows.contains("[*OK*]"));
        assert!(rows.contains("[*NG*]"));
        assert!(rows.contains("#1a7f37") && rows.contains("#cf222e"));
    }

    #[test]
    fn test_pdf_generation() {
        let kind = ModuleKind::Lintel;
        let descriptor = kind.descriptor();
        let state = ModuleParameterState::new();
        let params = ParameterSet::new(descriptor.id, descriptor.parameters, &state);
        let design = (descriptor.design)(&params).unwrap();
        let resolved = params.resolved();
        let settings = ReportSettings {
            engineer: "Test Engineer".into(),
            organisation: "Test PWD".into(),
            job_id: "TEST-001".into(),
        };

        let pdf = render_report(&Report {
            module: descriptor.display_name,
            parameters: &resolved,
            design: &design,
            settings: &settings,
        });
        assert!(pdf.is_ok(), "PDF generation failed: {:?}", pdf.err());

        let pdf_bytes = pdf.unwrap();
        assert!(pdf_bytes.starts_with(b"%PDF"), "Output is not a valid PDF");
        assert!(pdf_bytes.len() > 1000, "PDF seems too small");
    }
}
