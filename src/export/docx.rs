use std::fmt::Write as _;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;
use crate::report::{format_amount, Report, ReportKind, ReportSection};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_OPEN: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;

// A4 with 2 cm margins, in twentieths of a point.
const DOCUMENT_CLOSE: &str = r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1134" w:right="1134" w:bottom="1134" w:left="1134" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#;

const INCOME_COLOR: &str = "047857";
const EXPENSE_COLOR: &str = "BE123C";
const PROFIT_COLOR: &str = "1D4ED8";

#[derive(Clone, Copy, Default)]
struct Run<'a> {
    bold: bool,
    /// Half-points.
    size: Option<u32>,
    color: Option<&'a str>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Right,
}

#[derive(Default)]
struct Body {
    xml: String,
}

impl Body {
    fn paragraph(&mut self, text: &str, run: Run<'_>, align: Align) {
        self.xml.push_str("<w:p>");
        match align {
            Align::Left => {}
            Align::Center => self.xml.push_str(r#"<w:pPr><w:jc w:val="center"/></w:pPr>"#),
            Align::Right => self.xml.push_str(r#"<w:pPr><w:jc w:val="right"/></w:pPr>"#),
        }
        if !text.is_empty() {
            self.xml.push_str("<w:r>");
            if run.bold || run.size.is_some() || run.color.is_some() {
                self.xml.push_str("<w:rPr>");
                if run.bold {
                    self.xml.push_str("<w:b/>");
                }
                if let Some(color) = run.color {
                    let _ = write!(self.xml, r#"<w:color w:val="{color}"/>"#);
                }
                if let Some(size) = run.size {
                    let _ = write!(self.xml, r#"<w:sz w:val="{size}"/>"#);
                }
                self.xml.push_str("</w:rPr>");
            }
            let _ = write!(
                self.xml,
                r#"<w:t xml:space="preserve">{}</w:t>"#,
                escape_xml(text)
            );
            self.xml.push_str("</w:r>");
        }
        self.xml.push_str("</w:p>");
    }

    fn spacer(&mut self) {
        self.paragraph("", Run::default(), Align::Left);
    }

    fn table_open(&mut self) {
        self.xml.push_str(
            r#"<w:tbl><w:tblPr><w:tblW w:w="5000" w:type="pct"/><w:tblBorders><w:top w:val="single" w:sz="4" w:color="D1D5DB"/><w:bottom w:val="single" w:sz="4" w:color="D1D5DB"/><w:insideH w:val="single" w:sz="4" w:color="D1D5DB"/></w:tblBorders></w:tblPr>"#,
        );
    }

    /// `width` in fiftieths of a percent.
    fn cell(
        &mut self,
        width: u32,
        fill: Option<&str>,
        paragraphs: &[(&str, Run<'_>, Align)],
    ) {
        let _ = write!(self.xml, r#"<w:tc><w:tcPr><w:tcW w:w="{width}" w:type="pct"/>"#);
        if let Some(fill) = fill {
            let _ = write!(
                self.xml,
                r#"<w:shd w:val="clear" w:color="auto" w:fill="{fill}"/>"#
            );
        }
        self.xml.push_str("</w:tcPr>");
        for (text, run, align) in paragraphs {
            self.paragraph(text, *run, *align);
        }
        self.xml.push_str("</w:tc>");
    }
}

/// Render a report as a minimal WordprocessingML package.
pub(crate) fn render(report: &Report) -> Result<Vec<u8>, ExportError> {
    let document = document_xml(report);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("word/document.xml", document.as_str()),
    ] {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn document_xml(report: &Report) -> String {
    let mut body = Body::default();
    body.paragraph(
        &report.brand,
        Run {
            bold: true,
            size: Some(36),
            ..Run::default()
        },
        Align::Center,
    );
    body.paragraph(
        &report.title,
        Run {
            bold: true,
            size: Some(28),
            ..Run::default()
        },
        Align::Center,
    );
    if !report.subtitle.is_empty() {
        body.paragraph(&report.subtitle, Run::default(), Align::Center);
    }
    body.paragraph(&report.generated, Run::default(), Align::Center);
    body.spacer();

    if let Some(totals) = &report.totals {
        let currency = &report.currency;
        let cards = [
            (
                INCOME_COLOR,
                format!("+{} {currency}", format_amount(totals.income)),
            ),
            (
                EXPENSE_COLOR,
                format!("-{} {currency}", format_amount(totals.expense)),
            ),
            (
                PROFIT_COLOR,
                format!("{} {currency}", format_amount(totals.profit)),
            ),
        ];
        body.table_open();
        body.xml.push_str("<w:tr>");
        for ((color, value), label) in cards.iter().zip(report.kpi_labels.iter()) {
            let label_run = Run {
                color: Some(*color),
                ..Run::default()
            };
            let value_run = Run {
                bold: true,
                size: Some(28),
                color: Some(*color),
            };
            body.cell(
                1666,
                None,
                &[
                    (label.as_str(), label_run, Align::Left),
                    (value.as_str(), value_run, Align::Left),
                ],
            );
        }
        body.xml.push_str("</w:tr></w:tbl>");
        body.spacer();
    }

    for (index, section) in report.sections.iter().enumerate() {
        section_table(&mut body, section, header_fill(report.kind, index));
        body.spacer();
    }
    if let Some(note) = &report.note {
        body.paragraph(note, Run::default(), Align::Left);
    }

    let mut xml = String::with_capacity(body.xml.len() + 512);
    xml.push_str(DOCUMENT_OPEN);
    xml.push_str(&body.xml);
    xml.push_str(DOCUMENT_CLOSE);
    xml
}

fn header_fill(kind: ReportKind, index: usize) -> &'static str {
    match (kind, index) {
        (ReportKind::Journal, _) => "374151",
        (ReportKind::Stock, _) => "475569",
        (ReportKind::Analysis, 1) => "10B981",
        (ReportKind::Analysis, 2) => "F43F5E",
        (ReportKind::Analysis, _) => "424242",
    }
}

fn column_widths(count: usize) -> Vec<u32> {
    match count {
        4 => vec![750, 750, 2500, 1000],
        2 => vec![3500, 1500],
        n => vec![5000 / n.max(1) as u32; n],
    }
}

fn section_table(body: &mut Body, section: &ReportSection, fill: &str) {
    let widths = column_widths(section.headers.len());
    let last = section.headers.len().saturating_sub(1);
    let align = |i: usize| {
        if i == last && i > 0 {
            Align::Right
        } else {
            Align::Left
        }
    };

    body.table_open();
    body.xml.push_str("<w:tr>");
    let header_run = Run {
        bold: true,
        size: None,
        color: Some("FFFFFF"),
    };
    for (i, (header, width)) in section.headers.iter().zip(&widths).enumerate() {
        body.cell(*width, Some(fill), &[(header.as_str(), header_run, align(i))]);
    }
    body.xml.push_str("</w:tr>");

    for row in &section.rows {
        body.xml.push_str("<w:tr>");
        for (i, (cell, width)) in row.cells.iter().zip(&widths).enumerate() {
            let run = if i == last {
                Run {
                    bold: true,
                    ..Run::default()
                }
            } else {
                Run::default()
            };
            body.cell(*width, None, &[(cell.as_str(), run, align(i))]);
        }
        body.xml.push_str("</w:tr>");
    }
    body.xml.push_str("</w:tbl>");
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c if c.is_control() && c != '\t' && c != '\n' => {}
            c => escaped.push(c),
        }
    }
    escaped
}
