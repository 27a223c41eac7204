use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::mem;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::truetype::TrueTypeFont;
use crate::aggregate::PeriodTotals;
use crate::error::ExportError;
use crate::report::{format_amount, Report, ReportKind, ReportSection};

// A4 in points.
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 40.0;
const BOTTOM: f32 = 60.0;
const ROW_HEIGHT: f32 = 18.0;
const TABLE_FONT_SIZE: f32 = 9.0;
const FONT_RESOURCE: &str = "F1";

type Rgb = [u8; 3];

const fn rgb(r: u8, g: u8, b: u8) -> Rgb {
    [r, g, b]
}

fn color_operands(color: Rgb) -> Vec<Object> {
    color
        .iter()
        .map(|&c| Object::from(f32::from(c) / 255.0))
        .collect()
}

const WHITE: Rgb = rgb(255, 255, 255);
const INK: Rgb = rgb(31, 41, 55);
const MUTED: Rgb = rgb(156, 163, 175);
const ALT_ROW: Rgb = rgb(249, 250, 251);
const POSITIVE: Rgb = rgb(4, 120, 87);
const NEGATIVE: Rgb = rgb(190, 18, 60);

struct Card {
    fill: Rgb,
    stroke: Rgb,
    label: Rgb,
    value: Rgb,
}

const INCOME_CARD: Card = Card {
    fill: rgb(236, 253, 245),
    stroke: rgb(16, 185, 129),
    label: rgb(6, 95, 70),
    value: rgb(4, 120, 87),
};
const EXPENSE_CARD: Card = Card {
    fill: rgb(255, 241, 242),
    stroke: rgb(244, 63, 94),
    label: rgb(159, 18, 57),
    value: rgb(190, 18, 60),
};
const PROFIT_CARD: Card = Card {
    fill: rgb(239, 246, 255),
    stroke: rgb(59, 130, 246),
    label: rgb(30, 58, 138),
    value: rgb(29, 78, 216),
};

/// Render a report as a single PDF. Without `font` the built-in Helvetica is
/// used, which only covers WinAnsi text; anything else is refused rather
/// than printed as `?`.
pub(crate) fn render(report: &Report, font: Option<&Path>) -> Result<Vec<u8>, ExportError> {
    if font.is_none() {
        if let Some(sample) = first_non_win_ansi(report) {
            return Err(ExportError::FontRequired { sample });
        }
    }
    let face = Face::load(font)?;
    let mut canvas = Canvas::new(face);

    draw_banner(&mut canvas, report);
    if let Some(totals) = &report.totals {
        draw_kpis(&mut canvas, report, totals);
    }
    for (index, section) in report.sections.iter().enumerate() {
        draw_section(&mut canvas, section, section_accent(report.kind, index));
    }
    if let Some(note) = &report.note {
        canvas.ensure_space(ROW_HEIGHT);
        let y = canvas.cursor - ROW_HEIGHT + 5.0;
        canvas.text(MARGIN + 4.0, y, TABLE_FONT_SIZE, MUTED, note);
        canvas.cursor -= ROW_HEIGHT;
    }

    let (face, pages) = canvas.finish(&report.brand);
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = face.into_resource(&mut doc);
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { FONT_RESOURCE => font_id },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::from(page_id));
    }
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    log::debug!("rendered {count} pdf page(s), {} bytes", bytes.len());
    Ok(bytes)
}

fn draw_banner(canvas: &mut Canvas, report: &Report) {
    let band = 113.0;
    canvas.fill_rect(0.0, PAGE_HEIGHT - band, PAGE_WIDTH, band, INK);
    let right = PAGE_WIDTH - MARGIN;
    canvas.text(MARGIN, PAGE_HEIGHT - 57.0, 24.0, WHITE, &report.brand);
    canvas.text(
        MARGIN,
        PAGE_HEIGHT - 85.0,
        10.0,
        MUTED,
        &report.title.to_uppercase(),
    );
    if !report.subtitle.is_empty() {
        canvas.text_right(right, PAGE_HEIGHT - 57.0, 12.0, WHITE, &report.subtitle);
    }
    canvas.text_right(right, PAGE_HEIGHT - 85.0, 9.0, MUTED, &report.generated);
    canvas.cursor = PAGE_HEIGHT - band - 28.0;
}

fn draw_kpis(canvas: &mut Canvas, report: &Report, totals: &PeriodTotals) {
    let height = 68.0;
    let gap = 12.0;
    let width = (PAGE_WIDTH - 2.0 * MARGIN - 2.0 * gap) / 3.0;
    let top = canvas.cursor;
    let currency = &report.currency;
    let values = [
        format!("+{} {currency}", format_amount(totals.income)),
        format!("-{} {currency}", format_amount(totals.expense)),
        format!("{} {currency}", format_amount(totals.profit)),
    ];
    let cards = [&INCOME_CARD, &EXPENSE_CARD, &PROFIT_CARD];

    for (i, ((card, label), value)) in cards
        .iter()
        .zip(report.kpi_labels.iter())
        .zip(values.iter())
        .enumerate()
    {
        let x = MARGIN + i as f32 * (width + gap);
        canvas.card(x, top - height, width, height, card.fill, card.stroke);
        canvas.text(x + 10.0, top - 22.0, 9.0, card.label, &label.to_uppercase());
        canvas.text(x + 10.0, top - 50.0, 14.0, card.value, value);
    }
    canvas.cursor = top - height - 24.0;
}

fn section_accent(kind: ReportKind, index: usize) -> Rgb {
    match (kind, index) {
        (ReportKind::Journal, _) => rgb(55, 65, 81),
        (ReportKind::Stock, _) => rgb(71, 85, 105),
        (ReportKind::Analysis, 1) => rgb(16, 185, 129),
        (ReportKind::Analysis, 2) => rgb(244, 63, 94),
        (ReportKind::Analysis, _) => rgb(66, 66, 66),
    }
}

fn column_widths(count: usize) -> Vec<f32> {
    let usable = PAGE_WIDTH - 2.0 * MARGIN;
    let shares: Vec<f32> = match count {
        4 => vec![0.15, 0.15, 0.5, 0.2],
        2 => vec![0.7, 0.3],
        n => vec![1.0 / n.max(1) as f32; n],
    };
    shares.into_iter().map(|share| share * usable).collect()
}

fn draw_section(canvas: &mut Canvas, section: &ReportSection, accent: Rgb) {
    let widths = column_widths(section.headers.len());
    canvas.ensure_space(2.0 * ROW_HEIGHT);
    draw_row(canvas, &section.headers, &widths, Some(accent), WHITE);

    for (index, row) in section.rows.iter().enumerate() {
        if canvas.ensure_space(ROW_HEIGHT) {
            draw_row(canvas, &section.headers, &widths, Some(accent), WHITE);
        }
        let fill = (index % 2 == 1).then_some(ALT_ROW);
        let color = match row.amount {
            Some(amount) if amount > 0.0 => POSITIVE,
            Some(amount) if amount < 0.0 => NEGATIVE,
            _ => INK,
        };
        draw_row(canvas, &row.cells, &widths, fill, color);
    }
    canvas.cursor -= ROW_HEIGHT;
}

/// The last column is right-aligned and takes `last_color`.
fn draw_row(
    canvas: &mut Canvas,
    cells: &[String],
    widths: &[f32],
    fill: Option<Rgb>,
    last_color: Rgb,
) {
    let top = canvas.cursor;
    let baseline = top - ROW_HEIGHT + 5.5;
    if let Some(fill) = fill {
        canvas.fill_rect(
            MARGIN,
            top - ROW_HEIGHT,
            PAGE_WIDTH - 2.0 * MARGIN,
            ROW_HEIGHT,
            fill,
        );
    }
    let header = fill.is_some_and(|color| color != ALT_ROW);
    let mut x = MARGIN;
    let last = cells.len().saturating_sub(1);
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        let room = width - 8.0;
        let text = canvas.face.fit(cell, TABLE_FONT_SIZE, room);
        let color = if header {
            WHITE
        } else if i == last {
            last_color
        } else {
            INK
        };
        if i == last && i > 0 {
            canvas.text_right(x + width - 4.0, baseline, TABLE_FONT_SIZE, color, &text);
        } else {
            canvas.text(x + 4.0, baseline, TABLE_FONT_SIZE, color, &text);
        }
        x += width;
    }
    canvas.cursor -= ROW_HEIGHT;
}

struct Canvas {
    face: Face,
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    cursor: f32,
}

impl Canvas {
    fn new(face: Face) -> Self {
        Self {
            face,
            pages: Vec::new(),
            ops: Vec::new(),
            cursor: PAGE_HEIGHT - MARGIN,
        }
    }

    fn set_fill(&mut self, color: Rgb) {
        self.ops.push(Operation::new("rg", color_operands(color)));
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        self.set_fill(color);
        self.ops.push(Operation::new(
            "re",
            vec![x.into(), y.into(), width.into(), height.into()],
        ));
        self.ops.push(Operation::new("f", vec![]));
    }

    fn card(&mut self, x: f32, y: f32, width: f32, height: f32, fill: Rgb, stroke: Rgb) {
        self.set_fill(fill);
        self.ops.push(Operation::new("RG", color_operands(stroke)));
        self.ops.push(Operation::new("w", vec![1.into()]));
        self.ops.push(Operation::new(
            "re",
            vec![x.into(), y.into(), width.into(), height.into()],
        ));
        self.ops.push(Operation::new("B", vec![]));
    }

    fn text(&mut self, x: f32, y: f32, size: f32, color: Rgb, text: &str) {
        let encoded = self.face.encode(text);
        self.set_fill(color);
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![Object::Name(FONT_RESOURCE.as_bytes().to_vec()), size.into()],
        ));
        self.ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.ops.push(Operation::new("Tj", vec![encoded]));
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn text_right(&mut self, right: f32, y: f32, size: f32, color: Rgb, text: &str) {
        let width = self.face.width(text, size);
        self.text(right - width, y, size, color, text);
    }

    /// Start a new page when fewer than `height` points remain. Returns true
    /// when a break happened.
    fn ensure_space(&mut self, height: f32) -> bool {
        if self.cursor - height >= BOTTOM {
            return false;
        }
        self.pages.push(mem::take(&mut self.ops));
        self.cursor = PAGE_HEIGHT - MARGIN;
        true
    }

    fn finish(mut self, brand: &str) -> (Face, Vec<Vec<Operation>>) {
        self.pages.push(mem::take(&mut self.ops));
        let total = self.pages.len();
        let mut pages = mem::take(&mut self.pages);
        for (index, page) in pages.iter_mut().enumerate() {
            self.text(MARGIN, 28.0, 8.0, MUTED, brand);
            self.text_right(
                PAGE_WIDTH - MARGIN,
                28.0,
                8.0,
                MUTED,
                &format!("{} / {total}", index + 1),
            );
            page.append(&mut self.ops);
        }
        (self.face, pages)
    }
}

struct EmbeddedFace {
    font: TrueTypeFont,
    name: String,
    used: BTreeMap<u16, char>,
}

enum Face {
    Helvetica,
    Embedded(Box<EmbeddedFace>),
}

impl Face {
    fn load(path: Option<&Path>) -> Result<Self, ExportError> {
        let Some(path) = path else {
            return Ok(Face::Helvetica);
        };
        let font_error = |reason: String| ExportError::Font {
            path: path.to_path_buf(),
            reason,
        };
        let data = std::fs::read(path).map_err(|err| font_error(err.to_string()))?;
        let font = TrueTypeFont::parse(data).map_err(font_error)?;
        let name: String = path
            .file_stem()
            .map(|stem| stem.to_string_lossy())
            .unwrap_or_default()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect();
        Ok(Face::Embedded(Box::new(EmbeddedFace {
            font,
            name: if name.is_empty() {
                "EmbeddedFont".to_string()
            } else {
                name
            },
            used: BTreeMap::new(),
        })))
    }

    fn encode(&mut self, text: &str) -> Object {
        match self {
            Face::Helvetica => Object::String(
                text.chars()
                    .map(|c| win_ansi_byte(c).unwrap_or(b'?'))
                    .collect(),
                StringFormat::Literal,
            ),
            Face::Embedded(face) => {
                let mut bytes = Vec::with_capacity(text.len() * 2);
                for c in text.chars() {
                    let gid = match face.font.glyph(c) {
                        Some(gid) => {
                            face.used.entry(gid).or_insert(c);
                            gid
                        }
                        None => face.font.glyph('?').unwrap_or(0),
                    };
                    bytes.extend_from_slice(&gid.to_be_bytes());
                }
                Object::String(bytes, StringFormat::Hexadecimal)
            }
        }
    }

    fn width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = match self {
            Face::Helvetica => text
                .chars()
                .map(|c| helvetica_width(win_ansi_byte(c).unwrap_or(b'?')))
                .sum(),
            Face::Embedded(face) => text
                .chars()
                .map(|c| {
                    let gid = face.font.glyph(c).or_else(|| face.font.glyph('?'));
                    face.font.advance(gid.unwrap_or(0))
                })
                .sum(),
        };
        units as f32 * size / 1000.0
    }

    /// Truncate with an ellipsis until the text fits `room` points.
    fn fit(&self, text: &str, size: f32, room: f32) -> String {
        if self.width(text, size) <= room {
            return text.to_string();
        }
        let mut chars: Vec<char> = text.chars().collect();
        while !chars.is_empty() {
            chars.pop();
            let candidate: String = chars.iter().chain(['.', '.', '.'].iter()).collect();
            if self.width(&candidate, size) <= room {
                return candidate;
            }
        }
        String::new()
    }

    fn into_resource(self, doc: &mut Document) -> ObjectId {
        let face = match self {
            Face::Helvetica => {
                return doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "Helvetica",
                    "Encoding" => "WinAnsiEncoding",
                });
            }
            Face::Embedded(face) => face,
        };
        let font = &face.font;
        let base_font = Object::Name(face.name.as_bytes().to_vec());

        let file_id = doc.add_object(Stream::new(
            dictionary! { "Length1" => font.bytes().len() as i64 },
            font.bytes().to_vec(),
        ));
        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => base_font.clone(),
            "Flags" => 32,
            "FontBBox" => font.bbox().iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>(),
            "ItalicAngle" => 0,
            "Ascent" => font.ascent(),
            "Descent" => font.descent(),
            "CapHeight" => font.ascent(),
            "StemV" => 80,
            "FontFile2" => file_id,
        });
        let widths: Vec<Object> = face
            .used
            .keys()
            .flat_map(|&gid| {
                [
                    Object::Integer(i64::from(gid)),
                    Object::Array(vec![Object::Integer(i64::from(font.advance(gid)))]),
                ]
            })
            .collect();
        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => base_font.clone(),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "W" => widths,
            "CIDToGIDMap" => "Identity",
        });
        let to_unicode_id = doc.add_object(Stream::new(
            dictionary! {},
            to_unicode_cmap(&face.used).into_bytes(),
        ));
        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => base_font,
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::from(cid_font_id)],
            "ToUnicode" => to_unicode_id,
        })
    }
}

fn to_unicode_cmap(used: &BTreeMap<u16, char>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    let entries: Vec<(&u16, &char)> = used.iter().collect();
    // At most 100 mappings per bfchar block.
    for chunk in entries.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for (gid, c) in chunk {
            let mut units = [0u16; 2];
            let utf16: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|unit| format!("{unit:04X}"))
                .collect();
            let _ = writeln!(cmap, "<{gid:04X}> <{utf16}>");
        }
        cmap.push_str("endbfchar\n");
    }
    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap
}

// WinAnsi agrees with Latin-1 on 0xA0..=0xFF.
fn win_ansi_byte(c: char) -> Option<u8> {
    match u32::from(c) {
        code @ (0x20..=0x7E | 0xA0..=0xFF) => Some(code as u8),
        _ => None,
    }
}

/// First character of the report the built-in font cannot show. KPI captions
/// are checked as drawn, in upper case.
fn first_non_win_ansi(report: &Report) -> Option<char> {
    let plain = [
        report.brand.as_str(),
        report.title.as_str(),
        report.subtitle.as_str(),
        report.generated.as_str(),
        report.currency.as_str(),
    ]
    .into_iter()
    .chain(report.note.as_deref())
    .chain(report.sections.iter().flat_map(|section| {
        section
            .headers
            .iter()
            .chain(section.rows.iter().flat_map(|row| row.cells.iter()))
            .map(String::as_str)
    }))
    .flat_map(str::chars);
    let captions = report
        .kpi_labels
        .iter()
        .flat_map(|label| label.to_uppercase().chars().collect::<Vec<_>>());
    plain
        .chain(captions)
        .find(|&c| win_ansi_byte(c).is_none())
}

#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

fn helvetica_width(byte: u8) -> u32 {
    match byte {
        0x20..=0x7E => u32::from(HELVETICA_ASCII[usize::from(byte - 0x20)]),
        _ => 556,
    }
}
