//! Font metrics and character lookup for PDF embedding, read once with
//! `ttf-parser` so the renderer never holds a borrowed face.

use std::collections::HashMap;

use ttf_parser::{Face, GlyphId};

#[derive(Debug)]
pub(crate) struct TrueTypeFont {
    data: Vec<u8>,
    units_per_em: u16,
    bbox: [i16; 4],
    ascent: i16,
    descent: i16,
    advances: Vec<u16>,
    glyphs: HashMap<char, u16>,
}

impl TrueTypeFont {
    pub(crate) fn parse(data: Vec<u8>) -> Result<Self, String> {
        let face = Face::parse(&data, 0).map_err(|err| err.to_string())?;

        let mut glyphs = HashMap::new();
        let subtables = face
            .tables()
            .cmap
            .into_iter()
            .flat_map(|cmap| cmap.subtables)
            .filter(|subtable| subtable.is_unicode());
        for subtable in subtables {
            subtable.codepoints(|code| {
                let Some(c) = char::from_u32(code) else {
                    return;
                };
                match subtable.glyph_index(code) {
                    Some(GlyphId(gid)) if gid != 0 => {
                        glyphs.entry(c).or_insert(gid);
                    }
                    _ => {}
                }
            });
        }
        if glyphs.is_empty() {
            return Err("no unicode cmap".to_string());
        }

        let advances = (0..face.number_of_glyphs())
            .map(|gid| face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0))
            .collect();
        let rect = face.global_bounding_box();
        Ok(Self {
            units_per_em: face.units_per_em(),
            bbox: [rect.x_min, rect.y_min, rect.x_max, rect.y_max],
            ascent: face.ascender(),
            descent: face.descender(),
            advances,
            glyphs,
            data,
        })
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn glyph(&self, c: char) -> Option<u16> {
        self.glyphs.get(&c).copied()
    }

    /// Advance width in thousandths of an em.
    pub(crate) fn advance(&self, gid: u16) -> u32 {
        let units = self
            .advances
            .get(usize::from(gid))
            .or(self.advances.last())
            .copied()
            .unwrap_or(0);
        u32::from(units) * 1000 / u32::from(self.units_per_em)
    }

    /// `[xMin, yMin, xMax, yMax]` scaled to thousandths of an em.
    pub(crate) fn bbox(&self) -> [i64; 4] {
        self.bbox.map(|v| self.scale(v))
    }

    pub(crate) fn ascent(&self) -> i64 {
        self.scale(self.ascent)
    }

    pub(crate) fn descent(&self) -> i64 {
        self.scale(self.descent)
    }

    fn scale(&self, value: i16) -> i64 {
        i64::from(value) * 1000 / i64::from(self.units_per_em)
    }
}
