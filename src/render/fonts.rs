//! Base-14 Helvetica metrics and WinAnsi encoding.
//!
//! The PDF backend never embeds font files: it references the standard
//! Helvetica faces every PDF viewer ships with. That keeps output tiny and
//! deterministic, at the cost of covering only the WinAnsi (Windows-1252)
//! repertoire. Anything outside it is drawn as `?`.

/// Which standard face a run of text uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Face {
    Regular,
    Bold,
}

impl Face {
    pub(crate) fn for_bold(bold: bool) -> Self {
        if bold {
            Face::Bold
        } else {
            Face::Regular
        }
    }

    /// Resource name used in page content streams.
    pub(crate) fn resource_name(self) -> &'static [u8] {
        match self {
            Face::Regular => b"F1",
            Face::Bold => b"F2",
        }
    }

    /// PostScript name of the standard font.
    pub(crate) fn base_font(self) -> &'static [u8] {
        match self {
            Face::Regular => b"Helvetica",
            Face::Bold => b"Helvetica-Bold",
        }
    }

    /// Advance width of one character in 1000-unit em space.
    pub(crate) fn char_width_1000(self, ch: char) -> f32 {
        let table = match self {
            Face::Regular => &HELVETICA_ASCII,
            Face::Bold => &HELVETICA_BOLD_ASCII,
        };
        match char_to_winansi(ch) {
            b @ 0x20..=0x7E => f32::from(table[(b - 0x20) as usize]),
            // Latin-1 and punctuation above 0x7F: average lowercase width
            _ => 556.0,
        }
    }

    pub(crate) fn text_width(self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch))
            .sum::<f32>()
            * font_size
            / 1000.0
    }
}

/// Helvetica widths for 0x20..=0x7E.
#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold widths for 0x20..=0x7E.
#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Map a char to its WinAnsi byte; unmappable chars become `?`.
pub(crate) fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        0x0009 => b' ',
        _ => b'?',
    }
}

/// Encode a line of text for a WinAnsi `Str` operand.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars().map(char_to_winansi).collect()
}
