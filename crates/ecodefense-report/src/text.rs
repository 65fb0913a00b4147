//! WinAnsi encoding, Helvetica metrics and word wrapping

/// Standard-14 faces used by the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    /// Helvetica
    Regular,
    /// Helvetica-Bold
    Bold,
    /// Helvetica-Oblique
    Italic,
}

impl Face {
    /// Resource name in the page font dictionary
    pub fn resource(&self) -> &'static [u8] {
        match self {
            Face::Regular => b"F1",
            Face::Bold => b"F2",
            Face::Italic => b"F3",
        }
    }

    /// PostScript base font name
    pub fn base_font(&self) -> &'static [u8] {
        match self {
            Face::Regular => b"Helvetica",
            Face::Bold => b"Helvetica-Bold",
            Face::Italic => b"Helvetica-Oblique",
        }
    }

    /// All faces, in resource order
    pub const ALL: [Face; 3] = [Face::Regular, Face::Bold, Face::Italic];
}

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Encode `text` for a WinAnsi font; unencodable characters become `?`
///
/// Only the Latin-1 range is mapped; control characters are dropped.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Width of `text` set in `face` at `size` points
pub fn text_width(text: &str, face: Face, size: f32) -> f32 {
    let units: u32 = encode_win_ansi(text)
        .into_iter()
        .map(|b| glyph_width(b) as u32)
        .sum();
    let scale = if face == Face::Bold { 1.06 } else { 1.0 };
    units as f32 * size / 1000.0 * scale
}

fn glyph_width(byte: u8) -> u16 {
    match byte {
        0x20..=0x7E => HELVETICA_WIDTHS[(byte - 0x20) as usize],
        // accented Latin-1 letters are as wide as their base letters
        0xC0..=0xC5 => 667,
        0xC7 => 722,
        0xC8..=0xCB => 667,
        0xCC..=0xCF => 278,
        0xD1..=0xD6 | 0xD8..=0xDC => 722,
        0xE0..=0xE5 => 556,
        0xE7 | 0xE8..=0xEB => 556,
        0xEC..=0xEF => 278,
        0xF1..=0xF6 | 0xF8..=0xFC => 556,
        _ => 556,
    }
}

/// Break `text` into lines no wider than `max_width`
///
/// Existing line breaks are kept; blank input lines become empty lines.
/// A word wider than the line is split by characters.
pub fn wrap(text: &str, face: Face, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if text_width(&candidate, face, size) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width(word, face, size) <= max_width {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    let mut next = current.clone();
                    next.push(c);
                    if !current.is_empty() && text_width(&next, face, size) > max_width {
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    } else {
                        current = next;
                    }
                }
            }
        }
        lines.push(current);
    }

    lines
}
