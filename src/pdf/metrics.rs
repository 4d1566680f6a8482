//! Glyph advance widths of the standard Helvetica faces, in 1/1000 em,
//! for the printable ASCII range (0x20..=0x7E).

pub const FIRST_CHAR: u8 = 0x20;

/// Width used for characters outside the table.
pub const DEFAULT_WIDTH: u16 = 556;

#[rustfmt::skip]
pub const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
pub const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

pub fn char_width(table: &[u16; 95], c: char) -> u16 {
    let code = c as u32;
    if (FIRST_CHAR as u32..=0x7E).contains(&code) {
        table[(code - FIRST_CHAR as u32) as usize]
    } else {
        DEFAULT_WIDTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_widths() {
        assert_eq!(char_width(&HELVETICA, ' '), 278);
        assert_eq!(char_width(&HELVETICA, 'A'), 667);
        assert_eq!(char_width(&HELVETICA, 'i'), 222);
        assert_eq!(char_width(&HELVETICA, '~'), 584);
        assert_eq!(char_width(&HELVETICA_BOLD, 'A'), 722);
        assert_eq!(char_width(&HELVETICA_BOLD, '@'), 975);
    }

    #[test]
    fn test_out_of_range_uses_default() {
        assert_eq!(char_width(&HELVETICA, '\u{e9}'), DEFAULT_WIDTH);
    }
}
