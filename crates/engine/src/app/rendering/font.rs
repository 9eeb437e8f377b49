use crate::Vec2;

use super::surface::{Rect, TextAlign, TextBaseline, TextStyle};

pub(crate) const GLYPH_WIDTH: u32 = 3;
pub(crate) const GLYPH_HEIGHT: u32 = 5;
const FALLBACK_CHAR: char = '?';

// 3x5 glyphs for ' '..='~', five 3-bit rows packed top row first.
const GLYPHS: [u16; 95] = [
    0x0000, 0x2482, 0x5A00, 0x5F7D, 0x7DDF, 0x52A5, 0x2AAB, 0x2400, // ' '..'\''
    0x1491, 0x4494, 0x0AA8, 0x05D0, 0x0014, 0x01C0, 0x0002, 0x12A4, // '('..'/'
    0x7B6F, 0x2C97, 0x73E7, 0x73CF, 0x5BC9, 0x79CF, 0x79EF, 0x7292, // '0'..'7'
    0x7BEF, 0x7BCF, 0x0410, 0x0414, 0x1511, 0x0E38, 0x4454, 0x72C2, // '8'..'?'
    0x7BE7, 0x2BED, 0x6BAE, 0x7927, 0x6B6E, 0x79A7, 0x79A4, 0x796F, // '@'..'G'
    0x5BED, 0x7497, 0x726F, 0x5BAD, 0x4927, 0x5FED, 0x5FFD, 0x7B6F, // 'H'..'O'
    0x6BA4, 0x7B79, 0x6BAD, 0x79CF, 0x7492, 0x5B6F, 0x5B6A, 0x5BFD, // 'P'..'W'
    0x5AAD, 0x5A92, 0x72A7, 0x6926, 0x4889, 0x324B, 0x2A00, 0x0007, // 'X'..'_'
    0x4400, 0x0E7F, 0x49AE, 0x0F27, 0x13EF, 0x0FA7, 0x39A4, 0x0F79, // '`'..'g'
    0x49AD, 0x2092, 0x106A, 0x4BAD, 0x4927, 0x0DED, 0x0D6D, 0x0F6F, // 'h'..'o'
    0x0D74, 0x0F79, 0x0D64, 0x0F8F, 0x2E93, 0x0B6F, 0x0B6A, 0x0B7A, // 'p'..'w'
    0x0A95, 0x0B79, 0x0E57, 0x3593, 0x2492, 0x64D6, 0x0780, // 'x'..'~'
];

fn glyph_bits(ch: char) -> u16 {
    let ch = if (' '..='~').contains(&ch) {
        ch
    } else {
        FALLBACK_CHAR
    };
    GLYPHS[ch as usize - ' ' as usize]
}

fn glyph_row(bits: u16, row: u32) -> u8 {
    ((bits >> ((GLYPH_HEIGHT - 1 - row) * GLYPH_WIDTH)) & 0b111) as u8
}

fn cell_size(size: f32) -> f32 {
    size / GLYPH_HEIGHT as f32
}

pub(crate) fn text_width(text: &str, size: f32) -> f32 {
    let count = text.chars().count();
    if count == 0 {
        return 0.0;
    }
    let cell = cell_size(size);
    count as f32 * (GLYPH_WIDTH + 1) as f32 * cell - cell
}

/// Lit glyph cells of `text` as local-space rectangles, with horizontal runs merged.
pub(crate) fn layout_text(text: &str, origin: Vec2, style: &TextStyle) -> Vec<Rect> {
    let cell = cell_size(style.size);
    if !(cell.is_finite() && cell > 0.0) {
        return Vec::new();
    }

    let width = text_width(text, style.size);
    let left = match style.align {
        TextAlign::Left => origin.x,
        TextAlign::Center => origin.x - width * 0.5,
        TextAlign::Right => origin.x - width,
    };
    let top = match style.baseline {
        TextBaseline::Top => origin.y,
        TextBaseline::Middle => origin.y - style.size * 0.5,
        TextBaseline::Bottom => origin.y - style.size,
    };

    let mut rects = Vec::new();
    for (index, ch) in text.chars().enumerate() {
        let bits = glyph_bits(ch);
        if bits == 0 {
            continue;
        }
        let glyph_left = left + index as f32 * (GLYPH_WIDTH + 1) as f32 * cell;
        for row in 0..GLYPH_HEIGHT {
            let row_bits = glyph_row(bits, row);
            let mut col = 0;
            while col < GLYPH_WIDTH {
                if row_bits & (0b100 >> col) == 0 {
                    col += 1;
                    continue;
                }
                let run_start = col;
                while col < GLYPH_WIDTH && row_bits & (0b100 >> col) != 0 {
                    col += 1;
                }
                rects.push(Rect::new(
                    glyph_left + run_start as f32 * cell,
                    top + row as f32 * cell,
                    (col - run_start) as f32 * cell,
                    cell,
                ));
            }
        }
    }
    rects
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(align: TextAlign, baseline: TextBaseline) -> TextStyle {
        TextStyle {
            size: 5.0,
            align,
            baseline,
            ..TextStyle::default()
        }
    }

    #[test]
    fn every_printable_ascii_glyph_except_space_has_pixels() {
        for code in 33u8..=126u8 {
            assert_ne!(glyph_bits(char::from(code)), 0, "char={}", char::from(code));
        }
        assert_eq!(glyph_bits(' '), 0);
    }

    #[test]
    fn non_ascii_falls_back_to_question_mark() {
        assert_eq!(glyph_bits('é'), glyph_bits('?'));
    }

    #[test]
    fn digit_one_has_expected_rows() {
        let bits = glyph_bits('1');
        let rows: Vec<u8> = (0..GLYPH_HEIGHT).map(|row| glyph_row(bits, row)).collect();
        assert_eq!(rows, vec![0b010, 0b110, 0b010, 0b010, 0b111]);
    }

    #[test]
    fn width_accounts_for_spacing() {
        assert_eq!(text_width("", 5.0), 0.0);
        assert!((text_width("ab", 5.0) - 7.0).abs() < 0.0001);
    }

    #[test]
    fn centered_middle_text_is_balanced_around_origin() {
        let rects = layout_text("-", Vec2::new(10.0, 10.0), &style(TextAlign::Center, TextBaseline::Middle));
        assert_eq!(rects.len(), 1);
        let rect = rects[0];
        assert!((rect.x - 8.5).abs() < 0.0001);
        assert!((rect.width - 3.0).abs() < 0.0001);
        assert!((rect.y - 9.5).abs() < 0.0001);
    }

    #[test]
    fn full_rows_merge_into_single_rect() {
        let rects = layout_text("_", Vec2::ZERO, &style(TextAlign::Left, TextBaseline::Top));
        assert_eq!(rects.len(), 1);
        assert!((rects[0].y - 4.0).abs() < 0.0001);
    }

    #[test]
    fn zero_size_text_produces_nothing() {
        let style = TextStyle {
            size: 0.0,
            ..TextStyle::default()
        };
        assert!(layout_text("abc", Vec2::ZERO, &style).is_empty());
    }
}
