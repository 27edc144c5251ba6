//! Column accounting for UTF-8 text in fixed-width fields.
//!
//! The terminal renders some code points (CJK ideographs, Hangul, fullwidth
//! forms) in two columns. Fixed-width fields such as the main view's author
//! column need to know how many bytes of a string fit in a column budget and
//! how far the byte count drifts from the column count.

/// Code points above this value are not decoded; decoding stops there.
const MAX_DECODABLE: u32 = 0xffff;

/// Encoded length of a UTF-8 sequence indexed by its leading byte.
/// Continuation bytes and invalid leaders count as a single literal byte.
const UTF8_BYTES: [u8; 256] = build_utf8_bytes();

const fn build_utf8_bytes() -> [u8; 256] {
    let mut table = [1u8; 256];
    let mut b = 0xc0;
    while b < 0xfe {
        table[b] = match b {
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            0xf8..=0xfb => 5,
            _ => 6,
        };
        b += 1;
    }
    table
}

/// Result of fitting a byte string into a column budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utf8Fit {
    /// Number of leading bytes that fit within the budget.
    pub bytes: usize,
    /// Incoming column offset plus, for every consumed code point, the
    /// difference between its encoded length and its display width.
    pub col_offset: usize,
    /// True if decoding stopped because the next code point would overflow
    /// the budget.
    pub trimmed: bool,
}

impl Utf8Fit {
    /// Display columns occupied by the fitted prefix, given the column offset
    /// the caller passed in.
    pub fn columns(&self, base_offset: usize) -> usize {
        self.bytes - (self.col_offset - base_offset)
    }
}

/// Display width of a decoded code point: 2 for wide East Asian forms,
/// 1 for everything else.
pub fn unicode_width(c: u32) -> usize {
    let wide = c >= 0x1100
        && (c <= 0x115f // Hangul Jamo
            || c == 0x2329
            || c == 0x232a
            || ((0x2e80..=0xa4cf).contains(&c) && c != 0x303f) // CJK ... Yi
            || (0xac00..=0xd7a3).contains(&c) // Hangul Syllables
            || (0xf900..=0xfaff).contains(&c) // CJK Compatibility Ideographs
            || (0xfe30..=0xfe6f).contains(&c) // CJK Compatibility Forms
            || (0xff00..=0xff60).contains(&c) // Fullwidth Forms
            || (0xffe0..=0xffe6).contains(&c)
            || (0x20000..=0x2fffd).contains(&c)
            || (0x30000..=0x3fffd).contains(&c));
    if wide {
        2
    } else {
        1
    }
}

/// Decode one sequence whose length was taken from [`UTF8_BYTES`].
/// Returns 0 for NUL and for anything beyond [`MAX_DECODABLE`].
fn utf8_to_unicode(seq: &[u8]) -> u32 {
    let cont = |i: usize, shift: u32| ((seq[i] & 0x3f) as u32) << shift;
    let unicode = match seq.len() {
        1 => seq[0] as u32,
        2 => (((seq[0] & 0x1f) as u32) << 6) + cont(1, 0),
        3 => (((seq[0] & 0x0f) as u32) << 12) + cont(1, 6) + cont(2, 0),
        4 => (((seq[0] & 0x07) as u32) << 18) + cont(1, 12) + cont(2, 6) + cont(3, 0),
        5 => {
            (((seq[0] & 0x03) as u32) << 24)
                + cont(1, 18)
                + cont(2, 12)
                + cont(3, 6)
                + cont(4, 0)
        }
        6 => {
            (((seq[0] & 0x01) as u32) << 30)
                + cont(1, 24)
                + cont(2, 18)
                + cont(3, 12)
                + cont(4, 6)
                + cont(5, 0)
        }
        _ => 0,
    };
    if unicode > MAX_DECODABLE {
        0
    } else {
        unicode
    }
}

/// Work out how much of `input` can be shown within `max_width` columns.
///
/// `col_offset` is accumulated into, so callers laying out several fields on
/// one row can thread the same offset through each call. Decoding never reads
/// past the end of `input`: a truncated trailing sequence, a NUL or an
/// undecodable code point ends the fitted prefix without marking it trimmed.
pub fn utf8_length(input: &[u8], max_width: usize, col_offset: usize) -> Utf8Fit {
    let mut pos = 0;
    let mut width = 0;
    let mut mb_width = 0;
    let mut trimmed = false;

    while pos < input.len() {
        let bytes = UTF8_BYTES[input[pos] as usize] as usize;
        if pos + bytes > input.len() {
            break;
        }

        let unicode = utf8_to_unicode(&input[pos..pos + bytes]);
        if unicode == 0 {
            break;
        }

        let uc_width = unicode_width(unicode);
        width += uc_width;
        if width > max_width {
            trimmed = true;
            break;
        }

        // A wide character never encodes in fewer than two bytes.
        if bytes > uc_width {
            mb_width += bytes - uc_width;
        }
        pos += bytes;
    }

    Utf8Fit {
        bytes: pos,
        col_offset: col_offset + mb_width,
        trimmed,
    }
}

/// Total display width of `input` as seen by [`utf8_length`].
#[allow(dead_code)]
pub fn display_width(input: &[u8]) -> usize {
    utf8_length(input, usize::MAX, 0).columns(0)
}

/// Longest prefix of `text` that fits in `max_width` columns, with the
/// columns it takes. Without `utf8` every character counts as one column.
pub fn clip(text: &str, max_width: usize, utf8: bool) -> (&str, usize) {
    let mut width = 0;
    for (idx, c) in text.char_indices() {
        let w = if utf8 { unicode_width(c as u32) } else { 1 };
        if width + w > max_width {
            return (&text[..idx], width);
        }
        width += w;
    }
    (text, width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_fits_without_offset() {
        let fit = utf8_length(b"hello", 10, 0);
        assert_eq!(fit, Utf8Fit { bytes: 5, col_offset: 0, trimmed: false });
    }

    #[test]
    fn ascii_exactly_at_budget_is_not_trimmed() {
        let fit = utf8_length(b"hello", 5, 0);
        assert_eq!(fit.bytes, 5);
        assert!(!fit.trimmed);
    }

    #[test]
    fn ascii_over_budget_is_trimmed() {
        let fit = utf8_length(b"hello world", 5, 0);
        assert_eq!(fit.bytes, 5);
        assert!(fit.trimmed);
    }

    #[test]
    fn wide_characters_accumulate_one_column_of_offset_each() {
        // 日本語: three 3-byte code points, two columns each.
        let input = "日本語".as_bytes();
        let fit = utf8_length(input, 80, 0);
        assert_eq!(fit.bytes, 9);
        assert_eq!(fit.col_offset, 3);
        assert!(!fit.trimmed);
        assert_eq!(fit.columns(0), 6);
    }

    #[test]
    fn wide_character_that_would_overflow_is_left_out() {
        // Five columns of budget hold two wide characters, not three.
        let fit = utf8_length("日本語".as_bytes(), 5, 0);
        assert_eq!(fit.bytes, 6);
        assert!(fit.trimmed);
        assert_eq!(fit.columns(0), 4);
    }

    #[test]
    fn latin_accents_are_narrow_with_one_byte_of_offset() {
        let fit = utf8_length("Úlfarsdóttir".as_bytes(), 80, 0);
        assert_eq!(fit.bytes, 14);
        assert_eq!(fit.col_offset, 2);
        assert_eq!(fit.columns(0), 12);
    }

    #[test]
    fn incoming_offset_is_accumulated() {
        let fit = utf8_length("é".as_bytes(), 10, 7);
        assert_eq!(fit.col_offset, 8);
        assert_eq!(fit.columns(7), 1);
    }

    #[test]
    fn truncated_trailing_sequence_stops_decoding() {
        let mut input = b"ab".to_vec();
        input.extend_from_slice(&"日".as_bytes()[..2]);
        let fit = utf8_length(&input, 80, 0);
        assert_eq!(fit.bytes, 2);
        assert!(!fit.trimmed);
    }

    #[test]
    fn continuation_byte_is_a_literal_single_column() {
        let fit = utf8_length(&[b'a', 0x80, b'b'], 80, 0);
        assert_eq!(fit.bytes, 3);
        assert_eq!(fit.col_offset, 0);
    }

    #[test]
    fn code_point_beyond_bmp_stops_decoding() {
        // U+1F600 is outside the decodable range.
        let input = "ok😀after".as_bytes();
        let fit = utf8_length(input, 80, 0);
        assert_eq!(fit.bytes, 2);
        assert!(!fit.trimmed);
    }

    #[test]
    fn nul_stops_decoding() {
        let fit = utf8_length(b"ab\0cd", 80, 0);
        assert_eq!(fit.bytes, 2);
    }

    #[test]
    fn angle_brackets_are_wide() {
        assert_eq!(unicode_width(0x2329), 2);
        assert_eq!(unicode_width(0x232a), 2);
        assert_eq!(unicode_width(0x303f), 1);
        assert_eq!(unicode_width(0x1100), 2);
        assert_eq!(unicode_width(0xac00), 2);
        assert_eq!(unicode_width(0xff01), 2);
        assert_eq!(unicode_width('a' as u32), 1);
    }

    #[test]
    fn fitted_prefix_never_exceeds_budget() {
        let samples = ["", "plain", "Ævar Arnfjörð", "한국어 텍스트", "ｆｕｌｌｗｉｄｔｈ", "mix 中文 text"];
        for sample in samples {
            let total = display_width(sample.as_bytes());
            for budget in 0..=total + 2 {
                let fit = utf8_length(sample.as_bytes(), budget, 0);
                let prefix_width = display_width(&sample.as_bytes()[..fit.bytes]);
                assert!(prefix_width <= budget, "{sample:?} at {budget}");
                assert_eq!(fit.trimmed, total > budget, "{sample:?} at {budget}");
            }
        }
    }

    #[test]
    fn clip_counts_wide_characters_twice() {
        assert_eq!(clip("中文标题", 5, true), ("中文", 4));
        assert_eq!(clip("中文标题", 5, false), ("中文标题", 4));
        assert_eq!(clip("plain text", 5, true), ("plain", 5));
        assert_eq!(clip("short", 10, true), ("short", 5));
    }

    #[test]
    fn empty_input_consumes_nothing() {
        assert_eq!(utf8_length(b"", 0, 0), Utf8Fit { bytes: 0, col_offset: 0, trimmed: false });
    }
}
