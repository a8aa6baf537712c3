//! CJK detection and word segmentation.
//!
//! Segmentation uses jieba's embedded dictionary. The segmenter costs real
//! memory to build, so a single instance is shared process-wide; `OnceLock`
//! serializes concurrent first use.

use jieba_rs::Jieba;
use std::sync::OnceLock;

/// Returns the process-wide jieba segmenter, building it on first use.
fn segmenter() -> &'static Jieba {
    static SEGMENTER: OnceLock<Jieba> = OnceLock::new();
    SEGMENTER.get_or_init(Jieba::new)
}

/// Whether a codepoint belongs to the Han, Hiragana, Katakana, or Hangul
/// blocks.
pub(crate) fn is_cjk_char(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'   // CJK Unified Ideographs
        | '\u{3400}'..='\u{4DBF}' // CJK Unified Ideographs Extension A
        | '\u{F900}'..='\u{FAFF}' // CJK Compatibility Ideographs
        | '\u{3040}'..='\u{309F}' // Hiragana
        | '\u{30A0}'..='\u{30FF}' // Katakana
        | '\u{AC00}'..='\u{D7AF}' // Hangul Syllables
        | '\u{1100}'..='\u{11FF}' // Hangul Jamo
    )
}

/// Whether the text contains any CJK codepoint.
pub(crate) fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk_char)
}

/// Segments text into words. Non-CJK runs come back as their own segments
/// and are handled by the caller.
pub(crate) fn segment(text: &str) -> Vec<&str> {
    segmenter().cut(text, false)
}
