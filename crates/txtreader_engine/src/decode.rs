use chardetng::EncodingDetector;
use encoding_rs::{
    Encoding, BIG5, EUC_JP, EUC_KR, GB18030, GBK, ISO_8859_2, KOI8_R, SHIFT_JIS, UTF_16BE,
    UTF_16LE, UTF_8, WINDOWS_1251, WINDOWS_1252, WINDOWS_1253, WINDOWS_1255, WINDOWS_1256,
};

/// Bytes probed per candidate encoding.
pub const SAMPLE_BYTES: usize = 64 * 1024;
/// A decode with more suspicious characters than this share is unreadable.
pub const UNREADABLE_RATIO: f64 = 0.10;

const FALLBACK_SUFFIX: &str = " (best effort)";

/// Probed in order when the buffer carries no byte-order mark.
const CANDIDATES: &[&Encoding] = &[
    UTF_8,
    GBK,
    BIG5,
    SHIFT_JIS,
    EUC_JP,
    EUC_KR,
    WINDOWS_1252,
    ISO_8859_2,
    WINDOWS_1251,
    KOI8_R,
    WINDOWS_1253,
    WINDOWS_1256,
    WINDOWS_1255,
    UTF_16LE,
    UTF_16BE,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Standard(&'static Encoding),
    Utf32Le,
    Utf32Be,
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Standard(enc) => enc.name(),
            TextEncoding::Utf32Le => "UTF-32LE",
            TextEncoding::Utf32Be => "UTF-32BE",
        }
    }

    fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Standard(enc) => enc.decode_without_bom_handling(bytes).0.into_owned(),
            TextEncoding::Utf32Le => decode_utf32(bytes, u32::from_le_bytes),
            TextEncoding::Utf32Be => decode_utf32(bytes, u32::from_be_bytes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    Bom,
    Sample,
    FileNameHint,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding_label: String,
    pub source: DetectionSource,
}

impl DecodedText {
    fn new(text: String, encoding: TextEncoding, source: DetectionSource) -> Self {
        let mut encoding_label = encoding.name().to_string();
        if source == DetectionSource::Fallback {
            encoding_label.push_str(FALLBACK_SUFFIX);
        }
        Self {
            text,
            encoding_label,
            source,
        }
    }

    pub fn is_best_effort(&self) -> bool {
        self.source == DetectionSource::Fallback
    }
}

/// Decode a text file: BOM -> sampled candidates -> UTF-8 fallback, then a
/// file-name hint if the full decode still reads badly. Never fails.
pub fn decode_text(bytes: &[u8], file_name: &str) -> DecodedText {
    if let Some((encoding, bom_len)) = sniff_bom(bytes) {
        return DecodedText::new(encoding.decode(&bytes[bom_len..]), encoding, DetectionSource::Bom);
    }

    let sample = &bytes[..bytes.len().min(SAMPLE_BYTES)];
    let (encoding, source) = CANDIDATES
        .iter()
        .map(|&enc| TextEncoding::Standard(enc))
        .find(|enc| is_readable(&enc.decode(sample)))
        .map(|enc| (enc, DetectionSource::Sample))
        .unwrap_or((TextEncoding::Standard(UTF_8), DetectionSource::Fallback));

    let text = encoding.decode(bytes);
    if !is_readable(&text) {
        if let Some(hinted) = encoding_from_file_name(file_name).filter(|h| *h != encoding) {
            let hinted_text = hinted.decode(bytes);
            let source = if is_readable(&hinted_text) {
                DetectionSource::FileNameHint
            } else {
                DetectionSource::Fallback
            };
            return DecodedText::new(hinted_text, hinted, source);
        }
    }
    DecodedText::new(text, encoding, source)
}

fn sniff_bom(bytes: &[u8]) -> Option<(TextEncoding, usize)> {
    // UTF-32LE shares its first two bytes with the UTF-16LE mark.
    if bytes.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
        Some((TextEncoding::Utf32Le, 4))
    } else if bytes.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
        Some((TextEncoding::Utf32Be, 4))
    } else if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        Some((TextEncoding::Standard(UTF_8), 3))
    } else if bytes.starts_with(&[0xFF, 0xFE]) {
        Some((TextEncoding::Standard(UTF_16LE), 2))
    } else if bytes.starts_with(&[0xFE, 0xFF]) {
        Some((TextEncoding::Standard(UTF_16BE), 2))
    } else {
        None
    }
}

fn decode_utf32(bytes: &[u8], to_u32: fn([u8; 4]) -> u32) -> String {
    let chunks = bytes.chunks_exact(4);
    let trailing = !chunks.remainder().is_empty();
    let mut text: String = chunks
        .map(|chunk| {
            let word = [chunk[0], chunk[1], chunk[2], chunk[3]];
            char::from_u32(to_u32(word)).unwrap_or(char::REPLACEMENT_CHARACTER)
        })
        .collect();
    if trailing {
        text.push(char::REPLACEMENT_CHARACTER);
    }
    text
}

fn encoding_from_file_name(file_name: &str) -> Option<TextEncoding> {
    const HINTS: &[(&str, &Encoding)] = &[
        ("gb18030", GB18030),
        ("gb2312", GBK),
        ("gbk", GBK),
        ("big5", BIG5),
        ("shift_jis", SHIFT_JIS),
        ("shift-jis", SHIFT_JIS),
        ("sjis", SHIFT_JIS),
        ("euc-kr", EUC_KR),
        ("euckr", EUC_KR),
        ("utf-16", UTF_16LE),
        ("utf16", UTF_16LE),
        ("utf-8", UTF_8),
        ("utf8", UTF_8),
    ];
    let lower = file_name.to_lowercase();
    HINTS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|&(_, enc)| TextEncoding::Standard(enc))
}

fn is_suspicious(ch: char) -> bool {
    match ch {
        char::REPLACEMENT_CHARACTER | '?' => true,
        '\t' | '\n' | '\r' => false,
        other => other.is_control(),
    }
}

/// Suspicious characters and total characters in `text`.
fn suspicious_counts(text: &str) -> (usize, usize) {
    text.chars().fold((0, 0), |(bad, total), ch| {
        (bad + usize::from(is_suspicious(ch)), total + 1)
    })
}

/// Replacement characters, `?` and control characters stay within [`UNREADABLE_RATIO`].
pub fn is_readable(text: &str) -> bool {
    let (bad, total) = suspicious_counts(text);
    bad as f64 <= total as f64 * UNREADABLE_RATIO
}

/// Decode a fetched HTML page: BOM -> Content-Type charset -> chardetng guess,
/// retrying as GBK when the result still holds replacement characters.
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let text = encoding.decode_without_bom_handling(&bytes[bom_len..]).0.into_owned();
        return DecodedText::new(text, TextEncoding::Standard(encoding), DetectionSource::Bom);
    }

    let declared = content_type
        .and_then(extract_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        // Servers default to ISO-8859-1 when they know nothing.
        .filter(|enc| *enc != WINDOWS_1252);
    let encoding = declared.unwrap_or_else(|| {
        let mut detector = EncodingDetector::new();
        detector.feed(bytes, true);
        detector.guess(None, true)
    });

    let text = encoding.decode_without_bom_handling(bytes).0.into_owned();
    if encoding != GBK && text.contains(char::REPLACEMENT_CHARACTER) {
        let retry = GBK.decode_without_bom_handling(bytes).0.into_owned();
        if suspicious_counts(&retry).0 < suspicious_counts(&text).0 {
            return DecodedText::new(retry, TextEncoding::Standard(GBK), DetectionSource::Sample);
        }
    }
    DecodedText::new(text, TextEncoding::Standard(encoding), DetectionSource::Sample)
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| {
            let part = part.trim();
            part.strip_prefix("charset=")
                .or_else(|| part.strip_prefix("Charset="))
                .or_else(|| part.strip_prefix("CHARSET="))
                .map(|v| v.trim_matches([' ', '"', '\''].as_ref()))
        })
        .next()
        .map(|s| s.to_string())
}
