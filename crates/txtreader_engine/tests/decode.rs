use encoding_rs::GBK;
use pretty_assertions::assert_eq;
use txtreader_engine::{decode_html, decode_text, is_readable, DetectionSource, SAMPLE_BYTES};

const NOVEL: &str = "第一章 风起云涌\n天色将晚，城门外的官道上尘土飞扬。\n第二章 故人归来\n";

#[test]
fn plain_utf8_is_detected_from_the_sample() {
    let decoded = decode_text(NOVEL.as_bytes(), "novel.txt");
    assert_eq!(decoded.text, NOVEL);
    assert_eq!(decoded.encoding_label, "UTF-8");
    assert_eq!(decoded.source, DetectionSource::Sample);
}

#[test]
fn gbk_bytes_without_bom_decode_as_gbk() {
    let (bytes, _, _) = GBK.encode(NOVEL);
    let decoded = decode_text(&bytes, "novel.txt");
    assert_eq!(decoded.text, NOVEL);
    assert_eq!(decoded.encoding_label, "GBK");
    assert!(!decoded.is_best_effort());
}

#[test]
fn bom_beats_sampling() {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "Hi!".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let decoded = decode_text(&bytes, "hi.txt");
    assert_eq!(decoded.text, "Hi!");
    assert_eq!(decoded.encoding_label, "UTF-16LE");
    assert_eq!(decoded.source, DetectionSource::Bom);

    let mut utf8 = vec![0xEF, 0xBB, 0xBF];
    utf8.extend_from_slice("plain".as_bytes());
    assert_eq!(decode_text(&utf8, "p.txt").text, "plain");
}

#[test]
fn utf32_marks_are_checked_before_utf16() {
    let mut le = vec![0xFF, 0xFE, 0x00, 0x00];
    let mut be = vec![0x00, 0x00, 0xFE, 0xFF];
    for ch in "书".chars() {
        le.extend_from_slice(&(ch as u32).to_le_bytes());
        be.extend_from_slice(&(ch as u32).to_be_bytes());
    }
    let le = decode_text(&le, "a.txt");
    assert_eq!(le.text, "书");
    assert_eq!(le.encoding_label, "UTF-32LE");
    let be = decode_text(&be, "a.txt");
    assert_eq!(be.text, "书");
    assert_eq!(be.encoding_label, "UTF-32BE");
}

#[test]
fn unreadable_bytes_fall_back_to_best_effort_utf8() {
    let decoded = decode_text(&[0u8; 64], "blob.txt");
    assert_eq!(decoded.source, DetectionSource::Fallback);
    assert_eq!(decoded.encoding_label, "UTF-8 (best effort)");
    assert_eq!(decoded.text.chars().count(), 64);
}

#[test]
fn unreadable_hinted_decode_stays_best_effort() {
    let decoded = decode_text(&[0u8; 64], "blob.gbk.txt");
    assert_eq!(decoded.source, DetectionSource::Fallback);
    assert_eq!(decoded.encoding_label, "GBK (best effort)");
    assert!(decoded.is_best_effort());
}

#[test]
fn file_name_hint_rescues_a_misleading_sample() {
    // The sample is pure ASCII, so UTF-8 wins it; the tail is GBK.
    let mut bytes = vec![b'a'; SAMPLE_BYTES];
    let tail_src = "中文".repeat(5000);
    let (tail, _, _) = GBK.encode(&tail_src);
    bytes.extend_from_slice(&tail);

    let decoded = decode_text(&bytes, "Saga.GBK.txt");
    assert_eq!(decoded.source, DetectionSource::FileNameHint);
    assert_eq!(decoded.encoding_label, "GBK");
    assert!(decoded.text.ends_with("中文中文"));
    assert!(is_readable(&decoded.text));

    let unhinted = decode_text(&bytes, "saga.txt");
    assert_eq!(unhinted.encoding_label, "UTF-8");
    assert!(!is_readable(&unhinted.text));
}

#[test]
fn html_uses_declared_charset() {
    let (bytes, _, _) = GBK.encode("<html><body><a href=\"1.html\">第一章</a></body></html>");
    let decoded = decode_html(&bytes, Some("text/html; charset=gbk"));
    assert!(decoded.text.contains("第一章"));
    assert_eq!(decoded.encoding_label, "GBK");
}

#[test]
fn html_ignores_generic_latin1_declaration() {
    let html = "<html><body><p>第一章 风起云涌，天色将晚，城门外的官道上尘土飞扬。</p></body></html>";
    let (bytes, _, _) = GBK.encode(html);
    let decoded = decode_html(&bytes, Some("text/html; charset=ISO-8859-1"));
    assert_eq!(decoded.text, html);
}
