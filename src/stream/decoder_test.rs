use super::*;

#[test]
fn test_decode_ascii() {
    let mut decoder = Utf8Decoder::new();
    assert_eq!(decoder.decode(b"Hello, "), "Hello, ");
    assert_eq!(decoder.decode(b"world"), "world");
    assert_eq!(decoder.finish(), "");
}

#[test]
fn test_decode_split_multibyte() {
    let bytes = "Xin chào 🌏".as_bytes();
    let mut decoder = Utf8Decoder::new();

    let mut text = String::new();
    for byte in bytes {
        text.push_str(&decoder.decode(&[*byte]));
    }
    text.push_str(&decoder.finish());

    assert_eq!(text, "Xin chào 🌏");
}

#[test]
fn test_decode_holds_incomplete_tail() {
    let emoji = "🌏".as_bytes();
    let mut decoder = Utf8Decoder::new();

    assert_eq!(decoder.decode(&emoji[..2]), "");
    assert!(decoder.has_pending());
    assert_eq!(decoder.decode(&emoji[2..]), "🌏");
    assert!(!decoder.has_pending());
}

#[test]
fn test_decode_invalid_bytes() {
    let mut decoder = Utf8Decoder::new();
    assert_eq!(decoder.decode(b"ok\xffok"), "ok\u{FFFD}ok");
}

#[test]
fn test_finish_flushes_truncated_sequence() {
    let mut decoder = Utf8Decoder::new();
    assert_eq!(decoder.decode(&"é".as_bytes()[..1]), "");
    assert_eq!(decoder.finish(), "\u{FFFD}");
    assert_eq!(decoder.finish(), "");
}
