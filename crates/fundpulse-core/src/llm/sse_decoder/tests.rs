//! Tests for SSE decoder

use super::*;

#[test]
fn test_simple_event() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b"data: {\"text\": \"hello\"}\n\n");

    assert_eq!(events, vec![SseEvent::new("{\"text\": \"hello\"}")]);
}

#[test]
fn test_data_without_space() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b"data:{\"a\":1}\ndata:[DONE]\n");

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].data, "{\"a\":1}");
    assert!(events[1].is_done());
}

#[test]
fn test_blank_comment_and_unknown_lines_skipped() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b": keep-alive\n\nretry: 3000\nfoo: bar\n\ndata: payload\n\n");

    assert_eq!(events, vec![SseEvent::new("payload")]);
}

#[test]
fn test_event_type_and_id_attach_to_next_data() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b"id: 7\nevent: delta\ndata: x\n\ndata: y\n\n");

    assert_eq!(events[0].event_type.as_deref(), Some("delta"));
    assert_eq!(events[0].id.as_deref(), Some("7"));
    assert_eq!(events[1].event_type, None);
}

#[test]
fn test_frame_split_across_chunks() {
    let mut decoder = SseDecoder::new();

    assert!(decoder.feed(b"data: {\"choices\":[{\"del").is_empty());
    assert!(decoder.has_remaining());
    let events = decoder.feed(b"ta\":{}}]}\n\ndata: [DO");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data, "{\"choices\":[{\"delta\":{}}]}");

    let events = decoder.feed(b"NE]\n\n");
    assert!(events[0].is_done());
    assert!(!decoder.has_remaining());
}

#[test]
fn test_crlf_line_endings() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b"data: value\r\n\r\ndata: [DONE]\r\n\r\n");

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].data, "value");
    assert!(events[1].is_done());
}

#[test]
fn test_utf8_split_inside_multibyte_char() {
    let mut decoder = SseDecoder::new();

    // "中文" is E4 B8 AD E6 96 87
    assert!(decoder.feed(b"data: \xE4").is_empty());
    assert!(decoder.feed(b"\xB8\xAD\xE6").is_empty());
    let events = decoder.feed(b"\x96\x87\n");
    assert_eq!(events[0].data, "中文");
}

#[test]
fn test_utf8_split_emoji_in_json() {
    let mut decoder = SseDecoder::new();

    decoder.feed(b"data: {\"content\": \"up \xF0\x9F");
    let events = decoder.feed(b"\x93\x88\"}\n\n");
    assert_eq!(events[0].data, "{\"content\": \"up 📈\"}");
}

#[test]
fn test_invalid_utf8_is_decoded_lossily() {
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(b"data: bad \xFF byte\n");
    assert_eq!(events[0].data, "bad \u{FFFD} byte");
}

#[test]
fn test_finish_flushes_unterminated_line() {
    let mut decoder = SseDecoder::new();
    assert!(decoder.feed(b"data: [DONE]").is_empty());

    let last = decoder.finish().unwrap();
    assert!(last.is_done());
    assert!(decoder.finish().is_none());
}

#[test]
fn test_clear_buffer() {
    let mut decoder = SseDecoder::new();
    decoder.feed(b"event: x\ndata: incomplete");
    assert!(decoder.has_remaining());

    decoder.clear();
    assert!(!decoder.has_remaining());
    assert_eq!(decoder.feed(b"data: y\n")[0].event_type, None);
}
