use linktitles_core::segment::{Splitter, SpanKind};
use linktitles_core::Config;
use proptest::collection::vec;
use proptest::prelude::*;

fn interesting_fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9]{1,8}",
        Just(" ".to_owned()),
        Just("\n".to_owned()),
        Just("\n ".to_owned()),
        Just("[[".to_owned()),
        Just("]]".to_owned()),
        Just("{{".to_owned()),
        Just("}}".to_owned()),
        Just("{{{".to_owned()),
        Just("|".to_owned()),
        Just("=".to_owned()),
        Just("==".to_owned()),
        Just("<nowiki>".to_owned()),
        Just("</nowiki>".to_owned()),
        Just("<div class=\"x\">".to_owned()),
        Just("</span>".to_owned()),
        Just("style=\"".to_owned()),
        Just("\"".to_owned()),
        Just("http://".to_owned()),
        Just("@".to_owned()),
        Just(".".to_owned()),
        Just("ü".to_owned()),
        Just("中文".to_owned()),
        Just("🙂".to_owned()),
    ]
}

fn wiki_string(max_fragments: usize) -> impl Strategy<Value = String> {
    vec(interesting_fragment(), 0..max_fragments).prop_map(|parts| parts.concat())
}

fn assert_segmentation_is_total(splitter: &Splitter, text: &str) {
    let spans = splitter.split(text);
    assert!(!spans.is_empty(), "segmentation produced no spans");
    assert_eq!(spans.first().map(|span| span.kind), Some(SpanKind::Linkable));
    assert_eq!(spans.last().map(|span| span.kind), Some(SpanKind::Linkable));

    let mut offset = 0;
    for (index, span) in spans.iter().enumerate() {
        assert_eq!(span.range.start, offset, "gap or overlap before span {index}");
        assert_eq!(span.text, &text[span.range.clone()]);
        let expected = if index % 2 == 0 { SpanKind::Linkable } else { SpanKind::Protected };
        assert_eq!(span.kind, expected, "span {index} breaks alternation");
        if span.kind == SpanKind::Protected {
            assert!(!span.text.is_empty(), "empty protected span at {index}");
        }
        offset = span.range.end;
    }
    assert_eq!(offset, text.len(), "spans stop short of the end");

    let rejoined: String = spans.iter().map(|span| span.text).collect();
    assert_eq!(rejoined, text);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        max_shrink_iters: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn segmentation_covers_random_wiki_text(text in wiki_string(40)) {
        let splitter = Splitter::new(&Config::default()).unwrap();
        assert_segmentation_is_total(&splitter, &text);
    }

    #[test]
    fn segmentation_covers_text_with_whole_template_skipping(text in wiki_string(40)) {
        let config = Config { skip_templates: true, parse_headings: true, ..Config::default() };
        let splitter = Splitter::new(&config).unwrap();
        assert_segmentation_is_total(&splitter, &text);
    }

    #[test]
    fn segmentation_covers_arbitrary_unicode(text in any::<String>()) {
        let splitter = Splitter::new(&Config::default()).unwrap();
        assert_segmentation_is_total(&splitter, &text);
    }
}

#[test]
fn segmentation_handles_empty_and_marker_only_inputs() {
    let splitter = Splitter::new(&Config::default()).unwrap();
    for text in ["", "[[", "]]", "{{", "}}", "<nowiki>", "\n", " ", "=="] {
        assert_segmentation_is_total(&splitter, text);
    }
}

#[test]
fn segmentation_handles_large_documents() {
    let mut text = String::with_capacity(120_000);
    for i in 0..2_000 {
        text.push_str("== Section ");
        text.push_str(&i.to_string());
        text.push_str(" ==\nParis and [[Berlin]] in {{Infobox|name=Rome}} see http://example.org/x\n");
    }
    let splitter = Splitter::new(&Config::default()).unwrap();
    assert_segmentation_is_total(&splitter, &text);
}
