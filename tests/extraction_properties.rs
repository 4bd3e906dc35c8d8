// tests/extraction_properties.rs
use proptest::prelude::*;

use keysweep::extract::{FindingRecord, GrammarTable, extract, render_records};
use keysweep::types::ToolId;

// An AES finding: key size plus a hex offset in mixed case.
fn aes_finding() -> impl Strategy<Value = (u16, String)> {
    (prop_oneof![Just(128u16), Just(256u16)], "[0-9a-fA-F]{1,16}")
}

// Whitespace the scanner may have wrapped a report with.
fn filler() -> impl Strategy<Value = String> {
    "[ \t\r\n]{0,3}"
}

fn aes_block(size: u16, offset: &str) -> String {
    format!("FOUND POSSIBLE {size}-BIT KEY AT BYTE {offset}\nKEY: 00112233\n")
}

// Insert whitespace runs between the characters of `text`.
fn sprinkle(text: &str, gaps: &[String]) -> String {
    let mut out = String::new();
    for (i, c) in text.chars().enumerate() {
        out.push(c);
        if let Some(gap) = gaps.get(i % gaps.len().max(1)) {
            out.push_str(gap);
        }
    }
    out
}

proptest! {
    #[test]
    fn one_record_per_block_in_order(findings in proptest::collection::vec(aes_finding(), 0..8)) {
        let grammars = GrammarTable::new().unwrap();
        let raw: String = findings.iter().map(|(s, o)| aes_block(*s, o)).collect();

        let records = extract(&raw, grammars.get(ToolId::Aes));

        let expected: Vec<FindingRecord> = findings
            .iter()
            .map(|(s, o)| FindingRecord::SizedKey { key_size: *s, offset: o.to_ascii_lowercase() })
            .collect();
        prop_assert_eq!(records, expected);
    }

    #[test]
    fn wrapping_does_not_change_findings(
        findings in proptest::collection::vec(aes_finding(), 1..4),
        gaps in proptest::collection::vec(filler(), 1..16),
    ) {
        let grammars = GrammarTable::new().unwrap();
        let raw: String = findings.iter().map(|(s, o)| aes_block(*s, o)).collect();
        let wrapped = sprinkle(&raw, &gaps);

        prop_assert_eq!(
            extract(&raw, grammars.get(ToolId::Aes)),
            extract(&wrapped, grammars.get(ToolId::Aes))
        );
    }

    #[test]
    fn rendered_lines_match_records(offsets in proptest::collection::vec("[0-9a-f]{1,12}", 0..8)) {
        let grammars = GrammarTable::new().unwrap();
        let raw: String = offsets
            .iter()
            .map(|o| format!("FOUND PRIVATE KEY AT {o}\nversion = 00\n"))
            .collect();

        let records = extract(&raw, grammars.get(ToolId::Rsa));
        let rendered = render_records(&records);

        prop_assert_eq!(rendered.lines().count(), offsets.len());
        for (line, offset) in rendered.lines().zip(&offsets) {
            prop_assert_eq!(line, offset.as_str());
        }
    }

    #[test]
    fn arbitrary_text_never_panics(raw in "\\PC{0,200}") {
        let grammars = GrammarTable::new().unwrap();
        for tool in ToolId::ALL {
            let first = extract(&raw, grammars.get(tool));
            prop_assert_eq!(first, extract(&raw, grammars.get(tool)));
        }
    }
}
