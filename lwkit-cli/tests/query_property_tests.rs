//! Property-Based Tests for Launcher Query Parsing
//!
//! Filter tokens never leak into the text query, filter names are unique,
//! and save arguments survive the trip from preview to action.

use lwkit_cli::query::{parse_save_query, parse_search_query};
use lwkit_cli::save_arg::{self, SaveData};
use proptest::prelude::*;

fn word() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn token() -> impl Strategy<Value = String> {
    prop_oneof![
        word(),
        word().prop_map(|w| format!("#{w}")),
        word().prop_map(|w| format!("@{w}")),
        word().prop_map(|w| format!("tag:{w}")),
        word().prop_map(|w| format!("col:{w}")),
    ]
}

proptest! {
    #[test]
    fn prop_filters_never_reach_text(tokens in prop::collection::vec(token(), 0..10)) {
        let parsed = parse_search_query(&tokens.join(" "));
        prop_assert!(!parsed.text.contains('#'));
        prop_assert!(!parsed.text.contains('@'));
        prop_assert!(!parsed.text.contains("tag:"));
        prop_assert!(!parsed.text.contains("col:"));
        prop_assert!(!parsed.text.contains("  "));
        prop_assert_eq!(parsed.text.trim(), parsed.text.as_str());
    }

    #[test]
    fn prop_plain_words_are_preserved_in_order(words in prop::collection::vec(word(), 0..10)) {
        let parsed = parse_search_query(&words.join("   "));
        prop_assert_eq!(parsed.text.clone(), words.join(" "));
        prop_assert!(!parsed.has_filters());
    }

    #[test]
    fn prop_filter_names_unique(tokens in prop::collection::vec(token(), 0..12)) {
        let parsed = parse_search_query(&tokens.join(" "));
        let mut tags: Vec<String> = parsed.tags.iter().map(|t| t.to_lowercase()).collect();
        tags.sort();
        tags.dedup();
        prop_assert_eq!(tags.len(), parsed.tags.len());
        let mut cols: Vec<String> = parsed.collections.iter().map(|c| c.to_lowercase()).collect();
        cols.sort();
        cols.dedup();
        prop_assert_eq!(cols.len(), parsed.collections.len());
    }

    #[test]
    fn prop_save_preview_arg_decodes(
        host in "[a-z]{1,10}",
        tags in prop::collection::vec(word(), 0..3),
        cols in prop::collection::vec(word(), 0..2),
    ) {
        let mut input = format!("{host}.example");
        for tag in &tags {
            input.push_str(&format!(" #{tag}"));
        }
        for col in &cols {
            input.push_str(&format!(" @{col}"));
        }
        let parsed = parse_save_query(&input);
        prop_assert_eq!(&parsed.url, &format!("https://{host}.example"));

        let data = SaveData::from(parsed);
        let decoded = save_arg::decode(&save_arg::encode(&data).unwrap()).unwrap();
        prop_assert_eq!(decoded, data);
    }
}
