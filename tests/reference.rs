// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use pretty_assertions::assert_eq;
use quickcheck::{quickcheck, Arbitrary, Gen};

use regex_bvm::{Extensions, IterRefill, Regex, RegexError};

// Patterns on which a leftmost-first backtracking engine and the `regex`
// crate agree, given ASCII subjects without '\r'.
const CORPUS_PATTERNS: &[&str] = &[
    "a",
    "abc",
    "a|b|c",
    "ab|a",
    "a|ab",
    "a*",
    "a+",
    "a?",
    "a*?b",
    "a+?",
    "(ab)+",
    "(a|b)*c",
    "[a-c]+",
    "[^a-c]+",
    r"\d+",
    r"\w+\s",
    "a{2,3}",
    "a{2,}",
    "a{2}",
    "a{0,2}?b",
    "^ab",
    "ab$",
    "^a.*c$",
    ".+c",
    r"\bab\b",
    r"\Bb",
    "x*",
    "(?:ab|cd)+e",
    "(a+)(b+)",
    "a.c",
    "[ab][cd]",
    "(?i)AB",
    "colou?r",
    "[0-9]{3}-[0-9]{4}",
    "(a|ab)(c|bcd)",
    "b.*?b",
];

const CORPUS_SUBJECTS: &[&str] = &[
    "",
    "a",
    "abc",
    "aab",
    "abab",
    "xabcx",
    "cccabc",
    "aaaa",
    "ab ab",
    "a1b22c333",
    "abcd ab cd e",
    "xyz",
    "aAbB",
    "555-1234 x",
    "color colour",
    "abcd",
    "b\nab\nb",
];

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn all_matches(re: &Regex, text: &str) -> Vec<(usize, usize)> {
    re.find_iter(text)
        .map(|item| item.unwrap().range())
        .map(|range| (range.start, range.end))
        .collect()
}

#[test]
fn test_against_reference_engine() {
    init_logger();

    for pattern in CORPUS_PATTERNS {
        let re = Regex::new(pattern).unwrap();
        let reference = regex::Regex::new(pattern).unwrap();

        for subject in CORPUS_SUBJECTS {
            let expected = reference.find(subject).map(|m| (m.start(), m.end()));
            let actual = re.find(subject).unwrap().map(|m| (m.start(), m.end()));
            assert_eq!(actual, expected, "pattern {:?} on {:?}", pattern, subject);

            assert_eq!(
                re.is_match(subject).unwrap(),
                reference.is_match(subject),
                "pattern {:?} on {:?}",
                pattern,
                subject
            );

            // the iteration rules differ for empty matches
            if !reference.is_match("") {
                let expected: Vec<(usize, usize)> = reference
                    .find_iter(subject)
                    .map(|m| (m.start(), m.end()))
                    .collect();
                assert_eq!(
                    all_matches(&re, subject),
                    expected,
                    "pattern {:?} on {:?}",
                    pattern,
                    subject
                );
            }
        }
    }
}

#[test]
fn test_whole_match_against_reference_engine() {
    init_logger();

    for pattern in CORPUS_PATTERNS {
        let re = Regex::new(pattern).unwrap();
        let reference = regex::Regex::new(&format!("^(?:{})$", pattern)).unwrap();

        for subject in CORPUS_SUBJECTS {
            assert_eq!(
                re.matcher(*subject).matches().unwrap(),
                reference.is_match(subject),
                "pattern {:?} on {:?}",
                pattern,
                subject
            );
        }
    }
}

type Spans = Vec<Option<(usize, usize)>>;

fn capture_spans(re: &Regex, text: &str) -> Option<Spans> {
    re.captures(text).unwrap().map(|captures| {
        captures
            .matches
            .iter()
            .map(|item| item.as_ref().map(|m| (m.start(), m.end())))
            .collect()
    })
}

fn reference_capture_spans(re: &regex::Regex, text: &str) -> Option<Spans> {
    re.captures(text).map(|captures| {
        captures
            .iter()
            .map(|item| item.map(|m| (m.start(), m.end())))
            .collect()
    })
}

#[test]
fn test_captures_against_reference_engine() {
    init_logger();

    let patterns = [
        "(ab)+",
        "(a|b)*c",
        "(a+)(b+)",
        "(a|ab)(c|bcd)",
        "(a)|(b)",
        r"(\d+)-(\d+)",
        "(a*)b",
        "(a)?b",
        "(?:(a)|(b))+",
        "(a+?)(a*)",
        r"(\w+)\s(\w+)",
    ];

    for pattern in patterns {
        let re = Regex::new(pattern).unwrap();
        let reference = regex::Regex::new(pattern).unwrap();

        for subject in CORPUS_SUBJECTS {
            assert_eq!(
                capture_spans(&re, subject),
                reference_capture_spans(&reference, subject),
                "pattern {:?} on {:?}",
                pattern,
                subject
            );
        }
    }

    // loops whose body can match empty, on subjects where the loop
    // makes no non-empty iteration
    let cases = [
        ("(a?)*", ["", "b"]),
        ("(a|)*", ["", "x"]),
        ("(a*)+", ["", "b"]),
        ("(?:(a)|b|())*", ["", "c"]),
    ];

    for (pattern, subjects) in cases {
        let re = Regex::new(pattern).unwrap();
        let reference = regex::Regex::new(pattern).unwrap();

        for subject in subjects {
            assert_eq!(
                capture_spans(&re, subject),
                reference_capture_spans(&reference, subject),
                "pattern {:?} on {:?}",
                pattern,
                subject
            );
        }
    }
}

#[test]
fn test_extensions_do_not_change_results() {
    init_logger();

    let patterns = [
        r"a\d{2,3}b",
        r"(?:ab){2,}c",
        r"hello world",
        r"x[a-c]{3}$",
        r"(\w+)@(\w+)",
        r"(?=abc)\w{2}",
    ];
    let subjects = [
        "a12b a1234b a123b",
        "ababc abababc abc",
        "say hello world, hello world",
        "xabc xab xbca",
        "alice@example bob@test",
        "abcd xabc",
    ];

    for pattern in patterns {
        let with = Regex::new(pattern).unwrap();
        let without = Regex::builder(pattern)
            .extensions(Extensions::empty())
            .build()
            .unwrap();

        for subject in subjects {
            assert_eq!(
                all_matches(&with, subject),
                all_matches(&without, subject),
                "pattern {:?} on {:?}",
                pattern,
                subject
            );
        }
    }
}

#[test]
fn test_read_refill() {
    init_logger();

    let re = Regex::new(r"(\d+)-(\d+)$").unwrap();
    let text = "range 100-250";
    let mut matcher = re.matcher("");
    matcher.set_refill(regex_bvm::ReadRefill::new(text.as_bytes()));

    assert!(matcher.find().unwrap());
    assert_eq!(matcher.group(1).unwrap(), Some("100"));
    assert_eq!(matcher.group(2).unwrap(), Some("250"));
}

#[test]
fn test_backtrack_limit_is_an_error() {
    init_logger();

    let re = Regex::builder(r"(a*)*b")
        .backtrack_limit(Some(10_000))
        .build()
        .unwrap();
    let subject = "a".repeat(30);

    assert!(matches!(
        re.find(&subject),
        Err(RegexError::BacktrackLimitExceeded { .. })
    ));
}

// Subjects drawn from a small alphabet, so that the patterns below
// match often enough.
#[derive(Debug, Clone)]
struct Subject(String);

impl Arbitrary for Subject {
    fn arbitrary(g: &mut Gen) -> Subject {
        let alphabet = ['a', 'b', 'c', '1', ' ', '\n', '文', '_'];
        let len = usize::arbitrary(g) % 24;
        let text = (0..len)
            .map(|_| *g.choose(&alphabet).unwrap_or(&'a'))
            .collect();
        Subject(text)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Subject>> {
        Box::new(self.0.shrink().map(Subject))
    }
}

const PROPERTY_PATTERNS: &[&str] = &[
    r"a+b",
    r"(a|b)*c",
    r"(\w+)\s(\w+)",
    r"^(a*)(b?)",
    r"(?m)^\w+$",
    r"(a)?b(c)?",
    r"\b\w{2}\b",
    r"(.)\1",
    r"文+",
    r"[^ ]*1$",
    r"(?:ab|a)(?!c)",
    r"c{2,3}?",
];

fn pattern_of(index: u8) -> Regex {
    let pattern = PROPERTY_PATTERNS[index as usize % PROPERTY_PATTERNS.len()];
    Regex::new(pattern).unwrap()
}

// Every match with the boundaries of every group.
fn trace(re: &Regex, text: &str, chunk_chars: usize) -> Vec<Vec<Option<(usize, usize)>>> {
    let chars: Vec<char> = text.chars().collect();
    let mut chunks: Vec<String> = chars
        .chunks(chunk_chars.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect();

    let first = if chunks.is_empty() {
        String::new()
    } else {
        chunks.remove(0)
    };

    let mut matcher = re.matcher(first);
    matcher.set_refill(IterRefill::new(chunks.into_iter()));

    let mut result = vec![];
    while matcher.find().unwrap() {
        let groups = (0..=matcher.group_count())
            .map(|group| {
                let start = matcher.start(group).unwrap();
                let end = matcher.end(group).unwrap();
                start.zip(end)
            })
            .collect();
        result.push(groups);
    }
    result
}

quickcheck! {
    fn prop_compiling_twice_is_deterministic(index: u8, subject: Subject) -> bool {
        let one = pattern_of(index);
        let two = pattern_of(index);
        trace(&one, &subject.0, usize::MAX) == trace(&two, &subject.0, usize::MAX)
    }

    fn prop_reset_reproduces_first_find(index: u8, subject: Subject) -> bool {
        let re = pattern_of(index);

        let mut fresh = re.matcher(subject.0.as_str());
        let expected = fresh.find().unwrap();
        let expected_range = if expected {
            (fresh.start(0).unwrap(), fresh.end(0).unwrap())
        } else {
            (None, None)
        };

        let mut used = re.matcher(subject.0.as_str());
        while used.find().unwrap() {}
        used.reset(subject.0.as_str());

        let actual = used.find().unwrap();
        let actual_range = if actual {
            (used.start(0).unwrap(), used.end(0).unwrap())
        } else {
            (None, None)
        };

        expected == actual && expected_range == actual_range
    }

    fn prop_groups_are_ordered_or_unset(index: u8, subject: Subject) -> bool {
        let re = pattern_of(index);

        let mut matcher = re.matcher(subject.0.as_str());
        while matcher.find().unwrap() {
            for group in 0..=matcher.group_count() {
                let start = matcher.start(group).unwrap();
                let end = matcher.end(group).unwrap();
                let valid = match (start, end) {
                    (Some(start), Some(end)) => start <= end,
                    (None, None) => group != 0,
                    _ => false,
                };
                if !valid {
                    return false;
                }
            }
        }
        true
    }

    fn prop_streaming_agrees_with_buffered(index: u8, subject: Subject, chunk: u8) -> bool {
        let re = pattern_of(index);

        let chunk_chars = (chunk % 5) as usize + 1;
        trace(&re, &subject.0, usize::MAX) == trace(&re, &subject.0, chunk_chars)
    }
}
