// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

// Syntax Summary:
//
// Meta characters and their meanings:
//
// - [ ]      Character set
// - [^ ]     Negated character set
// - {m}      Exact repetition (m times)
// - {m,n}    Repetition range (m to n times)
// - {m,}     At least m repetitions
// - (xyz)    Capture group
// - *        Zero or more repetitions
// - +        One or more repetitions
// - ?        Optional, or the lazy suffix of a quantifier
// - |        Alternation
// - ^        Start of text, or start of line in multiline mode
// - $        End of text, or end of line in multiline mode
// - .        Any character except line terminators (unless in dot-all mode)
// - \        Escape character for special symbols
//
// A `{` that does not start a well-formed repetition is a literal char.
//
// Escaped characters:
//
// - \t \n \r \f \a \e   Tab, newline, carriage return, form feed, bell, escape
// - \0ooo               Octal char (up to 3 digits, at most \0377)
// - \xhh, \x{h..h}      Hexadecimal char
// - \uhhhh, \u{h..h}    Unicode char
// - \cX                 Control char
// - \Q...\E             Quote all chars in between
//
// Any escaped non-alphanumeric char stands for itself.
//
// Preset character sets:
//
// - \w \W    Word chars [a-zA-Z0-9_] and the negation
// - \d \D    Digits [0-9] and the negation
// - \s \S    Whitespace [ \t\n\x0B\f\r] and the negation
// - \p{..}   Property class, e.g. \p{Lu}, \pL, \p{Alpha}
// - \P{..}   Negated property class
//
// Boundary assertions:
// - \b \B    Word boundary, not a word boundary
// - \A       Start of text
// - \z       End of text
// - \Z       End of text, or before the final line terminator
//
// Groups:
// - (?:...)         Non-capturing group
// - (?<name>...)    Named capture group
// - (?=...) (?!...) Positive and negative lookahead
// - (?imsU-imsU)    Turn flags on and off for the rest of the enclosing group
// - (?imsU-imsU:...) Flags for the inner group only
//
// Backreferences:
// - \number  Group number, when not greater than the number of groups opened
//            so far, otherwise an octal char
// - \k<name> Group name, or the name of an external variable

use crate::{
    charset::CharSet,
    charwithposition::{CharWithPosition, CharsWithPositionIter},
    error::RegexError,
    flags::Flags,
    location::Location,
    peekableiter::PeekableIter,
};

use super::token::{Repetition, Token, TokenWithRange};

pub const LEXER_PEEK_CHAR_MAX_COUNT: usize = 3;

pub fn lex_from_str(s: &str) -> Result<Vec<TokenWithRange>, RegexError> {
    let char_position_iter = CharsWithPositionIter::new(s);
    let upstream = PeekableIter::new(char_position_iter, LEXER_PEEK_CHAR_MAX_COUNT);
    let mut lexer = Lexer::new(upstream);
    lexer.lex()
}

struct Lexer<'a> {
    upstream: PeekableIter<CharsWithPositionIter<'a>>,
    last_position: Location, // last position consumed
    saved_positions: Vec<Location>,

    // the number of capture groups opened so far, for telling
    // backreferences from octal escapes.
    opened_groups: usize,
}

impl<'a> Lexer<'a> {
    fn new(upstream: PeekableIter<CharsWithPositionIter<'a>>) -> Self {
        Self {
            upstream,
            last_position: Location::new_position(0, 0, 0),
            saved_positions: vec![],
            opened_groups: 0,
        }
    }

    fn next_char(&mut self) -> Option<char> {
        match self.upstream.next() {
            Some(CharWithPosition {
                character,
                position,
            }) => {
                self.last_position = position;
                Some(character)
            }
            None => None,
        }
    }

    fn peek_char(&mut self, offset: usize) -> Option<char> {
        self.upstream
            .peek(offset)
            .map(|CharWithPosition { character, .. }| *character)
    }

    fn peek_char_and_equals(&mut self, offset: usize, expected_char: char) -> bool {
        self.peek_char(offset) == Some(expected_char)
    }

    fn peek_position(&mut self, offset: usize) -> Option<Location> {
        self.upstream
            .peek(offset)
            .map(|CharWithPosition { position, .. }| *position)
    }

    // the position just after the last char of the pattern, only
    // meaningful once the upstream is exhausted.
    fn end_position(&self) -> Location {
        self.upstream.upstream().end_position()
    }

    fn push_peek_position(&mut self) {
        let position = match self.peek_position(0) {
            Some(position) => position,
            None => self.end_position(),
        };
        self.saved_positions.push(position);
    }

    fn pop_saved_position(&mut self) -> Location {
        self.saved_positions.pop().unwrap_or(self.last_position)
    }

    fn expect_char(&mut self, expected_char: char, char_description: &str) -> Result<(), RegexError> {
        match self.next_char() {
            Some(ch) if ch == expected_char => Ok(()),
            Some(_) => Err(RegexError::pattern(
                format!("Expect char: {}.", char_description),
                &self.last_position,
            )),
            None => Err(RegexError::pattern(
                format!("Expect char: {}.", char_description),
                &self.end_position(),
            )),
        }
    }
}

impl Lexer<'_> {
    fn lex(&mut self) -> Result<Vec<TokenWithRange>, RegexError> {
        let mut token_with_ranges = vec![];

        while let Some(current_char) = self.peek_char(0) {
            match current_char {
                '[' => {
                    let mut twrs = self.lex_charset()?;
                    token_with_ranges.append(&mut twrs);
                }
                '{' => {
                    let mut twrs = self.lex_repetition()?;
                    token_with_ranges.append(&mut twrs);
                }
                '(' => {
                    let twr = self.lex_group_start()?;
                    token_with_ranges.push(twr);
                }
                ')' => {
                    self.next_char(); // consume ')'
                    token_with_ranges.push(TokenWithRange::from_position_and_length(
                        Token::GroupEnd,
                        &self.last_position,
                        1,
                    ));
                }
                '?' | '+' | '*' => {
                    self.push_peek_position();
                    self.next_char(); // consume notation

                    let lazy = if self.peek_char_and_equals(0, '?') {
                        self.next_char(); // consume '?'
                        true
                    } else {
                        false
                    };

                    let token = match (current_char, lazy) {
                        ('?', false) => Token::Optional,
                        ('?', true) => Token::OptionalLazy,
                        ('+', false) => Token::OneOrMore,
                        ('+', true) => Token::OneOrMoreLazy,
                        ('*', false) => Token::ZeroOrMore,
                        _ => Token::ZeroOrMoreLazy,
                    };

                    token_with_ranges.push(TokenWithRange::from_position_and_length(
                        token,
                        &self.pop_saved_position(),
                        if lazy { 2 } else { 1 },
                    ));
                }
                '^' | '$' | '.' | '|' => {
                    self.next_char(); // consume current char

                    let token = match current_char {
                        '^' => Token::StartAssertion,
                        '$' => Token::EndAssertion,
                        '.' => Token::Dot,
                        _ => Token::LogicOr,
                    };

                    token_with_ranges.push(TokenWithRange::from_position_and_length(
                        token,
                        &self.last_position,
                        1,
                    ));
                }
                '\\' => {
                    let mut twrs = self.lex_escaping(false)?;
                    token_with_ranges.append(&mut twrs);
                }
                _ => {
                    self.next_char(); // consume current char

                    // includes the unpaired ']' and '}'
                    token_with_ranges.push(TokenWithRange::from_position_and_length(
                        Token::Char(current_char),
                        &self.last_position,
                        1,
                    ));
                }
            }
        }

        Ok(token_with_ranges)
    }

    fn lex_group_start(&mut self) -> Result<TokenWithRange, RegexError> {
        // (?...  //
        // ^  ^___// to here
        // |______// current char, validated

        self.push_peek_position();
        self.next_char(); // consume '('

        if !self.peek_char_and_equals(0, '?') {
            self.opened_groups += 1;
            return Ok(TokenWithRange::from_position_and_length(
                Token::GroupStart,
                &self.pop_saved_position(),
                1,
            ));
        }

        self.next_char(); // consume '?'

        let token = match self.peek_char(0) {
            Some(':') => {
                self.next_char(); // consume ':'
                Token::NonCapturing
            }
            Some('=') => {
                self.next_char(); // consume '='
                Token::LookAhead
            }
            Some('!') => {
                self.next_char(); // consume '!'
                Token::LookAheadNegative
            }
            Some('<') if matches!(self.peek_char(1), Some('=' | '!')) => {
                return Err(RegexError::pattern(
                    "Lookbehind assertion is not supported.",
                    &self.pop_saved_position(),
                ));
            }
            Some('<') => {
                let name = self.lex_identifier(false)?;
                self.opened_groups += 1;
                Token::NamedCapture(name)
            }
            Some(c) if c == '-' || Flags::from_letter(c).is_some() => self.lex_flags()?,
            _ => {
                return Err(RegexError::pattern(
                    "Unknown group type.",
                    &self.pop_saved_position(),
                ));
            }
        };

        let range = Location::from_position_pair_with_end_included(
            &self.pop_saved_position(),
            &self.last_position,
        );

        Ok(TokenWithRange::new(token, range))
    }

    fn lex_flags(&mut self) -> Result<Token, RegexError> {
        // (?i-ms)  //
        //   ^    ^_// to here
        //   |______// current char

        let mut on = Flags::empty();
        let mut off = Flags::empty();
        let mut negative = false;

        loop {
            match self.next_char() {
                Some('-') if !negative => {
                    negative = true;
                }
                Some(')') => return Ok(Token::InlineFlags { on, off }),
                Some(':') => return Ok(Token::ScopedFlags { on, off }),
                Some(c) => match Flags::from_letter(c) {
                    Some(flag) if negative => off |= flag,
                    Some(flag) => on |= flag,
                    None => {
                        return Err(RegexError::pattern(
                            format!("Unknown inline flag '{}'.", c),
                            &self.last_position,
                        ));
                    }
                },
                None => {
                    return Err(RegexError::pattern(
                        "Incomplete inline flags.",
                        &self.end_position(),
                    ));
                }
            }
        }
    }

    fn lex_identifier(&mut self, allow_leading_digit: bool) -> Result<String, RegexError> {
        // <name>?  //
        // ^     ^__// to here
        // |________// current char, validated

        self.expect_char('<', "left angle bracket \"<\"")?;

        let mut name = String::new();

        loop {
            match self.next_char() {
                Some('>') => break,
                Some(c) if c.is_ascii_alphanumeric() || c == '_' => {
                    if name.is_empty() && c.is_ascii_digit() && !allow_leading_digit {
                        return Err(RegexError::pattern(
                            "Group name cannot start with a digit.",
                            &self.last_position,
                        ));
                    }
                    name.push(c);
                }
                Some(_) => {
                    return Err(RegexError::pattern(
                        "Invalid char in group name.",
                        &self.last_position,
                    ));
                }
                None => {
                    return Err(RegexError::pattern(
                        "Missing the closing angle bracket \">\" for group name.",
                        &self.end_position(),
                    ));
                }
            }
        }

        if name.is_empty() {
            return Err(RegexError::pattern("Empty group name.", &self.last_position));
        }

        Ok(name)
    }

    // the value and the plain char tokens of a run of decimal digits.
    fn lex_digits(&mut self) -> (Option<u32>, Vec<TokenWithRange>) {
        let mut value: Option<u32> = None;
        let mut token_with_ranges = vec![];

        while let Some(c) = self.peek_char(0) {
            match c.to_digit(10) {
                Some(d) => {
                    self.next_char(); // consume digit
                    token_with_ranges.push(TokenWithRange::from_position_and_length(
                        Token::Char(c),
                        &self.last_position,
                        1,
                    ));

                    // saturate, the caller reports the overflow
                    let current = value.unwrap_or(0);
                    value = Some(current.saturating_mul(10).saturating_add(d));
                }
                None => break,
            }
        }

        (value, token_with_ranges)
    }

    fn lex_repetition(&mut self) -> Result<Vec<TokenWithRange>, RegexError> {
        // {m,n}?  //
        // ^    ^__// to here
        // |_______// current char, validated

        // the chars consumed so far, they are literals when the
        // braces turn out not to be a repetition, e.g. "{", "{a", "{,3}", "{2,x".
        let mut consumed: Vec<TokenWithRange> = vec![];

        self.push_peek_position();
        self.next_char(); // consume '{'
        consumed.push(TokenWithRange::from_position_and_length(
            Token::Char('{'),
            &self.last_position,
            1,
        ));

        let (min, mut digits) = self.lex_digits();
        consumed.append(&mut digits);

        let repetition = match (min, self.peek_char(0)) {
            (Some(m), Some('}')) => {
                self.next_char(); // consume '}'
                Repetition::Specified(m)
            }
            (Some(m), Some(',')) => {
                self.next_char(); // consume ','
                consumed.push(TokenWithRange::from_position_and_length(
                    Token::Char(','),
                    &self.last_position,
                    1,
                ));

                let (max, mut digits) = self.lex_digits();
                consumed.append(&mut digits);

                if !self.peek_char_and_equals(0, '}') {
                    self.pop_saved_position();
                    return Ok(consumed);
                }

                self.next_char(); // consume '}'

                match max {
                    Some(n) => Repetition::Range(m, n),
                    None => Repetition::AtLeast(m),
                }
            }
            _ => {
                self.pop_saved_position();
                return Ok(consumed);
            }
        };

        let start_position = self.pop_saved_position();

        let (m, n) = repetition.bounds();
        if m == u32::MAX || n == Some(u32::MAX) {
            return Err(RegexError::pattern(
                "Repetition count is too large.",
                &start_position,
            ));
        }

        if let Some(n) = n {
            if m > n {
                return Err(RegexError::pattern(
                    "The lower bound of the repetition is greater than the upper bound.",
                    &start_position,
                ));
            }
        }

        let lazy = if self.peek_char_and_equals(0, '?') {
            self.next_char(); // consume '?'
            true
        } else {
            false
        };

        let range =
            Location::from_position_pair_with_end_included(&start_position, &self.last_position);

        Ok(vec![TokenWithRange::new(
            Token::Repetition(repetition, lazy),
            range,
        )])
    }

    fn lex_charset(&mut self) -> Result<Vec<TokenWithRange>, RegexError> {
        // [.....]?  //
        // ^      ^__// to here
        // |_________// current char, validated
        //
        // also `[^.....]`

        let mut token_with_ranges = vec![];

        self.push_peek_position();
        self.next_char(); // consume '['

        let charset_start_position = *self.saved_positions.last().unwrap_or(&self.last_position);

        let charset_start = if self.peek_char_and_equals(0, '^') {
            self.next_char(); // consume '^'
            TokenWithRange::from_position_and_length(
                Token::CharSetStartNegative,
                &self.pop_saved_position(),
                2,
            )
        } else {
            TokenWithRange::from_position_and_length(
                Token::CharSetStart,
                &self.pop_saved_position(),
                1,
            )
        };

        token_with_ranges.push(charset_start);

        // a ']' right after the opening bracket is a literal
        let mut is_first = true;

        loop {
            match self.peek_char(0) {
                Some(']') if !is_first => break,
                Some(_) => {
                    let mut twrs = self.lex_charset_atom()?;

                    // char range, e.g. `a-z`
                    let range_start = match twrs.as_slice() {
                        [TokenWithRange {
                            token: Token::Char(c),
                            range,
                        }] => Some((*c, *range)),
                        _ => None,
                    };

                    if let Some((char_start, position_start)) = range_start {
                        if self.peek_char_and_equals(0, '-')
                            && !matches!(self.peek_char(1), Some(']') | None)
                        {
                            self.next_char(); // consume '-'

                            let range_end = self.lex_charset_atom()?;
                            let twr = match range_end.as_slice() {
                                [TokenWithRange {
                                    token: Token::Char(char_end),
                                    range: position_end,
                                }] => {
                                    if char_start > *char_end {
                                        return Err(RegexError::pattern(
                                            format!(
                                                "Invalid char range: '{}' is greater than '{}'.",
                                                char_start, char_end
                                            ),
                                            &position_start,
                                        ));
                                    }

                                    TokenWithRange::new(
                                        Token::CharRange(char_start, *char_end),
                                        Location::from_range_pair(&position_start, position_end),
                                    )
                                }
                                _ => {
                                    return Err(RegexError::pattern(
                                        "Expect a char for the end of char range, e.g. \"a-z\".",
                                        &position_start,
                                    ));
                                }
                            };

                            twrs = vec![twr];
                        }
                    }

                    token_with_ranges.append(&mut twrs);
                }
                None => {
                    return Err(RegexError::pattern(
                        "Unclosed character class.",
                        &charset_start_position,
                    ));
                }
            }

            is_first = false;
        }

        self.next_char(); // consume ']'

        token_with_ranges.push(TokenWithRange::from_position_and_length(
            Token::CharSetEnd,
            &self.last_position,
            1,
        ));

        Ok(token_with_ranges)
    }

    fn lex_charset_atom(&mut self) -> Result<Vec<TokenWithRange>, RegexError> {
        match self.peek_char(0) {
            Some('\\') => self.lex_escaping(true),
            Some(c) => {
                self.next_char(); // consume char
                Ok(vec![TokenWithRange::from_position_and_length(
                    Token::Char(c),
                    &self.last_position,
                    1,
                )])
            }
            None => Err(RegexError::pattern(
                "Unclosed character class.",
                &self.end_position(),
            )),
        }
    }

    fn lex_escaping(&mut self, in_charset: bool) -> Result<Vec<TokenWithRange>, RegexError> {
        // \xxxx?  //
        // ^    ^__// to here
        // |_______// current char, validated

        self.push_peek_position();
        self.next_char(); // consume '\'

        let Some(current_char) = self.next_char() else {
            self.pop_saved_position();
            return Err(RegexError::pattern(
                "Incomplete escape sequence.",
                &self.end_position(),
            ));
        };

        let token = match current_char {
            't' => Token::Char('\t'),
            'n' => Token::Char('\n'),
            'r' => Token::Char('\r'),
            'f' => Token::Char('\u{0C}'),
            'a' => Token::Char('\u{07}'),
            'e' => Token::Char('\u{1B}'),
            '0' => {
                let c = self.lex_octal(0);
                Token::Char(c)
            }
            '1'..='9' => {
                let first = current_char as usize - '0' as usize;

                if !in_charset && first <= self.opened_groups {
                    // take as many digits as still name an opened group
                    let mut number = first;
                    while let Some(d) = self.peek_char(0).and_then(|c| c.to_digit(10)) {
                        let next_number = number * 10 + d as usize;
                        if next_number > self.opened_groups {
                            break;
                        }
                        number = next_number;
                        self.next_char(); // consume digit
                    }
                    Token::BackReferenceNumber(number)
                } else if first <= 7 {
                    let c = self.lex_octal(first as u32);
                    Token::Char(c)
                } else {
                    return Err(RegexError::pattern(
                        format!("Backreference to the undefined group {}.", first),
                        &self.pop_saved_position(),
                    ));
                }
            }
            'x' => {
                let c = if self.peek_char_and_equals(0, '{') {
                    self.lex_braced_hex()?
                } else {
                    self.lex_fixed_hex(2)?
                };
                Token::Char(c)
            }
            'u' => {
                let c = if self.peek_char_and_equals(0, '{') {
                    self.lex_braced_hex()?
                } else {
                    self.lex_fixed_hex(4)?
                };
                Token::Char(c)
            }
            'c' => match self.next_char() {
                Some(c) if c.is_ascii() => {
                    // e.g. `\cJ` is 0x0A
                    Token::Char(char::from(c as u8 ^ 0x40))
                }
                _ => {
                    return Err(RegexError::pattern(
                        "Expect an ASCII char for the control escape sequence.",
                        &self.pop_saved_position(),
                    ));
                }
            },
            'p' | 'P' => {
                let set = self.lex_property()?;
                Token::PresetCharSet(set, current_char == 'P')
            }
            'w' | 'W' => Token::PresetCharSet(CharSet::word(), current_char == 'W'),
            'd' | 'D' => Token::PresetCharSet(CharSet::digit(), current_char == 'D'),
            's' | 'S' => Token::PresetCharSet(CharSet::space(), current_char == 'S'),
            'b' | 'B' | 'A' | 'z' | 'Z' if !in_charset => Token::BoundaryAssertion(current_char),
            'k' if !in_charset => {
                if !self.peek_char_and_equals(0, '<') {
                    return Err(RegexError::pattern(
                        "Missing the angle bracket \"<\" for group name.",
                        &self.pop_saved_position(),
                    ));
                }
                let name = self.lex_identifier(true)?;
                Token::BackReferenceIdentifier(name)
            }
            'Q' => {
                self.pop_saved_position();
                return Ok(self.lex_quotation());
            }
            'E' => {
                // a stray `\E` is ignored
                self.pop_saved_position();
                return Ok(vec![]);
            }
            c if c.is_ascii_alphanumeric() => {
                return Err(RegexError::pattern(
                    format!("Unsupported escape char '{}'.", c),
                    &self.pop_saved_position(),
                ));
            }
            c => Token::Char(c),
        };

        let range = Location::from_position_pair_with_end_included(
            &self.pop_saved_position(),
            &self.last_position,
        );

        Ok(vec![TokenWithRange::new(token, range)])
    }

    // up to 3 octal digits in total with the value not greater than 0o377.
    fn lex_octal(&mut self, first: u32) -> char {
        let mut value = first;
        let mut count = if first == 0 { 0 } else { 1 };

        while count < 3 {
            match self.peek_char(0).and_then(|c| c.to_digit(8)) {
                Some(d) if value * 8 + d <= 0o377 => {
                    self.next_char(); // consume digit
                    value = value * 8 + d;
                    count += 1;
                }
                _ => break,
            }
        }

        // always below 0x100
        char::from(value as u8)
    }

    fn lex_fixed_hex(&mut self, count: usize) -> Result<char, RegexError> {
        let mut value: u32 = 0;
        for _ in 0..count {
            match self.next_char().and_then(|c| c.to_digit(16)) {
                Some(d) => value = value * 16 + d,
                None => {
                    return Err(RegexError::pattern(
                        format!("Expect {} hexadecimal digits.", count),
                        &self.pop_saved_position(),
                    ));
                }
            }
        }

        self.code_point_to_char(value)
    }

    fn lex_braced_hex(&mut self) -> Result<char, RegexError> {
        // {h..h}  //
        // ^     ^_// to here
        // |_______// current char, validated

        self.expect_char('{', "left brace \"{\"")?;

        let mut value: u32 = 0;
        let mut count = 0;

        loop {
            match self.next_char() {
                Some('}') if count > 0 => break,
                Some(c) if c.is_ascii_hexdigit() && count < 6 => {
                    value = value * 16 + c.to_digit(16).unwrap_or(0);
                    count += 1;
                }
                _ => {
                    return Err(RegexError::pattern(
                        "Expect 1 to 6 hexadecimal digits in braces, e.g. \"\\x{6587}\".",
                        &self.pop_saved_position(),
                    ));
                }
            }
        }

        self.code_point_to_char(value)
    }

    fn code_point_to_char(&mut self, value: u32) -> Result<char, RegexError> {
        match char::from_u32(value) {
            Some(c) => Ok(c),
            None => Err(RegexError::pattern(
                format!("Invalid Unicode code point {:#x}.", value),
                &self.pop_saved_position(),
            )),
        }
    }

    fn lex_property(&mut self) -> Result<CharSet, RegexError> {
        // \pL or \p{Name}

        let name = match self.next_char() {
            Some('{') => {
                let mut name = String::new();
                loop {
                    match self.next_char() {
                        Some('}') => break,
                        Some(c) => name.push(c),
                        None => {
                            return Err(RegexError::pattern(
                                "Missing the closing brace \"}\" for property name.",
                                &self.pop_saved_position(),
                            ));
                        }
                    }
                }
                name
            }
            Some(c) if c.is_ascii_alphabetic() => c.to_string(),
            _ => {
                return Err(RegexError::pattern(
                    "Expect a property name, e.g. \"\\p{Lu}\".",
                    &self.pop_saved_position(),
                ));
            }
        };

        match CharSet::from_property(&name) {
            Some(set) => Ok(set),
            None => Err(RegexError::pattern(
                format!("Unknown property name \"{}\".", name),
                &self.pop_saved_position(),
            )),
        }
    }

    fn lex_quotation(&mut self) -> Vec<TokenWithRange> {
        // \Q...\E  //
        //   ^     ^// to here
        //   |______// current char

        let mut token_with_ranges = vec![];

        while let Some(c) = self.peek_char(0) {
            if c == '\\' && self.peek_char_and_equals(1, 'E') {
                self.next_char(); // consume '\'
                self.next_char(); // consume 'E'
                break;
            }

            self.next_char(); // consume char
            token_with_ranges.push(TokenWithRange::from_position_and_length(
                Token::Char(c),
                &self.last_position,
                1,
            ));
        }

        token_with_ranges
    }
}
