// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::{
    ast::{AssertionKind, Ast, NodeId, NodeKind},
    charset::{simple_fold, CharSet},
    error::RegexError,
    flags::Flags,
    location::Location,
    peekableiter::PeekableIter,
};

use super::{
    lexer::lex_from_str,
    token::{Token, TokenWithRange},
};

pub const PARSER_PEEK_TOKEN_MAX_COUNT: usize = 2;

/// Parse a pattern into an AST.
///
/// The returned tree is the raw parse, the reference and analysis
/// passes of `Ast` have not been run on it yet.
pub fn parse_from_str(s: &str, flags: Flags) -> Result<Ast, RegexError> {
    let tokens = lex_from_str(s)?;
    let end_offset = s.chars().count();
    let upstream = PeekableIter::new(tokens.into_iter(), PARSER_PEEK_TOKEN_MAX_COUNT);
    let mut parser = Parser::new(upstream, flags, end_offset);
    parser.parse()
}

// The head and the last node of a chain that is being built.
#[derive(Debug, Clone, Copy, Default)]
struct Chain {
    head: Option<NodeId>,
    last: Option<NodeId>,
}

impl Chain {
    fn single(id: NodeId) -> Self {
        Self {
            head: Some(id),
            last: Some(id),
        }
    }

    fn append(&mut self, ast: &mut Ast, other: Chain) {
        let Some(other_head) = other.head else {
            return;
        };

        match self.last {
            Some(last) => ast.nodes[last].tail = Some(other_head),
            None => self.head = Some(other_head),
        }

        self.last = other.last;
    }
}

// A run of plain chars waiting to be merged into one literal node.
struct PendingLiteral {
    chars: Vec<char>,
    first_range: Location,
    last_range: Location,
}

struct Parser {
    upstream: PeekableIter<std::vec::IntoIter<TokenWithRange>>,
    last_range: Location,
    end_offset: usize,
    ast: Ast,

    // the flags in effect at the current token
    flags: Flags,
}

impl Parser {
    fn new(
        upstream: PeekableIter<std::vec::IntoIter<TokenWithRange>>,
        flags: Flags,
        end_offset: usize,
    ) -> Self {
        Self {
            upstream,
            last_range: Location::new_range(0, 0, 0, 0),
            end_offset,
            ast: Ast::default(),
            flags,
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        match self.upstream.next() {
            Some(TokenWithRange { token, range }) => {
                self.last_range = range;
                Some(token)
            }
            None => None,
        }
    }

    fn peek_token(&mut self, offset: usize) -> Option<&Token> {
        match self.upstream.peek(offset) {
            Some(TokenWithRange { token, .. }) => Some(token),
            None => None,
        }
    }

    fn peek_range(&mut self, offset: usize) -> Option<Location> {
        self.upstream
            .peek(offset)
            .map(|TokenWithRange { range, .. }| *range)
    }

    fn add_node(&mut self, kind: NodeKind, location: Location) -> NodeId {
        self.ast.add(kind, location, self.flags)
    }

    fn is_ignore_case(&self) -> bool {
        self.flags.contains(Flags::CASE_INSENSITIVE)
    }
}

fn quantifier_bounds(token: &Token) -> Option<(u32, Option<u32>, bool)> {
    let bounds = match token {
        Token::ZeroOrMore => (0, None, false),
        Token::ZeroOrMoreLazy => (0, None, true),
        Token::OneOrMore => (1, None, false),
        Token::OneOrMoreLazy => (1, None, true),
        Token::Optional => (0, Some(1), false),
        Token::OptionalLazy => (0, Some(1), true),
        Token::Repetition(repetition, lazy) => {
            let (min, max) = repetition.bounds();
            (min, max, *lazy)
        }
        _ => return None,
    };
    Some(bounds)
}

impl Parser {
    fn parse(&mut self) -> Result<Ast, RegexError> {
        let chain = self.parse_alternation()?;

        // the alternation stops at the unpaired ')'
        if self.peek_token(0).is_some() {
            let range = self.peek_range(0).unwrap_or(self.last_range);
            return Err(RegexError::pattern("Unmatched \")\".", &range));
        }

        self.ast.root = chain.head;
        Ok(std::mem::take(&mut self.ast))
    }

    fn parse_alternation(&mut self) -> Result<Chain, RegexError> {
        // sequence ... [ "|" alternation ]
        // --------
        // ^
        // | current, None or Some(...)

        // right-associative:
        // a|b|c -> a|(b|c)

        let left = self.parse_sequence()?;

        if let Some(Token::LogicOr) = self.peek_token(0) {
            self.next_token(); // consume '|'
            let location = self.last_range;

            let right = self.parse_alternation()?;
            let id = self.add_node(
                NodeKind::Alternation {
                    left: left.head,
                    right: right.head,
                },
                location,
            );
            return Ok(Chain::single(id));
        }

        Ok(left)
    }

    fn parse_sequence(&mut self) -> Result<Chain, RegexError> {
        // atom atom ...
        // ----
        // ^
        // | current, None or Some(...)

        let mut chain = Chain::default();
        let mut pending: Option<PendingLiteral> = None;

        loop {
            let Some(token) = self.peek_token(0) else {
                break;
            };

            match token {
                // terminator
                Token::GroupEnd | Token::LogicOr => break,
                Token::InlineFlags { on, off } => {
                    let (on, off) = (*on, *off);
                    self.flush_literal(&mut chain, &mut pending);
                    self.next_token(); // consume "(?flags)"
                    self.flags = (self.flags | on) - off;
                }
                Token::Char(c) => {
                    let c = *c;

                    // a quantified char is an atom on its own
                    let followed_by_quantifier =
                        matches!(self.peek_token(1), Some(t) if quantifier_bounds(t).is_some());

                    if followed_by_quantifier {
                        self.flush_literal(&mut chain, &mut pending);
                        let atom = self.parse_quantified()?;
                        chain.append(&mut self.ast, atom);
                    } else {
                        self.next_token(); // consume char
                        let c = if self.is_ignore_case() {
                            simple_fold(c)
                        } else {
                            c
                        };

                        match pending.as_mut() {
                            Some(literal) => {
                                literal.chars.push(c);
                                literal.last_range = self.last_range;
                            }
                            None => {
                                pending = Some(PendingLiteral {
                                    chars: vec![c],
                                    first_range: self.last_range,
                                    last_range: self.last_range,
                                });
                            }
                        }
                    }
                }
                _ => {
                    self.flush_literal(&mut chain, &mut pending);
                    let atom = self.parse_quantified()?;
                    chain.append(&mut self.ast, atom);
                }
            }
        }

        self.flush_literal(&mut chain, &mut pending);
        Ok(chain)
    }

    fn flush_literal(&mut self, chain: &mut Chain, pending: &mut Option<PendingLiteral>) {
        if let Some(literal) = pending.take() {
            let location = Location::from_range_pair(&literal.first_range, &literal.last_range);
            let id = self.add_node(NodeKind::Literal(literal.chars), location);
            chain.append(&mut self.ast, Chain::single(id));
        }
    }

    fn parse_quantified(&mut self) -> Result<Chain, RegexError> {
        // atom [quantifier]
        // ----
        // ^
        // | current, Some(...)

        let atom_range = self.peek_range(0).unwrap_or(self.last_range);
        let (atom, is_assertion) = self.parse_atom()?;

        let Some((min, max, lazy)) = self.peek_token(0).and_then(quantifier_bounds) else {
            return Ok(atom);
        };

        self.next_token(); // consume quantifier

        if is_assertion {
            return Err(RegexError::pattern(
                "Quantifier cannot be applied to an assertion.",
                &self.last_range,
            ));
        }

        if self.peek_token(0).and_then(quantifier_bounds).is_some() {
            let range = self.peek_range(0).unwrap_or(self.last_range);
            return Err(RegexError::pattern(
                "Quantifier cannot follow another quantifier.",
                &range,
            ));
        }

        // with the lazy-default flag, `*` is lazy and `*?` is greedy
        let greedy = lazy == self.flags.contains(Flags::LAZY_DEFAULT);

        let location = Location::from_range_pair(&atom_range, &self.last_range);
        let id = self.add_node(
            NodeKind::Repeat {
                min,
                max,
                greedy,
                body: atom.head,
            },
            location,
        );

        Ok(Chain::single(id))
    }

    // returns the chain of the atom, and whether the atom is
    // a zero-width assertion.
    fn parse_atom(&mut self) -> Result<(Chain, bool), RegexError> {
        let Some(token) = self.next_token() else {
            return Err(RegexError::pattern_at(
                "Unexpected end of pattern.",
                self.end_offset,
            ));
        };
        let range = self.last_range;

        let (chain, is_assertion) = match token {
            Token::Char(c) => {
                let c = if self.is_ignore_case() {
                    simple_fold(c)
                } else {
                    c
                };
                let id = self.add_node(NodeKind::Literal(vec![c]), range);
                (Chain::single(id), false)
            }
            Token::CharSetStart | Token::CharSetStartNegative => {
                let set = self.parse_charset(token == Token::CharSetStartNegative, &range)?;
                let location = Location::from_range_pair(&range, &self.last_range);
                let id = self.add_node(NodeKind::Class(set), location);
                (Chain::single(id), false)
            }
            Token::PresetCharSet(set, negated) => {
                let set = self.build_preset_charset(set, negated, &range)?;
                let id = self.add_node(NodeKind::Class(set), range);
                (Chain::single(id), false)
            }
            Token::Dot => {
                let id = self.add_node(NodeKind::AnyChar, range);
                (Chain::single(id), false)
            }
            Token::StartAssertion | Token::EndAssertion | Token::BoundaryAssertion(_) => {
                let multiline = self.flags.contains(Flags::MULTILINE);
                let kind = match token {
                    Token::StartAssertion if multiline => AssertionKind::LineStart,
                    Token::StartAssertion => AssertionKind::TextStart,
                    Token::EndAssertion if multiline => AssertionKind::LineEnd,
                    Token::EndAssertion => AssertionKind::TextEnd,
                    Token::BoundaryAssertion('b') => AssertionKind::WordBoundary,
                    Token::BoundaryAssertion('B') => AssertionKind::NotWordBoundary,
                    Token::BoundaryAssertion('A') => AssertionKind::TextStart,
                    Token::BoundaryAssertion('z') => AssertionKind::TextEnd,
                    _ => AssertionKind::TextEndNewline,
                };
                let id = self.add_node(NodeKind::Assertion(kind), range);
                (Chain::single(id), true)
            }
            Token::GroupStart => (self.parse_capture_group(None, &range)?, false),
            Token::NamedCapture(name) => (self.parse_capture_group(Some(name), &range)?, false),
            Token::NonCapturing => (self.parse_group_body(&range)?, false),
            Token::ScopedFlags { on, off } => {
                let saved_flags = self.flags;
                self.flags = (self.flags | on) - off;
                let chain = self.parse_group_body(&range);
                self.flags = saved_flags;
                (chain?, false)
            }
            Token::LookAhead | Token::LookAheadNegative => {
                let body = self.parse_group_body(&range)?;
                let location = Location::from_range_pair(&range, &self.last_range);
                let id = self.add_node(
                    NodeKind::LookAhead {
                        negative: token == Token::LookAheadNegative,
                        body: body.head,
                    },
                    location,
                );
                (Chain::single(id), true)
            }
            Token::BackReferenceNumber(number) => {
                let id = self.add_node(
                    NodeKind::BackReference {
                        name: number.to_string(),
                    },
                    range,
                );
                (Chain::single(id), false)
            }
            Token::BackReferenceIdentifier(name) => {
                let id = self.add_node(NodeKind::BackReference { name }, range);
                (Chain::single(id), false)
            }
            token if quantifier_bounds(&token).is_some() => {
                return Err(RegexError::pattern(
                    "Quantifier without a preceding atom.",
                    &range,
                ));
            }
            _ => {
                return Err(RegexError::Internal(format!(
                    "Unexpected token {:?} at {}.",
                    token, range
                )));
            }
        };

        Ok((chain, is_assertion))
    }

    fn parse_capture_group(
        &mut self,
        name: Option<String>,
        range: &Location,
    ) -> Result<Chain, RegexError> {
        // (...)
        //  ^
        //  | current

        if let Some(name) = &name {
            if self.ast.groups.iter().any(|n| n.as_ref() == Some(name)) {
                return Err(RegexError::pattern(
                    format!("Duplicate group name \"{}\".", name),
                    range,
                ));
            }
        }

        // the number is taken before parsing the body so that
        // nested groups are numbered after the outer one.
        self.ast.groups.push(name);
        let group = self.ast.groups.len();

        let begin = self.add_node(NodeKind::CaptureBegin { group }, *range);
        let body = self.parse_group_body(range)?;
        let end = self.add_node(NodeKind::CaptureEnd { group }, self.last_range);

        let mut chain = Chain::single(begin);
        chain.append(&mut self.ast, body);
        chain.append(&mut self.ast, Chain::single(end));
        Ok(chain)
    }

    fn parse_group_body(&mut self, range: &Location) -> Result<Chain, RegexError> {
        // (...)
        //  ^  ^__ // to here
        //  |_____ // current

        // unscoped inline flags inside the group end with the group
        let saved_flags = self.flags;
        let body = self.parse_alternation();
        self.flags = saved_flags;
        let body = body?;

        match self.next_token() {
            Some(Token::GroupEnd) => Ok(body),
            _ => Err(RegexError::pattern("Unclosed group.", range)),
        }
    }

    fn parse_charset(&mut self, negative: bool, range: &Location) -> Result<CharSet, RegexError> {
        // [...]
        //  ^  ^__ // to here
        //  |_____ // current

        let mut ranges: Vec<(u32, u32)> = vec![];
        let mut presets: Vec<CharSet> = vec![];

        loop {
            match self.next_token() {
                Some(Token::Char(c)) => ranges.push((c as u32, c as u32)),
                Some(Token::CharRange(start, end)) => ranges.push((start as u32, end as u32)),
                Some(Token::PresetCharSet(set, negated)) => {
                    let element_range = self.last_range;
                    presets.push(self.build_preset_charset(set, negated, &element_range)?);
                }
                Some(Token::CharSetEnd) => break,
                Some(token) => {
                    return Err(RegexError::Internal(format!(
                        "Unexpected token {:?} in charset at {}.",
                        token, self.last_range
                    )));
                }
                None => return Err(RegexError::pattern("Unclosed character class.", range)),
            }
        }

        // fold before negation, the subject char is folded at matching time.
        let mut set = CharSet::from_ranges(&ranges);
        if self.is_ignore_case() {
            set = set.to_lower_case();
        }

        for preset in &presets {
            set = set.merge(preset);
        }

        if negative {
            set = set.negate().ok_or_else(|| {
                RegexError::pattern(
                    "Cannot negate a character class that mixes Unicode properties with non-ASCII chars.",
                    range,
                )
            })?;
        }

        Ok(set)
    }

    fn build_preset_charset(
        &self,
        set: CharSet,
        negated: bool,
        range: &Location,
    ) -> Result<CharSet, RegexError> {
        let set = if self.is_ignore_case() {
            set.to_lower_case()
        } else {
            set
        };

        if negated {
            set.negate().ok_or_else(|| {
                RegexError::pattern("Cannot negate the property class.", range)
            })
        } else {
            Ok(set)
        }
    }
}
