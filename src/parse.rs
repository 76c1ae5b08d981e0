use regex::Regex;
use thiserror::Error;

use crate::automaton::{Automaton, AutomatonError, StateId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("malformed line {line:?}")]
    MalformedLine { line: String },
    #[error("edge symbol {token:?} must be a single character")]
    SymbolLength { token: String },
    #[error("expected {expected} accepting states, found {found}")]
    AcceptingCount { expected: usize, found: usize },
    #[error(transparent)]
    Automaton(#[from] AutomatonError),
}

fn parse_number(line: &str, token: &str) -> Result<usize, ParseError> {
    token.parse().map_err(|_| ParseError::MalformedLine {
        line: line.to_string(),
    })
}

/// Reads one automaton from its line-oriented description:
///
/// ```text
/// <state_count> <edge_count>
/// <alphabet>
/// <from> <to> <symbol>     (edge_count lines)
/// <accepting_count>
/// <state> <state> ...      (omitted when accepting_count is 0)
/// ```
///
/// The start state is implicitly 0. Malformed lines are rejected here;
/// out-of-range indices and unknown symbols are rejected by the automaton
/// itself while it is being built.
pub fn parse_automaton(input: &str) -> Result<Automaton, ParseError> {
    let header_pattern = Regex::new(r"^(\d+)\s+(\d+)$").unwrap();
    let edge_pattern = Regex::new(r"^(\d+)\s+(\d+)\s+(\S+)$").unwrap();

    let mut lines = input.lines().map(str::trim).filter(|line| !line.is_empty());
    let mut next_line = || lines.next().ok_or(ParseError::UnexpectedEnd);

    let header = next_line()?;
    let captures = header_pattern
        .captures(header)
        .ok_or_else(|| ParseError::MalformedLine {
            line: header.to_string(),
        })?;
    let state_count = parse_number(header, &captures[1])?;
    let edge_count = parse_number(header, &captures[2])?;

    let alphabet = next_line()?;
    let mut automaton = Automaton::new(state_count, alphabet, 0)?;

    for _ in 0..edge_count {
        let line = next_line()?;
        let captures = edge_pattern
            .captures(line)
            .ok_or_else(|| ParseError::MalformedLine {
                line: line.to_string(),
            })?;
        let from = parse_number(line, &captures[1])?;
        let to = parse_number(line, &captures[2])?;
        let token = &captures[3];
        let mut symbols = token.chars();
        let symbol = match (symbols.next(), symbols.next()) {
            (Some(symbol), None) => symbol,
            _ => {
                return Err(ParseError::SymbolLength {
                    token: token.to_string(),
                })
            }
        };
        automaton.add_edge(from, to, symbol)?;
    }

    let count_line = next_line()?;
    let accepting_count = parse_number(count_line, count_line)?;
    if accepting_count > 0 {
        let line = next_line()?;
        let states: Vec<StateId> = line
            .split_whitespace()
            .map(|token| parse_number(line, token))
            .collect::<Result<_, _>>()?;
        if states.len() != accepting_count {
            return Err(ParseError::AcceptingCount {
                expected: accepting_count,
                found: states.len(),
            });
        }
        for state in states {
            automaton.add_accepting(state)?;
        }
    }

    Ok(automaton)
}

#[cfg(test)]
const MOD3_INPUT: &str = "\
9 18
ab
0 1 a
0 3 b
1 2 a
1 4 b
2 0 a
2 5 b
3 4 a
3 6 b
4 5 a
4 7 b
5 3 a
5 8 b
6 7 a
6 0 b
7 8 a
7 1 b
8 6 a
8 2 b
3
0 4 8
";

#[test]
fn test_parse_full_description() {
    let automaton = parse_automaton(MOD3_INPUT).unwrap();
    assert_eq!(automaton.state_count(), 9);
    assert_eq!(automaton.start(), 0);
    assert_eq!(automaton.alphabet(), ['a', 'b']);
    assert_eq!(automaton.accepting_states().len(), 3);
    assert_eq!(automaton.step(0, 'a'), Ok(Some(1)));

    let minimal = crate::transform::canonical_dfa(&automaton).unwrap();
    assert_eq!(minimal.state_count(), 3);
}

#[test]
fn test_parse_no_accepting_states() {
    let automaton = parse_automaton("2 1\na\n0 1 a\n0\n").unwrap();
    assert!(automaton.accepting_states().is_empty());
}

#[test]
fn test_parse_rejects_truncated_input() {
    assert_eq!(
        parse_automaton("3 2\nab\n0 1 a\n"),
        Err(ParseError::UnexpectedEnd)
    );
}

#[test]
fn test_parse_rejects_bad_header() {
    assert_eq!(
        parse_automaton("three 2\nab\n"),
        Err(ParseError::MalformedLine {
            line: "three 2".to_string()
        })
    );
}

#[test]
fn test_parse_rejects_long_symbol() {
    assert_eq!(
        parse_automaton("2 1\nab\n0 1 ab\n0\n"),
        Err(ParseError::SymbolLength {
            token: "ab".to_string()
        })
    );
}

#[test]
fn test_parse_rejects_out_of_range_edge() {
    assert_eq!(
        parse_automaton("2 1\na\n0 7 a\n0\n"),
        Err(ParseError::Automaton(AutomatonError::InvalidState {
            state: 7,
            state_count: 2
        }))
    );
}

#[test]
fn test_parse_rejects_accepting_count_mismatch() {
    assert_eq!(
        parse_automaton("2 0\na\n2\n1\n"),
        Err(ParseError::AcceptingCount {
            expected: 2,
            found: 1
        })
    );
}
