use std::collections::HashSet;
use std::fmt;

use itertools::Itertools;
use thiserror::Error;

pub type StateId = usize;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AutomatonError {
    #[error("state {state} is out of range for {state_count} states")]
    InvalidState { state: StateId, state_count: usize },
    #[error("the alphabet doesn't contain the symbol {symbol:?}")]
    UnknownSymbol { symbol: char },
    #[error("the alphabet contains {symbol:?} more than once")]
    DuplicateSymbol { symbol: char },
    #[error("state {state} has more than one transition on {symbol:?}")]
    NotDeterministic { state: StateId, symbol: char },
    #[error("state {state} has no transition on {symbol:?}")]
    MissingTransition { state: StateId, symbol: char },
    #[error("the automata have different alphabets")]
    AlphabetMismatch,
    #[error("{state_count} states exceed the {limit}-state subset construction limit")]
    TooManyStates { state_count: usize, limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub to: StateId,
    pub symbol: char,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.symbol, self.to)
    }
}

/// A finite automaton over single-character symbols. States are dense
/// indices `0..state_count`; non-determinism and missing transitions are
/// both representable. Every mutation re-validates the indices and the
/// symbol, so a constructed value always satisfies the invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Automaton {
    state_count: usize,
    alphabet: Vec<char>,
    start: StateId,
    edges: Vec<Vec<Edge>>,
    accepting: HashSet<StateId>,
}

impl Automaton {
    pub fn new(
        state_count: usize,
        alphabet: &str,
        start: StateId,
    ) -> Result<Automaton, AutomatonError> {
        if start >= state_count {
            return Err(AutomatonError::InvalidState {
                state: start,
                state_count,
            });
        }
        let alphabet: Vec<char> = alphabet.chars().collect();
        if let Some(&symbol) = alphabet.iter().duplicates().next() {
            return Err(AutomatonError::DuplicateSymbol { symbol });
        }
        Ok(Automaton {
            state_count,
            alphabet,
            start,
            edges: vec![Vec::new(); state_count],
            accepting: HashSet::new(),
        })
    }

    /// Builds an automaton from its full description in one call.
    pub fn with_parts(
        state_count: usize,
        alphabet: &str,
        edges: &[(StateId, StateId, char)],
        accepting: &[StateId],
        start: StateId,
    ) -> Result<Automaton, AutomatonError> {
        let mut automaton = Automaton::new(state_count, alphabet, start)?;
        for &(from, to, symbol) in edges {
            automaton.add_edge(from, to, symbol)?;
        }
        for &state in accepting {
            automaton.add_accepting(state)?;
        }
        Ok(automaton)
    }

    fn check_state(&self, state: StateId) -> Result<(), AutomatonError> {
        if state >= self.state_count {
            return Err(AutomatonError::InvalidState {
                state,
                state_count: self.state_count,
            });
        }
        Ok(())
    }

    /// Adds an edge; an exact duplicate is silently dropped.
    pub fn add_edge(
        &mut self,
        from: StateId,
        to: StateId,
        symbol: char,
    ) -> Result<(), AutomatonError> {
        self.check_state(from)?;
        self.check_state(to)?;
        if !self.alphabet.contains(&symbol) {
            return Err(AutomatonError::UnknownSymbol { symbol });
        }
        let edge = Edge { to, symbol };
        if !self.edges[from].contains(&edge) {
            self.edges[from].push(edge);
        }
        Ok(())
    }

    pub fn add_accepting(&mut self, state: StateId) -> Result<(), AutomatonError> {
        self.check_state(state)?;
        self.accepting.insert(state);
        Ok(())
    }

    /// Flips the accepting set against the full state set, in place.
    /// Transitions are untouched; over a complete deterministic automaton
    /// this complements the accepted language.
    pub fn invert(&mut self) {
        self.accepting = (0..self.state_count)
            .filter(|state| !self.accepting.contains(state))
            .collect();
    }

    /// Single-step lookup for deterministic automata: the unique target of
    /// `(from, symbol)`, or `None` when the transition is missing. More
    /// than one matching edge means the caller violated the determinism
    /// precondition.
    pub fn step(&self, from: StateId, symbol: char) -> Result<Option<StateId>, AutomatonError> {
        self.check_state(from)?;
        let mut target = None;
        for edge in &self.edges[from] {
            if edge.symbol != symbol {
                continue;
            }
            if target.is_some() {
                return Err(AutomatonError::NotDeterministic {
                    state: from,
                    symbol,
                });
            }
            target = Some(edge.to);
        }
        Ok(target)
    }

    pub fn is_deterministic(&self) -> bool {
        (0..self.state_count).all(|from| {
            self.alphabet.iter().all(|&symbol| {
                self.edges[from]
                    .iter()
                    .filter(|edge| edge.symbol == symbol)
                    .count()
                    <= 1
            })
        })
    }

    pub fn is_complete(&self) -> bool {
        (0..self.state_count).all(|from| {
            self.alphabet
                .iter()
                .all(|&symbol| self.edges[from].iter().any(|edge| edge.symbol == symbol))
        })
    }

    /// Nondeterministic word acceptance: does any path labeled `word` lead
    /// from the start state to an accepting state? Runs by state-set
    /// simulation, one symbol at a time.
    pub fn accepts(&self, word: &[char]) -> bool {
        let mut current: HashSet<StateId> = HashSet::from([self.start]);
        for &symbol in word {
            current = current
                .iter()
                .flat_map(|&state| {
                    self.edges[state]
                        .iter()
                        .filter(|edge| edge.symbol == symbol)
                        .map(|edge| edge.to)
                })
                .collect();
            if current.is_empty() {
                return false;
            }
        }
        current.iter().any(|state| self.accepting.contains(state))
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    pub fn alphabet_string(&self) -> String {
        self.alphabet.iter().collect()
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn edges_from(&self, state: StateId) -> &[Edge] {
        &self.edges[state]
    }

    pub fn accepting_states(&self) -> &HashSet<StateId> {
        &self.accepting
    }

    pub fn is_accepting(&self, state: StateId) -> bool {
        self.accepting.contains(&state)
    }
}

impl fmt::Display for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "State count: {}; start state: {}",
            self.state_count, self.start
        )?;
        writeln!(f, "Alphabet: {}", self.alphabet_string())?;
        writeln!(f, "Edges:")?;
        for from in 0..self.state_count {
            writeln!(f, "{}: {}", from, self.edges[from].iter().format("; "))?;
        }
        writeln!(f, "Accepting states:")?;
        writeln!(f, "{}", self.accepting.iter().sorted().format(" "))?;
        Ok(())
    }
}

#[test]
fn test_add_edge_validates() {
    let mut automaton = Automaton::new(2, "ab", 0).unwrap();
    assert_eq!(
        automaton.add_edge(0, 5, 'a'),
        Err(AutomatonError::InvalidState {
            state: 5,
            state_count: 2
        })
    );
    assert_eq!(
        automaton.add_edge(3, 0, 'a'),
        Err(AutomatonError::InvalidState {
            state: 3,
            state_count: 2
        })
    );
    assert_eq!(
        automaton.add_edge(0, 1, 'z'),
        Err(AutomatonError::UnknownSymbol { symbol: 'z' })
    );
    assert_eq!(
        automaton.add_accepting(2),
        Err(AutomatonError::InvalidState {
            state: 2,
            state_count: 2
        })
    );
    assert!(automaton.add_edge(0, 1, 'a').is_ok());
}

#[test]
fn test_constructor_validates() {
    assert_eq!(
        Automaton::new(3, "ab", 3).unwrap_err(),
        AutomatonError::InvalidState {
            state: 3,
            state_count: 3
        }
    );
    assert_eq!(
        Automaton::new(1, "aba", 0).unwrap_err(),
        AutomatonError::DuplicateSymbol { symbol: 'a' }
    );
}

#[test]
fn test_duplicate_edges_are_dropped() {
    let mut automaton = Automaton::new(2, "a", 0).unwrap();
    automaton.add_edge(0, 1, 'a').unwrap();
    automaton.add_edge(0, 1, 'a').unwrap();
    assert_eq!(automaton.edges_from(0).len(), 1);
}

#[test]
fn test_step_and_determinism() {
    let mut automaton = Automaton::new(3, "ab", 0).unwrap();
    automaton.add_edge(0, 1, 'a').unwrap();
    assert_eq!(automaton.step(0, 'a'), Ok(Some(1)));
    assert_eq!(automaton.step(0, 'b'), Ok(None));
    assert!(automaton.is_deterministic());
    assert!(!automaton.is_complete());

    automaton.add_edge(0, 2, 'a').unwrap();
    assert!(!automaton.is_deterministic());
    assert_eq!(
        automaton.step(0, 'a'),
        Err(AutomatonError::NotDeterministic {
            state: 0,
            symbol: 'a'
        })
    );
}

#[test]
fn test_invert_flips_acceptance() {
    let mut automaton =
        Automaton::with_parts(3, "a", &[(0, 1, 'a'), (1, 2, 'a')], &[1], 0).unwrap();
    automaton.invert();
    assert!(!automaton.is_accepting(1));
    assert!(automaton.is_accepting(0));
    assert!(automaton.is_accepting(2));
}

#[test]
fn test_accepts_follows_all_paths() {
    // Two ways out of 0 on 'a'; only one of them reaches the accepting state.
    let automaton = Automaton::with_parts(
        4,
        "ab",
        &[(0, 1, 'a'), (0, 2, 'a'), (2, 3, 'b')],
        &[3],
        0,
    )
    .unwrap();
    assert!(automaton.accepts(&['a', 'b']));
    assert!(!automaton.accepts(&['a']));
    assert!(!automaton.accepts(&['b']));
    assert!(!automaton.accepts(&['a', 'b', 'a']));
    assert!(!automaton.accepts(&[]));
}

#[test]
fn test_display_shape() {
    let automaton =
        Automaton::with_parts(2, "ab", &[(0, 1, 'a'), (1, 0, 'b')], &[1], 0).unwrap();
    let rendered = automaton.to_string();
    assert_eq!(
        rendered,
        "State count: 2; start state: 0\n\
         Alphabet: ab\n\
         Edges:\n\
         0: a -> 1\n\
         1: b -> 0\n\
         Accepting states:\n\
         1\n"
    );
}
