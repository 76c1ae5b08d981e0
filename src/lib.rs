pub mod automaton;
pub mod language;
pub mod parse;
pub mod random;
pub mod transform;

pub use automaton::{Automaton, AutomatonError, Edge, StateId};
pub use language::{are_equal, difference_witness, find_accepting_path, intersect};
pub use parse::{parse_automaton, ParseError};
pub use transform::{
    canonical_complement, canonical_dfa, complete, determinize, minimize, prune,
    MAX_SUBSET_STATES,
};
