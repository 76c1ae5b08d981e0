use itertools::Itertools;
use log::debug;

use crate::automaton::{Automaton, AutomatonError, StateId};
use crate::transform::canonical_complement;

/// Product construction: the result accepts exactly the words accepted by
/// both inputs. Pair `(i, j)` lives at index `i * b.state_count() + j`
/// until pruning compacts the reachable slice. Neither input needs to be
/// deterministic or complete.
pub fn intersect(a: &Automaton, b: &Automaton) -> Result<Automaton, AutomatonError> {
    let same_alphabet = a.alphabet().iter().sorted().collect_vec()
        == b.alphabet().iter().sorted().collect_vec();
    if !same_alphabet {
        return Err(AutomatonError::AlphabetMismatch);
    }

    let pair_id = |i: StateId, j: StateId| i * b.state_count() + j;
    let mut product = Automaton::new(
        a.state_count() * b.state_count(),
        &a.alphabet_string(),
        pair_id(a.start(), b.start()),
    )?;

    for i in 0..a.state_count() {
        for j in 0..b.state_count() {
            for (edge_a, edge_b) in a
                .edges_from(i)
                .iter()
                .cartesian_product(b.edges_from(j).iter())
            {
                if edge_a.symbol != edge_b.symbol {
                    continue;
                }
                product.add_edge(pair_id(i, j), pair_id(edge_a.to, edge_b.to), edge_a.symbol)?;
            }
        }
    }

    for &i in a.accepting_states() {
        for &j in b.accepting_states() {
            product.add_accepting(pair_id(i, j))?;
        }
    }

    crate::transform::prune(&product)
}

/// Depth-first search for any accepting path from the start state. Returns
/// the first word the DFS stumbles on, not necessarily the shortest one;
/// `Some(vec![])` when the start state itself accepts.
pub fn find_accepting_path(automaton: &Automaton) -> Option<Vec<char>> {
    fn search(
        automaton: &Automaton,
        state: StateId,
        visited: &mut Vec<bool>,
    ) -> Option<Vec<char>> {
        visited[state] = true;
        if automaton.is_accepting(state) {
            return Some(Vec::new());
        }
        for edge in automaton.edges_from(state) {
            if visited[edge.to] {
                continue;
            }
            if let Some(mut word) = search(automaton, edge.to, visited) {
                word.insert(0, edge.symbol);
                return Some(word);
            }
        }
        None
    }

    let mut visited = vec![false; automaton.state_count()];
    search(automaton, automaton.start(), &mut visited)
}

/// A word accepted by `a` but not by `b`, if one exists: the witness search
/// runs over the intersection of `a` with the canonical complement of `b`.
pub fn difference_witness(
    a: &Automaton,
    b: &Automaton,
) -> Result<Option<Vec<char>>, AutomatonError> {
    let complement = canonical_complement(b)?;
    let product = intersect(a, &complement)?;
    Ok(find_accepting_path(&product))
}

/// Language equality as symmetric-difference emptiness: the languages are
/// equal iff neither direction yields a difference witness.
pub fn are_equal(a: &Automaton, b: &Automaton) -> Result<bool, AutomatonError> {
    let extra_in_a = difference_witness(a, b)?;
    let extra_in_b = difference_witness(b, a)?;
    if let Some(word) = &extra_in_a {
        debug!(
            "first language is larger, witness {:?}",
            word.iter().collect::<String>()
        );
    }
    if let Some(word) = &extra_in_b {
        debug!(
            "second language is larger, witness {:?}",
            word.iter().collect::<String>()
        );
    }
    Ok(extra_in_a.is_none() && extra_in_b.is_none())
}

#[test]
fn test_intersect_rejects_alphabet_mismatch() {
    let a = Automaton::new(1, "ab", 0).unwrap();
    let b = Automaton::new(1, "ac", 0).unwrap();
    assert_eq!(
        intersect(&a, &b).unwrap_err(),
        AutomatonError::AlphabetMismatch
    );

    // Same symbols in a different order is fine.
    let c = Automaton::new(1, "ba", 0).unwrap();
    assert!(intersect(&a, &c).is_ok());
}

#[test]
fn test_intersect_accepts_common_words() {
    // Words with at least one 'a' / words with at least one 'b'.
    let has_a = Automaton::with_parts(
        2,
        "ab",
        &[(0, 0, 'b'), (0, 1, 'a'), (1, 1, 'a'), (1, 1, 'b')],
        &[1],
        0,
    )
    .unwrap();
    let has_b = Automaton::with_parts(
        2,
        "ab",
        &[(0, 0, 'a'), (0, 1, 'b'), (1, 1, 'a'), (1, 1, 'b')],
        &[1],
        0,
    )
    .unwrap();
    let both = intersect(&has_a, &has_b).unwrap();

    for word in crate::transform::all_words(&['a', 'b'], 4) {
        assert_eq!(
            both.accepts(&word),
            has_a.accepts(&word) && has_b.accepts(&word),
            "word {:?}",
            word
        );
    }
}

#[test]
fn test_witness_on_accepting_start() {
    let mut automaton = Automaton::new(1, "a", 0).unwrap();
    automaton.add_accepting(0).unwrap();
    assert_eq!(find_accepting_path(&automaton), Some(Vec::new()));
}

#[test]
fn test_witness_none_for_empty_language() {
    let automaton =
        Automaton::with_parts(3, "ab", &[(0, 1, 'a'), (1, 0, 'b')], &[2], 0).unwrap();
    assert_eq!(find_accepting_path(&automaton), None);
}

#[test]
fn test_witness_is_accepted() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let mut rng = StdRng::seed_from_u64(21);
    for _ in 0..100 {
        let automaton = crate::random::random_automaton(&mut rng, 3, 10, "ab", 0.15, 0.3);
        if let Some(word) = find_accepting_path(&automaton) {
            assert!(automaton.accepts(&word));
        } else {
            assert!(!automaton.accepts(&[]));
        }
    }
}

#[test]
fn test_are_equal_reflexive() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let mut rng = StdRng::seed_from_u64(22);
    for _ in 0..30 {
        let automaton = crate::random::random_automaton(&mut rng, 3, 8, "ab", 0.15, 0.3);
        assert!(are_equal(&automaton, &automaton).unwrap());
    }
}

#[test]
fn test_are_equal_symmetric() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..30 {
        let a = crate::random::random_automaton(&mut rng, 3, 8, "ab", 0.15, 0.3);
        let b = crate::random::random_automaton(&mut rng, 3, 8, "ab", 0.15, 0.3);
        assert_eq!(are_equal(&a, &b).unwrap(), are_equal(&b, &a).unwrap());
    }
}

#[test]
fn test_are_equal_across_representations() {
    // A nondeterministic automaton and its canonical DFA describe the same
    // language.
    let automaton = Automaton::with_parts(
        4,
        "ab",
        &[(0, 1, 'a'), (0, 2, 'a'), (1, 3, 'b'), (2, 3, 'b'), (3, 3, 'a')],
        &[3],
        0,
    )
    .unwrap();
    let canonical = crate::transform::canonical_dfa(&automaton).unwrap();
    assert!(are_equal(&automaton, &canonical).unwrap());
}

#[test]
fn test_are_equal_distinguishes_disjoint_languages() {
    // {"a"} and {"b"}: disjoint, nonempty, same alphabet.
    let only_a = Automaton::with_parts(2, "ab", &[(0, 1, 'a')], &[1], 0).unwrap();
    let only_b = Automaton::with_parts(2, "ab", &[(0, 1, 'b')], &[1], 0).unwrap();
    assert!(!are_equal(&only_a, &only_b).unwrap());

    // The witness must be a genuine member of one language and not the
    // other, checked by replaying it through both automata.
    let witness = difference_witness(&only_a, &only_b).unwrap().unwrap();
    assert!(!witness.is_empty());
    assert!(only_a.accepts(&witness));
    assert!(!only_b.accepts(&witness));

    let witness = difference_witness(&only_b, &only_a).unwrap().unwrap();
    assert!(only_b.accepts(&witness));
    assert!(!only_a.accepts(&witness));
}

#[test]
fn test_are_equal_detects_proper_subset() {
    // (ab)* versus (ab)* | a(ba)*: the second language is strictly larger.
    let pairs = Automaton::with_parts(2, "ab", &[(0, 1, 'a'), (1, 0, 'b')], &[0], 0).unwrap();
    let pairs_or_odd =
        Automaton::with_parts(2, "ab", &[(0, 1, 'a'), (1, 0, 'b')], &[0, 1], 0).unwrap();

    assert!(!are_equal(&pairs, &pairs_or_odd).unwrap());
    assert_eq!(difference_witness(&pairs, &pairs_or_odd).unwrap(), None);

    let witness = difference_witness(&pairs_or_odd, &pairs).unwrap().unwrap();
    assert!(pairs_or_odd.accepts(&witness));
    assert!(!pairs.accepts(&witness));
}
