use std::collections::{HashMap, VecDeque};

use log::{debug, trace};

use crate::automaton::{Automaton, AutomatonError, StateId};

/// Widest original automaton the subset construction can encode: one bit
/// per state in a `StateSet` word.
pub const MAX_SUBSET_STATES: usize = 64;

/// A set of original-automaton states, packed into one machine word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct StateSet(u64);

impl StateSet {
    const EMPTY: StateSet = StateSet(0);

    fn singleton(state: StateId) -> StateSet {
        StateSet(1u64 << state)
    }

    fn insert(&mut self, state: StateId) {
        self.0 |= 1u64 << state;
    }

    fn contains(self, state: StateId) -> bool {
        (self.0 >> state) & 1 == 1
    }

    fn intersects(self, other: StateSet) -> bool {
        self.0 & other.0 != 0
    }
}

/// Drops every state unreachable from the start state and renumbers the
/// rest to `0..reachable` in first-visited order. Pure and idempotent.
pub fn prune(automaton: &Automaton) -> Result<Automaton, AutomatonError> {
    fn visit(
        automaton: &Automaton,
        state: StateId,
        visit_order: &mut Vec<StateId>,
        new_ids: &mut HashMap<StateId, StateId>,
    ) {
        new_ids.insert(state, visit_order.len());
        visit_order.push(state);
        for edge in automaton.edges_from(state) {
            if !new_ids.contains_key(&edge.to) {
                visit(automaton, edge.to, visit_order, new_ids);
            }
        }
    }

    let mut visit_order: Vec<StateId> = Vec::new();
    let mut new_ids: HashMap<StateId, StateId> = HashMap::new();
    visit(automaton, automaton.start(), &mut visit_order, &mut new_ids);
    trace!(
        "prune: {} of {} states reachable",
        visit_order.len(),
        automaton.state_count()
    );

    let mut pruned = Automaton::new(
        visit_order.len(),
        &automaton.alphabet_string(),
        new_ids[&automaton.start()],
    )?;
    for &old_from in &visit_order {
        for edge in automaton.edges_from(old_from) {
            pruned.add_edge(new_ids[&old_from], new_ids[&edge.to], edge.symbol)?;
        }
    }
    for state in 0..automaton.state_count() {
        if automaton.is_accepting(state) {
            if let Some(&new_id) = new_ids.get(&state) {
                pruned.add_accepting(new_id)?;
            }
        }
    }
    Ok(pruned)
}

/// Subset construction. The result is deterministic and accepts the same
/// language under nondeterministic semantics; it is already pruned to the
/// reachable subset-states. Transitions into the empty set are recorded
/// explicitly, so the result is total as well.
pub fn determinize(automaton: &Automaton) -> Result<Automaton, AutomatonError> {
    if automaton.state_count() > MAX_SUBSET_STATES {
        return Err(AutomatonError::TooManyStates {
            state_count: automaton.state_count(),
            limit: MAX_SUBSET_STATES,
        });
    }

    let mut accepting_mask = StateSet::EMPTY;
    for &state in automaton.accepting_states() {
        accepting_mask.insert(state);
    }

    // The power set is the conceptual state space; subsets get dense
    // indices in discovery order instead of materializing all 2^n slots.
    let start_set = StateSet::singleton(automaton.start());
    let mut subset_ids: HashMap<StateSet, StateId> = HashMap::new();
    let mut subsets: Vec<StateSet> = Vec::new();
    let mut queue: VecDeque<StateSet> = VecDeque::new();
    subset_ids.insert(start_set, 0);
    subsets.push(start_set);
    queue.push_back(start_set);

    let mut edges: Vec<(StateId, StateId, char)> = Vec::new();
    while let Some(current) = queue.pop_front() {
        let from_id = subset_ids[&current];
        for &symbol in automaton.alphabet() {
            let mut target = StateSet::EMPTY;
            for state in 0..automaton.state_count() {
                if !current.contains(state) {
                    continue;
                }
                for edge in automaton.edges_from(state) {
                    if edge.symbol == symbol {
                        target.insert(edge.to);
                    }
                }
            }

            let to_id = match subset_ids.get(&target) {
                Some(&id) => id,
                None => {
                    let id = subsets.len();
                    subset_ids.insert(target, id);
                    subsets.push(target);
                    queue.push_back(target);
                    id
                }
            };
            // The empty set is a real (dead) state, not a missing edge.
            edges.push((from_id, to_id, symbol));
        }
    }
    debug!(
        "determinize: {} states expanded to {} subset states",
        automaton.state_count(),
        subsets.len()
    );

    let mut determinized = Automaton::new(subsets.len(), &automaton.alphabet_string(), 0)?;
    for (from, to, symbol) in edges {
        determinized.add_edge(from, to, symbol)?;
    }
    for (id, subset) in subsets.iter().enumerate() {
        if subset.intersects(accepting_mask) {
            determinized.add_accepting(id)?;
        }
    }
    prune(&determinized)
}

/// Adds a sink state and redirects every missing transition to it, making
/// a deterministic automaton total. If the input was already complete the
/// sink stays unreachable and pruning removes it again.
pub fn complete(automaton: &Automaton) -> Result<Automaton, AutomatonError> {
    let alphabet: Vec<char> = automaton.alphabet().to_vec();
    let sink = automaton.state_count();
    let mut completed = Automaton::new(sink + 1, &automaton.alphabet_string(), automaton.start())?;

    for from in 0..automaton.state_count() {
        for edge in automaton.edges_from(from) {
            completed.add_edge(from, edge.to, edge.symbol)?;
        }
    }
    for state in 0..automaton.state_count() {
        if automaton.is_accepting(state) {
            completed.add_accepting(state)?;
        }
    }

    // The sink fills its own slots too, so it ends up absorbing.
    for from in 0..completed.state_count() {
        for &symbol in &alphabet {
            if completed.step(from, symbol)?.is_none() {
                completed.add_edge(from, sink, symbol)?;
            }
        }
    }
    prune(&completed)
}

/// Moore partition refinement over a complete deterministic automaton.
/// States start partitioned by acceptance; each round re-partitions by the
/// signature (own class, class of each per-symbol destination) until the
/// class count stops growing. The class count can only grow from round to
/// round, so `2 * state_count` rounds is always enough.
pub fn minimize(automaton: &Automaton) -> Result<Automaton, AutomatonError> {
    let state_count = automaton.state_count();
    let alphabet: Vec<char> = automaton.alphabet().to_vec();

    let mut class_of: Vec<usize> = (0..state_count)
        .map(|state| usize::from(automaton.is_accepting(state)))
        .collect();

    let mut previous_count = 0;
    for round in 0..2 * state_count {
        let mut class_by_signature: HashMap<Vec<usize>, usize> = HashMap::new();
        let mut next: Vec<usize> = vec![0; state_count];

        for state in 0..state_count {
            let mut signature = Vec::with_capacity(alphabet.len() + 1);
            signature.push(class_of[state]);
            for &symbol in &alphabet {
                let target = automaton
                    .step(state, symbol)?
                    .ok_or(AutomatonError::MissingTransition { state, symbol })?;
                signature.push(class_of[target]);
            }
            // New classes are numbered in first-encountered order.
            let fresh = class_by_signature.len();
            next[state] = *class_by_signature.entry(signature).or_insert(fresh);
        }

        let count = class_by_signature.len();
        trace!("minimize: round {} has {} classes", round, count);
        class_of = next;
        if count == previous_count {
            // Refinement only ever splits classes; a stable count means a
            // stable partition.
            break;
        }
        previous_count = count;
    }

    let class_count = class_of.iter().max().map_or(0, |&largest| largest + 1);
    debug!(
        "minimize: {} states collapsed to {} classes",
        state_count, class_count
    );

    let mut minimal = Automaton::new(
        class_count,
        &automaton.alphabet_string(),
        class_of[automaton.start()],
    )?;
    for from in 0..state_count {
        for edge in automaton.edges_from(from) {
            minimal.add_edge(class_of[from], class_of[edge.to], edge.symbol)?;
        }
    }
    for state in 0..state_count {
        if automaton.is_accepting(state) {
            minimal.add_accepting(class_of[state])?;
        }
    }
    Ok(minimal)
}

/// The full canonicalization pipeline: determinize, complete, minimize.
pub fn canonical_dfa(automaton: &Automaton) -> Result<Automaton, AutomatonError> {
    minimize(&complete(&determinize(automaton)?)?)
}

/// Canonical automaton for the complement language: acceptance is
/// inverted once the automaton is deterministic and complete, then the
/// result is minimized.
pub fn canonical_complement(automaton: &Automaton) -> Result<Automaton, AutomatonError> {
    let mut full = complete(&determinize(automaton)?)?;
    full.invert();
    minimize(&full)
}

#[cfg(test)]
pub(crate) fn all_words(alphabet: &[char], max_len: usize) -> Vec<Vec<char>> {
    let mut words: Vec<Vec<char>> = vec![Vec::new()];
    let mut frontier: Vec<Vec<char>> = vec![Vec::new()];
    for _ in 0..max_len {
        frontier = frontier
            .iter()
            .flat_map(|word| {
                alphabet.iter().map(|&symbol| {
                    let mut longer = word.clone();
                    longer.push(symbol);
                    longer
                })
            })
            .collect();
        words.extend(frontier.iter().cloned());
    }
    words
}

/// The 9-state machine counting (a's minus b's) mod 3; its minimal DFA has
/// exactly 3 states.
#[cfg(test)]
pub(crate) fn mod3_automaton() -> Automaton {
    Automaton::with_parts(
        9,
        "ab",
        &[
            (0, 1, 'a'),
            (0, 3, 'b'),
            (1, 2, 'a'),
            (1, 4, 'b'),
            (2, 0, 'a'),
            (2, 5, 'b'),
            (3, 4, 'a'),
            (3, 6, 'b'),
            (4, 5, 'a'),
            (4, 7, 'b'),
            (5, 3, 'a'),
            (5, 8, 'b'),
            (6, 7, 'a'),
            (6, 0, 'b'),
            (7, 8, 'a'),
            (7, 1, 'b'),
            (8, 6, 'a'),
            (8, 2, 'b'),
        ],
        &[0, 4, 8],
        0,
    )
    .unwrap()
}

#[test]
fn test_prune_removes_unreachable() {
    // State 2 has an edge into the reachable part but no way in from 0.
    let automaton = Automaton::with_parts(
        4,
        "ab",
        &[(0, 1, 'a'), (1, 1, 'b'), (2, 0, 'a')],
        &[1],
        0,
    )
    .unwrap();
    let pruned = prune(&automaton).unwrap();
    assert_eq!(pruned.state_count(), 2);
    assert_eq!(pruned.accepting_states().len(), 1);
    assert_eq!(pruned.start(), 0);
}

#[test]
fn test_prune_is_idempotent() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..100 {
        let automaton = crate::random::random_automaton(&mut rng, 3, 10, "ab", 0.1, 0.3);
        let once = prune(&automaton).unwrap();
        let twice = prune(&once).unwrap();
        assert_eq!(once, twice);
    }
}

#[test]
fn test_determinize_is_deterministic() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let mut rng = StdRng::seed_from_u64(12);
    for _ in 0..200 {
        let automaton = crate::random::random_automaton(&mut rng, 3, 10, "ab", 0.1, 0.3);
        let determinized = determinize(&automaton).unwrap();
        assert!(determinized.is_deterministic());
    }
}

#[test]
fn test_determinize_preserves_language() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let mut rng = StdRng::seed_from_u64(13);
    let words = all_words(&['a', 'b'], 6);
    for _ in 0..50 {
        let automaton = crate::random::random_automaton(&mut rng, 3, 8, "ab", 0.15, 0.3);
        let determinized = determinize(&automaton).unwrap();
        for word in &words {
            assert_eq!(automaton.accepts(word), determinized.accepts(word));
        }
    }
}

#[test]
fn test_determinize_records_dead_state() {
    // 'b' leads nowhere, so the subset construction must route it to an
    // explicit absorbing dead state.
    let automaton = Automaton::with_parts(2, "ab", &[(0, 1, 'a')], &[1], 0).unwrap();
    let determinized = determinize(&automaton).unwrap();
    assert!(determinized.is_deterministic());
    assert!(determinized.is_complete());

    let dead = determinized.step(determinized.start(), 'b').unwrap().unwrap();
    assert_eq!(determinized.step(dead, 'a').unwrap(), Some(dead));
    assert_eq!(determinized.step(dead, 'b').unwrap(), Some(dead));
    assert!(!determinized.is_accepting(dead));
}

#[test]
fn test_determinize_rejects_oversized_input() {
    let automaton = Automaton::new(MAX_SUBSET_STATES + 1, "a", 0).unwrap();
    assert_eq!(
        determinize(&automaton).unwrap_err(),
        AutomatonError::TooManyStates {
            state_count: MAX_SUBSET_STATES + 1,
            limit: MAX_SUBSET_STATES
        }
    );
}

#[test]
fn test_complete_makes_total() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let mut rng = StdRng::seed_from_u64(14);
    let words = all_words(&['a', 'b'], 5);
    for _ in 0..100 {
        let automaton = crate::random::random_automaton(&mut rng, 3, 10, "ab", 0.1, 0.3);
        let determinized = determinize(&automaton).unwrap();
        let completed = complete(&determinized).unwrap();
        assert!(completed.is_deterministic());
        assert!(completed.is_complete());
        for word in &words {
            assert_eq!(determinized.accepts(word), completed.accepts(word));
        }
    }
}

#[test]
fn test_complete_on_partial_input() {
    let automaton = Automaton::with_parts(2, "ab", &[(0, 1, 'a')], &[1], 0).unwrap();
    let completed = complete(&automaton).unwrap();
    assert!(completed.is_complete());
    assert_eq!(completed.state_count(), 3);
    assert!(completed.accepts(&['a']));
    assert!(!completed.accepts(&['b']));
}

#[test]
fn test_complete_is_noop_when_already_complete() {
    let automaton = Automaton::with_parts(
        2,
        "ab",
        &[(0, 1, 'a'), (0, 0, 'b'), (1, 0, 'a'), (1, 1, 'b')],
        &[1],
        0,
    )
    .unwrap();
    let completed = complete(&automaton).unwrap();
    assert_eq!(completed.state_count(), 2);
}

#[test]
fn test_complete_rejects_nondeterministic_input() {
    let automaton =
        Automaton::with_parts(2, "a", &[(0, 0, 'a'), (0, 1, 'a')], &[1], 0).unwrap();
    assert_eq!(
        complete(&automaton).unwrap_err(),
        AutomatonError::NotDeterministic {
            state: 0,
            symbol: 'a'
        }
    );
}

#[test]
fn test_minimize_mod3_regression() {
    let minimal = canonical_dfa(&mod3_automaton()).unwrap();
    assert_eq!(minimal.state_count(), 3);
    assert_eq!(minimal.accepting_states().len(), 1);
    assert!(minimal.is_deterministic());
    assert!(minimal.is_complete());
}

#[test]
fn test_minimize_reaches_fixed_point() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let mut rng = StdRng::seed_from_u64(15);
    for _ in 0..100 {
        let automaton = crate::random::random_automaton(&mut rng, 3, 10, "ab", 0.1, 0.3);
        let minimal = canonical_dfa(&automaton).unwrap();
        assert!(minimal.is_deterministic());
        assert!(minimal.is_complete());

        let again = minimize(&minimal).unwrap();
        assert_eq!(again.state_count(), minimal.state_count());

        // No two distinct states may share a (acceptance, destinations)
        // signature.
        let signatures: Vec<(bool, Vec<StateId>)> = (0..minimal.state_count())
            .map(|state| {
                let destinations = minimal
                    .alphabet()
                    .iter()
                    .map(|&symbol| minimal.step(state, symbol).unwrap().unwrap())
                    .collect();
                (minimal.is_accepting(state), destinations)
            })
            .collect();
        for left in 0..signatures.len() {
            for right in left + 1..signatures.len() {
                assert_ne!(signatures[left], signatures[right]);
            }
        }
    }
}

#[test]
fn test_minimize_preserves_language() {
    let automaton = mod3_automaton();
    let minimal = canonical_dfa(&automaton).unwrap();
    for word in all_words(&['a', 'b'], 7) {
        assert_eq!(automaton.accepts(&word), minimal.accepts(&word));
    }
}

#[test]
fn test_minimize_rejects_partial_automaton() {
    let automaton = Automaton::with_parts(2, "ab", &[(0, 1, 'a')], &[1], 0).unwrap();
    assert_eq!(
        minimize(&automaton).unwrap_err(),
        AutomatonError::MissingTransition {
            state: 0,
            symbol: 'b'
        }
    );
}

#[test]
fn test_canonical_complement_flips_membership() {
    let automaton = mod3_automaton();
    let complement = canonical_complement(&automaton).unwrap();
    assert!(complement.is_deterministic());
    assert!(complement.is_complete());
    for word in all_words(&['a', 'b'], 6) {
        assert_ne!(automaton.accepts(&word), complement.accepts(&word));
    }
}
