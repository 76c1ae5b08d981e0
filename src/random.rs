use rand::Rng;

use crate::automaton::Automaton;

/// Generates a random automaton for property tests. The caller injects the
/// random source, so a seeded `StdRng` makes a run reproducible. Edge and
/// acceptance probabilities are per (from, to, symbol) triple and per state
/// respectively.
pub fn random_automaton<R: Rng + ?Sized>(
    rng: &mut R,
    min_states: usize,
    max_states: usize,
    alphabet: &str,
    edge_probability: f64,
    accept_probability: f64,
) -> Automaton {
    let state_count = rng.gen_range(min_states..=max_states);
    let mut automaton =
        Automaton::new(state_count, alphabet, 0).expect("generator parameters must be valid");

    let symbols: Vec<char> = alphabet.chars().collect();
    for from in 0..state_count {
        for to in 0..state_count {
            for &symbol in &symbols {
                if rng.gen_bool(edge_probability) {
                    automaton
                        .add_edge(from, to, symbol)
                        .expect("generated edge is in range");
                }
            }
        }
    }
    for state in 0..state_count {
        if rng.gen_bool(accept_probability) {
            automaton
                .add_accepting(state)
                .expect("generated state is in range");
        }
    }
    automaton
}

#[test]
fn test_same_seed_same_automaton() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let mut first = StdRng::seed_from_u64(99);
    let mut second = StdRng::seed_from_u64(99);
    assert_eq!(
        random_automaton(&mut first, 3, 10, "ab", 0.2, 0.3),
        random_automaton(&mut second, 3, 10, "ab", 0.2, 0.3)
    );
}
