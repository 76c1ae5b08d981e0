use std::io::{self, Read};
use std::process::ExitCode;

use fsm_canon::automaton::{Automaton, AutomatonError};
use fsm_canon::parse::parse_automaton;
use fsm_canon::transform::{
    canonical_complement, canonical_dfa, complete, determinize, minimize, prune,
};

fn transform(mode: &str, automaton: &Automaton) -> Option<Result<Automaton, AutomatonError>> {
    match mode {
        "prune" => Some(prune(automaton)),
        "determinize" => Some(determinize(automaton)),
        "complete" => Some(complete(automaton)),
        "minimize" => Some(minimize(automaton)),
        "canonical" => Some(canonical_dfa(automaton)),
        "complement" => Some(canonical_complement(automaton)),
        _ => None,
    }
}

fn main() -> ExitCode {
    let mode = std::env::args().nth(1).unwrap_or_else(|| "canonical".to_string());

    let mut input = String::new();
    if let Err(error) = io::stdin().read_to_string(&mut input) {
        eprintln!("failed to read stdin: {}", error);
        return ExitCode::FAILURE;
    }
    let automaton = match parse_automaton(&input) {
        Ok(automaton) => automaton,
        Err(error) => {
            eprintln!("{}", error);
            return ExitCode::FAILURE;
        }
    };

    let Some(result) = transform(&mode, &automaton) else {
        eprintln!(
            "unknown transformation {:?}; expected one of \
             prune, determinize, complete, minimize, canonical, complement",
            mode
        );
        return ExitCode::FAILURE;
    };
    match result {
        Ok(transformed) => {
            print!("{}", transformed);
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}
