use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use mstar::aligner::scoring::{Pam250, UnitCost};
use mstar::aligner::MstarAligner;
use mstar::alphabet::Alphabet;

const PROTEIN: &[u8] = b"ACDEFGHIKLMNPQRSTVWY";
const DNA: &[u8] = b"ACGT";

fn random_sequence(rng: &mut ChaCha8Rng, symbols: &[u8], max_len: usize) -> Vec<u8> {
    let len = rng.gen_range(0..=max_len);
    (0..len).map(|_| *symbols.choose(rng).unwrap()).collect()
}

fn random_instance(rng: &mut ChaCha8Rng, symbols: &[u8]) -> Vec<Vec<u8>> {
    let k = rng.gen_range(2..=3);
    (0..k).map(|_| random_sequence(rng, symbols, 6)).collect()
}

fn strip_gaps(row: &str) -> Vec<u8> {
    row.bytes().filter(|&b| b != b'-').collect()
}

#[test]
fn astar_matches_brute_on_random_protein_instances() {
    let mut rng = ChaCha8Rng::seed_from_u64(31415);
    let alphabet = Alphabet::protein();

    for round in 0..25 {
        let sequences = random_instance(&mut rng, PROTEIN);
        let gap_penalty = rng.gen_range(1..=8);

        let aligner = MstarAligner::new(Pam250, gap_penalty, &alphabet, &sequences).unwrap();
        let guided = aligner.align();
        let brute = aligner.align_brute();

        assert_eq!(
            guided.cost(),
            brute.cost(),
            "round {round}: heuristic-guided and uniform-cost searches disagree on {sequences:?}"
        );

        let width = guided.len();
        for (row, input) in guided.rows().iter().zip(&sequences) {
            assert_eq!(row.len(), width);
            assert_eq!(&strip_gaps(row), input);
        }
    }
}

#[test]
fn astar_matches_brute_on_random_dna_instances() {
    let mut rng = ChaCha8Rng::seed_from_u64(2718);
    let alphabet = Alphabet::dna();

    for _ in 0..25 {
        let sequences = random_instance(&mut rng, DNA);
        let gap_penalty = rng.gen_range(1..=4);

        let aligner = MstarAligner::new(UnitCost, gap_penalty, &alphabet, &sequences).unwrap();
        assert_eq!(aligner.align().cost(), aligner.align_brute().cost(), "{sequences:?}");
    }
}

#[test]
fn permuting_the_inputs_preserves_the_cost() {
    let mut rng = ChaCha8Rng::seed_from_u64(161803);
    let alphabet = Alphabet::dna();

    for _ in 0..15 {
        let mut sequences = random_instance(&mut rng, DNA);
        let aligner = MstarAligner::new(UnitCost, 2, &alphabet, &sequences).unwrap();
        let cost = aligner.align().cost();

        sequences.rotate_left(1);
        let permuted = MstarAligner::new(UnitCost, 2, &alphabet, &sequences).unwrap();

        assert_eq!(permuted.align().cost(), cost);
    }
}

#[test]
fn increasing_the_gap_penalty_never_lowers_the_cost() {
    let mut rng = ChaCha8Rng::seed_from_u64(577215);
    let alphabet = Alphabet::protein();

    for _ in 0..10 {
        let sequences = random_instance(&mut rng, PROTEIN);

        let mut previous = None;
        for gap_penalty in [1, 2, 4, 8, 16] {
            let aligner = MstarAligner::new(Pam250, gap_penalty, &alphabet, &sequences).unwrap();
            let cost = aligner.align().cost();

            if let Some(previous) = previous {
                assert!(cost >= previous, "{sequences:?}: cost dropped from {previous} to {cost}");
            }
            previous = Some(cost);
        }
    }
}

#[test]
fn rows_stripped_of_gaps_reproduce_the_inputs() {
    let alphabet = Alphabet::protein();
    let sequences = ["ACGH", "CFG", "EAC"];
    let aligner = MstarAligner::new(Pam250, 4, &alphabet, sequences).unwrap();

    for alignment in [aligner.align(), aligner.align_brute()] {
        for (row, input) in alignment.rows().iter().zip(sequences) {
            assert_eq!(strip_gaps(row), input.as_bytes());
        }
    }
}
