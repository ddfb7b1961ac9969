pub mod aligner;
pub mod alphabet;
pub mod errors;
pub mod lattice;
