//! Finale round: assembly and validation of the final secret.

pub mod assembler;

pub use assembler::FragmentAssembler;
