pub mod normalizer;
pub mod prompt;
pub mod upstream;
