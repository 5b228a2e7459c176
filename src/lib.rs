pub mod compilation_passes;
pub mod config;
pub mod main_structs;

pub use compilation_passes::{compile, pass_assumed_operators, pass_full_resolution, pass_trait_delegation};
pub use config::{ResolverConfig, ThreadingMode};
pub use main_structs::{Compilation, CompilerError, FileOutcome};
