pub mod common_type;
pub mod context;
pub mod expressions;
pub mod file_resolver;
pub mod monomorphization;
pub mod operators;
pub mod pipeline;
pub mod rules;
pub mod statements;
pub mod switches;

pub use context::ResolverCtx;
pub use file_resolver::{resolve_file, FileResolver};
pub use rules::rule::DeclarationRule;
pub use rules::synthesise_delegations;
