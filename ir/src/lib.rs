pub mod ast;
pub mod context;
pub mod errors;
pub mod ir_hasher;
pub mod scopes;
pub mod span;
pub mod symbols;
