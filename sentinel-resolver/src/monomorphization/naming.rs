use smallvec::SmallVec;
use ir::symbols::table::SymbolTable;
use ir::symbols::SymbolId;

/// Name of a parameterised type or function, e.g. `Dict of (String, Integer)`.
pub fn parameterised_name(table: &SymbolTable, generic: SymbolId, arguments: &[SymbolId]) -> String {
    let names: SmallVec<[&str; 4]> = arguments.iter().map(|a| table.name(*a)).collect();
    format!("{} of ({})", table.name(generic), names.join(", "))
}
