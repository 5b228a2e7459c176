use ir::ir_hasher::HashMap;
use ir::symbols::table::SymbolTable;
use ir::symbols::SymbolId;
use super::parameteriser::parameterise;

/// Maps type parameters (and the generic itself) to what replaces them in one parameterisation.
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    replacements: HashMap<SymbolId, SymbolId>,
}

impl Substitution {
    pub fn new(parameters: &[SymbolId], arguments: &[SymbolId]) -> Self {
        let replacements = parameters.iter().copied().zip(arguments.iter().copied()).collect();
        Substitution { replacements }
    }

    pub fn with(mut self, from: SymbolId, to: SymbolId) -> Self {
        self.replacements.insert(from, to);
        self
    }

    pub fn get(&self, ty: SymbolId) -> Option<SymbolId> {
        self.replacements.get(&ty).copied()
    }
}

/// Substitute type parameters with concrete types, parameterising any generic type built
/// from them on the way.
pub fn substitute_type(table: &mut SymbolTable, ty: SymbolId, substitution: &Substitution) -> SymbolId {
    if let Some(replacement) = substitution.get(ty) {
        return replacement;
    }
    let Some(origin) = table.origin_of(ty).cloned() else {
        return ty;
    };
    let arguments: Vec<SymbolId> = origin.arguments.iter()
        .map(|argument| substitute_type(table, *argument, substitution))
        .collect();
    if arguments == origin.arguments {
        return ty;
    }
    parameterise(table, origin.generic, &arguments).id
}
