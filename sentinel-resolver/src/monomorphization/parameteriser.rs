use tracing::trace;
use ir::symbols::table::{parameterisation_key, SymbolTable};
use ir::symbols::{Parameterisation, SymbolDetail, SymbolId};
use super::naming::parameterised_name;
use super::type_substitution::{substitute_type, Substitution};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameterised {
    pub id: SymbolId,
    /// False when the intern table already held this parameterisation.
    pub created: bool,
}

/// Returns the single symbol for `generic` applied to `arguments`, creating it on first request.
///
/// The new symbol is interned before its members are copied, so members that mention the
/// parameterisation being built find it instead of recursing. Callers hold the table's write
/// guard for the whole call, which makes check-and-create one step.
pub fn parameterise(table: &mut SymbolTable, generic: SymbolId, arguments: &[SymbolId]) -> Parameterised {
    let key = parameterisation_key(generic, arguments);
    if let Some(existing) = table.interned(&key) {
        return Parameterised { id: existing, created: false };
    }

    let name = parameterised_name(table, generic, arguments);
    let source = table.symbol(generic).clone();
    let Some(parameters) = source.generic().map(|g| g.type_parameters.clone()) else {
        return Parameterised { id: generic, created: false };
    };

    let id = match &source.detail {
        SymbolDetail::Aggregate(_) => table.new_unregistered_aggregate(&name, source.genus, source.span.clone()),
        SymbolDetail::Function(_) => table.new_unregistered_function(&name, source.genus, source.span.clone()),
        _ => return Parameterised { id: generic, created: false },
    };
    {
        let symbol = table.symbol_mut(id);
        symbol.access = source.access;
        symbol.flags = source.flags;
    }
    table.set_origin(id, Parameterisation { generic, arguments: arguments.to_vec() });
    table.intern(key, id);
    trace!(generic = %generic, parameterised = %id, name = %name, "parameterised");

    let substitution = Substitution::new(&parameters, arguments).with(generic, id);
    match &source.detail {
        SymbolDetail::Aggregate(_) => populate_aggregate(table, generic, id, &substitution),
        SymbolDetail::Function(_) => populate_function(table, generic, id, &substitution),
        _ => {}
    }
    Parameterised { id, created: true }
}

fn populate_aggregate(table: &mut SymbolTable, generic: SymbolId, id: SymbolId, substitution: &Substitution) {
    let Some(detail) = table.symbol(generic).as_aggregate().cloned() else { return };

    if let Some(super_type) = detail.super_type {
        let super_type = substitute_type(table, super_type, substitution);
        table.set_super(id, super_type);
    }
    for trait_type in detail.traits {
        let trait_type = substitute_type(table, trait_type, substitution);
        table.add_trait(id, trait_type);
    }
    for property in detail.properties {
        let source = table.symbol(property).clone();
        let Some(ty) = source.ty() else { continue };
        let ty = substitute_type(table, ty, substitution);
        let copy = table.new_property(id, &source.name, ty, source.access, source.span.clone());
        table.symbol_mut(copy).flags = source.flags;
    }
    for method in detail.methods {
        copy_method(table, method, id, substitution);
    }
}

fn populate_function(table: &mut SymbolTable, generic: SymbolId, id: SymbolId, substitution: &Substitution) {
    let Some(detail) = table.symbol(generic).as_function().cloned() else { return };

    let parameters = copy_variables(table, &detail.parameters, substitution);
    let returning = copy_variables(table, detail.returning.as_slice(), substitution).into_iter().next();
    if let SymbolDetail::Function(target) = &mut table.symbol_mut(id).detail {
        target.parameters = parameters;
        target.returning = returning;
    }
    if let Some(super_function) = detail.super_function {
        let super_function = substitute_type(table, super_function, substitution);
        table.set_super_function(id, super_function);
    }
}

fn copy_method(table: &mut SymbolTable, method: SymbolId, owner: SymbolId, substitution: &Substitution) -> SymbolId {
    let source = table.symbol(method).clone();
    let Some(detail) = source.as_method() else { return method };

    let parameters = copy_variables(table, &detail.parameters, substitution);
    let returning = copy_variables(table, detail.returning.as_slice(), substitution).into_iter().next();
    let copy = table.new_method_from_parts(owner, &source.name, parameters, returning, source.span.clone());
    let symbol = table.symbol_mut(copy);
    symbol.access = source.access;
    symbol.flags = source.flags;
    copy
}

fn copy_variables(table: &mut SymbolTable, variables: &[SymbolId], substitution: &Substitution) -> Vec<SymbolId> {
    variables.iter()
        .map(|variable| {
            let source = table.symbol(*variable).clone();
            let ty = source.ty().map(|ty| substitute_type(table, ty, substitution));
            let copy = table.new_variable(&source.name, ty, source.span.clone());
            let symbol = table.symbol_mut(copy);
            symbol.flags = source.flags;
            symbol.initialisation = source.initialisation;
            copy
        })
        .collect()
}
