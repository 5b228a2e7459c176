use lazy_static::lazy_static;
use tracing::trace;
use ir::errors::error::ErrorClassification;
use ir::ir_hasher::HashMap;
use ir::span::SourceSpan;
use ir::symbols::builtins::{is_mutating_operator, ANY, ANY_RECORD, BOOLEAN, INTEGER, STRING, VOID};
use ir::symbols::search::{MethodSearch, EXACT_MATCH};
use ir::symbols::table::SymbolTable;
use ir::symbols::{AccessedOperator, Genus, SymbolDetail, SymbolId};
use crate::context::ResolverCtx;

// What an operator used on a bare type parameter is assumed to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConceptualReturn {
    Boolean,
    Integer,
    String,
    Same,
    Nothing,
}

lazy_static! {
    static ref CONCEPTUAL_OPERATORS: HashMap<&'static str, ConceptualReturn> = {
        let mut operators = HashMap::default();
        for name in ["<", "<=", ">", ">=", "==", "<>", "?", "and", "or", "xor", "contains"] {
            operators.insert(name, ConceptualReturn::Boolean);
        }
        for name in ["<=>", "#?", "length"] {
            operators.insert(name, ConceptualReturn::Integer);
        }
        for name in ["$", "$$"] {
            operators.insert(name, ConceptualReturn::String);
        }
        for name in ["+", "-", "*", "/", "~", "abs", "#<", "#>"] {
            operators.insert(name, ConceptualReturn::Same);
        }
        for name in ["++", "--", "+=", "-=", "*=", "/=", "|", ":=:", ":~:", ":^:", ":=?"] {
            operators.insert(name, ConceptualReturn::Nothing);
        }
        operators
    };
}

/// Operations still allowed when an enumeration type itself is the operand.
const ENUMERATION_ITERATION: [&str; 3] = ["iterator", "hasNext", "next"];

/// Where the operand came from; `this` inside a pure constructor may still be mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandOrigin {
    This,
    Super,
    Other,
}

#[derive(Debug, Clone)]
pub struct CheckOperatorData<'a> {
    pub operand_type: SymbolId,
    /// The operand names a type rather than holding a value of it.
    pub operand_is_type: bool,
    pub origin: OperandOrigin,
    pub search: MethodSearch,
    pub span: &'a SourceSpan,
}

impl<'a> CheckOperatorData<'a> {
    pub fn new(operand_type: SymbolId, search: MethodSearch, span: &'a SourceSpan) -> Self {
        CheckOperatorData { operand_type, operand_is_type: false, origin: OperandOrigin::Other, search, span }
    }

    pub fn with_origin(mut self, origin: OperandOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn naming_type(mut self, operand_is_type: bool) -> Self {
        self.operand_is_type = operand_is_type;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedOperator {
    /// `None` for intrinsic and type parameter operators.
    pub method: Option<SymbolId>,
    pub returning: SymbolId,
    pub weight: u32,
}

enum OperatorLookup {
    Intrinsic(SymbolId),
    Conceptual,
    Found { method: SymbolId, weight: u32, returning: SymbolId, owner: SymbolId, pure: bool },
    Failed(ErrorClassification, String),
}

impl ResolverCtx<'_> {
    pub fn operator_or_error(&mut self, data: &CheckOperatorData) -> Option<ResolvedOperator> {
        let program = self.program;
        let lookup = {
            let table = program.read();
            lookup_operator(&table, data)
        };

        match lookup {
            OperatorLookup::Intrinsic(returning) => {
                Some(ResolvedOperator { method: None, returning, weight: EXACT_MATCH })
            }
            OperatorLookup::Conceptual => self.conceptual_operator(data),
            OperatorLookup::Found { method, weight, returning, owner, pure } => {
                self.accessible_or_error(data.span, method, owner);
                if !pure {
                    self.mutation_allowed_or_error(data);
                }
                Some(ResolvedOperator { method: Some(method), returning, weight })
            }
            OperatorLookup::Failed(classification, message) => {
                self.error(data.span, message, classification);
                None
            }
        }
    }

    // Operators on a type parameter are taken on trust and remembered, so every later
    // parameterisation can be checked for them.
    fn conceptual_operator(&mut self, data: &CheckOperatorData) -> Option<ResolvedOperator> {
        let name = data.search.name.as_str();
        let Some(kind) = CONCEPTUAL_OPERATORS.get(name).copied() else {
            let parameter = self.name_of(data.operand_type);
            self.error(
                data.span,
                format!("'{name}' cannot be assumed of type parameter '{parameter}'"),
                ErrorClassification::OperatorNotDefined,
            );
            return None;
        };

        {
            let mut table = self.program.write();
            let accessed = AccessedOperator { name: name.to_string(), arguments: data.search.parameters.clone() };
            if let SymbolDetail::TypeParameter(detail) = &mut table.symbol_mut(data.operand_type).detail {
                if !detail.accessed_operators.contains(&accessed) {
                    trace!(operator = name, parameter = %data.operand_type, "recorded conceptual operator");
                    detail.accessed_operators.push(accessed);
                }
            }
        }

        if is_mutating_operator(name) {
            self.mutation_allowed_or_error(data);
        }
        let returning = match kind {
            ConceptualReturn::Boolean => BOOLEAN,
            ConceptualReturn::Integer => INTEGER,
            ConceptualReturn::String => STRING,
            ConceptualReturn::Same => data.operand_type,
            ConceptualReturn::Nothing => VOID,
        };
        Some(ResolvedOperator { method: None, returning, weight: EXACT_MATCH })
    }

    fn mutation_allowed_or_error(&mut self, data: &CheckOperatorData) {
        if !self.scopes.is_pure() {
            return;
        }
        if self.scopes.in_constructor() && data.origin == OperandOrigin::This {
            return;
        }
        let described = self.program.read().describe(&data.search).to_string();
        self.error(data.span, format!("'{described}'"), ErrorClassification::NoMutationInPureContext);
    }
}

fn lookup_operator(table: &SymbolTable, data: &CheckOperatorData) -> OperatorLookup {
    let name = data.search.name.as_str();
    let ty = data.operand_type;
    let type_symbol = table.symbol(ty);

    if data.operand_is_type && type_symbol.genus == Genus::ClassEnumeration && !ENUMERATION_ITERATION.contains(&name) {
        return OperatorLookup::Failed(
            ErrorClassification::OperatorCannotBeUsedOnEnumeration,
            format!("'{}' on '{}'", name, type_symbol.name),
        );
    }
    if name == "?" && (ty == ANY || ty == ANY_RECORD || type_symbol.as_function().is_some()) {
        return OperatorLookup::Intrinsic(BOOLEAN);
    }

    match &type_symbol.detail {
        SymbolDetail::TypeParameter(_) => return OperatorLookup::Conceptual,
        SymbolDetail::Aggregate(_) => {}
        _ => {
            return OperatorLookup::Failed(
                ErrorClassification::OperatorNotDefined,
                format!("'{}' on '{}'", table.describe(&data.search), type_symbol.name),
            );
        }
    }

    let result = table.resolve_matching_methods(ty, &data.search);
    if let Some(method) = result.single_best_match() {
        let weight = result.matches().first().map(|m| m.weight).unwrap_or(EXACT_MATCH);
        let symbol = table.symbol(method);
        return OperatorLookup::Found {
            method,
            weight,
            returning: table.return_type(method),
            owner: symbol.as_method().map(|m| m.owner).unwrap_or(ty),
            pure: symbol.is_pure(),
        };
    }
    if result.is_ambiguous() {
        let candidates: Vec<String> = result.best_matches().iter().map(|m| table.friendly_name(*m)).collect();
        return OperatorLookup::Failed(
            ErrorClassification::MethodAmbiguous,
            format!("'{}' on '{}' could be {}", table.describe(&data.search), type_symbol.name, candidates.join(" or ")),
        );
    }
    OperatorLookup::Failed(
        ErrorClassification::OperatorNotDefined,
        format!("'{}' on '{}'", table.describe(&data.search), type_symbol.name),
    )
}
