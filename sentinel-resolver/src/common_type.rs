//! Finds one type that a set of operand types can all be used as.
//!
//! Candidates are the operands themselves plus everything above them in the hierarchy. A
//! candidate is common when every operand reaches it through its own super types and traits;
//! the implicit `Any` root does not count. Among common candidates the one with the lowest
//! summed distance wins and ties go to the lowest symbol id, so the answer never depends on
//! operand order. When no hierarchy candidate exists, a built-in promotion is tried last.

use ir::errors::error::ErrorClassification;
use ir::ir_hasher::HashSet;
use ir::span::SourceSpan;
use ir::symbols::builtins::{ANY, ANY_RECORD};
use ir::symbols::search::PROMOTION;
use ir::symbols::table::SymbolTable;
use ir::symbols::SymbolId;
use crate::context::ResolverCtx;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommonType {
    Found(SymbolId),
    /// No common type; names the first pair of operands that share nothing.
    Unrelated { first: SymbolId, second: SymbolId },
}

pub fn common_type(table: &SymbolTable, types: &[SymbolId]) -> Option<CommonType> {
    let first = *types.first()?;
    if types.iter().all(|t| *t == first) {
        return Some(CommonType::Found(first));
    }

    if let Some(found) = cheapest_candidate(table, types, |from, to| hierarchy_distance(table, from, to)) {
        return Some(CommonType::Found(found));
    }
    if let Some(found) = cheapest_candidate(table, types, |from, to| promotion_distance(table, from, to)) {
        return Some(CommonType::Found(found));
    }

    let (first, second) = unrelated_pair(table, types);
    Some(CommonType::Unrelated { first, second })
}

fn cheapest_candidate(
    table: &SymbolTable,
    types: &[SymbolId],
    distance: impl Fn(SymbolId, SymbolId) -> Option<u32>,
) -> Option<SymbolId> {
    let mut candidates: Vec<SymbolId> = Vec::new();
    let mut seen = HashSet::default();
    for ty in types {
        for candidate in std::iter::once(*ty).chain(table.all_supertypes(*ty)) {
            if seen.insert(candidate) {
                candidates.push(candidate);
            }
        }
    }

    candidates.into_iter()
        .filter_map(|candidate| {
            let total: Option<u32> = types.iter().map(|ty| distance(*ty, candidate)).sum();
            total.map(|total| (total, candidate))
        })
        .min_by_key(|(total, candidate)| (*total, candidate.index()))
        .map(|(_, candidate)| candidate)
}

fn hierarchy_distance(table: &SymbolTable, from: SymbolId, to: SymbolId) -> Option<u32> {
    if from == to {
        return Some(0);
    }
    // The roots only take part when an operand names them.
    if to != ANY && to != ANY_RECORD && !table.all_supertypes(from).contains(&to) {
        return None;
    }
    table.uncoerced_weight(from, to)
}

fn promotion_distance(table: &SymbolTable, from: SymbolId, to: SymbolId) -> Option<u32> {
    if from == to {
        return Some(0);
    }
    let promoted = table.promotion_of(from)?;
    hierarchy_distance(table, promoted, to).map(|weight| weight + PROMOTION)
}

fn unrelated_pair(table: &SymbolTable, types: &[SymbolId]) -> (SymbolId, SymbolId) {
    for (index, first) in types.iter().enumerate() {
        for second in &types[index + 1..] {
            if !related(table, *first, *second) {
                return (*first, *second);
            }
        }
    }
    (types[0], types[types.len() - 1])
}

fn related(table: &SymbolTable, first: SymbolId, second: SymbolId) -> bool {
    let pair = [first, second];
    cheapest_candidate(table, &pair, |from, to| hierarchy_distance(table, from, to)).is_some()
        || cheapest_candidate(table, &pair, |from, to| promotion_distance(table, from, to)).is_some()
}

impl ResolverCtx<'_> {
    /// Common type of already-typed operands, or UNABLE_TO_DETERMINE_COMMON_TYPE.
    pub fn common_type_or_error(&mut self, span: &SourceSpan, types: &[SymbolId]) -> Option<SymbolId> {
        let program = self.program;
        let (outcome, names) = {
            let table = program.read();
            let outcome = common_type(&table, types);
            let names = match outcome {
                Some(CommonType::Unrelated { first, second }) => {
                    Some((table.name(first).to_string(), table.name(second).to_string()))
                }
                _ => None,
            };
            (outcome, names)
        };
        match (outcome, names) {
            (Some(CommonType::Found(found)), _) => Some(found),
            (_, Some((first, second))) => {
                self.error(span, format!("'{first}' and '{second}'"), ErrorClassification::UnableToDetermineCommonType);
                None
            }
            _ => None,
        }
    }
}
