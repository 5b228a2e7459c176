//! Assignability weights and weighted method searches.
//!
//! Every candidate gets a cost: zero for an exact type match, a small step for each supertype
//! or trait hop, and a larger one for a single built-in promotion. The cheapest candidate wins;
//! two candidates sharing the cheapest cost are ambiguous.

use std::fmt;
use crate::ir_hasher::HashSet;
use crate::symbols::builtins::{ANY, ANY_RECORD, VOID};
use crate::symbols::table::SymbolTable;
use crate::symbols::{Genus, SymbolDetail, SymbolId};

pub const EXACT_MATCH: u32 = 0;
pub const SUPER_STEP: u32 = 5;
pub const TRAIT_STEP: u32 = 5;
pub const RECORD_ROOT: u32 = 10;
pub const ANY_ROOT: u32 = 20;
pub const PROMOTION: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSearch {
    pub name: String,
    pub parameters: Vec<SymbolId>,
    pub returning: Option<SymbolId>,
}

impl MethodSearch {
    pub fn new(name: impl Into<String>) -> Self {
        MethodSearch { name: name.into(), parameters: Vec::new(), returning: None }
    }

    pub fn with_parameter(mut self, ty: SymbolId) -> Self {
        self.parameters.push(ty);
        self
    }

    pub fn with_parameters(mut self, types: &[SymbolId]) -> Self {
        self.parameters.extend_from_slice(types);
        self
    }

    pub fn returning(mut self, ty: SymbolId) -> Self {
        self.returning = Some(ty);
        self
    }

    /// A search shaped exactly like an existing method, used by override checks.
    pub fn like(table: &SymbolTable, method: SymbolId) -> Self {
        MethodSearch {
            name: table.name(method).to_string(),
            parameters: table.parameter_types(method).unwrap_or_default(),
            returning: None,
        }
    }
}

/// Renders a search with type names, e.g. `+(Integer)`.
pub struct DescribedSearch<'a> {
    table: &'a SymbolTable,
    search: &'a MethodSearch,
}

impl fmt::Display for DescribedSearch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parameters: Vec<&str> = self.search.parameters.iter().map(|p| self.table.name(*p)).collect();
        write!(f, "{}({})", self.search.name, parameters.join(", "))?;
        if let Some(returning) = self.search.returning {
            write!(f, " as {}", self.table.name(returning))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightedMethod {
    pub method: SymbolId,
    pub weight: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodSearchResult {
    matches: Vec<WeightedMethod>,
}

impl MethodSearchResult {
    fn from_matches(mut matches: Vec<WeightedMethod>) -> Self {
        matches.sort_by_key(|m| m.weight);
        MethodSearchResult { matches }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn matches(&self) -> &[WeightedMethod] {
        &self.matches
    }

    /// All candidates sharing the lowest weight.
    pub fn best_matches(&self) -> Vec<SymbolId> {
        let Some(best) = self.matches.first() else { return Vec::new() };
        self.matches.iter().take_while(|m| m.weight == best.weight).map(|m| m.method).collect()
    }

    pub fn single_best_match(&self) -> Option<SymbolId> {
        match self.best_matches().as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        self.best_matches().len() > 1
    }
}

impl SymbolTable {
    pub fn describe<'a>(&'a self, search: &'a MethodSearch) -> DescribedSearch<'a> {
        DescribedSearch { table: self, search }
    }

    /// Cost of using a `from` where a `to` is expected, allowing one built-in promotion.
    pub fn assignable_weight(&self, from: SymbolId, to: SymbolId) -> Option<u32> {
        self.uncoerced_weight(from, to).or_else(|| {
            let promoted = self.promotion_of(from)?;
            self.uncoerced_weight(promoted, to).map(|weight| weight + PROMOTION)
        })
    }

    pub fn uncoerced_weight(&self, from: SymbolId, to: SymbolId) -> Option<u32> {
        if from == to {
            return Some(EXACT_MATCH);
        }
        if from == VOID || to == VOID {
            return None;
        }
        let mut visited = HashSet::default();
        let through_hierarchy = self.hierarchy_weight(from, to, &mut visited);
        let through_root = if to == ANY {
            Some(ANY_ROOT)
        } else if to == ANY_RECORD && self.symbol(from).genus == Genus::Record {
            Some(RECORD_ROOT)
        } else {
            None
        };
        match (through_hierarchy, through_root) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn is_assignable(&self, from: SymbolId, to: SymbolId) -> bool {
        self.assignable_weight(from, to).is_some()
    }

    pub fn is_assignable_uncoerced(&self, from: SymbolId, to: SymbolId) -> bool {
        self.uncoerced_weight(from, to).is_some()
    }

    fn hierarchy_weight(&self, from: SymbolId, to: SymbolId, visited: &mut HashSet<SymbolId>) -> Option<u32> {
        if from == to {
            return Some(EXACT_MATCH);
        }
        if !visited.insert(from) {
            return None;
        }
        let (super_type, traits): (Option<SymbolId>, &[SymbolId]) = match &self.symbol(from).detail {
            SymbolDetail::Aggregate(detail) => (detail.super_type, detail.traits.as_slice()),
            SymbolDetail::Function(detail) => (detail.super_function, &[]),
            _ => (None, &[]),
        };
        let via_super = super_type.and_then(|s| self.hierarchy_weight(s, to, visited)).map(|w| w + SUPER_STEP);
        let via_traits = traits.iter()
            .filter_map(|t| self.hierarchy_weight(*t, to, visited).map(|w| w + TRAIT_STEP))
            .min();
        match (via_super, via_traits) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Every supertype and trait reachable from `id`, nearest first, `id` itself excluded.
    pub fn all_supertypes(&self, id: SymbolId) -> Vec<SymbolId> {
        let mut ordered = Vec::new();
        let mut seen = HashSet::default();
        seen.insert(id);
        let mut frontier = self.direct_supertypes(id);
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for candidate in frontier {
                if seen.insert(candidate) {
                    ordered.push(candidate);
                    next.extend(self.direct_supertypes(candidate));
                }
            }
            frontier = next;
        }
        ordered
    }

    /// Cost of calling `method` with the searched argument types, `None` when it cannot accept them.
    pub fn method_weight(&self, method: SymbolId, search: &MethodSearch) -> Option<u32> {
        let parameters = self.parameter_types(method)?;
        if parameters.len() != search.parameters.len() {
            return None;
        }
        let mut weight = EXACT_MATCH;
        for (argument, parameter) in search.parameters.iter().zip(parameters.iter()) {
            weight += self.assignable_weight(*argument, *parameter)?;
        }
        if let Some(required) = search.returning {
            weight += self.assignable_weight(self.return_type(method), required)?;
        }
        Some(weight)
    }

    /// Same name and the identical parameter type list.
    pub fn same_signature(&self, a: SymbolId, b: SymbolId) -> bool {
        self.name(a) == self.name(b)
            && matches!((self.parameter_types(a), self.parameter_types(b)), (Some(x), Some(y)) if x == y)
    }

    /// Methods of the aggregate's hierarchy that accept the search, cheapest first.
    ///
    /// A method hides the inherited methods it overrides. Identical signatures inherited from
    /// different places stay side by side, except that a concrete method hides abstract ones.
    pub fn resolve_matching_methods(&self, aggregate: SymbolId, search: &MethodSearch) -> MethodSearchResult {
        let mut visited = HashSet::default();
        MethodSearchResult::from_matches(self.collect_matching(aggregate, search, &mut visited))
    }

    /// Only methods declared directly on the aggregate.
    pub fn resolve_matching_methods_in_this_scope_only(&self, aggregate: SymbolId, search: &MethodSearch) -> MethodSearchResult {
        MethodSearchResult::from_matches(self.own_matches(aggregate, search))
    }

    fn own_matches(&self, aggregate: SymbolId, search: &MethodSearch) -> Vec<WeightedMethod> {
        self.methods_of(aggregate).iter()
            .filter(|m| self.name(**m) == search.name)
            .filter_map(|m| self.method_weight(*m, search).map(|weight| WeightedMethod { method: *m, weight }))
            .collect()
    }

    fn collect_matching(&self, aggregate: SymbolId, search: &MethodSearch, visited: &mut HashSet<SymbolId>) -> Vec<WeightedMethod> {
        if !visited.insert(aggregate) {
            return Vec::new();
        }
        let mut found = self.own_matches(aggregate, search);

        let mut inherited: Vec<WeightedMethod> = Vec::new();
        for source in self.direct_supertypes(aggregate) {
            for candidate in self.collect_matching(source, search, visited) {
                self.merge_peer(&mut inherited, candidate);
            }
        }
        for candidate in inherited {
            if !found.iter().any(|own| self.same_signature(own.method, candidate.method)) {
                found.push(candidate);
            }
        }
        found
    }

    fn merge_peer(&self, peers: &mut Vec<WeightedMethod>, candidate: WeightedMethod) {
        let existing = peers.iter().position(|p| self.same_signature(p.method, candidate.method));
        let Some(index) = existing else {
            peers.push(candidate);
            return;
        };
        let current = peers[index].method;
        if current == candidate.method || self.symbol(candidate.method).is_abstract() {
            return;
        }
        if self.symbol(current).is_abstract() {
            peers[index] = candidate;
        } else {
            peers.push(candidate);
        }
    }

    /// Abstract methods anywhere in the hierarchy, one per signature.
    pub fn all_abstract_methods(&self, aggregate: SymbolId) -> Vec<SymbolId> {
        let mut hierarchy = vec![aggregate];
        hierarchy.extend(self.all_supertypes(aggregate));
        let mut abstracts: Vec<SymbolId> = Vec::new();
        for ty in hierarchy {
            for method in self.methods_of(ty) {
                if self.symbol(*method).is_abstract() && !abstracts.iter().any(|a| self.same_signature(*a, *method)) {
                    abstracts.push(*method);
                }
            }
        }
        abstracts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SourceSpan;
    use crate::symbols::builtins::{FLOAT, INTEGER, STRING};

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    #[test]
    fn weights_grow_with_distance() {
        let mut table = SymbolTable::new();
        let base = table.new_aggregate("Base", Genus::Class, span());
        let middle = table.new_aggregate("Middle", Genus::Class, span());
        let leaf = table.new_aggregate("Leaf", Genus::Class, span());
        table.set_super(middle, base);
        table.set_super(leaf, middle);

        assert_eq!(table.uncoerced_weight(leaf, leaf), Some(EXACT_MATCH));
        assert_eq!(table.uncoerced_weight(leaf, middle), Some(SUPER_STEP));
        assert_eq!(table.uncoerced_weight(leaf, base), Some(2 * SUPER_STEP));
        assert_eq!(table.uncoerced_weight(base, leaf), None);
        assert_eq!(table.uncoerced_weight(leaf, ANY), Some(ANY_ROOT));
    }

    #[test]
    fn promotion_is_single_step_and_only_when_coercing() {
        let table = SymbolTable::new();
        assert_eq!(table.assignable_weight(INTEGER, FLOAT), Some(PROMOTION));
        assert_eq!(table.uncoerced_weight(INTEGER, FLOAT), None);
        assert_eq!(table.assignable_weight(INTEGER, STRING), None);
    }

    #[test]
    fn exact_overload_beats_promoted_one() {
        let mut table = SymbolTable::new();
        let printer = table.new_aggregate("Printer", Genus::Class, span());
        let exact = table.new_method(printer, "print", &[("v", INTEGER)], None, span());
        table.new_method(printer, "print", &[("v", FLOAT)], None, span());

        let result = table.resolve_matching_methods(printer, &MethodSearch::new("print").with_parameter(INTEGER));
        assert_eq!(result.single_best_match(), Some(exact));
        assert_eq!(result.matches().len(), 2);
    }

    #[test]
    fn overriding_method_hides_the_overridden_one() {
        let mut table = SymbolTable::new();
        let base = table.new_aggregate("Base", Genus::Class, span());
        let derived = table.new_aggregate("Derived", Genus::Class, span());
        table.set_super(derived, base);
        table.new_method(base, "area", &[], Some(FLOAT), span());
        let overriding = table.new_method(derived, "area", &[], Some(FLOAT), span());

        let result = table.resolve_matching_methods(derived, &MethodSearch::new("area"));
        assert_eq!(result.matches().len(), 1);
        assert_eq!(result.single_best_match(), Some(overriding));
    }

    #[test]
    fn concrete_peers_from_two_traits_are_ambiguous() {
        let mut table = SymbolTable::new();
        let left = table.new_aggregate("Left", Genus::ClassTrait, span());
        let right = table.new_aggregate("Right", Genus::ClassTrait, span());
        let both = table.new_aggregate("Both", Genus::Class, span());
        table.add_trait(both, left);
        table.add_trait(both, right);
        table.new_method(left, "name", &[], Some(STRING), span());
        table.new_method(right, "name", &[], Some(STRING), span());

        let result = table.resolve_matching_methods(both, &MethodSearch::new("name"));
        assert!(result.is_ambiguous());
        assert_eq!(result.single_best_match(), None);
    }

    #[test]
    fn concrete_peer_hides_abstract_peer() {
        let mut table = SymbolTable::new();
        let named = table.new_aggregate("Named", Genus::ClassTrait, span());
        let base = table.new_aggregate("Base", Genus::Class, span());
        let leaf = table.new_aggregate("Leaf", Genus::Class, span());
        table.set_super(leaf, base);
        table.add_trait(leaf, named);
        let abstract_name = table.new_method(named, "name", &[], Some(STRING), span());
        table.symbol_mut(abstract_name).flags.abstract_ = true;
        let concrete = table.new_method(base, "name", &[], Some(STRING), span());

        let result = table.resolve_matching_methods(leaf, &MethodSearch::new("name"));
        assert_eq!(result.single_best_match(), Some(concrete));
        assert_eq!(table.all_abstract_methods(leaf), vec![abstract_name]);
    }
}
