use smallvec::SmallVec;
use crate::ir_hasher::HashMap;
use crate::span::SourceSpan;
use crate::symbols::builtins;
use crate::symbols::{
    AccessModifier, AggregateDetail, FunctionDetail, Genus, GenericDetail, Initialisation, MethodDetail,
    Parameterisation, StreamCallDetail, Symbol, SymbolDetail, SymbolFlags, SymbolId, TraitDelegate,
    TypeParameterDetail,
};

/// (generic, ordered type arguments): the identity of a parameterisation.
pub type ParameterisationKey = (SymbolId, SmallVec<[SymbolId; 4]>);

pub fn parameterisation_key(generic: SymbolId, arguments: &[SymbolId]) -> ParameterisationKey {
    (generic, SmallVec::from_slice(arguments))
}

/// Append-only arena holding every symbol of a program, including the built-in types.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    module_names: HashMap<String, SymbolId>,
    parameterisations: HashMap<ParameterisationKey, SymbolId>,
    promotions: HashMap<SymbolId, SymbolId>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = SymbolTable {
            symbols: Vec::with_capacity(256),
            module_names: HashMap::default(),
            parameterisations: HashMap::default(),
            promotions: HashMap::default(),
        };
        builtins::register(&mut table);
        table
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    pub fn name(&self, id: SymbolId) -> &str {
        &self.symbol(id).name
    }

    /// Looks up a module level type or function by name.
    pub fn resolve_name(&self, name: &str) -> Option<SymbolId> {
        self.module_names.get(name).copied()
    }

    pub fn type_of(&self, id: SymbolId) -> Option<SymbolId> {
        self.symbol(id).ty
    }

    /// Types a symbol. Refuses (returning false) when a type is already present.
    pub fn set_type(&mut self, id: SymbolId, ty: SymbolId) -> bool {
        let symbol = self.symbol_mut(id);
        if symbol.ty.is_some() {
            return false;
        }
        symbol.ty = Some(ty);
        true
    }

    /// Replaces an existing type; only inferred declaration narrowing may do this.
    pub fn rebind_type(&mut self, id: SymbolId, ty: SymbolId) {
        self.symbol_mut(id).ty = Some(ty);
    }

    pub fn mark_initialised(&mut self, id: SymbolId, by: &SourceSpan) {
        self.symbol_mut(id).initialisation = Initialisation::InitialisedBy(by.clone());
    }

    pub fn mark_referenced(&mut self, id: SymbolId) {
        self.symbol_mut(id).flags.referenced = true;
    }

    pub fn add_promotion(&mut self, from: SymbolId, to: SymbolId) {
        self.promotions.insert(from, to);
    }

    pub fn promotion_of(&self, from: SymbolId) -> Option<SymbolId> {
        self.promotions.get(&from).copied()
    }

    pub fn interned(&self, key: &ParameterisationKey) -> Option<SymbolId> {
        self.parameterisations.get(key).copied()
    }

    pub fn intern(&mut self, key: ParameterisationKey, id: SymbolId) {
        self.parameterisations.insert(key, id);
    }

    pub fn parameterisation_count(&self) -> usize {
        self.parameterisations.len()
    }

    fn push(&mut self, name: &str, genus: Genus, span: SourceSpan, detail: SymbolDetail) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            id,
            name: name.to_string(),
            span,
            genus,
            access: AccessModifier::Public,
            flags: SymbolFlags::default(),
            initialisation: Initialisation::Uninitialised,
            ty: None,
            detail,
        });
        id
    }

    pub fn new_aggregate(&mut self, name: &str, genus: Genus, span: SourceSpan) -> SymbolId {
        let id = self.new_unregistered_aggregate(name, genus, span);
        self.module_names.insert(name.to_string(), id);
        id
    }

    /// Aggregates made by the compiler (parameterisations) are found through the intern table only.
    pub fn new_unregistered_aggregate(&mut self, name: &str, genus: Genus, span: SourceSpan) -> SymbolId {
        let id = self.push(name, genus, span, SymbolDetail::Aggregate(AggregateDetail::default()));
        self.symbol_mut(id).ty = Some(id);
        id
    }

    pub fn new_generic_aggregate(&mut self, name: &str, genus: Genus, type_parameters: &[&str], span: SourceSpan) -> SymbolId {
        let id = self.new_aggregate(name, genus, span.clone());
        let parameters: Vec<SymbolId> = type_parameters.iter()
            .map(|parameter| self.new_type_parameter(id, parameter, span.clone()))
            .collect();
        if let Some(detail) = self.symbol_mut(id).as_aggregate_mut() {
            detail.generic.type_parameters = parameters;
        }
        id
    }

    pub fn new_function(&mut self, name: &str, parameters: &[(&str, SymbolId)], returning: Option<SymbolId>, span: SourceSpan) -> SymbolId {
        let id = self.new_unregistered_function(name, Genus::Function, span.clone());
        self.module_names.insert(name.to_string(), id);
        self.fill_function(id, parameters, returning, span);
        id
    }

    pub fn new_generic_function(
        &mut self,
        name: &str,
        type_parameters: &[&str],
        span: SourceSpan,
    ) -> (SymbolId, Vec<SymbolId>) {
        let id = self.new_unregistered_function(name, Genus::Function, span.clone());
        self.module_names.insert(name.to_string(), id);
        let parameters: Vec<SymbolId> = type_parameters.iter()
            .map(|parameter| self.new_type_parameter(id, parameter, span.clone()))
            .collect();
        if let SymbolDetail::Function(detail) = &mut self.symbol_mut(id).detail {
            detail.generic.type_parameters = parameters.clone();
        }
        (id, parameters)
    }

    /// Fills in parameters and return of a function made by `new_generic_function`.
    pub fn fill_function(&mut self, function: SymbolId, parameters: &[(&str, SymbolId)], returning: Option<SymbolId>, span: SourceSpan) {
        let parameters = self.new_parameters(parameters, &span);
        let returning = returning.map(|ty| self.new_returning(ty, &span));
        if let SymbolDetail::Function(detail) = &mut self.symbol_mut(function).detail {
            detail.parameters = parameters;
            detail.returning = returning;
        }
    }

    pub fn new_unregistered_function(&mut self, name: &str, genus: Genus, span: SourceSpan) -> SymbolId {
        let id = self.push(name, genus, span, SymbolDetail::Function(FunctionDetail::default()));
        self.symbol_mut(id).ty = Some(id);
        id
    }

    pub fn new_method(
        &mut self,
        owner: SymbolId,
        name: &str,
        parameters: &[(&str, SymbolId)],
        returning: Option<SymbolId>,
        span: SourceSpan,
    ) -> SymbolId {
        let parameters = self.new_parameters(parameters, &span);
        let returning = returning.map(|ty| self.new_returning(ty, &span));
        self.new_method_from_parts(owner, name, parameters, returning, span)
    }

    /// Builds a method from already created parameter and returning symbols.
    pub fn new_method_from_parts(
        &mut self,
        owner: SymbolId,
        name: &str,
        parameters: Vec<SymbolId>,
        returning: Option<SymbolId>,
        span: SourceSpan,
    ) -> SymbolId {
        let detail = MethodDetail { owner, parameters, returning, delegate_via: None };
        let id = self.push(name, Genus::Value, span, SymbolDetail::Method(detail));
        if let Some(aggregate) = self.symbol_mut(owner).as_aggregate_mut() {
            aggregate.methods.push(id);
        }
        id
    }

    pub fn new_operator(
        &mut self,
        owner: SymbolId,
        name: &str,
        parameters: &[(&str, SymbolId)],
        returning: Option<SymbolId>,
        span: SourceSpan,
    ) -> SymbolId {
        let id = self.new_method(owner, name, parameters, returning, span);
        self.symbol_mut(id).flags.operator = true;
        id
    }

    pub fn new_constructor(&mut self, owner: SymbolId, parameters: &[(&str, SymbolId)], span: SourceSpan) -> SymbolId {
        let name = self.name(owner).to_string();
        let id = self.new_method(owner, &name, parameters, Some(owner), span);
        self.symbol_mut(id).flags.constructor = true;
        id
    }

    pub fn new_property(&mut self, owner: SymbolId, name: &str, ty: SymbolId, access: AccessModifier, span: SourceSpan) -> SymbolId {
        let id = self.new_variable(name, Some(ty), span);
        let property = self.symbol_mut(id);
        property.flags.property = true;
        property.access = access;
        if let Some(aggregate) = self.symbol_mut(owner).as_aggregate_mut() {
            aggregate.properties.push(id);
        }
        id
    }

    pub fn new_variable(&mut self, name: &str, ty: Option<SymbolId>, span: SourceSpan) -> SymbolId {
        let id = self.push(name, Genus::Value, span, SymbolDetail::Variable);
        self.symbol_mut(id).ty = ty;
        id
    }

    /// An anonymous symbol carrying the type computed for an expression node.
    pub fn new_expression(&mut self, text: &str, span: SourceSpan, ty: Option<SymbolId>) -> SymbolId {
        let id = self.push(text, Genus::Value, span, SymbolDetail::Expression);
        self.symbol_mut(id).ty = ty;
        id
    }

    pub fn new_type_parameter(&mut self, owner: SymbolId, name: &str, span: SourceSpan) -> SymbolId {
        let detail = TypeParameterDetail { owner, accessed_operators: Vec::new() };
        let id = self.push(name, Genus::Any, span, SymbolDetail::TypeParameter(detail));
        self.symbol_mut(id).ty = Some(id);
        id
    }

    pub fn new_stream_call(&mut self, name: &str, span: SourceSpan) -> SymbolId {
        self.push(name, Genus::Value, span, SymbolDetail::StreamCall(StreamCallDetail::default()))
    }

    fn new_parameters(&mut self, parameters: &[(&str, SymbolId)], span: &SourceSpan) -> Vec<SymbolId> {
        parameters.iter()
            .map(|(name, ty)| {
                let id = self.new_variable(name, Some(*ty), span.clone());
                let parameter = self.symbol_mut(id);
                parameter.flags.incoming_parameter = true;
                parameter.initialisation = Initialisation::InitialisedBy(span.clone());
                id
            })
            .collect()
    }

    fn new_returning(&mut self, ty: SymbolId, span: &SourceSpan) -> SymbolId {
        let id = self.new_variable("rtn", Some(ty), span.clone());
        self.symbol_mut(id).flags.returning_parameter = true;
        id
    }

    pub fn set_super(&mut self, aggregate: SymbolId, super_type: SymbolId) {
        if let Some(detail) = self.symbol_mut(aggregate).as_aggregate_mut() {
            detail.super_type = Some(super_type);
        }
    }

    pub fn add_trait(&mut self, aggregate: SymbolId, trait_type: SymbolId) {
        if let Some(detail) = self.symbol_mut(aggregate).as_aggregate_mut() {
            detail.traits.push(trait_type);
        }
    }

    pub fn add_trait_delegate(&mut self, aggregate: SymbolId, trait_type: SymbolId, field: &str, span: SourceSpan) {
        if let Some(detail) = self.symbol_mut(aggregate).as_aggregate_mut() {
            if !detail.traits.contains(&trait_type) {
                detail.traits.push(trait_type);
            }
            detail.trait_delegates.push(TraitDelegate { trait_type, field: field.to_string(), span });
        }
    }

    pub fn set_super_function(&mut self, function: SymbolId, super_function: SymbolId) {
        if let SymbolDetail::Function(detail) = &mut self.symbol_mut(function).detail {
            detail.super_function = Some(super_function);
        }
    }

    pub fn set_origin(&mut self, id: SymbolId, origin: Parameterisation) {
        match &mut self.symbol_mut(id).detail {
            SymbolDetail::Aggregate(detail) => detail.generic.origin = Some(origin),
            SymbolDetail::Function(detail) => detail.generic.origin = Some(origin),
            _ => {}
        }
    }

    /// Super type then traits, the order in which searches visit them.
    pub fn direct_supertypes(&self, id: SymbolId) -> Vec<SymbolId> {
        match &self.symbol(id).detail {
            SymbolDetail::Aggregate(detail) => detail.super_type.iter().chain(detail.traits.iter()).copied().collect(),
            SymbolDetail::Function(detail) => detail.super_function.iter().copied().collect(),
            _ => Vec::new(),
        }
    }

    pub fn super_type(&self, id: SymbolId) -> Option<SymbolId> {
        match &self.symbol(id).detail {
            SymbolDetail::Aggregate(detail) => detail.super_type,
            SymbolDetail::Function(detail) => detail.super_function,
            _ => None,
        }
    }

    pub fn methods_of(&self, aggregate: SymbolId) -> &[SymbolId] {
        self.symbol(aggregate).as_aggregate().map(|a| a.methods.as_slice()).unwrap_or(&[])
    }

    pub fn properties_of(&self, aggregate: SymbolId) -> &[SymbolId] {
        self.symbol(aggregate).as_aggregate().map(|a| a.properties.as_slice()).unwrap_or(&[])
    }

    pub fn constructors_of(&self, aggregate: SymbolId) -> Vec<SymbolId> {
        self.methods_of(aggregate).iter().copied().filter(|m| self.symbol(*m).is_constructor()).collect()
    }

    /// Finds a property on the aggregate or up its super chain, with the aggregate declaring it.
    pub fn resolve_property(&self, aggregate: SymbolId, name: &str) -> Option<(SymbolId, SymbolId)> {
        let mut current = Some(aggregate);
        let mut visited = crate::ir_hasher::HashSet::default();
        while let Some(id) = current {
            if !visited.insert(id) {
                break;
            }
            if let Some(found) = self.properties_of(id).iter().copied().find(|p| self.name(*p) == name) {
                return Some((id, found));
            }
            current = self.symbol(id).as_aggregate().and_then(|a| a.super_type);
        }
        None
    }

    /// The declared type of each parameter of a function or method, in order.
    pub fn parameter_types(&self, callable: SymbolId) -> Option<Vec<SymbolId>> {
        self.symbol(callable).call_parameters().iter().map(|p| self.type_of(*p)).collect()
    }

    /// The return type of a function or method, `Void` when it returns nothing.
    pub fn return_type(&self, callable: SymbolId) -> SymbolId {
        self.symbol(callable)
            .returning()
            .and_then(|returning| self.type_of(returning))
            .unwrap_or(builtins::VOID)
    }

    pub fn is_generic(&self, id: SymbolId) -> bool {
        self.symbol(id).generic().is_some_and(GenericDetail::is_generic)
    }

    pub fn origin_of(&self, id: SymbolId) -> Option<&Parameterisation> {
        self.symbol(id).generic().and_then(|g| g.origin.as_ref())
    }

    /// A name for messages: `name(Integer, String) as Boolean` for callables, the plain name otherwise.
    pub fn friendly_name(&self, id: SymbolId) -> String {
        let symbol = self.symbol(id);
        if !symbol.is_callable() {
            return symbol.name.clone();
        }
        let parameters: Vec<String> = symbol.call_parameters().iter()
            .map(|p| self.type_of(*p).map(|t| self.name(t).to_string()).unwrap_or_else(|| "?".to_string()))
            .collect();
        let returning = self.return_type(id);
        if returning == builtins::VOID {
            format!("{}({})", symbol.name, parameters.join(", "))
        } else {
            format!("{}({}) as {}", symbol.name, parameters.join(", "), self.name(returning))
        }
    }
}
