//! The symbol model shared by every resolution pass.
//!
//! Symbols live in an append-only arena ([`table::SymbolTable`]) and refer to each other
//! through [`SymbolId`]s, so supertype, trait and parameter edges never form ownership cycles.
//! Two types are the same type exactly when their ids are equal.

pub mod builtins;
pub mod search;
pub mod table;

use std::fmt;
use enum_ordinalize::Ordinalize;
use crate::span::SourceSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub(crate) u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ordinalize)]
pub enum Genus {
    Class,
    ClassTrait,
    Record,
    Function,
    FunctionTrait,
    Component,
    Service,
    ServiceApplication,
    GeneralApplication,
    Program,
    ClassEnumeration,
    Value,
    Any,
}

impl Genus {
    pub fn is_function(self) -> bool {
        matches!(self, Genus::Function | Genus::FunctionTrait)
    }
}

impl fmt::Display for Genus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Genus::Class => "CLASS",
            Genus::ClassTrait => "CLASS_TRAIT",
            Genus::Record => "RECORD",
            Genus::Function => "FUNCTION",
            Genus::FunctionTrait => "FUNCTION_TRAIT",
            Genus::Component => "COMPONENT",
            Genus::Service => "SERVICE",
            Genus::ServiceApplication => "SERVICE_APPLICATION",
            Genus::GeneralApplication => "GENERAL_APPLICATION",
            Genus::Program => "PROGRAM",
            Genus::ClassEnumeration => "CLASS_ENUMERATION",
            Genus::Value => "VALUE",
            Genus::Any => "ANY",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AccessModifier {
    Private,
    Protected,
    #[default]
    Public,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolFlags {
    pub incoming_parameter: bool,
    pub returning_parameter: bool,
    pub property: bool,
    pub constant: bool,
    pub referenced: bool,
    pub pure: bool,
    pub abstract_: bool,
    pub override_: bool,
    pub injectable: bool,
    pub synthetic: bool,
    pub dispatcher: bool,
    /// An operator the author asked the compiler to generate.
    pub defaulted: bool,
    pub constructor: bool,
    pub operator: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Initialisation {
    #[default]
    Uninitialised,
    InitialisedBy(SourceSpan),
}

/// The generic type/function a parameterised symbol was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameterisation {
    pub generic: SymbolId,
    pub arguments: Vec<SymbolId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericDetail {
    pub type_parameters: Vec<SymbolId>,
    pub origin: Option<Parameterisation>,
}

impl GenericDetail {
    pub fn is_generic(&self) -> bool {
        !self.type_parameters.is_empty()
    }
}

/// `traits of T by field`: T's abstract methods are implemented by delegating to `field`.
#[derive(Debug, Clone, PartialEq)]
pub struct TraitDelegate {
    pub trait_type: SymbolId,
    pub field: String,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateDetail {
    pub super_type: Option<SymbolId>,
    pub traits: Vec<SymbolId>,
    pub properties: Vec<SymbolId>,
    pub methods: Vec<SymbolId>,
    pub generic: GenericDetail,
    pub trait_delegates: Vec<TraitDelegate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionDetail {
    pub parameters: Vec<SymbolId>,
    pub returning: Option<SymbolId>,
    pub super_function: Option<SymbolId>,
    pub generic: GenericDetail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDetail {
    pub owner: SymbolId,
    pub parameters: Vec<SymbolId>,
    pub returning: Option<SymbolId>,
    /// Set on synthetic methods that forward to a property (traits by delegate).
    pub delegate_via: Option<SymbolId>,
}

/// An operator used on a type parameter inside a generic body, with its argument types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessedOperator {
    pub name: String,
    pub arguments: Vec<SymbolId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParameterDetail {
    pub owner: SymbolId,
    pub accessed_operators: Vec<AccessedOperator>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamCallDetail {
    pub consumes: Option<SymbolId>,
    pub produces: Option<SymbolId>,
    pub promotion_required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolDetail {
    Variable,
    Expression,
    Aggregate(AggregateDetail),
    Function(FunctionDetail),
    Method(MethodDetail),
    TypeParameter(TypeParameterDetail),
    StreamCall(StreamCallDetail),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub span: SourceSpan,
    pub genus: Genus,
    pub access: AccessModifier,
    pub flags: SymbolFlags,
    pub initialisation: Initialisation,
    pub(crate) ty: Option<SymbolId>,
    pub detail: SymbolDetail,
}

impl Symbol {
    pub fn ty(&self) -> Option<SymbolId> {
        self.ty
    }

    pub fn is_type(&self) -> bool {
        matches!(self.detail, SymbolDetail::Aggregate(_) | SymbolDetail::Function(_) | SymbolDetail::TypeParameter(_))
    }

    pub fn is_private(&self) -> bool {
        self.access == AccessModifier::Private
    }

    pub fn is_pure(&self) -> bool {
        self.flags.pure
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.abstract_
    }

    pub fn is_constructor(&self) -> bool {
        self.flags.constructor
    }

    pub fn is_initialised(&self) -> bool {
        matches!(self.initialisation, Initialisation::InitialisedBy(_))
    }

    pub fn as_aggregate(&self) -> Option<&AggregateDetail> {
        match &self.detail {
            SymbolDetail::Aggregate(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn as_aggregate_mut(&mut self) -> Option<&mut AggregateDetail> {
        match &mut self.detail {
            SymbolDetail::Aggregate(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionDetail> {
        match &self.detail {
            SymbolDetail::Function(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodDetail> {
        match &self.detail {
            SymbolDetail::Method(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn as_type_parameter(&self) -> Option<&TypeParameterDetail> {
        match &self.detail {
            SymbolDetail::TypeParameter(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn as_stream_call(&self) -> Option<&StreamCallDetail> {
        match &self.detail {
            SymbolDetail::StreamCall(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn as_stream_call_mut(&mut self) -> Option<&mut StreamCallDetail> {
        match &mut self.detail {
            SymbolDetail::StreamCall(detail) => Some(detail),
            _ => None,
        }
    }

    /// Generic information for aggregates and functions.
    pub fn generic(&self) -> Option<&GenericDetail> {
        match &self.detail {
            SymbolDetail::Aggregate(detail) => Some(&detail.generic),
            SymbolDetail::Function(detail) => Some(&detail.generic),
            _ => None,
        }
    }

    /// Parameters of a function or method, empty for anything else.
    pub fn call_parameters(&self) -> &[SymbolId] {
        match &self.detail {
            SymbolDetail::Function(detail) => &detail.parameters,
            SymbolDetail::Method(detail) => &detail.parameters,
            _ => &[],
        }
    }

    pub fn returning(&self) -> Option<SymbolId> {
        match &self.detail {
            SymbolDetail::Function(detail) => detail.returning,
            SymbolDetail::Method(detail) => detail.returning,
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.detail, SymbolDetail::Function(_) | SymbolDetail::Method(_))
    }
}
