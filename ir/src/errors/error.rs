use std::fmt;
use enum_ordinalize::Ordinalize;
use thiserror::Error;
use crate::ast::NodeId;
use crate::span::SourceSpan;
use crate::symbols::SymbolId;

macro_rules! classifications {
    ($($variant:ident => $name:literal, $description:literal;)*) => {
        /// The closed set of semantic error kinds a resolution pass can report.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ordinalize)]
        pub enum ErrorClassification {
            $($variant,)*
        }

        impl ErrorClassification {
            pub fn name(&self) -> &'static str {
                match self {
                    $(ErrorClassification::$variant => $name,)*
                }
            }

            pub fn description(&self) -> &'static str {
                match self {
                    $(ErrorClassification::$variant => $description,)*
                }
            }
        }
    };
}

classifications! {
    NotResolved => "NOT_RESOLVED", "not resolved";
    TypeNotResolved => "TYPE_NOT_RESOLVED", "type not resolved";
    MethodNotResolved => "METHOD_NOT_RESOLVED", "method/function not resolved";
    UnableToDetermineCommonType => "UNABLE_TO_DETERMINE_COMMON_TYPE", "unable to determine a common type in this expression";
    TypeMustBeConvertableToString => "TYPE_MUST_BE_CONVERTABLE_TO_STRING", "type does not have the '$' operator or a promotion to String";
    GenericTypeOrFunctionParametersNeeded => "GENERIC_TYPE_OR_FUNCTION_PARAMETERS_NEEDED", "type/function is generic but no parameters were supplied";
    GenericTypeOrFunctionParametersIncorrect => "GENERIC_TYPE_OR_FUNCTION_PARAMETERS_INCORRECT", "incorrect number of type/function parameters supplied";
    InappropriateUseOfThis => "INAPPROPRIATE_USE_OF_THIS", "inappropriate use of 'this'";
    InappropriateUseOfSuper => "INAPPROPRIATE_USE_OF_SUPER", "inappropriate use of 'super'";
    ReturningMissing => "RETURNING_MISSING", "returning variable and type missing";
    MissingOperatorInThis => "MISSING_OPERATOR_IN_THIS", "'default' of operators requires this type to have appropriate operator";
    MissingOperatorInSuper => "MISSING_OPERATOR_IN_SUPER", "'default' of operators requires super to have appropriate operator";
    MissingOperatorInPropertyType => "MISSING_OPERATOR_IN_PROPERTY_TYPE", "'default' of operators requires property/field to have appropriate operator";
    FunctionDelegateWithDefaultOperators => "FUNCTION_DELEGATE_WITH_DEFAULT_OPERATORS", "'default' of operators is not supported with function delegate properties";
    CannotSupportToJsonDuplicatePropertyField => "CANNOT_SUPPORT_TO_JSON_DUPLICATE_PROPERTY_FIELD", "property/field duplicated, $$ (JSON) operator not supported";
    MethodsConflict => "METHODS_CONFLICT", "conflicting methods to be resolved";
    TypeIsAbstract => "TYPE_IS_ABSTRACT", "type is abstract and cannot be instantiated";
    TypeMustBeFunction => "TYPE_MUST_BE_FUNCTION", "type must be a function or delegate";
    IntegerVarOrFunctionOrDelegateRequired => "INTEGER_VAR_OR_FUNCTION_OR_DELEGATE_REQUIRED", "require an Integer value or function/function delegate";
    FunctionOrDelegateNotRequired => "FUNCTION_OR_DELEGATE_NOT_REQUIRED", "a function or function delegate is not required here";
    FunctionMustHaveNoParameters => "FUNCTION_MUST_HAVE_NO_PARAMETERS", "function must have no parameters";
    FunctionMustHaveSingleParameter => "FUNCTION_MUST_HAVE_SINGLE_PARAMETER", "function must have a single parameter";
    FunctionMustHaveTwoParameters => "FUNCTION_MUST_HAVE_TWO_PARAMETERS", "function must have two parameters";
    StreamTypeNotDefined => "STREAM_TYPE_NOT_DEFINED", "stream pipeline parts must produce a type";
    MustReturnBoolean => "MUST_RETURN_BOOLEAN", "must return a Boolean";
    MustBeABoolean => "MUST_BE_A_BOOLEAN", "is not compatible with a Boolean type";
    MustReturnInteger => "MUST_RETURN_INTEGER", "must return an Integer";
    MustBeIntegerGreaterThanZero => "MUST_BE_INTEGER_GREATER_THAN_ZERO", "must be an Integer with a value greater than zero";
    FunctionMustReturnValue => "FUNCTION_MUST_RETURN_VALUE", "function must return a value";
    FunctionMustReturnSameTypeAsInput => "FUNCTION_MUST_RETURN_SAME_TYPE_AS_INPUT", "function must return the same type as the input type";
    CannotCallAbstractType => "CANNOT_CALL_ABSTRACT_TYPE", "cannot make a call on an abstract function/type directly";
    NotMarkedAbstractButIsAbstract => "NOT_MARKED_ABSTRACT_BUT_IS_ABSTRACT", "not declared abstract but still has abstract methods/operators";
    UnableToFindPipeForType => "UNABLE_TO_FIND_PIPE_FOR_TYPE", "unable to find a '|' pipe operator for type";
    IncompatibleTypes => "INCOMPATIBLE_TYPES", "types are not compatible with each other";
    MissingIterateMethod => "MISSING_ITERATE_METHOD", "it does not have compatible iterator() - hasNext()/next() methods";
    NotMutable => "NOT_MUTABLE", "not mutable";
    IncompatibleParameterGenus => "INCOMPATIBLE_PARAMETER_GENUS", "incompatible genus in parameter(s)";
    TraitByDelegateForClassOnly => "TRAIT_BY_DELEGATE_FOR_CLASS_ONLY", "delegation by a trait is only applicable for classes";
    DispatchersOnlyHaveOneMethodEntryPointMarked => "DISPATCHERS_ONLY_HAVE_ONE_METHOD_ENTRY_POINT_MARKED", "only one method can be marked as a dispatcher entry point";
    InvalidNumberOfParameters => "INVALID_NUMBER_OF_PARAMETERS", "invalid number of parameters";
    DispatcherPureMismatch => "DISPATCHER_PURE_MISMATCH", "'pure' on dispatcher requires 'pure' for matching dispatcher method";
    DispatcherPrivateInSuper => "DISPATCHER_PRIVATE_IN_SUPER", "same method name as dispatcher, but marked private in super - won't be called";
    OperatorNotDefined => "OPERATOR_NOT_DEFINED", "operator not defined";
    OperatorCannotBeUsedOnEnumeration => "OPERATOR_CANNOT_BE_USED_ON_ENUMERATION", "operator cannot be used on an Enumeration in this way";
    MethodAmbiguous => "METHOD_AMBIGUOUS", "ambiguous match";
    NotAccessible => "NOT_ACCESSIBLE", "not accessible from this context";
    MethodOverrides => "METHOD_OVERRIDES", "as it overrides method of same name/signature in hierarchy";
    DoesNotOverride => "DOES_NOT_OVERRIDE", "does not 'override' any method/operator";
    MethodAccessModifiersDiffer => "METHOD_ACCESS_MODIFIERS_DIFFER", "methods with same signature have different access modifiers";
    FunctionSignatureDoesNotMatchSuper => "FUNCTION_SIGNATURE_DOES_NOT_MATCH_SUPER", "function signature does not match 'super' function";
    SuperIsPure => "SUPER_IS_PURE", "'pure' in super requires 'pure' for this definition";
    SuperIsNotPure => "SUPER_IS_NOT_PURE", "super is not 'pure', requires this definition not to be marked as 'pure'";
    MixOfPureAndNotPureConstructors => "MIX_OF_PURE_AND_NOT_PURE_CONSTRUCTORS", "if any constructor is marked pure, all constructors must be pure";
    NotInitialisedBeforeUse => "NOT_INITIALISED_BEFORE_USE", "is/may not be initialised before use";
    NoMutationInPureContext => "NO_MUTATION_IN_PURE_CONTEXT", "mutating variables is not allowed when scope is marked as 'pure'";
    CovarianceMismatch => "COVARIANCE_MISMATCH", "return types are incompatible (covariance required)";
    NonePureCallInPureScope => "NONE_PURE_CALL_IN_PURE_SCOPE", "is not marked 'pure', but call is made in a scope that is marked as 'pure'";
    ThisAndSuperMustBeFirstInConstructor => "THIS_AND_SUPER_MUST_BE_FIRST_IN_CONSTRUCTOR", "'this()' and 'super()' must be the first statement in a constructor";
    ThisAndSuperCallsOnlyInConstructor => "THIS_AND_SUPER_CALLS_ONLY_IN_CONSTRUCTOR", "'this()' and 'super()' can only be used in constructors, did you mean 'this.' or 'super.'";
    DefaultRequiredInSwitchStatement => "DEFAULT_REQUIRED_IN_SWITCH_STATEMENT", "'default' is required in this 'switch' statement";
    DefaultRequiredInSwitchExpression => "DEFAULT_REQUIRED_IN_SWITCH_EXPRESSION", "'default' is required in this 'switch' expression";
    DuplicateEnumeratedValuesPresentInSwitch => "DUPLICATE_ENUMERATED_VALUES_PRESENT_IN_SWITCH", "duplicated enumerated value in switch 'case'";
    NotAllEnumeratedValuesPresentInSwitch => "NOT_ALL_ENUMERATED_VALUES_PRESENT_IN_SWITCH", "'cases' should cover all enumerated values in 'switch'";
    SelfAssignment => "SELF_ASSIGNMENT", "self assignment";
}

impl fmt::Display for ErrorClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A user facing semantic error attached to a source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub classification: ErrorClassification,
    pub message: String,
    pub span: SourceSpan,
}

impl Diagnostic {
    pub fn new(span: SourceSpan, message: impl Into<String>, classification: ErrorClassification) -> Self {
        Diagnostic { classification, message: message.into(), span }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}: {}: {}", self.classification, self.span, self.classification.description())
        } else {
            write!(f, "{}: {}: {} {}", self.classification, self.span, self.message, self.classification.description())
        }
    }
}

// A compiler defect: the walker met something the upstream passes promised it would never see.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InternalError {
    #[error("node {node} already has symbol {existing} recorded against it")]
    AlreadyRecorded { node: NodeId, existing: SymbolId },

    #[error("node {0} is not part of this parse tree")]
    UnknownNode(NodeId),

    #[error("node {node} was expected to be {expected}")]
    UnexpectedNode { node: NodeId, expected: &'static str },

    #[error("symbol {symbol} was expected to be {expected}")]
    UnexpectedSymbol { symbol: SymbolId, expected: &'static str },

    #[error("stream part at {span} is malformed: {reason}")]
    MalformedStreamPart { span: SourceSpan, reason: String },

    #[error("statement at {span} is malformed: {reason}")]
    MalformedStatement { span: SourceSpan, reason: &'static str },

    #[error("scope stack underflow while leaving {0}")]
    ScopeUnderflow(&'static str),
}

pub type PassResult<T> = Result<T, InternalError>;
