//! API surface classification
//!
//! Decides which receiver methods are API operations and pairs each with its
//! resolved request and response shapes.

use crate::normalizer::{base_name, import_alias};
use crate::resolver::StructResolver;
use crate::source::TypeCatalog;
use provider_codegen_common::{
    ApiMethod, ApiOperation, OperationRecord, Parameter, ResolvedShape,
};

/// Decides whether an operation belongs to the API surface
#[cfg_attr(test, mockall::automock)]
pub trait OperationPredicate {
    fn is_api_operation(&self, operation: &OperationRecord) -> bool;
}

impl<P: OperationPredicate + ?Sized> OperationPredicate for &P {
    fn is_api_operation(&self, operation: &OperationRecord) -> bool {
        (**self).is_api_operation(operation)
    }
}

/// Accepts operations whose owning type mentions a suffix token
///
/// This is a naming heuristic: `WidgetsApi` and `ApiClient` both match, and an
/// API type named without the token is missed.
///
/// # Examples
/// ```
/// use provider_codegen_common::OperationRecord;
/// use provider_codegen_parser::{OperationPredicate, OwningTypeSuffix};
///
/// let predicate = OwningTypeSuffix::new("api");
/// let op = OperationRecord {
///     name: "ListWidgets".to_string(),
///     owning_type: "WidgetApi".to_string(),
///     ..Default::default()
/// };
/// assert!(predicate.is_api_operation(&op));
/// ```
#[derive(Debug, Clone)]
pub struct OwningTypeSuffix {
    token: String,
}

impl OwningTypeSuffix {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_lowercase(),
        }
    }
}

impl Default for OwningTypeSuffix {
    fn default() -> Self {
        Self::new("api")
    }
}

impl OperationPredicate for OwningTypeSuffix {
    fn is_api_operation(&self, operation: &OperationRecord) -> bool {
        let owning_type = operation.owning_type.to_lowercase();
        owning_type.contains(&self.token) || owning_type.ends_with(&self.token)
    }
}

/// First parameter type that is neither a context nor variadic
pub fn request_type(params: &[Parameter]) -> Option<&str> {
    params
        .iter()
        .map(|p| p.type_name.trim())
        .find(|ty| !ty.contains("context.Context") && !ty.starts_with("..."))
}

/// First return type that is not `error`
pub fn response_type(returns: &[String]) -> Option<&str> {
    returns.iter().map(|r| r.trim()).find(|ty| *ty != "error")
}

/// Operations accepted by `predicate`, in input order
pub fn select_api_operations<'o, P: OperationPredicate>(
    predicate: &'o P,
    operations: &'o [OperationRecord],
) -> impl Iterator<Item = &'o OperationRecord> + 'o {
    operations
        .iter()
        .filter(move |op| predicate.is_api_operation(op))
}

/// Resolves the request/response shapes of API operations
pub struct ApiClassifier<'a, P> {
    resolver: StructResolver<'a>,
    predicate: P,
}

impl<'a, P: OperationPredicate> ApiClassifier<'a, P> {
    pub fn new(types: &'a TypeCatalog, predicate: P) -> Self {
        Self {
            resolver: StructResolver::new(types),
            predicate,
        }
    }

    /// Resolve the shapes of one operation already known to be an API operation
    pub fn build(&self, operation: &OperationRecord) -> ApiOperation {
        ApiOperation {
            method: ApiMethod {
                name: operation.name.clone(),
                owning_type: operation.owning_type.clone(),
                file: operation.file.clone(),
                params: operation.params.clone(),
            },
            request_shape: request_type(&operation.params)
                .and_then(|ty| self.resolve_shape(ty, operation)),
            response_shape: response_type(&operation.returns)
                .and_then(|ty| self.resolve_shape(ty, operation)),
        }
    }

    fn resolve_shape(&self, type_str: &str, operation: &OperationRecord) -> Option<ResolvedShape> {
        let mut shape = self.resolver.resolve(&base_name(type_str))?;
        if let Some(alias) = import_alias(type_str) {
            if let Some(path) = operation.imports.get(&alias) {
                shape.import_path = Some(path.clone());
                shape.import_alias = Some(alias);
            }
        }
        Some(shape)
    }
}
