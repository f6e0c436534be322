//! Receiver and keyword narrowing of an extraction

use crate::classifier::{request_type, response_type};
use crate::normalizer::base_name;
use crate::source::TypeCatalog;
use provider_codegen_common::OperationRecord;
use std::collections::HashSet;

/// Narrows classified operations to one receiver or a keyword
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OperationFilter {
    #[default]
    All,
    /// Exact owning type, case-insensitive
    Receiver(String),
    /// Substring of the operation name, case-insensitive
    Keyword(String),
}

impl OperationFilter {
    /// Build from CLI flags; a receiver takes precedence over a keyword
    pub fn from_flags(receiver: Option<&str>, keyword: Option<&str>) -> Self {
        match (receiver, keyword) {
            (Some(r), _) if !r.is_empty() => OperationFilter::Receiver(r.to_lowercase()),
            (_, Some(k)) if !k.is_empty() => OperationFilter::Keyword(k.to_lowercase()),
            _ => OperationFilter::All,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, OperationFilter::All)
    }

    pub fn matches(&self, operation: &OperationRecord) -> bool {
        match self {
            OperationFilter::All => true,
            OperationFilter::Receiver(receiver) => {
                operation.owning_type.trim_start_matches('*').to_lowercase() == *receiver
            },
            OperationFilter::Keyword(keyword) => operation.name.to_lowercase().contains(keyword),
        }
    }
}

/// Request/response types of `operations` plus everything their fields reach
pub fn dependency_closure(operations: &[&OperationRecord], types: &TypeCatalog) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut pending: Vec<String> = operations
        .iter()
        .flat_map(|op| {
            [
                request_type(&op.params).map(base_name),
                response_type(&op.returns).map(base_name),
            ]
        })
        .flatten()
        .collect();

    while let Some(name) = pending.pop() {
        if !seen.insert(name.clone()) {
            continue;
        }
        if let Some(record) = types.get(&name) {
            pending.extend(
                record
                    .fields
                    .iter()
                    .map(|f| base_name(&f.raw_type))
                    .filter(|base| !base.is_empty() && !seen.contains(base)),
            );
        }
    }

    seen.retain(|name| types.contains_key(name));
    seen
}
