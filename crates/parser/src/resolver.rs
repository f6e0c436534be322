//! Struct graph resolution
//!
//! Expands a type name into a tree of fields, following every field whose
//! base type is itself a cataloged struct. Cycles are cut where a type
//! reappears among its own ancestors. There is no memoization, so a type
//! reached through two sibling paths is expanded in full both times.

use crate::normalizer::{base_name, import_alias};
use crate::source::TypeCatalog;
use provider_codegen_common::{FieldRecord, ResolvedField, ResolvedShape, TypeRecord};
use std::ops::{Deref, DerefMut};

/// Field names generated for protocol bookkeeping
const RESERVED_FIELDS: &[&str] = &["ObjectType_", "Reserved_", "UnknownFields_", "Discriminator"];

/// Whether a field is bookkeeping rather than payload
///
/// Embedded fields (empty name) are always kept.
pub fn is_ignored_field(name: &str) -> bool {
    !name.is_empty() && (name.ends_with('_') || RESERVED_FIELDS.contains(&name))
}

/// Type names on the current resolution path
#[derive(Debug, Default)]
pub struct VisitingStack {
    names: Vec<String>,
}

impl VisitingStack {
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        self.names.len()
    }

    /// Push `name`; it is popped when the guard drops
    pub fn enter(&mut self, name: &str) -> VisitGuard<'_> {
        self.names.push(name.to_string());
        VisitGuard { stack: self }
    }
}

/// Pops its entry from the [`VisitingStack`] on drop
pub struct VisitGuard<'a> {
    stack: &'a mut VisitingStack,
}

impl Deref for VisitGuard<'_> {
    type Target = VisitingStack;

    fn deref(&self) -> &VisitingStack {
        self.stack
    }
}

impl DerefMut for VisitGuard<'_> {
    fn deref_mut(&mut self) -> &mut VisitingStack {
        self.stack
    }
}

impl Drop for VisitGuard<'_> {
    fn drop(&mut self) {
        self.stack.names.pop();
    }
}

/// Resolves type names against a [`TypeCatalog`]
pub struct StructResolver<'a> {
    types: &'a TypeCatalog,
}

impl<'a> StructResolver<'a> {
    pub fn new(types: &'a TypeCatalog) -> Self {
        Self { types }
    }

    /// Expand `type_name`, or `None` when it is not a cataloged struct
    pub fn resolve(&self, type_name: &str) -> Option<ResolvedShape> {
        let mut visiting = VisitingStack::default();
        self.resolve_with(type_name, &mut visiting)
    }

    /// Expand `type_name` below the ancestors already in `visiting`
    pub fn resolve_with(
        &self,
        type_name: &str,
        visiting: &mut VisitingStack,
    ) -> Option<ResolvedShape> {
        let record = self.types.get(type_name)?;

        if visiting.contains(type_name) {
            return Some(shape(record, Vec::new()));
        }

        let mut guard = visiting.enter(type_name);
        let fields = record
            .fields
            .iter()
            .filter(|field| !is_ignored_field(&field.name))
            .map(|field| self.resolve_field(field, record, &mut guard))
            .collect();

        Some(shape(record, fields))
    }

    fn resolve_field(
        &self,
        field: &FieldRecord,
        owner: &TypeRecord,
        visiting: &mut VisitingStack,
    ) -> ResolvedField {
        let nested = self.resolve_with(&base_name(&field.raw_type), visiting);

        let mut resolved = match nested {
            Some(nested) => ResolvedField::composite(&field.name, &field.raw_type, nested.fields),
            None => ResolvedField::leaf(&field.name, &field.raw_type),
        };
        let alias = import_alias(&field.raw_type);
        resolved.tag = field.tag.clone();
        resolved.import_path = alias
            .as_ref()
            .and_then(|alias| owner.imports.get(alias).cloned());
        resolved.import_alias = alias;
        resolved
    }
}

fn shape(record: &TypeRecord, fields: Vec<ResolvedField>) -> ResolvedShape {
    ResolvedShape {
        name: record.name.clone(),
        raw_type: record.name.clone(),
        file: record.file.clone(),
        fields,
        import_alias: None,
        import_path: None,
    }
}
