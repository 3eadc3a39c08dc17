//! Diagnostics
//!
//! Collects warnings and errors found by the validation pass.
//! Problems that mutators tolerate (missing required links, cycles
//! without `reject_cycles`, self links, naming clashes) are reported here.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ElementId, RelationKind};

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // === Links ===
    /// A role with lower bound one has no link
    MissingRequiredLink,
    /// An element is linked to itself over a relation where that is meaningless
    SelfRelation,

    // === Cycles ===
    /// Ownership or generalization cycle
    CycleDetected,

    // === Naming ===
    /// Two siblings in one namespace share a name
    DuplicateName,
    /// Element has an empty name
    UnnamedElement,
    /// Feature that no classifier owns
    OrphanFeature,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingRequiredLink => "E001",
            Self::SelfRelation => "E002",
            Self::CycleDetected => "E003",
            Self::DuplicateName => "W001",
            Self::UnnamedElement => "W002",
            Self::OrphanFeature => "W003",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::MissingRequiredLink
            | Self::SelfRelation
            | Self::CycleDetected => Severity::Error,

            Self::DuplicateName | Self::UnnamedElement | Self::OrphanFeature => Severity::Warning,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Element the diagnostic is about
    pub element: ElementId,
    pub code: DiagnosticCode,
    pub message: String,
    /// Additional context (paths, related elements)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(element: ElementId, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            element,
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.element
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of diagnostics from a validation pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DiagnosticItem) {
        self.items.push(item);
    }

    /// Add an item with the code's own severity
    pub fn report(&mut self, element: ElementId, code: DiagnosticCode, message: impl Into<String>) {
        self.push(DiagnosticItem::new(element, code, message));
    }

    /// A required role is empty
    pub fn missing_link(&mut self, element: ElementId, relation: RelationKind, path: &str) {
        let spec = relation.spec();
        self.push(
            DiagnosticItem::new(
                element,
                DiagnosticCode::MissingRequiredLink,
                format!(
                    "'{}' requires {} {} ({})",
                    path, spec.source.multiplicity, spec.source.role, relation
                ),
            ),
        );
    }

    /// A cycle over `relation` through `members`
    pub fn cycle(&mut self, relation: RelationKind, members: &[ElementId], names: &[String]) {
        let Some(&first) = members.first() else {
            return;
        };
        self.push(
            DiagnosticItem::new(
                first,
                DiagnosticCode::CycleDetected,
                format!("Cycle over {} with {} element(s)", relation, members.len()),
            )
            .with_context(format!("Members: {}", names.join(" -> "))),
        );
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    /// Items with the given code
    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(move |i| i.code == code)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Merge another Diagnostics into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Format all diagnostics for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }

        if self.has_errors() {
            output.push_str(&format!(
                "\n{} error(s), {} warning(s)\n",
                self.error_count(),
                self.warning_count()
            ));
        } else if !self.is_empty() {
            output.push_str(&format!("\n{} warning(s)\n", self.warning_count()));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticItem;
    type IntoIter = std::vec::IntoIter<DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_severity() {
        assert_eq!(DiagnosticCode::CycleDetected.severity(), Severity::Error);
        assert_eq!(DiagnosticCode::DuplicateName.severity(), Severity::Warning);
    }

    #[test]
    fn test_diagnostics_collection() {
        let mut diags = Diagnostics::new();
        diags.missing_link(ElementId::new(0), RelationKind::StructuralFeatureType, "dw.t.c");
        diags.report(ElementId::new(1), DiagnosticCode::UnnamedElement, "no name");

        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 1);
        assert!(diags.has_errors());
        assert!(diags.format_all().contains("1 error(s), 1 warning(s)"));
    }

    #[test]
    fn test_missing_link_message_names_role() {
        let mut diags = Diagnostics::new();
        diags.missing_link(ElementId::new(3), RelationKind::UniqueKeyFeature, "pk");

        let item = &diags.all()[0];
        assert_eq!(item.code, DiagnosticCode::MissingRequiredLink);
        assert!(item.message.contains("1..* feature"));
        assert!(item.to_string().starts_with("[E001] error"));
    }

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            DiagnosticCode::MissingRequiredLink,
            DiagnosticCode::SelfRelation,
            DiagnosticCode::CycleDetected,
            DiagnosticCode::DuplicateName,
            DiagnosticCode::UnnamedElement,
            DiagnosticCode::OrphanFeature,
        ];
        let rendered: std::collections::HashSet<&str> =
            codes.iter().map(|code| code.as_str()).collect();
        assert_eq!(rendered.len(), codes.len());
        assert_eq!(DiagnosticCode::CycleDetected.as_str(), "E003");
    }
}
