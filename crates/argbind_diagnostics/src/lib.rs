//! argbind_diagnostics: Compile errors and diagnostic reporting.
//!
//! Compile-time failures are raised as [`CompileError`] values and turned
//! into catalogue [`Diagnostic`]s by the driver. A compile error aborts only
//! the body being compiled; the driver collects one diagnostic per failed
//! body and keeps going.

use argbind_core::text::TextSpan;
use std::fmt;

/// Diagnostic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Message,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Warning => write!(f, "warning"),
            DiagnosticCategory::Error => write!(f, "error"),
            DiagnosticCategory::Message => write!(f, "message"),
        }
    }
}

/// A diagnostic message template with a code and category.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    /// The message template. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub file: Option<String>,
    pub span: Option<TextSpan>,
    pub message_text: String,
    pub code: u32,
    pub category: DiagnosticCategory,
    /// Name of the method, block or assignment the diagnostic belongs to.
    pub body: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic without location info.
    pub fn new(message: &DiagnosticMessage, args: &[&str]) -> Self {
        Self {
            file: None,
            span: None,
            message_text: format_message(message.message, args),
            code: message.code,
            category: message.category,
            body: None,
        }
    }

    pub fn with_location(
        file: String,
        span: TextSpan,
        message: &DiagnosticMessage,
        args: &[&str],
    ) -> Self {
        Self {
            file: Some(file),
            span: Some(span),
            ..Self::new(message, args)
        }
    }

    pub fn in_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}", file)?;
            if let Some(span) = self.span {
                write!(f, "({})", span.start)?;
            }
            write!(f, ": ")?;
        }
        write!(f, "{} AB{}: {}", self.category, self.code, self.message_text)?;
        if let Some(ref body) = self.body {
            write!(f, " (in `{}`)", body)?;
        }
        Ok(())
    }
}

/// Replace `{0}`, `{1}`, etc. in a template with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// Diagnostics accumulated during one compilation.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Sort diagnostics by file and position.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            let file_cmp = a.file.cmp(&b.file);
            if file_cmp != std::cmp::Ordering::Equal {
                return file_cmp;
            }
            let a_pos = a.span.map(|s| s.start).unwrap_or(0);
            let b_pos = b.span.map(|s| s.start).unwrap_or(0);
            a_pos.cmp(&b_pos)
        });
    }
}

// ============================================================================
// Compile errors
// ============================================================================

/// An error that aborts the compilation of one method, block or assignment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// The parameter or target node has a shape or position the normalizer
    /// does not accept.
    #[error("malformed parameter: {reason}")]
    MalformedParameter { reason: String, span: TextSpan },

    /// A default value expression reads the parameter it initializes.
    #[error("circular argument reference - {name}")]
    CircularArgumentReference { name: String, span: TextSpan },

    /// `name:` or `**name` declared inside a destructuring group.
    #[error("keyword parameter `{name}` cannot appear inside a destructuring group")]
    KeywordInsideDestructure { name: String, span: TextSpan },

    #[error("duplicated argument name - {name}")]
    DuplicatedArgumentName { name: String, span: TextSpan },
}

impl CompileError {
    pub fn malformed(reason: impl Into<String>, span: TextSpan) -> Self {
        CompileError::MalformedParameter {
            reason: reason.into(),
            span,
        }
    }

    pub fn span(&self) -> TextSpan {
        match self {
            CompileError::MalformedParameter { span, .. }
            | CompileError::CircularArgumentReference { span, .. }
            | CompileError::KeywordInsideDestructure { span, .. }
            | CompileError::DuplicatedArgumentName { span, .. } => *span,
        }
    }

    /// The catalogue entry for this error.
    pub fn message(&self) -> &'static DiagnosticMessage {
        match self {
            CompileError::MalformedParameter { .. } => &messages::MALFORMED_PARAMETER,
            CompileError::CircularArgumentReference { .. } => &messages::CIRCULAR_ARGUMENT_REFERENCE,
            CompileError::KeywordInsideDestructure { .. } => &messages::KEYWORD_INSIDE_DESTRUCTURE,
            CompileError::DuplicatedArgumentName { .. } => &messages::DUPLICATED_ARGUMENT_NAME,
        }
    }

    /// Convert to a located diagnostic in `file`.
    pub fn to_diagnostic(&self, file: &str) -> Diagnostic {
        let arg = match self {
            CompileError::MalformedParameter { reason, .. } => reason,
            CompileError::CircularArgumentReference { name, .. }
            | CompileError::KeywordInsideDestructure { name, .. }
            | CompileError::DuplicatedArgumentName { name, .. } => name,
        };
        Diagnostic::with_location(file.to_string(), self.span(), self.message(), &[arg])
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, Error, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Error, message: $msg }
        };
        ($code:expr, Warning, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Warning, message: $msg }
        };
        ($code:expr, Message, $msg:expr) => {
            DiagnosticMessage { code: $code, category: DiagnosticCategory::Message, message: $msg }
        };
    }

    // Parameter normalization and binding (1000-1099)
    pub const MALFORMED_PARAMETER: DiagnosticMessage = diag!(1001, Error, "Malformed parameter: {0}.");
    pub const CIRCULAR_ARGUMENT_REFERENCE: DiagnosticMessage = diag!(1002, Error, "Circular argument reference - {0}.");
    pub const KEYWORD_INSIDE_DESTRUCTURE: DiagnosticMessage = diag!(1003, Error, "Keyword parameter '{0}' cannot appear inside a destructuring group.");
    pub const DUPLICATED_ARGUMENT_NAME: DiagnosticMessage = diag!(1004, Error, "Duplicated argument name - {0}.");

    // Driver and cache (2000-2099)
    pub const CANNOT_READ_FILE: DiagnosticMessage = diag!(2001, Error, "Cannot read file '{0}': {1}.");
    pub const INVALID_COMPILATION_UNIT: DiagnosticMessage = diag!(2002, Error, "Invalid compilation unit '{0}': {1}.");
    pub const CACHE_ENTRY_DISCARDED: DiagnosticMessage = diag!(2003, Warning, "Discarded cache entry for '{0}': {1}.");
    pub const COMPILED_BODY: DiagnosticMessage = diag!(2004, Message, "Compiled '{0}' into {1} instructions.");
}
