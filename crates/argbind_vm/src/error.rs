//! Runtime errors.

/// An error raised while executing an instruction stream.
///
/// The first group is what a caller of a bound method sees; the second group
/// means the stream itself is broken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("missing keyword: :{name}")]
    MissingKeyword { name: String },

    #[error("{}", unknown_keywords(.names))]
    UnknownKeywords { names: Vec<String> },

    #[error("{message}")]
    TypeError { message: String },

    #[error("undefined method `{method}' for an instance of {receiver}")]
    NoMethod { method: String, receiver: String },

    #[error("wrong number of arguments (given {given}, expected {expected})")]
    ArgumentCount { given: usize, expected: usize },

    #[error("undefined local variable `{name}'")]
    UndefinedVariable { name: String },

    #[error("integer overflow")]
    IntegerOverflow,

    // -- Broken streams --
    #[error("stack underflow at instruction {pc}")]
    StackUnderflow { pc: usize },

    #[error("stack is unbalanced after binding: {extra} extra values")]
    UnbalancedStack { extra: isize },

    #[error("unmatched `{op}` at instruction {pc}")]
    MalformedBlock { op: &'static str, pc: usize },
}

impl RuntimeError {
    /// `can't convert Integer into Array`
    pub fn conversion(from: &str, into: &str) -> Self {
        RuntimeError::TypeError {
            message: format!("can't convert {} into {}", from, into),
        }
    }

    /// True for errors a well-formed stream can raise on bad arguments.
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            RuntimeError::MissingKeyword { .. }
                | RuntimeError::UnknownKeywords { .. }
                | RuntimeError::TypeError { .. }
                | RuntimeError::NoMethod { .. }
                | RuntimeError::ArgumentCount { .. }
                | RuntimeError::UndefinedVariable { .. }
                | RuntimeError::IntegerOverflow
        )
    }
}

fn unknown_keywords(names: &[String]) -> String {
    let list = names
        .iter()
        .map(|name| format!(":{}", name))
        .collect::<Vec<_>>()
        .join(", ");
    if names.len() == 1 {
        format!("unknown keyword: {}", list)
    } else {
        format!("unknown keywords: {}", list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_messages() {
        assert_eq!(
            RuntimeError::MissingKeyword { name: "a".into() }.to_string(),
            "missing keyword: :a"
        );
        assert_eq!(
            RuntimeError::UnknownKeywords {
                names: vec!["z".into()]
            }
            .to_string(),
            "unknown keyword: :z"
        );
        assert_eq!(
            RuntimeError::UnknownKeywords {
                names: vec!["y".into(), "z".into()]
            }
            .to_string(),
            "unknown keywords: :y, :z"
        );
    }

    #[test]
    fn test_conversion_message() {
        let err = RuntimeError::conversion("Integer", "Array");
        assert_eq!(err.to_string(), "can't convert Integer into Array");
        assert!(err.is_argument_error());
        assert!(!RuntimeError::StackUnderflow { pc: 3 }.is_argument_error());
    }
}
