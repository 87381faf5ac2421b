//! Error type shared by the whole crate

use thiserror::Error;

/// Errors that abort a cellmatch run, or a file read
///
/// Modules that are merely outside of the supported subset (sequential logic,
/// too many inputs) are not errors: they are skipped with a log message.
#[derive(Debug, Error)]
pub enum Error {
    /// A port is wider than one bit
    #[error("Unsupported wide port ({wire}) of non-unit width {width} found in module {module}")]
    WidePort {
        /// Module name
        module: String,
        /// Port name
        wire: String,
        /// Port width
        width: usize,
    },

    /// A cell is neither a supported gate, a flip-flop nor an annotation
    #[error("Unsupported cell in module '{module}': {cell} of type {cell_type}")]
    UnsupportedCell {
        /// Module name
        module: String,
        /// Cell name
        cell: String,
        /// Cell type
        cell_type: String,
    },

    /// The gates form a combinational loop
    #[error("Module {module} contains combinational loops: {}", .cells.join(" -> "))]
    CombinationalLoop {
        /// Module name
        module: String,
        /// Cells along one of the loops
        cells: Vec<String>,
    },

    /// A gate reads a signal that nothing drives
    #[error("Cell {cell} in module {module} sources an undriven wire")]
    UndrivenInput {
        /// Module name
        module: String,
        /// Cell name
        cell: String,
    },

    /// A primary output is not driven
    #[error("Output port {port} in module {module} is undriven")]
    UndrivenOutput {
        /// Module name
        module: String,
        /// Port name
        port: String,
    },

    /// A design was requested by name but is not in the registry
    #[error("No design '{0}' found")]
    MissingDesign(String),

    /// Two different matches would produce rules with the same name
    #[error("Rule {0} already exists for another match")]
    DuplicateRule(String),

    /// Neither a library nor table annotation was requested
    #[error("Missing required library design")]
    MissingLibrary,

    /// Malformed input file
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// Line number, starting at 1
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// File extension not recognized
    #[error("Unknown extension {0}")]
    UnknownExtension(String),

    /// Underlying IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type using the crate error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn test_messages() {
        let e = Error::CombinationalLoop {
            module: "m".to_owned(),
            cells: vec!["a".to_owned(), "b".to_owned()],
        };
        assert_eq!(e.to_string(), "Module m contains combinational loops: a -> b");
        let e = Error::MissingDesign("lib".to_owned());
        assert_eq!(e.to_string(), "No design 'lib' found");
        assert_eq!(
            Error::DuplicateRule("_60_a_b_c".to_owned()).to_string(),
            "Rule _60_a_b_c already exists for another match"
        );
        assert_eq!(
            Error::parse(3, "bad").to_string(),
            "Parse error at line 3: bad"
        );
    }
}
