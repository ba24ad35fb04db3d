use color_print::cprintln;
use thiserror::Error;

// Unified error type for SCBC
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    // Lexical errors
    #[error("Invalid {construct} at line {}: `{line}`", .row + 1)]
    Syntax {
        construct: &'static str,
        row: usize,
        line: String,
    },

    #[error("Unterminated {0} block starting at line {}", .1 + 1)]
    Unterminated(&'static str, usize),

    // Reference errors
    #[error("Undeclared variable: ${0}")]
    UndeclaredVariable(String),

    #[error("Unknown struct: {0}")]
    UnknownStruct(String),

    #[error("Unknown enum: {0}")]
    UnknownEnum(String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Struct {0} has no field: {1}")]
    UnknownField(String, String),

    #[error("Enum {0} has no variant: {1}")]
    UnknownVariant(String, String),

    #[error("Duplicate definition: {0}")]
    Duplicate(String),

    // Shape errors
    #[error("Array ${name} is declared with {expected} elements but {found} were given")]
    ArrayLength {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Index {index} is out of bounds for ${name} of length {len}")]
    IndexOutOfBounds {
        name: String,
        index: usize,
        len: usize,
    },

    #[error("{0} does not fit in a stack frame")]
    FrameOverflow(String),

    #[error("Offset {index} from ${name} is out of range")]
    OffsetOverflow { name: String, index: usize },

    // Type errors
    #[error("{0} is not a struct")]
    NotAStruct(String),

    #[error("${0} is not an array")]
    NotAnArray(String),

    #[error("Expected a value of enum {expected} but found {found}")]
    EnumMismatch { expected: String, found: String },

    #[error("String literal cannot initialize {0} of type {1}")]
    StringInto(String, String),

    // ABI errors
    #[error("{func}: {count} arguments exceed the {max} registers of the {target} target")]
    TooManyArguments {
        func: String,
        count: usize,
        max: usize,
        target: String,
    },

    #[error("Statement outside of a function")]
    OutsideFunction,

    #[error("line {}: {source}", .row + 1)]
    Located { row: usize, source: Box<Error> },
}

impl Error {
    /// Attach the source row of the statement being compiled.
    pub fn at(self, row: usize) -> Self {
        match self {
            Error::Syntax { .. } | Error::Unterminated(..) | Error::Located { .. } => self,
            source => Error::Located {
                row,
                source: Box::new(source),
            },
        }
    }

    pub fn row(&self) -> Option<usize> {
        match self {
            Error::Syntax { row, .. } => Some(*row),
            Error::Unterminated(_, row) => Some(*row),
            Error::Located { row, .. } => Some(*row),
            _ => None,
        }
    }

    /// Innermost error without location.
    pub fn kind(&self) -> &Error {
        match self {
            Error::Located { source, .. } => source.kind(),
            _ => self,
        }
    }

    /// Print error with diagnostic information showing file location and line content
    pub fn print_diag(&self, file: &str, source: &str) {
        cprintln!("<red,bold>error</>: {}", self.kind());

        if let Some(row) = self.row() {
            let line_num = row + 1;
            let line_content = source.lines().nth(row).unwrap_or("");
            cprintln!("     <blue>--></> <underline>{}:{}</>", file, line_num);
            cprintln!("      <blue>|</>");
            cprintln!(" <blue>{:>4} |</> {}", line_num, line_content);
            cprintln!("      <blue>|</>");
        } else {
            cprintln!("     <blue>--></> <underline>{}</>", file);
        }
    }
}
