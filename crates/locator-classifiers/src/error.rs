use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// Crate result alias.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures raised by the clustering and training stages.
#[derive(Debug)]
pub enum PipelineError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    MissingColumn {
        path: PathBuf,
        column: String,
    },
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },
    EmptyTable(PathBuf),
    Shape(String),
    Model(String),
    Serialization(serde_json::Error),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        PipelineError::Csv {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::Io { path, .. } => write!(f, "I/O failure on {}", path.display()),
            PipelineError::Csv { path, .. } => write!(f, "Malformed CSV in {}", path.display()),
            PipelineError::MissingColumn { path, column } => {
                write!(f, "Missing column '{}' in {}", column, path.display())
            }
            PipelineError::InvalidValue {
                path,
                row,
                column,
                value,
            } => write!(
                f,
                "Invalid value '{}' in column '{}' at row {} of {}",
                value,
                column,
                row,
                path.display()
            ),
            PipelineError::EmptyTable(path) => {
                write!(f, "Feature table {} has no rows", path.display())
            }
            PipelineError::Shape(msg) => write!(f, "Shape mismatch: {}", msg),
            PipelineError::Model(msg) => write!(f, "Model failure: {}", msg),
            PipelineError::Serialization(_) => write!(f, "JSON serialization failed"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Io { source, .. } => Some(source),
            PipelineError::Csv { source, .. } => Some(source),
            PipelineError::Serialization(source) => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(value: serde_json::Error) -> Self {
        PipelineError::Serialization(value)
    }
}

impl From<ndarray::ShapeError> for PipelineError {
    fn from(value: ndarray::ShapeError) -> Self {
        PipelineError::Shape(value.to_string())
    }
}
