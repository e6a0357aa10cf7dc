use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum EnvError {
    EmptyBatch,
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    InvalidHomeDepot {
        instance: usize,
        car: usize,
        node: usize,
        n_depot: usize,
    },
    TensorData(String),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for EnvError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EnvError::EmptyBatch => write!(formatter, "Instance batch is empty"),
            EnvError::ShapeMismatch {
                what,
                expected,
                found,
            } => write!(
                formatter,
                "Shape mismatch for {}: expected {:?}, found {:?}",
                what, expected, found
            ),
            EnvError::InvalidHomeDepot {
                instance,
                car,
                node,
                n_depot,
            } => write!(
                formatter,
                "Car {} of instance {} starts at node {}, which is not one of the {} depots",
                car, instance, node, n_depot
            ),
            EnvError::TensorData(reason) => write!(formatter, "Tensor read-back failed: {}", reason),
            EnvError::Io(err) => write!(formatter, "I/O error: {}", err),
            EnvError::Json(err) => write!(formatter, "Invalid instance file: {}", err),
        }
    }
}

impl Error for EnvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EnvError::Io(err) => Some(err),
            EnvError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EnvError {
    fn from(err: std::io::Error) -> Self {
        EnvError::Io(err)
    }
}

impl From<serde_json::Error> for EnvError {
    fn from(err: serde_json::Error) -> Self {
        EnvError::Json(err)
    }
}
