use thiserror::Error;

#[derive(Error, Debug)]
pub enum CError {
    #[error("Unsupported file format: `{0}`")]
    UnsupportedFileFormat(String),
    #[error("{0}")]
    IoError(#[from] std::io::Error),
    #[error("generic error: {0}")]
    GenericError(String),
    #[error("md format: unexpected end of file at step {step}")]
    UnexpectedEof { step: usize },
    #[error("md format: step {step}: expected {expected} `<-- {tag}` entries, got {got}")]
    BlockMismatch {
        tag: &'static str,
        step: usize,
        expected: usize,
        got: usize,
    },
    #[error("md format: step {step}: `<-- {tag}` entry {entry} does not match the ion list")]
    IonMismatch {
        tag: &'static str,
        step: usize,
        entry: usize,
    },
    #[error("variable atom count: step {step} has {got} ions but step 0 has {expected}")]
    VariableAtomCount {
        step: usize,
        expected: usize,
        got: usize,
    },
    #[error("ion identities at step {step} do not match step 0")]
    InconsistentIons { step: usize },
    #[error("trajectory contains no frames")]
    EmptyTrajectory,
    #[error("unknown unit system: {0}")]
    UnknownUnitSystem(String),
    #[error("Failed to parse float: {0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),
    #[error("Failed to parse integer: {0}")]
    ParseIntError(#[from] std::num::ParseIntError),
    #[error("Missing token")]
    MissingToken,
    #[error("{0}")]
    Hdf5Error(#[from] hdf5::Error),
    #[error("invalid HDF5 string: {0}")]
    StringError(#[from] hdf5::types::StringError),
}
