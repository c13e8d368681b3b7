#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid key sequence {sequence:?}")]
    KeySequence { sequence: String },
}
