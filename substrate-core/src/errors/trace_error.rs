/// Errors raised while parsing trace text into formations.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("formation block at line {line} is malformed: {reason}")]
    MalformedBlock { line: usize, reason: String },
}
