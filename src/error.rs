use thiserror::Error;

/// Terminal failure of a render job.
///
/// Stylesheet problems, unclassifiable rows and QR generation failures never
/// show up here: they are logged and the job degrades instead.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Markup could not be rendered: {0}")]
    Markup(String),

    #[error("PDF emission failed: {0}")]
    Emit(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// True when the caller sent something unusable, as opposed to the
    /// engine failing to produce output.
    pub fn is_input_error(&self) -> bool {
        matches!(self, RenderError::Markup(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_errors_are_input_errors() {
        assert!(RenderError::Markup("unterminated <table>".into()).is_input_error());
        assert!(!RenderError::Emit("boom".into()).is_input_error());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(!RenderError::from(io).is_input_error());
    }
}
