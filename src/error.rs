use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// A PKCS#12 container was given without its unlock secret.
    MissingSecret,
    /// Wrong password, corrupt bytes or an unsupported container structure.
    InvalidContainer(String),
    /// The local file does not have a known certificate container extension.
    UnsupportedContainer(String),
    NoSourceSelected,
    PageOutOfRange {
        page_index: usize,
        page_count: usize,
    },
    /// The export service reported a failure or could not be reached.
    ExportFailed(String),
    /// The certificate source could not list the available certificates.
    SourceUnavailable(String),
    /// Rendering was requested before the base document was loaded.
    DocumentNotLoaded,
    /// A newer signing attempt started before this one could publish.
    Superseded,
    Config(String),
    LoPdfError(lopdf::Error),
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingSecret => write!(f, "Certificate password is required for PKCS#12 files."),
            Error::InvalidContainer(reason) => {
                write!(f, "Could not read certificate container: {}", reason)
            }
            Error::UnsupportedContainer(name) => write!(
                f,
                "`{}` is not a certificate file (.p12, .pfx, .pem or .crt).",
                name
            ),
            Error::NoSourceSelected => write!(f, "No certificate source was selected."),
            Error::PageOutOfRange {
                page_index,
                page_count,
            } => write!(
                f,
                "Page index {} is out of range, document has {} page(s).",
                page_index, page_count
            ),
            Error::ExportFailed(reason) => write!(f, "Certificate export failed: {}", reason),
            Error::SourceUnavailable(reason) => {
                write!(f, "Certificate source unavailable: {}", reason)
            }
            Error::DocumentNotLoaded => write!(f, "The PDF document is not loaded yet."),
            Error::Superseded => write!(f, "Signing attempt was superseded by a newer one."),
            Error::Config(reason) => write!(f, "Configuration error: {}", reason),
            Error::LoPdfError(err) => write!(f, "PDF error: {}", err),
            Error::Other(reason) => write!(f, "{}", reason),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::LoPdfError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Self::LoPdfError(err)
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}
impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Self::Other(err.to_owned())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::LoPdfError(lopdf::Error::from(err))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Other(format!("Background task failed: {}", err))
    }
}
