//! Error types.

/// An error that occurred while unpacking a source archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    /// The gzip stream could not be decompressed.
    Decompress(String),
    /// The tar stream could not be read.
    Unpack(String),
    /// The archive contained no regular files.
    Empty,
}

impl core::fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Decompress(s) => write!(f, "failed to decompress archive: {s}"),
            Self::Unpack(s) => write!(f, "failed to unpack archive: {s}"),
            Self::Empty => write!(f, "archive contains no files"),
        }
    }
}

impl std::error::Error for ArchiveError {}

/// An error that occurred while cropping, rendering or loading a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CropError {
    /// No document is loaded.
    NoDocumentLoaded,
    /// The document could not be parsed or rewritten.
    InvalidPdf,
    /// An invalid page index was specified.
    InvalidPageIndex(usize),
    /// There is no selection, or it is too small to use.
    InvalidRectangle,
    /// The viewport does not belong to the page being operated on.
    StaleViewport,
    /// A remote resource could not be fetched.
    Network {
        /// The HTTP status that was returned, if any.
        status: Option<u16>,
    },
    /// A source archive could not be unpacked.
    Archive(ArchiveError),
}

impl CropError {
    /// Whether this error is swallowed by the UI instead of being shown
    /// to the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::NoDocumentLoaded | Self::InvalidRectangle)
    }
}

impl core::fmt::Display for CropError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoDocumentLoaded => write!(f, "no document loaded"),
            Self::InvalidPdf => write!(f, "invalid PDF"),
            Self::InvalidPageIndex(i) => write!(f, "invalid page index: {i}"),
            Self::InvalidRectangle => write!(f, "no valid selection"),
            Self::StaleViewport => write!(f, "viewport is out of date"),
            Self::Network { status: Some(s) } => write!(f, "request failed with status {s}"),
            Self::Network { status: None } => write!(f, "request failed"),
            Self::Archive(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CropError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Archive(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArchiveError> for CropError {
    fn from(e: ArchiveError) -> Self {
        Self::Archive(e)
    }
}
