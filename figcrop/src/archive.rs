//! Unpacking arXiv source archives to browse the figures they contain.

use crate::error::ArchiveError;
use flate2::read::GzDecoder;
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A regular file from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// The path of the file inside the archive.
    pub name: String,
    /// The file contents.
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    /// The kind of figure this file is, if it is one.
    pub fn figure_kind(&self) -> Option<FigureKind> {
        FigureKind::from_name(&self.name)
    }
}

/// A file type that can be shown in the figure browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureKind {
    /// A PDF figure.
    Pdf,
    /// A PNG image.
    Png,
    /// A JPEG image.
    Jpeg,
}

impl FigureKind {
    /// Determine the figure kind from a file name's extension.
    pub fn from_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;

        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// The MIME type used when offering the file for download.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// Gunzip `bytes` if they are gzip-compressed, otherwise return them as-is.
pub fn decompress(bytes: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes.to_vec());
    }

    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(|e| ArchiveError::Decompress(e.to_string()))?;

    Ok(out)
}

/// Decompress and unpack a (possibly gzipped) tar archive.
///
/// Only regular files are returned. On any error nothing is returned, even if
/// some entries could already be read.
pub fn unpack_source_archive(bytes: &[u8]) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let tar_bytes = decompress(bytes)?;
    let unpack_err = |e: std::io::Error| ArchiveError::Unpack(e.to_string());

    let mut archive = tar::Archive::new(tar_bytes.as_slice());
    let mut entries = Vec::new();

    for entry in archive.entries().map_err(unpack_err)? {
        let mut entry = entry.map_err(unpack_err)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let name = entry.path().map_err(unpack_err)?.to_string_lossy().into_owned();

        // The header size is untrusted; an entry can never outgrow the archive.
        let size = entry.size();
        if size > tar_bytes.len() as u64 {
            return Err(ArchiveError::Unpack(format!(
                "entry {name} claims {size} bytes, archive holds {}",
                tar_bytes.len()
            )));
        }

        let mut data = Vec::new();
        entry.read_to_end(&mut data).map_err(unpack_err)?;

        entries.push(ArchiveEntry { name, data });
    }

    if entries.is_empty() {
        return Err(ArchiveError::Empty);
    }

    log::debug!("unpacked {} files from source archive", entries.len());

    Ok(entries)
}

/// Keep only the entries that can be shown in the figure browser.
pub fn figure_entries(entries: Vec<ArchiveEntry>) -> Vec<ArchiveEntry> {
    entries
        .into_iter()
        .filter(|e| e.figure_kind().is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn figure_kinds_from_names() {
        assert_eq!(FigureKind::from_name("figs/plot.PDF"), Some(FigureKind::Pdf));
        assert_eq!(FigureKind::from_name("a.b/photo.jpeg"), Some(FigureKind::Jpeg));
        assert_eq!(FigureKind::from_name("x.JPG"), Some(FigureKind::Jpeg));
        assert_eq!(FigureKind::from_name("diagram.png"), Some(FigureKind::Png));
        assert_eq!(FigureKind::from_name("main.tex"), None);
        assert_eq!(FigureKind::from_name("Makefile"), None);
    }

    #[test]
    fn plain_bytes_pass_through() {
        assert_eq!(decompress(b"ustar").unwrap(), b"ustar");
    }

    #[test]
    fn truncated_gzip_is_an_error() {
        let err = decompress(&[0x1f, 0x8b, 0x08, 0x00]).unwrap_err();
        assert!(matches!(err, ArchiveError::Decompress(_)));
    }

    #[test]
    fn figure_filter_keeps_images_and_pdfs() {
        let entry = |name: &str| ArchiveEntry {
            name: name.to_string(),
            data: Vec::new(),
        };
        let kept = figure_entries(vec![entry("main.tex"), entry("fig1.pdf"), entry("fig2.png")]);
        let names: Vec<_> = kept.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["fig1.pdf", "fig2.png"]);
    }
}
