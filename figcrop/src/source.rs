//! Turning search-box input into something to fetch.
//!
//! The search box accepts either a direct link to a PDF or an arXiv
//! identifier (optionally as an `arxiv.org` link). arXiv papers can also be
//! browsed through their source archive.

use crate::error::CropError;

/// Where a document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfSource {
    /// A direct link to a PDF file.
    Url(String),
    /// An arXiv paper, by identifier (including any version suffix).
    Arxiv(String),
}

impl PdfSource {
    /// The URL to fetch the PDF from.
    pub fn pdf_url(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Arxiv(id) => format!("https://arxiv.org/pdf/{id}"),
        }
    }

    /// The URL of the source archive, for arXiv papers.
    pub fn source_archive_url(&self) -> Option<String> {
        match self {
            Self::Url(_) => None,
            Self::Arxiv(id) => Some(format!("https://arxiv.org/e-print/{id}")),
        }
    }

    /// The arXiv identifier, if this is an arXiv paper.
    pub fn arxiv_id(&self) -> Option<&str> {
        match self {
            Self::Url(_) => None,
            Self::Arxiv(id) => Some(id),
        }
    }
}

/// Classify search-box input. Returns `None` for input that is neither a
/// link nor an arXiv identifier.
pub fn resolve_query(input: &str) -> Option<PdfSource> {
    let query = input.trim();
    if query.is_empty() {
        return None;
    }

    if let Some(rest) = strip_prefix_ignore_case(query, "https://")
        .or_else(|| strip_prefix_ignore_case(query, "http://"))
    {
        return Some(arxiv_link_id(rest).map_or_else(
            || PdfSource::Url(query.to_string()),
            |id| PdfSource::Arxiv(id.to_string()),
        ));
    }

    let id = strip_prefix_ignore_case(query, "arxiv:").unwrap_or(query);
    is_arxiv_id(id).then(|| PdfSource::Arxiv(id.to_string()))
}

/// Map a non-success HTTP status to an error.
pub fn check_fetch_status(status: u16) -> Result<(), CropError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        log::warn!("fetch failed with status {status}");
        Err(CropError::Network {
            status: Some(status),
        })
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// The paper identifier in an `arxiv.org/{abs,pdf,e-print}/<id>` link
/// (scheme already removed).
fn arxiv_link_id(rest: &str) -> Option<&str> {
    let rest = strip_prefix_ignore_case(rest, "www.").unwrap_or(rest);
    let path = strip_prefix_ignore_case(rest, "arxiv.org/")?;
    let path = path.split(['?', '#']).next().unwrap_or(path);

    let id = ["abs/", "pdf/", "e-print/"]
        .iter()
        .find_map(|kind| path.strip_prefix(kind))?;
    let id = id.trim_end_matches('/');
    let id = id.strip_suffix(".pdf").unwrap_or(id);

    is_arxiv_id(id).then_some(id)
}

/// Whether `s` is an arXiv identifier, either new style (`2301.01234v2`) or
/// old style (`hep-th/9901001`).
fn is_arxiv_id(s: &str) -> bool {
    let base = match s.rfind('v') {
        Some(pos) if is_digits(&s[pos + 1..]) => &s[..pos],
        _ => s,
    };

    if let Some((archive, number)) = base.split_once('/') {
        let archive = archive.split_once('.').map_or(archive, |(a, _)| a);
        return !archive.is_empty()
            && archive.chars().all(|c| c.is_ascii_lowercase() || c == '-')
            && number.len() == 7
            && is_digits(number);
    }

    match base.split_once('.') {
        Some((yymm, number)) => {
            yymm.len() == 4
                && is_digits(yymm)
                && (4..=5).contains(&number.len())
                && is_digits(number)
        }
        None => false,
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_identifiers() {
        assert_eq!(
            resolve_query(" 2301.01234 "),
            Some(PdfSource::Arxiv("2301.01234".to_string()))
        );
        assert_eq!(
            resolve_query("arXiv:1706.03762v7"),
            Some(PdfSource::Arxiv("1706.03762v7".to_string()))
        );
        assert_eq!(
            resolve_query("hep-th/9901001"),
            Some(PdfSource::Arxiv("hep-th/9901001".to_string()))
        );
        assert_eq!(
            resolve_query("math.GT/0309136v2"),
            Some(PdfSource::Arxiv("math.GT/0309136v2".to_string()))
        );
    }

    #[test]
    fn arxiv_links_become_identifiers() {
        assert_eq!(
            resolve_query("https://arxiv.org/abs/2301.01234"),
            Some(PdfSource::Arxiv("2301.01234".to_string()))
        );
        assert_eq!(
            resolve_query("http://www.arxiv.org/pdf/2301.01234v2.pdf"),
            Some(PdfSource::Arxiv("2301.01234v2".to_string()))
        );
    }

    #[test]
    fn other_links_are_kept() {
        let url = "https://example.com/paper.pdf";
        assert_eq!(resolve_query(url), Some(PdfSource::Url(url.to_string())));
        assert_eq!(PdfSource::Url(url.to_string()).source_archive_url(), None);
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(resolve_query(""), None);
        assert_eq!(resolve_query("figure cropping"), None);
        assert_eq!(resolve_query("2301.123"), None);
        assert_eq!(resolve_query("12345.6789"), None);
    }

    #[test]
    fn urls_for_arxiv_sources() {
        let source = PdfSource::Arxiv("2301.01234".to_string());
        assert_eq!(source.pdf_url(), "https://arxiv.org/pdf/2301.01234");
        assert_eq!(
            source.source_archive_url().as_deref(),
            Some("https://arxiv.org/e-print/2301.01234")
        );
        assert_eq!(source.arxiv_id(), Some("2301.01234"));
    }

    #[test]
    fn fetch_status() {
        assert!(check_fetch_status(200).is_ok());
        assert_eq!(
            check_fetch_status(404),
            Err(CropError::Network { status: Some(404) })
        );
    }
}
