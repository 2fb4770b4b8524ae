//! Local track catalog.
//!
//! AutoDJ only recommends tracks the user owns. The catalog answers
//! "which local files are this artist's track with this title?".

pub mod memory;

use crate::error::Result;
use crate::types::CatalogTrack;

pub use memory::MemoryCatalog;

/// Query access to the local catalog.
pub trait LocalCatalog: Send + Sync {
    /// Returns every record whose title equals `title` and whose artist matches `artist`.
    ///
    /// Both arguments are expected to have been passed through [`sanitize`].
    fn query_by_artist_and_title(&self, artist: &str, title: &str) -> Result<Vec<CatalogTrack>>;
}

/// Removes characters that are not allowed in a catalog query and trims the result.
///
/// Quotes, wildcards and the multi-value separator are stripped so that a
/// remote name can never widen or break a lookup.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\'' | '"' | '%' | '_' | '|' | ';' | '`' | '*'))
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_query_characters() {
        assert_eq!(sanitize("Guns N' Roses"), "Guns N Roses");
        assert_eq!(sanitize(" 100% \"Pure\" "), "100 Pure");
        assert_eq!(sanitize("a|b;c_d"), "abcd");
        assert_eq!(sanitize("tab\there"), "tabhere");
    }

    #[test]
    fn sanitize_keeps_plain_text() {
        assert_eq!(sanitize("Sigur Rós"), "Sigur Rós");
        assert_eq!(sanitize("AC/DC"), "AC/DC");
    }
}
