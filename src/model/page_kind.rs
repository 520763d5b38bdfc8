/// Page kind definitions for classified raw pages
///
/// Every raw page is labelled once, at classification time, with the layout it
/// follows. Extraction is chosen from this label.
use std::fmt;

/// The layout of a fetched statutes page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    // ===== Link Tables =====
    /// The full "Table of Chapters" listing
    ChaptersTable,

    /// A partial chapters listing such as "Table of Chapters, 1 - 2A"
    ChaptersShortTable,

    /// A chapter page listing its sections
    SectionsTable,

    // ===== Content =====
    /// A single statute section
    Statutes,

    // ===== Sentinel =====
    /// Classification failed; never extracted
    Unrecognized,
}

impl PageKind {
    /// Returns true if pages of this kind yield links for the frontier
    pub fn is_table(&self) -> bool {
        matches!(
            self,
            Self::ChaptersTable | Self::ChaptersShortTable | Self::SectionsTable
        )
    }

    /// Returns true if pages of this kind yield statute content
    pub fn is_statute(&self) -> bool {
        matches!(self, Self::Statutes)
    }

    /// Short stable label used in logs and operator output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChaptersTable => "chapters_table",
            Self::ChaptersShortTable => "chapters_short_table",
            Self::SectionsTable => "sections_table",
            Self::Statutes => "statutes",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
