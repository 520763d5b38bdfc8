/// A parsed statute section
///
/// `chapter` and `section` together form the primary identifier. A repealed
/// section is represented by `Statute::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statute {
    pub chapter: String,
    pub section: String,
    pub title: String,
    /// Subdivisions in source-document order
    pub subdivisions: Vec<Subdivision>,
}

impl Statute {
    /// The `<chapter>.<section>` identifier
    pub fn id(&self) -> String {
        format!("{}.{}", self.chapter, self.section)
    }

    /// True for the explicit empty value produced by a repealed section
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.subdivisions.is_empty()
    }
}

/// A numbered sub-part of a statute section
///
/// The synthetic whole-section subdivision has an empty number and heading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subdivision {
    pub number: String,
    pub heading: String,
    pub content: String,
}

impl Subdivision {
    /// Builds the single unnumbered subdivision for a section without subdivisions
    pub fn whole_section(content: impl Into<String>) -> Self {
        Self {
            number: String::new(),
            heading: String::new(),
            content: content.into(),
        }
    }
}

/// A retrievable text unit keyed by a deterministic id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: String,
    pub body: String,
}
