use serde::Serialize;

/// Metadata for one film, either from the built-in catalog or scraped from IMDb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleRecord {
    pub title: String,
    pub genres: Vec<String>,
    pub synopsis: Option<String>,
    pub release_date: Option<String>,
    /// Set only for records fetched from a page.
    pub source_url: Option<String>,
}

impl TitleRecord {
    pub fn named(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            genres: Vec::new(),
            synopsis: None,
            release_date: None,
            source_url: None,
        }
    }
}

const BUILTIN_TITLES: [&str; 10] = [
    "The Silence of the Lambs",
    "Pulp Fiction",
    "The Shawshank Redemption",
    "Inception",
    "Jurassic Park",
    "The Lord of the Rings: The Fellowship of the Ring",
    "Fight Club",
    "Titanic",
    "The Matrix",
    "Forrest Gump",
];

/// Titles always offered to the model, in a fixed order.
pub fn builtin_catalog() -> Vec<TitleRecord> {
    BUILTIN_TITLES.iter().copied().map(TitleRecord::named).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_ten_bare_titles() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog[0].title, "The Silence of the Lambs");
        assert_eq!(catalog[9].title, "Forrest Gump");
        assert!(catalog.iter().all(|t| t.source_url.is_none() && t.genres.is_empty()));
    }
}
