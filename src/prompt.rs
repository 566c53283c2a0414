use crate::catalog::TitleRecord;

pub const SYSTEM_PROMPT: &str = "You are a helpful movie recommendation assistant.";

/// Renders one record as labeled lines, skipping fields it doesn't have.
pub fn render_title(record: &TitleRecord) -> String {
    let mut lines = vec![format!("Title: {}", record.title)];

    if !record.genres.is_empty() {
        lines.push(format!("Genre: {}", record.genres.join(", ")));
    }
    if let Some(synopsis) = &record.synopsis {
        lines.push(format!("Description: {}", synopsis));
    }
    if let Some(date) = &record.release_date {
        lines.push(format!("Release Date: {}", date));
    }

    lines.join("\n")
}

pub fn render_catalog(builtins: &[TitleRecord], fetched: &[TitleRecord]) -> String {
    builtins
        .iter()
        .chain(fetched)
        .map(render_title)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Builds the user turn sent to the completion service. `description` must
/// already be escaped.
pub fn compose(builtins: &[TitleRecord], fetched: &[TitleRecord], description: &str) -> String {
    let catalog = render_catalog(builtins, fetched);

    let mut result = String::with_capacity(catalog.len() + description.len() + 160);
    result.push_str("User says: \"");
    result.push_str(description);
    result.push_str("\".\nHere are some movies they are considering:\n");
    result.push_str(&catalog);
    result.push_str("\nRecommend the best movie for them to watch based on their preferences.");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_catalog;

    fn fetched_heat() -> TitleRecord {
        TitleRecord {
            title: "Heat".into(),
            genres: vec!["Crime".into(), "Drama".into()],
            synopsis: Some("A group of professional bank robbers...".into()),
            release_date: Some("December 15, 1995 (United States)".into()),
            source_url: Some("https://www.imdb.com/title/tt0113277/".into()),
        }
    }

    #[test]
    fn bare_title_renders_single_line() {
        assert_eq!(render_title(&TitleRecord::named("Titanic")), "Title: Titanic");
    }

    #[test]
    fn full_record_renders_all_labels() {
        assert_eq!(
            render_title(&fetched_heat()),
            "Title: Heat\n\
             Genre: Crime, Drama\n\
             Description: A group of professional bank robbers...\n\
             Release Date: December 15, 1995 (United States)"
        );
    }

    #[test]
    fn builtins_come_before_fetched() {
        let rendered = render_catalog(&builtin_catalog(), &[fetched_heat()]);
        let blocks: Vec<&str> = rendered.split("\n\n").collect();
        assert_eq!(blocks.len(), 11);
        assert_eq!(blocks[0], "Title: The Silence of the Lambs");
        assert!(blocks[10].starts_with("Title: Heat\nGenre: Crime, Drama"));
    }

    #[test]
    fn prompt_embeds_description_and_catalog() {
        let prompt = compose(&builtin_catalog(), &[], "I love tense thrillers.");
        assert!(prompt.starts_with("User says: \"I love tense thrillers.\".\n"));
        assert!(prompt.contains("Title: Forrest Gump\nRecommend the best movie"));
        assert_eq!(prompt.matches("Title: ").count(), 10);
    }
}
