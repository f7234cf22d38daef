//! Rendering a [`Book`] as a markdown document.

use crate::{Book, Character};

impl Book {
    /// Render the book as markdown.
    ///
    /// Layout: title and author, a "Starring" section with each character's
    /// portrait and personality, a table of contents, then every outlined
    /// chapter. Missing portraits and chapters are marked in place so a
    /// partially complete book still reads in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use deepbook_story::Book;
    ///
    /// let markdown = Book::new("A turtle").to_markdown();
    /// assert!(markdown.starts_with("# Untitled"));
    /// ```
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();

        match self.metadata() {
            Some(metadata) => {
                out.push_str(&format!("# {}\n\nBy {}", metadata.title(), metadata.author()));
                if let Some(year) = metadata.year() {
                    out.push_str(&format!(" ({year})"));
                }
                out.push_str("\n\n");
            }
            None => out.push_str("# Untitled\n\n"),
        }

        if !self.characters().is_empty() {
            out.push_str("## Starring\n\n");
            for character in self.characters() {
                out.push_str(&character_section(character));
            }
        }

        if let Some(outline) = self.outline() {
            out.push_str("## Contents\n\n");
            for entry in outline.chapters() {
                out.push_str(&format!("- **Chapter {}**: {}\n", entry.index(), entry.title()));
            }
            out.push('\n');

            out.push_str("## Story\n\n");
            for entry in outline.chapters() {
                out.push_str(&format!("### Chapter {}: {}\n\n", entry.index(), entry.title()));
                match self.chapter(*entry.index()) {
                    Some(chapter) => out.push_str(&format!("{}\n\n", chapter.text().trim())),
                    None => out.push_str("_This chapter could not be generated._\n\n"),
                }
            }
        }

        let trimmed = out.trim_end().len();
        out.truncate(trimmed);
        out.push('\n');
        out
    }
}

fn character_section(character: &Character) -> String {
    let portrait = match character.illustration() {
        Some(illustration) if !illustration.image().is_empty() => format!(
            "![{}]({})",
            character.name(),
            illustration.image().markdown_target()
        ),
        _ => "_Illustration unavailable_".to_string(),
    };
    format!(
        "### {}\n\n{}\n\n{}\n\n",
        character.name(),
        portrait,
        character.personality()
    )
}
