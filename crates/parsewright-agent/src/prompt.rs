//! Prompt construction for candidate generation

use parsewright_domain::{FeedbackHistory, ProfileId, TabularResult};

/// System instruction sent with every generation request
pub const SYSTEM_INSTRUCTION: &str = "You write small, self-contained programs that extract \
tabular data from bank statement documents. You reply with source code only.";

/// Builds the generation prompt for one attempt
pub struct PromptBuilder<'a> {
    profile: &'a ProfileId,
    ground_truth: &'a TabularResult,
    language: &'a str,
    preview_rows: usize,
    excerpt: Option<&'a str>,
    history: &'a FeedbackHistory,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(
        profile: &'a ProfileId,
        ground_truth: &'a TabularResult,
        history: &'a FeedbackHistory,
    ) -> Self {
        Self {
            profile,
            ground_truth,
            language: "Python 3",
            preview_rows: 5,
            excerpt: None,
            history,
        }
    }

    /// Language the candidate must be written in
    pub fn with_language(mut self, language: &'a str) -> Self {
        self.language = language;
        self
    }

    /// Number of ground-truth rows to show
    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    /// Text of the sample document, already truncated
    pub fn with_excerpt(mut self, excerpt: Option<&'a str>) -> Self {
        self.excerpt = excerpt;
        self
    }

    /// Build the complete generation prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        // 1. Task and I/O contract
        prompt.push_str(&format!(
            "Write a {} program that extracts the transactions table from a '{}' bank statement.\n\n",
            self.language, self.profile
        ));
        prompt.push_str(IO_CONTRACT);
        prompt.push_str("\n\n");

        // 2. Expected schema
        prompt.push_str("Expected columns, in this exact order:\n");
        for (position, column) in self.ground_truth.columns().iter().enumerate() {
            prompt.push_str(&format!(
                "{}. \"{}\" ({})\n",
                position + 1,
                column.name,
                column.column_type
            ));
        }
        prompt.push_str(&format!(
            "The sample document has {} rows.\n\n",
            self.ground_truth.row_count()
        ));

        // 3. Ground-truth preview
        let preview = self.ground_truth.head(self.preview_rows);
        if preview.row_count() > 0 {
            prompt.push_str(&format!(
                "First {} expected rows (JSON arrays):\n",
                preview.row_count()
            ));
            for row in preview.rows() {
                match serde_json::to_string(row) {
                    Ok(line) => prompt.push_str(&line),
                    Err(_) => prompt.push_str("(unrenderable row)"),
                }
                prompt.push('\n');
            }
            prompt.push('\n');
        }

        // 4. Sample document text
        if let Some(excerpt) = self.excerpt {
            prompt.push_str("Text of the sample document:\n");
            prompt.push_str("---\n");
            prompt.push_str(excerpt);
            prompt.push_str("\n---\n\n");
        }

        // 5. Every earlier failure
        if !self.history.is_empty() {
            prompt.push_str("Previous attempts failed. Fix all of these problems:\n");
            for entry in self.history.entries() {
                prompt.push_str(&format!("- {}\n", entry));
            }
            prompt.push('\n');
        }

        // 6. Output format reminder
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }
}

/// First `max_chars` characters of `text`, on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

const IO_CONTRACT: &str = r#"The program is run as `<interpreter> <script> <document-path>`.
It must print exactly one JSON object to stdout:

{"columns": [{"name": "...", "type": "text" | "number"}, ...], "rows": [[...], ...]}

- Text cells are JSON strings, number cells are JSON numbers, missing values are null
- Log lines may be printed before the JSON object, never after it
- Exit with status 0 on success
- Do not access the network; only read the document path given as the first argument"#;

const OUTPUT_FORMAT_REMINDER: &str =
    "Remember: Return ONLY the program source, no explanations before or after it.";
