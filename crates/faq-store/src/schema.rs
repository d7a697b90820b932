//! Database schema definitions.

/// Main schema SQL for initializing the database.
///
/// Row order (`id`) is the corpus order seen by the search engine.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS faqs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    question_id TEXT,
    category TEXT,
    question TEXT,
    answer TEXT,
    embedding BLOB
);

CREATE INDEX IF NOT EXISTS idx_faqs_question_id ON faqs(question_id);
CREATE INDEX IF NOT EXISTS idx_faqs_category ON faqs(category);
"#;

/// Schema version for migrations.
pub const SCHEMA_VERSION: u32 = 1;
