mod sqlx_journal;

pub use sqlx_journal::SqlxJournal;
