//! Catalog persistence modules
//!
//! One module per entity, each owning its record struct and query functions.
//! All guids are stored as hyphenated UUID text and parsed on read.

pub mod communities;
pub mod companies;
pub mod plans;
pub mod price_history;

/// True when a sqlx error is a SQLite UNIQUE constraint violation.
///
/// Used to translate duplicate-name inserts into conflict responses, and by
/// the resolver to recover from losing a create-community race.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.message().contains("UNIQUE constraint failed"),
        _ => false,
    }
}

/// Escape LIKE wildcards so a name can be matched literally.
///
/// Case-insensitive name lookups go through LIKE; `%`, `_` and the escape
/// character itself must not act as wildcards when they appear in a name.
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
