use thiserror::Error;

/// Failures callers need to tell apart from plain I/O errors.
///
/// Ordinary data-quality noise (missing years, unparseable cells) is
/// recovered during cleaning and never surfaces here; these variants mark
/// the cases where the source itself no longer looks like the table this
/// crate was written against.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DigestError {
    /// Rejected before any network or disk access.
    #[error("unsupported digest year {0}: expected a 4-digit year from 2009 through the current year")]
    UnsupportedYear(u16),

    /// The scraped table no longer has the hard-coded column layout.
    #[error("expenditure table has {found} columns, expected {expected}: the published layout has changed")]
    StructuralMismatch { expected: usize, found: usize },

    /// The table parsed but contained no row with a usable year label.
    #[error("expenditure table contains no usable year rows")]
    EmptyTable,
}
