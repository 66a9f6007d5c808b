//! Configuration for the session controller

use casewell_store::PAGE_SIZE;

/// Maximum length of a case title auto-derived from a narrative
pub const TITLE_MAX_CHARS: usize = 48;

/// Tunables for [`CaseSession`](crate::CaseSession)
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Page size for the case and message history feeds
    pub page_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
        }
    }
}
