//! Page cursors for the two search pagination schemes

use serde::{Deserialize, Serialize};

use crate::types::SearchPage;

/// Which search endpoint (and so which pagination scheme) to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Opaque continuation token
    #[default]
    Token,
    /// Numeric `startAt` offset against a reported total
    Offset,
}

/// Page selector sent with a search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    Token {
        token: Option<String>,
        page_size: u64,
    },
    Offset {
        start_at: u64,
        page_size: u64,
    },
}

impl PageRequest {
    pub fn page_size(&self) -> u64 {
        match self {
            PageRequest::Token { page_size, .. } | PageRequest::Offset { page_size, .. } => {
                *page_size
            }
        }
    }
}

/// Offset window shared by offset search and per-issue worklog paging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetWindow {
    pub start_at: u64,
    pub page_size: u64,
}

impl OffsetWindow {
    pub fn new(page_size: u64) -> Self {
        Self {
            start_at: 0,
            page_size: page_size.max(1),
        }
    }

    /// Move past the page just read. Returns false once `total` is consumed
    /// or the server returned nothing.
    pub fn advance(&mut self, total: u64, received: usize) -> bool {
        let consumed = self.start_at + self.page_size;
        if received == 0 || total <= consumed {
            return false;
        }
        self.start_at = consumed;
        true
    }
}

/// Position within a paginated search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    Token {
        next: Option<String>,
        page_size: u64,
        exhausted: bool,
    },
    Offset {
        window: OffsetWindow,
        exhausted: bool,
    },
}

impl PageCursor {
    pub fn new(mode: SearchMode, page_size: u64) -> Self {
        match mode {
            SearchMode::Token => PageCursor::Token {
                next: None,
                page_size: page_size.max(1),
                exhausted: false,
            },
            SearchMode::Offset => PageCursor::Offset {
                window: OffsetWindow::new(page_size),
                exhausted: false,
            },
        }
    }

    /// Selector for the next page, or `None` when done
    pub fn current(&self) -> Option<PageRequest> {
        match self {
            PageCursor::Token { exhausted: true, .. }
            | PageCursor::Offset { exhausted: true, .. } => None,
            PageCursor::Token {
                next, page_size, ..
            } => Some(PageRequest::Token {
                token: next.clone(),
                page_size: *page_size,
            }),
            PageCursor::Offset { window, .. } => Some(PageRequest::Offset {
                start_at: window.start_at,
                page_size: window.page_size,
            }),
        }
    }

    /// Record a received page and decide whether another follows
    pub fn advance(&mut self, page: &SearchPage) {
        match self {
            PageCursor::Token {
                next, exhausted, ..
            } => match &page.next_page_token {
                // A repeated token would loop forever
                Some(token) if !token.is_empty() && next.as_ref() != Some(token) => {
                    *next = Some(token.clone());
                }
                _ => *exhausted = true,
            },
            PageCursor::Offset { window, exhausted } => {
                let total = page.total.unwrap_or(0);
                if !window.advance(total, page.issues.len()) {
                    *exhausted = true;
                }
            }
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.current().is_none()
    }
}
