//! Recognising pages that mean "your session is not valid".

/// Seizure/blocked pages are tiny; a real listing never is.
const BLOCKED_PAGE_MAX_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Ok,
    /// Login form served instead of content.
    LoginRequired,
    /// Short blocked/seizure notice.
    Blocked,
    /// Database error page; usually a bad session.
    SqlError,
}

impl PageState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, PageState::Ok)
    }
}

pub fn detect_page_state(html: &str) -> PageState {
    if html.contains("SQL Error") {
        return PageState::SqlError;
    }
    if html.contains("nsls.jpg") && html.len() < BLOCKED_PAGE_MAX_LEN {
        return PageState::Blocked;
    }
    if html.contains("login.php") && !html.contains("logout") {
        return PageState::LoginRequired;
    }
    PageState::Ok
}
