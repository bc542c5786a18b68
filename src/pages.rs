use serde::Serialize;
use thiserror::Error;

pub const DASHBOARD: &str = "Dashboard";
pub const ADDITIONAL_CONTENT: &str = "Additional Content";
pub const PROTECTED_PAGES: [&str; 2] = [DASHBOARD, ADDITIONAL_CONTENT];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("current page '{0}' is not in the page list")]
    InvalidState(String),
    #[error("page '{0}' does not exist")]
    NotFound(String),
    #[error("page '{0}' is protected and cannot be removed")]
    Protected(String),
}

pub fn is_protected(name: &str) -> bool {
    PROTECTED_PAGES.contains(&name)
}

/// Returns the page after `current`, wrapping to the first page.
pub fn next_page<'a, S: AsRef<str>>(pages: &'a [S], current: &str) -> Result<&'a str, PageError> {
    let index = index_of(pages, current)?;
    Ok(pages[(index + 1) % pages.len()].as_ref())
}

/// Returns the page before `current`, wrapping to the last page.
pub fn previous_page<'a, S: AsRef<str>>(pages: &'a [S], current: &str) -> Result<&'a str, PageError> {
    let index = index_of(pages, current)?;
    let len = pages.len();
    Ok(pages[(index + len - 1) % len].as_ref())
}

fn index_of<S: AsRef<str>>(pages: &[S], current: &str) -> Result<usize, PageError> {
    pages
        .iter()
        .position(|page| page.as_ref() == current)
        .ok_or_else(|| PageError::InvalidState(current.to_string()))
}

/// Ordered page names. The protected pages always occupy the first two slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PageList {
    names: Vec<String>,
}

impl Default for PageList {
    fn default() -> Self {
        Self::new()
    }
}

impl PageList {
    pub fn new() -> Self {
        Self {
            names: PROTECTED_PAGES.iter().map(|name| name.to_string()).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|page| page == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|page| page == name)
    }

    /// Pages that may be removed, in display order.
    pub fn removable(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str).filter(|name| !is_protected(name))
    }

    /// Appends the first unused "Additional Page N" and returns its name.
    pub fn add_page(&mut self) -> String {
        let name = (1..)
            .map(|count| format!("Additional Page {count}"))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or_default();
        self.names.push(name.clone());
        name
    }

    pub fn remove_page(&mut self, name: &str) -> Result<(), PageError> {
        if is_protected(name) {
            return Err(PageError::Protected(name.to_string()));
        }
        let index = self
            .position(name)
            .ok_or_else(|| PageError::NotFound(name.to_string()))?;
        self.names.remove(index);
        Ok(())
    }

    pub fn next(&self, current: &str) -> Result<&str, PageError> {
        next_page(&self.names, current)
    }

    pub fn previous(&self, current: &str) -> Result<&str, PageError> {
        previous_page(&self.names, current)
    }
}
