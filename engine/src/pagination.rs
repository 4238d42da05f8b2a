use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Continuation token handed back by an upstream listing.
/// The contents are owned by the upstream; the only valid operation is
/// sending the token back verbatim to fetch the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of a cursor-paginated listing. A present `next_cursor` means
/// more results exist; an absent one terminates the listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<Cursor>) -> Self {
        Self { items, next_cursor }
    }

    /// A page with nothing after it.
    pub fn end(items: Vec<T>) -> Self {
        Self::new(items, None)
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_keeps_the_cursor() {
        let page = Page::new(vec![1, 2, 3], Some(Cursor::new("abc")));
        let mapped = page.map(|n| n * 10);

        assert_eq!(vec![10, 20, 30], mapped.items);
        assert_eq!(Some(Cursor::new("abc")), mapped.next_cursor);
        assert!(!mapped.is_last());
    }

    #[test]
    fn end_page_terminates() {
        let page = Page::end(vec!["a"]);
        assert!(page.is_last());
    }

    #[test]
    fn cursor_serializes_as_a_bare_string() {
        let json = serde_json::to_string(&Cursor::new("tok_1")).unwrap();
        assert_eq!("\"tok_1\"", json);
    }
}
