use std::sync::Arc;

use crate::page::Page;

/// Supplies the security token echoed back to the server on each request
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// A token known up front, e.g. passed on the command line
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Reads the token from a hidden form input at request time
pub struct HiddenInputToken {
    page: Arc<Page>,
    name: String,
}

impl HiddenInputToken {
    pub fn new(page: Arc<Page>, name: impl Into<String>) -> Self {
        Self {
            page,
            name: name.into(),
        }
    }
}

impl TokenProvider for HiddenInputToken {
    fn token(&self) -> Option<String> {
        self.page.hidden_input_value(&self.name)
    }
}
