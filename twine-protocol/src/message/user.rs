use serde::{Deserialize, Serialize};

/// Account that authors or receives messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub screen_name: String,
    #[serde(default)]
    pub name: String,
}

impl User {
    pub fn new(id: u64, screen_name: impl Into<String>) -> Self {
        let screen_name = screen_name.into();
        Self {
            id,
            name: screen_name.clone(),
            screen_name,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Screen names compare case-insensitively on the service.
    pub fn is(&self, screen_name: &str) -> bool {
        self.screen_name
            .eq_ignore_ascii_case(screen_name.trim_start_matches('@'))
    }
}
