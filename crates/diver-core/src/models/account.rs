use serde::{Deserialize, Serialize};

/// Identity of the logged-in user, as reported by `GET /id/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "fullName", default)]
    pub full_name: Option<String>,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
}

impl Account {
    pub fn display_name(&self) -> String {
        match self.full_name.as_deref() {
            Some(full) if !full.is_empty() => format!("{} ({})", self.name, full),
            _ => self.name.clone(),
        }
    }
}
