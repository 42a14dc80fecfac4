use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Driver", default)]
    pub driver: Option<String>,
    #[serde(rename = "Scope", default)]
    pub scope: Option<String>,
}

impl Network {
    pub fn short_id(&self) -> &str {
        super::short_id(&self.id)
    }
}
