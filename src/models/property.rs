#[derive(Debug, Clone)]
pub struct Property {
    pub id: Option<i64>,
    pub nickname: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    /// Owner equity in cents, used for return-on-equity.
    pub equity: Option<i64>,
    pub created_at: String,
}

impl Property {
    pub fn new(nickname: String) -> Self {
        Self {
            id: None,
            nickname,
            street: String::new(),
            city: String::new(),
            state: String::new(),
            zip: String::new(),
            equity: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Single-line address, skipping empty parts.
    pub fn address(&self) -> String {
        let state_zip = [self.state.as_str(), self.zip.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        [self.street.as_str(), self.city.as_str(), state_zip.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.nickname)
    }
}
