//! Database row types. These map directly to SQLite rows and are kept
//! distinct from the magus-types API models so the hash never leaks upward
//! by accident.

pub struct UserRow {
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl std::fmt::Debug for UserRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRow")
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
