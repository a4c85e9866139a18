use uuid::Uuid;

/// An already authenticated user, as handed over by the auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    /// Staff and superusers bypass every access check.
    pub admin: bool,
}

impl User {
    pub fn new(id: Uuid) -> Self {
        Self { id, admin: false }
    }

    pub fn admin(id: Uuid) -> Self {
        Self { id, admin: true }
    }
}
