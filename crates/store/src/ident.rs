use uuid::Uuid;

/// Generate a collection-scoped record id: a fixed prefix plus a 128-bit
/// random token.  Random tokens remove the collision window that a
/// wall-clock id would have under rapid successive creation.
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}{}", Uuid::new_v4().simple())
}
