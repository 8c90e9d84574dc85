use uuid::Uuid;

/// Generate an opaque identifier. Used for both sessions and messages;
/// identifiers carry no structural meaning and are never reused.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = new_id();
        let b = new_id();
        assert!(!a.is_empty());
        assert_ne!(a, b);
    }
}
