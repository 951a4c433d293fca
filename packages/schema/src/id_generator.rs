use chrono::Utc;

/// Session-scoped generator for node ids.
///
/// Ids look like `field-18f2a3c4b10-7-3fa9c1`: a millisecond timestamp,
/// a per-generator counter and a random suffix, so ids minted in the same
/// millisecond (duplicating a subtree) never collide.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: String,
    count: u64,
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            count: 0,
        }
    }

    /// Generate next id
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        let millis = Utc::now().timestamp_millis();
        let suffix = rand::random::<u32>() & 0x00ff_ffff;
        format!("{}-{:x}-{}-{:06x}", self.prefix, millis, self.count, suffix)
    }

    /// Generate an id for which `is_taken` returns false
    pub fn new_id_avoiding<F>(&mut self, is_taken: F) -> String
    where
        F: Fn(&str) -> bool,
    {
        loop {
            let id = self.new_id();
            if !is_taken(&id) {
                return id;
            }
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u64 {
        self.count
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new("field")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rapid_ids_are_unique() {
        let mut gen = IdGenerator::new("field");
        let ids: HashSet<String> = (0..1000).map(|_| gen.new_id()).collect();

        assert_eq!(ids.len(), 1000);
        assert_eq!(gen.issued(), 1000);
        assert!(ids.iter().all(|id| id.starts_with("field-")));
    }

    #[test]
    fn test_avoids_taken_ids() {
        let mut gen = IdGenerator::new("col");
        let first = gen.new_id();
        let second = gen.new_id_avoiding(|id| id == first);
        assert_ne!(first, second);
    }
}
