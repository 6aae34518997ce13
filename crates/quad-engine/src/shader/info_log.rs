use std::fmt;

/// Maximum size of a diagnostic log in bytes.
pub const INFO_LOG_CAPACITY: usize = 512;

/// Bounded diagnostic text produced by compile and link.
///
/// Never longer than [`INFO_LOG_CAPACITY`] bytes; truncation happens on a UTF-8
/// character boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoLog(String);

impl InfoLog {
    pub fn new(text: impl Into<String>) -> Self {
        let mut text = text.into();
        if text.len() > INFO_LOG_CAPACITY {
            let mut end = INFO_LOG_CAPACITY;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text.truncate(end);
        }
        Self(text)
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for InfoLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_kept() {
        assert_eq!(InfoLog::new("0:1: error").as_str(), "0:1: error");
    }

    #[test]
    fn long_text_is_capped() {
        let log = InfoLog::new("x".repeat(2000));
        assert_eq!(log.len(), INFO_LOG_CAPACITY);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 'é' is two bytes; 511 ASCII bytes put its start at the cap boundary.
        let text = format!("{}é tail", "a".repeat(INFO_LOG_CAPACITY - 1));
        let log = InfoLog::new(text);
        assert!(log.len() <= INFO_LOG_CAPACITY);
        assert_eq!(log.len(), INFO_LOG_CAPACITY - 1);
    }
}
