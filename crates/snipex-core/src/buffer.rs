use std::collections::VecDeque;

/// Sliding window over the most recently typed characters
#[derive(Debug, Clone)]
pub struct TypedBuffer {
    chars: VecDeque<char>,
    capacity: usize,
}

impl TypedBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            chars: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Append typed text, dropping the oldest characters beyond capacity
    pub fn push_str(&mut self, text: &str) {
        self.chars.extend(text.chars());
        while self.chars.len() > self.capacity {
            self.chars.pop_front();
        }
    }

    pub fn pop(&mut self) -> Option<char> {
        self.chars.pop_back()
    }

    pub fn clear(&mut self) {
        self.chars.clear();
    }

    pub fn contents(&self) -> String {
        self.chars.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_contents() {
        let mut buffer = TypedBuffer::new(50);
        buffer.push_str("ab");
        buffer.push_str("c");
        assert_eq!(buffer.contents(), "abc");
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_overflow_keeps_most_recent_suffix() {
        let mut buffer = TypedBuffer::new(50);
        let typed: String = (0..120)
            .map(|i| char::from(b'a' + (i % 26) as u8))
            .collect();

        for c in typed.chars() {
            buffer.push_str(&c.to_string());
            assert!(buffer.len() <= 50);
        }

        let expected: String = typed.chars().skip(70).collect();
        assert_eq!(buffer.contents(), expected);
    }

    #[test]
    fn test_multi_char_push_truncates_from_front() {
        let mut buffer = TypedBuffer::new(4);
        buffer.push_str("abcdef");
        assert_eq!(buffer.contents(), "cdef");
    }

    #[test]
    fn test_pop_removes_one_trailing_char() {
        let mut buffer = TypedBuffer::new(50);
        buffer.push_str("héllo");
        assert_eq!(buffer.pop(), Some('o'));
        assert_eq!(buffer.contents(), "héll");

        buffer.clear();
        assert_eq!(buffer.pop(), None);
        assert!(buffer.is_empty());
    }
}
