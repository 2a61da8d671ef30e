// src/keys.rs

pub const KEY_LEN: usize = 6;

/// A MIFARE Classic sector key (Key A or Key B).
pub type Key = [u8; KEY_LEN];

/// Default keys shipped by common card vendors, in trial priority order.
pub const DEFAULT_KEYS: [Key; 8] = [
    [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
    [0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5],
    [0xD3, 0xF7, 0xD3, 0xF7, 0xD3, 0xF7],
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    [0xB0, 0xB1, 0xB2, 0xB3, 0xB4, 0xB5],
    [0x4D, 0x3A, 0x99, 0xC3, 0x51, 0xDD],
    [0x1A, 0x98, 0x2C, 0x7E, 0x45, 0x9A],
    [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF],
];

/// Ordered candidate-key list. Built once at engine construction and never
/// mutated; the trial order is the priority order.
#[derive(Debug, Clone)]
pub struct KeySet {
    keys: Vec<Key>,
}

impl KeySet {
    pub fn new(keys: Vec<Key>) -> Self {
        Self { keys }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.keys.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Key> {
        self.keys.get(index)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Default for KeySet {
    fn default() -> Self {
        Self::new(DEFAULT_KEYS.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_keeps_priority_order() {
        let keys = KeySet::default();
        assert!(!keys.is_empty());
        assert_eq!(keys.len(), DEFAULT_KEYS.len());
        // The transport key stays first: it is by far the most common.
        assert_eq!(keys.get(0), Some(&[0xFF; 6]));
        assert_eq!(keys.iter().next(), Some(&[0xFF; 6]));
    }

    #[test]
    fn custom_set_can_be_empty() {
        let keys = KeySet::new(Vec::new());
        assert!(keys.is_empty());
        assert_eq!(keys.len(), 0);
        assert!(keys.get(0).is_none());
    }
}
