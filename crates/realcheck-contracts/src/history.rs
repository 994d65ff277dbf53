use std::collections::VecDeque;

/// Newest-first window of recently shown image ids.
///
/// Used as a soft exclusion set: samplers prefer ids outside the window but
/// never fail because of it.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    ids: VecDeque<String>,
    capacity: usize,
}

impl SessionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: VecDeque::new(),
            capacity,
        }
    }

    pub fn record(&mut self, id: &str) {
        self.ids.retain(|existing| existing != id);
        self.ids.push_front(id.to_string());
        self.ids.truncate(self.capacity);
    }

    /// Records in order, so the last id ends up newest.
    pub fn record_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            self.record(id);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn newest(&self) -> Option<&str> {
        self.ids.front().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
