//! Ordered playlist of filename keys with a "current song" cursor.
//!
//! Entries live in an arena and are linked through stable slot handles, so
//! the cursor follows a logical entry rather than an index: moving another
//! entry around never changes what `current()` returns.

type Handle = usize;

#[derive(Debug, Clone, Default)]
struct Entry {
    key: String,
    prev: Option<Handle>,
    next: Option<Handle>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderedPlaylist {
    slots: Vec<Entry>,
    free: Vec<Handle>,
    head: Option<Handle>,
    tail: Option<Handle>,
    current: Option<Handle>,
    len: usize,
}

impl OrderedPlaylist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `key` as the last entry.
    ///
    /// The first entry ever appended to an empty playlist becomes the
    /// current one; later appends leave the cursor alone. Returns `false`
    /// without touching anything when the key is already present.
    pub fn append(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        if self.contains(&key) {
            return false;
        }

        let handle = self.alloc(key);
        self.link_back(handle);
        if self.current.is_none() {
            self.current = Some(handle);
        }
        self.len += 1;
        true
    }

    /// Removes the entry with `key`.
    ///
    /// If it was the current entry the cursor moves to its successor, or to
    /// its predecessor when it was last, or to nothing when the playlist
    /// becomes empty.
    pub fn delete(&mut self, key: &str) -> bool {
        let Some(handle) = self.find(key) else {
            return false;
        };

        if self.current == Some(handle) {
            let entry = &self.slots[handle];
            self.current = entry.next.or(entry.prev);
        }
        self.unlink(handle);
        self.release(handle);
        self.len -= 1;
        true
    }

    /// Advances the cursor to the following entry. No wraparound.
    pub fn next(&mut self) -> Option<String> {
        let next = self.slots[self.current?].next?;
        self.current = Some(next);
        Some(self.slots[next].key.clone())
    }

    /// Moves the cursor back to the preceding entry. No wraparound.
    pub fn prev(&mut self) -> Option<String> {
        let prev = self.slots[self.current?].prev?;
        self.current = Some(prev);
        Some(self.slots[prev].key.clone())
    }

    pub fn current(&self) -> Option<String> {
        self.current.map(|handle| self.slots[handle].key.clone())
    }

    /// Moves the entry with `key` to zero-based `position`.
    ///
    /// `position` counts entries after the moved one has been taken out, and
    /// anything past the end appends. The cursor keeps pointing at the same
    /// entry. Returns `false` only when the key is unknown.
    pub fn move_to_position(&mut self, key: &str, position: usize) -> bool {
        let Some(handle) = self.find(key) else {
            return false;
        };
        if self.len == 1 {
            return true;
        }

        self.unlink(handle);
        if position == 0 {
            self.link_front(handle);
            return true;
        }

        let mut anchor = self.head;
        let mut index = 0;
        while let Some(at) = anchor {
            if index >= position - 1 {
                break;
            }
            anchor = self.slots[at].next;
            index += 1;
        }

        match anchor {
            Some(at) => self.link_after(at, handle),
            None => self.link_back(handle),
        }
        true
    }

    /// Snapshot of every key, head to tail.
    pub fn all_keys(&self) -> Vec<String> {
        self.iter().map(str::to_owned).collect()
    }

    pub fn position_of(&self, key: &str) -> Option<usize> {
        self.iter().position(|k| k == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            playlist: self,
            at: self.head,
        }
    }

    fn find(&self, key: &str) -> Option<Handle> {
        let mut at = self.head;
        while let Some(handle) = at {
            let entry = &self.slots[handle];
            if entry.key == key {
                return Some(handle);
            }
            at = entry.next;
        }
        None
    }

    fn alloc(&mut self, key: String) -> Handle {
        let entry = Entry {
            key,
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(handle) => {
                self.slots[handle] = entry;
                handle
            }
            None => {
                self.slots.push(entry);
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, handle: Handle) {
        self.slots[handle] = Entry::default();
        self.free.push(handle);
    }

    /// Detaches `handle` from its neighbours, fixing head and tail.
    fn unlink(&mut self, handle: Handle) {
        let Entry { prev, next, .. } = self.slots[handle];

        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }

        let entry = &mut self.slots[handle];
        entry.prev = None;
        entry.next = None;
    }

    fn link_front(&mut self, handle: Handle) {
        self.slots[handle].next = self.head;
        match self.head {
            Some(h) => self.slots[h].prev = Some(handle),
            None => self.tail = Some(handle),
        }
        self.head = Some(handle);
    }

    fn link_back(&mut self, handle: Handle) {
        self.slots[handle].prev = self.tail;
        match self.tail {
            Some(t) => self.slots[t].next = Some(handle),
            None => self.head = Some(handle),
        }
        self.tail = Some(handle);
    }

    fn link_after(&mut self, anchor: Handle, handle: Handle) {
        let next = self.slots[anchor].next;
        self.slots[handle].prev = Some(anchor);
        self.slots[handle].next = next;
        match next {
            Some(n) => self.slots[n].prev = Some(handle),
            None => self.tail = Some(handle),
        }
        self.slots[anchor].next = Some(handle);
    }
}

pub struct Iter<'a> {
    playlist: &'a OrderedPlaylist,
    at: Option<Handle>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = &self.playlist.slots[self.at?];
        self.at = entry.next;
        Some(entry.key.as_str())
    }
}

impl<S: Into<String>> FromIterator<S> for OrderedPlaylist {
    fn from_iter<I: IntoIterator<Item = S>>(keys: I) -> Self {
        let mut playlist = Self::new();
        for key in keys {
            playlist.append(key);
        }
        playlist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> OrderedPlaylist {
        ["A", "B", "C"].into_iter().collect()
    }

    /// Walks the links both ways and checks they agree with `len`.
    fn assert_links(playlist: &OrderedPlaylist) {
        let forward = playlist.all_keys();
        assert_eq!(forward.len(), playlist.len());

        let mut backward = Vec::new();
        let mut at = playlist.tail;
        while let Some(handle) = at {
            backward.push(playlist.slots[handle].key.clone());
            at = playlist.slots[handle].prev;
        }
        backward.reverse();
        assert_eq!(forward, backward);

        match playlist.current {
            Some(handle) => assert!(forward.contains(&playlist.slots[handle].key)),
            None => assert!(playlist.is_empty()),
        }
    }

    #[test]
    fn test_append_keeps_order() {
        let mut playlist = OrderedPlaylist::new();
        for key in ["b.mp3", "a.mp3", "z.mp3", "m.mp3"] {
            assert!(playlist.append(key));
        }
        assert_eq!(playlist.all_keys(), vec!["b.mp3", "a.mp3", "z.mp3", "m.mp3"]);
        assert_links(&playlist);
    }

    #[test]
    fn test_append_rejects_duplicate() {
        let mut playlist = abc();
        assert!(!playlist.append("B"));
        assert_eq!(playlist.all_keys(), vec!["A", "B", "C"]);
        assert_eq!(playlist.len(), 3);
    }

    #[test]
    fn test_cursor_set_by_first_append_only() {
        let mut playlist = OrderedPlaylist::new();
        assert_eq!(playlist.current(), None);
        playlist.append("A");
        assert_eq!(playlist.current().as_deref(), Some("A"));
        playlist.append("B");
        assert_eq!(playlist.current().as_deref(), Some("A"));
    }

    #[test]
    fn test_delete() {
        let mut playlist = abc();
        assert!(playlist.delete("B"));
        assert_eq!(playlist.position_of("B"), None);
        assert_eq!(playlist.all_keys(), vec!["A", "C"]);
        assert_links(&playlist);

        assert!(!playlist.delete("B"));
        assert!(!playlist.delete("nope"));
        assert_eq!(playlist.all_keys(), vec!["A", "C"]);
    }

    #[test]
    fn test_delete_head_and_tail() {
        let mut playlist = abc();
        assert!(playlist.delete("A"));
        assert_eq!(playlist.all_keys(), vec!["B", "C"]);
        assert!(playlist.delete("C"));
        assert_eq!(playlist.all_keys(), vec!["B"]);
        assert_links(&playlist);
    }

    #[test]
    fn test_navigation_without_wraparound() {
        let mut playlist = abc();
        assert_eq!(playlist.current().as_deref(), Some("A"));
        assert_eq!(playlist.next().as_deref(), Some("B"));
        assert_eq!(playlist.next().as_deref(), Some("C"));
        assert_eq!(playlist.next(), None);
        assert_eq!(playlist.current().as_deref(), Some("C"));

        assert_eq!(playlist.prev().as_deref(), Some("B"));
        assert_eq!(playlist.prev().as_deref(), Some("A"));
        assert_eq!(playlist.prev(), None);
        assert_eq!(playlist.current().as_deref(), Some("A"));
    }

    #[test]
    fn test_navigation_on_empty() {
        let mut playlist = OrderedPlaylist::new();
        assert_eq!(playlist.next(), None);
        assert_eq!(playlist.prev(), None);
        assert_eq!(playlist.current(), None);
    }

    #[test]
    fn test_delete_current_single_entry() {
        let mut playlist: OrderedPlaylist = ["A"].into_iter().collect();
        assert!(playlist.delete("A"));
        assert_eq!(playlist.current(), None);
        assert!(playlist.is_empty());
        assert_links(&playlist);

        // cursor is re-established by the next append
        playlist.append("B");
        assert_eq!(playlist.current().as_deref(), Some("B"));
    }

    #[test]
    fn test_delete_current_middle_moves_forward() {
        let mut playlist = abc();
        playlist.next();
        assert!(playlist.delete("B"));
        assert_eq!(playlist.current().as_deref(), Some("C"));
        assert_links(&playlist);
    }

    #[test]
    fn test_delete_current_last_moves_back() {
        let mut playlist = abc();
        playlist.next();
        playlist.next();
        assert!(playlist.delete("C"));
        assert_eq!(playlist.current().as_deref(), Some("B"));
        assert_links(&playlist);
    }

    #[test]
    fn test_delete_other_keeps_cursor() {
        let mut playlist = abc();
        playlist.next();
        playlist.delete("A");
        assert_eq!(playlist.current().as_deref(), Some("B"));
        assert_eq!(playlist.prev(), None);
    }

    #[test]
    fn test_move_to_front() {
        let mut playlist = abc();
        assert!(playlist.move_to_position("C", 0));
        assert_eq!(playlist.all_keys(), vec!["C", "A", "B"]);
        assert_links(&playlist);
    }

    #[test]
    fn test_move_past_end_appends() {
        let mut playlist = abc();
        assert!(playlist.move_to_position("A", 5));
        assert_eq!(playlist.all_keys(), vec!["B", "C", "A"]);
        assert_links(&playlist);
    }

    #[test]
    fn test_move_counts_after_detach() {
        let mut playlist: OrderedPlaylist = ["A", "B", "C", "D"].into_iter().collect();
        assert!(playlist.move_to_position("A", 2));
        assert_eq!(playlist.all_keys(), vec!["B", "C", "A", "D"]);

        assert!(playlist.move_to_position("D", 1));
        assert_eq!(playlist.all_keys(), vec!["B", "D", "C", "A"]);

        // exactly the remaining length lands at the tail
        assert!(playlist.move_to_position("B", 3));
        assert_eq!(playlist.all_keys(), vec!["D", "C", "A", "B"]);
        assert_links(&playlist);
    }

    #[test]
    fn test_move_unknown_key() {
        let mut playlist = abc();
        assert!(!playlist.move_to_position("Z", 0));
        assert_eq!(playlist.all_keys(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_move_sole_entry() {
        let mut playlist: OrderedPlaylist = ["A"].into_iter().collect();
        assert!(playlist.move_to_position("A", 3));
        assert_eq!(playlist.all_keys(), vec!["A"]);
        assert_eq!(playlist.current().as_deref(), Some("A"));
    }

    #[test]
    fn test_move_keeps_cursor_on_entry() {
        let mut playlist = abc();
        playlist.move_to_position("C", 0);
        assert_eq!(playlist.current().as_deref(), Some("A"));
        assert_eq!(playlist.next().as_deref(), Some("B"));

        playlist.move_to_position("B", 0);
        assert_eq!(playlist.current().as_deref(), Some("B"));
        assert_eq!(playlist.all_keys(), vec!["B", "C", "A"]);
        assert_eq!(playlist.next().as_deref(), Some("C"));
        assert_eq!(playlist.prev().as_deref(), Some("B"));
        assert_eq!(playlist.prev(), None);
    }

    #[test]
    fn test_repeated_moves_preserve_key_set() {
        let keys = ["a", "b", "c", "d", "e", "f"];
        let mut playlist: OrderedPlaylist = keys.into_iter().collect();
        let moves = [
            ("a", 3),
            ("f", 0),
            ("c", 9),
            ("d", 1),
            ("a", 0),
            ("e", 5),
            ("b", 2),
        ];
        for (key, position) in moves {
            assert!(playlist.move_to_position(key, position));
            assert_links(&playlist);
        }

        let mut sorted = playlist.all_keys();
        sorted.sort();
        assert_eq!(sorted, keys);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut playlist = abc();
        let snapshot = playlist.all_keys();
        playlist.delete("A");
        playlist.move_to_position("C", 0);
        assert_eq!(snapshot, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_slots_are_reused() {
        let mut playlist = abc();
        playlist.delete("B");
        playlist.append("D");
        assert_eq!(playlist.slots.len(), 3);
        assert_eq!(playlist.all_keys(), vec!["A", "C", "D"]);
        assert_eq!(playlist.position_of("D"), Some(2));
        assert_links(&playlist);
    }

    #[test]
    fn test_scenario() {
        let mut playlist = OrderedPlaylist::new();
        for key in ["a.mp3", "b.mp3", "c.mp3"] {
            playlist.append(key);
        }
        assert_eq!(playlist.all_keys(), vec!["a.mp3", "b.mp3", "c.mp3"]);
        assert_eq!(playlist.current().as_deref(), Some("a.mp3"));
        assert_eq!(playlist.next().as_deref(), Some("b.mp3"));
        assert!(playlist.delete("b.mp3"));
        assert_eq!(playlist.current().as_deref(), Some("c.mp3"));
        assert_eq!(playlist.all_keys(), vec!["a.mp3", "c.mp3"]);
    }
}
