//! Fixed menu with a wrapping cursor kept in sync with ratatui's ListState

use ratatui::widgets::ListState;

#[derive(Debug, Clone)]
pub struct MenuList<T> {
    items: Vec<T>,
    selected: usize,
    state: ListState,
}

impl<T> MenuList<T> {
    /// Build a menu with the first entry selected
    pub fn new(items: Vec<T>) -> Self {
        let mut state = ListState::default();
        if !items.is_empty() {
            state.select(Some(0));
        }
        Self {
            items,
            selected: 0,
            state,
        }
    }

    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.select((self.selected + 1) % self.items.len());
    }

    pub fn select_prev(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let prev = self.selected.checked_sub(1).unwrap_or(self.items.len() - 1);
        self.select(prev);
    }

    /// Move the cursor, clamped to the last entry
    pub fn select(&mut self, index: usize) {
        if self.items.is_empty() {
            return;
        }
        self.selected = index.min(self.items.len() - 1);
        self.state.select(Some(self.selected));
    }

    /// Select the first entry matching `predicate`. Returns true if found.
    pub fn select_where(&mut self, predicate: impl Fn(&T) -> bool) -> bool {
        match self.items.iter().position(predicate) {
            Some(index) => {
                self.select(index);
                true
            }
            None => false,
        }
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Needed by `render_stateful_widget`
    pub fn state_mut(&mut self) -> &mut ListState {
        &mut self.state
    }
}
