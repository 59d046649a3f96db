//! Hover/click instrumentation carried by every sandbox element.
//!
//! Each listener kind has exactly one slot per element, so attaching the same
//! kind twice replaces instead of stacking.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Pointer-enter/pointer-leave callbacks installed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HoverPair {
    pub enter: ListenerId,
    pub leave: ListenerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerOwner {
    Overlay,
    EditSession,
}

#[derive(Debug, Default)]
pub(crate) struct ListenerAllocator {
    next: u64,
}

impl ListenerAllocator {
    pub(crate) fn next_id(&mut self) -> ListenerId {
        self.next += 1;
        ListenerId(self.next)
    }

    pub(crate) fn hover_pair(&mut self) -> HoverPair {
        HoverPair {
            enter: self.next_id(),
            leave: self.next_id(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Instrumentation {
    hover: Option<(HoverPair, ListenerOwner)>,
    click: Option<ListenerId>,
    highlighted: bool,
}

impl Instrumentation {
    /// Fills empty slots with overlay listeners. Returns whether anything was attached.
    pub(crate) fn apply_overlay(&mut self, ids: &mut ListenerAllocator) -> bool {
        let mut attached = false;
        if self.hover.is_none() {
            self.hover = Some((ids.hover_pair(), ListenerOwner::Overlay));
            attached = true;
        }
        if self.click.is_none() {
            self.click = Some(ids.next_id());
            attached = true;
        }
        attached
    }

    /// Installs `pair` in the hover slot, replacing whatever was there.
    pub(crate) fn install_hover(&mut self, pair: HoverPair, owner: ListenerOwner) {
        self.hover = Some((pair, owner));
    }

    /// Removes `pair` if it still occupies the hover slot.
    pub(crate) fn remove_hover(&mut self, pair: HoverPair) -> bool {
        match self.hover {
            Some((current, _)) if current == pair => {
                self.hover = None;
                self.highlighted = false;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn hover(&self) -> Option<(HoverPair, ListenerOwner)> {
        self.hover
    }

    pub(crate) fn has_click(&self) -> bool {
        self.click.is_some()
    }

    pub(crate) fn pointer_enter(&mut self) -> bool {
        if self.hover.is_some() {
            self.highlighted = true;
        }
        self.highlighted
    }

    pub(crate) fn pointer_leave(&mut self) {
        if self.hover.is_some() {
            self.highlighted = false;
        }
    }

    pub(crate) fn is_highlighted(&self) -> bool {
        self.highlighted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_attachment_is_idempotent() {
        let mut ids = ListenerAllocator::default();
        let mut slots = Instrumentation::default();
        assert!(slots.apply_overlay(&mut ids));
        let first = slots.hover();
        assert!(!slots.apply_overlay(&mut ids));
        assert_eq!(slots.hover(), first);
    }

    #[test]
    fn overlay_does_not_replace_edit_session_pair() {
        let mut ids = ListenerAllocator::default();
        let mut slots = Instrumentation::default();
        let pair = ids.hover_pair();
        slots.install_hover(pair, ListenerOwner::EditSession);
        slots.apply_overlay(&mut ids);
        assert_eq!(slots.hover(), Some((pair, ListenerOwner::EditSession)));
        assert!(slots.has_click());
    }

    #[test]
    fn removing_a_foreign_pair_is_refused() {
        let mut ids = ListenerAllocator::default();
        let mut slots = Instrumentation::default();
        let installed = ids.hover_pair();
        let other = ids.hover_pair();
        slots.install_hover(installed, ListenerOwner::EditSession);
        assert!(!slots.remove_hover(other));
        assert!(slots.remove_hover(installed));
        assert_eq!(slots.hover(), None);
    }

    #[test]
    fn highlight_follows_pointer_only_with_hover_listener() {
        let mut ids = ListenerAllocator::default();
        let mut slots = Instrumentation::default();
        assert!(!slots.pointer_enter());

        slots.apply_overlay(&mut ids);
        assert!(slots.pointer_enter());
        slots.pointer_leave();
        assert!(!slots.is_highlighted());
    }
}
