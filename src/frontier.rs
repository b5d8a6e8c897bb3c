use std::collections::VecDeque;

/// One pending work item. A marker is a sentinel, never a traversable entity;
/// it carries the absolute depth that becomes current when it is popped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontierItem {
    NodeRef(i64),
    DepthMarker(u32),
}

/// The ordered work-list of pending traversal items, used as both queue and
/// stack depending on crawl mode.
#[derive(Debug, Default)]
pub struct Frontier {
    items: VecDeque<FrontierItem>,
}

impl Frontier {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    pub fn pop(&mut self) -> Option<FrontierItem> {
        self.items.pop_front()
    }

    pub fn push_back(&mut self, item: FrontierItem) {
        self.items.push_back(item);
    }

    pub fn push_front(&mut self, item: FrontierItem) {
        self.items.push_front(item);
    }

    /// Prepends `items` so they pop in the given order, ahead of everything
    /// already queued.
    pub fn push_front_all<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = FrontierItem>,
        I::IntoIter: DoubleEndedIterator,
    {
        for item in items.into_iter().rev() {
            self.items.push_front(item);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
