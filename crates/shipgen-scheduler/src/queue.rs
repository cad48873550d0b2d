//! Bounded FIFO of solved layouts waiting to be played.

use shipgen_logic::layout::LevelLayout;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::lock;

#[derive(Debug)]
pub struct LookaheadQueue {
    layouts: Mutex<VecDeque<LevelLayout>>,
    depth: usize,
}

impl LookaheadQueue {
    pub fn new(depth: usize) -> Self {
        Self {
            layouts: Mutex::new(VecDeque::with_capacity(depth)),
            depth,
        }
    }

    /// Append `layout` unless the queue is full or `stop()` returns `true`.
    ///
    /// `stop` is evaluated under the queue lock, so it cannot race with
    /// [`fenced`](Self::fenced).
    pub fn push_unless(&self, layout: LevelLayout, stop: impl FnOnce() -> bool) -> bool {
        let mut layouts = lock(&self.layouts);
        if stop() {
            return false;
        }
        if layouts.len() >= self.depth {
            log::warn!(
                "Look-ahead queue full ({}), dropping layout seed {}",
                self.depth,
                layout.seed
            );
            return false;
        }
        layouts.push_back(layout);
        true
    }

    /// Run `f` with the queue locked, so no push interleaves with it.
    pub fn fenced<R>(&self, f: impl FnOnce() -> R) -> R {
        let _layouts = lock(&self.layouts);
        f()
    }

    pub fn pop(&self) -> Option<LevelLayout> {
        lock(&self.layouts).pop_front()
    }

    pub fn len(&self) -> usize {
        lock(&self.layouts).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many layouts it takes to fill the queue.
    pub fn deficit(&self) -> usize {
        self.depth.saturating_sub(self.len())
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}
