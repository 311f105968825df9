//! Bounded conversation memory.
//!
//! A per-conversation ordered buffer of question/answer pairs. The buffer
//! never exceeds `window_size` pairs; the oldest pair is evicted first.
//! Appends to the same conversation are serialized by a per-conversation
//! lock; different conversations share no lock. Trimming happens
//! synchronously inside `record`; there is no background eviction.

use crate::types::MemoryStats;
use mizan_core::{ConversationTurn, Role};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

type Buffer = Arc<Mutex<VecDeque<ConversationTurn>>>;

/// In-process conversation memory, keyed by conversation id.
pub struct ConversationMemory {
    conversations: RwLock<HashMap<String, Buffer>>,
    window_size: AtomicUsize,
    enabled: AtomicBool,
}

impl ConversationMemory {
    /// Create a memory store retaining up to `window_size` pairs per
    /// conversation. A size of 0 disables the window.
    pub fn new(window_size: usize, enabled: bool) -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            window_size: AtomicUsize::new(window_size),
            enabled: AtomicBool::new(enabled),
        }
    }

    /// Append one question/answer pair, then trim the buffer to the window.
    ///
    /// The buffer is populated even while memory is disabled, so re-enabling
    /// restores history.
    pub fn record(&self, conversation_id: &str, user_text: &str, assistant_text: &str) {
        let buffer = self.buffer_or_insert(conversation_id);
        let window = self.window_size.load(Ordering::Relaxed);

        let mut turns = buffer.lock().unwrap_or_else(|e| e.into_inner());
        turns.push_back(ConversationTurn::now(Role::User, user_text));
        turns.push_back(ConversationTurn::now(Role::Assistant, assistant_text));

        // Evict oldest pairs down to the window
        while turns.len() > window * 2 {
            turns.pop_front();
            turns.pop_front();
        }
    }

    /// The memory window: up to `2 × window_size` most recent turns in
    /// chronological order. Empty when memory is disabled or the
    /// conversation is unknown.
    pub fn window(&self, conversation_id: &str) -> Vec<ConversationTurn> {
        if !self.enabled.load(Ordering::Relaxed) {
            return Vec::new();
        }
        let Some(buffer) = self.buffer(conversation_id) else {
            return Vec::new();
        };

        let turns = buffer.lock().unwrap_or_else(|e| e.into_inner());
        let max = self.window_size.load(Ordering::Relaxed) * 2;
        let skip = turns.len().saturating_sub(max);
        turns.iter().skip(skip).cloned().collect()
    }

    /// Empty a conversation's buffer. Unknown ids are a no-op; calling twice
    /// is a no-op the second time.
    pub fn clear(&self, conversation_id: &str) {
        if let Some(buffer) = self.buffer(conversation_id) {
            buffer.lock().unwrap_or_else(|e| e.into_inner()).clear();
        }
    }

    /// Update the window capacity and immediately evict excess oldest pairs
    /// from every conversation.
    pub fn set_window_size(&self, window_size: usize) {
        self.window_size.store(window_size, Ordering::Relaxed);

        let conversations = self
            .conversations
            .read()
            .unwrap_or_else(|e| e.into_inner());
        for buffer in conversations.values() {
            let mut turns = buffer.lock().unwrap_or_else(|e| e.into_inner());
            while turns.len() > window_size * 2 {
                turns.pop_front();
                turns.pop_front();
            }
        }
    }

    /// Enable or disable the memory window. Disabling suppresses reads but
    /// keeps buffers populated.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Memory statistics for one conversation. Unknown ids report an empty
    /// conversation.
    pub fn stats(&self, conversation_id: &str) -> MemoryStats {
        let window_size = self.window_size.load(Ordering::Relaxed);
        let turn_count = self
            .buffer(conversation_id)
            .map(|b| b.lock().unwrap_or_else(|e| e.into_inner()).len())
            .unwrap_or(0);

        MemoryStats {
            enabled: self.enabled.load(Ordering::Relaxed),
            window_size,
            pair_count: turn_count / 2,
            at_capacity: window_size > 0 && turn_count >= window_size * 2,
        }
    }

    fn buffer(&self, conversation_id: &str) -> Option<Buffer> {
        self.conversations
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(conversation_id)
            .cloned()
    }

    fn buffer_or_insert(&self, conversation_id: &str) -> Buffer {
        if let Some(buffer) = self.buffer(conversation_id) {
            return buffer;
        }
        self.conversations
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(conversation_id.to_string())
            .or_default()
            .clone()
    }
}
