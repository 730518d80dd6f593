//! Undo/redo history of the pipeline graph
//!
//! Each entry is a zstd-compressed JSON snapshot of the whole `FlowGraph`.
//! Graphs in this editor are small, so restoring a snapshot wholesale is
//! simpler than keeping inverse operations for every gesture.

use std::collections::VecDeque;

use crate::error::{FlowError, Result};
use crate::types::FlowGraph;

const COMPRESSION_LEVEL: i32 = 3;

/// Bounded stack of compressed graph snapshots
pub struct UndoStack {
    snapshots: VecDeque<Vec<u8>>,
    /// Index of the snapshot matching the live graph
    current: usize,
    max_snapshots: usize,
}

impl UndoStack {
    /// Create a stack holding at most `max_snapshots` entries (at least one)
    pub fn new(max_snapshots: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            current: 0,
            max_snapshots: max_snapshots.max(1),
        }
    }

    /// Record a new state, discarding anything that could have been redone
    pub fn push(&mut self, graph: &FlowGraph) -> Result<()> {
        let json = serde_json::to_vec(graph)?;
        let compressed = zstd::encode_all(&json[..], COMPRESSION_LEVEL).map_err(FlowError::compression)?;

        self.snapshots.truncate(self.current + 1);
        self.snapshots.push_back(compressed);
        self.current = self.snapshots.len() - 1;

        while self.snapshots.len() > self.max_snapshots {
            self.snapshots.pop_front();
            self.current = self.current.saturating_sub(1);
        }
        Ok(())
    }

    /// Step back; `None` at the oldest snapshot
    pub fn undo(&mut self) -> Option<Result<FlowGraph>> {
        if !self.can_undo() {
            return None;
        }
        self.current -= 1;
        Some(self.decompress(self.current))
    }

    /// Step forward; `None` at the newest snapshot
    pub fn redo(&mut self) -> Option<Result<FlowGraph>> {
        if !self.can_redo() {
            return None;
        }
        self.current += 1;
        Some(self.decompress(self.current))
    }

    pub fn current(&self) -> Option<Result<FlowGraph>> {
        if self.snapshots.is_empty() {
            None
        } else {
            Some(self.decompress(self.current))
        }
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.snapshots.len()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Drop all history, e.g. after a project is reloaded
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.current = 0;
    }

    /// Total bytes held across snapshots
    pub fn compressed_size(&self) -> usize {
        self.snapshots.iter().map(Vec::len).sum()
    }

    fn decompress(&self, index: usize) -> Result<FlowGraph> {
        let compressed = self
            .snapshots
            .get(index)
            .ok_or(FlowError::MissingSnapshot(index))?;
        let json = zstd::decode_all(&compressed[..]).map_err(FlowError::compression)?;
        Ok(serde_json::from_slice(&json)?)
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(100)
    }
}
