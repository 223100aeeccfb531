//! Ordered store of materialized nodes.
//!
//! Nodes live in a hash map keyed by id and are threaded into one doubly
//! linked list (oldest to newest). Each node also belongs to a [`Block`], the
//! batch it was materialized with; blocks are chained oldest to newest and
//! neighbour lookups cross block boundaries freely.

use crate::engine::node::{RenderNode, TimestampLabel};
use crate::engine::sequencing::{compute_insert_tags, update_tags, GroupingTag};
use crate::model::MessageId;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u64);

#[derive(Debug, Clone)]
struct Block {
    id: BlockId,
    head: Option<MessageId>,
    tail: Option<MessageId>,
    len: usize,
}

#[derive(Debug, Clone)]
struct Slot {
    node: RenderNode,
    prev: Option<MessageId>,
    next: Option<MessageId>,
    block: BlockId,
}

#[derive(Debug, Default, Clone)]
pub struct Transcript {
    slots: HashMap<MessageId, Slot>,
    head: Option<MessageId>,
    tail: Option<MessageId>,
    blocks: VecDeque<Block>,
    next_block: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.slots.contains_key(id)
    }

    pub fn get(&self, id: &MessageId) -> Option<&RenderNode> {
        self.slots.get(id).map(|slot| &slot.node)
    }

    pub fn get_mut(&mut self, id: &MessageId) -> Option<&mut RenderNode> {
        self.slots.get_mut(id).map(|slot| &mut slot.node)
    }

    /// Oldest node.
    pub fn head(&self) -> Option<&MessageId> {
        self.head.as_ref()
    }

    /// Newest node.
    pub fn tail(&self) -> Option<&MessageId> {
        self.tail.as_ref()
    }

    pub fn prev(&self, id: &MessageId) -> Option<&MessageId> {
        self.slots.get(id)?.prev.as_ref()
    }

    pub fn next(&self, id: &MessageId) -> Option<&MessageId> {
        self.slots.get(id)?.next.as_ref()
    }

    pub fn block_of(&self, id: &MessageId) -> Option<BlockId> {
        self.slots.get(id).map(|slot| slot.block)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Newest node of `block`.
    pub fn block_tail(&self, block: BlockId) -> Option<&MessageId> {
        self.find_block(block)?.tail.as_ref()
    }

    /// Oldest node of `block`.
    pub fn block_head(&self, block: BlockId) -> Option<&MessageId> {
        self.find_block(block)?.head.as_ref()
    }

    /// Topmost label within `block`, i.e. the most recently attached one
    /// while the block is being filled by prepending.
    pub fn block_first_label(&self, block: BlockId) -> Option<&TimestampLabel> {
        let found = self.find_block(block)?;
        let mut cursor = found.head.as_ref();
        while let Some(id) = cursor {
            let slot = self.slots.get(id)?;
            if slot.block != block {
                return None;
            }
            if let Some(label) = slot.node.label() {
                return Some(label);
            }
            cursor = slot.next.as_ref();
        }
        None
    }

    /// Nodes oldest to newest.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            transcript: self,
            cursor: self.head.as_ref(),
        }
    }

    /// Open a new, empty block before every existing one.
    pub fn push_block_front(&mut self) -> BlockId {
        let id = self.new_block_id();
        self.blocks.push_front(Block {
            id,
            head: None,
            tail: None,
            len: 0,
        });
        id
    }

    /// Append `node` as the newest node, into the newest block. Returns the
    /// previous tail.
    pub fn append(&mut self, node: RenderNode) -> Option<MessageId> {
        if self.blocks.is_empty() {
            let id = self.new_block_id();
            self.blocks.push_back(Block {
                id,
                head: None,
                tail: None,
                len: 0,
            });
        }
        let id = node.id().clone();
        let prev = self.tail.clone();
        let block_id = match self.blocks.back_mut() {
            Some(block) => {
                if block.head.is_none() {
                    block.head = Some(id.clone());
                }
                block.tail = Some(id.clone());
                block.len += 1;
                block.id
            }
            None => return None,
        };
        self.link_after(prev.clone(), id, node, block_id);
        prev
    }

    /// Insert `node` as the oldest node of `block`. Returns the node it was
    /// placed before within the same block, if any.
    pub fn prepend_to_block(&mut self, block: BlockId, node: RenderNode) -> Option<MessageId> {
        let id = node.id().clone();
        let position = self.blocks.iter().position(|b| b.id == block)?;
        let block_head = self.blocks[position].head.clone();

        // Insertion point in the global chain: before the block's head, or
        // before the first node of the next non-empty block.
        let before = block_head.clone().or_else(|| {
            self.blocks
                .iter()
                .skip(position + 1)
                .find_map(|b| b.head.clone())
        });
        let after = match &before {
            Some(before) => self.slots.get(before).and_then(|s| s.prev.clone()),
            None => self.tail.clone(),
        };

        let entry = &mut self.blocks[position];
        entry.head = Some(id.clone());
        if entry.tail.is_none() {
            entry.tail = Some(id.clone());
        }
        entry.len += 1;

        self.link_after(after, id, node, block);
        block_head
    }

    /// Unlink and return a node. Empty blocks are dropped.
    pub fn remove(&mut self, id: &MessageId) -> Option<RenderNode> {
        let slot = self.slots.remove(id)?;
        match &slot.prev {
            Some(prev) => {
                if let Some(p) = self.slots.get_mut(prev) {
                    p.next = slot.next.clone();
                }
            }
            None => self.head = slot.next.clone(),
        }
        match &slot.next {
            Some(next) => {
                if let Some(n) = self.slots.get_mut(next) {
                    n.prev = slot.prev.clone();
                }
            }
            None => self.tail = slot.prev.clone(),
        }

        let prev_in_block = slot
            .prev
            .clone()
            .filter(|p| self.block_of(p) == Some(slot.block));
        let next_in_block = slot
            .next
            .clone()
            .filter(|n| self.block_of(n) == Some(slot.block));
        if let Some(block) = self.blocks.iter_mut().find(|b| b.id == slot.block) {
            block.len -= 1;
            if block.head.as_ref() == Some(id) {
                block.head = next_in_block;
            }
            if block.tail.as_ref() == Some(id) {
                block.tail = prev_in_block;
            }
        }
        self.blocks.retain(|b| b.len > 0);
        Some(slot.node)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.blocks.clear();
        self.head = None;
        self.tail = None;
    }

    /// Tag a freshly inserted node against its neighbour.
    ///
    /// Forward insertion compares with `prev`; backward insertion with
    /// `next`. Only the inserted node and that one neighbour are rewritten.
    pub fn compute_insert(
        &mut self,
        id: &MessageId,
        prev: Option<&MessageId>,
        next: Option<&MessageId>,
        forward: bool,
    ) {
        let Some(mut inserted) = self.get(id).map(RenderNode::link) else {
            return;
        };
        let mut prev_link = prev.and_then(|p| self.get(p)).map(RenderNode::link);
        let mut next_link = next.and_then(|n| self.get(n)).map(RenderNode::link);
        compute_insert_tags(prev_link.as_mut(), next_link.as_mut(), &mut inserted, forward);

        self.write_tag(Some(id), Some(inserted.tag));
        self.write_tag(prev, prev_link.map(|l| l.tag));
        self.write_tag(next, next_link.map(|l| l.tag));
    }

    /// Re-derive tags of two nodes that just became adjacent.
    pub fn update_pair(&mut self, first: Option<&MessageId>, second: Option<&MessageId>) {
        let mut first_link = first.and_then(|f| self.get(f)).map(RenderNode::link);
        let mut second_link = second.and_then(|s| self.get(s)).map(RenderNode::link);
        update_tags(first_link.as_mut(), second_link.as_mut());
        self.write_tag(first, first_link.map(|l| l.tag));
        self.write_tag(second, second_link.map(|l| l.tag));
    }

    fn write_tag(&mut self, id: Option<&MessageId>, tag: Option<Option<GroupingTag>>) {
        if let (Some(id), Some(tag)) = (id, tag) {
            if let Some(node) = self.get_mut(id) {
                node.set_tag(tag);
            }
        }
    }

    fn link_after(
        &mut self,
        after: Option<MessageId>,
        id: MessageId,
        node: RenderNode,
        block: BlockId,
    ) {
        let next = match &after {
            Some(a) => self.slots.get(a).and_then(|s| s.next.clone()),
            None => self.head.clone(),
        };
        match &after {
            Some(a) => {
                if let Some(slot) = self.slots.get_mut(a) {
                    slot.next = Some(id.clone());
                }
            }
            None => self.head = Some(id.clone()),
        }
        match &next {
            Some(n) => {
                if let Some(slot) = self.slots.get_mut(n) {
                    slot.prev = Some(id.clone());
                }
            }
            None => self.tail = Some(id.clone()),
        }
        self.slots.insert(
            id,
            Slot {
                node,
                prev: after,
                next,
                block,
            },
        );
    }

    fn find_block(&self, block: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == block)
    }

    fn new_block_id(&mut self) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        id
    }
}

/// Iterator over nodes, oldest first.
pub struct Iter<'a> {
    transcript: &'a Transcript,
    cursor: Option<&'a MessageId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a RenderNode;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.transcript.slots.get(self.cursor?)?;
        self.cursor = slot.next.as_ref();
        Some(&slot.node)
    }
}
