//! View orchestrator.
//!
//! [`ChatView`] is the single session object behind the chat transcript. It
//! owns the materialized nodes, the history buffer, the completion gate, the
//! scroll position and every flag the view needs, and exposes the host API
//! (`add_message`, `update_message`, `print_history`, `remove_interaction`,
//! ...).
//!
//! Nothing here performs I/O or reads the wall clock implicitly:
//! - node heights come from an injected [`NodeMeasure`];
//! - media loads are queued as [`MediaRequest`]s and reported back through
//!   [`ChatView::media_settled`];
//! - host-bound events are queued as [`HostEvent`]s;
//! - work the browser would run "on the next tick" is queued and executed by
//!   [`ChatView::run_deferred`];
//! - the scroll debouncer is driven by explicit [`Instant`]s in
//!   [`ChatView::tick`].
//!
//! Outboxes are drained with [`ChatView::flush`].

use crate::config::ViewConfig;
use crate::engine::actions::{ActionKind, ActionTable, HostAction};
use crate::engine::anchor::{self, Px, Reanchor, ScrollAnchor, ScrollSurface};
use crate::engine::debounce::Debouncer;
use crate::engine::gate::{CompletionGate, LoadTicket, Settle};
use crate::engine::height_index::HeightIndex;
use crate::engine::history::HistoryBuffer;
use crate::engine::node::{LabelClass, MediaSource, NodeContent, RenderNode, TimestampLabel};
use crate::engine::sequencing::GroupingTag;
use crate::engine::timestamp::{Clock, RelativeBuckets, SystemClock, TimeBucketPolicy};
use crate::engine::transcript::Transcript;
use crate::model::{Message, MessageId, SenderAvatar, SenderId, ViewError};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

// ===== Seams =====

/// Height of a node as laid out by whatever renders the transcript.
pub trait NodeMeasure {
    fn measure(&self, node: &RenderNode) -> Px;

    /// Height of the "loading older messages" indicator.
    fn indicator_height(&self) -> Px {
        0
    }
}

/// Fixed heights: one row per node, one more for a label, plus whatever the
/// loaded media reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformMeasure {
    pub node: Px,
    pub label: Px,
    pub indicator: Px,
}

impl Default for UniformMeasure {
    fn default() -> Self {
        Self {
            node: 40,
            label: 20,
            indicator: 30,
        }
    }
}

impl NodeMeasure for UniformMeasure {
    fn measure(&self, node: &RenderNode) -> Px {
        let label = if node.label().is_some() { self.label } else { 0 };
        self.node + label + node.media_height().unwrap_or(0)
    }

    fn indicator_height(&self) -> Px {
        self.indicator
    }
}

/// Event for the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The initial history was handed to the view.
    MessagesLoaded,
    MessagesCleared,
    Action(HostAction),
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MessagesLoaded => f.write_str("MESSAGES_LOADED"),
            Self::MessagesCleared => f.write_str("MESSAGES_CLEARED"),
            Self::Action(action) => action.fmt(f),
        }
    }
}

pub trait HostSink {
    fn emit(&mut self, event: HostEvent);
}

impl HostSink for Vec<HostEvent> {
    fn emit(&mut self, event: HostEvent) {
        self.push(event);
    }
}

/// Identifier of one media load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A media load the view needs before a node reaches its final height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub request: RequestId,
    pub message: MessageId,
    pub source: MediaSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaOutcome {
    Loaded { height: Px },
    Failed,
}

pub trait MediaLoader {
    fn request(&mut self, request: MediaRequest);
}

impl MediaLoader for Vec<MediaRequest> {
    fn request(&mut self, request: MediaRequest) {
        self.push(request);
    }
}

// ===== Internal bookkeeping =====

#[derive(Debug, Clone)]
struct PendingLoad {
    message: MessageId,
    stick_to_bottom: bool,
    ticket: Option<LoadTicket>,
}

/// Work postponed to the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    Reanchor(Reanchor),
    CheckLazyLoad,
}

/// Node order and prefix sums of node heights, rebuilt after each mutation.
#[derive(Debug, Default)]
struct Layout {
    order: Vec<MessageId>,
    index: HeightIndex,
}

/// A node intersecting the viewport.
#[derive(Debug, Clone, Copy)]
pub struct VisibleNode<'a> {
    pub node: &'a RenderNode,
    /// Offset of the node's top edge from the viewport's top edge. Negative
    /// when the node starts above the viewport.
    pub top: i64,
}

// ===== ChatView =====

pub struct ChatView {
    config: ViewConfig,
    transcript: Transcript,
    history: HistoryBuffer,
    gate: CompletionGate,
    anchor: ScrollAnchor,
    debouncer: Debouncer,
    clock: Box<dyn Clock>,
    policy: Box<dyn TimeBucketPolicy>,
    measure: Box<dyn NodeMeasure>,
    layout: Layout,
    scroll_top: Px,
    viewport: Px,
    initial_loading: bool,
    can_lazy_load: bool,
    lazy_indicator: bool,
    back_to_bottom_visible: bool,
    display_links: bool,
    avatars: HashMap<SenderId, SenderAvatar>,
    actions: ActionTable,
    pending_loads: HashMap<RequestId, PendingLoad>,
    next_request: u64,
    deferred: VecDeque<Deferred>,
    events: Vec<HostEvent>,
    requests: Vec<MediaRequest>,
}

impl fmt::Debug for ChatView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatView")
            .field("nodes", &self.transcript.len())
            .field("history_cursor", &self.history.cursor())
            .field("history_len", &self.history.len())
            .field("scroll_top", &self.scroll_top)
            .field("viewport", &self.viewport)
            .field("content_height", &self.content_height())
            .field("pending_loads", &self.pending_loads.len())
            .finish_non_exhaustive()
    }
}

impl ScrollSurface for ChatView {
    fn scroll_top(&self) -> Px {
        self.scroll_top
    }

    fn set_scroll_top(&mut self, top: Px) {
        self.scroll_top = top.min(self.max_scroll_top());
    }

    fn scroll_height(&self) -> Px {
        self.content_height()
    }

    fn client_height(&self) -> Px {
        self.viewport
    }
}

impl ChatView {
    /// Empty view over a viewport `viewport` pixels tall, using the wall
    /// clock, relative time buckets and [`UniformMeasure`].
    pub fn new(config: ViewConfig, viewport: Px) -> Self {
        let policy = RelativeBuckets::new(config.date_format.clone());
        Self {
            anchor: ScrollAnchor::new(config.scroll_threshold),
            debouncer: Debouncer::new(config.debounce),
            display_links: config.display_links,
            config,
            transcript: Transcript::new(),
            history: HistoryBuffer::new(),
            gate: CompletionGate::new(),
            clock: Box::new(SystemClock),
            policy: Box::new(policy),
            measure: Box::new(UniformMeasure::default()),
            layout: Layout::default(),
            scroll_top: 0,
            viewport,
            initial_loading: false,
            can_lazy_load: false,
            lazy_indicator: false,
            back_to_bottom_visible: false,
            avatars: HashMap::new(),
            actions: ActionTable::new(),
            pending_loads: HashMap::new(),
            next_request: 0,
            deferred: VecDeque::new(),
            events: Vec::new(),
            requests: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_policy(mut self, policy: impl TimeBucketPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn with_measure(mut self, measure: impl NodeMeasure + 'static) -> Self {
        self.measure = Box::new(measure);
        self
    }

    // ===== Host API =====

    /// Append a live message at the end of the transcript.
    ///
    /// A message whose id is already materialized is treated as an update.
    pub fn add_message(&mut self, message: Message) {
        if self.transcript.contains(message.id()) {
            debug!(id = %message.id(), "Message already shown, updating in place");
            self.apply_update_preserving(message);
            return;
        }
        let stick = self.initial_loading || self.is_at_bottom();
        let anchor = self.anchor;
        anchor.run_preserving_bottom(self, |view| view.append_node(message, stick));
        self.refresh_timestamps();
    }

    /// Replace the message shown under `message.id()`.
    pub fn update_message(&mut self, message: Message) -> Result<(), ViewError> {
        if !self.transcript.contains(message.id()) {
            warn!(id = %message.id(), "update for unknown interaction ignored");
            return Err(ViewError::UnknownInteraction {
                id: message.id().clone(),
            });
        }
        self.apply_update_preserving(message);
        Ok(())
    }

    /// Remove one node, handing its most-recent marker and timestamp label to
    /// the node before it and re-deriving the tags of the pair that becomes
    /// adjacent.
    pub fn remove_interaction(&mut self, id: &MessageId) -> Result<(), ViewError> {
        if !self.transcript.contains(id) {
            warn!(%id, "removal of unknown interaction ignored");
            return Err(ViewError::UnknownInteraction { id: id.clone() });
        }
        let prev = self.transcript.prev(id).cloned();
        let next = self.transcript.next(id).cloned();

        if let Some(prev) = &prev {
            let (most_recent, label) = match self.transcript.get_mut(id) {
                Some(node) => (node.is_most_recent(), node.take_label()),
                None => (false, None),
            };
            if let Some(prev_node) = self.transcript.get_mut(prev) {
                if most_recent {
                    prev_node.set_most_recent(true);
                }
                if prev_node.label().is_none() {
                    prev_node.set_label(label);
                }
            }
        }

        self.transcript.remove(id);
        self.transcript.update_pair(prev.as_ref(), next.as_ref());
        self.actions.remove(id);
        self.relayout();
        let top = self.scroll_top;
        self.set_scroll_top(top);
        debug!(%id, remaining = self.transcript.len(), "Interaction removed");
        Ok(())
    }

    /// Replace the history and materialize its newest batch at the bottom of
    /// an empty view.
    ///
    /// Further batches follow on later ticks until the content fills
    /// `initial_fill_factor` viewports or the history runs out.
    pub fn print_history(&mut self, messages: Vec<Message>) {
        info!(count = messages.len(), "Printing history");
        self.history.reset(messages);
        self.reset_transcript();
        self.initial_loading = true;
        self.print_history_part(0);
        self.initial_loading = false;
        self.can_lazy_load = true;
        self.events.push(HostEvent::MessagesLoaded);
    }

    /// Drop every node and the remaining history.
    pub fn clear_messages(&mut self) {
        info!(cleared = self.transcript.len(), "Clearing messages");
        self.can_lazy_load = false;
        self.history.reset(Vec::new());
        self.reset_transcript();
        self.events.push(HostEvent::MessagesCleared);
    }

    /// Replace the avatar of `avatar.sender()`.
    pub fn set_sender_avatar(&mut self, avatar: SenderAvatar) {
        debug!(sender = %avatar.sender(), bytes = avatar.image().len(), "Avatar set");
        self.avatars.insert(avatar.sender().clone(), avatar);
    }

    pub fn avatar(&self, sender: &SenderId) -> Option<&SenderAvatar> {
        self.avatars.get(sender)
    }

    /// Enable or disable rich media for messages materialized from now on.
    pub fn set_display_links(&mut self, display_links: bool) {
        self.display_links = display_links;
    }

    /// Trigger `kind` on node `id`.
    pub fn dispatch(&mut self, id: &MessageId, kind: ActionKind) -> Result<(), ViewError> {
        let action = self.actions.resolve(id, kind).inspect_err(|err| {
            warn!(%id, %kind, error = %err, "Action dispatch rejected");
        })?;
        self.events.push(HostEvent::Action(action));
        Ok(())
    }

    /// Ask the host to send `text`. Blank input is dropped.
    pub fn send_message(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        self.events
            .push(HostEvent::Action(HostAction::SendMessage(text.to_string())));
    }

    pub fn send_file(&mut self, path: &str) {
        self.events
            .push(HostEvent::Action(HostAction::SendFile(path.to_string())));
    }

    // ===== Media =====

    /// Report the outcome of a media request.
    ///
    /// A failed load flips its node to the plain presentation. Loads started
    /// during initial loading count toward the completion gate; draining it
    /// schedules another lazy-load check.
    pub fn media_settled(&mut self, request: RequestId, outcome: MediaOutcome) {
        let Some(load) = self.pending_loads.remove(&request) else {
            warn!(%request, "Settle for unknown media request ignored");
            return;
        };

        if self.transcript.contains(&load.message) {
            match outcome {
                MediaOutcome::Loaded { height } => {
                    if let Some(node) = self.transcript.get_mut(&load.message) {
                        node.set_media_height(height);
                    }
                }
                MediaOutcome::Failed => {
                    debug!(id = %load.message, "Media failed, falling back");
                    let display_links = self.display_links;
                    if let Some(node) = self.transcript.get_mut(&load.message) {
                        node.mark_media_failed();
                        let content = NodeContent::present(node.message(), display_links, true);
                        node.set_content(content);
                        self.actions.sync(node);
                    }
                }
            }
            self.relayout();
            if load.stick_to_bottom {
                anchor::back_to_bottom(self);
            }
        }

        if let Some(ticket) = load.ticket {
            if let Settle::Drained { .. } = self.gate.settle(ticket) {
                self.deferred.push_back(Deferred::CheckLazyLoad);
            }
        }
    }

    // ===== Scrolling and ticks =====

    /// Move the viewport to `top` and signal the scroll debouncer.
    pub fn scroll_to(&mut self, top: Px, now: Instant) {
        self.set_scroll_top(top);
        self.debouncer.signal(now);
    }

    pub fn scroll_by(&mut self, delta: i64, now: Instant) {
        let top = (i64::from(self.scroll_top) + delta).clamp(0, i64::from(Px::MAX));
        self.scroll_to(Px::try_from(top).unwrap_or(Px::MAX), now);
    }

    /// Scroll to the end and hide the back-to-bottom affordance.
    pub fn back_to_bottom(&mut self) {
        anchor::back_to_bottom(self);
        self.back_to_bottom_visible = false;
    }

    /// Advance time: fire the debounced scroll handler if due, then run work
    /// deferred to this tick.
    pub fn tick(&mut self, now: Instant) {
        if self.debouncer.poll(now) {
            self.on_scrolled();
        }
        self.run_deferred();
    }

    /// Run the tasks queued so far. Tasks they queue wait for the next call.
    /// Returns the number of tasks run.
    pub fn run_deferred(&mut self) -> usize {
        let tasks: Vec<Deferred> = self.deferred.drain(..).collect();
        for task in &tasks {
            match *task {
                Deferred::Reanchor(reanchor) => reanchor.apply(self),
                Deferred::CheckLazyLoad => self.check_lazy_loading(),
            }
        }
        tasks.len()
    }

    pub fn set_viewport(&mut self, viewport: Px) {
        let anchor = self.anchor;
        anchor.run_preserving_bottom(self, |view| {
            view.viewport = viewport;
            let top = view.scroll_top;
            view.set_scroll_top(top);
        });
    }

    pub fn set_measure(&mut self, measure: impl NodeMeasure + 'static) {
        let anchor = self.anchor;
        anchor.run_preserving_bottom(self, |view| {
            view.measure = Box::new(measure);
            view.relayout();
        });
    }

    /// Hand queued host events and media requests to their consumers.
    pub fn flush(&mut self, sink: &mut dyn HostSink, loader: &mut dyn MediaLoader) {
        for event in self.events.drain(..) {
            sink.emit(event);
        }
        for request in self.requests.drain(..) {
            loader.request(request);
        }
    }

    /// Re-derive every timestamp label from the clock.
    pub fn refresh_timestamps(&mut self) {
        let now = self.clock.now();
        let policy = self.policy.as_ref();
        for id in &self.layout.order {
            if let Some(label) = self.transcript.get_mut(id).and_then(|n| n.label_mut()) {
                label.refresh(policy, now);
            }
        }
    }

    // ===== Accessors =====

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn node(&self, id: &MessageId) -> Option<&RenderNode> {
        self.transcript.get(id)
    }

    /// Nodes oldest to newest.
    pub fn nodes(&self) -> impl Iterator<Item = &RenderNode> {
        self.transcript.iter()
    }

    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn action_kinds(&self, id: &MessageId) -> Vec<ActionKind> {
        self.actions.kinds(id)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.anchor.is_at_bottom(self)
    }

    pub fn content_height(&self) -> Px {
        let indicator = if self.lazy_indicator {
            u64::from(self.measure.indicator_height())
        } else {
            0
        };
        Px::try_from(indicator + self.layout.index.total()).unwrap_or(Px::MAX)
    }

    pub fn viewport(&self) -> Px {
        self.viewport
    }

    pub fn shows_lazy_indicator(&self) -> bool {
        self.lazy_indicator
    }

    pub fn back_to_bottom_visible(&self) -> bool {
        self.back_to_bottom_visible
    }

    pub fn can_lazy_load(&self) -> bool {
        self.can_lazy_load
    }

    pub fn display_links(&self) -> bool {
        self.display_links
    }

    pub fn pending_media(&self) -> usize {
        self.pending_loads.len()
    }

    /// Gated loads still outstanding.
    pub fn gated_loads(&self) -> usize {
        self.gate.pending()
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Nodes intersecting the viewport, top to bottom.
    pub fn visible_nodes(&self) -> Vec<VisibleNode<'_>> {
        let base = if self.lazy_indicator {
            u64::from(self.measure.indicator_height())
        } else {
            0
        };
        let top = u64::from(self.scroll_top);
        let bottom = top + u64::from(self.viewport);
        let start = if top <= base {
            0
        } else {
            match self.layout.index.lower_bound(top - base) {
                Some(index) => index,
                None => return Vec::new(),
            }
        };

        let mut visible = Vec::new();
        for (index, id) in self.layout.order.iter().enumerate().skip(start) {
            let offset = base + self.layout.index.offset_of(index);
            if offset >= bottom {
                break;
            }
            if let Some(node) = self.transcript.get(id) {
                visible.push(VisibleNode {
                    node,
                    top: offset as i64 - top as i64,
                });
            }
        }
        visible
    }

    /// Compact textual projection, one line per node:
    /// `id tag direction [*most recent] [label]`.
    pub fn dump(&self) -> String {
        let mut lines = Vec::with_capacity(self.transcript.len() + 1);
        if self.lazy_indicator {
            lines.push("(more history)".to_string());
        }
        for node in self.transcript.iter() {
            let tag = node.tag().map_or("generated", |tag| tag.as_str());
            let mut line = format!(
                "{} {} {}",
                node.id(),
                tag,
                node.message().direction().as_str()
            );
            if node.is_most_recent() {
                line.push_str(" *");
            }
            if let Some(label) = node.label() {
                line.push_str(&format!(" [{}]", label.text()));
            }
            lines.push(line);
        }
        lines.join("\n")
    }

    // ===== Internals =====

    fn reset_transcript(&mut self) {
        if !self.pending_loads.is_empty() {
            debug!(
                dropped = self.pending_loads.len(),
                "Dropping media loads of the old transcript"
            );
        }
        self.transcript.clear();
        self.actions.clear();
        self.pending_loads.clear();
        self.requests.clear();
        self.deferred.clear();
        self.gate = CompletionGate::new();
        self.lazy_indicator = false;
        self.back_to_bottom_visible = false;
        self.scroll_top = 0;
        self.relayout();
    }

    fn new_label(&self, message: &Message) -> TimestampLabel {
        TimestampLabel::new(
            LabelClass::for_message(message),
            message.timestamp(),
            self.policy.as_ref(),
            self.clock.now(),
        )
    }

    fn append_node(&mut self, message: Message, stick: bool) {
        let label = self.new_label(&message);
        let content = NodeContent::present(&message, self.display_links, false);
        let node = RenderNode::new(message, content, Some(label));
        let id = node.id().clone();
        let source = node.content().media_source();

        let prev = self.transcript.append(node);
        self.transcript
            .compute_insert(&id, prev.as_ref(), None, true);

        if let Some(prev) = &prev {
            self.dedupe_label(prev, &id);
            if let Some(prev_node) = self.transcript.get_mut(prev) {
                prev_node.set_most_recent(false);
            }
        }
        if let Some(node) = self.transcript.get_mut(&id) {
            node.set_most_recent(true);
            self.actions.sync(node);
        }
        if let Some(source) = source {
            self.request_media(id, source, stick);
        }
        self.relayout();
    }

    /// Drop the label of `prev` when `id` repeats it, unless `prev` closes a
    /// run.
    fn dedupe_label(&mut self, prev: &MessageId, id: &MessageId) {
        let repeats = match (self.transcript.get(prev), self.transcript.get(id)) {
            (Some(prev_node), Some(node)) => match (prev_node.label(), node.label()) {
                (Some(prev_label), Some(label)) => {
                    prev_label.reads_like(label)
                        && prev_node.tag() != Some(GroupingTag::LastOfSequence)
                }
                _ => false,
            },
            _ => false,
        };
        if repeats {
            if let Some(prev_node) = self.transcript.get_mut(prev) {
                prev_node.take_label();
            }
        }
    }

    fn apply_update_preserving(&mut self, message: Message) {
        let stick = self.is_at_bottom();
        let anchor = self.anchor;
        anchor.run_preserving_bottom(self, |view| view.apply_update(message, stick));
        self.refresh_timestamps();
    }

    fn apply_update(&mut self, message: Message, stick: bool) {
        let id = message.id().clone();
        let display_links = self.display_links;
        let Some(node) = self.transcript.get_mut(&id) else {
            return;
        };
        let content = NodeContent::present(&message, display_links, node.media_failed());
        node.set_message(message);
        let source = if node.set_content(content) {
            node.content().media_source()
        } else {
            None
        };
        self.actions.sync(node);
        if let Some(source) = source {
            self.request_media(id, source, stick);
        }
        self.relayout();
    }

    fn request_media(&mut self, message: MessageId, source: MediaSource, stick: bool) {
        let gated = self.initial_loading && source.is_image();
        let ticket = gated.then(|| self.gate.track());
        let request = RequestId(self.next_request);
        self.next_request += 1;
        self.pending_loads.insert(
            request,
            PendingLoad {
                message: message.clone(),
                stick_to_bottom: gated || stick,
                ticket,
            },
        );
        self.requests.push(MediaRequest {
            request,
            message,
            source,
        });
    }

    /// Materialize the next history batch above everything shown, keeping
    /// the content bottom `distance_from_bottom` pixels below the viewport
    /// top.
    fn print_history_part(&mut self, distance_from_bottom: Px) {
        if !self.history.has_more() {
            return;
        }
        let stick = self.initial_loading || self.is_at_bottom();
        let anchor = self.anchor;
        let ((), reanchor) =
            anchor.anchor_at_distance_from_bottom(self, distance_from_bottom, |view| {
                view.materialize_batch(stick)
            });
        self.deferred.push_back(Deferred::Reanchor(reanchor));
        if self.gate.is_idle() {
            self.deferred.push_back(Deferred::CheckLazyLoad);
        }
    }

    fn materialize_batch(&mut self, stick: bool) {
        self.lazy_indicator = false;
        let block = self.transcript.push_block_front();
        let batch = self.history.take_next(self.config.batch_size);
        let count = batch.len();

        for message in batch {
            if self.transcript.contains(message.id()) {
                warn!(id = %message.id(), "History message already shown, skipped");
                continue;
            }
            let label = self.new_label(&message);
            let attach = message.is_generated()
                || self
                    .transcript
                    .block_first_label(block)
                    .is_none_or(|first| !first.reads_like(&label));
            let content = NodeContent::present(&message, self.display_links, false);
            let node = RenderNode::new(message, content, attach.then_some(label));
            let id = node.id().clone();
            let source = node.content().media_source();

            let next = self.transcript.prepend_to_block(block, node);
            self.transcript
                .compute_insert(&id, None, next.as_ref(), false);
            if let Some(node) = self.transcript.get(&id) {
                self.actions.sync(node);
            }
            if let Some(source) = source {
                self.request_media(id, source, stick);
            }
        }

        // Seam with the block materialized before this one.
        if let Some(seam) = self.transcript.block_tail(block).cloned() {
            let next = self.transcript.next(&seam).cloned();
            self.transcript.update_pair(Some(&seam), next.as_ref());
        }
        if let Some(tail) = self.transcript.tail().cloned() {
            if let Some(node) = self.transcript.get_mut(&tail) {
                node.set_most_recent(true);
            }
        }

        self.lazy_indicator = self.history.has_more();
        self.relayout();
        debug!(
            count,
            cursor = self.history.cursor(),
            remaining = self.history.remaining(),
            "History batch materialized"
        );
    }

    fn check_lazy_loading(&mut self) {
        if !self.can_lazy_load {
            return;
        }
        let fill = self
            .viewport
            .saturating_mul(self.config.initial_fill_factor);
        if self.content_height() < fill && self.history.has_more() {
            debug!(
                content = self.content_height(),
                fill, "Viewport not filled, loading more history"
            );
            self.initial_loading = true;
            self.print_history_part(0);
            self.initial_loading = false;
        }
    }

    fn on_scrolled(&mut self) {
        if !self.can_lazy_load {
            return;
        }
        self.back_to_bottom_visible = !self.is_at_bottom();
        if self.scroll_top == 0 && self.history.has_more() {
            info!(
                remaining = self.history.remaining(),
                "Scrolled to top, loading older history"
            );
            let height = self.content_height();
            self.print_history_part(height);
        }
    }

    fn relayout(&mut self) {
        let mut order = Vec::with_capacity(self.transcript.len());
        let mut heights = Vec::with_capacity(self.transcript.len());
        for node in self.transcript.iter() {
            order.push(node.id().clone());
            heights.push(self.measure.measure(node));
        }
        for (id, height) in order.iter().zip(&heights) {
            if let Some(node) = self.transcript.get_mut(id) {
                node.set_height(*height);
            }
        }
        self.layout = Layout {
            order,
            index: HeightIndex::from_heights(heights),
        };
    }
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod tests;
