//! Render nodes: the materialized, mutable counterpart of one message.
//!
//! A node owns the latest [`Message`] for its id, the presentation derived
//! from it ([`NodeContent`]), its grouping tag, an optional timestamp label
//! and the measured height. The presentation is a pure function of the
//! message and two flags, so re-presenting an unchanged message is a no-op.

use crate::engine::anchor::Px;
use crate::engine::sequencing::{GroupingTag, LabelState, Link};
use crate::engine::timestamp::{TimeBucket, TimeBucketPolicy};
use crate::model::{DeliveryStatus, Direction, Message, MessageId, MessageType, TransferProgress};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

// ===== Timestamp labels =====

/// Visual class of a timestamp label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelClass {
    /// Label of a call/contact notice
    Action,
    In,
    Out,
}

impl LabelClass {
    pub fn for_message(message: &Message) -> Self {
        if message.is_generated() {
            return Self::Action;
        }
        match message.direction() {
            Direction::In => Self::In,
            Direction::Out => Self::Out,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "timestamp_action",
            Self::In => "timestamp_in",
            Self::Out => "timestamp_out",
        }
    }
}

/// A visible "3 minutes ago"-style label attached to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampLabel {
    class: LabelClass,
    bucket: TimeBucket,
    text: String,
    timestamp: DateTime<Utc>,
}

impl TimestampLabel {
    pub fn new(
        class: LabelClass,
        timestamp: DateTime<Utc>,
        policy: &dyn TimeBucketPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        let (bucket, text) = policy.label(timestamp, now);
        Self {
            class,
            bucket,
            text,
            timestamp,
        }
    }

    /// Re-derive bucket and text for the current time.
    pub fn refresh(&mut self, policy: &dyn TimeBucketPolicy, now: DateTime<Utc>) {
        let (bucket, text) = policy.label(self.timestamp, now);
        self.bucket = bucket;
        self.text = text;
    }

    /// Same class and same visible text.
    pub fn reads_like(&self, other: &TimestampLabel) -> bool {
        self.class == other.class && self.text == other.text
    }

    pub fn class(&self) -> LabelClass {
        self.class
    }

    pub fn bucket(&self) -> &TimeBucket {
        &self.bucket
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

// ===== Presentations =====

/// Sending indicator of an outgoing text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDelivery {
    Sending,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    YouTube { video_id: String },
}

/// What a media presentation needs loaded before its height is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Image, thumbnail or local picture; tracked by the completion gate
    /// while history is loading.
    Image(String),
    /// Local audio file. Never gated.
    Audio(String),
}

impl MediaSource {
    pub fn location(&self) -> &str {
        match self {
            Self::Image(location) | Self::Audio(location) => location,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }
}

/// Generic file presentation of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub path: String,
    pub name: String,
    pub direction: Direction,
    pub status: DeliveryStatus,
    pub progress: Option<TransferProgress>,
}

impl FileSummary {
    fn from_message(message: &Message) -> Self {
        let path = message.body().to_string();
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            path,
            name,
            direction: message.direction(),
            status: message.status().clone(),
            progress: message.progress(),
        }
    }

    /// `"<bucket> - <size> - <status>"` once finished,
    /// `"<bucket> - <done> / <total> - <status>"` while in progress.
    pub fn info_line(&self, bucket_text: &str) -> String {
        let mut line = bucket_text.to_string();
        if let Some(progress) = self.progress.filter(|p| p.progress > 0 && p.total_size > 0) {
            line.push_str(" - ");
            if self.status == DeliveryStatus::Finished {
                line.push_str(&human_file_size(progress.total_size));
            } else {
                line.push_str(&human_file_size(progress.progress));
                line.push_str(" / ");
                line.push_str(&human_file_size(progress.total_size));
            }
        }
        line.push_str(" - ");
        line.push_str(&self.status.to_string());
        line
    }

    /// Progress bar fill, hidden for errors and completed transfers.
    pub fn progress_percent(&self) -> Option<f64> {
        if self.status.is_error() {
            return None;
        }
        self.progress
            .and_then(|p| p.percent())
            .filter(|percent| *percent < 100.0)
    }
}

/// Call notice derived from its description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSummary {
    pub description: String,
    pub direction: Direction,
    pub missed: bool,
}

impl CallSummary {
    fn from_text(text: &str) -> Self {
        // Leading glyph and its separator are decoration.
        let mut chars = text.chars();
        chars.next();
        let description = chars.as_str().trim_start().to_string();
        let direction = if text.to_lowercase().contains("incoming") {
            Direction::In
        } else {
            Direction::Out
        };
        Self {
            description,
            direction,
            missed: text.contains("Missed"),
        }
    }
}

/// Presentation of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeContent {
    Text {
        body: String,
        delivery: Option<TextDelivery>,
    },
    /// A lone image/video link in a text message, or a finished image transfer.
    Media {
        url: String,
        kind: MediaKind,
    },
    Audio {
        path: String,
    },
    File(FileSummary),
    Call(CallSummary),
    Contact {
        description: String,
    },
}

impl NodeContent {
    /// Derive the presentation of `message`.
    ///
    /// `display_links` enables rich media; `media_failed` pins a node whose
    /// media could not be loaded to its plain presentation.
    pub fn present(message: &Message, display_links: bool, media_failed: bool) -> Self {
        let rich = display_links && !media_failed;
        match message.kind() {
            MessageType::Text => {
                if rich {
                    if let Some(content) = link_media(message.body()) {
                        return content;
                    }
                }
                let delivery = match (message.direction(), message.status()) {
                    (Direction::Out, DeliveryStatus::Sending | DeliveryStatus::Ongoing(None)) => {
                        Some(TextDelivery::Sending)
                    }
                    (Direction::Out, DeliveryStatus::Failure) => Some(TextDelivery::Failed),
                    _ => None,
                };
                Self::Text {
                    body: message.body().to_string(),
                    delivery,
                }
            }
            MessageType::DataTransfer => {
                let path = message.body();
                let finished = message.status() == &DeliveryStatus::Finished;
                if rich && finished && is_image(path) {
                    Self::Media {
                        url: path.to_string(),
                        kind: MediaKind::Image,
                    }
                } else if rich && finished && is_audio(path) {
                    Self::Audio {
                        path: path.to_string(),
                    }
                } else {
                    Self::File(FileSummary::from_message(message))
                }
            }
            MessageType::Call => Self::Call(CallSummary::from_text(message.body())),
            MessageType::Contact => Self::Contact {
                description: message.body().to_string(),
            },
        }
    }

    /// What must be loaded before this presentation has its final height.
    pub fn media_source(&self) -> Option<MediaSource> {
        match self {
            Self::Media {
                kind: MediaKind::YouTube { video_id },
                ..
            } => Some(MediaSource::Image(youtube_thumbnail(video_id))),
            Self::Media { url, .. } => Some(MediaSource::Image(url.clone())),
            Self::Audio { path } => Some(MediaSource::Audio(path.clone())),
            _ => None,
        }
    }
}

fn link_media(body: &str) -> Option<NodeContent> {
    let url = body.trim();
    let is_single_link = (url.starts_with("http://") || url.starts_with("https://"))
        && !url.chars().any(char::is_whitespace);
    if !is_single_link {
        return None;
    }
    if let Some(video_id) = is_youtube(url).then(|| youtube_id(url)).flatten() {
        return Some(NodeContent::Media {
            url: url.to_string(),
            kind: MediaKind::YouTube { video_id },
        });
    }
    is_image(url).then(|| NodeContent::Media {
        url: url.to_string(),
        kind: MediaKind::Image,
    })
}

const IMAGE_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "gif", "png"];
const AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "mpeg", "ogg", "flac", "wav"];
const YOUTUBE_HOSTS: [&str; 3] = ["youtube.com", "www.youtube.com", "youtu.be"];

fn has_extension(file: &str, extensions: &[&str]) -> bool {
    let lower = file.to_lowercase();
    lower
        .rsplit_once('.')
        .is_some_and(|(_, ext)| extensions.contains(&ext))
}

pub fn is_image(file: &str) -> bool {
    has_extension(file, &IMAGE_EXTENSIONS)
}

pub fn is_audio(file: &str) -> bool {
    has_extension(file, &AUDIO_EXTENSIONS)
}

/// `http(s)` URL pointing at a YouTube host.
pub fn is_youtube(url: &str) -> bool {
    let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    else {
        return false;
    };
    let host = rest
        .split(['/', '?', '#', ':'])
        .next()
        .unwrap_or_default()
        .to_lowercase();
    YOUTUBE_HOSTS.contains(&host.as_str())
}

static YOUTUBE_ID: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^.*(youtu\.be/|v/|/u/w|embed/|watch\?v=|&v=)([^#&?]*).*").ok()
});

/// Eleven-character video id of a YouTube URL.
pub fn youtube_id(url: &str) -> Option<String> {
    let regex = YOUTUBE_ID.as_ref()?;
    let id = regex.captures(url)?.get(2)?.as_str();
    (id.chars().count() == 11).then(|| id.to_string())
}

fn youtube_thumbnail(video_id: &str) -> String {
    format!("http://img.youtube.com/vi/{video_id}/0.jpg")
}

const SIZE_UNITS: [&str; 8] = ["kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// 1024-based size with one decimal, e.g. `"1.5 kB"`.
pub fn human_file_size(bytes: u64) -> String {
    const THRESH: f64 = 1024.0;
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    value /= THRESH;
    while value >= THRESH && unit < SIZE_UNITS.len() - 1 {
        value /= THRESH;
        unit += 1;
    }
    format!("{value:.1} {}", SIZE_UNITS[unit])
}

// ===== RenderNode =====

/// Materialized node of one message.
#[derive(Debug, Clone)]
pub struct RenderNode {
    message: Message,
    content: NodeContent,
    tag: Option<GroupingTag>,
    label: Option<TimestampLabel>,
    most_recent: bool,
    media_failed: bool,
    media_height: Option<Px>,
    height: Px,
}

impl RenderNode {
    pub fn new(message: Message, content: NodeContent, label: Option<TimestampLabel>) -> Self {
        Self {
            message,
            content,
            tag: None,
            label,
            most_recent: false,
            media_failed: false,
            media_height: None,
            height: 0,
        }
    }

    pub fn id(&self) -> &MessageId {
        self.message.id()
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    pub fn tag(&self) -> Option<GroupingTag> {
        self.tag
    }

    pub fn label(&self) -> Option<&TimestampLabel> {
        self.label.as_ref()
    }

    pub fn is_generated(&self) -> bool {
        self.message.is_generated()
    }

    pub fn is_most_recent(&self) -> bool {
        self.most_recent
    }

    pub fn media_failed(&self) -> bool {
        self.media_failed
    }

    /// Height reported by the loaded media, if it has settled.
    pub fn media_height(&self) -> Option<Px> {
        self.media_height
    }

    pub fn height(&self) -> Px {
        self.height
    }

    /// Sequencing snapshot. Labels on generated nodes never count.
    pub fn link(&self) -> Link {
        let label = match (&self.label, self.is_generated()) {
            (Some(label), false) if label.bucket().is_most_recent() => LabelState::MostRecent,
            (Some(_), false) => LabelState::Older,
            _ => LabelState::Hidden,
        };
        Link {
            direction: self.message.direction(),
            generated: self.is_generated(),
            label,
            tag: self.tag,
        }
    }

    pub(crate) fn set_tag(&mut self, tag: Option<GroupingTag>) {
        self.tag = tag;
    }

    pub(crate) fn set_most_recent(&mut self, most_recent: bool) {
        self.most_recent = most_recent;
    }

    pub(crate) fn set_message(&mut self, message: Message) {
        self.message = message;
    }

    /// Replace the presentation. Returns whether it changed.
    pub(crate) fn set_content(&mut self, content: NodeContent) -> bool {
        if self.content == content {
            return false;
        }
        self.content = content;
        self.media_height = None;
        true
    }

    pub(crate) fn take_label(&mut self) -> Option<TimestampLabel> {
        self.label.take()
    }

    pub(crate) fn set_label(&mut self, label: Option<TimestampLabel>) {
        self.label = label;
    }

    pub(crate) fn label_mut(&mut self) -> Option<&mut TimestampLabel> {
        self.label.as_mut()
    }

    pub(crate) fn mark_media_failed(&mut self) {
        self.media_failed = true;
        self.media_height = None;
    }

    pub(crate) fn set_media_height(&mut self, height: Px) {
        self.media_height = Some(height);
    }

    pub(crate) fn set_height(&mut self, height: Px) {
        self.height = height;
    }
}
