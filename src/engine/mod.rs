//! Chat view engine (pure core).
//!
//! Everything needed to keep a chat transcript grouped, labelled and
//! anchored, with no terminal or file access. The impure shell drives it
//! through [`view::ChatView`].

pub mod actions;
pub mod anchor;
pub mod debounce;
pub mod gate;
pub mod height_index;
pub mod history;
pub mod node;
pub mod sequencing;
pub mod timestamp;
pub mod transcript;
pub mod view;

pub use actions::{ActionKind, HostAction};
pub use anchor::{Px, ScrollAnchor, ScrollSurface};
pub use node::{NodeContent, RenderNode, TimestampLabel};
pub use sequencing::GroupingTag;
pub use timestamp::{Clock, FixedClock, RelativeBuckets, SystemClock, TimeBucketPolicy};
pub use view::{
    ChatView, HostEvent, HostSink, MediaLoader, MediaOutcome, MediaRequest, NodeMeasure,
    RequestId, UniformMeasure,
};
