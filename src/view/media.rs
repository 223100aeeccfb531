//! Media loading for the terminal front-end.
//!
//! A terminal cannot decode pictures, so "loading" means checking the media is
//! reachable and reserving rows for it. Requests queue up during a flush and
//! settle on the next call to [`FsMediaLoader::settle`], which keeps their
//! completion asynchronous with respect to the call that issued them.

use crate::engine::node::MediaSource;
use crate::engine::{MediaLoader, MediaOutcome, MediaRequest, Px, RequestId};
use crate::view::constants::{AUDIO_ROWS, MEDIA_ROWS, ROW_PX};
use std::collections::VecDeque;
use std::path::Path;

#[derive(Debug, Default)]
pub struct FsMediaLoader {
    queue: VecDeque<MediaRequest>,
}

impl FsMediaLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Resolve every queued request.
    pub fn settle(&mut self) -> Vec<(RequestId, MediaOutcome)> {
        self.queue
            .drain(..)
            .map(|request| {
                let outcome = probe(&request.source);
                tracing::debug!(
                    request = %request.request,
                    id = %request.message,
                    location = request.source.location(),
                    ?outcome,
                    "Media settled"
                );
                (request.request, outcome)
            })
            .collect()
    }
}

impl MediaLoader for FsMediaLoader {
    fn request(&mut self, request: MediaRequest) {
        self.queue.push_back(request);
    }
}

fn reserved_height(source: &MediaSource) -> Px {
    match source {
        MediaSource::Image(_) => MEDIA_ROWS * ROW_PX,
        MediaSource::Audio(_) => AUDIO_ROWS * ROW_PX,
    }
}

/// Remote locations are assumed reachable; local ones must exist.
pub fn probe(source: &MediaSource) -> MediaOutcome {
    let location = source.location();
    if location.starts_with("http://") || location.starts_with("https://") {
        return MediaOutcome::Loaded {
            height: reserved_height(source),
        };
    }
    let path = location.strip_prefix("file://").unwrap_or(location);
    if Path::new(path).is_file() {
        MediaOutcome::Loaded {
            height: reserved_height(source),
        }
    } else {
        MediaOutcome::Failed
    }
}
