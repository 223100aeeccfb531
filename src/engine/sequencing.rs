//! Grouping of adjacent messages into visual sequences.
//!
//! Every non-generated node carries exactly one [`GroupingTag`]. A maximal run
//! of adjacent, same-direction, non-generated nodes with no sequence break
//! between them reads `first, middle*, last` (or `single` for a run of one).
//!
//! All functions here are pure: they operate on [`Link`] snapshots copied out
//! of the transcript and the caller writes the resulting tags back. Inserting
//! or removing one node only ever touches the tags of its immediate
//! neighbours.

use crate::model::Direction;

/// Position of a node within its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupingTag {
    Single,
    FirstOfSequence,
    MiddleOfSequence,
    LastOfSequence,
}

impl GroupingTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::FirstOfSequence => "first_of_sequence",
            Self::MiddleOfSequence => "middle_of_sequence",
            Self::LastOfSequence => "last_of_sequence",
        }
    }
}

/// Timestamp label state of the earlier node of a pair, as seen by the
/// break rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelState {
    /// No label, or a label that does not count (labels on generated nodes).
    Hidden,
    /// Label reading the most-recent bucket ("just now").
    MostRecent,
    /// Any other visible label.
    Older,
}

/// Sequencing-relevant snapshot of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub direction: Direction,
    pub generated: bool,
    pub label: LabelState,
    pub tag: Option<GroupingTag>,
}

impl Link {
    /// Fresh, untagged snapshot for a node about to be inserted.
    pub fn new(direction: Direction, generated: bool, label: LabelState) -> Self {
        Self {
            direction,
            generated,
            label,
            tag: None,
        }
    }

    fn retag(&mut self, from: GroupingTag, to: GroupingTag) -> bool {
        if self.tag == Some(from) {
            self.tag = Some(to);
            true
        } else {
            false
        }
    }

    /// Apply the first matching `(from, to)` rewrite.
    fn retag_any(&mut self, rules: &[(GroupingTag, GroupingTag)]) {
        for &(from, to) in rules {
            if self.retag(from, to) {
                return;
            }
        }
    }
}

use GroupingTag::{FirstOfSequence, LastOfSequence, MiddleOfSequence, Single};

/// Whether `b` placed next to `a` starts a new run.
///
/// `a` is always the earlier node. With `forward` set (appending after `a`)
/// a label reading the most-recent bucket does not break; scanning backward
/// any visible label on `a` does.
pub fn classify_break(a: Option<&Link>, b: Option<&Link>, forward: bool) -> bool {
    let (Some(a), Some(b)) = (a, b) else {
        return false;
    };
    if a.direction != b.direction {
        return true;
    }
    if a.generated != b.generated {
        return true;
    }
    match a.label {
        LabelState::Hidden => false,
        LabelState::MostRecent => !forward,
        LabelState::Older => true,
    }
}

/// Re-derive the tags of a pair that just became adjacent (or whose break
/// state changed).
///
/// Calling this twice with the same inputs yields the same tags as once.
pub fn update_tags(first: Option<&mut Link>, second: Option<&mut Link>) {
    match (first, second) {
        (Some(first), Some(second)) => {
            if classify_break(Some(first), Some(second), false) {
                first.retag_any(&[(MiddleOfSequence, LastOfSequence), (FirstOfSequence, Single)]);
                second.retag_any(&[(MiddleOfSequence, FirstOfSequence), (LastOfSequence, Single)]);
            } else {
                first.retag_any(&[(LastOfSequence, MiddleOfSequence), (Single, FirstOfSequence)]);
                second.retag_any(&[(FirstOfSequence, MiddleOfSequence), (Single, LastOfSequence)]);
            }
        }
        // `first` is now the newest node
        (Some(first), None) => {
            first.retag_any(&[(FirstOfSequence, Single), (MiddleOfSequence, LastOfSequence)]);
        }
        // `second` is now the oldest node
        (None, Some(second)) => {
            second.retag_any(&[(MiddleOfSequence, FirstOfSequence), (LastOfSequence, Single)]);
        }
        (None, None) => {}
    }
}

/// Tag a node being inserted and fix up the one neighbour it touches.
///
/// Forward insertion (append) looks at `prev` only; backward insertion
/// (prepend during history paging) looks at `next` only. Generated nodes
/// stay untagged.
pub fn compute_insert_tags(
    prev: Option<&mut Link>,
    next: Option<&mut Link>,
    inserted: &mut Link,
    forward: bool,
) {
    if inserted.generated {
        return;
    }
    let neighbour = if forward { prev } else { next };
    let Some(neighbour) = neighbour else {
        inserted.tag = Some(Single);
        return;
    };

    let broken = if forward {
        classify_break(Some(neighbour), Some(inserted), true)
    } else {
        classify_break(Some(inserted), Some(neighbour), false)
    };
    if broken {
        inserted.tag = Some(Single);
        return;
    }

    if forward {
        neighbour.retag_any(&[(Single, FirstOfSequence), (LastOfSequence, MiddleOfSequence)]);
        inserted.tag = Some(if neighbour.generated {
            Single
        } else {
            LastOfSequence
        });
    } else {
        neighbour.retag_any(&[(Single, LastOfSequence), (FirstOfSequence, MiddleOfSequence)]);
        inserted.tag = Some(if neighbour.generated {
            Single
        } else {
            FirstOfSequence
        });
    }
}
