//! Property-based tests for the transcript engine.
//!
//! Tests validate:
//! 1. Grouping tags always partition the transcript into well-formed,
//!    maximal runs after appends, history paging and removals, and each of
//!    those touches only the tags of its immediate neighbours
//! 2. The history cursor only grows and matches what is materialized
//! 3. Settling media in any order drains the completion gate exactly once
//! 4. Updating a message twice equals updating it once
//! 5. A view at the bottom stays at the bottom across live appends

use chatview::config::ViewConfig;
use chatview::engine::sequencing::classify_break;
use chatview::engine::{
    ChatView, FixedClock, GroupingTag, HostEvent, MediaOutcome, MediaRequest, Px, ScrollSurface,
};
use chatview::model::{DeliveryStatus, Direction, Message, MessageId, SenderId};
use chrono::{DateTime, Utc};
use proptest::prelude::*;
use std::collections::HashMap;
use std::time::{Duration, Instant};

const NOW: i64 = 1_700_000_000;

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(NOW, 0).unwrap()
}

fn mid(raw: &str) -> MessageId {
    MessageId::new(raw).unwrap()
}

/// 0: incoming text, 1: outgoing text, 2: call notice, 3: incoming image link.
fn message(kind: u8, id: &str, age_secs: i64) -> Message {
    let ts = now() - chrono::Duration::seconds(age_secs);
    let sender = SenderId::new("peer").unwrap();
    match kind {
        0 => Message::text(mid(id), Direction::In, sender, ts, DeliveryStatus::Read, "hi"),
        1 => Message::text(mid(id), Direction::Out, sender, ts, DeliveryStatus::Sent, "yo"),
        2 => Message::call(mid(id), Direction::In, ts, "🕽 Missed incoming call"),
        _ => Message::text(
            mid(id),
            Direction::In,
            sender,
            ts,
            DeliveryStatus::Read,
            "https://example.com/pic.png",
        ),
    }
}

fn view(viewport: Px) -> ChatView {
    ChatView::new(ViewConfig::default(), viewport).with_clock(FixedClock::new(now()))
}

fn drain(view: &mut ChatView) -> (Vec<HostEvent>, Vec<MediaRequest>) {
    let mut events = Vec::new();
    let mut requests = Vec::new();
    view.flush(&mut events, &mut requests);
    (events, requests)
}

/// Walk the transcript as a run automaton: `first middle* last | single`,
/// generated nodes only between runs, one direction per run.
fn check_runs(view: &ChatView) -> Result<(), String> {
    let mut open: Option<Direction> = None;
    for node in view.nodes() {
        let direction = node.message().direction();
        let id = node.id();
        match (node.tag(), open) {
            (None, None) if node.is_generated() => {}
            (Some(GroupingTag::Single), None) => {}
            (Some(GroupingTag::FirstOfSequence), None) => open = Some(direction),
            (Some(GroupingTag::MiddleOfSequence), Some(run)) if run == direction => {}
            (Some(GroupingTag::LastOfSequence), Some(run)) if run == direction => open = None,
            (tag, run) => {
                return Err(format!(
                    "node {id}: tag {tag:?} with open run {run:?}\n{}",
                    view.dump()
                ))
            }
        }
    }
    match open {
        None => Ok(()),
        Some(_) => Err(format!("run left open\n{}", view.dump())),
    }
}

/// Adjacent tagged nodes share a run exactly when the break rule joins them.
fn check_pairs(view: &ChatView) -> Result<(), String> {
    let nodes: Vec<_> = view.nodes().collect();
    for pair in nodes.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.is_generated() || b.is_generated() {
            continue;
        }
        let joined = matches!(
            a.tag(),
            Some(GroupingTag::FirstOfSequence | GroupingTag::MiddleOfSequence)
        );
        let breaks = classify_break(Some(&a.link()), Some(&b.link()), false);
        if joined == breaks {
            return Err(format!(
                "pair {} / {}: joined={joined} but break rule says break={breaks}\n{}",
                a.id(),
                b.id(),
                view.dump()
            ));
        }
    }
    Ok(())
}

fn check_transcript(view: &ChatView) -> Result<(), TestCaseError> {
    check_runs(view)
        .and_then(|()| check_pairs(view))
        .map_err(TestCaseError::fail)
}

type Tags = Vec<(String, Option<GroupingTag>)>;

fn tags(view: &ChatView) -> Tags {
    view.nodes().map(|n| (n.id().to_string(), n.tag())).collect()
}

/// Fail if a node that survived the operation changed its tag without
/// being one of `allowed`.
fn check_locality(
    before: &Tags,
    view: &ChatView,
    allowed: &[&str],
) -> Result<(), TestCaseError> {
    let after: HashMap<String, Option<GroupingTag>> = tags(view).into_iter().collect();
    for (id, tag) in before {
        let Some(now) = after.get(id) else {
            continue;
        };
        if now != tag && !allowed.contains(&id.as_str()) {
            return Err(TestCaseError::fail(format!(
                "node {id} retagged {tag:?} -> {now:?}, only {allowed:?} may change\n{}",
                view.dump()
            )));
        }
    }
    Ok(())
}

fn kinds() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..3, 1..40)
}

// ===== Property 1: Grouping =====

proptest! {
    #[test]
    fn live_appends_keep_runs_well_formed(kinds in kinds()) {
        let mut view = view(400);
        for (i, kind) in kinds.iter().enumerate() {
            let before = tags(&view);
            let tail = before.last().map(|(id, _)| id.clone());
            view.add_message(message(*kind, &i.to_string(), 0));
            let allowed: Vec<&str> = tail.iter().map(String::as_str).collect();
            check_locality(&before, &view, &allowed)?;
        }
        prop_assert_eq!(view.len(), kinds.len());
        check_transcript(&view)?;
    }

    #[test]
    fn history_paging_keeps_runs_well_formed(
        kinds in prop::collection::vec(0u8..3, 1..120),
        batch_size in 1usize..30,
    ) {
        let config = ViewConfig { batch_size, ..ViewConfig::default() };
        let mut view = ChatView::new(config, 300).with_clock(FixedClock::new(now()));
        let total = kinds.len();
        // Oldest first, spread over a few days so labels land at seams.
        let history = kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| message(*kind, &i.to_string(), ((total - i) as i64) * 3_000))
            .collect();
        view.print_history(history);

        let start = Instant::now();
        for step in 0..total {
            let before = tags(&view);
            // Pages go in above the oldest node shown.
            let head = before.first().map(|(id, _)| id.clone());
            let at = start + Duration::from_secs(step as u64);
            view.scroll_to(0, at);
            view.tick(at + Duration::from_millis(250));
            let allowed: Vec<&str> = head.iter().map(String::as_str).collect();
            check_locality(&before, &view, &allowed)?;
            check_transcript(&view)?;
        }
        prop_assert_eq!(view.len(), total);
    }

    #[test]
    fn removals_only_rejoin_neighbours(
        kinds in kinds(),
        removals in prop::collection::vec(any::<prop::sample::Index>(), 0..20),
    ) {
        let mut view = view(400);
        let mut ids: Vec<String> = Vec::new();
        for (i, kind) in kinds.iter().enumerate() {
            view.add_message(message(*kind, &i.to_string(), 0));
            ids.push(i.to_string());
        }
        for index in removals {
            if ids.is_empty() {
                break;
            }
            let id = ids.remove(index.index(ids.len()));
            let before = tags(&view);
            let at = before.iter().position(|(node, _)| *node == id);
            let neighbours: Vec<&str> = at
                .into_iter()
                .flat_map(|i| [i.checked_sub(1), Some(i + 1)])
                .flatten()
                .filter_map(|i| before.get(i).map(|(node, _)| node.as_str()))
                .collect();
            prop_assert!(view.remove_interaction(&mid(&id)).is_ok());
            check_locality(&before, &view, &neighbours)?;
            check_transcript(&view)?;
        }
        prop_assert_eq!(view.len(), ids.len());
        let most_recent = view.nodes().filter(|n| n.is_most_recent()).count();
        prop_assert_eq!(most_recent, usize::from(!ids.is_empty()));
    }
}

// ===== Property 2: History cursor =====

proptest! {
    #[test]
    fn history_cursor_is_monotonic_and_bounded(
        total in 0usize..150,
        batch_size in 1usize..25,
        scrolls in 0usize..12,
    ) {
        let config = ViewConfig { batch_size, ..ViewConfig::default() };
        let mut view = ChatView::new(config, 300).with_clock(FixedClock::new(now()));
        view.print_history((0..total).map(|i| message(0, &i.to_string(), 0)).collect());

        let mut last = view.history().cursor();
        let start = Instant::now();
        for step in 0..scrolls {
            let at = start + Duration::from_secs(step as u64);
            view.scroll_to(0, at);
            view.tick(at + Duration::from_millis(250));
            let cursor = view.history().cursor();
            prop_assert!(cursor >= last);
            prop_assert!(cursor <= total);
            prop_assert_eq!(view.len(), cursor);
            last = cursor;
        }
        prop_assert_eq!(view.shows_lazy_indicator(), view.history().has_more());
    }
}

// ===== Property 3: Completion gate =====

proptest! {
    #[test]
    fn settling_media_in_any_order_drains_once(
        image_slots in prop::collection::vec(any::<bool>(), 5..20),
        order in any::<u64>(),
        failures in prop::collection::vec(any::<bool>(), 20),
    ) {
        let mut view = view(2_000);
        let history = image_slots
            .iter()
            .enumerate()
            .map(|(i, image)| message(if *image { 3 } else { 0 }, &i.to_string(), 0))
            .collect();
        view.print_history(history);
        let (events, mut requests) = drain(&mut view);
        prop_assert_eq!(events, vec![HostEvent::MessagesLoaded]);
        let images = image_slots.iter().filter(|image| **image).count();
        prop_assert_eq!(requests.len(), images);
        prop_assert_eq!(view.gated_loads(), images);
        view.run_deferred();

        // Deterministic shuffle from the drawn seed.
        let mut seed = order;
        for i in (1..requests.len()).rev() {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            requests.swap(i, (seed >> 33) as usize % (i + 1));
        }

        let mut drained = 0;
        for (i, request) in requests.iter().enumerate() {
            let outcome = if failures[i % failures.len()] {
                MediaOutcome::Failed
            } else {
                MediaOutcome::Loaded { height: 60 }
            };
            view.media_settled(request.request, outcome);
            if view.has_deferred() {
                drained += 1;
                view.run_deferred();
            }
        }
        prop_assert_eq!(drained, usize::from(images > 0));
        prop_assert_eq!(view.gated_loads(), 0);
        prop_assert_eq!(view.pending_media(), 0);

        // Settling again changes nothing.
        for request in &requests {
            view.media_settled(request.request, MediaOutcome::Loaded { height: 60 });
        }
        prop_assert!(!view.has_deferred());
    }
}

// ===== Property 4: Idempotent update =====

proptest! {
    #[test]
    fn update_twice_equals_update_once(
        kinds in kinds(),
        target in any::<prop::sample::Index>(),
        delivered in any::<bool>(),
    ) {
        let mut view = view(400);
        for (i, kind) in kinds.iter().enumerate() {
            view.add_message(message(*kind, &i.to_string(), 0));
        }
        let index = target.index(kinds.len());
        let id = index.to_string();
        let status = if delivered { DeliveryStatus::Read } else { DeliveryStatus::Failure };
        let updated = message(kinds[index], &id, 0).with_status(status);

        prop_assert!(view.update_message(updated.clone()).is_ok());
        let once = (view.dump(), view.content_height(), view.action_kinds(&mid(&id)));
        prop_assert!(view.update_message(updated).is_ok());
        let twice = (view.dump(), view.content_height(), view.action_kinds(&mid(&id)));
        prop_assert_eq!(once, twice);
        check_transcript(&view)?;
    }
}

// ===== Property 5: Bottom anchoring =====

proptest! {
    #[test]
    fn live_appends_at_bottom_stay_at_bottom(
        existing in 0usize..40,
        appended in prop::collection::vec(0u8..3, 1..20),
        viewport in 100u32..800,
    ) {
        let mut view = view(viewport);
        view.print_history((0..existing).map(|i| message(0, &format!("h{i}"), 0)).collect());
        while view.run_deferred() > 0 {}
        view.back_to_bottom();

        for (i, kind) in appended.iter().enumerate() {
            view.add_message(message(*kind, &format!("n{i}"), 0));
            prop_assert!(view.is_at_bottom());
            let max = view.content_height().saturating_sub(view.viewport());
            prop_assert_eq!(view.scroll_top(), max);
        }
    }
}
