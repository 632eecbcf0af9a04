//! Property tests for window retention and replay filtering.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use cachereplay_core::{ClientId, ManualClock};
use cachereplay_events::{
    CallbackRecipient, EventCategory, EventId, EventLog, EventPayload, EventRecord,
    NotificationReplayService, SubscriptionMask,
};
use proptest::prelude::*;

/// One generated notification: category plus the clients named as recipients.
#[derive(Clone, Debug)]
struct Spec {
    category: EventCategory,
    recipients: Vec<(u8, i16)>,
}

fn category() -> impl Strategy<Value = EventCategory> {
    prop::sample::select(EventCategory::ALL.to_vec())
}

fn spec() -> impl Strategy<Value = Spec> {
    (category(), prop::collection::vec((0u8..4, 0i16..3), 0..4))
        .prop_map(|(category, recipients)| Spec { category, recipients })
}

fn mask() -> impl Strategy<Value = SubscriptionMask> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(c, a, r, u)| {
        SubscriptionMask::none()
            .with_cache_cleared(c)
            .with_item_added(a)
            .with_item_removed(r)
            .with_item_updated(u)
    })
}

fn client(n: u8) -> ClientId {
    ClientId::from(format!("C{n}"))
}

fn build(op: usize, spec: &Spec) -> EventRecord {
    let recipients = spec.recipients.iter().map(|(c, cb)| {
        if spec.category.is_keyed_callback() {
            CallbackRecipient::callback(client(*c), *cb)
        } else {
            CallbackRecipient::client(client(*c))
        }
    });
    EventRecord::new(
        EventId::new("n1", i64::try_from(op).unwrap(), 0, spec.category),
        EventPayload::for_key(format!("k{op}")).with_recipients(recipients),
    )
}

fn filled(specs: &[Spec]) -> NotificationReplayService {
    let svc = NotificationReplayService::with_clock(60, Arc::new(ManualClock::new())).unwrap();
    for (op, s) in specs.iter().enumerate() {
        svc.record(build(op, s));
    }
    svc
}

fn expected_for(spec: &Spec, who: u8, mask: SubscriptionMask) -> bool {
    if spec.category.is_broadcast() {
        mask.permits(spec.category)
    } else {
        spec.recipients.iter().any(|(c, _)| *c == who)
    }
}

proptest! {
    #[test]
    fn replay_never_returns_seen_ids(
        specs in prop::collection::vec(spec(), 0..40),
        seen_mask in prop::collection::vec(any::<bool>(), 40),
        who in 0u8..4,
        mask in mask(),
    ) {
        let svc = filled(&specs);
        let seen: HashSet<EventId> = svc
            .snapshot()
            .unwrap()
            .iter()
            .zip(&seen_mask)
            .filter(|(_, s)| **s)
            .map(|(r, _)| r.id().clone())
            .collect();
        let out = svc.get_filtered_replay_list(&client(who), &seen, mask).unwrap();
        for rec in &out {
            prop_assert!(!seen.contains(rec.id()));
        }
    }

    #[test]
    fn replay_matches_filter_laws_in_order(
        specs in prop::collection::vec(spec(), 0..40),
        who in 0u8..4,
        mask in mask(),
    ) {
        let svc = filled(&specs);
        let out = svc
            .get_filtered_replay_list(&client(who), &HashSet::new(), mask)
            .unwrap();
        let got: Vec<i64> = out.iter().map(|r| r.id().operation_counter).collect();
        let want: Vec<i64> = specs
            .iter()
            .enumerate()
            .filter(|(_, s)| expected_for(s, who, mask))
            .map(|(op, _)| i64::try_from(op).unwrap())
            .collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn snapshot_holds_exactly_the_window(
        gaps_ms in prop::collection::vec(0u64..3_000, 1..30),
        window_secs in 1u64..5,
        probe_ms in 0u64..10_000,
    ) {
        let clock = ManualClock::new();
        let log = EventLog::new(window_secs, Arc::new(clock.clone())).unwrap();
        let mut arrivals = Vec::new();
        for (i, gap) in gaps_ms.iter().enumerate() {
            clock.advance(Duration::from_millis(*gap));
            arrivals.push(clock.elapsed());
            log.append(i);
        }
        clock.advance(Duration::from_millis(probe_ms));
        let now = clock.elapsed();
        let window = Duration::from_secs(window_secs);

        let got: Vec<usize> = log.snapshot().iter().map(|i| **i).collect();
        let want: Vec<usize> = arrivals
            .iter()
            .enumerate()
            .filter(|(_, at)| now - **at <= window)
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn evicted_items_stay_gone(
        steps in prop::collection::vec((0u64..1_500, any::<bool>()), 1..40),
    ) {
        let clock = ManualClock::new();
        let log = EventLog::new(2, Arc::new(clock.clone())).unwrap();
        let mut gone: HashSet<usize> = HashSet::new();
        let mut visible: HashSet<usize> = HashSet::new();
        for (i, (gap, append)) in steps.iter().enumerate() {
            clock.advance(Duration::from_millis(*gap));
            if *append {
                log.append(i);
            }
            let now: HashSet<usize> = log.snapshot().iter().map(|i| **i).collect();
            for item in &now {
                prop_assert!(!gone.contains(item), "item {} reappeared", item);
            }
            gone.extend(visible.difference(&now).copied());
            visible = now;
        }
    }

    #[test]
    fn completeness_flips_exactly_at_window(
        window_secs in 1u64..10,
        ticks_ms in prop::collection::vec(0u64..2_000, 1..20),
    ) {
        let clock = ManualClock::new();
        let svc = NotificationReplayService::with_clock(window_secs, Arc::new(clock.clone())).unwrap();
        for tick in ticks_ms {
            clock.advance(Duration::from_millis(tick));
            let expected = clock.elapsed() >= Duration::from_secs(window_secs);
            prop_assert_eq!(svc.has_complete_data().unwrap(), expected);
        }
    }
}
