//! Invite feed manager: single owner of the session's invite collection.
//!
//! Every mutation (create, join, prune, simulated arrival) takes the same
//! mutex, so the timer tasks and the REPL thread never interleave updates.
//! The collection is kept newest-first; that ordering is the display
//! contract.

use crate::model::{invite_id, Invite, JoinOutcome, User};
use crate::presets::ActivityPreset;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct InviteFeed {
    invites: Mutex<Vec<Invite>>,
}

impl InviteFeed {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Invite>> {
        // A panic while holding the lock leaves the data intact; recover
        // the guard rather than poisoning the whole session.
        self.invites.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create an invite on explicit user action and prepend it to the
    /// feed. The creator is auto-joined. `duration_ms` must be positive.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        creator: &User,
        activity: &str,
        emoji: &str,
        caption: &str,
        location: Option<String>,
        duration_ms: i64,
        now_ms: i64,
    ) -> Invite {
        debug_assert!(duration_ms > 0);
        let invite = Invite {
            id: invite_id(now_ms),
            creator: creator.clone(),
            activity: activity.to_string(),
            emoji: emoji.to_string(),
            caption: caption.to_string(),
            location,
            created_at: now_ms,
            expires_at: now_ms + duration_ms,
            attendees: vec![creator.id.clone()],
        };
        self.lock().insert(0, invite.clone());
        invite
    }

    /// Add `user_id` to an invite's attendee list. Idempotent; unknown
    /// and already-expired ids are no-ops. There is no leave operation,
    /// so attendee lists only ever grow.
    pub fn join(&self, invite_id: &str, user_id: &str, now_ms: i64) -> JoinOutcome {
        let mut invites = self.lock();
        match invites
            .iter_mut()
            .find(|inv| inv.id == invite_id && !inv.is_expired(now_ms))
        {
            None => JoinOutcome::NotFound,
            Some(inv) if inv.has_attendee(user_id) => JoinOutcome::AlreadyIn,
            Some(inv) => {
                inv.attendees.push(user_id.to_string());
                JoinOutcome::Joined
            }
        }
    }

    /// Remove every invite whose deadline has passed, preserving the
    /// order of survivors. Returns the removed count.
    pub fn prune_expired(&self, now_ms: i64) -> usize {
        let mut invites = self.lock();
        let before = invites.len();
        invites.retain(|inv| !inv.is_expired(now_ms));
        before - invites.len()
    }

    /// With probability `chance`, synthesize an incoming invite from a
    /// random candidate and activity preset and prepend it to the feed.
    ///
    /// Simulated creators are not auto-joined; only explicit `create`
    /// seeds the attendee list. Returns the invite so the caller can
    /// raise a transient notification, `None` when the roll fails or a
    /// pool is empty.
    pub fn simulate_arrival<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        chance: f64,
        candidates: &[User],
        presets: &[ActivityPreset],
        ttl_ms: i64,
        now_ms: i64,
    ) -> Option<Invite> {
        if candidates.is_empty() || presets.is_empty() {
            return None;
        }
        if !rng.gen_bool(chance.clamp(0.0, 1.0)) {
            return None;
        }
        let creator = candidates.choose(rng)?;
        let preset = presets.choose(rng)?;
        let invite = Invite {
            id: invite_id(now_ms),
            creator: creator.clone(),
            activity: preset.label.to_string(),
            emoji: preset.emoji.to_string(),
            caption: preset.default_caption.to_string(),
            location: None,
            created_at: now_ms,
            expires_at: now_ms + ttl_ms,
            attendees: Vec::new(),
        };
        self.lock().insert(0, invite.clone());
        Some(invite)
    }

    /// Clone of the current collection, newest first.
    pub fn snapshot(&self) -> Vec<Invite> {
        self.lock().clone()
    }

    pub fn active_count(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::ACTIVITY_PRESETS;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.to_string(),
            name: name.to_string(),
            handle: crate::model::derive_handle(name),
            avatar_url: String::new(),
        }
    }

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn test_create_sets_expiry_and_attendees() {
        let feed = InviteFeed::new();
        let creator = user("u1", "You");
        let invite = feed.create(
            &creator,
            "Coffee",
            "☕",
            "Need caffeine",
            None,
            1_800_000,
            T0,
        );
        assert_eq!(invite.created_at, T0);
        assert_eq!(invite.expires_at, T0 + 1_800_000);
        assert!(invite.expires_at > invite.created_at);
        assert_eq!(invite.attendees, vec!["u1".to_string()]);
        assert_eq!(feed.active_count(), 1);
    }

    #[test]
    fn test_create_prepends_newest_first() {
        let feed = InviteFeed::new();
        let creator = user("u1", "You");
        feed.create(&creator, "Coffee", "☕", "a", None, 1_000, T0);
        feed.create(&creator, "Tacos", "🌮", "b", None, 1_000, T0 + 1);
        let snapshot = feed.snapshot();
        assert_eq!(snapshot[0].activity, "Tacos");
        assert_eq!(snapshot[1].activity, "Coffee");
    }

    #[test]
    fn test_join_is_idempotent() {
        let feed = InviteFeed::new();
        let creator = user("u1", "You");
        let invite = feed.create(&creator, "Gym", "💪", "c", None, 60_000, T0);

        assert_eq!(feed.join(&invite.id, "f1", T0 + 1), JoinOutcome::Joined);
        assert_eq!(feed.join(&invite.id, "f1", T0 + 2), JoinOutcome::AlreadyIn);

        let snapshot = feed.snapshot();
        assert_eq!(snapshot[0].attendees, vec!["u1".to_string(), "f1".to_string()]);
    }

    #[test]
    fn test_join_creator_already_in() {
        let feed = InviteFeed::new();
        let creator = user("u1", "You");
        let invite = feed.create(&creator, "Gym", "💪", "c", None, 60_000, T0);
        assert_eq!(feed.join(&invite.id, "u1", T0 + 1), JoinOutcome::AlreadyIn);
        assert_eq!(feed.snapshot()[0].attendees.len(), 1);
    }

    #[test]
    fn test_join_unknown_id_is_noop() {
        let feed = InviteFeed::new();
        assert_eq!(feed.join("nope", "f1", T0), JoinOutcome::NotFound);
    }

    #[test]
    fn test_join_expired_invite_is_noop() {
        let feed = InviteFeed::new();
        let creator = user("u1", "You");
        let invite = feed.create(&creator, "Walk", "🚶", "d", None, 1_000, T0);
        // past the deadline but not yet pruned
        assert_eq!(feed.join(&invite.id, "f1", T0 + 1_000), JoinOutcome::NotFound);
        assert_eq!(feed.snapshot()[0].attendees.len(), 1);
    }

    #[test]
    fn test_prune_removes_exactly_expired() {
        let feed = InviteFeed::new();
        let creator = user("u1", "You");
        feed.create(&creator, "Coffee", "☕", "a", None, 1_000, T0);
        feed.create(&creator, "Tacos", "🌮", "b", None, 5_000, T0);

        let removed = feed.prune_expired(T0 + 2_000);
        assert_eq!(removed, 1);

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].activity, "Tacos");
    }

    #[test]
    fn test_prune_preserves_survivor_order() {
        let feed = InviteFeed::new();
        let creator = user("u1", "You");
        feed.create(&creator, "Coffee", "☕", "a", None, 10_000, T0);
        feed.create(&creator, "Tacos", "🌮", "b", None, 1_000, T0);
        feed.create(&creator, "Gym", "💪", "c", None, 10_000, T0);

        assert_eq!(feed.prune_expired(T0 + 2_000), 1);
        let labels: Vec<_> = feed.snapshot().iter().map(|i| i.activity.clone()).collect();
        assert_eq!(labels, vec!["Gym".to_string(), "Coffee".to_string()]);
    }

    #[test]
    fn test_prune_empty_feed() {
        let feed = InviteFeed::new();
        assert_eq!(feed.prune_expired(T0), 0);
    }

    #[test]
    fn test_simulated_arrival_never_auto_joins() {
        let feed = InviteFeed::new();
        let mut rng = StdRng::seed_from_u64(7);
        let candidates = vec![user("f1", "Sarah Chen"), user("f2", "Marcus Johnson")];

        let invite = feed
            .simulate_arrival(&mut rng, 1.0, &candidates, ACTIVITY_PRESETS, 7_200_000, T0)
            .unwrap();
        assert!(invite.attendees.is_empty());
        assert_eq!(invite.expires_at, T0 + 7_200_000);
        assert!(candidates.iter().any(|c| c.id == invite.creator.id));
        assert_eq!(feed.active_count(), 1);
    }

    #[test]
    fn test_simulated_arrival_respects_chance() {
        let feed = InviteFeed::new();
        let mut rng = StdRng::seed_from_u64(7);
        let candidates = vec![user("f1", "Sarah Chen")];

        let none = feed.simulate_arrival(&mut rng, 0.0, &candidates, ACTIVITY_PRESETS, 1_000, T0);
        assert!(none.is_none());
        assert_eq!(feed.active_count(), 0);
    }

    #[test]
    fn test_simulated_arrival_empty_pools() {
        let feed = InviteFeed::new();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(feed
            .simulate_arrival(&mut rng, 1.0, &[], ACTIVITY_PRESETS, 1_000, T0)
            .is_none());
        assert!(feed
            .simulate_arrival(&mut rng, 1.0, &[user("f1", "x")], &[], 1_000, T0)
            .is_none());
    }

    #[test]
    fn test_simulated_arrivals_get_distinct_ids() {
        let feed = InviteFeed::new();
        let mut rng = StdRng::seed_from_u64(7);
        let candidates = vec![user("f1", "Sarah Chen")];

        // same tick timestamp, ids must still differ
        let a = feed
            .simulate_arrival(&mut rng, 1.0, &candidates, ACTIVITY_PRESETS, 1_000, T0)
            .unwrap();
        let b = feed
            .simulate_arrival(&mut rng, 1.0, &candidates, ACTIVITY_PRESETS, 1_000, T0)
            .unwrap();
        assert_ne!(a.id, b.id);
    }
}
