//! Background services: the arrival simulator and the expiry pruner.
//!
//! Two independent periodic loops. Each mutation goes through the feed's
//! mutex, so the timers never interleave with REPL-driven updates; the
//! order between the two timers is simply whichever fires first.

use crate::config::{PruneConfig, SimConfig};
use crate::feed::InviteFeed;
use crate::model::{now_ms, Invite, User};
use crate::presets::ACTIVITY_PRESETS;
use crate::transcript::Transcript;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant};

/// Transient notification raised when a simulated invite arrives.
/// Display-only; dropping one never affects the feed.
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
}

pub fn arrival_toast(invite: &Invite) -> Toast {
    Toast {
        message: format!("{} is down for {}!", invite.creator.name, invite.activity),
    }
}

/// Periodically roll for a simulated incoming invite and announce hits
/// on the toast channel. Exits when the receiving side is gone.
pub async fn arrival_loop(
    feed: Arc<InviteFeed>,
    cfg: SimConfig,
    candidates: Vec<User>,
    transcript: Arc<Transcript>,
    toasts: mpsc::UnboundedSender<Toast>,
) {
    let period = Duration::from_secs(cfg.interval_secs);
    let ttl_ms = cfg.invite_ttl_secs as i64 * 1000;
    // first roll happens one full period after startup
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        ticker.tick().await;
        let arrived = feed.simulate_arrival(
            &mut rand::thread_rng(),
            cfg.arrival_chance,
            &candidates,
            ACTIVITY_PRESETS,
            ttl_ms,
            now_ms(),
        );
        if let Some(invite) = arrived {
            let _ = transcript.simulated_arrival(&invite);
            if toasts.send(arrival_toast(&invite)).is_err() {
                break;
            }
        }
    }
}

/// Periodically sweep expired invites out of the feed.
pub async fn prune_loop(feed: Arc<InviteFeed>, cfg: PruneConfig, transcript: Arc<Transcript>) {
    let period = Duration::from_secs(cfg.interval_secs);
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        ticker.tick().await;
        let removed = feed.prune_expired(now_ms());
        if removed > 0 {
            let _ = transcript.pruned(removed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::invite_id;

    #[test]
    fn test_arrival_toast_message() {
        let creator = User {
            id: "f1".to_string(),
            name: "Sarah Chen".to_string(),
            handle: "@schen".to_string(),
            avatar_url: String::new(),
        };
        let invite = Invite {
            id: invite_id(0),
            creator,
            activity: "Coffee".to_string(),
            emoji: "☕".to_string(),
            caption: String::new(),
            location: None,
            created_at: 0,
            expires_at: 1,
            attendees: Vec::new(),
        };
        assert_eq!(arrival_toast(&invite).message, "Sarah Chen is down for Coffee!");
    }
}
