//! Built-in activity presets and invite duration choices.

/// A quick-pick activity with its stock caption.
#[derive(Debug, Clone, Copy)]
pub struct ActivityPreset {
    pub label: &'static str,
    pub emoji: &'static str,
    pub default_caption: &'static str,
}

pub const ACTIVITY_PRESETS: &[ActivityPreset] = &[
    ActivityPreset {
        label: "Coffee",
        emoji: "☕",
        default_caption: "Need caffeine ASAP. Who's around?",
    },
    ActivityPreset {
        label: "Drinks",
        emoji: "🍻",
        default_caption: "Grab a beer? First round on me.",
    },
    ActivityPreset {
        label: "Tacos",
        emoji: "🌮",
        default_caption: "Taco Tuesday vibes (even if it's not Tuesday).",
    },
    ActivityPreset {
        label: "Gym",
        emoji: "💪",
        default_caption: "Hitting the iron paradise. Spotter needed.",
    },
    ActivityPreset {
        label: "Study",
        emoji: "📚",
        default_caption: "Focus mode. Library sesh?",
    },
    ActivityPreset {
        label: "Walk",
        emoji: "🚶",
        default_caption: "Touching grass. Join me for a stroll?",
    },
    ActivityPreset {
        label: "Games",
        emoji: "🎮",
        default_caption: "Hop on discord/console. Let's play.",
    },
    ActivityPreset {
        label: "Movie",
        emoji: "🎬",
        default_caption: "Cinema time. Popcorn included.",
    },
];

/// Invite lifetime choices offered at creation.
#[derive(Debug, Clone, Copy)]
pub struct DurationChoice {
    pub label: &'static str,
    pub ms: i64,
}

pub const DURATION_CHOICES: &[DurationChoice] = &[
    DurationChoice {
        label: "30m",
        ms: 30 * 60 * 1000,
    },
    DurationChoice {
        label: "1h",
        ms: 60 * 60 * 1000,
    },
    DurationChoice {
        label: "2h",
        ms: 2 * 60 * 60 * 1000,
    },
    DurationChoice {
        label: "tonight",
        ms: 4 * 60 * 60 * 1000,
    },
];

/// Look up a preset by 1-based position or case-insensitive label.
pub fn find_preset(query: &str) -> Option<&'static ActivityPreset> {
    if let Ok(n) = query.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| ACTIVITY_PRESETS.get(i));
    }
    ACTIVITY_PRESETS
        .iter()
        .find(|p| p.label.eq_ignore_ascii_case(query))
}

/// Look up a duration in milliseconds by its label.
pub fn find_duration(label: &str) -> Option<i64> {
    DURATION_CHOICES
        .iter()
        .find(|d| d.label.eq_ignore_ascii_case(label))
        .map(|d| d.ms)
}
