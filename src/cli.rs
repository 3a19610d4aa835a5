//! Interactive front end: argument parsing, the REPL, and feed rendering.

use crate::caption::{suggest_caption, CaptionClient};
use crate::config::Config;
use crate::feed::InviteFeed;
use crate::model::{now_ms, JoinOutcome, User};
use crate::presets::{find_duration, find_preset, ACTIVITY_PRESETS, DURATION_CHOICES};
use crate::tasks::{arrival_toast, Toast};
use crate::transcript::Transcript;
use crate::users::{UserDirectory, MOCK_FRIENDS};
use anyhow::{anyhow, Result};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Who's Down? - spontaneous hangouts only
#[derive(Parser, Debug)]
#[command(name = "whosdown", about = "Who's Down? - spontaneous hangouts only")]
pub struct Args {
    #[arg(short, long, help = "Display name (skips the login prompt)")]
    pub name: Option<String>,

    #[arg(long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'c',
        long,
        help = "Run a single command and exit (e.g. \"/feed\")"
    )]
    pub command: Option<String>,

    #[arg(long, help = "Disable the incoming-invite simulator")]
    pub no_sim: bool,

    #[arg(long, help = "Debug output")]
    pub debug: bool,
}

/// Everything the REPL needs. Lives on the main thread; the timer tasks
/// only share the feed, the directory, and the transcript.
pub struct Context {
    pub args: Args,
    pub config: Config,
    pub user: User,
    pub feed: Arc<InviteFeed>,
    pub users: Arc<UserDirectory>,
    pub caption: Arc<dyn CaptionClient>,
    pub transcript: Arc<Transcript>,
    pub runtime: tokio::runtime::Handle,
    pub toasts: RefCell<mpsc::UnboundedReceiver<Toast>>,
}

/// Get the path to the history file
fn history_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".whosdown")
        .join("history")
}

/// Name-only login: keep asking until we get a non-empty name.
pub fn prompt_login() -> Result<String> {
    let mut rl = DefaultEditor::new()?;
    println!("Who's Down? — spontaneous hangouts only.");
    loop {
        match rl.readline("What's your name? ") {
            Ok(line) => {
                let name = line.trim();
                if !name.is_empty() {
                    return Ok(name.to_string());
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                return Err(anyhow!("login cancelled"));
            }
            Err(e) => return Err(e.into()),
        }
    }
}

pub fn run_once(ctx: &Context, command: &str) -> Result<()> {
    let command = command.trim();
    let line = if command.starts_with('/') {
        command.to_string()
    } else {
        format!("/{}", command)
    };
    handle_command(ctx, &line);
    Ok(())
}

pub fn run_repl(ctx: Context) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    let history_file = history_path();
    let _ = rl.load_history(&history_file);

    println!(
        "Let's go, {} ({}). Type /help for commands, /exit to quit.",
        ctx.user.name, ctx.user.handle
    );
    print_feed(&ctx);

    loop {
        drain_toasts(&ctx);
        match rl.readline(">>> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                if line.starts_with('/') {
                    if handle_command(&ctx, line) {
                        break;
                    }
                    continue;
                }

                println!("Commands start with '/'. Try /help.");
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    // Save command history (create parent directory if needed)
    if let Some(parent) = history_file.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = rl.save_history(&history_file);

    Ok(())
}

/// Handle a slash command. Returns true when the REPL should exit.
fn handle_command(ctx: &Context, cmd: &str) -> bool {
    let parts: Vec<&str> = cmd.splitn(2, ' ').collect();
    let rest = parts.get(1).map(|s| s.trim()).unwrap_or("");
    match parts[0] {
        "/exit" | "/quit" => return true,
        "/help" => {
            println!("Commands:");
            println!("  /feed                    - show the live feed");
            println!("  /create <what> [opts]    - start an invite (see below)");
            println!("  /join <n>                - join invite #n from /feed");
            println!("  /friends                 - list friends");
            println!("  /profile                 - show your profile");
            println!("  /simulate                - force an incoming invite");
            println!("  /exit                    - quit");
            println!();
            println!("/create takes an activity (number or name), then optionally a");
            println!("duration, a caption (or 'ai' for a suggested one), and a spot:");
            println!("  /create tacos");
            println!("  /create 3 30m Extra salsa this time @ Mission St");
            println!("  /create gym 2h ai");
            println!();
            println!("Activities:");
            for (i, preset) in ACTIVITY_PRESETS.iter().enumerate() {
                println!("  {}. {} {}", i + 1, preset.emoji, preset.label);
            }
            let labels: Vec<&str> = DURATION_CHOICES.iter().map(|d| d.label).collect();
            println!("Durations: {} (default 1h)", labels.join(", "));
        }
        "/feed" => print_feed(ctx),
        "/create" => cmd_create(ctx, rest),
        "/join" => cmd_join(ctx, rest),
        "/friends" => {
            println!("Friends:");
            for friend in MOCK_FRIENDS.iter() {
                println!("  {} ({})", friend.name, friend.handle);
            }
        }
        "/profile" => cmd_profile(ctx),
        "/simulate" => cmd_simulate(ctx),
        _ => {
            println!("Unknown command: {}. Try /help.", parts[0]);
        }
    }
    false
}

// ============ /create ============

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionSpec {
    /// Use the preset's stock caption.
    Default,
    /// Ask the caption service ("ai").
    Suggested,
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub preset_query: String,
    pub duration_ms: i64,
    pub caption: CaptionSpec,
    pub location: Option<String>,
}

const DEFAULT_DURATION_MS: i64 = 60 * 60 * 1000;

/// Parse `/create` arguments: `<activity> [duration] [caption|ai] [@ spot]`.
pub fn parse_create(input: &str) -> Result<CreateRequest> {
    // a trailing " @ spot" is the location; captions keep interior '@'s
    let (head, location) = match input.rfind(" @ ") {
        Some(idx) => {
            let loc = input[idx + 3..].trim();
            let loc = (!loc.is_empty()).then(|| loc.to_string());
            (&input[..idx], loc)
        }
        None => (input, None),
    };

    let mut tokens = head.split_whitespace();
    let preset_query = tokens
        .next()
        .ok_or_else(|| anyhow!("usage: /create <activity> [duration] [caption|ai] [@ spot]"))?
        .to_string();

    let rest: Vec<&str> = tokens.collect();
    let (duration_ms, caption_tokens) = match rest.first().and_then(|t| find_duration(t)) {
        Some(ms) => (ms, &rest[1..]),
        None => (DEFAULT_DURATION_MS, &rest[..]),
    };

    let caption_text = caption_tokens.join(" ");
    let caption = if caption_text.is_empty() {
        CaptionSpec::Default
    } else if caption_text.eq_ignore_ascii_case("ai") {
        CaptionSpec::Suggested
    } else {
        CaptionSpec::Text(caption_text)
    };

    Ok(CreateRequest {
        preset_query,
        duration_ms,
        caption,
        location,
    })
}

fn cmd_create(ctx: &Context, args_str: &str) {
    let req = match parse_create(args_str) {
        Ok(req) => req,
        Err(e) => {
            println!("{}", e);
            return;
        }
    };

    let Some(preset) = find_preset(&req.preset_query) else {
        println!(
            "Unknown activity '{}'. Pick a number 1-{} or a name from /help.",
            req.preset_query,
            ACTIVITY_PRESETS.len()
        );
        return;
    };

    let caption = match req.caption {
        CaptionSpec::Default => preset.default_caption.to_string(),
        CaptionSpec::Text(text) => text,
        CaptionSpec::Suggested => {
            println!("Thinking of a caption...");
            // single awaited round-trip; failure resolves to the fallback
            ctx.runtime
                .block_on(suggest_caption(ctx.caption.as_ref(), preset.label))
        }
    };

    let invite = ctx.feed.create(
        &ctx.user,
        preset.label,
        preset.emoji,
        &caption,
        req.location,
        req.duration_ms,
        now_ms(),
    );
    let _ = ctx.transcript.invite_created(&invite);

    println!(
        "{} {} is live for {} — \"{}\"",
        invite.emoji,
        invite.activity,
        format_remaining(invite.remaining_ms(now_ms())),
        invite.caption
    );
}

// ============ /join ============

fn cmd_join(ctx: &Context, arg: &str) {
    let Ok(n) = arg.trim().parse::<usize>() else {
        println!("Usage: /join <number> (see /feed)");
        return;
    };
    let snapshot = ctx.feed.snapshot();
    let Some(invite) = n.checked_sub(1).and_then(|i| snapshot.get(i)) else {
        println!("No invite #{} on the feed.", n);
        return;
    };

    // join by id: if the invite expired between the snapshot and now,
    // the feed treats it as gone
    let outcome = ctx.feed.join(&invite.id, &ctx.user.id, now_ms());
    let _ = ctx.transcript.invite_joined(&invite.id, &ctx.user.id, outcome);
    match outcome {
        JoinOutcome::Joined => {
            println!("⚡ You're in for {} {}!", invite.emoji, invite.activity)
        }
        JoinOutcome::AlreadyIn => println!("You're already in."),
        JoinOutcome::NotFound => println!("Too late, that one's gone."),
    }
}

// ============ rendering ============

fn cmd_profile(ctx: &Context) {
    let joined = ctx
        .feed
        .snapshot()
        .iter()
        .filter(|inv| inv.has_attendee(&ctx.user.id))
        .count();
    println!("{} ({})", ctx.user.name, ctx.user.handle);
    println!("  id:     {}", ctx.user.id);
    println!("  avatar: {}", ctx.user.avatar_url);
    println!("  in on {} active invite(s)", joined);
}

fn cmd_simulate(ctx: &Context) {
    let arrived = ctx.feed.simulate_arrival(
        &mut rand::thread_rng(),
        1.0,
        &MOCK_FRIENDS,
        ACTIVITY_PRESETS,
        ctx.config.sim.invite_ttl_secs as i64 * 1000,
        now_ms(),
    );
    match arrived {
        Some(invite) => {
            let _ = ctx.transcript.simulated_arrival(&invite);
            println!("⚡ {}", arrival_toast(&invite).message);
        }
        None => println!("Simulation pools are empty."),
    }
}

fn print_feed(ctx: &Context) {
    let now = now_ms();
    let invites = ctx.feed.snapshot();
    println!("Live Now — {} active", invites.len());
    if invites.is_empty() {
        println!("😴 No one is doing anything. Be the first: /create");
        return;
    }
    for (i, invite) in invites.iter().enumerate() {
        let going: Vec<String> = invite
            .attendees
            .iter()
            .map(|id| ctx.users.display_name(id))
            .collect();
        let going = if going.is_empty() {
            "no one yet".to_string()
        } else {
            going.join(", ")
        };
        println!();
        println!(
            "{:>2}. {} {} — {} ({})",
            i + 1,
            invite.emoji,
            invite.activity,
            invite.creator.name,
            invite.creator.handle
        );
        println!("    {}", invite.caption);
        if let Some(location) = &invite.location {
            println!("    📍 {}", location);
        }
        println!(
            "    {} left · going: {}",
            format_remaining(invite.remaining_ms(now)),
            going
        );
    }
}

/// Render remaining lifetime as "1h 05m" / "42m" / "<1m".
pub fn format_remaining(ms: i64) -> String {
    let mins = ms / 60_000;
    if mins <= 0 {
        return "<1m".to_string();
    }
    let (h, m) = (mins / 60, mins % 60);
    if h > 0 {
        format!("{}h {:02}m", h, m)
    } else {
        format!("{}m", m)
    }
}

fn drain_toasts(ctx: &Context) {
    let mut toasts = ctx.toasts.borrow_mut();
    while let Ok(toast) = toasts.try_recv() {
        println!("⚡ {}", toast.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_minimal() {
        let req = parse_create("tacos").unwrap();
        assert_eq!(req.preset_query, "tacos");
        assert_eq!(req.duration_ms, DEFAULT_DURATION_MS);
        assert_eq!(req.caption, CaptionSpec::Default);
        assert_eq!(req.location, None);
    }

    #[test]
    fn test_parse_create_full() {
        let req = parse_create("3 30m Extra salsa this time @ Mission St").unwrap();
        assert_eq!(req.preset_query, "3");
        assert_eq!(req.duration_ms, 30 * 60 * 1000);
        assert_eq!(
            req.caption,
            CaptionSpec::Text("Extra salsa this time".to_string())
        );
        assert_eq!(req.location, Some("Mission St".to_string()));
    }

    #[test]
    fn test_parse_create_ai_caption() {
        let req = parse_create("gym 2h ai").unwrap();
        assert_eq!(req.duration_ms, 2 * 60 * 60 * 1000);
        assert_eq!(req.caption, CaptionSpec::Suggested);
    }

    #[test]
    fn test_parse_create_caption_without_duration() {
        let req = parse_create("coffee Need a double shot").unwrap();
        assert_eq!(req.duration_ms, DEFAULT_DURATION_MS);
        assert_eq!(
            req.caption,
            CaptionSpec::Text("Need a double shot".to_string())
        );
    }

    #[test]
    fn test_parse_create_empty_is_usage_error() {
        assert!(parse_create("").is_err());
        assert!(parse_create("   ").is_err());
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(0), "<1m");
        assert_eq!(format_remaining(59_000), "<1m");
        assert_eq!(format_remaining(42 * 60_000), "42m");
        assert_eq!(format_remaining(65 * 60_000), "1h 05m");
        assert_eq!(format_remaining(2 * 60 * 60_000), "2h 00m");
    }
}
