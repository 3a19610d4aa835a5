use anyhow::{anyhow, Result};
use clap::Parser;
use std::cell::RefCell;
use std::sync::Arc;

use whosdown::caption::{CaptionClient, GeminiClient};
use whosdown::cli::{self, Args, Context};
use whosdown::config::Config;
use whosdown::feed::InviteFeed;
use whosdown::model::User;
use whosdown::tasks;
use whosdown::transcript::{transcripts_dir, Transcript};
use whosdown::users::{UserDirectory, MOCK_FRIENDS};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Load configuration
    let cfg = if let Some(config_path) = &args.config {
        Config::load_from(config_path)?
    } else {
        Config::load()?
    };

    // Validate configuration
    if let Err(errors) = cfg.validate() {
        for err in &errors {
            eprintln!("Config error: {}", err);
        }
        return Err(anyhow!(
            "configuration has {} validation error(s)",
            errors.len()
        ));
    }

    // Debug output if requested
    if args.debug {
        eprintln!(
            "[DEBUG] sim: every {}s at {} chance, ttl {}s{}",
            cfg.sim.interval_secs,
            cfg.sim.arrival_chance,
            cfg.sim.invite_ttl_secs,
            if args.no_sim { " (disabled)" } else { "" }
        );
        eprintln!("[DEBUG] prune: every {}s", cfg.prune.interval_secs);
        eprintln!(
            "[DEBUG] caption: {} via {}",
            cfg.caption.model, cfg.caption.base_url
        );
    }

    // Name-only login; one-shot mode skips the prompt
    let name = match (&args.name, &args.command) {
        (Some(name), _) => name.clone(),
        (None, Some(_)) => "You".to_string(),
        (None, None) => cli::prompt_login()?,
    };
    let user = User::new_local(&name);

    let users = UserDirectory::with_seeds();
    users.insert(user.clone());

    let feed = Arc::new(InviteFeed::new());

    let transcripts = transcripts_dir();
    std::fs::create_dir_all(&transcripts)?;
    let session_id = uuid::Uuid::new_v4().to_string();
    let transcript_path = transcripts.join(format!("{}.jsonl", session_id));
    let transcript = Arc::new(Transcript::new(&transcript_path, &session_id)?);
    let _ = transcript.login(&user);

    let gemini = GeminiClient::from_config(&cfg.caption)?;
    if !gemini.has_key() {
        eprintln!(
            "[caption] {} not set; suggestions will use the stock fallback",
            cfg.caption.api_key_env
        );
    }
    let caption: Arc<dyn CaptionClient> = Arc::new(gemini);

    // Timer tasks live on the runtime; the REPL stays on this thread and
    // borrows the handle for the occasional caption round-trip.
    let runtime = tokio::runtime::Runtime::new()?;
    let (toast_tx, toast_rx) = tokio::sync::mpsc::unbounded_channel();
    if !args.no_sim {
        runtime.spawn(tasks::arrival_loop(
            feed.clone(),
            cfg.sim.clone(),
            MOCK_FRIENDS.clone(),
            transcript.clone(),
            toast_tx,
        ));
    }
    runtime.spawn(tasks::prune_loop(
        feed.clone(),
        cfg.prune.clone(),
        transcript.clone(),
    ));

    let ctx = Context {
        args,
        config: cfg,
        user,
        feed,
        users,
        caption,
        transcript,
        runtime: runtime.handle().clone(),
        toasts: RefCell::new(toast_rx),
    };

    if let Some(command) = ctx.args.command.clone() {
        cli::run_once(&ctx, &command)
    } else {
        cli::run_repl(ctx)
    }
}
