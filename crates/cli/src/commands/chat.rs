//! `cockpit chat` — Interactive or single-message chat with file context.

use crate::slash::{self, SlashCommand};
use crate::transcript;
use chrono::Local;
use cockpit_config::AppConfig;
use cockpit_core::error::SessionError;
use cockpit_core::event::EventBus;
use cockpit_core::provider::Provider;
use cockpit_engine::generation::error_annotation;
use cockpit_engine::{
    ABORT_MARKER, CancellationToken, ContextMode, GenerationOutcome, GenerationStatus, Session,
    search_pool,
};
use cockpit_loader::{IngestPolicy, LoadedFile, expand_tilde, load_path};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Files listed by `/files`.
const FILES_LISTED: usize = 20;

/// Arguments of `cockpit chat`.
#[derive(Debug, Default)]
pub struct ChatOptions {
    pub message: Option<String>,
    pub load: Vec<String>,
    pub mode: Option<String>,
    pub model: Option<String>,
}

enum Flow {
    Continue,
    Exit,
}

/// Everything the REPL needs besides the session.
struct Repl {
    config: AppConfig,
    provider: Arc<dyn Provider>,
    policy: IngestPolicy,
    model: String,
}

pub async fn run(options: ChatOptions) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let router = cockpit_providers::build_from_config(&config);
    let provider = router
        .default_provider()
        .ok_or("No default provider configured")?;

    let event_bus = Arc::new(EventBus::default());
    spawn_event_logger(&event_bus);

    let mut session = Session::from_config(&config).with_event_bus(event_bus);
    if let Some(mode) = &options.mode {
        session.set_mode(mode.parse::<ContextMode>()?);
    }

    let wanted = options.model.clone().unwrap_or_else(|| config.default_model.clone());
    let model = resolve_startup_model(provider.as_ref(), wanted).await;

    let mut repl = Repl {
        policy: IngestPolicy::from(&config.ingest),
        config,
        provider,
        model,
    };

    for path in &options.load {
        println!("  {}", repl.load(&mut session, path).await);
    }

    if let Some(message) = options.message {
        repl.ask(&mut session, &message).await?;
        return Ok(());
    }

    repl.banner(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        let Some(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match slash::parse(line) {
            Some(command) => {
                if let Flow::Exit = repl.handle(&mut session, command).await {
                    break;
                }
            }
            None => repl.ask(&mut session, line).await?,
        }
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

impl Repl {
    fn banner(&self, session: &Session) {
        println!();
        println!("  ╔══════════════════════════════════════════════╗");
        println!("  ║            Cockpit — Interactive Mode        ║");
        println!("  ╚══════════════════════════════════════════════╝");
        println!();
        println!("  Network:   {}", network_status());
        println!("  Provider:  {}", self.provider.name());
        println!("  Model:     {}", self.model);
        println!("  Mode:      {}", session.mode());
        println!(
            "  Context:   {} files (~{} tokens)",
            session.pool().len(),
            session.pool().total_tokens()
        );
        println!();
        println!("  Type a question, or /help for commands.");
        println!();
    }

    /// Send one question and stream the answer to stdout.
    async fn ask(&self, session: &mut Session, query: &str) -> Result<(), Box<dyn std::error::Error>> {
        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        println!();
        print!("  Assistant > ");
        std::io::stdout().flush()?;

        let mut stdout = std::io::stdout();
        let result = session
            .generate(self.provider.as_ref(), &self.model, query, &cancel, |delta| {
                let _ = write!(stdout, "{delta}");
                let _ = stdout.flush();
            })
            .await;
        watcher.abort();

        match result {
            Ok(outcome) => {
                match outcome.status {
                    GenerationStatus::Completed => println!(),
                    GenerationStatus::Aborted => println!("{ABORT_MARKER}"),
                    GenerationStatus::Failed => {
                        println!();
                        if let Some(e) = &outcome.error {
                            eprintln!("  {}", error_annotation(e).trim());
                        }
                    }
                }
                println!();
                println!("  [{}]", stats_line(&outcome));
                println!();
            }
            Err(SessionError::EmptyQuery) => println!(),
            Err(e) => eprintln!("  [Error] {e}"),
        }
        Ok(())
    }

    async fn handle(&mut self, session: &mut Session, command: SlashCommand) -> Flow {
        match command {
            SlashCommand::Load(path) => println!("  {}", self.load(session, &path).await),
            SlashCommand::Focus(pattern) => {
                let names = session.focus(&pattern);
                if names.is_empty() {
                    println!("  No loaded file matches '{pattern}'.");
                } else {
                    println!("  Pinned: {}", names.join(", "));
                }
            }
            SlashCommand::Unfocus => println!("  {} pins removed.", session.clear_pins()),
            SlashCommand::Files => print_files(session),
            SlashCommand::Search(needle) => print_search(session, &needle),
            SlashCommand::Model(None) => println!("  Current model: {}", self.model),
            SlashCommand::Model(Some(wanted)) => self.switch_model(&wanted).await,
            SlashCommand::Mode(mode) => match mode.parse::<ContextMode>() {
                Ok(mode) => {
                    session.set_mode(mode);
                    println!("  Context mode: {mode}");
                }
                Err(e) => println!("  {e}"),
            },
            SlashCommand::Save => {
                let dir = PathBuf::from(expand_tilde(&self.config.transcript.directory));
                match transcript::save(&dir, session.history(), Local::now()).await {
                    Ok(path) => println!("  Saved: {}", path.display()),
                    Err(e) => eprintln!("  [Error] Could not save transcript: {e}"),
                }
            }
            SlashCommand::Clear => {
                session.reset_session();
                println!("  Files, pins and history cleared.");
            }
            SlashCommand::Help => println!("{}", indent(slash::HELP)),
            SlashCommand::Exit => return Flow::Exit,
            SlashCommand::Usage(usage) => println!("  Usage: {usage}"),
            SlashCommand::Unknown(cmd) => println!("  Unknown command: {cmd} (try /help)"),
        }
        Flow::Continue
    }

    async fn load(&self, session: &mut Session, path: &str) -> String {
        match load_files(path, &self.policy).await {
            Ok(files) => {
                let report = session.ingest_all(files.into_iter().map(LoadedFile::into_pair));
                let mut msg = format!(
                    "Loaded {} files (total: {}).",
                    report.loaded, report.pool_size
                );
                if report.failed > 0 {
                    msg.push_str(&format!(" {} errors.", report.failed));
                }
                msg
            }
            Err(e) => format!("[Error] {e}"),
        }
    }

    async fn switch_model(&mut self, wanted: &str) {
        match self.provider.list_models().await {
            Ok(models) if !models.is_empty() => match slash::match_model(&models, wanted) {
                Some(found) => {
                    self.model = found.to_string();
                    println!("  Switched model: {}", self.model);
                }
                None => {
                    println!("  Model '{wanted}' not found.");
                    println!("  Available: {}", models.join(", "));
                }
            },
            Ok(_) | Err(_) => {
                self.model = wanted.to_string();
                println!("  Switched model blindly (backend unreachable?): {wanted}");
            }
        }
    }
}

/// Walk `path` on the blocking thread pool.
async fn load_files(path: &str, policy: &IngestPolicy) -> Result<Vec<LoadedFile>, String> {
    let path = path.to_string();
    let policy = policy.clone();
    match tokio::task::spawn_blocking(move || load_path(&path, &policy)).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(e) => Err(format!("Loader task failed: {e}")),
    }
}

/// Keep the configured model if the backend has it; otherwise fall back to
/// the first model it reports.
async fn resolve_startup_model(provider: &dyn Provider, wanted: String) -> String {
    match provider.list_models().await {
        Ok(models) if is_available(&models, &wanted) => wanted,
        Ok(models) => match models.into_iter().next() {
            Some(first) => {
                eprintln!("  [Warning] Model '{wanted}' not available, falling back to '{first}'.");
                first
            }
            None => {
                eprintln!("  [Warning] No models found. Install a model for your backend.");
                wanted
            }
        },
        Err(e) => {
            eprintln!("  [Warning] Cannot reach {}: {e}", provider.name());
            wanted
        }
    }
}

/// Ollama reports `name:latest` for models requested as `name`.
fn is_available(models: &[String], wanted: &str) -> bool {
    models
        .iter()
        .any(|m| m == wanted || m.strip_suffix(":latest") == Some(wanted))
}

fn network_status() -> &'static str {
    match std::env::var("VPN_STATUS").as_deref() {
        Ok("SECURE") => "SECURE",
        _ => "OPEN",
    }
}

fn stats_line(outcome: &GenerationOutcome) -> String {
    format!(
        "{:.1}s | In: ~{} | Out: ~{} toks",
        outcome.elapsed.as_secs_f64(),
        outcome.tokens_in,
        outcome.tokens_out
    )
}

fn print_files(session: &Session) {
    let inventory = session.inventory();
    if inventory.entries.is_empty() {
        println!("  No files loaded.");
        return;
    }

    println!(
        "  {} files (~{} tokens)",
        inventory.entries.len(),
        inventory.total_tokens
    );
    for entry in inventory.entries.iter().take(FILES_LISTED) {
        let pin = if entry.pinned { "📌 " } else { "" };
        println!("    {pin}{} ({} lines)", entry.name, entry.lines);
    }
    if inventory.entries.len() > FILES_LISTED {
        println!("    ... and {} more", inventory.entries.len() - FILES_LISTED);
    }
    if inventory.failed > 0 {
        println!("  {} files failed to load.", inventory.failed);
    }
}

fn print_search(session: &Session, needle: &str) {
    let hits = search_pool(session.pool(), needle);
    if hits.is_empty() {
        println!("  No matches for '{needle}'.");
        return;
    }
    println!("  Matches for '{needle}':");
    for hit in hits {
        println!("    {}:", hit.name);
        for m in hit.matches {
            println!("      L{}: {}", m.line_number, m.text);
        }
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| format!("  {l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn spawn_event_logger(bus: &EventBus) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            tracing::debug!(?event, "Session event");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn latest_tag_counts_as_available() {
        let models = vec!["llama3:latest".to_string(), "mistral:7b".to_string()];
        assert!(is_available(&models, "llama3"));
        assert!(is_available(&models, "mistral:7b"));
        assert!(!is_available(&models, "mistral"));
    }

    #[test]
    fn stats_line_format() {
        let outcome = GenerationOutcome {
            status: GenerationStatus::Completed,
            text: "done".into(),
            error: None,
            tokens_in: 1234,
            tokens_out: 56,
            elapsed: Duration::from_millis(2345),
            usage: None,
        };
        assert_eq!(stats_line(&outcome), "2.3s | In: ~1234 | Out: ~56 toks");
    }

    #[tokio::test]
    async fn load_files_walks_off_the_runtime() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn a() {}").unwrap();
        std::fs::write(dir.path().join("b.rs"), "fn b() {}").unwrap();

        let policy = IngestPolicy::from(&cockpit_config::IngestConfig::default());
        let files = load_files(dir.path().to_str().unwrap(), &policy).await.unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(LoadedFile::is_ok));
    }

    #[tokio::test]
    async fn load_files_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let policy = IngestPolicy::from(&cockpit_config::IngestConfig::default());
        assert!(load_files(missing.to_str().unwrap(), &policy).await.is_err());
    }

    #[test]
    fn indent_prefixes_every_line() {
        assert_eq!(indent("a\nb"), "  a\n  b");
    }
}
