use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Subcommand;
use quizguard_core::{
    Config, Effect, HeadlessRenderer, HttpGradingService, Input, KeyChord, QuestionPayload,
    SessionConfig, SessionHandle, SessionRuntime, SessionSummary, Signal, ViewportSample,
    ViewportSource,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Run a headless session, reading environment signals from stdin
    ///
    /// One command per line: `fullscreen on|off`, `hide`, `show`, `blur`,
    /// `contextmenu`, `key <combo>`, `keyup <key>`,
    /// `viewport <outer_w> <outer_h> <inner_w> <inner_h>`, `select <n>`,
    /// `next`, `ack`. Effects are printed as JSON lines.
    Run {
        /// Grading service base URL
        #[arg(long)]
        base_url: Option<String>,
        /// Seconds per question (0 = untimed)
        #[arg(long)]
        time_limit: Option<u32>,
        /// Cookie header identifying the attempt
        #[arg(long)]
        cookie: Option<String>,
        /// JSON file with the question rendered at load
        #[arg(long)]
        question: Option<PathBuf>,
        /// Start as if the page were already full-screen
        #[arg(long)]
        fullscreen: bool,
    },
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SessionAction::Run {
            base_url,
            time_limit,
            cookie,
            question,
            fullscreen,
        } => {
            let mut config = Config::load_or_default();
            if let Some(url) = base_url {
                config.service.base_url = url;
            }
            if let Some(limit) = time_limit {
                config.session.time_limit_secs = limit;
            }
            if cookie.is_some() {
                config.service.session_cookie = cookie;
            }
            let initial_question = match question {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)?;
                    Some(serde_json::from_str::<QuestionPayload>(&raw)?)
                }
                None => None,
            };

            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let result = rt.block_on(run_session(config, initial_question, fullscreen));
            // stdin reads sit on a blocking thread that never returns on its own.
            rt.shutdown_background();

            let summary = result?;
            println!("{}", serde_json::to_string(&summary)?);
        }
    }
    Ok(())
}

async fn run_session(
    config: Config,
    initial_question: Option<QuestionPayload>,
    fullscreen: bool,
) -> Result<SessionSummary, Box<dyn std::error::Error>> {
    let service = Arc::new(HttpGradingService::new(&config.service)?);
    let viewport = ScriptedViewport::default();

    let (runtime, handle) = SessionRuntime::new(
        SessionConfig {
            time_limit_secs: config.session.time_limit_secs,
            initial_question,
        },
        &config.probes,
        service,
        HeadlessRenderer::new(),
        print_effect,
    );
    let runtime = runtime.with_viewport_source(viewport.clone());

    let session = tokio::spawn(runtime.run(fullscreen));
    let feeder = tokio::spawn(feed_stdin(handle, viewport));

    let summary = session.await?;
    feeder.abort();
    Ok(summary)
}

fn print_effect(effect: &Effect) {
    match serde_json::to_string(effect) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!(error = %e, "failed to encode effect"),
    }
}

async fn feed_stdin(handle: SessionHandle, viewport: ScriptedViewport) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stdin read failed");
                break;
            }
        };
        match parse_command(&line) {
            Ok(Command::Skip) => {}
            Ok(Command::Viewport(sample)) => viewport.set(sample),
            Ok(Command::Input(input)) => {
                if handle.send(input).await.is_err() {
                    debug!("session ended, ignoring remaining input");
                    break;
                }
            }
            Err(message) => warn!(%line, "{message}"),
        }
    }
}

/// Latest viewport geometry written by `viewport` lines.
#[derive(Clone, Default)]
struct ScriptedViewport(Arc<Mutex<Option<ViewportSample>>>);

impl ScriptedViewport {
    fn set(&self, sample: ViewportSample) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(sample);
        }
    }
}

impl ViewportSource for ScriptedViewport {
    fn sample(&self) -> Option<ViewportSample> {
        self.0.lock().ok().and_then(|slot| *slot)
    }
}

#[derive(Debug, PartialEq)]
enum Command {
    Input(Input),
    Viewport(ViewportSample),
    Skip,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Command::Skip);
    };
    let args: Vec<&str> = words.collect();

    let signal = |s: Signal| -> Result<Command, String> { Ok(Command::Input(Input::Signal(s))) };
    match (verb, args.as_slice()) {
        (v, _) if v.starts_with('#') => Ok(Command::Skip),
        ("fullscreen", ["on"]) => signal(Signal::FullscreenChanged { active: true }),
        ("fullscreen", ["off"]) => signal(Signal::FullscreenChanged { active: false }),
        ("hide", []) => signal(Signal::VisibilityChanged { hidden: true }),
        ("show", []) => signal(Signal::VisibilityChanged { hidden: false }),
        ("blur", []) => signal(Signal::WindowBlurred),
        ("contextmenu", []) => signal(Signal::ContextMenu),
        ("key", [combo]) => signal(Signal::KeyDown(parse_chord(combo)?)),
        ("keyup", [combo]) => signal(Signal::KeyUp(parse_chord(combo)?)),
        ("viewport", [ow, oh, iw, ih]) => Ok(Command::Viewport(ViewportSample {
            outer_width: parse_px(ow)?,
            outer_height: parse_px(oh)?,
            inner_width: parse_px(iw)?,
            inner_height: parse_px(ih)?,
        })),
        ("select", [n]) => n
            .parse()
            .map(|option| Command::Input(Input::Select(option)))
            .map_err(|_| format!("invalid option index '{n}'")),
        ("next", []) => Ok(Command::Input(Input::Next)),
        ("ack", []) => Ok(Command::Input(Input::Acknowledge)),
        _ => Err(format!("unrecognised command '{}'", line.trim())),
    }
}

fn parse_chord(combo: &str) -> Result<KeyChord, String> {
    combo.parse().map_err(|e| format!("{e}"))
}

fn parse_px(value: &str) -> Result<u32, String> {
    value
        .parse()
        .map_err(|_| format!("invalid pixel value '{value}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signals() {
        assert_eq!(
            parse_command("fullscreen off"),
            Ok(Command::Input(Input::Signal(Signal::FullscreenChanged {
                active: false
            })))
        );
        assert_eq!(
            parse_command("  hide "),
            Ok(Command::Input(Input::Signal(Signal::VisibilityChanged {
                hidden: true
            })))
        );
        match parse_command("key ctrl+shift+i") {
            Ok(Command::Input(Input::Signal(Signal::KeyDown(chord)))) => {
                assert!(chord.ctrl && chord.shift);
                assert!(chord.is("I"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_user_actions() {
        assert_eq!(parse_command("select 2"), Ok(Command::Input(Input::Select(2))));
        assert_eq!(parse_command("next"), Ok(Command::Input(Input::Next)));
        assert_eq!(parse_command("ack"), Ok(Command::Input(Input::Acknowledge)));
    }

    #[test]
    fn parses_viewport_geometry() {
        assert_eq!(
            parse_command("viewport 1920 1080 1400 1000"),
            Ok(Command::Viewport(ViewportSample {
                outer_width: 1920,
                outer_height: 1080,
                inner_width: 1400,
                inner_height: 1000,
            }))
        );
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(parse_command(""), Ok(Command::Skip));
        assert_eq!(parse_command("# warm up"), Ok(Command::Skip));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_command("select two").is_err());
        assert!(parse_command("fullscreen maybe").is_err());
        assert!(parse_command("viewport 1 2 3").is_err());
        assert!(parse_command("teleport").is_err());
    }
}
