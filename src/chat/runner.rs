//! The interactive flow: menu, handshake, then the chat loop.
//!
//! The chat loop moves through `AwaitingInput → Sending → AwaitingReply →
//! Displaying` and back, until an exit word, end of input or an interrupt.
//! Only a bad configuration, a failed handshake or a broken terminal ends the
//! flow with an error; per-turn failures are printed and the loop carries on.
//! A raised interrupt flag stays raised until the process exits.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use crate::catalog::{self, MODELS};
use crate::challenge::AesChallenge;
use crate::chat::commands::{InputAction, classify_input, help_text};
use crate::chat::config::ChatConfig;
use crate::chat::session::{ChatBackend, ChatSession};
use crate::client::ProxyClient;
use crate::error::{Error, INTERRUPT_EXIT_CODE, Result};
use crate::input::{InputEvent, LineSource};
use crate::render::Renderer;
use crate::reply::RegexReplyExtractor;

const SELECTION_PROMPT: &str = "Model number: ";
const CHAT_PROMPT: &str = "You: ";
const INTERRUPT_POLL: Duration = Duration::from_millis(50);

/// How the interactive flow ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The user typed an exit word.
    Exited,
    /// Input ran out.
    EndOfInput,
    /// The user pressed Ctrl+C.
    Interrupted,
}

impl LoopOutcome {
    /// Returns the process exit status for this outcome.
    pub fn exit_code(self) -> u8 {
        match self {
            LoopOutcome::Exited | LoopOutcome::EndOfInput => 0,
            LoopOutcome::Interrupted => INTERRUPT_EXIT_CODE,
        }
    }
}

/// Result of the model menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// A catalog entry was chosen.
    Model(&'static str),
    /// The prompt was closed before a valid choice.
    Cancelled(LoopOutcome),
}

/// Shows the menu and prompts until a valid number is entered.
pub fn select_model(
    input: &mut dyn LineSource,
    renderer: &mut dyn Renderer,
) -> Result<Selection> {
    renderer.print_catalog(&MODELS);
    loop {
        match input.read_line(SELECTION_PROMPT)? {
            InputEvent::Line(line) => match catalog::select(&line) {
                Ok(model) => return Ok(Selection::Model(model)),
                Err(err) => renderer.print_error(&err.to_string()),
            },
            InputEvent::Interrupted => return Ok(Selection::Cancelled(LoopOutcome::Interrupted)),
            InputEvent::Eof => return Ok(Selection::Cancelled(LoopOutcome::EndOfInput)),
        }
    }
}

/// Runs the chat loop until an exit word, end of input or an interrupt.
///
/// `interrupted` is raised by the process's signal handler and never lowered.
/// It is checked after every line read, and a request in flight when it is
/// raised is abandoned.
///
/// # Errors
///
/// Only terminal input failures are returned.  Transport errors are printed
/// through `renderer` and the loop goes back to the prompt.
pub async fn chat_loop<B: ChatBackend>(
    session: &mut ChatSession<B>,
    input: &mut dyn LineSource,
    renderer: &mut dyn Renderer,
    interrupted: &AtomicBool,
) -> Result<LoopOutcome> {
    loop {
        debug!(state = "AwaitingInput");
        let line = match input.read_line(CHAT_PROMPT)? {
            InputEvent::Line(line) => line,
            InputEvent::Interrupted => return Ok(LoopOutcome::Interrupted),
            InputEvent::Eof => return Ok(LoopOutcome::EndOfInput),
        };
        if interrupted.load(Ordering::Relaxed) {
            return Ok(LoopOutcome::Interrupted);
        }
        let question = match classify_input(&line) {
            InputAction::Exit => return Ok(LoopOutcome::Exited),
            InputAction::Skip => continue,
            InputAction::Send(question) => question,
        };

        debug!(state = "Sending", len = question.len());
        renderer.print_status("Thinking...");
        let turn = match interruptible(interrupted, session.send(&question)).await {
            Ok(turn) => turn,
            Err(err) if err.is_abort() => return Ok(LoopOutcome::Interrupted),
            Err(err) => {
                warn!(
                    transport = err.is_transport(),
                    status = ?err.status_code(),
                    "chat turn failed: {err}"
                );
                renderer.print_error(&err.to_string());
                continue;
            }
        };

        debug!(state = "Displaying", parsed = turn.parsed);
        renderer.print_reply(session.model(), &turn.reply);
    }
}

/// Runs the whole flow: banner, model choice, handshake and chat loop.
///
/// # Errors
///
/// Returns a validation or URL error for a bad `config` before any prompt is
/// shown, [`Error::Bootstrap`] if the handshake fails, or a terminal error.
pub async fn run_app(
    config: &ChatConfig,
    input: &mut dyn LineSource,
    renderer: &mut dyn Renderer,
    interrupted: &AtomicBool,
) -> Result<LoopOutcome> {
    let client = ProxyClient::with_options(Some(config.base_url.as_str()), Some(config.timeout))?;
    let solver = AesChallenge::new()?;
    let extractor = RegexReplyExtractor::new()?;

    renderer.print_banner();

    let preselected = match config.model.as_deref().map(catalog::resolve) {
        Some(Ok(model)) => Some(model),
        Some(Err(err)) => {
            renderer.print_error(&err.to_string());
            None
        }
        None => None,
    };
    let model = match preselected {
        Some(model) => model,
        None => match select_model(input, renderer)? {
            Selection::Model(model) => model,
            Selection::Cancelled(outcome) => {
                renderer.print_goodbye();
                return Ok(outcome);
            }
        },
    };
    renderer.print_selected(model);

    renderer.print_status("Preparing session...");
    match interruptible(interrupted, client.bootstrap(&solver)).await {
        Ok(()) => {}
        Err(err) if err.is_abort() => {
            renderer.print_goodbye();
            return Ok(LoopOutcome::Interrupted);
        }
        Err(err) => return Err(err),
    }
    renderer.print_info("Session ready.");
    renderer.print_info(help_text());

    let mut session = ChatSession::new(client, model, Box::new(extractor));
    let outcome = chat_loop(&mut session, input, renderer, interrupted).await?;

    let stats = session.stats();
    renderer.print_info(&format!(
        "{} messages sent to {}: {} replies, {} without reply text, {} failed.",
        stats.turns_sent,
        stats.model,
        stats.replies_parsed,
        stats.fallback_replies,
        stats.failed_turns
    ));
    renderer.print_goodbye();
    Ok(outcome)
}

/// Races `future` against the interrupt flag.
///
/// A flag raised before the call starts aborts it without polling `future`.
async fn interruptible<T>(
    interrupted: &AtomicBool,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    if interrupted.load(Ordering::Relaxed) {
        return Err(Error::abort("interrupted by user"));
    }
    tokio::select! {
        result = future => result,
        _ = wait_for_interrupt(interrupted) => Err(Error::abort("interrupted by user")),
    }
}

async fn wait_for_interrupt(interrupted: &AtomicBool) {
    while !interrupted.load(Ordering::Relaxed) {
        tokio::time::sleep(INTERRUPT_POLL).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::input::ScriptedInput;
    use crate::render::{RecordingRenderer, RenderEvent};
    use crate::reply::FALLBACK_REPLY;

    #[derive(Default)]
    struct FakeBackend {
        asked: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
        hang: bool,
    }

    #[async_trait::async_trait]
    impl ChatBackend for FakeBackend {
        async fn ask(&self, _model: &str, question: &str) -> Result<String> {
            self.asked.lock().unwrap().push(question.to_string());
            if self.hang {
                std::future::pending::<()>().await;
            }
            if self.fail_on == Some(question) {
                return Err(Error::connection("connection reset", None));
            }
            if question == "silent" {
                return Ok("<html>nothing</html>".to_string());
            }
            Ok(format!(
                "<div class=\"response-content\">re: {question}</div>"
            ))
        }
    }

    fn session(backend: FakeBackend) -> ChatSession<FakeBackend> {
        ChatSession::new(
            backend,
            "DeepSeek-V3",
            Box::new(RegexReplyExtractor::new().unwrap()),
        )
    }

    #[test]
    fn select_model_reprompts_until_valid() {
        let mut input = ScriptedInput::new(["abc", "0", "19", "-3", " 8 "]);
        let mut renderer = RecordingRenderer::new();
        let selection = select_model(&mut input, &mut renderer).unwrap();
        assert_eq!(selection, Selection::Model("DeepSeek-R1"));
        assert_eq!(renderer.errors().len(), 4);
        assert_eq!(input.prompts.len(), 5);
        assert!(matches!(renderer.events[0], RenderEvent::Catalog(ref m) if m.len() == MODELS.len()));
    }

    #[test]
    fn select_model_cancelled() {
        let mut renderer = RecordingRenderer::new();
        let mut input = ScriptedInput::new(["x"]);
        assert_eq!(
            select_model(&mut input, &mut renderer).unwrap(),
            Selection::Cancelled(LoopOutcome::EndOfInput)
        );
        let mut input = ScriptedInput::default().then(InputEvent::Interrupted);
        assert_eq!(
            select_model(&mut input, &mut renderer).unwrap(),
            Selection::Cancelled(LoopOutcome::Interrupted)
        );
    }

    #[tokio::test]
    async fn exit_word_ends_loop_without_sending() {
        for word in ["exit", "quit", "خروج"] {
            let mut session = session(FakeBackend::default());
            let mut input = ScriptedInput::new([word, "never sent"]);
            let mut renderer = RecordingRenderer::new();
            let flag = AtomicBool::new(false);
            let outcome = chat_loop(&mut session, &mut input, &mut renderer, &flag)
                .await
                .unwrap();
            assert_eq!(outcome, LoopOutcome::Exited);
            assert_eq!(outcome.exit_code(), 0);
            assert!(session.backend().asked.lock().unwrap().is_empty());
            assert_eq!(input.remaining(), 1);
        }
    }

    #[tokio::test]
    async fn blank_lines_do_not_send() {
        let mut session = session(FakeBackend::default());
        let mut input = ScriptedInput::new(["", "   ", "\t", "exit"]);
        let mut renderer = RecordingRenderer::new();
        let flag = AtomicBool::new(false);
        chat_loop(&mut session, &mut input, &mut renderer, &flag)
            .await
            .unwrap();
        assert!(session.backend().asked.lock().unwrap().is_empty());
        assert!(renderer.replies().is_empty());
        assert_eq!(input.prompts.len(), 4);
    }

    #[tokio::test]
    async fn replies_and_fallbacks_are_displayed() {
        let mut session = session(FakeBackend::default());
        let mut input = ScriptedInput::new(["hi", "silent"]);
        let mut renderer = RecordingRenderer::new();
        let flag = AtomicBool::new(false);
        let outcome = chat_loop(&mut session, &mut input, &mut renderer, &flag)
            .await
            .unwrap();
        assert_eq!(outcome, LoopOutcome::EndOfInput);
        assert_eq!(renderer.replies(), vec!["re: hi", FALLBACK_REPLY]);
        assert!(renderer.events.contains(&RenderEvent::Reply {
            model: "DeepSeek-V3".to_string(),
            reply: "re: hi".to_string(),
        }));
    }

    #[tokio::test]
    async fn transport_error_returns_to_prompt() {
        let backend = FakeBackend {
            fail_on: Some("boom"),
            ..FakeBackend::default()
        };
        let mut session = session(backend);
        let mut input = ScriptedInput::new(["boom", "after", "quit"]);
        let mut renderer = RecordingRenderer::new();
        let flag = AtomicBool::new(false);
        let outcome = chat_loop(&mut session, &mut input, &mut renderer, &flag)
            .await
            .unwrap();
        assert_eq!(outcome, LoopOutcome::Exited);
        assert_eq!(renderer.errors(), vec!["Connection error: connection reset"]);
        assert_eq!(renderer.replies(), vec!["re: after"]);
        assert_eq!(session.stats().failed_turns, 1);
    }

    #[tokio::test]
    async fn interrupt_at_prompt() {
        let mut session = session(FakeBackend::default());
        let mut input = ScriptedInput::default().then(InputEvent::Interrupted);
        let mut renderer = RecordingRenderer::new();
        let flag = AtomicBool::new(false);
        let outcome = chat_loop(&mut session, &mut input, &mut renderer, &flag)
            .await
            .unwrap();
        assert_eq!(outcome, LoopOutcome::Interrupted);
        assert_eq!(outcome.exit_code(), INTERRUPT_EXIT_CODE);
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_during_request() {
        let backend = FakeBackend {
            hang: true,
            ..FakeBackend::default()
        };
        let mut session = session(backend);
        let mut input = ScriptedInput::new(["hello"]);
        let mut renderer = RecordingRenderer::new();
        let flag = AtomicBool::new(false);
        let run = chat_loop(&mut session, &mut input, &mut renderer, &flag);
        let raise = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            flag.store(true, Ordering::Relaxed);
        };
        let (outcome, ()) = tokio::join!(run, raise);
        assert_eq!(outcome.unwrap(), LoopOutcome::Interrupted);
        assert!(renderer.replies().is_empty());
    }

    #[tokio::test]
    async fn pending_signal_ends_loop_without_sending() {
        let mut session = session(FakeBackend::default());
        let mut input = ScriptedInput::new(["one", "two", "three"]);
        let mut renderer = RecordingRenderer::new();
        let flag = AtomicBool::new(true);
        let outcome = chat_loop(&mut session, &mut input, &mut renderer, &flag)
            .await
            .unwrap();
        assert_eq!(outcome, LoopOutcome::Interrupted);
        assert!(session.backend().asked.lock().unwrap().is_empty());
        assert!(renderer.replies().is_empty());
        assert_eq!(input.remaining(), 2);
        assert!(flag.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn pending_signal_aborts_before_polling() {
        let flag = AtomicBool::new(true);
        let err = interruptible(&flag, async { Ok::<_, Error>(()) })
            .await
            .unwrap_err();
        assert!(err.is_abort());
        assert!(flag.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn run_app_rejects_bad_config_before_menu() {
        let configs = [
            ChatConfig::new().with_timeout(Duration::ZERO),
            ChatConfig::new().with_base_url("ftp://example.com/"),
            ChatConfig::new().with_base_url("not a url"),
        ];
        for config in configs {
            let mut input = ScriptedInput::new(["8"]);
            let mut renderer = RecordingRenderer::new();
            let flag = AtomicBool::new(false);
            let err = run_app(&config, &mut input, &mut renderer, &flag)
                .await
                .unwrap_err();
            assert!(!err.is_bootstrap(), "{err}");
            assert_eq!(err.exit_code(), 1);
            assert!(input.prompts.is_empty());
            assert!(renderer.events.is_empty());
        }
    }

    #[tokio::test]
    async fn run_app_signal_during_menu_skips_handshake() {
        let config = ChatConfig::new().with_base_url("http://127.0.0.1:9/");
        let mut input = ScriptedInput::new(["8", "hello"]);
        let mut renderer = RecordingRenderer::new();
        let flag = AtomicBool::new(true);
        let outcome = run_app(&config, &mut input, &mut renderer, &flag)
            .await
            .unwrap();
        assert_eq!(outcome, LoopOutcome::Interrupted);
        assert_eq!(input.remaining(), 1);
        assert_eq!(renderer.events.last(), Some(&RenderEvent::Goodbye));
    }

    #[tokio::test]
    async fn run_app_cancelled_at_menu() {
        let config = ChatConfig::new().with_base_url("http://127.0.0.1:9/");
        let mut input = ScriptedInput::default();
        let mut renderer = RecordingRenderer::new();
        let flag = AtomicBool::new(false);
        let outcome = run_app(&config, &mut input, &mut renderer, &flag)
            .await
            .unwrap();
        assert_eq!(outcome, LoopOutcome::EndOfInput);
        assert_eq!(renderer.events.first(), Some(&RenderEvent::Banner));
        assert_eq!(renderer.events.last(), Some(&RenderEvent::Goodbye));
    }

    #[tokio::test]
    async fn run_app_bad_preselection_falls_back_to_menu() {
        let config = ChatConfig::new().with_model("DeepSeek-V99");
        let mut input = ScriptedInput::default();
        let mut renderer = RecordingRenderer::new();
        let flag = AtomicBool::new(false);
        let outcome = run_app(&config, &mut input, &mut renderer, &flag)
            .await
            .unwrap();
        assert_eq!(outcome, LoopOutcome::EndOfInput);
        assert_eq!(renderer.errors().len(), 1);
        assert!(
            renderer
                .events
                .iter()
                .any(|e| matches!(e, RenderEvent::Catalog(_)))
        );
    }
}
