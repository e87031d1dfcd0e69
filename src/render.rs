//! Output rendering for the chat application.
//!
//! [`Renderer`] is the only way the chat flow talks to the terminal, so the
//! flow can be driven in tests with a [`RecordingRenderer`].

use std::io::{self, Stdout, Write};

/// ANSI escape code for bold text (used for the banner).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for status lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for menu numbers).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for yellow text (used for status lines).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for green text (used for confirmations).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for magenta text (used for replies).
const ANSI_MAGENTA: &str = "\x1b[35m";

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// Print the program banner.
    fn print_banner(&mut self);

    /// Print the numbered model menu.
    fn print_catalog(&mut self, models: &[&str]);

    /// Confirm the model the session is bound to.
    fn print_selected(&mut self, model: &str);

    /// Print a transient status line, e.g. while waiting on the network.
    fn print_status(&mut self, status: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print one reply, framed with the model name.
    fn print_reply(&mut self, model: &str, reply: &str);

    /// Print the farewell line.
    fn print_goodbye(&mut self);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_banner(&mut self) {
        let title = self.paint(&format!("{ANSI_BOLD}{ANSI_CYAN}"), "DEEPSEEK CHAT");
        println!("{}", frame(&[title.as_str()], "DEEPSEEK CHAT".len()));
    }

    fn print_catalog(&mut self, models: &[&str]) {
        println!("\nChoose a model / اختر النموذج:\n");
        let number_width = models.len().to_string().len();
        let name_width = models.iter().map(|m| m.chars().count()).max().unwrap_or(0);
        let rule = "─".repeat(number_width + 2);
        let name_rule = "─".repeat(name_width + 2);
        println!("╭{rule}┬{name_rule}╮");
        for (i, model) in models.iter().enumerate() {
            let number = format!("{:>number_width$}", i + 1);
            println!(
                "│ {} │ {:<name_width$} │",
                self.paint(ANSI_CYAN, &number),
                model
            );
        }
        println!("╰{rule}┴{name_rule}╯");
        self.flush();
    }

    fn print_selected(&mut self, model: &str) {
        println!("{} {model}\n", self.paint(ANSI_GREEN, "Selected model:"));
    }

    fn print_status(&mut self, status: &str) {
        println!("{}", self.paint(&format!("{ANSI_DIM}{ANSI_YELLOW}"), status));
        self.flush();
    }

    fn print_info(&mut self, info: &str) {
        println!("{info}");
    }

    fn print_error(&mut self, error: &str) {
        eprintln!("{}", self.paint(ANSI_RED, &format!("Error: {error}")));
    }

    fn print_reply(&mut self, model: &str, reply: &str) {
        println!("\n{}", self.paint(ANSI_MAGENTA, &format!("{model}:")));
        let reply = strip_controls(reply.trim());
        let lines: Vec<&str> = reply.lines().collect();
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        println!("{}", frame(&lines, width));
        self.flush();
    }

    fn print_goodbye(&mut self) {
        println!("{}", self.paint(ANSI_RED, "Goodbye! / وداعاً!"));
    }
}

/// Draws a rounded box around `lines`, padding each to `width` visible chars.
fn frame(lines: &[&str], width: usize) -> String {
    let mut out = format!("╭{}╮\n", "─".repeat(width + 2));
    for line in lines {
        let pad = width.saturating_sub(visible_len(line));
        out.push_str(&format!("│ {line}{} │\n", " ".repeat(pad)));
    }
    out.push_str(&format!("╰{}╯", "─".repeat(width + 2)));
    out
}

/// Drops control characters from server text. Newlines are kept and tabs
/// become four spaces.
fn strip_controls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push(c),
            '\t' => out.push_str("    "),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

fn visible_len(text: &str) -> usize {
    let mut len = 0;
    let mut in_escape = false;
    for c in text.chars() {
        match (in_escape, c) {
            (false, '\x1b') => in_escape = true,
            (true, 'm') => in_escape = false,
            (true, _) => {}
            (false, _) => len += 1,
        }
    }
    len
}

/// One call made against a [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    /// [`Renderer::print_banner`].
    Banner,
    /// [`Renderer::print_catalog`], with the models shown.
    Catalog(Vec<String>),
    /// [`Renderer::print_selected`].
    Selected(String),
    /// [`Renderer::print_status`].
    Status(String),
    /// [`Renderer::print_info`].
    Info(String),
    /// [`Renderer::print_error`].
    Error(String),
    /// [`Renderer::print_reply`].
    Reply {
        /// Model the reply is attributed to.
        model: String,
        /// Reply text as passed in, before any sanitizing.
        reply: String,
    },
    /// [`Renderer::print_goodbye`].
    Goodbye,
}

/// Renderer that records every call instead of printing.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    /// Every call so far, oldest first.
    pub events: Vec<RenderEvent>,
}

impl RecordingRenderer {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replies recorded so far, in order.
    pub fn replies(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                RenderEvent::Reply { reply, .. } => Some(reply.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Errors recorded so far, in order.
    pub fn errors(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                RenderEvent::Error(error) => Some(error.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn print_banner(&mut self) {
        self.events.push(RenderEvent::Banner);
    }

    fn print_catalog(&mut self, models: &[&str]) {
        self.events.push(RenderEvent::Catalog(
            models.iter().map(|m| m.to_string()).collect(),
        ));
    }

    fn print_selected(&mut self, model: &str) {
        self.events.push(RenderEvent::Selected(model.to_string()));
    }

    fn print_status(&mut self, status: &str) {
        self.events.push(RenderEvent::Status(status.to_string()));
    }

    fn print_info(&mut self, info: &str) {
        self.events.push(RenderEvent::Info(info.to_string()));
    }

    fn print_error(&mut self, error: &str) {
        self.events.push(RenderEvent::Error(error.to_string()));
    }

    fn print_reply(&mut self, model: &str, reply: &str) {
        self.events.push(RenderEvent::Reply {
            model: model.to_string(),
            reply: reply.to_string(),
        });
    }

    fn print_goodbye(&mut self) {
        self.events.push(RenderEvent::Goodbye);
    }
}
