//! Line input for the interactive prompts.

use std::collections::VecDeque;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::error::Result;

/// What a prompt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A line of text, without its trailing newline.
    Line(String),
    /// Ctrl+C at the prompt.
    Interrupted,
    /// End of input (Ctrl+D, closed stdin).
    Eof,
}

/// A source of prompted lines.
pub trait LineSource {
    /// Shows `prompt` and blocks for one line.
    fn read_line(&mut self, prompt: &str) -> Result<InputEvent>;
}

/// Terminal input backed by rustyline, with in-memory history.
pub struct EditorInput {
    editor: DefaultEditor,
}

impl EditorInput {
    /// Creates a line editor on the controlling terminal.
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for EditorInput {
    fn read_line(&mut self, prompt: &str) -> Result<InputEvent> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(InputEvent::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(InputEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(InputEvent::Eof),
            Err(err) => Err(err.into()),
        }
    }
}

/// Input replayed from a fixed script; reports [`InputEvent::Eof`] once drained.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    events: VecDeque<InputEvent>,
    /// Every prompt shown, in order.
    pub prompts: Vec<String>,
}

impl ScriptedInput {
    /// Creates a script that types each of `lines` in turn.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            events: lines
                .into_iter()
                .map(|line| InputEvent::Line(line.into()))
                .collect(),
            prompts: Vec::new(),
        }
    }

    /// Appends a raw event, e.g. [`InputEvent::Interrupted`].
    pub fn then(mut self, event: InputEvent) -> Self {
        self.events.push_back(event);
        self
    }

    /// Number of events not yet consumed.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl LineSource for ScriptedInput {
    fn read_line(&mut self, prompt: &str) -> Result<InputEvent> {
        self.prompts.push(prompt.to_string());
        Ok(self.events.pop_front().unwrap_or(InputEvent::Eof))
    }
}
