//! Operator confirmation before writes.

use std::io::{self, BufRead, Write};

/// Lines of each lyric variant shown before a publish prompt.
pub const PREVIEW_LINES: usize = 10;

pub trait Prompter {
    /// Ask a yes/no question. Anything but an explicit yes is a no.
    fn confirm(&mut self, question: &str) -> bool;

    /// Show a labelled excerpt of text to the operator.
    fn preview(&mut self, label: &str, text: &str);
}

impl<T: Prompter + ?Sized> Prompter for &mut T {
    fn confirm(&mut self, question: &str) -> bool {
        (**self).confirm(question)
    }

    fn preview(&mut self, label: &str, text: &str) {
        (**self).preview(label, text)
    }
}

/// First `PREVIEW_LINES` lines of `text`, with a marker when more follow.
pub fn format_preview(label: &str, text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out = format!("--- {} ({} lines) ---\n", label, lines.len());
    for line in lines.iter().take(PREVIEW_LINES) {
        out.push_str(line);
        out.push('\n');
    }
    if lines.len() > PREVIEW_LINES {
        out.push_str(&format!("... ({} more)\n", lines.len() - PREVIEW_LINES));
    }
    out
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Reads answers from stdin. With `auto_yes` every question is answered yes
/// and nothing is read.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompter {
    pub auto_yes: bool,
}

impl TerminalPrompter {
    pub fn new(auto_yes: bool) -> Self {
        Self { auto_yes }
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, question: &str) -> bool {
        if self.auto_yes {
            return true;
        }
        eprint!("{} [y/N] ", question);
        let _ = io::stderr().flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_yes(&answer),
        }
    }

    fn preview(&mut self, label: &str, text: &str) {
        if self.auto_yes {
            return;
        }
        eprint!("{}", format_preview(label, text));
    }
}
