//! Terminal input and rendering for the interactive session.

use anyhow::Result;
use bat::WrappingMode;
use cliclack::spinner;
use console::style;
use serde_json::Value;

use crate::thinking::get_random_thinking_message;

const PROMPT: &str = "\x1b[1m\x1b[38;5;30m(wren)> \x1b[0m";
const MAX_ARG_LENGTH: usize = 60;
const MAX_RESULT_LINES: usize = 3;

pub enum InputType {
    /// User sent a message
    Message,
    /// Control flow command handled here; ask again
    AskAgain,
    /// User asked to clear the conversation
    Clear,
    /// User wants to exit the session
    Exit,
}

pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>,
}

pub enum Theme {
    Light,
    Dark,
}

/// One turn's worth of terminal interaction: read a line, spin while the
/// agent works, echo tool activity, pretty-print the answer.
pub trait Prompt {
    fn get_input(&mut self) -> Result<Input>;
    fn show_busy(&mut self);
    fn hide_busy(&mut self);
    fn render_tool_call(&mut self, name: &str, arguments: &Value);
    fn render_tool_result(&mut self, name: &str, output: &str);
    fn render_answer(&mut self, text: &str);
    fn render_note(&mut self, text: &str);
}

pub struct RustylinePrompt {
    editor: rustyline::DefaultEditor,
    spinner: cliclack::ProgressBar,
    theme: Theme,
}

impl RustylinePrompt {
    pub fn new() -> Result<Self> {
        Ok(RustylinePrompt {
            editor: rustyline::DefaultEditor::new()?,
            spinner: spinner(),
            theme: Theme::Dark,
        })
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("/help | /?     - Display this help message");
        println!("/clear | /c    - Clear the conversation");
        println!("/t             - Toggle Light/Dark theme");
        println!("/quit | /exit  - Exit the session");
        println!("Ctrl+C         - Interrupt the current turn");
    }
}

impl Prompt for RustylinePrompt {
    fn get_input(&mut self) -> Result<Input> {
        let line = match self.editor.readline(PROMPT) {
            Ok(text) => text,
            Err(e) => {
                match e {
                    rustyline::error::ReadlineError::Interrupted
                    | rustyline::error::ReadlineError::Eof => (),
                    _ => eprintln!("Input error: {e}"),
                }
                return Ok(Input {
                    input_type: InputType::Exit,
                    content: None,
                });
            }
        };

        let text = line.trim().to_string();
        if text.is_empty() {
            return Ok(Input {
                input_type: InputType::AskAgain,
                content: None,
            });
        }
        let _ = self.editor.add_history_entry(&text);

        let input_type = match text.as_str() {
            "/quit" | "/exit" | "/q" => InputType::Exit,
            "/clear" | "/c" => InputType::Clear,
            "/help" | "/?" => {
                self.print_help();
                InputType::AskAgain
            }
            "/t" => {
                self.theme = match self.theme {
                    Theme::Light => {
                        println!("Switching to Dark theme");
                        Theme::Dark
                    }
                    Theme::Dark => {
                        println!("Switching to Light theme");
                        Theme::Light
                    }
                };
                InputType::AskAgain
            }
            _ => {
                return Ok(Input {
                    input_type: InputType::Message,
                    content: Some(text),
                })
            }
        };

        Ok(Input {
            input_type,
            content: None,
        })
    }

    fn show_busy(&mut self) {
        self.spinner = spinner();
        self.spinner
            .start(format!("{}...", get_random_thinking_message()));
    }

    fn hide_busy(&mut self) {
        self.spinner.stop("");
    }

    fn render_tool_call(&mut self, name: &str, arguments: &Value) {
        println!(
            "  {} {} {}",
            style("●").dim(),
            style(name).cyan(),
            style(format_tool_args(name, arguments)).dim()
        );
    }

    fn render_tool_result(&mut self, _name: &str, output: &str) {
        for line in summarize_result(output).lines().take(MAX_RESULT_LINES) {
            println!("    {}", style(format!("→ {line}")).dim());
        }
    }

    fn render_answer(&mut self, text: &str) {
        let theme = match self.theme {
            Theme::Light => "GitHub",
            Theme::Dark => "zenburn",
        };
        bat::PrettyPrinter::new()
            .input(bat::Input::from_bytes(text.as_bytes()))
            .theme(theme)
            .language("Markdown")
            .wrapping_mode(WrappingMode::Character)
            .print()
            .unwrap_or(false);
        println!();
    }

    fn render_note(&mut self, text: &str) {
        println!("{}", style(text).dim());
    }
}

/// Compact one-line argument summary, specialized for the common tools.
fn format_tool_args(name: &str, arguments: &Value) -> String {
    let str_arg = |key: &str| arguments[key].as_str().unwrap_or("").to_string();

    match name {
        "bash" => truncate(&str_arg("command"), 80),
        "read" | "edit" | "create_document" => str_arg("path"),
        "write" => {
            let lines = str_arg("content").lines().count().max(1);
            format!("{} ({} lines)", str_arg("path"), lines)
        }
        "glob" | "grep" => {
            let path = arguments["path"].as_str().unwrap_or(".");
            format!("{} in {}", str_arg("pattern"), path)
        }
        "calculator" => str_arg("expression"),
        "open_browser" | "http_request" => str_arg("url"),
        _ => arguments
            .as_object()
            .and_then(|map| map.iter().next())
            .map(|(key, value)| {
                let rendered = match value.as_str() {
                    Some(s) => s.to_string(),
                    None => value.to_string(),
                };
                format!("{key}={}", truncate(&rendered, 50))
            })
            .unwrap_or_default(),
    }
}

/// Short result line for the trace: full text when small, a line count
/// when the output is long.
fn summarize_result(output: &str) -> String {
    let lines = output.lines().count();
    if lines > MAX_RESULT_LINES {
        return format!("{lines} lines");
    }
    if output.len() > 100 {
        return truncate(output, MAX_ARG_LENGTH);
    }
    output.to_string()
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let cut: String = text.chars().take(limit).collect();
        format!("{cut}…")
    }
}
