use std::io::IsTerminal;

use serde::Serialize;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub pretty: bool,
    pub use_color: bool,
}

impl OutputOptions {
    pub fn is_text(&self) -> bool {
        self.format == OutputFormat::Text
    }

    pub fn print_json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        println!("{}", json);
        Ok(())
    }
}

/// Resolve the color setting (`auto|always|never`) against the terminal.
pub fn detect_color(color_flag: bool, setting: &str) -> bool {
    if !color_flag {
        return false;
    }
    match setting {
        "never" => false,
        "always" => true,
        _ => std::env::var("NO_COLOR").is_err() && std::io::stdout().is_terminal(),
    }
}

/// Braille spinner on stderr while a request is outstanding.
pub struct Spinner {
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    pub fn start(msg: &'static str, enabled: bool) -> Self {
        if !enabled || !std::io::stderr().is_terminal() {
            return Self { handle: None };
        }
        let handle = tokio::spawn(async move {
            let frames = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
            let mut i = 0usize;
            loop {
                eprint!("\r {} {}", frames[i % frames.len()], msg);
                i = i.wrapping_add(1);
                tokio::time::sleep(std::time::Duration::from_millis(80)).await;
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    /// Stop and clear the line
    pub fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            eprint!("\r\x1b[2K");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_flag_off_wins() {
        assert!(!detect_color(false, "always"));
    }

    #[test]
    fn color_setting_overrides_terminal_detection() {
        assert!(detect_color(true, "always"));
        assert!(!detect_color(true, "never"));
    }

    #[test]
    fn format_ids() {
        assert_eq!(OutputFormat::from_id("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_id("yaml"), None);
    }
}
