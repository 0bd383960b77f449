use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Stdin, Stdout, Write};
use std::time::Duration;

/// Line-oriented terminal prompts.
///
/// Generic over the input and output so flows built on it can be driven
/// from a script in tests.
pub struct Prompter<R, W> {
    input: R,
    output: W,
    typewriter_delay: Duration,
}

impl Prompter<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self {
            input: BufReader::new(std::io::stdin()),
            output: std::io::stdout(),
            typewriter_delay: Duration::from_millis(18),
        }
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Prompter without the typewriter delay
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            typewriter_delay: Duration::ZERO,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn println(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{}", line).context("Failed to write to stdout")
    }

    /// Prompt with a message and return the trimmed input.
    /// Fails on end of input so callers looping on bad answers terminate.
    pub fn prompt(&mut self, message: &str) -> Result<String> {
        write!(self.output, "{}", message).context("Failed to write to stdout")?;
        self.output.flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        let read = self
            .input
            .read_line(&mut input)
            .context("Failed to read input")?;
        if read == 0 {
            anyhow::bail!("Input closed");
        }
        Ok(input.trim().to_string())
    }

    /// Prompt with a default value. Returns default if input is empty.
    pub fn prompt_with_default(&mut self, message: &str, default: &str) -> Result<String> {
        let input = self.prompt(&format!("{} [{}]: ", message, default))?;
        if input.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(input)
        }
    }

    /// Prompt with an optional default; empty input with no default is None
    pub fn prompt_optional(&mut self, message: &str) -> Result<Option<String>> {
        let input = self.prompt(&format!("{} (optional): ", message))?;
        Ok((!input.is_empty()).then_some(input))
    }

    /// Yes/no question. Empty input takes the default.
    pub fn prompt_yes_no(&mut self, message: &str, default_yes: bool) -> Result<bool> {
        let hint = if default_yes { "Y/n" } else { "y/N" };
        let input = self.prompt(&format!("{} [{}]: ", message, hint))?;
        let input = input.to_lowercase();
        if input.is_empty() {
            Ok(default_yes)
        } else {
            Ok(input == "y" || input == "yes")
        }
    }

    /// Pick one of `options` by number (1-based on screen) and return the
    /// 0-based index. `current` is accepted on empty input; "b" returns
    /// `None` so the caller can step back.
    pub fn choose_or_back(&mut self, options: &[&str], current: Option<usize>) -> Result<Option<usize>> {
        for (i, option) in options.iter().enumerate() {
            let marker = if Some(i) == current { "*" } else { " " };
            writeln!(self.output, " {} {}) {}", marker, i + 1, option)
                .context("Failed to write to stdout")?;
        }

        let message = format!("Choose 1-{} (b: back): ", options.len());

        loop {
            let input = self.prompt(&message)?;
            if input.is_empty() {
                if let Some(i) = current {
                    return Ok(Some(i));
                }
            }
            if input.eq_ignore_ascii_case("b") {
                return Ok(None);
            }
            match input.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(Some(n - 1)),
                _ => self.println(&format!(
                    "  Invalid: enter a number from 1 to {}.",
                    options.len()
                ))?,
            }
        }
    }

    /// Print text with a typewriter effect, one character at a time.
    pub fn typewriter(&mut self, text: &str) -> Result<()> {
        if self.typewriter_delay.is_zero() {
            return self.println(text);
        }
        for c in text.chars() {
            write!(self.output, "{}", c).context("Failed to write to stdout")?;
            self.output.flush().ok();
            std::thread::sleep(self.typewriter_delay);
        }
        writeln!(self.output).context("Failed to write to stdout")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scripted(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_prompt_trims() {
        let mut p = scripted("  hello \n");
        assert_eq!(p.prompt("> ").unwrap(), "hello");
        assert_eq!(String::from_utf8(p.into_output()).unwrap(), "> ");
    }

    #[test]
    fn test_prompt_fails_on_eof() {
        let mut p = scripted("");
        assert!(p.prompt("> ").is_err());
    }

    #[test]
    fn test_prompt_with_default() {
        let mut p = scripted("\ncustom\n");
        assert_eq!(p.prompt_with_default("Name", "x").unwrap(), "x");
        assert_eq!(p.prompt_with_default("Name", "x").unwrap(), "custom");
    }

    #[test]
    fn test_yes_no() {
        let mut p = scripted("\nYES\nn\n");
        assert!(p.prompt_yes_no("Ok?", true).unwrap());
        assert!(p.prompt_yes_no("Ok?", false).unwrap());
        assert!(!p.prompt_yes_no("Ok?", true).unwrap());
    }

    #[test]
    fn test_choose_retries_until_valid() {
        let mut p = scripted("0\nfour\n2\n");
        assert_eq!(p.choose_or_back(&["a", "b", "c"], None).unwrap(), Some(1));
        let out = String::from_utf8(p.into_output()).unwrap();
        assert_eq!(out.matches("Invalid").count(), 2);
    }

    #[test]
    fn test_choose_empty_keeps_current() {
        let mut p = scripted("\n");
        assert_eq!(p.choose_or_back(&["a", "b"], Some(1)).unwrap(), Some(1));
    }

    #[test]
    fn test_prompt_optional() {
        let mut p = scripted("\nLisbon\n");
        assert_eq!(p.prompt_optional("City").unwrap(), None);
        assert_eq!(p.prompt_optional("City").unwrap().as_deref(), Some("Lisbon"));
    }

    #[test]
    fn test_choose_or_back() {
        let mut p = scripted("B\n3\n");
        assert_eq!(p.choose_or_back(&["a", "b", "c"], None).unwrap(), None);
        assert_eq!(p.choose_or_back(&["a", "b", "c"], None).unwrap(), Some(2));
    }
}
