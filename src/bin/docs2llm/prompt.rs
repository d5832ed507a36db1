//! Line-based terminal prompts for the wizard and `init`.
//!
//! Every prompt returns `Ok(None)` when the user cancels (end of input or
//! `q` in a menu). Reader and writer are generic so prompts can be driven
//! from a buffer in tests.

use crate::{bold, cyan, dim, red};
use docs2llm::menu::MenuEntry;
use std::io::{self, BufRead, StdinLock, Stdout, Write};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print an informational line.
    pub fn note(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.output.flush()?;
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf.trim().to_string()))
    }

    /// Numbered menu. Separators are printed as headings and cannot be picked.
    pub fn select<T: Clone>(
        &mut self,
        message: &str,
        entries: &[MenuEntry<T>],
    ) -> io::Result<Option<T>> {
        writeln!(self.output, "{} {}", cyan("◆"), bold(message))?;
        let mut choices = Vec::new();
        for entry in entries {
            match &entry.value {
                None => writeln!(self.output, "    {}", dim(&entry.label))?,
                Some(value) => {
                    choices.push(value.clone());
                    let hint = if entry.hint.is_empty() {
                        String::new()
                    } else {
                        format!("  {}", dim(&entry.hint))
                    };
                    writeln!(self.output, "  {:>2}) {}{}", choices.len(), entry.label, hint)?;
                }
            }
        }
        if choices.is_empty() {
            return Ok(None);
        }

        loop {
            write!(self.output, "  {} ", dim("›"))?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if line.eq_ignore_ascii_case("q") {
                return Ok(None);
            }
            match line.parse::<usize>() {
                Ok(n) if (1..=choices.len()).contains(&n) => return Ok(Some(choices[n - 1].clone())),
                _ => writeln!(
                    self.output,
                    "  {}",
                    red(&format!("Enter a number between 1 and {}.", choices.len()))
                )?,
            }
        }
    }

    /// Free-text input, re-asked until `validate` accepts it.
    pub fn text(
        &mut self,
        message: &str,
        placeholder: &str,
        validate: impl Fn(&str) -> Result<(), String>,
    ) -> io::Result<Option<String>> {
        writeln!(self.output, "{} {}", cyan("◆"), bold(message))?;
        loop {
            if placeholder.is_empty() {
                write!(self.output, "  {} ", dim("›"))?;
            } else {
                write!(self.output, "  {} {} ", dim("›"), dim(&format!("({placeholder})")))?;
            }
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match validate(&line) {
                Ok(()) => return Ok(Some(line)),
                Err(msg) => writeln!(self.output, "  {}", red(&msg))?,
            }
        }
    }

    /// Yes/no question; an empty answer takes `default`.
    pub fn confirm(&mut self, message: &str, default: bool) -> io::Result<Option<bool>> {
        let choices = if default { "Y/n" } else { "y/N" };
        writeln!(self.output, "{} {}", cyan("◆"), bold(message))?;
        loop {
            write!(self.output, "  {} {} ", dim("›"), dim(&format!("({choices})")))?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match line.to_ascii_lowercase().as_str() {
                "" => return Ok(Some(default)),
                "y" | "yes" => return Ok(Some(true)),
                "n" | "no" => return Ok(Some(false)),
                _ => writeln!(self.output, "  {}", red("Answer y or n."))?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn select_skips_separators_and_retries() {
        let menu = vec![
            MenuEntry::item("A", "", 'a'),
            MenuEntry::separator("More"),
            MenuEntry::item("B", "hint", 'b'),
        ];
        let mut p = prompter("0\nx\n2\n");
        assert_eq!(p.select("Pick", &menu).unwrap(), Some('b'));
        let shown = String::from_utf8(p.output).unwrap();
        assert!(shown.contains("Enter a number between 1 and 2."));
    }

    #[test]
    fn select_cancels_on_eof_or_q() {
        let menu = vec![MenuEntry::item("A", "", 1)];
        assert_eq!(prompter("").select("Pick", &menu).unwrap(), None);
        assert_eq!(prompter("q\n").select("Pick", &menu).unwrap(), None);
    }

    #[test]
    fn text_revalidates() {
        let mut p = prompter("\nvalue\n");
        let got = p
            .text("Name", "", |s| {
                if s.is_empty() {
                    Err("Name is required.".into())
                } else {
                    Ok(())
                }
            })
            .unwrap();
        assert_eq!(got.as_deref(), Some("value"));
    }

    #[test]
    fn confirm_defaults_and_parses() {
        assert_eq!(prompter("\n").confirm("Ok?", true).unwrap(), Some(true));
        assert_eq!(prompter("maybe\nno\n").confirm("Ok?", true).unwrap(), Some(false));
        assert_eq!(prompter("").confirm("Ok?", false).unwrap(), None);
    }
}
