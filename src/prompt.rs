//! Operator prompting.
//!
//! `Prompter` is the interactive channel. `Operator` wraps an optional
//! prompter: unattended runs have none, and callers fall back to the safe
//! default instead of blocking.
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Always,
}

/// Operator response to a numbered candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Skip,
    Pick(usize),
    Quit,
}

pub trait Prompter {
    /// `[Y/n/a]`-style question; empty input returns `default`.
    fn ask(&mut self, question: &str, default: Answer) -> io::Result<Answer>;

    /// `Continue? [Y/n/A]` after a problem line; empty input continues.
    fn proceed(&mut self, question: &str) -> io::Result<Answer>;

    /// Plain yes/no question; empty input returns `default_yes`.
    fn confirm(&mut self, question: &str, default_yes: bool) -> io::Result<bool>;

    /// Numbered choice; empty input skips.
    fn choose(&mut self, header: &str, options: &[String]) -> io::Result<Choice>;

    /// Free text; empty input returns `default`.
    fn input(&mut self, question: &str, default: &str) -> io::Result<String>;

    /// Free text without echo where the terminal supports it.
    fn secret(&mut self, question: &str) -> io::Result<String>;
}

/// The interactive channel, when there is one.
pub struct Operator {
    prompter: Option<Box<dyn Prompter>>,
}

impl Operator {
    pub fn interactive(prompter: Box<dyn Prompter>) -> Self {
        Self {
            prompter: Some(prompter),
        }
    }

    pub fn unattended() -> Self {
        Self { prompter: None }
    }

    pub fn is_interactive(&self) -> bool {
        self.prompter.is_some()
    }

    pub fn prompter(&mut self) -> Option<&mut (dyn Prompter + 'static)> {
        self.prompter.as_deref_mut()
    }
}

/// Line-oriented prompter over any reader/writer pair.
pub struct LinePrompter<R, W> {
    reader: R,
    writer: W,
    hide_secrets: bool,
}

impl LinePrompter<io::StdinLock<'static>, io::Stdout> {
    pub fn terminal() -> Self {
        let mut prompter = Self::new(io::stdin().lock(), io::stdout());
        prompter.hide_secrets = true;
        prompter
    }
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            hide_secrets: false,
        }
    }

    fn read_answer(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.writer, "{prompt}")?;
        self.writer.flush()?;
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "operator input closed",
            ));
        }
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, question: &str, default: Answer) -> io::Result<Answer> {
        let suffix = match default {
            Answer::Yes => "[Y/n/a]",
            Answer::No => "[y/N/a]",
            Answer::Always => "[y/n/A]",
        };
        loop {
            let answer = self.read_answer(&format!("{question} {suffix}: "))?;
            match answer.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(Answer::Yes),
                "n" | "no" | "s" | "skip" => return Ok(Answer::No),
                "a" | "all" | "always" => return Ok(Answer::Always),
                _ => {}
            }
        }
    }

    fn proceed(&mut self, question: &str) -> io::Result<Answer> {
        loop {
            let answer = self.read_answer(&format!("{question} Continue? [Y/n/A]: "))?;
            match answer.to_lowercase().as_str() {
                "" | "y" | "yes" => return Ok(Answer::Yes),
                "n" | "no" | "q" | "quit" => return Ok(Answer::No),
                "a" | "always" => return Ok(Answer::Always),
                _ => {}
            }
        }
    }

    fn confirm(&mut self, question: &str, default_yes: bool) -> io::Result<bool> {
        let suffix = if default_yes { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = self.read_answer(&format!("{question} {suffix}: "))?;
            match answer.to_lowercase().as_str() {
                "" => return Ok(default_yes),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => {}
            }
        }
    }

    fn choose(&mut self, header: &str, options: &[String]) -> io::Result<Choice> {
        writeln!(self.writer, "{header}")?;
        for (index, option) in options.iter().enumerate() {
            writeln!(self.writer, "  {index}: {option}")?;
        }
        writeln!(self.writer, "  [Enter]=skip   0..N=pick   q=quit")?;
        loop {
            let answer = self.read_answer("Choose [Enter=skip]: ")?;
            match answer.to_lowercase().as_str() {
                "" | "s" | "skip" => return Ok(Choice::Skip),
                "q" | "quit" => return Ok(Choice::Quit),
                other => {
                    if let Ok(index) = other.parse::<usize>() {
                        if index < options.len() {
                            return Ok(Choice::Pick(index));
                        }
                    }
                    writeln!(self.writer, "Invalid choice.")?;
                }
            }
        }
    }

    fn input(&mut self, question: &str, default: &str) -> io::Result<String> {
        let prompt = if default.is_empty() {
            format!("{question}: ")
        } else {
            format!("{question} [{default}]: ")
        };
        let answer = self.read_answer(&prompt)?;
        if answer.is_empty() {
            return Ok(default.to_string());
        }
        Ok(answer)
    }

    fn secret(&mut self, question: &str) -> io::Result<String> {
        if self.hide_secrets {
            return rpassword::prompt_password(format!("{question}: "))
                .map(|value| value.trim().to_string());
        }
        self.read_answer(&format!("{question}: "))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> LinePrompter<Cursor<Vec<u8>>, Vec<u8>> {
        LinePrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn ask_uses_default_and_reprompts_on_garbage() {
        let mut p = prompter("\nmaybe\nA\n");
        assert_eq!(p.ask("Add?", Answer::Yes).expect("answer"), Answer::Yes);
        assert_eq!(p.ask("Add?", Answer::Yes).expect("answer"), Answer::Always);
        let transcript = String::from_utf8(p.writer.clone()).expect("utf8");
        assert_eq!(transcript.matches("Add? [Y/n/a]: ").count(), 3);
    }

    #[test]
    fn skip_declines_an_add_but_never_stops_a_run() {
        let mut p = prompter("skip\nskip\n\nq\nalways\n");
        assert_eq!(p.ask("Add?", Answer::Yes).expect("answer"), Answer::No);
        assert_eq!(p.proceed("No match.").expect("answer"), Answer::Yes);
        assert_eq!(p.proceed("No match.").expect("answer"), Answer::No);
        assert_eq!(p.proceed("No match.").expect("answer"), Answer::Always);
        let transcript = String::from_utf8(p.writer.clone()).expect("utf8");
        assert_eq!(transcript.matches("No match. Continue? [Y/n/A]: ").count(), 4);
    }

    #[test]
    fn confirm_respects_default() {
        let mut p = prompter("\n\nno\n");
        assert!(p.confirm("Reuse?", true).expect("answer"));
        assert!(!p.confirm("Delete?", false).expect("answer"));
        assert!(!p.confirm("Reuse?", true).expect("answer"));
    }

    #[test]
    fn choose_skips_by_default_and_validates_range() {
        let options = vec!["A (1999)".to_string(), "B (2001)".to_string()];
        let mut p = prompter("\n7\n1\nq\n");
        assert_eq!(p.choose("[AMBIG]", &options).expect("choice"), Choice::Skip);
        assert_eq!(p.choose("[AMBIG]", &options).expect("choice"), Choice::Pick(1));
        assert_eq!(p.choose("[AMBIG]", &options).expect("choice"), Choice::Quit);
        let transcript = String::from_utf8(p.writer.clone()).expect("utf8");
        assert!(transcript.contains("  1: B (2001)"));
        assert!(transcript.contains("Invalid choice."));
    }

    #[test]
    fn closed_input_is_an_error_not_a_default() {
        let mut p = prompter("");
        let err = p.ask("Add?", Answer::Yes).expect_err("eof");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn input_falls_back_to_default() {
        let mut p = prompter("\nhttp://radarr:7878\n");
        assert_eq!(
            p.input("Enter Radarr URL", "http://127.0.0.1:7878")
                .expect("input"),
            "http://127.0.0.1:7878"
        );
        assert_eq!(
            p.input("Enter Radarr URL", "http://127.0.0.1:7878")
                .expect("input"),
            "http://radarr:7878"
        );
    }
}
