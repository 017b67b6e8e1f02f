use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

/// Bestätigungs-Strategie vor jedem teuren oder destruktiven Schritt.
///
/// Ein Nein ist kein Fehler, der Schritt wird nur übersprungen.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Interaktiver Prompt, liest eine Zeile und akzeptiert nur `y`/`Y`
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl ConsolePrompt<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirm for ConsolePrompt<R, W> {
    fn confirm(&mut self, prompt: &str) -> bool {
        if write!(self.output, "{} [y/N] ", prompt)
            .and_then(|_| self.output.flush())
            .is_err()
        {
            return false;
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) => {
                tracing::warn!("Input closed, treating as no");
                false
            }
            Ok(_) => is_affirmative(&answer),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read answer, treating as no");
                false
            }
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim_start().chars().next(), Some('y' | 'Y'))
}

/// `--yes`: alles ohne Nachfrage ausführen
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysYes;

impl Confirm for AlwaysYes {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

#[cfg(test)]
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysNo;

#[cfg(test)]
impl Confirm for AlwaysNo {
    fn confirm(&mut self, _prompt: &str) -> bool {
        false
    }
}

/// Vorgegebene Antworten in Reihenfolge (`--answers y,n,y`), danach immer Nein.
/// Merkt sich die Prompts.
#[derive(Debug, Default)]
pub struct Scripted {
    answers: VecDeque<bool>,
    prompts: Vec<String>,
}

impl Scripted {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            prompts: Vec::new(),
        }
    }

    /// `y`/`n` Liste, getrennt durch Komma
    pub fn parse(answers: &str) -> Result<Self, String> {
        answers
            .split(',')
            .map(|answer| match answer.trim() {
                "y" | "Y" | "yes" => Ok(true),
                "n" | "N" | "no" => Ok(false),
                other => Err(format!("invalid answer {:?}, expected y or n", other)),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    #[cfg(test)]
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl Confirm for Scripted {
    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front().unwrap_or(false)
    }
}
