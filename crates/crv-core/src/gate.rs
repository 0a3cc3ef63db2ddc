//! ---
//! crv_section: "03-revocation-pipeline"
//! crv_subsection: "module"
//! crv_type: "source"
//! crv_scope: "code"
//! crv_description: "Operator confirmation before each revocation."
//! crv_version: "v0.1.0"
//! crv_owner: "pki-ops"
//! ---
use std::collections::VecDeque;
use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// Source of per-candidate approve/decline decisions.
pub trait DecisionSource {
    /// Block until a decision for `prompt` is available. `true` approves.
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Prompts on a writer and reads one answer line per candidate.
///
/// Only `y` or `Y` approves. Every other answer, a failed read, or end of
/// input declines.
#[derive(Debug)]
pub struct TerminalGate<R, W> {
    input: R,
    output: W,
}

impl TerminalGate<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalGate<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> DecisionSource for TerminalGate<R, W> {
    fn confirm(&mut self, prompt: &str) -> bool {
        let shown = write!(self.output, "{prompt} [y/N]: ").and_then(|()| self.output.flush());
        if shown.is_err() {
            return false;
        }
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_affirmative(&line),
        }
    }
}

/// Whether an answer line approves. One trailing line terminator is ignored.
pub fn is_affirmative(line: &str) -> bool {
    let answer = line.strip_suffix('\n').unwrap_or(line);
    let answer = answer.strip_suffix('\r').unwrap_or(answer);
    matches!(answer, "y" | "Y")
}

/// Replays a fixed sequence of decisions; declines once exhausted.
#[derive(Debug, Default, Clone)]
pub struct ScriptedDecisions {
    decisions: VecDeque<bool>,
    prompts: Vec<String>,
}

impl ScriptedDecisions {
    pub fn new(decisions: impl IntoIterator<Item = bool>) -> Self {
        Self {
            decisions: decisions.into_iter().collect(),
            prompts: Vec::new(),
        }
    }

    /// Prompts seen so far, in order.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl DecisionSource for ScriptedDecisions {
    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_owned());
        self.decisions.pop_front().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn answer(input: &str) -> (bool, String) {
        let mut output = Vec::new();
        let decision = TerminalGate::new(Cursor::new(input.as_bytes().to_vec()), &mut output)
            .confirm("Revoke certificate?");
        (decision, String::from_utf8(output).unwrap())
    }

    #[test]
    fn single_letter_yes_approves() {
        assert!(answer("y\n").0);
        assert!(answer("Y\r\n").0);
        assert!(answer("y").0);
    }

    #[test]
    fn everything_else_declines() {
        for input in ["", "\n", "n\n", "N\n", "yes\n", " y\n", "y \n", "yy\n", "Y\r\r\n"] {
            assert!(!answer(input).0, "input {input:?} must decline");
        }
    }

    #[test]
    fn prompt_carries_choice_indicator() {
        let (_, output) = answer("n\n");
        assert_eq!(output, "Revoke certificate? [y/N]: ");
    }

    #[test]
    fn reads_one_line_per_prompt() {
        let mut gate = TerminalGate::new(Cursor::new(b"y\nn\ny\n".to_vec()), io::sink());
        let decisions: Vec<_> = (0..4).map(|_| gate.confirm("?")).collect();
        assert_eq!(decisions, vec![true, false, true, false]);
    }

    struct FailingReader;

    impl io::Read for FailingReader {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "tty gone"))
        }
    }

    #[test]
    fn read_errors_decline() {
        let mut gate = TerminalGate::new(io::BufReader::new(FailingReader), io::sink());
        assert!(!gate.confirm("?"));
    }

    #[test]
    fn scripted_decisions_record_prompts() {
        let mut gate = ScriptedDecisions::new([true]);
        assert!(gate.confirm("first"));
        assert!(!gate.confirm("second"));
        assert_eq!(gate.prompts(), ["first".to_owned(), "second".to_owned()]);
    }
}
