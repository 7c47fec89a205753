//! Terminal interaction for the command-line driver.
//!
//! The voice front end answers prompts on the next conversational turn; on a
//! terminal the next turn is simply the next line of input.

use crate::error::Result;
use crate::orchestrator::Answer;
use crate::session::Response;
use std::io::{self, BufRead, Write};

/// Interpret a typed or spoken reply as yes or no.
///
/// # Examples
///
/// ```
/// use plex_remote::orchestrator::Answer;
/// use plex_remote::ui::parse_answer;
///
/// assert_eq!(parse_answer(" Yes "), Some(Answer::Yes));
/// assert_eq!(parse_answer("nope"), Some(Answer::No));
/// assert_eq!(parse_answer("maybe"), None);
/// ```
pub fn parse_answer(input: &str) -> Option<Answer> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" | "yeah" | "yep" | "sure" | "ok" | "okay" => Some(Answer::Yes),
        "n" | "no" | "nope" | "nah" => Some(Answer::No),
        _ => None,
    }
}

/// Ask until the user gives a recognisable yes or no.
///
/// End of input counts as "no".
pub fn prompt_answer<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Answer> {
    loop {
        write!(output, "[y/n] ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(Answer::No);
        }
        if let Some(answer) = parse_answer(&line) {
            return Ok(answer);
        }
        writeln!(output, "Please answer yes or no.")?;
    }
}

/// Ask on the process's own terminal.
pub fn prompt_answer_stdin() -> Result<Answer> {
    let stdin = io::stdin();
    prompt_answer(&mut stdin.lock(), &mut io::stdout())
}

/// Print what would have been spoken, plus the card if any.
pub fn print_response(response: &Response) {
    for line in response.utterances() {
        println!("{}", line);
    }
    if let Some(card) = response.get_card() {
        println!("[{}] {}", card.title, card.content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_answer_variants() {
        assert_eq!(parse_answer("y"), Some(Answer::Yes));
        assert_eq!(parse_answer("OKAY\n"), Some(Answer::Yes));
        assert_eq!(parse_answer("No"), Some(Answer::No));
        assert_eq!(parse_answer(""), None);
    }

    #[test]
    fn test_prompt_answer_retries_until_valid() {
        let mut input = Cursor::new("what\n\nyes\n");
        let mut output = Vec::new();

        let answer = prompt_answer(&mut input, &mut output).unwrap();
        assert_eq!(answer, Answer::Yes);

        let printed = String::from_utf8(output).unwrap();
        assert_eq!(printed.matches("Please answer yes or no.").count(), 2);
    }

    #[test]
    fn test_prompt_answer_eof_is_no() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();
        assert_eq!(prompt_answer(&mut input, &mut output).unwrap(), Answer::No);
    }
}
