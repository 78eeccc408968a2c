//! Interactive menu loop: summarize pasted text or ask questions about the context file.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use log::{error, info};

use crate::error::Result;
use crate::generator::TextGenerator;
use crate::grounded_qa::{load_context, GroundedQa};
use crate::summarizer::Summarizer;

pub const BORDER: &str = "--------------------------------------------------";
pub const MENU_PROMPT: &str = "\nChoose an option (1/2/0): ";
pub const NO_TEXT_MESSAGE: &str = "No text received...";
pub const NO_QUESTION_MESSAGE: &str = "No question received...";
pub const INVALID_CHOICE_MESSAGE: &str = "Please choose 1/2/0";
pub const FAREWELL_MESSAGE: &str = "Thank you for using the FLAN-T5 summarizer and Q&A assistant";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Summarize,
    AskContext,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::Summarize),
            "2" => Some(MenuChoice::AskContext),
            "0" => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

/// One console session over arbitrary input/output streams.
pub struct Session<'g, G: TextGenerator + ?Sized, R, W> {
    generator: &'g G,
    context_path: PathBuf,
    input: R,
    output: W,
}

impl<'g, G, R, W> Session<'g, G, R, W>
where
    G: TextGenerator + ?Sized,
    R: BufRead,
    W: Write,
{
    pub fn new(generator: &'g G, context_path: PathBuf, input: R, output: W) -> Self {
        Self {
            generator,
            context_path,
            input,
            output,
        }
    }

    /// Runs until the user picks `0` or input ends. Only console I/O failures are errors.
    pub fn run(&mut self) -> Result<()> {
        self.print_menu()?;
        loop {
            self.prompt(MENU_PROMPT)?;
            let Some(line) = self.read_line()? else {
                info!("Input closed, ending session");
                writeln!(self.output)?;
                break;
            };

            match MenuChoice::parse(&line) {
                Some(MenuChoice::Exit) => {
                    writeln!(self.output, "{}", FAREWELL_MESSAGE)?;
                    break;
                }
                Some(MenuChoice::Summarize) => self.summarize_flow()?,
                Some(MenuChoice::AskContext) => self.ask_flow()?,
                None => writeln!(self.output, "{}", INVALID_CHOICE_MESSAGE)?,
            }
        }
        self.output.flush()?;
        Ok(())
    }

    fn print_menu(&mut self) -> Result<()> {
        writeln!(self.output, "{}", BORDER)?;
        writeln!(self.output, "---------- FLAN-T5 Text Summarizer and Q&A ----------")?;
        writeln!(self.output, "{}", BORDER)?;
        writeln!(self.output, "\n1. Summarize text")?;
        writeln!(
            self.output,
            "\n2. Question and answer over local {}",
            self.context_path.display()
        )?;
        writeln!(self.output, "\n0. Exit")?;
        writeln!(self.output, "{}", BORDER)?;
        Ok(())
    }

    fn summarize_flow(&mut self) -> Result<()> {
        writeln!(self.output, "\nPaste text to summarize. End with a blank line...")?;
        self.output.flush()?;
        let text = self.read_text_block()?;
        if text.is_empty() {
            writeln!(self.output, "{}", NO_TEXT_MESSAGE)?;
            return Ok(());
        }

        match Summarizer::new(self.generator).summarize(&text) {
            Ok(summary) => {
                writeln!(self.output, "{}", BORDER)?;
                writeln!(self.output, "Summary generated by FLAN-T5:\n")?;
                writeln!(self.output, "{}", summary)?;
            }
            Err(e) => {
                error!("Summarization failed: {}", e);
                writeln!(self.output, "Could not generate a summary: {}", e)?;
            }
        }
        Ok(())
    }

    fn ask_flow(&mut self) -> Result<()> {
        let context = match load_context(&self.context_path) {
            Ok(context) => context,
            Err(e) => {
                error!("Reading {:?} failed: {}", self.context_path, e);
                writeln!(self.output, "Could not read '{}': {}", self.context_path.display(), e)?;
                return Ok(());
            }
        };
        if context.trim().is_empty() {
            writeln!(
                self.output,
                "Missing '{}'. Create it in the same folder and try again...",
                self.context_path.display()
            )?;
            return Ok(());
        }

        self.prompt("\nAsk a question about your context: ")?;
        let question = self.read_line()?.unwrap_or_default();
        let question = question.trim();
        if question.is_empty() {
            writeln!(self.output, "{}", NO_QUESTION_MESSAGE)?;
            return Ok(());
        }

        match GroundedQa::new(self.generator).answer(question, &context) {
            Ok(answer) => {
                writeln!(self.output, "\nAnswer from FLAN-T5:")?;
                writeln!(self.output, "{}", answer)?;
            }
            Err(e) => {
                error!("Answering failed: {}", e);
                writeln!(self.output, "Could not generate an answer: {}", e)?;
            }
        }
        Ok(())
    }

    /// Lines up to the first blank line (or end of input), joined and trimmed.
    fn read_text_block(&mut self) -> Result<String> {
        let mut lines = Vec::new();
        while let Some(line) = self.read_line()? {
            if line.trim().is_empty() {
                break;
            }
            lines.push(line);
        }
        Ok(lines.join("\n").trim().to_string())
    }

    fn prompt(&mut self, text: &str) -> Result<()> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        Ok(())
    }

    /// `None` at end of input; the line terminator is stripped.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut buffer = String::new();
        if self.input.read_line(&mut buffer)? == 0 {
            return Ok(None);
        }
        let trimmed_len = buffer.trim_end_matches(['\n', '\r']).len();
        buffer.truncate(trimmed_len);
        Ok(Some(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_choice_parsing() {
        assert_eq!(MenuChoice::parse("1"), Some(MenuChoice::Summarize));
        assert_eq!(MenuChoice::parse(" 2 \n"), Some(MenuChoice::AskContext));
        assert_eq!(MenuChoice::parse("0"), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse("3"), None);
        assert_eq!(MenuChoice::parse(""), None);
        assert_eq!(MenuChoice::parse("exit"), None);
    }
}
