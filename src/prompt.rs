//! Interactive prompts for the folder and search terms
//!
//! Used by the binary when either is missing from the command line.

use console::{style, Term};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

/// Line-oriented console, so prompts can be driven from tests
pub trait Console {
    /// Show `prompt` and read one line; `None` once input is exhausted
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Print one line
    fn say(&mut self, line: &str) -> io::Result<()>;
}

impl Console for Term {
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.write_str(prompt)?;
        self.flush()?;
        let line = self.read_line()?;
        // A closed, non-interactive stdin reads as endless empty lines
        if line.is_empty() && !self.is_term() {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn say(&mut self, line: &str) -> io::Result<()> {
        self.write_line(line)
    }
}

/// Console over any reader/writer pair
pub struct StreamConsole<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> StreamConsole<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Console for StreamConsole<R, W> {
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.output, "{}", line)
    }
}

/// True when both stdin and `term` are attached to a terminal
pub fn is_interactive(term: &Term) -> bool {
    term.is_term() && io::stdin().is_terminal()
}

/// The terminal itself when interactive, otherwise the plain streams
///
/// `Term::read_line` returns an empty line whenever stdout is not a tty,
/// so piped answers must be read straight from `input`.
pub fn choose_console<R, W>(interactive: bool, term: Term, input: R, output: W) -> Box<dyn Console>
where
    R: BufRead + 'static,
    W: Write + 'static,
{
    if interactive {
        Box::new(term)
    } else {
        Box::new(StreamConsole::new(input, output))
    }
}

fn input_closed() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "input closed before an answer was given")
}

/// Ask until an existing directory is entered
pub fn prompt_folder<C: Console + ?Sized>(console: &mut C) -> io::Result<PathBuf> {
    loop {
        let answer = console
            .ask("Please enter a valid folder path: ")?
            .ok_or_else(input_closed)?;
        let path = PathBuf::from(answer.trim());

        if !answer.trim().is_empty() && path.is_dir() {
            console.say(&format!("{}", style("You have entered a valid folder path.").green()))?;
            return Ok(path);
        }
        console.say(&format!(
            "{}",
            style("Invalid folder path, or the directory does not exist. Please try again.").yellow()
        ))?;
    }
}

/// Report how many images the folder holds
pub fn report_image_count<C: Console + ?Sized>(console: &mut C, count: usize) -> io::Result<()> {
    console.say(&format!("There are {} .png files in that folder.", count))
}

/// Ask for the comma-separated terms and echo them back
pub fn prompt_terms<C: Console + ?Sized>(console: &mut C) -> io::Result<String> {
    let answer = console
        .ask("Please enter comma separated tags to search for: ")?
        .ok_or_else(input_closed)?;
    console.say(&format!("You are searching for: {}", answer))?;
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn console(input: &str) -> StreamConsole<Cursor<Vec<u8>>, Vec<u8>> {
        StreamConsole::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_prompt_folder_retries_until_valid() {
        let dir = TempDir::new().unwrap();
        let input = format!("\n/definitely/not/here\n{}\n", dir.path().display());
        let mut console = console(&input);

        let folder = prompt_folder(&mut console).unwrap();
        assert_eq!(folder, dir.path());

        let output = String::from_utf8(console.into_output()).unwrap();
        assert_eq!(output.matches("Please enter a valid folder path").count(), 3);
        assert_eq!(output.matches("Please try again").count(), 2);
    }

    #[test]
    fn test_prompt_folder_eof() {
        let mut console = console("/nope\n");
        let err = prompt_folder(&mut console).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_piped_answers_reach_prompts() {
        let dir = TempDir::new().unwrap();
        let input = format!("{}\nsunset, beach\n", dir.path().display());
        let mut console = choose_console(
            false,
            Term::stdout(),
            Cursor::new(input.into_bytes()),
            io::sink(),
        );

        assert_eq!(prompt_folder(console.as_mut()).unwrap(), dir.path());
        assert_eq!(prompt_terms(console.as_mut()).unwrap(), "sunset, beach");
        assert_eq!(
            prompt_terms(console.as_mut()).unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
    }

    #[test]
    fn test_prompt_terms_echoes() {
        let mut console = console("Cat, Dog\r\n");
        assert_eq!(prompt_terms(&mut console).unwrap(), "Cat, Dog");
        report_image_count(&mut console, 12).unwrap();

        let output = String::from_utf8(console.into_output()).unwrap();
        assert!(output.contains("You are searching for: Cat, Dog"));
        assert!(output.contains("There are 12 .png files"));
    }
}
