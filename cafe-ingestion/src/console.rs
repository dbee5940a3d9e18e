use std::io::{self, BufRead, Write};

/// Source of operator answers for fields the scraper could not fill.
pub trait FieldSupplier {
    fn supply(&mut self, prompt: &str) -> io::Result<String>;
}

/// Asks on stdout and reads one line from stdin.
#[derive(Debug, Default)]
pub struct ConsolePrompt;

impl FieldSupplier for ConsolePrompt {
    fn supply(&mut self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;

        read_answer(&mut io::stdin().lock())
    }
}

/// Read one answer line without its line ending.
/// A closed input is an `UnexpectedEof` error, not an empty answer.
pub fn read_answer<R: BufRead>(reader: &mut R) -> io::Result<String> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed before an answer was given",
        ));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn press_enter_to_continue(supplier: &mut dyn FieldSupplier) -> io::Result<()> {
    supplier.supply("Press Enter to continue...")?;
    Ok(())
}

pub fn clear_screen() -> io::Result<()> {
    let mut stdout = io::stdout();
    // ANSI: erase display, cursor home
    stdout.write_all(b"\x1B[2J\x1B[1;1H")?;
    stdout.flush()
}
