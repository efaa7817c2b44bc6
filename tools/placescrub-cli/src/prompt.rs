//! Interactive questions asked by `placescrub run`.

use std::io::{self, BufRead, Write};

/// Print `question` and read one trimmed line. End of input is an error.
fn read_answer<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    question: &str,
) -> io::Result<String> {
    write!(out, "{question} ")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("no answer to: {question}"),
        ));
    }
    Ok(line.trim().to_string())
}

/// Ask until the answer is `true` or `false` (case-insensitive).
pub fn ask_true_false<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    question: &str,
) -> io::Result<bool> {
    loop {
        match read_answer(input, out, question)?.to_ascii_lowercase().as_str() {
            "true" => return Ok(true),
            "false" => return Ok(false),
            _ => writeln!(out, "Please answer true or false.")?,
        }
    }
}

/// Ask for space-separated keywords. An empty answer means the defaults.
pub fn ask_keywords<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
) -> io::Result<Option<Vec<String>>> {
    let answer = read_answer(
        input,
        out,
        "Enter keywords separated by spaces (leave empty for the defaults):",
    )?;
    let keywords: Vec<String> = answer.split_whitespace().map(str::to_string).collect();
    Ok((!keywords.is_empty()).then_some(keywords))
}

/// Check a file name given without extension.
///
/// `reserved` is a stem already taken by another output file.
pub fn check_filename(name: &str, reserved: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        Err("The name cannot be empty.")
    } else if name.contains('.') {
        Err("Please leave out the extension.")
    } else if name.contains(['/', '\\']) {
        Err("The name cannot contain path separators.")
    } else if name == reserved {
        Err("That name is taken by the main output file.")
    } else {
        Ok(())
    }
}

/// Ask for a file name without extension until [`check_filename`] accepts it.
pub fn ask_filename<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    reserved: &str,
) -> io::Result<String> {
    loop {
        let answer = read_answer(input, out, "Name of the filtered file (without extension):")?;
        match check_filename(&answer, reserved) {
            Ok(()) => return Ok(answer),
            Err(message) => writeln!(out, "{message}")?,
        }
    }
}
