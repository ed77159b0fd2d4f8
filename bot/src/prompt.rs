use std::io::{self, BufRead, Write};

/// Tulis pertanyaan lalu baca satu baris jawaban (sudah di-trim).
/// EOF dianggap jawaban kosong.
pub fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<String> {
    write!(output, "{}", question)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Gerbang `[y/N]`: hanya `y`/`yes` (huruf besar/kecil bebas) yang lanjut.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<bool> {
    let answer = ask(input, output, &format!("{} [y/N] ", question))?;
    Ok(is_affirmative(&answer))
}
