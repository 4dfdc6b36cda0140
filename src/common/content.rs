//! Helpers for moving payload bytes between the command line, files and standard streams.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

/// Marker meaning "standard input" or "standard output".
pub const STDIO: &str = "-";

/// Resolve a `--data` style argument: `-` reads stdin, an existing file is read whole, and
/// anything else is taken literally.
pub fn read_byte_content(file_or_data: &str) -> io::Result<Vec<u8>> {
    if file_or_data == STDIO {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        return Ok(buf);
    }
    if Path::new(file_or_data).is_file() {
        return fs::read(file_or_data);
    }
    Ok(file_or_data.as_bytes().to_vec())
}

/// Write `data` to `target`, or to stdout when `target` is `-`.
pub fn write_byte_content(target: &str, data: &[u8]) -> io::Result<()> {
    if target == STDIO {
        let mut stdout = io::stdout().lock();
        stdout.write_all(data)?;
        return stdout.flush();
    }
    fs::write(target, data)
}

/// Friendly byte count, e.g. `1,000 bytes` or `12.34 kb`.
pub fn bytes_str(num: usize) -> String {
    const SUFFIX: [&str; 6] = ["bytes", "kb", "mb", "gb", "tb", "pb"];

    let mut value = num as f64;
    let mut idx = 0;
    while value > 1024.0 && idx < SUFFIX.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }

    if idx == 0 {
        format!("{} {}", group_thousands(num), SUFFIX[0])
    } else {
        format!("{:.2} {}", value, SUFFIX[idx])
    }
}

/// `1234567` -> `1,234,567`
pub fn group_thousands(num: usize) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
