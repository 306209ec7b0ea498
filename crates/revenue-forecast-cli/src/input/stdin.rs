use std::io::{self, Read};

/// Piped stdin text, or None when stdin is a terminal or blank.
pub fn read_stdin() -> Result<Option<String>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    let text = buffer.trim();
    if text.is_empty() {
        log::debug!("stdin: no piped input");
        return Ok(None);
    }
    log::debug!("stdin: read {} bytes", text.len());
    Ok(Some(text.to_string()))
}
