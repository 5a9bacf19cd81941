use std::io::{self, BufRead, IsTerminal};

use thiserror::Error;
use zeroize::Zeroizing;

/// Environment variable consulted before stdin or the terminal.
pub const PASSPHRASE_ENV: &str = "LOCKER_PASSPHRASE";

/// Maximum passphrase length in bytes.
pub const PASSPHRASE_MAX_LEN: usize = 200;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error("no passphrase provided")]
    Empty,

    #[error("passphrase is too long, must be at most {} bytes", PASSPHRASE_MAX_LEN)]
    TooLong,

    #[error("passphrases do not match")]
    Mismatch,
}

pub fn read_passphrase() -> Result<Zeroizing<String>, PromptError> {
    //  LOCKER_PASSPHRASE="supersecret" locker items work
    if let Some(pw) = passphrase_from_env() {
        return check(pw);
    }

    //  echo "supersecret" | locker items work
    if !io::stdin().is_terminal() {
        return check(read_line()?);
    }

    check(Zeroizing::new(rpassword::prompt_password("Passphrase: ")?))
}

/// Like [`read_passphrase`], but asks twice when prompting on a terminal.
pub fn read_new_passphrase_with_confirmation() -> Result<Zeroizing<String>, PromptError> {
    if let Some(pw) = passphrase_from_env() {
        return check(pw);
    }

    if !io::stdin().is_terminal() {
        let pw1 = read_line()?;
        let pw2 = read_line()?;

        if pw1 != pw2 {
            return Err(PromptError::Mismatch);
        }
        return check(pw1);
    }

    let pw1 = Zeroizing::new(rpassword::prompt_password("New passphrase: ")?);
    let pw2 = Zeroizing::new(rpassword::prompt_password("Confirm passphrase: ")?);

    if pw1 != pw2 {
        return Err(PromptError::Mismatch);
    }
    check(pw1)
}

/// Reads one secret field value. Not echoed on a terminal; may be empty.
pub fn read_secret(label: &str) -> Result<Zeroizing<String>, PromptError> {
    if io::stdin().is_terminal() {
        return Ok(Zeroizing::new(rpassword::prompt_password(format!(
            "{label}: "
        ))?));
    }
    read_line()
}

fn passphrase_from_env() -> Option<Zeroizing<String>> {
    std::env::var(PASSPHRASE_ENV)
        .ok()
        .map(Zeroizing::new)
        .filter(|pw| !pw.is_empty())
}

fn check(pw: Zeroizing<String>) -> Result<Zeroizing<String>, PromptError> {
    if pw.is_empty() {
        return Err(PromptError::Empty);
    }
    if pw.len() > PASSPHRASE_MAX_LEN {
        return Err(PromptError::TooLong);
    }
    Ok(pw)
}

/// Room for a maximum-length passphrase plus a CRLF line ending.
const LINE_CAPACITY: usize = PASSPHRASE_MAX_LEN + 2;

fn read_line() -> Result<Zeroizing<String>, PromptError> {
    read_line_from(&mut io::stdin().lock())
}

// Reads into a pre-sized buffer so that no partially filled copy is freed
// while the line grows. Longer input still reallocates and is rejected by
// `check` afterwards.
fn read_line_from(input: &mut impl BufRead) -> Result<Zeroizing<String>, PromptError> {
    let mut buf = Zeroizing::new(String::with_capacity(LINE_CAPACITY));
    input.read_line(&mut buf)?;
    trim_newline(&mut buf);
    Ok(buf)
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
