use std::process::ExitCode;

use locker::{ErrorKind, LockerError};

use crate::auth::PromptError;

pub const EXIT_SOFTWARE: u8 = 1;
pub const EXIT_IO: u8 = 2;
pub const EXIT_USAGE: u8 = 64;
pub const EXIT_AUTH: u8 = 65;
pub const EXIT_NOT_FOUND: u8 = 66;

pub fn exit_code_for_locker_error(error: &LockerError) -> ExitCode {
    match error.kind() {
        ErrorKind::Validation => ExitCode::from(EXIT_USAGE),
        ErrorKind::Authentication => ExitCode::from(EXIT_AUTH),
        ErrorKind::NotFound => ExitCode::from(EXIT_NOT_FOUND),
        ErrorKind::Io => ExitCode::from(EXIT_IO),
        ErrorKind::Fatal => ExitCode::from(EXIT_SOFTWARE),
    }
}

pub fn exit_code_for_prompt_error(error: &PromptError) -> ExitCode {
    use PromptError::*;

    match error {
        Io(_) => ExitCode::from(EXIT_IO),
        Empty | TooLong | Mismatch => ExitCode::from(EXIT_USAGE),
    }
}

pub fn exit_code_for_error(error: &anyhow::Error) -> ExitCode {
    if let Some(error) = error.downcast_ref::<LockerError>() {
        return exit_code_for_locker_error(error);
    }
    if let Some(error) = error.downcast_ref::<PromptError>() {
        return exit_code_for_prompt_error(error);
    }
    ExitCode::from(EXIT_SOFTWARE)
}
