use std::fmt;
use std::convert::From;
use std::error::Error as StdError;
use std::io::Error as IoError;

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Debug)]
pub enum ErrorKind {
    InternalIo(IoError),
    Json(serde_json::Error),
    Http(reqwest::Error),
    Generic,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub desc: String,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", &self.desc)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self.kind {
            ErrorKind::InternalIo(ref e) => Some(e),
            ErrorKind::Json(ref e) => Some(e),
            ErrorKind::Http(ref e) => Some(e),
            ErrorKind::Generic => None,
        }
    }
}

#[macro_export]
macro_rules! specific_fail {
    ($short:expr) => {{
        use $crate::errors::{Error, ErrorKind};
        Err(::std::convert::From::from(
            Error {
                kind: ErrorKind::Generic,
                desc: $short,
            }
        ))
    }}
}

#[macro_export]
macro_rules! specific_fail_str {
    ($s:expr) => {
        $crate::specific_fail!($s.to_string())
    }
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Error {
        Error {
            desc: err.to_string(),
            kind: ErrorKind::InternalIo(err),
        }
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Error {
        Error::from(err.error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error {
            desc: format!("JSON error: {}", err),
            kind: ErrorKind::Json(err),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Error {
        let desc = match err.url() {
            Some(u) => format!("HTTP error: {} ({})", err, u),
            None => format!("HTTP error: {}", err),
        };
        Error {
            desc: desc,
            kind: ErrorKind::Http(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind as IoErrorKind;

    fn fails() -> Result<()> {
        crate::specific_fail_str!("no note is being edited")
    }

    #[test]
    fn io_errors_keep_their_source() {
        let err = Error::from(IoError::new(IoErrorKind::PermissionDenied, "read-only folder"));
        assert_eq!(err.to_string(), "read-only folder");
        assert!(err.source().is_some());
    }

    #[test]
    fn json_errors_are_prefixed() {
        let err: Error = serde_json::from_str::<Vec<u8>>("{").unwrap_err().into();
        assert!(err.to_string().starts_with("JSON error: "));
        assert!(matches!(err.kind, ErrorKind::Json(_)));
    }

    #[test]
    fn generic_failures_carry_only_a_message() {
        let err = fails().unwrap_err();
        assert_eq!(err.to_string(), "no note is being edited");
        assert!(err.source().is_none());
    }
}
