use thiserror::Error;

#[derive(Error, Debug)]
pub enum Id3Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ID3 no tag found")]
    TagNotFound,

    #[error("ID3 unsupported version: {0}")]
    UnsupportedVersion(String),

    #[error("ID3 invalid tag header: {0}")]
    InvalidTag(String),

    #[error("ID3 truncated data: needed {needed} bytes, only {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("ID3 read of {requested} bytes exceeds the declared boundary ({remaining} remaining)")]
    BoundsExceeded { requested: usize, remaining: usize },

    #[error("ID3 invalid frame {id}: {reason}")]
    InvalidFrame { id: String, reason: String },

    #[error("ID3 bad unsynch data")]
    BadUnsynchData,

    #[error("ID3 bad compressed data in frame {0}")]
    BadCompressedData(String),

    #[error("Field {key} is not supported by {version}")]
    UnsupportedField { key: String, version: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Value for {field} is {length} characters long, maximum is {max}")]
    FieldLengthExceeded {
        field: String,
        length: usize,
        max: usize,
    },
}

impl Id3Error {
    pub(crate) fn invalid_frame(id: &str, reason: impl Into<String>) -> Self {
        Id3Error::InvalidFrame {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Malformed length vs. available bytes.
    pub fn is_bounds_error(&self) -> bool {
        matches!(
            self,
            Id3Error::Truncated { .. } | Id3Error::BoundsExceeded { .. }
        )
    }

    /// Errors raised by the field mapping layer before any state is touched.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Id3Error::UnsupportedField { .. }
                | Id3Error::InvalidArgument(_)
                | Id3Error::FieldLengthExceeded { .. }
        )
    }
}

#[cfg(feature = "python")]
mod python {
    use super::Id3Error;
    use pyo3::create_exception;
    use pyo3::exceptions::PyException;

    // Python exception types mirroring the Rust error taxonomy
    create_exception!(id3kit, Id3PyError, PyException);
    create_exception!(id3kit, ID3NoHeaderError, Id3PyError);
    create_exception!(id3kit, ID3UnsupportedVersionError, Id3PyError);
    create_exception!(id3kit, ID3BadTagError, Id3PyError);
    create_exception!(id3kit, ID3InvalidFrameError, Id3PyError);
    create_exception!(id3kit, ID3BadUnsynchData, Id3PyError);
    create_exception!(id3kit, ID3BadCompressedData, Id3PyError);
    create_exception!(id3kit, UnsupportedFieldError, Id3PyError);
    create_exception!(id3kit, FieldLengthError, Id3PyError);

    impl From<Id3Error> for pyo3::PyErr {
        fn from(err: Id3Error) -> pyo3::PyErr {
            let msg = err.to_string();
            match err {
                Id3Error::Io(e) => pyo3::exceptions::PyIOError::new_err(e.to_string()),
                Id3Error::TagNotFound => ID3NoHeaderError::new_err(msg),
                Id3Error::UnsupportedVersion(_) => ID3UnsupportedVersionError::new_err(msg),
                Id3Error::InvalidTag(_)
                | Id3Error::Truncated { .. }
                | Id3Error::BoundsExceeded { .. } => ID3BadTagError::new_err(msg),
                Id3Error::InvalidFrame { .. } => ID3InvalidFrameError::new_err(msg),
                Id3Error::BadUnsynchData => ID3BadUnsynchData::new_err(msg),
                Id3Error::BadCompressedData(_) => ID3BadCompressedData::new_err(msg),
                Id3Error::UnsupportedField { .. } => UnsupportedFieldError::new_err(msg),
                Id3Error::FieldLengthExceeded { .. } => FieldLengthError::new_err(msg),
                Id3Error::InvalidArgument(_) => pyo3::exceptions::PyValueError::new_err(msg),
            }
        }
    }

    pub(crate) fn register(m: &pyo3::Bound<'_, pyo3::types::PyModule>) -> pyo3::PyResult<()> {
        use pyo3::prelude::*;

        let py = m.py();
        m.add("Id3Error", py.get_type::<Id3PyError>())?;
        m.add("ID3NoHeaderError", py.get_type::<ID3NoHeaderError>())?;
        m.add(
            "ID3UnsupportedVersionError",
            py.get_type::<ID3UnsupportedVersionError>(),
        )?;
        m.add("ID3BadTagError", py.get_type::<ID3BadTagError>())?;
        m.add("ID3InvalidFrameError", py.get_type::<ID3InvalidFrameError>())?;
        m.add("ID3BadUnsynchData", py.get_type::<ID3BadUnsynchData>())?;
        m.add("ID3BadCompressedData", py.get_type::<ID3BadCompressedData>())?;
        m.add("UnsupportedFieldError", py.get_type::<UnsupportedFieldError>())?;
        m.add("FieldLengthError", py.get_type::<FieldLengthError>())?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub(crate) use python::register as register_exceptions;

pub type Result<T> = std::result::Result<T, Id3Error>;
