use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyBytes;

use crate::common::config::TagOptions;
use crate::common::error::{register_exceptions, Id3Error};
use crate::field::{FieldKey, TagFields};
use crate::id3::header::Id3v2Version;
use crate::id3::id3v1::Id3v1Tag;
use crate::id3::tags::Id3v2Tag;
use crate::id3::{self, LoadedTags};

fn parse_key(key: &str) -> PyResult<FieldKey> {
    key.parse::<FieldKey>()
        .map_err(|_| PyKeyError::new_err(key.to_string()))
}

fn parse_version(major: u8) -> PyResult<Id3v2Version> {
    Id3v2Version::from_major(major)
        .ok_or_else(|| PyValueError::new_err(format!("unsupported ID3v2 version 2.{}", major)))
}

fn extract_values(value: &Bound<'_, PyAny>) -> PyResult<Vec<String>> {
    value
        .extract::<Vec<String>>()
        .or_else(|_| value.extract::<String>().map(|s| vec![s]))
}

/// ID3 tag container keyed by generic field names (`"ARTIST"`, `"track"`).
#[pyclass(name = "ID3")]
#[derive(Debug)]
struct PyID3 {
    tags: Id3v2Tag,
    id3v1: Option<Id3v1Tag>,
    path: Option<String>,
}

impl PyID3 {
    fn from_loaded(loaded: LoadedTags, options: TagOptions, path: Option<String>) -> Self {
        let tags = loaded
            .id3v2
            .or_else(|| {
                let v1 = loaded.id3v1.as_ref()?;
                Some(Id3v2Tag::from_id3v1(v1, options.preferred_version))
            })
            .unwrap_or_else(|| Id3v2Tag::with_options(options.preferred_version, options));
        PyID3 {
            tags,
            id3v1: loaded.id3v1,
            path,
        }
    }
}

#[pymethods]
impl PyID3 {
    #[new]
    #[pyo3(signature = (filename=None, version=4, truncate=false))]
    fn new(filename: Option<&str>, version: u8, truncate: bool) -> PyResult<Self> {
        let options = TagOptions::new()
            .preferred_version(parse_version(version)?)
            .truncate_text(truncate);
        match filename {
            Some(path) => match id3::load_id3(path, options) {
                Ok(loaded) => Ok(Self::from_loaded(loaded, options, Some(path.to_string()))),
                Err(Id3Error::TagNotFound) => Ok(Self::from_loaded(
                    LoadedTags::default(),
                    options,
                    Some(path.to_string()),
                )),
                Err(e) => Err(e.into()),
            },
            None => Ok(Self::from_loaded(LoadedTags::default(), options, None)),
        }
    }

    /// Parse a tag from bytes.
    #[staticmethod]
    fn from_bytes(data: &[u8]) -> PyResult<Self> {
        let options = TagOptions::new();
        let loaded = id3::load_id3_from_data(data, options)?;
        Ok(Self::from_loaded(loaded, options, None))
    }

    fn getall(&self, key: &str) -> PyResult<Vec<String>> {
        Ok(self.tags.get_all(parse_key(key)?))
    }

    fn add(&mut self, key: &str, value: &Bound<'_, PyAny>) -> PyResult<()> {
        let values = extract_values(value)?;
        let values: Vec<&str> = values.iter().map(String::as_str).collect();
        self.tags.add_field(parse_key(key)?, &values)?;
        Ok(())
    }

    fn supports(&self, key: &str) -> PyResult<bool> {
        Ok(self.tags.supports(parse_key(key)?))
    }

    /// Frame ids present in the tag.
    fn keys(&self) -> Vec<String> {
        self.tags.frame_ids().map(str::to_string).collect()
    }

    fn __getitem__(&self, key: &str) -> PyResult<Vec<String>> {
        let values = self.tags.get_all(parse_key(key)?);
        if values.is_empty() {
            return Err(PyKeyError::new_err(key.to_string()));
        }
        Ok(values)
    }

    fn __setitem__(&mut self, key: &str, value: &Bound<'_, PyAny>) -> PyResult<()> {
        let values = extract_values(value)?;
        let values: Vec<&str> = values.iter().map(String::as_str).collect();
        self.tags.set_field(parse_key(key)?, &values)?;
        Ok(())
    }

    fn __delitem__(&mut self, key: &str) -> PyResult<()> {
        self.tags.delete_field(parse_key(key)?)?;
        Ok(())
    }

    fn __contains__(&self, key: &str) -> bool {
        parse_key(key).is_ok_and(|key| self.tags.has_field(key))
    }

    fn __len__(&self) -> usize {
        self.tags.frame_count()
    }

    fn __repr__(&self) -> String {
        format!(
            "ID3(version={}, frames={})",
            self.tags.version(),
            self.tags.frame_ids().collect::<Vec<_>>().join(", ")
        )
    }

    fn pprint(&self) -> String {
        self.tags
            .frames()
            .map(|frame| frame.pprint())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn structure(&self) -> String {
        let mut out = self.tags.structure();
        if let Some(v1) = &self.id3v1 {
            out.push_str(&v1.structure());
        }
        out
    }

    /// Render the tag, padding included.
    fn render<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyBytes>> {
        let data = self.tags.write(self.tags.options())?;
        Ok(PyBytes::new(py, &data))
    }

    /// Switch the tag to another ID3v2 version, converting its frames.
    fn convert(&mut self, version: u8) -> PyResult<()> {
        self.tags = self.tags.convert(parse_version(version)?);
        Ok(())
    }

    #[getter]
    fn version(&self) -> (u8, u8) {
        (self.tags.version().major(), 0)
    }

    #[getter]
    fn filename(&self) -> Option<String> {
        self.path.clone()
    }
}

#[pymodule]
fn id3kit(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyID3>()?;
    m.add("FIELD_KEYS", FieldKey::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>())?;
    register_exceptions(m)?;
    Ok(())
}
