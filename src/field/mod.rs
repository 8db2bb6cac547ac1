//! Version-independent access to tag fields.
//!
//! A [`FieldKey`] names a metadata concept (`ARTIST`, `TRACK`, `PERFORMER`)
//! and each tag type decides which frames or slots hold it. Getters answer
//! with `Option`/`Vec`; mutators validate every value first and only then
//! touch the tag, so a failed call leaves it unchanged.

pub mod id3v1;
pub mod id3v2;
pub mod key;
pub mod mapping;

pub use key::FieldKey;
pub use mapping::FieldTarget;

use crate::common::error::Result;

/// Generic field API shared by ID3v2 and ID3v1 tags.
///
/// Paired keys (`PERFORMER`) take either one `role\0name` value or a role and
/// a name, and read back as `role\0name`.
pub trait TagFields {
    /// What [`create_field`](TagFields::create_field) builds: frames for ID3v2,
    /// the fitted value for ID3v1.
    type Field;

    /// Whether this tag can hold `key` at all.
    fn supports(&self, key: FieldKey) -> bool;

    /// Validate `values` for `key` and build what would be stored, without
    /// storing it.
    fn create_field(&self, key: FieldKey, values: &[&str]) -> Result<Self::Field>;

    /// Replace whatever `key` holds with `values`.
    fn set_field(&mut self, key: FieldKey, values: &[&str]) -> Result<()>;

    /// Append `values` to `key`. Keys holding a single value behave like
    /// [`set_field`](TagFields::set_field).
    fn add_field(&mut self, key: FieldKey, values: &[&str]) -> Result<()>;

    /// Remove every value of `key`.
    fn delete_field(&mut self, key: FieldKey) -> Result<()>;

    /// Every value of `key`, in storage order.
    fn get_all(&self, key: FieldKey) -> Vec<String>;

    fn get_first(&self, key: FieldKey) -> Option<String> {
        self.get_all(key).into_iter().next()
    }

    fn get_field_at(&self, key: FieldKey, index: usize) -> Option<String> {
        self.get_all(key).into_iter().nth(index)
    }

    fn get_field_count(&self, key: FieldKey) -> usize {
        self.get_all(key).len()
    }

    fn has_field(&self, key: FieldKey) -> bool {
        self.get_field_count(key) > 0
    }
}

/// Reject empty input before anything is looked up.
pub(crate) fn check_values(key: FieldKey, values: &[&str]) -> Result<()> {
    use crate::common::error::Id3Error;

    if values.is_empty() {
        return Err(Id3Error::InvalidArgument(format!("no value given for {}", key)));
    }
    if values.iter().any(|v| v.is_empty()) {
        return Err(Id3Error::InvalidArgument(format!("empty value given for {}", key)));
    }
    Ok(())
}

/// Fit `value` into `max` characters, or fail when truncation is off.
pub(crate) fn fit_length(field: &str, value: &str, max: usize, truncate: bool) -> Result<String> {
    let length = value.chars().count();
    if length <= max {
        return Ok(value.to_string());
    }
    if truncate {
        log::debug!("Truncating {} from {} to {} characters", field, length, max);
        return Ok(value.chars().take(max).collect());
    }
    Err(crate::common::error::Id3Error::FieldLengthExceeded {
        field: field.to_string(),
        length,
        max,
    })
}

/// Fit values that are stored NUL-joined in one frame, the limit applying to
/// the joined text.
pub(crate) fn fit_joined(
    field: &str,
    values: &[String],
    max: usize,
    truncate: bool,
) -> Result<Vec<String>> {
    let joined = values.join("\0");
    let fitted = fit_length(field, &joined, max, truncate)?;
    if fitted.len() == joined.len() {
        return Ok(values.to_vec());
    }
    Ok(fitted
        .trim_end_matches('\0')
        .split('\0')
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::Id3Error;

    #[test]
    fn empty_values_are_rejected() {
        assert!(check_values(FieldKey::Title, &["x"]).is_ok());
        assert!(matches!(
            check_values(FieldKey::Title, &[]),
            Err(Id3Error::InvalidArgument(_))
        ));
        assert!(matches!(
            check_values(FieldKey::Title, &["a", ""]),
            Err(Id3Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn length_policy() {
        assert_eq!(fit_length("KEY", "Abm", 3, false).unwrap(), "Abm");
        assert_eq!(fit_length("KEY", "C#min", 3, true).unwrap(), "C#m");
        let err = fit_length("KEY", "C#min", 3, false).unwrap_err();
        assert!(matches!(err, Id3Error::FieldLengthExceeded { length: 5, max: 3, .. }));
    }

    #[test]
    fn joined_length_policy() {
        let values = vec!["AB".to_string(), "C".to_string()];
        assert_eq!(fit_joined("KEY", &values, 4, false).unwrap(), values);
        assert!(fit_joined("KEY", &values, 3, false).is_err());
        assert_eq!(fit_joined("KEY", &values, 3, true).unwrap(), vec!["AB"]);
    }
}
