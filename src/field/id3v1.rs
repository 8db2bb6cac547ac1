//! [`TagFields`] for ID3v1 tags: seven fixed slots, one value each.

use crate::common::error::{Id3Error, Result};
use crate::field::{check_values, fit_length, FieldKey, TagFields};
use crate::id3::id3v1::{
    Id3v1Tag, ALBUM_LEN, ARTIST_LEN, COMMENT_V11_LEN, TITLE_LEN, YEAR_LEN,
};
use crate::id3::specs::{self, GENRES};

fn unsupported(key: FieldKey) -> Id3Error {
    Id3Error::UnsupportedField {
        key: key.to_string(),
        version: "ID3v1".to_string(),
    }
}

/// Genre name for a name or an index into the ID3v1 list.
fn resolve_genre(value: &str) -> Option<u8> {
    let value = value.trim();
    match value.parse::<usize>() {
        Ok(idx) if idx < GENRES.len() => Some(idx as u8),
        Ok(_) => None,
        Err(_) => specs::genre_index(value),
    }
}

impl TagFields for Id3v1Tag {
    type Field = String;

    fn supports(&self, key: FieldKey) -> bool {
        matches!(
            key,
            FieldKey::Title
                | FieldKey::Artist
                | FieldKey::Album
                | FieldKey::Year
                | FieldKey::Comment
                | FieldKey::Track
                | FieldKey::Genre
        )
    }

    /// The value as it would be stored.
    fn create_field(&self, key: FieldKey, values: &[&str]) -> Result<String> {
        if !self.supports(key) {
            return Err(unsupported(key));
        }
        check_values(key, values)?;
        let value = match values {
            [value] => *value,
            _ => {
                return Err(Id3Error::InvalidArgument(format!(
                    "{} takes a single value in ID3v1",
                    key
                )))
            }
        };
        let truncate = self.options().truncate_text;
        let fit = |max: usize| fit_length(key.as_str(), value, max, truncate);

        match key {
            FieldKey::Title => fit(TITLE_LEN),
            FieldKey::Artist => fit(ARTIST_LEN),
            FieldKey::Album => fit(ALBUM_LEN),
            FieldKey::Year => fit(YEAR_LEN),
            FieldKey::Comment => fit(self.comment_len()),
            FieldKey::Track => match value.trim().parse::<u8>() {
                Ok(track) if track > 0 => Ok(itoa::Buffer::new().format(track).to_string()),
                _ => Err(Id3Error::InvalidArgument(format!(
                    "{} is not a track number between 1 and 255",
                    value
                ))),
            },
            FieldKey::Genre => resolve_genre(value)
                .and_then(|idx| GENRES.get(idx as usize))
                .map(|name| (*name).to_string())
                .ok_or_else(|| {
                    Id3Error::InvalidArgument(format!("{} is not an ID3v1 genre", value))
                }),
            _ => Err(unsupported(key)),
        }
    }

    fn set_field(&mut self, key: FieldKey, values: &[&str]) -> Result<()> {
        let value = self.create_field(key, values)?;
        match key {
            FieldKey::Title => self.title = value,
            FieldKey::Artist => self.artist = value,
            FieldKey::Album => self.album = value,
            FieldKey::Year => self.year = value,
            FieldKey::Comment => self.comment = value,
            FieldKey::Track => {
                // The track number takes the last two bytes of the comment slot
                let comment = fit_length(
                    FieldKey::Comment.as_str(),
                    &self.comment,
                    COMMENT_V11_LEN,
                    self.options().truncate_text,
                )?;
                self.comment = comment;
                self.track = value.parse::<u8>().ok();
            }
            FieldKey::Genre => self.genre = specs::genre_index(&value),
            _ => return Err(unsupported(key)),
        }
        Ok(())
    }

    fn add_field(&mut self, key: FieldKey, values: &[&str]) -> Result<()> {
        self.set_field(key, values)
    }

    fn delete_field(&mut self, key: FieldKey) -> Result<()> {
        match key {
            FieldKey::Title => self.title.clear(),
            FieldKey::Artist => self.artist.clear(),
            FieldKey::Album => self.album.clear(),
            FieldKey::Year => self.year.clear(),
            FieldKey::Comment => self.comment.clear(),
            FieldKey::Track => self.track = None,
            FieldKey::Genre => self.genre = None,
            _ => return Err(unsupported(key)),
        }
        Ok(())
    }

    fn get_all(&self, key: FieldKey) -> Vec<String> {
        let value = match key {
            FieldKey::Title => Some(self.title.clone()),
            FieldKey::Artist => Some(self.artist.clone()),
            FieldKey::Album => Some(self.album.clone()),
            FieldKey::Year => Some(self.year.clone()),
            FieldKey::Comment => Some(self.comment.clone()),
            FieldKey::Track => self.track.map(|t| itoa::Buffer::new().format(t).to_string()),
            FieldKey::Genre => self.genre_name().map(str::to_string),
            _ => None,
        };
        value.into_iter().filter(|v| !v.is_empty()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::TagOptions;

    #[test]
    fn slots_and_limits() {
        let mut tag = Id3v1Tag::new();
        tag.set_field(FieldKey::Title, &["Song"]).unwrap();
        tag.set_field(FieldKey::Genre, &["rock"]).unwrap();
        assert_eq!(tag.get_first(FieldKey::Title).as_deref(), Some("Song"));
        assert_eq!(tag.get_first(FieldKey::Genre).as_deref(), Some("Rock"));
        assert_eq!(tag.genre, Some(17));

        assert!(matches!(
            tag.set_field(FieldKey::Title, &["x".repeat(31).as_str()]),
            Err(Id3Error::FieldLengthExceeded { max: 30, .. })
        ));
        assert!(matches!(
            tag.set_field(FieldKey::Composer, &["Someone"]),
            Err(Id3Error::UnsupportedField { .. })
        ));
        assert!(matches!(
            tag.set_field(FieldKey::Genre, &["Not A Genre"]),
            Err(Id3Error::InvalidArgument(_))
        ));
        assert_eq!(tag.get_first(FieldKey::Title).as_deref(), Some("Song"));
        assert!(!tag.supports(FieldKey::Performer));
    }

    #[test]
    fn track_takes_comment_room() {
        let mut tag = Id3v1Tag::new();
        tag.set_field(FieldKey::Comment, &["c".repeat(30).as_str()]).unwrap();
        assert!(matches!(
            tag.set_field(FieldKey::Track, &["5"]),
            Err(Id3Error::FieldLengthExceeded { max: 28, .. })
        ));
        assert_eq!(tag.track, None);

        tag.set_options(TagOptions::default().truncate_text(true));
        tag.set_field(FieldKey::Track, &["5"]).unwrap();
        assert_eq!(tag.comment.len(), 28);
        assert_eq!(tag.get_first(FieldKey::Track).as_deref(), Some("5"));
        assert!(tag.set_field(FieldKey::Track, &["0"]).is_err());

        tag.delete_field(FieldKey::Track).unwrap();
        assert!(!tag.has_field(FieldKey::Track));
    }
}
