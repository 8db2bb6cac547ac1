//! [`TagFields`] for ID3v2 tags.
//!
//! Every mutation is computed first as a list of replacement slots (frame id
//! and the frames it should hold afterwards) and only applied once all of
//! them were built, so errors never leave a half-updated tag. Opaque frames
//! under an affected id are always carried over.

use std::borrow::Cow;

use crate::common::error::{Id3Error, Result};
use crate::field::mapping::{self, FieldTarget};
use crate::field::{check_values, fit_joined, fit_length, FieldKey, TagFields};
use crate::id3::body::FrameBody;
use crate::id3::convert::{merge_timestamp, split_timestamp, INVOLVED_ROLES};
use crate::id3::datatype::FieldValue;
use crate::id3::frames::Frame;
use crate::id3::header::Id3v2Version;
use crate::id3::schema;
use crate::id3::specs::{self, Encoding};
use crate::id3::tags::Id3v2Tag;

/// UFID identifiers are limited to 64 bytes
const UNIQUE_ID_MAX: usize = 64;

type Slot = (&'static str, Vec<Frame>);

fn user_text_id(version: Id3v2Version) -> &'static str {
    match version {
        Id3v2Version::V22 => "TXX",
        _ => "TXXX",
    }
}

fn describes(body: &FrameBody, description: &str) -> bool {
    body.get_text("description") == Some(description)
}

/// Whether `body` holds the value of `target` among frames sharing its id.
fn owns(target: &FieldTarget, body: &FrameBody) -> bool {
    match *target {
        FieldTarget::UserText { description, .. } | FieldTarget::UserUrl { description, .. } => {
            describes(body, description)
        }
        FieldTarget::Described(_) => describes(body, ""),
        FieldTarget::UniqueId { owner, .. } => body.get_text("owner") == Some(owner),
        _ => true,
    }
}

fn is_involved_role(role: &str) -> bool {
    INVOLVED_ROLES.iter().any(|r| r.eq_ignore_ascii_case(role))
}

/// Whether a role/name pair belongs to `target`.
fn selects_pair(target: &FieldTarget, role: &str) -> bool {
    match *target {
        // TMCL only holds musicians; IPLS and IPL share the frame with involved people
        FieldTarget::Performer(id) => id == "TMCL" || !is_involved_role(role),
        FieldTarget::Role { role: wanted, .. } => role.eq_ignore_ascii_case(wanted),
        _ => false,
    }
}

fn pairs_of(body: &FrameBody) -> Vec<(String, String)> {
    let values = body.values();
    if values.len() % 2 != 0 {
        log::warn!("Ignoring an unpaired value in a {} body", body.layout().name);
    }
    values
        .chunks_exact(2)
        .map(|pair| (pair[0].to_string(), pair[1].to_string()))
        .collect()
}

fn join_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .flat_map(|(role, name)| [role.as_str(), name.as_str()])
        .collect::<Vec<_>>()
        .join("\0")
}

fn parse_part(part: Option<&str>) -> Option<u32> {
    part.and_then(|p| p.trim().parse::<u32>().ok()).filter(|&n| n != 0)
}

fn format_number(n: u32) -> String {
    itoa::Buffer::new().format(n).to_string()
}

fn single<'a>(key: FieldKey, values: &[&'a str]) -> Result<&'a str> {
    match values {
        [value] => Ok(*value),
        _ => Err(Id3Error::InvalidArgument(format!(
            "{} takes a single value, got {}",
            key,
            values.len()
        ))),
    }
}

impl Id3v2Tag {
    fn field_target(&self, key: FieldKey) -> Result<FieldTarget> {
        mapping::target(key, self.version()).ok_or_else(|| Id3Error::UnsupportedField {
            key: key.to_string(),
            version: self.version().to_string(),
        })
    }

    fn bodies<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a FrameBody> + 'a {
        self.get_frames(id).into_iter().filter_map(Frame::body)
    }

    /// Encoding for frames created here: the configured default when the
    /// version has it, Latin-1 when the text allows, the version default otherwise.
    fn creation_encoding<'t, I>(&self, texts: I) -> Encoding
    where
        I: IntoIterator<Item = &'t str>,
    {
        let version = self.version();
        if let Some(encoding) = self
            .options()
            .default_encoding
            .filter(|e| e.is_supported(version))
        {
            return encoding;
        }
        if texts.into_iter().all(specs::is_latin1) {
            Encoding::Latin1
        } else {
            Encoding::default_for_version(version)
        }
    }

    /// New frame `id` holding `text` in its main field, plus any other text fields.
    fn build_frame(&self, id: &str, text: &str, fields: &[(&str, &str)]) -> Result<Frame> {
        let mut frame = Frame::new(id, self.version())?;
        let encoding =
            self.creation_encoding(fields.iter().map(|(_, v)| *v).chain(std::iter::once(text)));
        if let Some(body) = frame.body_mut() {
            for (name, value) in fields {
                body.set_text_field(name, value)?;
            }
            body.set_text(text)?;
            if body.get("text_encoding").is_some() {
                body.set_encoding(encoding)?;
            }
        }
        Ok(frame)
    }

    fn unique_id_frame(&self, id: &str, owner: &str, value: &str) -> Result<Frame> {
        let mut frame = Frame::new(id, self.version())?;
        if let Some(body) = frame.body_mut() {
            body.set_text_field("owner", owner)?;
            body.set("identifier", FieldValue::Bytes(value.as_bytes().to_vec()))?;
        }
        Ok(frame)
    }

    fn rating_frame(&self, id: &str, rating: u64) -> Result<Frame> {
        let mut frame = Frame::new(id, self.version())?;
        if let Some(body) = frame.body_mut() {
            body.set("rating", FieldValue::Number(rating))?;
        }
        Ok(frame)
    }

    fn pair_frames(&self, id: &str, pairs: &[(String, String)]) -> Result<Vec<Frame>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![self.build_frame(id, &join_pairs(pairs), &[])?])
    }

    /// Frames under `id` with the readable ones matching `matches` swapped for
    /// `new`, which takes the place of the first of them.
    fn replace_where<F>(&self, id: &str, matches: F, new: Vec<Frame>) -> Vec<Frame>
    where
        F: Fn(&FrameBody) -> bool,
    {
        let mut out = Vec::new();
        let mut new = Some(new);
        for frame in self.get_frames(id) {
            match frame.body() {
                Some(body) if matches(body) => {
                    if let Some(new) = new.take() {
                        out.extend(new);
                    }
                }
                _ => out.push(frame.clone()),
            }
        }
        if let Some(new) = new {
            out.extend(new);
        }
        out
    }

    fn all_pairs(&self, id: &str) -> Vec<(String, String)> {
        self.bodies(id).flat_map(pairs_of).collect()
    }

    /// Number and total of an `n/m` frame, zeros read as absent.
    fn number_pair(&self, id: &str) -> (Option<u32>, Option<u32>) {
        match self.bodies(id).next() {
            Some(body) => {
                let text = body.text();
                let (number, total) = match text.split_once('/') {
                    Some((number, total)) => (Some(number), Some(total)),
                    None => (Some(text), None),
                };
                (parse_part(number), parse_part(total))
            }
            None => (None, None),
        }
    }

    fn first_text(&self, id: &str) -> Option<&str> {
        self.bodies(id).map(FrameBody::text).find(|t| !t.is_empty())
    }

    /// Validate `values` for `target` and bring them into their stored form.
    fn prepare(&self, key: FieldKey, target: FieldTarget, values: &[&str]) -> Result<Vec<String>> {
        check_values(key, values)?;
        let version = self.version();
        let truncate = self.options().truncate_text;
        let fit = |id: &str, value: &str| {
            fit_length(key.as_str(), value, schema::max_text_len(id, version), truncate)
        };

        match target {
            FieldTarget::Text(id) | FieldTarget::Genre(id) | FieldTarget::UserText { id, .. } => {
                let fitted = values.iter().map(|v| fit(id, *v)).collect::<Result<Vec<_>>>()?;
                fit_joined(key.as_str(), &fitted, schema::max_text_len(id, version), truncate)
            }
            FieldTarget::Described(id) | FieldTarget::Role { id, .. } => {
                Ok(vec![fit(id, single(key, values)?)?])
            }
            FieldTarget::Timestamp(id) | FieldTarget::SplitDate { year: id, .. } => {
                let value = single(key, values)?.trim();
                if split_timestamp(value).year.is_none() {
                    return Err(Id3Error::InvalidArgument(format!(
                        "{} does not start with a four digit year",
                        value
                    )));
                }
                match target {
                    FieldTarget::Timestamp(_) => Ok(vec![fit(id, value)?]),
                    _ => Ok(vec![value.to_string()]),
                }
            }
            FieldTarget::Url(_) | FieldTarget::UserUrl { .. } => {
                let value = single(key, values)?;
                if !specs::is_latin1(value) {
                    return Err(Id3Error::InvalidArgument(format!(
                        "{} must be a Latin-1 URL",
                        key
                    )));
                }
                Ok(vec![value.to_string()])
            }
            FieldTarget::NumberPart { .. } => {
                let value = single(key, values)?;
                let number = parse_part(Some(value)).ok_or_else(|| {
                    Id3Error::InvalidArgument(format!("{} is not a positive number", value))
                })?;
                Ok(vec![format_number(number)])
            }
            FieldTarget::Rating(_) => {
                let value = single(key, values)?;
                let rating = value.trim().parse::<u8>().map_err(|_| {
                    Id3Error::InvalidArgument(format!("{} is not a rating between 0 and 255", value))
                })?;
                Ok(vec![format_number(rating as u32)])
            }
            FieldTarget::UniqueId { .. } => Ok(vec![fit_length(
                key.as_str(),
                single(key, values)?,
                UNIQUE_ID_MAX,
                truncate,
            )?]),
            FieldTarget::Performer(id) => {
                let (role, name) = match values {
                    [pair] => pair.split_once('\0').ok_or_else(|| {
                        Id3Error::InvalidArgument(format!(
                            "{} takes a role and a name separated by NUL",
                            key
                        ))
                    })?,
                    [role, name] => (*role, *name),
                    _ => {
                        return Err(Id3Error::InvalidArgument(format!(
                            "{} takes a role and a name, got {} values",
                            key,
                            values.len()
                        )))
                    }
                };
                if role.is_empty() || name.is_empty() {
                    return Err(Id3Error::InvalidArgument(format!(
                        "{} needs both a role and a name",
                        key
                    )));
                }
                if is_involved_role(role) {
                    return Err(Id3Error::InvalidArgument(format!(
                        "{} is an involved-people role, not a performer",
                        role
                    )));
                }
                Ok(vec![fit(id, role)?, fit(id, name)?])
            }
        }
    }

    /// Fresh frames holding prepared `values`, ignoring what the tag holds.
    fn frames_for(&self, target: FieldTarget, values: &[String]) -> Result<Vec<Frame>> {
        let version = self.version();
        let first = values.first().map(String::as_str).unwrap_or_default();
        let frame = match target {
            FieldTarget::Text(id) => self.build_frame(id, &values.join("\0"), &[])?,
            FieldTarget::Genre(id) => {
                let as_text = self.options().write_genres_as_text;
                let encoded = values
                    .iter()
                    .map(|g| specs::encode_genre(g, version, as_text))
                    .collect::<Vec<_>>();
                self.build_frame(id, &encoded.join("\0"), &[])?
            }
            FieldTarget::Timestamp(id) | FieldTarget::Url(id) | FieldTarget::Described(id) => {
                self.build_frame(id, first, &[])?
            }
            FieldTarget::NumberPart { id, total } => {
                let text = if total { format!("0/{}", first) } else { first.to_string() };
                self.build_frame(id, &text, &[])?
            }
            FieldTarget::SplitDate { year, date, time } => {
                let split = split_timestamp(first);
                let mut frames = Vec::new();
                for (id, part) in [(year, split.year), (date, split.date), (time, split.time)] {
                    if let Some(part) = part {
                        frames.push(self.build_frame(id, &part, &[])?);
                    }
                }
                return Ok(frames);
            }
            FieldTarget::UserText { id, description } => {
                self.build_frame(id, &values.join("\0"), &[("description", description)])?
            }
            FieldTarget::UserUrl { id, description } => {
                self.build_frame(id, first, &[("description", description)])?
            }
            FieldTarget::Performer(id) => {
                let pair = (first.to_string(), values.get(1).cloned().unwrap_or_default());
                return self.pair_frames(id, &[pair]);
            }
            FieldTarget::Role { id, role } => {
                return self.pair_frames(id, &[(role.to_string(), first.to_string())]);
            }
            FieldTarget::UniqueId { id, owner } => self.unique_id_frame(id, owner, first)?,
            FieldTarget::Rating(id) => {
                self.rating_frame(id, first.parse::<u64>().unwrap_or_default())?
            }
        };
        Ok(vec![frame])
    }

    fn new_pair(target: FieldTarget, values: &[String]) -> (String, String) {
        let first = values.first().cloned().unwrap_or_default();
        match target {
            FieldTarget::Role { role, .. } => (role.to_string(), first),
            _ => (first, values.get(1).cloned().unwrap_or_default()),
        }
    }

    fn set_changes(&self, target: FieldTarget, values: &[String]) -> Result<Vec<Slot>> {
        let first = values.first().map(String::as_str).unwrap_or_default();
        match target {
            FieldTarget::NumberPart { id, total } => {
                let (number, current_total) = self.number_pair(id);
                let text = match (total, number, current_total) {
                    (true, number, _) => format!("{}/{}", number.unwrap_or(0), first),
                    (false, _, Some(current_total)) => format!("{}/{}", first, current_total),
                    (false, _, None) => first.to_string(),
                };
                let frame = self.build_frame(id, &text, &[])?;
                Ok(vec![(id, self.replace_where(id, |_| true, vec![frame]))])
            }
            FieldTarget::SplitDate { year, date, time } => {
                let split = split_timestamp(first);
                let mut slots = Vec::new();
                for (id, part) in [(year, split.year), (date, split.date), (time, split.time)] {
                    let frames = match part {
                        Some(part) => vec![self.build_frame(id, &part, &[])?],
                        None => Vec::new(),
                    };
                    slots.push((id, self.replace_where(id, |_| true, frames)));
                }
                Ok(slots)
            }
            FieldTarget::Performer(id) | FieldTarget::Role { id, .. } => {
                let (new_role, new_name) = Self::new_pair(target, values);
                let mut pairs = self.all_pairs(id);
                // Setting a performer replaces that instrument only, a role key replaces its role
                pairs.retain(|(role, _)| !role.eq_ignore_ascii_case(&new_role));
                pairs.push((new_role, new_name));
                let frames = self.pair_frames(id, &pairs)?;
                Ok(vec![(id, self.replace_where(id, |_| true, frames))])
            }
            _ => {
                let frames = self.frames_for(target, values)?;
                let id = target.frame_ids()[0];
                Ok(vec![(id, self.replace_where(id, |b| owns(&target, b), frames))])
            }
        }
    }

    fn add_changes(
        &self,
        key: FieldKey,
        target: FieldTarget,
        values: &[String],
    ) -> Result<Vec<Slot>> {
        match target {
            FieldTarget::Text(id) | FieldTarget::Genre(id) | FieldTarget::UserText { id, .. } => {
                let mut all: Vec<String> = self
                    .bodies(id)
                    .filter(|b| owns(&target, b))
                    .flat_map(|b| b.values())
                    .map(str::to_string)
                    .collect();
                if all.is_empty() {
                    return self.set_changes(target, values);
                }
                // Existing values are kept as stored; only the new ones are encoded
                let new_frames = self.frames_for(target, values)?;
                if let Some(text) = new_frames.first().and_then(Frame::body).map(FrameBody::text) {
                    all.extend(text.split('\0').map(str::to_string));
                }
                let max = schema::max_text_len(id, self.version());
                let all = fit_joined(key.as_str(), &all, max, self.options().truncate_text)?;
                let extra: Vec<(&str, &str)> = match target {
                    FieldTarget::UserText { description, .. } => vec![("description", description)],
                    _ => Vec::new(),
                };
                let frame = self.build_frame(id, &all.join("\0"), &extra)?;
                Ok(vec![(id, self.replace_where(id, |b| owns(&target, b), vec![frame]))])
            }
            FieldTarget::Url(id) | FieldTarget::UserUrl { id, .. } | FieldTarget::Described(id) => {
                let mut frames: Vec<Frame> = self.get_frames(id).into_iter().cloned().collect();
                frames.extend(self.frames_for(target, values)?);
                Ok(vec![(id, frames)])
            }
            FieldTarget::Performer(id) | FieldTarget::Role { id, .. } => {
                let mut pairs = self.all_pairs(id);
                pairs.push(Self::new_pair(target, values));
                let frames = self.pair_frames(id, &pairs)?;
                Ok(vec![(id, self.replace_where(id, |_| true, frames))])
            }
            _ => self.set_changes(target, values),
        }
    }

    fn delete_changes(&self, target: FieldTarget) -> Result<Vec<Slot>> {
        match target {
            FieldTarget::NumberPart { id, total } => {
                let (number, current_total) = self.number_pair(id);
                let text = match (total, number, current_total) {
                    (true, Some(number), _) => Some(format_number(number)),
                    (false, _, Some(current_total)) => Some(format!("0/{}", current_total)),
                    _ => None,
                };
                let frames = match text {
                    Some(text) => vec![self.build_frame(id, &text, &[])?],
                    None => Vec::new(),
                };
                Ok(vec![(id, self.replace_where(id, |_| true, frames))])
            }
            FieldTarget::Performer(id) | FieldTarget::Role { id, .. } => {
                let mut pairs = self.all_pairs(id);
                pairs.retain(|(role, _)| !selects_pair(&target, role));
                let frames = self.pair_frames(id, &pairs)?;
                Ok(vec![(id, self.replace_where(id, |_| true, frames))])
            }
            _ => Ok(target
                .frame_ids()
                .into_iter()
                .map(|id| (id, self.replace_where(id, |b| owns(&target, b), Vec::new())))
                .collect()),
        }
    }

    fn apply(&mut self, slots: Vec<Slot>) {
        for (id, frames) in slots {
            self.replace_slot(id, frames);
        }
    }

    /// Value of the user text frame with `description`.
    pub fn user_text(&self, description: &str) -> Option<String> {
        self.bodies(user_text_id(self.version()))
            .find(|b| describes(b, description))
            .map(|b| b.text().to_string())
    }

    /// Store `value` in the user text frame with `description`, replacing it if present.
    pub fn set_user_text(&mut self, description: &str, value: &str) -> Result<()> {
        if value.is_empty() {
            return Err(Id3Error::InvalidArgument(format!(
                "empty value given for user text {}",
                description
            )));
        }
        let id = user_text_id(self.version());
        let value = fit_length(
            description,
            value,
            schema::max_text_len(id, self.version()),
            self.options().truncate_text,
        )?;
        let frame = self.build_frame(id, &value, &[("description", description)])?;
        let frames = self.replace_where(id, |b| describes(b, description), vec![frame]);
        self.replace_slot(id, frames);
        Ok(())
    }

    /// Remove the user text frames with `description`, returning how many there were.
    pub fn remove_user_text(&mut self, description: &str) -> usize {
        let id = user_text_id(self.version());
        let before = self.get_frames(id).len();
        let frames = self.replace_where(id, |b| describes(b, description), Vec::new());
        let removed = before - frames.len();
        self.replace_slot(id, frames);
        removed
    }
}

impl TagFields for Id3v2Tag {
    type Field = Vec<Frame>;

    fn supports(&self, key: FieldKey) -> bool {
        mapping::target(key, self.version()).is_some()
    }

    fn create_field(&self, key: FieldKey, values: &[&str]) -> Result<Vec<Frame>> {
        let target = self.field_target(key)?;
        let values = self.prepare(key, target, values)?;
        self.frames_for(target, &values)
    }

    fn set_field(&mut self, key: FieldKey, values: &[&str]) -> Result<()> {
        let target = self.field_target(key)?;
        let values = self.prepare(key, target, values)?;
        let slots = self.set_changes(target, &values)?;
        self.apply(slots);
        Ok(())
    }

    fn add_field(&mut self, key: FieldKey, values: &[&str]) -> Result<()> {
        let target = self.field_target(key)?;
        let values = self.prepare(key, target, values)?;
        let slots = self.add_changes(key, target, &values)?;
        self.apply(slots);
        Ok(())
    }

    fn delete_field(&mut self, key: FieldKey) -> Result<()> {
        let target = self.field_target(key)?;
        let slots = self.delete_changes(target)?;
        self.apply(slots);
        Ok(())
    }

    fn get_all(&self, key: FieldKey) -> Vec<String> {
        let Some(target) = mapping::target(key, self.version()) else {
            return Vec::new();
        };
        let owned = |id: &'static str| self.bodies(id).filter(move |b| owns(&target, b));

        match target {
            FieldTarget::Text(id) | FieldTarget::Timestamp(id) | FieldTarget::UserText { id, .. } => {
                owned(id)
                    .flat_map(|b| b.values())
                    .map(str::to_string)
                    .collect()
            }
            FieldTarget::Genre(id) => owned(id)
                .flat_map(|b| b.values())
                .flat_map(specs::parse_genre)
                .collect(),
            FieldTarget::NumberPart { id, total } => {
                let (number, current_total) = self.number_pair(id);
                let part = if total { current_total } else { number };
                part.map(format_number).into_iter().collect()
            }
            FieldTarget::SplitDate { year, date, time } => {
                merge_timestamp(self.first_text(year), self.first_text(date), self.first_text(time))
                    .into_iter()
                    .collect()
            }
            FieldTarget::Url(id) | FieldTarget::UserUrl { id, .. } | FieldTarget::Described(id) => {
                owned(id)
                    .map(FrameBody::text)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            }
            FieldTarget::Performer(id) | FieldTarget::Role { id, .. } => self
                .all_pairs(id)
                .into_iter()
                .filter(|(role, _)| selects_pair(&target, role))
                .map(|(role, name)| match target {
                    FieldTarget::Role { .. } => name,
                    _ => format!("{}\0{}", role, name),
                })
                .collect(),
            FieldTarget::UniqueId { id, .. } => owned(id)
                .filter_map(|b| b.get("identifier").and_then(FieldValue::as_bytes))
                .map(|bytes| String::from_utf8_lossy(bytes))
                .map(Cow::into_owned)
                .collect(),
            FieldTarget::Rating(id) => owned(id)
                .filter_map(|b| b.get_number("rating"))
                .map(|n| format_number(n as u32))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::TagOptions;

    const V22: Id3v2Version = Id3v2Version::V22;
    const V23: Id3v2Version = Id3v2Version::V23;
    const V24: Id3v2Version = Id3v2Version::V24;

    #[test]
    fn text_values_in_order() {
        let mut tag = Id3v2Tag::new(V24);
        tag.set_field(FieldKey::Artist, &["A"]).unwrap();
        tag.add_field(FieldKey::Artist, &["B"]).unwrap();
        tag.add_field(FieldKey::Artist, &["C"]).unwrap();
        assert_eq!(tag.get_field_count(FieldKey::Artist), 3);
        assert_eq!(tag.get_field_at(FieldKey::Artist, 1).as_deref(), Some("B"));
        assert_eq!(tag.get_frames("TPE1").len(), 1);
        assert_eq!(tag.get_frame("TPE1").unwrap().text_value(), "A\0B\0C");

        tag.set_field(FieldKey::Artist, &["D"]).unwrap();
        assert_eq!(tag.get_all(FieldKey::Artist), vec!["D"]);
        tag.delete_field(FieldKey::Artist).unwrap();
        assert!(!tag.has_field(FieldKey::Artist));
        assert!(tag.is_empty());
    }

    #[test]
    fn contract_errors_leave_tag_untouched() {
        let mut tag = Id3v2Tag::new(V22);
        tag.set_field(FieldKey::Title, &["Song"]).unwrap();
        let before = tag.clone();

        assert!(matches!(
            tag.set_field(FieldKey::Mood, &["Calm"]),
            Err(Id3Error::UnsupportedField { .. })
        ));
        assert!(matches!(
            tag.set_field(FieldKey::Title, &[""]),
            Err(Id3Error::InvalidArgument(_))
        ));
        assert!(matches!(
            tag.set_field(FieldKey::Track, &["seven"]),
            Err(Id3Error::InvalidArgument(_))
        ));
        assert!(matches!(
            tag.set_field(FieldKey::Year, &["06/30"]),
            Err(Id3Error::InvalidArgument(_))
        ));
        assert!(!tag.supports(FieldKey::Mood));
        assert_eq!(tag, before);
    }

    #[test]
    fn track_and_total_share_a_frame() {
        let mut tag = Id3v2Tag::new(V23);
        tag.set_field(FieldKey::TrackTotal, &["10"]).unwrap();
        assert_eq!(tag.get_frame("TRCK").unwrap().text_value(), "0/10");
        assert_eq!(tag.get_first(FieldKey::Track), None);

        tag.set_field(FieldKey::Track, &["3"]).unwrap();
        assert_eq!(tag.get_frame("TRCK").unwrap().text_value(), "3/10");
        assert_eq!(tag.get_first(FieldKey::TrackTotal).as_deref(), Some("10"));

        tag.delete_field(FieldKey::Track).unwrap();
        assert_eq!(tag.get_frame("TRCK").unwrap().text_value(), "0/10");
        tag.delete_field(FieldKey::TrackTotal).unwrap();
        assert!(tag.get_frame("TRCK").is_none());
    }

    #[test]
    fn year_splits_below_v24() {
        let mut tag = Id3v2Tag::new(V23);
        tag.set_field(FieldKey::Year, &["2006-06-30T12:34"]).unwrap();
        assert_eq!(tag.get_frame("TYER").unwrap().text_value(), "2006");
        assert_eq!(tag.get_frame("TDAT").unwrap().text_value(), "3006");
        assert_eq!(tag.get_frame("TIME").unwrap().text_value(), "1234");
        assert_eq!(tag.get_first(FieldKey::Year).as_deref(), Some("2006-06-30T12:34"));

        tag.set_field(FieldKey::Year, &["2007"]).unwrap();
        assert!(tag.get_frame("TDAT").is_none());
        assert!(tag.get_frame("TIME").is_none());
        assert_eq!(tag.get_first(FieldKey::Year).as_deref(), Some("2007"));

        let mut v24 = Id3v2Tag::new(V24);
        v24.set_field(FieldKey::Year, &["2006-06"]).unwrap();
        assert_eq!(v24.get_frame("TDRC").unwrap().text_value(), "2006-06");
    }

    #[test]
    fn performers_and_roles_share_ipls() {
        let mut tag = Id3v2Tag::new(V23);
        tag.add_field(FieldKey::Performer, &["guitar", "Ann"]).unwrap();
        tag.add_field(FieldKey::Performer, &["drums\0Bob"]).unwrap();
        tag.set_field(FieldKey::Producer, &["Cid"]).unwrap();

        assert_eq!(
            tag.get_all(FieldKey::Performer),
            vec!["guitar\0Ann", "drums\0Bob"]
        );
        assert_eq!(tag.get_field_at(FieldKey::Performer, 1).as_deref(), Some("drums\0Bob"));
        assert_eq!(tag.get_all(FieldKey::Producer), vec!["Cid"]);
        assert_eq!(
            tag.get_frame("IPLS").unwrap().text_value(),
            "guitar\0Ann\0drums\0Bob\0producer\0Cid"
        );

        tag.delete_field(FieldKey::Performer).unwrap();
        assert_eq!(tag.get_field_count(FieldKey::Performer), 0);
        assert_eq!(tag.get_all(FieldKey::Producer), vec!["Cid"]);
        tag.delete_field(FieldKey::Producer).unwrap();
        assert!(tag.get_frame("IPLS").is_none());

        assert!(matches!(
            tag.add_field(FieldKey::Performer, &["producer", "Dan"]),
            Err(Id3Error::InvalidArgument(_))
        ));
        assert!(matches!(
            tag.add_field(FieldKey::Performer, &["no separator"]),
            Err(Id3Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn v24_roles_live_in_tipl() {
        let mut tag = Id3v2Tag::new(V24);
        tag.add_field(FieldKey::Mixer, &["Eve"]).unwrap();
        tag.add_field(FieldKey::Performer, &["piano", "Fay"]).unwrap();
        assert_eq!(tag.get_frame("TIPL").unwrap().text_value(), "mix\0Eve");
        assert_eq!(tag.get_frame("TMCL").unwrap().text_value(), "piano\0Fay");
    }

    #[test]
    fn setting_a_performer_replaces_only_that_instrument() {
        let mut tag = Id3v2Tag::new(V24);
        tag.set_field(FieldKey::Performer, &["violinist\0Nigel Kennedy"]).unwrap();
        tag.set_field(FieldKey::Performer, &["harpist\0Gloria Divosky"]).unwrap();
        assert_eq!(tag.get_frames("TMCL").len(), 1);
        assert_eq!(
            tag.get_all(FieldKey::Performer),
            vec!["violinist\0Nigel Kennedy", "harpist\0Gloria Divosky"]
        );

        tag.set_field(FieldKey::Performer, &["Violinist", "Anne"]).unwrap();
        assert_eq!(
            tag.get_all(FieldKey::Performer),
            vec!["harpist\0Gloria Divosky", "Violinist\0Anne"]
        );

        let mut v23 = Id3v2Tag::new(V23);
        v23.set_field(FieldKey::Producer, &["Cid"]).unwrap();
        v23.set_field(FieldKey::Performer, &["guitar", "Ann"]).unwrap();
        v23.set_field(FieldKey::Performer, &["drums", "Bob"]).unwrap();
        v23.set_field(FieldKey::Producer, &["Dee"]).unwrap();
        assert_eq!(
            v23.get_frame("IPLS").unwrap().text_value(),
            "guitar\0Ann\0drums\0Bob\0producer\0Dee"
        );
    }

    #[test]
    fn genres() {
        let mut tag = Id3v2Tag::new(V23);
        tag.set_field(FieldKey::Genre, &["Rock", "Chiptune"]).unwrap();
        assert_eq!(tag.get_all(FieldKey::Genre), vec!["Rock", "Chiptune"]);

        let options = TagOptions::default().write_genres_as_text(false);
        let mut coded = Id3v2Tag::with_options(V23, options);
        coded.set_field(FieldKey::Genre, &["Rock"]).unwrap();
        assert_eq!(coded.get_frame("TCON").unwrap().text_value(), "(17)");
        coded.add_field(FieldKey::Genre, &["Jazz"]).unwrap();
        assert_eq!(coded.get_all(FieldKey::Genre), vec!["Rock", "Jazz"]);
    }

    #[test]
    fn comments_keep_described_frames() {
        let mut tag = Id3v2Tag::new(V24);
        let mut described = Frame::new("COMM", V24).unwrap();
        let body = described.body_mut().unwrap();
        body.set_text_field("description", "iTunNORM").unwrap();
        body.set_text("0000").unwrap();
        tag.add_frame(described).unwrap();

        tag.set_field(FieldKey::Comment, &["first"]).unwrap();
        tag.add_field(FieldKey::Comment, &["second"]).unwrap();
        assert_eq!(tag.get_all(FieldKey::Comment), vec!["first", "second"]);
        assert_eq!(tag.get_frames("COMM").len(), 3);

        tag.delete_field(FieldKey::Comment).unwrap();
        assert_eq!(tag.get_frames("COMM").len(), 1);
        assert!(tag.get_frame("COMM:iTunNORM:eng").is_some());
    }

    #[test]
    fn official_artist_urls_repeat() {
        let mut tag = Id3v2Tag::new(V23);
        tag.add_field(FieldKey::UrlOfficialArtistSite, &["http://a.example"]).unwrap();
        tag.add_field(FieldKey::UrlOfficialArtistSite, &["http://b.example"]).unwrap();
        assert_eq!(tag.get_frames("WOAR").len(), 2);
        assert_eq!(tag.get_field_count(FieldKey::UrlOfficialArtistSite), 2);
        assert!(tag
            .set_field(FieldKey::UrlOfficialArtistSite, &["http://\u{263A}.example"])
            .is_err());
    }

    #[test]
    fn user_frames_by_description() {
        let mut tag = Id3v2Tag::new(V24);
        tag.set_field(FieldKey::Barcode, &["0123"]).unwrap();
        tag.set_field(FieldKey::CatalogNo, &["CAT-1"]).unwrap();
        tag.set_field(FieldKey::UrlDiscogsReleaseSite, &["http://d.example"]).unwrap();
        assert_eq!(tag.get_frame("TXXX:BARCODE").unwrap().text_value(), "0123");
        assert_eq!(tag.get_first(FieldKey::CatalogNo).as_deref(), Some("CAT-1"));
        assert_eq!(
            tag.get_first(FieldKey::UrlDiscogsReleaseSite).as_deref(),
            Some("http://d.example")
        );

        tag.set_user_text("custom", "value").unwrap();
        assert_eq!(tag.user_text("custom").as_deref(), Some("value"));
        assert_eq!(tag.remove_user_text("custom"), 1);
        assert_eq!(tag.get_frames("TXXX").len(), 2);

        tag.delete_field(FieldKey::Barcode).unwrap();
        assert_eq!(tag.get_first(FieldKey::CatalogNo).as_deref(), Some("CAT-1"));
        assert_eq!(tag.get_frames("TXXX").len(), 1);
    }

    #[test]
    fn mood_is_user_text_in_v23() {
        let mut tag = Id3v2Tag::new(V23);
        tag.set_field(FieldKey::Mood, &["Calm"]).unwrap();
        assert_eq!(tag.user_text("MOOD").as_deref(), Some("Calm"));
    }

    #[test]
    fn unique_id_and_rating() {
        let mut tag = Id3v2Tag::new(V24);
        tag.set_field(FieldKey::MusicbrainzTrackId, &["f0e1d2"]).unwrap();
        tag.set_field(FieldKey::Rating, &["196"]).unwrap();
        assert_eq!(tag.get_first(FieldKey::MusicbrainzTrackId).as_deref(), Some("f0e1d2"));
        assert_eq!(tag.get_first(FieldKey::Rating).as_deref(), Some("196"));
        assert!(tag.get_frame("UFID:http://musicbrainz.org").is_some());
        assert!(matches!(
            tag.set_field(FieldKey::Rating, &["300"]),
            Err(Id3Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn length_limits() {
        let mut tag = Id3v2Tag::new(V24);
        assert!(matches!(
            tag.set_field(FieldKey::Key, &["C#min"]),
            Err(Id3Error::FieldLengthExceeded { max: 3, .. })
        ));
        assert!(!tag.has_field(FieldKey::Key));

        tag.set_options(TagOptions::default().truncate_text(true));
        tag.set_field(FieldKey::Key, &["C#min"]).unwrap();
        assert_eq!(tag.get_first(FieldKey::Key).as_deref(), Some("C#m"));
    }

    #[test]
    fn length_limit_covers_every_value_of_a_frame() {
        let mut tag = Id3v2Tag::new(V24);
        assert!(matches!(
            tag.set_field(FieldKey::Key, &["C", "Dm"]),
            Err(Id3Error::FieldLengthExceeded { length: 4, max: 3, .. })
        ));
        assert!(!tag.has_field(FieldKey::Key));

        tag.set_field(FieldKey::Key, &["C"]).unwrap();
        assert!(matches!(
            tag.add_field(FieldKey::Key, &["Dm"]),
            Err(Id3Error::FieldLengthExceeded { .. })
        ));
        assert_eq!(tag.get_all(FieldKey::Key), vec!["C"]);

        tag.set_options(TagOptions::default().truncate_text(true));
        tag.set_field(FieldKey::Key, &["C", "Dm"]).unwrap();
        assert_eq!(tag.get_all(FieldKey::Key), vec!["C", "D"]);
        assert_eq!(tag.get_frame("TKEY").unwrap().text_value(), "C\0D");
    }

    #[test]
    fn created_frame_encoding() {
        let mut tag = Id3v2Tag::new(V23);
        let frames = tag.create_field(FieldKey::Title, &["Plain"]).unwrap();
        assert_eq!(frames[0].body().unwrap().encoding(), Encoding::Latin1);
        let frames = tag.create_field(FieldKey::Title, &["\u{263A}"]).unwrap();
        assert_eq!(frames[0].body().unwrap().encoding(), Encoding::Utf16);
        assert!(!tag.has_field(FieldKey::Title));

        tag.set_options(TagOptions::default().default_encoding(Some(Encoding::Utf8)));
        let frames = tag.create_field(FieldKey::Title, &["\u{263A}"]).unwrap();
        assert_eq!(frames[0].body().unwrap().encoding(), Encoding::Utf16);

        let v24 = Id3v2Tag::with_options(V24, *tag.options());
        let frames = v24.create_field(FieldKey::Title, &["Plain"]).unwrap();
        assert_eq!(frames[0].body().unwrap().encoding(), Encoding::Utf8);
    }

    #[test]
    fn opaque_frames_survive_set() {
        let mut tag = Id3v2Tag::new(V24);
        tag.add_frame(Frame::unsupported("TIT2", vec![1, 2, 3])).unwrap();
        tag.set_field(FieldKey::Title, &["Readable"]).unwrap();
        assert_eq!(tag.get_frames("TIT2").len(), 2);
        assert_eq!(tag.get_first(FieldKey::Title).as_deref(), Some("Readable"));
        tag.delete_field(FieldKey::Title).unwrap();
        assert_eq!(tag.get_frames("TIT2").len(), 1);
    }
}
