//! Score documents and merge patches

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

use super::participant::Participant;

/// A photo uploaded to one of the prompt slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntry {
    /// Public URL returned by the upload service
    pub url: String,
    /// Upload timestamp (Unix ms)
    pub timestamp: i64,
    /// Prompt the photo answers
    pub prompt_label: String,
}

/// The persisted per-participant document.
///
/// Missing fields deserialize to their defaults, so a freshly created or
/// partially written document reads as zero hearts and no images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    #[serde(default)]
    pub hearts: u64,
    #[serde(default)]
    pub images: BTreeMap<usize, ImageEntry>,
    #[serde(default)]
    pub competition_end_time: Option<i64>,
}

impl ScoreRecord {
    /// Shallow-merge a patch into this document.
    ///
    /// Present scalar fields replace, image slots merge per key, and absent
    /// fields are left untouched.
    pub fn apply(&mut self, patch: &ScorePatch) {
        if let Some(hearts) = patch.hearts {
            self.hearts = hearts;
        }
        for (slot, entry) in &patch.images {
            self.images.insert(*slot, entry.clone());
        }
        if let Some(end_time) = patch.competition_end_time {
            self.competition_end_time = end_time;
        }
    }

    /// Materialize the image map into `slot_count` ordered slots.
    #[must_use]
    pub fn image_slots(&self, slot_count: usize) -> ImageSlots {
        ImageSlots::from_map(&self.images, slot_count)
    }
}

/// Partial document for a merge-write.
///
/// `competition_end_time` is tri-state: `None` leaves the field alone,
/// `Some(None)` clears it, `Some(Some(ts))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hearts: Option<u64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub images: BTreeMap<usize, ImageEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competition_end_time: Option<Option<i64>>,
}

impl ScorePatch {
    #[must_use]
    pub fn hearts(hearts: u64) -> Self {
        Self {
            hearts: Some(hearts),
            ..Self::default()
        }
    }

    /// Zero hearts and clear any running competition.
    #[must_use]
    pub fn reset() -> Self {
        Self {
            hearts: Some(0),
            competition_end_time: Some(None),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn competition_end(end_time: i64) -> Self {
        Self {
            competition_end_time: Some(Some(end_time)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn image(slot: usize, entry: ImageEntry) -> Self {
        Self {
            images: BTreeMap::from([(slot, entry)]),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hearts.is_none() && self.images.is_empty() && self.competition_end_time.is_none()
    }
}

/// Fixed-size ordered photo slots; `None` marks an empty prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageSlots(Vec<Option<ImageEntry>>);

impl ImageSlots {
    #[must_use]
    pub fn empty(slot_count: usize) -> Self {
        Self(vec![None; slot_count])
    }

    /// Keys outside `0..slot_count` are dropped.
    #[must_use]
    pub fn from_map(images: &BTreeMap<usize, ImageEntry>, slot_count: usize) -> Self {
        let mut slots = Self::empty(slot_count);
        for (slot, entry) in images.range(..slot_count) {
            slots.0[*slot] = Some(entry.clone());
        }
        slots
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&ImageEntry> {
        self.0.get(slot).and_then(Option::as_ref)
    }

    pub fn set(&mut self, slot: usize, entry: ImageEntry) -> Result<()> {
        let len = self.0.len();
        let target = self.0.get_mut(slot).ok_or_else(|| {
            Error::InvalidInput(format!("Photo slot {slot} is out of range (0..{len})"))
        })?;
        *target = Some(entry);
        Ok(())
    }

    /// Number of slots holding a photo.
    pub fn filled(&self) -> usize {
        self.0.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn as_slice(&self) -> &[Option<ImageEntry>] {
        &self.0
    }
}

/// Hearts stored in each participant's record.
///
/// Clicks are credited inversely: the value in B's record is the love A has
/// sent, and vice versa.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePair {
    pub a: u64,
    pub b: u64,
}

impl ScorePair {
    #[must_use]
    pub const fn new(a: u64, b: u64) -> Self {
        Self { a, b }
    }

    /// Hearts stored in `participant`'s record.
    #[must_use]
    pub const fn record(&self, participant: Participant) -> u64 {
        match participant {
            Participant::A => self.a,
            Participant::B => self.b,
        }
    }

    /// Love `participant` has sent, i.e. the hearts in the partner's record.
    #[must_use]
    pub const fn credited(&self, participant: Participant) -> u64 {
        self.record(participant.other())
    }

    pub fn set_record(&mut self, participant: Participant, hearts: u64) {
        match participant {
            Participant::A => self.a = hearts,
            Participant::B => self.b = hearts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(url: &str) -> ImageEntry {
        ImageEntry {
            url: url.to_string(),
            timestamp: 1_707_900_000_000,
            prompt_label: "Our first date".to_string(),
        }
    }

    #[test]
    fn document_shape_uses_camel_case() {
        let record = ScoreRecord {
            hearts: 3,
            images: BTreeMap::from([(0, entry("https://cdn.example.com/a.png"))]),
            competition_end_time: Some(1_707_900_015_000),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["hearts"], 3);
        assert_eq!(json["competitionEndTime"], 1_707_900_015_000_i64);
        assert_eq!(json["images"]["0"]["promptLabel"], "Our first date");
    }

    #[test]
    fn missing_fields_default() {
        let record: ScoreRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record, ScoreRecord::default());

        let record: ScoreRecord =
            serde_json::from_str(r#"{"hearts": 4, "competitionEndTime": null}"#).unwrap();
        assert_eq!(record.hearts, 4);
        assert_eq!(record.competition_end_time, None);
    }

    #[test]
    fn apply_merges_image_slots_per_key() {
        let mut record = ScoreRecord::default();
        record.apply(&ScorePatch::image(0, entry("first")));
        record.apply(&ScorePatch::image(2, entry("third")));
        record.apply(&ScorePatch::hearts(7));

        assert_eq!(record.hearts, 7);
        assert_eq!(record.images.len(), 2);
        assert_eq!(record.images[&0].url, "first");
        assert_eq!(record.images[&2].url, "third");
    }

    #[test]
    fn apply_leaves_absent_fields_untouched() {
        let mut record = ScoreRecord {
            hearts: 9,
            images: BTreeMap::from([(1, entry("keep"))]),
            competition_end_time: Some(42),
        };

        record.apply(&ScorePatch::hearts(10));
        assert_eq!(record.competition_end_time, Some(42));
        assert_eq!(record.images[&1].url, "keep");

        record.apply(&ScorePatch::reset());
        assert_eq!(record.hearts, 0);
        assert_eq!(record.competition_end_time, None);
        assert_eq!(record.images[&1].url, "keep");
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let json = serde_json::to_value(ScorePatch::hearts(2)).unwrap();
        assert_eq!(json, serde_json::json!({ "hearts": 2 }));

        let json = serde_json::to_value(ScorePatch::reset()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "hearts": 0, "competitionEndTime": null })
        );
        assert!(ScorePatch::default().is_empty());
    }

    #[test]
    fn image_slots_drop_out_of_range_keys() {
        let images = BTreeMap::from([(1, entry("one")), (5, entry("five"))]);
        let slots = ImageSlots::from_map(&images, 3);

        assert_eq!(slots.len(), 3);
        assert!(slots.get(0).is_none());
        assert_eq!(slots.get(1).unwrap().url, "one");
        assert_eq!(slots.filled(), 1);
    }

    #[test]
    fn image_slots_set_rejects_out_of_range() {
        let mut slots = ImageSlots::empty(2);
        assert!(slots.set(1, entry("ok")).is_ok());
        assert!(slots.set(2, entry("nope")).is_err());
    }

    #[test]
    fn credited_score_reads_partner_record() {
        let scores = ScorePair::new(3, 5);
        assert_eq!(scores.record(Participant::A), 3);
        assert_eq!(scores.credited(Participant::A), 5);
        assert_eq!(scores.credited(Participant::B), 3);
    }
}
