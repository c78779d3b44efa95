use std::collections::BTreeSet;
use std::ops::Range;

use catalog::ProducerRecord;
use serde::{Deserialize, Serialize};

/// One of the four concatenated segments of a feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Genre,
    Skill,
    Tool,
    Experience,
}

/// The four sorted, de-duplicated term lists a model was trained on.
///
/// Positions are stable for a given input set: every list is sorted
/// lexicographically, so building from the same catalog in any order yields
/// the same vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    genres: Vec<String>,
    skills: Vec<String>,
    tools: Vec<String>,
    experience_levels: Vec<String>,
}

impl Vocabulary {
    /// Collects every observed term. Empty experience labels are skipped.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ProducerRecord>,
    {
        let mut genres = BTreeSet::new();
        let mut skills = BTreeSet::new();
        let mut tools = BTreeSet::new();
        let mut experience = BTreeSet::new();

        for record in records {
            genres.extend(record.genres.iter().filter(|t| !t.is_empty()).cloned());
            skills.extend(record.skills.iter().filter(|t| !t.is_empty()).cloned());
            tools.extend(record.tools.iter().filter(|t| !t.is_empty()).cloned());
            if let Some(level) = record.experience.as_ref().filter(|l| !l.is_empty()) {
                experience.insert(level.clone());
            }
        }

        Self {
            genres: genres.into_iter().collect(),
            skills: skills.into_iter().collect(),
            tools: tools.into_iter().collect(),
            experience_levels: experience.into_iter().collect(),
        }
    }

    /// Builds a vocabulary from explicit lists, sorting and de-duplicating them.
    pub fn from_parts<G, S, T, E>(genres: G, skills: S, tools: T, experience_levels: E) -> Self
    where
        G: IntoIterator<Item = String>,
        S: IntoIterator<Item = String>,
        T: IntoIterator<Item = String>,
        E: IntoIterator<Item = String>,
    {
        fn sorted<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
            items
                .into_iter()
                .filter(|t| !t.is_empty())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        }
        Self {
            genres: sorted(genres),
            skills: sorted(skills),
            tools: sorted(tools),
            experience_levels: sorted(experience_levels),
        }
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    pub fn experience_levels(&self) -> &[String] {
        &self.experience_levels
    }

    pub fn terms(&self, segment: Segment) -> &[String] {
        match segment {
            Segment::Genre => &self.genres,
            Segment::Skill => &self.skills,
            Segment::Tool => &self.tools,
            Segment::Experience => &self.experience_levels,
        }
    }

    /// Total feature width: the sum of all four list lengths.
    pub fn width(&self) -> usize {
        self.genres.len() + self.skills.len() + self.tools.len() + self.experience_levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0
    }

    /// Column range a segment occupies in a feature vector.
    pub fn segment(&self, segment: Segment) -> Range<usize> {
        let genre_end = self.genres.len();
        let skill_end = genre_end + self.skills.len();
        let tool_end = skill_end + self.tools.len();
        match segment {
            Segment::Genre => 0..genre_end,
            Segment::Skill => genre_end..skill_end,
            Segment::Tool => skill_end..tool_end,
            Segment::Experience => tool_end..self.width(),
        }
    }

    /// Absolute column of `term` within `segment`, if the term is known.
    pub fn column(&self, segment: Segment, term: &str) -> Option<usize> {
        let offset = self.segment(segment).start;
        self.terms(segment)
            .binary_search_by(|entry| entry.as_str().cmp(term))
            .ok()
            .map(|pos| offset + pos)
    }

    pub fn contains(&self, segment: Segment, term: &str) -> bool {
        self.column(segment, term).is_some()
    }

    /// Every list is strictly increasing. Snapshots decoded from storage are
    /// checked against this before use.
    pub fn is_well_formed(&self) -> bool {
        [
            &self.genres,
            &self.skills,
            &self.tools,
            &self.experience_levels,
        ]
        .iter()
        .all(|list| list.windows(2).all(|w| w[0] < w[1]) && list.iter().all(|t| !t.is_empty()))
    }
}
