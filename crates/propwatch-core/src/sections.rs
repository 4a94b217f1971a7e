#![forbid(unsafe_code)]

//! Grouping of consecutive children under collapsible headers.
//!
//! Members are grouped by a tag (the declaring class, for example) into
//! runs of consecutive equal tags. A tag that reappears later starts a new
//! section rather than joining the earlier one, so display order is never
//! rearranged.

use core::ops::Range;

/// One run of equal tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section<'a> {
    pub name: &'a str,
    pub range: Range<usize>,
}

/// Runs of consecutive equal tags over a list of items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectionRuns {
    names: Vec<String>,
    starts: Vec<usize>,
    len: usize,
}

impl SectionRuns {
    #[must_use]
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut runs = Self::default();
        for (i, tag) in tags.into_iter().enumerate() {
            let tag = tag.as_ref();
            if runs.names.last().is_none_or(|last| last != tag) {
                runs.names.push(tag.to_owned());
                runs.starts.push(i);
            }
            runs.len = i + 1;
        }
        runs
    }

    /// Number of sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Headers are only worth drawing when there are at least two runs.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.names.len() >= 2
    }

    #[must_use]
    pub fn section(&self, index: usize) -> Option<Section<'_>> {
        let name = self.names.get(index)?;
        let start = self.starts[index];
        let end = self.starts.get(index + 1).copied().unwrap_or(self.len);
        Some(Section {
            name,
            range: start..end,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Section<'_>> + '_ {
        (0..self.len()).filter_map(|i| self.section(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_runs_only() {
        let runs = SectionRuns::from_tags(["X", "X", "Y", "Y", "Y", "X"]);
        let sections: Vec<_> = runs.iter().map(|s| (s.name, s.range)).collect();
        assert_eq!(sections, [("X", 0..2), ("Y", 2..5), ("X", 5..6)]);
        assert!(runs.is_enabled());
    }

    #[test]
    fn single_tag_is_disabled() {
        let runs = SectionRuns::from_tags(["Pawn", "Pawn"]);
        assert_eq!(runs.len(), 1);
        assert!(!runs.is_enabled());
    }

    #[test]
    fn empty_input() {
        let runs = SectionRuns::from_tags(Vec::<String>::new());
        assert!(runs.is_empty());
        assert!(!runs.is_enabled());
        assert!(runs.section(0).is_none());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn sections_partition_input(tags in proptest::collection::vec("[abc]", 0..40)) {
                let runs = SectionRuns::from_tags(&tags);
                let mut next = 0;
                let mut previous: Option<&str> = None;
                for section in runs.iter() {
                    prop_assert_eq!(section.range.start, next);
                    prop_assert!(!section.range.is_empty());
                    for tag in &tags[section.range.clone()] {
                        prop_assert_eq!(tag.as_str(), section.name);
                    }
                    prop_assert_ne!(previous, Some(section.name));
                    previous = Some(section.name);
                    next = section.range.end;
                }
                prop_assert_eq!(next, tags.len());
            }
        }
    }
}
