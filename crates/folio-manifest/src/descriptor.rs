//! Exercise descriptors and the ordered navigation manifest.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// Navigation group an exercise belongs to.
///
/// Variant order is the navigation order: the fixed category comes before
/// every numbered week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Group {
    /// Fixed, non-numbered category (e.g. "Shader").
    Category(String),

    /// Numbered week.
    Week(u32),
}

impl Group {
    /// Label shown in the navigation.
    pub fn label(&self) -> String {
        self.to_string()
    }

    pub fn is_category(&self) -> bool {
        matches!(self, Group::Category(_))
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::Category(label) => f.write_str(label),
            Group::Week(n) => write!(f, "Week {}", n),
        }
    }
}

impl Ord for Group {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Group::Category(a), Group::Category(b)) => a.cmp(b),
            (Group::Category(_), Group::Week(_)) => Ordering::Less,
            (Group::Week(_), Group::Category(_)) => Ordering::Greater,
            (Group::Week(a), Group::Week(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Group {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A discovered exercise page.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExerciseDescriptor {
    /// Navigation group
    pub group: Group,

    /// Exercise number within the group
    pub index: u32,

    /// Template path relative to the source root, `/`-separated
    pub path: String,
}

impl ExerciseDescriptor {
    pub fn new(group: Group, index: u32, path: impl Into<String>) -> Self {
        Self {
            group,
            index,
            path: path.into(),
        }
    }

    /// Record embedded in the navigation script.
    pub fn to_record(&self) -> NavRecord<'_> {
        NavRecord {
            group_label: self.group.label(),
            index: self.index,
            path: &self.path,
        }
    }
}

/// Serialized form of a descriptor, as consumed by the navigation script.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NavRecord<'a> {
    pub group_label: String,
    pub index: u32,
    pub path: &'a str,
}

/// Ordered list of exercises.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    entries: Vec<ExerciseDescriptor>,
}

impl Manifest {
    /// Build a manifest, sorting entries into navigation order.
    pub fn new(mut entries: Vec<ExerciseDescriptor>) -> Self {
        entries.sort();
        Self { entries }
    }

    pub fn entries(&self) -> &[ExerciseDescriptor] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExerciseDescriptor> {
        self.entries.iter()
    }

    /// Serialize the manifest as a pretty-printed JSON array of records.
    ///
    /// `</` is escaped so the output can be embedded in a `<script>` element.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let records: Vec<NavRecord<'_>> = self.entries.iter().map(|e| e.to_record()).collect();
        let json = serde_json::to_string_pretty(&records)?;
        Ok(json.replace("</", "<\\/"))
    }
}

impl FromIterator<ExerciseDescriptor> for Manifest {
    fn from_iter<I: IntoIterator<Item = ExerciseDescriptor>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ExerciseDescriptor;
    type IntoIter = std::slice::Iter<'a, ExerciseDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shader(index: u32) -> ExerciseDescriptor {
        ExerciseDescriptor::new(
            Group::Category("Shader".to_string()),
            index,
            format!("shader/shader_ex{}.html", index),
        )
    }

    fn week(n: u32, index: u32) -> ExerciseDescriptor {
        ExerciseDescriptor::new(Group::Week(n), index, format!("week{}/ex{}.html", n, index))
    }

    #[test]
    fn category_sorts_before_weeks() {
        let manifest = Manifest::new(vec![week(1, 2), shader(1), week(1, 1)]);

        let paths: Vec<&str> = manifest.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["shader/shader_ex1.html", "week1/ex1.html", "week1/ex2.html"]
        );
    }

    #[test]
    fn weeks_sort_numerically() {
        let manifest: Manifest = vec![week(10, 1), week(2, 5), week(2, 3), shader(2), shader(1)]
            .into_iter()
            .collect();

        let order: Vec<(String, u32)> = manifest
            .iter()
            .map(|e| (e.group.label(), e.index))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Shader".to_string(), 1),
                ("Shader".to_string(), 2),
                ("Week 2".to_string(), 3),
                ("Week 2".to_string(), 5),
                ("Week 10".to_string(), 1),
            ]
        );
    }

    #[test]
    fn ordering_holds_pairwise() {
        let manifest = Manifest::new(vec![
            week(3, 1),
            shader(4),
            week(1, 7),
            week(1, 2),
            shader(1),
            week(2, 1),
        ]);

        for pair in manifest.entries().windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.group.is_category() != b.group.is_category() {
                assert!(a.group.is_category());
            } else {
                assert!((&a.group, a.index) < (&b.group, b.index));
            }
        }
    }

    #[test]
    fn serializes_records() {
        let manifest = Manifest::new(vec![week(1, 3)]);

        let json = manifest.to_json().unwrap();

        assert_eq!(
            json,
            "[\n  {\n    \"groupLabel\": \"Week 1\",\n    \"index\": 3,\n    \"path\": \"week1/ex3.html\"\n  }\n]"
        );
    }

    #[test]
    fn escapes_script_terminators() {
        let manifest = Manifest::new(vec![ExerciseDescriptor::new(
            Group::Category("</script>".to_string()),
            1,
            "shader/shader_ex1.html",
        )]);

        let json = manifest.to_json().unwrap();

        assert!(!json.contains("</script>"));
        assert!(json.contains("<\\/script>"));
    }
}
