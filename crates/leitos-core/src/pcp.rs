//! PCP (surge-capacity) level table.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, collections};

/// One row of the PCP configuration table.
///
/// `[min_patients, max_patients]` is inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcpLevel {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "qtdMinimaPacientes")]
    pub min_patients: u32,
    #[serde(rename = "qtdMaximaPacientes")]
    pub max_patients: u32,
    #[serde(rename = "cor", default)]
    pub color: String,
    #[serde(rename = "orientacoes", default)]
    pub guidance: Vec<String>,
    #[serde(rename = "ordem")]
    pub order: u32,
}

impl PcpLevel {
    pub fn new(id: impl Into<String>, name: impl Into<String>, min: u32, max: u32, order: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            min_patients: min,
            max_patients: max,
            color: String::new(),
            guidance: Vec::new(),
            order,
        }
    }

    pub fn contains(&self, total: u32) -> bool {
        self.min_patients <= total && total <= self.max_patients
    }

    fn overlaps(&self, other: &PcpLevel) -> bool {
        self.min_patients <= other.max_patients && other.min_patients <= self.max_patients
    }
}

impl Entity for PcpLevel {
    const COLLECTION: &'static str = collections::PCP_LEVELS;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Picks the first level, in ascending `order`, whose bounds contain `total`.
///
/// Overlapping ranges are not rejected; the lowest `order` wins.
pub fn select_level(levels: &[PcpLevel], total: u32) -> Option<&PcpLevel> {
    let mut ordered: Vec<&PcpLevel> = levels.iter().collect();
    ordered.sort_by_key(|level| level.order);
    ordered.into_iter().find(|level| level.contains(total))
}

/// Returns the names of every pair of levels whose bounds overlap.
pub fn overlapping_levels(levels: &[PcpLevel]) -> Vec<(String, String)> {
    let mut ordered: Vec<&PcpLevel> = levels.iter().collect();
    ordered.sort_by_key(|level| level.order);

    let mut pairs = Vec::new();
    for (i, a) in ordered.iter().enumerate() {
        for b in &ordered[i + 1..] {
            if a.overlaps(b) {
                pairs.push((a.name.clone(), b.name.clone()));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels() -> Vec<PcpLevel> {
        vec![
            PcpLevel::new("b", "B", 6, 10, 2),
            PcpLevel::new("a", "A", 0, 5, 1),
        ]
    }

    #[test]
    fn test_select_level_by_bounds() {
        let levels = levels();
        assert_eq!(select_level(&levels, 0).map(|l| l.name.as_str()), Some("A"));
        assert_eq!(select_level(&levels, 5).map(|l| l.name.as_str()), Some("A"));
        assert_eq!(select_level(&levels, 6).map(|l| l.name.as_str()), Some("B"));
        assert!(select_level(&levels, 11).is_none());
    }

    #[test]
    fn test_select_level_empty_table() {
        assert!(select_level(&[], 3).is_none());
    }

    #[test]
    fn test_overlapping_levels_first_order_wins() {
        let levels = vec![
            PcpLevel::new("x", "Rotina", 0, 8, 1),
            PcpLevel::new("y", "Nível 1", 6, 12, 2),
        ];
        assert_eq!(select_level(&levels, 7).map(|l| l.name.as_str()), Some("Rotina"));
        assert_eq!(
            overlapping_levels(&levels),
            vec![("Rotina".to_string(), "Nível 1".to_string())]
        );
    }

    #[test]
    fn test_partition_has_no_overlaps() {
        assert!(overlapping_levels(&levels()).is_empty());
    }
}
