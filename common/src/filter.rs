//! フィルタ条件と絞込み
//!
//! 同一軸のタグはOR、区分軸とプロファイル軸はANDで結合する。
//! 空集合は「その軸で絞り込まない」を意味する。

use crate::types::{Classification, Profile, Unit};
use std::collections::BTreeSet;

/// フィルタ条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub classifications: BTreeSet<Classification>,
    pub profiles: BTreeSet<Profile>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// 区分タグをトグル（あり → なし、なし → あり）
    pub fn toggle_classification(&mut self, tag: Classification) {
        if !self.classifications.remove(&tag) {
            self.classifications.insert(tag);
        }
    }

    /// プロファイルタグをトグル
    pub fn toggle_profile(&mut self, tag: Profile) {
        if !self.profiles.remove(&tag) {
            self.profiles.insert(tag);
        }
    }

    pub fn clear(&mut self) {
        self.classifications.clear();
        self.profiles.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.classifications.is_empty() && self.profiles.is_empty()
    }

    /// 有効なタグ数（フィルタボタンのバッジ表示用）
    pub fn active_count(&self) -> usize {
        self.classifications.len() + self.profiles.len()
    }

    pub fn matches(&self, unit: &Unit) -> bool {
        (self.classifications.is_empty() || self.classifications.contains(&unit.classification))
            && (self.profiles.is_empty() || self.profiles.contains(&unit.profile))
    }
}

/// 条件に合う市町村を元の順序のまま返す
pub fn apply_filter<'a>(units: &'a [Unit], criteria: &FilterCriteria) -> Vec<&'a Unit> {
    units.iter().filter(|u| criteria.matches(u)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::{sample_units, synthetic_units};

    fn names<'a>(units: &[&'a Unit]) -> Vec<&'a str> {
        units.iter().map(|u| u.name.as_str()).collect()
    }

    #[test]
    fn test_empty_criteria_is_identity() {
        let units = sample_units();
        let filtered = apply_filter(&units, &FilterCriteria::new());
        assert_eq!(filtered.len(), units.len());
        assert!(filtered.iter().zip(units.iter()).all(|(a, b)| a.id == b.id));
    }

    #[test]
    fn test_same_axis_is_or_combined() {
        let units = sample_units();
        let mut criteria = FilterCriteria::new();
        criteria.toggle_classification(Classification::Sumidero);
        criteria.toggle_classification(Classification::Equilibrio);

        let filtered = apply_filter(&units, &criteria);
        assert_eq!(
            names(&filtered),
            vec!["CIMITARRA", "SAN GIL", "SAN VICENTE DE CHUCURÍ"]
        );
    }

    #[test]
    fn test_axes_are_and_combined() {
        let units = sample_units();
        let mut criteria = FilterCriteria::new();
        criteria.toggle_classification(Classification::Emisor);
        criteria.toggle_profile(Profile::MixedTransition);

        let filtered = apply_filter(&units, &criteria);
        assert_eq!(names(&filtered), vec!["GIRÓN"]);
    }

    #[test]
    fn test_toggle_twice_is_involution() {
        let mut criteria = FilterCriteria::new();
        criteria.toggle_profile(Profile::ForestSinks);
        let before = criteria.clone();

        criteria.toggle_classification(Classification::Emisor);
        criteria.toggle_classification(Classification::Emisor);
        assert_eq!(criteria, before);

        criteria.toggle_profile(Profile::ForestSinks);
        assert!(criteria.is_empty());
    }

    #[test]
    fn test_filter_matches_predicate_for_every_combination() {
        let units = synthetic_units(87);
        let classifications = Classification::ALL;
        let profiles = Profile::ALL;

        // 区分3ビット × プロファイル4ビットの全組合せ
        for c_mask in 0u8..8 {
            for p_mask in 0u8..16 {
                let mut criteria = FilterCriteria::new();
                for (i, tag) in classifications.iter().enumerate() {
                    if c_mask & (1 << i) != 0 {
                        criteria.toggle_classification(tag.clone());
                    }
                }
                for (i, tag) in profiles.iter().enumerate() {
                    if p_mask & (1 << i) != 0 {
                        criteria.toggle_profile(tag.clone());
                    }
                }

                let filtered = apply_filter(&units, &criteria);
                let expected: Vec<_> = units
                    .iter()
                    .filter(|u| {
                        (c_mask == 0 || criteria.classifications.contains(&u.classification))
                            && (p_mask == 0 || criteria.profiles.contains(&u.profile))
                    })
                    .map(|u| u.id)
                    .collect();
                let actual: Vec<_> = filtered.iter().map(|u| u.id).collect();
                assert_eq!(actual, expected, "c_mask={} p_mask={}", c_mask, p_mask);
            }
        }
    }

    #[test]
    fn test_active_count_and_clear() {
        let mut criteria = FilterCriteria::new();
        criteria.toggle_classification(Classification::Emisor);
        criteria.toggle_profile(Profile::IndustrialUrban);
        criteria.toggle_profile(Profile::MixedTransition);
        assert_eq!(criteria.active_count(), 3);

        criteria.clear();
        assert_eq!(criteria.active_count(), 0);
        assert!(criteria.is_empty());
    }
}
