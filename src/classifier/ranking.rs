use crate::classifier::interface::Classification;

/// Indices of the `k` largest scores, descending. Equal scores keep the
/// lower index first.
pub fn top_k(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(k);
    ranked
}

/// Label for an output index, with a synthetic fallback for indices the
/// label list does not cover.
pub fn label_for(labels: &[String], index: usize) -> String {
    labels
        .get(index)
        .cloned()
        .unwrap_or_else(|| format!("class {}", index))
}

pub fn to_classifications(scores: &[f32], labels: &[String], k: usize) -> Vec<Classification> {
    top_k(scores, k)
        .into_iter()
        .map(|(index, confidence)| Classification {
            label: label_for(labels, index),
            confidence,
        })
        .collect()
}

#[cfg(test)]
mod ranking_test {
    use super::*;

    fn animal_labels() -> Vec<String> {
        ["cats", "chicken", "cow", "dogs", "elephant"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_top_3_descending_with_tie_on_lower_index() {
        let scores = [0.1, 0.7, 0.05, 0.1, 0.05];
        let top = top_k(&scores, 3);
        // cats (0) and dogs (3) tie at 0.1; cats wins on index.
        assert_eq!(top, vec![(1, 0.7), (0, 0.1), (3, 0.1)]);

        let predictions = to_classifications(&scores, &animal_labels(), 3);
        let labels: Vec<&str> = predictions.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["chicken", "cats", "dogs"]);
    }

    #[test]
    fn test_fewer_classes_than_k() {
        let top = top_k(&[0.3, 0.7], 3);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].0, 1);
    }

    #[test]
    fn test_empty_scores() {
        assert!(top_k(&[], 3).is_empty());
    }

    #[test]
    fn test_label_fallback_for_out_of_range_index() {
        let labels = animal_labels();
        assert_eq!(label_for(&labels, 1), "chicken");
        assert_eq!(label_for(&labels, 7), "class 7");
    }
}
