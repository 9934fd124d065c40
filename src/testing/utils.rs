use std::cmp::Ordering;

use crate::error::{EnrichmentError, Result};

pub fn extract_unique_groups(group_ids: &[usize]) -> Vec<usize> {
    let mut unique_groups = group_ids.to_vec();
    unique_groups.sort();
    unique_groups.dedup();
    unique_groups
}

/// Get indices for each group
pub fn get_group_indices(group_ids: &[usize], unique_groups: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let group1 = unique_groups[0];
    let group2 = unique_groups[1];

    let group1_indices = group_ids.iter()
        .enumerate()
        .filter_map(|(i, &g)| if g == group1 { Some(i) } else { None })
        .collect();

    let group2_indices = group_ids.iter()
        .enumerate()
        .filter_map(|(i, &g)| if g == group2 { Some(i) } else { None })
        .collect();

    (group1_indices, group2_indices)
}

/// Splits sample labels into the two groups being compared.
pub fn two_group_indices(group_ids: &[usize]) -> Result<(Vec<usize>, Vec<usize>)> {
    let unique_groups = extract_unique_groups(group_ids);
    if unique_groups.len() != 2 {
        return Err(EnrichmentError::Config(format!(
            "expected exactly two sample groups, found {}",
            unique_groups.len()
        )));
    }
    Ok(get_group_indices(group_ids, &unique_groups))
}

/// 1-based ranks in ascending order of `values`, ties receive their average rank.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let val = values[order[i]];
        let mut j = i + 1;

        // Find tied values
        while j < order.len() && values[order[j]] == val {
            j += 1;
        }

        let rank = (i + j - 1) as f64 / 2.0 + 1.0;
        for &idx in &order[i..j] {
            ranks[idx] = rank;
        }

        i = j;
    }

    ranks
}

/// Merges two ascending runs into `out`, replacing its contents.
pub fn linear_merge(left: &[usize], right: &[usize], out: &mut Vec<usize>) {
    out.clear();
    out.reserve(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if left[i] <= right[j] {
            out.push(left[i]);
            i += 1;
        } else {
            out.push(right[j]);
            j += 1;
        }
    }
    out.extend_from_slice(&left[i..]);
    out.extend_from_slice(&right[j..]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_group_indices() {
        let (g1, g2) = two_group_indices(&[1, 0, 1, 0, 0]).unwrap();
        assert_eq!(g1, vec![1, 3, 4]);
        assert_eq!(g2, vec![0, 2]);
        assert!(two_group_indices(&[0, 0, 0]).is_err());
        assert!(two_group_indices(&[0, 1, 2]).is_err());
    }

    #[test]
    fn test_average_ranks_with_ties() {
        let ranks = average_ranks(&[3.0, 1.0, 3.0, 2.0]);
        assert_eq!(ranks, vec![3.5, 1.0, 3.5, 2.0]);
    }

    #[test]
    fn test_linear_merge() {
        let mut out = vec![42];
        linear_merge(&[1, 4, 9], &[2, 3, 10, 11], &mut out);
        assert_eq!(out, vec![1, 2, 3, 4, 9, 10, 11]);
        linear_merge(&[], &[5], &mut out);
        assert_eq!(out, vec![5]);
    }
}
