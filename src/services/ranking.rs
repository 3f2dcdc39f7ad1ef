//! Leaderboard aggregation.
//!
//! Both leaderboards are recomputed from scratch on every request: no
//! incremental index, no memoization. Sorting is stable, so entries with
//! equal keys keep the fetch order (records by ascending id, members by
//! ascending student id).

use serde::Serialize;

/// Number of entries exposed on either leaderboard.
pub const TOP_N: usize = 30;

/// One valid submission on the current-period board, joined with its member.
#[derive(Debug, Clone)]
pub struct CurrentRow {
    pub student_id: String,
    pub name: String,
    pub org_unit: String,
    pub correct_num: i32,
    pub time_used_seconds: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    pub student_id: String,
    pub name: String,
    pub org_unit: String,
    pub correct_num: i32,
    pub time_used_seconds: f64,
    pub rank: usize,
}

/// Per-member totals feeding the cumulative board.
#[derive(Debug, Clone)]
pub struct CumulativeRow {
    pub student_id: String,
    pub name: String,
    pub org_unit: String,
    pub total_correct_num: i64,
    pub average_time_used_seconds: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CumulativeEntry {
    pub student_id: String,
    pub name: String,
    pub org_unit: String,
    pub total_correct_num: i64,
    pub average_time_used_seconds: f64,
    pub rank: usize,
}

/// Sort by (correct count desc, elapsed seconds asc), assign 1-based ranks,
/// and return the top entries plus the requesting member's own entry. The
/// self entry carries its true rank even when it falls outside the cut.
#[must_use]
pub fn rank_current(
    mut rows: Vec<CurrentRow>,
    student_id: &str,
) -> (Vec<RankedEntry>, Option<RankedEntry>) {
    rows.sort_by(|a, b| {
        b.correct_num
            .cmp(&a.correct_num)
            .then(a.time_used_seconds.total_cmp(&b.time_used_seconds))
    });

    let ranked: Vec<RankedEntry> = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| RankedEntry {
            student_id: row.student_id,
            name: row.name,
            org_unit: row.org_unit,
            correct_num: row.correct_num,
            time_used_seconds: row.time_used_seconds,
            rank: i + 1,
        })
        .collect();

    let own = ranked.iter().find(|e| e.student_id == student_id).cloned();
    let top: Vec<RankedEntry> = ranked.into_iter().take(TOP_N).collect();
    (top, own)
}

/// Fold a member's valid submissions into cumulative totals. The average is
/// over valid submissions only, and 0 when there are none.
#[must_use]
pub fn accumulate(
    student_id: String,
    name: String,
    org_unit: String,
    scores: &[(i32, f64)],
) -> CumulativeRow {
    let total_correct_num: i64 = scores.iter().map(|(correct, _)| i64::from(*correct)).sum();
    let total_time: f64 = scores.iter().map(|(_, time)| *time).sum();
    let average_time_used_seconds = if scores.is_empty() {
        0.0
    } else {
        total_time / scores.len() as f64
    };

    CumulativeRow {
        student_id,
        name,
        org_unit,
        total_correct_num,
        average_time_used_seconds,
    }
}

/// Same ordering policy as [`rank_current`], over cumulative totals.
#[must_use]
pub fn rank_cumulative(
    mut rows: Vec<CumulativeRow>,
    student_id: &str,
) -> (Vec<CumulativeEntry>, Option<CumulativeEntry>) {
    rows.sort_by(|a, b| {
        b.total_correct_num
            .cmp(&a.total_correct_num)
            .then(
                a.average_time_used_seconds
                    .total_cmp(&b.average_time_used_seconds),
            )
    });

    let ranked: Vec<CumulativeEntry> = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| CumulativeEntry {
            student_id: row.student_id,
            name: row.name,
            org_unit: row.org_unit,
            total_correct_num: row.total_correct_num,
            average_time_used_seconds: row.average_time_used_seconds,
            rank: i + 1,
        })
        .collect();

    let own = ranked.iter().find(|e| e.student_id == student_id).cloned();
    let top: Vec<CumulativeEntry> = ranked.into_iter().take(TOP_N).collect();
    (top, own)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, correct: i32, time: f64) -> CurrentRow {
        CurrentRow {
            student_id: id.to_string(),
            name: format!("member {id}"),
            org_unit: "first branch".to_string(),
            correct_num: correct,
            time_used_seconds: time,
        }
    }

    #[test]
    fn test_orders_by_correct_desc_then_time_asc() {
        let rows = vec![row("a", 10, 50.0), row("b", 12, 80.0), row("c", 10, 40.0)];
        let (top, _) = rank_current(rows, "a");

        let ids: Vec<&str> = top.iter().map(|e| e.student_id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[2].rank, 3);
    }

    #[test]
    fn test_ties_keep_fetch_order() {
        let rows = vec![row("a", 10, 50.0), row("b", 10, 50.0)];
        let (top, _) = rank_current(rows, "a");

        assert_eq!(top[0].student_id, "a");
        assert_eq!(top[1].student_id, "b");
    }

    #[test]
    fn test_self_entry_outside_top_n_keeps_true_rank() {
        let mut rows: Vec<CurrentRow> = (0..40)
            .map(|i| row(&format!("m{i}"), 100 - i, 60.0))
            .collect();
        rows.push(row("straggler", 1, 300.0));

        let (top, own) = rank_current(rows, "straggler");
        assert_eq!(top.len(), TOP_N);
        let own = own.expect("requesting member has a submission");
        assert_eq!(own.rank, 41);
        assert!(top.iter().all(|e| e.student_id != "straggler"));
    }

    #[test]
    fn test_self_entry_absent_without_submission() {
        let (_, own) = rank_current(vec![row("a", 5, 10.0)], "nobody");
        assert!(own.is_none());
    }

    #[test]
    fn test_accumulate_averages_valid_submissions() {
        let totals = accumulate(
            "a".to_string(),
            "member a".to_string(),
            "first branch".to_string(),
            &[(10, 30.0), (8, 60.0)],
        );
        assert_eq!(totals.total_correct_num, 18);
        assert!((totals.average_time_used_seconds - 45.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_accumulate_zero_average_without_submissions() {
        let totals = accumulate(
            "a".to_string(),
            "member a".to_string(),
            "first branch".to_string(),
            &[],
        );
        assert_eq!(totals.total_correct_num, 0);
        assert!(totals.average_time_used_seconds.abs() < f64::EPSILON);
    }

    #[test]
    fn test_cumulative_ordering() {
        let rows = vec![
            accumulate(
                "slow".into(),
                "slow member".into(),
                "first branch".into(),
                &[(20, 100.0)],
            ),
            accumulate(
                "fast".into(),
                "fast member".into(),
                "first branch".into(),
                &[(20, 10.0)],
            ),
            accumulate(
                "top".into(),
                "top member".into(),
                "first branch".into(),
                &[(30, 500.0)],
            ),
        ];

        let (top, own) = rank_cumulative(rows, "slow");
        let ids: Vec<&str> = top.iter().map(|e| e.student_id.as_str()).collect();
        assert_eq!(ids, ["top", "fast", "slow"]);
        assert_eq!(own.expect("present").rank, 3);
    }
}
