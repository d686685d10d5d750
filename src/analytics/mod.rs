/// Streak and statistics engine
///
/// This module derives a habit's streak counters and display statistics from
/// the ordered history of its progress records. Progress records only exist
/// for due dates, so the record list is the due-day history. Recomputation is
/// idempotent: the same history always yields the same summary.

use chrono::NaiveDate;

use crate::domain::{Habit, HabitProgress, Status};

/// Derived streak and completion statistics for one habit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakSummary {
    /// Consecutive Done records ending at the most recent due day
    pub current_streak: u32,
    /// Best contiguous Done run ever achieved; never revised downward
    pub max_streak: u32,
    /// Total number of Done records
    pub total_completed: u32,
    /// Done records as a rounded percentage of due records up to today
    pub completion_rate: u32,
}

/// Recompute the summary from the habit's full progress history
///
/// `today` bounds the current-streak scan and the completion rate; callers
/// pass the current calendar date, tests pass fixed ones.
pub fn recompute(habit: &Habit, rows: &[HabitProgress], today: NaiveDate) -> StreakSummary {
    let mut sorted: Vec<&HabitProgress> = rows.iter().collect();
    sorted.sort_by_key(|p| p.date);

    let current_streak = current_streak(&sorted, today);
    let longest = longest_run(&sorted);

    // A historical maximum is never lost to later skips, only exceeded
    let max_streak = longest.max(current_streak).max(habit.max_streak);

    let total_completed = sorted.iter().filter(|p| p.status == Status::Done).count() as u32;
    let completion_rate = completion_rate(&sorted, today);

    StreakSummary {
        current_streak,
        max_streak,
        total_completed,
        completion_rate,
    }
}

/// Count the unbroken trailing Done run ending at the most recent due day
///
/// Walking backwards from the most recent record dated on or before `today`:
/// a Done record extends the run, anything else breaks it immediately. Only
/// a contiguous run ending at the most recent due occurrence counts.
fn current_streak(sorted: &[&HabitProgress], today: NaiveDate) -> u32 {
    let mut streak = 0;

    for progress in sorted.iter().rev() {
        if progress.date > today {
            continue;
        }
        if progress.status != Status::Done {
            // A skipped or untouched due day ends the run; only the
            // unbroken trailing run counts as current.
            break;
        }
        streak += 1;
    }

    streak
}

/// Longest contiguous Done run anywhere in the history
fn longest_run(sorted: &[&HabitProgress]) -> u32 {
    let mut longest = 0;
    let mut run = 0;

    for progress in sorted.iter() {
        if progress.status == Status::Done {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }

    longest
}

/// Done records as a rounded percentage of due records up to `today`
fn completion_rate(sorted: &[&HabitProgress], today: NaiveDate) -> u32 {
    let due: Vec<_> = sorted.iter().filter(|p| p.date <= today).collect();
    if due.is_empty() {
        return 0;
    }

    let done = due.iter().filter(|p| p.status == Status::Done).count();
    ((done as f64 / due.len() as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Frequency, HabitProgress, HabitType, WeekdaySet};
    use chrono::NaiveDate;

    fn habit() -> Habit {
        Habit::new(
            "Meditate".to_string(),
            None,
            HabitType::OneTime,
            None,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            Frequency::Daily,
            WeekdaySet::empty(),
            vec![],
            None,
            "blue".to_string(),
            None,
            None,
            None,
        )
        .unwrap()
    }

    fn row(habit: &Habit, date: NaiveDate, status: Status) -> HabitProgress {
        let mut progress = HabitProgress::materialized(habit, date);
        progress.status = status;
        progress
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_history() {
        let habit = habit();
        let summary = recompute(&habit, &[], date(2024, 3, 10));
        assert_eq!(summary.current_streak, 0);
        assert_eq!(summary.max_streak, 0);
        assert_eq!(summary.total_completed, 0);
        assert_eq!(summary.completion_rate, 0);
    }

    #[test]
    fn test_skip_breaks_current_streak() {
        // Done, Done, Skipped, Done (oldest to newest); the skip two days
        // before today limits the current streak to the trailing Done.
        let habit = habit();
        let today = date(2024, 3, 10);
        let rows = vec![
            row(&habit, date(2024, 3, 7), Status::Done),
            row(&habit, date(2024, 3, 8), Status::Done),
            row(&habit, date(2024, 3, 9), Status::Skipped),
            row(&habit, date(2024, 3, 10), Status::Done),
        ];

        let summary = recompute(&habit, &rows, today);
        assert_eq!(summary.current_streak, 1);
        assert_eq!(summary.max_streak, 2);
        assert_eq!(summary.total_completed, 3);
        assert_eq!(summary.completion_rate, 75);
    }

    #[test]
    fn test_not_started_head_breaks_current_streak() {
        let habit = habit();
        let today = date(2024, 3, 10);
        let rows = vec![
            row(&habit, date(2024, 3, 8), Status::Done),
            row(&habit, date(2024, 3, 9), Status::Done),
            row(&habit, date(2024, 3, 10), Status::NotStarted),
        ];

        let summary = recompute(&habit, &rows, today);
        assert_eq!(summary.current_streak, 0);
        assert_eq!(summary.max_streak, 2);
    }

    #[test]
    fn test_unbroken_history() {
        let habit = habit();
        let today = date(2024, 3, 10);
        let rows: Vec<_> = (1..=10)
            .map(|d| row(&habit, date(2024, 3, d), Status::Done))
            .collect();

        let summary = recompute(&habit, &rows, today);
        assert_eq!(summary.current_streak, 10);
        assert_eq!(summary.max_streak, 10);
        assert_eq!(summary.completion_rate, 100);
    }

    #[test]
    fn test_future_rows_are_ignored_by_current_scan() {
        let habit = habit();
        let today = date(2024, 3, 10);
        let rows = vec![
            row(&habit, date(2024, 3, 9), Status::Done),
            row(&habit, date(2024, 3, 10), Status::Done),
            row(&habit, date(2024, 3, 11), Status::NotStarted), // tomorrow, pre-materialized
        ];

        let summary = recompute(&habit, &rows, today);
        assert_eq!(summary.current_streak, 2);
    }

    #[test]
    fn test_max_streak_is_monotonic() {
        // The cached maximum survives even when the records behind it are gone
        let mut habit = habit();
        habit.max_streak = 7;

        let rows = vec![row(&habit, date(2024, 3, 10), Status::Done)];
        let summary = recompute(&habit, &rows, date(2024, 3, 10));
        assert_eq!(summary.max_streak, 7);
        assert_eq!(summary.current_streak, 1);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let habit = habit();
        let today = date(2024, 3, 10);
        let rows = vec![
            row(&habit, date(2024, 3, 8), Status::Done),
            row(&habit, date(2024, 3, 9), Status::Skipped),
            row(&habit, date(2024, 3, 10), Status::Done),
        ];

        let first = recompute(&habit, &rows, today);
        let second = recompute(&habit, &rows, today);
        assert_eq!(first, second);
    }

    #[test]
    fn test_completion_rate_rounds() {
        let habit = habit();
        let today = date(2024, 3, 10);
        let rows = vec![
            row(&habit, date(2024, 3, 8), Status::Done),
            row(&habit, date(2024, 3, 9), Status::Skipped),
            row(&habit, date(2024, 3, 10), Status::Skipped),
        ];

        // 1 of 3 = 33.33.. rounds to 33
        let summary = recompute(&habit, &rows, today);
        assert_eq!(summary.completion_rate, 33);
    }
}
