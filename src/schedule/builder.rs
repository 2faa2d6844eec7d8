// src/schedule/builder.rs
use super::Slot;
use crate::program::{Program, DAYS_PER_WEEK};

/// Picks which days of the week are rest days.
///
/// Rest days are spread evenly: the i-th rest day lands on `round(i * 7 / k) mod 7`,
/// moving forward to the next free day on collision. `rest_count` is clamped to 7.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rest_mask(rest_count: usize) -> [bool; DAYS_PER_WEEK] {
    let rest_count = rest_count.min(DAYS_PER_WEEK);
    let mut mask = [false; DAYS_PER_WEEK];
    if rest_count == 0 {
        return mask;
    }

    let step = DAYS_PER_WEEK as f64 / rest_count as f64;
    for i in 0..rest_count {
        let mut idx = (i as f64 * step).round() as usize % DAYS_PER_WEEK;
        while mask[idx] {
            idx = (idx + 1) % DAYS_PER_WEEK;
        }
        mask[idx] = true;
    }
    mask
}

/// Builds a 7-day week from a rotation and a rest-day count.
///
/// Training days take rotation labels in order starting from the first one;
/// rest days do not consume a rotation label. An empty rotation yields an all-rest week.
pub fn build(rotation: &[&str], rest_count: usize) -> Vec<Slot> {
    let mask = rest_mask(rest_count);
    let mut next = 0usize;

    mask.iter()
        .map(|&is_rest| {
            if is_rest || rotation.is_empty() {
                Slot::Rest
            } else {
                let label = rotation[next % rotation.len()];
                next += 1;
                Slot::Workout(label.to_string())
            }
        })
        .collect()
}

/// Converts the lowest-index rest day back to its position-based label.
fn evict_oldest_rest(slots: &mut [Slot], program: &Program) {
    if let Some(idx) = slots.iter().position(Slot::is_rest) {
        tracing::debug!(day = idx, "Rest limit reached, evicting oldest rest day");
        slots[idx] = Slot::Workout(program.label_at(idx).to_string());
    }
}

/// Makes `index` a rest day, evicting the oldest rest day when at the limit.
///
/// Returns false (leaving `slots` untouched) if the program allows no rest days.
/// `index` must be in range.
pub fn place_rest(slots: &mut [Slot], program: &Program, index: usize) -> bool {
    if slots[index].is_rest() {
        return true;
    }
    if program.rest_limit == 0 {
        tracing::debug!(day = index, program = program.id, "Program allows no rest days, ignoring");
        return false;
    }
    if slots.iter().filter(|s| s.is_rest()).count() >= program.rest_limit {
        evict_oldest_rest(slots, program);
    }
    slots[index] = Slot::Rest;
    true
}
