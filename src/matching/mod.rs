//! Advisory scoring heuristics: title duplicate detection and supervisor
//! ranking. Both are placeholders for a future trained model, so their
//! contracts are bands and orderings rather than exact values; the duplicate
//! percentage carries random jitter inside its band and callers must not
//! expect repeatable numbers.

use rand::Rng;
use serde::Serialize;

use crate::models::user::{Role, User, UserPublic};

/// Result of the title duplicate check.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheck {
    pub percentage: i64,
    pub is_duplicate: bool,
}

/// A ranked supervisor candidate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorMatch {
    pub supervisor: UserPublic,
    pub score: i64,
}

/// Titles of projects known from previous intakes. Candidates are scored
/// against these plus every title already in the proposals table.
pub const KNOWN_TITLES: [&str; 6] = [
    "Smart Campus Navigation System Using IoT",
    "Student Attendance Tracking With QR Codes",
    "Online Examination Proctoring Platform",
    "Hostel Maintenance Request Portal",
    "Library Seat Reservation System",
    "Campus Lost and Found Web Application",
];

const BASE_SCORE: i64 = 50;
const KEYWORD_BONUS: i64 = 10;
const LOAD_PENALTY_WEIGHT: f64 = 20.0;

/// Words that carry meaning in a title: lowercased, length above three.
fn significant_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3)
        .map(String::from)
        .collect()
}

/// Fraction of the candidate's significant words found in the other title.
fn overlap_ratio(candidate: &str, existing: &str) -> f64 {
    let candidate_words = significant_words(candidate);
    let existing_words = significant_words(existing);
    if candidate_words.is_empty() || existing_words.is_empty() {
        return 0.0;
    }
    let shared = candidate_words
        .iter()
        .filter(|w| existing_words.contains(w))
        .count();
    shared as f64 / candidate_words.len() as f64
}

/// Score a candidate title against the corpus. The returned percentage is
/// drawn from a band keyed to the best word overlap, so a near copy of a
/// known title always lands at or above the default threshold and an
/// unrelated title always lands below it.
pub fn duplicate_check(title: &str, existing_titles: &[String], threshold: i64) -> DuplicateCheck {
    let mut best: f64 = 0.0;
    for known in KNOWN_TITLES {
        best = best.max(overlap_ratio(title, known));
    }
    for existing in existing_titles {
        best = best.max(overlap_ratio(title, existing));
    }

    let mut rng = rand::rng();
    let percentage: i64 = if best >= 0.8 {
        rng.random_range(85..=95)
    } else if best >= 0.5 {
        rng.random_range(70..=84)
    } else if best >= 0.3 {
        rng.random_range(40..=69)
    } else {
        rng.random_range(5..=39)
    };

    DuplicateCheck {
        percentage,
        is_duplicate: percentage >= threshold,
    }
}

/// Keywords of a declared research area: lowercased, split on commas and
/// whitespace. No length floor here, areas like "web" or "ai" count.
fn area_keywords(area: &str) -> Vec<String> {
    area.to_lowercase()
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

/// Rank supervisors for a research area, best match first.
///
/// Scoring: a fixed base, a bonus per area keyword found in the candidate's
/// expertise, minus a penalty proportional to current load, clamped to
/// 0..=100. Candidates at or above capacity are excluded before scoring.
/// Ties break toward the lighter load, then the lower id.
pub fn rank_supervisors(research_area: &str, candidates: &[User]) -> Vec<SupervisorMatch> {
    let keywords = area_keywords(research_area);

    let mut matches: Vec<SupervisorMatch> = candidates
        .iter()
        .filter(|c| c.role == Role::Supervisor && c.current_groups < c.max_capacity)
        .map(|c| {
            let mut score = BASE_SCORE;
            for keyword in &keywords {
                if c.research_areas
                    .iter()
                    .any(|area| area.to_lowercase().contains(keyword))
                {
                    score += KEYWORD_BONUS;
                }
            }
            let load_ratio = if c.max_capacity > 0 {
                c.current_groups as f64 / c.max_capacity as f64
            } else {
                1.0
            };
            score -= (load_ratio * LOAD_PENALTY_WEIGHT).round() as i64;
            SupervisorMatch {
                supervisor: UserPublic::from(c.clone()),
                score: score.clamp(0, 100),
            }
        })
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.supervisor.current_groups.cmp(&b.supervisor.current_groups))
            .then(a.supervisor.id.cmp(&b.supervisor.id))
    });
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supervisor(id: i64, areas: &[&str], current: i64, max: i64) -> User {
        User {
            id,
            role: Role::Supervisor,
            full_name: format!("Supervisor {id}"),
            email: format!("sup{id}@uni.edu"),
            password: String::new(),
            id_number: None,
            employee_number: Some(format!("EMP{id:03}")),
            program: None,
            research_areas: areas.iter().map(|a| a.to_string()).collect(),
            current_groups: current,
            max_capacity: max,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn exact_known_title_scores_as_duplicate() {
        let check = duplicate_check("Smart Campus Navigation System Using IoT", &[], 70);
        assert!(check.percentage >= 85);
        assert!(check.is_duplicate);
    }

    #[test]
    fn unrelated_title_scores_below_threshold() {
        let check = duplicate_check("Inventory Tracker for Local Retailers", &[], 70);
        assert!(check.percentage < 70);
        assert!(!check.is_duplicate);
    }

    #[test]
    fn existing_proposal_titles_join_the_corpus() {
        let existing = vec!["Recipe Sharing Platform for Students".to_string()];
        let check = duplicate_check("Recipe Sharing Platform for Students", &existing, 70);
        assert!(check.is_duplicate);
    }

    #[test]
    fn expertise_match_outranks_mismatch() {
        let candidates = vec![
            supervisor(1, &["databases"], 0, 5),
            supervisor(2, &["web", "mobile"], 0, 5),
        ];
        let ranked = rank_supervisors("web", &candidates);
        assert_eq!(ranked[0].supervisor.id, 2);
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn full_supervisor_is_excluded() {
        let candidates = vec![
            supervisor(1, &["web"], 5, 5),
            supervisor(2, &["web"], 1, 5),
        ];
        let ranked = rank_supervisors("web", &candidates);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].supervisor.id, 2);
    }

    #[test]
    fn lighter_load_wins_at_equal_expertise() {
        let candidates = vec![
            supervisor(1, &["web"], 4, 5),
            supervisor(2, &["web"], 0, 5),
        ];
        let ranked = rank_supervisors("web", &candidates);
        assert_eq!(ranked[0].supervisor.id, 2);
    }

    #[test]
    fn scores_stay_within_bounds() {
        let candidates = vec![supervisor(1, &["web", "ai", "iot", "security"], 4, 5)];
        let ranked = rank_supervisors("web ai iot security networks databases", &candidates);
        assert!((0..=100).contains(&ranked[0].score));
    }
}
