use chrono::NaiveDate;
use serde::Serialize;

use crate::db::models::{EducationRow, WorkExperienceRow};
use crate::domain::EducationLevel;
use crate::screening::requirements::parse_list;

/// Minimum total score for an application to pass screening.
pub const PASS_THRESHOLD: i32 = 75;

const EDUCATION_MAX: f64 = 40.0;
const EXPERIENCE_MAX: f64 = 40.0;
const SKILLS_MAX: f64 = 20.0;

/// Points per year of experience once the requirement is met.
const EXPERIENCE_POINTS_PER_YEAR: f64 = 8.0;

/// Cap applied when experience falls short of the requirement, so a
/// shortfall is always penalized relative to a met requirement.
const EXPERIENCE_SHORTFALL_CAP: f64 = 30.0;

/// Deterministic screening score: three weighted sub-scores and a pass/fail
/// decision. Pure computation, no store access.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreBreakdown {
    pub education_score: i32,
    pub experience_score: i32,
    pub skills_score: i32,
    pub total_score: i32,
    pub passed: bool,
    pub highest_education: Option<EducationLevel>,
    pub total_experience_years: f64,
}

/// Score an applicant's profile against a job's stated minimums.
///
/// `today` stands in for "now" when a current job has no end date; it is a
/// parameter so results are reproducible.
pub fn score_application(
    min_education_level: &str,
    min_experience_years: f64,
    requirements_raw: Option<&str>,
    education: &[EducationRow],
    experience: &[WorkExperienceRow],
    today: NaiveDate,
) -> ScoreBreakdown {
    let required_level =
        EducationLevel::parse(min_education_level).unwrap_or(EducationLevel::HighSchool);
    let (education_score, highest_education) = education_score(required_level, education);

    let total_years = total_experience_years(experience, today);
    let experience_score = experience_score(min_experience_years, total_years);

    let required_skills = requirements_raw.map(parse_list).unwrap_or_default();
    let applicant_skills = applicant_skill_set(experience);
    let skills_score = skills_score(&required_skills, &applicant_skills);

    let total_score = education_score + experience_score + skills_score;

    ScoreBreakdown {
        education_score,
        experience_score,
        skills_score,
        total_score,
        passed: total_score >= PASS_THRESHOLD,
        highest_education,
        total_experience_years: total_years,
    }
}

/// Education sub-score (0-40) from the applicant's highest degree rank
/// relative to the job's required rank.
pub fn education_score(
    required: EducationLevel,
    records: &[EducationRow],
) -> (i32, Option<EducationLevel>) {
    let highest = records
        .iter()
        .filter_map(|r| EducationLevel::parse(&r.degree_level))
        .max_by_key(|level| level.rank());

    let score = match highest {
        Some(level) => {
            let diff = level.rank() - required.rank();
            if diff >= 1 {
                EDUCATION_MAX as i32
            } else if diff == 0 {
                30
            } else if diff == -1 {
                15
            } else {
                0
            }
        }
        None => 0,
    };

    (score, highest)
}

/// Total years across all work experience records. A current job counts up
/// to `today`; a record whose dates run backwards contributes zero.
pub fn total_experience_years(records: &[WorkExperienceRow], today: NaiveDate) -> f64 {
    records
        .iter()
        .map(|record| {
            let end = record.end_date.unwrap_or(today);
            let days = (end - record.start_date).num_days().max(0);
            days as f64 / 365.25
        })
        .sum()
}

/// Experience sub-score (0-40). A met requirement (or none at all) earns 8
/// points per year up to the cap; a shortfall is scaled by the fraction
/// covered and capped at 30.
pub fn experience_score(required_years: f64, total_years: f64) -> i32 {
    let score = if required_years <= 0.0 || total_years >= required_years {
        (total_years * EXPERIENCE_POINTS_PER_YEAR).min(EXPERIENCE_MAX)
    } else {
        (EXPERIENCE_MAX * (total_years / required_years)).min(EXPERIENCE_SHORTFALL_CAP)
    };

    score.round() as i32
}

/// Skills sub-score (0-20): fraction of required skills covered by the
/// applicant's combined skill set. An empty requirements list is full
/// credit.
pub fn skills_score(required: &[String], applicant: &[String]) -> i32 {
    if required.is_empty() {
        return SKILLS_MAX as i32;
    }

    let matched = required
        .iter()
        .filter(|r| skill_matched(r, applicant))
        .count();

    (matched as f64 / required.len() as f64 * SKILLS_MAX).round() as i32
}

/// A required skill counts as matched when any applicant skill is a
/// case-insensitive substring of it, or the other way around.
fn skill_matched(required: &str, applicant: &[String]) -> bool {
    let required_lower = required.to_lowercase();
    applicant.iter().any(|skill| {
        let skill_lower = skill.to_lowercase();
        !skill_lower.is_empty()
            && (required_lower.contains(&skill_lower) || skill_lower.contains(&required_lower))
    })
}

/// Union of the skill lists declared across all work experience records.
fn applicant_skill_set(records: &[WorkExperienceRow]) -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    for record in records {
        if let Some(raw) = record.skills.as_deref() {
            for skill in parse_list(raw) {
                if !skills.iter().any(|s| s.eq_ignore_ascii_case(&skill)) {
                    skills.push(skill);
                }
            }
        }
    }
    skills
}

#[cfg(test)]
mod tests {
    use super::*;

    fn education_record(degree_level: &str) -> EducationRow {
        EducationRow {
            id: 1,
            user_id: 1,
            degree_level: degree_level.to_string(),
            field_of_study: "Computer Science".to_string(),
            institution: "State University".to_string(),
            start_date: date(2015, 9, 1),
            end_date: Some(date(2019, 6, 1)),
            gpa: None,
        }
    }

    fn experience_record(
        start: NaiveDate,
        end: Option<NaiveDate>,
        current: bool,
        skills: &str,
    ) -> WorkExperienceRow {
        WorkExperienceRow {
            id: 1,
            user_id: 1,
            job_title: "Developer".to_string(),
            company: "Acme".to_string(),
            industry: None,
            start_date: start,
            end_date: end,
            current_job: current,
            responsibilities: None,
            skills: Some(skills.to_string()),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn education_ladder() {
        let required = EducationLevel::Bachelor;

        let (score, _) = education_score(required, &[education_record("Bachelor")]);
        assert_eq!(score, 30);

        let (score, _) = education_score(required, &[education_record("Master")]);
        assert_eq!(score, 40);

        let (score, _) = education_score(required, &[education_record("PhD")]);
        assert_eq!(score, 40);

        let (score, _) = education_score(required, &[education_record("Diploma")]);
        assert_eq!(score, 15);

        let (score, _) = education_score(required, &[education_record("Associate")]);
        assert_eq!(score, 0);

        let (score, highest) = education_score(required, &[]);
        assert_eq!(score, 0);
        assert_eq!(highest, None);
    }

    #[test]
    fn education_uses_highest_record() {
        let records = [education_record("High School"), education_record("Master")];
        let (score, highest) = education_score(EducationLevel::Bachelor, &records);
        assert_eq!(score, 40);
        assert_eq!(highest, Some(EducationLevel::Master));
    }

    #[test]
    fn unparseable_degrees_score_zero() {
        let (score, highest) =
            education_score(EducationLevel::Bachelor, &[education_record("bootcamp")]);
        assert_eq!(score, 0);
        assert_eq!(highest, None);
    }

    #[test]
    fn experience_met_requirement() {
        assert_eq!(experience_score(2.0, 2.0), 16);
        assert_eq!(experience_score(2.0, 3.5), 28);
        assert_eq!(experience_score(1.0, 10.0), 40);
    }

    #[test]
    fn experience_shortfall_is_capped_below_thirty() {
        // 40 * (1.5 / 2.0) = 30 exactly at the cap
        assert_eq!(experience_score(2.0, 1.5), 30);
        // 40 * (1.9 / 2.0) = 38 would exceed the cap
        assert_eq!(experience_score(2.0, 1.9), 30);
        assert_eq!(experience_score(4.0, 1.0), 10);
        assert_eq!(experience_score(2.0, 0.0), 0);
    }

    #[test]
    fn zero_requirement_is_fully_met() {
        assert_eq!(experience_score(0.0, 0.0), 0);
        assert_eq!(experience_score(0.0, 3.0), 24);
        assert_eq!(experience_score(0.0, 10.0), 40);
    }

    #[test]
    fn experience_years_sum_and_clamp() {
        let today = date(2024, 1, 1);
        let records = [
            experience_record(date(2020, 1, 1), Some(date(2022, 1, 1)), false, ""),
            // backwards dates contribute nothing
            experience_record(date(2023, 1, 1), Some(date(2022, 1, 1)), false, ""),
            // current job runs to today
            experience_record(date(2023, 1, 1), None, true, ""),
        ];
        let total = total_experience_years(&records, today);
        assert!((total - 3.0).abs() < 0.01, "total was {total}");
    }

    #[test]
    fn skills_monotonic_in_matches() {
        let required: Vec<String> = ["SQL", "Python", "Docker", "Kubernetes"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut previous = 0;
        let mut applicant: Vec<String> = Vec::new();
        for skill in &required {
            applicant.push(skill.clone());
            let score = skills_score(&required, &applicant);
            assert!(score >= previous);
            previous = score;
        }
        assert_eq!(previous, 20);
    }

    #[test]
    fn skills_empty_requirements_full_credit() {
        assert_eq!(skills_score(&[], &[]), 20);
        assert_eq!(skills_score(&[], &["Rust".to_string()]), 20);
    }

    #[test]
    fn skills_substring_matches_both_directions() {
        let required = vec!["PostgreSQL".to_string()];
        assert_eq!(skills_score(&required, &["sql".to_string()]), 20);

        let required = vec!["SQL".to_string()];
        assert_eq!(skills_score(&required, &["postgresql".to_string()]), 20);

        let required = vec!["SQL".to_string(), "Python".to_string()];
        assert_eq!(skills_score(&required, &["sql".to_string(), "java".to_string()]), 10);
    }

    #[test]
    fn bachelor_with_two_years_falls_short() {
        // Bachelor's vs required Bachelor's, exactly two years in one past
        // role, one of two required skills covered: 30 + 16 + 10 = 56.
        let education = [education_record("Bachelor")];
        let experience = [experience_record(
            date(2020, 1, 1),
            Some(date(2022, 1, 1)),
            false,
            "sql, java",
        )];

        let breakdown = score_application(
            "Bachelor",
            2.0,
            Some(r#"["SQL", "Python"]"#),
            &education,
            &experience,
            date(2024, 6, 1),
        );

        assert_eq!(breakdown.education_score, 30);
        assert_eq!(breakdown.experience_score, 16);
        assert_eq!(breakdown.skills_score, 10);
        assert_eq!(breakdown.total_score, 56);
        assert!(!breakdown.passed);
        assert_eq!(breakdown.highest_education, Some(EducationLevel::Bachelor));
    }

    #[test]
    fn master_with_full_skills_passes() {
        // Master's one rank above the requirement, 3.5 years against 2, both
        // required skills covered: 40 + 28 + 20 = 88.
        let education = [education_record("Master")];
        let experience = [experience_record(
            date(2019, 1, 1),
            Some(date(2022, 7, 2)),
            false,
            "SQL, Python",
        )];

        let breakdown = score_application(
            "Bachelor",
            2.0,
            Some("SQL,Python"),
            &education,
            &experience,
            date(2024, 6, 1),
        );

        assert_eq!(breakdown.education_score, 40);
        assert_eq!(breakdown.experience_score, 28);
        assert_eq!(breakdown.skills_score, 20);
        assert_eq!(breakdown.total_score, 88);
        assert!(breakdown.passed);
    }

    #[test]
    fn total_is_sum_and_bounded() {
        let breakdown = score_application(
            "PhD",
            10.0,
            Some("Rust"),
            &[],
            &[],
            date(2024, 6, 1),
        );
        assert_eq!(breakdown.total_score, 0);
        assert!(!breakdown.passed);

        let education = [education_record("PhD")];
        let experience = [experience_record(
            date(2010, 1, 1),
            Some(date(2023, 1, 1)),
            false,
            "Rust",
        )];
        let breakdown =
            score_application("Bachelor", 2.0, Some("Rust"), &education, &experience, date(2024, 6, 1));
        assert_eq!(breakdown.total_score, 100);
        assert!(breakdown.passed);
    }

    #[test]
    fn pass_boundary_at_seventy_five() {
        // Education 40 + experience 28 + skills 10 = 78 passes; education 30
        // with the same rest = 68 fails.
        let experience = [experience_record(
            date(2019, 1, 1),
            Some(date(2022, 7, 2)),
            false,
            "sql",
        )];

        let passing = score_application(
            "Bachelor",
            2.0,
            Some("SQL,Python"),
            &[education_record("Master")],
            &experience,
            date(2024, 6, 1),
        );
        assert_eq!(passing.total_score, 78);
        assert!(passing.passed);

        let failing = score_application(
            "Bachelor",
            2.0,
            Some("SQL,Python"),
            &[education_record("Bachelor")],
            &experience,
            date(2024, 6, 1),
        );
        assert_eq!(failing.total_score, 68);
        assert!(!failing.passed);
    }
}
