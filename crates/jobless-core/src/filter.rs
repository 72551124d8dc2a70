//! Client-side filter/search over an already-retrieved batch of jobs.
//!
//! [`filter_jobs`] is a pure function of (records, search text, experience
//! filter): no I/O, no input mutation, stable order. A record survives iff
//! every whitespace token of the search matches one of its searchable
//! fields (or a synonym rule fires) AND it passes the experience filter.
//!
//! Users search colloquially ("intern", "remote jobs", "freshers") and
//! those words don't literally appear in every relevant record, hence the
//! three hard-coded synonym rules. The experience heuristics are
//! deliberately permissive and overlapping: the `experience_level` field is
//! unstructured free text, and false positives beat false negatives for
//! discoverability.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::JobRecord;

/// Experience bucket selected by the user. `All` always matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExperienceFilter {
    #[default]
    All,
    Entry,
    Mid,
    Senior,
}

impl ExperienceFilter {
    /// Case-insensitive parse; `None` for unrecognized values.
    pub fn parse(s: &str) -> Option<ExperienceFilter> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Some(ExperienceFilter::All),
            "entry" => Some(ExperienceFilter::Entry),
            "mid" => Some(ExperienceFilter::Mid),
            "senior" => Some(ExperienceFilter::Senior),
            _ => None,
        }
    }

    /// Does `job` fall in this bucket?
    ///
    /// Category is a stronger signal than the free-text field: a
    /// `fresher`/`internship` job is entry-level regardless of what its
    /// `experience_level` string says.
    pub fn matches(&self, job: &JobRecord) -> bool {
        match self {
            ExperienceFilter::All => true,
            ExperienceFilter::Entry => {
                let category = job.category_lower();
                if category == "fresher" || category == "internship" {
                    return true;
                }
                level_text(job).map(|t| is_entry_text(&t)).unwrap_or(false)
            }
            ExperienceFilter::Mid => level_text(job).map(|t| is_mid_text(&t)).unwrap_or(false),
            ExperienceFilter::Senior => {
                level_text(job).map(|t| is_senior_text(&t)).unwrap_or(false)
            }
        }
    }
}

fn level_text(job: &JobRecord) -> Option<String> {
    job.experience_level
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

lazy_static! {
    // "0-2", "1 - 2", "0–2" with flexible spacing/hyphenation.
    static ref ENTRY_RANGE: Regex = Regex::new(r"[01]\s*[-–]\s*2").unwrap();
    // A lone 0 or 1 ("0", "1").
    static ref ENTRY_LONE_DIGIT: Regex = Regex::new(r"(?:^|[^\d])[01](?:[^\d]|$)").unwrap();
    // "2-5", "3 - 5".
    static ref MID_RANGE: Regex = Regex::new(r"[23]\s*[-–]\s*5").unwrap();
    static ref MID_LONE_DIGIT: Regex = Regex::new(r"(?:^|[^\d])[2-5](?:[^\d]|$)").unwrap();
    static ref SENIOR_LONE_DIGIT: Regex = Regex::new(r"(?:^|[^\d])[6-9](?:[^\d]|$)").unwrap();
    // Two-digit years of experience ("10 years", "12+").
    static ref SENIOR_TWO_DIGIT: Regex = Regex::new(r"\d{2}").unwrap();
    // "5+", "6 +".
    static ref SENIOR_PLUS: Regex = Regex::new(r"[5-9]\s*\+").unwrap();
}

const ENTRY_KEYWORDS: &[&str] = &[
    "entry", "junior", "fresher", "beginner", "trainee", "graduate", "0-2", "0 - 2", "1 year",
    "2 year",
];

const MID_KEYWORDS: &[&str] = &[
    "mid", "intermediate", "2-5", "3-5", "2 - 5", "3 - 5", "3 year", "4 year", "5 year",
];

const SENIOR_KEYWORDS: &[&str] = &[
    "senior", "lead", "manager", "principal", "architect", "6+", "5+", "6 year", "7 year",
    "8 year",
];

fn is_entry_text(text: &str) -> bool {
    ENTRY_KEYWORDS.iter().any(|k| text.contains(k))
        || ENTRY_RANGE.is_match(text)
        || ENTRY_LONE_DIGIT.is_match(text)
}

fn is_mid_text(text: &str) -> bool {
    MID_KEYWORDS.iter().any(|k| text.contains(k))
        || MID_RANGE.is_match(text)
        || MID_LONE_DIGIT.is_match(text)
}

fn is_senior_text(text: &str) -> bool {
    SENIOR_KEYWORDS.iter().any(|k| text.contains(k))
        || SENIOR_LONE_DIGIT.is_match(text)
        || SENIOR_TWO_DIGIT.is_match(text)
        || SENIOR_PLUS.is_match(text)
}

/// Lowercased view over a record's searchable fields, built once per record.
struct Haystack {
    title: String,
    company: String,
    description: String,
    location: String,
    category: String,
    job_type: String,
    skills: Vec<String>,
}

impl Haystack {
    fn of(job: &JobRecord) -> Haystack {
        Haystack {
            title: job.title.to_lowercase(),
            company: job.company.to_lowercase(),
            description: job.description.to_lowercase(),
            location: job.location.to_lowercase(),
            category: job.category.to_lowercase(),
            job_type: job.job_type.to_lowercase(),
            skills: job.skills.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    fn contains(&self, token: &str) -> bool {
        self.title.contains(token)
            || self.company.contains(token)
            || self.description.contains(token)
            || self.location.contains(token)
            || self.category.contains(token)
            || self.job_type.contains(token)
            || self.skills.iter().any(|s| s.contains(token))
    }
}

/// The three synonym rules. `query` is the whole lowercased search string,
/// needed for the multi-word "work from home" phrase, which whitespace
/// tokenization would otherwise split apart.
fn synonym_match(hay: &Haystack, token: &str, query: &str) -> bool {
    // "intern", "interns", "internships" → internship listings.
    if token.contains("intern")
        && (hay.category.contains("intern")
            || hay.job_type.contains("intern")
            || hay.title.contains("intern")
            || hay.description.contains("intern"))
    {
        return true;
    }

    // "remote", "remotely", "wfh", "work from home" → wfh listings.
    let remote_intent =
        token.contains("remot") || token == "wfh" || query.contains("work from home");
    if remote_intent
        && (hay.category.contains("wfh")
            || hay.title.contains("remote")
            || hay.description.contains("remote")
            || hay.title.contains("work from home")
            || hay.description.contains("work from home"))
    {
        return true;
    }

    // "fresher", "freshers", "grad", "graduates" → fresher listings.
    if (token.contains("fresh") || token.contains("grad"))
        && (hay.category.contains("fresher")
            || hay.title.contains("fresher")
            || hay.description.contains("fresher")
            || hay.category.contains("graduate")
            || hay.title.contains("graduate")
            || hay.description.contains("graduate"))
    {
        return true;
    }

    false
}

/// Narrow `records` by free-text search and experience filter.
///
/// Input order is preserved (stable filter, no re-sorting); the inputs are
/// never mutated. Records with absent optional fields are fine: they can
/// only match on the fields they do have.
pub fn filter_jobs(
    records: &[JobRecord],
    search_text: &str,
    experience: ExperienceFilter,
) -> Vec<JobRecord> {
    let query = search_text.trim().to_lowercase();
    let tokens: Vec<&str> = query.split_whitespace().collect();

    // Fast path: nothing to filter by.
    if tokens.is_empty() && experience == ExperienceFilter::All {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|job| {
            let search_ok = if tokens.is_empty() {
                true
            } else {
                let hay = Haystack::of(job);
                tokens
                    .iter()
                    .all(|t| hay.contains(t) || synonym_match(&hay, t, &query))
            };
            search_ok && experience.matches(job)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewJobInput;
    use chrono::Utc;

    fn job(title: &str, category: &str) -> JobRecord {
        NewJobInput {
            title: title.into(),
            company: "Acme".into(),
            location: "Bengaluru, Karnataka".into(),
            job_type: "full-time".into(),
            category: category.into(),
            description: "Build and ship things.".into(),
            ..Default::default()
        }
        .into_record(Utc::now())
    }

    fn with_level(mut j: JobRecord, level: &str) -> JobRecord {
        j.experience_level = Some(level.into());
        j
    }

    #[test]
    fn test_empty_search_all_experience_is_identity() {
        let records = vec![job("A", "fresher"), job("B", "wfh"), job("C", "experienced")];
        let out = filter_jobs(&records, "", ExperienceFilter::All);
        assert_eq!(out.len(), records.len());
        for (a, b) in out.iter().zip(records.iter()) {
            assert_eq!(a.id, b.id);
        }
    }

    #[test]
    fn test_filter_is_subset_and_every_token_matches() {
        let records = vec![
            job("Rust Backend Engineer", "experienced"),
            job("Python Data Analyst", "experienced"),
        ];
        let out = filter_jobs(&records, "rust backend", ExperienceFilter::All);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Rust Backend Engineer");
        // Both tokens present, case-insensitively.
        let hay = out[0].title.to_lowercase();
        assert!(hay.contains("rust") && hay.contains("backend"));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let records = vec![
            job("Rust Engineer", "experienced"),
            job("Support Intern", "internship"),
            job("Remote QA", "wfh"),
        ];
        let once = filter_jobs(&records, "engineer", ExperienceFilter::All);
        let twice = filter_jobs(&once, "engineer", ExperienceFilter::All);
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a.id, b.id);
        }
    }

    #[test]
    fn test_synonym_intern_matches_internship_category() {
        // Title carries no literal "intern"; only the category does.
        let records = vec![job("Analyst", "internship"), job("Analyst", "experienced")];
        let out = filter_jobs(&records, "intern", ExperienceFilter::All);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, "internship");
    }

    #[test]
    fn test_synonym_remote_matches_wfh_category() {
        let records = vec![job("Designer", "wfh"), job("Designer", "experienced")];
        let out = filter_jobs(&records, "remote", ExperienceFilter::All);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, "wfh");

        let out = filter_jobs(&records, "wfh", ExperienceFilter::All);
        assert_eq!(out.len(), 1);

        let out = filter_jobs(&records, "work from home", ExperienceFilter::All);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_synonym_fresher_matches_fresher_category() {
        let records = vec![job("Engineer", "fresher"), job("Engineer", "experienced")];
        let out = filter_jobs(&records, "freshers", ExperienceFilter::All);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, "fresher");

        let out = filter_jobs(&records, "graduates", ExperienceFilter::All);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_skills_are_searchable() {
        let mut j = job("Engineer", "experienced");
        j.skills = vec!["Kubernetes".into(), "Go".into()];
        let out = filter_jobs(&[j], "kubernetes", ExperienceFilter::All);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_fresher_category_always_classifies_entry() {
        // The category short-circuit beats the contradicting free text.
        let j = with_level(job("Engineer", "fresher"), "Senior Level");
        assert!(ExperienceFilter::Entry.matches(&j));
        let out = filter_jobs(&[j], "", ExperienceFilter::Entry);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_internship_category_classifies_entry() {
        let j = job("Engineer", "internship");
        assert!(ExperienceFilter::Entry.matches(&j));
    }

    #[test]
    fn test_entry_text_patterns() {
        for level in ["Entry Level", "Junior dev", "0-2 years", "0 - 2 yrs", "1", "Trainee"] {
            let j = with_level(job("X", "experienced"), level);
            assert!(
                ExperienceFilter::Entry.matches(&j),
                "expected entry: {level}"
            );
        }
    }

    #[test]
    fn test_mid_text_patterns() {
        for level in ["Mid level", "2-5 years", "3 - 5 years", "4 years", "Intermediate", "3"] {
            let j = with_level(job("X", "experienced"), level);
            assert!(ExperienceFilter::Mid.matches(&j), "expected mid: {level}");
        }
    }

    #[test]
    fn test_senior_text_patterns() {
        for level in ["Senior", "Tech Lead", "8 years", "10+ years", "5+", "Principal Architect", "7"] {
            let j = with_level(job("X", "experienced"), level);
            assert!(
                ExperienceFilter::Senior.matches(&j),
                "expected senior: {level}"
            );
        }
    }

    #[test]
    fn test_missing_optional_fields_never_panic() {
        let mut j = job("Engineer", "experienced");
        j.skills = Vec::new();
        j.experience_level = None;

        // Searchable only via the fields it has.
        let out = filter_jobs(&[j.clone()], "engineer", ExperienceFilter::All);
        assert_eq!(out.len(), 1);

        // No level text and no category short-circuit: only "all" matches.
        assert!(ExperienceFilter::All.matches(&j));
        assert!(!ExperienceFilter::Entry.matches(&j));
        assert!(!ExperienceFilter::Mid.matches(&j));
        assert!(!ExperienceFilter::Senior.matches(&j));
    }

    #[test]
    fn test_order_preserved() {
        let records = vec![
            job("B Engineer", "experienced"),
            job("A Engineer", "experienced"),
            job("C Engineer", "experienced"),
        ];
        let out = filter_jobs(&records, "engineer", ExperienceFilter::All);
        let titles: Vec<&str> = out.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["B Engineer", "A Engineer", "C Engineer"]);
    }

    #[test]
    fn test_experience_parse() {
        assert_eq!(ExperienceFilter::parse("ALL"), Some(ExperienceFilter::All));
        assert_eq!(
            ExperienceFilter::parse("Entry"),
            Some(ExperienceFilter::Entry)
        );
        assert_eq!(ExperienceFilter::parse("mid"), Some(ExperienceFilter::Mid));
        assert_eq!(
            ExperienceFilter::parse("senior"),
            Some(ExperienceFilter::Senior)
        );
        assert_eq!(ExperienceFilter::parse("wizard"), None);
    }
}
