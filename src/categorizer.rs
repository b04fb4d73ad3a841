use std::sync::OnceLock;

use regex::Regex;

use crate::models::Category;
use crate::scanner::{Sections, SECTION_MARKERS};

const REVENUE_KEYWORDS: &[&str] = &[
    "intäkt",
    "försäljning",
    "membership",
    "avgift",
    "hyra",
    "uthyrning",
    "revenue",
    "income",
    "sale",
    "fee",
    "rent",
    "rental",
];

/// Summary and heading rows, compared upper-cased after cleaning.
const SKIP_LABELS: &[&str] = &[
    "TOT",
    "TOTAL",
    "SUM",
    "SUMMA",
    "NET RESULT",
    "NETTORESULTAT",
    "NETTOOMSÄTTNING",
    "ÖVRIGA RÖRELSEINTÄKTER",
    "RÅVAROR OCH FÖRNÖDENHETER",
    "ÖVRIGA EXTERNA KOSTNADER",
    "ÅRETS RESULTAT",
    "BERÄKNAT RESULTAT",
];

fn total_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(tot|total)\s+").expect("valid prefix pattern"))
}

fn total_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s+(tot|total)$").expect("valid suffix pattern"))
}

/// Trim and strip a leading "Total "/"Tot " and a trailing " Total"/" Tot".
pub fn clean_label(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_prefix = total_prefix_re().replace(trimmed, "");
    total_suffix_re().replace(&without_prefix, "").trim().to_string()
}

/// True for labels that never become accounts: blanks, totals, headings.
pub fn is_skipped_label(cleaned: &str) -> bool {
    let upper = cleaned.trim().to_uppercase();
    upper.is_empty()
        || SKIP_LABELS.contains(&upper.as_str())
        || SECTION_MARKERS.contains(&upper.as_str())
        || upper.starts_with("SUMMA ")
}

/// Cleaned account name, or `None` if the row is not a data row.
pub fn account_name(raw: &str) -> Option<String> {
    let cleaned = clean_label(raw);
    if is_skipped_label(&cleaned) {
        None
    } else {
        Some(cleaned)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Basis {
    Structural,
    Keyword,
    Sign,
    Default,
}

impl Basis {
    /// Mapping confidence recorded for the raw label.
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Structural | Self::Keyword => 1.0,
            Self::Sign => 0.8,
            Self::Default => 0.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structural => "section",
            Self::Keyword => "keyword",
            Self::Sign => "sign",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub category: Category,
    pub basis: Basis,
}

pub fn matches_revenue_keyword(name: &str) -> bool {
    let lower = name.to_lowercase();
    REVENUE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Majority sign of the non-zero values; ties go to the sign of the mean.
pub fn classify_by_sign(values: &[f64]) -> Option<Category> {
    let non_zero: Vec<f64> = values.iter().copied().filter(|v| *v != 0.0).collect();
    if non_zero.is_empty() {
        return None;
    }
    let positives = non_zero.iter().filter(|v| **v > 0.0).count();
    let negatives = non_zero.len() - positives;
    let category = if positives > negatives {
        Category::Revenue
    } else if negatives > positives {
        Category::Expense
    } else {
        let mean = non_zero.iter().sum::<f64>() / non_zero.len() as f64;
        if mean >= 0.0 {
            Category::Revenue
        } else {
            Category::Expense
        }
    };
    Some(category)
}

/// Section position, then revenue keywords, then value signs, then Expense.
pub fn classify(row_index: usize, name: &str, values: &[f64], sections: &Sections) -> Classification {
    if sections.revenue.as_ref().is_some_and(|r| r.contains(&row_index)) {
        return Classification {
            category: Category::Revenue,
            basis: Basis::Structural,
        };
    }
    if sections.expense.as_ref().is_some_and(|r| r.contains(&row_index)) {
        return Classification {
            category: Category::Expense,
            basis: Basis::Structural,
        };
    }
    if matches_revenue_keyword(name) {
        return Classification {
            category: Category::Revenue,
            basis: Basis::Keyword,
        };
    }
    match classify_by_sign(values) {
        Some(category) => Classification {
            category,
            basis: Basis::Sign,
        },
        None => Classification {
            category: Category::Expense,
            basis: Basis::Default,
        },
    }
}
