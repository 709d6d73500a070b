//! Pattern-based entity extraction (rule-based NER)
//!
//! Stateless, pure over one document's text. Two evidence classes feed the
//! extractor: curated gazetteers (high confidence, exact substring match)
//! and an ordered table of regex rules (lower confidence, stoplist-filtered).
//! Every emitted item carries a confidence score; people and locations carry
//! a context window centered on the first match.
//!
//! Output is deduplicated per document by canonical key, capped per
//! category, and kept in first-encountered order for determinism.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::constants::{
    AIRPORT_CODE_CONFIDENCE, CITY_STATE_CONFIDENCE, CONTEXT_WINDOW_CHARS, DATE_CONFIDENCE,
    DELEGATION_MIN_TEXT_LEN, DELEGATION_RICH_ENTITY_COUNT, DELEGATION_SHORT_TEXT_LEN,
    DELEGATION_SPARSE_ENTITY_COUNT, FLIGHT_DATE_WINDOW_CHARS, GAZETTEER_CONFIDENCE,
    MAX_DATES_PER_DOCUMENT, MAX_FLIGHTS_PER_DOCUMENT, MAX_LOCATIONS_PER_DOCUMENT,
    MAX_PEOPLE_PER_DOCUMENT, PATTERN_CONFIDENCE,
};
use crate::normalize::{normalize_name, EntityType};

/// Known airport codes used by both the location matcher and the flight
/// route matcher. Closed set: a 3-letter token outside this list is treated
/// as an ordinary acronym.
const AIRPORT_CODES: &[&str] = &[
    "TEB", "PBI", "JFK", "LGA", "EWR", "MIA", "FLL", "SAF", "ABQ", "CMH", "LAX", "SFO", "IAD",
    "DCA", "BOS", "ORD", "ATL", "STT", "SJU", "VNY", "LBG", "LTN", "CYA",
];

const MONTH_NAMES: &str =
    "January|February|March|April|May|June|July|August|September|October|November|December";

lazy_static! {
    /// Honorific + capitalized word(s): "Dr. Smith", "Judge Sweet", "Prince Andrew"
    static ref HONORIFIC_RE: Regex = Regex::new(
        r"\b(?:Mr|Mrs|Ms|Dr|Prof|Judge|Justice|President|Senator|Governor|Prince|Princess|Sir|Captain|Agent|Attorney)\.?\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,2})"
    ).unwrap();

    /// Two capitalized words with an optional generational suffix
    static ref CAP_PAIR_RE: Regex = Regex::new(
        r"\b([A-Z][a-z]+\s+[A-Z][a-z]+(?:\s+(?:Jr|Sr|II|III|IV))?)\b"
    ).unwrap();

    /// "City, ST" pattern
    static ref CITY_STATE_RE: Regex = Regex::new(
        r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*,\s+[A-Z]{2})\b"
    ).unwrap();

    /// Word-boundary match against the closed airport-code set
    static ref AIRPORT_RE: Regex = {
        let alternation = AIRPORT_CODES.join("|");
        Regex::new(&format!(r"\b({alternation})\b")).unwrap()
    };

    /// MM/DD/YYYY (month-first assumption, see date_from_mdy)
    static ref DATE_MDY_RE: Regex = Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap();

    /// ISO YYYY-MM-DD
    static ref DATE_ISO_RE: Regex = Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap();

    /// "March 3, 2008"
    static ref DATE_MONTH_DY_RE: Regex = Regex::new(&format!(
        r"\b({MONTH_NAMES})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b"
    )).unwrap();

    /// "3 March 2008"
    static ref DATE_D_MONTH_Y_RE: Regex = Regex::new(&format!(
        r"\b(\d{{1,2}})\s+({MONTH_NAMES})\.?,?\s+(\d{{4}})\b"
    )).unwrap();

    /// Flight route: "TEB -> PBI", "TEB-PBI", "TEB to PBI"
    static ref FLIGHT_RE: Regex = Regex::new(
        r"\b([A-Z]{3})\s*(?:->|to|-)\s*([A-Z]{3})\b"
    ).unwrap();

    /// North American phone numbers. No leading \b: a word boundary cannot
    /// sit between a space and an opening parenthesis.
    static ref PHONE_RE: Regex = Regex::new(
        r"(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b"
    ).unwrap();

    static ref EMAIL_RE: Regex = Regex::new(
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"
    ).unwrap();

    /// Dollar amounts with optional magnitude words or suffixes
    static ref MONEY_RE: Regex = Regex::new(
        r"\$\s?([\d,]+(?:\.\d+)?)\s*([Mm]illion|[Bb]illion|[Tt]housand|M|B|K)?\b"
    ).unwrap();

    /// US street addresses
    static ref ADDRESS_RE: Regex = Regex::new(
        r"\b\d{1,5}\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,3}\s+(?:Street|St|Avenue|Ave|Road|Rd|Drive|Dr|Boulevard|Blvd|Lane|Ln|Court|Ct|Way|Place|Pl)\b\.?"
    ).unwrap();
}

/// One regex rule in the ordered dispatch table
struct ExtractionRule {
    regex: &'static Regex,
    entity_type: EntityType,
    confidence: f32,
}

/// A typed entity candidate extracted from a single document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEntity {
    /// Display name as first encountered in the text
    pub name: String,

    /// Extraction reliability, [0,1]; highest evidence class wins on dedup
    pub confidence: f32,

    /// Mention events for this entity within the document
    pub mentions: usize,

    /// Snippet centered on the first match
    pub context: Option<String>,
}

/// A date candidate, normalized to YYYY-MM-DD
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDate {
    /// Raw matched substring (dedup key within a document)
    pub raw: String,

    /// Normalized YYYY-MM-DD form
    pub normalized: String,

    pub confidence: f32,
}

/// A flight route candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedFlight {
    pub origin: String,
    pub destination: String,

    /// Nearest date within the association window, or "unknown"
    pub date: String,

    pub confidence: f32,
}

/// Full per-document extraction output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub people: Vec<ExtractedEntity>,
    pub locations: Vec<ExtractedEntity>,
    pub dates: Vec<ExtractedDate>,
    pub flights: Vec<ExtractedFlight>,
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub money: Vec<String>,
    pub addresses: Vec<String>,
}

impl ExtractionResult {
    /// Total locally found entities across all categories, used by the
    /// delegation gate.
    pub fn total_found(&self) -> usize {
        self.people.len()
            + self.locations.len()
            + self.dates.len()
            + self.flights.len()
            + self.phones.len()
            + self.emails.len()
            + self.money.len()
            + self.addresses.len()
    }
}

/// Stateless pattern extractor over one document's text
pub struct PatternExtractor {
    /// Curated person names for exact, high-confidence matching
    person_gazetteer: Vec<String>,

    /// Curated location names
    location_gazetteer: Vec<String>,

    /// Known airport codes (normalized lowercase)
    airport_codes: HashSet<String>,

    /// Normalized phrases the person regex families must not emit
    /// (institutional false positives: "the court", "your honor", ...)
    person_stoplist: HashSet<String>,

    // Per-category output caps
    max_people: usize,
    max_locations: usize,
    max_dates: usize,
    max_flights: usize,
}

impl PatternExtractor {
    pub fn new() -> Self {
        let person_gazetteer: Vec<String> = vec![
            "Jeffrey Epstein",
            "Ghislaine Maxwell",
            "Bill Clinton",
            "Prince Andrew",
            "Alan Dershowitz",
            "Virginia Giuffre",
            "Virginia Roberts",
            "Jean-Luc Brunel",
            "Sarah Kellen",
            "Nadia Marcinkova",
            "Alfredo Rodriguez",
            "Juan Alessi",
            "Leslie Wexner",
            "Glenn Dubin",
            "Donald Trump",
            "Courtney Wild",
            "Maria Farmer",
            "Annie Farmer",
            "Alexander Acosta",
            "Bradley Edwards",
            "David Boies",
            "Kenneth Starr",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let location_gazetteer: Vec<String> = vec![
            "Palm Beach",
            "West Palm Beach",
            "New York",
            "Manhattan",
            "Little St James",
            "Little Saint James",
            "Virgin Islands",
            "St Thomas",
            "Paris",
            "London",
            "New Mexico",
            "Santa Fe",
            "Zorro Ranch",
            "El Brillo Way",
            "Columbus",
            "Teterboro",
            "Florida",
            "Miami",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let airport_codes: HashSet<String> = AIRPORT_CODES
            .iter()
            .map(|c| c.to_lowercase())
            .collect();

        // Phrases capitalization heuristics reliably mistake for names in
        // legal text. Compared against normalized candidate keys.
        let person_stoplist: HashSet<String> = vec![
            "the court",
            "your honor",
            "the witness",
            "the defendant",
            "the plaintiff",
            "united states",
            "district court",
            "supreme court",
            "grand jury",
            "exhibit a",
            "exhibit b",
            "law firm",
            "police department",
            "attorney general",
            "notary public",
            "civil action",
            "case no",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            person_gazetteer,
            location_gazetteer,
            airport_codes,
            person_stoplist,
            max_people: MAX_PEOPLE_PER_DOCUMENT,
            max_locations: MAX_LOCATIONS_PER_DOCUMENT,
            max_dates: MAX_DATES_PER_DOCUMENT,
            max_flights: MAX_FLIGHTS_PER_DOCUMENT,
        }
    }

    /// Override the per-category caps (from PipelineConfig)
    pub fn with_caps(
        mut self,
        max_people: usize,
        max_locations: usize,
        max_dates: usize,
        max_flights: usize,
    ) -> Self {
        self.max_people = max_people;
        self.max_locations = max_locations;
        self.max_dates = max_dates;
        self.max_flights = max_flights;
        self
    }

    /// Run the full extraction pass over one document's text
    pub fn extract(&self, text: &str) -> ExtractionResult {
        let date_spans = self.extract_dates_with_spans(text);

        let mut result = ExtractionResult {
            people: self.extract_people(text),
            locations: self.extract_locations(text),
            dates: Vec::new(),
            flights: self.extract_flights(text, &date_spans),
            phones: dedup_matches(&PHONE_RE, text),
            emails: dedup_matches(&EMAIL_RE, text),
            money: self.extract_money(text),
            addresses: dedup_matches(&ADDRESS_RE, text),
        };

        result.dates = date_spans
            .into_iter()
            .take(self.max_dates)
            .map(|span| ExtractedDate {
                raw: span.raw,
                normalized: span.normalized,
                confidence: DATE_CONFIDENCE,
            })
            .collect();

        result
    }

    /// Delegation gate for the external enrichment collaborator.
    ///
    /// Returns true only if the text is long (> 5000 chars) and local
    /// extraction found almost nothing (< 3 entities). Returns false
    /// whenever local extraction found plenty (> 10) or the text is short
    /// (< 500 chars). Reproduced exactly: this threshold function decides
    /// the local/remote cost trade-off for the whole pipeline.
    pub fn needs_external_analysis(found: usize, text_len: usize) -> bool {
        if found > DELEGATION_RICH_ENTITY_COUNT || text_len < DELEGATION_SHORT_TEXT_LEN {
            return false;
        }

        text_len > DELEGATION_MIN_TEXT_LEN && found < DELEGATION_SPARSE_ENTITY_COUNT
    }

    fn extract_people(&self, text: &str) -> Vec<ExtractedEntity> {
        let mut people: Vec<ExtractedEntity> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let lower = text.to_lowercase();

        // Gazetteer pass: exact substring, all occurrences counted
        for name in &self.person_gazetteer {
            let needle = name.to_lowercase();
            let positions: Vec<usize> = lower.match_indices(&needle).map(|(i, _)| i).collect();
            if positions.is_empty() {
                continue;
            }

            let key = normalize_name(name);
            let first = positions[0];
            let entry = ExtractedEntity {
                name: name.clone(),
                confidence: GAZETTEER_CONFIDENCE,
                mentions: positions.len(),
                context: Some(context_window(text, first, first + needle.len())),
            };
            index.insert(key, people.len());
            people.push(entry);
        }

        // Regex rule table, applied in order through one dispatch loop
        let rules = [
            ExtractionRule {
                regex: &HONORIFIC_RE,
                entity_type: EntityType::Person,
                confidence: PATTERN_CONFIDENCE,
            },
            ExtractionRule {
                regex: &CAP_PAIR_RE,
                entity_type: EntityType::Person,
                confidence: PATTERN_CONFIDENCE,
            },
        ];

        let location_keys: HashSet<String> = self
            .location_gazetteer
            .iter()
            .map(|l| normalize_name(l))
            .collect();

        for rule in &rules {
            debug_assert_eq!(rule.entity_type, EntityType::Person);
            for caps in rule.regex.captures_iter(text) {
                let m = match caps.get(1) {
                    Some(m) => m,
                    None => continue,
                };
                let key = normalize_name(m.as_str());

                if key.len() < 2
                    || self.person_stoplist.contains(&key)
                    || location_keys.contains(&key)
                {
                    continue;
                }

                if let Some(&i) = index.get(&key) {
                    // Gazetteer entries already counted every occurrence
                    if people[i].confidence < GAZETTEER_CONFIDENCE {
                        people[i].mentions += 1;
                    }
                    continue;
                }

                index.insert(key, people.len());
                people.push(ExtractedEntity {
                    name: m.as_str().to_string(),
                    confidence: rule.confidence,
                    mentions: 1,
                    context: Some(context_window(text, m.start(), m.end())),
                });
            }
        }

        people.truncate(self.max_people);
        people
    }

    fn extract_locations(&self, text: &str) -> Vec<ExtractedEntity> {
        let mut locations: Vec<ExtractedEntity> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let lower = text.to_lowercase();

        for name in &self.location_gazetteer {
            let needle = name.to_lowercase();
            let positions: Vec<usize> = lower.match_indices(&needle).map(|(i, _)| i).collect();
            if positions.is_empty() {
                continue;
            }

            let key = normalize_name(name);
            let first = positions[0];
            index.insert(key, locations.len());
            locations.push(ExtractedEntity {
                name: name.clone(),
                confidence: GAZETTEER_CONFIDENCE,
                mentions: positions.len(),
                context: Some(context_window(text, first, first + needle.len())),
            });
        }

        let rules = [
            ExtractionRule {
                regex: &AIRPORT_RE,
                entity_type: EntityType::Location,
                confidence: AIRPORT_CODE_CONFIDENCE,
            },
            ExtractionRule {
                regex: &CITY_STATE_RE,
                entity_type: EntityType::Location,
                confidence: CITY_STATE_CONFIDENCE,
            },
        ];

        for rule in &rules {
            debug_assert_eq!(rule.entity_type, EntityType::Location);
            for caps in rule.regex.captures_iter(text) {
                let m = match caps.get(1) {
                    Some(m) => m,
                    None => continue,
                };
                let key = normalize_name(m.as_str());
                if key.len() < 2 {
                    continue;
                }

                if let Some(&i) = index.get(&key) {
                    if locations[i].confidence < GAZETTEER_CONFIDENCE {
                        locations[i].mentions += 1;
                    }
                    continue;
                }

                index.insert(key, locations.len());
                locations.push(ExtractedEntity {
                    name: m.as_str().to_string(),
                    confidence: rule.confidence,
                    mentions: 1,
                    context: Some(context_window(text, m.start(), m.end())),
                });
            }
        }

        locations.truncate(self.max_locations);
        locations
    }

    /// All date matches with byte offsets, deduplicated by raw substring.
    /// Offsets feed the flight/date association window.
    fn extract_dates_with_spans(&self, text: &str) -> Vec<DateSpan> {
        let mut spans: Vec<DateSpan> = Vec::new();
        let mut seen_raw: HashSet<String> = HashSet::new();

        for caps in DATE_MDY_RE.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            if !seen_raw.insert(whole.as_str().to_string()) {
                continue;
            }
            if let Some(normalized) = date_from_ymd(&caps[3], &caps[1], &caps[2]) {
                spans.push(DateSpan::new(whole.as_str(), normalized, whole.start()));
            }
        }

        for caps in DATE_ISO_RE.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            if !seen_raw.insert(whole.as_str().to_string()) {
                continue;
            }
            if let Some(normalized) = date_from_ymd(&caps[1], &caps[2], &caps[3]) {
                spans.push(DateSpan::new(whole.as_str(), normalized, whole.start()));
            }
        }

        for caps in DATE_MONTH_DY_RE.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            if !seen_raw.insert(whole.as_str().to_string()) {
                continue;
            }
            if let Some(month) = month_number(&caps[1]) {
                if let Some(normalized) = date_from_parts(&caps[3], month, &caps[2]) {
                    spans.push(DateSpan::new(whole.as_str(), normalized, whole.start()));
                }
            }
        }

        for caps in DATE_D_MONTH_Y_RE.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            if !seen_raw.insert(whole.as_str().to_string()) {
                continue;
            }
            if let Some(month) = month_number(&caps[2]) {
                if let Some(normalized) = date_from_parts(&caps[3], month, &caps[1]) {
                    spans.push(DateSpan::new(whole.as_str(), normalized, whole.start()));
                }
            }
        }

        spans
    }

    fn extract_flights(&self, text: &str, date_spans: &[DateSpan]) -> Vec<ExtractedFlight> {
        let mut flights: Vec<ExtractedFlight> = Vec::new();
        let mut seen: HashSet<(String, String, String)> = HashSet::new();

        for caps in FLIGHT_RE.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            let origin = caps[1].to_string();
            let destination = caps[2].to_string();

            // At least one endpoint must be a known airport code
            if !self.airport_codes.contains(&origin.to_lowercase())
                && !self.airport_codes.contains(&destination.to_lowercase())
            {
                continue;
            }

            let date = nearest_date(date_spans, whole.start(), whole.end())
                .unwrap_or_else(|| "unknown".to_string());

            let dedup_key = (origin.clone(), destination.clone(), date.clone());
            if !seen.insert(dedup_key) {
                continue;
            }

            flights.push(ExtractedFlight {
                origin,
                destination,
                date,
                confidence: AIRPORT_CODE_CONFIDENCE,
            });

            if flights.len() >= self.max_flights {
                break;
            }
        }

        flights
    }

    fn extract_money(&self, text: &str) -> Vec<String> {
        let mut amounts: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for caps in MONEY_RE.captures_iter(text) {
            let digits = caps[1].replace(',', "");
            let value: f64 = match digits.parse() {
                Ok(v) => v,
                Err(_) => continue,
            };

            let multiplier = match caps.get(2).map(|m| m.as_str().to_lowercase()) {
                Some(s) if s == "million" || s == "m" => 1_000_000.0,
                Some(s) if s == "billion" || s == "b" => 1_000_000_000.0,
                Some(s) if s == "thousand" || s == "k" => 1_000.0,
                _ => 1.0,
            };

            let formatted = format_usd(value * multiplier);
            if seen.insert(formatted.clone()) {
                amounts.push(formatted);
            }
        }

        amounts
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// A date match with its byte offset in the source text
struct DateSpan {
    raw: String,
    normalized: String,
    start: usize,
}

impl DateSpan {
    fn new(raw: &str, normalized: String, start: usize) -> Self {
        Self {
            raw: raw.to_string(),
            normalized,
            start,
        }
    }
}

/// Nearest normalized date whose match starts within the association window
fn nearest_date(spans: &[DateSpan], start: usize, end: usize) -> Option<String> {
    let window_start = start.saturating_sub(FLIGHT_DATE_WINDOW_CHARS);
    let window_end = end + FLIGHT_DATE_WINDOW_CHARS;

    spans
        .iter()
        .filter(|s| s.start >= window_start && s.start <= window_end)
        .min_by_key(|s| s.start.abs_diff(start))
        .map(|s| s.normalized.clone())
}

/// Validate and format a year/month/day triple, month-first assumption for
/// slash dates. Invalid calendar dates (e.g. 13/45/2008) are dropped.
fn date_from_ymd(year: &str, month: &str, day: &str) -> Option<String> {
    let y: i32 = year.parse().ok()?;
    let m: u32 = month.parse().ok()?;
    let d: u32 = day.parse().ok()?;
    date_checked(y, m, d)
}

fn date_from_parts(year: &str, month: u32, day: &str) -> Option<String> {
    let y: i32 = year.parse().ok()?;
    let d: u32 = day.parse().ok()?;
    date_checked(y, month, d)
}

fn date_checked(y: i32, m: u32, d: u32) -> Option<String> {
    chrono::NaiveDate::from_ymd_opt(y, m, d)?;
    Some(format!("{y:04}-{m:02}-{d:02}"))
}

fn month_number(name: &str) -> Option<u32> {
    match name {
        "January" => Some(1),
        "February" => Some(2),
        "March" => Some(3),
        "April" => Some(4),
        "May" => Some(5),
        "June" => Some(6),
        "July" => Some(7),
        "August" => Some(8),
        "September" => Some(9),
        "October" => Some(10),
        "November" => Some(11),
        "December" => Some(12),
        _ => None,
    }
}

/// Format a dollar value as a USD string with thousands separators
fn format_usd(value: f64) -> String {
    let negative = value < 0.0;
    // Round in integer cents so values like 1.999 carry into the dollars
    let total_cents = (value.abs() * 100.0).round() as u64;
    let integer = total_cents / 100;
    let cents = total_cents % 100;

    let mut grouped = String::new();
    let digits = integer.to_string();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    if cents > 0 {
        format!("{sign}${grouped}.{cents:02}")
    } else {
        format!("{sign}${grouped}")
    }
}

/// Snippet of CONTEXT_WINDOW_CHARS bytes centered on a match, snapped to
/// char boundaries so multi-byte text never panics
fn context_window(text: &str, start: usize, end: usize) -> String {
    let half = CONTEXT_WINDOW_CHARS / 2;
    let mut from = start.saturating_sub(half);
    let mut to = (end + half).min(text.len());

    while from > 0 && !text.is_char_boundary(from) {
        from -= 1;
    }
    while to < text.len() && !text.is_char_boundary(to) {
        to += 1;
    }

    text[from..to].trim().to_string()
}

/// Find-all with order-preserving dedup, for the flat string categories
fn dedup_matches(regex: &Regex, text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for m in regex.find_iter(text) {
        if seen.insert(m.as_str()) {
            out.push(m.as_str().to_string());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gazetteer_person_high_confidence() {
        let extractor = PatternExtractor::new();
        let result = extractor.extract("The deposition of Jeffrey Epstein was taken on record.");

        let person = result
            .people
            .iter()
            .find(|p| p.name == "Jeffrey Epstein")
            .expect("gazetteer hit");
        assert_eq!(person.confidence, GAZETTEER_CONFIDENCE);
        assert!(person.context.as_ref().unwrap().contains("deposition"));
    }

    #[test]
    fn test_gazetteer_counts_mentions() {
        let extractor = PatternExtractor::new();
        let result =
            extractor.extract("Jeffrey Epstein called. Later, Jeffrey Epstein called again.");

        let person = result.people.iter().find(|p| p.name == "Jeffrey Epstein");
        assert_eq!(person.unwrap().mentions, 2);
    }

    #[test]
    fn test_honorific_pattern_confidence() {
        let extractor = PatternExtractor::new();
        let result = extractor.extract("Present in chambers was Judge Marra reviewing motions.");

        let person = result
            .people
            .iter()
            .find(|p| p.name.contains("Marra"))
            .expect("honorific match");
        assert_eq!(person.confidence, PATTERN_CONFIDENCE);
    }

    #[test]
    fn test_stoplist_filters_institutional_phrases() {
        let extractor = PatternExtractor::new();
        let result = extractor.extract("The Court instructed counsel. Your Honor agreed.");

        assert!(result
            .people
            .iter()
            .all(|p| normalize_name(&p.name) != "the court"
                && normalize_name(&p.name) != "your honor"));
    }

    #[test]
    fn test_location_gazetteer_not_mistaken_for_person() {
        let extractor = PatternExtractor::new();
        let result = extractor.extract("They met in Palm Beach that winter.");

        assert!(result.people.iter().all(|p| p.name != "Palm Beach"));
        assert!(result.locations.iter().any(|l| l.name == "Palm Beach"));
    }

    #[test]
    fn test_airport_code_location() {
        let extractor = PatternExtractor::new();
        let result = extractor.extract("Arrival at TEB was logged at noon.");

        let loc = result
            .locations
            .iter()
            .find(|l| l.name == "TEB")
            .expect("airport code");
        assert_eq!(loc.confidence, AIRPORT_CODE_CONFIDENCE);
    }

    #[test]
    fn test_city_state_pattern() {
        let extractor = PatternExtractor::new();
        let result = extractor.extract("The office in Columbus, OH handled the paperwork.");

        // "Columbus" alone also hits the gazetteer; the comma pattern emits
        // the combined form at its own confidence.
        let loc = result
            .locations
            .iter()
            .find(|l| l.name == "Columbus, OH")
            .expect("city-state");
        assert_eq!(loc.confidence, CITY_STATE_CONFIDENCE);
    }

    #[test]
    fn test_date_normalization_families() {
        let extractor = PatternExtractor::new();
        let result = extractor
            .extract("Seen on March 3, 2008 and again 03/04/2008, then 2008-12-01 and 5 June 2009.");

        let normalized: Vec<&str> = result.dates.iter().map(|d| d.normalized.as_str()).collect();
        assert!(normalized.contains(&"2008-03-03"));
        assert!(normalized.contains(&"2008-03-04")); // month-first assumption
        assert!(normalized.contains(&"2008-12-01"));
        assert!(normalized.contains(&"2009-06-05"));
    }

    #[test]
    fn test_invalid_calendar_date_dropped() {
        let extractor = PatternExtractor::new();
        let result = extractor.extract("Filed 13/45/2008 according to the clerk.");
        assert!(result.dates.is_empty());
    }

    #[test]
    fn test_date_dedup_by_raw_substring() {
        let extractor = PatternExtractor::new();
        let result = extractor.extract("On 03/04/2008 and once more on 03/04/2008.");
        assert_eq!(result.dates.len(), 1);
    }

    #[test]
    fn test_flight_with_nearby_date() {
        let extractor = PatternExtractor::new();
        let result = extractor.extract("Flight log: 03/04/2008 TEB -> PBI, two passengers.");

        assert_eq!(result.flights.len(), 1);
        let flight = &result.flights[0];
        assert_eq!(flight.origin, "TEB");
        assert_eq!(flight.destination, "PBI");
        assert_eq!(flight.date, "2008-03-04");
    }

    #[test]
    fn test_flight_without_date_is_unknown() {
        let extractor = PatternExtractor::new();
        let result = extractor.extract("Route TEB to PBI appears in the manifest.");

        assert_eq!(result.flights.len(), 1);
        assert_eq!(result.flights[0].date, "unknown");
    }

    #[test]
    fn test_flight_requires_known_code() {
        let extractor = PatternExtractor::new();
        let result = extractor.extract("Codes ZZZ -> QQQ mean nothing here.");
        assert!(result.flights.is_empty());
    }

    #[test]
    fn test_money_normalization() {
        let extractor = PatternExtractor::new();
        let result = extractor.extract("A settlement of $2.5 million was discussed.");
        assert_eq!(result.money, vec!["$2,500,000"]);
    }

    #[test]
    fn test_money_fractional_rounding_carries() {
        let extractor = PatternExtractor::new();
        let result = extractor.extract("A fee of $1.999 was billed, then $2.999 more.");
        assert!(result.money.contains(&"$2".to_string()));
        assert!(result.money.contains(&"$3".to_string()));
    }

    #[test]
    fn test_money_suffix_forms() {
        let extractor = PatternExtractor::new();
        let result = extractor.extract("Transfers of $3K and $1.2B were flagged.");
        assert!(result.money.contains(&"$3,000".to_string()));
        assert!(result.money.contains(&"$1,200,000,000".to_string()));
    }

    #[test]
    fn test_email_and_phone() {
        let extractor = PatternExtractor::new();
        let result = extractor.extract("Contact jane@example.com or call (561) 555-0142.");
        assert_eq!(result.emails, vec!["jane@example.com"]);
        assert_eq!(result.phones.len(), 1);
    }

    #[test]
    fn test_delegation_gate_exact_thresholds() {
        // Long and sparse: delegate
        assert!(PatternExtractor::needs_external_analysis(2, 6000));
        // Rich local results: never delegate
        assert!(!PatternExtractor::needs_external_analysis(11, 6000));
        // Short text: never delegate
        assert!(!PatternExtractor::needs_external_analysis(0, 400));
        // Boundary: 5000 is not > 5000
        assert!(!PatternExtractor::needs_external_analysis(2, 5000));
        // Boundary: 3 found is not < 3
        assert!(!PatternExtractor::needs_external_analysis(3, 6000));
    }

    #[test]
    fn test_people_cap_preserves_order() {
        let extractor = PatternExtractor::new().with_caps(3, 50, 100, 50);
        let text = "Alice Adams met Bob Brown, Carol Clark, Dan Drake and Eve Evans.";
        let result = extractor.extract(text);

        assert_eq!(result.people.len(), 3);
        assert_eq!(result.people[0].name, "Alice Adams");
    }

    #[test]
    fn test_context_window_multibyte_safe() {
        let extractor = PatternExtractor::new();
        let text = "ééééééé Jeffrey Epstein ééééééé";
        let result = extractor.extract(text);
        assert!(!result.people.is_empty()); // must not panic on boundaries
    }
}
