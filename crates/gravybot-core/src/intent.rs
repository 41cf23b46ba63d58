//! Line classification.
//!
//! Every rule is speaker-scoped: a line that does not open with a `[Name(#123)]` tag
//! never reaches the rule table. The table is ordered; the first rule that matches
//! decides the intent and no later rule is tried.

use regex::Regex;

use crate::{errors::Error, Result};

const SPEAKER_TAG: &str = r"^\[.*?\((#\d+)\)\]";
const URL_SWEEP: &str = r#"(?:http:|https:|ftp:|ftps:|telnet:|telnets:|ssh:|www\.)[^\s"]+"#;
/// Speaker tag plus an optional display name, as echoed by the server.
const SPOKEN_BY: &str = r"\[.*\(#\d+\)\](?: .+)?";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuleId {
    UrlBatch,
    Hangout,
    Home,
    Translate,
    Weather,
    Stock,
}

/// A classified line: the rule that matched, who said it, and what it captured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Intent {
    pub rule: RuleId,
    /// `#<digits>` db ref of the speaker.
    pub speaker: String,
    pub captures: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exactly(want) => n == want,
            Arity::AtLeast(min) => n >= min,
        }
    }
}

#[derive(Clone, Debug)]
enum Matcher {
    /// Every non-overlapping match anywhere in the line is one capture.
    Sweep(Regex),
    /// Capture groups of the first match are the captures.
    Groups(Regex),
}

#[derive(Clone, Debug)]
pub struct Rule {
    pub id: RuleId,
    matcher: Matcher,
    arity: Arity,
}

impl Rule {
    pub fn sweep(id: RuleId, pattern: &str) -> Result<Self> {
        Ok(Self {
            id,
            matcher: Matcher::Sweep(compile(pattern)?),
            arity: Arity::AtLeast(1),
        })
    }

    pub fn groups(id: RuleId, pattern: &str, arity: usize) -> Result<Self> {
        Ok(Self {
            id,
            matcher: Matcher::Groups(compile(pattern)?),
            arity: Arity::Exactly(arity),
        })
    }

    /// `None` when the rule does not match at all.
    fn apply(&self, line: &str) -> Option<Vec<String>> {
        match &self.matcher {
            Matcher::Sweep(re) => {
                let found: Vec<String> = re
                    .find_iter(line)
                    .map(|m| m.as_str().to_string())
                    .collect();
                (!found.is_empty()).then_some(found)
            }
            Matcher::Groups(re) => {
                let caps = re.captures(line)?;
                Some(
                    caps.iter()
                        .skip(1)
                        .flatten()
                        .map(|m| m.as_str().to_string())
                        .collect(),
                )
            }
        }
    }
}

/// The built-in rule table, in precedence order.
pub fn default_rules(trigger: &str) -> Result<Vec<Rule>> {
    let t = regex::escape(trigger);
    Ok(vec![
        Rule::sweep(RuleId::UrlBatch, URL_SWEEP)?,
        Rule::groups(RuleId::Hangout, &format!("{SPOKEN_BY} pages: hangout$"), 0)?,
        Rule::groups(RuleId::Home, &format!("{SPOKEN_BY} pages: home$"), 0)?,
        Rule::groups(
            RuleId::Translate,
            &format!(r#"(?i){SPOKEN_BY} says "{t},? translate (\S+) (\S+) (.*)"$"#),
            3,
        )?,
        Rule::groups(
            RuleId::Weather,
            &format!(r#"(?i){SPOKEN_BY} says "{t},? weather (.+)"$"#),
            1,
        )?,
        Rule::groups(
            RuleId::Stock,
            &format!(r#"(?i){SPOKEN_BY} says "(?:gbs|{t},? stock) (.+)"$"#),
            1,
        )?,
    ])
}

#[derive(Clone, Debug)]
pub struct Classifier {
    speaker: Regex,
    rules: Vec<Rule>,
}

impl Classifier {
    pub fn new(trigger: &str) -> Result<Self> {
        Self::with_rules(default_rules(trigger)?)
    }

    pub fn with_rules(rules: Vec<Rule>) -> Result<Self> {
        Ok(Self {
            speaker: compile(SPEAKER_TAG)?,
            rules,
        })
    }

    /// Classify one trimmed line. Pure: the same line always yields the same result.
    pub fn classify(&self, line: &str) -> Option<Intent> {
        let speaker = self.speaker.captures(line)?.get(1)?.as_str().to_string();

        for rule in &self.rules {
            let Some(captures) = rule.apply(line) else {
                continue;
            };

            if !rule.arity.accepts(captures.len()) {
                tracing::warn!(
                    rule = ?rule.id,
                    expected = ?rule.arity,
                    got = captures.len(),
                    "capture count mismatch; ignoring line"
                );
                return None;
            }

            return Some(Intent {
                rule: rule.id,
                speaker,
                captures,
            });
        }

        None
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Config(format!("invalid rule pattern {pattern:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new("Gravybot").unwrap()
    }

    fn intent(rule: RuleId, captures: &[&str]) -> Option<Intent> {
        Some(Intent {
            rule,
            speaker: "#42".to_string(),
            captures: captures.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn untagged_lines_have_no_intent() {
        let c = classifier();
        assert_eq!(c.classify("hello world"), None);
        assert_eq!(c.classify("see http://example.com"), None);
        assert_eq!(c.classify("Bob pages: home"), None);
        assert_eq!(c.classify(""), None);
    }

    #[test]
    fn unrecognized_speech_has_no_intent() {
        assert_eq!(classifier().classify(r#"[Bob(#42)] says "hi""#), None);
    }

    #[test]
    fn page_phrases_map_to_fixed_intents() {
        let c = classifier();
        assert_eq!(c.classify("[Bob(#42)] pages: home"), intent(RuleId::Home, &[]));
        assert_eq!(
            c.classify("[Bob(#42)] Bob pages: hangout"),
            intent(RuleId::Hangout, &[])
        );
        assert_eq!(c.classify("[Bob(#42)] Bob pages: home please"), None);
    }

    #[test]
    fn urls_are_swept_in_order() {
        let got = classifier()
            .classify("[Bob(#42)] check this out http://example.com/a and www.example.org");
        assert_eq!(
            got,
            intent(RuleId::UrlBatch, &["http://example.com/a", "www.example.org"])
        );
    }

    #[test]
    fn url_stops_at_double_quote() {
        let got = classifier().classify(r#"[Bob(#42)] says "look: https://x.io/p?q=1""#);
        assert_eq!(got, intent(RuleId::UrlBatch, &["https://x.io/p?q=1"]));
    }

    #[test]
    fn url_sweep_preempts_commands() {
        let got = classifier()
            .classify(r#"[Bob(#42)] says "Gravybot weather ssh://host.example""#);
        assert_eq!(got.map(|i| i.rule), Some(RuleId::UrlBatch));
    }

    #[test]
    fn weather_stock_and_translate_capture_arguments() {
        let c = classifier();
        assert_eq!(
            c.classify(r#"[Bob(#42)] says "Gravybot weather Austin TX""#),
            intent(RuleId::Weather, &["Austin TX"])
        );
        assert_eq!(
            c.classify(r#"[Bob(#42)] Bob says "gravybot, WEATHER London""#),
            intent(RuleId::Weather, &["London"])
        );
        assert_eq!(
            c.classify(r#"[Bob(#42)] says "gbs apple inc""#),
            intent(RuleId::Stock, &["apple inc"])
        );
        assert_eq!(
            c.classify(r#"[Bob(#42)] says "Gravybot stock MSFT""#),
            intent(RuleId::Stock, &["MSFT"])
        );
        assert_eq!(
            c.classify(r#"[Bob(#42)] says "Gravybot translate en fr good morning, friend""#),
            intent(RuleId::Translate, &["en", "fr", "good morning, friend"])
        );
    }

    #[test]
    fn trigger_is_configurable_and_escaped() {
        let c = Classifier::new("Bot.9").unwrap();
        assert_eq!(
            c.classify(r#"[Bob(#42)] says "Bot.9 weather Oslo""#),
            intent(RuleId::Weather, &["Oslo"])
        );
        assert_eq!(c.classify(r#"[Bob(#42)] says "BotX9 weather Oslo""#), None);
    }

    #[test]
    fn speaker_is_taken_from_the_leading_tag() {
        let got = classifier()
            .classify(r#"[Bob(#42)] says "I am [Eve(#7)] http://a.example""#)
            .unwrap();
        assert_eq!(got.speaker, "#42");
    }

    #[test]
    fn classification_is_idempotent() {
        let c = classifier();
        let line = r#"[Bob(#42)] says "Gravybot translate de en guten tag""#;
        assert_eq!(c.classify(line), c.classify(line));
    }

    #[test]
    fn capture_count_mismatch_downgrades_to_no_intent() {
        let rules = vec![
            Rule::groups(RuleId::Weather, r#"says "w (\S+) (\S+)"$"#, 1).unwrap(),
            Rule::groups(RuleId::Stock, r#"says "w (.+)"$"#, 1).unwrap(),
        ];
        let c = Classifier::with_rules(rules).unwrap();
        assert_eq!(c.classify(r#"[Bob(#42)] says "w a b""#), None);
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        assert!(matches!(
            Rule::groups(RuleId::Home, "(unclosed", 0),
            Err(Error::Config(_))
        ));
    }
}
