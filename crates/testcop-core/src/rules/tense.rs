use crate::complaint::Complaint;
use crate::rules::Rule;
use crate::tagger::Tagger;
use crate::types::{TestCase, TestUnit};

/// Pronoun put in front of the name so the tagger sees a full sentence.
const SUBJECT: &str = "he";

/// Heuristic check for a third-person-singular verb at the start of a name:
/// the character before the first upper-case letter is `s`, or the last
/// character is `s` when there is no upper-case letter.
pub fn is_present_tense(name: &str) -> bool {
    let mut previous = None;
    for c in name.chars() {
        if c.is_uppercase() {
            return previous == Some('s');
        }
        previous = Some(c);
    }
    previous == Some('s')
}

/// Split a camelCase name into lower-cased words.
fn words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in name.chars() {
        if c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn not_present(rule: &str, unit: &TestUnit, case: &TestCase) -> Complaint {
    Complaint::tagged(
        rule,
        format!(
            "Test name '{}' doesn't follow naming rules, because test name should be in present tense, test class: {}",
            case.name(),
            unit.name()
        ),
    )
    .linked("Start the name with a verb in present simple, e.g. 'creates', 'removes', 'returns'")
}

/// Test names start with a verb in present simple, by a character heuristic.
pub struct RulePresentTense<'a> {
    unit: &'a TestUnit,
    case: &'a TestCase,
}

impl<'a> RulePresentTense<'a> {
    pub const NAMES: &'static [&'static str] = &["RulePresentTense", "RuleAllTestsInPresentTense"];

    pub fn new(unit: &'a TestUnit, case: &'a TestCase) -> Self {
        Self { unit, case }
    }
}

impl Rule for RulePresentTense<'_> {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn complaints(&self) -> Vec<Complaint> {
        if is_present_tense(self.case.name()) {
            Vec::new()
        } else {
            vec![not_present(self.name(), self.unit, self.case)]
        }
    }
}

/// Test names start with a verb, according to a part-of-speech tagger.
pub struct RulePresentSimple<'a> {
    unit: &'a TestUnit,
    case: &'a TestCase,
    tagger: &'a dyn Tagger,
}

impl<'a> RulePresentSimple<'a> {
    pub const NAMES: &'static [&'static str] = &["RulePresentSimple"];

    pub fn new(unit: &'a TestUnit, case: &'a TestCase, tagger: &'a dyn Tagger) -> Self {
        Self { unit, case, tagger }
    }
}

impl Rule for RulePresentSimple<'_> {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn complaints(&self) -> Vec<Complaint> {
        let mut sentence = vec![SUBJECT.to_string()];
        sentence.extend(words(self.case.name()));
        let tags = self.tagger.tag(&sentence);
        let verb = tags.get(1).is_some_and(|t| t.is_verb());
        tracing::trace!(case = self.case.name(), ?tags, "tagged test name");
        if verb {
            Vec::new()
        } else {
            vec![not_present(self.name(), self.unit, self.case)]
        }
    }
}
