//! Pre-authored symptom triage tree.
//!
//! The opening prompt is the root question. Each user utterance answers the
//! question in front of it; the policy replays all answers from the root, so
//! the same transcript always lands on the same node. Answers that cannot be
//! read as yes or no take the node's default branch.

use async_trait::async_trait;

use arogya_core::models::intake::{IntakeKind, Locale};
use arogya_core::models::outcome::{RiskLevel, TriageResult};
use arogya_core::models::transcript::MAX_TURNS;

use super::{BranchPolicy, Decision, PolicyInput, TerminalOutcome};
use crate::error::TreeError;
use crate::prompts::{self, Bilingual};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symptom {
    Fever,
    Cough,
    BreathingDifficulty,
    SevereWeakness,
    VomitingDiarrhoea,
}

impl Symptom {
    /// Key accepted in `key=value` answers.
    pub fn key(&self) -> &'static str {
        match self {
            Symptom::Fever => "fever",
            Symptom::Cough => "cough",
            Symptom::BreathingDifficulty => "breathing",
            Symptom::SevereWeakness => "weakness",
            Symptom::VomitingDiarrhoea => "vomiting",
        }
    }

    pub fn is_red_flag(&self) -> bool {
        matches!(self, Symptom::BreathingDifficulty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Unknown,
}

/// Read an utterance as a yes/no answer about `symptom`.
///
/// Accepts yes/no words in English, romanized Hindi and Devanagari, and
/// `key=value` forms such as `fever=true`. A `key=value` answer about a
/// different symptom is `Unknown`.
pub fn parse_answer(text: &str, symptom: Symptom) -> Answer {
    let normalized = text
        .trim()
        .trim_end_matches(['.', '!', '?', '।'])
        .trim()
        .to_lowercase();

    let value = match normalized.split_once('=') {
        Some((key, value)) if key.trim() == symptom.key() => value.trim(),
        Some(_) => return Answer::Unknown,
        None => normalized.as_str(),
    };
    let word = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .next()
        .unwrap_or("");

    match word {
        "yes" | "y" | "true" | "1" | "haan" | "han" | "ha" | "हाँ" | "हां" | "हा" => {
            Answer::Yes
        }
        "no" | "n" | "false" | "0" | "nahin" | "nahi" | "na" | "नहीं" | "नही" | "ना" => {
            Answer::No
        }
        _ => Answer::Unknown,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Ask(&'static str),
    Conclude,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: &'static str,
    pub symptom: Symptom,
    pub question: Bilingual,
    pub on_yes: Branch,
    pub on_no: Branch,
    /// Taken for answers that are neither yes nor no ("skip").
    pub default: bool,
}

impl Node {
    fn branch(&self, present: bool) -> Branch {
        if present { self.on_yes } else { self.on_no }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finding {
    pub symptom: Symptom,
    pub present: bool,
}

/// Where replaying a list of answers ends up.
#[derive(Debug)]
pub struct Walk<'a> {
    pub findings: Vec<Finding>,
    /// Next question to ask, `None` once the tree concludes.
    pub next: Option<&'a Node>,
}

#[derive(Debug, Clone)]
pub struct TriageTree {
    root: &'static str,
    nodes: Vec<Node>,
}

impl TriageTree {
    pub fn new(root: &'static str, nodes: Vec<Node>) -> Self {
        Self { root, nodes }
    }

    /// Fever first, then the respiratory set or the general set.
    pub fn standard() -> Self {
        Self::new(
            "fever",
            vec![
                Node {
                    id: "fever",
                    symptom: Symptom::Fever,
                    question: Bilingual::new(
                        "क्या मरीज़ को बुखार है?",
                        "Does the patient have fever?",
                    ),
                    on_yes: Branch::Ask("cough"),
                    on_no: Branch::Ask("weakness"),
                    default: false,
                },
                Node {
                    id: "cough",
                    symptom: Symptom::Cough,
                    question: Bilingual::new(
                        "क्या मरीज़ को खांसी है?",
                        "Does the patient have a cough?",
                    ),
                    on_yes: Branch::Ask("breathing"),
                    on_no: Branch::Ask("breathing"),
                    default: false,
                },
                Node {
                    id: "breathing",
                    symptom: Symptom::BreathingDifficulty,
                    question: Bilingual::new(
                        "क्या मरीज़ को सांस लेने में तकलीफ़ है?",
                        "Does the patient have difficulty breathing?",
                    ),
                    on_yes: Branch::Conclude,
                    on_no: Branch::Conclude,
                    default: false,
                },
                Node {
                    id: "weakness",
                    symptom: Symptom::SevereWeakness,
                    question: Bilingual::new(
                        "क्या मरीज़ को बहुत ज़्यादा कमज़ोरी है?",
                        "Does the patient feel severe weakness?",
                    ),
                    on_yes: Branch::Ask("vomiting"),
                    on_no: Branch::Ask("vomiting"),
                    default: false,
                },
                Node {
                    id: "vomiting",
                    symptom: Symptom::VomitingDiarrhoea,
                    question: Bilingual::new(
                        "क्या मरीज़ को उल्टी या दस्त हो रहे हैं?",
                        "Does the patient have vomiting or diarrhoea?",
                    ),
                    on_yes: Branch::Conclude,
                    on_no: Branch::Conclude,
                    default: false,
                },
            ],
        )
    }

    pub fn root(&self) -> Option<&Node> {
        self.node(self.root)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Check that every branch resolves and no path asks more than
    /// `max_questions` questions.
    pub fn validate(&self, max_questions: u32) -> Result<(), TreeError> {
        let root = self.root().ok_or(TreeError::MissingRoot(self.root))?;
        self.validate_from(root, 1, max_questions)
    }

    fn validate_from(&self, node: &Node, depth: u32, max: u32) -> Result<(), TreeError> {
        if depth > max {
            return Err(TreeError::TooDeep {
                node: node.id,
                depth,
                max,
            });
        }
        for branch in [node.on_yes, node.on_no] {
            if let Branch::Ask(to) = branch {
                let child = self.node(to).ok_or(TreeError::MissingNode { from: node.id, to })?;
                self.validate_from(child, depth + 1, max)?;
            }
        }
        Ok(())
    }

    /// Replay `answers` from the root.
    pub fn walk(&self, answers: &[&str]) -> Walk<'_> {
        let mut findings = Vec::with_capacity(answers.len());
        let mut current = self.root();

        for text in answers {
            let Some(node) = current else { break };
            let present = match parse_answer(text, node.symptom) {
                Answer::Yes => true,
                Answer::No => false,
                Answer::Unknown => node.default,
            };
            findings.push(Finding {
                symptom: node.symptom,
                present,
            });
            current = match node.branch(present) {
                Branch::Ask(id) => self.node(id),
                Branch::Conclude => None,
            };
        }

        Walk {
            findings,
            next: current,
        }
    }

    /// Every yes/no answer sequence from the root to a conclusion.
    pub fn answer_paths(&self) -> Vec<Vec<bool>> {
        let mut paths = Vec::new();
        if let Some(root) = self.root() {
            self.collect_paths(root, &mut Vec::new(), &mut paths);
        }
        paths
    }

    fn collect_paths(&self, node: &Node, prefix: &mut Vec<bool>, out: &mut Vec<Vec<bool>>) {
        for present in [true, false] {
            prefix.push(present);
            match node.branch(present) {
                Branch::Ask(id) => match self.node(id) {
                    Some(child) => self.collect_paths(child, prefix, out),
                    None => out.push(prefix.clone()),
                },
                Branch::Conclude => out.push(prefix.clone()),
            }
            prefix.pop();
        }
    }
}

struct Assessment {
    diagnosis: Bilingual,
    recommendations: &'static [Bilingual],
    confidence: f64,
}

const RESPIRATORY_DISTRESS: Assessment = Assessment {
    diagnosis: Bilingual::new("सांस की गंभीर तकलीफ़ की आशंका", "Possible respiratory distress"),
    recommendations: &[
        Bilingual::new(
            "आज ही नज़दीकी स्वास्थ्य केंद्र ले जाएं",
            "Take the patient to the nearest health centre today",
        ),
        Bilingual::new("मरीज़ को सीधा बैठाकर रखें", "Keep the patient sitting upright"),
        Bilingual::new(
            "होंठ नीले पड़ें या सांस बिगड़े तो एम्बुलेंस बुलाएं",
            "Call an ambulance if the lips turn blue or breathing worsens",
        ),
    ],
    confidence: 0.85,
};

const MULTIPLE_SYMPTOMS: Assessment = Assessment {
    diagnosis: Bilingual::new("कई गंभीर लक्षण", "Multiple concerning symptoms"),
    recommendations: &[
        Bilingual::new("24 घंटे के अंदर डॉक्टर को दिखाएं", "See a doctor within 24 hours"),
        Bilingual::new("तरल पदार्थ देते रहें", "Keep giving fluids"),
    ],
    confidence: 0.7,
};

const RESPIRATORY_INFECTION: Assessment = Assessment {
    diagnosis: Bilingual::new("श्वसन संक्रमण की आशंका", "Possible respiratory infection"),
    recommendations: &[
        Bilingual::new("आराम करें और पानी पीते रहें", "Rest and hydration"),
        Bilingual::new("तापमान पर नज़र रखें", "Monitor temperature"),
        Bilingual::new(
            "तीन दिन में आराम न मिले तो डॉक्टर से मिलें",
            "See a doctor if there is no improvement in three days",
        ),
    ],
    confidence: 0.7,
};

const DEHYDRATION: Assessment = Assessment {
    diagnosis: Bilingual::new("पानी की कमी (डिहाइड्रेशन) की आशंका", "Possible dehydration"),
    recommendations: &[
        Bilingual::new("ओआरएस का घोल बार-बार दें", "Give ORS solution frequently"),
        Bilingual::new(
            "पेशाब कम हो तो स्वास्थ्य केंद्र जाएं",
            "Visit the health centre if urine output drops",
        ),
    ],
    confidence: 0.7,
};

const NEEDS_MONITORING: Assessment = Assessment {
    diagnosis: Bilingual::new("लक्षणों पर नज़र रखना ज़रूरी", "Symptoms need monitoring"),
    recommendations: &[
        Bilingual::new("आराम करें और पानी पीते रहें", "Rest and hydration"),
        Bilingual::new(
            "लक्षण बढ़ने पर डॉक्टर से मिलें",
            "Consult a doctor if symptoms worsen",
        ),
    ],
    confidence: 0.6,
};

const MILD_FEVER: Assessment = Assessment {
    diagnosis: Bilingual::new("हल्का बुखार", "Mild fever"),
    recommendations: &[
        Bilingual::new("आराम करें और पानी पीते रहें", "Rest and hydration"),
        Bilingual::new("तापमान पर नज़र रखें", "Monitor temperature"),
    ],
    confidence: 0.7,
};

const NO_SIGNIFICANT_SYMPTOMS: Assessment = Assessment {
    diagnosis: Bilingual::new("कोई गंभीर लक्षण नहीं", "No significant symptoms"),
    recommendations: &[Bilingual::new(
        "नए लक्षण दिखें तो फिर से जांच करें",
        "Check again if new symptoms appear",
    )],
    confidence: 0.6,
};

/// Apply the risk rule table to the collected findings.
///
/// A red-flag symptom or three positives is HIGH, two positives MEDIUM,
/// anything else LOW.
pub fn assess(findings: &[Finding], locale: Locale) -> TriageResult {
    let has = |symptom: Symptom| {
        findings
            .iter()
            .any(|f| f.symptom == symptom && f.present)
    };
    let positives = findings.iter().filter(|f| f.present).count();
    let red_flag = findings.iter().any(|f| f.present && f.symptom.is_red_flag());

    let (risk_level, assessment) = if red_flag {
        (RiskLevel::High, &RESPIRATORY_DISTRESS)
    } else if positives >= 3 {
        (RiskLevel::High, &MULTIPLE_SYMPTOMS)
    } else if positives == 2 {
        let assessment = if has(Symptom::Fever) && has(Symptom::Cough) {
            &RESPIRATORY_INFECTION
        } else if has(Symptom::SevereWeakness) && has(Symptom::VomitingDiarrhoea) {
            &DEHYDRATION
        } else {
            &NEEDS_MONITORING
        };
        (RiskLevel::Medium, assessment)
    } else if has(Symptom::Fever) {
        (RiskLevel::Low, &MILD_FEVER)
    } else if positives == 1 {
        (RiskLevel::Low, &NEEDS_MONITORING)
    } else {
        (RiskLevel::Low, &NO_SIGNIFICANT_SYMPTOMS)
    };

    TriageResult {
        risk_level,
        diagnosis: assessment.diagnosis.get(locale).to_string(),
        recommendations: assessment
            .recommendations
            .iter()
            .map(|r| r.get(locale).to_string())
            .collect(),
        confidence: assessment.confidence,
    }
}

/// Triage over a [`TriageTree`].
pub struct StaticTriagePolicy {
    tree: TriageTree,
}

impl StaticTriagePolicy {
    /// Wrap a tree after checking it fits within the turn budget.
    pub fn new(tree: TriageTree) -> Result<Self, TreeError> {
        tree.validate(MAX_TURNS)?;
        Ok(Self { tree })
    }

    pub fn standard() -> Self {
        Self {
            tree: TriageTree::standard(),
        }
    }

    pub fn tree(&self) -> &TriageTree {
        &self.tree
    }

    /// Synchronous core of [`BranchPolicy::next`].
    pub fn decide(&self, input: &PolicyInput) -> Decision {
        let answers = input.transcript.completed_user_turns();
        let walk = self.tree.walk(&answers);

        match walk.next {
            Some(node) if !input.is_final_turn() => {
                Decision::Question(node.question.get(input.locale).to_string())
            }
            _ => Decision::Terminal(TerminalOutcome::Triage(assess(
                &walk.findings,
                input.locale,
            ))),
        }
    }
}

#[async_trait]
impl BranchPolicy for StaticTriagePolicy {
    async fn next(&self, input: &PolicyInput) -> Decision {
        self.decide(input)
    }

    fn name(&self) -> &'static str {
        "static_triage"
    }

    fn opening_prompt(&self, kind: IntakeKind, locale: Locale) -> String {
        match self.tree.root() {
            Some(root) => root.question.get(locale).to_string(),
            None => prompts::opening_prompt(kind).get(locale).to_string(),
        }
    }
}
