//! Fixed bilingual texts spoken or shown by the engine.

use arogya_core::models::intake::{IntakeKind, Locale};
use arogya_core::models::outcome::{FailureReason, SessionResult};

/// A text in the regional language and in English.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bilingual {
    pub local: &'static str,
    pub default: &'static str,
}

impl Bilingual {
    pub const fn new(local: &'static str, default: &'static str) -> Self {
        Self { local, default }
    }

    pub fn get(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::Local => self.local,
            Locale::Default => self.default,
        }
    }
}

pub const OPENING_TRIAGE: Bilingual = Bilingual::new(
    "कृपया मरीज़ का मुख्य लक्षण बताइए।",
    "Please describe the patient's main symptom.",
);

pub const OPENING_NUTRITION: Bilingual = Bilingual::new(
    "बताइए आज आपने क्या-क्या खाया।",
    "Tell me what you have eaten today.",
);

pub const OPENING_ESCALATION: Bilingual = Bilingual::new(
    "वह समस्या बताइए जो आप डॉक्टर को दिखाना चाहते हैं।",
    "Describe the problem you want a doctor to review.",
);

pub const RETRY_CAPTURE: Bilingual = Bilingual::new(
    "मैं सुन नहीं पाया। कृपया फिर से बोलिए।",
    "I didn't catch that. Please try again.",
);

pub const ESCALATION_SENT: Bilingual = Bilingual::new(
    "आपका अनुरोध डॉक्टर को भेज दिया गया है। जवाब आने पर हम आपको बताएंगे।",
    "Your request has been sent to a doctor. We will let you know when they reply.",
);

pub const ESCALATION_FOLLOW_UPS: [Bilingual; 2] = [
    Bilingual::new(
        "यह समस्या कब शुरू हुई और कितने दिनों से है?",
        "When did this problem start, and how long has it lasted?",
    ),
    Bilingual::new(
        "क्या आपने इसके लिए कोई दवा ली है?",
        "Have you taken any medicine for it?",
    ),
];

pub const TRIAGE_QUESTION_POOL: [Bilingual; 2] = [
    Bilingual::new(
        "ये लक्षण कितने दिनों से हैं?",
        "How many days have you had these symptoms?",
    ),
    Bilingual::new(
        "क्या कोई और लक्षण है, जैसे दर्द या बुखार?",
        "Do you have any other symptoms, such as pain or fever?",
    ),
];

pub const NUTRITION_QUESTION_POOL: [Bilingual; 2] = [
    Bilingual::new(
        "आप दिन में कितनी बार भोजन करते हैं?",
        "How many meals do you eat in a day?",
    ),
    Bilingual::new(
        "क्या आप रोज़ फल, सब्जियां या दालें खाते हैं?",
        "Do you eat fruits, vegetables, or pulses every day?",
    ),
];

pub const GENERIC_DIAGNOSIS: Bilingual =
    Bilingual::new("सामान्य वायरल संक्रमण", "Common viral infection");

pub const GENERIC_RECOMMENDATIONS: [Bilingual; 3] = [
    Bilingual::new("आराम करें और पानी पीते रहें", "Rest and hydration"),
    Bilingual::new("तापमान पर नज़र रखें", "Monitor temperature"),
    Bilingual::new(
        "लक्षण बढ़ने पर डॉक्टर से मिलें",
        "Consult a doctor if symptoms worsen",
    ),
];

pub const GENERIC_NUTRITION_SUMMARY: Bilingual = Bilingual::new(
    "हर दिन ताज़ा फल और सब्जियां खाएं।",
    "Eat fresh fruits and vegetables every day.",
);

pub const SEASONAL_TIPS: [Bilingual; 3] = [
    Bilingual::new(
        "मौसमी फल जैसे अमरूद, आम या संतरा चुनें",
        "Choose seasonal fruits such as guava, mango or orange",
    ),
    Bilingual::new(
        "हर भोजन में दाल या चना शामिल करें",
        "Add dal or chickpeas to every meal",
    ),
    Bilingual::new(
        "दिन भर में पर्याप्त साफ़ पानी पिएं",
        "Drink enough clean water through the day",
    ),
];

pub fn opening_prompt(kind: IntakeKind) -> Bilingual {
    match kind {
        IntakeKind::Triage => OPENING_TRIAGE,
        IntakeKind::Nutrition => OPENING_NUTRITION,
        IntakeKind::Escalation => OPENING_ESCALATION,
    }
}

pub fn failure_message(reason: FailureReason) -> Bilingual {
    match reason {
        FailureReason::CaptureUnsupported => Bilingual::new(
            "इस डिवाइस पर आवाज़ पहचान उपलब्ध नहीं है। कृपया बटन से जवाब दें।",
            "Voice input is not available on this device. Please answer with the buttons.",
        ),
        FailureReason::CaptureDenied => Bilingual::new(
            "माइक्रोफ़ोन की अनुमति नहीं मिली। कृपया सेटिंग में अनुमति दें।",
            "Microphone permission was denied. Please allow it in settings.",
        ),
        FailureReason::Misconfigured => Bilingual::new(
            "मरीज़ की जानकारी अधूरी या गलत है। कृपया प्रोफ़ाइल जांचें।",
            "The patient details are incomplete or invalid. Please check the profile.",
        ),
    }
}

/// Short spoken summary of a finished session.
pub fn summary(result: &SessionResult, locale: Locale) -> String {
    match (result, locale) {
        (SessionResult::Triage(r), Locale::Local) => {
            format!("जोखिम स्तर: {}। {}।", r.risk_level, r.diagnosis)
        }
        (SessionResult::Triage(r), Locale::Default) => {
            format!("Risk level: {}. {}.", r.risk_level, r.diagnosis)
        }
        (SessionResult::Nutrition(r), _) => r.summary.clone(),
        (SessionResult::Escalation(_), _) => ESCALATION_SENT.get(locale).to_string(),
        (SessionResult::Failure(f), _) => f.message.clone(),
    }
}
