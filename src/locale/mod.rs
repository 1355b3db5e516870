use std::collections::HashMap;

use serde::Deserialize;

use crate::errors::ConfigError;
use crate::validate::Sentinels;
use crate::wire::{Direction, Language};

const EN_YAML: &str = include_str!("../../locales/en.yaml");
const AR_YAML: &str = include_str!("../../locales/ar.yaml");

/// Option keys that carry special meaning in the issue lists.
pub const SOFTWARE_KEY: &str = "software";
pub const OTHER_KEY: &str = "other";

macro_rules! message_keys {
    ($($variant:ident => $path:literal),+ $(,)?) => {
        /// Every user-facing message the intake flow looks up.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum MessageKey {
            $($variant),+
        }

        impl MessageKey {
            pub const ALL: &'static [MessageKey] = &[$(MessageKey::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(MessageKey::$variant => $path),+
                }
            }
        }
    };
}

message_keys! {
    HeaderTitle => "header.title",
    HeaderSubtitle => "header.subtitle",
    StepperStep1 => "stepper.step1",
    StepperStep2 => "stepper.step2",
    StepperStep3 => "stepper.step3",
    Step1Title => "step1.title",
    Step1Subtitle => "step1.subtitle",
    Step1Manufacturer => "step1.manufacturer",
    Step1Model => "step1.model",
    Step1OtherModel => "step1.otherModel",
    Step1OtherModelPlaceholder => "step1.otherModelPlaceholder",
    Step2Title => "step2.title",
    Step2Subtitle => "step2.subtitle",
    Step2MainIssue => "step2.mainIssue",
    Step2SoftwareIssue => "step2.softwareIssue",
    Step2Description => "step2.description",
    Step2DescriptionOptional => "step2.descriptionOptional",
    Step2DescriptionRequired => "step2.descriptionRequired",
    Step2DescriptionPlaceholder => "step2.descriptionPlaceholder",
    Step2DescriptionMissing => "step2.descriptionMissing",
    Step3Title => "step3.title",
    Step3Subtitle => "step3.subtitle",
    Step3ServiceMethod => "step3.serviceMethod",
    Step3StoreVisit => "step3.storeVisit",
    Step3StoreVisitDesc => "step3.storeVisitDesc",
    Step3Pickup => "step3.pickup",
    Step3PickupDesc => "step3.pickupDesc",
    Step3StoreInfo => "step3.storeInfo",
    Step3StoreName => "step3.storeName",
    Step3StoreAddress => "step3.storeAddress",
    Step3StoreAddressValue => "step3.storeAddressValue",
    Step3FullName => "step3.fullName",
    Step3MobileNumber => "step3.mobileNumber",
    Step3AddressInCity => "step3.addressInCity",
    Step3AddressPlaceholder => "step3.addressPlaceholder",
    Step3AddressNote => "step3.addressNote",
    Step3AddressRequired => "step3.addressRequired",
    Step3NameRequired => "step3.nameRequired",
    Step3NameInvalid => "step3.nameInvalid",
    Step3PhoneRequired => "step3.phoneRequired",
    Step3PhoneInvalid => "step3.phoneInvalid",
    Step3Submit => "step3.submit",
    Step4SuccessTitle => "step4.successTitle",
    Step4SuccessSubtitle => "step4.successSubtitle",
    Step4OrderNumber => "step4.orderNumber",
    Step4SummaryTitle => "step4.summaryTitle",
    Step4Name => "step4.name",
    Step4Phone => "step4.phone",
    Step4Device => "step4.device",
    Step4Issue => "step4.issue",
    Step4Address => "step4.address",
    Step4DiagnosisTitle => "step4.diagnosisTitle",
    Step4EstimatedTime => "step4.estimatedTime",
    Step4PotentialParts => "step4.potentialParts",
    Step4NoParts => "step4.noParts",
    Step4Notes => "step4.notes",
    Step4ImportantNote => "step4.importantNote",
    Step4NoteText => "step4.noteText",
    Step4FollowUp => "step4.followUp",
    Step4NewRequest => "step4.newRequest",
    LoadingTitle => "loading.title",
    ErrorTitle => "error.title",
    ErrorQuote => "error.quoteError",
    ErrorQuoteDisplay => "error.quoteDisplayError",
    ButtonNext => "buttons.next",
    ButtonBack => "buttons.back",
    PromptChoice => "prompt.choice",
    PromptInvalidChoice => "prompt.invalidChoice",
    PromptCommands => "prompt.commands",
    PromptCancelled => "prompt.cancelled",
    PromptLanguageChanged => "prompt.languageChanged",
    PromptThemeChanged => "prompt.themeChanged",
    FooterDisclaimer => "footer.disclaimer",
    FooterCopyright => "footer.copyright",
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueOption {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub placeholder: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    messages: HashMap<String, String>,
    manufacturers: HashMap<String, String>,
    issues: Vec<IssueOption>,
    software_issues: Vec<IssueOption>,
    loading_messages: Vec<String>,
}

/// Validated string table for one language.
#[derive(Debug, Clone)]
pub struct Catalog {
    language: Language,
    messages: HashMap<String, String>,
    manufacturers: HashMap<String, String>,
    issues: Vec<IssueOption>,
    software_issues: Vec<IssueOption>,
    loading_messages: Vec<String>,
    sentinels: Sentinels,
}

impl Catalog {
    pub fn load(language: Language) -> Result<Self, ConfigError> {
        let src = match language {
            Language::Ar => AR_YAML,
            Language::En => EN_YAML,
        };
        Self::from_yaml(language, src)
    }

    pub fn from_yaml(language: Language, src: &str) -> Result<Self, ConfigError> {
        let fail = |message: String| ConfigError::Locale {
            lang: language.code().to_string(),
            message,
        };

        let raw: RawCatalog = serde_yaml::from_str(src).map_err(|e| fail(e.to_string()))?;

        let missing: Vec<&str> = MessageKey::ALL
            .iter()
            .map(|k| k.as_str())
            .filter(|k| raw.messages.get(*k).map_or(true, |v| v.trim().is_empty()))
            .collect();
        if !missing.is_empty() {
            return Err(fail(format!("missing messages: {}", missing.join(", "))));
        }
        if raw.loading_messages.is_empty() {
            return Err(fail("loading_messages is empty".into()));
        }

        let label_of = |list: &[IssueOption], key: &str, what: &str| {
            list.iter()
                .find(|o| o.key == key)
                .map(|o| o.label.clone())
                .ok_or_else(|| fail(format!("{what} has no '{key}' option")))
        };
        let sentinels = Sentinels {
            software: label_of(&raw.issues, SOFTWARE_KEY, "issues")?,
            other: label_of(&raw.issues, OTHER_KEY, "issues")?,
            software_other: label_of(&raw.software_issues, OTHER_KEY, "software_issues")?,
        };

        Ok(Self {
            language,
            messages: raw.messages,
            manufacturers: raw.manufacturers,
            issues: raw.issues,
            software_issues: raw.software_issues,
            loading_messages: raw.loading_messages,
            sentinels,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn direction(&self) -> Direction {
        self.language.direction()
    }

    pub fn text(&self, key: MessageKey) -> &str {
        // Presence of every key is checked in `from_yaml`.
        self.messages
            .get(key.as_str())
            .map(String::as_str)
            .unwrap_or(key.as_str())
    }

    pub fn manufacturer_name<'a>(&'a self, manufacturer: &'a str) -> &'a str {
        self.manufacturers
            .get(manufacturer)
            .map(String::as_str)
            .unwrap_or(manufacturer)
    }

    pub fn issues(&self) -> &[IssueOption] {
        &self.issues
    }

    pub fn software_issues(&self) -> &[IssueOption] {
        &self.software_issues
    }

    pub fn loading_messages(&self) -> &[String] {
        &self.loading_messages
    }

    pub fn sentinels(&self) -> &Sentinels {
        &self.sentinels
    }

    /// Hint shown under the description prompt for the chosen issue.
    pub fn issue_placeholder(&self, issue: &str) -> &str {
        self.issues
            .iter()
            .find(|o| o.label == issue)
            .and_then(|o| o.placeholder.as_deref())
            .unwrap_or_else(|| self.text(MessageKey::Step2DescriptionPlaceholder))
    }

    pub fn issue_key(&self, label: &str) -> Option<&str> {
        self.issues.iter().find(|o| o.label == label).map(|o| o.key.as_str())
    }

    pub fn software_issue_key(&self, label: &str) -> Option<&str> {
        self.software_issues
            .iter()
            .find(|o| o.label == label)
            .map(|o| o.key.as_str())
    }

    pub fn issue_label(&self, key: &str) -> Option<&str> {
        self.issues.iter().find(|o| o.key == key).map(|o| o.label.as_str())
    }

    pub fn software_issue_label(&self, key: &str) -> Option<&str> {
        self.software_issues
            .iter()
            .find(|o| o.key == key)
            .map(|o| o.label.as_str())
    }
}
