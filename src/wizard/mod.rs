use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::context::AppContext;
use crate::diagnosis::Diagnose;
use crate::errors::{DiagnosisError, EditError};
use crate::locale::MessageKey;
use crate::validate::{self, Sentinels};
use crate::wire::{Language, RepairQuote, RepairRequest, ServiceType, Step, Theme};

pub const DEFAULT_ORDER_PREFIX: &str = "RYD";

/// Display label for a received request: `<prefix>-<last 6 digits of the
/// millisecond clock>`. Not unique across sessions.
pub fn order_number(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}-{:06}", prefix, now.timestamp_millis().rem_euclid(1_000_000))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Manufacturer,
    Model,
    Issue,
    SoftwareIssue,
    IssueDescription,
    ServiceType,
    Name,
    Phone,
    StreetAddress,
}

impl FromStr for Field {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "manufacturer" => Field::Manufacturer,
            "model" => Field::Model,
            "issue" => Field::Issue,
            "softwareIssue" => Field::SoftwareIssue,
            "issueDescription" => Field::IssueDescription,
            "serviceType" => Field::ServiceType,
            "name" => Field::Name,
            "phone" => Field::Phone,
            "streetAddress" => Field::StreetAddress,
            other => return Err(EditError::UnknownField(other.to_string())),
        })
    }
}

/// When `trigger` changes to a value satisfying `when`, `clears` is emptied
/// in the same edit.
struct DependentClear {
    trigger: Field,
    clears: Field,
    when: fn(&str, &Sentinels) -> bool,
}

fn always(_: &str, _: &Sentinels) -> bool {
    true
}

fn not_software(value: &str, s: &Sentinels) -> bool {
    value != s.software
}

const DEPENDENT_CLEARS: &[DependentClear] = &[
    // Model choices depend on the manufacturer.
    DependentClear {
        trigger: Field::Manufacturer,
        clears: Field::Model,
        when: always,
    },
    DependentClear {
        trigger: Field::Issue,
        clears: Field::SoftwareIssue,
        when: not_software,
    },
];

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Snapshot handed out by [`Wizard::begin_submit`]; its epoch ties the
/// eventual result to the session that asked for it.
#[derive(Debug, Clone)]
pub struct SubmitTicket {
    epoch: Uuid,
    pub request: RepairRequest,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View<'a> {
    DeviceInfo,
    IssueDescription,
    ContactInfo,
    Loading,
    Result {
        quote: &'a RepairQuote,
        order_number: &'a str,
        request: &'a RepairRequest,
    },
    /// Result step reached without a quote and an order number.
    DisplayError,
}

#[derive(Debug, Clone)]
struct WizardState {
    step: Step,
    request: RepairRequest,
    quote: Option<RepairQuote>,
    loading: bool,
    error: Option<MessageKey>,
    order_number: Option<String>,
    epoch: Uuid,
}

impl WizardState {
    fn initial() -> Self {
        Self {
            step: Step::DeviceInfo,
            request: RepairRequest::default(),
            quote: None,
            loading: false,
            error: None,
            order_number: None,
            epoch: Uuid::new_v4(),
        }
    }
}

/// The four-step intake flow for one user session.
pub struct Wizard {
    ctx: AppContext,
    order_prefix: String,
    state: WizardState,
}

impl Wizard {
    pub fn new(ctx: AppContext, order_prefix: impl Into<String>) -> Self {
        Self {
            ctx,
            order_prefix: order_prefix.into(),
            state: WizardState::initial(),
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn step(&self) -> Step {
        self.state.step
    }

    pub fn request(&self) -> &RepairRequest {
        &self.state.request
    }

    pub fn quote(&self) -> Option<&RepairQuote> {
        self.state.quote.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    /// Current error message, rendered in the active language.
    pub fn error(&self) -> Option<&str> {
        self.state.error.map(|k| self.ctx.t(k))
    }

    pub fn order_number(&self) -> Option<&str> {
        self.state.order_number.as_deref()
    }

    #[cfg(test)]
    pub fn epoch(&self) -> Uuid {
        self.state.epoch
    }

    pub fn sentinels(&self) -> &Sentinels {
        self.ctx.catalog().sentinels()
    }

    pub fn can_advance(&self) -> bool {
        validate::is_step_complete(self.state.step, &self.state.request, self.sentinels())
    }

    /// Moves 1→2 or 2→3 when the current step is complete. Never enters the
    /// result step; that only happens through a successful submit.
    pub fn next(&mut self) -> bool {
        if self.state.loading || !self.can_advance() {
            return false;
        }
        let to = match self.state.step {
            Step::DeviceInfo => Step::IssueDescription,
            Step::IssueDescription => Step::ContactInfo,
            Step::ContactInfo | Step::Result => return false,
        };
        self.state.step = to;
        true
    }

    pub fn back(&mut self) -> bool {
        if self.state.loading {
            return false;
        }
        let to = match self.state.step {
            Step::IssueDescription => Step::DeviceInfo,
            Step::ContactInfo => Step::IssueDescription,
            Step::DeviceInfo | Step::Result => return false,
        };
        self.state.step = to;
        true
    }

    /// Merges one field into the request, applying dependent clears.
    pub fn edit_field(&mut self, field: Field, value: &str) -> Result<(), EditError> {
        let req = &mut self.state.request;
        let previous = match field {
            Field::Manufacturer => std::mem::replace(&mut req.manufacturer, value.to_string()),
            Field::Model => std::mem::replace(&mut req.model, value.to_string()),
            Field::Issue => std::mem::replace(&mut req.issue, value.to_string()),
            Field::SoftwareIssue => {
                req.software_issue = non_empty(value);
                return Ok(());
            }
            Field::IssueDescription => std::mem::replace(&mut req.issue_description, value.to_string()),
            Field::ServiceType => {
                req.service_type = ServiceType::parse(value)
                    .ok_or_else(|| EditError::InvalidServiceType(value.to_string()))?;
                return Ok(());
            }
            Field::Name => std::mem::replace(&mut req.name, value.to_string()),
            Field::Phone => std::mem::replace(&mut req.phone, value.to_string()),
            Field::StreetAddress => {
                req.street_address = non_empty(value);
                return Ok(());
            }
        };

        if previous != value {
            let sentinels = self.ctx.catalog().sentinels();
            let req = &mut self.state.request;
            for rule in DEPENDENT_CLEARS {
                if rule.trigger == field && (rule.when)(value, sentinels) {
                    match rule.clears {
                        Field::Model => req.model.clear(),
                        Field::SoftwareIssue => req.software_issue = None,
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }

    /// `edit_field` keyed by the field's wire name.
    pub fn edit_named(&mut self, name: &str, value: &str) -> Result<(), EditError> {
        let field = name.parse::<Field>()?;
        self.edit_field(field, value)
    }

    /// Enters the loading state and returns what to send, or `None` when a
    /// submit is not allowed right now.
    pub fn begin_submit(&mut self) -> Option<SubmitTicket> {
        if self.state.loading
            || self.state.step != Step::ContactInfo
            || !validate::is_contact_step_complete(&self.state.request)
        {
            return None;
        }
        self.state.loading = true;
        self.state.error = None;
        Some(SubmitTicket {
            epoch: self.state.epoch,
            request: self.state.request.clone(),
            language: self.ctx.language(),
        })
    }

    /// Applies a diagnosis outcome. Returns `false` when the ticket belongs to
    /// a session that has since been reset; the outcome is then dropped.
    pub fn finish_submit(
        &mut self,
        ticket: SubmitTicket,
        outcome: Result<RepairQuote, DiagnosisError>,
    ) -> bool {
        if ticket.epoch != self.state.epoch || !self.state.loading {
            return false;
        }
        self.state.loading = false;
        match outcome {
            Ok(quote) => {
                self.state.order_number = Some(order_number(&self.order_prefix, Utc::now()));
                self.state.quote = Some(quote);
                self.state.step = Step::Result;
            }
            Err(_) => {
                self.state.error = Some(MessageKey::ErrorQuote);
            }
        }
        true
    }

    /// Runs a full submit against `client`. Returns whether the result step
    /// was reached.
    pub async fn submit(&mut self, client: &dyn Diagnose) -> bool {
        let Some(ticket) = self.begin_submit() else {
            return false;
        };
        let outcome = client.request_diagnosis(&ticket.request, ticket.language).await;
        self.finish_submit(ticket, outcome);
        self.state.step == Step::Result
    }

    /// Starts over with a fresh request and a new epoch.
    pub fn reset(&mut self) {
        self.state = WizardState::initial();
    }

    /// Switches language and re-labels any chosen issue options so they keep
    /// matching the new catalog's sentinels.
    pub fn set_language(&mut self, language: Language) {
        if language == self.ctx.language() {
            return;
        }
        let from = self.ctx.catalog();
        let to = self.ctx.catalog_for(language);
        let req = &self.state.request;

        let issue = from
            .issue_key(&req.issue)
            .and_then(|k| to.issue_label(k))
            .map(str::to_string);
        let software = req
            .software_issue
            .as_deref()
            .and_then(|l| from.software_issue_key(l))
            .and_then(|k| to.software_issue_label(k))
            .map(str::to_string);

        if let Some(issue) = issue {
            self.state.request.issue = issue;
        }
        if let Some(software) = software {
            self.state.request.software_issue = Some(software);
        }
        self.ctx.set_language(language);
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.ctx.set_theme(theme);
    }

    pub fn view(&self) -> View<'_> {
        if self.is_loading() {
            return View::Loading;
        }
        match self.state.step {
            Step::DeviceInfo => View::DeviceInfo,
            Step::IssueDescription => View::IssueDescription,
            Step::ContactInfo => View::ContactInfo,
            Step::Result => match (self.quote(), self.order_number()) {
                (Some(quote), Some(order_number)) => View::Result {
                    quote,
                    order_number,
                    request: &self.state.request,
                },
                _ => View::DisplayError,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use regex::Regex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubDiagnose {
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubDiagnose {
        fn ok() -> Self {
            Self { fail: false, calls: AtomicUsize::new(0) }
        }

        fn failing() -> Self {
            Self { fail: true, calls: AtomicUsize::new(0) }
        }
    }

    fn sample_quote() -> RepairQuote {
        RepairQuote {
            estimated_time: "2 hours".into(),
            required_parts: vec![],
            notes: "ok".into(),
        }
    }

    #[async_trait]
    impl Diagnose for StubDiagnose {
        async fn request_diagnosis(
            &self,
            _request: &RepairRequest,
            _language: Language,
        ) -> Result<RepairQuote, DiagnosisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(DiagnosisError::Upstream("boom".into()))
            } else {
                Ok(sample_quote())
            }
        }
    }

    fn wizard() -> Wizard {
        let ctx = AppContext::load(Language::En, Theme::Light).unwrap();
        Wizard::new(ctx, DEFAULT_ORDER_PREFIX)
    }

    fn fill_to_contact(w: &mut Wizard) {
        w.edit_named("manufacturer", "Apple").unwrap();
        w.edit_named("model", "iPhone 13").unwrap();
        assert!(w.next());
        w.edit_named("issue", "Liquid damage").unwrap();
        assert!(w.next());
        w.edit_named("name", "Ahmed Ali").unwrap();
        w.edit_named("phone", "0555555555").unwrap();
        w.edit_named("serviceType", "store_visit").unwrap();
        assert_eq!(w.step(), Step::ContactInfo);
    }

    #[test]
    fn test_order_number_format() {
        let t = Utc.timestamp_millis_opt(1_720_875_887_208).unwrap();
        assert_eq!(order_number("RYD", t), "RYD-887208");
        let t = Utc.timestamp_millis_opt(1_700_000_000_042).unwrap();
        assert_eq!(order_number("RYD", t), "RYD-000042");
    }

    #[test]
    fn test_initial_state() {
        let w = wizard();
        assert_eq!(w.step(), Step::DeviceInfo);
        assert_eq!(w.request().service_type, ServiceType::StoreVisit);
        assert!(w.quote().is_none() && w.error().is_none() && w.order_number().is_none());
        assert!(!w.is_loading());
        assert_eq!(w.view(), View::DeviceInfo);
    }

    #[test]
    fn test_next_refuses_incomplete_device() {
        let mut w = wizard();
        assert!(!w.next());
        w.edit_named("manufacturer", "Apple").unwrap();
        assert!(!w.next());
        assert_eq!(w.step(), Step::DeviceInfo);
        w.edit_named("model", "   ").unwrap();
        assert!(!w.next());
        assert_eq!(w.step(), Step::DeviceInfo);
    }

    #[test]
    fn test_next_never_enters_result() {
        let mut w = wizard();
        fill_to_contact(&mut w);
        assert!(w.can_advance());
        assert!(!w.next());
        assert_eq!(w.step(), Step::ContactInfo);
    }

    #[test]
    fn test_back_navigation() {
        let mut w = wizard();
        assert!(!w.back());
        fill_to_contact(&mut w);
        assert!(w.back());
        assert_eq!(w.step(), Step::IssueDescription);
        assert!(w.back());
        assert_eq!(w.step(), Step::DeviceInfo);
        assert!(!w.back());
        // Data survives navigation.
        assert_eq!(w.request().name, "Ahmed Ali");
    }

    #[test]
    fn test_manufacturer_change_clears_model() {
        let mut w = wizard();
        w.edit_field(Field::Manufacturer, "Apple").unwrap();
        w.edit_field(Field::Model, "iPhone 13").unwrap();
        w.edit_field(Field::Manufacturer, "Apple").unwrap();
        assert_eq!(w.request().model, "iPhone 13");
        w.edit_field(Field::Manufacturer, "Samsung").unwrap();
        assert_eq!(w.request().manufacturer, "Samsung");
        assert_eq!(w.request().model, "");
    }

    #[test]
    fn test_issue_change_clears_software_issue() {
        let mut w = wizard();
        let software = w.sentinels().software.clone();
        w.edit_field(Field::Issue, &software).unwrap();
        w.edit_field(Field::SoftwareIssue, "Device restarts randomly").unwrap();
        w.edit_field(Field::IssueDescription, "since update").unwrap();
        w.edit_field(Field::Issue, "Charging port damage").unwrap();
        assert_eq!(w.request().software_issue, None);
        assert_eq!(w.request().issue_description, "since update");
    }

    #[test]
    fn test_software_issue_needs_sub_issue() {
        let mut w = wizard();
        w.edit_named("manufacturer", "Apple").unwrap();
        w.edit_named("model", "iPhone 13").unwrap();
        w.next();
        let software = w.sentinels().software.clone();
        w.edit_field(Field::Issue, &software).unwrap();
        assert!(!w.next());
        w.edit_field(Field::SoftwareIssue, "Device is freezing or very slow").unwrap();
        assert!(w.next());
    }

    #[test]
    fn test_edit_errors_are_no_ops() {
        let mut w = wizard();
        assert_eq!(
            w.edit_named("colour", "red"),
            Err(EditError::UnknownField("colour".into()))
        );
        assert_eq!(
            w.edit_named("serviceType", "drone"),
            Err(EditError::InvalidServiceType("drone".into()))
        );
        assert_eq!(w.request(), &RepairRequest::default());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut w = wizard();
        let epoch = w.epoch();
        w.edit_named("manufacturer", "Apple").unwrap();
        w.edit_named("serviceType", "pickup").unwrap();
        w.edit_named("streetAddress", "Olaya").unwrap();
        w.next();
        w.reset();
        assert_eq!(w.step(), Step::DeviceInfo);
        assert_eq!(w.request().service_type, ServiceType::StoreVisit);
        assert_eq!(w.request(), &RepairRequest::default());
        assert!(w.quote().is_none() && w.error().is_none() && w.order_number().is_none());
        assert_ne!(w.epoch(), epoch);
    }

    #[tokio::test]
    async fn test_submit_success_end_to_end() {
        let mut w = wizard();
        fill_to_contact(&mut w);
        let stub = StubDiagnose::ok();
        assert!(w.submit(&stub).await);
        assert_eq!(w.step(), Step::Result);
        assert_eq!(w.quote(), Some(&sample_quote()));
        let re = Regex::new(r"^RYD-\d{6}$").unwrap();
        assert!(re.is_match(w.order_number().unwrap()));
        assert!(!w.is_loading());
        assert!(w.error().is_none());
        assert!(matches!(w.view(), View::Result { .. }));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submit_failure_stays_on_contact() {
        let mut w = wizard();
        fill_to_contact(&mut w);
        let stub = StubDiagnose::failing();
        assert!(!w.submit(&stub).await);
        assert_eq!(w.step(), Step::ContactInfo);
        assert!(!w.is_loading());
        assert_eq!(
            w.error(),
            Some("An error occurred while generating the technical report. Please try again.")
        );
        assert!(w.quote().is_none());
        assert!(w.order_number().is_none());

        // The user may resubmit; a new attempt clears the error first.
        let ok = StubDiagnose::ok();
        assert!(w.submit(&ok).await);
        assert!(w.error().is_none());
    }

    #[tokio::test]
    async fn test_submit_refused_when_contact_incomplete() {
        let mut w = wizard();
        fill_to_contact(&mut w);
        w.edit_named("serviceType", "pickup").unwrap();
        let stub = StubDiagnose::ok();
        assert!(!w.submit(&stub).await);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
        assert!(!w.is_loading());
    }

    #[test]
    fn test_submit_only_from_contact_step() {
        let mut w = wizard();
        w.edit_named("name", "Ahmed").unwrap();
        w.edit_named("phone", "0555555555").unwrap();
        assert!(w.begin_submit().is_none());
    }

    #[test]
    fn test_single_outstanding_call() {
        let mut w = wizard();
        fill_to_contact(&mut w);
        let ticket = w.begin_submit().unwrap();
        assert!(w.is_loading());
        assert_eq!(w.view(), View::Loading);
        assert!(w.begin_submit().is_none());
        assert!(!w.back());
        assert!(w.finish_submit(ticket, Ok(sample_quote())));
        assert_eq!(w.step(), Step::Result);
    }

    #[test]
    fn test_stale_result_after_reset_is_dropped() {
        let mut w = wizard();
        fill_to_contact(&mut w);
        let ticket = w.begin_submit().unwrap();
        w.reset();
        assert!(!w.finish_submit(ticket, Ok(sample_quote())));
        assert_eq!(w.step(), Step::DeviceInfo);
        assert!(w.quote().is_none());
        assert!(w.order_number().is_none());
        assert!(!w.is_loading());
    }

    #[test]
    fn test_display_inconsistency() {
        let mut w = wizard();
        w.state.step = Step::Result;
        assert_eq!(w.view(), View::DisplayError);
        w.state.quote = Some(sample_quote());
        assert_eq!(w.view(), View::DisplayError);
        w.state.order_number = Some("RYD-000001".into());
        assert!(matches!(w.view(), View::Result { order_number: "RYD-000001", .. }));
    }

    #[test]
    fn test_language_switch_relabels_issue() {
        let mut w = wizard();
        let software = w.sentinels().software.clone();
        w.edit_field(Field::Issue, &software).unwrap();
        w.edit_field(Field::SoftwareIssue, "Device restarts randomly").unwrap();
        w.set_language(Language::Ar);
        assert_eq!(w.context().language(), Language::Ar);
        assert_eq!(w.request().issue, "مشكلة في السوفتوير (النظام)");
        assert_eq!(
            w.request().software_issue.as_deref(),
            Some("الجهاز يعيد التشغيل بشكل عشوائي")
        );
        assert_eq!(w.request().issue, w.sentinels().software);
    }

    #[test]
    fn test_switch_back_to_store_visit_keeps_address_out_of_prompt() {
        let mut w = wizard();
        fill_to_contact(&mut w);
        w.edit_named("serviceType", "pickup").unwrap();
        w.edit_named("streetAddress", "Olaya St 5").unwrap();
        w.edit_named("serviceType", "store_visit").unwrap();
        assert_eq!(w.request().street_address.as_deref(), Some("Olaya St 5"));
        let p = crate::prompt::diagnosis_prompt(w.request(), Language::En);
        assert!(p.contains("- Customer Location: Riyadh, Not specified (Customer will visit the store)"));
        assert!(!p.contains("Olaya St 5"));
    }

    #[tokio::test]
    async fn test_error_message_follows_language() {
        let mut w = wizard();
        fill_to_contact(&mut w);
        w.submit(&StubDiagnose::failing()).await;
        w.set_language(Language::Ar);
        assert_eq!(
            w.error(),
            Some("حدث خطأ أثناء إنشاء التقرير الفني. يرجى المحاولة مرة أخرى.")
        );
    }
}
