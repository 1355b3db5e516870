use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::diagnosis::Diagnose;
use crate::locale::MessageKey;
use crate::ux::{self, Command, Reply};
use crate::validate::{self, FieldError};
use crate::wire::ServiceType;
use crate::wizard::{Field, View, Wizard};

const LOADING_ROTATE: Duration = Duration::from_millis(2500);

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// What a Ctrl-C means right now.
#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// Abandon the diagnosis in flight.
    Cancel,
    /// Nothing is loading: end the program as a terminal user expects.
    Exit,
}

fn on_interrupt(loading: bool) -> Interrupt {
    if loading {
        Interrupt::Cancel
    } else {
        Interrupt::Exit
    }
}

/// Owns SIGINT for the whole session. Once tokio installs its handler the
/// default terminate-on-Ctrl-C is gone, so one listener routes every signal.
struct Interrupts {
    loading: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<()>,
    rx: mpsc::UnboundedReceiver<()>,
}

impl Interrupts {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            loading: Arc::new(AtomicBool::new(false)),
            tx,
            rx,
        }
    }

    fn listen(&self) {
        let loading = Arc::clone(&self.loading);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                match on_interrupt(loading.load(Ordering::SeqCst)) {
                    Interrupt::Cancel => {
                        let _ = tx.send(());
                    }
                    Interrupt::Exit => {
                        println!();
                        std::process::exit(130);
                    }
                }
            }
        });
    }

    /// Marks a request in flight and drops interrupts queued before it.
    fn begin_loading(&mut self) {
        while self.rx.try_recv().is_ok() {}
        self.loading.store(true, Ordering::SeqCst);
    }

    fn end_loading(&self) {
        self.loading.store(false, Ordering::SeqCst);
    }
}

/// Unwraps a prompt reply, or hands a command to the session and returns.
macro_rules! reply {
    ($session:ident, $prompt:expr) => {
        match $prompt {
            Reply::Value(v) => v,
            Reply::Command(cmd) => return Ok($session.handle(cmd)),
        }
    };
}

/// Interactive terminal driver around a [`Wizard`].
pub struct Session<'a> {
    wizard: Wizard,
    client: &'a dyn Diagnose,
    config: Config,
    config_path: Option<PathBuf>,
    interrupts: Interrupts,
}

impl<'a> Session<'a> {
    pub fn new(
        wizard: Wizard,
        client: &'a dyn Diagnose,
        config: Config,
        config_path: Option<PathBuf>,
    ) -> Self {
        Self {
            wizard,
            client,
            config,
            config_path,
            interrupts: Interrupts::new(),
        }
    }

    pub async fn run(mut self) -> Result<()> {
        self.interrupts.listen();
        ux::print_header(self.wizard.context());
        loop {
            let flow = match self.wizard.view() {
                View::DeviceInfo => self.device_step()?,
                View::IssueDescription => self.issue_step()?,
                View::ContactInfo => self.contact_step().await?,
                // submit() settles loading before it returns
                View::Loading => Flow::Continue,
                View::Result {
                    quote,
                    order_number,
                    request,
                } => {
                    ux::print_result(self.wizard.context(), quote, order_number, request);
                    self.start_over()?
                }
                View::DisplayError => {
                    let ctx = self.wizard.context();
                    ux::print_error_banner(ctx, ctx.t(MessageKey::ErrorQuoteDisplay));
                    self.start_over()?
                }
            };
            if let Flow::Quit = flow {
                break;
            }
        }
        ux::print_footer(self.wizard.context());
        Ok(())
    }

    fn handle(&mut self, cmd: Command) -> Flow {
        match cmd {
            Command::Back => {
                self.wizard.back();
            }
            Command::Lang => {
                let lang = self.wizard.context().language().toggled();
                self.wizard.set_language(lang);
                self.config.language = lang;
                self.persist();
                ux::print_notice(self.wizard.context(), MessageKey::PromptLanguageChanged);
            }
            Command::Theme => {
                let theme = self.wizard.context().theme().toggled();
                self.wizard.set_theme(theme);
                self.config.theme = theme;
                self.persist();
                ux::print_notice(self.wizard.context(), MessageKey::PromptThemeChanged);
            }
            Command::Reset => self.wizard.reset(),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn persist(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save(path) {
            eprintln!("warning: {}", e);
        }
    }

    fn device_step(&mut self) -> Result<Flow> {
        let ctx = self.wizard.context();
        ux::print_stepper(ctx, self.wizard.step());
        ux::print_step_title(ctx, MessageKey::Step1Title, MessageKey::Step1Subtitle);
        ux::print_nav_hint(ctx, self.wizard.step());

        let names: Vec<String> = ctx.devices().manufacturers().map(str::to_string).collect();
        let labels: Vec<&str> = names
            .iter()
            .map(|m| ctx.catalog().manufacturer_name(m))
            .collect();
        let current = names
            .iter()
            .position(|m| *m == self.wizard.request().manufacturer);
        let picked = reply!(self, ux::choose(ctx, MessageKey::Step1Manufacturer, &labels, current));
        self.wizard.edit_field(Field::Manufacturer, &names[picked])?;

        let ctx = self.wizard.context();
        let req = self.wizard.request();
        let model = match ctx.devices().models(&req.manufacturer) {
            Some(models) => {
                let options: Vec<&str> = models.iter().map(String::as_str).collect();
                let current = models.iter().position(|m| *m == req.model);
                let i = reply!(self, ux::choose(ctx, MessageKey::Step1Model, &options, current));
                models[i].clone()
            }
            None => reply!(
                self,
                ux::ask(
                    ctx,
                    ctx.t(MessageKey::Step1OtherModel),
                    Some(ctx.t(MessageKey::Step1OtherModelPlaceholder)),
                    &req.model,
                )
            ),
        };
        self.wizard.edit_field(Field::Model, &model)?;
        self.wizard.next();
        Ok(Flow::Continue)
    }

    fn issue_step(&mut self) -> Result<Flow> {
        let ctx = self.wizard.context();
        ux::print_stepper(ctx, self.wizard.step());
        ux::print_step_title(ctx, MessageKey::Step2Title, MessageKey::Step2Subtitle);
        ux::print_nav_hint(ctx, self.wizard.step());

        let catalog = ctx.catalog();
        let labels: Vec<&str> = catalog.issues().iter().map(|o| o.label.as_str()).collect();
        let current = labels.iter().position(|l| *l == self.wizard.request().issue);
        let i = reply!(self, ux::choose(ctx, MessageKey::Step2MainIssue, &labels, current));
        let issue = labels[i].to_string();
        self.wizard.edit_field(Field::Issue, &issue)?;

        if issue == self.wizard.sentinels().software {
            let ctx = self.wizard.context();
            let labels: Vec<&str> = ctx
                .catalog()
                .software_issues()
                .iter()
                .map(|o| o.label.as_str())
                .collect();
            let current = self
                .wizard
                .request()
                .software_issue
                .as_deref()
                .and_then(|s| labels.iter().position(|l| *l == s));
            let i = reply!(self, ux::choose(ctx, MessageKey::Step2SoftwareIssue, &labels, current));
            let software = labels[i].to_string();
            self.wizard.edit_field(Field::SoftwareIssue, &software)?;
        }

        let ctx = self.wizard.context();
        let req = self.wizard.request();
        let required = validate::description_required(req, self.wizard.sentinels());
        let marker = if required {
            MessageKey::Step2DescriptionRequired
        } else {
            MessageKey::Step2DescriptionOptional
        };
        let label = format!("{} {}", ctx.t(MessageKey::Step2Description), ctx.t(marker));
        let description = reply!(
            self,
            ux::ask(
                ctx,
                &label,
                Some(ctx.catalog().issue_placeholder(&req.issue)),
                &req.issue_description,
            )
        );
        self.wizard.edit_field(Field::IssueDescription, &description)?;

        if !self.wizard.next() {
            let ctx = self.wizard.context();
            if validate::description_error(self.wizard.request(), self.wizard.sentinels()).is_some() {
                ux::print_field_error(ctx, MessageKey::Step2DescriptionMissing);
            }
        }
        Ok(Flow::Continue)
    }

    async fn contact_step(&mut self) -> Result<Flow> {
        let ctx = self.wizard.context();
        ux::print_stepper(ctx, self.wizard.step());
        ux::print_step_title(ctx, MessageKey::Step3Title, MessageKey::Step3Subtitle);
        ux::print_nav_hint(ctx, self.wizard.step());
        if let Some(err) = self.wizard.error() {
            ux::print_error_banner(ctx, err);
        }

        let store = format!(
            "{}  {}",
            ctx.t(MessageKey::Step3StoreVisit),
            ctx.t(MessageKey::Step3StoreVisitDesc)
        );
        let pickup = format!(
            "{}  {}",
            ctx.t(MessageKey::Step3Pickup),
            ctx.t(MessageKey::Step3PickupDesc)
        );
        let methods = [ServiceType::StoreVisit, ServiceType::Pickup];
        let current = methods
            .iter()
            .position(|m| *m == self.wizard.request().service_type);
        let i = reply!(
            self,
            ux::choose(ctx, MessageKey::Step3ServiceMethod, &[store.as_str(), pickup.as_str()], current)
        );
        let wire_name = match methods[i] {
            ServiceType::StoreVisit => "store_visit",
            ServiceType::Pickup => "pickup",
        };
        self.wizard.edit_named("serviceType", wire_name)?;
        if methods[i] == ServiceType::StoreVisit {
            ux::print_store_info(self.wizard.context());
        }

        loop {
            let ctx = self.wizard.context();
            let current = &self.wizard.request().name;
            let name = reply!(self, ux::ask(ctx, ctx.t(MessageKey::Step3FullName), None, current));
            self.wizard.edit_field(Field::Name, &name)?;
            match validate::name_error(&name) {
                None => break,
                Some(FieldError::Required) => {
                    ux::print_field_error(self.wizard.context(), MessageKey::Step3NameRequired)
                }
                Some(FieldError::Invalid) => {
                    ux::print_field_error(self.wizard.context(), MessageKey::Step3NameInvalid)
                }
            }
        }

        loop {
            let ctx = self.wizard.context();
            let current = &self.wizard.request().phone;
            let phone = reply!(
                self,
                ux::ask(ctx, ctx.t(MessageKey::Step3MobileNumber), Some("05XXXXXXXX"), current)
            );
            self.wizard.edit_field(Field::Phone, &phone)?;
            match validate::phone_error(&phone) {
                None => break,
                Some(FieldError::Required) => {
                    ux::print_field_error(self.wizard.context(), MessageKey::Step3PhoneRequired)
                }
                Some(FieldError::Invalid) => {
                    ux::print_field_error(self.wizard.context(), MessageKey::Step3PhoneInvalid)
                }
            }
        }

        if self.wizard.request().service_type == ServiceType::Pickup {
            loop {
                let ctx = self.wizard.context();
                let current = self.wizard.request().street_address.as_deref().unwrap_or("");
                let hint = format!(
                    "{} ({})",
                    ctx.t(MessageKey::Step3AddressPlaceholder),
                    ctx.t(MessageKey::Step3AddressNote)
                );
                let address = reply!(
                    self,
                    ux::ask(ctx, ctx.t(MessageKey::Step3AddressInCity), Some(hint.as_str()), current)
                );
                self.wizard.edit_field(Field::StreetAddress, &address)?;
                if validate::street_address_error(self.wizard.request()).is_none() {
                    break;
                }
                ux::print_field_error(self.wizard.context(), MessageKey::Step3AddressRequired);
            }
        }

        let ctx = self.wizard.context();
        if !reply!(self, ux::confirm(ctx, ctx.t(MessageKey::Step3Submit))) {
            return Ok(Flow::Continue);
        }
        self.submit().await
    }

    /// Runs the diagnosis under a spinner. Ctrl-C abandons the request and
    /// starts a fresh session.
    async fn submit(&mut self) -> Result<Flow> {
        let ctx = self.wizard.context();
        let pb = ux::loading_spinner(ctx);
        let messages = ctx.catalog().loading_messages().to_vec();

        self.interrupts.begin_loading();
        let cancelled = {
            let call = self.wizard.submit(self.client);
            tokio::pin!(call);
            let mut rotate = tokio::time::interval(LOADING_ROTATE);
            rotate.tick().await;
            let mut shown = 0usize;
            loop {
                tokio::select! {
                    _ = &mut call => break false,
                    _ = rotate.tick() => {
                        shown = (shown + 1) % messages.len().max(1);
                        if let Some(msg) = messages.get(shown) {
                            pb.set_message(msg.clone());
                        }
                    }
                    Some(()) = self.interrupts.rx.recv() => break true,
                }
            }
        };
        self.interrupts.end_loading();
        pb.finish_and_clear();

        if cancelled && self.wizard.is_loading() {
            self.wizard.reset();
            ux::print_notice(self.wizard.context(), MessageKey::PromptCancelled);
        }
        Ok(Flow::Continue)
    }

    fn start_over(&mut self) -> Result<Flow> {
        reply!(self, ux::pause(self.wizard.context(), MessageKey::Step4NewRequest));
        self.wizard.reset();
        Ok(Flow::Continue)
    }
}
