use std::io::{self, Write};
use std::time::Duration;

use chrono::{Datelike, Utc};
use colored::{Color, Colorize};
use indicatif::{ProgressBar, ProgressStyle};

use crate::context::AppContext;
use crate::locale::MessageKey;
use crate::wire::{Direction, RepairQuote, RepairRequest, ServiceType, Step, Theme};

/// Session commands accepted at any prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Back,
    Lang,
    Theme,
    Reset,
    Quit,
}

impl Command {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            ":back" | ":b" => Some(Command::Back),
            ":lang" | ":l" => Some(Command::Lang),
            ":theme" | ":t" => Some(Command::Theme),
            ":reset" | ":r" => Some(Command::Reset),
            ":quit" | ":q" => Some(Command::Quit),
            _ => None,
        }
    }
}

/// What the user typed: an answer or a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<T> {
    Value(T),
    Command(Command),
}

fn accent(theme: Theme) -> Color {
    match theme {
        Theme::Light => Color::Blue,
        Theme::Dark => Color::BrightCyan,
    }
}

fn muted(theme: Theme) -> Color {
    match theme {
        Theme::Light => Color::BrightBlack,
        Theme::Dark => Color::White,
    }
}

/// Prefixes a right-to-left mark so bidi-aware terminals align Arabic lines.
fn bidi(direction: Direction, s: &str) -> String {
    match direction {
        Direction::Rtl => format!("\u{200F}{}", s),
        Direction::Ltr => s.to_string(),
    }
}

fn line(ctx: &AppContext, s: &str) {
    println!("{}", bidi(ctx.direction(), s));
}

pub fn print_header(ctx: &AppContext) {
    let title = ctx.t(MessageKey::HeaderTitle);
    let rule = "━".repeat(title.chars().count().clamp(20, 72));
    println!();
    println!("{}", rule.color(accent(ctx.theme())));
    line(ctx, &title.bold().to_string());
    line(ctx, &ctx.t(MessageKey::HeaderSubtitle).color(muted(ctx.theme())).to_string());
    println!("{}", rule.color(accent(ctx.theme())));
    line(ctx, &ctx.t(MessageKey::PromptCommands).color(muted(ctx.theme())).to_string());
}

/// `✔` for finished steps, `●` for the current one, `○` for the rest.
pub fn stepper_marks(current: Step) -> [(u8, &'static str); 3] {
    let mark = |n: u8| match n.cmp(&current.ordinal()) {
        std::cmp::Ordering::Less => "✔",
        std::cmp::Ordering::Equal => "●",
        std::cmp::Ordering::Greater => "○",
    };
    [(1, mark(1)), (2, mark(2)), (3, mark(3))]
}

pub fn print_stepper(ctx: &AppContext, current: Step) {
    let labels = [
        MessageKey::StepperStep1,
        MessageKey::StepperStep2,
        MessageKey::StepperStep3,
    ];
    let parts: Vec<String> = stepper_marks(current)
        .iter()
        .zip(labels)
        .map(|((n, mark), key)| {
            let text = format!("{} {}. {}", mark, n, ctx.t(key));
            if *n == current.ordinal() {
                text.color(accent(ctx.theme())).bold().to_string()
            } else {
                text.color(muted(ctx.theme())).to_string()
            }
        })
        .collect();
    println!();
    line(ctx, &parts.join("  ─  "));
}

pub fn print_step_title(ctx: &AppContext, title: MessageKey, subtitle: MessageKey) {
    println!();
    line(ctx, &ctx.t(title).bold().to_string());
    line(ctx, &ctx.t(subtitle).color(muted(ctx.theme())).to_string());
}

/// `⏎ Next` on every form step, plus `:back Back` once there is a step to
/// return to.
pub fn nav_hint(ctx: &AppContext, step: Step) -> String {
    let next = format!("⏎ {}", ctx.t(MessageKey::ButtonNext));
    match step {
        Step::DeviceInfo => next,
        _ => format!("{}   :back {}", next, ctx.t(MessageKey::ButtonBack)),
    }
}

pub fn print_nav_hint(ctx: &AppContext, step: Step) {
    line(ctx, &nav_hint(ctx, step).color(muted(ctx.theme())).to_string());
}

pub fn print_field_error(ctx: &AppContext, key: MessageKey) {
    line(ctx, &format!("  ✗ {}", ctx.t(key)).red().to_string());
}

pub fn print_error_banner(ctx: &AppContext, message: &str) {
    println!();
    line(
        ctx,
        &format!("{} {}", ctx.t(MessageKey::ErrorTitle), message)
            .red()
            .bold()
            .to_string(),
    );
}

pub fn print_notice(ctx: &AppContext, key: MessageKey) {
    line(ctx, &ctx.t(key).color(accent(ctx.theme())).to_string());
}

pub fn print_store_info(ctx: &AppContext) {
    line(ctx, &ctx.t(MessageKey::Step3StoreInfo).bold().to_string());
    line(
        ctx,
        &format!("  {} {}", ctx.t(MessageKey::Step3StoreName), ctx.t(MessageKey::HeaderTitle)),
    );
    line(
        ctx,
        &format!(
            "  {} {}",
            ctx.t(MessageKey::Step3StoreAddress),
            ctx.t(MessageKey::Step3StoreAddressValue)
        ),
    );
}

fn read_line() -> Option<String> {
    let _ = io::stdout().flush();
    let mut s = String::new();
    match io::stdin().read_line(&mut s) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(s.trim_end_matches(['\r', '\n']).to_string()),
    }
}

/// 1-based menu input to a 0-based index.
pub fn parse_choice(input: &str, len: usize) -> Option<usize> {
    input
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=len).contains(n))
        .map(|n| n - 1)
}

/// Numbered menu. Empty input keeps `current` when there is one.
pub fn choose(
    ctx: &AppContext,
    label: MessageKey,
    options: &[&str],
    current: Option<usize>,
) -> Reply<usize> {
    println!();
    line(ctx, &ctx.t(label).bold().to_string());
    for (i, opt) in options.iter().enumerate() {
        let marker = if Some(i) == current { "›" } else { " " };
        let text = format!("{} {:>2}) {}", marker, i + 1, opt);
        if Some(i) == current {
            line(ctx, &text.color(accent(ctx.theme())).to_string());
        } else {
            line(ctx, &text);
        }
    }
    loop {
        print!("{}: ", ctx.t(MessageKey::PromptChoice));
        let Some(input) = read_line() else {
            return Reply::Command(Command::Quit);
        };
        if let Some(cmd) = Command::parse(&input) {
            return Reply::Command(cmd);
        }
        if input.trim().is_empty() {
            if let Some(i) = current {
                return Reply::Value(i);
            }
        }
        match parse_choice(&input, options.len()) {
            Some(i) => return Reply::Value(i),
            None => print_field_error(ctx, MessageKey::PromptInvalidChoice),
        }
    }
}

/// Free-text prompt. Empty input keeps `current`.
pub fn ask(ctx: &AppContext, label: &str, hint: Option<&str>, current: &str) -> Reply<String> {
    println!();
    line(ctx, &label.bold().to_string());
    if let Some(hint) = hint {
        line(ctx, &format!("  {}", hint).color(muted(ctx.theme())).to_string());
    }
    if current.is_empty() {
        print!("> ");
    } else {
        print!("[{}] > ", current);
    }
    let Some(input) = read_line() else {
        return Reply::Command(Command::Quit);
    };
    if let Some(cmd) = Command::parse(&input) {
        return Reply::Command(cmd);
    }
    if input.trim().is_empty() {
        Reply::Value(current.to_string())
    } else {
        Reply::Value(input)
    }
}

pub fn confirm(ctx: &AppContext, prompt: &str) -> Reply<bool> {
    println!();
    print!("{} [y/N]: ", bidi(ctx.direction(), prompt).bold());
    let Some(input) = read_line() else {
        return Reply::Command(Command::Quit);
    };
    if let Some(cmd) = Command::parse(&input) {
        return Reply::Command(cmd);
    }
    let ans = input.trim().to_lowercase();
    Reply::Value(ans == "y" || ans == "yes" || ans == "نعم")
}

/// Waits for Enter.
pub fn pause(ctx: &AppContext, label: MessageKey) -> Reply<()> {
    println!();
    print!("{} ⏎ ", bidi(ctx.direction(), ctx.t(label)).bold());
    match read_line() {
        None => Reply::Command(Command::Quit),
        Some(input) => match Command::parse(&input) {
            Some(cmd) => Reply::Command(cmd),
            None => Reply::Value(()),
        },
    }
}

pub fn loading_spinner(ctx: &AppContext) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {prefix:.bold} {msg}") {
        pb.set_style(style);
    }
    pb.set_prefix(ctx.t(MessageKey::LoadingTitle).to_string());
    if let Some(first) = ctx.catalog().loading_messages().first() {
        pb.set_message(first.clone());
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn device_label(ctx: &AppContext, req: &RepairRequest) -> String {
    format!(
        "{} {}",
        ctx.catalog().manufacturer_name(&req.manufacturer),
        req.model
    )
}

fn issue_label(req: &RepairRequest) -> String {
    match &req.software_issue {
        Some(sw) => format!("{} ({})", req.issue, sw),
        None => req.issue.clone(),
    }
}

pub fn print_result(ctx: &AppContext, quote: &RepairQuote, order_number: &str, req: &RepairRequest) {
    let theme = ctx.theme();
    println!();
    line(ctx, &format!("✔ {}", ctx.t(MessageKey::Step4SuccessTitle)).green().bold().to_string());
    line(ctx, &ctx.t(MessageKey::Step4SuccessSubtitle).color(muted(theme)).to_string());
    line(
        ctx,
        &format!("{} {}", ctx.t(MessageKey::Step4OrderNumber), order_number.color(accent(theme)).bold()),
    );

    println!();
    line(ctx, &ctx.t(MessageKey::Step4SummaryTitle).bold().to_string());
    line(ctx, &format!("  {} {}", ctx.t(MessageKey::Step4Name), req.name));
    line(ctx, &format!("  {} {}", ctx.t(MessageKey::Step4Phone), req.phone));
    line(ctx, &format!("  {} {}", ctx.t(MessageKey::Step4Device), device_label(ctx, req)));
    line(ctx, &format!("  {} {}", ctx.t(MessageKey::Step4Issue), issue_label(req)));
    if req.service_type == ServiceType::Pickup {
        if let Some(addr) = &req.street_address {
            line(ctx, &format!("  {} {}", ctx.t(MessageKey::Step4Address), addr));
        }
    }

    println!();
    line(ctx, &ctx.t(MessageKey::Step4DiagnosisTitle).bold().to_string());
    line(
        ctx,
        &format!("  {} {}", ctx.t(MessageKey::Step4EstimatedTime), quote.estimated_time.bold()),
    );
    line(ctx, &format!("  {}", ctx.t(MessageKey::Step4PotentialParts)));
    if quote.required_parts.is_empty() {
        line(ctx, &format!("    {}", ctx.t(MessageKey::Step4NoParts)).color(muted(theme)).to_string());
    } else {
        for part in &quote.required_parts {
            line(ctx, &format!("    • {}", part));
        }
    }
    line(ctx, &format!("  {}", ctx.t(MessageKey::Step4Notes)));
    for l in quote.notes.lines() {
        line(ctx, &format!("    {}", l));
    }

    println!();
    line(
        ctx,
        &format!("{} {}", ctx.t(MessageKey::Step4ImportantNote).yellow().bold(), ctx.t(MessageKey::Step4NoteText)),
    );
    line(ctx, ctx.t(MessageKey::Step4FollowUp));
}

pub fn footer_text(template: &str, year: i32) -> String {
    template.replace("{year}", &year.to_string())
}

pub fn print_footer(ctx: &AppContext) {
    let muted = muted(ctx.theme());
    println!();
    line(ctx, &ctx.t(MessageKey::FooterDisclaimer).color(muted).to_string());
    let copyright = footer_text(ctx.t(MessageKey::FooterCopyright), Utc::now().year());
    line(ctx, &copyright.color(muted).to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse(":back"), Some(Command::Back));
        assert_eq!(Command::parse("  :q \n"), Some(Command::Quit));
        assert_eq!(Command::parse(":lang"), Some(Command::Lang));
        assert_eq!(Command::parse("back"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn test_parse_choice_bounds() {
        assert_eq!(parse_choice("1", 3), Some(0));
        assert_eq!(parse_choice(" 3 ", 3), Some(2));
        assert_eq!(parse_choice("0", 3), None);
        assert_eq!(parse_choice("4", 3), None);
        assert_eq!(parse_choice("two", 3), None);
    }

    #[test]
    fn test_stepper_marks() {
        let marks = stepper_marks(Step::IssueDescription);
        assert_eq!(marks, [(1, "✔"), (2, "●"), (3, "○")]);
        let marks = stepper_marks(Step::Result);
        assert!(marks.iter().all(|(_, m)| *m == "✔"));
    }

    #[test]
    fn test_nav_hint_labels() {
        let ctx = AppContext::load(crate::wire::Language::En, Theme::Light).unwrap();
        assert_eq!(nav_hint(&ctx, Step::DeviceInfo), "⏎ Next");
        assert_eq!(nav_hint(&ctx, Step::ContactInfo), "⏎ Next   :back Back");
        let ctx = AppContext::load(crate::wire::Language::Ar, Theme::Light).unwrap();
        assert_eq!(nav_hint(&ctx, Step::IssueDescription), "⏎ التالي   :back السابق");
    }

    #[test]
    fn test_footer_year() {
        assert_eq!(footer_text("© {year} Center.", 2026), "© 2026 Center.");
    }

    #[test]
    fn test_bidi_mark_only_for_rtl() {
        assert!(bidi(Direction::Rtl, "مرحبا").starts_with('\u{200F}'));
        assert_eq!(bidi(Direction::Ltr, "hello"), "hello");
    }

    #[test]
    fn test_issue_label_includes_software() {
        let req = RepairRequest {
            issue: "Software".into(),
            software_issue: Some("Restarts".into()),
            ..RepairRequest::default()
        };
        assert_eq!(issue_label(&req), "Software (Restarts)");
    }
}
