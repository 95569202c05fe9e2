//! Vertical card display for the review session.
//!
//! Renders the form view as a labelled card, the raw view as the JSON
//! buffer, and the notice, prompts and result panel around them.

use intake_review::{
    FormView, Notice, NoticeKind, RawBuffer, RawStatus, ResultPanel, Session, ViewMode, form_view,
};

// ── Public API ──

/// Everything the operator should see after a command.
pub fn print_session(session: &Session) {
    print_notice(session.notice());
    let affordances = session.affordances();
    if affordances.review_panel {
        print_review(session);
    }
    if let Some(panel) = ResultPanel::for_state(session.state()) {
        print_result(&panel);
    }
    for line in status_lines(session) {
        println!("{line}");
    }
}

/// The active view of the record under review.
pub fn print_review(session: &Session) {
    let Some(record) = session.record() else {
        return;
    };
    match session.view() {
        ViewMode::Form => {
            for line in card_lines(&form_view(record)) {
                println!("{line}");
            }
        }
        ViewMode::Raw => print_raw(session.raw()),
    }
}

pub fn print_notice(notice: Option<&Notice>) {
    if let Some(notice) = notice {
        println!("{}", notice_line(notice));
    }
}

// ── Rendering ──

fn card_lines(view: &FormView) -> Vec<String> {
    let mut lines = vec!["── Contract ──".to_string()];
    for input in &view.inputs {
        lines.push(format!("  {:<26} {}", input.label, input.value));
    }
    if !view.ramp.is_empty() {
        lines.push(String::new());
        lines.push("── Ramp Schedule ──".to_string());
        for block in &view.ramp {
            lines.push(format!("  {}", block.line()));
        }
    }
    lines.push(String::new());
    lines
}

fn print_raw(raw: &RawBuffer) {
    println!("── Raw JSON ──");
    println!("{}", raw.text());
    match raw.status() {
        RawStatus::InSync => {}
        RawStatus::Edited => println!("  (edited, not yet applied)"),
        RawStatus::Invalid(reason) => println!("  (invalid: {reason})"),
    }
    println!();
}

fn print_result(panel: &ResultPanel) {
    match panel {
        ResultPanel::Success { lines } => {
            println!("── Confirmed ──");
            for line in lines {
                println!("  {line}");
            }
        }
        ResultPanel::Failure { message } => {
            println!("── Confirmation failed ──");
            println!("  {message}");
        }
    }
    println!();
}

fn notice_line(notice: &Notice) -> String {
    let tag = match notice.kind {
        NoticeKind::Info => "info",
        NoticeKind::Success => "ok",
        NoticeKind::Error => "error",
    };
    format!("[{tag}] {}", notice.text)
}

fn status_lines(session: &Session) -> Vec<String> {
    let a = session.affordances();
    let mut lines = vec![format!("stage: {}", session.stage())];
    if let Some(op) = session.in_flight() {
        lines.push(format!("  {op} in progress..."));
    }
    if a.pin_prompt {
        let prompt = session.prompt();
        lines.push(if a.pin_submit_enabled {
            "  PIN required: `pin` or `cancel`".to_string()
        } else {
            "  submitting...".to_string()
        });
        if let Some(error) = prompt.error() {
            lines.push(format!("  PIN error: {error}"));
        }
    }
    if session.delete_prompt_open() {
        lines.push("  delete all files? `yes` or `no`".to_string());
    }
    let mut actions = Vec::new();
    if a.extract_enabled {
        actions.push("upload");
    }
    if a.view_toggle {
        actions.push(if session.view() == ViewMode::Form { "raw" } else { "form" });
    }
    if a.confirm_enabled {
        actions.push("confirm");
    }
    if a.retry_enabled {
        actions.push("retry");
    }
    if a.start_over_enabled {
        actions.push("start-over");
    }
    if a.reset_enabled {
        actions.push("reset");
    }
    if a.delete_enabled && !session.delete_prompt_open() {
        actions.push("delete");
    }
    if !actions.is_empty() {
        lines.push(format!("  available: {}", actions.join(", ")));
    }
    lines
}
