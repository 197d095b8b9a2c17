use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::time::Duration;

use crate::errors::FormErrors;
use crate::nav::Notice;
use crate::profile::BirthProfile;
use crate::session::{ChatMessage, MessageContent, Sender};

pub fn render_message(msg: &ChatMessage) -> String {
    let who = match msg.sender {
        Sender::User => "You".cyan().bold(),
        Sender::Assistant => "✦ Astro".magenta().bold(),
    };
    match &msg.content {
        MessageContent::Text(t) => format!("{who}: {t}"),
        MessageContent::Insight(r) => {
            let mut out = format!("{who}:");
            for s in r.sections() {
                out.push_str(&format!("\n  {}\n{}", format!("{}:", s.label).yellow().bold(), indent(s.text, 4)));
            }
            out
        }
    }
}

pub fn show_message(msg: &ChatMessage) {
    println!("{}\n", render_message(msg));
}

pub fn render_suggestions(suggestions: &[String]) -> String {
    let mut out = format!("{}", "Try asking:".dimmed());
    for (i, s) in suggestions.iter().enumerate() {
        out.push_str(&format!("\n  [{}] {}", i + 1, s.cyan()));
    }
    out
}

pub fn show_suggestions(suggestions: &[String]) {
    if suggestions.is_empty() {
        return;
    }
    println!("{}\n", render_suggestions(suggestions));
}

pub fn show_notice(n: &Notice) {
    let title = if n.is_destructive() {
        n.title.red().bold()
    } else {
        n.title.green().bold()
    };
    eprintln!("{} {}", title, n.description);
}

pub fn show_form_errors(errors: &FormErrors) {
    for e in &errors.0 {
        eprintln!("  {} {}", format!("{}:", e.field).red(), e.message);
    }
}

pub fn show_profile(p: &BirthProfile) {
    println!("{}", "Saved birth details".bold());
    println!("  Date:     {}", p.date.format("%Y-%m-%d"));
    println!("  Time:     {}", p.time);
    println!("  Location: {}", p.location);
    println!("  Language: {}", p.language);
}

/// Print `label` and read one line. `None` on end of input.
pub fn prompt_line(label: &str) -> Option<String> {
    print!("{} ", label.bold());
    let _ = io::stdout().flush();
    let mut s = String::new();
    match io::stdin().lock().read_line(&mut s) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(s.trim_end_matches(&['\r', '\n'][..]).to_string()),
    }
}

pub fn confirm(prompt: &str) -> bool {
    match prompt_line(&format!("{prompt} [y/N]:")) {
        Some(ans) => {
            let ans = ans.trim().to_lowercase();
            ans == "y" || ans == "yes"
        }
        None => false,
    }
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.magenta} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn indent(s: &str, n: usize) -> String {
    let pad = " ".repeat(n);
    s.lines()
        .map(|l| format!("{}{}", pad, l))
        .collect::<Vec<_>>()
        .join("\n")
}
