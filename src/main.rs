use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;

use webastro::cli::{Args, Command, ProfileAction};
use webastro::config::Config;
use webastro::contact::ContactForm;
use webastro::context::local_now;
use webastro::errors::{FormErrors, OnboardingError};
use webastro::flows::{InsightProvider, PromptFlows};
use webastro::log::{init_tracing, ExchangeRecorder};
use webastro::nav::Route;
use webastro::onboarding::BirthDetailsForm;
use webastro::profile::Language;
use webastro::provider::{make_provider, DynProvider};
use webastro::session::{ChatSession, Completion, Mount, FALLBACK_SUGGESTIONS};
use webastro::store::{FileProfileStore, ProfileStore};
use webastro::wire::{SuggestionsRequest, SummaryRequest};
use webastro::ux;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut cfg = Config::load(args.config.as_deref())?;
    cfg.apply_args(&args);
    init_tracing(&cfg.log_level);

    let store = FileProfileStore::new(cfg.data_dir()?);

    match args.command {
        Command::GetStarted { date, time, location, language } => {
            let fields = [date, time, location, language];
            if get_started(&store, fields)? {
                println!("Next: run `{}`.", Route::Chat.command());
            }
        }
        Command::Chat => chat(&cfg, &store).await?,
        Command::Suggest { topic } => suggest(&cfg, topic).await?,
        Command::Summarize { data } => summarize(&cfg, &data).await?,
        Command::Contact { name, email, message } => contact(&cfg, [name, email, message])?,
        Command::Profile { action } => match action {
            ProfileAction::Show => match store.load() {
                Ok(Some(p)) => ux::show_profile(&p),
                Ok(None) => println!("No birth details saved. Run `webastro get-started`."),
                Err(e) => println!("Saved birth details are unusable ({e}). Run `webastro get-started`."),
            },
            ProfileAction::Clear => {
                if ux::confirm("Remove your saved birth details?") {
                    store.clear()?;
                    println!("Birth details removed.");
                }
            }
        },
    }

    Ok(())
}

fn build_flows(cfg: &Config) -> Result<PromptFlows<DynProvider>> {
    let provider = make_provider(cfg)?;
    let mut flows = PromptFlows::new(provider);
    if cfg.save_exchanges {
        flows = flows.with_recorder(ExchangeRecorder::new(cfg.data_dir()?));
    }
    Ok(flows)
}

/// Prompt for every field still `None`. `None` overall on end of input.
fn fill(fields: &mut [Option<String>], labels: &[&str]) -> Option<()> {
    for (slot, label) in fields.iter_mut().zip(labels) {
        if slot.is_none() {
            *slot = Some(ux::prompt_line(label)?);
        }
    }
    Some(())
}

/// Clear the fields named in `errors` so the next pass asks for them again.
fn reset_failed(fields: &mut [Option<String>], names: &[&str], errors: &FormErrors) {
    for (slot, name) in fields.iter_mut().zip(names) {
        if errors.message_for(name).is_some() {
            *slot = None;
        }
    }
}

/// Returns `false` if the user gave up (end of input).
fn get_started(store: &dyn ProfileStore, mut fields: [Option<String>; 4]) -> Result<bool> {
    const NAMES: [&str; 4] = ["birth_date", "birth_time", "birth_location", "language"];
    let languages = Language::ALL.map(|l| l.as_str()).join(", ");
    let language_label = format!("Language ({languages}):");
    let labels = ["Birth date (YYYY-MM-DD):", "Birth time (HH:MM, 24-hour):", "Birth location:", language_label.as_str()];

    loop {
        if fill(&mut fields, &labels).is_none() {
            return Ok(false);
        }
        let [d, t, l, g] = fields.clone().map(Option::unwrap_or_default);
        let form = BirthDetailsForm::new(d, t, l, g);

        match form.submit(store, local_now().date()) {
            Ok(sub) => {
                ux::show_notice(&sub.notice);
                return Ok(true);
            }
            Err(OnboardingError::Invalid(errors)) => {
                ux::show_form_errors(&errors);
                reset_failed(&mut fields, &NAMES, &errors);
            }
            Err(e) => {
                if let Some(n) = e.notice() {
                    ux::show_notice(&n);
                }
                return Err(e.into());
            }
        }
    }
}

async fn chat(cfg: &Config, store: &dyn ProfileStore) -> Result<()> {
    let flows = build_flows(cfg)?;

    let mut session = loop {
        let mut s = ChatSession::new().with_current_location(cfg.current_location.clone());
        match s.mount(store) {
            Mount::Ready => break s,
            Mount::Redirect(route) => {
                for n in s.drain_notices() {
                    ux::show_notice(&n);
                }
                println!("Continuing with `{}`.", route.command());
                if !get_started(store, Default::default())? {
                    return Ok(());
                }
            }
        }
    };

    let pb = ux::spinner("Loading your cosmic connection...");
    session.load_suggestions(&flows, None).await;
    pb.finish_and_clear();

    let mut shown = 0;
    loop {
        for msg in &session.transcript()[shown..] {
            ux::show_message(msg);
        }
        shown = session.transcript().len();
        for n in session.drain_notices() {
            ux::show_notice(&n);
        }
        ux::show_suggestions(session.visible_suggestions());

        let Some(line) = ux::prompt_line("Ask about your stars ›") else {
            break;
        };
        let line = line.trim();
        if line == "/quit" || line == "/exit" {
            break;
        }

        let pick = line
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=session.visible_suggestions().len()).contains(n));

        let pb = ux::spinner("Reading the stars...");
        let outcome = match pick {
            Some(n) => session.accept_suggestion(&flows, n - 1, local_now()).await,
            None => session.submit(&flows, line, local_now()).await,
        };
        pb.finish_and_clear();

        if let Ok(Completion::Stale) = outcome {
            tracing::debug!("result arrived after the session moved on");
        }
    }

    session.close();
    Ok(())
}

async fn suggest(cfg: &Config, topic: Option<String>) -> Result<()> {
    let flows = build_flows(cfg)?;
    let pb = ux::spinner("Thinking of questions...");
    let result = flows.get_suggestions(&SuggestionsRequest { topic }).await;
    pb.finish_and_clear();

    let suggestions = match result {
        Ok(r) if !r.suggestions.is_empty() => r.suggestions,
        Ok(_) => Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "suggestions failed; using fallback");
            FALLBACK_SUGGESTIONS.iter().map(|s| s.to_string()).collect()
        }
    };
    for s in suggestions {
        println!("• {s}");
    }
    Ok(())
}

async fn summarize(cfg: &Config, data: &str) -> Result<()> {
    let astrological_data = if data == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
        buf
    } else {
        data.to_string()
    };
    if astrological_data.trim().is_empty() {
        anyhow::bail!("nothing to summarize");
    }

    let flows = build_flows(cfg)?;
    let pb = ux::spinner("Summarizing...");
    let result = flows.summarize(&SummaryRequest { astrological_data }).await;
    pb.finish_and_clear();

    let summary = result.context("Failed to summarize astrological data. Please try again.")?;
    println!("{}", summary.summary);
    Ok(())
}

fn contact(cfg: &Config, mut fields: [Option<String>; 3]) -> Result<()> {
    const NAMES: [&str; 3] = ["name", "email", "message"];
    let labels = ["Your name:", "Your email:", "Message (10-500 characters):"];

    loop {
        if fill(&mut fields, &labels).is_none() {
            return Ok(());
        }
        let [n, e, m] = fields.clone().map(Option::unwrap_or_default);
        match ContactForm::new(n, e, m).submit(&cfg.contact_email) {
            Ok(sub) => {
                ux::show_notice(&sub.notice);
                println!("{}", sub.uri);
                return Ok(());
            }
            Err(errors) => {
                ux::show_form_errors(&errors);
                reset_failed(&mut fields, &NAMES, &errors);
            }
        }
    }
}
