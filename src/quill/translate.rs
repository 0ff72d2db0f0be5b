//! Translation panel backed by the MyMemory public API.

use std::time::Duration;

use reqwest::Url;
use serde_json::Value;

use crate::errors::Result;
use crate::specific_fail;

pub static ENDPOINT: &str = "https://api.mymemory.translated.net/get";

/// marker MyMemory puts in responses once the free quota is used up
pub static RATE_LIMIT_MARKER: &str = "MYMEMORY WARNING";

pub static MSG_SELECT_LANGUAGES: &str = "Please select both languages";
pub static MSG_TRANSLATING: &str = "Translating...";
pub static MSG_COMPLETE: &str = "Translation complete";
pub static MSG_FAILED: &str = "Translation failed. Please try again.";
pub static MSG_RATE_LIMITED: &str = "Daily translation limit reached. Please try again tomorrow.";

/// Languages offered by the panel, as (code, name).
pub static LANGUAGES: [(&str, &str); 10] = [
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("ru", "Russian"),
    ("zh", "Chinese"),
    ("ja", "Japanese"),
    ("ar", "Arabic"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
];

pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGES.iter().find(|(c, _)| *c == code).map(|(_, n)| *n)
}

/// Accept an empty code (nothing chosen yet) or one of `LANGUAGES`.
pub fn check_language(code: &str) -> Result<()> {
    if code.is_empty() || language_name(code).is_some() {
        return Ok(());
    }
    let known: Vec<&str> = LANGUAGES.iter().map(|(c, _)| *c).collect();
    specific_fail!(format!("unknown language '{}' (one of {})", code, known.join(", ")))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TranslationOutcome {
    Translated(String),
    Failed,
    RateLimited,
}

impl TranslationOutcome {
    pub fn status(&self) -> &'static str {
        match *self {
            TranslationOutcome::Translated(_) => MSG_COMPLETE,
            TranslationOutcome::Failed => MSG_FAILED,
            TranslationOutcome::RateLimited => MSG_RATE_LIMITED,
        }
    }
}

pub fn request_url(text: &str, source: &str, target: &str, email: &str) -> Result<Url> {
    let pair = format!("{}|{}", source, target);
    let params = [("q", text.trim()), ("langpair", pair.as_str()), ("de", email)];
    match Url::parse_with_params(ENDPOINT, &params) {
        Ok(u) => Ok(u),
        Err(e) => specific_fail!(format!("bad translation url: {}", e)),
    }
}

fn response_status(v: &Value) -> Option<i64> {
    match *v {
        Value::Number(ref n) => n.as_i64(),
        Value::String(ref s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Interpret a response body. Anything short of status 200 with a
/// translated text is a failure.
pub fn parse_response(body: &str) -> TranslationOutcome {
    if body.contains(RATE_LIMIT_MARKER) {
        return TranslationOutcome::RateLimited;
    }
    let data: Value = match serde_json::from_str(body) {
        Ok(d) => d,
        Err(e) => {
            log::warn!("Translation error: {}", e);
            return TranslationOutcome::Failed;
        }
    };
    let status = data.get("responseStatus").and_then(response_status);
    let text = data.get("responseData")
                   .and_then(|r| r.get("translatedText"))
                   .and_then(Value::as_str);
    match (status, text) {
        (Some(200), Some(t)) => TranslationOutcome::Translated(t.to_string()),
        _ => {
            log::warn!("Translation error: invalid translation response (status {:?})", status);
            TranslationOutcome::Failed
        }
    }
}

pub trait Translator {
    fn translate(&self, text: &str, source: &str, target: &str) -> TranslationOutcome;
}

pub struct MyMemoryClient {
    client: reqwest::blocking::Client,
    email: String,
}

impl MyMemoryClient {
    pub fn new(email: &str) -> Result<MyMemoryClient> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(MyMemoryClient { client: client, email: email.to_string() })
    }

    fn fetch(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let url = request_url(text, source, target, &self.email)?;
        log::debug!("requesting translation {}|{}", source, target);
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() && !body.contains(RATE_LIMIT_MARKER) {
            return specific_fail!(format!("Translation request failed ({})", status));
        }
        Ok(body)
    }
}

impl Translator for MyMemoryClient {
    fn translate(&self, text: &str, source: &str, target: &str) -> TranslationOutcome {
        match self.fetch(text, source, target) {
            Ok(body) => parse_response(&body),
            Err(e) => {
                log::warn!("Translation error: {}", e);
                TranslationOutcome::Failed
            }
        }
    }
}

/// One outstanding request, identified by its ticket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub ticket: u64,
    pub text: String,
    pub source: String,
    pub target: String,
}

/// The translate dialog. Results only land while the dialog that asked for
/// them is still open, and only for the most recent request.
#[derive(Debug, Default)]
pub struct TranslationPanel {
    open: bool,
    pub text: String,
    pub source: String,
    pub target: String,
    next_ticket: u64,
    latest: Option<u64>,
    result: Option<String>,
    status: String,
}

impl TranslationPanel {
    pub fn new() -> TranslationPanel {
        TranslationPanel::default()
    }

    pub fn open(&mut self, source: &str, target: &str) {
        self.open = true;
        self.text.clear();
        self.source = source.to_string();
        self.target = target.to_string();
        self.latest = None;
        self.result = None;
        self.status.clear();
    }

    pub fn close(&mut self) {
        self.open = false;
        self.latest = None;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Exchange source and target, only when both are chosen.
    pub fn swap(&mut self) -> bool {
        if self.source.is_empty() || self.target.is_empty() {
            return false;
        }
        std::mem::swap(&mut self.source, &mut self.target);
        true
    }

    /// Start a request for the current text. `None` when the panel is closed
    /// or something is missing.
    pub fn request(&mut self) -> Option<Request> {
        if !self.open {
            return None;
        }
        let text = self.text.trim();
        if text.is_empty() || self.source.is_empty() || self.target.is_empty() {
            self.status = MSG_SELECT_LANGUAGES.to_string();
            return None;
        }
        self.next_ticket += 1;
        self.latest = Some(self.next_ticket);
        self.result = None;
        self.status = MSG_TRANSLATING.to_string();
        Some(Request {
            ticket: self.next_ticket,
            text: text.to_string(),
            source: self.source.clone(),
            target: self.target.clone(),
        })
    }

    /// Apply the outcome of `ticket`. Returns false when it was dropped.
    pub fn accept(&mut self, ticket: u64, outcome: TranslationOutcome) -> bool {
        if !self.open || self.latest != Some(ticket) {
            log::debug!("dropping stale translation result {}", ticket);
            return false;
        }
        self.latest = None;
        self.status = outcome.status().to_string();
        if let TranslationOutcome::Translated(t) = outcome {
            self.result = Some(t);
        }
        true
    }

    /// Request and wait for the result in one go.
    pub fn run<T: Translator + ?Sized>(&mut self, translator: &T) -> Option<&str> {
        let req = self.request()?;
        let outcome = translator.translate(&req.text, &req.source, &req.target);
        self.accept(req.ticket, outcome);
        self.result()
    }

    /// Take the finished translation for insertion and close the panel.
    pub fn take_for_insert(&mut self) -> Option<String> {
        let text = self.result.take()?;
        self.close();
        Some(text)
    }
}
