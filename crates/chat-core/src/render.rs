//! Reply renderer — turns a message into something the message pane can draw.
//!
//! Pure: no I/O, no state. Assistant text that looks like a billing summary
//! becomes a list of cards; everything else is a chat bubble.
//!
//! Billing detection is a best-effort text heuristic, not a schema. It lives
//! behind [`ReportExtractor`] so a structured payload can replace it without
//! touching layout code.

use chat_types::message::{ChatMessage, Sender};

const MONTH_DELIMITER: &str = "Month";
const FIELD_SEPARATOR: char = ',';
const PHONE_FIELD: &str = "Phone charge";
const INTERNET_FIELD: &str = "Internet charge";
const TOTAL_FIELD: &str = "Total";
const STATUS_FIELD: &str = "Status";
const PAID_MARKER: &str = "status: paid";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub sender: Sender,
    pub align: Align,
    pub text: String,
}

impl Bubble {
    pub fn label(&self) -> &'static str {
        self.sender.label()
    }
}

/// One month of a billing summary. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillingCard {
    pub month: String,
    pub phone: String,
    pub internet: String,
    pub total: String,
    pub status: String,
    pub paid: bool,
}

impl BillingCard {
    pub fn header(&self) -> String {
        format!("{} {}", MONTH_DELIMITER, self.month)
    }

    pub fn status_label(&self) -> &'static str {
        if self.paid {
            "Paid ✅"
        } else {
            "Unpaid ❌"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyView {
    Bubble(Bubble),
    Cards(Vec<BillingCard>),
}

/// Recognises a structured report inside assistant text
pub trait ReportExtractor {
    /// `None` when the text is not a report
    fn extract(&self, text: &str) -> Option<Vec<BillingCard>>;
}

/// Substring heuristic over text of the form
/// `Month 1: Phone charge: 10, Internet charge: 20, Total: 30, Status: Paid Month 2: ...`
#[derive(Debug, Clone, Copy, Default)]
pub struct BillingExtractor;

impl ReportExtractor for BillingExtractor {
    fn extract(&self, text: &str) -> Option<Vec<BillingCard>> {
        if !text.contains(MONTH_DELIMITER) {
            return None;
        }
        let cards = text
            .split(MONTH_DELIMITER)
            .filter(|entry| !entry.is_empty())
            .map(parse_billing_entry)
            .collect();
        Some(cards)
    }
}

fn parse_billing_entry(entry: &str) -> BillingCard {
    let entry = entry.trim();
    let parts: Vec<&str> = entry.split(FIELD_SEPARATOR).collect();
    let field = |needle: &str| {
        parts
            .iter()
            .find(|p| p.contains(needle))
            .map(|p| p.trim().to_string())
            .unwrap_or_default()
    };

    let month = entry.split(':').next().unwrap_or_default().to_string();
    let status = field(STATUS_FIELD);
    let paid = status.to_lowercase().contains(PAID_MARKER);

    BillingCard {
        month,
        phone: field(PHONE_FIELD),
        internet: field(INTERNET_FIELD),
        total: field(TOTAL_FIELD),
        status,
        paid,
    }
}

pub struct ReplyRenderer<E = BillingExtractor> {
    extractor: E,
}

impl ReplyRenderer {
    pub fn new() -> Self {
        Self {
            extractor: BillingExtractor,
        }
    }
}

impl Default for ReplyRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ReportExtractor> ReplyRenderer<E> {
    pub fn with_extractor(extractor: E) -> Self {
        Self { extractor }
    }

    pub fn render(&self, text: &str, sender: Sender) -> ReplyView {
        if sender == Sender::Assistant {
            if let Some(cards) = self.extractor.extract(text) {
                return ReplyView::Cards(cards);
            }
        }
        let align = match sender {
            Sender::User => Align::Right,
            Sender::Assistant => Align::Left,
        };
        ReplyView::Bubble(Bubble {
            sender,
            align,
            text: text.to_string(),
        })
    }

    pub fn render_message(&self, msg: &ChatMessage) -> ReplyView {
        self.render(&msg.text, msg.sender)
    }
}

/// Render with the default billing heuristic
pub fn render_reply(text: &str, sender: Sender) -> ReplyView {
    ReplyRenderer::new().render(text, sender)
}
