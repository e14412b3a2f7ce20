use chrono::{NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;

/// The parsed meaning of an inbound message. Role checks happen in the
/// engine; the parser only classifies text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Greet,
    /// "1" — available slots for users, booked appointments for admins.
    ShowFirst,
    AdminRemaining,
    AdminReport,
    Book { date: NaiveDate, time: NaiveTime },
    UpdateSlots { date: NaiveDate, times: Vec<NaiveTime> },
    End,
    Cancel,
    /// Malformed command; the message is echoed verbatim as guidance.
    Invalid(String),
    Unrecognized,
}

const INCOMPLETE_BOOKING: &str = "Incomplete booking details.";
const INCOMPLETE_UPDATE: &str = "Incomplete update details.";
const BAD_DATE: &str = "Invalid date format. Use DD-MM-YYYY.";
const BAD_TIME: &str = "Invalid time format. Use hh:mm AM/PM.";
const BAD_UPDATE: &str =
    "Error updating slots. Please use the format: Update [date] [time1, time2, ...]";

const DATE_INPUT_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%d %b %Y", "%d %B %Y"];

lazy_static! {
    static ref TIME_PATTERN: Regex =
        Regex::new(r"(?i)^(0?[1-9]|1[0-2]):[0-5][0-9] (AM|PM)$").unwrap();
}

pub fn parse(text: &str) -> Intent {
    let trimmed = text.trim();
    let lowered = trimmed.to_lowercase();

    // Greeting wins over everything else, anywhere in the message.
    if lowered.contains("hi") {
        return Intent::Greet;
    }

    match lowered.as_str() {
        "1" => return Intent::ShowFirst,
        "3" => return Intent::AdminRemaining,
        "4" => return Intent::AdminReport,
        "end" => return Intent::End,
        "cancel" => return Intent::Cancel,
        _ => {}
    }

    if lowered.starts_with("book") {
        return parse_booking(trimmed);
    }
    if lowered.starts_with("update") {
        return parse_update(trimmed);
    }

    Intent::Unrecognized
}

fn parse_booking(text: &str) -> Intent {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 3 {
        return Intent::Invalid(INCOMPLETE_BOOKING.into());
    }
    let (date, rest) = match take_date(&tokens[1..]) {
        Some(pair) => pair,
        None => return Intent::Invalid(BAD_DATE.into()),
    };
    if rest.is_empty() {
        return Intent::Invalid(INCOMPLETE_BOOKING.into());
    }
    match parse_time(&rest.join(" ")) {
        Some(time) => Intent::Book { date, time },
        None => Intent::Invalid(BAD_TIME.into()),
    }
}

fn parse_update(text: &str) -> Intent {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 3 {
        return Intent::Invalid(INCOMPLETE_UPDATE.into());
    }
    let (date, rest) = match take_date(&tokens[1..]) {
        Some(pair) => pair,
        None => return Intent::Invalid(BAD_UPDATE.into()),
    };
    if rest.is_empty() {
        return Intent::Invalid(INCOMPLETE_UPDATE.into());
    }
    let mut times = Vec::new();
    for piece in rest.join(" ").split(',') {
        match parse_time(piece) {
            Some(time) => times.push(time),
            None => return Intent::Invalid(BAD_UPDATE.into()),
        }
    }
    Intent::UpdateSlots { date, times }
}

/// The date is either a single token (28-12-2024, 28/12/2024) or three
/// tokens (28 Dec 2024, 28 December 2024).
fn take_date<'a>(tokens: &'a [&'a str]) -> Option<(NaiveDate, &'a [&'a str])> {
    if let Some(date) = parse_date(tokens[0]) {
        return Some((date, &tokens[1..]));
    }
    if tokens.len() >= 3 {
        if let Some(date) = parse_date(&tokens[..3].join(" ")) {
            return Some((date, &tokens[3..]));
        }
    }
    None
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    if !TIME_PATTERN.is_match(text) {
        return None;
    }
    NaiveTime::parse_from_str(&text.to_uppercase(), "%I:%M %p").ok()
}
