//! Parse portal markup without a browser.
//!
//! All functions here are pure: they take raw HTML and return owned data,
//! so no parsed document is ever held across an `.await`.

use crate::branch::branch_short_code;
use crate::error::{PortalError, PortalResult};
use crate::types::{ProfileField, ProfileRecord};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Only the leading profile blocks hold the student record.
const PROFILE_BLOCK_LIMIT: usize = 7;

/// Label of the block whose value is the PRN.
const IDENTIFIER_LABEL: &str = "PESU Id";

static CAMPUS_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^PES([0-9])").unwrap());

/// What the login response says about the submitted credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The login form was rendered again.
    Rejected,
    /// No failure marker. Carries the refreshed token, if the page had one.
    Accepted { token: Option<String> },
}

/// Read the anti-forgery token from `<meta name="csrf-token">`.
pub fn extract_csrf_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    csrf_token(&document)
}

/// Classify a login response by the presence of the login form.
pub fn inspect_login_response(html: &str) -> LoginOutcome {
    let document = Html::parse_document(html);
    if select_first(&document, "div.login-form").is_some() {
        return LoginOutcome::Rejected;
    }
    LoginOutcome::Accepted {
        token: csrf_token(&document),
    }
}

/// Build a profile record from the profile page.
///
/// Campus is inferred from `identifier`, the login identifier, falling back
/// to the parsed PRN when it is absent or has no `PES<digit>` prefix.
/// Missing blocks or widgets just leave their fields out. A page with no
/// profile blocks at all is an error.
pub fn extract_profile(html: &str, identifier: Option<&str>) -> PortalResult<ProfileRecord> {
    let document = Html::parse_document(html);
    let block_sel = Selector::parse("div.form-group").unwrap();
    let blocks: Vec<ElementRef<'_>> = document.select(&block_sel).collect();
    if blocks.is_empty() {
        return Err(PortalError::MissingProfileMarkup);
    }

    let mut profile = ProfileRecord::new();

    for block in blocks.iter().take(PROFILE_BLOCK_LIMIT) {
        let Some((key, value)) = split_block(&block_text(block)) else {
            continue;
        };
        let field = match key.as_str() {
            "name" => ProfileField::Name,
            "srn" => ProfileField::Srn,
            "pesu_id" => ProfileField::Prn,
            "program" => ProfileField::Program,
            "branch" => ProfileField::Branch,
            "semester" => ProfileField::Semester,
            "section" => ProfileField::Section,
            _ => continue,
        };
        if field == ProfileField::Branch {
            if let Some(code) = branch_short_code(&value) {
                profile.insert_text(ProfileField::BranchShortCode, code);
            }
        }
        profile.insert_text(field, value);
    }

    if let Some(email) = input_value(&document, "input#updateMail") {
        profile.insert_text(ProfileField::Email, email);
    }
    if let Some(phone) = input_value(&document, "input#updateContact") {
        profile.insert_text(ProfileField::Phone, phone);
    }

    // Email and phone logins carry no prefix; the page's PRN does.
    let campus = identifier
        .and_then(infer_campus)
        .or_else(|| profile.text(ProfileField::Prn).and_then(infer_campus));
    if let Some((code, campus)) = campus {
        profile.insert_integer(ProfileField::CampusCode, code);
        profile.insert_text(ProfileField::Campus, campus);
    }

    Ok(profile)
}

/// Campus code and name from an identifier starting with `PES<digit>`.
///
/// Digit 1 is the RR campus; every other digit is EC.
pub fn infer_campus(identifier: &str) -> Option<(i64, &'static str)> {
    let digit = CAMPUS_PATTERN.captures(identifier)?.get(1)?.as_str();
    let code: i64 = digit.parse().ok()?;
    let campus = if code == 1 { "RR" } else { "EC" };
    Some((code, campus))
}

/// Split `"<Label> <Value>"` into a normalized key and the value.
///
/// The identifier block keeps only its last token as the value. Returns
/// `None` for blocks without a value.
pub fn split_block(text: &str) -> Option<(String, String)> {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix(IDENTIFIER_LABEL) {
        let value = rest.split_whitespace().last()?;
        return Some(("pesu_id".to_string(), value.to_string()));
    }

    let (label, value) = text.split_once(char::is_whitespace)?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let key = label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();
    Some((key, value.to_string()))
}

/// Zip the `th`/`td` cells returned by the class and section lookup.
///
/// Keys are lower-cased with spaces replaced by underscores.
pub fn parse_class_info(html: &str) -> BTreeMap<String, String> {
    let fragment = Html::parse_fragment(html);
    let th_sel = Selector::parse("th").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    fragment
        .select(&th_sel)
        .zip(fragment.select(&td_sel))
        .map(|(th, td)| {
            let key = block_text(&th).replace(' ', "_").to_lowercase();
            (key, block_text(&td))
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

fn csrf_token(document: &Html) -> Option<String> {
    select_first(document, r#"meta[name="csrf-token"]"#)?
        .value()
        .attr("content")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn input_value(document: &Html, css: &str) -> Option<String> {
    select_first(document, css)?
        .value()
        .attr("value")
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(css).ok()?;
    document.select(&sel).next()
}

/// Text nodes of an element, trimmed and joined with single spaces.
fn block_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
