//! Reply templates for every terminal turn state.

use cdcommon::Domain;
use cdprovider::{StatusRecord, ToolOutcome};
use serde_json::Value;

use crate::{SensitiveFinding, SensitiveKind};

pub const GENERAL_GUIDANCE_LABEL: &str =
    "Based on general information. This is not a status confirmation.";

pub const TURN_ERROR_REPLY: &str =
    "Sorry, something went wrong while handling that request. Please try again.";

const CLOSED_DATE_FIELDS: [&str; 5] = ["closed_on", "closed_date", "resolved_on", "date", "closed"];

pub fn privacy_warning(findings: &[SensitiveFinding]) -> String {
    let mut kinds: Vec<SensitiveKind> = findings.iter().map(|finding| finding.kind).collect();
    kinds.sort();
    kinds.dedup();

    let labels: Vec<&str> = kinds.iter().map(SensitiveKind::label).collect();
    let mut reply = format!(
        "For your privacy, please do not share your {} here. I have not used or stored it.",
        join_alternatives(&labels)
    );
    reply.push_str(" Never share OTPs or bank details with anyone.");

    let portals: Vec<String> = kinds
        .iter()
        .filter_map(SensitiveKind::domain)
        .map(|domain| format!("{} ({})", domain.authority(), domain.portal()))
        .collect();
    if portals.is_empty() {
        reply.push_str(" Please use the official government portal directly.");
    } else {
        reply.push_str(&format!(
            " To check a status, share the reference from your acknowledgement slip instead, or use {} directly.",
            portals.join(" or ")
        ));
    }

    reply
}

pub fn clarify_reference(domain: Domain) -> String {
    match domain {
        Domain::Grievance => "To check your grievance I need the registration number you \
             received when it was filed."
            .to_string(),
        _ => format!(
            "To check your {label} status I need the reference printed on your acknowledgement \
             slip, such as the enrolment or application ID. Please do not share the {label} \
             number itself.",
            label = domain.label()
        ),
    }
}

pub fn clarify_domains(domains: &[Domain]) -> String {
    let labels: Vec<&str> = domains.iter().map(Domain::label).collect();
    format!(
        "Your question could be about {}. Which service do you mean?",
        join_alternatives(&labels)
    )
}

pub fn general_guidance(topic: Option<Domain>) -> String {
    let body = match topic {
        Some(Domain::Identity) => {
            "Aadhaar enrolment and updates are handled at Aadhaar Seva Kendras and online \
             through UIDAI. Carry original proof of identity and proof of address."
        }
        Some(Domain::TaxId) => {
            "PAN applications and corrections are made online through the Income Tax e-filing \
             portal or at authorised PAN centres. You usually need proof of identity, address \
             and date of birth."
        }
        Some(Domain::TravelDocument) => {
            "For a new passport you generally register on Passport Seva, fill in the \
             application form, pay the fee online and book an appointment at a Passport Seva \
             Kendra. Commonly needed: proof of present address, proof of date of birth and a \
             photo identity document."
        }
        Some(Domain::Grievance) => {
            "Complaints about central government services can be registered on CPGRAMS. Keep \
             the registration number so you can track the grievance later."
        }
        None => {
            "I can help with Aadhaar, PAN, passport and public grievance services. Tell me \
             which service you need, or share an application or grievance reference to check \
             its status."
        }
    };

    let mut reply = format!("{GENERAL_GUIDANCE_LABEL}\n{body}");
    if let Some(domain) = topic {
        reply.push_str(&format!(
            "\nRules and documents can change; the final authority is {}. Official portal: {}",
            domain.authority(),
            domain.portal()
        ));
    }
    reply
}

/// One paragraph describing what a single invocation returned.
pub fn outcome_summary(domain: Option<Domain>, reference: &str, outcome: &ToolOutcome) -> String {
    match (outcome, domain) {
        (ToolOutcome::Record { payload }, Some(domain)) => record_summary(domain, reference, payload),
        (ToolOutcome::Record { payload }, None) => {
            let status = payload
                .get("status")
                .map(|status| format!(" Current status: {}.", render_value(status)))
                .unwrap_or_default();
            format!(
                "I checked the official records for {reference}.{status}{}",
                field_lines(payload)
            )
        }
        (ToolOutcome::NotFound { domain, key }, _) => not_found(*domain, key),
        (ToolOutcome::Unavailable { .. }, Some(domain)) => unavailable(domain),
        (ToolOutcome::Unavailable { .. }, None) => {
            "The status service did not respond, so I cannot confirm your status right now. \
             Please try again later."
                .to_string()
        }
        (ToolOutcome::BadRequest { .. } | ToolOutcome::UnknownOperation { .. }, Some(domain)) => {
            format!(
                "Sorry, I could not complete the {} status check. Please try again, or check \
                 with {} at {}.",
                domain.label(),
                domain.authority(),
                domain.portal()
            )
        }
        (ToolOutcome::BadRequest { .. } | ToolOutcome::UnknownOperation { .. }, None) => {
            "Sorry, I could not complete that status check. Please try again.".to_string()
        }
    }
}

/// The redirect sentence a failed lookup must carry, if the outcome is a failure.
pub fn failure_redirect(domain: Option<Domain>, outcome: &ToolOutcome) -> Option<String> {
    match outcome {
        ToolOutcome::NotFound { domain, key } => Some(not_found(*domain, key)),
        ToolOutcome::Unavailable { .. } => domain.map(unavailable),
        _ => None,
    }
}

fn not_found(domain: Domain, key: &str) -> String {
    format!(
        "I could not find a {} record for {key}. Please check the reference, or check with {} \
         at {}.",
        domain.label(),
        domain.authority(),
        domain.portal()
    )
}

fn unavailable(domain: Domain) -> String {
    format!(
        "The {} status service did not respond, so I cannot confirm your status right now. \
         Please try again later or check with {} at {}.",
        domain.label(),
        domain.authority(),
        domain.portal()
    )
}

fn record_summary(domain: Domain, reference: &str, payload: &StatusRecord) -> String {
    let status = payload.get("status").map(render_value);

    if domain == Domain::Grievance
        && let Some(status) = status.as_deref()
        && (status.eq_ignore_ascii_case("resolved") || status.eq_ignore_ascii_case("closed"))
    {
        let closed = CLOSED_DATE_FIELDS
            .iter()
            .find_map(|field| payload.get(*field))
            .map(render_value);
        return match closed {
            Some(date) => format!(
                "I checked CPGRAMS: your grievance {reference} is resolved, closed {date}. No \
                 further action is needed from you."
            ),
            None => format!(
                "I checked CPGRAMS: your grievance {reference} is resolved. No further action \
                 is needed from you."
            ),
        };
    }

    let headline = match status {
        Some(status) => format!(
            "I checked the official {} records for {reference}. Current status: {status}.",
            domain.label()
        ),
        None => format!(
            "I checked the official {} records for {reference}.",
            domain.label()
        ),
    };

    format!(
        "{headline}{}\nNext step: for any changes or follow-up, use {} ({}).",
        field_lines(payload),
        domain.authority(),
        domain.portal()
    )
}

fn field_lines(payload: &StatusRecord) -> String {
    let mut fields: Vec<(&String, &Value)> = payload
        .iter()
        .filter(|(field, _)| field.as_str() != "status")
        .collect();
    fields.sort_by(|left, right| left.0.cmp(right.0));

    fields
        .into_iter()
        .map(|(field, value)| format!("\n- {}: {}", field.replace('_', " "), render_value(value)))
        .collect()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn join_alternatives(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} or {last}", init.join(", ")),
    }
}
