//! Plain-text rendering of entities and session state.
//!
//! Output is one `key=value` record per line so it stays easy to grep.

use std::fmt::Write as _;

use crate::domain::{
    Brand, Campaign, Client, Consumer, EntityId, FieldErrors, GuardDecision, SessionState, Survey,
    reference_label,
};

fn push_optional(line: &mut String, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|value| !value.trim().is_empty()) {
        let _ = write!(line, " {key}={value}");
    }
}

/// Describe the session.
pub fn session(state: &SessionState) -> String {
    match state {
        SessionState::Unknown => "session=unknown".to_owned(),
        SessionState::Anonymous => "session=anonymous".to_owned(),
        SessionState::Authenticated(session) => format!(
            "session=authenticated role={} user={} email={} greeting=\"Welcome back, {}\"",
            session.role(),
            session.user_id(),
            session.email(),
            session.greeting_name()
        ),
    }
}

pub fn guard(path: &str, decision: GuardDecision) -> String {
    match decision {
        GuardDecision::Loading => format!("path={path} decision=loading"),
        GuardDecision::Render => format!("path={path} decision=render"),
        GuardDecision::RedirectTo(target) => {
            format!("path={path} decision=redirect location={target}")
        }
    }
}

/// One line per failed field, sorted by field name.
pub fn field_errors(errors: &FieldErrors) -> Vec<String> {
    errors
        .iter()
        .map(|(field, message)| format!("field={field} error={message}"))
        .collect()
}

pub fn client(client: &Client) -> String {
    let mut line = format!(
        "id={} name={} email={} status={}",
        client.id,
        client.name,
        client.email,
        client.status.as_str()
    );
    push_optional(&mut line, "phone", client.phone.as_deref());
    push_optional(&mut line, "industry", client.industry.as_deref());
    line
}

/// Brand line with its owning client resolved through `clients`.
pub fn brand(brand: &Brand, clients: &dyn Fn(&EntityId) -> Option<String>) -> String {
    let mut line = format!(
        "id={} name={} client={} status={}",
        brand.id,
        brand.name,
        reference_label(brand.client_id.as_ref(), clients),
        brand.status.as_str()
    );
    push_optional(&mut line, "logo", brand.logo_url.as_deref());
    push_optional(&mut line, "description", brand.description.as_deref());
    line
}

pub fn campaign(campaign: &Campaign, clients: &dyn Fn(&EntityId) -> Option<String>) -> String {
    let mut line = format!(
        "id={} name={} client={} brands={} status={}",
        campaign.id,
        campaign.name,
        reference_label(campaign.client_id.as_ref(), clients),
        campaign.brand_ids.len(),
        campaign.status.as_str()
    );
    if let Some(start) = campaign.start_date {
        let _ = write!(line, " start={start}");
    }
    if let Some(end) = campaign.end_date {
        let _ = write!(line, " end={end}");
    }
    if let Some(budget) = campaign.budget {
        let _ = write!(line, " budget={budget:.2}");
    }
    line
}

pub fn survey(survey: &Survey, campaigns: &dyn Fn(&EntityId) -> Option<String>) -> String {
    format!(
        "id={} title={} campaign={} questions={} status={}",
        survey.id,
        survey.title,
        reference_label(survey.campaign_id.as_ref(), campaigns),
        survey.questions.len(),
        survey.status.as_str()
    )
}

pub fn consumer(consumer: &Consumer) -> String {
    let mut line = format!(
        "id={} name={} email={} points={} status={}",
        consumer.id,
        consumer.name,
        consumer.email,
        consumer.reward_points,
        consumer.status.as_str()
    );
    if let Some(age) = consumer.age {
        let _ = write!(line, " age={age}");
    }
    push_optional(&mut line, "location", consumer.location.as_deref());
    line
}

#[cfg(test)]
mod tests {
    //! Rendering snapshots for representative records.
    use super::*;
    use crate::domain::{ActivityStatus, Role, Session, UserId};
    use rstest::rstest;

    fn id(raw: &str) -> EntityId {
        EntityId::new(raw).expect("valid id")
    }

    #[rstest]
    fn authenticated_session_names_role_and_greeting() {
        let session = Session::new(
            UserId::new("admin-1").expect("user id"),
            "admin@example.com",
            Some("Ada".to_owned()),
            Role::Admin,
        );
        assert_eq!(
            super::session(&SessionState::Authenticated(session)),
            "session=authenticated role=admin user=admin-1 email=admin@example.com greeting=\"Welcome back, Ada\""
        );
    }

    #[rstest]
    #[case(GuardDecision::Render, "path=/admin decision=render")]
    #[case(
        GuardDecision::RedirectTo("/admin/login"),
        "path=/admin decision=redirect location=/admin/login"
    )]
    fn guard_decisions_render_as_records(#[case] decision: GuardDecision, #[case] expected: &str) {
        assert_eq!(guard("/admin", decision), expected);
    }

    #[rstest]
    fn brand_lines_resolve_client_names_and_fall_back_to_ids() {
        let mut acme = Brand {
            id: id("b1"),
            name: "Acme".to_owned(),
            client_id: Some(id("c1")),
            description: None,
            logo_url: None,
            status: ActivityStatus::Active,
            created_at: None,
            updated_at: None,
        };
        let lookup = |candidate: &EntityId| {
            (candidate.as_str() == "c1").then(|| "Northwind".to_owned())
        };
        assert_eq!(
            brand(&acme, &lookup),
            "id=b1 name=Acme client=Northwind status=active"
        );

        acme.client_id = Some(id("c404"));
        assert!(brand(&acme, &lookup).contains("client=c404"));
        acme.client_id = None;
        assert!(brand(&acme, &lookup).contains("client=Unknown"));
    }

    #[rstest]
    fn blank_optional_fields_are_omitted() {
        let client = Client {
            id: id("c1"),
            name: "Northwind".to_owned(),
            email: "buyer@northwind.example".to_owned(),
            phone: Some("  ".to_owned()),
            industry: Some("Retail".to_owned()),
            status: ActivityStatus::Inactive,
            created_at: None,
            updated_at: None,
        };
        assert_eq!(
            super::client(&client),
            "id=c1 name=Northwind email=buyer@northwind.example status=inactive industry=Retail"
        );
    }
}
