//! Page chrome around rendered form bodies

use axum::http::StatusCode;
use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::auth::Claims;
use crate::member::MemberRecord;

const TITLE: &str = "Hack@UCF Membership";

fn layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " | " (TITLE) }
                link rel="stylesheet" href="/static/form.css";
            }
            body {
                (content)
            }
        }
    }
}

/// One onboarding step. `body` is the already rendered form fragment.
pub fn form_page(claims: &Claims, body: &str) -> Markup {
    let content = html! {
        div.header {
            @if let Some(pfp) = &claims.pfp {
                img.pfp src=(pfp) alt="";
            }
            div {
                h2.name { (claims.name) }
                span.member_id { "Member ID: " (claims.sub) }
            }
        }
        div.form_body {
            (PreEscaped(body))
        }
        script src="/static/form.js" {}
    };

    layout("Join", content)
}

/// "My membership" page built from the stored record.
pub fn profile_page(record: &MemberRecord) -> Markup {
    let signed_ethics = record
        .ethics_form
        .as_ref()
        .is_some_and(|form| form.signtime > 0);
    let discord = record.discord.as_ref().map(|d| d.username.as_str());

    let content = html! {
        div.header {
            @if let Some(pfp) = record.avatar_url() {
                img.pfp src=(pfp) alt="";
            }
            div {
                h2.name { (record.display_name()) }
                span.member_id { "Member ID: " (record.id) }
            }
        }
        div.form_body {
            h1 { "My Membership" }
            table.profile {
                (profile_row("Discord", discord.unwrap_or("Not linked")))
                (profile_row("Email", &record.email))
                (profile_row("NID", record.nid.as_deref().unwrap_or("")))
                (profile_row("Major", &record.major))
                (profile_row("Class standing", &record.class_standing))
                (profile_row("Shirt size", &record.shirt_size))
                (profile_row("Ethics form", yes_no(signed_ethics, "Signed", "Not signed")))
                (profile_row("Dues", yes_no(record.did_pay_dues, "Paid", "Unpaid")))
                (profile_row("Status", yes_no(record.is_full_member, "Full member", "Applicant")))
            }
            div.entry {
                a.btn.wide href="/join" { "Edit answers" }
                a.btn.wide.grey href="/logout" { "Log out" }
            }
        }
    };

    layout("Profile", content)
}

fn profile_row(label: &str, value: &str) -> Markup {
    html! {
        tr {
            th { (label) }
            td { (value) }
        }
    }
}

fn yes_no<'a>(flag: bool, yes: &'a str, no: &'a str) -> &'a str {
    if flag { yes } else { no }
}

/// Landing page for visitors without a session.
pub fn landing_page(login_url: &str) -> Markup {
    let content = html! {
        div.form_body {
            h1 { "Join " (TITLE) }
            p { "Sign in with Discord to start or continue your membership application." }
            div.entry {
                a.btn.wide href=(login_url) { "Sign in with Discord" }
            }
        }
    };

    layout("Sign up", content)
}

pub fn final_page() -> Markup {
    let content = html! {
        div.form_body {
            h1 { "You're all set" }
            p {
                "Your answers have been saved. Pay dues to become a full member; "
                "you can come back and edit your answers at any time."
            }
            div.entry {
                a.btn.wide.grey href="/join" { "Review answers" }
            }
        }
    };

    layout("Done", content)
}

pub fn error_page(status: StatusCode, essay: &str) -> Markup {
    let heading = status.canonical_reason().unwrap_or("Error");

    let content = html! {
        div.form_body {
            h1 { (status.as_u16()) " " (heading) }
            p { (essay) }
            div.entry {
                a.btn.wide.grey href="/join" { "Start over" }
            }
        }
    };

    layout(heading, content)
}
