//! Command implementations.
//!
//! Protected commands resolve their route through the guard first, exactly
//! as the corresponding view would, and bail out on a redirect.

use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use policydesk_core::auth::decode_claims;
use policydesk_core::models::{
    AiQueryRequest, AppointmentRequest, AppointmentStatus, AppointmentType, Credentials,
    RegisterRequest,
};
use policydesk_core::{GuardDecision, Route, View};
use tracing::warn;

use crate::App;

pub async fn run(app: &mut App, command: &str, args: &[String]) -> Result<()> {
    match command {
        "login" => login(app, args.first().cloned()).await,
        "register" => register(app, args.first().cloned()).await,
        "logout" => logout(app).await,
        "status" => status(app),
        "route" => {
            let path = args.first().ok_or_else(|| anyhow!("Usage: policydesk route <path>"))?;
            route(app, path)
        }
        "agents" => agents(app, args.first().map(String::as_str).unwrap_or("all")).await,
        "slots" => slots(app, args).await,
        "appointments" => appointments(app).await,
        "book" => book(app, args).await,
        "status-update" => status_update(app, args).await,
        "ask" => ask(app, &args.join(" ")).await,
        "analytics" => analytics(app).await,
        "forgot-password" => {
            let email = args
                .first()
                .ok_or_else(|| anyhow!("Usage: policydesk forgot-password <email>"))?;
            app.client.forgot_password(email).await?;
            println!("If {} is registered, a reset link is on its way.", email);
            Ok(())
        }
        "reset-password" => {
            let token = args
                .first()
                .ok_or_else(|| anyhow!("Usage: policydesk reset-password <token>"))?;
            let password = new_password()?;
            app.client.reset_password(token, &password).await?;
            println!("Password updated. You can now log in.");
            Ok(())
        }
        "verify-email" => {
            let token = args
                .first()
                .ok_or_else(|| anyhow!("Usage: policydesk verify-email <token>"))?;
            app.client.verify_email(token).await?;
            println!("Email verified. You can now log in.");
            Ok(())
        }
        other => bail!("Unknown command: {} (try `policydesk help`)", other),
    }
}

/// Resolve a protected route, failing the command on redirect.
///
/// An expired access token is exchanged once before giving up.
async fn admit(app: &App, route: Route) -> Result<View> {
    let stale = app.guard.resolve(route) == GuardDecision::Redirect(Route::Login)
        && app.client.store().refresh_token().is_some();
    if stale {
        app.client.refresh_session().await?;
    }
    match app.guard.navigate_to(route) {
        GuardDecision::Admit(view) => Ok(view),
        GuardDecision::Redirect(Route::Login) => bail!("Not logged in"),
        GuardDecision::Redirect(_) => bail!("Your role does not allow {}", route),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn new_password() -> Result<String> {
    let password = rpassword::prompt_password("New password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        bail!("Passwords do not match");
    }
    if password.len() < 6 {
        bail!("Password must be at least 6 characters");
    }
    Ok(password)
}

async fn login(app: &mut App, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| app.config.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password(format!("Password for {}: ", email))?;

    let session = app
        .client
        .login(&Credentials {
            email: email.clone(),
            password,
        })
        .await
        .context("Login failed")?;

    app.config.last_email = Some(email);
    if let Err(e) = app.config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Welcome, {}!", session.user.full_name);
    if let GuardDecision::Admit(view) = app.guard.resolve(Route::Dashboard) {
        println!("Dashboard: {:?}", view);
    }
    Ok(())
}

async fn register(app: &App, role: Option<String>) -> Result<()> {
    let role = match role {
        Some(role) => {
            let parsed: policydesk_core::Role = role.parse().map_err(|e: String| anyhow!(e))?;
            Some(parsed.as_str().to_string())
        }
        None => None,
    };
    let email = prompt("Email: ")?;
    let full_name = prompt("Full name: ")?;
    let phone = prompt("Phone (optional): ")?;
    let password = new_password()?;

    app.client
        .register(&RegisterRequest {
            email: email.clone(),
            password,
            full_name,
            phone_number: Some(phone).filter(|p| !p.is_empty()),
            address: None,
            role,
        })
        .await
        .context("Registration failed")?;

    println!(
        "Registration successful! Check {} for a verification link, then log in.",
        email
    );
    Ok(())
}

async fn logout(app: &App) -> Result<()> {
    if let Err(e) = app.client.logout().await {
        warn!(error = %e, "Logout request failed");
    }
    println!("Logged out.");
    Ok(())
}

fn status(app: &App) -> Result<()> {
    let Some(user) = app.evaluator.user() else {
        println!("Not logged in.");
        return Ok(());
    };
    println!("User:    {} <{}> (id {})", user.full_name, user.email, user.id);
    let roles: Vec<&str> = user.roles.iter().map(String::as_str).collect();
    println!("Roles:   {}", roles.join(", "));

    let expiry = app
        .client
        .store()
        .access_token()
        .and_then(|token| decode_claims(&token).ok())
        .and_then(|claims| claims.expires_at());
    match expiry {
        Some(at) => println!("Token:   expires {}", at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")),
        None => println!("Token:   unreadable"),
    }
    if app.evaluator.is_authenticated() {
        println!("Status:  authenticated, dashboard {:?}", app.evaluator.default_dashboard());
    } else {
        println!("Status:  access token expired (it is refreshed on the next request)");
    }
    Ok(())
}

fn route(app: &App, path: &str) -> Result<()> {
    let route = Route::from_path(path).ok_or_else(|| anyhow!("No such route: {}", path))?;
    match app.guard.resolve(route) {
        GuardDecision::Admit(view) => println!("{} -> {:?}", route, view),
        GuardDecision::Redirect(target) => println!("{} -> redirect to {}", route, target),
    }
    Ok(())
}

async fn agents(app: &App, filter: &str) -> Result<()> {
    admit(app, Route::Agents).await?;
    let agents = match filter {
        "all" => app.client.fetch_agents().await?,
        "available" => app.client.fetch_available_agents().await?,
        "top" => app.client.fetch_top_agents().await?,
        specialization => {
            app.client
                .fetch_agents_by_specialization(specialization)
                .await?
        }
    };
    if agents.is_empty() {
        println!("No agents found.");
    }
    for agent in agents {
        println!(
            "{:>4}  {:<24} {:<22} {:>7}  {}",
            agent.id.map(|id| id.to_string()).unwrap_or_default(),
            agent.display_name(),
            agent.specialization.as_deref().unwrap_or("-"),
            agent.display_rating(),
            if agent.is_available.unwrap_or(false) { "available" } else { "busy" }
        );
    }
    Ok(())
}

async fn slots(app: &App, args: &[String]) -> Result<()> {
    admit(app, Route::BookAppointment).await?;
    let agent_id: i64 = args
        .first()
        .ok_or_else(|| anyhow!("Usage: policydesk slots <agent-id> [from-date]"))?
        .parse()
        .context("Agent id must be a number")?;
    let from = match args.get(1) {
        Some(date) => NaiveDate::parse_from_str(date, "%Y-%m-%d").context("Date must be YYYY-MM-DD")?,
        None => Local::now().date_naive(),
    };
    let slots = app.client.fetch_available_slots(agent_id, from).await?;
    if slots.is_empty() {
        println!("No open slots from {}.", from);
    }
    for slot in slots {
        println!(
            "{}  {}-{}",
            slot.date,
            slot.start_time.format("%H:%M"),
            slot.end_time.format("%H:%M")
        );
    }
    Ok(())
}

async fn appointments(app: &App) -> Result<()> {
    admit(app, Route::Appointments).await?;
    let user = app
        .evaluator
        .user()
        .ok_or_else(|| anyhow!("Not logged in"))?;

    let appointments = if app.evaluator.is_admin() {
        app.client.fetch_appointments().await?
    } else if app.evaluator.is_agent() {
        let profile = app.client.fetch_agent_by_user(user.id).await?;
        let agent_id = profile
            .id
            .ok_or_else(|| anyhow!("Agent profile has no id"))?;
        app.client.fetch_agent_appointments(agent_id).await?
    } else {
        app.client.fetch_customer_appointments(user.id).await?
    };

    if appointments.is_empty() {
        println!("No appointments.");
    }
    for appointment in appointments {
        println!("{}", appointment.summary());
    }
    Ok(())
}

async fn book(app: &App, args: &[String]) -> Result<()> {
    admit(app, Route::BookAppointment).await?;
    let [agent_id, when, kind, notes @ ..] = args else {
        bail!("Usage: policydesk book <agent-id> <YYYY-MM-DDTHH:MM> <type> [notes...]");
    };
    let user = app
        .evaluator
        .user()
        .ok_or_else(|| anyhow!("Not logged in"))?;

    let booking = AppointmentRequest {
        customer_id: user.id,
        agent_id: agent_id.parse().context("Agent id must be a number")?,
        appointment_date_time: NaiveDateTime::parse_from_str(when, "%Y-%m-%dT%H:%M")
            .context("Date/time must be YYYY-MM-DDTHH:MM")?,
        appointment_type: kind.parse::<AppointmentType>().map_err(|e| anyhow!(e))?,
        notes: Some(notes.join(" ")).filter(|n| !n.is_empty()),
    };
    let appointment = app.client.book_appointment(&booking).await?;
    println!("Booked: {}", appointment.summary());
    Ok(())
}

async fn status_update(app: &App, args: &[String]) -> Result<()> {
    admit(app, Route::Appointments).await?;
    let [id, status, reason @ ..] = args else {
        bail!("Usage: policydesk status-update <id> <status> [reason...]");
    };
    let status: AppointmentStatus = status.parse().map_err(|e: String| anyhow!(e))?;
    let reason = reason.join(" ");
    let appointment = app
        .client
        .update_appointment_status(
            id.parse().context("Appointment id must be a number")?,
            status,
            Some(reason.as_str()).filter(|r| !r.is_empty()),
        )
        .await?;
    println!("Updated: {}", appointment.summary());
    Ok(())
}

async fn ask(app: &App, question: &str) -> Result<()> {
    admit(app, Route::AiAssistant).await?;
    if question.trim().is_empty() {
        bail!("Usage: policydesk ask <question...>");
    }
    let response = app
        .client
        .ask_assistant(&AiQueryRequest {
            question: question.to_string(),
            is_voice_query: false,
            user_id: app.evaluator.user().map(|u| u.id),
        })
        .await?;
    println!("{}", response.answer);
    if let Some(action) = &response.suggested_action {
        println!("\nSuggested: {}", action);
    }
    if response.offers_booking() {
        println!("Book with: policydesk agents available");
    }
    Ok(())
}

async fn analytics(app: &App) -> Result<()> {
    admit(app, Route::AdminDashboard).await?;
    let stats = app.client.fetch_analytics().await?;
    println!("Appointments: {} total", stats.total_appointments);
    println!(
        "  pending {}  confirmed {}  completed {}  cancelled {}",
        stats.pending_appointments,
        stats.confirmed_appointments,
        stats.completed_appointments,
        stats.cancelled_appointments
    );
    println!(
        "Users: {}  Agents: {}  Policies: {}  AI queries: {}",
        stats.total_users, stats.total_agents, stats.total_policies, stats.total_ai_queries
    );
    for (kind, count) in &stats.appointments_by_type {
        let label = kind
            .parse::<AppointmentType>()
            .map(|t| t.label())
            .unwrap_or(kind.as_str());
        println!("  {:<18} {}", label, count);
    }
    Ok(())
}
