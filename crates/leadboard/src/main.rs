//! `leadb` - CLI for leadboard
//!
//! This binary provides the command-line front end to a leadboard pipeline.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::Parser;
use tracing::{debug, error};

use leadboard::analytics;
use leadboard::audit;
use leadboard::board::{self, Paging};
use leadboard::calendar;
use leadboard::cli::output::{check_box, emit, print_json, truncate, Rows};
use leadboard::cli::{
    ActivityCommand, AnalyticsCommand, BoardCommand, CalendarCommand, Cli, Command, ConfigCommand,
    DashboardCommand, InitCommand, InterestCommand, LeadCommand, LeadFields, LogsCommand,
    NoteCommand, OutputFormat, ProfileCommand, StageCommand,
};
use leadboard::model::{EntityType, Lead};
use leadboard::validation::{ActivityForm, LeadForm, ProfileForm, WorkspaceForm};
use leadboard::{init_logging, ActivityUpdate, Config, Error, Kanban, Storage};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    let outcome = match cli.command {
        Command::Init(cmd) => handle_init(&config, cmd),
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
        command => open_kanban(&config).and_then(|mut kanban| run(&mut kanban, &config, command)),
    };
    if let Err(e) = &outcome {
        error!("{e:#}");
    }
    outcome
}

fn run(kanban: &mut Kanban, config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Board(cmd) => handle_board(kanban, config, cmd),
        Command::Stage(cmd) => handle_stage(kanban, cmd),
        Command::Interest(cmd) => handle_interest(kanban, cmd),
        Command::Lead(cmd) => handle_lead(kanban, cmd),
        Command::Note(cmd) => handle_note(kanban, cmd),
        Command::Activity(cmd) => handle_activity(kanban, cmd),
        Command::Calendar(cmd) => handle_calendar(kanban, cmd),
        Command::Dashboard(cmd) => handle_dashboard(kanban, config, &cmd),
        Command::Analytics(cmd) => handle_analytics(kanban, &cmd),
        Command::Logs(cmd) => handle_logs(kanban, &cmd),
        Command::Profile(cmd) => handle_profile(kanban, cmd),
        Command::Init(_) | Command::Status(_) | Command::Config(_) => {
            unreachable!("handled before the workspace is opened")
        }
    }
}

fn open_storage(config: &Config) -> Result<Storage> {
    let path = config.database_path();
    debug!("Opening database at {}", path.display());
    Storage::open(&path).with_context(|| format!("opening database at {}", path.display()))
}

fn open_kanban(config: &Config) -> Result<Kanban> {
    Ok(Kanban::load(open_storage(config)?)?)
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn confirm(yes: bool, what: &str) -> bool {
    if !yes {
        println!("This will delete {what}.");
        println!("Use --yes to confirm.");
    }
    yes
}

fn handle_init(config: &Config, cmd: InitCommand) -> Result<()> {
    let storage = open_storage(config)?;
    let form = WorkspaceForm {
        company_name: cmd.company,
        owner_name: cmd.name,
        owner_email: cmd.email,
    };
    let kanban = Kanban::init_workspace(storage, form, &config.pipeline.default_stages)?;

    let company = kanban.company();
    let user = kanban.user();
    println!("Initialized {} ({})", company.name, company.id);
    println!("Signed in as {} <{}> ({})", user.name, user.email, user.id);
    println!();
    println!("Stages:");
    for stage in &kanban.snapshot().stages {
        println!("  {}  {}", stage.id, stage.name);
    }
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats()?;
    let workspace = storage.workspace()?;
    let company = match &workspace {
        Some(ws) => storage.get_company(&ws.company_id)?,
        None => None,
    };

    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "initialized": workspace.is_some(),
            "company": company,
            "stats": stats,
        });
        return Ok(print_json(&status)?);
    }

    println!("leadb status");
    println!("------------");
    println!("Database:      {}", storage.path().display());
    println!("Size:          {} bytes", stats.db_size_bytes);
    match (&workspace, &company) {
        (Some(ws), Some(company)) => {
            println!("Company:       {} ({})", company.name, company.id);
            println!("User:          {}", ws.user_id);
        }
        _ => println!("Workspace:     not initialized (run `leadb init`)"),
    }
    println!();
    println!("Stages:        {}", stats.stages);
    println!("Interests:     {}", stats.interests);
    println!("Leads:         {}", stats.leads);
    println!("Notes:         {}", stats.notes);
    println!("Activities:    {}", stats.activities);
    println!("Log entries:   {}", stats.logs);
    Ok(())
}

fn handle_board(kanban: &mut Kanban, config: &Config, cmd: BoardCommand) -> Result<()> {
    kanban.set_interest_filter(cmd.interest.as_deref())?;

    let mut paging = Paging::new(config.pipeline.column_page_size);
    for stage in &cmd.more {
        paging.load_more(stage);
    }
    if cmd.all {
        paging.show_all();
    }

    let snapshot = kanban.snapshot();
    let view = board::board_view(snapshot, kanban.interest_filter(), &paging);
    let interest_name = |lead: &Lead| {
        lead.interest_id
            .as_deref()
            .and_then(|id| snapshot.interest(id))
            .map_or("-", |i| i.name.as_str())
    };

    match cmd.format {
        OutputFormat::Json => print_json(&view)?,
        OutputFormat::Table => {
            let mut rows = Rows::new(&["stage", "id", "lead", "interest", "assigned"]);
            for column in &view.columns {
                for lead in &column.leads {
                    rows.push([
                        column.stage.name.as_str(),
                        lead.id.as_str(),
                        lead.name.as_str(),
                        interest_name(lead),
                        lead.assigned_to
                            .as_deref()
                            .map_or("-", |id| snapshot.user_name(id)),
                    ]);
                }
            }
            println!("{}", rows.to_table());
        }
        OutputFormat::Plain => {
            for column in &view.columns {
                println!("== {} ({}) ==", column.stage.name, column.total);
                for lead in &column.leads {
                    println!("  {}  {}  [{}]", lead.id, lead.name, interest_name(lead));
                }
                if column.has_more() {
                    println!(
                        "  ... {} more (--more {})",
                        column.hidden, column.stage.id
                    );
                }
            }
            println!();
            println!("{} lead(s)", view.total_leads);
        }
    }
    Ok(())
}

fn handle_stage(kanban: &mut Kanban, cmd: StageCommand) -> Result<()> {
    match cmd {
        StageCommand::List { format } => {
            let snapshot = kanban.snapshot();
            let mut rows = Rows::new(&["id", "order", "name", "color", "leads"]);
            for stage in &snapshot.stages {
                rows.push([
                    stage.id.clone(),
                    stage.order.to_string(),
                    stage.name.clone(),
                    stage.color_or_default().to_string(),
                    snapshot.leads_in_stage(&stage.id).count().to_string(),
                ]);
            }
            emit(&snapshot.stages, &rows, format)?;
        }
        StageCommand::Add { name, color } => {
            let stage = kanban.add_stage(&name, color)?;
            println!("Added stage {} ({})", stage.name, stage.id);
        }
        StageCommand::Rename { id, name } => {
            let stage = kanban.rename_stage(&id, &name)?;
            println!("Stage {} is now {}", stage.id, stage.name);
        }
        StageCommand::Color { id, color } => {
            let stage = kanban.recolor_stage(&id, color)?;
            println!("Stage {} is now {}", stage.name, stage.color_or_default());
        }
        StageCommand::Delete { id, yes } => {
            let name = kanban
                .snapshot()
                .stage(&id)
                .map_or_else(|| id.clone(), |s| s.name.clone());
            if confirm(yes, &format!("stage {name}")) {
                kanban.delete_stage(&id)?;
                println!("Deleted stage {name}");
            }
        }
    }
    Ok(())
}

fn handle_interest(kanban: &mut Kanban, cmd: InterestCommand) -> Result<()> {
    match cmd {
        InterestCommand::List { format } => {
            let snapshot = kanban.snapshot();
            let mut rows = Rows::new(&["id", "name", "leads"]);
            for interest in &snapshot.interests {
                let count = board::filter_by_interest(&snapshot.leads, Some(interest.id.as_str())).len();
                rows.push([interest.id.clone(), interest.name.clone(), count.to_string()]);
            }
            emit(&snapshot.interests, &rows, format)?;
        }
        InterestCommand::Add { name } => {
            let interest = kanban.add_interest(&name)?;
            println!("Added interest {} ({})", interest.name, interest.id);
        }
        InterestCommand::Rename { id, name } => {
            let interest = kanban.update_interest(&id, &name)?;
            println!("Interest {} is now {}", interest.id, interest.name);
        }
        InterestCommand::Delete { id, yes } => {
            if confirm(yes, &format!("interest {id}")) {
                let cleared = kanban.delete_interest(&id)?;
                println!("Deleted interest {id}; {cleared} lead(s) uncategorized");
            }
        }
    }
    Ok(())
}

fn lead_form(name: String, fields: LeadFields, existing: Option<&Lead>) -> LeadForm {
    LeadForm {
        name,
        email: fields.email.or_else(|| existing.and_then(|l| l.email.clone())),
        phone: fields.phone.or_else(|| existing.and_then(|l| l.phone.clone())),
        stage_id: fields
            .stage
            .or_else(|| existing.map(|l| l.stage_id.clone()))
            .unwrap_or_default(),
        interest_id: fields
            .interest
            .or_else(|| existing.and_then(|l| l.interest_id.clone())),
        assigned_to: fields
            .assign
            .or_else(|| existing.and_then(|l| l.assigned_to.clone())),
    }
}

fn find_lead<'a>(kanban: &'a Kanban, id: &str) -> Result<&'a Lead> {
    kanban
        .snapshot()
        .lead(id)
        .ok_or_else(|| Error::not_found(EntityType::Lead, id).into())
}

fn handle_lead(kanban: &mut Kanban, cmd: LeadCommand) -> Result<()> {
    match cmd {
        LeadCommand::Add { name, mut fields } => {
            if fields.stage.is_none() {
                let Some(first) = kanban.snapshot().stages.first() else {
                    bail!("the pipeline has no stages; add one with `leadb stage add`");
                };
                fields.stage = Some(first.id.clone());
            }
            let lead = kanban.add_lead(lead_form(name, fields, None))?;
            println!("Added lead {} ({})", lead.name, lead.id);
        }
        LeadCommand::Show { id, json } => show_lead(kanban, &id, json)?,
        LeadCommand::Edit { id, name, fields } => {
            let existing = find_lead(kanban, &id)?.clone();
            let name = name.unwrap_or_else(|| existing.name.clone());
            let lead = kanban.update_lead(&id, lead_form(name, fields, Some(&existing)))?;
            println!("Updated lead {} ({})", lead.name, lead.id);
        }
        LeadCommand::Move { id, stage } => {
            if kanban.move_lead_to_stage(&id, &stage)? {
                let snapshot = kanban.snapshot();
                let lead = find_lead(kanban, &id)?;
                let stage = snapshot.stage(&lead.stage_id).map_or("?", |s| s.name.as_str());
                println!("Moved {} to {stage}", lead.name);
            } else {
                println!("Lead is already in that stage");
            }
        }
        LeadCommand::Delete { id, yes } => {
            let name = find_lead(kanban, &id)?.name.clone();
            if confirm(yes, &format!("lead {name} with its notes and activities")) {
                kanban.delete_lead(&id)?;
                println!("Deleted lead {name}");
            }
        }
        LeadCommand::Search {
            query,
            interest,
            format,
        } => {
            kanban.set_interest_filter(interest.as_deref())?;
            let matches: Vec<&Lead> = kanban
                .filtered_leads()
                .into_iter()
                .filter(|l| board::matches_query(l, &query))
                .collect();

            let snapshot = kanban.snapshot();
            let mut rows = Rows::new(&["id", "name", "stage", "email", "phone"]);
            for lead in &matches {
                rows.push([
                    lead.id.as_str(),
                    lead.name.as_str(),
                    snapshot.stage(&lead.stage_id).map_or("-", |s| s.name.as_str()),
                    lead.email.as_deref().unwrap_or("-"),
                    lead.phone.as_deref().unwrap_or("-"),
                ]);
            }
            emit(&matches, &rows, format)?;
        }
    }
    Ok(())
}

fn show_lead(kanban: &Kanban, id: &str, json: bool) -> Result<()> {
    let snapshot = kanban.snapshot();
    let lead = find_lead(kanban, id)?;
    let notes = kanban.notes_for_lead(id);
    let activities = kanban.activities_for_lead(id);

    if json {
        let value = serde_json::json!({
            "lead": lead,
            "notes": notes,
            "activities": activities,
        });
        return Ok(print_json(&value)?);
    }

    println!("{} [{}]  {}", lead.name, lead.initials(), lead.id);
    println!(
        "Stage:     {}",
        snapshot.stage(&lead.stage_id).map_or("-", |s| s.name.as_str())
    );
    println!(
        "Interest:  {}",
        lead.interest_id
            .as_deref()
            .and_then(|i| snapshot.interest(i))
            .map_or("-", |i| i.name.as_str())
    );
    println!("Email:     {}", lead.email.as_deref().unwrap_or("-"));
    println!("Phone:     {}", lead.phone.as_deref().unwrap_or("-"));
    if let Some(url) = lead.whatsapp_url() {
        println!("WhatsApp:  {url}");
    }
    println!(
        "Assigned:  {}",
        lead.assigned_to.as_deref().map_or("-", |u| snapshot.user_name(u))
    );
    println!("Created:   {}", local_time(lead.created_at));
    println!("Updated:   {}", local_time(lead.updated_at));

    println!();
    println!("Activities ({})", activities.len());
    for activity in &activities {
        println!(
            "  {} {}  {}  {}",
            check_box(activity.completed),
            local_time(activity.due_date),
            activity.activity_type.label(),
            activity.title
        );
    }

    println!();
    println!("Notes ({})", notes.len());
    for note in &notes {
        println!(
            "  {}  {}: {}",
            local_time(note.created_at),
            snapshot.user_name(&note.user_id),
            note.content
        );
    }
    Ok(())
}

fn handle_note(kanban: &mut Kanban, cmd: NoteCommand) -> Result<()> {
    match cmd {
        NoteCommand::Add { lead, content } => {
            let note = kanban.add_note(&lead, &content)?;
            println!("Added note {}", note.id);
        }
        NoteCommand::List { lead, format } => {
            find_lead(kanban, &lead)?;
            let snapshot = kanban.snapshot();
            let notes = kanban.notes_for_lead(&lead);
            let mut rows = Rows::new(&["created", "author", "note"]);
            for note in &notes {
                rows.push([
                    local_time(note.created_at),
                    snapshot.user_name(&note.user_id).to_string(),
                    if format == OutputFormat::Table {
                        truncate(&note.content, 60)
                    } else {
                        note.content.clone()
                    },
                ]);
            }
            emit(&notes, &rows, format)?;
        }
    }
    Ok(())
}

fn handle_activity(kanban: &mut Kanban, cmd: ActivityCommand) -> Result<()> {
    match cmd {
        ActivityCommand::Add {
            title,
            lead,
            activity_type,
            date,
            time,
            description,
        } => {
            let date = calendar::parse_date(&date)?;
            let due_date = calendar::combine_date_time(date, &time, &Local)?;
            let activity = kanban.add_activity(ActivityForm {
                title,
                description,
                lead_id: lead,
                activity_type: activity_type.into(),
                due_date: Some(due_date),
            })?;
            println!(
                "Scheduled {} {} for {} ({})",
                activity.activity_type.label().to_lowercase(),
                activity.title,
                local_time(activity.due_date),
                activity.id
            );
        }
        ActivityCommand::List {
            lead,
            pending,
            format,
        } => {
            let snapshot = kanban.snapshot();
            let activities: Vec<_> = match &lead {
                Some(lead) => {
                    find_lead(kanban, lead)?;
                    kanban.activities_for_lead(lead)
                }
                None => snapshot.activities.iter().collect(),
            };
            let activities: Vec<_> = activities
                .into_iter()
                .filter(|a| !pending || !a.completed)
                .collect();

            let mut rows = Rows::new(&["id", "done", "due", "type", "title", "lead"]);
            for activity in &activities {
                rows.push([
                    activity.id.clone(),
                    check_box(activity.completed).to_string(),
                    local_time(activity.due_date),
                    activity.activity_type.label().to_string(),
                    activity.title.clone(),
                    snapshot
                        .lead(&activity.lead_id)
                        .map_or_else(|| activity.lead_id.clone(), |l| l.name.clone()),
                ]);
            }
            emit(&activities, &rows, format)?;
        }
        ActivityCommand::Edit {
            id,
            title,
            description,
            lead,
            activity_type,
            date,
            time,
        } => {
            let due_date = if date.is_some() || time.is_some() {
                let existing = kanban
                    .snapshot()
                    .activity(&id)
                    .ok_or_else(|| Error::not_found(EntityType::Activity, &id))?
                    .due_date
                    .with_timezone(&Local);
                let date = match date {
                    Some(date) => calendar::parse_date(&date)?,
                    None => existing.date_naive(),
                };
                let time = time.unwrap_or_else(|| existing.format("%H:%M").to_string());
                Some(calendar::combine_date_time(date, &time, &Local)?)
            } else {
                None
            };

            let activity = kanban.update_activity(
                &id,
                ActivityUpdate {
                    title,
                    description: description.map(Some),
                    lead_id: lead,
                    activity_type: activity_type.map(Into::into),
                    due_date,
                    completed: None,
                },
            )?;
            println!("Updated activity {} ({})", activity.title, activity.id);
        }
        ActivityCommand::Toggle { id } => {
            let activity = kanban.toggle_activity(&id)?;
            let state = if activity.completed {
                "completed"
            } else {
                "pending"
            };
            println!("{} is now {state}", activity.title);
        }
        ActivityCommand::Delete { id, yes } => {
            if confirm(yes, &format!("activity {id}")) {
                kanban.delete_activity(&id)?;
                println!("Deleted activity {id}");
            }
        }
    }
    Ok(())
}

fn handle_calendar(kanban: &Kanban, cmd: CalendarCommand) -> Result<()> {
    let today = Local::now().date_naive();
    let mut anchor = match &cmd.date {
        Some(date) => calendar::parse_date(date)?,
        None => today,
    };
    for _ in 0..cmd.prev {
        anchor = calendar::previous_week(anchor)?;
    }
    for _ in 0..cmd.next {
        anchor = calendar::next_week(anchor)?;
    }

    let snapshot = kanban.snapshot();
    let week = calendar::week_view(&snapshot.activities, anchor, today, &Local)?;
    let lead_name = |lead_id: &str| {
        snapshot
            .lead(lead_id)
            .map_or_else(|| lead_id.to_string(), |l| l.name.clone())
    };

    match cmd.format {
        OutputFormat::Json => print_json(&week)?,
        OutputFormat::Table => {
            let mut rows = Rows::new(&["date", "time", "done", "type", "title", "lead"]);
            for day in &week.days {
                for activity in &day.activities {
                    rows.push([
                        day.date.format("%a %Y-%m-%d").to_string(),
                        activity.due_date.with_timezone(&Local).format("%H:%M").to_string(),
                        check_box(activity.completed).to_string(),
                        activity.activity_type.label().to_string(),
                        activity.title.clone(),
                        lead_name(&activity.lead_id),
                    ]);
                }
            }
            println!("{}", rows.to_table());
        }
        OutputFormat::Plain => {
            println!(
                "Week of {} to {} ({} activities)",
                week.start.format("%d %b"),
                week.end.format("%d %b %Y"),
                week.activity_count()
            );
            for day in &week.days {
                let marker = if day.is_today { "  <- today" } else { "" };
                println!();
                println!("{}{marker}", day.date.format("%a %d %b"));
                for activity in &day.activities {
                    println!(
                        "  {} {} {}  {} ({})",
                        activity.due_date.with_timezone(&Local).format("%H:%M"),
                        check_box(activity.completed),
                        activity.activity_type.label(),
                        activity.title,
                        lead_name(&activity.lead_id)
                    );
                }
            }
        }
    }
    Ok(())
}

fn handle_dashboard(kanban: &Kanban, config: &Config, cmd: &DashboardCommand) -> Result<()> {
    let snapshot = kanban.snapshot();
    let now = Utc::now();
    let window = config.recent_window();
    let limit = config.dashboard.recent_limit;

    let stats = analytics::dashboard_stats(snapshot, now, window);
    let recent_leads = analytics::recent_leads(snapshot, now, window, limit);
    let activities = analytics::recent_activities(snapshot, now, &Local, cmd.show_completed, limit);

    if cmd.json {
        let value = serde_json::json!({
            "stats": stats,
            "recent_leads": recent_leads,
            "activities": activities,
        });
        return Ok(print_json(&value)?);
    }

    println!("{}", kanban.company().name);
    println!("{}", "=".repeat(kanban.company().name.chars().count()));
    println!(
        "New leads ({} days):   {}",
        config.dashboard.recent_window_days, stats.new_leads
    );
    println!("Total leads:           {}", stats.total_leads);
    println!(
        "Pending activities:    {} ({}%)",
        stats.pending_activities, stats.pending_percent
    );
    println!(
        "Completed activities:  {} ({}%)",
        stats.completed_activities, stats.completed_percent
    );
    println!("Conversion rate:       {}%", stats.conversion_rate);

    println!();
    println!("Recent leads");
    if recent_leads.is_empty() {
        println!("  (none)");
    }
    for lead in &recent_leads {
        println!("  {}  {}  {}", local_time(lead.created_at), lead.id, lead.name);
    }

    println!();
    println!("Activities");
    if activities.is_empty() {
        println!("  (none)");
    }
    for item in &activities {
        let flag = if item.overdue {
            "  OVERDUE"
        } else if item.due_today {
            "  today"
        } else {
            ""
        };
        println!(
            "  {} {}  {}  {}{flag}",
            check_box(item.activity.completed),
            local_time(item.activity.due_date),
            item.activity.title,
            item.lead_name.unwrap_or("-")
        );
    }
    Ok(())
}

fn handle_analytics(kanban: &Kanban, cmd: &AnalyticsCommand) -> Result<()> {
    let snapshot = kanban.snapshot();
    let stages = analytics::stage_distribution(snapshot);
    let interests = analytics::interest_distribution(snapshot);
    let funnel = analytics::funnel(snapshot);
    let monthly = analytics::monthly_performance(snapshot, Utc::now(), &Local, cmd.months);

    if cmd.json {
        let value = serde_json::json!({
            "stages": stages,
            "interests": interests,
            "funnel": funnel,
            "monthly": monthly,
        });
        return Ok(print_json(&value)?);
    }

    let mut rows = Rows::new(&["stage", "color", "leads"]);
    for stage in &stages {
        rows.push([
            stage.name.to_string(),
            stage.color.to_string(),
            stage.count.to_string(),
        ]);
    }
    println!("Leads by stage");
    println!("{}", rows.to_table());

    let mut rows = Rows::new(&["interest", "leads", "share"]);
    for share in &interests {
        rows.push([
            share.name.to_string(),
            share.count.to_string(),
            format!("{}%", share.percent),
        ]);
    }
    println!();
    println!("Leads by interest");
    println!("{}", rows.to_table());

    let mut rows = Rows::new(&["stage", "reached", "share"]);
    for step in &funnel {
        rows.push([
            step.name.to_string(),
            step.reached.to_string(),
            format!("{}%", step.percent),
        ]);
    }
    println!();
    println!("Funnel");
    println!("{}", rows.to_table());

    let mut rows = Rows::new(&["month", "leads", "converted"]);
    for month in &monthly {
        rows.push([
            month.month.format("%b %Y").to_string(),
            month.leads.to_string(),
            month.conversions.to_string(),
        ]);
    }
    println!();
    println!("Monthly performance");
    println!("{}", rows.to_table());
    Ok(())
}

fn handle_logs(kanban: &Kanban, cmd: &LogsCommand) -> Result<()> {
    let snapshot = kanban.snapshot();

    if cmd.users {
        let users = audit::log_users(&snapshot.logs);
        let mut rows = Rows::new(&["id", "name"]);
        for id in &users {
            rows.push([*id, snapshot.user_name(id)]);
        }
        return Ok(emit(&users, &rows, cmd.format)?);
    }

    let mut entries = audit::log_rows(snapshot, cmd.user.as_deref());
    entries.truncate(cmd.limit);

    let mut rows = Rows::new(&["when", "user", "action", "entity", "details"]);
    for entry in &entries {
        rows.push([
            entry
                .entry
                .created_at
                .with_timezone(&Local)
                .format("%d/%m/%Y %H:%M:%S")
                .to_string(),
            entry.user.to_string(),
            entry.action.to_string(),
            entry.entity.clone().unwrap_or_else(|| "-".to_string()),
            entry.entry.details.clone(),
        ]);
    }
    emit(&entries, &rows, cmd.format)?;
    Ok(())
}

fn handle_profile(kanban: &mut Kanban, cmd: ProfileCommand) -> Result<()> {
    if cmd.has_changes() {
        let current = kanban.user().clone();
        kanban.update_profile(ProfileForm {
            name: cmd.name.unwrap_or(current.name),
            email: cmd.email.unwrap_or(current.email),
            avatar: cmd.avatar.or(current.avatar),
        })?;
    }

    let user = kanban.user();
    if cmd.json {
        return Ok(print_json(user)?);
    }
    println!("{} [{}]", user.name, user.initials());
    println!("Email:    {}", user.email);
    println!("Role:     {}", user.role.label());
    println!("Company:  {}", kanban.company().name);
    if let Some(avatar) = &user.avatar {
        println!("Avatar:   {avatar}");
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                print_json(config)?;
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Pipeline]");
                println!("  Column page size:   {}", config.pipeline.column_page_size);
                println!("  Default stages:");
                for stage in &config.pipeline.default_stages {
                    println!(
                        "    {} {}",
                        stage.name,
                        stage.color.as_deref().unwrap_or("")
                    );
                }
                println!();
                println!("[Dashboard]");
                println!(
                    "  Recent window:      {} days",
                    config.dashboard.recent_window_days
                );
                println!("  Recent limit:       {}", config.dashboard.recent_limit);
                println!();
                println!("[Validation]");
                println!(
                    "  Min password:       {}",
                    config.validation.min_password_length
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
