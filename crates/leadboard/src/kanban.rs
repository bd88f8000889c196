//! The pipeline context.
//!
//! [`Kanban`] owns the store, the acting user and company, and a
//! [`Snapshot`] of everything loaded for that company. Every mutation
//! validates its input, writes through the store, appends an audit log entry
//! and reloads the snapshot. Reads never touch the store.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::board;
use crate::config::StageTemplate;
use crate::error::{Error, Result};
use crate::model::{
    Activity, ActivityType, Company, EntityType, Interest, Lead, LogAction, LogEntry, Note, Role,
    Stage, User,
};
use crate::storage::{now, Storage};
use crate::validation::{
    normalize_optional, require, stage_color, ActivityForm, LeadForm, ProfileForm, WorkspaceForm,
};

const USER_PREFIX: &str = "usr";
const COMPANY_PREFIX: &str = "cmp";
const STAGE_PREFIX: &str = "stg";
const INTEREST_PREFIX: &str = "int";
const LEAD_PREFIX: &str = "led";
const NOTE_PREFIX: &str = "not";
const ACTIVITY_PREFIX: &str = "act";
const LOG_PREFIX: &str = "log";

/// Everything loaded for one company.
///
/// Stages are in pipeline order, leads and notes newest first, activities by
/// due date and logs newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Members of the company.
    pub users: Vec<User>,
    /// Pipeline stages.
    pub stages: Vec<Stage>,
    /// Interest tags.
    pub interests: Vec<Interest>,
    /// Leads.
    pub leads: Vec<Lead>,
    /// Notes on the leads.
    pub notes: Vec<Note>,
    /// Activities on the leads.
    pub activities: Vec<Activity>,
    /// Audit log.
    pub logs: Vec<LogEntry>,
}

impl Snapshot {
    /// Look up a stage.
    #[must_use]
    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Look up an interest.
    #[must_use]
    pub fn interest(&self, id: &str) -> Option<&Interest> {
        self.interests.iter().find(|i| i.id == id)
    }

    /// Look up a lead.
    #[must_use]
    pub fn lead(&self, id: &str) -> Option<&Lead> {
        self.leads.iter().find(|l| l.id == id)
    }

    /// Look up a user.
    #[must_use]
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Look up an activity.
    #[must_use]
    pub fn activity(&self, id: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id == id)
    }

    /// The last stage of the pipeline (highest order), where leads count as
    /// converted.
    #[must_use]
    pub fn final_stage(&self) -> Option<&Stage> {
        self.stages.iter().max_by_key(|s| s.order)
    }

    /// Leads currently in a stage.
    pub fn leads_in_stage<'a>(&'a self, stage_id: &'a str) -> impl Iterator<Item = &'a Lead> + 'a {
        self.leads.iter().filter(move |l| l.stage_id == stage_id)
    }

    /// Notes on a lead, newest first.
    #[must_use]
    pub fn notes_for_lead(&self, lead_id: &str) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.iter().filter(|n| n.lead_id == lead_id).collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notes
    }

    /// Activities on a lead, by due date.
    #[must_use]
    pub fn activities_for_lead(&self, lead_id: &str) -> Vec<&Activity> {
        let mut activities: Vec<&Activity> = self
            .activities
            .iter()
            .filter(|a| a.lead_id == lead_id)
            .collect();
        activities.sort_by_key(|a| a.due_date);
        activities
    }

    /// Display name of a user, falling back to the raw id.
    #[must_use]
    pub fn user_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.user(id).map_or(id, |u| u.name.as_str())
    }
}

/// A partial change to an activity. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityUpdate {
    /// New title.
    pub title: Option<String>,
    /// New description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// Lead to attach the activity to.
    pub lead_id: Option<String>,
    /// New kind.
    pub activity_type: Option<ActivityType>,
    /// New due date.
    pub due_date: Option<DateTime<Utc>>,
    /// New completion state.
    pub completed: Option<bool>,
}

/// The pipeline of one company, worked as one user.
#[derive(Debug)]
pub struct Kanban {
    storage: Storage,
    company: Company,
    user: User,
    snapshot: Snapshot,
    interest_filter: Option<String>,
}

impl Kanban {
    /// Load the active workspace from a store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] when the store has no workspace, or
    /// an error if the database operation fails.
    pub fn load(storage: Storage) -> Result<Self> {
        let workspace = storage.workspace()?.ok_or(Error::NotInitialized)?;
        let company = storage
            .get_company(&workspace.company_id)?
            .ok_or_else(|| Error::not_found(EntityType::Company, &workspace.company_id))?;
        let user = storage
            .get_user(&workspace.user_id)?
            .ok_or_else(|| Error::not_found(EntityType::User, &workspace.user_id))?;

        let snapshot = fetch(&storage, &company.id)?;
        info!(
            "Loaded pipeline for {} ({} stages, {} leads)",
            company.name,
            snapshot.stages.len(),
            snapshot.leads.len()
        );

        Ok(Self {
            storage,
            company,
            user,
            snapshot,
            interest_filter: None,
        })
    }

    /// Set up a fresh store: the company, its owner (an admin who becomes
    /// the acting user) and the initial stages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] when the store already holds a
    /// workspace, a validation error for bad input, or an error if the
    /// database operation fails.
    pub fn init_workspace(
        storage: Storage,
        form: WorkspaceForm,
        stages: &[StageTemplate],
    ) -> Result<Self> {
        if let Some(existing) = storage.workspace()? {
            return Err(Error::AlreadyInitialized {
                company_id: existing.company_id,
            });
        }
        let form = form.validate()?;

        let created_at = now();
        let user_id = storage.generate_id(USER_PREFIX)?;
        let company = Company {
            id: storage.generate_id(COMPANY_PREFIX)?,
            name: form.company_name,
            logo: None,
            owner_id: user_id.clone(),
            created_at,
        };
        let user = User {
            id: user_id,
            name: form.owner_name,
            email: form.owner_email,
            role: Role::Admin,
            company_id: Some(company.id.clone()),
            avatar: None,
            created_at,
        };
        let stages = (0_i64..)
            .zip(stages)
            .map(|(order, template)| {
                Ok(Stage {
                    id: storage.generate_id(STAGE_PREFIX)?,
                    name: require("name", &template.name, "Stage name is required")?,
                    order,
                    company_id: company.id.clone(),
                    color: stage_color(template.color.clone())?,
                    created_at,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        storage.seed_workspace(&company, &user, &stages)?;
        info!(
            "Initialized workspace for {} with {} stage(s)",
            company.name,
            stages.len()
        );

        let mut kanban = Self {
            storage,
            company,
            user,
            snapshot: Snapshot::default(),
            interest_filter: None,
        };
        let details = format!("Created company \"{}\"", kanban.company.name);
        let company_id = kanban.company.id.clone();
        kanban.record(LogAction::Create, EntityType::Company, &company_id, details);
        kanban.refresh()?;
        Ok(kanban)
    }

    /// Reload every table for the company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn refresh(&mut self) -> Result<()> {
        self.snapshot = fetch(&self.storage, &self.company.id)?;
        if let Some(filter) = &self.interest_filter {
            if self.snapshot.interest(filter).is_none() {
                debug!("Dropping filter on removed interest {}", filter);
                self.interest_filter = None;
            }
        }
        Ok(())
    }

    /// The underlying store.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The company being worked on.
    #[must_use]
    pub fn company(&self) -> &Company {
        &self.company
    }

    /// The acting user.
    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }

    /// Everything loaded for the company.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    // === Stages ===

    /// Append a stage at the end of the pipeline.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name or malformed color, or an
    /// error if the database operation fails.
    pub fn add_stage(&mut self, name: &str, color: Option<String>) -> Result<Stage> {
        let name = require("name", name, "Stage name is required")?;
        let color = stage_color(color)?;
        let order = self
            .snapshot
            .stages
            .iter()
            .map(|s| s.order)
            .max()
            .map_or(0, |max| max + 1);

        let stage = Stage {
            id: self.storage.generate_id(STAGE_PREFIX)?,
            name,
            order,
            company_id: self.company.id.clone(),
            color,
            created_at: now(),
        };
        self.storage.insert_stage(&stage)?;
        info!("Added stage {} at order {}", stage.name, stage.order);

        self.record(
            LogAction::Create,
            EntityType::Stage,
            &stage.id,
            format!("Created stage \"{}\"", stage.name),
        );
        self.refresh()?;
        Ok(stage)
    }

    /// Rename a stage. Renaming to the current name changes nothing.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, a lookup error for an
    /// unknown stage, or an error if the database operation fails.
    pub fn rename_stage(&mut self, id: &str, name: &str) -> Result<Stage> {
        let name = require("name", name, "Stage name is required")?;
        let mut stage = self.find_stage(id)?;
        if stage.name == name {
            return Ok(stage);
        }

        let details = format!("Renamed stage \"{}\" to \"{name}\"", stage.name);
        stage.name = name;
        self.storage.update_stage(&stage)?;

        self.record(LogAction::Update, EntityType::Stage, &stage.id, details);
        self.refresh()?;
        Ok(stage)
    }

    /// Change or clear a stage's color.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed color, a lookup error for
    /// an unknown stage, or an error if the database operation fails.
    pub fn recolor_stage(&mut self, id: &str, color: Option<String>) -> Result<Stage> {
        let color = stage_color(color)?;
        let mut stage = self.find_stage(id)?;
        if stage.color == color {
            return Ok(stage);
        }

        stage.color = color;
        self.storage.update_stage(&stage)?;

        let details = format!(
            "Changed color of stage \"{}\" to {}",
            stage.name,
            stage.color_or_default()
        );
        self.record(LogAction::Update, EntityType::Stage, &stage.id, details);
        self.refresh()?;
        Ok(stage)
    }

    /// Delete an empty stage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StageNotEmpty`] while leads sit in the stage, a
    /// lookup error for an unknown stage, or an error if the database
    /// operation fails.
    pub fn delete_stage(&mut self, id: &str) -> Result<()> {
        let stage = self.find_stage(id)?;
        let lead_count = self.storage.count_leads_in_stage(&stage.id)?;
        if lead_count > 0 {
            return Err(Error::StageNotEmpty {
                stage_id: stage.id,
                lead_count,
            });
        }

        self.storage.delete_stage(&stage.id)?;
        info!("Deleted stage {}", stage.name);

        self.record(
            LogAction::Delete,
            EntityType::Stage,
            &stage.id,
            format!("Deleted stage \"{}\"", stage.name),
        );
        self.refresh()
    }

    // === Interests ===

    /// Create an interest tag.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, or an error if the
    /// database operation fails.
    pub fn add_interest(&mut self, name: &str) -> Result<Interest> {
        let interest = Interest {
            id: self.storage.generate_id(INTEREST_PREFIX)?,
            name: require("name", name, "Interest name is required")?,
            company_id: self.company.id.clone(),
            created_at: now(),
        };
        self.storage.insert_interest(&interest)?;

        self.record(
            LogAction::Create,
            EntityType::Interest,
            &interest.id,
            format!("Created interest \"{}\"", interest.name),
        );
        self.refresh()?;
        Ok(interest)
    }

    /// Rename an interest tag.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, a lookup error for an
    /// unknown interest, or an error if the database operation fails.
    pub fn update_interest(&mut self, id: &str, name: &str) -> Result<Interest> {
        let name = require("name", name, "Interest name is required")?;
        let mut interest = self.find_interest(id)?;
        if interest.name == name {
            return Ok(interest);
        }

        let details = format!("Renamed interest \"{}\" to \"{name}\"", interest.name);
        interest.name = name;
        self.storage.update_interest(&interest)?;

        self.record(LogAction::Update, EntityType::Interest, &interest.id, details);
        self.refresh()?;
        Ok(interest)
    }

    /// Delete an interest tag. Leads that carried it become uncategorized.
    ///
    /// Returns how many leads lost the tag.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown interest, or an error if the
    /// database operation fails.
    pub fn delete_interest(&mut self, id: &str) -> Result<usize> {
        let interest = self.find_interest(id)?;
        let cleared = self
            .storage
            .delete_interest(&interest.id)?
            .ok_or_else(|| Error::not_found(EntityType::Interest, &interest.id))?;
        info!(
            "Deleted interest {} ({} lead(s) uncategorized)",
            interest.name, cleared
        );

        self.record(
            LogAction::Delete,
            EntityType::Interest,
            &interest.id,
            format!("Deleted interest \"{}\"", interest.name),
        );
        self.refresh()?;
        Ok(cleared)
    }

    // === Leads ===

    /// Create a lead from a submitted form.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, a lookup error when the
    /// stage, interest or assignee is not part of the company, or an error
    /// if the database operation fails.
    pub fn add_lead(&mut self, form: LeadForm) -> Result<Lead> {
        let form = form.validate()?;
        self.check_lead_references(&form)?;

        let created_at = now();
        let lead = Lead {
            id: self.storage.generate_id(LEAD_PREFIX)?,
            name: form.name,
            email: form.email,
            phone: form.phone,
            company_id: self.company.id.clone(),
            stage_id: form.stage_id,
            interest_id: form.interest_id,
            assigned_to: form.assigned_to,
            created_at,
            updated_at: created_at,
        };
        self.storage.insert_lead(&lead)?;
        info!("Added lead {} to stage {}", lead.name, lead.stage_id);

        self.record(
            LogAction::Create,
            EntityType::Lead,
            &lead.id,
            format!("Created lead \"{}\"", lead.name),
        );
        self.refresh()?;
        Ok(lead)
    }

    /// Replace a lead's details from a submitted form.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, a lookup error for an
    /// unknown lead or a reference outside the company, or an error if the
    /// database operation fails.
    pub fn update_lead(&mut self, id: &str, form: LeadForm) -> Result<Lead> {
        let existing = self.find_lead(id)?;
        let form = form.validate()?;
        self.check_lead_references(&form)?;

        let lead = Lead {
            name: form.name,
            email: form.email,
            phone: form.phone,
            stage_id: form.stage_id,
            interest_id: form.interest_id,
            assigned_to: form.assigned_to,
            updated_at: now(),
            ..existing
        };
        self.storage.update_lead(&lead)?;

        self.record(
            LogAction::Update,
            EntityType::Lead,
            &lead.id,
            format!("Updated lead \"{}\"", lead.name),
        );
        self.refresh()?;
        Ok(lead)
    }

    /// Delete a lead along with its notes and activities.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown lead, or an error if the
    /// database operation fails.
    pub fn delete_lead(&mut self, id: &str) -> Result<()> {
        let lead = self.find_lead(id)?;
        let notes = self.snapshot.notes_for_lead(&lead.id).len();
        let activities = self.snapshot.activities_for_lead(&lead.id).len();

        self.storage.delete_lead(&lead.id)?;
        info!(
            "Deleted lead {} with {} note(s) and {} activity(ies)",
            lead.name, notes, activities
        );

        self.record(
            LogAction::Delete,
            EntityType::Lead,
            &lead.id,
            format!("Deleted lead \"{}\"", lead.name),
        );
        self.refresh()
    }

    /// Move a lead to another stage, the board's drag-and-drop.
    ///
    /// Returns `false` when the lead already sits in that stage, in which
    /// case nothing is written.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown lead or a stage outside the
    /// company, or an error if the database operation fails.
    pub fn move_lead_to_stage(&mut self, lead_id: &str, stage_id: &str) -> Result<bool> {
        let mut lead = self.find_lead(lead_id)?;
        let target = self.find_stage(stage_id)?;
        if lead.stage_id == target.id {
            debug!("Lead {} already in stage {}", lead.id, target.id);
            return Ok(false);
        }

        let from = self
            .snapshot
            .stage(&lead.stage_id)
            .map_or_else(|| lead.stage_id.clone(), |s| s.name.clone());
        lead.stage_id.clone_from(&target.id);
        lead.updated_at = now();
        self.storage.update_lead(&lead)?;
        info!("Moved lead {} from {} to {}", lead.name, from, target.name);

        self.record(
            LogAction::Update,
            EntityType::Lead,
            &lead.id,
            format!(
                "Moved lead \"{}\" from \"{from}\" to \"{}\"",
                lead.name, target.name
            ),
        );
        self.refresh()?;
        Ok(true)
    }

    // === Notes ===

    /// Add a note to a lead.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty content, a lookup error for an
    /// unknown lead, or an error if the database operation fails.
    pub fn add_note(&mut self, lead_id: &str, content: &str) -> Result<Note> {
        let content = require("content", content, "Note cannot be empty")?;
        let lead = self.find_lead(lead_id)?;

        let note = Note {
            id: self.storage.generate_id(NOTE_PREFIX)?,
            content,
            lead_id: lead.id,
            user_id: self.user.id.clone(),
            created_at: now(),
        };
        self.storage.insert_note(&note)?;

        self.record(
            LogAction::Create,
            EntityType::Note,
            &note.id,
            format!("Added note to lead \"{}\"", lead.name),
        );
        self.refresh()?;
        Ok(note)
    }

    /// Notes on a lead, newest first.
    #[must_use]
    pub fn notes_for_lead(&self, lead_id: &str) -> Vec<&Note> {
        self.snapshot.notes_for_lead(lead_id)
    }

    // === Activities ===

    /// Schedule an activity from a submitted form.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, a lookup error for an
    /// unknown lead, or an error if the database operation fails.
    pub fn add_activity(&mut self, form: ActivityForm) -> Result<Activity> {
        let form = form.validate()?;
        let lead = self.find_lead(&form.lead_id)?;

        let activity = Activity {
            id: self.storage.generate_id(ACTIVITY_PREFIX)?,
            title: form.title,
            description: form.description,
            lead_id: lead.id,
            user_id: self.user.id.clone(),
            due_date: form.due_date,
            completed: false,
            created_at: now(),
            activity_type: form.activity_type,
        };
        self.storage.insert_activity(&activity)?;
        info!("Scheduled {} for {}", activity.title, activity.due_date);

        self.record(
            LogAction::Create,
            EntityType::Activity,
            &activity.id,
            format!(
                "Scheduled {} \"{}\" for lead \"{}\"",
                activity.activity_type.label().to_lowercase(),
                activity.title,
                lead.name
            ),
        );
        self.refresh()?;
        Ok(activity)
    }

    /// Apply a partial change to an activity.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank title, a lookup error for an
    /// unknown activity or lead, or an error if the database operation
    /// fails.
    pub fn update_activity(&mut self, id: &str, update: ActivityUpdate) -> Result<Activity> {
        let before = self.find_activity(id)?;
        let mut activity = before.clone();

        if let Some(title) = update.title {
            activity.title = require("title", &title, "Title is required")?;
        }
        if let Some(description) = update.description {
            activity.description = normalize_optional(description);
        }
        if let Some(lead_id) = update.lead_id {
            activity.lead_id = self.find_lead(lead_id.trim())?.id;
        }
        if let Some(activity_type) = update.activity_type {
            activity.activity_type = activity_type;
        }
        if let Some(due_date) = update.due_date {
            activity.due_date = due_date;
        }
        if let Some(completed) = update.completed {
            activity.completed = completed;
        }
        if activity == before {
            return Ok(activity);
        }

        self.storage.update_activity(&activity)?;
        self.record(
            LogAction::Update,
            EntityType::Activity,
            &activity.id,
            format!("Updated activity \"{}\"", activity.title),
        );
        self.refresh()?;
        Ok(activity)
    }

    /// Flip an activity between pending and completed.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown activity, or an error if the
    /// database operation fails.
    pub fn toggle_activity(&mut self, id: &str) -> Result<Activity> {
        let mut activity = self.find_activity(id)?;
        activity.completed = !activity.completed;
        self.storage.update_activity(&activity)?;

        let state = if activity.completed {
            "completed"
        } else {
            "pending"
        };
        self.record(
            LogAction::Update,
            EntityType::Activity,
            &activity.id,
            format!("Marked activity \"{}\" as {state}", activity.title),
        );
        self.refresh()?;
        Ok(activity)
    }

    /// Delete an activity.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown activity, or an error if the
    /// database operation fails.
    pub fn delete_activity(&mut self, id: &str) -> Result<()> {
        let activity = self.find_activity(id)?;
        self.storage.delete_activity(&activity.id)?;

        self.record(
            LogAction::Delete,
            EntityType::Activity,
            &activity.id,
            format!("Deleted activity \"{}\"", activity.title),
        );
        self.refresh()
    }

    /// Activities on a lead, by due date.
    #[must_use]
    pub fn activities_for_lead(&self, lead_id: &str) -> Vec<&Activity> {
        self.snapshot.activities_for_lead(lead_id)
    }

    // === Filter ===

    /// Restrict [`Kanban::filtered_leads`] to one interest, or lift the
    /// restriction with `None`.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for an unknown interest.
    pub fn set_interest_filter(&mut self, interest_id: Option<&str>) -> Result<()> {
        self.interest_filter = match interest_id {
            Some(id) => Some(self.find_interest(id)?.id),
            None => None,
        };
        Ok(())
    }

    /// The active interest filter.
    #[must_use]
    pub fn interest_filter(&self) -> Option<&str> {
        self.interest_filter.as_deref()
    }

    /// Leads matching the interest filter.
    #[must_use]
    pub fn filtered_leads(&self) -> Vec<&Lead> {
        board::filter_by_interest(&self.snapshot.leads, self.interest_filter.as_deref())
    }

    // === Profile ===

    /// Update the acting user's name, email and avatar.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, or an error if the database
    /// operation fails.
    pub fn update_profile(&mut self, form: ProfileForm) -> Result<User> {
        let form = form.validate()?;
        let user = User {
            name: form.name,
            email: form.email,
            avatar: form.avatar,
            ..self.user.clone()
        };
        if user == self.user {
            return Ok(user);
        }

        if !self.storage.update_user(&user)? {
            return Err(Error::not_found(EntityType::User, &user.id));
        }
        self.user = user.clone();

        self.record(
            LogAction::Update,
            EntityType::User,
            &user.id,
            "Updated profile".to_string(),
        );
        self.refresh()?;
        Ok(user)
    }

    // === Lookups ===

    fn find_stage(&self, id: &str) -> Result<Stage> {
        if let Some(stage) = self.snapshot.stage(id) {
            return Ok(stage.clone());
        }
        match self.storage.get_stage(id)? {
            Some(_) => Err(Error::foreign_company(EntityType::Stage, id)),
            None => Err(Error::not_found(EntityType::Stage, id)),
        }
    }

    fn find_interest(&self, id: &str) -> Result<Interest> {
        if let Some(interest) = self.snapshot.interest(id) {
            return Ok(interest.clone());
        }
        match self.storage.get_interest(id)? {
            Some(_) => Err(Error::foreign_company(EntityType::Interest, id)),
            None => Err(Error::not_found(EntityType::Interest, id)),
        }
    }

    fn find_lead(&self, id: &str) -> Result<Lead> {
        if let Some(lead) = self.snapshot.lead(id) {
            return Ok(lead.clone());
        }
        match self.storage.get_lead(id)? {
            Some(_) => Err(Error::foreign_company(EntityType::Lead, id)),
            None => Err(Error::not_found(EntityType::Lead, id)),
        }
    }

    fn find_activity(&self, id: &str) -> Result<Activity> {
        if let Some(activity) = self.snapshot.activity(id) {
            return Ok(activity.clone());
        }
        match self.storage.get_activity(id)? {
            Some(_) => Err(Error::foreign_company(EntityType::Activity, id)),
            None => Err(Error::not_found(EntityType::Activity, id)),
        }
    }

    fn find_user(&self, id: &str) -> Result<User> {
        if let Some(user) = self.snapshot.user(id) {
            return Ok(user.clone());
        }
        match self.storage.get_user(id)? {
            Some(_) => Err(Error::foreign_company(EntityType::User, id)),
            None => Err(Error::not_found(EntityType::User, id)),
        }
    }

    fn check_lead_references(&self, form: &LeadForm) -> Result<()> {
        self.find_stage(&form.stage_id)?;
        if let Some(interest_id) = &form.interest_id {
            self.find_interest(interest_id)?;
        }
        if let Some(user_id) = &form.assigned_to {
            self.find_user(user_id)?;
        }
        Ok(())
    }

    /// Append an audit entry. The change it describes is already stored,
    /// so a failure here is reported and swallowed.
    fn record(&self, action: LogAction, entity_type: EntityType, entity_id: &str, details: String) {
        let entry = match self.storage.generate_id(LOG_PREFIX) {
            Ok(id) => LogEntry {
                id,
                user_id: self.user.id.clone(),
                action,
                details,
                entity_id: Some(entity_id.to_string()),
                entity_type: Some(entity_type),
                created_at: now(),
            },
            Err(e) => {
                warn!("Failed to record {} of {} {}: {}", action, entity_type, entity_id, e);
                return;
            }
        };

        match self.storage.insert_log(&self.company.id, &entry) {
            Ok(()) => debug!("Logged: {}", entry.details),
            Err(e) => warn!("Failed to record \"{}\": {}", entry.details, e),
        }
    }
}

fn fetch(storage: &Storage, company_id: &str) -> Result<Snapshot> {
    Ok(Snapshot {
        users: storage.list_users(company_id)?,
        stages: storage.list_stages(company_id)?,
        interests: storage.list_interests(company_id)?,
        leads: storage.list_leads(company_id)?,
        notes: storage.list_notes(company_id)?,
        activities: storage.list_activities(company_id)?,
        logs: storage.list_logs(company_id)?,
    })
}
