//! Stages, interests and leads.

use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::error::Result;
use crate::model::{Interest, Lead, Stage};

use super::{decode_error, format_timestamp, timestamp_column, Storage};

const STAGE_COLUMNS: &str = "id, name, stage_order, company_id, color, created_at";
const INTEREST_COLUMNS: &str = "id, name, company_id, created_at";
const LEAD_COLUMNS: &str =
    "id, name, email, phone, company_id, stage_id, interest_id, assigned_to, created_at, updated_at";

impl Storage {
    // === Stages ===

    /// Insert a stage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_stage(&self, stage: &Stage) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO stages (id, name, stage_order, company_id, color, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                stage.id,
                stage.name,
                stage.order,
                stage.company_id,
                stage.color,
                format_timestamp(&stage.created_at),
            ],
        )?;
        debug!("Inserted stage {} at order {}", stage.id, stage.order);
        Ok(())
    }

    /// Get a stage by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_stage(&self, id: &str) -> Result<Option<Stage>> {
        self.conn
            .query_row(
                &format!("SELECT {STAGE_COLUMNS} FROM stages WHERE id = ?1"),
                [id],
                row_to_stage,
            )
            .optional()
            .map_err(decode_error("stages"))
    }

    /// List a company's stages in pipeline order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_stages(&self, company_id: &str) -> Result<Vec<Stage>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {STAGE_COLUMNS} FROM stages WHERE company_id = ?1 ORDER BY stage_order ASC, created_at ASC"
        ))?;
        let stages = stmt
            .query_map([company_id], row_to_stage)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(decode_error("stages"))?;
        Ok(stages)
    }

    /// Overwrite a stage's name, order and color.
    ///
    /// Returns `true` if the stage exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_stage(&self, stage: &Stage) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE stages SET name = ?2, stage_order = ?3, color = ?4 WHERE id = ?1",
            params![stage.id, stage.name, stage.order, stage.color],
        )?;
        Ok(affected > 0)
    }

    /// Delete a stage.
    ///
    /// Returns `true` if a stage was deleted. Fails while leads still
    /// reference it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_stage(&self, id: &str) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM stages WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Count the leads sitting in a stage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_leads_in_stage(&self, stage_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM leads WHERE stage_id = ?1",
            [stage_id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    // === Interests ===

    /// Insert an interest.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_interest(&self, interest: &Interest) -> Result<()> {
        self.conn.execute(
            "INSERT INTO interests (id, name, company_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                interest.id,
                interest.name,
                interest.company_id,
                format_timestamp(&interest.created_at),
            ],
        )?;
        debug!("Inserted interest {}", interest.id);
        Ok(())
    }

    /// Get an interest by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_interest(&self, id: &str) -> Result<Option<Interest>> {
        self.conn
            .query_row(
                &format!("SELECT {INTEREST_COLUMNS} FROM interests WHERE id = ?1"),
                [id],
                row_to_interest,
            )
            .optional()
            .map_err(decode_error("interests"))
    }

    /// List a company's interests by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_interests(&self, company_id: &str) -> Result<Vec<Interest>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {INTEREST_COLUMNS} FROM interests WHERE company_id = ?1 ORDER BY name COLLATE NOCASE ASC"
        ))?;
        let interests = stmt
            .query_map([company_id], row_to_interest)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(decode_error("interests"))?;
        Ok(interests)
    }

    /// Rename an interest.
    ///
    /// Returns `true` if the interest exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_interest(&self, interest: &Interest) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE interests SET name = ?2 WHERE id = ?1",
            (&interest.id, &interest.name),
        )?;
        Ok(affected > 0)
    }

    /// Delete an interest, clearing it from every lead that carried it.
    ///
    /// Returns the number of leads left without an interest, or `None` if
    /// the interest did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_interest(&self, id: &str) -> Result<Option<usize>> {
        let tx = self.conn.unchecked_transaction()?;
        let cleared = tx.execute(
            "UPDATE leads SET interest_id = NULL WHERE interest_id = ?1",
            [id],
        )?;
        let affected = tx.execute("DELETE FROM interests WHERE id = ?1", [id])?;
        tx.commit()?;

        Ok((affected > 0).then_some(cleared))
    }

    // === Leads ===

    /// Insert a lead.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_lead(&self, lead: &Lead) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO leads ({LEAD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
            params![
                lead.id,
                lead.name,
                lead.email,
                lead.phone,
                lead.company_id,
                lead.stage_id,
                lead.interest_id,
                lead.assigned_to,
                format_timestamp(&lead.created_at),
                format_timestamp(&lead.updated_at),
            ],
        )?;
        debug!("Inserted lead {} into stage {}", lead.id, lead.stage_id);
        Ok(())
    }

    /// Get a lead by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_lead(&self, id: &str) -> Result<Option<Lead>> {
        self.conn
            .query_row(
                &format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1"),
                [id],
                row_to_lead,
            )
            .optional()
            .map_err(decode_error("leads"))
    }

    /// List a company's leads, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_leads(&self, company_id: &str) -> Result<Vec<Lead>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE company_id = ?1 ORDER BY created_at DESC"
        ))?;
        let leads = stmt
            .query_map([company_id], row_to_lead)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(decode_error("leads"))?;
        Ok(leads)
    }

    /// Overwrite a lead's editable fields and `updated_at`.
    ///
    /// Returns `true` if the lead exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_lead(&self, lead: &Lead) -> Result<bool> {
        let affected = self.conn.execute(
            r"
            UPDATE leads SET name = ?2, email = ?3, phone = ?4, stage_id = ?5,
                interest_id = ?6, assigned_to = ?7, updated_at = ?8
            WHERE id = ?1
            ",
            params![
                lead.id,
                lead.name,
                lead.email,
                lead.phone,
                lead.stage_id,
                lead.interest_id,
                lead.assigned_to,
                format_timestamp(&lead.updated_at),
            ],
        )?;
        Ok(affected > 0)
    }

    /// Delete a lead together with its notes and activities.
    ///
    /// Returns `true` if a lead was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_lead(&self, id: &str) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let notes = tx.execute("DELETE FROM notes WHERE lead_id = ?1", [id])?;
        let activities = tx.execute("DELETE FROM activities WHERE lead_id = ?1", [id])?;
        let affected = tx.execute("DELETE FROM leads WHERE id = ?1", [id])?;
        tx.commit()?;

        if affected > 0 {
            debug!(
                "Deleted lead {} with {} note(s) and {} activity(ies)",
                id, notes, activities
            );
        }
        Ok(affected > 0)
    }
}

fn row_to_stage(row: &Row<'_>) -> rusqlite::Result<Stage> {
    Ok(Stage {
        id: row.get(0)?,
        name: row.get(1)?,
        order: row.get(2)?,
        company_id: row.get(3)?,
        color: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
    })
}

fn row_to_interest(row: &Row<'_>) -> rusqlite::Result<Interest> {
    Ok(Interest {
        id: row.get(0)?,
        name: row.get(1)?,
        company_id: row.get(2)?,
        created_at: timestamp_column(row, 3)?,
    })
}

fn row_to_lead(row: &Row<'_>) -> rusqlite::Result<Lead> {
    Ok(Lead {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        company_id: row.get(4)?,
        stage_id: row.get(5)?,
        interest_id: row.get(6)?,
        assigned_to: row.get(7)?,
        created_at: timestamp_column(row, 8)?,
        updated_at: timestamp_column(row, 9)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::storage::{now, Storage};

    use super::*;

    fn stage(id: &str, order: i64) -> Stage {
        Stage {
            id: id.to_string(),
            name: format!("Stage {order}"),
            order,
            company_id: "cmp-1".to_string(),
            color: None,
            created_at: now(),
        }
    }

    fn interest(id: &str, name: &str) -> Interest {
        Interest {
            id: id.to_string(),
            name: name.to_string(),
            company_id: "cmp-1".to_string(),
            created_at: now(),
        }
    }

    fn lead(id: &str, stage_id: &str) -> Lead {
        let ts = now();
        Lead {
            id: id.to_string(),
            name: format!("Lead {id}"),
            email: None,
            phone: None,
            company_id: "cmp-1".to_string(),
            stage_id: stage_id.to_string(),
            interest_id: None,
            assigned_to: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    fn storage_with_stage() -> Storage {
        let storage = Storage::open_in_memory().unwrap();
        storage.insert_stage(&stage("stg-1", 0)).unwrap();
        storage
    }

    #[test]
    fn test_stages_listed_in_order() {
        let storage = Storage::open_in_memory().unwrap();
        storage.insert_stage(&stage("stg-b", 2)).unwrap();
        storage.insert_stage(&stage("stg-a", 0)).unwrap();
        storage.insert_stage(&stage("stg-c", 1)).unwrap();

        let ids: Vec<String> = storage
            .list_stages("cmp-1")
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, ["stg-a", "stg-c", "stg-b"]);
        assert!(storage.list_stages("cmp-2").unwrap().is_empty());
    }

    #[test]
    fn test_stage_update_and_delete() {
        let storage = storage_with_stage();
        let mut s = storage.get_stage("stg-1").unwrap().unwrap();
        s.name = "Qualified".to_string();
        s.color = Some("#0ea5e9".to_string());
        assert!(storage.update_stage(&s).unwrap());
        assert_eq!(storage.get_stage("stg-1").unwrap(), Some(s));

        assert!(storage.delete_stage("stg-1").unwrap());
        assert!(!storage.delete_stage("stg-1").unwrap());
    }

    #[test]
    fn test_stage_with_leads_cannot_be_deleted() {
        let storage = storage_with_stage();
        storage.insert_lead(&lead("led-1", "stg-1")).unwrap();

        assert_eq!(storage.count_leads_in_stage("stg-1").unwrap(), 1);
        assert!(storage.delete_stage("stg-1").is_err());
    }

    #[test]
    fn test_lead_requires_existing_stage() {
        let storage = Storage::open_in_memory().unwrap();
        assert!(storage.insert_lead(&lead("led-1", "stg-missing")).is_err());
    }

    #[test]
    fn test_lead_round_trip_and_update() {
        let storage = storage_with_stage();
        storage.insert_stage(&stage("stg-2", 1)).unwrap();
        let mut l = lead("led-1", "stg-1");
        l.email = Some("ana@acme.test".to_string());
        l.phone = Some("+55 11 99999-0000".to_string());
        storage.insert_lead(&l).unwrap();
        assert_eq!(storage.get_lead("led-1").unwrap(), Some(l.clone()));

        l.stage_id = "stg-2".to_string();
        l.updated_at = l.updated_at + Duration::minutes(5);
        assert!(storage.update_lead(&l).unwrap());
        assert_eq!(storage.get_lead("led-1").unwrap(), Some(l));
    }

    #[test]
    fn test_list_leads_newest_first() {
        let storage = storage_with_stage();
        let mut older = lead("led-old", "stg-1");
        older.created_at = older.created_at - Duration::days(2);
        storage.insert_lead(&older).unwrap();
        storage.insert_lead(&lead("led-new", "stg-1")).unwrap();

        let ids: Vec<String> = storage
            .list_leads("cmp-1")
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, ["led-new", "led-old"]);
    }

    #[test]
    fn test_delete_interest_uncategorizes_leads() {
        let storage = storage_with_stage();
        storage.insert_interest(&interest("int-1", "Solar")).unwrap();
        let mut l = lead("led-1", "stg-1");
        l.interest_id = Some("int-1".to_string());
        storage.insert_lead(&l).unwrap();

        assert_eq!(storage.delete_interest("int-1").unwrap(), Some(1));
        assert_eq!(storage.get_lead("led-1").unwrap().unwrap().interest_id, None);
        assert_eq!(storage.delete_interest("int-1").unwrap(), None);
    }

    #[test]
    fn test_interests_sorted_case_insensitively() {
        let storage = Storage::open_in_memory().unwrap();
        storage.insert_interest(&interest("int-1", "wind")).unwrap();
        storage.insert_interest(&interest("int-2", "Batteries")).unwrap();

        let mut renamed = interest("int-1", "Wind");
        assert!(storage.update_interest(&renamed).unwrap());
        renamed = storage.get_interest("int-1").unwrap().unwrap();
        assert_eq!(renamed.name, "Wind");

        let names: Vec<String> = storage
            .list_interests("cmp-1")
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, ["Batteries", "Wind"]);
    }

    #[test]
    fn test_delete_lead_missing() {
        let storage = Storage::open_in_memory().unwrap();
        assert!(!storage.delete_lead("led-404").unwrap());
    }
}
