//! Companies and users.

use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::error::Result;
use crate::model::{Company, Stage, User};

use super::{
    decode_error, enum_column, format_timestamp, timestamp_column, Storage, Workspace,
};

const COMPANY_COLUMNS: &str = "id, name, logo, owner_id, created_at";
const USER_COLUMNS: &str = "id, name, email, role, company_id, avatar, created_at";

impl Storage {
    /// Insert a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_company(&self, company: &Company) -> Result<()> {
        self.conn.execute(
            "INSERT INTO companies (id, name, logo, owner_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                company.id,
                company.name,
                company.logo,
                company.owner_id,
                format_timestamp(&company.created_at),
            ],
        )?;
        debug!("Inserted company {}", company.id);
        Ok(())
    }

    /// Get a company by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_company(&self, id: &str) -> Result<Option<Company>> {
        self.conn
            .query_row(
                &format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = ?1"),
                [id],
                row_to_company,
            )
            .optional()
            .map_err(decode_error("companies"))
    }

    /// Insert a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_user(&self, user: &User) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO users (id, name, email, role, company_id, avatar, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                user.id,
                user.name,
                user.email,
                user.role.as_str(),
                user.company_id,
                user.avatar,
                format_timestamp(&user.created_at),
            ],
        )?;
        debug!("Inserted user {}", user.id);
        Ok(())
    }

    /// Get a user by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                [id],
                row_to_user,
            )
            .optional()
            .map_err(decode_error("users"))
    }

    /// List the users of a company, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_users(&self, company_id: &str) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE company_id = ?1 ORDER BY name ASC"
        ))?;
        let users = stmt
            .query_map([company_id], row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(decode_error("users"))?;
        Ok(users)
    }

    /// Overwrite a user's editable fields.
    ///
    /// Returns `true` if the user exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_user(&self, user: &User) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE users SET name = ?2, email = ?3, role = ?4, company_id = ?5, avatar = ?6 WHERE id = ?1",
            params![
                user.id,
                user.name,
                user.email,
                user.role.as_str(),
                user.company_id,
                user.avatar,
            ],
        )?;
        Ok(affected > 0)
    }

    /// Write a new company, its owner and its first stages, then make them
    /// the active workspace. Nothing is kept if any write fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn seed_workspace(
        &self,
        company: &Company,
        owner: &User,
        stages: &[Stage],
    ) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.insert_company(company)?;
        self.insert_user(owner)?;
        for stage in stages {
            self.insert_stage(stage)?;
        }
        self.set_workspace(&Workspace {
            company_id: company.id.clone(),
            user_id: owner.id.clone(),
        })?;
        tx.commit()?;
        Ok(())
    }
}

fn row_to_company(row: &Row<'_>) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get(0)?,
        name: row.get(1)?,
        logo: row.get(2)?,
        owner_id: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
    })
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: enum_column(row, 3)?,
        company_id: row.get(4)?,
        avatar: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
    })
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::model::Role;
    use crate::storage::{now, Storage};

    use super::*;

    fn company(id: &str) -> Company {
        Company {
            id: id.to_string(),
            name: "Acme".to_string(),
            logo: None,
            owner_id: "usr-1".to_string(),
            created_at: now(),
        }
    }

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{id}@acme.test"),
            role: Role::Employee,
            company_id: Some("cmp-1".to_string()),
            avatar: None,
            created_at: now(),
        }
    }

    #[test]
    fn test_seed_workspace_rolls_back_on_failure() {
        let storage = Storage::open_in_memory().unwrap();
        let stage = |id: &str| Stage {
            id: id.to_string(),
            name: "New".to_string(),
            order: 0,
            company_id: "cmp-1".to_string(),
            color: None,
            created_at: now(),
        };

        // The duplicate stage id fails after the company and user are written.
        let err = storage
            .seed_workspace(
                &company("cmp-1"),
                &user("usr-1", "Ana"),
                &[stage("stg-1"), stage("stg-1")],
            )
            .unwrap_err();
        assert!(matches!(err, Error::DatabaseQuery(_)));

        let stats = storage.stats().unwrap();
        assert_eq!(stats.companies, 0);
        assert_eq!(stats.users, 0);
        assert_eq!(stats.stages, 0);
        assert!(storage.workspace().unwrap().is_none());

        storage
            .seed_workspace(&company("cmp-1"), &user("usr-1", "Ana"), &[stage("stg-1")])
            .unwrap();
        assert_eq!(storage.stats().unwrap().companies, 1);
        assert_eq!(storage.workspace().unwrap().unwrap().company_id, "cmp-1");
    }

    #[test]
    fn test_company_round_trip() {
        let storage = Storage::open_in_memory().unwrap();
        let mut c = company("cmp-1");
        c.logo = Some("https://acme.test/logo.png".to_string());
        storage.insert_company(&c).unwrap();

        assert_eq!(storage.get_company("cmp-1").unwrap(), Some(c));
        assert_eq!(storage.get_company("cmp-2").unwrap(), None);
    }

    #[test]
    fn test_user_round_trip_and_update() {
        let storage = Storage::open_in_memory().unwrap();
        let mut u = user("usr-1", "Bea");
        storage.insert_user(&u).unwrap();
        assert_eq!(storage.get_user("usr-1").unwrap(), Some(u.clone()));

        u.name = "Beatriz".to_string();
        u.role = Role::Admin;
        assert!(storage.update_user(&u).unwrap());
        assert_eq!(storage.get_user("usr-1").unwrap(), Some(u));

        assert!(!storage.update_user(&user("usr-9", "Nobody")).unwrap());
    }

    #[test]
    fn test_list_users_by_company_sorted() {
        let storage = Storage::open_in_memory().unwrap();
        storage.insert_user(&user("usr-1", "Zed")).unwrap();
        storage.insert_user(&user("usr-2", "Amy")).unwrap();
        let mut outsider = user("usr-3", "Other");
        outsider.company_id = Some("cmp-2".to_string());
        storage.insert_user(&outsider).unwrap();

        let names: Vec<String> = storage
            .list_users("cmp-1")
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, ["Amy", "Zed"]);
    }

    #[test]
    fn test_corrupt_role_is_reported() {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .conn
            .execute(
                "INSERT INTO users (id, name, email, role, created_at) VALUES ('usr-x', 'X', 'x@x.io', 'wizard', '2026-01-01T00:00:00.000000Z')",
                [],
            )
            .unwrap();

        let err = storage.get_user("usr-x").unwrap_err();
        assert!(matches!(err, Error::CorruptRow { table: "users", .. }));
    }
}
