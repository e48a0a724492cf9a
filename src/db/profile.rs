//! Profile storage: one profile per user plus experience and education lists.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct ProfileStore {
    pool: SqlitePool,
}

/// Social links. Each link is set independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SocialLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
}

/// Owner of a profile, as shown to other users.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUser {
    /// Public user identifier
    pub id: String,
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Experience {
    #[serde(rename = "id")]
    pub uuid: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub from: String,
    pub to: Option<String>,
    pub current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Education {
    #[serde(rename = "id")]
    pub uuid: String,
    pub school: String,
    pub degree: String,
    pub fieldofstudy: String,
    pub from: String,
    pub to: Option<String>,
    pub current: bool,
    pub description: Option<String>,
}

/// A full profile with its owner, experience and education (newest first).
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    #[serde(skip)]
    pub id: i64,
    pub user: ProfileUser,
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub status: String,
    pub githubusername: Option<String>,
    pub skills: Vec<String>,
    pub social: SocialLinks,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    #[serde(rename = "date")]
    pub created_at: String,
}

/// Fields written by a create-or-update.
///
/// On update, `None` scalar fields keep their stored value; `status`, `skills`
/// and the whole `social` group are replaced.
#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub status: String,
    pub githubusername: Option<String>,
    pub skills: Vec<String>,
    pub social: SocialLinks,
}

#[derive(Debug, Clone, Default)]
pub struct NewExperience {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub from: String,
    pub to: Option<String>,
    pub current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewEducation {
    pub school: String,
    pub degree: String,
    pub fieldofstudy: String,
    pub from: String,
    pub to: Option<String>,
    pub current: bool,
    pub description: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: i64,
    company: Option<String>,
    website: Option<String>,
    location: Option<String>,
    bio: Option<String>,
    status: String,
    githubusername: Option<String>,
    skills: String,
    youtube: Option<String>,
    twitter: Option<String>,
    facebook: Option<String>,
    linkedin: Option<String>,
    instagram: Option<String>,
    created_at: String,
    user_uuid: String,
    user_name: String,
    user_avatar: String,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = sqlx::Error;

    /// Fails if the stored skills are not a JSON list of strings.
    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let skills =
            serde_json::from_str(&row.skills).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Self {
            id: row.id,
            user: ProfileUser {
                id: row.user_uuid,
                name: row.user_name,
                avatar: row.user_avatar,
            },
            company: row.company,
            website: row.website,
            location: row.location,
            bio: row.bio,
            status: row.status,
            githubusername: row.githubusername,
            skills,
            social: SocialLinks {
                youtube: row.youtube,
                twitter: row.twitter,
                facebook: row.facebook,
                linkedin: row.linkedin,
                instagram: row.instagram,
            },
            experience: Vec::new(),
            education: Vec::new(),
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ExperienceRow {
    profile_id: i64,
    uuid: String,
    title: String,
    company: String,
    location: Option<String>,
    from_date: String,
    to_date: Option<String>,
    current: bool,
    description: Option<String>,
}

impl From<ExperienceRow> for Experience {
    fn from(row: ExperienceRow) -> Self {
        Self {
            uuid: row.uuid,
            title: row.title,
            company: row.company,
            location: row.location,
            from: row.from_date,
            to: row.to_date,
            current: row.current,
            description: row.description,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EducationRow {
    profile_id: i64,
    uuid: String,
    school: String,
    degree: String,
    fieldofstudy: String,
    from_date: String,
    to_date: Option<String>,
    current: bool,
    description: Option<String>,
}

impl From<EducationRow> for Education {
    fn from(row: EducationRow) -> Self {
        Self {
            uuid: row.uuid,
            school: row.school,
            degree: row.degree,
            fieldofstudy: row.fieldofstudy,
            from: row.from_date,
            to: row.to_date,
            current: row.current,
            description: row.description,
        }
    }
}

impl ProfileStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the profile of a user.
    pub async fn get_by_user(&self, user_id: i64) -> Result<Option<Profile>, sqlx::Error> {
        let row: Option<ProfileRow> = sqlx::query_as(
            "SELECT p.id, p.company, p.website, p.location, p.bio, p.status, p.githubusername, p.skills,
                    p.youtube, p.twitter, p.facebook, p.linkedin, p.instagram, p.created_at,
                    u.uuid AS user_uuid, u.name AS user_name, u.avatar AS user_avatar
             FROM profiles p JOIN users u ON u.id = p.user_id
             WHERE p.user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut profile = Profile::try_from(row)?;
        profile.experience = self.experience_for(profile.id).await?;
        profile.education = self.education_for(profile.id).await?;
        Ok(Some(profile))
    }

    /// List all profiles in creation order.
    pub async fn list(&self) -> Result<Vec<Profile>, sqlx::Error> {
        let rows: Vec<ProfileRow> = sqlx::query_as(
            "SELECT p.id, p.company, p.website, p.location, p.bio, p.status, p.githubusername, p.skills,
                    p.youtube, p.twitter, p.facebook, p.linkedin, p.instagram, p.created_at,
                    u.uuid AS user_uuid, u.name AS user_name, u.avatar AS user_avatar
             FROM profiles p JOIN users u ON u.id = p.user_id
             ORDER BY p.id",
        )
        .fetch_all(&self.pool)
        .await?;

        let experience: Vec<ExperienceRow> = sqlx::query_as(
            "SELECT profile_id, uuid, title, company, location, from_date, to_date, current, description
             FROM experience ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let education: Vec<EducationRow> = sqlx::query_as(
            "SELECT profile_id, uuid, school, degree, fieldofstudy, from_date, to_date, current, description
             FROM education ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut experience_by_profile: HashMap<i64, Vec<Experience>> = HashMap::new();
        for row in experience {
            experience_by_profile
                .entry(row.profile_id)
                .or_default()
                .push(Experience::from(row));
        }

        let mut education_by_profile: HashMap<i64, Vec<Education>> = HashMap::new();
        for row in education {
            education_by_profile
                .entry(row.profile_id)
                .or_default()
                .push(Education::from(row));
        }

        rows.into_iter()
            .map(|row| {
                let mut profile = Profile::try_from(row)?;
                profile.experience = experience_by_profile
                    .remove(&profile.id)
                    .unwrap_or_default();
                profile.education = education_by_profile
                    .remove(&profile.id)
                    .unwrap_or_default();
                Ok(profile)
            })
            .collect()
    }

    /// Create the user's profile, or update it if one exists.
    pub async fn upsert(
        &self,
        user_id: i64,
        fields: &ProfileFields,
    ) -> Result<Profile, sqlx::Error> {
        let skills = serde_json::to_string(&fields.skills)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        sqlx::query(
            "INSERT INTO profiles (user_id, company, website, location, bio, status, githubusername, skills,
                                   youtube, twitter, facebook, linkedin, instagram)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                company = COALESCE(excluded.company, profiles.company),
                website = COALESCE(excluded.website, profiles.website),
                location = COALESCE(excluded.location, profiles.location),
                bio = COALESCE(excluded.bio, profiles.bio),
                status = excluded.status,
                githubusername = COALESCE(excluded.githubusername, profiles.githubusername),
                skills = excluded.skills,
                youtube = excluded.youtube,
                twitter = excluded.twitter,
                facebook = excluded.facebook,
                linkedin = excluded.linkedin,
                instagram = excluded.instagram",
        )
        .bind(user_id)
        .bind(fields.company.as_deref())
        .bind(fields.website.as_deref())
        .bind(fields.location.as_deref())
        .bind(fields.bio.as_deref())
        .bind(&fields.status)
        .bind(fields.githubusername.as_deref())
        .bind(&skills)
        .bind(fields.social.youtube.as_deref())
        .bind(fields.social.twitter.as_deref())
        .bind(fields.social.facebook.as_deref())
        .bind(fields.social.linkedin.as_deref())
        .bind(fields.social.instagram.as_deref())
        .execute(&self.pool)
        .await?;

        self.get_by_user(user_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Add an experience entry to a profile. Returns the entry UUID.
    pub async fn add_experience(
        &self,
        profile_id: i64,
        experience: &NewExperience,
    ) -> Result<String, sqlx::Error> {
        let uuid = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO experience (uuid, profile_id, title, company, location, from_date, to_date, current, description)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&uuid)
        .bind(profile_id)
        .bind(&experience.title)
        .bind(&experience.company)
        .bind(experience.location.as_deref())
        .bind(&experience.from)
        .bind(experience.to.as_deref())
        .bind(experience.current)
        .bind(experience.description.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(uuid)
    }

    /// Remove an experience entry from a profile. Returns whether it existed.
    pub async fn delete_experience(
        &self,
        profile_id: i64,
        uuid: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM experience WHERE uuid = ? AND profile_id = ?")
            .bind(uuid)
            .bind(profile_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Add an education entry to a profile. Returns the entry UUID.
    pub async fn add_education(
        &self,
        profile_id: i64,
        education: &NewEducation,
    ) -> Result<String, sqlx::Error> {
        let uuid = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO education (uuid, profile_id, school, degree, fieldofstudy, from_date, to_date, current, description)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&uuid)
        .bind(profile_id)
        .bind(&education.school)
        .bind(&education.degree)
        .bind(&education.fieldofstudy)
        .bind(&education.from)
        .bind(education.to.as_deref())
        .bind(education.current)
        .bind(education.description.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(uuid)
    }

    /// Remove an education entry from a profile. Returns whether it existed.
    pub async fn delete_education(&self, profile_id: i64, uuid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM education WHERE uuid = ? AND profile_id = ?")
            .bind(uuid)
            .bind(profile_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn experience_for(&self, profile_id: i64) -> Result<Vec<Experience>, sqlx::Error> {
        let rows: Vec<ExperienceRow> = sqlx::query_as(
            "SELECT profile_id, uuid, title, company, location, from_date, to_date, current, description
             FROM experience WHERE profile_id = ? ORDER BY id DESC",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Experience::from).collect())
    }

    async fn education_for(&self, profile_id: i64) -> Result<Vec<Education>, sqlx::Error> {
        let rows: Vec<EducationRow> = sqlx::query_as(
            "SELECT profile_id, uuid, school, degree, fieldofstudy, from_date, to_date, current, description
             FROM education WHERE profile_id = ? ORDER BY id DESC",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Education::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NewUser};

    async fn setup() -> (Database, i64) {
        let db = Database::open(":memory:").await.unwrap();
        let user_id = db
            .users()
            .create(&NewUser {
                uuid: "uuid-a",
                name: "Alice",
                email: "a@x.com",
                password_hash: "$2b$04$not-a-real-hash",
                avatar: "avatar-a",
            })
            .await
            .unwrap();
        (db, user_id)
    }

    fn fields(status: &str) -> ProfileFields {
        ProfileFields {
            status: status.to_string(),
            skills: vec!["rust".to_string(), "sql".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_profile() {
        let (db, user_id) = setup().await;

        assert!(db.profiles().get_by_user(user_id).await.unwrap().is_none());

        let mut fields = fields("Developer");
        fields.company = Some("Acme".to_string());
        let profile = db.profiles().upsert(user_id, &fields).await.unwrap();

        assert_eq!(profile.user.id, "uuid-a");
        assert_eq!(profile.user.name, "Alice");
        assert_eq!(profile.status, "Developer");
        assert_eq!(profile.company.as_deref(), Some("Acme"));
        assert_eq!(profile.skills, vec!["rust", "sql"]);
    }

    #[tokio::test]
    async fn test_update_keeps_absent_fields() {
        let (db, user_id) = setup().await;

        let mut first = fields("Developer");
        first.company = Some("Acme".to_string());
        first.social.youtube = Some("yt".to_string());
        db.profiles().upsert(user_id, &first).await.unwrap();

        let mut second = fields("Senior Developer");
        second.bio = Some("Hello".to_string());
        second.social.twitter = Some("tw".to_string());
        let profile = db.profiles().upsert(user_id, &second).await.unwrap();

        assert_eq!(profile.status, "Senior Developer");
        assert_eq!(profile.company.as_deref(), Some("Acme"));
        assert_eq!(profile.bio.as_deref(), Some("Hello"));
        assert_eq!(
            profile.social,
            SocialLinks {
                twitter: Some("tw".to_string()),
                ..Default::default()
            }
        );
        assert_eq!(db.profiles().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_experience_and_education_newest_first() {
        let (db, user_id) = setup().await;
        let profile = db.profiles().upsert(user_id, &fields("Developer")).await.unwrap();

        let first = db
            .profiles()
            .add_experience(
                profile.id,
                &NewExperience {
                    title: "Junior".to_string(),
                    company: "Acme".to_string(),
                    from: "2018-01-01".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let second = db
            .profiles()
            .add_experience(
                profile.id,
                &NewExperience {
                    title: "Senior".to_string(),
                    company: "Acme".to_string(),
                    from: "2021-01-01".to_string(),
                    current: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        db.profiles()
            .add_education(
                profile.id,
                &NewEducation {
                    school: "Uni".to_string(),
                    degree: "BSc".to_string(),
                    fieldofstudy: "CS".to_string(),
                    from: "2014-09-01".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let profile = db.profiles().get_by_user(user_id).await.unwrap().unwrap();
        let ids: Vec<&str> = profile.experience.iter().map(|e| e.uuid.as_str()).collect();
        assert_eq!(ids, vec![second.as_str(), first.as_str()]);
        assert!(profile.experience[0].current);
        assert_eq!(profile.education.len(), 1);

        assert!(db.profiles().delete_experience(profile.id, &first).await.unwrap());
        assert!(!db.profiles().delete_experience(profile.id, &first).await.unwrap());

        let listed = db.profiles().list().await.unwrap();
        assert_eq!(listed[0].experience.len(), 1);
        assert_eq!(listed[0].education.len(), 1);
    }

    #[tokio::test]
    async fn test_deleting_user_removes_profile_entries() {
        let (db, user_id) = setup().await;
        let profile = db.profiles().upsert(user_id, &fields("Developer")).await.unwrap();
        db.profiles()
            .add_experience(
                profile.id,
                &NewExperience {
                    title: "Junior".to_string(),
                    company: "Acme".to_string(),
                    from: "2018-01-01".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        db.users().delete(user_id).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM experience")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_corrupt_skills_is_an_error() {
        let (db, user_id) = setup().await;
        db.profiles().upsert(user_id, &fields("Developer")).await.unwrap();

        sqlx::query("UPDATE profiles SET skills = 'rust, sql' WHERE user_id = ?")
            .bind(user_id)
            .execute(db.pool())
            .await
            .unwrap();

        assert!(matches!(
            db.profiles().get_by_user(user_id).await,
            Err(sqlx::Error::Decode(_))
        ));
        assert!(db.profiles().list().await.is_err());
    }
}
