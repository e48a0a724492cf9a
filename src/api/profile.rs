//! Profile API: the caller's profile, public listings, experience and education.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::{Validate, ValidationError};

use super::error::{ApiError, ResultExt};
use super::validation::{FieldOrder, ValidateJson, not_blank, split_list};
use super::{Gates, load_caller};
use crate::auth::{AuthError, Identity};
use crate::db::{Database, NewEducation, NewExperience, Profile, ProfileFields, SocialLinks};

const NO_PROFILE: &str = "There is no profile for this user";
const PROFILE_NOT_FOUND: &str = "Profile not found";

#[derive(Clone)]
pub struct ProfileState {
    pub db: Database,
}

pub fn router(state: ProfileState, gates: &Gates) -> Router {
    let protected = gates
        .protect(
            Router::new()
                .route("/me", get(get_own_profile))
                .route("/", post(upsert_profile))
                .route("/", delete(delete_account))
                .route("/experience", put(add_experience))
                .route("/experience/{exp_id}", delete(delete_experience))
                .route("/education", put(add_education))
                .route("/education/{edu_id}", delete(delete_education)),
        )
        .with_state(state.clone());

    let public = Router::new()
        .route("/", get(list_profiles))
        .route("/user/{user_id}", get(get_profile_by_user))
        .with_state(state);

    Router::new().merge(protected).merge(public)
}

// --- Request/Response types ---

/// Skills arrive either as a comma separated string or as a list.
#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum SkillsInput {
    Text(String),
    List(Vec<String>),
}

impl SkillsInput {
    fn to_list(&self) -> Vec<String> {
        match self {
            SkillsInput::Text(text) => split_list(text),
            SkillsInput::List(items) => items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

fn has_skills(skills: &SkillsInput) -> Result<(), ValidationError> {
    if skills.to_list().is_empty() {
        return Err(ValidationError::new("no_skills"));
    }
    Ok(())
}

#[derive(Deserialize, Validate)]
struct ProfileRequest {
    company: Option<String>,
    website: Option<String>,
    location: Option<String>,
    bio: Option<String>,
    #[validate(
        required(message = "Status is required"),
        custom(function = "not_blank", message = "Status is required")
    )]
    status: Option<String>,
    githubusername: Option<String>,
    #[validate(
        required(message = "Skills is required"),
        custom(function = "has_skills", message = "Skills is required")
    )]
    skills: Option<SkillsInput>,
    youtube: Option<String>,
    twitter: Option<String>,
    facebook: Option<String>,
    linkedin: Option<String>,
    instagram: Option<String>,
}

impl FieldOrder for ProfileRequest {
    const FIELDS: &'static [&'static str] = &["status", "skills"];
}

#[derive(Deserialize, Validate)]
struct ExperienceRequest {
    #[validate(
        required(message = "Title is required"),
        custom(function = "not_blank", message = "Title is required")
    )]
    title: Option<String>,
    #[validate(
        required(message = "Company is required"),
        custom(function = "not_blank", message = "Company is required")
    )]
    company: Option<String>,
    location: Option<String>,
    #[validate(
        required(message = "From Date is required"),
        custom(function = "not_blank", message = "From Date is required")
    )]
    from: Option<String>,
    to: Option<String>,
    #[serde(default)]
    current: bool,
    description: Option<String>,
}

impl FieldOrder for ExperienceRequest {
    const FIELDS: &'static [&'static str] = &["title", "company", "from"];
}

#[derive(Deserialize, Validate)]
struct EducationRequest {
    #[validate(
        required(message = "School is required"),
        custom(function = "not_blank", message = "School is required")
    )]
    school: Option<String>,
    #[validate(
        required(message = "Degree is required"),
        custom(function = "not_blank", message = "Degree is required")
    )]
    degree: Option<String>,
    #[validate(
        required(message = "Field of study is required"),
        custom(function = "not_blank", message = "Field of study is required")
    )]
    fieldofstudy: Option<String>,
    #[validate(
        required(message = "From Date is required"),
        custom(function = "not_blank", message = "From Date is required")
    )]
    from: Option<String>,
    to: Option<String>,
    #[serde(default)]
    current: bool,
    description: Option<String>,
}

impl FieldOrder for EducationRequest {
    const FIELDS: &'static [&'static str] = &["school", "degree", "fieldofstudy", "from"];
}

#[derive(Serialize)]
struct MessageResponse {
    msg: &'static str,
}

// --- Helpers ---

/// Trimmed value, or None when absent or blank.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn own_profile(db: &Database, user_id: i64) -> Result<Profile, ApiError> {
    db.profiles()
        .get_by_user(user_id)
        .await
        .db_err("Failed to get profile")?
        .ok_or_else(|| ApiError::bad_request(NO_PROFILE))
}

// --- Handlers ---

async fn get_own_profile(
    State(state): State<ProfileState>,
    Identity(identity): Identity,
) -> Result<impl IntoResponse, ApiError> {
    let user = load_caller(&state.db, &identity).await?;
    let profile = own_profile(&state.db, user.id).await?;
    Ok(Json(profile))
}

async fn upsert_profile(
    State(state): State<ProfileState>,
    Identity(identity): Identity,
    ValidateJson(payload): ValidateJson<ProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let skills = payload
        .skills
        .as_ref()
        .map(SkillsInput::to_list)
        .unwrap_or_default();
    let user = load_caller(&state.db, &identity).await?;

    let fields = ProfileFields {
        company: present(payload.company),
        website: present(payload.website),
        location: present(payload.location),
        bio: present(payload.bio),
        status: payload.status.unwrap_or_default().trim().to_string(),
        githubusername: present(payload.githubusername),
        skills,
        social: SocialLinks {
            youtube: present(payload.youtube),
            twitter: present(payload.twitter),
            facebook: present(payload.facebook),
            linkedin: present(payload.linkedin),
            instagram: present(payload.instagram),
        },
    };

    let profile = state
        .db
        .profiles()
        .upsert(user.id, &fields)
        .await
        .db_err("Failed to save profile")?;

    Ok(Json(profile))
}

async fn list_profiles(State(state): State<ProfileState>) -> Result<impl IntoResponse, ApiError> {
    let profiles = state
        .db
        .profiles()
        .list()
        .await
        .db_err("Failed to list profiles")?;
    Ok(Json(profiles))
}

async fn get_profile_by_user(
    State(state): State<ProfileState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // Malformed ids look the same as unknown ones.
    let user = state
        .db
        .users()
        .get_by_uuid(user_id.trim())
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::bad_request(PROFILE_NOT_FOUND))?;

    let profile = state
        .db
        .profiles()
        .get_by_user(user.id)
        .await
        .db_err("Failed to get profile")?
        .ok_or_else(|| ApiError::bad_request(PROFILE_NOT_FOUND))?;

    Ok(Json(profile))
}

async fn delete_account(
    State(state): State<ProfileState>,
    Identity(identity): Identity,
) -> Result<impl IntoResponse, ApiError> {
    let user = load_caller(&state.db, &identity).await?;

    let posts = state
        .db
        .users()
        .delete(user.id)
        .await
        .db_err("Failed to delete user")?
        .ok_or_else(|| ApiError::unauthorized(AuthError::InvalidToken.message()))?;

    info!(user = %user.uuid, posts, "User removed");

    Ok(Json(MessageResponse {
        msg: "User removed",
    }))
}

async fn add_experience(
    State(state): State<ProfileState>,
    Identity(identity): Identity,
    ValidateJson(payload): ValidateJson<ExperienceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = load_caller(&state.db, &identity).await?;
    let profile = own_profile(&state.db, user.id).await?;

    let experience = NewExperience {
        title: present(payload.title).unwrap_or_default(),
        company: present(payload.company).unwrap_or_default(),
        location: present(payload.location),
        from: present(payload.from).unwrap_or_default(),
        to: present(payload.to),
        current: payload.current,
        description: present(payload.description),
    };

    state
        .db
        .profiles()
        .add_experience(profile.id, &experience)
        .await
        .db_err("Failed to add experience")?;

    Ok(Json(own_profile(&state.db, user.id).await?))
}

async fn delete_experience(
    State(state): State<ProfileState>,
    Identity(identity): Identity,
    Path(exp_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = load_caller(&state.db, &identity).await?;
    let profile = own_profile(&state.db, user.id).await?;

    let deleted = state
        .db
        .profiles()
        .delete_experience(profile.id, &exp_id)
        .await
        .db_err("Failed to delete experience")?;

    if !deleted {
        return Err(ApiError::not_found("Experience not found"));
    }

    Ok(Json(own_profile(&state.db, user.id).await?))
}

async fn add_education(
    State(state): State<ProfileState>,
    Identity(identity): Identity,
    ValidateJson(payload): ValidateJson<EducationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = load_caller(&state.db, &identity).await?;
    let profile = own_profile(&state.db, user.id).await?;

    let education = NewEducation {
        school: present(payload.school).unwrap_or_default(),
        degree: present(payload.degree).unwrap_or_default(),
        fieldofstudy: present(payload.fieldofstudy).unwrap_or_default(),
        from: present(payload.from).unwrap_or_default(),
        to: present(payload.to),
        current: payload.current,
        description: present(payload.description),
    };

    state
        .db
        .profiles()
        .add_education(profile.id, &education)
        .await
        .db_err("Failed to add education")?;

    Ok(Json(own_profile(&state.db, user.id).await?))
}

async fn delete_education(
    State(state): State<ProfileState>,
    Identity(identity): Identity,
    Path(edu_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = load_caller(&state.db, &identity).await?;
    let profile = own_profile(&state.db, user.id).await?;

    let deleted = state
        .db
        .profiles()
        .delete_education(profile.id, &edu_id)
        .await
        .db_err("Failed to delete education")?;

    if !deleted {
        return Err(ApiError::not_found("Education not found"));
    }

    Ok(Json(own_profile(&state.db, user.id).await?))
}
