//! Tournament listings.
//!
//! DESIGN
//! ======
//! Status is corrected lazily: every save runs [`reconcile_status`], which
//! moves an `upcoming` tournament whose date has arrived to `ongoing`.
//! Stored records are not re-evaluated between saves, so a listing can show
//! `upcoming` for an event that started after its last edit.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

use super::articles::AuthorSummary;
use super::text::{TagsInput, non_blank, or_keep, resolve_slug};
use crate::error::{ApiError, DuplicateAs};
use crate::models::{Tournament, TournamentFormat, TournamentStatus, User};
use crate::pagination::PageRequest;
use crate::store::{ContentStore, TournamentQuery, TournamentSort};

const DUPLICATE_SLUG: &str = "A tournament with this slug already exists";

// =============================================================================
// VIEWS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TournamentView {
    #[serde(flatten)]
    pub tournament: Tournament,
    pub author: Option<AuthorSummary>,
}

#[derive(Debug, Serialize)]
pub struct TournamentPage {
    pub tournaments: Vec<TournamentView>,
    pub page: i64,
    pub pages: i64,
    pub total: i64,
}

async fn populate(store: &dyn ContentStore, tournaments: Vec<Tournament>) -> Result<Vec<TournamentView>, ApiError> {
    let mut author_ids: Vec<Uuid> = tournaments.iter().filter_map(|t| t.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();
    let authors = store.users_by_ids(&author_ids).await?;

    Ok(tournaments
        .into_iter()
        .map(|tournament| TournamentView {
            author: tournament
                .author_id
                .and_then(|id| authors.iter().find(|u| u.id == id))
                .map(AuthorSummary::from),
            tournament,
        })
        .collect())
}

async fn populate_one(store: &dyn ContentStore, tournament: Tournament) -> Result<TournamentView, ApiError> {
    populate(store, vec![tournament])
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal("populate dropped a tournament"))
}

// =============================================================================
// INPUT
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub featured_image: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub format: Option<String>,
    pub prize: Option<String>,
    pub organizer: Option<String>,
    pub participants: Option<i32>,
    pub status: Option<String>,
    pub tags: Option<TagsInput>,
}

/// Parse an event date: RFC 3339, a `datetime-local` value (UTC), or a
/// bare calendar date (midnight UTC).
pub fn parse_event_date(raw: &str) -> Result<OffsetDateTime, ApiError> {
    let raw = raw.trim();
    if let Ok(date) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(date);
    }
    let with_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let without_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    for format in [with_seconds, without_seconds] {
        if let Ok(local) = PrimitiveDateTime::parse(raw, format) {
            return Ok(local.assume_utc());
        }
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map(|date| date.midnight().assume_utc())
        .map_err(|_| ApiError::Validation(format!("Invalid tournament date: {raw}")))
}

fn parse_format(raw: &str) -> Result<TournamentFormat, ApiError> {
    TournamentFormat::parse(raw).ok_or_else(|| ApiError::Validation(format!("Invalid format: {}", raw.trim())))
}

fn parse_status(raw: &str) -> Result<TournamentStatus, ApiError> {
    TournamentStatus::parse(raw).ok_or_else(|| ApiError::Validation(format!("Invalid status: {}", raw.trim())))
}

fn check_participants(participants: Option<i32>) -> Result<Option<i32>, ApiError> {
    match participants {
        Some(n) if n < 0 => Err(ApiError::Validation("Participants cannot be negative".to_owned())),
        other => Ok(other),
    }
}

fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, ApiError> {
    non_blank(value).ok_or_else(|| ApiError::Validation(message.to_owned()))
}

/// An `upcoming` tournament whose date is at or before `now` is `ongoing`.
pub fn reconcile_status(tournament: &mut Tournament, now: OffsetDateTime) {
    if tournament.status == TournamentStatus::Upcoming && tournament.date <= now {
        tournament.status = TournamentStatus::Ongoing;
    }
}

// =============================================================================
// WRITES
// =============================================================================

pub async fn create_tournament(
    store: &dyn ContentStore,
    author: &User,
    input: TournamentInput,
) -> Result<TournamentView, ApiError> {
    let title = required(input.title.as_deref(), "Title is required")?.to_owned();
    let description = required(input.description.as_deref(), "Description is required")?.to_owned();
    let date = parse_event_date(required(input.date.as_deref(), "Tournament date is required")?)?;
    let location = required(input.location.as_deref(), "Location is required")?.to_owned();
    let format = parse_format(required(input.format.as_deref(), "Format is required")?)?;
    let status = match non_blank(input.status.as_deref()) {
        Some(raw) => parse_status(raw)?,
        None => TournamentStatus::Upcoming,
    };
    let participants = check_participants(input.participants)?.unwrap_or(0);

    let id = Uuid::new_v4();
    let now = OffsetDateTime::now_utc();
    let mut tournament = Tournament {
        id,
        slug: resolve_slug(input.slug.as_deref(), &title, "tournament", id),
        title,
        description,
        featured_image: input.featured_image.unwrap_or_default(),
        date,
        location,
        format,
        prize: input.prize.unwrap_or_default(),
        organizer: input.organizer.unwrap_or_default(),
        participants,
        status,
        tags: input.tags.map(TagsInput::into_tags).unwrap_or_default(),
        author_id: Some(author.id),
        created_at: now,
        updated_at: now,
    };
    reconcile_status(&mut tournament, now);

    store.insert_tournament(&tournament).await.duplicate_as(DUPLICATE_SLUG)?;
    tracing::info!(tournament_id = %tournament.id, slug = %tournament.slug, "tournament created");
    populate_one(store, tournament).await
}

pub async fn update_tournament(
    store: &dyn ContentStore,
    id: Uuid,
    input: TournamentInput,
) -> Result<TournamentView, ApiError> {
    let mut tournament = store
        .find_tournament(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Tournament"))?;

    let date = non_blank(input.date.as_deref()).map(parse_event_date).transpose()?;
    let format = non_blank(input.format.as_deref()).map(parse_format).transpose()?;
    let status = non_blank(input.status.as_deref()).map(parse_status).transpose()?;
    let participants = check_participants(input.participants)?;

    let new_title = non_blank(input.title.as_deref()).map(str::to_owned);
    let title_changed = new_title.as_ref().is_some_and(|t| *t != tournament.title);
    tournament.title = or_keep(new_title, tournament.title);
    if non_blank(input.slug.as_deref()).is_some() || title_changed {
        tournament.slug = resolve_slug(input.slug.as_deref(), &tournament.title, "tournament", tournament.id);
    }
    tournament.description = or_keep(input.description, tournament.description);
    tournament.featured_image = or_keep(input.featured_image, tournament.featured_image);
    tournament.location = or_keep(input.location, tournament.location);
    tournament.prize = or_keep(input.prize, tournament.prize);
    tournament.organizer = or_keep(input.organizer, tournament.organizer);
    if let Some(date) = date {
        tournament.date = date;
    }
    if let Some(format) = format {
        tournament.format = format;
    }
    if let Some(status) = status {
        tournament.status = status;
    }
    // Zero means "unchanged", as with blank text.
    if let Some(participants) = participants.filter(|n| *n != 0) {
        tournament.participants = participants;
    }
    match input.tags {
        Some(TagsInput::Csv(csv)) if csv.trim().is_empty() => {}
        Some(tags) => tournament.tags = tags.into_tags(),
        None => {}
    }

    let now = OffsetDateTime::now_utc();
    reconcile_status(&mut tournament, now);
    tournament.updated_at = now;

    store.update_tournament(&tournament).await.duplicate_as(DUPLICATE_SLUG)?;
    populate_one(store, tournament).await
}

pub async fn delete_tournament(store: &dyn ContentStore, id: Uuid) -> Result<(), ApiError> {
    if store.delete_tournament(id).await? {
        tracing::info!(tournament_id = %id, "tournament deleted");
        Ok(())
    } else {
        Err(ApiError::not_found("Tournament"))
    }
}

// =============================================================================
// READS
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct TournamentListParams {
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
}

pub async fn list_tournaments(
    store: &dyn ContentStore,
    params: TournamentListParams,
) -> Result<TournamentPage, ApiError> {
    let page = PageRequest::from_params(params.page, params.limit);
    let status = match non_blank(params.status.as_deref()) {
        None | Some("all") => None,
        Some(raw) => Some(parse_status(raw)?),
    };
    let sort = match params.sort.as_deref() {
        Some("date-desc") => TournamentSort::DateDesc,
        Some("title") => TournamentSort::Title,
        _ => TournamentSort::DateAsc,
    };

    let query = TournamentQuery { status, search: params.search, sort, page: Some(page) };
    let (tournaments, total) = store.list_tournaments(&query).await?;
    Ok(TournamentPage {
        tournaments: populate(store, tournaments).await?,
        page: page.page,
        pages: page.page_count(total),
        total,
    })
}

/// Every tournament, most recently created first.
pub async fn list_all(store: &dyn ContentStore) -> Result<Vec<TournamentView>, ApiError> {
    let query = TournamentQuery { sort: TournamentSort::Created, ..TournamentQuery::default() };
    let (tournaments, _) = store.list_tournaments(&query).await?;
    populate(store, tournaments).await
}

pub async fn get_tournament(store: &dyn ContentStore, slug: &str) -> Result<TournamentView, ApiError> {
    let tournament = store
        .find_tournament_by_slug(slug)
        .await?
        .ok_or_else(|| ApiError::not_found("Tournament"))?;
    populate_one(store, tournament).await
}

#[cfg(test)]
#[path = "tournaments_test.rs"]
mod tests;
