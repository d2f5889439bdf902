use std::collections::HashSet;

use chrono::NaiveDate;

use crate::errors::{Error, ValidationError};
use crate::models::{
    Actor, CreateActorRequest, CreateFilmRequest, Film, NewFilm, UpdateActorRequest,
    UpdateFilmRequest,
};
use crate::query::{FieldSet, FieldValue};
use crate::repository::RepositoryState;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// FilmSort
///
/// The whitelisted sort keys for film search. The rendered ORDER BY fragment
/// comes from this enum only, never from request text, and always carries the
/// film id as a tiebreaker so result order is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilmSort {
    Title,
    Rating,
    Release,
}

impl FilmSort {
    /// Resolves the `sort` query parameter. Absent or empty means the default
    /// rating-descending order; anything outside the whitelist is a
    /// validation failure.
    pub fn from_param(raw: Option<&str>) -> Result<Self, Error> {
        match raw.unwrap_or("") {
            "" | "rating" => Ok(Self::Rating),
            "title" => Ok(Self::Title),
            "release" => Ok(Self::Release),
            other => {
                let mut ve = ValidationError::new();
                ve.add(format!(
                    "unknown sort key '{other}' (expected one of [title, rating, release])"
                ));
                Err(Error::Validation(ve))
            }
        }
    }

    pub fn order_by(self) -> &'static str {
        match self {
            Self::Title => "f.title ASC, f.film_id ASC",
            Self::Rating => "f.rating DESC, f.film_id ASC",
            Self::Release => "f.release_date DESC, f.film_id ASC",
        }
    }
}

/// Parses an external-facing id path parameter into the internal numeric form.
/// Anything that is not a non-negative integer in range is `IdInvalid`.
fn parse_id(raw: &str) -> Result<i32, Error> {
    let id: u32 = raw.parse().map_err(|_| Error::IdInvalid)?;
    i32::try_from(id).map_err(|_| Error::IdInvalid)
}

// Records a violation for an unparsable date; "no date" is expressed by
// omission and is not a violation.
fn parse_optional_date(raw: Option<&str>, ve: &mut ValidationError) -> Option<NaiveDate> {
    match raw {
        Some(s) if !s.is_empty() => match NaiveDate::parse_from_str(s, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                ve.add("incorrect date format (expected format: YYYY-MM-DD)");
                None
            }
        },
        _ => None,
    }
}

/// Catalog
///
/// The domain logic governing Films, Actors and the Film↔Actor association.
/// Handlers stay thin and delegate here; this type parses external ids,
/// validates payloads (collecting every violation), builds `FieldSet`
/// predicates for searches and partial updates, and enforces the conflict and
/// existence rules before the repository is asked to write anything.
#[derive(Clone)]
pub struct Catalog {
    repo: RepositoryState,
}

impl Catalog {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    // --- Actors ---

    pub async fn list_actors(&self) -> Result<Vec<Actor>, Error> {
        self.repo.list_actors().await
    }

    pub async fn get_actor(&self, raw_id: &str) -> Result<Actor, Error> {
        let id = parse_id(raw_id)?;
        self.repo.get_actor(id).await
    }

    /// create_actor
    ///
    /// Requires a name and a definite sex; the birthday is optional. Every
    /// violation is collected before the request is rejected.
    pub async fn create_actor(&self, req: &CreateActorRequest) -> Result<Actor, Error> {
        let mut ve = ValidationError::new();

        if req.name.is_empty() {
            ve.add("name empty");
        }
        if req.sex.is_empty() {
            ve.add("sex empty (expected one of [male, female])");
        } else if !matches!(req.sex.as_str(), "male" | "female") {
            ve.add("incorrect sex format (expected one of [male, female])");
        }
        let birthday = parse_optional_date(req.birthday.as_deref(), &mut ve);

        ve.into_result()?;

        self.repo.insert_actor(&req.name, &req.sex, birthday).await
    }

    /// update_actor
    ///
    /// Overwrites exactly the fields present in the request; a request with no
    /// fields is rejected before storage is touched. Re-reads the row after
    /// the write so the caller sees the authoritative state.
    pub async fn update_actor(
        &self,
        raw_id: &str,
        req: &UpdateActorRequest,
    ) -> Result<Actor, Error> {
        let id = parse_id(raw_id)?;

        let mut ve = ValidationError::new();
        let mut fields = FieldSet::new();

        if let Some(name) = &req.name {
            if name.is_empty() {
                ve.add("name empty");
            } else {
                fields.add("actor_name", FieldValue::Text(name.clone()));
            }
        }
        if let Some(sex) = &req.sex {
            // Empty sex is legal here: it resets the field to "unspecified".
            if matches!(sex.as_str(), "" | "male" | "female") {
                fields.add("sex", FieldValue::Text(sex.clone()));
            } else {
                ve.add("incorrect sex format (expected one of [male, female])");
            }
        }
        if let Some(date) = parse_optional_date(req.birthday.as_deref(), &mut ve) {
            fields.add("birthday", FieldValue::Date(date));
        }

        ve.into_result()?;

        if fields.is_empty() {
            return Err(Error::EmptyUpdate);
        }

        self.repo.update_actor(id, &fields).await?;
        self.repo.get_actor(id).await
    }

    /// Deletes the actor and returns its last observed state. Associations
    /// referencing the actor are removed in the same atomic unit.
    pub async fn delete_actor(&self, raw_id: &str) -> Result<Actor, Error> {
        let id = parse_id(raw_id)?;
        let actor = self.repo.get_actor(id).await?;
        self.repo.delete_actor(id).await?;
        Ok(actor)
    }

    // --- Films ---

    /// search_films
    ///
    /// Builds a predicate from whichever filters are present; an absent or
    /// empty filter places no constraint on that field, so a bare request
    /// returns the whole catalog.
    pub async fn search_films(
        &self,
        sort: Option<&str>,
        film: Option<&str>,
        actor: Option<&str>,
    ) -> Result<Vec<Film>, Error> {
        let sort = FilmSort::from_param(sort)?;

        let mut filters = FieldSet::new();
        if let Some(title) = film.filter(|s| !s.is_empty()) {
            filters.add("f2.title", FieldValue::Text(title.to_owned()));
        }
        if let Some(name) = actor.filter(|s| !s.is_empty()) {
            filters.add("a.actor_name", FieldValue::Text(name.to_owned()));
        }

        self.repo.search_films(sort.order_by(), &filters).await
    }

    pub async fn get_film(&self, raw_id: &str) -> Result<Film, Error> {
        let id = parse_id(raw_id)?;
        self.repo.get_film(id).await
    }

    /// create_film
    ///
    /// Validates the descriptive fields and the whole actor batch before any
    /// write: one unknown actor id rejects the entire request, and the insert
    /// plus its links land in a single transaction.
    pub async fn create_film(&self, req: &CreateFilmRequest) -> Result<Film, Error> {
        let mut ve = ValidationError::new();

        if req.title.is_empty() {
            ve.add("title empty");
        }
        let release_date = match NaiveDate::parse_from_str(&req.release_date, DATE_FORMAT) {
            Ok(date) => date,
            Err(_) => {
                ve.add("incorrect release date format (expected format: YYYY-MM-DD)");
                // Placeholder; the violation above guarantees rejection.
                NaiveDate::default()
            }
        };
        if !(0..=10).contains(&req.rating) {
            ve.add("rating out of range (expected 0..=10)");
        }

        ve.into_result()?;

        let mut seen = HashSet::new();
        for actor_id in &req.actor_ids {
            if !self.repo.actor_exists(*actor_id).await? {
                return Err(Error::ActorNotExist);
            }
            if !seen.insert(*actor_id) {
                return Err(Error::FilmActorExist);
            }
        }

        let film = NewFilm {
            title: req.title.clone(),
            genre: req.genre.clone(),
            release_date,
            rating: req.rating,
        };

        let film_id = self.repo.insert_film(&film, &req.actor_ids).await?;
        self.repo.get_film(film_id).await
    }

    /// update_film
    ///
    /// Same partial-update contract as `update_actor`: present fields are
    /// validated and overwritten, no fields at all is `EmptyUpdate`, and the
    /// row is re-read after the write.
    pub async fn update_film(&self, raw_id: &str, req: &UpdateFilmRequest) -> Result<Film, Error> {
        let id = parse_id(raw_id)?;

        let mut ve = ValidationError::new();
        let mut fields = FieldSet::new();

        if let Some(title) = &req.title {
            if title.is_empty() {
                ve.add("title empty");
            } else {
                fields.add("title", FieldValue::Text(title.clone()));
            }
        }
        if let Some(genre) = &req.genre {
            fields.add("genre", FieldValue::Text(genre.clone()));
        }
        if let Some(raw) = &req.release_date {
            match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
                Ok(date) => fields.add("release_date", FieldValue::Date(date)),
                Err(_) => ve.add("incorrect release date format (expected format: YYYY-MM-DD)"),
            }
        }
        if let Some(rating) = req.rating {
            if (0..=10).contains(&rating) {
                fields.add("rating", FieldValue::Int(rating));
            } else {
                ve.add("rating out of range (expected 0..=10)");
            }
        }

        ve.into_result()?;

        if fields.is_empty() {
            return Err(Error::EmptyUpdate);
        }

        self.repo.update_film(id, &fields).await?;
        self.repo.get_film(id).await
    }

    /// Deletes the film and cascades its associations atomically, returning
    /// the last observed state.
    pub async fn delete_film(&self, raw_id: &str) -> Result<Film, Error> {
        let id = parse_id(raw_id)?;
        let film = self.repo.get_film(id).await?;
        self.repo.delete_film(id).await?;
        Ok(film)
    }

    // --- Associations ---

    /// The actors linked to a film. A film with no links is a distinct,
    /// caller-visible condition rather than an empty success.
    pub async fn film_actors(&self, raw_id: &str) -> Result<Vec<Actor>, Error> {
        let id = parse_id(raw_id)?;
        let actors = self.repo.film_actors(id).await?;
        if actors.is_empty() {
            return Err(Error::ZeroActors);
        }
        Ok(actors)
    }

    /// add_film_actors
    ///
    /// Validates the whole batch against the current association set before
    /// any write is committed: a single unknown actor or already-linked pair
    /// rejects the entire request and leaves the set unchanged.
    pub async fn add_film_actors(&self, raw_id: &str, actor_ids: &[i32]) -> Result<Film, Error> {
        let id = parse_id(raw_id)?;

        if actor_ids.is_empty() {
            return Err(Error::EmptyUpdate);
        }

        self.repo.get_film(id).await?;

        let mut linked: HashSet<i32> = self.repo.film_actor_ids(id).await?.into_iter().collect();
        for actor_id in actor_ids {
            if !self.repo.actor_exists(*actor_id).await? {
                return Err(Error::ActorNotExist);
            }
            if !linked.insert(*actor_id) {
                return Err(Error::FilmActorExist);
            }
        }

        self.repo.link_actors(id, actor_ids).await?;
        self.repo.get_film(id).await
    }

    /// remove_film_actors
    ///
    /// Removal is idempotent per pair: unlinking an actor that is not linked
    /// succeeds silently. Only a film with no associations at all rejects the
    /// request. The asymmetry with `add_film_actors` is deliberate — add must
    /// prevent duplicate links, remove must be safely retryable.
    pub async fn remove_film_actors(&self, raw_id: &str, actor_ids: &[i32]) -> Result<Film, Error> {
        let id = parse_id(raw_id)?;

        if actor_ids.is_empty() {
            return Err(Error::EmptyUpdate);
        }

        let linked = self.repo.film_actor_ids(id).await?;
        if linked.is_empty() {
            return Err(Error::ZeroActors);
        }

        self.repo.unlink_actors(id, actor_ids).await?;
        self.repo.get_film(id).await
    }
}
