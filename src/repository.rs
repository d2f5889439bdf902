use crate::errors::Error;
use crate::models::{Actor, Film, NewFilm, User};
use crate::query::{FieldSet, FieldValue};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgArguments;
use sqlx::query::{Query, QueryAs};
use sqlx::{PgPool, Postgres};
use std::sync::Arc;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. The catalog
/// manager and the handlers interact with this trait only, so the concrete
/// backend (Postgres in production, an in-memory mock in tests) is swappable.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's task boundaries.
///
/// Multi-step operations (film insert with links, cascading deletes, batch
/// link) are transactional inside the implementation: a reader never observes
/// a film with only part of its intended associations.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Accounts ---
    // Inserts a new account; a duplicate username surfaces as `UserExist`.
    async fn create_user(&self, username: &str, pass_hash: &str) -> Result<User, Error>;
    async fn get_user_by_username(&self, username: &str) -> Result<User, Error>;

    // --- Actors ---
    async fn list_actors(&self) -> Result<Vec<Actor>, Error>;
    async fn get_actor(&self, id: i32) -> Result<Actor, Error>;
    async fn insert_actor(
        &self,
        name: &str,
        sex: &str,
        birthday: Option<NaiveDate>,
    ) -> Result<Actor, Error>;
    // Overwrites exactly the columns named in `fields`.
    async fn update_actor(&self, id: i32, fields: &FieldSet) -> Result<(), Error>;
    // Removes the actor and every association referencing it, atomically.
    async fn delete_actor(&self, id: i32) -> Result<(), Error>;
    async fn actor_exists(&self, id: i32) -> Result<bool, Error>;

    // --- Films ---
    // `order_by` is a whitelisted ORDER BY fragment chosen by the caller;
    // `filters` carries the caller-selected constraints as bound parameters.
    async fn search_films(&self, order_by: &str, filters: &FieldSet) -> Result<Vec<Film>, Error>;
    async fn get_film(&self, id: i32) -> Result<Film, Error>;
    // Inserts the film and links the given actors as a single atomic unit;
    // either both succeed or neither is visible.
    async fn insert_film(&self, film: &NewFilm, actor_ids: &[i32]) -> Result<i32, Error>;
    async fn update_film(&self, id: i32, fields: &FieldSet) -> Result<(), Error>;
    // Removes the film and cascades its associations, atomically.
    async fn delete_film(&self, id: i32) -> Result<(), Error>;

    // --- Associations ---
    async fn film_actors(&self, film_id: i32) -> Result<Vec<Actor>, Error>;
    async fn film_actor_ids(&self, film_id: i32) -> Result<Vec<i32>, Error>;
    // Inserts every pair or none; a duplicate pair surfaces as
    // `FilmActorExist`, a missing actor as `ActorNotExist`.
    async fn link_actors(&self, film_id: i32, actor_ids: &[i32]) -> Result<(), Error>;
    // Deletes whichever of the pairs exist; absent pairs are not an error.
    async fn unlink_actors(&self, film_id: i32, actor_ids: &[i32]) -> Result<(), Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

// Base SELECT for actors, denormalized with associated film titles.
const ACTOR_SELECT: &str = "SELECT a.actor_id AS id, a.actor_name AS name, a.sex, a.birthday, \
     array_remove(array_agg(f.title ORDER BY f.title), NULL) AS films \
     FROM actors a \
     LEFT JOIN film_actors fa ON fa.actor_id = a.actor_id \
     LEFT JOIN films f ON f.film_id = fa.film_id";

// Base SELECT for films, denormalized with associated actor names.
const FILM_SELECT: &str = "SELECT f.film_id AS id, f.title, f.genre, f.release_date, f.rating, \
     array_remove(array_agg(x.actor_name ORDER BY x.actor_name), NULL) AS actors \
     FROM films f \
     LEFT JOIN film_actors fx ON fx.film_id = f.film_id \
     LEFT JOIN actors x ON x.actor_id = fx.actor_id";

/// Appends every value of a `FieldSet` to a query's bind list, in the same
/// order the matching placeholders were rendered. Values always travel as
/// parameters; the clause text never contains them.
fn bind_fields<'q>(
    query: Query<'q, Postgres, PgArguments>,
    fields: &'q FieldSet,
) -> Query<'q, Postgres, PgArguments> {
    fields.values().iter().fold(query, |q, value| match value {
        FieldValue::Text(s) => q.bind(s.as_str()),
        FieldValue::Int(i) => q.bind(*i),
        FieldValue::Date(d) => q.bind(*d),
    })
}

fn bind_fields_as<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    fields: &'q FieldSet,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    fields.values().iter().fold(query, |q, value| match value {
        FieldValue::Text(s) => q.bind(s.as_str()),
        FieldValue::Int(i) => q.bind(*i),
        FieldValue::Date(d) => q.bind(*d),
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

// Maps an association-insert failure onto the domain conflict kinds.
fn map_link_error(err: sqlx::Error) -> Error {
    if is_unique_violation(&err) {
        Error::FilmActorExist
    } else if is_foreign_key_violation(&err) {
        Error::ActorNotExist
    } else {
        Error::Database(err)
    }
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// create_user
    ///
    /// Inserts a new account row. The UNIQUE constraint on `user_name` is the
    /// source of truth for duplicate detection.
    async fn create_user(&self, username: &str, pass_hash: &str) -> Result<User, Error> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (user_name, passhash, is_admin) VALUES ($1, $2, false) \
             RETURNING user_id AS id, user_name AS username, passhash AS pass_hash, is_admin",
        )
        .bind(username)
        .bind(pass_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::UserExist
            } else {
                Error::Database(e)
            }
        })
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, Error> {
        sqlx::query_as::<_, User>(
            "SELECT user_id AS id, user_name AS username, passhash AS pass_hash, is_admin \
             FROM users WHERE user_name = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::UserNotExist)
    }

    async fn list_actors(&self) -> Result<Vec<Actor>, Error> {
        let sql = format!("{ACTOR_SELECT} GROUP BY a.actor_id ORDER BY a.actor_id");
        Ok(sqlx::query_as::<_, Actor>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_actor(&self, id: i32) -> Result<Actor, Error> {
        let sql = format!("{ACTOR_SELECT} WHERE a.actor_id = $1 GROUP BY a.actor_id");
        sqlx::query_as::<_, Actor>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::ActorNotFound)
    }

    /// insert_actor
    ///
    /// Inserts the row, then re-reads it through the denormalizing SELECT so
    /// the caller gets the same shape every other read path produces.
    async fn insert_actor(
        &self,
        name: &str,
        sex: &str,
        birthday: Option<NaiveDate>,
    ) -> Result<Actor, Error> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO actors (actor_name, sex, birthday) VALUES ($1, $2, $3) \
             RETURNING actor_id",
        )
        .bind(name)
        .bind(sex)
        .bind(birthday)
        .fetch_one(&self.pool)
        .await?;

        self.get_actor(id).await
    }

    /// update_actor
    ///
    /// Renders the caller-built `FieldSet` into a SET clause with numbered
    /// placeholders, binding the id after the field values.
    async fn update_actor(&self, id: i32, fields: &FieldSet) -> Result<(), Error> {
        let sql = format!(
            "UPDATE actors SET {} WHERE actor_id = ${}",
            fields.set_clause(1),
            fields.len() + 1
        );

        let result = bind_fields(sqlx::query(&sql), fields)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ActorNotFound);
        }
        Ok(())
    }

    async fn delete_actor(&self, id: i32) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM film_actors WHERE actor_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM actors WHERE actor_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // Dropping the open transaction rolls the association delete back.
        if result.rows_affected() == 0 {
            return Err(Error::ActorNotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn actor_exists(&self, id: i32) -> Result<bool, Error> {
        Ok(
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM actors WHERE actor_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    /// search_films
    ///
    /// Applies the caller's constraints through an id subquery so filtering on
    /// an associated actor's name does not truncate the aggregated actor list
    /// of the matching films. With no constraints the subquery is omitted and
    /// every film is returned.
    async fn search_films(&self, order_by: &str, filters: &FieldSet) -> Result<Vec<Film>, Error> {
        let mut sql = String::from(FILM_SELECT);

        if !filters.is_empty() {
            sql.push_str(
                " WHERE f.film_id IN (SELECT f2.film_id FROM films f2 \
                 LEFT JOIN film_actors fa ON fa.film_id = f2.film_id \
                 LEFT JOIN actors a ON a.actor_id = fa.actor_id WHERE ",
            );
            sql.push_str(&filters.where_clause(1));
            sql.push(')');
        }

        sql.push_str(" GROUP BY f.film_id ORDER BY ");
        sql.push_str(order_by);

        let query = bind_fields_as(sqlx::query_as::<_, Film>(&sql), filters);
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn get_film(&self, id: i32) -> Result<Film, Error> {
        let sql = format!("{FILM_SELECT} WHERE f.film_id = $1 GROUP BY f.film_id");
        sqlx::query_as::<_, Film>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::FilmNotExist)
    }

    /// insert_film
    ///
    /// Inserts the film row and its actor links inside one transaction. The
    /// caller has already validated the ids, but the association constraints
    /// remain the final authority under concurrency.
    async fn insert_film(&self, film: &NewFilm, actor_ids: &[i32]) -> Result<i32, Error> {
        let mut tx = self.pool.begin().await?;

        let film_id: i32 = sqlx::query_scalar(
            "INSERT INTO films (title, genre, release_date, rating) VALUES ($1, $2, $3, $4) \
             RETURNING film_id",
        )
        .bind(&film.title)
        .bind(&film.genre)
        .bind(film.release_date)
        .bind(film.rating)
        .fetch_one(&mut *tx)
        .await?;

        for actor_id in actor_ids {
            sqlx::query("INSERT INTO film_actors (film_id, actor_id) VALUES ($1, $2)")
                .bind(film_id)
                .bind(*actor_id)
                .execute(&mut *tx)
                .await
                .map_err(map_link_error)?;
        }

        tx.commit().await?;
        Ok(film_id)
    }

    async fn update_film(&self, id: i32, fields: &FieldSet) -> Result<(), Error> {
        let sql = format!(
            "UPDATE films SET {} WHERE film_id = ${}",
            fields.set_clause(1),
            fields.len() + 1
        );

        let result = bind_fields(sqlx::query(&sql), fields)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::FilmNotExist);
        }
        Ok(())
    }

    async fn delete_film(&self, id: i32) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM film_actors WHERE film_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM films WHERE film_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::FilmNotExist);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn film_actors(&self, film_id: i32) -> Result<Vec<Actor>, Error> {
        let sql = format!(
            "{ACTOR_SELECT} WHERE a.actor_id IN \
             (SELECT actor_id FROM film_actors WHERE film_id = $1) \
             GROUP BY a.actor_id ORDER BY a.actor_id"
        );
        Ok(sqlx::query_as::<_, Actor>(&sql)
            .bind(film_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn film_actor_ids(&self, film_id: i32) -> Result<Vec<i32>, Error> {
        Ok(sqlx::query_scalar(
            "SELECT actor_id FROM film_actors WHERE film_id = $1 ORDER BY actor_id",
        )
        .bind(film_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn link_actors(&self, film_id: i32, actor_ids: &[i32]) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        for actor_id in actor_ids {
            sqlx::query("INSERT INTO film_actors (film_id, actor_id) VALUES ($1, $2)")
                .bind(film_id)
                .bind(*actor_id)
                .execute(&mut *tx)
                .await
                .map_err(map_link_error)?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// unlink_actors
    ///
    /// A single DELETE over the requested pairs. Pairs that are not present
    /// are simply not matched, which makes removal safely retryable.
    async fn unlink_actors(&self, film_id: i32, actor_ids: &[i32]) -> Result<(), Error> {
        sqlx::query("DELETE FROM film_actors WHERE film_id = $1 AND actor_id = ANY($2)")
            .bind(film_id)
            .bind(actor_ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
