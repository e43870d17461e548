use std::collections::{BTreeSet, HashMap};

use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{Set, Unchanged},
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, TransactionTrait,
    sea_query::Expr,
};

use crate::{
    entities::{
        category, country, genre, movie, movie_actor, movie_country, movie_director, movie_genre,
        movie_shot, person, rating, rating_star, review,
    },
    error::{AppError, AppResult, FieldErrors},
    models::{CreateMovie, MovieDetail, MovieFilter, MovieListItem, MovieShotItem, PersonRef},
    review_tree, slug,
};

/// Per-movie rating aggregate, folded from the raw rating rows.
#[derive(Clone, Copy, Debug, Default)]
struct RatingStats {
    sum: i64,
    count: i64,
    rated_by_requester: bool,
}

impl RatingStats {
    fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

#[derive(Clone)]
pub struct MovieRepo {
    db: DatabaseConnection,
}

impl MovieRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Non-draft movies, annotated with the rating average and whether the
    /// requesting address has already rated each one.
    pub async fn list(
        &self,
        filter: &MovieFilter,
        client_ip: &str,
    ) -> AppResult<Vec<MovieListItem>> {
        let mut query = movie::Entity::find().filter(movie::Column::Draft.eq(false));
        if let Some(year) = filter.year {
            query = query.filter(movie::Column::Year.eq(year));
        }
        if let Some(category_id) = filter.category {
            query = query.filter(movie::Column::CategoryId.eq(category_id));
        }
        if let Some(genre_slug) = &filter.genre {
            let Some(genre) = genre::Entity::find()
                .filter(genre::Column::Slug.eq(genre_slug.as_str()))
                .one(&self.db)
                .await?
            else {
                return Ok(Vec::new());
            };
            let movie_ids: Vec<i32> = movie_genre::Entity::find()
                .filter(movie_genre::Column::GenreId.eq(genre.id))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|join| join.movie_id)
                .collect();
            query = query.filter(movie::Column::Id.is_in(movie_ids));
        }

        let movies = query.order_by_asc(movie::Column::Id).all(&self.db).await?;

        let ids: Vec<i32> = movies.iter().map(|m| m.id).collect();
        let stats = self.rating_summary(&ids, Some(client_ip)).await?;
        let categories = self.category_names(&movies).await?;

        Ok(movies
            .into_iter()
            .map(|m| {
                let movie_stats = stats.get(&m.id);
                MovieListItem {
                    id: m.id,
                    title: m.title,
                    tagline: m.tagline,
                    year: m.year,
                    poster: m.poster,
                    slug: m.slug,
                    category: m.category_id.and_then(|id| categories.get(&id).cloned()),
                    average_rating: movie_stats.and_then(RatingStats::average),
                    rated_by_me: movie_stats.is_some_and(|s| s.rated_by_requester),
                }
            })
            .collect())
    }

    /// Public detail view. Drafts are invisible here.
    pub async fn detail(&self, id: i32) -> AppResult<MovieDetail> {
        let Some(model) = movie::Entity::find_by_id(id)
            .filter(movie::Column::Draft.eq(false))
            .one(&self.db)
            .await?
        else {
            return Err(AppError::NotFound("movie"));
        };
        self.assemble_detail(model).await
    }

    /// Detail regardless of the draft flag, for responses to authenticated
    /// writes.
    pub async fn detail_any(&self, id: i32) -> AppResult<MovieDetail> {
        let Some(model) = movie::Entity::find_by_id(id).one(&self.db).await? else {
            return Err(AppError::NotFound("movie"));
        };
        self.assemble_detail(model).await
    }

    pub async fn create(&self, payload: CreateMovie) -> AppResult<MovieDetail> {
        payload.validate()?;
        self.check_relations(&payload).await?;

        let txn = self.db.begin().await?;

        let model = movie::ActiveModel {
            id: Default::default(),
            title: Set(payload.title.clone()),
            tagline: Set(payload.tagline.clone()),
            description: Set(payload.description.clone()),
            poster: Set(payload.poster.clone()),
            year: Set(payload.year),
            premiere: Set(payload.premiere.clone()),
            budget: Set(payload.budget),
            fees_in_usa: Set(payload.fees_in_usa),
            fees_in_world: Set(payload.fees_in_world),
            category_id: Set(payload.category),
            draft: Set(payload.draft),
            slug: Set(String::new()),
        };
        let id = movie::Entity::insert(model).exec(&txn).await?.last_insert_id;

        // Second write restricted to the slug column. The slug embeds the id
        // and is never recomputed afterwards.
        let (slug, source) = slug::assign(id, &payload.title);
        movie::ActiveModel { id: Unchanged(id), slug: Set(slug), ..Default::default() }
            .update(&txn)
            .await?;
        tracing::debug!(movie = id, source = ?source, "assigned movie slug");

        replace_joins(&txn, id, &payload).await?;

        txn.commit().await?;

        self.detail_any(id).await
    }

    /// Full replace of every field except the slug.
    pub async fn update(&self, id: i32, payload: CreateMovie) -> AppResult<MovieDetail> {
        payload.validate()?;
        self.check_relations(&payload).await?;

        if movie::Entity::find_by_id(id).one(&self.db).await?.is_none() {
            return Err(AppError::NotFound("movie"));
        }

        let txn = self.db.begin().await?;

        movie::ActiveModel {
            id: Unchanged(id),
            title: Set(payload.title.clone()),
            tagline: Set(payload.tagline.clone()),
            description: Set(payload.description.clone()),
            poster: Set(payload.poster.clone()),
            year: Set(payload.year),
            premiere: Set(payload.premiere.clone()),
            budget: Set(payload.budget),
            fees_in_usa: Set(payload.fees_in_usa),
            fees_in_world: Set(payload.fees_in_world),
            category_id: Set(payload.category),
            draft: Set(payload.draft),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        replace_joins(&txn, id, &payload).await?;

        txn.commit().await?;

        self.detail_any(id).await
    }

    /// Removes the movie and everything hanging off it in one transaction.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let txn = self.db.begin().await?;

        if movie::Entity::find_by_id(id).one(&txn).await?.is_none() {
            return Err(AppError::NotFound("movie"));
        }

        rating::Entity::delete_many().filter(rating::Column::MovieId.eq(id)).exec(&txn).await?;
        review::Entity::delete_many().filter(review::Column::MovieId.eq(id)).exec(&txn).await?;
        movie_shot::Entity::delete_many()
            .filter(movie_shot::Column::MovieId.eq(id))
            .exec(&txn)
            .await?;
        clear_joins(&txn, id).await?;
        movie::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Bulk draft-flag flip used by the publish and unpublish actions.
    pub async fn set_draft(&self, ids: &[i32], draft: bool) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = movie::Entity::update_many()
            .col_expr(movie::Column::Draft, Expr::value(draft))
            .filter(movie::Column::Id.is_in(ids.to_vec()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn assemble_detail(&self, model: movie::Model) -> AppResult<MovieDetail> {
        let category = match model.category_id {
            Some(category_id) => {
                category::Entity::find_by_id(category_id).one(&self.db).await?.map(|c| c.name)
            },
            None => None,
        };

        let countries = model
            .find_related(country::Entity)
            .order_by_asc(country::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();

        let genres = model
            .find_related(genre::Entity)
            .order_by_asc(genre::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|g| g.name)
            .collect();

        let directors = self.persons_for(JoinKind::Director, model.id).await?;
        let actors = self.persons_for(JoinKind::Actor, model.id).await?;

        let shots = model
            .find_related(movie_shot::Entity)
            .order_by_asc(movie_shot::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|s| MovieShotItem {
                id: s.id,
                title: s.title,
                description: s.description,
                image: s.image,
            })
            .collect();

        let reviews = review::Entity::find()
            .filter(review::Column::MovieId.eq(model.id))
            .order_by_asc(review::Column::Id)
            .all(&self.db)
            .await?;
        let reviews = review_tree::build(&reviews);

        let stats = self.rating_summary(&[model.id], None).await?;
        let average_rating = stats.get(&model.id).and_then(RatingStats::average);

        Ok(MovieDetail {
            id: model.id,
            title: model.title,
            tagline: model.tagline,
            description: model.description,
            poster: model.poster,
            year: model.year,
            premiere: model.premiere,
            budget: model.budget,
            fees_in_usa: model.fees_in_usa,
            fees_in_world: model.fees_in_world,
            category,
            countries,
            directors,
            actors,
            genres,
            shots,
            reviews,
            average_rating,
            draft: model.draft,
            slug: model.slug,
        })
    }

    /// One fetch of all ratings for the given movies, reduced in memory.
    async fn rating_summary(
        &self,
        movie_ids: &[i32],
        requester_ip: Option<&str>,
    ) -> AppResult<HashMap<i32, RatingStats>> {
        if movie_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = rating::Entity::find()
            .filter(rating::Column::MovieId.is_in(movie_ids.to_vec()))
            .find_also_related(rating_star::Entity)
            .all(&self.db)
            .await?;

        let mut stats: HashMap<i32, RatingStats> = HashMap::new();
        for (row, star) in rows {
            let entry = stats.entry(row.movie_id).or_default();
            if let Some(star) = star {
                entry.sum += i64::from(star.value);
                entry.count += 1;
            }
            if requester_ip.is_some_and(|ip| ip == row.ip) {
                entry.rated_by_requester = true;
            }
        }
        Ok(stats)
    }

    async fn category_names(&self, movies: &[movie::Model]) -> AppResult<HashMap<i32, String>> {
        let ids: BTreeSet<i32> = movies.iter().filter_map(|m| m.category_id).collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows =
            category::Entity::find().filter(category::Column::Id.is_in(ids)).all(&self.db).await?;
        Ok(rows.into_iter().map(|c| (c.id, c.name)).collect())
    }

    async fn persons_for(&self, kind: JoinKind, movie_id: i32) -> AppResult<Vec<PersonRef>> {
        let ids = match kind {
            JoinKind::Director => movie_director::Entity::find()
                .filter(movie_director::Column::MovieId.eq(movie_id))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|j| j.person_id)
                .collect::<Vec<_>>(),
            JoinKind::Actor => movie_actor::Entity::find()
                .filter(movie_actor::Column::MovieId.eq(movie_id))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|j| j.person_id)
                .collect::<Vec<_>>(),
        };
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = person::Entity::find()
            .filter(person::Column::Id.is_in(ids))
            .order_by_asc(person::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|p| PersonRef { id: p.id, name: p.full_name(), slug: p.slug })
            .collect())
    }

    /// Every referenced id must exist before any row is written.
    async fn check_relations(&self, payload: &CreateMovie) -> AppResult<()> {
        let mut errors = FieldErrors::new();

        if let Some(category_id) = payload.category {
            if category::Entity::find_by_id(category_id).one(&self.db).await?.is_none() {
                errors.push("category", "unknown category");
            }
        }

        let country_ids: BTreeSet<i32> = payload.countries.iter().copied().collect();
        if !country_ids.is_empty() {
            let found = country::Entity::find()
                .filter(country::Column::Id.is_in(country_ids.clone()))
                .all(&self.db)
                .await?;
            if found.len() != country_ids.len() {
                errors.push("countries", "unknown country id");
            }
        }

        let person_ids: BTreeSet<i32> =
            payload.directors.iter().chain(payload.actors.iter()).copied().collect();
        if !person_ids.is_empty() {
            let found = person::Entity::find()
                .filter(person::Column::Id.is_in(person_ids.clone()))
                .all(&self.db)
                .await?;
            if found.len() != person_ids.len() {
                errors.push("directors", "unknown person id");
            }
        }

        let genre_ids: BTreeSet<i32> = payload.genres.iter().copied().collect();
        if !genre_ids.is_empty() {
            let found = genre::Entity::find()
                .filter(genre::Column::Id.is_in(genre_ids.clone()))
                .all(&self.db)
                .await?;
            if found.len() != genre_ids.len() {
                errors.push("genres", "unknown genre id");
            }
        }

        errors.into_result()
    }
}

enum JoinKind {
    Director,
    Actor,
}

async fn clear_joins<C: ConnectionTrait>(conn: &C, movie_id: i32) -> AppResult<()> {
    movie_country::Entity::delete_many()
        .filter(movie_country::Column::MovieId.eq(movie_id))
        .exec(conn)
        .await?;
    movie_director::Entity::delete_many()
        .filter(movie_director::Column::MovieId.eq(movie_id))
        .exec(conn)
        .await?;
    movie_actor::Entity::delete_many()
        .filter(movie_actor::Column::MovieId.eq(movie_id))
        .exec(conn)
        .await?;
    movie_genre::Entity::delete_many()
        .filter(movie_genre::Column::MovieId.eq(movie_id))
        .exec(conn)
        .await?;
    Ok(())
}

async fn replace_joins<C: ConnectionTrait>(
    conn: &C,
    movie_id: i32,
    payload: &CreateMovie,
) -> AppResult<()> {
    clear_joins(conn, movie_id).await?;

    let countries: BTreeSet<i32> = payload.countries.iter().copied().collect();
    if !countries.is_empty() {
        movie_country::Entity::insert_many(countries.into_iter().map(|country_id| {
            movie_country::ActiveModel {
                id: Default::default(),
                movie_id: Set(movie_id),
                country_id: Set(country_id),
            }
        }))
        .exec(conn)
        .await?;
    }

    let directors: BTreeSet<i32> = payload.directors.iter().copied().collect();
    if !directors.is_empty() {
        movie_director::Entity::insert_many(directors.into_iter().map(|person_id| {
            movie_director::ActiveModel {
                id: Default::default(),
                movie_id: Set(movie_id),
                person_id: Set(person_id),
            }
        }))
        .exec(conn)
        .await?;
    }

    let actors: BTreeSet<i32> = payload.actors.iter().copied().collect();
    if !actors.is_empty() {
        movie_actor::Entity::insert_many(actors.into_iter().map(|person_id| {
            movie_actor::ActiveModel {
                id: Default::default(),
                movie_id: Set(movie_id),
                person_id: Set(person_id),
            }
        }))
        .exec(conn)
        .await?;
    }

    let genres: BTreeSet<i32> = payload.genres.iter().copied().collect();
    if !genres.is_empty() {
        movie_genre::Entity::insert_many(genres.into_iter().map(|genre_id| {
            movie_genre::ActiveModel {
                id: Default::default(),
                movie_id: Set(movie_id),
                genre_id: Set(genre_id),
            }
        }))
        .exec(conn)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::connect_for_tests,
        models::{CreateGenre, CreateRating, CreateReview},
        repo::{RatingRepo, ReviewRepo, TaxonomyRepo},
    };

    fn payload(title: &str) -> CreateMovie {
        CreateMovie {
            title: title.to_string(),
            tagline: String::new(),
            description: "seed movie".to_string(),
            poster: "movies/seed.jpg".to_string(),
            year: 2000,
            premiere: "2000-01-01".to_string(),
            budget: 0,
            fees_in_usa: 0,
            fees_in_world: 0,
            category: None,
            draft: false,
            countries: vec![],
            directors: vec![],
            actors: vec![],
            genres: vec![],
        }
    }

    fn no_filter() -> MovieFilter {
        MovieFilter { year: None, genre: None, category: None }
    }

    #[tokio::test]
    async fn slug_is_assigned_once_and_id_prefixed() {
        let db = connect_for_tests().await;
        let repo = MovieRepo::new(db);

        let created = repo.create(payload("Терминатор")).await.unwrap();
        assert_eq!(created.slug, format!("{}-terminator", created.id));

        let renamed = repo.update(created.id, payload("Terminator 2")).await.unwrap();
        assert_eq!(renamed.title, "Terminator 2");
        assert_eq!(renamed.slug, created.slug);
    }

    #[tokio::test]
    async fn drafts_are_hidden_from_list_and_detail() {
        let db = connect_for_tests().await;
        let repo = MovieRepo::new(db);

        let mut draft = payload("Unreleased");
        draft.draft = true;
        let draft = repo.create(draft).await.unwrap();
        let public = repo.create(payload("Released")).await.unwrap();

        let listed = repo.list(&no_filter(), "1.2.3.4").await.unwrap();
        assert_eq!(listed.iter().map(|m| m.id).collect::<Vec<_>>(), vec![public.id]);

        assert!(matches!(repo.detail(draft.id).await.unwrap_err(), AppError::NotFound(_)));
        assert!(repo.detail_any(draft.id).await.is_ok());
    }

    #[tokio::test]
    async fn average_is_fractional_and_absent_without_ratings() {
        let db = connect_for_tests().await;
        let repo = MovieRepo::new(db.clone());
        let ratings = RatingRepo::new(db);

        let rated = repo.create(payload("Rated")).await.unwrap();
        let unrated = repo.create(payload("Unrated")).await.unwrap();

        ratings.upsert("1.2.3.4", &CreateRating { movie: rated.id, star: 3 }).await.unwrap();
        ratings.upsert("5.6.7.8", &CreateRating { movie: rated.id, star: 5 }).await.unwrap();

        let listed = repo.list(&no_filter(), "1.2.3.4").await.unwrap();
        let rated_item = listed.iter().find(|m| m.id == rated.id).unwrap();
        let unrated_item = listed.iter().find(|m| m.id == unrated.id).unwrap();

        assert_eq!(rated_item.average_rating, Some(4.0));
        assert!(rated_item.rated_by_me);
        assert_eq!(unrated_item.average_rating, None);
        assert!(!unrated_item.rated_by_me);

        let other = repo.list(&no_filter(), "9.9.9.9").await.unwrap();
        assert!(!other.iter().any(|m| m.rated_by_me));
    }

    #[tokio::test]
    async fn genre_filter_matches_by_slug() {
        let db = connect_for_tests().await;
        let repo = MovieRepo::new(db.clone());
        let taxonomy = TaxonomyRepo::new(db);

        let horror = taxonomy
            .create_genre(CreateGenre {
                name: "Horror".to_string(),
                description: String::new(),
                slug: "horror".to_string(),
            })
            .await
            .unwrap();

        let mut tagged = payload("Alien");
        tagged.genres = vec![horror.id];
        let tagged = repo.create(tagged).await.unwrap();
        repo.create(payload("Heat")).await.unwrap();

        let filter = MovieFilter { year: None, genre: Some("horror".to_string()), category: None };
        let listed = repo.list(&filter, "1.2.3.4").await.unwrap();
        assert_eq!(listed.iter().map(|m| m.id).collect::<Vec<_>>(), vec![tagged.id]);

        let missing =
            MovieFilter { year: None, genre: Some("romance".to_string()), category: None };
        assert!(repo.list(&missing, "1.2.3.4").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn detail_nests_reviews_and_names_relations() {
        let db = connect_for_tests().await;
        let repo = MovieRepo::new(db.clone());
        let reviews = ReviewRepo::new(db);

        let created = repo.create(payload("Alien")).await.unwrap();
        let root = reviews
            .create(CreateReview {
                movie: created.id,
                name: "a".to_string(),
                email: "a@example.com".to_string(),
                text: "classic".to_string(),
                parent: None,
            })
            .await
            .unwrap();
        reviews
            .create(CreateReview {
                movie: created.id,
                name: "b".to_string(),
                email: "b@example.com".to_string(),
                text: "agreed".to_string(),
                parent: Some(root),
            })
            .await
            .unwrap();

        let detail = repo.detail(created.id).await.unwrap();
        assert_eq!(detail.reviews.len(), 1);
        assert_eq!(detail.reviews[0].children.len(), 1);
    }

    #[tokio::test]
    async fn bulk_draft_flip_updates_only_named_ids() {
        let db = connect_for_tests().await;
        let repo = MovieRepo::new(db);

        let first = repo.create(payload("First")).await.unwrap();
        let second = repo.create(payload("Second")).await.unwrap();

        let updated = repo.set_draft(&[first.id], true).await.unwrap();
        assert_eq!(updated, 1);

        let listed = repo.list(&no_filter(), "1.2.3.4").await.unwrap();
        assert_eq!(listed.iter().map(|m| m.id).collect::<Vec<_>>(), vec![second.id]);

        let republished = repo.set_draft(&[first.id, second.id], false).await.unwrap();
        assert_eq!(republished, 2);
        assert_eq!(repo.list(&no_filter(), "1.2.3.4").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_takes_ratings_and_reviews_with_it() {
        let db = connect_for_tests().await;
        let repo = MovieRepo::new(db.clone());
        let ratings = RatingRepo::new(db.clone());
        let reviews = ReviewRepo::new(db.clone());

        let created = repo.create(payload("Doomed")).await.unwrap();
        ratings.upsert("1.2.3.4", &CreateRating { movie: created.id, star: 4 }).await.unwrap();
        reviews
            .create(CreateReview {
                movie: created.id,
                name: "a".to_string(),
                email: "a@example.com".to_string(),
                text: "gone soon".to_string(),
                parent: None,
            })
            .await
            .unwrap();

        repo.delete(created.id).await.unwrap();

        assert!(matches!(repo.detail_any(created.id).await.unwrap_err(), AppError::NotFound(_)));
        assert!(
            rating::Entity::find()
                .filter(rating::Column::MovieId.eq(created.id))
                .all(&db)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(reviews.for_movie(created.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_relation_ids_are_validation_errors() {
        let db = connect_for_tests().await;
        let repo = MovieRepo::new(db);

        let mut bad = payload("Broken");
        bad.genres = vec![77];
        assert!(matches!(repo.create(bad).await.unwrap_err(), AppError::Validation(_)));
    }
}
