use utoipa::OpenApi;

use crate::models::{
    CategoryItem, CountryItem, CreateMovie, CreatePerson, CreateRating, CreateReview, GenreItem,
    MovieDetail, MovieListItem, MovieShotItem, PersonDetail, PersonListItem, PersonRef, ReviewNode,
    StarItem, UpdateReview,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "kinoteka",
        description = "Movie catalog API: movies, cast and crew, reviews and ratings."
    ),
    paths(
        crate::routes::movies::list_movies,
        crate::routes::movies::movie_detail,
        crate::routes::movies::create_movie,
        crate::routes::movies::update_movie,
        crate::routes::movies::delete_movie,
        crate::routes::persons::list_persons,
        crate::routes::persons::person_detail,
        crate::routes::persons::create_person,
        crate::routes::persons::update_person,
        crate::routes::persons::delete_person,
        crate::routes::reviews::create_review,
        crate::routes::reviews::update_review,
        crate::routes::reviews::delete_review,
        crate::routes::ratings::create_rating,
        crate::routes::ratings::delete_rating,
        crate::routes::taxonomy::list_genres,
        crate::routes::taxonomy::list_categories,
        crate::routes::taxonomy::list_countries,
        crate::routes::taxonomy::list_stars,
    ),
    components(schemas(
        MovieListItem,
        MovieDetail,
        MovieShotItem,
        PersonRef,
        ReviewNode,
        PersonListItem,
        PersonDetail,
        GenreItem,
        CategoryItem,
        CountryItem,
        StarItem,
        CreateMovie,
        CreatePerson,
        CreateReview,
        UpdateReview,
        CreateRating,
    )),
    tags(
        (name = "movies", description = "Catalog read and write"),
        (name = "persons", description = "Cast and crew"),
        (name = "reviews", description = "Threaded reviews"),
        (name = "ratings", description = "Per-address star ratings"),
        (name = "lookups", description = "Reference lists"),
    )
)]
pub struct ApiDoc;
