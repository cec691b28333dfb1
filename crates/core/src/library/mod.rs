//! Movie library layout: folder discovery, trailer paths and title inference.

mod scanner;
mod title;

pub use scanner::{
    build_trailer_target_path, fallback_trailer_path, first_movie_file, folder_name,
    locate_existing_trailer, primary_trailer_path, trailer_candidates, walk_movies, MovieFile,
    MovieFolder, TRAILER_FALLBACK_EXT, TRAILER_TARGET_EXT,
};
pub use title::{TitleExtractor, TitleGuess};
