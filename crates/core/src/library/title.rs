//! Title/year inference from folder and file names.

use regex_lite::Regex;
use std::fmt;
use std::path::Path;

/// A title and optional release year guessed from a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleGuess {
    pub title: String,
    pub year: Option<u32>,
}

impl TitleGuess {
    /// Titles shorter than this are too short to search for.
    pub const MIN_TITLE_CHARS: usize = 2;

    pub fn is_degenerate(&self) -> bool {
        self.title.chars().count() < Self::MIN_TITLE_CHARS
    }
}

impl fmt::Display for TitleGuess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{} ({})", self.title, year),
            None => write!(f, "{}", self.title),
        }
    }
}

/// Compiled patterns for title extraction.
///
/// Built once per run and handed to whoever needs it.
#[derive(Debug)]
pub struct TitleExtractor {
    /// Tried in order, first match wins.
    folder_patterns: Vec<Regex>,
    year: Regex,
    year_with_brackets: Regex,
    trailing_separators: Regex,
    dots_underscores: Regex,
    spaces: Regex,
    release_tag_tail: Regex,
}

impl Default for TitleExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TitleExtractor {
    pub fn new() -> Self {
        let compile = |pattern: &str| Regex::new(pattern).expect("built-in title pattern");

        Self {
            folder_patterns: vec![
                // "Title (2010)" / "Title [2010]"
                compile(r"^(?P<title>.+?)\s*[\(\[](?P<year>19\d{2}|20\d{2})[\)\]]$"),
                // "Title - Subtitle (2010)"
                compile(r"^(?P<title>.+?)\s*[-–:,]\s*.+?\s*[\(\[](?P<year>19\d{2}|20\d{2})[\)\]]$"),
                // "Title 2010"
                compile(r"^(?P<title>.+?)\s+(?P<year>19\d{2}|20\d{2})$"),
            ],
            year: compile(r"(19\d{2}|20\d{2})"),
            year_with_brackets: compile(r"[\(\[]?(19\d{2}|20\d{2})[\)\]]?"),
            trailing_separators: compile(r"[-–,:]+$"),
            dots_underscores: compile(r"[._]+"),
            spaces: compile(r"\s{2,}"),
            release_tag_tail: compile(
                r"(?i)(?:^|\s)(German|Deutsch|DL|EAC3|DTS|AC3|BluRay|WEB[- ]?DL|x265|x264|1080p|720p|2160p|UHD)$",
            ),
        }
    }

    /// Collapses dots, underscores and repeated whitespace into single spaces.
    pub fn normalize(&self, raw: &str) -> String {
        let s = self.dots_underscores.replace_all(raw.trim(), " ");
        let s = self.spaces.replace_all(&s, " ");
        s.trim().to_string()
    }

    /// Guesses title and year from a movie folder name.
    pub fn from_folder_name(&self, folder_name: &str) -> TitleGuess {
        let raw = folder_name.trim();

        for pattern in &self.folder_patterns {
            if let Some(caps) = pattern.captures(raw) {
                let year = caps.name("year").and_then(|m| m.as_str().parse().ok());
                let title = caps.name("title").map(|m| m.as_str()).unwrap_or_default();
                return TitleGuess {
                    title: self.normalize(title),
                    year,
                };
            }
        }

        let year = self
            .year
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok());
        let title = self.year_with_brackets.replace_all(raw, "");
        let title = self.trailing_separators.replace(title.trim(), "");

        TitleGuess {
            title: self.normalize(&title),
            year,
        }
    }

    /// Guesses title and year from a movie file name, dropping release tags
    /// (language, codec, source, resolution) from the tail.
    pub fn from_file_name(&self, file_name: &str) -> TitleGuess {
        let base = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());

        let found = self.year.find(&base);
        let year = found.and_then(|m| m.as_str().parse().ok());
        let head = match found {
            Some(m) => base[..m.start()].trim(),
            None => base.as_str(),
        };

        let mut title = self.normalize(head);
        while let Some(m) = self.release_tag_tail.find(&title) {
            title.truncate(m.start());
            title = title.trim_end().to_string();
        }

        TitleGuess { title, year }
    }

    /// Folder-based guess, retried against the movie file when the folder
    /// yields a degenerate title.
    pub fn extract(&self, folder_name: &str, movie_file_name: &str) -> TitleGuess {
        let guess = self.from_folder_name(folder_name);
        if !guess.is_degenerate() {
            return guess;
        }

        let from_file = self.from_file_name(movie_file_name);
        TitleGuess {
            title: if from_file.title.is_empty() {
                guess.title
            } else {
                from_file.title
            },
            year: from_file.year.or(guess.year),
        }
    }
}
